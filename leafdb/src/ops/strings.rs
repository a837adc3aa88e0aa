//! String helpers.

use serde_json::Value;

use crate::case::{transform_case, CaseFormat};
use crate::cursor::Cursor;
use crate::error::Result;

impl Cursor {
    /// Re-case the addressed string.
    pub fn change_case(&self, format: CaseFormat) -> Result<Cursor> {
        self.queue().submit(|| {
            let value = self.require_string("change_case")?;
            self.set_direct(&[], &Value::String(transform_case(&value, format)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LeafDbError;
    use crate::queue::TaskQueue;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn seed() -> (TempDir, Cursor) {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("doc.json"), "{\"title\":\"hello world\"}").unwrap();
        let root = Cursor::resolve(tmp.path(), vec![], Arc::new(TaskQueue::new())).unwrap();
        let cursor = root.get("doc.title").unwrap();
        (tmp, cursor)
    }

    #[test]
    fn test_change_case() {
        let (tmp, title) = seed();
        let title = title.change_case(CaseFormat::Title).unwrap();
        assert_eq!(title.json(), Some(&json!("Hello World")));

        title.change_case(CaseFormat::Snake).unwrap();
        let raw = std::fs::read(tmp.path().join("doc.json")).unwrap();
        let doc: Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(doc["title"], json!("hello_world"));
    }

    #[test]
    fn test_change_case_rejects_non_strings() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("doc.json"), "{\"title\":7}").unwrap();
        let root = Cursor::resolve(tmp.path(), vec![], Arc::new(TaskQueue::new())).unwrap();
        let title = root.get("doc.title").unwrap();
        assert!(matches!(
            title.change_case(CaseFormat::Upper),
            Err(LeafDbError::Usage(_))
        ));
    }
}
