//! Sequence helpers.

use serde_json::Value;

use crate::cursor::Cursor;
use crate::error::{LeafDbError, Result};

impl Cursor {
    /// Append values to the addressed sequence.
    pub fn push(&self, values: impl IntoIterator<Item = Value>) -> Result<Cursor> {
        let values: Vec<Value> = values.into_iter().collect();
        self.queue().submit(|| {
            let mut list = self.require_array("push")?;
            list.extend(values.iter().cloned());
            self.set_direct(&[], &Value::Array(list))
        })
    }

    /// Append only the values not already present.
    pub fn push_set(&self, values: impl IntoIterator<Item = Value>) -> Result<Cursor> {
        let values: Vec<Value> = values.into_iter().collect();
        self.queue().submit(|| {
            let mut list = self.require_array("push_set")?;
            for value in &values {
                if !list.contains(value) {
                    list.push(value.clone());
                }
            }
            self.set_direct(&[], &Value::Array(list))
        })
    }

    /// Remove and return the last value.
    pub fn pull(&self) -> Result<(Cursor, Option<Value>)> {
        self.queue().submit(|| {
            let mut list = self.require_array("pull")?;
            let pulled = list.pop();
            let cursor = self.set_direct(&[], &Value::Array(list))?;
            Ok((cursor, pulled))
        })
    }

    /// Remove and return the first value.
    pub fn shift(&self) -> Result<(Cursor, Option<Value>)> {
        self.queue().submit(|| {
            let mut list = self.require_array("shift")?;
            let shifted = if list.is_empty() {
                None
            } else {
                Some(list.remove(0))
            };
            let cursor = self.set_direct(&[], &Value::Array(list))?;
            Ok((cursor, shifted))
        })
    }

    /// Prepend values, preserving their order.
    pub fn unshift(&self, values: impl IntoIterator<Item = Value>) -> Result<Cursor> {
        let values: Vec<Value> = values.into_iter().collect();
        self.queue().submit(|| {
            let mut list = self.require_array("unshift")?;
            list.splice(0..0, values.iter().cloned());
            self.set_direct(&[], &Value::Array(list))
        })
    }

    /// Remove `delete_count` elements at `start`, inserting `items` in their
    /// place. Returns the removed elements.
    pub fn splice(
        &self,
        start: usize,
        delete_count: usize,
        items: impl IntoIterator<Item = Value>,
    ) -> Result<(Cursor, Vec<Value>)> {
        let items: Vec<Value> = items.into_iter().collect();
        self.queue().submit(|| {
            let mut list = self.require_array("splice")?;
            let start = start.min(list.len());
            let end = (start + delete_count).min(list.len());
            let removed: Vec<Value> = list.splice(start..end, items.iter().cloned()).collect();
            let cursor = self.set_direct(&[], &Value::Array(list))?;
            Ok((cursor, removed))
        })
    }

    /// Drop duplicate values, keeping first occurrences.
    pub fn unique(&self) -> Result<Cursor> {
        self.queue().submit(|| {
            let list = self.require_array("unique")?;
            let mut deduped: Vec<Value> = Vec::with_capacity(list.len());
            for value in list {
                if !deduped.contains(&value) {
                    deduped.push(value);
                }
            }
            self.set_direct(&[], &Value::Array(deduped))
        })
    }

    /// Split the sequence into chunks of `size`.
    pub fn chunk(&self, size: usize) -> Result<Cursor> {
        self.queue().submit(|| {
            if size == 0 {
                return Err(LeafDbError::Usage("chunk size must be positive".into()));
            }
            let list = self.require_array("chunk")?;
            let chunked: Vec<Value> = list
                .chunks(size)
                .map(|chunk| Value::Array(chunk.to_vec()))
                .collect();
            self.set_direct(&[], &Value::Array(chunked))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::TaskQueue;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn seed(list: Value) -> (TempDir, Cursor) {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join("doc.json"),
            serde_json::to_string_pretty(&json!({ "list": list })).unwrap(),
        )
        .unwrap();
        let root = Cursor::resolve(tmp.path(), vec![], Arc::new(TaskQueue::new())).unwrap();
        let cursor = root.get("doc.list").unwrap();
        (tmp, cursor)
    }

    fn stored(tmp: &TempDir) -> Value {
        let raw = std::fs::read(tmp.path().join("doc.json")).unwrap();
        serde_json::from_slice::<Value>(&raw).unwrap()["list"].clone()
    }

    #[test]
    fn test_push() {
        let (tmp, list) = seed(json!([1, 2]));
        let updated = list.push([json!(3), json!(4)]).unwrap();
        assert_eq!(stored(&tmp), json!([1, 2, 3, 4]));
        assert_eq!(updated.json(), Some(&json!([1, 2, 3, 4])));
    }

    #[test]
    fn test_push_rejects_non_arrays() {
        let (_tmp, root) = seed(json!([1]));
        let doc = root.back(1).unwrap();
        assert!(matches!(
            doc.push([json!(1)]),
            Err(LeafDbError::Usage(_))
        ));
    }

    #[test]
    fn test_push_set_skips_existing() {
        let (tmp, list) = seed(json!([1, 2]));
        list.push_set([json!(2), json!(3)]).unwrap();
        assert_eq!(stored(&tmp), json!([1, 2, 3]));
    }

    #[test]
    fn test_pull_and_shift() {
        let (tmp, list) = seed(json!([1, 2, 3]));
        let (list, pulled) = list.pull().unwrap();
        assert_eq!(pulled, Some(json!(3)));

        let (_, shifted) = list.shift().unwrap();
        assert_eq!(shifted, Some(json!(1)));
        assert_eq!(stored(&tmp), json!([2]));
    }

    #[test]
    fn test_pull_empty() {
        let (tmp, list) = seed(json!([]));
        let (_, pulled) = list.pull().unwrap();
        assert_eq!(pulled, None);
        assert_eq!(stored(&tmp), json!([]));
    }

    #[test]
    fn test_unshift() {
        let (tmp, list) = seed(json!([3]));
        list.unshift([json!(1), json!(2)]).unwrap();
        assert_eq!(stored(&tmp), json!([1, 2, 3]));
    }

    #[test]
    fn test_splice() {
        let (tmp, list) = seed(json!(["a", "b", "c", "d"]));
        let (_, removed) = list.splice(1, 2, [json!("x")]).unwrap();
        assert_eq!(removed, vec![json!("b"), json!("c")]);
        assert_eq!(stored(&tmp), json!(["a", "x", "d"]));
    }

    #[test]
    fn test_splice_clamps_out_of_bounds() {
        let (tmp, list) = seed(json!([1, 2]));
        let (_, removed) = list.splice(5, 5, []).unwrap();
        assert_eq!(removed, Vec::<Value>::new());
        assert_eq!(stored(&tmp), json!([1, 2]));
    }

    #[test]
    fn test_unique() {
        let (tmp, list) = seed(json!([1, 2, 1, 3, 2]));
        list.unique().unwrap();
        assert_eq!(stored(&tmp), json!([1, 2, 3]));
    }

    #[test]
    fn test_chunk() {
        let (tmp, list) = seed(json!([1, 2, 3, 4, 5]));
        list.chunk(2).unwrap();
        assert_eq!(stored(&tmp), json!([[1, 2], [3, 4], [5]]));

        let relisted = seed(json!([1]));
        assert!(matches!(
            relisted.1.chunk(0),
            Err(LeafDbError::Usage(_))
        ));
    }
}
