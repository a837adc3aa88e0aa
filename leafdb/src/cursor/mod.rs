//! The navigator: resolves dot-paths across the three addressing levels
//! (directory, file, in-document value) into immutable cursors.

mod write;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;

use crate::error::{LeafDbError, Result};
use crate::path::{parse_path, Segment};
use crate::queue::TaskQueue;
use crate::value;

/// What a cursor currently addresses.
///
/// Monotonic within a single resolution: `Directory` while walking
/// subdirectories, `File` once a file has been opened, `Value` once at least
/// one in-document segment has been consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Directory,
    File,
    Value,
}

/// The data a cursor has materialized at its address.
#[derive(Debug, Clone, PartialEq)]
pub enum CursorData {
    /// Sorted entry names of a directory.
    Listing(Vec<String>),
    /// A parsed document, or a sub-value reached by indexing into one.
    Json(Value),
    /// An opaque (non-JSON) file.
    Blob {
        bytes: Vec<u8>,
        name: String,
        ext: String,
    },
    /// The address does not exist. Missing is data, not an error, so read
    /// chains compose over heterogeneous trees.
    Missing,
}

impl CursorData {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            CursorData::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, CursorData::Missing)
    }
}

/// Resolved navigation state: the address consumed so far, the materialized
/// value there, and the addressing level.
///
/// Cursors are immutable values. Navigation and mutation methods return a
/// new cursor; two cursors never share mutable state, so advancing one can
/// never corrupt a sibling's view.
#[derive(Debug, Clone)]
pub struct Cursor {
    root: PathBuf,
    resolved_path: PathBuf,
    segments: Vec<Segment>,
    /// How many consumed segments were spent on the filesystem walk
    /// (directory descents plus the file stem).
    fs_depth: usize,
    data: CursorData,
    state: ValueType,
    queue: Arc<TaskQueue>,
}

impl Cursor {
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem path consumed so far: the deepest directory reached, or the
    /// opened file.
    pub fn resolved_path(&self) -> &Path {
        &self.resolved_path
    }

    pub fn state(&self) -> ValueType {
        self.state
    }

    pub fn data(&self) -> &CursorData {
        &self.data
    }

    /// The materialized value, when the address resolved to JSON data.
    pub fn json(&self) -> Option<&Value> {
        self.data.as_json()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub(crate) fn queue(&self) -> &Arc<TaskQueue> {
        &self.queue
    }

    /// Segments consumed inside the document, past the file stem.
    pub(crate) fn in_file_segments(&self) -> &[Segment] {
        &self.segments[self.fs_depth.min(self.segments.len())..]
    }

    /// Extend the current address by `path` and resolve the result.
    pub fn get(&self, path: &str) -> Result<Cursor> {
        let extra = parse_path(path);
        self.queue.submit(|| self.get_direct(&extra))
    }

    pub(crate) fn get_direct(&self, extra: &[Segment]) -> Result<Cursor> {
        let mut segments = self.segments.clone();
        segments.extend_from_slice(extra);
        Cursor::resolve(&self.root, segments, Arc::clone(&self.queue))
    }

    /// Go back `steps` consumed segments and recompute state and value from
    /// the shorter prefix.
    pub fn back(&self, steps: usize) -> Result<Cursor> {
        self.queue.submit(|| self.back_direct(steps))
    }

    pub(crate) fn back_direct(&self, steps: usize) -> Result<Cursor> {
        if steps < 1 {
            return Err(LeafDbError::Usage("steps must be a positive number".into()));
        }
        if steps > self.segments.len() {
            return Err(LeafDbError::Usage(
                "steps cannot be more than the available depth".into(),
            ));
        }

        let prefix = self.segments[..self.segments.len() - steps].to_vec();
        Cursor::resolve(&self.root, prefix, Arc::clone(&self.queue))
    }

    /// Walk `segments` from `root`: directory descent, then an
    /// extension-agnostic file match, then in-document navigation.
    pub(crate) fn resolve(
        root: &Path,
        segments: Vec<Segment>,
        queue: Arc<TaskQueue>,
    ) -> Result<Cursor> {
        let mut dir = root.to_path_buf();
        let mut consumed = 0;

        // Directory descent: consume segments naming existing subdirectories.
        while consumed < segments.len() {
            let Some(name) = segments[consumed].as_key() else {
                break;
            };
            let candidate = dir.join(name);
            if candidate.is_dir() {
                dir = candidate;
                consumed += 1;
            } else {
                break;
            }
        }

        if consumed == segments.len() {
            let data = CursorData::Listing(list_dir(&dir)?);
            return Ok(Cursor {
                root: root.to_path_buf(),
                resolved_path: dir,
                segments,
                fs_depth: consumed,
                data,
                state: ValueType::Directory,
                queue,
            });
        }

        // File resolution: the next segment is a file stem, matched without
        // regard to extension.
        let file = segments[consumed]
            .as_key()
            .and_then(|stem| find_by_stem(&dir, stem).transpose())
            .transpose()?;

        let Some(file) = file else {
            // No such file: the remaining segments address nothing.
            let state = if segments.len() - consumed > 1 {
                ValueType::Value
            } else {
                ValueType::File
            };
            return Ok(Cursor {
                root: root.to_path_buf(),
                resolved_path: dir,
                fs_depth: consumed + 1,
                segments,
                data: CursorData::Missing,
                state,
                queue,
            });
        };

        consumed += 1;
        let fs_depth = consumed;
        let remaining = &segments[consumed..];

        let ext = file
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_string();

        let (data, state) = if ext == "json" {
            let parsed: Value = serde_json::from_slice(&std::fs::read(&file)?)?;
            if remaining.is_empty() {
                (CursorData::Json(parsed), ValueType::File)
            } else {
                let data = match value::get_path(&parsed, remaining) {
                    Some(found) => CursorData::Json(found),
                    None => CursorData::Missing,
                };
                (data, ValueType::Value)
            }
        } else {
            let name = file
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string();
            let blob = CursorData::Blob {
                bytes: std::fs::read(&file)?,
                name,
                ext,
            };
            if remaining.is_empty() {
                (blob, ValueType::File)
            } else {
                // Opaque payloads have no inner structure to index into.
                (CursorData::Missing, ValueType::Value)
            }
        };

        Ok(Cursor {
            root: root.to_path_buf(),
            resolved_path: file,
            segments,
            fs_depth,
            data,
            state,
            queue,
        })
    }
}

/// Sorted entry names of a directory.
pub(crate) fn list_dir(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        names.push(entry?.file_name().to_string_lossy().to_string());
    }
    names.sort();
    Ok(names)
}

/// Find the first directory entry whose stem matches `stem`.
fn find_by_stem(dir: &Path, stem: &str) -> Result<Option<PathBuf>> {
    for name in list_dir(dir)? {
        let path = dir.join(&name);
        if path.is_file() && path.file_stem().and_then(|s| s.to_str()) == Some(stem) {
            return Ok(Some(path));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;

    fn seed() -> (TempDir, Cursor) {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();

        std::fs::create_dir_all(root.join("users/posts")).unwrap();
        std::fs::create_dir_all(root.join("assets")).unwrap();
        std::fs::write(
            root.join("users/posts/first.json"),
            serde_json::to_string_pretty(&json!({
                "title": "first",
                "author": { "name": "gam" },
                "links": [
                    { "name": "a" },
                    { "name": "b" },
                    { "name": "c" },
                ],
            }))
            .unwrap(),
        )
        .unwrap();
        std::fs::write(root.join("users/gam.json"), "{\"name\":\"gam\"}").unwrap();
        std::fs::write(root.join("assets/airplane.jpg"), [0xff, 0xd8, 0xff]).unwrap();

        let cursor = Cursor::resolve(root, vec![], Arc::new(TaskQueue::new())).unwrap();
        (tmp, cursor)
    }

    #[test]
    fn test_root_listing() {
        let (_tmp, root) = seed();
        assert_eq!(root.state(), ValueType::Directory);
        assert_eq!(
            root.data(),
            &CursorData::Listing(vec!["assets".into(), "users".into()])
        );
    }

    #[test]
    fn test_directory_navigation() {
        let (_tmp, root) = seed();
        let users = root.get("users").unwrap();
        assert_eq!(users.state(), ValueType::Directory);
        assert_eq!(
            users.data(),
            &CursorData::Listing(vec!["gam.json".into(), "posts".into()])
        );
    }

    #[test]
    fn test_file_navigation() {
        let (_tmp, root) = seed();
        let first = root.get("users.posts.first").unwrap();
        assert_eq!(first.state(), ValueType::File);
        assert_eq!(first.json().unwrap()["title"], json!("first"));
        assert!(first.resolved_path().ends_with("users/posts/first.json"));
    }

    #[test]
    fn test_value_navigation() {
        let (_tmp, root) = seed();
        let title = root.get("users.posts.first.title").unwrap();
        assert_eq!(title.state(), ValueType::Value);
        assert_eq!(title.json(), Some(&json!("first")));

        let name = root.get("users.posts.first.links.0.name").unwrap();
        assert_eq!(name.json(), Some(&json!("a")));
    }

    #[test]
    fn test_blob_navigation() {
        let (_tmp, root) = seed();
        let airplane = root.get("assets.airplane").unwrap();
        assert_eq!(
            airplane.data(),
            &CursorData::Blob {
                bytes: vec![0xff, 0xd8, 0xff],
                name: "airplane".into(),
                ext: "jpg".into(),
            }
        );
    }

    #[test]
    fn test_missing_is_data() {
        let (_tmp, root) = seed();
        assert!(root.get("nothing").unwrap().data().is_missing());
        assert!(root.get("users.posts.nothing").unwrap().data().is_missing());
        assert!(root
            .get("users.posts.first.nothing")
            .unwrap()
            .data()
            .is_missing());
    }

    #[test]
    fn test_idempotent_navigation() {
        let (_tmp, root) = seed();
        let once = root.get("users.posts.first.links").unwrap();
        let twice = root.get("users.posts.first.links").unwrap();
        assert_eq!(once.data(), twice.data());
        assert_eq!(once.state(), twice.state());
    }

    #[test]
    fn test_branching_does_not_alias() {
        let (_tmp, root) = seed();
        let posts = root.get("users.posts").unwrap();
        let first = posts.get("first").unwrap();
        let second = posts.get("first.title").unwrap();

        // Advancing one branch leaves the others untouched.
        assert_eq!(posts.state(), ValueType::Directory);
        assert_eq!(first.state(), ValueType::File);
        assert_eq!(second.state(), ValueType::Value);
    }

    #[test]
    fn test_back_navigation() {
        let (_tmp, root) = seed();
        let name = root.get("users.posts.first.author.name").unwrap();
        assert_eq!(name.json(), Some(&json!("gam")));

        let author = name.back(1).unwrap();
        assert_eq!(author.json(), Some(&json!({ "name": "gam" })));
        assert_eq!(author.state(), ValueType::Value);

        let file = author.back(1).unwrap();
        assert_eq!(file.state(), ValueType::File);

        let dir = file.back(1).unwrap();
        assert_eq!(dir.state(), ValueType::Directory);
    }

    #[test]
    fn test_back_past_depth_fails() {
        let (_tmp, root) = seed();
        let users = root.get("users").unwrap();
        assert!(matches!(users.back(2), Err(LeafDbError::Usage(_))));
        assert!(matches!(users.back(0), Err(LeafDbError::Usage(_))));
    }

    #[test]
    fn test_range_and_projection() {
        let (_tmp, root) = seed();
        let names = root.get("users.posts.first.links.name").unwrap();
        assert_eq!(names.json(), Some(&json!(["a", "b", "c"])));

        let sliced = root.get("users.posts.first.links.[1:3].name").unwrap();
        assert_eq!(sliced.json(), Some(&json!(["b", "c"])));
    }
}
