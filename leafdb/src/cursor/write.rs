//! Mutation primitives: whole-file read-modify-write operations on the
//! address a cursor points at.
//!
//! Every public method here is serialized through the owning store's task
//! queue; the `*_direct` variants are for callers that are already running
//! inside a queued operation. Writes rewrite the backing file in full — there
//! is no partial-patch format and no atomic swap.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{LeafDbError, Result};
use crate::path::{parse_path, Segment};
use crate::value;

use super::{Cursor, ValueType};

impl Cursor {
    /// Idempotently ensure a subdirectory exists under the current address.
    pub fn create_folder(&self, name: &str) -> Result<Cursor> {
        self.queue.submit(|| self.create_folder_direct(name))
    }

    pub(crate) fn create_folder_direct(&self, name: &str) -> Result<Cursor> {
        std::fs::create_dir_all(self.dir_base().join(name))?;
        self.refreshed()
    }

    /// Create a structured document. Extension-less names get `.json` and
    /// `content` (default: an empty object) serialized into them; names with
    /// path separators get their intermediate folders created first.
    pub fn create_file(&self, name: &str, content: Option<&Value>) -> Result<Cursor> {
        self.queue.submit(|| self.create_file_direct(name, content))
    }

    pub(crate) fn create_file_direct(&self, name: &str, content: Option<&Value>) -> Result<Cursor> {
        let target = self.file_target(name)?;
        let target = match target.extension().and_then(|e| e.to_str()) {
            None => target.with_extension("json"),
            Some("json") => target,
            Some(other) => {
                return Err(LeafDbError::Usage(format!(
                    "'.{other}' files hold raw bytes; use create_blob"
                )))
            }
        };

        let empty = Value::Object(serde_json::Map::new());
        let body = serde_json::to_string_pretty(content.unwrap_or(&empty))?;
        std::fs::write(target, body)?;
        self.refreshed()
    }

    /// Create an opaque file from raw bytes.
    pub fn create_blob(&self, name: &str, bytes: &[u8]) -> Result<Cursor> {
        self.queue.submit(|| self.create_blob_direct(name, bytes))
    }

    pub(crate) fn create_blob_direct(&self, name: &str, bytes: &[u8]) -> Result<Cursor> {
        let target = self.file_target(name)?;
        std::fs::write(target, bytes)?;
        self.refreshed()
    }

    /// Overwrite the exact addressed location with `value`.
    pub fn set(&self, value: impl Into<Value>) -> Result<Cursor> {
        let value = value.into();
        self.queue.submit(|| self.set_direct(&[], &value))
    }

    /// Extend the current address by `subpath` (dot-separated, range tokens
    /// allowed) and write `value` there.
    pub fn set_at(&self, subpath: &str, value: impl Into<Value>) -> Result<Cursor> {
        let extra = parse_path(subpath);
        let value = value.into();
        self.queue.submit(|| self.set_direct(&extra, &value))
    }

    /// The shared write path: re-read the backing file fresh from disk (the
    /// cursor may be older than the file), apply the write along the combined
    /// in-file path, persist, then re-resolve so the returned cursor reflects
    /// what was just written.
    pub(crate) fn set_direct(&self, extra: &[Segment], value: &Value) -> Result<Cursor> {
        if self.state == ValueType::Directory {
            return Err(LeafDbError::Usage("only values can be set".into()));
        }
        if !self.resolved_path.is_file() {
            return Err(LeafDbError::Path(format!(
                "no file backing address '{}'",
                self.address()
            )));
        }

        let mut document: Value = serde_json::from_slice(&std::fs::read(&self.resolved_path)?)?;

        let mut pointers = self.in_file_segments().to_vec();
        pointers.extend_from_slice(extra);
        value::set_path(&mut document, &pointers, value)?;

        std::fs::write(&self.resolved_path, serde_json::to_string_pretty(&document)?)?;
        self.refreshed()
    }

    /// Rename the addressed entity: the backing filesystem entry for
    /// directories and files, the owning key inside the parent container for
    /// values.
    pub fn rename(&self, new_name: &str) -> Result<Cursor> {
        self.queue.submit(|| self.rename_direct(new_name))
    }

    pub(crate) fn rename_direct(&self, new_name: &str) -> Result<Cursor> {
        if new_name.is_empty() {
            return Err(LeafDbError::Usage("new name is required".into()));
        }
        if self.segments.is_empty() {
            return Err(LeafDbError::Usage("cannot rename the store root".into()));
        }

        match self.state {
            ValueType::Directory | ValueType::File => {
                if self.data.is_missing() {
                    return Err(LeafDbError::Path(format!(
                        "nothing to rename at '{}'",
                        self.address()
                    )));
                }
                let parent = self
                    .resolved_path
                    .parent()
                    .ok_or_else(|| LeafDbError::Usage("cannot rename the store root".into()))?;
                std::fs::rename(&self.resolved_path, parent.join(new_name))?;

                let stem = new_name.split('.').next().unwrap_or(new_name);
                let mut segments = self.segments.clone();
                segments[self.fs_depth - 1] = Segment::Key(stem.to_string());
                Cursor::resolve(&self.root, segments, Arc::clone(&self.queue))
            }
            ValueType::Value => {
                let (old_key, parent) = self.value_key()?;
                let mut document: Value =
                    serde_json::from_slice(&std::fs::read(&self.resolved_path)?)?;

                if value::rename_key(&mut document, parent, &old_key, new_name)? {
                    std::fs::write(
                        &self.resolved_path,
                        serde_json::to_string_pretty(&document)?,
                    )?;
                    let mut segments = self.segments.clone();
                    *segments.last_mut().unwrap() = Segment::Key(new_name.to_string());
                    return Cursor::resolve(&self.root, segments, Arc::clone(&self.queue));
                }

                self.refreshed()
            }
        }
    }

    /// Remove the addressed entity: recursively for directories, the file
    /// itself for files, the owning key (persisted) for values.
    pub fn remove(&self) -> Result<()> {
        self.queue.submit(|| self.remove_direct())
    }

    pub(crate) fn remove_direct(&self) -> Result<()> {
        match self.state {
            ValueType::Directory => {
                std::fs::remove_dir_all(&self.resolved_path)?;
            }
            ValueType::File => {
                if self.data.is_missing() {
                    return Err(LeafDbError::Path(format!(
                        "nothing to remove at '{}'",
                        self.address()
                    )));
                }
                std::fs::remove_file(&self.resolved_path)?;
            }
            ValueType::Value => {
                let mut document: Value =
                    serde_json::from_slice(&std::fs::read(&self.resolved_path)?)?;
                if value::remove_path(&mut document, self.in_file_segments())?.is_some() {
                    std::fs::write(
                        &self.resolved_path,
                        serde_json::to_string_pretty(&document)?,
                    )?;
                }
            }
        }
        Ok(())
    }

    /// Re-resolve this cursor's address against the store.
    fn refreshed(&self) -> Result<Cursor> {
        Cursor::resolve(&self.root, self.segments.clone(), Arc::clone(&self.queue))
    }

    fn address(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(".")
    }

    /// The directory new entries are created in.
    fn dir_base(&self) -> PathBuf {
        if self.resolved_path.is_dir() {
            self.resolved_path.clone()
        } else {
            self.resolved_path
                .parent()
                .unwrap_or(&self.root)
                .to_path_buf()
        }
    }

    /// Resolve `name` to a creation target, making intermediate folders.
    fn file_target(&self, name: &str) -> Result<PathBuf> {
        if self.state == ValueType::Value {
            return Err(LeafDbError::Usage(
                "files live inside directories, not inside values".into(),
            ));
        }

        let target = self.dir_base().join(name);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(target)
    }

    /// The final in-file key and the parent path holding it.
    fn value_key(&self) -> Result<(String, &[Segment])> {
        let in_file = self.in_file_segments();
        match in_file.split_last() {
            Some((Segment::Key(key), parent)) => Ok((key.clone(), parent)),
            _ => Err(LeafDbError::Usage(
                "the addressed value has no owning key".into(),
            )),
        }
    }
}
