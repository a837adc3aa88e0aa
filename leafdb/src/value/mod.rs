//! Navigation and mutation of parsed JSON trees.
//!
//! These are the in-document halves of the navigator and mutation engine:
//! the cursor resolves a file, then delegates key/index/range traversal and
//! read-modify-write walks to this module.

use serde_json::Value;

use crate::error::{LeafDbError, Result};
use crate::path::Segment;

/// Resolve `segments` against a value tree.
///
/// Keyed containers descend by key, sequences by numeric index. A range
/// segment slices a sequence (end-exclusive, clamped). A non-index key on a
/// sequence is a projection: the key is extracted from every element. A miss
/// anywhere yields `None` — missing is data on the read path, not an error.
pub fn get_path(tree: &Value, segments: &[Segment]) -> Option<Value> {
    let mut current = tree.clone();

    for segment in segments {
        current = match (&current, segment) {
            (Value::Object(map), Segment::Key(key)) => map.get(key)?.clone(),
            (Value::Array(items), Segment::Range { start, end }) => {
                let start = start.unwrap_or(0).min(items.len());
                let end = end.unwrap_or(items.len()).min(items.len());
                Value::Array(items[start..end.max(start)].to_vec())
            }
            (Value::Array(items), Segment::Key(key)) => {
                match key.parse::<usize>().ok().filter(|i| *i < items.len()) {
                    Some(index) => items[index].clone(),
                    // Projection: select this key across all elements.
                    None => Value::Array(
                        items
                            .iter()
                            .map(|item| item.get(key.as_str()).cloned().unwrap_or(Value::Null))
                            .collect(),
                    ),
                }
            }
            _ => return None,
        };
    }

    Some(current)
}

/// Write `value` at `segments`, creating intermediate object levels as
/// needed. Sequence indices may extend the sequence (padding with nulls, the
/// way sparse assignments serialize). Range segments fan the write out across
/// every index in the slice.
pub fn set_path(tree: &mut Value, segments: &[Segment], value: &Value) -> Result<()> {
    let Some((segment, rest)) = segments.split_first() else {
        *tree = value.clone();
        return Ok(());
    };

    match segment {
        Segment::Range { start, end } => {
            let Value::Array(items) = tree else {
                return Err(LeafDbError::Path(format!(
                    "range {segment} applied to a non-sequence value"
                )));
            };
            let start = start.unwrap_or(0).min(items.len());
            let end = end.unwrap_or(items.len()).min(items.len());
            for index in start..end {
                set_path(&mut items[index], rest, value)?;
            }
            Ok(())
        }
        Segment::Key(key) => {
            if let Value::Array(items) = tree {
                let index = key.parse::<usize>().map_err(|_| {
                    LeafDbError::Path(format!("key '{key}' is not a sequence index"))
                })?;
                if index >= items.len() {
                    items.resize(index + 1, Value::Null);
                }
                return set_path(&mut items[index], rest, value);
            }

            // Auto-vivify: anything that is not a keyed container becomes one.
            if !tree.is_object() {
                *tree = Value::Object(serde_json::Map::new());
            }
            let map = tree.as_object_mut().unwrap();
            let child = map.entry(key.clone()).or_insert(Value::Null);
            set_path(child, rest, value)
        }
    }
}

/// Remove the value at `segments` from its parent container.
///
/// Object parents lose the key; sequence parents lose the element at that
/// index. Returns the removed value, or `None` when nothing was there.
pub fn remove_path(tree: &mut Value, segments: &[Segment]) -> Result<Option<Value>> {
    let Some((last, parent)) = segments.split_last() else {
        return Err(LeafDbError::Usage("nothing to remove at the root".into()));
    };
    let Segment::Key(key) = last else {
        return Err(LeafDbError::Usage("cannot remove through a range".into()));
    };

    let Some(parent) = walk_mut(tree, parent)? else {
        return Ok(None);
    };

    match parent {
        Value::Object(map) => Ok(map.shift_remove(key)),
        Value::Array(items) => Ok(key
            .parse::<usize>()
            .ok()
            .filter(|i| *i < items.len())
            .map(|i| items.remove(i))),
        _ => Ok(None),
    }
}

/// Move the value held under `old` to `new` inside the container at `parent`.
/// Returns false when the key was not present.
pub fn rename_key(tree: &mut Value, parent: &[Segment], old: &str, new: &str) -> Result<bool> {
    let Some(container) = walk_mut(tree, parent)? else {
        return Ok(false);
    };

    match container {
        Value::Object(map) => match map.shift_remove(old) {
            Some(value) => {
                map.insert(new.to_string(), value);
                Ok(true)
            }
            None => Ok(false),
        },
        _ => Err(LeafDbError::Usage(
            "keys can only be renamed inside keyed containers".into(),
        )),
    }
}

/// Strict mutable walk: keys and indices only, no vivification, no ranges.
fn walk_mut<'a>(tree: &'a mut Value, segments: &[Segment]) -> Result<Option<&'a mut Value>> {
    let mut current = tree;

    for segment in segments {
        let Segment::Key(key) = segment else {
            return Err(LeafDbError::Usage(
                "cannot mutate through a range segment".into(),
            ));
        };
        current = match current {
            Value::Object(map) => match map.get_mut(key) {
                Some(next) => next,
                None => return Ok(None),
            },
            Value::Array(items) => {
                match key.parse::<usize>().ok().filter(|i| *i < items.len()) {
                    Some(index) => &mut items[index],
                    None => return Ok(None),
                }
            }
            _ => return Ok(None),
        };
    }

    Ok(Some(current))
}
