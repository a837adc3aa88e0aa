//! Keyed-container helpers.

use serde_json::Value;

use crate::cursor::Cursor;
use crate::error::{LeafDbError, Result};

impl Cursor {
    /// Shallow-merge `object` onto the addressed container; colliding keys
    /// take the incoming value.
    pub fn merge(&self, object: &Value) -> Result<Cursor> {
        self.queue().submit(|| {
            let mut base = self.require_object("merge")?;
            let Some(incoming) = object.as_object() else {
                return Err(LeafDbError::Usage("merge only works on keyed containers".into()));
            };
            for (key, value) in incoming {
                base.insert(key.clone(), value.clone());
            }
            self.set_direct(&[], &Value::Object(base))
        })
    }

    /// Keep only `fields`.
    pub fn pick(&self, fields: &[&str]) -> Result<Cursor> {
        self.queue().submit(|| {
            let base = self.require_object("pick")?;
            let picked: serde_json::Map<String, Value> = base
                .into_iter()
                .filter(|(key, _)| fields.contains(&key.as_str()))
                .collect();
            self.set_direct(&[], &Value::Object(picked))
        })
    }

    /// Drop `fields`.
    pub fn omit_keys(&self, fields: &[&str]) -> Result<Cursor> {
        self.queue().submit(|| {
            let base = self.require_object("omit_keys")?;
            let kept: serde_json::Map<String, Value> = base
                .into_iter()
                .filter(|(key, _)| !fields.contains(&key.as_str()))
                .collect();
            self.set_direct(&[], &Value::Object(kept))
        })
    }
}
