//! The store handle and the schema-bound collection CRUD surface.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::cursor::{self, Cursor, CursorData, ValueType};
use crate::error::{LeafDbError, Result};
use crate::events::{Event, EventBus, Hook};
use crate::path::{parse_path, Segment};
use crate::queue::TaskQueue;
use crate::schema::{Blueprint, SchemaOptions};
use crate::validation::validate_and_transform;

/// A handle to a store rooted at a directory. Operations issued through one
/// handle are serialized by its task queue; handles are independent — two
/// handles over the same directory race, last writer wins.
pub struct Store {
    root: PathBuf,
    queue: Arc<TaskQueue>,
}

impl Store {
    /// Open a store at `path`, creating the root directory if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Store> {
        let root = path.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        Ok(Store {
            root,
            queue: Arc::new(TaskQueue::new()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a dot-path into a cursor. The empty string addresses the root
    /// directory.
    pub fn get(&self, path: &str) -> Result<Cursor> {
        let segments = parse_path(path);
        self.queue
            .submit(|| Cursor::resolve(&self.root, segments.clone(), Arc::clone(&self.queue)))
    }

    /// Build the recursive tree under `path`: subdirectories recursed, JSON
    /// documents parsed under their stem, opaque files mapped to null. A path
    /// entering a file returns the addressed in-document value instead.
    pub fn tree(&self, path: &str) -> Result<Value> {
        let segments = parse_path(path);
        self.queue.submit(|| self.tree_direct(segments.clone()))
    }

    fn tree_direct(&self, segments: Vec<Segment>) -> Result<Value> {
        let cursor = Cursor::resolve(&self.root, segments, Arc::clone(&self.queue))?;
        match cursor.data() {
            CursorData::Listing(_) => traverse_dir(cursor.resolved_path()),
            CursorData::Json(value) => Ok(value.clone()),
            _ => Ok(Value::Null),
        }
    }
}

fn traverse_dir(dir: &Path) -> Result<Value> {
    let mut result = Map::new();
    for name in cursor::list_dir(dir)? {
        let full = dir.join(&name);
        if full.is_dir() {
            result.insert(name, traverse_dir(&full)?);
        } else if let Some(stem) = name.strip_suffix(".json") {
            let parsed: Value = serde_json::from_slice(&std::fs::read(&full)?)?;
            result.insert(stem.to_string(), parsed);
        } else {
            // Dead end: opaque files carry no tree structure.
            result.insert(name, Value::Null);
        }
    }
    Ok(Value::Object(result))
}

/// A document query: match on field equality or with a predicate.
#[derive(Clone)]
pub enum Query {
    Where(Map<String, Value>),
    Predicate(Arc<dyn Fn(&Value) -> bool + Send + Sync>),
}

impl Query {
    /// Match documents whose value equals `fields` on every queried key.
    pub fn matching(fields: Value) -> Query {
        match fields {
            Value::Object(map) => Query::Where(map),
            _ => Query::Where(Map::new()),
        }
    }

    /// Match documents for which `predicate` returns true. A panicking
    /// predicate counts as a non-match, never a propagated failure.
    pub fn predicate(predicate: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Query {
        Query::Predicate(Arc::new(predicate))
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    /// Fields to strip from the result; `None` uses the blueprint's omit
    /// declarations.
    pub omit: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    /// Stop at the first match and return it alone.
    pub first: bool,
    pub omit: Option<Vec<String>>,
}

impl Cursor {
    /// Bind a blueprint and options to this directory, producing the CRUD
    /// surface for the collection it addresses.
    pub fn schema(&self, blueprint: Blueprint, options: SchemaOptions) -> Result<Collection> {
        if self.state() != ValueType::Directory {
            return Err(LeafDbError::Usage("schemas bind to folders".into()));
        }

        let omitted = blueprint
            .iter()
            .filter(|(_, rule)| rule.omit)
            .map(|(name, _)| name.clone())
            .collect();
        let referenced = blueprint
            .iter()
            .filter(|(_, rule)| rule.populate)
            .map(|(name, _)| name.clone())
            .collect();
        let mut immutable: Vec<String> = vec!["created_at".into(), "updated_at".into()];
        immutable.extend(
            blueprint
                .iter()
                .filter(|(_, rule)| rule.immutable)
                .map(|(name, _)| name.clone()),
        );

        Ok(Collection {
            cursor: self.clone(),
            blueprint,
            options,
            omitted,
            immutable,
            referenced,
            events: EventBus::new(),
        })
    }
}

/// A schema-bound collection: blueprint-driven CRUD over the documents in one
/// directory. Every verb is serialized through the owning store's queue and
/// emits its lifecycle events.
pub struct Collection {
    cursor: Cursor,
    blueprint: Blueprint,
    options: SchemaOptions,
    omitted: Vec<String>,
    immutable: Vec<String>,
    referenced: Vec<String>,
    events: EventBus,
}

impl Collection {
    /// Register a lifecycle hook. `pre-*` hooks may return a replacement
    /// payload; the last non-`None` return wins.
    pub fn hook(
        &mut self,
        event: Event,
        callback: impl Fn(&Value) -> Option<Value> + Send + Sync + 'static,
    ) {
        self.events.on(event, Arc::new(callback));
    }

    /// Register one callback for several events at once.
    pub fn hook_each(
        &mut self,
        events: &[Event],
        callback: impl Fn(&Value) -> Option<Value> + Send + Sync + 'static,
    ) {
        let hook: Hook = Arc::new(callback);
        for event in events {
            self.events.on(*event, Arc::clone(&hook));
        }
    }

    /// Create a document. With no name, a random identifier is generated
    /// (`id_length` bounds it, `name_prefix` is prepended either way).
    /// Returns the formatted document.
    pub fn create(&self, name: Option<&str>, payload: Value) -> Result<Value> {
        self.cursor
            .queue()
            .submit(|| self.create_direct(name, &payload))
    }

    fn create_direct(&self, name: Option<&str>, payload: &Value) -> Result<Value> {
        let name = match name {
            Some(given) => given.to_string(),
            None => {
                let prefix_len = self.options.name_prefix.as_deref().map_or(0, str::len);
                let length = self
                    .options
                    .id_length
                    .unwrap_or(20)
                    .saturating_sub(prefix_len)
                    .max(4);
                nanoid::nanoid!(length)
            }
        };
        if name.contains('.') {
            return Err(LeafDbError::Usage(
                "document names must not contain dots".into(),
            ));
        }

        let payload = self
            .events
            .emit(Event::PreCreate, payload)
            .unwrap_or_else(|| payload.clone());

        let mut document = validate_and_transform(&self.blueprint, self.options.timestamps, &payload)?;
        if self.options.timestamps {
            let now = Value::from(Utc::now().timestamp_millis());
            if let Some(map) = document.as_object_mut() {
                map.insert("created_at".into(), now.clone());
                map.insert("updated_at".into(), now);
            }
        }

        let name = match &self.options.name_prefix {
            Some(prefix) => format!("{prefix}{name}"),
            None => name,
        };

        self.cursor.create_file_direct(&name, Some(&document))?;

        let populated = self.populate_direct(&name)?;
        let result = self.format(&name, populated, Some(&[]));
        self.events.emit(Event::PostCreate, &result);
        Ok(result)
    }

    /// Read a document (or a value inside one) by key. Missing documents and
    /// keys that resolve to a directory read as `None`.
    pub fn read(&self, key: &str, options: ReadOptions) -> Result<Option<Value>> {
        self.cursor.queue().submit(|| self.read_direct(key, &options))
    }

    fn read_direct(&self, key: &str, options: &ReadOptions) -> Result<Option<Value>> {
        self.events.emit(Event::PreRead, &Value::from(key));

        let target = self.cursor.get_direct(&parse_path(key))?;
        if target.state() == ValueType::Directory || target.data().is_missing() {
            return Ok(None);
        }

        let populated = self.populate_direct(key)?;
        let result = self.format(key, populated, options.omit.as_deref());
        self.events.emit(Event::PostRead, &result);
        Ok(Some(result))
    }

    /// Find documents matching a query. Returns an id-keyed object (or an
    /// array of `_id`-inlined documents when `inline_id`); `first` returns
    /// the single first match.
    pub fn find(&self, query: Query, options: FindOptions) -> Result<Value> {
        self.cursor
            .queue()
            .submit(|| self.find_direct(&query, &options))
    }

    fn find_direct(&self, query: &Query, options: &FindOptions) -> Result<Value> {
        let query_payload = match query {
            Query::Where(map) => Value::Object(map.clone()),
            Query::Predicate(_) => Value::Null,
        };
        self.events.emit(Event::PreFind, &query_payload);

        let pattern = format!("{}/*", self.cursor.resolved_path().display());
        let files: Vec<PathBuf> = glob::glob(&pattern)
            .map_err(|e| LeafDbError::Other(format!("Glob error: {e}")))?
            .filter_map(|r| r.ok())
            .filter(|p| p.is_file())
            .collect();

        let mut matches: Vec<(String, Value)> = Vec::new();

        for file in &files {
            let Some(stem) = file.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let document = match self.cursor.get_direct(&[Segment::Key(stem.to_string())]) {
                Ok(cursor) => match cursor.json() {
                    Some(data) => data.clone(),
                    None => continue,
                },
                Err(error) => {
                    log::warn!("skipping unreadable document {}: {error}", file.display());
                    continue;
                }
            };

            let is_match = match query {
                Query::Where(fields) => fields
                    .iter()
                    .all(|(key, expected)| document.get(key) == Some(expected)),
                Query::Predicate(predicate) => {
                    // A panicking predicate is a non-match, not a failure.
                    catch_unwind(AssertUnwindSafe(|| predicate(&document))).unwrap_or(false)
                }
            };

            if is_match {
                matches.push((stem.to_string(), document));
                if options.first {
                    break;
                }
            }
        }

        let omit = options.omit.as_deref();
        let result = if options.first {
            match matches.into_iter().next() {
                Some((id, document)) => self.format(&id, document, omit),
                None => Value::Null,
            }
        } else if self.options.inline_id {
            Value::Array(
                matches
                    .into_iter()
                    .map(|(id, document)| self.format(&id, document, omit))
                    .collect(),
            )
        } else {
            let mut entries = Map::new();
            for (id, document) in matches {
                entries.insert(id, self.strip(document, omit));
            }
            Value::Object(entries)
        };

        self.events.emit(Event::PostFind, &result);
        Ok(result)
    }

    /// Shallow-merge `patch` onto the stored document. Touching an immutable
    /// field (blueprint-declared plus the timestamp stamps) is a silent
    /// no-op returning `None`.
    pub fn update(&self, key: &str, patch: Value, options: ReadOptions) -> Result<Option<Value>> {
        self.cursor
            .queue()
            .submit(|| self.update_direct(key, &patch, &options))
    }

    fn update_direct(&self, key: &str, patch: &Value, options: &ReadOptions) -> Result<Option<Value>> {
        if key.is_empty() {
            return Err(LeafDbError::Usage("document name is required".into()));
        }
        if let Some(map) = patch.as_object() {
            if map.keys().any(|k| self.immutable.contains(k)) {
                return Ok(None);
            }
        }

        let patch = self
            .events
            .emit(Event::PreUpdate, patch)
            .unwrap_or_else(|| patch.clone());

        let target = self.cursor.get_direct(&parse_path(key))?;
        let Some(existing) = target.json() else {
            return Ok(None);
        };

        let mut merged = existing.as_object().cloned().unwrap_or_default();
        if let Some(fields) = patch.as_object() {
            for (field, value) in fields {
                merged.insert(field.clone(), value.clone());
            }
        }
        if self.options.timestamps {
            merged.insert(
                "updated_at".into(),
                Value::from(Utc::now().timestamp_millis()),
            );
        }

        let document = validate_and_transform(
            &self.blueprint,
            self.options.timestamps,
            &Value::Object(merged),
        )?;
        target.set_direct(&[], &document)?;

        let result = self.format(key, document, options.omit.as_deref());
        self.events.emit(Event::PostUpdate, &result);
        Ok(Some(result))
    }

    /// Rename a document. A `pre-rename` hook return overrides the new name.
    pub fn rename(&self, old_name: &str, new_name: &str) -> Result<()> {
        self.cursor
            .queue()
            .submit(|| self.rename_direct(old_name, new_name))
    }

    fn rename_direct(&self, old_name: &str, new_name: &str) -> Result<()> {
        if old_name.is_empty() || new_name.is_empty() {
            return Err(LeafDbError::Usage("old name and new name required".into()));
        }

        let new_name = self
            .events
            .emit(Event::PreRename, &Value::from(new_name))
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| new_name.to_string());

        self.cursor
            .get_direct(&parse_path(old_name))?
            .rename_direct(&new_name)?;

        self.events.emit(Event::PostRename, &Value::from(new_name));
        Ok(())
    }

    /// Remove a document, returning its last known value (unformatted).
    pub fn destroy(&self, key: &str) -> Result<Value> {
        self.cursor.queue().submit(|| self.destroy_direct(key))
    }

    fn destroy_direct(&self, key: &str) -> Result<Value> {
        let document = self.cursor.get_direct(&parse_path(key))?;
        self.events.emit(Event::PreDestroy, &Value::from(key));

        let last_known = document.json().cloned().unwrap_or(Value::Null);
        if !document.data().is_missing() {
            document.remove_direct()?;
        }

        self.events.emit(Event::PostDestroy, &last_known);
        Ok(last_known)
    }

    // ── Typed API (thin wrappers over the dynamic verbs) ────────────

    pub fn create_typed<T: Serialize>(&self, name: Option<&str>, payload: &T) -> Result<Value> {
        self.create(name, serde_json::to_value(payload)?)
    }

    pub fn read_typed<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let read = self.read(key, ReadOptions { omit: Some(vec![]) })?;
        match read {
            Some(result) => {
                let document = if self.options.inline_id {
                    result
                } else {
                    result
                        .as_array()
                        .and_then(|pair| pair.get(1))
                        .cloned()
                        .unwrap_or(Value::Null)
                };
                Ok(Some(serde_json::from_value(document)?))
            }
            None => Ok(None),
        }
    }

    // ── Reference population & formatting ───────────────────────────

    /// Re-resolve `path` and replace every blueprint-declared reference field
    /// with the document(s) it points at. Resolution failures keep the
    /// original reference value; population never raises.
    fn populate_direct(&self, path: &str) -> Result<Value> {
        let cursor = self.cursor.get_direct(&parse_path(path))?;
        let mut data = cursor.json().cloned().unwrap_or(Value::Null);

        let Some(map) = data.as_object_mut() else {
            return Ok(data);
        };

        for field in &self.referenced {
            let Some(current) = map.get(field) else {
                continue;
            };
            let replaced = match current {
                Value::String(reference) => self.resolve_reference(reference),
                Value::Array(items) => Some(Value::Array(
                    items
                        .iter()
                        .map(|item| {
                            item.as_str()
                                .and_then(|r| self.resolve_reference(r))
                                .unwrap_or_else(|| item.clone())
                        })
                        .collect(),
                )),
                _ => None,
            };
            if let Some(value) = replaced {
                map.insert(field.clone(), value);
            }
        }

        Ok(data)
    }

    /// Resolve a dot-path reference against the store root.
    fn resolve_reference(&self, reference: &str) -> Option<Value> {
        let resolved = Cursor::resolve(
            self.cursor.root(),
            parse_path(reference),
            Arc::clone(self.cursor.queue()),
        );
        match resolved {
            Ok(cursor) => cursor.json().cloned(),
            Err(error) => {
                log::debug!("reference '{reference}' failed to resolve: {error}");
                None
            }
        }
    }

    /// Strip omitted fields and attach the identifier: `_id`-inlined object
    /// when `inline_id`, `[id, document]` pair otherwise.
    fn format(&self, id: &str, document: Value, omit: Option<&[String]>) -> Value {
        let document = self.strip(document, omit);

        if self.options.inline_id {
            let mut inlined = Map::new();
            inlined.insert("_id".into(), Value::from(id));
            if let Value::Object(fields) = document {
                inlined.extend(fields);
            }
            Value::Object(inlined)
        } else {
            Value::Array(vec![Value::from(id), document])
        }
    }

    fn strip(&self, mut document: Value, omit: Option<&[String]>) -> Value {
        let omit = omit.unwrap_or(&self.omitted);
        if let Some(map) = document.as_object_mut() {
            for field in omit {
                map.shift_remove(field);
            }
        }
        document
    }
}
