pub mod case;
pub mod cursor;
pub mod error;
pub mod events;
pub mod ops;
pub mod path;
pub mod queue;
pub mod schema;
pub mod store;
pub mod validation;
pub mod value;

pub use case::CaseFormat;
pub use cursor::{Cursor, CursorData, ValueType};
pub use error::{LeafDbError, Result};
pub use events::Event;
pub use schema::{Blueprint, FieldKind, FieldRule, SchemaOptions};
pub use store::{Collection, FindOptions, Query, ReadOptions, Store};
