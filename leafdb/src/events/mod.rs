//! Lifecycle events and the per-collection event bus.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

/// Lifecycle events emitted around each document operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    PreCreate,
    PostCreate,
    PreRead,
    PostRead,
    PreFind,
    PostFind,
    PreUpdate,
    PostUpdate,
    PreRename,
    PostRename,
    PreDestroy,
    PostDestroy,
}

/// A registered hook. Returning `Some` from a `pre-*` hook replaces the
/// payload the operation proceeds with; `post-*` returns are ignored.
pub type Hook = Arc<dyn Fn(&Value) -> Option<Value> + Send + Sync>;

/// Ordered hook registry. Hooks fire in registration order; for `pre-*`
/// events the last non-`None` return wins (an override chain, not an
/// accumulator).
#[derive(Default)]
pub struct EventBus {
    hooks: HashMap<Event, Vec<Hook>>,
}

impl EventBus {
    pub fn new() -> Self {
        EventBus::default()
    }

    pub fn on(&mut self, event: Event, hook: Hook) {
        self.hooks.entry(event).or_default().push(hook);
    }

    /// Fire every hook for `event` with `payload`, returning the last
    /// non-`None` hook result.
    pub fn emit(&self, event: Event, payload: &Value) -> Option<Value> {
        let mut last = None;
        for hook in self.hooks.get(&event).into_iter().flatten() {
            if let Some(replaced) = hook(payload) {
                last = Some(replaced);
            }
        }
        last
    }
}
