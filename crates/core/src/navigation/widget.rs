//! The lifecycle contract implemented by every navigable view.
//!
//! A widget is opaque to the engine: it only sees the four lifecycle hooks
//! and the visibility flag. Concrete screens and popups live outside this
//! crate and are handed to the engine through a
//! [`WidgetRegistry`](super::registry::WidgetRegistry) factory.

use downcast_rs::{impl_downcast, Downcast};
use serde::Serialize;
use std::fmt;

/// Stable, statically assigned identity of a widget type.
///
/// Ids are plain names chosen at registration time. They are used for
/// registry lookup and for the stack debug string, never as runtime
/// pointers.
///
/// ```
/// use navstack_core::navigation::WidgetTypeId;
///
/// const LOBBY: WidgetTypeId = WidgetTypeId::new("Lobby");
/// assert_eq!(LOBBY.to_string(), "Lobby");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct WidgetTypeId(&'static str);

impl WidgetTypeId {
    pub const fn new(name: &'static str) -> Self {
        WidgetTypeId(name)
    }

    #[inline]
    pub const fn name(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for WidgetTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Initialization payload passed to [`Widget::initialize`].
///
/// The engine never interprets the payload. It wraps a JSON value so callers
/// can pass arbitrary structured data (a banner id, a reward list, ...)
/// without the engine knowing every widget's argument type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WidgetArgs(serde_json::Value);

impl WidgetArgs {
    /// Empty arguments.
    pub fn new() -> Self {
        WidgetArgs(serde_json::Value::Null)
    }

    /// Adds a keyed value, turning the payload into an object if needed.
    pub fn with(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        if !self.0.is_object() {
            self.0 = serde_json::Value::Object(serde_json::Map::new());
        }
        if let serde_json::Value::Object(map) = &mut self.0 {
            map.insert(key.to_string(), value.into());
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        match &self.0 {
            serde_json::Value::Null => true,
            serde_json::Value::Object(map) => map.is_empty(),
            _ => false,
        }
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(serde_json::Value::as_str)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(serde_json::Value::as_i64)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(serde_json::Value::as_bool)
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }
}

impl From<serde_json::Value> for WidgetArgs {
    fn from(value: serde_json::Value) -> Self {
        WidgetArgs(value)
    }
}

/// Failure reported by a widget from one of its lifecycle hooks.
#[derive(thiserror::Error, Debug)]
#[error("{message}")]
pub struct WidgetError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl WidgetError {
    pub fn new(message: impl Into<String>) -> Self {
        WidgetError {
            message: message.into(),
            source: None,
        }
    }

    /// Wraps an underlying error, keeping it reachable through `source()`.
    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        WidgetError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Lifecycle contract for every screen and popup.
///
/// The engine guarantees the following call order for a single instance:
///
/// ```txt
/// initialize ──> show ──> (hide ──> show)* ──> hide ──> release
/// ```
///
/// - `initialize` runs exactly once, before the first `show`.
/// - `show` and `hide` are only called when `is_visible()` disagrees with the
///   requested state.
/// - `release` runs at most once, after the owning context has been removed
///   from the stack for good. The instance is dropped right after.
///
/// All hooks run inside the engine's transition, so they may block (load
/// assets, wait for an animation) and the engine will not return to the
/// caller until they complete. A hook must not call back into the mutating
/// engine API: the nested call is rejected as a concurrent transition.
///
/// Widgets are downcastable, so a caller holding a
/// [`ContextId`](super::context::ContextId) can reach the concrete type
/// through [`NavigationEngine::inspect_widget`](super::engine::NavigationEngine::inspect_widget).
pub trait Widget: Downcast + Send {
    fn initialize(&mut self, args: &WidgetArgs) -> Result<(), WidgetError>;

    fn show(&mut self) -> Result<(), WidgetError>;

    fn hide(&mut self) -> Result<(), WidgetError>;

    fn release(&mut self) -> Result<(), WidgetError>;

    fn is_visible(&self) -> bool;
}

impl_downcast!(Widget);
