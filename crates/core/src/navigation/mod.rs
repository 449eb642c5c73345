//! Screen and popup navigation.
//!
//! This module tracks which full-screen views and overlay popups are live,
//! enforces their ordering and mediates every push, pop and back request of
//! the client.
//!
//! The implementation is split into:
//! - [`widget`]: the lifecycle contract every navigable view implements
//! - [`context`] and [`stack`]: the stack entries and their ordered storage
//! - [`transition`]: the lock serializing mutations
//! - [`engine`]: the coordinator callers talk to
//! - [`snapshot`] and [`event`]: the read-only surface for observers
//!
//! # Example
//!
//! ```
//! use navstack_core::navigation::{
//!     NavigationEngine, Widget, WidgetArgs, WidgetError, WidgetRegistry, WidgetTypeId,
//! };
//! use navstack_core::settings::NavigationSettings;
//!
//! #[derive(Default)]
//! struct Page {
//!     visible: bool,
//! }
//!
//! impl Widget for Page {
//!     fn initialize(&mut self, _args: &WidgetArgs) -> Result<(), WidgetError> {
//!         Ok(())
//!     }
//!     fn show(&mut self) -> Result<(), WidgetError> {
//!         self.visible = true;
//!         Ok(())
//!     }
//!     fn hide(&mut self) -> Result<(), WidgetError> {
//!         self.visible = false;
//!         Ok(())
//!     }
//!     fn release(&mut self) -> Result<(), WidgetError> {
//!         Ok(())
//!     }
//!     fn is_visible(&self) -> bool {
//!         self.visible
//!     }
//! }
//!
//! const TITLE: WidgetTypeId = WidgetTypeId::new("Title");
//! const GACHA_RESULT: WidgetTypeId = WidgetTypeId::new("GachaResult");
//!
//! let mut registry = WidgetRegistry::new();
//! registry.register(TITLE, Page::default);
//! registry.register(GACHA_RESULT, Page::default);
//!
//! let engine = NavigationEngine::new(registry, NavigationSettings::default());
//! engine.push_screen(TITLE, WidgetArgs::new())?;
//! engine.push_popup(GACHA_RESULT, WidgetArgs::new().with("pulls", 10))?;
//! assert_eq!(engine.stack_debug_string(), "Screen:Title > Popup:GachaResult");
//!
//! assert!(engine.back()?);
//! assert!(!engine.back()?);
//! # Ok::<(), navstack_core::navigation::NavigationError>(())
//! ```

pub mod context;
pub mod engine;
pub mod error;
pub mod event;
pub mod registry;
pub mod snapshot;
pub mod stack;
pub mod transition;
pub mod widget;

pub use context::{ContextId, ContextInfo, ContextKind, NavigationContext};
pub use engine::NavigationEngine;
pub use error::{LifecyclePhase, NavigationError};
pub use event::NavigationEvent;
pub use registry::WidgetRegistry;
pub use snapshot::StackSnapshot;
pub use stack::NavigationStack;
pub use transition::{NavigationOp, TransitionState};
pub use widget::{Widget, WidgetArgs, WidgetError, WidgetTypeId};
