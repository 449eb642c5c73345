//! Navigation stack engine for screen and popup driven clients.
//!
//! - [`navigation`]: the engine, its stack model and the widget contract
//! - [`settings`]: TOML configuration
//! - [`logging`]: JSON run logs through `tracing`

pub mod helpers;
pub mod logging;
pub mod navigation;
pub mod settings;

#[cfg(any(test, feature = "test"))]
pub mod test_helpers;
