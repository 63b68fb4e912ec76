//! winch core
//!
//! Engine room of the winch lazy image loader.
//!
//! # Pieces
//! - [`VisibilityRegistry`] - per-URL fan-out of load/validate callbacks
//! - [`classifier`] - decides whether an element box is in view
//! - [`Viewport`] - window dimensions and the overscanned [`MasterBox`]
//! - [`Throttle`] - coalesces bursts of requests into one run per window
//! - [`EventLoop`] - single-threaded virtual-time timer queue
//!
//! # Example
//! ```rust,ignore
//! use winch_core::{Config, WinchContext};
//!
//! let ctx = WinchContext::new(Config::default());
//! ctx.viewport().set_window_view(768.0, 1024.0);
//! let done = ctx.trigger_validation();
//! ctx.event_loop().tick(100);
//! assert!(done.is_resolved());
//! ```

mod bus;
pub mod classifier;
mod completion;
mod config;
mod context;
mod error;
mod event_loop;
mod registry;
mod throttle;
mod viewport;

pub use bus::{SubscriptionId, ValidateBus};
pub use classifier::{VisibilityClass, classify, is_visible};
pub use completion::{Completion, CompletionState};
pub use config::Config;
pub use context::{VALIDATE_ALL, WinchContext};
pub use error::WinchError;
pub use event_loop::{EventLoop, TimerId};
pub use registry::{LoadCallback, Validator, VisibilityRegistry};
pub use throttle::{DEFAULT_DELAY_MS, Task, Throttle, normalize_delay, parse_delay};
pub use viewport::{ElementBox, MasterBox, Overscan, Viewport};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
