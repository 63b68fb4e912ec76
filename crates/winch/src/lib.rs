//! winch - Lazy image loading
//!
//! Placeholders register with the visibility registry of a
//! [`WinchContext`]; coordinators turn scroll, resize and transition
//! events into throttled validation sweeps that load whatever came into
//! view.
//!
//! ```
//! use winch::{Document, LazyImage, LazyImageOptions, WinchContext, Config};
//!
//! let ctx = WinchContext::new(Config::default());
//! let doc = Document::new("https://example.com/");
//! let node = doc.create_element("winch-img");
//! doc.set_attribute(node, "src", "cat.png");
//! doc.append_child(doc.body(), node);
//!
//! let image = LazyImage::create(&ctx, &doc, node, LazyImageOptions::default());
//! ctx.trigger_validation();
//! ctx.event_loop().flush();
//! assert!(image.is_loaded());
//! ```

mod filter;
mod master;
mod mount;
mod placeholder;
mod scroll_trigger;
mod targets;

pub use filter::winchify;
pub use master::GlobalCoordinator;
pub use mount::Mount;
pub use placeholder::{
    IMAGE_CLASS, LOADED_CLASS, LazyImage, LazyImageOptions, LoadedHook, NOT_LOADED_CLASS, SOURCE_ATTRIBUTES,
    SourceFn,
};
pub use scroll_trigger::LocalCoordinator;

pub use winch_core::{Completion, Config, EventLoop, VALIDATE_ALL, WinchContext, WinchError};
pub use winch_dom::{DOMRect, Document, EventKind, EventTarget, NodeId};
