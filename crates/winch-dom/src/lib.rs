//! winch DOM - Minimal Document Object Model
//!
//! Just enough of a page for lazy loading to run against: an element arena
//! with attributes and classes, bounding rectangles, window dimensions,
//! event listeners and a small selector engine.

mod document;
mod events;
mod geometry;
mod selector;

pub use document::{Document, WeakDocument};
pub use events::{Event, EventKind, EventTarget, ListenerId};
pub use geometry::DOMRect;
pub use selector::{SelectorError, SelectorList};

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Root `<html>` element
    pub const ROOT: NodeId = NodeId(0);

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}
