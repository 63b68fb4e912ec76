//! Events
//!
//! The handful of event kinds lazy loading reacts to.

use crate::NodeId;

/// Event kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Scroll,
    Resize,
    TransitionStart,
    TransitionEnd,
}

impl EventKind {
    /// Parse an event name, folding vendor-prefixed transition names
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "scroll" => Some(Self::Scroll),
            "resize" => Some(Self::Resize),
            "transitionstart" | "webkittransitionstart" | "otransitionstart" => Some(Self::TransitionStart),
            "transitionend" | "webkittransitionend" | "otransitionend" => Some(Self::TransitionEnd),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Scroll => "scroll",
            Self::Resize => "resize",
            Self::TransitionStart => "transitionstart",
            Self::TransitionEnd => "transitionend",
        }
    }
}

/// Event target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTarget {
    Window,
    Element(NodeId),
}

impl From<NodeId> for EventTarget {
    fn from(node: NodeId) -> Self {
        EventTarget::Element(node)
    }
}

/// Dispatched event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub kind: EventKind,
    pub target: EventTarget,
}

/// Listener handle returned by `add_event_listener`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vendor_transition_names() {
        assert_eq!(EventKind::from_name("webkitTransitionEnd"), Some(EventKind::TransitionEnd));
        assert_eq!(EventKind::from_name("oTransitionStart"), Some(EventKind::TransitionStart));
        assert_eq!(EventKind::from_name("transitionend"), Some(EventKind::TransitionEnd));
        assert_eq!(EventKind::from_name("click"), None);
    }

    #[test]
    fn test_name_round_trip() {
        for kind in [EventKind::Scroll, EventKind::Resize, EventKind::TransitionStart, EventKind::TransitionEnd] {
            assert_eq!(EventKind::from_name(kind.name()), Some(kind));
        }
    }
}
