//! Document - High-level document API
//!
//! A shared handle over an element arena plus the window. Cloning a
//! `Document` clones the handle, not the page.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use url::Url;

use crate::events::{Event, EventKind, EventTarget, ListenerId};
use crate::geometry::DOMRect;
use crate::selector::{ElementSource, SelectorError, SelectorList};
use crate::NodeId;

const DEFAULT_WINDOW_WIDTH: f64 = 1024.0;
const DEFAULT_WINDOW_HEIGHT: f64 = 768.0;

type Handler = Rc<dyn Fn(&Event)>;

/// Element data
#[derive(Debug, Clone)]
struct ElementData {
    tag: String,
    /// Attributes in insertion order; `id` and `class` live here too
    attrs: Vec<(String, String)>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    rect: DOMRect,
}

impl ElementData {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
            parent: None,
            children: Vec::new(),
            rect: DOMRect::default(),
        }
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

struct Listener {
    id: ListenerId,
    target: EventTarget,
    kind: EventKind,
    handler: Handler,
}

struct DocumentState {
    nodes: Vec<ElementData>,
    body: NodeId,
    base_url: String,
    inner_width: f64,
    inner_height: f64,
    listeners: Vec<Listener>,
    next_listener: u64,
}

impl DocumentState {
    fn node(&self, node: NodeId) -> Option<&ElementData> {
        self.nodes.get(node.index())
    }

    fn node_mut(&mut self, node: NodeId) -> Option<&mut ElementData> {
        self.nodes.get_mut(node.index())
    }

    fn detach(&mut self, child: NodeId) {
        let parent = self.node(child).and_then(|c| c.parent);
        if let Some(parent) = parent.and_then(|p| self.node_mut(p)) {
            parent.children.retain(|c| *c != child);
        }
        if let Some(child) = self.node_mut(child) {
            child.parent = None;
        }
    }

    fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.node(id).and_then(|n| n.parent);
        }
        false
    }

    /// Preorder walk of `scope`'s descendants
    fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = match self.node(scope) {
            Some(n) => n.children.iter().rev().copied().collect(),
            None => return out,
        };
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(n) = self.node(id) {
                stack.extend(n.children.iter().rev().copied());
            }
        }
        out
    }
}

impl ElementSource for DocumentState {
    fn tag_name(&self, node: NodeId) -> Option<&str> {
        self.node(node).map(|n| n.tag.as_str())
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.node(node).and_then(|n| n.attribute(name))
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).and_then(|n| n.parent)
    }
}

/// HTML Document
#[derive(Clone)]
pub struct Document {
    state: Rc<RefCell<DocumentState>>,
}

impl Document {
    /// Create a document with `<html>` and `<body>`
    pub fn new(base_url: &str) -> Self {
        let mut html = ElementData::new("html");
        let mut body = ElementData::new("body");
        body.parent = Some(NodeId::ROOT);
        html.children.push(NodeId(1));

        let state = DocumentState {
            nodes: vec![html, body],
            body: NodeId(1),
            base_url: base_url.to_string(),
            inner_width: DEFAULT_WINDOW_WIDTH,
            inner_height: DEFAULT_WINDOW_HEIGHT,
            listeners: Vec::new(),
            next_listener: 1,
        };
        Self {
            state: Rc::new(RefCell::new(state)),
        }
    }

    /// `<html>` element
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// `<body>` element
    pub fn body(&self) -> NodeId {
        self.state.borrow().body
    }

    // ------------------------------------------------------------------
    // Tree
    // ------------------------------------------------------------------

    /// Create a detached element
    pub fn create_element(&self, tag: &str) -> NodeId {
        let mut state = self.state.borrow_mut();
        let id = NodeId(state.nodes.len() as u32);
        state.nodes.push(ElementData::new(tag));
        id
    }

    /// Append `child` to `parent`, moving it out of its current parent.
    /// Returns false when either node is unknown or the move would create a cycle.
    pub fn append_child(&self, parent: NodeId, child: NodeId) -> bool {
        let mut state = self.state.borrow_mut();
        if state.node(parent).is_none() || state.node(child).is_none() {
            return false;
        }
        if state.is_ancestor_or_self(child, parent) {
            return false;
        }
        state.detach(child);
        if let Some(p) = state.node_mut(parent) {
            p.children.push(child);
        }
        if let Some(c) = state.node_mut(child) {
            c.parent = Some(parent);
        }
        true
    }

    /// Detach every child of `node`; returns how many were removed
    pub fn remove_children(&self, node: NodeId) -> usize {
        let mut state = self.state.borrow_mut();
        let children = match state.node_mut(node) {
            Some(n) => std::mem::take(&mut n.children),
            None => return 0,
        };
        for child in &children {
            if let Some(c) = state.node_mut(*child) {
                c.parent = None;
            }
        }
        children.len()
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.state
            .borrow()
            .node(node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.state.borrow().node(node).and_then(|n| n.parent)
    }

    /// Lowercase tag name
    pub fn tag_name(&self, node: NodeId) -> Option<String> {
        self.state.borrow().node(node).map(|n| n.tag.clone())
    }

    // ------------------------------------------------------------------
    // Attributes
    // ------------------------------------------------------------------

    pub fn set_attribute(&self, node: NodeId, name: &str, value: &str) {
        let mut state = self.state.borrow_mut();
        let Some(element) = state.node_mut(node) else {
            return;
        };
        let name = name.to_ascii_lowercase();
        match element.attrs.iter_mut().find(|(n, _)| *n == name) {
            Some((_, v)) => *v = value.to_string(),
            None => element.attrs.push((name, value.to_string())),
        }
    }

    pub fn get_attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.state
            .borrow()
            .node(node)
            .and_then(|n| n.attribute(name))
            .map(str::to_string)
    }

    pub fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.state
            .borrow()
            .node(node)
            .is_some_and(|n| n.attribute(name).is_some())
    }

    pub fn remove_attribute(&self, node: NodeId, name: &str) -> bool {
        let mut state = self.state.borrow_mut();
        let Some(element) = state.node_mut(node) else {
            return false;
        };
        let before = element.attrs.len();
        element.attrs.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        element.attrs.len() != before
    }

    // ------------------------------------------------------------------
    // Class list
    // ------------------------------------------------------------------

    pub fn class_list(&self, node: NodeId) -> Vec<String> {
        self.get_attribute(node, "class")
            .map(|c| c.split_ascii_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.class_list(node).iter().any(|c| c == class)
    }

    /// Add a class; returns false if already present
    pub fn add_class(&self, node: NodeId, class: &str) -> bool {
        let mut classes = self.class_list(node);
        if class.is_empty() || classes.iter().any(|c| c == class) {
            return false;
        }
        classes.push(class.to_string());
        self.set_attribute(node, "class", &classes.join(" "));
        true
    }

    /// Remove a class; returns false if absent
    pub fn remove_class(&self, node: NodeId, class: &str) -> bool {
        let mut classes = self.class_list(node);
        let before = classes.len();
        classes.retain(|c| c != class);
        if classes.len() == before {
            return false;
        }
        self.set_attribute(node, "class", &classes.join(" "));
        true
    }

    // ------------------------------------------------------------------
    // Geometry and window
    // ------------------------------------------------------------------

    pub fn set_bounding_rect(&self, node: NodeId, rect: DOMRect) {
        if let Some(element) = self.state.borrow_mut().node_mut(node) {
            element.rect = rect;
        }
    }

    /// Viewport-relative rectangle (`getBoundingClientRect`)
    pub fn bounding_client_rect(&self, node: NodeId) -> DOMRect {
        self.state
            .borrow()
            .node(node)
            .map(|n| n.rect)
            .unwrap_or_default()
    }

    /// Move `node` and its descendants, as scrolling does to content
    pub fn translate_subtree(&self, node: NodeId, dx: f64, dy: f64) {
        let mut state = self.state.borrow_mut();
        let mut targets = state.descendants(node);
        targets.push(node);
        for id in targets {
            if let Some(element) = state.node_mut(id) {
                element.rect = element.rect.translate(dx, dy);
            }
        }
    }

    pub fn set_window_size(&self, width: f64, height: f64) {
        let mut state = self.state.borrow_mut();
        state.inner_width = width;
        state.inner_height = height;
    }

    pub fn inner_width(&self) -> f64 {
        self.state.borrow().inner_width
    }

    pub fn inner_height(&self) -> f64 {
        self.state.borrow().inner_height
    }

    // ------------------------------------------------------------------
    // URLs
    // ------------------------------------------------------------------

    pub fn base_url(&self) -> String {
        self.state.borrow().base_url.clone()
    }

    /// Resolve `raw` against the base URL. Non-hierarchical or unparsable
    /// bases leave `raw` untouched.
    pub fn resolve_url(&self, raw: &str) -> String {
        let base = self.base_url();
        match Url::parse(&base) {
            Ok(base) if !base.cannot_be_a_base() => base
                .join(raw)
                .map(String::from)
                .unwrap_or_else(|_| raw.to_string()),
            _ => raw.to_string(),
        }
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    pub fn add_event_listener(
        &self,
        target: impl Into<EventTarget>,
        kind: EventKind,
        handler: impl Fn(&Event) + 'static,
    ) -> ListenerId {
        let mut state = self.state.borrow_mut();
        let id = ListenerId(state.next_listener);
        state.next_listener += 1;
        state.listeners.push(Listener {
            id,
            target: target.into(),
            kind,
            handler: Rc::new(handler),
        });
        id
    }

    pub fn remove_event_listener(&self, id: ListenerId) -> bool {
        let mut state = self.state.borrow_mut();
        let before = state.listeners.len();
        state.listeners.retain(|l| l.id != id);
        state.listeners.len() != before
    }

    /// Remove every listener of `kind` on `target`
    pub fn remove_listeners(&self, target: impl Into<EventTarget>, kind: EventKind) -> usize {
        let target = target.into();
        let mut state = self.state.borrow_mut();
        let before = state.listeners.len();
        state.listeners.retain(|l| !(l.target == target && l.kind == kind));
        before - state.listeners.len()
    }

    pub fn listener_count(&self, target: impl Into<EventTarget>, kind: EventKind) -> usize {
        let target = target.into();
        self.state
            .borrow()
            .listeners
            .iter()
            .filter(|l| l.target == target && l.kind == kind)
            .count()
    }

    /// Dispatch an event; returns the number of listeners invoked.
    ///
    /// Listeners see a snapshot taken at dispatch time. One removed by an
    /// earlier listener in the same dispatch is skipped.
    pub fn dispatch(&self, target: impl Into<EventTarget>, kind: EventKind) -> usize {
        let event = Event {
            kind,
            target: target.into(),
        };
        let snapshot: Vec<(ListenerId, Handler)> = self
            .state
            .borrow()
            .listeners
            .iter()
            .filter(|l| l.target == event.target && l.kind == kind)
            .map(|l| (l.id, l.handler.clone()))
            .collect();

        tracing::trace!("dispatch {} to {:?} ({} listeners)", kind.name(), event.target, snapshot.len());

        let mut invoked = 0;
        for (id, handler) in snapshot {
            let live = self.state.borrow().listeners.iter().any(|l| l.id == id);
            if live {
                handler(&event);
                invoked += 1;
            }
        }
        invoked
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// All elements matching `selectors`, in document order
    pub fn query_selector_all(&self, selectors: &str) -> Result<Vec<NodeId>, SelectorError> {
        let list = SelectorList::parse(selectors)?;
        let state = self.state.borrow();
        let mut candidates = vec![NodeId::ROOT];
        candidates.extend(state.descendants(NodeId::ROOT));
        Ok(candidates
            .into_iter()
            .filter(|id| list.matches(*id, &*state))
            .collect())
    }

    /// Descendants of `scope` matching `selectors`, in document order
    pub fn query_selector_all_in(&self, scope: NodeId, selectors: &str) -> Result<Vec<NodeId>, SelectorError> {
        let list = SelectorList::parse(selectors)?;
        let state = self.state.borrow();
        Ok(state
            .descendants(scope)
            .into_iter()
            .filter(|id| list.matches(*id, &*state))
            .collect())
    }
}

/// Non-owning document handle, for listeners that need the page back
#[derive(Clone)]
pub struct WeakDocument {
    state: Weak<RefCell<DocumentState>>,
}

impl WeakDocument {
    pub fn upgrade(&self) -> Option<Document> {
        self.state.upgrade().map(|state| Document { state })
    }
}

impl Document {
    pub fn downgrade(&self) -> WeakDocument {
        WeakDocument {
            state: Rc::downgrade(&self.state),
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new("about:blank")
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Document")
            .field("base_url", &state.base_url)
            .field("nodes", &state.nodes.len())
            .field("listeners", &state.listeners.len())
            .finish()
    }
}
