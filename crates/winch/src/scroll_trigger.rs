//! Local coordinator
//!
//! Watches one scrolling container, and optionally selected descendants,
//! for scroll and transition activity.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use winch_core::{TimerId, WinchContext, WinchError};
use winch_dom::{Document, EventKind, EventTarget, ListenerId, NodeId};

use crate::targets;

const WATCHED: [EventKind; 3] = [EventKind::Scroll, EventKind::TransitionStart, EventKind::TransitionEnd];

#[derive(Default)]
struct TriggerState {
    targets: Vec<NodeId>,
    listeners: Vec<ListenerId>,
    settle_timer: Option<TimerId>,
    errors: Vec<WinchError>,
}

struct Inner {
    ctx: WinchContext,
    doc: Document,
    element: NodeId,
    state: RefCell<TriggerState>,
}

impl Inner {
    fn watch(&self, node: NodeId) {
        let ids = targets::watch(&self.ctx, &self.doc, EventTarget::Element(node), &WATCHED);
        let mut state = self.state.borrow_mut();
        state.targets.push(node);
        state.listeners.extend(ids);
    }

    fn settle(&self, selectors: &str) {
        self.state.borrow_mut().settle_timer = None;
        match targets::resolve(&self.doc, Some(self.element), selectors) {
            Ok(nodes) => {
                tracing::debug!("scroll trigger watching {} nested targets", nodes.len());
                for node in nodes {
                    self.watch(node);
                }
            }
            Err(err) => {
                tracing::error!("{}", err);
                self.state.borrow_mut().errors.push(err);
            }
        }
    }
}

/// Scroll/transition coordinator for one element
#[derive(Clone)]
pub struct LocalCoordinator {
    inner: Rc<Inner>,
}

impl LocalCoordinator {
    /// Watch `element` now; after the settle delay, also watch its
    /// descendants matching `selectors`
    pub fn attach(ctx: &WinchContext, doc: &Document, element: NodeId, selectors: Option<&str>) -> Self {
        let inner = Rc::new(Inner {
            ctx: ctx.clone(),
            doc: doc.clone(),
            element,
            state: RefCell::new(TriggerState::default()),
        });
        inner.watch(element);

        if let Some(list) = selectors.filter(|s| !s.trim().is_empty()) {
            let weak: Weak<Inner> = Rc::downgrade(&inner);
            let list = list.to_string();
            let timer = ctx.event_loop().set_timeout(ctx.config().settle_delay_ms, move || {
                if let Some(inner) = weak.upgrade() {
                    inner.settle(&list);
                }
            });
            inner.state.borrow_mut().settle_timer = Some(timer);
        }

        tracing::debug!("scroll trigger attached to {:?}", element);
        Self { inner }
    }

    pub fn element(&self) -> NodeId {
        self.inner.element
    }

    /// Every watched element, the primary first
    pub fn targets(&self) -> Vec<NodeId> {
        self.inner.state.borrow().targets.clone()
    }

    /// Selector failures from the settle pass
    pub fn errors(&self) -> Vec<WinchError> {
        self.inner.state.borrow().errors.clone()
    }

    pub fn listener_count(&self) -> usize {
        self.inner.state.borrow().listeners.len()
    }

    /// Cancel the settle timer and remove every listener
    pub fn dispose(&self) {
        let (timer, listeners) = {
            let mut state = self.inner.state.borrow_mut();
            (state.settle_timer.take(), std::mem::take(&mut state.listeners))
        };
        if let Some(timer) = timer {
            self.inner.ctx.event_loop().clear_timeout(timer);
        }
        for id in &listeners {
            self.inner.doc.remove_event_listener(*id);
        }
        tracing::debug!("scroll trigger detached {} listeners", listeners.len());
    }
}

impl fmt::Debug for LocalCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("LocalCoordinator")
            .field("element", &self.inner.element)
            .field("targets", &state.targets)
            .field("errors", &state.errors)
            .finish()
    }
}
