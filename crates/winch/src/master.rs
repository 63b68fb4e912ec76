//! Global coordinator
//!
//! Page-wide listeners: window resize keeps the viewport current, and
//! scrolling the window or any surrogate scroller requests a validation.

use std::cell::RefCell;
use std::fmt;

use winch_core::{TimerId, WinchContext, WinchError};
use winch_dom::{Document, EventKind, EventTarget, ListenerId};

use crate::targets;

/// Page-wide scroll/resize coordinator
pub struct GlobalCoordinator {
    ctx: WinchContext,
    doc: Document,
    listeners: RefCell<Vec<ListenerId>>,
    initial_timer: RefCell<Option<TimerId>>,
    errors: Vec<WinchError>,
}

impl GlobalCoordinator {
    /// Attach to the window, plus every element matched by `surrogates`
    pub fn attach(ctx: &WinchContext, doc: &Document, surrogates: Option<&str>) -> Self {
        let mut errors = Vec::new();
        let mut scrollers = vec![EventTarget::Window];
        if let Some(list) = surrogates {
            match targets::resolve(doc, None, list) {
                Ok(nodes) => scrollers.extend(nodes.into_iter().map(EventTarget::from)),
                Err(err) => {
                    tracing::error!("{}", err);
                    errors.push(err);
                }
            }
        }

        set_window_view(ctx, doc);

        let mut listeners = Vec::new();
        for target in &scrollers {
            listeners.extend(targets::watch(ctx, doc, *target, &[EventKind::Scroll]));
        }

        let resize_ctx = ctx.clone();
        let page = doc.downgrade();
        listeners.push(doc.add_event_listener(EventTarget::Window, EventKind::Resize, move |_| {
            if let Some(doc) = page.upgrade() {
                set_window_view(&resize_ctx, &doc);
            }
            resize_ctx.trigger_validation();
        }));

        let initial_ctx = ctx.clone();
        let initial = ctx
            .event_loop()
            .set_timeout(ctx.config().initial_validation_delay_ms, move || {
                initial_ctx.trigger_validation();
            });

        tracing::debug!("global coordinator attached to {} scrollers", scrollers.len());
        Self {
            ctx: ctx.clone(),
            doc: doc.clone(),
            listeners: RefCell::new(listeners),
            initial_timer: RefCell::new(Some(initial)),
            errors,
        }
    }

    /// Selector failures seen during attach
    pub fn errors(&self) -> &[WinchError] {
        &self.errors
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Remove every listener and cancel the initial validation
    pub fn dispose(&self) {
        if let Some(timer) = self.initial_timer.borrow_mut().take() {
            self.ctx.event_loop().clear_timeout(timer);
        }
        let listeners = std::mem::take(&mut *self.listeners.borrow_mut());
        for id in &listeners {
            self.doc.remove_event_listener(*id);
        }
        tracing::debug!("global coordinator detached {} listeners", listeners.len());
    }
}

fn set_window_view(ctx: &WinchContext, doc: &Document) {
    ctx.viewport().set_window_view(doc.inner_height(), doc.inner_width());
}

impl fmt::Debug for GlobalCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlobalCoordinator")
            .field("listeners", &self.listeners.borrow().len())
            .field("errors", &self.errors)
            .finish()
    }
}
