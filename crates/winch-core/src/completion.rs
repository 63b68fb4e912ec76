//! Completion
//!
//! Shared completion handle handed out by the throttle. Every caller that
//! lands in the same throttle window holds a clone of one `Completion`.

use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use crate::WinchError;

/// Completion state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CompletionState {
    #[default]
    Pending,
    Resolved,
    Rejected(WinchError),
}

type SettleCallback = Box<dyn FnOnce(&Result<(), WinchError>)>;

#[derive(Default)]
struct Inner {
    state: CompletionState,
    wakers: Vec<Waker>,
    callbacks: Vec<SettleCallback>,
}

/// Shared, clonable completion signal
///
/// Settles at most once. Can be polled via [`Completion::state`], observed
/// with [`Completion::on_settled`], or awaited.
#[derive(Clone, Default)]
pub struct Completion {
    inner: Rc<RefCell<Inner>>,
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Completion").field(&self.inner.borrow().state).finish()
    }
}

impl Completion {
    /// Create a pending completion
    pub fn pending() -> Self {
        Self::default()
    }

    /// Create an already-resolved completion
    pub fn resolved() -> Self {
        let completion = Self::default();
        completion.resolve();
        completion
    }

    /// Create an already-rejected completion
    pub fn rejected(error: WinchError) -> Self {
        let completion = Self::default();
        completion.reject(error);
        completion
    }

    pub fn state(&self) -> CompletionState {
        self.inner.borrow().state.clone()
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.inner.borrow().state, CompletionState::Pending)
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.inner.borrow().state, CompletionState::Resolved)
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self.inner.borrow().state, CompletionState::Rejected(_))
    }

    /// Resolve; no-op (returns false) once settled
    pub fn resolve(&self) -> bool {
        self.settle(CompletionState::Resolved)
    }

    /// Reject; no-op (returns false) once settled
    pub fn reject(&self, error: WinchError) -> bool {
        self.settle(CompletionState::Rejected(error))
    }

    /// Run `callback` once settled (immediately if already settled)
    pub fn on_settled(&self, callback: impl FnOnce(&Result<(), WinchError>) + 'static) {
        match self.outcome() {
            Some(outcome) => callback(&outcome),
            None => self.inner.borrow_mut().callbacks.push(Box::new(callback)),
        }
    }

    /// Whether two handles refer to the same completion
    pub fn ptr_eq(&self, other: &Completion) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn outcome(&self) -> Option<Result<(), WinchError>> {
        match &self.inner.borrow().state {
            CompletionState::Pending => None,
            CompletionState::Resolved => Some(Ok(())),
            CompletionState::Rejected(error) => Some(Err(error.clone())),
        }
    }

    fn settle(&self, state: CompletionState) -> bool {
        let (callbacks, wakers) = {
            let mut inner = self.inner.borrow_mut();
            if inner.state != CompletionState::Pending {
                return false;
            }
            inner.state = state;
            (
                std::mem::take(&mut inner.callbacks),
                std::mem::take(&mut inner.wakers),
            )
        };

        if let Some(outcome) = self.outcome() {
            for callback in callbacks {
                callback(&outcome);
            }
        }
        for waker in wakers {
            waker.wake();
        }
        true
    }
}

impl Future for Completion {
    type Output = Result<(), WinchError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if let Some(outcome) = self.outcome() {
            return Poll::Ready(outcome);
        }
        let mut inner = self.inner.borrow_mut();
        if !inner.wakers.iter().any(|w| w.will_wake(cx.waker())) {
            inner.wakers.push(cx.waker().clone());
        }
        Poll::Pending
    }
}
