//! Throttle
//!
//! Merges repeated requests for the same operation into a single delayed
//! run. Operations are named by an explicit token; at most one run per
//! token is pending at any time, and every request made while it is pending
//! receives the same [`Completion`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::{Completion, EventLoop, TimerId, WinchError};

/// Fallback window when a requested delay is not a positive integer
pub const DEFAULT_DELAY_MS: u64 = 100;

/// Throttled operation
pub type Task = Rc<dyn Fn()>;

/// Normalize a raw delay, substituting `default` for non-positive values
pub fn normalize_delay(raw: i64, default: u64) -> u64 {
    if raw <= 0 { default } else { raw as u64 }
}

/// Parse a textual delay the same way
pub fn parse_delay(raw: &str, default: u64) -> u64 {
    raw.trim()
        .parse::<i64>()
        .map(|ms| normalize_delay(ms, default))
        .unwrap_or(default)
}

struct PendingRun {
    completion: Completion,
    timer: TimerId,
}

#[derive(Default)]
struct ThrottleState {
    operations: HashMap<String, Task>,
    pending: HashMap<String, PendingRun>,
}

/// Token-keyed throttle
#[derive(Clone)]
pub struct Throttle {
    event_loop: EventLoop,
    default_delay: u64,
    state: Rc<RefCell<ThrottleState>>,
}

impl fmt::Debug for Throttle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Throttle")
            .field("default_delay", &self.default_delay)
            .field("operations", &state.operations.len())
            .field("pending", &state.pending.len())
            .finish()
    }
}

impl Throttle {
    /// Create a throttle on `event_loop`.
    ///
    /// A zero `default_delay` falls back to [`DEFAULT_DELAY_MS`].
    pub fn new(event_loop: EventLoop, default_delay: u64) -> Self {
        Self {
            event_loop,
            default_delay: if default_delay == 0 { DEFAULT_DELAY_MS } else { default_delay },
            state: Rc::new(RefCell::new(ThrottleState::default())),
        }
    }

    pub fn default_delay(&self) -> u64 {
        self.default_delay
    }

    /// Bind `task` to `token`, replacing any previous binding
    pub fn define(&self, token: &str, task: impl Fn() + 'static) {
        self.state
            .borrow_mut()
            .operations
            .insert(token.to_string(), Rc::new(task));
    }

    /// Remove the binding for `token`.
    ///
    /// A run that is already pending still completes with the task it captured.
    pub fn undefine(&self, token: &str) -> bool {
        self.state.borrow_mut().operations.remove(token).is_some()
    }

    pub fn is_defined(&self, token: &str) -> bool {
        self.state.borrow().operations.contains_key(token)
    }

    pub fn is_pending(&self, token: &str) -> bool {
        self.state.borrow().pending.contains_key(token)
    }

    /// Request a run of `token` after `delay_ms`.
    ///
    /// While a run is pending the same completion is returned and `delay_ms`
    /// is ignored. Undefined tokens yield a completion rejected with
    /// [`WinchError::NotAFunction`].
    pub fn throttle(&self, token: &str, delay_ms: i64) -> Completion {
        let task = {
            let state = self.state.borrow();
            if let Some(pending) = state.pending.get(token) {
                tracing::trace!("throttle {}: coalesced into pending run", token);
                return pending.completion.clone();
            }
            match state.operations.get(token) {
                Some(task) => task.clone(),
                None => {
                    tracing::debug!("throttle {}: no operation defined", token);
                    return Completion::rejected(WinchError::NotAFunction);
                }
            }
        };

        let delay = normalize_delay(delay_ms, self.default_delay);
        let completion = Completion::pending();

        let state = Rc::downgrade(&self.state);
        let owned_token = token.to_string();
        let signal = completion.clone();
        let timer = self.event_loop.set_timeout(delay, move || {
            task();
            signal.resolve();
            if let Some(state) = state.upgrade() {
                state.borrow_mut().pending.remove(&owned_token);
            }
        });

        tracing::trace!("throttle {}: scheduled in {}ms", token, delay);
        self.state.borrow_mut().pending.insert(
            token.to_string(),
            PendingRun {
                completion: completion.clone(),
                timer,
            },
        );
        completion
    }

    /// Timer backing the pending run of `token`
    pub fn pending_timer(&self, token: &str) -> Option<TimerId> {
        self.state.borrow().pending.get(token).map(|p| p.timer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn counting_throttle() -> (EventLoop, Throttle, Rc<Cell<usize>>) {
        let event_loop = EventLoop::new();
        let throttle = Throttle::new(event_loop.clone(), DEFAULT_DELAY_MS);
        let runs = Rc::new(Cell::new(0));
        let counter = runs.clone();
        throttle.define("op", move || counter.set(counter.get() + 1));
        (event_loop, throttle, runs)
    }

    #[test]
    fn test_normalize_delay() {
        assert_eq!(normalize_delay(250, 100), 250);
        assert_eq!(normalize_delay(0, 100), 100);
        assert_eq!(normalize_delay(-5, 100), 100);
        assert_eq!(parse_delay("40", 100), 40);
        assert_eq!(parse_delay(" 40 ", 100), 40);
        assert_eq!(parse_delay("-1", 100), 100);
        assert_eq!(parse_delay("soon", 100), 100);
    }

    #[test]
    fn test_coalesces_within_window() {
        let (event_loop, throttle, runs) = counting_throttle();

        let first = throttle.throttle("op", 100);
        let second = throttle.throttle("op", 5000);
        assert!(first.ptr_eq(&second));
        assert!(throttle.is_pending("op"));
        let timer = throttle.pending_timer("op").unwrap();
        assert!(event_loop.is_pending(timer));
        assert_eq!(event_loop.pending_count(), 1);

        event_loop.tick(99);
        assert_eq!(runs.get(), 0);
        assert!(first.is_pending());

        event_loop.tick(1);
        assert_eq!(runs.get(), 1);
        assert!(second.is_resolved());
        assert!(!throttle.is_pending("op"));
        assert_eq!(throttle.pending_timer("op"), None);
        assert!(!event_loop.is_pending(timer));
    }

    #[test]
    fn test_new_window_after_fire() {
        let (event_loop, throttle, runs) = counting_throttle();

        let first = throttle.throttle("op", 100);
        event_loop.tick(100);
        let second = throttle.throttle("op", 100);
        assert!(!first.ptr_eq(&second));

        event_loop.tick(100);
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn test_negative_delay_uses_default() {
        let (event_loop, throttle, runs) = counting_throttle();

        throttle.throttle("op", -5);
        event_loop.tick(99);
        assert_eq!(runs.get(), 0);
        event_loop.tick(1);
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn test_undefined_operation_rejects() {
        let (event_loop, throttle, runs) = counting_throttle();

        let completion = throttle.throttle("missing", 100);
        assert_eq!(
            completion.state(),
            crate::CompletionState::Rejected(WinchError::NotAFunction)
        );
        assert_eq!(event_loop.pending_count(), 0);
        assert_eq!(runs.get(), 0);
    }

    #[test]
    fn test_tokens_are_independent() {
        let (event_loop, throttle, runs) = counting_throttle();
        let counter = runs.clone();
        throttle.define("other", move || counter.set(counter.get() + 10));

        let a = throttle.throttle("op", 100);
        let b = throttle.throttle("other", 50);
        assert!(!a.ptr_eq(&b));

        event_loop.tick(50);
        assert_eq!(runs.get(), 10);
        event_loop.tick(50);
        assert_eq!(runs.get(), 11);
    }
}
