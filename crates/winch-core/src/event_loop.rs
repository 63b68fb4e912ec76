//! Event Loop
//!
//! Single-threaded timer queue driven by virtual time.
//!
//! Every suspension point in winch (throttle windows, registration retries,
//! settle and teardown delays) is a one-shot timer here. Time only moves when
//! the host calls [`EventLoop::tick`] or [`EventLoop::flush`].

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Timer identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u32);

/// One-shot timer
struct Timer {
    id: TimerId,
    due_at: u64,
    callback: Box<dyn FnOnce()>,
}

#[derive(Default)]
struct LoopState {
    /// Pending timers, unordered
    timers: Vec<Timer>,
    /// Last issued timer id
    next_timer_id: u32,
    /// Current virtual time (ms)
    current_time: u64,
}

impl LoopState {
    /// Remove the earliest timer due at or before `limit`.
    ///
    /// Ties on due time resolve in scheduling order.
    fn take_due(&mut self, limit: u64) -> Option<Timer> {
        let index = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due_at <= limit)
            .min_by_key(|(_, t)| (t.due_at, t.id))
            .map(|(i, _)| i)?;
        Some(self.timers.remove(index))
    }
}

/// Virtual-time event loop
///
/// Cloning yields another handle onto the same queue.
#[derive(Clone, Default)]
pub struct EventLoop {
    state: Rc<RefCell<LoopState>>,
}

impl fmt::Debug for EventLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("EventLoop")
            .field("current_time", &state.current_time)
            .field("pending", &state.timers.len())
            .finish()
    }
}

impl EventLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `callback` to run `delay_ms` after the current time
    pub fn set_timeout(&self, delay_ms: u64, callback: impl FnOnce() + 'static) -> TimerId {
        let mut state = self.state.borrow_mut();
        state.next_timer_id += 1;
        let id = TimerId(state.next_timer_id);
        let due_at = state.current_time + delay_ms;
        state.timers.push(Timer {
            id,
            due_at,
            callback: Box::new(callback),
        });
        tracing::trace!("timer {} scheduled for {}ms", id.0, due_at);
        id
    }

    /// Cancel a pending timer.
    ///
    /// Returns false if the timer already ran or was never scheduled.
    pub fn clear_timeout(&self, id: TimerId) -> bool {
        let mut state = self.state.borrow_mut();
        let before = state.timers.len();
        state.timers.retain(|t| t.id != id);
        state.timers.len() < before
    }

    /// Check whether a timer is still waiting to run
    pub fn is_pending(&self, id: TimerId) -> bool {
        self.state.borrow().timers.iter().any(|t| t.id == id)
    }

    /// Number of timers waiting to run
    pub fn pending_count(&self) -> usize {
        self.state.borrow().timers.len()
    }

    /// Current virtual time (ms)
    pub fn now(&self) -> u64 {
        self.state.borrow().current_time
    }

    /// Milliseconds until the next timer falls due
    pub fn next_due_in(&self) -> Option<u64> {
        let state = self.state.borrow();
        state
            .timers
            .iter()
            .map(|t| t.due_at.saturating_sub(state.current_time))
            .min()
    }

    /// Advance time by `delta_ms`, running every timer that falls due on the way.
    ///
    /// Timers scheduled by running callbacks also run if they fall due
    /// inside the window. Returns the number of callbacks run.
    pub fn tick(&self, delta_ms: u64) -> usize {
        let target = self.now() + delta_ms;
        let ran = self.run_until(target);
        self.state.borrow_mut().current_time = target;
        ran
    }

    /// Run everything currently scheduled, advancing time to the latest due timer.
    ///
    /// Timers added while flushing only run if they fall due by then.
    pub fn flush(&self) -> usize {
        let latest = self.state.borrow().timers.iter().map(|t| t.due_at).max();
        let Some(latest) = latest else {
            return 0;
        };
        let ran = self.run_until(latest);
        let mut state = self.state.borrow_mut();
        state.current_time = state.current_time.max(latest);
        ran
    }

    fn run_until(&self, limit: u64) -> usize {
        let mut ran = 0;
        loop {
            // Borrow is released before the callback so it may schedule or cancel
            let timer = {
                let mut state = self.state.borrow_mut();
                let Some(timer) = state.take_due(limit) else {
                    break;
                };
                state.current_time = state.current_time.max(timer.due_at);
                timer
            };
            tracing::trace!("timer {} firing", timer.id.0);
            (timer.callback)();
            ran += 1;
        }
        ran
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_timeout() {
        let event_loop = EventLoop::new();
        let fired = Rc::new(RefCell::new(Vec::new()));

        let log = fired.clone();
        event_loop.set_timeout(100, move || log.borrow_mut().push(1));

        assert_eq!(event_loop.tick(50), 0);
        assert!(fired.borrow().is_empty());

        assert_eq!(event_loop.tick(60), 1);
        assert_eq!(*fired.borrow(), vec![1]);
        assert_eq!(event_loop.now(), 110);
    }

    #[test]
    fn test_due_order_and_ties() {
        let event_loop = EventLoop::new();
        let fired = Rc::new(RefCell::new(Vec::new()));

        for (delay, tag) in [(30, "c"), (10, "a"), (10, "b")] {
            let log = fired.clone();
            event_loop.set_timeout(delay, move || log.borrow_mut().push(tag));
        }

        event_loop.tick(100);
        assert_eq!(*fired.borrow(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_clear_timeout() {
        let event_loop = EventLoop::new();
        let fired = Rc::new(RefCell::new(0));

        let count = fired.clone();
        let id = event_loop.set_timeout(10, move || *count.borrow_mut() += 1);
        assert!(event_loop.is_pending(id));
        assert!(event_loop.clear_timeout(id));
        assert!(!event_loop.clear_timeout(id));

        event_loop.tick(20);
        assert_eq!(*fired.borrow(), 0);
    }

    #[test]
    fn test_nested_scheduling_within_window() {
        let event_loop = EventLoop::new();
        let fired = Rc::new(RefCell::new(Vec::new()));

        let inner_loop = event_loop.clone();
        let log = fired.clone();
        event_loop.set_timeout(10, move || {
            log.borrow_mut().push(inner_loop.now());
            let log = log.clone();
            let clock = inner_loop.clone();
            inner_loop.set_timeout(10, move || log.borrow_mut().push(clock.now()));
        });

        assert_eq!(event_loop.tick(50), 2);
        assert_eq!(*fired.borrow(), vec![10, 20]);
    }

    #[test]
    fn test_flush_stops_at_latest_scheduled() {
        let event_loop = EventLoop::new();
        let fired = Rc::new(RefCell::new(0));

        let inner_loop = event_loop.clone();
        let count = fired.clone();
        event_loop.set_timeout(1000, move || {
            *count.borrow_mut() += 1;
            let count = count.clone();
            inner_loop.set_timeout(1000, move || *count.borrow_mut() += 1);
        });

        assert_eq!(event_loop.flush(), 1);
        assert_eq!(*fired.borrow(), 1);
        assert_eq!(event_loop.pending_count(), 1);
        assert_eq!(event_loop.next_due_in(), Some(1000));

        assert_eq!(event_loop.flush(), 1);
        assert_eq!(*fired.borrow(), 2);
        assert_eq!(event_loop.flush(), 0);
    }
}
