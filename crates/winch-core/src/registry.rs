//! Visibility Registry
//!
//! Tracks pending (load, validate) callback pairs per resource key. Many
//! placeholders pointing at the same URL share one fan-out list, so the URL
//! only ever triggers one set of loads.
//!
//! Callbacks are always invoked with the registry borrow released; a load
//! callback may register again and a validator may fire keys.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Action run when a key fires
pub type LoadCallback = Rc<dyn Fn()>;

/// Predicate deciding whether a key may fire now
pub type Validator = Rc<dyn Fn() -> bool>;

/// Per-key registry entry
#[derive(Default)]
struct ResourceEntry {
    load_callbacks: Vec<LoadCallback>,
    validate_callbacks: Vec<Validator>,
    loaded: bool,
}

#[derive(Default)]
struct RegistryState {
    entries: HashMap<String, ResourceEntry>,
    /// Keys in first-registration order
    order: Vec<String>,
}

/// Resource registry shared by every placeholder on a page
#[derive(Clone, Default)]
pub struct VisibilityRegistry {
    state: Rc<RefCell<RegistryState>>,
}

impl fmt::Debug for VisibilityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("VisibilityRegistry")
            .field("keys", &state.order)
            .finish()
    }
}

impl VisibilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a load/validate pair under `key`.
    ///
    /// Returns false without side effects for an empty key. If the key has
    /// already fired, `on_load` runs immediately and nothing is stored.
    pub fn register(&self, key: &str, on_load: LoadCallback, validate: Validator) -> bool {
        if key.is_empty() {
            return false;
        }

        let already_loaded = {
            let mut state = self.state.borrow_mut();
            match state.entries.get_mut(key) {
                Some(entry) if entry.loaded => true,
                Some(entry) => {
                    entry.load_callbacks.push(on_load.clone());
                    entry.validate_callbacks.push(validate);
                    false
                }
                None => {
                    state.entries.insert(
                        key.to_string(),
                        ResourceEntry {
                            load_callbacks: vec![on_load.clone()],
                            validate_callbacks: vec![validate],
                            loaded: false,
                        },
                    );
                    state.order.push(key.to_string());
                    false
                }
            }
        };

        if already_loaded {
            tracing::debug!("{} already loaded, loading late registrant", key);
            on_load();
        } else {
            tracing::debug!("registered {} ({} pending)", key, self.pending_count(key));
        }
        true
    }

    /// Run every queued load for `key` in registration order and mark it loaded.
    ///
    /// Returns the number of load callbacks run. Absent or already-loaded
    /// keys run nothing.
    pub fn fire(&self, key: &str) -> usize {
        let callbacks = {
            let mut state = self.state.borrow_mut();
            let Some(entry) = state.entries.get_mut(key) else {
                return 0;
            };
            let callbacks = std::mem::take(&mut entry.load_callbacks);
            entry.validate_callbacks.clear();
            entry.loaded = true;
            callbacks
        };

        tracing::debug!("firing {} ({} loads)", key, callbacks.len());
        for callback in &callbacks {
            callback();
        }
        callbacks.len()
    }

    /// Run validators and fire any key whose validator passes.
    ///
    /// With `Some(key)` only that key is checked; with `None` every known
    /// key is swept in registration order. Returns the number of keys fired.
    pub fn validate_and_fire(&self, key: Option<&str>) -> usize {
        match key {
            Some(key) => usize::from(self.validate_key(key)),
            None => {
                let keys = self.keys();
                tracing::trace!("validation sweep over {} keys", keys.len());
                keys.iter().filter(|key| self.validate_key(key)).count()
            }
        }
    }

    fn validate_key(&self, key: &str) -> bool {
        let mut fired = false;
        let mut index = 0;
        loop {
            // Re-read live state each step; a fire empties the list
            let validator = {
                let state = self.state.borrow();
                match state.entries.get(key).and_then(|e| e.validate_callbacks.get(index)) {
                    Some(validator) => validator.clone(),
                    None => break,
                }
            };
            if validator() {
                self.fire(key);
                fired = true;
            }
            index += 1;
        }
        fired
    }

    pub fn contains(&self, key: &str) -> bool {
        self.state.borrow().entries.contains_key(key)
    }

    /// Loaded flag for `key`, `None` when the key is unknown
    pub fn is_loaded(&self, key: &str) -> Option<bool> {
        self.state.borrow().entries.get(key).map(|e| e.loaded)
    }

    /// Number of queued load callbacks for `key`
    pub fn pending_count(&self, key: &str) -> usize {
        self.state
            .borrow()
            .entries
            .get(key)
            .map(|e| e.load_callbacks.len())
            .unwrap_or(0)
    }

    /// Known keys in registration order
    pub fn keys(&self) -> Vec<String> {
        self.state.borrow().order.clone()
    }

    pub fn len(&self) -> usize {
        self.state.borrow().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().order.is_empty()
    }
}
