//! Page context
//!
//! Owns one page's event loop, registry, viewport, throttle and validate
//! bus. Components receive it explicitly; tests build isolated instances.

use std::rc::Rc;

use crate::{Completion, Config, EventLoop, Throttle, ValidateBus, Viewport, VisibilityRegistry};

/// Throttle token for the page-wide validation sweep
pub const VALIDATE_ALL: &str = "winch:validate-all";

/// Shared lazy-loading context for one page
#[derive(Debug, Clone)]
pub struct WinchContext {
    config: Rc<Config>,
    event_loop: EventLoop,
    registry: VisibilityRegistry,
    viewport: Viewport,
    throttle: Throttle,
    bus: ValidateBus,
}

impl WinchContext {
    pub fn new(config: Config) -> Self {
        Self::with_event_loop(config, EventLoop::new())
    }

    /// Build on an existing event loop
    pub fn with_event_loop(config: Config, event_loop: EventLoop) -> Self {
        let registry = VisibilityRegistry::new();
        let viewport = Viewport::new(config.overscan);
        let throttle = Throttle::new(event_loop.clone(), config.throttle_delay_ms);

        let sweep = registry.clone();
        throttle.define(VALIDATE_ALL, move || {
            let fired = sweep.validate_and_fire(None);
            tracing::debug!("validation sweep fired {} keys", fired);
        });

        tracing::info!("winch {} context ready", crate::VERSION);
        Self {
            config: Rc::new(config),
            event_loop,
            registry,
            viewport,
            throttle,
            bus: ValidateBus::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn event_loop(&self) -> &EventLoop {
        &self.event_loop
    }

    pub fn registry(&self) -> &VisibilityRegistry {
        &self.registry
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn throttle(&self) -> &Throttle {
        &self.throttle
    }

    pub fn bus(&self) -> &ValidateBus {
        &self.bus
    }

    /// Request a throttled page-wide validation sweep
    pub fn trigger_validation(&self) -> Completion {
        self.throttle
            .throttle(VALIDATE_ALL, self.config.throttle_delay_ms as i64)
    }
}

impl Default for WinchContext {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
