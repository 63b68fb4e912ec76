//! Configuration

use serde::{Deserialize, Serialize};

use crate::{Overscan, WinchError};

/// Lazy loading configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Validation coalescing window (ms)
    pub throttle_delay_ms: u64,

    /// Viewport overscan offsets
    pub overscan: Overscan,

    /// Delay between placeholder registration attempts (ms)
    pub register_retry_interval_ms: u64,

    /// Registration attempts before a placeholder force-loads
    pub register_max_attempts: u32,

    /// Wait before a local coordinator resolves nested targets (ms)
    pub settle_delay_ms: u64,

    /// Wait before the global coordinator's first validation (ms)
    pub initial_validation_delay_ms: u64,

    /// Wait after load before a placeholder tears itself down (ms)
    pub teardown_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            throttle_delay_ms: 100,
            overscan: Overscan::default(),
            register_retry_interval_ms: 1000,
            register_max_attempts: 5,
            settle_delay_ms: 300,
            initial_validation_delay_ms: 100,
            teardown_delay_ms: 100,
        }
    }
}

impl Config {
    /// Parse from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, WinchError> {
        serde_json::from_str(json).map_err(|e| WinchError::Config(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, WinchError> {
        serde_json::to_string_pretty(self).map_err(|e| WinchError::Config(e.to_string()))
    }
}
