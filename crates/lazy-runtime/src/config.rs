//! Runtime Configuration

use serde::Deserialize;
use std::time::Duration;

/// Page runtime configuration options
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Viewport width (px)
    pub viewport_width: f64,

    /// Viewport height (px)
    pub viewport_height: f64,

    /// Document URL; image sources resolve against it
    pub base_url: String,

    /// Simulated time for an image fetch to settle (ms)
    pub image_latency_ms: u64,

    /// Interval between intersection checks while time advances (ms)
    pub frame_ms: u64,
}

impl RuntimeConfig {
    pub fn image_latency(&self) -> Duration {
        Duration::from_millis(self.image_latency_ms)
    }

    pub fn frame(&self) -> Duration {
        Duration::from_millis(self.frame_ms.max(1))
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            viewport_width: 1024.0,
            viewport_height: 768.0,
            base_url: "http://localhost/".to_string(),
            image_latency_ms: 50,
            frame_ms: 16,
        }
    }
}
