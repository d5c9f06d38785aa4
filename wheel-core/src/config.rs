//! Compile-time tuning for wheel translation, buttons and link liveness.
//!
//! Customize by creating your own const and passing it to
//! [`WheelBridge::new`](crate::WheelBridge::new).

/// Timing and scaling constants used by the bridge.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BridgeConfig {
    /// Numerator of the inverse-time rate factor, `rate = rate_window_ms / elapsed_ms`.
    pub rate_window_ms: u32,
    /// Extra per-tick multiplier applied to tilt.
    pub tilt_scale: i32,
    /// Smallest non-zero magnitude sent for pan and tilt.
    pub min_magnitude: i32,
    /// Maximum change between consecutive pan values before a value is
    /// treated as a glitch. Tilt uses `spike_threshold * tilt_scale`.
    pub spike_threshold: i32,
    /// Multiplier for the level wheel while in level mode.
    pub level_scale: f32,
    /// Minimum time between two accepted presses of the same button.
    pub debounce_ms: u32,
    /// Silence after which a liveness ping is sent.
    pub ping_after_ms: u32,
    /// Silence after which the console is considered gone.
    pub timeout_ms: u32,
}

/// Default configuration matching the Eos wheel box.
pub const DEFAULT_CONFIG: BridgeConfig = BridgeConfig {
    rate_window_ms: 5000,
    tilt_scale: 10,
    min_magnitude: 25,
    spike_threshold: 4000,
    level_scale: 4.0,
    debounce_ms: 50,
    ping_after_ms: 2500,
    timeout_ms: 5000,
};

impl BridgeConfig {
    /// Spike threshold for the tilt axis.
    #[inline]
    #[must_use]
    pub const fn tilt_spike_threshold(&self) -> i32 {
        self.spike_threshold.saturating_mul(self.tilt_scale)
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        DEFAULT_CONFIG
    }
}
