//! Encoder ticks to Eos wheel values.
//!
//! Pan and tilt are rate scaled: the faster the wheel turns, the larger each
//! tick becomes. The rate estimate is deliberately coarse:
//!
//! ```text
//! value = ticks * floor(rate_window_ms / elapsed_ms) [* tilt_scale]
//! ```
//!
//! where `elapsed_ms` is measured from a timestamp that is only refreshed on
//! every second call, so it usually spans two ticks. Non-zero results are
//! raised to at least `min_magnitude`, signed by the axis direction, and
//! replaced by zero when they jump further than the spike threshold from the
//! previous value.
//!
//! The level wheel is not rate scaled. It drives either the level or the iris
//! parameter depending on [`WheelModes::level_mode`].

use crate::buttons::WheelModes;
use crate::config::BridgeConfig;
use crate::encoder::Direction;

/// Physical wheel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WheelAxis {
    Pan,
    Tilt,
    Level,
}

/// Console parameter a wheel move is aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WheelTarget {
    Pan,
    Tilt,
    Level,
    Iris,
}

/// A translated wheel move, ready for dispatch.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WheelMove {
    pub target: WheelTarget,
    pub value: f32,
}

/// Rate tracking for one rate-scaled axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxisRate {
    last_sample_ms: u32,
    last_value: i32,
    refresh_next: bool,
}

impl AxisRate {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last_sample_ms: 0,
            last_value: 0,
            refresh_next: false,
        }
    }

    /// Run one tick delta through the rate pipeline.
    ///
    /// `scale` is the extra per-tick multiplier (1 for pan) and `threshold` the
    /// spike limit for this axis.
    pub fn step(
        &mut self,
        ticks: i32,
        now_ms: u32,
        scale: i32,
        threshold: i32,
        direction: Direction,
        config: &BridgeConfig,
    ) -> i32 {
        // A zero interval saturates to the highest rate instead of dividing by zero
        let elapsed = now_ms.wrapping_sub(self.last_sample_ms).max(1);
        let rate = (config.rate_window_ms / elapsed) as i32;

        let mut value = ticks.saturating_mul(rate).saturating_mul(scale);

        let min = config.min_magnitude;
        if value > 0 && value <= min {
            value = min;
        } else if value < 0 && value >= -min {
            value = -min;
        }

        value = value.saturating_mul(direction.sign());

        if value.saturating_sub(self.last_value).unsigned_abs() > threshold.unsigned_abs() {
            debug!("Suppressed wheel spike {} after {}", value, self.last_value);
            value = 0;
        }

        if self.refresh_next {
            self.last_sample_ms = now_ms;
        }
        self.refresh_next = !self.refresh_next;
        self.last_value = value;

        value
    }

    /// Value produced by the previous call.
    #[must_use]
    pub const fn last_value(&self) -> i32 {
        self.last_value
    }
}

/// Per-axis translator state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WheelTranslator {
    pan: AxisRate,
    tilt: AxisRate,
}

impl WheelTranslator {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pan: AxisRate::new(),
            tilt: AxisRate::new(),
        }
    }

    /// Translate a tick delta on `axis` into a wheel move.
    ///
    /// Returns `None` when the resulting value is exactly zero.
    pub fn translate(
        &mut self,
        axis: WheelAxis,
        ticks: i32,
        now_ms: u32,
        modes: &WheelModes,
        config: &BridgeConfig,
    ) -> Option<WheelMove> {
        let (target, value) = match axis {
            WheelAxis::Pan => {
                let v = self.pan.step(
                    ticks,
                    now_ms,
                    1,
                    config.spike_threshold,
                    modes.pan,
                    config,
                );
                (WheelTarget::Pan, v as f32)
            }
            WheelAxis::Tilt => {
                let v = self.tilt.step(
                    ticks,
                    now_ms,
                    config.tilt_scale,
                    config.tilt_spike_threshold(),
                    modes.tilt,
                    config,
                );
                (WheelTarget::Tilt, v as f32)
            }
            WheelAxis::Level if modes.level_mode => {
                (WheelTarget::Level, ticks as f32 * config.level_scale)
            }
            WheelAxis::Level => (WheelTarget::Iris, ticks as f32),
        };

        if value == 0.0 {
            return None;
        }
        Some(WheelMove { target, value })
    }

    /// Rate state of the pan axis.
    #[must_use]
    pub const fn pan(&self) -> &AxisRate {
        &self.pan
    }

    /// Rate state of the tilt axis.
    #[must_use]
    pub const fn tilt(&self) -> &AxisRate {
        &self.tilt
    }
}
