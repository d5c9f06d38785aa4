//! Debounced mode buttons.
//!
//! Three momentary buttons sit on the encoders. Each accepted press flips one
//! flag in [`WheelModes`]:
//!
//! | Button | Effect |
//! |--------|--------|
//! | level  | switch the level wheel between level and iris |
//! | tilt   | reverse the tilt direction |
//! | pan    | reverse the pan direction |

use crate::encoder::Direction;
use embedded_hal::digital::InputPin;

/// Mode flags toggled by the buttons.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WheelModes {
    /// Level wheel drives `/eos/wheel/level` instead of iris.
    pub level_mode: bool,
    /// Sign applied to pan values.
    pub pan: Direction,
    /// Sign applied to tilt values.
    pub tilt: Direction,
}

/// Press detector for one button.
///
/// A press is accepted on a rising edge when at least the debounce window has
/// passed since the previous accepted press. Releases are never debounced, so
/// they always re-arm detection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Debouncer {
    last_level: bool,
    last_toggle_ms: u32,
}

impl Debouncer {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last_level: false,
            last_toggle_ms: 0,
        }
    }

    /// Feed a sampled level. Returns `true` if this sample is an accepted press.
    pub fn update(&mut self, pressed: bool, now_ms: u32, window_ms: u32) -> bool {
        if pressed == self.last_level {
            return false;
        }
        self.last_level = pressed;

        if pressed && now_ms.wrapping_sub(self.last_toggle_ms) >= window_ms {
            self.last_toggle_ms = now_ms;
            return true;
        }
        false
    }
}

/// The three mode buttons, pressed when the pin reads high.
pub struct ModeButtons<P> {
    level: P,
    tilt: P,
    pan: P,
    level_state: Debouncer,
    tilt_state: Debouncer,
    pan_state: Debouncer,
}

impl<P: InputPin> ModeButtons<P> {
    #[must_use]
    pub fn new(level: P, tilt: P, pan: P) -> Self {
        Self {
            level,
            tilt,
            pan,
            level_state: Debouncer::new(),
            tilt_state: Debouncer::new(),
            pan_state: Debouncer::new(),
        }
    }

    /// Sample all buttons and apply accepted presses to `modes`.
    ///
    /// A button whose pin cannot be read is skipped for this poll.
    pub fn poll(&mut self, now_ms: u32, window_ms: u32, modes: &mut WheelModes) {
        if let Ok(level) = self.level.is_high() {
            if self.level_state.update(level, now_ms, window_ms) {
                modes.level_mode = !modes.level_mode;
                debug!("Level mode: {}", modes.level_mode);
            }
        }

        if let Ok(tilt) = self.tilt.is_high() {
            if self.tilt_state.update(tilt, now_ms, window_ms) {
                modes.tilt = modes.tilt.flipped();
                debug!("Tilt direction: {:?}", modes.tilt);
            }
        }

        if let Ok(pan) = self.pan.is_high() {
            if self.pan_state.update(pan, now_ms, window_ms) {
                modes.pan = modes.pan.flipped();
                debug!("Pan direction: {:?}", modes.pan);
            }
        }
    }
}
