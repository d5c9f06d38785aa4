//! Quadrature decoding for the pan, tilt and level wheels.

use embedded_hal::digital::InputPin;

/// Which way counts as forward, for an encoder or a wheel axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    #[default]
    Forward,
    Reverse,
}

impl Direction {
    /// `1` for forward, `-1` for reverse.
    #[inline]
    #[must_use]
    pub const fn sign(self) -> i32 {
        match self {
            Self::Forward => 1,
            Self::Reverse => -1,
        }
    }

    /// The opposite direction.
    #[inline]
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Forward => Self::Reverse,
            Self::Reverse => Self::Forward,
        }
    }
}

/// Pin history for one encoder.
///
/// Motion is reported only when channel A changes. The direction comes from
/// the *previous* levels: equal A and B means reverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct QuadratureState {
    prev_a: bool,
    prev_b: bool,
    direction: Direction,
}

impl QuadratureState {
    /// Seed the history with the current pin levels.
    #[must_use]
    pub const fn new(a: bool, b: bool, direction: Direction) -> Self {
        Self {
            prev_a: a,
            prev_b: b,
            direction,
        }
    }

    /// Feed freshly sampled levels, returning `-1`, `0` or `1`.
    pub fn update(&mut self, a: bool, b: bool) -> i8 {
        let mut motion = 0;
        if a != self.prev_a {
            motion = if self.prev_a == self.prev_b { -1 } else { 1 };
            if self.direction == Direction::Reverse {
                motion = -motion;
            }
        }
        self.prev_a = a;
        self.prev_b = b;
        motion
    }

    /// Configured orientation.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }
}

/// A rotary encoder wired to two digital inputs.
pub struct Encoder<A, B> {
    pin_a: A,
    pin_b: B,
    state: QuadratureState,
}

impl<A: InputPin, B: InputPin> Encoder<A, B> {
    /// Create an encoder, seeding its history from the pins so the first
    /// poll never reports motion.
    pub fn new(mut pin_a: A, mut pin_b: B, direction: Direction) -> Self {
        let a = pin_a.is_high().unwrap_or(false);
        let b = pin_b.is_high().unwrap_or(false);
        Self {
            pin_a,
            pin_b,
            state: QuadratureState::new(a, b, direction),
        }
    }

    /// Sample both pins and return the motion since the last poll.
    ///
    /// A failed pin read reports no motion and keeps the previous levels.
    pub fn poll(&mut self) -> i8 {
        match (self.pin_a.is_high(), self.pin_b.is_high()) {
            (Ok(a), Ok(b)) => self.state.update(a, b),
            _ => 0,
        }
    }

    /// Current decoder state.
    #[must_use]
    pub fn state(&self) -> &QuadratureState {
        &self.state
    }
}
