//! Console-specific wheel message construction.

use crate::translate::{WheelMove, WheelTarget};
use osc_proto::OscMessage;

pub const EOS_PAN_ADDRESS: &str = "/eos/wheel/fine/pan";
pub const EOS_TILT_ADDRESS: &str = "/eos/wheel/fine/tilt";
pub const EOS_LEVEL_ADDRESS: &str = "/eos/wheel/level";
pub const EOS_IRIS_ADDRESS: &str = "/eos/wheel/coarse/iris";

/// Console family on the other end of the link.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConsoleKind {
    /// No handshake seen yet (or the link timed out).
    #[default]
    None,
    Eos,
    Cobalt,
    ColorSource,
}

impl ConsoleKind {
    /// Build the message for `mv` in this console's dialect.
    ///
    /// `None` uses the Eos dialect: the startup `OK` can connect a console that
    /// never sends another handshake query. Cobalt and ColorSource are not
    /// implemented and produce nothing.
    #[must_use]
    pub fn wheel_message(self, mv: &WheelMove) -> Option<OscMessage<'static>> {
        match self {
            Self::None | Self::Eos => Some(eos_wheel_message(mv)),
            Self::Cobalt | Self::ColorSource => {
                debug!("No wheel dialect for {:?}, dropping move", self);
                None
            }
        }
    }
}

fn eos_wheel_message(mv: &WheelMove) -> OscMessage<'static> {
    let address = match mv.target {
        WheelTarget::Pan => EOS_PAN_ADDRESS,
        WheelTarget::Tilt => EOS_TILT_ADDRESS,
        WheelTarget::Level => EOS_LEVEL_ADDRESS,
        WheelTarget::Iris => EOS_IRIS_ADDRESS,
    };
    OscMessage::float(address, mv.value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mv(target: WheelTarget, value: f32) -> WheelMove {
        WheelMove { target, value }
    }

    #[test]
    fn test_eos_addresses() {
        let cases = [
            (WheelTarget::Pan, EOS_PAN_ADDRESS),
            (WheelTarget::Tilt, EOS_TILT_ADDRESS),
            (WheelTarget::Level, EOS_LEVEL_ADDRESS),
            (WheelTarget::Iris, EOS_IRIS_ADDRESS),
        ];
        for (target, address) in cases {
            let msg = ConsoleKind::Eos.wheel_message(&mv(target, 25.0)).unwrap();
            assert_eq!(msg, OscMessage::float(address, 25.0));
        }
    }

    #[test]
    fn test_unconnected_uses_eos() {
        let msg = ConsoleKind::None
            .wheel_message(&mv(WheelTarget::Pan, -25.0))
            .unwrap();
        assert_eq!(msg, OscMessage::float("/eos/wheel/fine/pan", -25.0));
    }

    #[test]
    fn test_unimplemented_consoles_are_noops() {
        let m = mv(WheelTarget::Tilt, 50.0);
        assert_eq!(ConsoleKind::Cobalt.wheel_message(&m), None);
        assert_eq!(ConsoleKind::ColorSource.wheel_message(&m), None);
    }
}
