//! Console handshake and link liveness.
//!
//! The console announces itself with a packet containing `ETCOSC?`, which we
//! answer with a raw `OK`. After that, any inbound packet counts as proof of
//! life. When the console goes quiet we ping once, and if it stays quiet we
//! drop back to [`LinkState::Disconnected`] and wait for the next handshake.
//!
//! ```text
//!                 handshake
//! Disconnected ─────────────▶ Connected
//!      ▲                         │ silence > ping_after_ms: ping (once)
//!      └─────────────────────────┘ silence > timeout_ms
//! ```

use crate::config::BridgeConfig;
use crate::dispatch::ConsoleKind;
use osc_proto::OscMessage;

/// Substring identifying a handshake query.
pub const HANDSHAKE_QUERY: &[u8] = b"ETCOSC?";

/// Raw payload sent in reply to a handshake query.
pub const HANDSHAKE_REPLY: &[u8] = b"OK";

pub const PING_ADDRESS: &str = "/eos/ping";

/// Ping argument identifying this box.
pub const PING_TAG: &str = "box1_hello";

/// Liveness ping message.
#[must_use]
pub const fn ping_message() -> OscMessage<'static> {
    OscMessage::string(PING_ADDRESS, PING_TAG)
}

/// Coarse link state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkState {
    Disconnected,
    Connected,
}

/// Action the caller must carry out for the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkEvent {
    /// Send [`HANDSHAKE_REPLY`].
    Handshake,
    /// Send [`ping_message()`].
    Ping,
    /// The console went silent; state has been reset.
    TimedOut,
}

/// Link liveness tracker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkMonitor {
    console: ConsoleKind,
    last_rx_ms: Option<u32>,
    ping_sent: bool,
}

impl LinkMonitor {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            console: ConsoleKind::None,
            last_rx_ms: None,
            ping_sent: false,
        }
    }

    /// Record an inbound packet.
    ///
    /// Returns [`LinkEvent::Handshake`] if the packet is a handshake query.
    pub fn on_packet(&mut self, payload: &[u8], now_ms: u32) -> Option<LinkEvent> {
        self.last_rx_ms = Some(now_ms);
        self.ping_sent = false;

        if !is_handshake(payload) {
            return None;
        }

        if self.console != ConsoleKind::Eos {
            info!("Console connected");
        }
        self.console = ConsoleKind::Eos;
        self.subscribe();
        Some(LinkEvent::Handshake)
    }

    /// Check elapsed silence.
    ///
    /// Returns [`LinkEvent::Ping`] once per quiet period and
    /// [`LinkEvent::TimedOut`] when the console is given up on.
    pub fn poll(&mut self, now_ms: u32, config: &BridgeConfig) -> Option<LinkEvent> {
        let last = self.last_rx_ms?;
        let silence = now_ms.wrapping_sub(last);

        if silence > config.timeout_ms {
            warn!("Console silent for {} ms, disconnecting", silence);
            self.console = ConsoleKind::None;
            self.last_rx_ms = None;
            self.ping_sent = false;
            Some(LinkEvent::TimedOut)
        } else if silence > config.ping_after_ms && !self.ping_sent {
            debug!("Console silent for {} ms, pinging", silence);
            self.ping_sent = true;
            Some(LinkEvent::Ping)
        } else {
            None
        }
    }

    /// Placeholder for subscribing to console updates after a handshake.
    ///
    /// The box only sends, so there is nothing to subscribe to yet.
    fn subscribe(&mut self) {
        trace!("Subscribe skipped");
    }

    #[must_use]
    pub fn state(&self) -> LinkState {
        match self.console {
            ConsoleKind::None => LinkState::Disconnected,
            _ => LinkState::Connected,
        }
    }

    /// Console that completed the handshake.
    #[must_use]
    pub const fn console(&self) -> ConsoleKind {
        self.console
    }

    /// Time of the last inbound packet, if any since the last timeout.
    #[must_use]
    pub const fn last_rx_ms(&self) -> Option<u32> {
        self.last_rx_ms
    }

    /// Whether a ping went out since the last inbound packet.
    #[must_use]
    pub const fn ping_sent(&self) -> bool {
        self.ping_sent
    }
}

fn is_handshake(payload: &[u8]) -> bool {
    payload
        .windows(HANDSHAKE_QUERY.len())
        .any(|w| w == HANDSHAKE_QUERY)
}
