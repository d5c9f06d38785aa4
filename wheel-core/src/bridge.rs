//! WheelBridge: turns panel input into console messages, one poll at a time.

use crate::buttons::{ModeButtons, WheelModes};
use crate::config::BridgeConfig;
use crate::encoder::Encoder;
use crate::link::{ping_message, LinkEvent, LinkMonitor, HANDSHAKE_REPLY};
use crate::output::{OutputError, OutputSink};
use crate::translate::{WheelAxis, WheelMove, WheelTranslator};
use embedded_hal::digital::InputPin;
use osc_proto::{
    encode_frame, max_frame_len, peek_address, EncodeError, OscMessage, SlipDecoder, SlipError,
    MAX_MESSAGE_SIZE,
};

/// Largest inbound packet kept for inspection. Longer packets are dropped.
pub const MAX_PACKET_SIZE: usize = 256;

const MAX_FRAME_SIZE: usize = max_frame_len(MAX_MESSAGE_SIZE);

/// The physical controls: three encoders and their mode buttons.
pub struct Panel<P> {
    pub pan: Encoder<P, P>,
    pub tilt: Encoder<P, P>,
    pub level: Encoder<P, P>,
    pub buttons: ModeButtons<P>,
}

/// A bridge from a [`Panel`] to a console reached through an [`OutputSink`].
///
/// The bridge owns all runtime state (modes, per-axis rate tracking, link
/// liveness, inbound frame reassembly) and is driven by calling
/// [`poll`](Self::poll) from a single loop with a millisecond timestamp.
///
/// # Error Handling
///
/// A failed send never stops the rest of the poll cycle; the first error is
/// returned after every step has run. Malformed inbound frames are logged and
/// dropped.
pub struct WheelBridge<P, O> {
    panel: Panel<P>,
    output: O,
    config: BridgeConfig,
    modes: WheelModes,
    translator: WheelTranslator,
    link: LinkMonitor,
    decoder: SlipDecoder<MAX_PACKET_SIZE>,
}

impl<P: InputPin, O: OutputSink> WheelBridge<P, O> {
    /// Create a new bridge from the panel, the console link and a configuration.
    pub fn new(panel: Panel<P>, output: O, config: BridgeConfig) -> Self {
        Self {
            panel,
            output,
            config,
            modes: WheelModes::default(),
            translator: WheelTranslator::new(),
            link: LinkMonitor::new(),
            decoder: SlipDecoder::new(),
        }
    }

    /// Send an unsolicited handshake reply.
    ///
    /// Call once the serial link is up: the console may have sent its query
    /// before we were listening.
    pub async fn announce(&mut self) -> Result<(), BridgeError> {
        info!("Announcing to console");
        self.send_payload(HANDSHAKE_REPLY).await
    }

    /// Run one cycle: sample the panel, send wheel moves, handle `inbound`
    /// bytes from the console and check link liveness.
    pub async fn poll(&mut self, now_ms: u32, inbound: &[u8]) -> Result<(), BridgeError> {
        let mut first_error = None;

        let pan = self.panel.pan.poll();
        let tilt = self.panel.tilt.poll();
        let level = self.panel.level.poll();
        self.panel
            .buttons
            .poll(now_ms, self.config.debounce_ms, &mut self.modes);

        for (axis, ticks) in [
            (WheelAxis::Tilt, tilt),
            (WheelAxis::Pan, pan),
            (WheelAxis::Level, level),
        ] {
            if ticks == 0 {
                continue;
            }
            if let Err(e) = self.move_wheel(axis, i32::from(ticks), now_ms).await {
                first_error = first_error.or(Some(e));
            }
        }

        if let Err(e) = self.receive(inbound, now_ms).await {
            first_error = first_error.or(Some(e));
        }

        if let Err(e) = self.check_link(now_ms).await {
            first_error = first_error.or(Some(e));
        }

        first_error.map_or(Ok(()), Err)
    }

    /// Translate a tick delta and send it to the connected console.
    pub async fn move_wheel(
        &mut self,
        axis: WheelAxis,
        ticks: i32,
        now_ms: u32,
    ) -> Result<(), BridgeError> {
        let Some(mv) = self
            .translator
            .translate(axis, ticks, now_ms, &self.modes, &self.config)
        else {
            return Ok(());
        };
        self.dispatch(&mv).await
    }

    async fn dispatch(&mut self, mv: &WheelMove) -> Result<(), BridgeError> {
        match self.link.console().wheel_message(mv) {
            Some(msg) => {
                trace!("Wheel move: {:?}", mv);
                self.send_message(&msg).await
            }
            None => Ok(()),
        }
    }

    /// Feed bytes received from the console.
    ///
    /// Every complete packet refreshes link liveness; handshake queries are
    /// answered immediately.
    pub async fn receive(&mut self, bytes: &[u8], now_ms: u32) -> Result<(), BridgeError> {
        let mut first_error = None;

        for &byte in bytes {
            let event = match self.decoder.push_byte(byte) {
                Ok(Some(packet)) => {
                    if let Some(address) = peek_address(packet) {
                        trace!("Received {}", address);
                    }
                    self.link.on_packet(packet, now_ms)
                }
                Ok(None) => None,
                Err(e) => {
                    warn!("Dropped inbound frame: {:?}", e);
                    None
                }
            };

            if event == Some(LinkEvent::Handshake) {
                info!("Handshake query, replying");
                if let Err(e) = self.send_payload(HANDSHAKE_REPLY).await {
                    first_error = first_error.or(Some(e));
                }
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    /// Ping or disconnect depending on how long the console has been silent.
    pub async fn check_link(&mut self, now_ms: u32) -> Result<(), BridgeError> {
        match self.link.poll(now_ms, &self.config) {
            Some(LinkEvent::Ping) => self.send_message(&ping_message()).await,
            _ => Ok(()),
        }
    }

    async fn send_message(&mut self, msg: &OscMessage<'_>) -> Result<(), BridgeError> {
        let mut payload = [0u8; MAX_MESSAGE_SIZE];
        let len = msg.encode(&mut payload)?;
        self.send_payload(&payload[..len]).await
    }

    async fn send_payload(&mut self, payload: &[u8]) -> Result<(), BridgeError> {
        let mut frame = [0u8; MAX_FRAME_SIZE];
        let len = encode_frame(payload, &mut frame)?;
        self.output
            .send(&frame[..len])
            .await
            .map_err(BridgeError::Output)
    }

    /// Link liveness state.
    pub fn link(&self) -> &LinkMonitor {
        &self.link
    }

    /// Current mode flags.
    pub fn modes(&self) -> &WheelModes {
        &self.modes
    }

    /// Per-axis translator state.
    pub fn translator(&self) -> &WheelTranslator {
        &self.translator
    }

    /// Active configuration.
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Get a reference to the output sink.
    pub fn output(&self) -> &O {
        &self.output
    }

    /// Get a mutable reference to the output sink.
    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }

    /// Decompose the bridge into its panel and output components.
    pub fn into_parts(self) -> (Panel<P>, O) {
        (self.panel, self.output)
    }
}

/// Error type for bridge operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BridgeError {
    /// Error from the output sink.
    Output(OutputError),
    /// A message could not be encoded.
    Encode(EncodeError),
    /// A payload could not be framed.
    Framing(SlipError),
}

impl From<OutputError> for BridgeError {
    fn from(err: OutputError) -> Self {
        Self::Output(err)
    }
}

impl From<EncodeError> for BridgeError {
    fn from(err: EncodeError) -> Self {
        Self::Encode(err)
    }
}

impl From<SlipError> for BridgeError {
    fn from(err: SlipError) -> Self {
        Self::Framing(err)
    }
}

impl core::fmt::Display for BridgeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Output(e) => write!(f, "output: {e}"),
            Self::Encode(e) => write!(f, "encode: {e}"),
            Self::Framing(e) => write!(f, "framing: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::config::DEFAULT_CONFIG;
    use crate::encoder::mock::MockPin;
    use crate::encoder::Direction;
    use crate::link::LinkState;
    use core::future::Future;
    use core::pin::Pin;
    use core::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};
    use osc_proto::END;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::vec;
    use std::vec::Vec;

    // Records every frame; optionally fails every send
    struct MockOutput {
        sent: Rc<RefCell<Vec<Vec<u8>>>>,
        fail: bool,
    }

    impl MockOutput {
        fn new() -> Self {
            Self {
                sent: Rc::new(RefCell::new(Vec::new())),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new()
            }
        }
    }

    impl OutputSink for MockOutput {
        fn send(&mut self, frame: &[u8]) -> impl Future<Output = Result<(), OutputError>> {
            let result = if self.fail {
                Err(OutputError::Io)
            } else {
                self.sent.borrow_mut().push(frame.to_vec());
                Ok(())
            };
            core::future::ready(result)
        }

        fn is_ready(&self) -> bool {
            !self.fail
        }
    }

    // Helper to run a future to completion (simple blocking executor)
    fn block_on<F: Future>(mut f: F) -> F::Output {
        fn noop_raw_waker() -> RawWaker {
            fn noop(_: *const ()) {}
            fn clone(_: *const ()) -> RawWaker {
                noop_raw_waker()
            }
            static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, noop, noop, noop);
            RawWaker::new(core::ptr::null(), &VTABLE)
        }

        let waker = unsafe { Waker::from_raw(noop_raw_waker()) };
        let mut cx = Context::from_waker(&waker);

        // SAFETY: We don't move f after pinning
        let mut f = unsafe { Pin::new_unchecked(&mut f) };

        match f.as_mut().poll(&mut cx) {
            Poll::Ready(result) => result,
            Poll::Pending => panic!("Mock future returned Pending unexpectedly"),
        }
    }

    // Shared handles to every input on the panel
    #[derive(Default)]
    struct Rig {
        pan_a: MockPin,
        pan_b: MockPin,
        tilt_a: MockPin,
        tilt_b: MockPin,
        level_a: MockPin,
        level_b: MockPin,
        level_button: MockPin,
        tilt_button: MockPin,
        pan_button: MockPin,
    }

    impl Rig {
        // B high on every encoder, so raising A reads as forward
        fn new() -> Self {
            let rig = Self::default();
            rig.pan_b.set(true);
            rig.tilt_b.set(true);
            rig.level_b.set(true);
            rig
        }

        fn panel(&self) -> Panel<MockPin> {
            Panel {
                pan: Encoder::new(self.pan_a.clone(), self.pan_b.clone(), Direction::Forward),
                tilt: Encoder::new(self.tilt_a.clone(), self.tilt_b.clone(), Direction::Forward),
                level: Encoder::new(
                    self.level_a.clone(),
                    self.level_b.clone(),
                    Direction::Forward,
                ),
                buttons: ModeButtons::new(
                    self.level_button.clone(),
                    self.tilt_button.clone(),
                    self.pan_button.clone(),
                ),
            }
        }
    }

    fn bridge(rig: &Rig) -> (WheelBridge<MockPin, MockOutput>, Rc<RefCell<Vec<Vec<u8>>>>) {
        let output = MockOutput::new();
        let sent = output.sent.clone();
        (WheelBridge::new(rig.panel(), output, DEFAULT_CONFIG), sent)
    }

    fn frame(payload: &[u8]) -> Vec<u8> {
        let mut buf = vec![0u8; max_frame_len(payload.len())];
        let len = encode_frame(payload, &mut buf).unwrap();
        buf.truncate(len);
        buf
    }

    fn osc_frame(msg: OscMessage<'_>) -> Vec<u8> {
        let mut buf = [0u8; MAX_MESSAGE_SIZE];
        let len = msg.encode(&mut buf).unwrap();
        frame(&buf[..len])
    }

    #[test]
    fn test_announce_sends_ok() {
        let rig = Rig::new();
        let (mut bridge, sent) = bridge(&rig);

        block_on(bridge.announce()).unwrap();

        assert_eq!(*sent.borrow(), vec![vec![END, b'O', b'K', END]]);
    }

    #[test]
    fn test_handshake_answered_once() {
        let rig = Rig::new();
        let (mut bridge, sent) = bridge(&rig);

        block_on(bridge.poll(10, &frame(b"ETCOSC?extra"))).unwrap();

        assert_eq!(*sent.borrow(), vec![frame(b"OK")]);
        assert_eq!(bridge.link().state(), LinkState::Connected);
    }

    #[test]
    fn test_handshake_split_across_polls() {
        let rig = Rig::new();
        let (mut bridge, sent) = bridge(&rig);
        let bytes = frame(b"ETCOSC?");
        let (head, tail) = bytes.split_at(4);

        block_on(bridge.poll(10, head)).unwrap();
        assert!(sent.borrow().is_empty());

        block_on(bridge.poll(11, tail)).unwrap();
        assert_eq!(*sent.borrow(), vec![frame(b"OK")]);
    }

    #[test]
    fn test_bad_frame_does_not_block_handshake() {
        let rig = Rig::new();
        let (mut bridge, sent) = bridge(&rig);

        let mut bytes = vec![END, b'x', osc_proto::ESC, b'?', END];
        bytes.extend(frame(b"ETCOSC?"));
        block_on(bridge.poll(10, &bytes)).unwrap();

        assert_eq!(*sent.borrow(), vec![frame(b"OK")]);
    }

    #[test]
    fn test_slow_pan_sends_floor_value() {
        let rig = Rig::new();
        let (mut bridge, sent) = bridge(&rig);

        rig.pan_a.set(true);
        block_on(bridge.poll(1000, &[])).unwrap();

        assert_eq!(
            *sent.borrow(),
            vec![osc_frame(OscMessage::float("/eos/wheel/fine/pan", 25.0))]
        );
    }

    #[test]
    fn test_pan_button_reverses_pan() {
        let rig = Rig::new();
        let (mut bridge, sent) = bridge(&rig);

        rig.pan_button.set(true);
        rig.pan_a.set(true);
        block_on(bridge.poll(1000, &[])).unwrap();

        assert_eq!(bridge.modes().pan, Direction::Reverse);
        assert_eq!(
            *sent.borrow(),
            vec![osc_frame(OscMessage::float("/eos/wheel/fine/pan", -25.0))]
        );
    }

    #[test]
    fn test_moves_sent_tilt_pan_level() {
        let rig = Rig::new();
        let (mut bridge, sent) = bridge(&rig);

        rig.pan_a.set(true);
        rig.tilt_a.set(true);
        rig.level_a.set(true);
        block_on(bridge.poll(1000, &[])).unwrap();

        assert_eq!(
            *sent.borrow(),
            vec![
                osc_frame(OscMessage::float("/eos/wheel/fine/tilt", 50.0)),
                osc_frame(OscMessage::float("/eos/wheel/fine/pan", 25.0)),
                osc_frame(OscMessage::float("/eos/wheel/coarse/iris", 1.0)),
            ]
        );
    }

    #[test]
    fn test_level_button_switches_to_level() {
        let rig = Rig::new();
        let (mut bridge, sent) = bridge(&rig);

        rig.level_button.set(true);
        rig.level_a.set(true);
        block_on(bridge.poll(1000, &[])).unwrap();

        assert!(bridge.modes().level_mode);
        assert_eq!(
            *sent.borrow(),
            vec![osc_frame(OscMessage::float("/eos/wheel/level", 4.0))]
        );
    }

    #[test]
    fn test_idle_panel_sends_nothing() {
        let rig = Rig::new();
        let (mut bridge, sent) = bridge(&rig);

        for now in (0..100).map(|i| i * 10) {
            block_on(bridge.poll(now, &[])).unwrap();
        }
        assert!(sent.borrow().is_empty());
    }

    #[test]
    fn test_single_ping_then_timeout() {
        let rig = Rig::new();
        let (mut bridge, sent) = bridge(&rig);

        block_on(bridge.poll(0, &frame(b"ETCOSC?"))).unwrap();
        sent.borrow_mut().clear();

        block_on(bridge.poll(2600, &[])).unwrap();
        block_on(bridge.poll(3000, &[])).unwrap();
        block_on(bridge.poll(4999, &[])).unwrap();
        assert_eq!(*sent.borrow(), vec![osc_frame(ping_message())]);

        block_on(bridge.poll(5001, &[])).unwrap();
        assert_eq!(bridge.link().state(), LinkState::Disconnected);
        assert_eq!(sent.borrow().len(), 1);
    }

    #[test]
    fn test_traffic_after_timeout_restarts_cycle() {
        let rig = Rig::new();
        let (mut bridge, sent) = bridge(&rig);

        block_on(bridge.poll(0, &frame(b"ETCOSC?"))).unwrap();
        block_on(bridge.poll(6000, &[])).unwrap();
        assert_eq!(bridge.link().state(), LinkState::Disconnected);
        sent.borrow_mut().clear();

        block_on(bridge.poll(7000, &frame(b"ETCOSC?"))).unwrap();
        block_on(bridge.poll(9501, &[])).unwrap();
        assert_eq!(
            *sent.borrow(),
            vec![frame(b"OK"), osc_frame(ping_message())]
        );
    }

    #[test]
    fn test_send_failure_keeps_cycle_running() {
        let rig = Rig::new();
        let output = MockOutput::failing();
        let mut bridge = WheelBridge::new(rig.panel(), output, DEFAULT_CONFIG);

        rig.pan_a.set(true);
        let result = block_on(bridge.poll(1000, &frame(b"ETCOSC?")));

        assert_eq!(result, Err(BridgeError::Output(OutputError::Io)));
        // Inbound handling still ran after the failed wheel move
        assert_eq!(bridge.link().state(), LinkState::Connected);
        assert_eq!(bridge.translator().pan().last_value(), 25);
    }

    #[test]
    fn test_into_parts() {
        let rig = Rig::new();
        let (bridge, _) = bridge(&rig);
        let (_panel, output) = bridge.into_parts();
        assert!(output.is_ready());
    }
}
