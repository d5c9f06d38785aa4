//! USB CDC-ACM serial link to the console.

use embassy_rp::peripherals::USB;
use embassy_rp::usb::Driver;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::{with_timeout, Duration, Timer};
use embassy_usb::class::cdc_acm::{CdcAcmClass, Receiver, Sender, State};
use embassy_usb::driver::EndpointError;
use embassy_usb::Builder;
use heapless::Vec;
use wheel_core::{OutputError, OutputSink};

/// Bulk endpoint packet size.
pub const USB_PACKET_SIZE: u16 = 64;

/// Inbound chunks buffered between the USB and bridge tasks.
pub const INBOUND_DEPTH: usize = 8;

/// Give up on a frame if the host stops reading for this long.
pub const WRITE_TIMEOUT: Duration = Duration::from_millis(100);

/// One USB packet worth of bytes from the console.
pub type InboundChunk = Vec<u8, { USB_PACKET_SIZE as usize }>;

/// Queue of inbound chunks, filled by [`forward_inbound`].
pub type InboundChannel = Channel<CriticalSectionRawMutex, InboundChunk, INBOUND_DEPTH>;

/// USB serial output.
///
/// Writes SLIP frames to the CDC-ACM bulk IN endpoint, split into packets.
pub struct UsbSerialOutput<'d> {
    sender: Sender<'d, Driver<'d, USB>>,
}

impl<'d> UsbSerialOutput<'d> {
    pub fn new(sender: Sender<'d, Driver<'d, USB>>) -> Self {
        Self { sender }
    }

    /// Wait until the USB device is configured and the host has opened the port.
    pub async fn wait_ready(&mut self) {
        self.sender.wait_connection().await;
        while !self.sender.dtr() {
            Timer::after_millis(10).await;
        }
    }

    async fn write_frame(&mut self, frame: &[u8]) -> Result<(), EndpointError> {
        let max = usize::from(self.sender.max_packet_size());
        for chunk in frame.chunks(max) {
            self.sender.write_packet(chunk).await?;
        }
        // A full last packet needs a ZLP or the host keeps waiting for more
        if frame.len() % max == 0 {
            self.sender.write_packet(&[]).await?;
        }
        Ok(())
    }
}

impl<'d> OutputSink for UsbSerialOutput<'d> {
    async fn send(&mut self, frame: &[u8]) -> Result<(), OutputError> {
        if !self.is_ready() {
            return Err(OutputError::NotReady);
        }
        match with_timeout(WRITE_TIMEOUT, self.write_frame(frame)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(EndpointError::Disabled)) => Err(OutputError::NotReady),
            Ok(Err(EndpointError::BufferOverflow)) | Err(_) => Err(OutputError::Io),
        }
    }

    fn is_ready(&self) -> bool {
        self.sender.dtr()
    }
}

/// Configure the CDC-ACM class in the USB builder.
pub fn configure_usb_serial<'d>(
    builder: &mut Builder<'d, Driver<'d, USB>>,
    state: &'d mut State<'d>,
) -> CdcAcmClass<'d, Driver<'d, USB>> {
    CdcAcmClass::new(builder, state, USB_PACKET_SIZE)
}

/// Move packets from the console into `channel`, forever.
///
/// Survives cable pulls: after an endpoint error it waits for the next
/// connection.
pub async fn forward_inbound(
    mut receiver: Receiver<'static, Driver<'static, USB>>,
    channel: &'static InboundChannel,
) -> ! {
    let mut buf = [0u8; USB_PACKET_SIZE as usize];
    loop {
        receiver.wait_connection().await;
        defmt::debug!("USB serial connected");

        loop {
            match receiver.read_packet(&mut buf).await {
                Ok(n) => {
                    if let Ok(chunk) = InboundChunk::from_slice(&buf[..n]) {
                        channel.send(chunk).await;
                    }
                }
                Err(e) => {
                    defmt::debug!("USB serial read stopped: {:?}", e);
                    break;
                }
            }
        }
    }
}
