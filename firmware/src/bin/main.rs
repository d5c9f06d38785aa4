#![no_std]
#![no_main]

use defmt::{error, info};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::peripherals::USB;
use embassy_rp::usb::Driver;
use embassy_time::{Duration, Instant, Ticker};
use embassy_usb::class::cdc_acm::{Receiver, State};
use embassy_usb::{Builder, Config as UsbConfig};
use eos_wheel_bridge::{
    configure_usb_serial, forward_inbound, Encoder, InboundChannel, LinkState, ModeButtons,
    OutputSink, Panel, UsbSerialOutput, WheelBridge, DEFAULT_CONFIG, LEVEL_DIRECTION, PAN_DIRECTION,
    TILT_DIRECTION,
};
use static_cell::StaticCell;

#[cfg(feature = "dev-panic")]
use panic_probe as _;
#[cfg(feature = "prod-panic")]
use panic_reset as _;

bind_interrupts!(struct Irqs {
    USBCTRL_IRQ => embassy_rp::usb::InterruptHandler<USB>;
});

/// Panel sampling period. Quadrature edges closer than this are lost.
const POLL_PERIOD: Duration = Duration::from_micros(250);

/// Packets from the console, passed from the inbound task to the bridge task.
static INBOUND: StaticCell<InboundChannel> = StaticCell::new();

/// USB device configuration buffer.
static CONFIG_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static BOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static MSOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static CONTROL_BUF: StaticCell<[u8; 64]> = StaticCell::new();

/// CDC-ACM state.
static CDC_STATE: StaticCell<State> = StaticCell::new();

type WheelPanel = Panel<Input<'static>>;

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Eos wheel bridge starting...");

    let p = embassy_rp::init(embassy_rp::config::Config::default());

    let inbound = INBOUND.init(InboundChannel::new());

    // --- Panel Setup ---
    let panel = Panel {
        pan: Encoder::new(
            Input::new(p.PIN_7, Pull::Up),
            Input::new(p.PIN_6, Pull::Up),
            PAN_DIRECTION,
        ),
        tilt: Encoder::new(
            Input::new(p.PIN_5, Pull::Up),
            Input::new(p.PIN_4, Pull::Up),
            TILT_DIRECTION,
        ),
        level: Encoder::new(
            Input::new(p.PIN_3, Pull::Up),
            Input::new(p.PIN_2, Pull::Up),
            LEVEL_DIRECTION,
        ),
        buttons: ModeButtons::new(
            Input::new(p.PIN_28, Pull::Down),
            Input::new(p.PIN_27, Pull::Down),
            Input::new(p.PIN_26, Pull::Down),
        ),
    };

    // --- USB Setup ---
    let usb_driver = Driver::new(p.USB, Irqs);

    let mut usb_config = UsbConfig::new(0x1209, 0x0001); // pid.codes test VID/PID
    usb_config.manufacturer = Some("Rust Lighting");
    usb_config.product = Some("Eos Wheel Bridge");
    usb_config.serial_number = Some("box1");
    usb_config.max_power = 100;
    usb_config.max_packet_size_0 = 64;

    let config_descriptor = CONFIG_DESCRIPTOR.init([0; 256]);
    let bos_descriptor = BOS_DESCRIPTOR.init([0; 256]);
    let msos_descriptor = MSOS_DESCRIPTOR.init([0; 256]);
    let control_buf = CONTROL_BUF.init([0; 64]);

    let mut builder = Builder::new(
        usb_driver,
        usb_config,
        config_descriptor,
        bos_descriptor,
        msos_descriptor,
        control_buf,
    );

    // Configure CDC-ACM class
    let cdc_state = CDC_STATE.init(State::new());
    let serial = configure_usb_serial(&mut builder, cdc_state);

    // Build the USB device
    let usb_device = builder.build();

    let (sender, receiver) = serial.split();
    let output = UsbSerialOutput::new(sender);

    // On-board LED shows the link state
    let led = Output::new(p.PIN_25, Level::Low);

    // Spawn tasks (unwrap the SpawnToken, then spawn)
    spawner.spawn(usb_task(usb_device).unwrap());
    spawner.spawn(inbound_task(receiver, inbound).unwrap());
    spawner.spawn(bridge_task(panel, output, inbound, led).unwrap());

    info!("Eos wheel bridge initialized, waiting for host...");
}

/// USB device task - runs the USB stack.
#[embassy_executor::task]
async fn usb_task(mut device: embassy_usb::UsbDevice<'static, Driver<'static, USB>>) {
    device.run().await;
}

/// Inbound task - forwards console packets to the bridge task.
#[embassy_executor::task]
async fn inbound_task(
    receiver: Receiver<'static, Driver<'static, USB>>,
    channel: &'static InboundChannel,
) {
    forward_inbound(receiver, channel).await
}

/// Bridge task - polls the panel and talks to the console.
#[embassy_executor::task]
async fn bridge_task(
    panel: WheelPanel,
    output: UsbSerialOutput<'static>,
    inbound: &'static InboundChannel,
    mut led: Output<'static>,
) {
    let mut bridge = WheelBridge::new(panel, output, DEFAULT_CONFIG);
    let mut ticker = Ticker::every(POLL_PERIOD);

    loop {
        if !bridge.output().is_ready() {
            led.set_low();
            bridge.output_mut().wait_ready().await;
            info!("Host opened the port, announcing...");
            if let Err(e) = bridge.announce().await {
                error!("Announce failed: {:?}", e);
            }
        }

        // Wrapping millisecond clock
        let now_ms = Instant::now().as_millis() as u32;
        let chunk = inbound.try_receive().unwrap_or_default();

        if let Err(e) = bridge.poll(now_ms, &chunk).await {
            error!("Bridge error: {:?}", e);
        }

        led.set_level(match bridge.link().state() {
            LinkState::Connected => Level::High,
            LinkState::Disconnected => Level::Low,
        });

        ticker.next().await;
    }
}
