//! SRXE Dongle Main Application
//!
//! Entry point for the STM32G474-based dongle firmware. Decides the
//! personality for this boot, then runs either the serial bridge or the
//! programmer relay until the host asks for a switch.

#![no_std]
#![no_main]

use defmt::{info, unwrap};
use embassy_executor::Spawner;
use embassy_futures::yield_now;
use embassy_stm32::peripherals::{self, PA10, PA9, USART1};
use embassy_stm32::usb::Driver;
use embassy_stm32::{bind_interrupts, usb as stm32_usb};
use embassy_usb::{Builder, UsbDevice};
use static_cell::ConstStaticCell;
use {defmt_rtt as _, panic_probe as _};

use srxe_dongle::boot;
use srxe_dongle::bridge::{SerialBridge, UartReceiver};
use srxe_dongle::channel::ByteChannel;
use srxe_dongle::hal::reset::{self, SystemBootloader};
use srxe_dongle::hal::retained::Retained;
use srxe_dongle::hal::uart::{self, BridgeUart, ReceiveInterruptHandler};
use srxe_dongle::hal::watchdog::ResetWatchdog;
use srxe_dongle::prelude::*;
use srxe_dongle::programmer::{DiscardCommands, ProgrammerRelay};
use srxe_dongle::usb::bulk::BulkLink;
use srxe_dongle::usb::cdc::CdcLink;
use srxe_dongle::usb::{self, control, UsbDriver};

// Bind interrupt handlers
bind_interrupts!(struct Irqs {
    USB_LP => stm32_usb::InterruptHandler<peripherals::USB>;
    USART1 => ReceiveInterruptHandler;
});

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    // Arbitration comes before any clock or peripheral setup so a
    // bootloader jump starts from reset state
    let cause = reset::take_reset_cause();
    let mut retained = unwrap!(Retained::take());
    let personality = boot::select_personality(cause, &mut retained, SystemBootloader);

    info!(
        "SRXE Dongle Firmware v{} (reset: {}, personality: {})",
        env!("CARGO_PKG_VERSION"),
        cause,
        personality
    );

    let p = embassy_stm32::init(clock_config());
    info!("Peripherals initialized");

    spawner.must_spawn(mode_switch_task(retained, ResetWatchdog::new(p.IWDG)));

    let driver = Driver::new(p.USB, Irqs, p.PA12, p.PA11);
    let mut builder = usb::builder(driver, personality);
    builder.handler(control::handler(personality));

    match personality {
        Personality::ProgrammerRelay => run_programmer(spawner, builder).await,
        Personality::Serial | Personality::Bootloader => {
            run_serial(spawner, builder, p.USART1, p.PA10, p.PA9).await;
        }
    }
}

/// HSI48 trimmed from USB SOF feeds the USB peripheral
fn clock_config() -> embassy_stm32::Config {
    use embassy_stm32::rcc::{mux, Hsi48Config};

    let mut config = embassy_stm32::Config::default();
    config.rcc.hsi48 = Some(Hsi48Config { sync_from_usb: true });
    config.rcc.mux.clk48sel = mux::Clk48sel::HSI48;
    config
}

/// Serial personality: CDC ACM bridged to USART1
async fn run_serial(
    spawner: Spawner,
    mut builder: Builder<'static, UsbDriver>,
    usart: USART1,
    rx: PA10,
    tx: PA9,
) {
    static HOST_TO_UART: ConstStaticCell<ByteChannel> = ConstStaticCell::new(ByteChannel::new());
    static UART_TO_HOST: ConstStaticCell<ByteChannel> = ConstStaticCell::new(ByteChannel::new());

    let mut link = CdcLink::new(&mut builder, DEFAULT_LINE_ENCODING);
    spawner.must_spawn(usb_task(builder.build()));

    let (to_uart_tx, to_uart_rx) = HOST_TO_UART.take().split();
    let (to_host_tx, to_host_rx) = UART_TO_HOST.take().split();

    let mut port = unwrap!(BridgeUart::new(usart, rx, tx));
    port.apply_line_encoding(&DEFAULT_LINE_ENCODING);
    uart::install_receiver(UartReceiver::new(to_host_tx));

    let mut bridge = SerialBridge::new(to_uart_tx, to_uart_rx, to_host_rx, CDC_PACKET_SIZE);
    info!("Serial bridge running");

    loop {
        bridge.pump(&mut link, &mut port);
        link.service().await;

        if let Some(encoding) = link.take_line_encoding_change() {
            port.apply_line_encoding(&encoding);
        }

        yield_now().await;
    }
}

/// Programmer personality: bulk command relay
async fn run_programmer(spawner: Spawner, mut builder: Builder<'static, UsbDriver>) {
    let mut link = BulkLink::new(&mut builder);
    spawner.must_spawn(usb_task(builder.build()));

    let mut relay = ProgrammerRelay::new(DiscardCommands::new());
    info!("Programmer relay running");

    loop {
        relay.poll(&mut link);
        link.service().await;
        yield_now().await;
    }
}

/// Runs the USB device stack
#[embassy_executor::task]
async fn usb_task(mut device: UsbDevice<'static, UsbDriver>) -> ! {
    device.run().await
}

/// Commits an accepted personality switch and waits for the watchdog
#[embassy_executor::task]
async fn mode_switch_task(mut retained: Retained, mut watchdog: ResetWatchdog) -> ! {
    let switch = control::MODE_SWITCH.wait().await;

    // Give the stack time to finish the status stage of the request
    Timer::after_millis(CONTROL_FLUSH_MS).await;

    info!("Switching to {} via watchdog reset", switch.target());
    switch.execute(&mut retained, &mut watchdog)
}
