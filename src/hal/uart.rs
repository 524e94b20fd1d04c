//! USART1 Bridge Port
//!
//! embassy-stm32 brings up the pins and the kernel clock; after that the
//! bridge drives the registers directly. Transmit is polled one byte per
//! main-loop pass, receive runs from the USART1 interrupt straight into the
//! UART-to-host channel.

use core::ptr;
use core::sync::atomic::{AtomicPtr, Ordering};

use embassy_stm32::interrupt::{self, typelevel, InterruptExt};
use embassy_stm32::mode::Blocking;
use embassy_stm32::pac;
use embassy_stm32::peripherals::{PA10, PA9, USART1};
use embassy_stm32::usart::{Config, ConfigError, Uart};
use static_cell::StaticCell;

use crate::bridge::{SerialPort, UartReceiver};
use crate::config::{pins, UART_KERNEL_CLOCK_HZ};
use crate::line_coding::{apply_line_encoding, UartFrame, UartRegisters};
use crate::types::LineEncoding;

/// ISR: read data register not empty
const ISR_RXNE: u32 = 1 << 5;
/// ISR: transmit data register empty
const ISR_TXE: u32 = 1 << 7;
/// ISR: overrun error
const ISR_ORE: u32 = 1 << 3;
/// ICR: overrun error clear
const ICR_ORECF: u32 = 1 << 3;

/// Storage for the producer of the UART-to-host channel
static RECEIVER_CELL: StaticCell<UartReceiver<'static>> = StaticCell::new();

/// Producer handed to the interrupt; null until installed
static RECEIVER: AtomicPtr<UartReceiver<'static>> = AtomicPtr::new(ptr::null_mut());

/// USART1 on PA9 (TX) / PA10 (RX)
pub struct BridgeUart {
    _driver: Uart<'static, Blocking>,
    regs: Usart1Registers,
}

impl BridgeUart {
    /// Configure the pins and clock for USART1
    ///
    /// # Errors
    ///
    /// Returns the driver's [`ConfigError`] if the default frame cannot be
    /// set up.
    pub fn new(usart: USART1, rx: PA10, tx: PA9) -> Result<Self, ConfigError> {
        let driver = Uart::new_blocking(usart, rx, tx, Config::default())?;
        defmt::info!("uart: USART1 on TX={=str} RX={=str}", pins::UART_TX, pins::UART_RX);
        Ok(Self {
            _driver: driver,
            regs: Usart1Registers,
        })
    }

    /// Reprogram the frame format and baud rate
    pub fn apply_line_encoding(&mut self, encoding: &LineEncoding) -> UartFrame {
        let frame = apply_line_encoding(&mut self.regs, encoding, UART_KERNEL_CLOCK_HZ);
        defmt::info!(
            "uart: {} baud (actual {}), brr={=u32:#x}",
            encoding.baud_rate,
            frame.effective_baud(UART_KERNEL_CLOCK_HZ),
            frame.brr
        );
        frame
    }
}

impl SerialPort for BridgeUart {
    fn is_send_ready(&self) -> bool {
        pac::USART1.isr().read().0 & ISR_TXE != 0
    }

    fn send_byte(&mut self, byte: u8) {
        let tdr = pac::USART1.tdr().as_ptr().cast::<u8>();
        // SAFETY: byte-wide write to the transmit data register
        unsafe { tdr.write_volatile(byte) }
    }
}

/// Raw USART1 and PA9 register access
#[derive(Clone, Copy, Debug)]
struct Usart1Registers;

impl UartRegisters for Usart1Registers {
    fn hold_tx_idle(&mut self) {
        let gpio = pac::GPIOA;
        gpio.bsrr().write(|w| w.set_bs(pins::UART_TX_PIN, true));
        gpio.moder()
            .modify(|w| w.set_moder(pins::UART_TX_PIN, pac::gpio::vals::Moder::OUTPUT));
    }

    fn release_tx(&mut self) {
        pac::GPIOA
            .moder()
            .modify(|w| w.set_moder(pins::UART_TX_PIN, pac::gpio::vals::Moder::ALTERNATE));
    }

    fn write_cr1(&mut self, value: u32) {
        pac::USART1.cr1().write(|w| w.0 = value);
    }

    fn write_cr2(&mut self, value: u32) {
        pac::USART1.cr2().write(|w| w.0 = value);
    }

    fn write_brr(&mut self, value: u32) {
        pac::USART1.brr().write(|w| w.0 = value);
    }
}

/// Hand the channel producer to the interrupt and unmask USART1
///
/// After this call the interrupt is the producer's only user.
///
/// # Panics
///
/// Panics if called more than once.
pub fn install_receiver(receiver: UartReceiver<'static>) {
    let receiver: &'static mut UartReceiver<'static> = RECEIVER_CELL.init(receiver);
    RECEIVER.store(receiver, Ordering::Release);

    interrupt::USART1.unpend();
    // SAFETY: the handler only touches RECEIVER and USART1 data registers
    unsafe { interrupt::USART1.enable() };
}

/// USART1 receive interrupt
///
/// Bound with `bind_interrupts!` in the binary.
pub struct ReceiveInterruptHandler;

impl typelevel::Handler<typelevel::USART1> for ReceiveInterruptHandler {
    unsafe fn on_interrupt() {
        let regs = pac::USART1;
        let isr = regs.isr().read().0;

        // An overrun left pending keeps the interrupt firing
        if isr & ISR_ORE != 0 {
            regs.icr().write(|w| w.0 = ICR_ORECF);
        }
        if isr & ISR_RXNE == 0 {
            return;
        }

        // SAFETY: byte-wide read of the receive data register clears RXNE
        let byte = unsafe { regs.rdr().as_ptr().cast::<u8>().read_volatile() };
        let configured = crate::usb::host_configured();

        // SAFETY: the pointer comes from a `&'static mut` leaked once by
        // `install_receiver`, and this handler is its only user from then on
        if let Some(receiver) = unsafe { RECEIVER.load(Ordering::Acquire).as_mut() } {
            receiver.on_receive(byte, configured);
        }
    }
}
