//! System configuration and hardware constants
//!
//! This module defines compile-time constants for the dongle hardware.
//! Buffer sizing, USB identities, vendor request codes and reset timing
//! are centralized here.

use crate::types::{DataBits, LineEncoding, Parity, StopBits};

/// Capacity of each bridge byte channel
pub const CHANNEL_CAPACITY: usize = 128;

/// USB CDC ACM data endpoint packet size
pub const CDC_PACKET_SIZE: u16 = 64;

/// Programmer relay bulk endpoint packet size
pub const PROGRAMMER_PACKET_SIZE: u16 = 64;

/// Control endpoint (EP0) packet size
pub const CONTROL_PACKET_SIZE: u8 = 64;

/// Boot key that requests a bootloader jump on the next warm reset ("srxe")
pub const BOOT_KEY_SENTINEL: u32 = 0x7372_7865;

/// Entry point of the system-memory bootloader (STM32G4)
pub const BOOTLOADER_ENTRY: u32 = 0x1FFF_0000;

/// Watchdog timeout used to reset into a new personality
pub const MODE_SWITCH_WATCHDOG_MS: u32 = 15;

/// Time the USB stack gets to finish a control status stage before reset
pub const CONTROL_FLUSH_MS: u64 = 2;

/// USART kernel clock (HSI16 on PCLK2 with default clocking)
pub const UART_KERNEL_CLOCK_HZ: u32 = 16_000_000;

/// Line encoding applied before the host negotiates one
pub const DEFAULT_LINE_ENCODING: LineEncoding = LineEncoding {
    baud_rate: 9600,
    parity: Parity::None,
    stop_bits: StopBits::One,
    data_bits: DataBits::Eight,
};

/// Vendor request: read the identification sentinel
pub const REQUEST_IDENTIFY: u8 = 0;

/// Vendor request: read (IN) or write (OUT) the personality
pub const REQUEST_PERSONALITY: u8 = 1;

/// USB VID (Atmel, as expected by the host tooling)
pub const USB_VID: u16 = 0x03EB;

/// USB PID while running the serial bridge
pub const USB_PID_SERIAL: u16 = 0x204B;

/// USB PID while running the programmer relay
pub const USB_PID_PROGRAMMER: u16 = 0x2104;

/// USB manufacturer string
pub const USB_MANUFACTURER: &str = "SRXE Dongle";

/// USB product string for the serial bridge
pub const USB_PRODUCT_SERIAL: &str = "SRXE Dongle Serial";

/// USB product string for the programmer relay
pub const USB_PRODUCT_PROGRAMMER: &str = "SRXE Dongle ISP";

/// Pin assignments for the UART bridge
pub mod pins {
    //! GPIO pin assignments matching the schematic

    /// USART1 TX (held idle during reconfiguration)
    pub const UART_TX: &str = "PA9";

    /// USART1 RX
    pub const UART_RX: &str = "PA10";

    /// TX pin number within GPIOA
    pub const UART_TX_PIN: usize = 9;
}
