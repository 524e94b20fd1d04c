//! Hardware Abstraction Layer
//!
//! The only place that touches STM32G474 registers directly. Each module
//! implements one of the traits the core logic is written against:
//!
//! - [`reset`]: reset cause and the system bootloader jump
//! - [`retained`]: the no-init RAM behind [`crate::boot::RetainedStore`]
//! - [`watchdog`]: the IWDG behind [`crate::control::Watchdog`]
//! - [`uart`]: USART1 for [`crate::bridge::SerialPort`] and
//!   [`crate::line_coding::UartRegisters`], plus its receive interrupt

pub mod reset;
pub mod retained;
pub mod uart;
pub mod watchdog;
