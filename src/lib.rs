//! SRXE Dongle Firmware Library
//!
//! Firmware for a USB dongle that runs one of three personalities per
//! boot: a virtual serial port bridged to a UART, an in-system-programmer
//! command relay, or a hand-off to the system bootloader. The host picks
//! the personality with a vendor control request; the switch happens
//! through a watchdog reset so every personality starts from a clean boot.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      BOOT PATH                               │
//! │  Reset cause  │  Retained state  │  Mode arbitration         │
//! ├─────────────────────────────────────────────────────────────┤
//! │                   PERSONALITIES                              │
//! │  Serial bridge (CDC <-> UART)  │  Programmer relay (bulk)    │
//! ├─────────────────────────────────────────────────────────────┤
//! │                  CONTROL CHANNEL                             │
//! │  Identify  │  Get / set personality  │  Watchdog reset       │
//! ├─────────────────────────────────────────────────────────────┤
//! │                   HAL / USB LAYER                            │
//! │  USART1  │  IWDG  │  RCC reset flags  │  embassy-usb         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Design Principles
//!
//! - **Functional core, imperative shell**: bridging, arbitration and
//!   request handling are plain logic behind small traits; the `hal` and
//!   `usb` modules plug the hardware in
//! - **No unsafe in application code**: All unsafe isolated in the HAL
//! - **Lossy, never blocking**: full channels drop bytes, busy endpoints
//!   are retried on the next pass
//! - **Total conversions**: out-of-range wire values are coerced to a safe
//!   default instead of failing

#![cfg_attr(feature = "embedded", no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Re-export dependencies needed by applications (only in embedded mode)
#[cfg(feature = "embedded")]
pub use embassy_executor;
#[cfg(feature = "embedded")]
pub use embassy_stm32;
#[cfg(feature = "embedded")]
pub use embassy_time;
#[cfg(feature = "embedded")]
pub use embassy_usb;

/// Hardware Abstraction Layer
///
/// Reset flags, retained RAM, watchdog and USART register access.
#[cfg(feature = "embedded")]
#[allow(unsafe_code)]
pub mod hal;

/// USB Subsystem
///
/// Device setup, vendor control handler and the data links for each
/// personality.
#[cfg(feature = "embedded")]
pub mod usb;

/// Boot path: retained state and mode arbitration
pub mod boot;

/// Bounded byte channels shared with the UART interrupt
pub mod channel;

/// Serial bridge between the USB data channel and the UART
pub mod bridge;

/// Vendor control requests and the reset-based personality switch
pub mod control;

/// Host line encoding to USART configuration
pub mod line_coding;

/// In-system-programmer command relay
pub mod programmer;

/// Shared types used across modules
pub mod types;

/// System configuration and constants
pub mod config;

/// Prelude module for common imports
#[cfg(feature = "embedded")]
pub mod prelude {
    //! Convenient re-exports for common types and traits.

    pub use crate::config::*;
    pub use crate::types::*;

    // Embassy
    pub use embassy_time::{Duration, Instant, Timer};

    // Error handling
    pub use core::result::Result;

    // Logging
    pub use defmt::{debug, error, info, trace, warn};
}
