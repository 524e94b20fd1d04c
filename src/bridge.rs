//! Serial Bridge
//!
//! Moves bytes between the host-facing USB data channel and the UART.
//! The main loop calls [`SerialBridge::pump`] once per iteration; the UART
//! receive interrupt feeds the opposite direction through
//! [`UartReceiver::on_receive`]. Nothing here blocks: every step checks
//! readiness first and simply skips when the other side is busy.
//!
//! Overflow is lossy. A byte arriving while its channel is full
//! is dropped without any signal to either side.

use core::fmt;

use crate::channel::{ChannelReader, ChannelWriter};

/// Why a byte could not be queued on the USB data IN endpoint
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendError {
    /// The endpoint cannot take more data right now; retry later
    NotReady,
    /// The host is not connected or has not configured the device
    Disconnected,
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotReady => f.write_str("endpoint not ready"),
            Self::Disconnected => f.write_str("host disconnected"),
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for SendError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::NotReady => defmt::write!(f, "NotReady"),
            Self::Disconnected => defmt::write!(f, "Disconnected"),
        }
    }
}

/// Host-facing USB data channel (CDC data endpoints)
pub trait HostLink {
    /// Take the next byte the host sent, if one is available
    fn receive_byte(&mut self) -> Option<u8>;

    /// Check if the IN endpoint can accept a new packet
    fn is_in_ready(&mut self) -> bool;

    /// Queue one byte for the host
    ///
    /// # Errors
    ///
    /// Returns a [`SendError`] when the byte was not accepted; the caller
    /// keeps ownership of it and retries on a later pass.
    fn send_byte(&mut self, byte: u8) -> Result<(), SendError>;
}

/// Hardware UART transmit side
pub trait SerialPort {
    /// Check if the transmitter can take another byte
    fn is_send_ready(&self) -> bool;

    /// Start transmitting a byte (only call when ready)
    fn send_byte(&mut self, byte: u8);
}

/// What one pump pass moved
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PumpReport {
    /// A byte was taken from the host into the UART channel
    pub from_host: bool,
    /// Bytes handed to the USB IN endpoint
    pub to_host: usize,
    /// A byte was started on the UART transmitter
    pub to_uart: bool,
}

impl PumpReport {
    /// Check if the pass moved nothing
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        !self.from_host && self.to_host == 0 && !self.to_uart
    }
}

/// Cooperative side of the bridge
///
/// Owns both halves of the host-to-UART channel and the reading half of
/// the UART-to-host channel. The writing half of the latter belongs to the
/// [`UartReceiver`].
pub struct SerialBridge<'a> {
    host_to_uart_tx: ChannelWriter<'a>,
    host_to_uart_rx: ChannelReader<'a>,
    uart_to_host: ChannelReader<'a>,
    max_send: usize,
}

impl<'a> SerialBridge<'a> {
    /// Create a bridge for an IN endpoint of `packet_size` bytes
    ///
    /// At most `packet_size - 1` bytes go to the host per pass, so a pass
    /// never produces a full-size packet that would need a zero-length
    /// terminator.
    #[must_use]
    pub fn new(
        host_to_uart_tx: ChannelWriter<'a>,
        host_to_uart_rx: ChannelReader<'a>,
        uart_to_host: ChannelReader<'a>,
        packet_size: u16,
    ) -> Self {
        Self {
            host_to_uart_tx,
            host_to_uart_rx,
            uart_to_host,
            max_send: usize::from(packet_size.saturating_sub(1)),
        }
    }

    /// Most bytes sent to the host in a single pass
    #[must_use]
    pub const fn max_send(&self) -> usize {
        self.max_send
    }

    /// Bytes waiting for the UART
    #[must_use]
    pub fn pending_to_uart(&self) -> usize {
        self.host_to_uart_rx.count()
    }

    /// Bytes waiting for the host
    #[must_use]
    pub fn pending_to_host(&self) -> usize {
        self.uart_to_host.count()
    }

    /// Run one bounded pass in all three directions
    pub fn pump<H, U>(&mut self, host: &mut H, uart: &mut U) -> PumpReport
    where
        H: HostLink,
        U: SerialPort,
    {
        PumpReport {
            from_host: self.pull_from_host(host),
            to_host: self.push_to_host(host),
            to_uart: self.push_to_uart(uart),
        }
    }

    fn pull_from_host<H: HostLink>(&mut self, host: &mut H) -> bool {
        if self.host_to_uart_tx.is_full() {
            return false;
        }

        match host.receive_byte() {
            Some(byte) => self.host_to_uart_tx.insert(byte),
            None => false,
        }
    }

    fn push_to_host<H: HostLink>(&mut self, host: &mut H) -> usize {
        let queued = self.uart_to_host.count();
        if queued == 0 || !host.is_in_ready() {
            return 0;
        }

        let mut sent = 0;
        for _ in 0..queued.min(self.max_send) {
            let Some(byte) = self.uart_to_host.peek() else {
                break;
            };

            // Leave the byte queued on failure so the next pass retries it
            if host.send_byte(byte).is_err() {
                break;
            }

            self.uart_to_host.remove();
            sent += 1;
        }
        sent
    }

    fn push_to_uart<U: SerialPort>(&mut self, uart: &mut U) -> bool {
        if !uart.is_send_ready() {
            return false;
        }

        match self.host_to_uart_rx.remove() {
            Some(byte) => {
                uart.send_byte(byte);
                true
            }
            None => false,
        }
    }
}

/// Interrupt side of the bridge: the sole writer of the UART-to-host channel
pub struct UartReceiver<'a> {
    uart_to_host: ChannelWriter<'a>,
}

impl<'a> UartReceiver<'a> {
    /// Wrap the writing half of the UART-to-host channel
    #[must_use]
    pub const fn new(uart_to_host: ChannelWriter<'a>) -> Self {
        Self { uart_to_host }
    }

    /// Handle one received byte
    ///
    /// The byte is kept only when the host has configured the device and
    /// the channel has room. Returns whether it was kept.
    pub fn on_receive(&mut self, byte: u8, host_configured: bool) -> bool {
        if !host_configured || self.uart_to_host.is_full() {
            return false;
        }
        self.uart_to_host.insert(byte)
    }

    /// Bytes currently waiting for the host
    #[must_use]
    pub fn queued(&self) -> usize {
        self.uart_to_host.count()
    }
}
