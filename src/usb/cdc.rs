//! USB CDC ACM Link
//!
//! Adapts the CDC data endpoints to [`HostLink`]. One OUT packet and one IN
//! packet are staged in RAM; [`CdcLink::service`] moves them to and from
//! the endpoints without ever waiting on the host.

use core::task::Poll;

use embassy_futures::poll_once;
use embassy_usb::class::cdc_acm::{self, CdcAcmClass, Receiver, Sender, State};
use embassy_usb::driver::EndpointError;
use embassy_usb::Builder;
use heapless::Vec;
use static_cell::StaticCell;

use super::{host_configured, UsbDriver};
use crate::bridge::{HostLink, SendError};
use crate::config::CDC_PACKET_SIZE;
use crate::line_coding::LineCodingTracker;
use crate::types::LineEncoding;

const PACKET: usize = CDC_PACKET_SIZE as usize;

/// Convert the class's current line coding to a [`LineEncoding`]
#[must_use]
pub fn to_line_encoding(coding: &cdc_acm::LineCoding) -> LineEncoding {
    LineEncoding::from_cdc(
        coding.data_rate(),
        coding.stop_bits() as u8,
        coding.parity_type() as u8,
        coding.data_bits(),
    )
}

/// Host side of the serial bridge
pub struct CdcLink {
    sender: Sender<'static, UsbDriver>,
    receiver: Receiver<'static, UsbDriver>,
    rx: [u8; PACKET],
    rx_len: usize,
    rx_pos: usize,
    tx: Vec<u8, PACKET>,
    line_coding: LineCodingTracker,
}

impl CdcLink {
    /// Add a CDC ACM function to `builder`
    ///
    /// `applied` is the encoding the UART was brought up with.
    ///
    /// # Panics
    ///
    /// Panics if called more than once.
    pub fn new(builder: &mut Builder<'static, UsbDriver>, applied: LineEncoding) -> Self {
        static STATE: StaticCell<State<'static>> = StaticCell::new();
        let class = CdcAcmClass::new(builder, STATE.init(State::new()), CDC_PACKET_SIZE);
        let (sender, receiver) = class.split();

        Self {
            sender,
            receiver,
            rx: [0; PACKET],
            rx_len: 0,
            rx_pos: 0,
            tx: Vec::new(),
            line_coding: LineCodingTracker::new(applied),
        }
    }

    /// Move staged packets to and from the endpoints
    ///
    /// Each endpoint is polled once. An endpoint that is still busy with
    /// the previous packet leaves the staged data untouched for next time.
    pub async fn service(&mut self) {
        if !self.tx.is_empty() {
            match poll_once(self.sender.write_packet(&self.tx)) {
                Poll::Ready(Ok(())) => self.tx.clear(),
                Poll::Ready(Err(EndpointError::Disabled)) => {
                    // Host went away; the packet has nowhere to go
                    self.tx.clear();
                }
                Poll::Ready(Err(EndpointError::BufferOverflow)) => {
                    defmt::warn!("cdc: IN packet of {} bytes rejected", self.tx.len());
                    self.tx.clear();
                }
                Poll::Pending => {}
            }
        }

        if self.rx_pos >= self.rx_len {
            if let Poll::Ready(Ok(len)) = poll_once(self.receiver.read_packet(&mut self.rx)) {
                self.rx_len = len;
                self.rx_pos = 0;
            }
        }
    }

    /// Line encoding the UART must switch to, if the host's differs
    pub fn take_line_encoding_change(&mut self) -> Option<LineEncoding> {
        self.line_coding.update(to_line_encoding(&self.sender.line_coding()))
    }
}

impl HostLink for CdcLink {
    fn receive_byte(&mut self) -> Option<u8> {
        if self.rx_pos >= self.rx_len {
            return None;
        }
        let byte = self.rx[self.rx_pos];
        self.rx_pos += 1;
        Some(byte)
    }

    fn is_in_ready(&mut self) -> bool {
        host_configured() && self.tx.is_empty()
    }

    fn send_byte(&mut self, byte: u8) -> Result<(), SendError> {
        if !host_configured() {
            return Err(SendError::Disconnected);
        }
        self.tx.push(byte).map_err(|_| SendError::NotReady)
    }
}
