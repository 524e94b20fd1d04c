//! Vendor Bulk Link
//!
//! The programmer personality exposes one vendor-specific interface with a
//! bulk OUT endpoint for commands and a bulk IN endpoint for responses.

use core::task::Poll;

use embassy_futures::poll_once;
use embassy_usb::driver::{Driver, EndpointIn, EndpointOut};
use embassy_usb::Builder;

use super::{host_configured, UsbDriver};
use crate::bridge::SendError;
use crate::config::PROGRAMMER_PACKET_SIZE;
use crate::programmer::{CommandLink, Frame, FRAME_SIZE};

/// Vendor-specific interface class
const CLASS_VENDOR: u8 = 0xFF;

type BulkOut = <UsbDriver as Driver<'static>>::EndpointOut;
type BulkIn = <UsbDriver as Driver<'static>>::EndpointIn;

/// Command link over a bulk endpoint pair
pub struct BulkLink {
    ep_out: BulkOut,
    ep_in: BulkIn,
    command: Option<Frame>,
    response: Frame,
}

impl BulkLink {
    /// Add the vendor interface and its endpoints to `builder`
    pub fn new(builder: &mut Builder<'static, UsbDriver>) -> Self {
        let mut function = builder.function(CLASS_VENDOR, 0, 0);
        let mut interface = function.interface();
        let mut alt = interface.alt_setting(CLASS_VENDOR, 0, 0, None);
        let ep_out = alt.endpoint_bulk_out(PROGRAMMER_PACKET_SIZE);
        let ep_in = alt.endpoint_bulk_in(PROGRAMMER_PACKET_SIZE);

        Self {
            ep_out,
            ep_in,
            command: None,
            response: Frame::new(),
        }
    }

    /// Poll each endpoint once without waiting
    pub async fn service(&mut self) {
        if !self.response.is_empty() {
            if let Poll::Ready(result) = poll_once(self.ep_in.write(&self.response)) {
                if let Err(err) = result {
                    defmt::debug!("bulk: response dropped: {}", err);
                }
                self.response.clear();
            }
        }

        if self.command.is_none() {
            let mut buf = [0u8; FRAME_SIZE];
            if let Poll::Ready(Ok(len)) = poll_once(self.ep_out.read(&mut buf)) {
                self.command = Frame::from_slice(&buf[..len]).ok();
            }
        }
    }
}

impl CommandLink for BulkLink {
    fn is_configured(&self) -> bool {
        host_configured()
    }

    fn receive_command(&mut self, frame: &mut Frame) -> bool {
        match self.command.take() {
            Some(command) => {
                *frame = command;
                true
            }
            None => false,
        }
    }

    fn send_response(&mut self, response: &[u8]) -> Result<(), SendError> {
        if !host_configured() {
            return Err(SendError::Disconnected);
        }
        if !self.response.is_empty() {
            return Err(SendError::NotReady);
        }
        self.response.extend_from_slice(response).map_err(|()| SendError::NotReady)
    }
}
