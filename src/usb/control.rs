//! Control endpoint glue between embassy-usb and [`VendorControl`]
//!
//! The handler runs inside the USB stack and must not block. A personality
//! switch is therefore only acknowledged here; [`MODE_SWITCH`] hands it to
//! a task that lets the status stage complete before committing.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_usb::control::{InResponse, OutResponse, Request, RequestType};
use embassy_usb::driver::Direction as UsbDirection;
use embassy_usb::Handler;
use static_cell::StaticCell;

use super::set_host_configured;
use crate::control::{ControlRequest, Direction, ModeSwitch, RequestKind, VendorControl};
use crate::types::Personality;

/// Accepted personality switch, waiting to be committed
pub static MODE_SWITCH: Signal<CriticalSectionRawMutex, ModeSwitch> = Signal::new();

/// Device-level handler: vendor requests and connection state
pub struct ControlHandler {
    vendor: VendorControl,
}

impl ControlHandler {
    /// Handler for a device running `personality`
    #[must_use]
    pub const fn new(personality: Personality) -> Self {
        Self {
            vendor: VendorControl::new(personality),
        }
    }
}

/// Allocate the handler for this boot
///
/// # Panics
///
/// Panics if called more than once.
pub fn handler(personality: Personality) -> &'static mut ControlHandler {
    static HANDLER: StaticCell<ControlHandler> = StaticCell::new();
    HANDLER.init(ControlHandler::new(personality))
}

/// Reduce an embassy-usb SETUP packet to what the vendor handler needs
fn to_control_request(req: &Request) -> Option<ControlRequest> {
    let kind = match req.request_type {
        RequestType::Standard => RequestKind::Standard,
        RequestType::Class => RequestKind::Class,
        RequestType::Vendor => RequestKind::Vendor,
        RequestType::Reserved => return None,
    };
    let direction = match req.direction {
        UsbDirection::In => Direction::DeviceToHost,
        UsbDirection::Out => Direction::HostToDevice,
    };

    Some(ControlRequest {
        direction,
        kind,
        request: req.request,
        value: req.value,
    })
}

impl Handler for ControlHandler {
    fn enabled(&mut self, enabled: bool) {
        if !enabled {
            set_host_configured(false);
        }
    }

    fn reset(&mut self) {
        set_host_configured(false);
    }

    fn configured(&mut self, configured: bool) {
        set_host_configured(configured);
        defmt::info!("usb: configured={}", configured);
    }

    fn control_out(&mut self, req: Request, _data: &[u8]) -> Option<OutResponse> {
        let request = to_control_request(&req)?;
        let switch = self.vendor.control_out(&request)?;

        defmt::info!("usb: personality switch to {} requested", switch.target());
        MODE_SWITCH.signal(switch);
        Some(OutResponse::Accepted)
    }

    fn control_in<'a>(&'a mut self, req: Request, buf: &'a mut [u8]) -> Option<InResponse<'a>> {
        let request = to_control_request(&req)?;
        self.vendor.control_in(&request, buf).map(InResponse::Accepted)
    }
}
