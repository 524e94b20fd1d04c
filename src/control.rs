//! Control Channel Handler
//!
//! Vendor requests on the USB control endpoint:
//!
//! | Code | Direction      | Payload              | Meaning                      |
//! |------|----------------|----------------------|------------------------------|
//! | 0    | device to host | 4 bytes, big-endian  | identification sentinel      |
//! | 1    | device to host | 1 byte               | current personality ordinal  |
//! | 1    | host to device | `wValue`             | switch personality and reset |
//!
//! A personality switch never re-initializes in place. The new value is
//! written to retained state and the watchdog resets the device, so the
//! change always goes through the normal boot path.

use crate::boot::RetainedStore;
use crate::config::{BOOT_KEY_SENTINEL, MODE_SWITCH_WATCHDOG_MS, REQUEST_IDENTIFY, REQUEST_PERSONALITY};
use crate::types::Personality;

/// Transfer direction of a control request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// IN: the device answers with data
    DeviceToHost,
    /// OUT: the host sends a command
    HostToDevice,
}

/// Request type field of `bmRequestType`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestKind {
    /// Chapter 9 request
    Standard,
    /// Class request (CDC and friends)
    Class,
    /// Vendor request
    Vendor,
}

/// One control SETUP packet, reduced to what this handler looks at
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ControlRequest {
    /// Transfer direction
    pub direction: Direction,
    /// Request type
    pub kind: RequestKind,
    /// `bRequest`
    pub request: u8,
    /// `wValue`
    pub value: u16,
}

impl ControlRequest {
    /// Vendor IN request
    #[must_use]
    pub const fn vendor_in(request: u8) -> Self {
        Self {
            direction: Direction::DeviceToHost,
            kind: RequestKind::Vendor,
            request,
            value: 0,
        }
    }

    /// Vendor OUT request carrying `value`
    #[must_use]
    pub const fn vendor_out(request: u8, value: u16) -> Self {
        Self {
            direction: Direction::HostToDevice,
            kind: RequestKind::Vendor,
            request,
            value,
        }
    }
}

/// Watchdog used to reset into a new personality
pub trait Watchdog {
    /// Start the watchdog with the given timeout
    fn arm(&mut self, timeout_ms: u32);

    /// Wait for the armed watchdog to reset the device
    fn wait_for_reset(&mut self) -> !;
}

/// Vendor request handler for the running personality
#[derive(Clone, Copy, Debug)]
pub struct VendorControl {
    personality: Personality,
}

impl VendorControl {
    /// Handler for a device running `personality`
    #[must_use]
    pub const fn new(personality: Personality) -> Self {
        Self { personality }
    }

    /// Personality reported to the host
    #[must_use]
    pub const fn personality(&self) -> Personality {
        self.personality
    }

    /// Answer a device-to-host request
    ///
    /// Writes the reply into `buf` and returns the filled part, or `None`
    /// when the request is not ours (the stack then stalls it).
    pub fn control_in<'b>(&self, request: &ControlRequest, buf: &'b mut [u8]) -> Option<&'b [u8]> {
        if request.kind != RequestKind::Vendor || request.direction != Direction::DeviceToHost {
            return None;
        }

        match request.request {
            REQUEST_IDENTIFY => {
                let reply = buf.get_mut(..4)?;
                reply.copy_from_slice(&BOOT_KEY_SENTINEL.to_be_bytes());
                Some(reply)
            }
            REQUEST_PERSONALITY => {
                let reply = buf.get_mut(..1)?;
                reply[0] = self.personality.ordinal();
                Some(reply)
            }
            _ => None,
        }
    }

    /// Handle a host-to-device request
    ///
    /// Returns the switch to perform once the transfer is acknowledged, or
    /// `None` when the request is not ours.
    #[must_use]
    pub fn control_out(&self, request: &ControlRequest) -> Option<ModeSwitch> {
        if request.kind != RequestKind::Vendor || request.direction != Direction::HostToDevice {
            return None;
        }

        match request.request {
            REQUEST_PERSONALITY => Some(ModeSwitch::from_value(request.value)),
            _ => None,
        }
    }
}

/// A requested personality change, pending until reset
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModeSwitch {
    target: Personality,
}

#[cfg(feature = "embedded")]
impl defmt::Format for ModeSwitch {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "ModeSwitch({})", self.target);
    }
}

impl ModeSwitch {
    /// Switch to whatever `value` names; out-of-range values mean `Serial`
    #[must_use]
    pub const fn from_value(value: u16) -> Self {
        Self {
            target: Personality::from_ordinal(value),
        }
    }

    /// Personality the next boot will run
    #[must_use]
    pub const fn target(&self) -> Personality {
        self.target
    }

    /// Persist the target and arm the watchdog
    ///
    /// After this returns the device resets within the watchdog timeout no
    /// matter what the caller does.
    pub fn commit<S, W>(&self, store: &mut S, watchdog: &mut W)
    where
        S: RetainedStore,
        W: Watchdog,
    {
        store.store_personality(self.target);
        watchdog.arm(MODE_SWITCH_WATCHDOG_MS);
    }

    /// Persist, arm and wait for the reset
    pub fn execute<S, W>(self, store: &mut S, watchdog: &mut W) -> !
    where
        S: RetainedStore,
        W: Watchdog,
    {
        self.commit(store, watchdog);
        watchdog.wait_for_reset()
    }
}
