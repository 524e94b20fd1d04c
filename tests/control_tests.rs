//! Control Channel Tests
//!
//! Tests for the vendor requests: identification, personality query and
//! the reset-based personality switch.
//! Run with: cargo test --target x86_64-unknown-linux-gnu --no-default-features --features std --test control_tests

use std::panic;

use srxe_dongle::boot::{arbitrate, BootAction, RetainedState, RetainedStore};
use srxe_dongle::config::{BOOT_KEY_SENTINEL, MODE_SWITCH_WATCHDOG_MS, REQUEST_IDENTIFY, REQUEST_PERSONALITY};
use srxe_dongle::control::{ControlRequest, Direction, ModeSwitch, RequestKind, VendorControl, Watchdog};
use srxe_dongle::types::{Personality, ResetCause};

/// Watchdog that records the arm and unwinds instead of resetting
#[derive(Default)]
struct MockWatchdog {
    armed: Option<u32>,
}

impl Watchdog for MockWatchdog {
    fn arm(&mut self, timeout_ms: u32) {
        self.armed = Some(timeout_ms);
    }

    fn wait_for_reset(&mut self) -> ! {
        panic!("watchdog reset");
    }
}

// =============================================================================
// Identify Tests
// =============================================================================

#[test]
fn identify_returns_sentinel_big_endian() {
    let control = VendorControl::new(Personality::Serial);
    let mut buf = [0u8; 64];

    let reply = control.control_in(&ControlRequest::vendor_in(REQUEST_IDENTIFY), &mut buf);
    assert_eq!(reply, Some(&b"srxe"[..]));
    assert_eq!(u32::from_be_bytes([b's', b'r', b'x', b'e']), BOOT_KEY_SENTINEL);
}

#[test]
fn identify_is_the_same_in_every_personality() {
    for personality in Personality::ALL {
        let control = VendorControl::new(personality);
        let mut buf = [0u8; 8];
        let reply = control.control_in(&ControlRequest::vendor_in(REQUEST_IDENTIFY), &mut buf);
        assert_eq!(reply, Some(&[0x73, 0x72, 0x78, 0x65][..]));
    }
}

#[test]
fn identify_needs_room_for_four_bytes() {
    let control = VendorControl::new(Personality::Serial);
    let mut buf = [0u8; 3];
    assert_eq!(control.control_in(&ControlRequest::vendor_in(REQUEST_IDENTIFY), &mut buf), None);
}

// =============================================================================
// Personality Query Tests
// =============================================================================

#[test]
fn get_personality_reports_running_ordinal() {
    for (personality, ordinal) in [(Personality::Serial, 0u8), (Personality::ProgrammerRelay, 1)] {
        let control = VendorControl::new(personality);
        let mut buf = [0xFFu8; 64];
        let reply = control.control_in(&ControlRequest::vendor_in(REQUEST_PERSONALITY), &mut buf);
        assert_eq!(reply, Some(&[ordinal][..]));
        assert_eq!(control.personality(), personality);
    }
}

#[test]
fn unknown_vendor_request_is_not_handled() {
    let control = VendorControl::new(Personality::Serial);
    let mut buf = [0u8; 64];
    assert_eq!(control.control_in(&ControlRequest::vendor_in(7), &mut buf), None);
    assert_eq!(control.control_out(&ControlRequest::vendor_out(7, 1)), None);
    assert_eq!(control.control_out(&ControlRequest::vendor_out(REQUEST_IDENTIFY, 1)), None);
}

#[test]
fn non_vendor_requests_are_left_to_the_stack() {
    let control = VendorControl::new(Personality::Serial);
    let mut buf = [0u8; 64];

    for kind in [RequestKind::Standard, RequestKind::Class] {
        let request = ControlRequest {
            direction: Direction::DeviceToHost,
            kind,
            request: REQUEST_IDENTIFY,
            value: 0,
        };
        assert_eq!(control.control_in(&request, &mut buf), None);

        let request = ControlRequest {
            direction: Direction::HostToDevice,
            kind,
            request: REQUEST_PERSONALITY,
            value: 1,
        };
        assert_eq!(control.control_out(&request), None);
    }
}

#[test]
fn direction_must_match() {
    let control = VendorControl::new(Personality::Serial);
    let mut buf = [0u8; 64];

    let out_as_in = ControlRequest::vendor_out(REQUEST_PERSONALITY, 1);
    assert_eq!(control.control_in(&out_as_in, &mut buf), None);

    let in_as_out = ControlRequest::vendor_in(REQUEST_PERSONALITY);
    assert_eq!(control.control_out(&in_as_out), None);
}

// =============================================================================
// Personality Switch Tests
// =============================================================================

#[test]
fn set_personality_accepts_each_target() {
    let control = VendorControl::new(Personality::Serial);
    for personality in Personality::ALL {
        let request = ControlRequest::vendor_out(REQUEST_PERSONALITY, u16::from(personality.ordinal()));
        let switch = control.control_out(&request);
        assert_eq!(switch.map(|s| s.target()), Some(personality));
    }
}

#[test]
fn out_of_range_value_switches_to_serial() {
    let mut state = RetainedState {
        boot_key: BOOT_KEY_SENTINEL,
        personality: Personality::Bootloader.ordinal(),
    };
    let mut watchdog = MockWatchdog::default();

    let control = VendorControl::new(Personality::ProgrammerRelay);
    let switch = control
        .control_out(&ControlRequest::vendor_out(REQUEST_PERSONALITY, 5))
        .unwrap();
    assert_eq!(switch.target(), Personality::Serial);

    switch.commit(&mut state, &mut watchdog);
    assert_eq!(state.personality, Personality::Serial.ordinal());
    assert_eq!(state.boot_key, 0);
    assert_eq!(watchdog.armed, Some(MODE_SWITCH_WATCHDOG_MS));
}

#[test]
fn commit_to_bootloader_arms_key() {
    let mut state = RetainedState::new();
    let mut watchdog = MockWatchdog::default();

    ModeSwitch::from_value(2).commit(&mut state, &mut watchdog);

    assert!(state.bootloader_requested());
    assert_eq!(state.personality, Personality::Bootloader.ordinal());
    assert!(watchdog.armed.is_some());
}

#[test]
fn switch_to_current_personality_still_resets() {
    let control = VendorControl::new(Personality::Serial);
    let switch = control
        .control_out(&ControlRequest::vendor_out(REQUEST_PERSONALITY, 0))
        .unwrap();

    let mut state = RetainedState::new();
    let mut watchdog = MockWatchdog::default();
    switch.commit(&mut state, &mut watchdog);
    assert_eq!(watchdog.armed, Some(MODE_SWITCH_WATCHDOG_MS));
}

#[test]
fn execute_never_returns() {
    let result = panic::catch_unwind(|| {
        let mut state = RetainedState::new();
        let mut watchdog = MockWatchdog::default();
        ModeSwitch::from_value(1).execute(&mut state, &mut watchdog)
    });
    assert!(result.is_err());
}

#[test]
fn switch_then_watchdog_reset_lands_in_target() {
    let cases = [
        (0u16, BootAction::Run(Personality::Serial)),
        (1, BootAction::Run(Personality::ProgrammerRelay)),
        (2, BootAction::EnterBootloader),
        (0xFFFF, BootAction::Run(Personality::Serial)),
    ];

    for (value, expected) in cases {
        let mut state = RetainedState::new();
        let mut watchdog = MockWatchdog::default();
        ModeSwitch::from_value(value).commit(&mut state, &mut watchdog);
        assert_eq!(arbitrate(ResetCause::Watchdog, &mut state), expected);
    }
}
