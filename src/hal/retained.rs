//! No-Init Retained RAM
//!
//! The retained state lives in `.uninit`, which cortex-m-rt neither zeroes
//! nor copies at startup. It keeps its contents across a watchdog reset and
//! holds garbage after power-up; arbitration only trusts it on warm boots.

use core::cell::UnsafeCell;
use core::mem::MaybeUninit;
use core::ptr::addr_of_mut;
use core::sync::atomic::{AtomicBool, Ordering};

use crate::boot::{RetainedState, RetainedStore};

struct RetainedCell(UnsafeCell<MaybeUninit<RetainedState>>);

// SAFETY: only reachable through the single `Retained` handle
unsafe impl Sync for RetainedCell {}

#[link_section = ".uninit.RETAINED"]
static RETAINED: RetainedCell = RetainedCell(UnsafeCell::new(MaybeUninit::uninit()));

static TAKEN: AtomicBool = AtomicBool::new(false);

/// Exclusive handle to the retained state
#[derive(Debug)]
pub struct Retained {
    _private: (),
}

impl Retained {
    /// Take the handle; `None` if it was already taken
    #[must_use]
    pub fn take() -> Option<Self> {
        if TAKEN.swap(true, Ordering::AcqRel) {
            None
        } else {
            Some(Self { _private: () })
        }
    }

    fn state() -> *mut RetainedState {
        RETAINED.0.get().cast()
    }
}

// Every bit pattern is a valid u32 or u8, so reading the section before it
// was ever written yields garbage values, never an invalid one. Volatile
// accesses keep the compiler from assuming anything about the contents.
impl RetainedStore for Retained {
    fn boot_key(&self) -> u32 {
        // SAFETY: see above; `Retained` is the only accessor
        unsafe { addr_of_mut!((*Self::state()).boot_key).read_volatile() }
    }

    fn set_boot_key(&mut self, key: u32) {
        // SAFETY: see above
        unsafe { addr_of_mut!((*Self::state()).boot_key).write_volatile(key) }
    }

    fn personality_ordinal(&self) -> u8 {
        // SAFETY: see above
        unsafe { addr_of_mut!((*Self::state()).personality).read_volatile() }
    }

    fn set_personality_ordinal(&mut self, ordinal: u8) {
        // SAFETY: see above
        unsafe { addr_of_mut!((*Self::state()).personality).write_volatile(ordinal) }
    }
}
