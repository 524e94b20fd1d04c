//! Retained Mode State
//!
//! A few bytes that survive a watchdog reset but not a power cycle. The
//! device keeps them in a linker section that startup code never zeroes;
//! the contents are meaningful only when the reset cause says so, which is
//! why nothing but the boot path reads them.

use crate::config::BOOT_KEY_SENTINEL;
use crate::types::Personality;

/// Access to the retained boot key and personality
pub trait RetainedStore {
    /// Raw boot key
    fn boot_key(&self) -> u32;

    /// Overwrite the boot key
    fn set_boot_key(&mut self, key: u32);

    /// Raw personality byte, possibly garbage after a cold reset
    fn personality_ordinal(&self) -> u8;

    /// Overwrite the personality byte
    fn set_personality_ordinal(&mut self, ordinal: u8);

    /// Check if the next warm boot must jump to the bootloader
    fn bootloader_requested(&self) -> bool {
        self.boot_key() == BOOT_KEY_SENTINEL
    }

    /// Record the personality for the next boot
    ///
    /// The boot key is armed for `Bootloader` and cleared for everything
    /// else, so it holds the sentinel exactly when a jump is wanted.
    fn store_personality(&mut self, personality: Personality) {
        self.set_personality_ordinal(personality.ordinal());
        let key = if personality == Personality::Bootloader {
            BOOT_KEY_SENTINEL
        } else {
            0
        };
        self.set_boot_key(key);
    }
}

/// In-memory image of the retained state
///
/// `repr(C)` keeps the layout stable across firmware builds that share the
/// same retained section.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(C)]
pub struct RetainedState {
    /// Bootloader request key
    pub boot_key: u32,
    /// Personality ordinal
    pub personality: u8,
}

impl RetainedState {
    /// Zeroed state: no bootloader request, serial personality
    #[must_use]
    pub const fn new() -> Self {
        Self {
            boot_key: 0,
            personality: 0,
        }
    }
}

impl RetainedStore for RetainedState {
    fn boot_key(&self) -> u32 {
        self.boot_key
    }

    fn set_boot_key(&mut self, key: u32) {
        self.boot_key = key;
    }

    fn personality_ordinal(&self) -> u8 {
        self.personality
    }

    fn set_personality_ordinal(&mut self, ordinal: u8) {
        self.personality = ordinal;
    }
}
