//! Mode Arbitration
//!
//! Runs once, first thing after reset. A watchdog reset with the boot key
//! armed leaves for the bootloader; every other boot picks a personality
//! from retained state, falling back to `Serial` after a cold reset or when
//! the retained byte is not a valid personality.

use super::retained::RetainedStore;
use crate::types::{Personality, ResetCause};

/// Outcome of arbitration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BootAction {
    /// Jump to the bootloader; the application never starts
    EnterBootloader,
    /// Start the application in this personality
    Run(Personality),
}

#[cfg(feature = "embedded")]
impl defmt::Format for BootAction {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::EnterBootloader => defmt::write!(f, "EnterBootloader"),
            Self::Run(personality) => defmt::write!(f, "Run({})", personality),
        }
    }
}

/// Non-returning transfer of control to the bootloader
pub trait BootloaderJump {
    /// Leave the application for good
    fn jump(self) -> !;
}

/// Decide what this boot does
///
/// Consumes the boot key (it is cleared whether or not a jump happens) and
/// writes the effective personality back, so retained state always
/// describes the running firmware afterwards.
pub fn arbitrate<S: RetainedStore>(cause: ResetCause, store: &mut S) -> BootAction {
    let jump = cause.is_warm() && store.bootloader_requested();
    store.set_boot_key(0);
    if jump {
        return BootAction::EnterBootloader;
    }

    let personality = if cause.is_cold() {
        Personality::Serial
    } else {
        match Personality::try_from_ordinal(u16::from(store.personality_ordinal())) {
            Some(Personality::ProgrammerRelay) => Personality::ProgrammerRelay,
            // Bootloader only makes sense together with the boot key
            Some(Personality::Serial | Personality::Bootloader) | None => Personality::Serial,
        }
    };

    store.set_personality_ordinal(personality.ordinal());
    BootAction::Run(personality)
}

/// Arbitrate and carry out a bootloader jump if one is due
///
/// Only returns when the application should start.
pub fn select_personality<S, J>(cause: ResetCause, store: &mut S, bootloader: J) -> Personality
where
    S: RetainedStore,
    J: BootloaderJump,
{
    match arbitrate(cause, store) {
        BootAction::EnterBootloader => bootloader.jump(),
        BootAction::Run(personality) => personality,
    }
}
