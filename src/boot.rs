//! Boot Path
//!
//! Decides, before anything else is initialized, which personality this
//! boot runs and whether to leave for the bootloader instead.

pub mod arbitration;
pub mod retained;

pub use arbitration::{arbitrate, select_personality, BootAction, BootloaderJump};
pub use retained::{RetainedState, RetainedStore};
