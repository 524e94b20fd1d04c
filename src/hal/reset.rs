//! Reset Cause and Bootloader Entry

use embassy_stm32::pac;

use crate::boot::BootloaderJump;
use crate::config::BOOTLOADER_ENTRY;
use crate::types::ResetCause;

/// Read and clear the RCC reset flags
///
/// Must run once, before anything else can reset the device. The flags are
/// cleared so the next boot sees only its own cause.
#[must_use]
pub fn take_reset_cause() -> ResetCause {
    let csr = pac::RCC.csr().read();

    // A power-on also raises BORRSTF and PINRSTF, and a watchdog reset also
    // pulses NRST, so the order of these checks matters.
    let cause = if csr.borrstf() {
        ResetCause::BrownOut
    } else if csr.iwdgrstf() || csr.wwdgrstf() {
        ResetCause::Watchdog
    } else if csr.sftrstf() {
        ResetCause::Software
    } else if csr.pinrstf() {
        ResetCause::Pin
    } else {
        ResetCause::Unknown
    };

    pac::RCC.csr().modify(|w| w.set_rmvf(true));
    cause
}

/// The STM32 system memory bootloader
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemBootloader;

impl BootloaderJump for SystemBootloader {
    fn jump(self) -> ! {
        defmt::info!("boot: jumping to system bootloader at {=u32:#x}", BOOTLOADER_ENTRY);

        // SAFETY: called from the top of main before clocks, interrupts or
        // peripherals are touched; system memory starts with a valid vector
        // table.
        unsafe { cortex_m::asm::bootload(BOOTLOADER_ENTRY as *const u32) }
    }
}
