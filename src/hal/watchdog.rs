//! Independent Watchdog

use embassy_stm32::peripherals::IWDG;
use embassy_stm32::wdg::IndependentWatchdog;

use crate::control::Watchdog;

/// IWDG used only to reset into a new personality
///
/// The watchdog stays off during normal operation. Once armed it cannot be
/// stopped, so the device is guaranteed to reset.
pub struct ResetWatchdog {
    iwdg: Option<IWDG>,
}

impl ResetWatchdog {
    /// Wrap the IWDG peripheral without starting it
    #[must_use]
    pub fn new(iwdg: IWDG) -> Self {
        Self { iwdg: Some(iwdg) }
    }
}

impl Watchdog for ResetWatchdog {
    fn arm(&mut self, timeout_ms: u32) {
        let Some(iwdg) = self.iwdg.take() else {
            // Already running; the first timeout still applies
            return;
        };
        let mut wdg = IndependentWatchdog::new(iwdg, timeout_ms.saturating_mul(1000));
        wdg.unleash();
        defmt::debug!("watchdog: armed, reset in {} ms", timeout_ms);
    }

    fn wait_for_reset(&mut self) -> ! {
        // Bounded by the armed timeout: nothing pets the IWDG
        loop {
            cortex_m::asm::nop();
        }
    }
}
