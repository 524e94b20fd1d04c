//! USB Subsystem
//!
//! One device per boot, shaped by the personality:
//!
//! - `Serial`: CDC ACM, bridged to USART1 ([`cdc`])
//! - `ProgrammerRelay`: a vendor interface with one bulk endpoint pair
//!   ([`bulk`])
//!
//! Both share the vendor control handler in [`control`], which is how the
//! host switches between them.

pub mod bulk;
pub mod cdc;
pub mod control;

use core::sync::atomic::{AtomicBool, Ordering};

use embassy_stm32::peripherals::USB;
use embassy_usb::Builder;
use static_cell::ConstStaticCell;

use crate::config::{
    CONTROL_PACKET_SIZE, USB_MANUFACTURER, USB_PID_PROGRAMMER, USB_PID_SERIAL, USB_PRODUCT_PROGRAMMER,
    USB_PRODUCT_SERIAL, USB_VID,
};
use crate::types::Personality;

/// USB driver for the STM32G474 full-speed peripheral
pub type UsbDriver = embassy_stm32::usb::Driver<'static, USB>;

/// Set while the host has the device in the configured state
static HOST_CONFIGURED: AtomicBool = AtomicBool::new(false);

/// Check if the host has configured the device
///
/// Safe to call from interrupt context.
#[must_use]
pub fn host_configured() -> bool {
    HOST_CONFIGURED.load(Ordering::Acquire)
}

pub(crate) fn set_host_configured(configured: bool) {
    HOST_CONFIGURED.store(configured, Ordering::Release);
}

/// Device descriptor settings for `personality`
#[must_use]
pub fn device_config(personality: Personality) -> embassy_usb::Config<'static> {
    let (pid, product) = match personality {
        Personality::ProgrammerRelay => (USB_PID_PROGRAMMER, USB_PRODUCT_PROGRAMMER),
        // Bootloader never gets this far
        Personality::Serial | Personality::Bootloader => (USB_PID_SERIAL, USB_PRODUCT_SERIAL),
    };

    let mut config = embassy_usb::Config::new(USB_VID, pid);
    config.manufacturer = Some(USB_MANUFACTURER);
    config.product = Some(product);
    config.max_packet_size_0 = CONTROL_PACKET_SIZE;
    config.max_power = 100;
    config
}

/// Start a device builder with static descriptor buffers
///
/// Call once per boot; the buffers can only be taken once.
pub fn builder(driver: UsbDriver, personality: Personality) -> Builder<'static, UsbDriver> {
    static CONFIG_DESC: ConstStaticCell<[u8; 256]> = ConstStaticCell::new([0; 256]);
    static BOS_DESC: ConstStaticCell<[u8; 256]> = ConstStaticCell::new([0; 256]);
    static CONTROL_BUF: ConstStaticCell<[u8; 128]> = ConstStaticCell::new([0; 128]);

    Builder::new(
        driver,
        device_config(personality),
        CONFIG_DESC.take().as_mut_slice(),
        BOS_DESC.take().as_mut_slice(),
        &mut [],
        CONTROL_BUF.take().as_mut_slice(),
    )
}
