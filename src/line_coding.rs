//! Line Encoding Application
//!
//! Translates host-negotiated serial parameters into USART register images
//! and applies them in a glitch-free order. The USART runs with 8x
//! oversampling, trading some baud accuracy for a wider range. Anything the
//! hardware cannot represent is coerced to the nearest frame it can.

use crate::types::{DataBits, LineEncoding, Parity, StopBits};

/// CR1 bit positions
pub mod cr1 {
    //! USART_CR1 bits used by the bridge

    /// USART enable
    pub const UE: u32 = 1 << 0;
    /// Receiver enable
    pub const RE: u32 = 1 << 2;
    /// Transmitter enable
    pub const TE: u32 = 1 << 3;
    /// RX not empty interrupt enable
    pub const RXNEIE: u32 = 1 << 5;
    /// Parity selection (1 = odd)
    pub const PS: u32 = 1 << 9;
    /// Parity control enable
    pub const PCE: u32 = 1 << 10;
    /// Word length bit 0
    pub const M0: u32 = 1 << 12;
    /// Oversampling by 8
    pub const OVER8: u32 = 1 << 15;
    /// Word length bit 1
    pub const M1: u32 = 1 << 28;
}

/// CR2 bit positions
pub mod cr2 {
    //! USART_CR2 bits used by the bridge

    /// Two stop bits (STOP = 0b10)
    pub const STOP_2: u32 = 0b10 << 12;
}

/// Smallest USARTDIV accepted with 8x oversampling
const MIN_USARTDIV: u32 = 16;

/// Largest USARTDIV that fits the divisor register
const MAX_USARTDIV: u32 = 0xFFFF;

/// Register images for one USART configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UartFrame {
    /// Baud rate register
    pub brr: u32,
    /// Frame format bits of CR1 (without the enable bits)
    pub cr1: u32,
    /// CR2 (stop bits)
    pub cr2: u32,
}

impl UartFrame {
    /// Enable bits written last, once the frame is in place
    pub const ENABLE: u32 = cr1::UE | cr1::TE | cr1::RE | cr1::RXNEIE;

    /// Build the register images for `encoding`
    #[must_use]
    pub fn from_encoding(encoding: &LineEncoding, kernel_clock_hz: u32) -> Self {
        let parity = match encoding.parity {
            Parity::None => 0,
            Parity::Even => cr1::PCE,
            Parity::Odd => cr1::PCE | cr1::PS,
        };

        Self {
            brr: baud_divisor(encoding.baud_rate, kernel_clock_hz),
            cr1: cr1::OVER8 | parity | word_length(encoding.data_bits, encoding.parity),
            cr2: match encoding.stop_bits {
                StopBits::One => 0,
                StopBits::Two => cr2::STOP_2,
            },
        }
    }

    /// CR1 with the USART running
    #[must_use]
    pub const fn cr1_enabled(&self) -> u32 {
        self.cr1 | Self::ENABLE
    }

    /// Baud rate the hardware will actually produce
    #[must_use]
    pub fn effective_baud(&self, kernel_clock_hz: u32) -> u32 {
        let usartdiv = (self.brr & !0xF) | ((self.brr & 0x7) << 1);
        let rate = 2 * u64::from(kernel_clock_hz) / u64::from(usartdiv.max(1));
        u32::try_from(rate).unwrap_or(u32::MAX)
    }
}

/// Divisor register value for `baud`, rounded to the nearest step
///
/// With OVER8 only even divisors are representable, so the rounding is
/// done on `fck / baud` before doubling. A zero baud rate selects the
/// slowest rate the divisor allows.
#[must_use]
pub fn baud_divisor(baud: u32, kernel_clock_hz: u32) -> u32 {
    let rounded = if baud == 0 {
        MAX_USARTDIV
    } else {
        let baud = u64::from(baud);
        let half = (u64::from(kernel_clock_hz) + baud / 2) / baud;
        u32::try_from(half * 2).unwrap_or(MAX_USARTDIV)
    };
    let usartdiv = rounded.clamp(MIN_USARTDIV, MAX_USARTDIV);

    // With OVER8 the low nibble is shifted right by one and BRR[3] stays clear
    (usartdiv & !0xF) | ((usartdiv & 0xF) >> 1)
}

/// M1:M0 for the requested data bits; the word length includes parity
fn word_length(data_bits: DataBits, parity: Parity) -> u32 {
    let parity_bit = u8::from(parity != Parity::None);
    match data_bits.count() + parity_bit {
        9 => cr1::M0,
        8 => 0,
        // 7 bits, or 6 without parity which the USART cannot produce
        _ => cr1::M1,
    }
}

/// Raw register access to the bridge USART
pub trait UartRegisters {
    /// Drive TX high as a plain output so no start bit can leak out
    fn hold_tx_idle(&mut self);

    /// Hand TX back to the USART
    fn release_tx(&mut self);

    /// Write CR1
    fn write_cr1(&mut self, value: u32);

    /// Write CR2
    fn write_cr2(&mut self, value: u32);

    /// Write BRR
    fn write_brr(&mut self, value: u32);
}

/// Reconfigure the USART for `encoding`
///
/// TX is held idle for the whole window and the USART is disabled while
/// every register is replaced, so the line never carries a partial frame.
pub fn apply_line_encoding<R: UartRegisters>(
    regs: &mut R,
    encoding: &LineEncoding,
    kernel_clock_hz: u32,
) -> UartFrame {
    let frame = UartFrame::from_encoding(encoding, kernel_clock_hz);

    regs.hold_tx_idle();
    regs.write_cr1(0);
    regs.write_brr(frame.brr);
    regs.write_cr2(frame.cr2);
    regs.write_cr1(frame.cr1);
    regs.write_cr1(frame.cr1_enabled());
    regs.release_tx();

    frame
}

/// Encoding currently programmed into the USART
///
/// The host side reports the encoding it wants on every pass; only a
/// difference from what the hardware runs is worth a reconfiguration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineCodingTracker {
    applied: LineEncoding,
}

impl LineCodingTracker {
    /// Start from the encoding the USART was brought up with
    #[must_use]
    pub const fn new(applied: LineEncoding) -> Self {
        Self { applied }
    }

    /// Encoding the hardware runs
    #[must_use]
    pub const fn applied(&self) -> LineEncoding {
        self.applied
    }

    /// Record `requested`; returns it when the USART must be reprogrammed
    pub fn update(&mut self, requested: LineEncoding) -> Option<LineEncoding> {
        if requested == self.applied {
            return None;
        }
        self.applied = requested;
        Some(requested)
    }
}
