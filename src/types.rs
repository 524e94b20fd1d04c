//! Shared types used across the dongle firmware
//!
//! This module defines the domain types that flow between the boot path,
//! the control channel and the serial bridge. Conversions from raw wire
//! values are total: anything out of range is coerced, never rejected.

use core::fmt;

/// Operating personality of the dongle
///
/// Exactly one personality is active per boot; a change only takes
/// effect across a reset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Hash)]
#[repr(u8)]
pub enum Personality {
    /// Virtual serial port bridged to the UART
    #[default]
    Serial = 0,
    /// In-system-programmer command relay
    ProgrammerRelay = 1,
    /// Hand off to the system bootloader
    Bootloader = 2,
}

impl Personality {
    /// Every valid personality, in ordinal order
    pub const ALL: [Self; 3] = [Self::Serial, Self::ProgrammerRelay, Self::Bootloader];

    /// Decode an ordinal, returning `None` when it is out of range
    #[must_use]
    pub const fn try_from_ordinal(ordinal: u16) -> Option<Self> {
        match ordinal {
            0 => Some(Self::Serial),
            1 => Some(Self::ProgrammerRelay),
            2 => Some(Self::Bootloader),
            _ => None,
        }
    }

    /// Decode an ordinal, coercing anything out of range to `Serial`
    #[must_use]
    pub const fn from_ordinal(ordinal: u16) -> Self {
        match Self::try_from_ordinal(ordinal) {
            Some(personality) => personality,
            None => Self::Serial,
        }
    }

    /// Wire ordinal (0 = Serial, 1 = ProgrammerRelay, 2 = Bootloader)
    #[must_use]
    pub const fn ordinal(self) -> u8 {
        self as u8
    }

    /// Short name used in logs
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Serial => "serial",
            Self::ProgrammerRelay => "programmer",
            Self::Bootloader => "bootloader",
        }
    }
}

impl fmt::Display for Personality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Personality {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=str}", self.name());
    }
}

/// Why the MCU came out of reset
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResetCause {
    /// Power was applied
    PowerOn,
    /// Supply dipped below the brown-out threshold
    BrownOut,
    /// The watchdog expired
    Watchdog,
    /// Firmware requested a system reset
    Software,
    /// External reset pin
    Pin,
    /// No recognizable flag was set
    Unknown,
}

impl ResetCause {
    /// Retained memory is only trustworthy after a warm reset
    #[must_use]
    pub const fn is_warm(self) -> bool {
        matches!(self, Self::Watchdog)
    }

    /// Power-on and brown-out leave retained memory undefined
    #[must_use]
    pub const fn is_cold(self) -> bool {
        matches!(self, Self::PowerOn | Self::BrownOut)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for ResetCause {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::PowerOn => defmt::write!(f, "POR"),
            Self::BrownOut => defmt::write!(f, "BOR"),
            Self::Watchdog => defmt::write!(f, "WDG"),
            Self::Software => defmt::write!(f, "SW"),
            Self::Pin => defmt::write!(f, "PIN"),
            Self::Unknown => defmt::write!(f, "?"),
        }
    }
}

/// UART parity
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Parity {
    /// No parity bit
    #[default]
    None,
    /// Odd parity
    Odd,
    /// Even parity
    Even,
}

/// UART stop bits
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum StopBits {
    /// One stop bit
    #[default]
    One,
    /// Two stop bits
    Two,
}

/// UART data bits per character
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DataBits {
    /// Six data bits
    Six,
    /// Seven data bits
    Seven,
    /// Eight data bits
    #[default]
    Eight,
}

impl DataBits {
    /// Coerce a host-supplied bit count to the nearest supported width
    #[must_use]
    pub const fn from_count(bits: u8) -> Self {
        match bits {
            0..=6 => Self::Six,
            7 => Self::Seven,
            _ => Self::Eight,
        }
    }

    /// Number of data bits
    #[must_use]
    pub const fn count(self) -> u8 {
        match self {
            Self::Six => 6,
            Self::Seven => 7,
            Self::Eight => 8,
        }
    }
}

/// Serial parameters negotiated by the host
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineEncoding {
    /// Baud rate in bits per second
    pub baud_rate: u32,
    /// Parity
    pub parity: Parity,
    /// Stop bits
    pub stop_bits: StopBits,
    /// Data bits
    pub data_bits: DataBits,
}

impl LineEncoding {
    /// Decode the fields of a CDC `SET_LINE_CODING` request
    ///
    /// `char_format` and `parity_type` are the raw `bCharFormat` and
    /// `bParityType` codes. Mark and space parity fall back to none, and
    /// 1.5 stop bits to two.
    #[must_use]
    pub const fn from_cdc(baud_rate: u32, char_format: u8, parity_type: u8, data_bits: u8) -> Self {
        Self {
            baud_rate,
            parity: match parity_type {
                1 => Parity::Odd,
                2 => Parity::Even,
                _ => Parity::None,
            },
            stop_bits: match char_format {
                0 => StopBits::One,
                _ => StopBits::Two,
            },
            data_bits: DataBits::from_count(data_bits),
        }
    }
}

impl Default for LineEncoding {
    fn default() -> Self {
        crate::config::DEFAULT_LINE_ENCODING
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for LineEncoding {
    fn format(&self, f: defmt::Formatter) {
        let parity = match self.parity {
            Parity::None => 'N',
            Parity::Odd => 'O',
            Parity::Even => 'E',
        };
        let stop = match self.stop_bits {
            StopBits::One => 1u8,
            StopBits::Two => 2u8,
        };
        defmt::write!(
            f,
            "{} {}{}{}",
            self.baud_rate,
            self.data_bits.count(),
            parity,
            stop
        );
    }
}
