// CEA-708 control code spaces and their parameter lengths.
//
// Commands share the byte stream with characters. The decoder never
// interprets them, but it has to step over their parameter bytes so they
// are not read back as text.

use std::fmt;

use crate::charset::bank::{self, CodeValue};

/// The four control code spaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlSpace {
    /// Single byte `0x00..=0x1F` (EXT1 excluded).
    C0,
    /// Single byte `0x80..=0x9F`.
    C1,
    /// EXT1 + `0x00..=0x1F`.
    C2,
    /// EXT1 + `0x80..=0x9F`.
    C3,
}

/// Parameter byte counts for C1, indexed by `code - 0x80`.
///
/// CW0-7, CLW, DSW, HDW, TGW, DLW, DLY, DLC, RST, SPA, SPC, SPL,
/// reserved 0x93-0x96, SWA, DF0-7.
const C1_PARAMS: [u8; 32] = [
    0, 0, 0, 0, 0, 0, 0, 0, // CW0..CW7
    1, 1, 1, 1, 1, 1, 0, 0, // CLW DSW HDW TGW DLW DLY DLC RST
    2, 3, 2, 0, 0, 0, 0, 4, // SPA SPC SPL - - - - SWA
    6, 6, 6, 6, 6, 6, 6, 6, // DF0..DF7
];

/// C0 P16: a 16-bit character code in the next two bytes.
pub const P16: u8 = 0x18;

/// Length field of a variable-length C3 header byte.
const VARIABLE_LEN_MASK: u8 = 0x1F;

impl ControlSpace {
    /// Control space of a byte read directly from the stream.
    pub fn single(byte: u8) -> Option<Self> {
        match byte {
            bank::EXT1 => None,
            0x00..=0x1F => Some(Self::C0),
            0x80..=0x9F => Some(Self::C1),
            _ => None,
        }
    }

    /// Control space of a byte following EXT1.
    pub fn extended(selector: u8) -> Option<Self> {
        match selector {
            0x00..=0x1F => Some(Self::C2),
            0x80..=0x9F => Some(Self::C3),
            _ => None,
        }
    }

    /// Number of parameter bytes following `code`.
    ///
    /// Returns `None` when the length is not fixed (see `is_variable`) or
    /// `code` is outside this space.
    pub fn parameter_len(self, code: u8) -> Option<usize> {
        let n = match (self, code) {
            (Self::C0, 0x00..=0x0F) => 0,
            (Self::C0, 0x11..=0x17) => 1,
            (Self::C0, 0x18..=0x1F) => 2,
            (Self::C1, 0x80..=0x9F) => C1_PARAMS[usize::from(code - 0x80)],
            (Self::C2, 0x00..=0x1F) => code >> 3,
            (Self::C3, 0x80..=0x87) => 4,
            (Self::C3, 0x88..=0x8F) => 5,
            _ => return None,
        };
        Some(usize::from(n))
    }

    /// Whether `code` is a variable-length C3 command, whose length comes
    /// from a header byte instead of the code itself.
    pub fn is_variable(self, code: u8) -> bool {
        self == Self::C3 && (0x90..=0x9F).contains(&code)
    }

    /// Bytes following a variable-length C3 code: the header plus the
    /// payload length held in its low five bits.
    pub fn variable_len(header: u8) -> usize {
        1 + usize::from(header & VARIABLE_LEN_MASK)
    }

    /// Whether `code` carries a character rather than a command.
    ///
    /// P16 addresses character sets this decoder has no table for, so the
    /// carried character is always unknown.
    pub fn carries_character(self, code: u8) -> bool {
        self == Self::C0 && code == P16
    }

    /// Code value of `code` in this space, as reported in diagnostics.
    pub fn code_value(self, code: u8) -> CodeValue {
        match self {
            Self::C0 | Self::C1 => CodeValue::from(code),
            Self::C2 | Self::C3 => bank::extended(code),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::C0 => "C0",
            Self::C1 => "C1",
            Self::C2 => "C2",
            Self::C3 => "C3",
        }
    }
}

impl fmt::Display for ControlSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
