// CEA-708 character code values and bank classification.
//
// Single-byte codes index G0 (0x20..=0x7F) and G1 (0xA0..=0xFF) directly.
// Two-byte codes are an EXT1 prefix followed by a selector byte and are
// carried as `0x1000 | selector`.

use std::fmt;
use std::ops::RangeInclusive;

/// One CEA-708 character code, either a single byte or `0x10xx`.
pub type CodeValue = u16;

/// Extension prefix byte (EXT1) introducing a two-byte code.
pub const EXT1: u8 = 0x10;

/// Base of the two-byte code space (`EXT1 << 8`).
pub const EXTENDED_BASE: CodeValue = 0x1000;

/// G0 slot repurposed for the musical note symbol.
pub const MUSIC_NOTE: CodeValue = 0x7F;

/// Transparent space (G2).
pub const TSP: CodeValue = 0x1020;

/// Non-breaking transparent space (G2).
pub const NBTSP: CodeValue = 0x1021;

/// Combine an EXT1 selector byte into a two-byte code value.
#[inline]
pub const fn extended(selector: u8) -> CodeValue {
    EXTENDED_BASE | selector as CodeValue
}

/// Split a code value into its EXT1 selector byte, if it is a two-byte code.
#[inline]
pub const fn selector(code: CodeValue) -> Option<u8> {
    if code & 0xFF00 == EXTENDED_BASE {
        Some((code & 0xFF) as u8)
    } else {
        None
    }
}

/// Character banks defined by CEA-708.
///
/// The EXT1 graphic region `0x10A0..=0x10FF` (G3 in the standard) holds only
/// the [CC] icon, which has no Unicode counterpart, so it is folded into
/// `G2` and resolves to nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CharacterBank {
    /// Printable ASCII plus the 0x7F music note.
    G0,
    /// Latin-1 upper half.
    G1,
    /// EXT1-prefixed specials.
    G2,
}

impl CharacterBank {
    pub const ALL: [CharacterBank; 3] = [Self::G0, Self::G1, Self::G2];

    /// Classify a code value into the bank whose graphic region contains it.
    ///
    /// Being inside a bank region does not imply the code is defined; G2 in
    /// particular is sparse. Control code regions return `None`.
    pub fn of(code: CodeValue) -> Option<Self> {
        match code {
            0x20..=0x7F => Some(Self::G0),
            0xA0..=0xFF => Some(Self::G1),
            0x1020..=0x107F | 0x10A0..=0x10FF => Some(Self::G2),
            _ => None,
        }
    }

    /// The code value range covered by this bank.
    pub fn range(self) -> RangeInclusive<CodeValue> {
        match self {
            Self::G0 => 0x20..=0x7F,
            Self::G1 => 0xA0..=0xFF,
            Self::G2 => 0x1020..=0x10FF,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::G0 => "G0",
            Self::G1 => "G1",
            Self::G2 => "G2",
        }
    }

    /// Number of bytes a code of this bank occupies in a caption stream.
    pub fn encoded_len(self) -> usize {
        match self {
            Self::G0 | Self::G1 => 1,
            Self::G2 => 2,
        }
    }
}

impl fmt::Display for CharacterBank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
