// CEA-708 character catalog: code value -> Unicode scalar.
//
// G0 and G1 are rule-derived (ASCII and Latin-1 identity, with 0x7F moved
// to U+266A). G2 has no closed form and is carried as an enumerated table,
// expanded once into a dense 256-slot lookup indexed by the EXT1 selector.

use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

use super::bank::{self, CharacterBank, CodeValue, MUSIC_NOTE};

/// U+266A EIGHTH NOTE, the glyph of G0 code 0x7F.
pub const MUSIC_NOTE_SCALAR: char = '\u{266A}';

/// Printable G2 set, keyed by EXT1 selector byte.
///
/// TSP (0x20) and NBTSP (0x21) are left out: as U+0020/U+00A0 they would
/// collide with G0/G1.
pub const G2_TABLE: &[(u8, char)] = &[
    (0x25, '\u{2026}'), // HORIZONTAL ELLIPSIS
    (0x2A, '\u{0160}'), // LATIN CAPITAL LETTER S WITH CARON
    (0x2C, '\u{0152}'), // LATIN CAPITAL LIGATURE OE
    (0x30, '\u{2588}'), // FULL BLOCK
    (0x31, '\u{2018}'), // LEFT SINGLE QUOTATION MARK
    (0x32, '\u{2019}'), // RIGHT SINGLE QUOTATION MARK
    (0x33, '\u{201C}'), // LEFT DOUBLE QUOTATION MARK
    (0x34, '\u{201D}'), // RIGHT DOUBLE QUOTATION MARK
    (0x35, '\u{2022}'), // BULLET
    (0x39, '\u{2122}'), // TRADE MARK SIGN
    (0x3A, '\u{0161}'), // LATIN SMALL LETTER S WITH CARON
    (0x3C, '\u{0153}'), // LATIN SMALL LIGATURE OE
    (0x3D, '\u{2120}'), // SERVICE MARK
    (0x3F, '\u{0178}'), // LATIN CAPITAL LETTER Y WITH DIAERESIS
    (0x76, '\u{215B}'), // VULGAR FRACTION ONE EIGHTH
    (0x77, '\u{215C}'), // VULGAR FRACTION THREE EIGHTHS
    (0x78, '\u{215D}'), // VULGAR FRACTION FIVE EIGHTHS
    (0x79, '\u{215E}'), // VULGAR FRACTION SEVEN EIGHTHS
    (0x7A, '\u{2502}'), // BOX DRAWINGS LIGHT VERTICAL
    (0x7B, '\u{2510}'), // BOX DRAWINGS LIGHT DOWN AND LEFT
    (0x7C, '\u{2514}'), // BOX DRAWINGS LIGHT UP AND RIGHT
    (0x7D, '\u{2500}'), // BOX DRAWINGS LIGHT HORIZONTAL
    (0x7E, '\u{2518}'), // BOX DRAWINGS LIGHT UP AND LEFT
    (0x7F, '\u{250C}'), // BOX DRAWINGS LIGHT DOWN AND RIGHT
];

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// The code value has no mapping in any bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown CEA-708 code {0:#06X}")]
pub struct UnknownCode(pub CodeValue);

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

/// UTF-8 encoding of one scalar, ordered by its bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Utf8Bytes {
    buf: [u8; 4],
    len: u8,
}

impl Utf8Bytes {
    pub fn new(c: char) -> Self {
        let mut buf = [0u8; 4];
        let len = c.encode_utf8(&mut buf).len() as u8;
        Self { buf, len }
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..usize::from(self.len)]
    }
}

impl Ord for Utf8Bytes {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_bytes().cmp(other.as_bytes())
    }
}

impl PartialOrd for Utf8Bytes {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for Utf8Bytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x?}", self.as_bytes())
    }
}

impl fmt::Display for Utf8Bytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, b) in self.as_bytes().iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

/// One defined code and the scalar it decodes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CatalogEntry {
    pub code: CodeValue,
    pub scalar: char,
}

impl CatalogEntry {
    pub fn bank(&self) -> CharacterBank {
        // Every entry is built from a bank region, so classification succeeds.
        CharacterBank::of(self.code).unwrap_or(CharacterBank::G2)
    }

    /// UTF-8 bytes of the target scalar; the scanner sort key.
    pub fn utf8(&self) -> Utf8Bytes {
        Utf8Bytes::new(self.scalar)
    }
}

/// Sort entries by the UTF-8 encoding of their target scalar.
///
/// Generated matchers are built from this order, so it must not depend on
/// how the entries were collected.
pub fn sort_for_scanner(entries: &mut [CatalogEntry]) {
    entries.sort_by_key(CatalogEntry::utf8);
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Immutable code -> scalar mapping for all banks.
#[derive(Clone)]
pub struct Catalog {
    /// G2 lookup indexed by EXT1 selector byte.
    specials: [Option<char>; 256],
    special_count: usize,
}

impl Catalog {
    /// Build the standard catalog.
    pub fn new() -> Self {
        let mut specials = [None; 256];
        for &(sel, scalar) in G2_TABLE {
            debug_assert!(specials[usize::from(sel)].is_none(), "duplicate G2 selector {sel:#04x}");
            specials[usize::from(sel)] = Some(scalar);
        }
        Self {
            specials,
            special_count: G2_TABLE.len(),
        }
    }

    /// Resolve a code value to its Unicode scalar.
    pub fn resolve(&self, code: CodeValue) -> Result<char, UnknownCode> {
        match code {
            MUSIC_NOTE => Ok(MUSIC_NOTE_SCALAR),
            // u8 -> char is the Latin-1 identity, which covers ASCII too.
            0x20..=0x7E | 0xA0..=0xFF => Ok(char::from(code as u8)),
            _ => bank::selector(code)
                .and_then(|sel| self.specials[usize::from(sel)])
                .ok_or(UnknownCode(code)),
        }
    }

    /// Whether `code` has a mapping.
    pub fn contains(&self, code: CodeValue) -> bool {
        self.resolve(code).is_ok()
    }

    /// Number of defined codes.
    pub fn len(&self) -> usize {
        // 0x20..=0x7F and 0xA0..=0xFF.
        96 + 96 + self.special_count
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All entries of one bank, in code order.
    pub fn bank_entries(&self, bank: CharacterBank) -> impl Iterator<Item = CatalogEntry> + '_ {
        bank.range().filter_map(move |code| {
            self.resolve(code)
                .ok()
                .map(|scalar| CatalogEntry { code, scalar })
        })
    }

    /// Every defined entry, in code order.
    pub fn entries(&self) -> impl Iterator<Item = CatalogEntry> + '_ {
        CharacterBank::ALL
            .into_iter()
            .flat_map(move |bank| self.bank_entries(bank))
    }

    /// G2 entries in scanner order (sorted by target UTF-8 bytes).
    pub fn scanner_entries(&self) -> Vec<CatalogEntry> {
        let mut entries: Vec<_> = self.bank_entries(CharacterBank::G2).collect();
        sort_for_scanner(&mut entries);
        entries
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Catalog")
            .field("len", &self.len())
            .field("specials", &self.special_count)
            .finish()
    }
}

/// Return a reference to the lazily-initialized standard catalog.
pub fn default_catalog() -> &'static Catalog {
    static CATALOG: LazyLock<Catalog> = LazyLock::new(|| {
        let catalog = Catalog::new();
        log::debug!("built CEA-708 catalog with {} entries", catalog.len());
        catalog
    });
    &CATALOG
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
