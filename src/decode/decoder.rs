// Caption byte stream decoding.
//
// Two layers:
//   - `Scanner` splits the byte stream into codes: one-byte G0/G1
//     characters, EXT1-prefixed two-byte codes, and control commands with
//     their parameter bytes.
//   - `Chars` resolves each character code through the catalog and applies
//     the unknown-code policy, yielding Unicode scalars lazily.
//
// Neither keeps state beyond the scan position, so every `decode` call is
// independent and the catalog is only ever borrowed.

use crate::charset::bank::{self, CodeValue, EXT1};
use crate::charset::catalog::{Catalog, default_catalog};

use super::control::ControlSpace;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Decode failure, with the byte offset of the offending code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// No mapping for the code, under `UnknownCodePolicy::Abort`.
    #[error("unknown CEA-708 code {code:#06X} at offset {offset}")]
    UnknownCode { code: CodeValue, offset: usize },
    /// Input ended inside a multi-byte code.
    #[error("truncated code sequence at offset {offset}: {needed} more byte(s) expected")]
    TruncatedSequence { offset: usize, needed: usize },
}

impl DecodeError {
    /// Byte offset of the code that failed.
    pub fn offset(&self) -> usize {
        match *self {
            Self::UnknownCode { offset, .. } | Self::TruncatedSequence { offset, .. } => offset,
        }
    }

    /// The same error with its offset moved forward by `base` bytes.
    pub fn shifted(self, base: usize) -> Self {
        match self {
            Self::UnknownCode { code, offset } => Self::UnknownCode {
                code,
                offset: offset + base,
            },
            Self::TruncatedSequence { offset, needed } => Self::TruncatedSequence {
                offset: offset + base,
                needed,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// What to do with a code that has no mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownCodePolicy {
    /// Drop the code and keep going; counted in `DecodeStats::unknown`.
    #[default]
    Skip,
    /// Emit the given scalar in its place.
    Replace(char),
    /// Stop with `DecodeError::UnknownCode`.
    Abort,
}

/// Decoder configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Handling of unmapped codes.
    pub on_unknown: UnknownCodePolicy,
    /// Decode TSP/NBTSP as U+0020/U+00A0 instead of treating them as unknown.
    ///
    /// Off by default. When on, TSP and NBTSP share scalars with G0 0x20 and
    /// G1 0xA0.
    pub transparent_spaces: bool,
    /// Consume control commands silently. When off, each command goes
    /// through `on_unknown` like an unmapped character.
    pub skip_controls: bool,
}

impl DecodeOptions {
    /// Any unmapped character code is an error.
    pub const STRICT: DecodeOptions = DecodeOptions {
        on_unknown: UnknownCodePolicy::Abort,
        transparent_spaces: false,
        skip_controls: true,
    };

    /// Unmapped codes become U+FFFD.
    pub const LENIENT: DecodeOptions = DecodeOptions {
        on_unknown: UnknownCodePolicy::Replace(char::REPLACEMENT_CHARACTER),
        transparent_spaces: false,
        skip_controls: true,
    };
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            on_unknown: UnknownCodePolicy::Skip,
            transparent_spaces: false,
            skip_controls: true,
        }
    }
}

/// Counters collected while decoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeStats {
    /// Input bytes consumed, complete codes only.
    pub bytes: usize,
    /// Scalars emitted, replacements included.
    pub scalars: usize,
    /// Codes with no mapping (skipped or replaced).
    pub unknown: usize,
    /// Unknown codes emitted as the replacement scalar.
    pub replaced: usize,
    /// Control commands stepped over.
    pub controls: usize,
}

impl DecodeStats {
    pub fn merge(&mut self, other: &DecodeStats) {
        self.bytes += other.bytes;
        self.scalars += other.scalars;
        self.unknown += other.unknown;
        self.replaced += other.replaced;
        self.controls += other.controls;
    }
}

// ---------------------------------------------------------------------------
// Scanner
// ---------------------------------------------------------------------------

/// One unit of the caption byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Code {
    /// A character code: one byte, or `0x10xx` for EXT1 sequences.
    Char(CodeValue),
    /// A command; `params` bytes after the opcode have been consumed.
    Control {
        space: ControlSpace,
        code: u8,
        params: usize,
    },
}

/// Splits a byte slice into codes without resolving them.
///
/// Yields `(offset, code)` pairs. After a `TruncatedSequence` the scanner
/// is exhausted and its position stays at the start of the incomplete code.
pub struct Scanner<'a> {
    data: &'a [u8],
    pos: usize,
    exhausted: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            exhausted: false,
        }
    }

    /// Bytes of complete codes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    fn classify(&self, offset: usize) -> Result<(Code, usize), DecodeError> {
        let byte = self.data[offset];
        if byte == EXT1 {
            let Some(&sel) = self.data.get(offset + 1) else {
                return Err(DecodeError::TruncatedSequence { offset, needed: 1 });
            };
            let code = match ControlSpace::extended(sel) {
                Some(space) if space.is_variable(sel) => {
                    let Some(&header) = self.data.get(offset + 2) else {
                        return Err(DecodeError::TruncatedSequence { offset, needed: 1 });
                    };
                    Code::Control {
                        space,
                        code: sel,
                        params: ControlSpace::variable_len(header),
                    }
                }
                Some(space) => match space.parameter_len(sel) {
                    Some(params) => Code::Control {
                        space,
                        code: sel,
                        params,
                    },
                    None => Code::Char(bank::extended(sel)),
                },
                None => Code::Char(bank::extended(sel)),
            };
            let len = match code {
                Code::Control { params, .. } => 2 + params,
                Code::Char(_) => 2,
            };
            return Ok((code, len));
        }

        match ControlSpace::single(byte) {
            Some(space) => {
                // Both single-byte spaces have a fixed length for every code.
                let params = space.parameter_len(byte).unwrap_or(0);
                Ok((
                    Code::Control {
                        space,
                        code: byte,
                        params,
                    },
                    1 + params,
                ))
            }
            None => Ok((Code::Char(CodeValue::from(byte)), 1)),
        }
    }
}

impl Iterator for Scanner<'_> {
    type Item = Result<(usize, Code), DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        let offset = self.pos;
        if self.exhausted || offset >= self.data.len() {
            return None;
        }

        let result = self.classify(offset).and_then(|(code, len)| {
            let end = offset + len;
            if end > self.data.len() {
                Err(DecodeError::TruncatedSequence {
                    offset,
                    needed: end - self.data.len(),
                })
            } else {
                Ok((code, end))
            }
        });

        match result {
            Ok((code, end)) => {
                self.pos = end;
                Some(Ok((offset, code)))
            }
            Err(e) => {
                self.exhausted = true;
                Some(Err(e))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// Resolves caption byte streams against a catalog.
///
/// Cheap to copy; holds only a catalog reference and options.
#[derive(Debug, Clone, Copy)]
pub struct Decoder<'c> {
    catalog: &'c Catalog,
    options: DecodeOptions,
}

impl Decoder<'static> {
    /// Decoder over the standard catalog with default options.
    pub fn new() -> Self {
        Self::with_options(DecodeOptions::default())
    }

    pub fn with_options(options: DecodeOptions) -> Self {
        Self {
            catalog: default_catalog(),
            options,
        }
    }
}

impl Default for Decoder<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'c> Decoder<'c> {
    /// Decoder over an explicitly constructed catalog.
    pub fn with_catalog(catalog: &'c Catalog, options: DecodeOptions) -> Self {
        Self { catalog, options }
    }

    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    pub fn catalog(&self) -> &'c Catalog {
        self.catalog
    }

    /// Lazily decode `stream` into scalars.
    pub fn decode<'a>(&self, stream: &'a [u8]) -> Chars<'a>
    where
        'c: 'a,
    {
        Chars {
            scanner: Scanner::new(stream),
            catalog: self.catalog,
            options: self.options,
            stats: DecodeStats::default(),
            finished: false,
        }
    }

    /// Decode all of `stream` into a `String`.
    pub fn decode_to_string(&self, stream: &[u8]) -> Result<(String, DecodeStats), DecodeError> {
        let mut out = String::with_capacity(stream.len());
        let mut chars = self.decode(stream);
        for c in chars.by_ref() {
            out.push(c?);
        }
        Ok((out, chars.stats()))
    }
}

/// Iterator over the scalars of one caption byte stream.
///
/// Ends after the first error.
pub struct Chars<'a> {
    scanner: Scanner<'a>,
    catalog: &'a Catalog,
    options: DecodeOptions,
    stats: DecodeStats,
    finished: bool,
}

impl Chars<'_> {
    /// Counters for everything decoded so far.
    pub fn stats(&self) -> DecodeStats {
        DecodeStats {
            bytes: self.scanner.position(),
            ..self.stats
        }
    }

    fn resolve(&self, code: CodeValue) -> Option<char> {
        if self.options.transparent_spaces {
            match code {
                bank::TSP => return Some(' '),
                bank::NBTSP => return Some('\u{A0}'),
                _ => {}
            }
        }
        self.catalog.resolve(code).ok()
    }

    fn unknown(&mut self, code: CodeValue, offset: usize) -> Option<Result<char, DecodeError>> {
        match self.options.on_unknown {
            UnknownCodePolicy::Skip => {
                self.stats.unknown += 1;
                log::debug!("skipping unknown code {code:#06X} at offset {offset}");
                None
            }
            UnknownCodePolicy::Replace(c) => {
                self.stats.unknown += 1;
                self.stats.replaced += 1;
                self.stats.scalars += 1;
                log::debug!("replacing unknown code {code:#06X} at offset {offset}");
                Some(Ok(c))
            }
            UnknownCodePolicy::Abort => {
                self.finished = true;
                Some(Err(DecodeError::UnknownCode { code, offset }))
            }
        }
    }
}

impl Iterator for Chars<'_> {
    type Item = Result<char, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        loop {
            let (offset, code) = match self.scanner.next()? {
                Ok(item) => item,
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            };

            match code {
                Code::Char(value) => match self.resolve(value) {
                    Some(c) => {
                        self.stats.scalars += 1;
                        return Some(Ok(c));
                    }
                    None => {
                        if let Some(item) = self.unknown(value, offset) {
                            return Some(item);
                        }
                    }
                },
                Code::Control { space, code, .. } if space.carries_character(code) => {
                    if let Some(item) = self.unknown(space.code_value(code), offset) {
                        return Some(item);
                    }
                }
                Code::Control { space, code, params } => {
                    if self.options.skip_controls {
                        self.stats.controls += 1;
                        log::trace!("{space} command {code:#04X} (+{params}) at offset {offset}");
                    } else if let Some(item) = self.unknown(space.code_value(code), offset) {
                        return Some(item);
                    }
                }
            }
        }
    }
}

impl std::iter::FusedIterator for Chars<'_> {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(bytes: &[u8]) -> Result<String, DecodeError> {
        Decoder::new().decode_to_string(bytes).map(|(s, _)| s)
    }

    fn decode_opts(bytes: &[u8], options: DecodeOptions) -> Result<(String, DecodeStats), DecodeError> {
        Decoder::with_options(options).decode_to_string(bytes)
    }

    #[test]
    fn hi_with_music_note() {
        assert_eq!(decode(&[0x48, 0x69, 0x7F]).unwrap(), "Hi♪");
    }

    #[test]
    fn latin1_passthrough() {
        assert_eq!(decode(&[0x63, 0x61, 0x66, 0xE9]).unwrap(), "café");
    }

    #[test]
    fn ext1_specials() {
        let bytes = [0x10, 0x33, 0x48, 0x69, 0x10, 0x34, 0x10, 0x25];
        assert_eq!(decode(&bytes).unwrap(), "“Hi”…");
    }

    #[test]
    fn bare_ext1_is_truncated() {
        assert_eq!(
            decode(&[0x41, 0x10]),
            Err(DecodeError::TruncatedSequence {
                offset: 1,
                needed: 1
            })
        );
    }

    #[test]
    fn truncated_regardless_of_policy() {
        for options in [DecodeOptions::default(), DecodeOptions::LENIENT, DecodeOptions::STRICT] {
            let err = decode_opts(&[0x10], options).unwrap_err();
            assert!(matches!(err, DecodeError::TruncatedSequence { offset: 0, .. }));
        }
    }

    #[test]
    fn unknown_extended_is_skipped_by_default() {
        let (text, stats) = decode_opts(&[0x41, 0x10, 0x40, 0x42], DecodeOptions::default()).unwrap();
        assert_eq!(text, "AB");
        assert_eq!(stats.unknown, 1);
        assert_eq!(stats.scalars, 2);
        assert_eq!(stats.bytes, 4);
    }

    #[test]
    fn unknown_extended_replaced() {
        let (text, stats) = decode_opts(&[0x41, 0x10, 0x40, 0x42], DecodeOptions::LENIENT).unwrap();
        assert_eq!(text, "A\u{FFFD}B");
        assert_eq!(stats.replaced, 1);
        assert_eq!(stats.scalars, 3);
    }

    #[test]
    fn unknown_extended_aborts() {
        assert_eq!(
            decode_opts(&[0x41, 0x10, 0x40, 0x42], DecodeOptions::STRICT),
            Err(DecodeError::UnknownCode {
                code: 0x1040,
                offset: 1
            })
        );
    }

    #[test]
    fn chars_stop_after_error() {
        let decoder = Decoder::with_options(DecodeOptions::STRICT);
        let items: Vec<_> = decoder.decode(&[0x41, 0x10, 0x40, 0x42]).collect();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0], Ok('A'));
        assert!(items[1].is_err());
    }

    #[test]
    fn transparent_spaces_are_opt_in() {
        let (text, stats) = decode_opts(&[0x41, 0x10, 0x20, 0x42], DecodeOptions::default()).unwrap();
        assert_eq!(text, "AB");
        assert_eq!(stats.unknown, 1);

        let options = DecodeOptions {
            transparent_spaces: true,
            ..DecodeOptions::default()
        };
        let (text, _) = decode_opts(&[0x41, 0x10, 0x20, 0x10, 0x21, 0x42], options).unwrap();
        assert_eq!(text, "A \u{A0}B");
    }

    #[test]
    fn default_output_tells_spaces_apart() {
        for (ext, plain) in [(0x20u8, 0x20u8), (0x21, 0xA0)] {
            let a = decode_opts(&[0x10, ext], DecodeOptions::default()).unwrap().0;
            let b = decode(&[plain]).unwrap();
            assert_ne!(a, b, "EXT1 {ext:#04x} vs {plain:#04x}");
        }
    }

    #[test]
    fn control_parameters_are_not_text() {
        // CW0, SPL(row 0x41, col 0x42), "Hi", CR, DF0 with six parameters.
        let bytes = [
            0x80, 0x92, 0x41, 0x42, 0x48, 0x69, 0x0D, 0x98, 0x41, 0x41, 0x41, 0x41, 0x41, 0x41,
        ];
        let (text, stats) = decode_opts(&bytes, DecodeOptions::default()).unwrap();
        assert_eq!(text, "Hi");
        assert_eq!(stats.controls, 4);
        assert_eq!(stats.unknown, 0);
    }

    #[test]
    fn extended_controls_are_stepped_over() {
        // C2 0x08 with one parameter, C3 0x80 with four.
        let bytes = [0x10, 0x08, 0x41, 0x42, 0x10, 0x80, 1, 2, 3, 4, 0x43];
        let (text, stats) = decode_opts(&bytes, DecodeOptions::default()).unwrap();
        assert_eq!(text, "BC");
        assert_eq!(stats.controls, 2);
    }

    #[test]
    fn truncated_control_parameters() {
        // SPC needs three parameters.
        assert_eq!(
            decode(&[0x41, 0x91, 0x00]),
            Err(DecodeError::TruncatedSequence {
                offset: 1,
                needed: 2
            })
        );
    }

    #[test]
    fn strict_controls_use_unknown_policy() {
        let options = DecodeOptions {
            skip_controls: false,
            ..DecodeOptions::STRICT
        };
        assert_eq!(
            decode_opts(&[0x41, 0x0D], options),
            Err(DecodeError::UnknownCode {
                code: 0x0D,
                offset: 1
            })
        );

        let options = DecodeOptions {
            skip_controls: false,
            ..DecodeOptions::LENIENT
        };
        let (text, _) = decode_opts(&[0x10, 0x08, 0x00, 0x41], options).unwrap();
        assert_eq!(text, "\u{FFFD}A");
    }

    #[test]
    fn variable_length_c3_skips_its_payload() {
        // Header 0x02: two payload bytes that look like "AB".
        let (text, stats) =
            decode_opts(&[0x10, 0x90, 0x02, 0x41, 0x42, 0x5A], DecodeOptions::default()).unwrap();
        assert_eq!(text, "Z");
        assert_eq!(stats.controls, 1);
        assert_eq!(stats.unknown, 0);
        assert_eq!(stats.bytes, 6);
    }

    #[test]
    fn variable_length_c3_truncation() {
        // Missing header byte.
        assert_eq!(
            decode(&[0x41, 0x10, 0x9F]),
            Err(DecodeError::TruncatedSequence {
                offset: 1,
                needed: 1
            })
        );
        // Header promises three payload bytes; one arrives.
        assert_eq!(
            decode(&[0x10, 0x90, 0x03, 0x41]),
            Err(DecodeError::TruncatedSequence {
                offset: 0,
                needed: 2
            })
        );
    }

    #[test]
    fn p16_is_an_unknown_character() {
        let (text, stats) = decode_opts(&[0x41, 0x18, 0x12, 0x34, 0x42], DecodeOptions::default()).unwrap();
        assert_eq!(text, "AB");
        assert_eq!(stats.unknown, 1);
        assert_eq!(stats.controls, 0);

        let (text, _) = decode_opts(&[0x18, 0x12, 0x34], DecodeOptions::LENIENT).unwrap();
        assert_eq!(text, "\u{FFFD}");

        assert_eq!(
            decode_opts(&[0x41, 0x18, 0x12, 0x34], DecodeOptions::STRICT),
            Err(DecodeError::UnknownCode {
                code: 0x18,
                offset: 1
            })
        );
    }

    #[test]
    fn stats_after_truncation_stop_at_incomplete_code() {
        let decoder = Decoder::new();
        let mut chars = decoder.decode(&[0x41, 0x42, 0x98, 0x00]);
        assert_eq!(chars.next(), Some(Ok('A')));
        assert_eq!(chars.next(), Some(Ok('B')));
        assert!(matches!(
            chars.next(),
            Some(Err(DecodeError::TruncatedSequence { offset: 2, .. }))
        ));
        assert_eq!(chars.next(), None);
        assert_eq!(chars.stats().bytes, 2);
    }

    #[test]
    fn scanner_yields_offsets() {
        let codes: Vec<_> = Scanner::new(&[0x41, 0x10, 0x25, 0x8D, 0x05])
            .map(Result::unwrap)
            .collect();
        assert_eq!(
            codes,
            vec![
                (0, Code::Char(0x41)),
                (1, Code::Char(0x1025)),
                (
                    3,
                    Code::Control {
                        space: ControlSpace::C1,
                        code: 0x8D,
                        params: 1
                    }
                ),
            ]
        );
    }

    #[test]
    fn decode_is_restartable() {
        let decoder = Decoder::new();
        let bytes = [0x48, 0x69];
        let a: String = decoder.decode(&bytes).map(Result::unwrap).collect();
        let b: String = decoder.decode(&bytes).map(Result::unwrap).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn explicit_catalog() {
        let catalog = Catalog::new();
        let decoder = Decoder::with_catalog(&catalog, DecodeOptions::default());
        assert_eq!(decoder.decode_to_string(&[0x10, 0x39]).unwrap().0, "™");
    }

    #[test]
    fn error_offsets_shift() {
        let e = DecodeError::UnknownCode {
            code: 0x1040,
            offset: 2,
        };
        assert_eq!(e.shifted(10).offset(), 12);
    }

    #[test]
    fn empty_input() {
        let (text, stats) = decode_opts(&[], DecodeOptions::default()).unwrap();
        assert!(text.is_empty());
        assert_eq!(stats, DecodeStats::default());
    }
}
