//! cea708: CEA-708 closed caption character sets and text decoding in Rust.
//!
//! The crate provides:
//! - The CEA-708 character catalog: G0, G1 and the EXT1 specials (`charset`)
//! - A lazy decoder from caption code bytes to Unicode scalars (`decode`)
//! - High-level text APIs, including batch decoding (`engine`)
//! - File-oriented helpers (`io`)
//! - An optional CLI (`cli` feature)
//!
//! # Quick Start
//!
//! ```no_run
//! use cea708::decode::{DecodeOptions, Decoder, UnknownCodePolicy};
//!
//! // "Hi" followed by the G0 music note.
//! let text = cea708::engine::decode_text(&[0x48, 0x69, 0x7F]).unwrap();
//! assert_eq!(text, "Hi♪");
//!
//! // EXT1 0x39 is the trade mark sign; EXT1 0x40 has no mapping.
//! let decoder = Decoder::with_options(DecodeOptions {
//!     on_unknown: UnknownCodePolicy::Replace('?'),
//!     ..Default::default()
//! });
//! let (text, stats) = decoder.decode_to_string(&[0x10, 0x39, 0x10, 0x40]).unwrap();
//! assert_eq!(text, "™?");
//! assert_eq!(stats.unknown, 1);
//! ```

pub mod charset;
pub mod decode;
pub mod engine;
pub mod io;

#[cfg(feature = "cli")]
pub mod cli;
