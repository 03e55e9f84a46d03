// Caption code stream decoding.
//
// # Modules
//
// - `control`: C0/C1/C2/C3 command spaces and parameter lengths
// - `decoder`: Scanner, lazy scalar iterator, options and unknown-code policy
// - `stream`: Incremental decoding across chunk boundaries

pub mod control;
pub mod decoder;
pub mod stream;

pub use control::ControlSpace;
pub use decoder::{
    Chars, Code, DecodeError, DecodeOptions, DecodeStats, Decoder, Scanner, UnknownCodePolicy,
};
pub use stream::StreamDecoder;
