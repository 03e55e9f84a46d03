#![no_main]
use cea708::decode::{DecodeOptions, Decoder};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary caption bytes must decode or fail cleanly under every policy.
    for options in [DecodeOptions::default(), DecodeOptions::STRICT, DecodeOptions::LENIENT] {
        if let Ok((text, stats)) = Decoder::with_options(options).decode_to_string(data) {
            assert_eq!(stats.bytes, data.len());
            assert_eq!(text.chars().count(), stats.scalars);
        }
    }
});
