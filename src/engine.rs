// High-level decoding API.
//
// Thin wrappers that pair the standard catalog with a `Decoder`:
//   - `decode_text` for the common case (default options, text only)
//   - `decode_text_with` when the caller picks the policy and wants stats
//   - `decode_batch` for many independent streams, in parallel with the
//     `parallel` feature

use crate::decode::{DecodeError, DecodeOptions, DecodeStats, Decoder};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Decode a caption byte stream with default options.
///
/// Unknown codes are skipped; truncated input is an error.
pub fn decode_text(stream: &[u8]) -> Result<String, DecodeError> {
    decode_text_with(stream, DecodeOptions::default()).map(|(text, _)| text)
}

/// Decode with explicit options, returning the text and decoder counters.
pub fn decode_text_with(
    stream: &[u8],
    options: DecodeOptions,
) -> Result<(String, DecodeStats), DecodeError> {
    Decoder::with_options(options).decode_to_string(stream)
}

/// Decode independent caption streams.
///
/// Results are returned in input order. The catalog is shared read-only, so
/// streams decode concurrently with no coordination when `parallel` is on.
pub fn decode_batch<S>(
    streams: &[S],
    options: DecodeOptions,
) -> Vec<Result<(String, DecodeStats), DecodeError>>
where
    S: AsRef<[u8]> + Sync,
{
    let decoder = Decoder::with_options(options);

    #[cfg(feature = "parallel")]
    let results: Vec<_> = streams
        .par_iter()
        .map(|s| decoder.decode_to_string(s.as_ref()))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let results: Vec<_> = streams
        .iter()
        .map(|s| decoder.decode_to_string(s.as_ref()))
        .collect();

    results
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::UnknownCodePolicy;

    #[test]
    fn decode_text_default() {
        assert_eq!(decode_text(&[0x48, 0x69, 0x7F]).unwrap(), "Hi♪");
    }

    #[test]
    fn decode_text_with_stats() {
        let (text, stats) = decode_text_with(
            &[0x10, 0x40, 0x41],
            DecodeOptions {
                on_unknown: UnknownCodePolicy::Replace('?'),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(text, "?A");
        assert_eq!(stats.replaced, 1);
    }

    #[test]
    fn batch_keeps_order_and_errors() {
        let streams: Vec<Vec<u8>> = vec![b"one".to_vec(), vec![0x10], b"three".to_vec()];
        let results = decode_batch(&streams, DecodeOptions::default());
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().0, "one");
        assert!(matches!(
            results[1],
            Err(DecodeError::TruncatedSequence { .. })
        ));
        assert_eq!(results[2].as_ref().unwrap().0, "three");
    }

    #[test]
    fn batch_across_threads() {
        let streams: Vec<[u8; 2]> = (0..64).map(|_| [0x10, 0x39]).collect();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let streams = streams.clone();
                std::thread::spawn(move || decode_batch(&streams, DecodeOptions::default()))
            })
            .collect();
        for h in handles {
            for r in h.join().unwrap() {
                assert_eq!(r.unwrap().0, "™");
            }
        }
    }
}
