// File-level I/O helpers for caption decoding.
//
// Provides `decode_stream()` and `decode_file()` convenience functions that
// push raw caption bytes through `StreamDecoder` with buffered I/O and write
// UTF-8 text. Optionally computes a streaming SHA-256 of the decoded text
// (feature-gated behind `file-io`).

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

#[cfg(feature = "file-io")]
use sha2::Digest;

use crate::decode::{DecodeError, DecodeOptions, DecodeStats, Decoder, StreamDecoder};

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Statistics returned by `decode_stream()` and `decode_file()`.
#[derive(Debug, Clone)]
pub struct FileDecodeStats {
    /// Caption bytes read.
    pub input_size: u64,
    /// UTF-8 bytes written.
    pub output_size: u64,
    /// Decoder counters.
    pub decode: DecodeStats,
    /// SHA-256 of the written text (if `file-io` feature is enabled).
    pub output_sha256: Option<[u8; 32]>,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error type for file I/O operations.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// I/O error (file open, read, write).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// Caption decoding error.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
}

// ---------------------------------------------------------------------------
// Default buffer size
// ---------------------------------------------------------------------------

const BUF_SIZE: usize = 64 * 1024; // 64 KiB

// ---------------------------------------------------------------------------
// decode_stream
// ---------------------------------------------------------------------------

/// Decode caption bytes from `reader`, writing UTF-8 text to `writer`.
///
/// Input is read in 64 KiB chunks; codes split across reads are joined by
/// the stream decoder. `writer` is flushed before returning.
pub fn decode_stream<R: Read, W: Write>(
    mut reader: R,
    mut writer: W,
    decoder: Decoder<'_>,
) -> Result<FileDecodeStats, IoError> {
    let mut stream = StreamDecoder::new(decoder);
    let mut buf = vec![0u8; BUF_SIZE];
    let mut text = String::with_capacity(BUF_SIZE);
    let mut input_size = 0u64;
    let mut output_size = 0u64;

    #[cfg(feature = "file-io")]
    let mut hasher = sha2::Sha256::new();

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        input_size += n as u64;

        text.clear();
        stream.feed(&buf[..n], &mut text)?;
        writer.write_all(text.as_bytes())?;
        output_size += text.len() as u64;

        #[cfg(feature = "file-io")]
        hasher.update(text.as_bytes());
    }

    let decode = stream.finish()?;
    writer.flush()?;

    #[cfg(feature = "file-io")]
    let output_sha256 = Some(hasher.finalize().into());
    #[cfg(not(feature = "file-io"))]
    let output_sha256: Option<[u8; 32]> = None;

    log::info!(
        "decoded {input_size} caption bytes into {output_size} text bytes ({} unknown, {} controls)",
        decode.unknown,
        decode.controls
    );

    Ok(FileDecodeStats {
        input_size,
        output_size,
        decode,
        output_sha256,
    })
}

// ---------------------------------------------------------------------------
// decode_file
// ---------------------------------------------------------------------------

/// Decode a raw caption byte file, writing UTF-8 text to `output_path`.
pub fn decode_file(
    input_path: &Path,
    output_path: &Path,
    options: DecodeOptions,
) -> Result<FileDecodeStats, IoError> {
    let input = BufReader::with_capacity(BUF_SIZE, File::open(input_path)?);
    let output = BufWriter::with_capacity(BUF_SIZE, File::create(output_path)?);
    decode_stream(input, output, Decoder::with_options(options))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::UnknownCodePolicy;

    /// Reader that hands out at most `step` bytes per call.
    struct Trickle<'a> {
        data: &'a [u8],
        step: usize,
    }

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.step.min(buf.len()).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    #[test]
    fn decode_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("captions.bin");
        let output = dir.path().join("captions.txt");
        std::fs::write(&input, [0x48, 0x69, 0x7F, 0x10, 0x39]).unwrap();

        let stats = decode_file(&input, &output, DecodeOptions::default()).unwrap();

        assert_eq!(std::fs::read_to_string(&output).unwrap(), "Hi♪™");
        assert_eq!(stats.input_size, 5);
        assert_eq!(stats.output_size, "Hi♪™".len() as u64);
        assert_eq!(stats.decode.scalars, 4);
    }

    #[test]
    fn byte_at_a_time_reader() {
        let data = [0x10, 0x33, 0x41, 0x10, 0x34, 0x92, 0x00, 0x00, 0x7F];
        let mut out = Vec::new();
        let stats = decode_stream(Trickle { data: &data, step: 1 }, &mut out, Decoder::new()).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "“A”♪");
        assert_eq!(stats.decode.controls, 1);
        assert_eq!(stats.decode.bytes, data.len());
    }

    #[test]
    fn truncated_input_surfaces() {
        let mut out = Vec::new();
        let err = decode_stream(&[0x41u8, 0x10][..], &mut out, Decoder::new()).unwrap_err();
        assert!(matches!(
            err,
            IoError::Decode(DecodeError::TruncatedSequence { offset: 1, .. })
        ));
    }

    #[test]
    fn strict_policy_surfaces_unknown() {
        let options = DecodeOptions {
            on_unknown: UnknownCodePolicy::Abort,
            ..Default::default()
        };
        let mut out = Vec::new();
        let err = decode_stream(&[0x10u8, 0x41][..], &mut out, Decoder::with_options(options))
            .unwrap_err();
        assert!(err.to_string().contains("0x1041"));
    }

    #[test]
    fn missing_input_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = decode_file(
            &dir.path().join("absent.bin"),
            &dir.path().join("out.txt"),
            DecodeOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, IoError::Io(_)));
    }

    #[cfg(feature = "file-io")]
    #[test]
    fn sha256_of_output() {
        let mut a = Vec::new();
        let mut b = Vec::new();
        // Same text, different byte streams (a control code in the second).
        let sa = decode_stream(&[0x41u8, 0x42][..], &mut a, Decoder::new()).unwrap();
        let sb = decode_stream(&[0x41u8, 0x0D, 0x42][..], &mut b, Decoder::new()).unwrap();
        assert!(sa.output_sha256.is_some());
        assert_eq!(sa.output_sha256, sb.output_sha256);
    }
}
