// Chunked caption stream decoding.
//
// StreamDecoder accepts caption bytes as they arrive (one service block or
// read buffer at a time):
//   - Codes split across a chunk boundary are carried into the next chunk
//   - Error offsets are absolute within the whole stream
//   - Stats accumulate across chunks

use super::decoder::{DecodeError, DecodeStats, Decoder};

/// Incremental decoder for a caption stream delivered in pieces.
///
/// Create one per stream. After `feed` returns an error other than a split
/// code the stream is malformed and the decoder should be dropped.
pub struct StreamDecoder<'c> {
    decoder: Decoder<'c>,
    /// Bytes of an incomplete code held over from the previous chunk.
    pending: Vec<u8>,
    /// Absolute offset of `pending[0]`.
    base: usize,
    stats: DecodeStats,
    chunks: u64,
}

impl<'c> StreamDecoder<'c> {
    pub fn new(decoder: Decoder<'c>) -> Self {
        Self {
            decoder,
            pending: Vec::new(),
            base: 0,
            stats: DecodeStats::default(),
            chunks: 0,
        }
    }

    /// Decode `chunk`, appending complete scalars to `out`.
    ///
    /// Returns the number of scalars appended.
    pub fn feed(&mut self, chunk: &[u8], out: &mut String) -> Result<usize, DecodeError> {
        self.pending.extend_from_slice(chunk);
        self.chunks += 1;

        let mut consumed = self.pending.len();
        let mut emitted = 0;
        let mut chars = self.decoder.decode(&self.pending);
        for item in chars.by_ref() {
            match item {
                Ok(c) => {
                    out.push(c);
                    emitted += 1;
                }
                Err(DecodeError::TruncatedSequence { offset, .. }) => {
                    consumed = offset;
                    break;
                }
                Err(e) => return Err(e.shifted(self.base)),
            }
        }

        let stats = DecodeStats {
            bytes: consumed,
            ..chars.stats()
        };
        self.stats.merge(&stats);
        self.pending.drain(..consumed);
        self.base += consumed;

        if !self.pending.is_empty() {
            log::trace!(
                "carrying {} byte(s) at offset {} into the next chunk",
                self.pending.len(),
                self.base
            );
        }
        Ok(emitted)
    }

    /// End the stream. Fails if it stopped inside a code.
    pub fn finish(self) -> Result<DecodeStats, DecodeError> {
        if self.pending.is_empty() {
            return Ok(self.stats);
        }
        for item in self.decoder.decode(&self.pending) {
            item.map_err(|e| e.shifted(self.base))?;
        }
        // Pending bytes always end in an incomplete code.
        Err(DecodeError::TruncatedSequence {
            offset: self.base,
            needed: 1,
        })
    }

    /// Stats for all completely decoded input so far.
    pub fn stats(&self) -> DecodeStats {
        self.stats
    }

    /// Bytes held over waiting for the rest of a code.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn chunks_fed(&self) -> u64 {
        self.chunks
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
