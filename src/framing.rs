//! Line framing
//!
//! Splits an arbitrary byte stream into newline-terminated records. Chunk
//! boundaries are not assumed to line up with record boundaries, so the
//! framer buffers bytes and only decodes a line once its terminating `\n`
//! has arrived. Splitting on the raw byte keeps multi-byte UTF-8 sequences
//! intact even when a chunk ends halfway through one.

use crate::error::RelayError;

/// Default upper bound for a single record, in bytes.
pub const DEFAULT_MAX_LINE_BYTES: usize = 8 * 1024 * 1024;

/// Incremental newline framer.
#[derive(Debug, Clone)]
pub struct LineFramer {
    pending: Vec<u8>,
    /// Prefix of `pending` already searched for a newline.
    scanned: usize,
    max_line_bytes: Option<usize>,
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new()
    }
}

impl LineFramer {
    /// Create a framer with the default line budget.
    pub fn new() -> Self {
        Self::with_max_line_bytes(Some(DEFAULT_MAX_LINE_BYTES))
    }

    /// Create a framer with a custom line budget (`None` disables it).
    pub fn with_max_line_bytes(max_line_bytes: Option<usize>) -> Self {
        Self {
            pending: Vec::new(),
            scanned: 0,
            max_line_bytes,
        }
    }

    /// Feed one chunk and return every line it completed, in order.
    ///
    /// Lines that are blank after trimming are dropped. The unterminated tail
    /// stays buffered for the next call.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<String>, RelayError> {
        self.pending.extend_from_slice(chunk);

        let mut lines = Vec::new();
        let mut start = 0;
        let mut from = self.scanned;
        while let Some(offset) = self.pending[from..].iter().position(|b| *b == b'\n') {
            let end = from + offset;
            self.check_len(end - start)?;
            let line = String::from_utf8_lossy(&self.pending[start..end]);
            if !line.trim().is_empty() {
                lines.push(line.into_owned());
            }
            start = end + 1;
            from = start;
        }
        self.pending.drain(..start);
        self.scanned = self.pending.len();
        self.check_len(self.pending.len())?;

        Ok(lines)
    }

    /// Bytes currently buffered without a terminating newline.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// End the stream. The unterminated remainder is discarded, never
    /// emitted; returns how many bytes were dropped.
    pub fn finish(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        self.scanned = 0;
        dropped
    }

    fn check_len(&self, len: usize) -> Result<(), RelayError> {
        match self.max_line_bytes {
            Some(limit) if len > limit => Err(RelayError::LineTooLong { len, limit }),
            _ => Ok(()),
        }
    }
}
