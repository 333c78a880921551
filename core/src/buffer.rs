//! Sentence-bounded buffering of streamed input.
//!
//! The buffer accumulates up to a fixed number of characters from a byte
//! reader (decoding UTF-8 incrementally) and yields slices that end on a
//! sentence delimiter, carrying the partial trailing sentence over to the
//! next call. A full buffer with no delimiter is returned whole so the
//! stream always makes progress on degenerate long lines.

use std::io::Read;

/// Buffer capacity, in characters.
pub const BUFFER_CAPACITY: usize = 512;

/// Sentence delimiters. A slice ends just after the last of these found in
/// the filled region.
const DELIMITERS: [char; 7] = ['\r', '\n', ';', '；', '。', '!', '！'];

fn is_delimiter(ch: char) -> bool {
    DELIMITERS.contains(&ch)
}

/// Fixed-capacity character buffer yielding sentence-bounded slices.
///
/// Invariant: the concatenation of every slice returned by [`fill`] equals
/// the decoded input character stream, in order, with no loss and no
/// duplication.
///
/// [`fill`]: SentenceBuffer::fill
pub struct SentenceBuffer<R> {
    reader: R,
    /// Bytes read but not yet decoded (may end mid-sequence).
    raw: Vec<u8>,
    /// Decoded characters not yet returned: the carried-over remainder plus
    /// newly read input.
    chars: Vec<char>,
    eof: bool,
}

impl<R: Read> SentenceBuffer<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            raw: Vec::new(),
            chars: Vec::new(),
            eof: false,
        }
    }

    /// Return the next sentence-bounded slice, or `None` at end of stream.
    ///
    /// The slice ends just past the last delimiter in the filled buffer.
    /// With no delimiter, a full buffer is returned whole; at end of stream
    /// a non-empty remainder is returned once as the final slice.
    pub fn fill(&mut self) -> std::io::Result<Option<String>> {
        self.refill()?;
        if self.chars.is_empty() {
            return Ok(None);
        }
        let cut = match last_delimiter_end(&self.chars) {
            Some(end) => end,
            // Degenerate long line, or the final remainder at end of stream.
            None => self.chars.len(),
        };
        Ok(Some(self.chars.drain(..cut).collect()))
    }

    /// Top the character buffer up to capacity, or to end of stream.
    fn refill(&mut self) -> std::io::Result<()> {
        let mut read_buf = [0u8; 1024];
        loop {
            self.decode_pending();
            if self.chars.len() >= BUFFER_CAPACITY || self.eof {
                break;
            }
            let n = self.reader.read(&mut read_buf)?;
            if n == 0 {
                self.eof = true;
            } else {
                self.raw.extend_from_slice(&read_buf[..n]);
            }
        }
        // Bytes still undecoded at EOF with spare capacity can only be an
        // incomplete trailing sequence, which will never complete.
        if self.eof && !self.raw.is_empty() && self.chars.len() < BUFFER_CAPACITY {
            self.raw.clear();
            self.chars.push(char::REPLACEMENT_CHARACTER);
        }
        Ok(())
    }

    /// Decode buffered bytes into `chars`, up to capacity. Invalid sequences
    /// become replacement characters; an incomplete trailing sequence stays
    /// in `raw` until more bytes arrive.
    fn decode_pending(&mut self) {
        let mut consumed = 0;
        while consumed < self.raw.len() && self.chars.len() < BUFFER_CAPACITY {
            match std::str::from_utf8(&self.raw[consumed..]) {
                Ok(valid) => {
                    consumed += push_chars(&mut self.chars, valid);
                }
                Err(err) => {
                    let valid_len = err.valid_up_to();
                    if valid_len > 0 {
                        if let Ok(valid) =
                            std::str::from_utf8(&self.raw[consumed..consumed + valid_len])
                        {
                            let took = push_chars(&mut self.chars, valid);
                            consumed += took;
                            if took < valid_len {
                                break; // capacity reached mid-run
                            }
                        }
                    }
                    match err.error_len() {
                        Some(bad) => {
                            if self.chars.len() >= BUFFER_CAPACITY {
                                break;
                            }
                            self.chars.push(char::REPLACEMENT_CHARACTER);
                            consumed += bad;
                        }
                        // Incomplete trailing sequence: wait for more bytes.
                        None => break,
                    }
                }
            }
        }
        self.raw.drain(..consumed);
    }
}

/// Push chars from `valid` until the buffer reaches capacity; returns the
/// number of bytes consumed.
fn push_chars(chars: &mut Vec<char>, valid: &str) -> usize {
    for (idx, ch) in valid.char_indices() {
        if chars.len() >= BUFFER_CAPACITY {
            return idx;
        }
        chars.push(ch);
    }
    valid.len()
}

/// Index one past the last delimiter, scanning backward. The scan stops
/// before index 0: a delimiter in the very first position cannot bound a
/// non-empty sentence, so the buffer is treated as delimiter-free.
fn last_delimiter_end(chars: &[char]) -> Option<usize> {
    for i in (1..chars.len()).rev() {
        if is_delimiter(chars[i]) {
            return Some(i + 1);
        }
    }
    None
}
