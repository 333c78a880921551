//! The token filter pipeline.
//!
//! Pulls reconciled terms from a [`SegmentStream`] and turns them into the
//! final token stream: blank terms are skipped without costing a position,
//! foreign-word terms are optionally Porter-stemmed, stop words and
//! punctuation are optionally suppressed, and every emitted token carries a
//! position increment covering the stop-filtered terms since the previous
//! emission. Each iteration either emits a token or strictly advances
//! consumption, so the loop terminates once input is exhausted.

use crate::dict::DictionaryStore;
use crate::segmenter::Segmenter;
use crate::stream::SegmentStream;
use crate::term::{Nature, Token, NULL_TYPE};
use crate::{Config, Result};
use rust_stemmers::{Algorithm, Stemmer};
use std::io::Read;
use std::sync::Arc;

/// Streaming tokenizer over one field of input.
pub struct Tokenizer<R> {
    stream: SegmentStream<R>,
    dict: Arc<DictionaryStore>,
    stemmer: Option<Stemmer>,
    stop_filter: bool,
    /// Characters accounted for by pulled terms plus the fold-in of the
    /// final stream offset; reported by [`end`] and cleared there.
    ///
    /// [`end`]: Tokenizer::end
    consumed: usize,
    /// Input length of previous values of this field (multi-value fields),
    /// used to clamp the end-of-field offset.
    prior_values_len: usize,
    emitted_any: bool,
}

impl<R: Read> Tokenizer<R> {
    pub fn new(
        reader: R,
        segmenter: Arc<dyn Segmenter>,
        dict: Arc<DictionaryStore>,
        config: &Config,
    ) -> Self {
        let stemmer = config
            .enable_porter_stemming
            .then(|| Stemmer::create(Algorithm::English));
        Self {
            stream: SegmentStream::new(reader, segmenter, config.enable_normalization),
            dict,
            stemmer,
            stop_filter: config.enable_stop_dictionary,
            consumed: 0,
            prior_values_len: 0,
            emitted_any: false,
        }
    }

    /// Produce the next token, or `None` once the input is exhausted.
    pub fn next_token(&mut self) -> Result<Option<Token>> {
        let mut skipped = 0u32;
        loop {
            let mut term = match self.stream.next_term()? {
                Some(term) => term,
                None => {
                    // Fold whatever the stream consumed beyond the terms'
                    // own lengths (gaps, trailing separators) into the
                    // running counter for end-of-field reporting.
                    let stream_total = self.prior_values_len + self.stream.offset();
                    self.consumed = self.consumed.max(stream_total);
                    return Ok(None);
                }
            };
            let term_len = term.len();
            if term.is_blank() {
                self.consumed += term_len;
                continue;
            }
            if let Some(stemmer) = &self.stemmer {
                if term.nature == Some(Nature::Nx) {
                    term.word = stemmer.stem(&term.word.to_lowercase()).into_owned();
                }
            }
            if self.stop_filter && self.dict.should_remove(&term) {
                self.consumed += term_len;
                skipped += 1;
                continue;
            }
            // The first emitted token of a field always has increment 1;
            // later ones absorb the count of stop-filtered terms since the
            // previous emission.
            let position_increment = if self.emitted_any { skipped + 1 } else { 1 };
            self.emitted_any = true;
            self.consumed += term_len;
            let token = Token {
                text: term.word,
                token_type: term
                    .nature
                    .map(|n| n.as_str().to_string())
                    .unwrap_or_else(|| NULL_TYPE.to_string()),
                start_offset: term.offset,
                end_offset: term.offset + term_len,
                position_increment,
            };
            return Ok(Some(token));
        }
    }

    /// End-of-field: the final offset to report, clamped so index-mode
    /// sub-word emission can never push it past the true input length. The
    /// running counters reset for the next field.
    pub fn end(&mut self) -> usize {
        let input_len = self.prior_values_len + self.stream.offset();
        let final_offset = self.consumed.min(input_len);
        self.consumed = 0;
        self.prior_values_len = 0;
        self.emitted_any = false;
        final_offset
    }

    /// Switch to the next value of a multi-value field. The consumed
    /// counter keeps accumulating until [`end`] closes the field.
    ///
    /// [`end`]: Tokenizer::end
    pub fn reset(&mut self, reader: R) {
        self.prior_values_len += self.stream.offset();
        self.stream.reset(reader);
    }

    /// Characters consumed so far across this field's values.
    pub fn consumed(&self) -> usize {
        self.consumed
    }
}
