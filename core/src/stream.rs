//! The segment stream: sentence buffering, per-chunk segmentation and
//! reconciliation of chunk-relative offsets onto one global offset stream.
//!
//! Each slice pulled from the sentence buffer is (optionally) normalized,
//! segmented, and its terms' offsets shifted by the characters already
//! consumed. The running offset advances by the whole slice length, not the
//! sum of term lengths, so gaps between terms never desynchronize it.

use crate::buffer::SentenceBuffer;
use crate::segmenter::Segmenter;
use crate::term::Term;
use crate::utils;
use std::collections::VecDeque;
use std::io::Read;
use std::sync::Arc;

/// Streaming term source with globally reconciled offsets.
pub struct SegmentStream<R> {
    buffer: SentenceBuffer<R>,
    segmenter: Arc<dyn Segmenter>,
    normalize: bool,
    pending: VecDeque<Term>,
    /// Characters consumed from the input so far; the base every emitted
    /// term's offset was rewritten against.
    offset: usize,
}

impl<R: Read> SegmentStream<R> {
    pub fn new(reader: R, segmenter: Arc<dyn Segmenter>, normalize: bool) -> Self {
        Self {
            buffer: SentenceBuffer::new(reader),
            segmenter,
            normalize,
            pending: VecDeque::new(),
            offset: 0,
        }
    }

    /// Total input characters consumed. After the stream is exhausted this
    /// equals the input length.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Next term with its global offset, or `None` once the input is done.
    ///
    /// Slices that segment to nothing still advance the offset and the
    /// stream moves on to the next slice.
    pub fn next_term(&mut self) -> std::io::Result<Option<Term>> {
        loop {
            if let Some(term) = self.pending.pop_front() {
                return Ok(Some(term));
            }
            let slice = match self.buffer.fill()? {
                Some(slice) => slice,
                None => return Ok(None),
            };
            let text = if self.normalize {
                // Char-count preserving, so slice-relative offsets hold.
                utils::normalize_text(&slice)
            } else {
                slice
            };
            let slice_chars = text.chars().count();
            let mut terms = self.segmenter.segment(&text);
            for term in &mut terms {
                term.offset += self.offset;
            }
            self.offset += slice_chars;
            self.pending.extend(terms);
        }
    }

    /// Start over on a new reader, e.g. for the next value of a multi-value
    /// field.
    pub fn reset(&mut self, reader: R) {
        self.buffer = SentenceBuffer::new(reader);
        self.pending.clear();
        self.offset = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dict::DictionaryStore;
    use crate::segmenter::{DictSegmenter, SegmenterConfig};
    use crate::term::Nature;
    use std::io::Cursor;

    fn stream_for(text: &str, normalize: bool) -> SegmentStream<Cursor<Vec<u8>>> {
        let dict = Arc::new(DictionaryStore::new());
        dict.upsert("中国", Nature::Ns, 100);
        dict.upsert("人民", Nature::N, 90);
        let segmenter = Arc::new(DictSegmenter::new(dict, SegmenterConfig::default()));
        SegmentStream::new(Cursor::new(text.as_bytes().to_vec()), segmenter, normalize)
    }

    fn drain(stream: &mut SegmentStream<Cursor<Vec<u8>>>) -> Vec<Term> {
        let mut out = Vec::new();
        while let Some(term) = stream.next_term().expect("read") {
            out.push(term);
        }
        out
    }

    #[test]
    fn offsets_are_global_across_slices() {
        // Two sentences, so two separately segmented slices.
        let text = "中国人民。中国人民";
        let mut stream = stream_for(text, false);
        let terms = drain(&mut stream);
        let offsets: Vec<usize> = terms.iter().map(|t| t.offset).collect();
        assert_eq!(offsets, vec![0, 2, 4, 5, 7]);
        assert_eq!(stream.offset(), text.chars().count());
    }

    #[test]
    fn offsets_never_decrease() {
        let mut stream = stream_for("中国abc。人民123！中国", false);
        let terms = drain(&mut stream);
        let mut last = 0;
        for term in &terms {
            assert!(term.offset >= last);
            last = term.offset;
        }
    }

    #[test]
    fn final_offset_equals_input_length() {
        let text = "第一句。第二句！第三句没有结尾";
        let mut stream = stream_for(text, false);
        drain(&mut stream);
        assert_eq!(stream.offset(), text.chars().count());
    }

    #[test]
    fn normalization_folds_width_before_segmentation() {
        let mut stream = stream_for("ＡＢＣ中国", true);
        let terms = drain(&mut stream);
        assert_eq!(terms[0].word, "abc");
        assert_eq!(terms[1].word, "中国");
        assert_eq!(terms[1].offset, 3);
    }

    #[test]
    fn reset_restarts_offsets() {
        let mut stream = stream_for("中国。", false);
        drain(&mut stream);
        assert!(stream.offset() > 0);
        stream.reset(Cursor::new("人民".as_bytes().to_vec()));
        let terms = drain(&mut stream);
        assert_eq!(terms[0].offset, 0);
        assert_eq!(stream.offset(), 2);
    }

    #[test]
    fn empty_input_is_immediately_exhausted() {
        let mut stream = stream_for("", false);
        assert!(stream.next_term().expect("read").is_none());
        assert_eq!(stream.offset(), 0);
    }
}
