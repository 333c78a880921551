//! Core data types flowing through the analysis pipeline.
//!
//! A [`Term`] is a single segmented unit as produced by a segmenter, carrying
//! a chunk-relative character offset until the segment stream rewrites it to
//! a global one. A [`Token`] is the post-filter record handed to the caller,
//! with final offsets and a position increment.

use serde::{Deserialize, Serialize};

/// Part-of-speech / entity-class label attached to a segmented term.
///
/// The inventory follows the usual Chinese tag set: single letters for the
/// broad classes, two-letter refinements for the common subclasses. `W` is
/// punctuation, `Nx` is a foreign-language word (the only class eligible for
/// Porter stemming), `X` is the catch-all for strings no recognizer claimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Nature {
    /// Noun
    N,
    /// Person name
    Nr,
    /// Place name
    Ns,
    /// Organization name
    Nt,
    /// Other proper noun
    Nz,
    /// Foreign-language word
    Nx,
    /// Verb
    V,
    /// Gerund
    Vn,
    /// Adjective
    A,
    /// Adverbial adjective
    Ad,
    /// Adverb
    D,
    /// Numeral
    M,
    /// Numeral-quantifier compound
    Mq,
    /// Quantifier
    Q,
    /// Time word
    T,
    /// Pronoun
    R,
    /// Preposition
    P,
    /// Conjunction
    C,
    /// Auxiliary
    U,
    /// Exclamation
    E,
    /// Modal particle
    Y,
    /// Onomatopoeia
    O,
    /// Idiom
    I,
    /// Fixed phrase
    L,
    /// Punctuation
    W,
    /// Unclassified string
    X,
}

impl Nature {
    /// Canonical lowercase tag string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Nature::N => "n",
            Nature::Nr => "nr",
            Nature::Ns => "ns",
            Nature::Nt => "nt",
            Nature::Nz => "nz",
            Nature::Nx => "nx",
            Nature::V => "v",
            Nature::Vn => "vn",
            Nature::A => "a",
            Nature::Ad => "ad",
            Nature::D => "d",
            Nature::M => "m",
            Nature::Mq => "mq",
            Nature::Q => "q",
            Nature::T => "t",
            Nature::R => "r",
            Nature::P => "p",
            Nature::C => "c",
            Nature::U => "u",
            Nature::E => "e",
            Nature::Y => "y",
            Nature::O => "o",
            Nature::I => "i",
            Nature::L => "l",
            Nature::W => "w",
            Nature::X => "x",
        }
    }

    /// Parse a tag string. Unknown tags are `None`; callers that need a
    /// total mapping fall back to [`Nature::X`].
    pub fn parse(s: &str) -> Option<Nature> {
        let tag = match s {
            "n" => Nature::N,
            "nr" => Nature::Nr,
            "ns" => Nature::Ns,
            "nt" => Nature::Nt,
            "nz" => Nature::Nz,
            "nx" => Nature::Nx,
            "v" => Nature::V,
            "vn" => Nature::Vn,
            "a" => Nature::A,
            "ad" => Nature::Ad,
            "d" => Nature::D,
            "m" => Nature::M,
            "mq" => Nature::Mq,
            "q" => Nature::Q,
            "t" => Nature::T,
            "r" => Nature::R,
            "p" => Nature::P,
            "c" => Nature::C,
            "u" => Nature::U,
            "e" => Nature::E,
            "y" => Nature::Y,
            "o" => Nature::O,
            "i" => Nature::I,
            "l" => Nature::L,
            "w" => Nature::W,
            "x" => Nature::X,
            _ => return None,
        };
        Some(tag)
    }

    /// Punctuation-class check used by the stop-word filter: any tag whose
    /// string form starts with `w`.
    pub fn is_punctuation(&self) -> bool {
        self.as_str().starts_with('w')
    }
}

impl std::fmt::Display for Nature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single segmented unit of text before filtering.
///
/// `offset` is the character offset of the word within the slice that was
/// segmented; the segment stream rewrites it to a global offset before the
/// term leaves the stream. This is the one field that is mutated after
/// construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    pub word: String,
    pub nature: Option<Nature>,
    pub offset: usize,
}

impl Term {
    pub fn new<S: Into<String>>(word: S, nature: Option<Nature>, offset: usize) -> Self {
        Self {
            word: word.into(),
            nature,
            offset,
        }
    }

    /// Length of the word in characters, the unit all offsets are counted in.
    pub fn len(&self) -> usize {
        self.word.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.word.is_empty()
    }

    /// Whether the word is empty or all-whitespace. Blank terms are skipped
    /// by the token pipeline without affecting positions.
    pub fn is_blank(&self) -> bool {
        self.word.chars().all(char::is_whitespace)
    }
}

/// Sentinel type string for tokens whose term carried no nature.
pub const NULL_TYPE: &str = "null";

/// A post-filter token exposed to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    /// Tag string of the term's nature, or `"null"` when the segmenter
    /// produced none.
    pub token_type: String,
    /// Global start offset, in characters.
    pub start_offset: usize,
    /// Global end offset (exclusive), in characters.
    pub end_offset: usize,
    /// Number of position slots this token advances past the previous
    /// emitted token.
    pub position_increment: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nature_string_round_trip() {
        for nature in [Nature::N, Nature::Nx, Nature::Mq, Nature::W, Nature::X] {
            assert_eq!(Nature::parse(nature.as_str()), Some(nature));
        }
        assert_eq!(Nature::parse("zzz"), None);
    }

    #[test]
    fn punctuation_check() {
        assert!(Nature::W.is_punctuation());
        assert!(!Nature::N.is_punctuation());
        assert!(!Nature::Vn.is_punctuation());
    }

    #[test]
    fn term_length_counts_chars() {
        let term = Term::new("中国", Some(Nature::Ns), 0);
        assert_eq!(term.len(), 2);
        assert!(!term.is_blank());
    }

    #[test]
    fn blank_detection() {
        assert!(Term::new("", None, 0).is_blank());
        assert!(Term::new("  \t", None, 0).is_blank());
        assert!(Term::new("　", None, 0).is_blank()); // ideographic space
        assert!(!Term::new("a", None, 0).is_blank());
    }
}
