//! Text normalization for term matching
//!
//! - Unicode NFKC normalization
//! - Lowercase conversion
//! - Punctuation stripping (digits are kept)
//! - Whitespace collapsing

use smallvec::SmallVec;
use unicode_normalization::UnicodeNormalization;

/// A token with its byte span in the original text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub start: usize,
    pub end: usize,
    /// Lowercased token text
    pub text: String,
}

/// Token buffer sized for typical single-sentence input
pub type Tokens = SmallVec<[Token; 16]>;

/// Normalize text for similarity comparison.
///
/// ```
/// use cube_dialogue::nlp::normalize::normalize_text;
///
/// assert_eq!(normalize_text("  Total-Costs, per District "), "total costs per district");
/// assert_eq!(normalize_text("ﬁrst Option"), "first option");
/// ```
pub fn normalize_text(s: &str) -> String {
    let folded: String = s.nfkc().collect();

    let stripped: String = folded
        .chars()
        .flat_map(|c| {
            if c.is_alphanumeric() {
                c.to_lowercase().collect::<SmallVec<[char; 2]>>()
            } else {
                SmallVec::from_slice(&[' '])
            }
        })
        .collect();

    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Tokenize with byte positions in `s`.
///
/// Positions refer to the text as given, so callers can cut the original
/// surface form out of the sentence.
pub fn tokenize_with_positions(s: &str) -> Tokens {
    let mut result = Tokens::new();
    let mut in_word = false;
    let mut word_start = 0;

    for (i, c) in s.char_indices() {
        if c.is_alphanumeric() {
            if !in_word {
                word_start = i;
                in_word = true;
            }
        } else if in_word {
            result.push(Token {
                start: word_start,
                end: i,
                text: normalize_text(&s[word_start..i]),
            });
            in_word = false;
        }
    }

    if in_word {
        result.push(Token {
            start: word_start,
            end: s.len(),
            text: normalize_text(&s[word_start..]),
        });
    }

    result
}
