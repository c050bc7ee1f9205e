//! Word group extraction from user sentences
//!
//! Scans contiguous token n-grams and keeps those that could name a schema
//! element. Groups that start or end with a function word ("the", "per", ...)
//! are skipped; such words may still appear inside a group.

use super::normalize::tokenize_with_positions;
use super::WordGroupExtractor;
use cube_types::WordGroup;
use std::collections::BTreeSet;

const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "as", "at", "by", "for", "from", "give", "in", "is", "me", "of", "on",
    "or", "per", "please", "show", "than", "the", "to", "want", "what", "with",
];

/// Configuration for n-gram extraction
#[derive(Debug, Clone)]
pub struct NgramConfig {
    /// Maximum n-gram size to consider
    pub max_ngram: usize,
}

impl Default for NgramConfig {
    fn default() -> Self {
        Self { max_ngram: 3 }
    }
}

/// Extracts overlapping n-gram word groups
#[derive(Debug, Clone, Default)]
pub struct NgramWordGroups {
    config: NgramConfig,
}

impl NgramWordGroups {
    pub fn new(config: NgramConfig) -> Self {
        Self { config }
    }
}

fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(&token)
}

impl WordGroupExtractor for NgramWordGroups {
    fn extract(&self, _lang: &str, sentence: &str) -> BTreeSet<WordGroup> {
        let words = tokenize_with_positions(sentence);
        let mut groups = BTreeSet::new();

        for start_idx in 0..words.len() {
            if is_stop_word(&words[start_idx].text) {
                continue;
            }
            let max_len = self.config.max_ngram.min(words.len() - start_idx);
            for ngram_len in 1..=max_len {
                let end_idx = start_idx + ngram_len - 1;
                if is_stop_word(&words[end_idx].text) {
                    continue;
                }

                let text = words[start_idx..=end_idx]
                    .iter()
                    .map(|t| t.text.as_str())
                    .collect::<Vec<_>>()
                    .join(" ");

                groups.insert(
                    WordGroup::with_indices(text, start_idx..=end_idx)
                        .from_expression(sentence.trim()),
                );
            }
        }

        tracing::debug!(sentence, groups = groups.len(), "Extracted word groups");
        groups
    }
}
