//! Language front-end seam
//!
//! The full parsing stack (sentence splitting, tagging, constituency parsing)
//! lives outside this crate. The dialogue engine only needs word groups with
//! token positions, obtained through [`WordGroupExtractor`].

pub mod normalize;
pub mod word_groups;

use cube_types::WordGroup;
use std::collections::BTreeSet;

pub use word_groups::{NgramConfig, NgramWordGroups};

/// Produces the word groups of one sentence
pub trait WordGroupExtractor: Send + Sync {
    fn extract(&self, lang: &str, sentence: &str) -> BTreeSet<WordGroup>;
}
