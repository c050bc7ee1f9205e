//! Schema lookup seam
//!
//! The triple store holding cube schemas and labels is an external
//! collaborator. The dialogue engine reaches it only through the traits in
//! this module, which keeps the core testable with [`InMemorySchema`] and
//! lets a failing backend be simulated with [`UnavailableSchema`].
//!
//! ```text
//! ┌──────────────────┐   labels / levels    ┌──────────────────────┐
//! │  DialogueEngine  │ ───────────────────▶ │ dyn SchemaLookup     │
//! │  set_cube, ...   │                      │  InMemorySchema      │
//! └──────────────────┘   word similarity    │  (or remote store)   │
//!          │         ───────────────────▶   │ dyn SimilaritySource │
//!          ▼                                └──────────────────────┘
//!   DisambiguationService
//! ```

pub mod memory;

use crate::error::QueryError;
use cube_types::{CubeSimilarity, DimensionLabel, ElementType, Label, PredicateLevel};
use std::collections::HashMap;

pub use memory::InMemorySchema;

/// Label and structure queries against the cube schema.
///
/// All operations are blocking and either return a result or a
/// [`QueryError`]. Implementations must be safe to share between sessions.
pub trait SchemaLookup: Send + Sync {
    /// Labels of the given element IRIs; unknown IRIs are omitted
    fn labels_by_lang_and_uris(
        &self,
        lang: &str,
        uris: &[String],
    ) -> Result<HashMap<String, Label>, QueryError>;

    /// Coarsest level of every dimension of a cube
    fn top_level_labels_by_lang_and_cube(
        &self,
        lang: &str,
        cube: &str,
    ) -> Result<Vec<DimensionLabel>, QueryError>;

    /// Dimension and level a predicate restricts (one entry per comparison side for join predicates)
    fn level_and_dimension_for_predicate(
        &self,
        predicate: &str,
    ) -> Result<Vec<PredicateLevel>, QueryError>;

    fn cube_labels(&self, lang: &str) -> Result<Vec<Label>, QueryError>;

    /// Labels of all elements of one type in a cube
    fn labels_by_lang_and_cube(
        &self,
        lang: &str,
        cube: &str,
        element_type: ElementType,
    ) -> Result<Vec<Label>, QueryError>;

    /// Levels of one dimension, coarsest first
    fn level_labels_by_lang_and_dimension(
        &self,
        lang: &str,
        cube: &str,
        dimension: &str,
    ) -> Result<Vec<DimensionLabel>, QueryError>;

    /// Members (dice nodes) of a level
    fn member_labels_by_lang_and_level(
        &self,
        lang: &str,
        cube: &str,
        level: &str,
    ) -> Result<Vec<Label>, QueryError>;
}

/// Scored schema candidates for a natural-language fragment
pub trait SimilaritySource: Send + Sync {
    /// Candidates for `text`, optionally restricted to one cube
    fn word_similarity(
        &self,
        lang: &str,
        text: &str,
        cube: Option<&str>,
    ) -> Result<Vec<CubeSimilarity>, QueryError>;
}

/// Schema backend that is not reachable. Every call fails.
#[derive(Debug, Clone, Default)]
pub struct UnavailableSchema;

impl UnavailableSchema {
    fn fail<T>(&self, what: &str) -> Result<T, QueryError> {
        Err(QueryError::new(format!("schema store unavailable ({what})")))
    }
}

impl SchemaLookup for UnavailableSchema {
    fn labels_by_lang_and_uris(
        &self,
        _lang: &str,
        _uris: &[String],
    ) -> Result<HashMap<String, Label>, QueryError> {
        self.fail("labels")
    }

    fn top_level_labels_by_lang_and_cube(
        &self,
        _lang: &str,
        _cube: &str,
    ) -> Result<Vec<DimensionLabel>, QueryError> {
        self.fail("top levels")
    }

    fn level_and_dimension_for_predicate(
        &self,
        _predicate: &str,
    ) -> Result<Vec<PredicateLevel>, QueryError> {
        self.fail("predicate levels")
    }

    fn cube_labels(&self, _lang: &str) -> Result<Vec<Label>, QueryError> {
        self.fail("cubes")
    }

    fn labels_by_lang_and_cube(
        &self,
        _lang: &str,
        _cube: &str,
        _element_type: ElementType,
    ) -> Result<Vec<Label>, QueryError> {
        self.fail("cube elements")
    }

    fn level_labels_by_lang_and_dimension(
        &self,
        _lang: &str,
        _cube: &str,
        _dimension: &str,
    ) -> Result<Vec<DimensionLabel>, QueryError> {
        self.fail("levels")
    }

    fn member_labels_by_lang_and_level(
        &self,
        _lang: &str,
        _cube: &str,
        _level: &str,
    ) -> Result<Vec<Label>, QueryError> {
        self.fail("level members")
    }
}

impl SimilaritySource for UnavailableSchema {
    fn word_similarity(
        &self,
        _lang: &str,
        _text: &str,
        _cube: Option<&str>,
    ) -> Result<Vec<CubeSimilarity>, QueryError> {
        self.fail("similarity")
    }
}
