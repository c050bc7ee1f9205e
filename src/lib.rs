//! Cube Dialogue - natural-language OLAP query building
//!
//! A user describes an analysis in free text; the engine matches the text
//! against the cube schema, disambiguates the matches into one consistent
//! analysis situation and then guides the user through navigation
//! operations until the query can be executed.
//!
//! ## Pipeline
//!
//! ```text
//! input ─▶ nlp (word groups) ─▶ schema (similarities) ─▶ csp (solver)
//!                                                          │
//!            dialogue ◀── resolver (operations, values) ◀──┘ analysis (situation)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cube_dialogue::{DialogueConfig, DialogueEngine, DialogueSession, InMemorySchema};
//!
//! let schema = InMemorySchema::load("demos/claims.yaml").unwrap();
//! let engine = DialogueEngine::in_memory(schema, DialogueConfig::default());
//! let turn = engine
//!     .handle_input(&DialogueSession::new(), "total costs per doctor district")
//!     .unwrap();
//! println!("{}", turn.event);
//! ```

// Core error handling
pub mod error;

// YAML configuration
pub mod config;

// Analysis situation model and value setters
pub mod analysis;

// Candidate bundles, constraints and the solver
pub mod csp;

// Language front-end seam
pub mod nlp;

// Schema lookup seam and the in-memory schema
pub mod schema;

// Ordered rule agendas
pub mod rules;

// Operation and value resolution
pub mod resolver;

// Sessions, states and the turn engine
pub mod dialogue;

pub use analysis::{
    AnalysisSituation, ComparativeAnalysisSituation, DimensionQualification, EngineSituation,
    ValueChange, ValueSetter,
};
pub use config::{DialogueConfig, ResolverSettings, SolverSettings};
pub use csp::{DisambiguationService, FillOutcome, SolveOutcome, Solver, SolverProblem};
pub use dialogue::{DialogueEngine, DialogueSession, DialogueState, Display, SessionStore, Turn};
pub use error::{ConfigError, DialogueError, QueryError, Result};
pub use resolver::{ConfidenceResult, Event, Operation, OperationResolver, ValueResolver};
pub use schema::{InMemorySchema, SchemaLookup, SimilaritySource};

pub use cube_types::{CubeSimilarity, ElementType, PatternPart, SimilarityKind, WordGroup};
