//! Analysis-situation disambiguation
//!
//! Turns a noisy set of term→element similarities into one consistent
//! interpretation.
//!
//! ```text
//! ┌──────────────┐  per field   ┌──────────────┐  candidates  ┌──────────┐
//! │ similarities │ ───────────▶ │ combinations │ ───────────▶ │  solver  │
//! └──────────────┘              └──────────────┘              └────┬─────┘
//!                                                                  │ constraints
//!                                                                  ▼
//!                                                     ┌──────────────────────┐
//!                                                     │ DisambiguationService│
//!                                                     │  fill → situation    │
//!                                                     └──────────────────────┘
//! ```

pub mod assignment;
pub mod combinations;
pub mod constraints;
pub mod element;
pub mod service;
pub mod solver;

pub use assignment::{Field, SituationAssignment, SCORE_SCALE};
pub use combinations::generate_combinations;
pub use constraints::{violations, Violation};
pub use element::AnalysisSituationElement;
pub use service::{DisambiguationService, FillOutcome};
pub use solver::{evaluate, SolutionScore, SolveOutcome, Solver, SolverProblem};
