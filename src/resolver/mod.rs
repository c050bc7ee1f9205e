//! Intent and operation resolution
//!
//! ```text
//!   situation + catalog ──▶ display agenda ──▶ [Operation]
//!   input + [Operation] ──▶ OperationResolver ──▶ Event (+ remainder)
//!   Event + situation   ──▶ value_lists ──▶ ValueResolver ──▶ ValueSelection
//!   ValueSelection      ──▶ changes_for ──▶ ValueSetter
//! ```

pub mod catalog;
pub mod confidence;
pub mod events;
pub mod numbering;
pub mod operations;
pub mod text_similarity;
pub mod values;

pub use catalog::{CubeCatalog, DimensionEntry, PredicateEntry};
pub use confidence::{best_per_value, rank, ConfidenceResult};
pub use events::Event;
pub use numbering::ListSide;
pub use operations::{possible_operations, Operation, OperationResolution, OperationResolver};
pub use values::{changes_for, value_lists, ValueChoice, ValueLists, ValueResolver, ValueSelection};
