//! Analysis situation state
//!
//! The query model a session builds up turn by turn: cube, measures,
//! dimension qualifications and conditions. Values are owned by the session
//! and replaced as a whole after each completed turn.

pub mod comparative;
pub mod qualification;
pub mod setter;
pub mod situation;

pub use comparative::{ComparativeAnalysisSituation, EngineSituation};
pub use qualification::{DimensionQualification, ALL_NODES, TOP_LEVEL};
pub use setter::{ValueChange, ValueSetter};
pub use situation::AnalysisSituation;
