//! Stateful dialogue on top of the resolver and the disambiguation engine
//!
//! Sessions are values kept in a [`SessionStore`]; the [`DialogueEngine`]
//! turns a session and one input into the next session and the displays
//! for the user.

pub mod display;
pub mod engine;
pub mod session;
pub mod state;

pub use display::{Display, DisplayItem};
pub use engine::{DialogueEngine, Turn};
pub use session::{DialogueSession, SessionStore};
pub use state::DialogueState;
