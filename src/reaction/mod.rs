//! Reaction engine: applies a placement and resolves the resulting
//! cascade to quiescence, reporting every change to observers.

mod engine;
mod event;

pub use engine::{ReactionEngine, ReactionSummary};
pub use event::{EventLog, Move, ReactionEvent, ReactionObserver};
