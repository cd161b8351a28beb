//! The counting game.
//!
//! A multi-user counting ritual in one shared chat: each accepted message must
//! carry exactly the next number and come from a different author than the
//! previous one. Violations reset the count to zero and escalate the violator
//! through a strike-then-ban ladder.

pub mod dedup;
pub mod escalate;
pub mod game;
pub mod store;
pub mod validate;

pub use dedup::DuplicateGuard;
pub use escalate::{Escalation, EscalationPolicy};
pub use game::CountingGame;
pub use store::CounterStore;
pub use validate::validate;
