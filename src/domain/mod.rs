pub mod types;

pub use types::{Email, Match, RunOutcome};
