pub mod builtin;

pub use builtin::{AlwaysCorrect, DecodeOnly, FavorTeam};

use crate::types::StrategyInput;

/// Decides whether an agent commits the correct answer at a decision point.
///
/// Implementations must be pure: the same input always yields the same answer.
pub trait Strategy: Send + Sync {
    fn commit_correct(&self, input: &StrategyInput) -> bool;
}

impl<F> Strategy for F
where
    F: Fn(&StrategyInput) -> bool + Send + Sync,
{
    fn commit_correct(&self, input: &StrategyInput) -> bool {
        self(input)
    }
}
