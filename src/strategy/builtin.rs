use super::Strategy;
use crate::types::{Situation, StrategyInput, Team};

/// Every agent answers correctly. Both teams intercept equally, so the game
/// ends level and the tiebreaker decides nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysCorrect;

impl Strategy for AlwaysCorrect {
    fn commit_correct(&self, _input: &StrategyInput) -> bool {
        true
    }
}

/// Correct on the agent's own clues, never on interceptions.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeOnly;

impl Strategy for DecodeOnly {
    fn commit_correct(&self, input: &StrategyInput) -> bool {
        input.situation == Situation::DecodeGuess
    }
}

/// Only the given team ever answers correctly.
#[derive(Debug, Clone, Copy)]
pub struct FavorTeam(pub Team);

impl Strategy for FavorTeam {
    fn commit_correct(&self, input: &StrategyInput) -> bool {
        input.team == self.0
    }
}
