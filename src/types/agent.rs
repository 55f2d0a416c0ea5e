use serde::{Deserialize, Serialize};

use super::{AgentIndex, GameResult, Situation, Team};
use crate::error::HarnessError;

/// What a strategy sees at a decision point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyInput {
    pub player_index: AgentIndex,
    pub team: Team,
    pub round_index: usize,
    pub situation: Situation,
}

impl StrategyInput {
    pub fn new(
        player_index: AgentIndex,
        team: Team,
        round_index: usize,
        situation: Situation,
    ) -> Self {
        Self {
            player_index,
            team,
            round_index,
            situation,
        }
    }

    pub fn with_situation(&self, situation: Situation) -> Self {
        Self { situation, ..*self }
    }
}

/// How an agent task ended.
#[derive(Debug, Clone)]
pub enum AgentOutcome {
    Finished(GameResult),
    /// Observed the shared stop request before reaching a result.
    Stopped,
    Failed(HarnessError),
}

impl AgentOutcome {
    pub fn result(&self) -> Option<GameResult> {
        match self {
            AgentOutcome::Finished(result) => Some(*result),
            _ => None,
        }
    }
}
