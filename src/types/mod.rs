pub mod agent;
pub mod game;

pub use agent::{AgentOutcome, StrategyInput};
pub use game::{GameResult, Situation, Team};

pub type AgentIndex = usize;

/// The agent that creates the lobby, publishes the invite and starts the game.
pub const HOST_AGENT: AgentIndex = 0;

/// Two teams of at least two players each.
pub const MIN_AGENTS: usize = 4;

pub fn nickname_for(index: AgentIndex) -> String {
    format!("client {}", index)
}
