use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::types::{AgentIndex, GameResult, HOST_AGENT};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentPhase {
    JoiningLobby,
    SettingNickname,
    JoiningTeam,
    /// Host only: waiting for the start control to become usable.
    StartingGame,
    PlayingRound,
    Finished(GameResult),
    Failed,
}

impl AgentPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AgentPhase::Finished(_) | AgentPhase::Failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhaseEvent {
    LobbyJoined,
    NicknameSet,
    TeamResolved,
    RoundObserved,
    GameEnded(GameResult),
    Failed,
}

/// Milestones an agent has seen the UI confirm.
///
/// Steps are retried every poll and may complete in any order, so the phase is
/// derived from what has been confirmed rather than stepped along a fixed
/// path.
#[derive(Debug, Clone)]
pub struct AgentProgress {
    index: AgentIndex,
    lobby_joined: bool,
    nickname_set: bool,
    team_resolved: bool,
    round_observed: bool,
    terminal: Option<AgentPhase>,
}

impl AgentProgress {
    pub fn new(index: AgentIndex) -> Self {
        Self {
            index,
            lobby_joined: false,
            nickname_set: false,
            team_resolved: false,
            round_observed: false,
            terminal: None,
        }
    }

    /// Apply `event` and return the phase it leaves the agent in.
    pub fn record(&mut self, event: PhaseEvent) -> Result<AgentPhase> {
        if let Some(terminal) = self.terminal {
            return Err(anyhow!(
                "agent {} is already {:?}, cannot apply {:?}",
                self.index, terminal, event
            ));
        }

        match event {
            PhaseEvent::LobbyJoined => self.lobby_joined = true,
            PhaseEvent::NicknameSet => self.nickname_set = true,
            PhaseEvent::TeamResolved => self.team_resolved = true,
            PhaseEvent::RoundObserved => self.round_observed = true,
            PhaseEvent::GameEnded(result) => self.terminal = Some(AgentPhase::Finished(result)),
            PhaseEvent::Failed => self.terminal = Some(AgentPhase::Failed),
        }

        Ok(self.phase())
    }

    pub fn phase(&self) -> AgentPhase {
        if let Some(terminal) = self.terminal {
            return terminal;
        }
        if self.round_observed {
            return AgentPhase::PlayingRound;
        }
        if !self.lobby_joined {
            AgentPhase::JoiningLobby
        } else if !self.nickname_set {
            AgentPhase::SettingNickname
        } else if !self.team_resolved {
            AgentPhase::JoiningTeam
        } else if self.index == HOST_AGENT {
            AgentPhase::StartingGame
        } else {
            AgentPhase::JoiningTeam
        }
    }
}
