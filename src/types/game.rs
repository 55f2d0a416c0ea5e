use serde::{Deserialize, Serialize};
use std::fmt;

use super::AgentIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    White,
    Black,
}

impl Team {
    pub const ORDER: [Team; 2] = [Team::White, Team::Black];

    pub fn index(self) -> usize {
        match self {
            Team::White => 0,
            Team::Black => 1,
        }
    }

    pub fn from_index(index: usize) -> Option<Team> {
        match index {
            0 => Some(Team::White),
            1 => Some(Team::Black),
            _ => None,
        }
    }

    /// Even agents ask for the first team, odd agents for the second.
    pub fn preferred_for(agent: AgentIndex) -> Team {
        if agent % 2 == 0 {
            Team::White
        } else {
            Team::Black
        }
    }

    pub fn other(self) -> Team {
        match self {
            Team::White => Team::Black,
            Team::Black => Team::White,
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "team:{}", self.index())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Situation {
    GiveClues,
    DecodeGuess,
    Intercept,
    Tiebreak,
    Waiting,
    GameOver,
}

impl Situation {
    pub fn as_str(&self) -> &str {
        match self {
            Situation::GiveClues => "give_clues",
            Situation::DecodeGuess => "decode_guess",
            Situation::Intercept => "intercept",
            Situation::Tiebreak => "tiebreak",
            Situation::Waiting => "waiting",
            Situation::GameOver => "game_over",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameResult {
    Win,
    Loss,
    Draw,
}

impl GameResult {
    pub fn as_str(&self) -> &str {
        match self {
            GameResult::Win => "win",
            GameResult::Loss => "loss",
            GameResult::Draw => "draw",
        }
    }

    pub fn is_draw(&self) -> bool {
        *self == GameResult::Draw
    }
}
