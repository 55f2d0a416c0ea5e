//! What the game's pages look like to the driver: the selectors it queries
//! and the pure parsing of the text it reads back.

use anyhow::{anyhow, Result};

use crate::types::{GameResult, Situation, Team};

pub mod selectors {
    pub const NICKNAME_INPUT: &str = "nickname-input input";
    pub const CREATE_LOBBY: &str = "input#create-lobby";
    pub const INVITE_LINK: &str = "a#invite-link";
    pub const PLAYER: &str = "semantic-player";
    pub const PLAYER_TEAM: &str = "semantic-team";
    pub const PLAYER_NICK: &str = "semantic-nick";
    pub const START_GAME: &str = "input#start-game";
    pub const LAST_ROUND_NUMBER: &str = ".history tr:last-child td:first-child";
    pub const INPUT_ACTION: &str = "div.input-action";
    pub const HEADER: &str = "h1";
    pub const CLUE_ROW: &str = "tr";
    pub const CLUE_TARGET: &str = "td:nth-child(1)";
    pub const CLUE_INPUT: &str = "td:nth-child(3) input[type=text]";
    pub const SUBMIT_CLUES: &str = "#submit-clues";
    pub const CLUE_TOKEN: &str = ".semantic-clue-text";
    pub const TEXT_INPUT: &str = "input[type=text]";

    pub const TEAM_MARKER_ATTR: &str = "x-hl";
    pub const HREF_ATTR: &str = "href";
    pub const VALUE_ATTR: &str = "value";
    pub const DISABLED_ATTR: &str = "disabled";
}

/// Typed into every tiebreaker field; never expected to be right.
pub const TIEBREAK_FALLBACK: &str = "I guess, nope";

const CLUE_TAG_PREFIX: &str = "kw=";
const CLUE_VALUE_DELIMITER: char = '=';
const ANSWER_JOINER: &str = "-";

pub fn join_team_selector(team: Team) -> String {
    format!("#join-team-{}", team.index() + 1)
}

/// Map a panel header to the decision point it presents.
///
/// Matching is by substring, in a fixed order: the tiebreaker's own waiting
/// screen mentions both "waiting for" and "tiebreaker" and must count as
/// waiting.
pub fn classify_header(header: &str) -> Option<Situation> {
    let lowered = header.to_lowercase();
    let table = [
        ("give clues", Situation::GiveClues),
        ("decipher your clues", Situation::DecodeGuess),
        ("attempt interception", Situation::Intercept),
        ("waiting for", Situation::Waiting),
        ("tiebreaker", Situation::Tiebreak),
        ("game over", Situation::GameOver),
    ];
    table
        .into_iter()
        .find(|(needle, _)| lowered.contains(needle))
        .map(|(_, situation)| situation)
}

pub fn parse_outcome(header: &str) -> Option<GameResult> {
    let lowered = header.to_lowercase();
    if lowered.contains("win") || lowered.contains("won") {
        Some(GameResult::Win)
    } else if lowered.contains("lose") || lowered.contains("lost") {
        Some(GameResult::Loss)
    } else if lowered.contains("draw") {
        Some(GameResult::Draw)
    } else {
        None
    }
}

/// The history shows one-based round numbers.
pub fn parse_round_index(cell: &str) -> Option<usize> {
    cell.trim().parse::<usize>().ok()?.checked_sub(1)
}

/// Decode the `team:<n>` marker on a lobby member. `Ok(None)` means unassigned.
pub fn parse_team_marker(marker: &str) -> Result<Option<Team>> {
    let id = marker
        .split(':')
        .nth(1)
        .ok_or_else(|| anyhow!("malformed team marker {:?}", marker))?;
    if id == "null" {
        return Ok(None);
    }
    id.parse::<usize>()
        .ok()
        .and_then(Team::from_index)
        .map(Some)
        .ok_or_else(|| anyhow!("unknown team id {:?}", id))
}

/// Clue text for a row whose target label is e.g. `3.`.
pub fn clue_tag(target_label: &str) -> String {
    let mut target = target_label.trim().to_string();
    target.pop();
    format!("{}{}", CLUE_TAG_PREFIX, target)
}

/// The value component of a rendered clue token (`kw=3` -> `3`).
pub fn clue_value(token: &str) -> Option<&str> {
    token.split(CLUE_VALUE_DELIMITER).nth(1)
}

/// Rebuild the code the clues point to, e.g. `3-1-2`.
pub fn correct_answer<'a>(tokens: impl IntoIterator<Item = &'a str>) -> Result<String> {
    let values = tokens
        .into_iter()
        .map(|token| {
            clue_value(token).ok_or_else(|| anyhow!("clue token {:?} has no value", token))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(values.join(ANSWER_JOINER))
}

pub fn wrong_answer(correct: &str) -> String {
    correct.chars().rev().collect()
}

/// Replace the server's own address in a client error with a stable prefix.
pub fn sanitize_fault(message: &str, server_address: &str) -> String {
    message.replace(&format!("http://{}/", server_address), "static/")
}
