use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use crate::config::HarnessConfig;
use crate::engine::coordination::CoordinationState;
use crate::engine::page::{self, selectors};
use crate::error::{HarnessError, Result};
use crate::lifecycle::{AgentPhase, AgentProgress, PhaseEvent};
use crate::providers::ui::{ProbeResultExt, SessionProvider, UiElement, UiProbe};
use crate::strategy::Strategy;
use crate::types::{
    nickname_for, AgentIndex, AgentOutcome, GameResult, Situation, StrategyInput, Team,
    HOST_AGENT,
};

/// Timing and addressing for one agent.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub base_url: String,
    pub server_address: String,
    pub poll_interval: Duration,
    pub settle: Duration,
    pub initial_settle: Duration,
}

impl From<&HarnessConfig> for DriverConfig {
    fn from(config: &HarnessConfig) -> Self {
        Self {
            base_url: config.base_url(),
            server_address: config.server_address.clone(),
            poll_interval: config.poll_interval(),
            settle: config.settle(),
            initial_settle: config.initial_settle(),
        }
    }
}

/// What this agent has learned about its own seat.
#[derive(Debug, Clone, Default)]
struct TurnState {
    team: Option<Team>,
    round_index: Option<usize>,
}

/// Plays one seat of the game through its own UI session.
pub struct AgentDriver {
    index: AgentIndex,
    coordination: Arc<CoordinationState>,
    strategy: Arc<dyn Strategy>,
    config: DriverConfig,
    nickname: String,
    progress: AgentProgress,
    turn: TurnState,
}

impl AgentDriver {
    pub fn new(
        index: AgentIndex,
        coordination: Arc<CoordinationState>,
        strategy: Arc<dyn Strategy>,
        config: DriverConfig,
    ) -> Self {
        Self {
            index,
            coordination,
            strategy,
            config,
            nickname: nickname_for(index),
            progress: AgentProgress::new(index),
            turn: TurnState::default(),
        }
    }

    pub fn phase(&self) -> AgentPhase {
        self.progress.phase()
    }

    /// Highest zero-based round seen in the history so far.
    pub fn round_index(&self) -> Option<usize> {
        self.turn.round_index
    }

    /// Open a session, play until a terminal state or a stop request, and
    /// close the session on every path.
    pub async fn run(mut self, sessions: Arc<dyn SessionProvider>) -> AgentOutcome {
        let mut session = match sessions.open(self.index).await.for_agent(self.index) {
            Ok(session) => session,
            Err(err) => return self.fail(err),
        };

        let index = self.index;
        let driven = AssertUnwindSafe(self.drive(session.as_ref()))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                Err(HarnessError::AgentTask {
                    agent: index,
                    message: panic_message(panic.as_ref()),
                })
            });

        let outcome = match driven {
            Ok(Some(result)) => AgentOutcome::Finished(result),
            Ok(None) => {
                log::info!(
                    "agent {} stopped in {:?} at round {:?}",
                    self.index,
                    self.phase(),
                    self.round_index()
                );
                AgentOutcome::Stopped
            }
            Err(err) => self.fail(err),
        };

        if let Err(err) = session.close().await {
            log::warn!("agent {}: failed to close session: {}", self.index, err);
        }
        outcome
    }

    fn fail(&mut self, err: HarnessError) -> AgentOutcome {
        if let Err(rejected) = self.progress.record(PhaseEvent::Failed) {
            log::warn!("{}", rejected);
        }
        log::warn!("agent {} failed: {}", self.index, err);
        self.coordination.fail(err.clone());
        AgentOutcome::Failed(err)
    }

    async fn drive<U: UiProbe + ?Sized>(&mut self, ui: &U) -> Result<Option<GameResult>> {
        // Nothing is rendered yet, so a stale navigation has no next poll to
        // recover on.
        ui.navigate(&self.config.base_url)
            .await
            .map_err(|err| HarnessError::Probe {
                agent: self.index,
                message: format!("initial navigation failed: {}", err),
            })?;
        self.pause(self.config.initial_settle).await;

        while !self.coordination.is_stopped() {
            match self.poll_once(ui).await {
                Ok(Some(result)) => {
                    self.coordination.record_result(self.index, result)?;
                    self.advance(PhaseEvent::GameEnded(result));
                    return Ok(Some(result));
                }
                Ok(None) => {}
                Err(err) if err.is_transient() => {
                    log::debug!("{}; retrying next poll", err);
                }
                Err(err) => return Err(err),
            }
            self.pause(self.config.poll_interval).await;
        }

        Ok(None)
    }

    /// One pass over every step. Each step is a no-op once its effect is
    /// visible in the UI.
    pub async fn poll_once<U: UiProbe + ?Sized>(&mut self, ui: &U) -> Result<Option<GameResult>> {
        self.check_fault(ui).await?;
        self.ensure_nickname(ui).await?;
        self.ensure_lobby(ui).await?;
        self.ensure_team(ui).await?;
        if self.index == HOST_AGENT {
            self.start_game_if_possible(ui).await?;
        }
        self.handle_round(ui).await
    }

    async fn check_fault<U: UiProbe + ?Sized>(&self, ui: &U) -> Result<()> {
        match ui.fault_signal().await.for_agent(self.index)? {
            Some(message) => Err(HarnessError::ClientScriptError {
                agent: self.index,
                message: page::sanitize_fault(&message, &self.config.server_address),
            }),
            None => Ok(()),
        }
    }

    async fn ensure_nickname<U: UiProbe + ?Sized>(&mut self, ui: &U) -> Result<()> {
        let Some(input) = ui
            .query(selectors::NICKNAME_INPUT)
            .await
            .for_agent(self.index)?
        else {
            return Ok(());
        };

        if self.value_of(input.as_ref()).await?.is_empty() {
            log::debug!("agent {}: setting nickname {:?}", self.index, self.nickname);
            input.type_text(&self.nickname).await.for_agent(self.index)?;
            self.pause(self.config.settle).await;
            input.submit().await.for_agent(self.index)?;
            self.pause(self.config.settle).await;
        } else {
            self.advance(PhaseEvent::NicknameSet);
        }
        Ok(())
    }

    async fn ensure_lobby<U: UiProbe + ?Sized>(&mut self, ui: &U) -> Result<()> {
        if self.index == HOST_AGENT && self.coordination.invite_link().is_none() {
            return self.create_lobby(ui).await;
        }

        let Some(invite) = self.coordination.invite_link().map(str::to_string) else {
            return Ok(());
        };
        let create = ui
            .query(selectors::CREATE_LOBBY)
            .await
            .for_agent(self.index)?;
        if create.is_some() {
            log::debug!("agent {}: joining lobby {}", self.index, invite);
            ui.navigate(&invite).await.for_agent(self.index)?;
            self.pause(self.config.settle).await;
        } else {
            self.advance(PhaseEvent::LobbyJoined);
        }
        Ok(())
    }

    async fn create_lobby<U: UiProbe + ?Sized>(&mut self, ui: &U) -> Result<()> {
        if let Some(create) = ui
            .query(selectors::CREATE_LOBBY)
            .await
            .for_agent(self.index)?
        {
            log::debug!("agent {}: creating lobby", self.index);
            create.click().await.for_agent(self.index)?;
            self.pause(self.config.settle).await;
        }

        let Some(link) = ui
            .query(selectors::INVITE_LINK)
            .await
            .for_agent(self.index)?
        else {
            return Ok(());
        };
        if let Some(href) = link
            .attribute(selectors::HREF_ATTR)
            .await
            .for_agent(self.index)?
            .filter(|href| !href.is_empty())
        {
            if self.coordination.publish_invite(self.index, href.clone())? {
                log::info!("agent {}: published invite {}", self.index, href);
            }
            self.advance(PhaseEvent::LobbyJoined);
        }
        Ok(())
    }

    async fn ensure_team<U: UiProbe + ?Sized>(&mut self, ui: &U) -> Result<()> {
        if let Some(observed) = self.observed_team(ui).await? {
            match self.turn.team {
                Some(known) if known != observed => {
                    return Err(HarnessError::protocol(
                        self.index,
                        format!("team changed from {} to {}", known, observed),
                    ));
                }
                Some(_) => {}
                None => {
                    log::info!("agent {}: joined {}", self.index, observed);
                    self.turn.team = Some(observed);
                    self.advance(PhaseEvent::TeamResolved);
                }
            }
            return Ok(());
        }

        let preferred = Team::preferred_for(self.index);
        if let Some(join) = ui
            .query(&page::join_team_selector(preferred))
            .await
            .for_agent(self.index)?
        {
            log::debug!("agent {}: asking to join {}", self.index, preferred);
            join.click().await.for_agent(self.index)?;
            self.pause(self.config.settle).await;
        }
        Ok(())
    }

    /// The team the lobby lists next to this agent's nickname.
    async fn observed_team<U: UiProbe + ?Sized>(&self, ui: &U) -> Result<Option<Team>> {
        for player in ui.query_all(selectors::PLAYER).await.for_agent(self.index)? {
            let Some(nick) = player
                .query(selectors::PLAYER_NICK)
                .await
                .for_agent(self.index)?
            else {
                continue;
            };
            if nick.text().await.for_agent(self.index)?.trim() != self.nickname {
                continue;
            }

            let Some(team) = player
                .query(selectors::PLAYER_TEAM)
                .await
                .for_agent(self.index)?
            else {
                return Ok(None);
            };
            let Some(marker) = team
                .attribute(selectors::TEAM_MARKER_ATTR)
                .await
                .for_agent(self.index)?
            else {
                return Ok(None);
            };
            return page::parse_team_marker(&marker)
                .map_err(|err| HarnessError::protocol(self.index, err.to_string()));
        }
        Ok(None)
    }

    async fn start_game_if_possible<U: UiProbe + ?Sized>(&self, ui: &U) -> Result<()> {
        let Some(start) = ui
            .query(selectors::START_GAME)
            .await
            .for_agent(self.index)?
        else {
            return Ok(());
        };
        if start.is_enabled().await.for_agent(self.index)? {
            log::info!("agent {}: starting game", self.index);
            start.click().await.for_agent(self.index)?;
            self.pause(self.config.settle).await;
        }
        Ok(())
    }

    async fn handle_round<U: UiProbe + ?Sized>(&mut self, ui: &U) -> Result<Option<GameResult>> {
        let Some(cell) = ui
            .query(selectors::LAST_ROUND_NUMBER)
            .await
            .for_agent(self.index)?
        else {
            return Ok(None);
        };
        let raw = cell.text().await.for_agent(self.index)?;
        let observed = page::parse_round_index(&raw).ok_or_else(|| {
            HarnessError::protocol(self.index, format!("unreadable round number {:?}", raw))
        })?;
        let round_index = self.observe_round(observed);

        for panel in ui
            .query_all(selectors::INPUT_ACTION)
            .await
            .for_agent(self.index)?
        {
            let Some(header) = panel
                .query(selectors::HEADER)
                .await
                .for_agent(self.index)?
            else {
                continue;
            };
            let header = header.text().await.for_agent(self.index)?;
            let situation = page::classify_header(&header).ok_or_else(|| {
                HarnessError::protocol(self.index, format!("unexpected input action {:?}", header))
            })?;

            match situation {
                Situation::GiveClues => self.give_clues(panel.as_ref()).await?,
                Situation::DecodeGuess | Situation::Intercept => {
                    self.guess(panel.as_ref(), round_index, situation).await?
                }
                Situation::Waiting => {}
                Situation::Tiebreak => self.tiebreak(panel.as_ref()).await?,
                Situation::GameOver => {
                    let result = page::parse_outcome(&header).ok_or_else(|| {
                        HarnessError::protocol(
                            self.index,
                            format!("unexpected game result {:?}", header),
                        )
                    })?;
                    log::info!(
                        "agent {}: game over after round {}: {}",
                        self.index,
                        round_index + 1,
                        result.as_str()
                    );
                    return Ok(Some(result));
                }
            }
        }
        Ok(None)
    }

    fn observe_round(&mut self, observed: usize) -> usize {
        match self.turn.round_index {
            Some(known) if observed < known => {
                log::warn!(
                    "agent {}: history went back from round {} to {}, keeping {}",
                    self.index,
                    known,
                    observed,
                    known
                );
                known
            }
            _ => {
                if self.turn.round_index != Some(observed) {
                    log::debug!("agent {}: round {}", self.index, observed);
                }
                self.turn.round_index = Some(observed);
                self.advance(PhaseEvent::RoundObserved);
                observed
            }
        }
    }

    async fn give_clues(&self, panel: &dyn UiElement) -> Result<()> {
        self.pause(self.config.settle).await;
        for row in panel
            .query_all(selectors::CLUE_ROW)
            .await
            .for_agent(self.index)?
        {
            let target = row
                .query(selectors::CLUE_TARGET)
                .await
                .for_agent(self.index)?;
            let input = row
                .query(selectors::CLUE_INPUT)
                .await
                .for_agent(self.index)?;
            let (Some(target), Some(input)) = (target, input) else {
                continue;
            };
            if self.value_of(input.as_ref()).await?.is_empty() {
                let label = target.text().await.for_agent(self.index)?;
                input
                    .type_text(&page::clue_tag(&label))
                    .await
                    .for_agent(self.index)?;
            }
        }
        self.pause(self.config.settle).await;

        if let Some(submit) = panel
            .query(selectors::SUBMIT_CLUES)
            .await
            .for_agent(self.index)?
        {
            let disabled = submit
                .attribute(selectors::DISABLED_ATTR)
                .await
                .for_agent(self.index)?
                .is_some_and(|value| value != "false");
            if !disabled {
                log::debug!("agent {}: submitting clues", self.index);
                submit.click().await.for_agent(self.index)?;
                self.pause(self.config.settle).await;
            }
        }
        Ok(())
    }

    async fn guess(
        &self,
        panel: &dyn UiElement,
        round_index: usize,
        situation: Situation,
    ) -> Result<()> {
        let mut tokens = Vec::new();
        for token in panel
            .query_all(selectors::CLUE_TOKEN)
            .await
            .for_agent(self.index)?
        {
            tokens.push(token.text().await.for_agent(self.index)?);
        }
        let correct = page::correct_answer(tokens.iter().map(|t| t.trim()))
            .map_err(|err| HarnessError::protocol(self.index, err.to_string()))?;

        let input = StrategyInput::new(self.index, self.team(), round_index, situation);
        let answer = if self.strategy.commit_correct(&input) {
            correct
        } else {
            page::wrong_answer(&correct)
        };

        let Some(textbox) = panel
            .query(selectors::TEXT_INPUT)
            .await
            .for_agent(self.index)?
        else {
            return Ok(());
        };
        if self.value_of(textbox.as_ref()).await?.is_empty() {
            log::debug!(
                "agent {}: {} answer {:?} in round {}",
                self.index,
                situation.as_str(),
                answer,
                round_index
            );
            textbox.type_text(&answer).await.for_agent(self.index)?;
            textbox.submit().await.for_agent(self.index)?;
            self.pause(self.config.settle).await;
        } else {
            textbox.clear().await.for_agent(self.index)?;
        }
        Ok(())
    }

    async fn tiebreak(&self, panel: &dyn UiElement) -> Result<()> {
        for textbox in panel
            .query_all(selectors::TEXT_INPUT)
            .await
            .for_agent(self.index)?
        {
            if self.value_of(textbox.as_ref()).await?.is_empty() {
                textbox
                    .type_text(page::TIEBREAK_FALLBACK)
                    .await
                    .for_agent(self.index)?;
                textbox.submit().await.for_agent(self.index)?;
                self.pause(self.config.settle).await;
                break;
            }
            textbox.clear().await.for_agent(self.index)?;
        }
        Ok(())
    }

    async fn value_of(&self, input: &dyn UiElement) -> Result<String> {
        Ok(input
            .attribute(selectors::VALUE_ATTR)
            .await
            .for_agent(self.index)?
            .unwrap_or_default())
    }

    fn team(&self) -> Team {
        self.turn
            .team
            .unwrap_or_else(|| Team::preferred_for(self.index))
    }

    fn advance(&mut self, event: PhaseEvent) {
        let before = self.progress.phase();
        match self.progress.record(event) {
            Ok(after) if after != before => {
                log::info!("agent {}: {:?} -> {:?}", self.index, before, after)
            }
            Ok(_) => {}
            Err(err) => log::warn!("{}", err),
        }
    }

    /// Sleep, waking early if a stop is requested.
    async fn pause(&self, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        tokio::select! {
            _ = tokio::time::sleep(duration) => {}
            _ = self.coordination.stopped() => {}
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "panicked".to_string()
    }
}
