use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::HarnessConfig;
use crate::engine::coordination::CoordinationState;
use crate::engine::driver::{AgentDriver, DriverConfig};
use crate::error::{HarnessError, Result};
use crate::providers::ui::SessionProvider;
use crate::strategy::Strategy;
use crate::types::{AgentIndex, AgentOutcome, GameResult, Team, HOST_AGENT, MIN_AGENTS};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameReport {
    pub run_id: uuid::Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub agent_count: usize,
    /// `None` when the game ended in a draw.
    pub winner: Option<Team>,
    pub results: BTreeMap<AgentIndex, GameResult>,
}

/// Runs whole games: one driver task per seat, then a single verdict.
pub struct Orchestrator {
    sessions: Arc<dyn SessionProvider>,
    config: HarnessConfig,
}

impl Orchestrator {
    pub fn new(sessions: Arc<dyn SessionProvider>, config: HarnessConfig) -> Self {
        Self { sessions, config }
    }

    /// Play one game with the configured number of agents.
    pub async fn run_configured_game(&self, strategy: Arc<dyn Strategy>) -> Result<GameReport> {
        self.run_game_report(strategy, self.config.agent_count).await
    }

    /// Play one game and return the winning team, or `None` for a draw.
    pub async fn run_game(
        &self,
        strategy: Arc<dyn Strategy>,
        agent_count: usize,
    ) -> Result<Option<Team>> {
        Ok(self.run_game_report(strategy, agent_count).await?.winner)
    }

    pub async fn run_game_report(
        &self,
        strategy: Arc<dyn Strategy>,
        agent_count: usize,
    ) -> Result<GameReport> {
        if agent_count < MIN_AGENTS {
            return Err(HarnessError::config(format!(
                "a game needs at least {} agents, got {}",
                MIN_AGENTS, agent_count
            )));
        }

        let run_id = uuid::Uuid::new_v4();
        let started_at = Utc::now();
        log::info!("run {}: starting {} agents", run_id, agent_count);

        let coordination = Arc::new(CoordinationState::new());
        let driver_config = DriverConfig::from(&self.config);

        let handles: Vec<_> = (0..agent_count)
            .map(|index| {
                let driver = AgentDriver::new(
                    index,
                    coordination.clone(),
                    strategy.clone(),
                    driver_config.clone(),
                );
                let sessions = self.sessions.clone();
                tokio::spawn(async move { driver.run(sessions).await })
            })
            .collect();

        for (index, joined) in join_all(handles).await.into_iter().enumerate() {
            match joined {
                Ok(AgentOutcome::Failed(err)) => {
                    log::debug!("run {}: agent {} failed: {}", run_id, index, err)
                }
                Ok(outcome) => match outcome.result() {
                    Some(result) => log::debug!(
                        "run {}: agent {} finished: {}",
                        run_id,
                        index,
                        result.as_str()
                    ),
                    None => log::debug!("run {}: agent {} stopped", run_id, index),
                },
                Err(join_err) => coordination.fail(HarnessError::AgentTask {
                    agent: index,
                    message: join_err.to_string(),
                }),
            }
        }

        let winner = aggregate(&coordination)?;
        let report = GameReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            agent_count,
            winner,
            results: coordination.results(),
        };
        log::info!(
            "run {}: finished, winner {}",
            run_id,
            report
                .winner
                .map(|team| team.to_string())
                .unwrap_or_else(|| "none".to_string())
        );
        Ok(report)
    }
}

/// Turn the shared state of a finished run into its verdict.
///
/// A latched error always wins over whatever results were recorded.
pub fn aggregate(coordination: &CoordinationState) -> Result<Option<Team>> {
    if let Some(err) = coordination.first_error() {
        return Err(err);
    }

    let host = coordination.result_for(HOST_AGENT).ok_or_else(|| {
        HarnessError::aggregation(format!("agent {} recorded no result", HOST_AGENT))
    })?;

    for (agent, result) in coordination.results() {
        if result.is_draw() != host.is_draw() {
            return Err(HarnessError::aggregation(format!(
                "agent {} saw {} but agent {} saw {}",
                agent,
                result.as_str(),
                HOST_AGENT,
                host.as_str()
            )));
        }
    }

    Ok(match host {
        GameResult::Draw => None,
        GameResult::Win => Some(Team::White),
        GameResult::Loss => Some(Team::Black),
    })
}
