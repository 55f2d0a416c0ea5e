use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, OnceLock, PoisonError};
use tokio::sync::watch;

use crate::error::{HarnessError, Result};
use crate::types::{AgentIndex, GameResult, HOST_AGENT};

/// State shared by every agent of one game run.
///
/// The stop flag only ever goes from `false` to `true`, the invite link and the
/// first error are write-once, and each agent owns exactly one slot in the
/// results map.
pub struct CoordinationState {
    stop: watch::Sender<bool>,
    invite_link: OnceLock<String>,
    results: Mutex<HashMap<AgentIndex, GameResult>>,
    first_error: OnceLock<HarnessError>,
}

impl CoordinationState {
    pub fn new() -> Self {
        let (stop, _) = watch::channel(false);
        Self {
            stop,
            invite_link: OnceLock::new(),
            results: Mutex::new(HashMap::new()),
            first_error: OnceLock::new(),
        }
    }

    /// Returns `true` if this call published the link.
    pub fn publish_invite(&self, publisher: AgentIndex, link: impl Into<String>) -> Result<bool> {
        if publisher != HOST_AGENT {
            return Err(HarnessError::Coordination(format!(
                "agent {} tried to publish the invite link",
                publisher
            )));
        }
        Ok(self.invite_link.set(link.into()).is_ok())
    }

    pub fn invite_link(&self) -> Option<&str> {
        self.invite_link.get().map(String::as_str)
    }

    /// Latches `error` unless an earlier one is already held.
    pub fn try_set_first_error(&self, error: HarnessError) -> bool {
        self.first_error.set(error).is_ok()
    }

    pub fn first_error(&self) -> Option<HarnessError> {
        self.first_error.get().cloned()
    }

    /// Returns `true` if this call flipped the flag.
    pub fn request_stop(&self) -> bool {
        self.stop.send_if_modified(|stopped| {
            if *stopped {
                false
            } else {
                *stopped = true;
                true
            }
        })
    }

    pub fn is_stopped(&self) -> bool {
        *self.stop.borrow()
    }

    /// Completes once a stop has been requested.
    pub async fn stopped(&self) {
        let mut rx = self.stop.subscribe();
        let _ = rx.wait_for(|stopped| *stopped).await;
    }

    /// Latch the error and ask every agent to stop.
    pub fn fail(&self, error: HarnessError) {
        if self.try_set_first_error(error.clone()) {
            log::error!("first fatal error: {}", error);
        } else {
            log::debug!("additional fatal error: {}", error);
        }
        self.request_stop();
    }

    pub fn record_result(&self, agent: AgentIndex, result: GameResult) -> Result<()> {
        let mut results = self.results.lock().unwrap_or_else(PoisonError::into_inner);
        if results.contains_key(&agent) {
            return Err(HarnessError::DuplicateResult { agent });
        }
        results.insert(agent, result);
        Ok(())
    }

    pub fn result_for(&self, agent: AgentIndex) -> Option<GameResult> {
        let results = self.results.lock().unwrap_or_else(PoisonError::into_inner);
        results.get(&agent).copied()
    }

    pub fn results(&self) -> BTreeMap<AgentIndex, GameResult> {
        let results = self.results.lock().unwrap_or_else(PoisonError::into_inner);
        results.iter().map(|(k, v)| (*k, *v)).collect()
    }
}

impl Default for CoordinationState {
    fn default() -> Self {
        Self::new()
    }
}
