//! Error types for the harness.
//!
//! Every fatal condition an agent can hit is a [`HarnessError`]. The type is
//! `Clone` so the first one can be latched in shared state and still be handed
//! back to the caller after all agents have been joined.

use crate::types::AgentIndex;

pub type Result<T> = std::result::Result<T, HarnessError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HarnessError {
    /// The interface showed a header or outcome phrase the driver does not know.
    #[error("agent {agent}: protocol violation: {detail}")]
    ProtocolViolation { agent: AgentIndex, detail: String },

    /// The page reported an uncaught client-side error.
    #[error("agent {agent}: client script error: {message}")]
    ClientScriptError { agent: AgentIndex, message: String },

    /// An element vanished between lookup and read. Retried on the next poll.
    #[error("agent {agent}: transient UI inconsistency: {detail}")]
    TransientUi { agent: AgentIndex, detail: String },

    #[error("agent {agent}: UI probe failure: {message}")]
    Probe { agent: AgentIndex, message: String },

    #[error("coordination error: {0}")]
    Coordination(String),

    #[error("agent {agent} recorded a result twice")]
    DuplicateResult { agent: AgentIndex },

    #[error("agent {agent} task aborted: {message}")]
    AgentTask { agent: AgentIndex, message: String },

    #[error("aggregation error: {0}")]
    Aggregation(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("game server at {address} not ready after {attempts} attempts")]
    ServerNotReady { address: String, attempts: u32 },
}

impl HarnessError {
    pub fn protocol(agent: AgentIndex, detail: impl Into<String>) -> Self {
        Self::ProtocolViolation {
            agent,
            detail: detail.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn aggregation(msg: impl Into<String>) -> Self {
        Self::Aggregation(msg.into())
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientUi { .. })
    }

    /// The agent the error originated from, when there is one.
    pub fn agent(&self) -> Option<AgentIndex> {
        match self {
            Self::ProtocolViolation { agent, .. }
            | Self::ClientScriptError { agent, .. }
            | Self::TransientUi { agent, .. }
            | Self::Probe { agent, .. }
            | Self::DuplicateResult { agent }
            | Self::AgentTask { agent, .. } => Some(*agent),
            _ => None,
        }
    }
}
