use async_trait::async_trait;

use crate::error::HarnessError;
use crate::types::AgentIndex;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeError {
    /// The element was re-rendered away after it was looked up.
    #[error("stale element: {0}")]
    Stale(String),
    #[error("{0}")]
    Io(String),
}

pub type ProbeResult<T> = std::result::Result<T, ProbeError>;

/// Read and act on one rendered page.
///
/// Lookups that find nothing return `None` (or an empty list); only
/// exceptional I/O surfaces as an error.
#[async_trait]
pub trait UiProbe: Send + Sync {
    async fn navigate(&self, url: &str) -> ProbeResult<()>;
    async fn query(&self, selector: &str) -> ProbeResult<Option<Box<dyn UiElement>>>;
    async fn query_all(&self, selector: &str) -> ProbeResult<Vec<Box<dyn UiElement>>>;
    /// The message of the first uncaught client-side error, if one was caught.
    async fn fault_signal(&self) -> ProbeResult<Option<String>>;
}

#[async_trait]
pub trait UiElement: Send + Sync {
    async fn query(&self, selector: &str) -> ProbeResult<Option<Box<dyn UiElement>>>;
    async fn query_all(&self, selector: &str) -> ProbeResult<Vec<Box<dyn UiElement>>>;
    async fn attribute(&self, name: &str) -> ProbeResult<Option<String>>;
    async fn text(&self) -> ProbeResult<String>;
    async fn click(&self) -> ProbeResult<()>;
    async fn type_text(&self, text: &str) -> ProbeResult<()>;
    /// Send the submit keystroke to the element.
    async fn submit(&self) -> ProbeResult<()>;
    async fn clear(&self) -> ProbeResult<()>;
    async fn is_enabled(&self) -> ProbeResult<bool>;
}

/// A rendering session owned by exactly one agent.
#[async_trait]
pub trait UiSession: UiProbe {
    async fn close(&mut self) -> ProbeResult<()>;
}

#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn open(&self, agent: AgentIndex) -> ProbeResult<Box<dyn UiSession>>;
}

/// Attach the acting agent to probe failures.
pub trait ProbeResultExt<T> {
    fn for_agent(self, agent: AgentIndex) -> Result<T, HarnessError>;
}

impl<T> ProbeResultExt<T> for ProbeResult<T> {
    fn for_agent(self, agent: AgentIndex) -> Result<T, HarnessError> {
        self.map_err(|err| match err {
            ProbeError::Stale(detail) => HarnessError::TransientUi { agent, detail },
            ProbeError::Io(message) => HarnessError::Probe { agent, message },
        })
    }
}
