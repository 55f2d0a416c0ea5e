pub mod phase;

pub use phase::{AgentPhase, AgentProgress, PhaseEvent};
