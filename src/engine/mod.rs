pub mod coordination;
pub mod driver;
pub mod orchestrator;
pub mod page;

pub use coordination::CoordinationState;
pub use driver::{AgentDriver, DriverConfig};
pub use orchestrator::{aggregate, GameReport, Orchestrator};
