pub mod config;
pub mod engine;
pub mod error;
pub mod lifecycle;
pub mod providers;
pub mod strategy;
pub mod types;

pub use config::HarnessConfig;
pub use engine::{GameReport, Orchestrator};
pub use error::{HarnessError, Result};
pub use strategy::Strategy;
pub use types::*;
