pub mod server;
pub mod ui;

pub use server::GameServer;
pub use ui::{ProbeError, ProbeResult, SessionProvider, UiElement, UiProbe, UiSession};
