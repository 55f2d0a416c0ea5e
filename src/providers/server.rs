use anyhow::{Context, Result};
use std::net::{SocketAddr, TcpListener};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};

use crate::config::HarnessConfig;
use crate::error::HarnessError;

const FIRST_PROBE_DELAY: Duration = Duration::from_millis(500);
const MAX_BACKOFF: Duration = Duration::from_secs(300);

/// A game server process started for one test run. Killed on drop.
pub struct GameServer {
    child: Child,
    address: SocketAddr,
}

impl GameServer {
    /// Start `program args... <address>`.
    pub fn spawn(program: &str, args: &[String], address: SocketAddr) -> Result<Self> {
        let child = Command::new(program)
            .args(args)
            .arg(address.to_string())
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("spawn game server {:?}", program))?;
        log::info!("game server starting at {}", address);
        Ok(Self { child, address })
    }

    pub fn address(&self) -> SocketAddr {
        self.address
    }

    pub async fn wait_until_ready(&self, config: &HarnessConfig) -> Result<(), HarnessError> {
        tokio::time::sleep(FIRST_PROBE_DELAY).await;
        wait_until_ready(
            &self.address.to_string(),
            config.ready_attempts,
            config.ready_backoff(),
        )
        .await
    }

    pub async fn shutdown(mut self) -> Result<()> {
        if self.child.try_wait()?.is_none() {
            self.child.kill().await.context("kill game server")?;
        }
        log::info!("game server at {} stopped", self.address);
        Ok(())
    }
}

/// Poll `GET http://<address>/` until it answers with a success status.
///
/// Attempt `i` failing waits `backoff * i^1.5` before the next one. There is
/// no wait after the last attempt.
pub async fn wait_until_ready(
    address: &str,
    attempts: u32,
    backoff: Duration,
) -> Result<(), HarnessError> {
    let url = format!("http://{}/", address);
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .map_err(|e| HarnessError::config(format!("build http client: {}", e)))?;

    for attempt in 0..attempts {
        match client.get(&url).send().await {
            Ok(response) if response.status().is_success() => {
                log::info!("game server at {} is ready", address);
                return Ok(());
            }
            Ok(response) => log::debug!("{} answered {}", url, response.status()),
            Err(err) => log::debug!("{} not reachable yet: {}", url, err),
        }
        if attempt + 1 < attempts {
            tokio::time::sleep(backoff_delay(backoff, attempt)).await;
        }
    }

    Err(HarnessError::ServerNotReady {
        address: address.to_string(),
        attempts,
    })
}

/// `base * attempt^1.5`, capped at [`MAX_BACKOFF`].
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let secs = base.as_secs_f64() * f64::from(attempt).powf(1.5);
    Duration::try_from_secs_f64(secs)
        .unwrap_or(MAX_BACKOFF)
        .min(MAX_BACKOFF)
}

/// A loopback port nothing is listening on right now.
pub fn pick_unused_port() -> std::io::Result<u16> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}
