use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use decrypto_e2e::providers::server::{self, GameServer};
use decrypto_e2e::HarnessConfig;

#[derive(Parser)]
#[command(name = "decrypto-e2e")]
#[command(about = "End-to-end harness for the clue-guessing game server", long_about = None)]
#[command(version)]
struct Cli {
    /// TOML file with harness settings. Environment variables are used otherwise.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Wait until a game server answers on its root page.
    Ready {
        #[arg(long)]
        addr: Option<String>,
        #[arg(long)]
        attempts: Option<u32>,
    },
    /// Start a game server on a free port and keep it up until Ctrl-C.
    Serve {
        /// Server command; the listen address is appended as its last argument.
        #[arg(trailing_var_arg = true, required = true)]
        command: Vec<String>,
    },
    /// Print the effective settings.
    ShowConfig,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => HarnessConfig::from_file(path)?,
        None => {
            let config = HarnessConfig::from_env();
            config.validate()?;
            config
        }
    };

    match cli.command {
        Commands::Ready { addr, attempts } => {
            let address = addr.unwrap_or_else(|| config.server_address.clone());
            let attempts = attempts.unwrap_or(config.ready_attempts);
            server::wait_until_ready(&address, attempts, config.ready_backoff()).await?;
            println!("{} is ready", address);
        }
        Commands::Serve { command } => serve(&config, &command).await?,
        Commands::ShowConfig => {
            print!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

async fn serve(config: &HarnessConfig, command: &[String]) -> Result<()> {
    let (program, args) = command
        .split_first()
        .context("no server command given")?;
    let port = server::pick_unused_port()?;
    let address = SocketAddr::from(([127, 0, 0, 1], port));

    let game_server = GameServer::spawn(program, args, address)?;
    game_server.wait_until_ready(config).await?;
    println!("serving at http://{}/", game_server.address());

    tokio::signal::ctrl_c().await?;
    game_server.shutdown().await
}
