//! # gen-links
//!
//! Generates a static redirect site from `redirect.toml`:
//!
//! - `{path}/index.html` - immediate `Refresh` redirect to the entry's URL
//! - `index/index.html` - list of entries marked `index = true`
//!
//! With no arguments it reads `redirect.toml` from the current directory and
//! writes next to it.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use linkrelay::{redirect, site};

/// Generate HTML redirect pages from a TOML table.
#[derive(Parser)]
#[command(name = "gen-links", version)]
struct Cli {
    /// Redirect definitions.
    #[arg(long, default_value = "redirect.toml")]
    config: PathBuf,
    /// Directory the pages are written under.
    #[arg(long, default_value = ".")]
    output: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(log_filter)
        .with_writer(std::io::stderr)
        .init();

    let entries = redirect::load_file(&cli.config)
        .with_context(|| format!("loading redirects from {}", cli.config.display()))?;
    info!(
        "Loaded {} redirect(s) from {}",
        entries.len(),
        cli.config.display()
    );

    site::write_site(&entries, &cli.output)
        .with_context(|| format!("writing site under {}", cli.output.display()))?;
    Ok(())
}
