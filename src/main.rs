//! blockfx CLI
//!
//! Command-line interface for inspecting and rendering effect units.

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::info;

use blockfx::cli::{commands, Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).init();

    info!("blockfx v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Some(cmd) => handle_command(cmd),
        None => {
            println!("blockfx v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

fn handle_command(cmd: Commands) -> anyhow::Result<()> {
    match cmd {
        Commands::Describe { effect } => {
            commands::describe(effect).context("failed to describe effects")
        }
        Commands::Render {
            effect,
            preset,
            config,
            frames,
            signal,
            frequency,
        } => commands::render(
            effect,
            preset.as_deref(),
            config.as_deref(),
            frames,
            signal,
            frequency,
        )
        .with_context(|| format!("failed to render through {}", effect)),
    }
}
