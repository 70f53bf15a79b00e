// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Contest assistant
//!
//! Entry point for the bot and its maintenance commands.

use clap::Parser;

use contest_assistant::cli::{run, Cli, Commands};
use contest_assistant::config::Settings;
use contest_assistant::error::Result;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize tracing. `RUST_LOG` still takes precedence over the defaults.
    let mut env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::WARN.into());
    let crate_level = if cli.verbose > 0 {
        "contest_assistant=debug"
    } else {
        "contest_assistant=info"
    };
    if let Ok(parsed) = crate_level.parse() {
        env_filter = env_filter.add_directive(parsed);
    }
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    // Load settings
    let settings = match &cli.config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run::run_bot(&settings).await,
        Commands::Migrate => run::run_migrate(&settings),
        Commands::CheckDb => run::run_check_db(&settings),
        Commands::PingAi => run::run_ping_ai(&settings).await,
    }
}
