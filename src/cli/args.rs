// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! CLI argument definitions using Clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Contest assistant - chat bot for contest rule documents
#[derive(Parser, Debug)]
#[command(name = "contest-assistant")]
#[command(version, about = "Chat bot for contest rule documents")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Run the bot (default when no command given)
    Run,

    /// Upgrade the database schema and seed default departments
    Migrate,

    /// Print the documents table structure and check stored files
    CheckDb,

    /// Check that the language-model API answers
    PingAi,
}
