// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Contest assistant - a chat bot around a library of contest rule documents.
//!
//! Users browse departments and download rule PDFs, or pick a document and ask
//! a language model questions about it. An operator uploads and deletes
//! documents and adds departments.
//!
//! Architecture highlights:
//! - `bot`: update loop, blocked-user check and routing
//! - `flow`: per-user state machine for every conversation
//! - `session`: in-memory per-user flow state
//! - `context`: bounded dialogue sent to the model
//! - `store`: SQLite departments/documents/users and the file directory
//! - `llm`, `pdf`, `transport`: model API, text extraction, chat platform
//! - `commands`: slash commands and operator state

pub mod bot;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod flow;
pub mod llm;
pub mod pdf;
pub mod session;
pub mod store;
pub mod transport;

pub use error::{BotError, Result};
