// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Per-user conversation flows
//!
//! - `engine`: event routing, flow entry and cancel
//! - `contests`: browse, download, upload, delete and new-department steps
//! - `question`: document Q&A with the model
//! - `guard`, `keyboards`, `selection`: input checks, keyboards and button ids

mod contests;
pub mod engine;
pub mod guard;
pub mod keyboards;
mod question;
pub mod selection;

pub use engine::{FlowDeps, FlowEngine};
pub use keyboards::MenuEntry;
pub use selection::{DeptAction, Selection};
