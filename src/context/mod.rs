// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Dialogue context management
//!
//! The document text is embedded once as a system turn; the window sent to
//! the model always keeps that anchor and drops the oldest exchanges first.

pub mod assembler;

pub use assembler::{bounded, ContextAssembler, Tone};
