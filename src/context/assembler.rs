// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Builds and trims the turn list sent to the language model.

use crate::config::DialogueConfig;
use crate::llm::message::{Message, Role};

/// Answer tone requested in the system preamble
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tone {
    #[default]
    Polite,
    /// Operator-enabled rude mode
    Rude,
}

/// Assembles the dialogue context for one Q&A session
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    max_turns: usize,
}

impl ContextAssembler {
    pub fn new(max_turns: usize) -> Self {
        Self { max_turns }
    }

    pub fn from_config(config: &DialogueConfig) -> Self {
        Self::new(config.max_turns)
    }

    /// Turn budget applied by [`ContextAssembler::window`]
    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    /// Start a dialogue: a single system turn carrying the document text.
    pub fn build_initial(&self, document_text: &str, tone: Tone) -> Vec<Message> {
        vec![Message::system(preamble(document_text, tone))]
    }

    /// Strictly append one turn.
    pub fn append(turns: &mut Vec<Message>, role: Role, content: impl Into<String>) {
        turns.push(Message::new(role, content));
    }

    /// The turns to send on the next call.
    pub fn window(&self, turns: &[Message]) -> Vec<Message> {
        bounded(turns, self.max_turns)
    }
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::from_config(&DialogueConfig::default())
    }
}

/// Keep at most `max_len` turns.
///
/// When trimming, element 0 survives if it is the system turn and the rest of
/// the budget goes to the most recent turns.
pub fn bounded(turns: &[Message], max_len: usize) -> Vec<Message> {
    if turns.len() <= max_len {
        return turns.to_vec();
    }
    if max_len == 0 {
        return Vec::new();
    }

    match turns.first() {
        Some(anchor) if anchor.is_system() => {
            let tail_start = turns.len() - (max_len - 1);
            let mut out = Vec::with_capacity(max_len);
            out.push(anchor.clone());
            out.extend_from_slice(&turns[tail_start..]);
            out
        }
        _ => turns[turns.len() - max_len..].to_vec(),
    }
}

fn preamble(document_text: &str, tone: Tone) -> String {
    let mut text = format!(
        "Ты помощник, который отвечает на вопросы о конкурсе.\n\
         Вот информация о конкурсе: {document_text}\n\n\
         Отвечай на вопросы пользователя на основе этой информации.\n\
         БУДЬ КРАТКИМ! Отвечай одним предложением, максимум два.\n\
         Отвечай только по существу вопроса."
    );
    if tone == Tone::Rude {
        text.push_str("\nОтвечай дерзко и с сарказмом, но по делу.");
    }
    text
}
