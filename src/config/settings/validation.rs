// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use crate::error::{BotError, Result};

use super::Settings;

impl Settings {
    /// Get the bot token, checking env var first.
    pub fn get_telegram_token(&self) -> Option<String> {
        // Priority: env var > config file.
        std::env::var(&self.telegram.token_env)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.telegram.token.clone())
    }

    /// Get the DeepSeek API key, checking env var first.
    pub fn get_llm_api_key(&self) -> Option<String> {
        // Priority: env var > config file.
        std::env::var(&self.llm.api_key_env)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.llm.api_key.clone())
    }

    /// Get the operator id, checking env var first.
    /// An env value that is not an integer is ignored.
    pub fn get_admin_id(&self) -> Option<i64> {
        std::env::var(&self.admin.admin_id_env)
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .or(self.admin.admin_id)
    }

    /// Check that everything needed to run the bot is configured.
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();

        if self.get_telegram_token().is_none() {
            missing.push(format!("bot token (set {})", self.telegram.token_env));
        }
        if self.get_admin_id().is_none() {
            missing.push(format!("operator id (set {})", self.admin.admin_id_env));
        }
        if self.get_llm_api_key().is_none() {
            missing.push(format!("DeepSeek API key (set {})", self.llm.api_key_env));
        }

        if self.dialogue.max_turns < 2 {
            return Err(BotError::Config(
                "dialogue.max_turns must leave room for the system turn and a question"
                    .to_string(),
            ));
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(BotError::Config(format!("missing {}", missing.join(", "))))
        }
    }
}
