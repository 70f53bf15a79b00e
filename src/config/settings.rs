// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Settings management for the contest assistant
//!
//! Handles loading and saving settings from ~/.contest-assistant/settings.json.
//! Credentials are normally supplied through environment variables, which take
//! priority over values stored in the file.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

mod io;
mod migration;
mod validation;

/// Main settings structure, stored in ~/.contest-assistant/settings.json
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Chat transport (Telegram Bot API) configuration
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Privileged operator identity
    #[serde(default)]
    pub admin: AdminConfig,

    /// Language-model API configuration
    #[serde(default)]
    pub llm: LlmConfig,

    /// Q&A dialogue limits
    #[serde(default)]
    pub dialogue: DialogueConfig,

    /// Database and file storage locations
    #[serde(default)]
    pub storage: StorageConfig,

    /// Fixed-response command content
    #[serde(default)]
    pub about: AboutConfig,
}

/// Telegram Bot API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token (if stored directly, not recommended)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Environment variable name for the bot token
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Base URL of the Bot API
    #[serde(default = "default_telegram_base_url")]
    pub api_base_url: String,

    /// Long-polling timeout passed to getUpdates
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,

    /// Timeout for regular Bot API calls
    #[serde(default = "default_transport_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Operator identity configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Operator user id (if stored directly)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_id: Option<i64>,

    /// Environment variable name for the operator id
    #[serde(default = "default_admin_id_env")]
    pub admin_id_env: String,
}

/// DeepSeek (OpenAI-compatible) API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// API key (if stored directly, not recommended)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Environment variable name for API key
    #[serde(default = "default_llm_api_key_env")]
    pub api_key_env: String,

    /// Base URL for the API (chat completions live under /chat/completions)
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    /// Model to use
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Maximum tokens in an answer
    #[serde(default = "default_llm_max_tokens")]
    pub max_tokens: u32,

    /// Wall-clock timeout for one completion call
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

/// Q&A dialogue configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogueConfig {
    /// Turn budget sent to the model (1 system + question/answer pairs)
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,

    /// Characters of extracted document text embedded in the system turn
    #[serde(default = "default_document_max_chars")]
    pub document_max_chars: usize,

    /// Longest accepted question
    #[serde(default = "default_question_max_chars")]
    pub question_max_chars: usize,

    /// Characters revealed per message edit
    #[serde(default = "default_reveal_chunk_chars")]
    pub reveal_chunk_chars: usize,

    /// Pause between reveal edits
    #[serde(default = "default_reveal_delay_ms")]
    pub reveal_delay_ms: u64,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Data directory (defaults to <home>/data)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    /// SQLite file name inside the data directory
    #[serde(default = "default_database_file")]
    pub database_file: String,

    /// Directory name for stored contest files inside the data directory
    #[serde(default = "default_files_dir")]
    pub files_dir: String,

    /// Departments seeded on first run
    #[serde(default = "default_departments")]
    pub default_departments: Vec<String>,
}

/// Content for fixed-response commands
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AboutConfig {
    /// Shown by /author
    #[serde(default = "default_author")]
    pub author: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: None,
            token_env: default_token_env(),
            api_base_url: default_telegram_base_url(),
            poll_timeout_secs: default_poll_timeout_secs(),
            request_timeout_secs: default_transport_timeout_secs(),
        }
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            admin_id: None,
            admin_id_env: default_admin_id_env(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_key_env: default_llm_api_key_env(),
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            max_tokens: default_llm_max_tokens(),
            timeout_secs: default_llm_timeout_secs(),
        }
    }
}

impl LlmConfig {
    /// Completion timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            document_max_chars: default_document_max_chars(),
            question_max_chars: default_question_max_chars(),
            reveal_chunk_chars: default_reveal_chunk_chars(),
            reveal_delay_ms: default_reveal_delay_ms(),
        }
    }
}

impl DialogueConfig {
    /// Pause between reveal edits as a Duration
    pub fn reveal_delay(&self) -> Duration {
        Duration::from_millis(self.reveal_delay_ms)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            database_file: default_database_file(),
            files_dir: default_files_dir(),
            default_departments: default_departments(),
        }
    }
}

impl Default for AboutConfig {
    fn default() -> Self {
        Self {
            author: default_author(),
        }
    }
}

// Default value functions
fn default_token_env() -> String {
    "TG_TOKEN".to_string()
}

fn default_telegram_base_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_poll_timeout_secs() -> u64 {
    30
}

fn default_transport_timeout_secs() -> u64 {
    45
}

fn default_admin_id_env() -> String {
    "ADMIN_ID".to_string()
}

fn default_llm_api_key_env() -> String {
    "DEEPSEEK_API_KEY".to_string()
}

fn default_llm_base_url() -> String {
    "https://api.deepseek.com/v1".to_string()
}

fn default_llm_model() -> String {
    "deepseek-chat".to_string()
}

fn default_llm_max_tokens() -> u32 {
    150
}

fn default_llm_timeout_secs() -> u64 {
    60
}

fn default_max_turns() -> usize {
    7
}

fn default_document_max_chars() -> usize {
    5000
}

fn default_question_max_chars() -> usize {
    1000
}

fn default_reveal_chunk_chars() -> usize {
    20
}

fn default_reveal_delay_ms() -> u64 {
    50
}

fn default_database_file() -> String {
    "contests.db".to_string()
}

fn default_files_dir() -> String {
    "contests_files".to_string()
}

fn default_departments() -> Vec<String> {
    [
        "Пожарная безопасность",
        "Судомодельные",
        "Шашки",
        "БПЛА",
        "Автомодельные соревнования",
        "Робототехника",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_author() -> String {
    "Ковалик Иван".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_settings_default() {
        let settings = Settings::default();
        assert_eq!(settings.dialogue.max_turns, 7);
        assert_eq!(settings.llm.model, "deepseek-chat");
        assert_eq!(settings.storage.default_departments.len(), 6);
    }

    #[test]
    fn test_llm_config_default() {
        let config = LlmConfig::default();
        assert!(config.api_key.is_none());
        assert_eq!(config.api_key_env, "DEEPSEEK_API_KEY");
        assert_eq!(config.max_tokens, 150);
        assert_eq!(config.timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_telegram_config_default() {
        let config = TelegramConfig::default();
        assert_eq!(config.token_env, "TG_TOKEN");
        assert_eq!(config.api_base_url, "https://api.telegram.org");
        assert_eq!(config.poll_timeout_secs, 30);
    }

    #[test]
    fn test_dialogue_config_default() {
        let config = DialogueConfig::default();
        assert_eq!(config.document_max_chars, 5000);
        assert_eq!(config.question_max_chars, 1000);
        assert_eq!(config.reveal_chunk_chars, 20);
        assert_eq!(config.reveal_delay(), Duration::from_millis(50));
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let json = r#"{ "llm": { "model": "deepseek-reasoner" } }"#;
        let settings: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.llm.model, "deepseek-reasoner");
        assert_eq!(settings.llm.max_tokens, 150);
        assert_eq!(settings.admin.admin_id_env, "ADMIN_ID");
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");

        let mut settings = Settings::default();
        settings.admin.admin_id = Some(42);
        settings.dialogue.max_turns = 9;
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(&path).unwrap();
        assert_eq!(loaded.admin.admin_id, Some(42));
        assert_eq!(loaded.dialogue.max_turns, 9);
    }

    #[test]
    fn test_save_preserves_unknown_keys() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "experimental": { "flag": true } }"#).unwrap();

        Settings::default().save_to(&path).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["experimental"]["flag"], true);
        assert_eq!(raw["llm"]["model"], "deepseek-chat");
    }

    #[test]
    fn test_load_missing_file_returns_default() {
        let temp_dir = TempDir::new().unwrap();
        let loaded = Settings::load_from(&temp_dir.path().join("absent.json")).unwrap();
        assert_eq!(loaded.dialogue.max_turns, 7);
    }
}
