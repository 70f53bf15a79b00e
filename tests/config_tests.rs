// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use tempfile::TempDir;

use contest_assistant::config::Settings;
use contest_assistant::BotError;

#[test]
fn test_settings_default_values() {
    let settings = Settings::default();

    assert_eq!(settings.llm.base_url, "https://api.deepseek.com/v1");
    assert_eq!(settings.llm.model, "deepseek-chat");
    assert_eq!(settings.llm.max_tokens, 150);
    assert_eq!(settings.dialogue.max_turns, 7);
    assert_eq!(settings.storage.database_file, "contests.db");
    assert_eq!(settings.storage.files_dir, "contests_files");
    assert!(settings.admin.admin_id.is_none());
}

#[test]
fn test_default_departments_order() {
    let settings = Settings::default();
    assert_eq!(
        settings.storage.default_departments[0],
        "Пожарная безопасность"
    );
    assert_eq!(settings.storage.default_departments[5], "Робототехника");
}

#[test]
fn test_settings_token_priority() {
    // Custom env var names keep parallel tests apart
    let mut settings = Settings::default();
    settings.telegram.token_env = "CONTEST_TEST_TOKEN_71234".to_string();
    settings.telegram.token = Some("config-token".to_string());

    std::env::remove_var("CONTEST_TEST_TOKEN_71234");
    assert_eq!(
        settings.get_telegram_token(),
        Some("config-token".to_string())
    );

    std::env::set_var("CONTEST_TEST_TOKEN_71234", "env-token");
    assert_eq!(settings.get_telegram_token(), Some("env-token".to_string()));

    // Blank env values fall back to the file
    std::env::set_var("CONTEST_TEST_TOKEN_71234", "  ");
    assert_eq!(
        settings.get_telegram_token(),
        Some("config-token".to_string())
    );

    std::env::remove_var("CONTEST_TEST_TOKEN_71234");
}

#[test]
fn test_settings_admin_id_priority() {
    let mut settings = Settings::default();
    settings.admin.admin_id_env = "CONTEST_TEST_ADMIN_71234".to_string();
    settings.admin.admin_id = Some(7);

    std::env::set_var("CONTEST_TEST_ADMIN_71234", "12345");
    assert_eq!(settings.get_admin_id(), Some(12345));

    std::env::set_var("CONTEST_TEST_ADMIN_71234", "not-a-number");
    assert_eq!(settings.get_admin_id(), Some(7));

    std::env::remove_var("CONTEST_TEST_ADMIN_71234");
    assert_eq!(settings.get_admin_id(), Some(7));
}

#[test]
fn test_validate_lists_missing_credentials() {
    let mut settings = Settings::default();
    settings.telegram.token_env = "CONTEST_TEST_UNSET_TOKEN_71234".to_string();
    settings.admin.admin_id_env = "CONTEST_TEST_UNSET_ADMIN_71234".to_string();
    settings.llm.api_key_env = "CONTEST_TEST_UNSET_KEY_71234".to_string();

    let err = settings.validate().unwrap_err();
    match err {
        BotError::Config(message) => {
            assert!(message.contains("CONTEST_TEST_UNSET_TOKEN_71234"));
            assert!(message.contains("CONTEST_TEST_UNSET_ADMIN_71234"));
            assert!(message.contains("CONTEST_TEST_UNSET_KEY_71234"));
        }
        other => panic!("unexpected error: {other}"),
    }

    settings.telegram.token = Some("t".to_string());
    settings.admin.admin_id = Some(1);
    settings.llm.api_key = Some("k".to_string());
    assert!(settings.validate().is_ok());

    settings.dialogue.max_turns = 1;
    assert!(settings.validate().is_err());
}

#[test]
fn test_load_keeps_unknown_sections_out_of_settings() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("settings.json");
    std::fs::write(
        &path,
        r#"{ "llm": { "max_tokens": 300 }, "deepseek": { "model": "other" } }"#,
    )
    .unwrap();

    let settings = Settings::load_from(&path).unwrap();
    assert_eq!(settings.llm.max_tokens, 300);
    assert_eq!(settings.llm.model, "deepseek-chat");
}

#[test]
fn test_load_invalid_json_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("settings.json");
    std::fs::write(&path, "{ not json").unwrap();

    assert!(matches!(
        Settings::load_from(&path),
        Err(BotError::Json(_))
    ));
}

#[test]
fn test_storage_paths_follow_data_dir() {
    let temp_dir = TempDir::new().unwrap();
    let mut settings = Settings::default();
    settings.storage.data_dir = Some(temp_dir.path().to_path_buf());

    assert_eq!(
        settings.database_path(),
        temp_dir.path().join("contests.db")
    );
    assert_eq!(settings.files_dir(), temp_dir.path().join("contests_files"));
}
