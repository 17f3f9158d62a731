/*!
 * Tests for app configuration functionality
 */

use anyhow::Result;
use log::LevelFilter;

use lingosub::app_config::{Config, LogLevel};
use lingosub::providers::ProviderKind;
use lingosub::translation::SchedulerConfig;

use crate::common;

/// Test a missing config file is created with the defaults
#[test]
fn test_load_or_create_withMissingFile_shouldWriteDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("conf.json");

    let config = Config::load_or_create(&path)?;

    assert!(path.exists());
    assert_eq!(config, Config::default());
    assert_eq!(Config::load_or_create(&path)?, config);
    Ok(())
}

/// Test a saved config reads back unchanged
#[test]
fn test_save_thenLoad_shouldRoundTripEveryField() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("custom.json");

    let mut config = Config::default();
    config.target_language = "es".to_string();
    config.translation.model = "deepseek-chat".to_string();
    config.translation.chunk_size = 4;
    config.translation.temperature = Some(1.2);
    config.translation.custom_prompt = Some("Keep it casual".to_string());
    config.output_format = Some("vtt".to_string());
    config.log_level = LogLevel::Debug;
    config.scheduler = SchedulerConfig {
        max_attempts: 4,
        rate_limit_cooldown_ms: 500,
        exhausted_cooldown_ms: 10_000,
    };
    config.add_api_keys([common::test_key(1)]);
    config.save(&path)?;

    let loaded = Config::load_or_create(&path)?;
    assert_eq!(loaded, config);
    assert!(loaded.validate().is_ok());
    assert_eq!(loaded.active_api_keys(), &[common::test_key(1)]);
    Ok(())
}

/// Test a config file with broken JSON is reported, not replaced
#[test]
fn test_load_or_create_withInvalidJson_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "conf.json", "{ not json")?;

    assert!(Config::load_or_create(&path).is_err());
    assert_eq!(std::fs::read_to_string(&path)?, "{ not json");
    Ok(())
}

/// Test keys are looked up for the active model's provider only
#[test]
fn test_active_api_keys_shouldFollowModelFamily() -> Result<()> {
    let config: Config = serde_json::from_str(
        r#"{
            "target_language": "fa",
            "translation": { "model": "chatgpt-4o-latest" },
            "api_keys": { "gemini": ["gemini-key-0000000000001"], "chatgpt": ["openai-key-000000000000001"] }
        }"#,
    )?;

    assert_eq!(config.provider_kind(), Some(ProviderKind::ChatGpt));
    assert_eq!(config.active_api_keys(), &["openai-key-000000000000001".to_string()]);
    Ok(())
}

/// Test session settings carry the translation section over
#[test]
fn test_session_settings_shouldMirrorTranslationConfig() {
    let mut config = Config::default();
    config.target_language = "de".to_string();
    config.translation.topic = "Nature documentary".to_string();
    config.translation.chunk_size = 3;

    let settings = config.session_settings();

    assert_eq!(settings.model, config.translation.model);
    assert_eq!(settings.target_language, "de");
    assert_eq!(settings.topic, "Nature documentary");
    assert_eq!(settings.chunk_size, 3);
    assert_eq!(settings.custom_temperature, None);
}

/// Test validation of the scheduler and chunk settings
#[test]
fn test_validate_withZeroBudgets_shouldFail() {
    let mut config = Config::default();
    config.translation.chunk_size = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.scheduler.max_attempts = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.translation.temperature = Some(2.0);
    assert!(config.validate().is_ok());
}

/// Test log levels map onto the logger's filters
#[test]
fn test_log_level_shouldConvertToLevelFilter() {
    assert_eq!(LevelFilter::from(LogLevel::Error), LevelFilter::Error);
    assert_eq!(LevelFilter::from(LogLevel::Trace), LevelFilter::Trace);
    assert_eq!(LevelFilter::from(LogLevel::default()), LevelFilter::Info);
}
