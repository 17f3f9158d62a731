use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use log::{LevelFilter, warn};
use serde::{Deserialize, Serialize};

use crate::providers::ProviderKind;
use crate::session::SessionSettings;
use crate::session::models::MAX_TEMPERATURE;
use crate::subtitle::SubtitleFormat;
use crate::translation::SchedulerConfig;

/// Application configuration module
/// This module handles loading, validating and saving the configuration
/// file, and turning it into session settings.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Target language code (ISO)
    pub target_language: String,

    /// Translation settings
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Plaintext keys per provider family, primary first
    #[serde(default)]
    pub api_keys: BTreeMap<String, Vec<String>>,

    /// Key pool retry budget and cooldowns
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Output format extension; the input format when unset
    #[serde(default)]
    pub output_format: Option<String>,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TranslationConfig {
    /// Model name, decides the backend
    #[serde(default = "default_model")]
    pub model: String,

    /// What the video is about
    #[serde(default)]
    pub topic: String,

    /// Blocks per request, bounded by the model tier
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Sampling temperature; the provider default when unset
    #[serde(default)]
    pub temperature: Option<f32>,

    /// Replaces the built-in prompt when set
    #[serde(default)]
    pub custom_prompt: Option<String>,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            topic: String::new(),
            chunk_size: default_chunk_size(),
            temperature: None,
            custom_prompt: None,
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_chunk_size() -> usize {
    1
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        crate::language_utils::get_language_name(&self.target_language)?;

        if ProviderKind::from_model(&self.translation.model).is_none() {
            return Err(anyhow!("Unsupported model: {}", self.translation.model));
        }

        if self.translation.chunk_size == 0 {
            return Err(anyhow!("Chunk size must be at least 1"));
        }

        if let Some(temperature) = self.translation.temperature {
            if !(0.0..=MAX_TEMPERATURE).contains(&temperature) {
                return Err(anyhow!(
                    "Temperature must be between 0 and {}, got {}",
                    MAX_TEMPERATURE,
                    temperature
                ));
            }
        }

        if let Some(prompt) = &self.translation.custom_prompt {
            if prompt.trim().is_empty() {
                return Err(anyhow!("Custom prompt is enabled but empty"));
            }
        }

        if let Some(format) = &self.output_format {
            SubtitleFormat::from_extension(format)?;
        }

        if self.scheduler.max_attempts == 0 {
            return Err(anyhow!("Scheduler needs at least one attempt"));
        }

        Ok(())
    }

    /// Load a configuration file, writing the defaults if it does not exist
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let file = File::open(path).with_context(|| format!("Failed to open config file: {:?}", path))?;
            let reader = BufReader::new(file);
            serde_json::from_reader(reader).with_context(|| format!("Failed to parse config file: {:?}", path))
        } else {
            warn!("Config file not found at {:?}, creating default config.", path);
            let config = Self::default();
            config.save(path)?;
            Ok(config)
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config to JSON")?;
        std::fs::write(path, json).with_context(|| format!("Failed to write config file: {:?}", path))
    }

    /// Provider family of the configured model
    pub fn provider_kind(&self) -> Option<ProviderKind> {
        ProviderKind::from_model(&self.translation.model)
    }

    /// Keys configured for the active model's provider
    pub fn active_api_keys(&self) -> &[String] {
        self.provider_kind()
            .and_then(|kind| self.api_keys.get(kind.credential_family()))
            .map_or(&[], Vec::as_slice)
    }

    /// Append keys for the active provider, skipping duplicates
    pub fn add_api_keys<I, S>(&mut self, keys: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let Some(kind) = self.provider_kind() else {
            return;
        };
        let slots = self.api_keys.entry(kind.credential_family().to_string()).or_default();
        for key in keys {
            let key = key.as_ref().trim();
            if !key.is_empty() && !slots.iter().any(|k| k == key) {
                slots.push(key.to_string());
            }
        }
    }

    /// Output format for an input in `input`
    pub fn output_format_for(&self, input: SubtitleFormat) -> Result<SubtitleFormat> {
        match &self.output_format {
            Some(format) => Ok(SubtitleFormat::from_extension(format)?),
            None => Ok(input),
        }
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            model: self.translation.model.clone(),
            target_language: self.target_language.clone(),
            topic: self.translation.topic.clone(),
            chunk_size: self.translation.chunk_size,
            custom_temperature: self.translation.temperature,
            custom_prompt: self.translation.custom_prompt.clone(),
        }
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            target_language: "fa".to_string(),
            translation: TranslationConfig::default(),
            api_keys: BTreeMap::new(),
            scheduler: SchedulerConfig::default(),
            output_format: None,
            log_level: LogLevel::default(),
        }
    }
}
