/*!
 * Session settings and request/result types.
 */

use serde::{Deserialize, Serialize};

use crate::providers::{DEFAULT_TEMPERATURE, ProviderKind, RequestContext};
use crate::subtitle::{ParsedDocument, SubtitleFormat};
use crate::translation::PipelineReport;

/// Highest temperature accepted from the user
pub const MAX_TEMPERATURE: f32 = 2.0;

/// User settings of one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Model name, decides the backend
    pub model: String,
    /// Target language code
    pub target_language: String,
    /// What the video is about
    #[serde(default)]
    pub topic: String,
    /// Requested blocks per chunk
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Overrides the default temperature when set
    #[serde(default)]
    pub custom_temperature: Option<f32>,
    /// Replaces the built-in prompt when set
    #[serde(default)]
    pub custom_prompt: Option<String>,
}

fn default_chunk_size() -> usize {
    1
}

impl SessionSettings {
    pub fn new(model: impl Into<String>, target_language: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            target_language: target_language.into(),
            topic: String::new(),
            chunk_size: default_chunk_size(),
            custom_temperature: None,
            custom_prompt: None,
        }
    }

    pub fn effective_temperature(&self) -> f32 {
        self.custom_temperature.unwrap_or(DEFAULT_TEMPERATURE)
    }

    pub fn provider_kind(&self) -> Option<ProviderKind> {
        ProviderKind::from_model(&self.model)
    }

    /// Context passed to every provider request
    pub fn request_context(&self) -> RequestContext {
        RequestContext {
            topic: self.topic.clone(),
            custom_prompt: self.custom_prompt.clone(),
            temperature: self.effective_temperature(),
        }
    }
}

/// One whole-document translation
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationRequest {
    /// Raw file contents
    pub text: String,
    pub input_format: SubtitleFormat,
    pub output_format: SubtitleFormat,
}

impl TranslationRequest {
    /// Translate and render in the same format
    pub fn new(text: impl Into<String>, format: SubtitleFormat) -> Self {
        Self {
            text: text.into(),
            input_format: format,
            output_format: format,
        }
    }

    pub fn with_output_format(mut self, format: SubtitleFormat) -> Self {
        self.output_format = format;
        self
    }
}

/// Result of a whole-document translation
#[derive(Debug, Clone)]
pub struct TranslationOutcome {
    /// Rendered output file
    pub output: String,
    /// Translated document, available for editing
    pub document: ParsedDocument,
    /// Detected source language, if detection succeeded
    pub source_language: Option<String>,
    pub report: PipelineReport,
    /// True when the whole output came from the document cache
    pub from_cache: bool,
}
