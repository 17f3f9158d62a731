/*!
 * Provider implementations for different translation services.
 *
 * Every backend is reached through the `TranslationProvider` trait:
 * - `gemini`: Google Gemini `generateContent` API
 * - `chat_completions`: OpenAI-style chat completions (Grok, ChatGPT, DeepSeek)
 * - `mock`: scripted provider for tests and dry runs
 *
 * The backend is chosen once from the model name; `ProviderClient` is the
 * closed set of real backends.
 */

use std::fmt::{self, Debug};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::{ProviderError, TranslationError};

pub mod chat_completions;
pub mod gemini;
pub mod mock;

use chat_completions::ChatCompletionsClient;
use gemini::GeminiClient;

/// Temperature used when the user has not set one
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Per-request settings passed along with the text
#[derive(Debug, Clone, PartialEq)]
pub struct RequestContext {
    /// What the video is about, woven into the prompt
    pub topic: String,
    /// Replaces the built-in prompt when set
    pub custom_prompt: Option<String>,
    pub temperature: f32,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self {
            topic: String::new(),
            custom_prompt: None,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

/// Common trait for all translation backends
///
/// Implementations must report HTTP 429 (or the backend's equivalent) as
/// `ProviderError::RateLimitExceeded` so the scheduler can fail over.
#[async_trait]
pub trait TranslationProvider: Send + Sync + Debug {
    /// Translate `text` into `target_language` using the plaintext `credential`
    async fn translate(
        &self,
        text: &str,
        target_language: &str,
        credential: &str,
        context: &RequestContext,
    ) -> Result<String, ProviderError>;

    /// Ask the backend which language `text` is written in
    async fn detect_language(&self, text: &str, credential: &str) -> Result<String, ProviderError>;
}

/// Backend family of a model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Gemini,
    Grok,
    #[serde(rename = "chatgpt")]
    ChatGpt,
    DeepSeek,
}

impl ProviderKind {
    /// Map a model name to its backend; `None` for unknown models
    pub fn from_model(model: &str) -> Option<Self> {
        let model = model.trim().to_lowercase();
        if model.contains("gemini") {
            Some(Self::Gemini)
        } else if model.contains("grok") {
            Some(Self::Grok)
        } else if model.contains("chatgpt") || model.starts_with("gpt") {
            Some(Self::ChatGpt)
        } else if model.contains("deepseek") {
            Some(Self::DeepSeek)
        } else {
            None
        }
    }

    /// Name under which this backend's credentials are stored
    pub fn credential_family(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::Grok => "grok",
            Self::ChatGpt => "chatgpt",
            Self::DeepSeek => "deepseek",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.credential_family())
    }
}

/// The real HTTP backends
#[derive(Debug)]
pub enum ProviderClient {
    Gemini(GeminiClient),
    ChatCompletions(ChatCompletionsClient),
}

impl ProviderClient {
    /// Build the client that serves `model`
    pub fn for_model(model: &str) -> Result<Self, TranslationError> {
        match ProviderKind::from_model(model) {
            Some(ProviderKind::Gemini) => Ok(Self::Gemini(GeminiClient::new(model))),
            Some(kind) => Ok(Self::ChatCompletions(ChatCompletionsClient::new(kind, model))),
            None => Err(TranslationError::UnsupportedModel(model.to_string())),
        }
    }

    pub fn kind(&self) -> ProviderKind {
        match self {
            Self::Gemini(_) => ProviderKind::Gemini,
            Self::ChatCompletions(client) => client.kind(),
        }
    }
}

#[async_trait]
impl TranslationProvider for ProviderClient {
    async fn translate(
        &self,
        text: &str,
        target_language: &str,
        credential: &str,
        context: &RequestContext,
    ) -> Result<String, ProviderError> {
        match self {
            Self::Gemini(client) => client.translate(text, target_language, credential, context).await,
            Self::ChatCompletions(client) => client.translate(text, target_language, credential, context).await,
        }
    }

    async fn detect_language(&self, text: &str, credential: &str) -> Result<String, ProviderError> {
        match self {
            Self::Gemini(client) => client.detect_language(text, credential).await,
            Self::ChatCompletions(client) => client.detect_language(text, credential).await,
        }
    }
}
