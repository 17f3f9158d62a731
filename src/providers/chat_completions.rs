use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{ProviderKind, RequestContext, TranslationProvider, DEFAULT_TEMPERATURE};
use crate::errors::ProviderError;
use crate::translation::profile::ModelProfile;
use crate::translation::prompts;

/// Chat completions request
#[derive(Debug, Serialize)]
pub struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Chat completions response
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: Option<ChatMessage>,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>, temperature: f32) -> Self {
        Self {
            model: model.into(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.into(),
            }],
            temperature,
        }
    }
}

/// Client for OpenAI-compatible chat completion backends
#[derive(Debug)]
pub struct ChatCompletionsClient {
    client: Client,
    kind: ProviderKind,
}

impl ChatCompletionsClient {
    pub fn new(kind: ProviderKind, model: &str) -> Self {
        let profile = ModelProfile::for_model(model);
        Self {
            client: Client::builder().timeout(profile.timeout).build().unwrap_or_default(),
            kind,
        }
    }

    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    /// Endpoint and remote model name of the backend
    fn target(&self) -> (&'static str, &'static str) {
        match self.kind {
            ProviderKind::Grok => ("https://api.x.ai/v1/chat/completions", "grok-3-beta"),
            ProviderKind::DeepSeek => ("https://api.deepseek.com/v1/chat/completions", "deepseek-chat"),
            ProviderKind::ChatGpt | ProviderKind::Gemini => ("https://api.openai.com/v1/chat/completions", "gpt-4o"),
        }
    }

    async fn complete(&self, prompt: String, temperature: f32, credential: &str) -> Result<String, ProviderError> {
        let (url, model) = self.target();
        let request = ChatRequest::new(model, prompt, temperature);
        debug!("Sending request to {} API for model {}", self.kind, model);

        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .bearer_auth(credential)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("{} API error ({}): {}", self.kind, status, error_text);
            return Err(ProviderError::from_status(status.as_u16(), error_text));
        }

        let body = response
            .json::<ChatResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse {} API response: {}", self.kind, e)))?;

        Ok(Self::extract_text(&body))
    }

    /// Content of the first choice, empty when absent
    pub fn extract_text(response: &ChatResponse) -> String {
        response
            .choices
            .first()
            .and_then(|c| c.message.as_ref())
            .map(|m| m.content.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TranslationProvider for ChatCompletionsClient {
    async fn translate(
        &self,
        text: &str,
        target_language: &str,
        credential: &str,
        context: &RequestContext,
    ) -> Result<String, ProviderError> {
        let prompt = prompts::translation_prompt(text, target_language, &context.topic, context.custom_prompt.as_deref());
        self.complete(prompt, context.temperature, credential).await
    }

    async fn detect_language(&self, text: &str, credential: &str) -> Result<String, ProviderError> {
        let detected = self
            .complete(prompts::detection_prompt(text), DEFAULT_TEMPERATURE, credential)
            .await?;
        Ok(detected.trim().to_string())
    }
}
