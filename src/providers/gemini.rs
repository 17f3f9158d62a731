use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use super::{RequestContext, TranslationProvider};
use crate::errors::ProviderError;
use crate::translation::profile::ModelProfile;
use crate::translation::prompts;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/";

/// Model used for language detection regardless of the translation model
pub const DETECTION_MODEL: &str = "gemini-2.0-flash";

const MAX_OUTPUT_TOKENS: u32 = 4000;

/// Gemini `generateContent` request
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Part {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

/// Gemini `generateContent` response
#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<Content>,
}

impl GenerateContentRequest {
    pub fn new(prompt: impl Into<String>, temperature: f32) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part { text: prompt.into() }],
                role: Some("user".to_string()),
            }],
            generation_config: GenerationConfig {
                temperature,
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        }
    }
}

/// Client for the Gemini REST API
#[derive(Debug)]
pub struct GeminiClient {
    client: Client,
    model: String,
}

impl GeminiClient {
    pub fn new(model: impl Into<String>) -> Self {
        let model = model.into();
        let profile = ModelProfile::for_model(&model);
        Self {
            client: Client::builder().timeout(profile.timeout).build().unwrap_or_default(),
            model,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(model: &str) -> Result<Url, ProviderError> {
        Url::parse(API_BASE)
            .and_then(|base| base.join(&format!("models/{}:generateContent", model)))
            .map_err(|e| ProviderError::RequestFailed(format!("Invalid Gemini endpoint: {}", e)))
    }

    /// Send one prompt and return the generated text
    pub async fn generate(
        &self,
        model: &str,
        request: &GenerateContentRequest,
        credential: &str,
    ) -> Result<String, ProviderError> {
        let url = Self::endpoint(model)?;
        debug!("Sending request to Gemini API for model {}", model);

        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", credential)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Gemini API error ({}): {}", status, error_text);
            return Err(ProviderError::from_status(status.as_u16(), error_text));
        }

        let body = response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse Gemini API response: {}", e)))?;

        Ok(Self::extract_text(&body))
    }

    /// Concatenated text parts of the first candidate
    pub fn extract_text(response: &GenerateContentResponse) -> String {
        response
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| content.parts.iter().map(|p| p.text.as_str()).collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TranslationProvider for GeminiClient {
    async fn translate(
        &self,
        text: &str,
        target_language: &str,
        credential: &str,
        context: &RequestContext,
    ) -> Result<String, ProviderError> {
        let prompt = prompts::translation_prompt(text, target_language, &context.topic, context.custom_prompt.as_deref());
        let request = GenerateContentRequest::new(prompt, context.temperature);
        self.generate(&self.model, &request, credential).await
    }

    async fn detect_language(&self, text: &str, credential: &str) -> Result<String, ProviderError> {
        let request = GenerateContentRequest::new(prompts::detection_prompt(text), super::DEFAULT_TEMPERATURE);
        let detected = self.generate(DETECTION_MODEL, &request, credential).await?;
        Ok(detected.trim().to_string())
    }
}
