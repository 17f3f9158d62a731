/*!
 * Mock provider implementations for testing.
 *
 * `MockProvider` simulates different backend behaviors without network
 * access:
 * - `MockProvider::working()` - Always succeeds, tagging each line with the target language
 * - `MockProvider::rate_limited_keys(..)` - Answers 429 for the listed credentials
 * - `MockProvider::failing()` - Always fails with an error
 *
 * Marker lines (`<<ENTRY_n>>`, `<<END>>`) are passed through unchanged so
 * batched requests can be split again.
 */

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{RequestContext, TranslationProvider};
use crate::errors::ProviderError;

/// Behavior mode for the mock provider
#[derive(Debug, Clone, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with a proper translation
    Working,
    /// Succeeds but drops every marker after the first
    PartialMarkers,
    /// Fails every Nth request with a server error
    Intermittent { fail_every: usize },
    /// Always fails with a server error
    Failing,
    /// Always answers with a rate limit
    RateLimited,
    /// Rate limits requests made with any of these credentials
    RateLimitedKeys(Vec<String>),
    /// Returns an empty response
    Empty,
    /// Waits before answering
    Slow { delay_ms: u64 },
}

/// Mock provider for testing translation behavior
#[derive(Debug, Clone)]
pub struct MockProvider {
    behavior: MockBehavior,
    /// Shared between clones
    request_count: Arc<AtomicUsize>,
    /// Credentials in the order they were used
    credentials: Arc<Mutex<Vec<String>>>,
    detected_language: String,
}

impl MockProvider {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            credentials: Arc::new(Mutex::new(Vec::new())),
            detected_language: "en".to_string(),
        }
    }

    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    pub fn partial_markers() -> Self {
        Self::new(MockBehavior::PartialMarkers)
    }

    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every })
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    pub fn rate_limited() -> Self {
        Self::new(MockBehavior::RateLimited)
    }

    pub fn rate_limited_keys<S: Into<String>>(keys: impl IntoIterator<Item = S>) -> Self {
        Self::new(MockBehavior::RateLimitedKeys(keys.into_iter().map(Into::into).collect()))
    }

    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    /// Language code returned by `detect_language`
    pub fn with_detected_language(mut self, code: impl Into<String>) -> Self {
        self.detected_language = code.into();
        self
    }

    /// Number of translate calls so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Credentials passed to translate, oldest first
    pub fn used_credentials(&self) -> Vec<String> {
        self.credentials.lock().clone()
    }

    /// The translation the working mode produces: `[lang] line` per text line
    pub fn translate_lines(text: &str, target_language: &str) -> String {
        text.lines()
            .map(|line| {
                if line.starts_with("<<") || line.trim().is_empty() {
                    line.to_string()
                } else {
                    format!("[{}] {}", target_language, line)
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[async_trait]
impl TranslationProvider for MockProvider {
    async fn translate(
        &self,
        text: &str,
        target_language: &str,
        credential: &str,
        _context: &RequestContext,
    ) -> Result<String, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        self.credentials.lock().push(credential.to_string());

        match &self.behavior {
            MockBehavior::Working => Ok(Self::translate_lines(text, target_language)),

            MockBehavior::PartialMarkers => {
                let mut seen_marker = false;
                let kept: Vec<_> = text
                    .lines()
                    .filter(|line| {
                        if line.starts_with("<<ENTRY_") {
                            let keep = !seen_marker;
                            seen_marker = true;
                            keep
                        } else {
                            true
                        }
                    })
                    .collect();
                Ok(Self::translate_lines(&kept.join("\n"), target_language))
            }

            MockBehavior::Intermittent { fail_every } => {
                if count % fail_every == fail_every - 1 {
                    Err(ProviderError::ApiError {
                        message: format!("Simulated intermittent failure (request #{})", count + 1),
                        status_code: 503,
                    })
                } else {
                    Ok(Self::translate_lines(text, target_language))
                }
            }

            MockBehavior::Failing => Err(ProviderError::ApiError {
                message: "Simulated provider failure".to_string(),
                status_code: 500,
            }),

            MockBehavior::RateLimited => Err(ProviderError::RateLimitExceeded("Simulated 429".to_string())),

            MockBehavior::RateLimitedKeys(keys) => {
                if keys.iter().any(|k| k == credential) {
                    Err(ProviderError::RateLimitExceeded("Simulated 429".to_string()))
                } else {
                    Ok(Self::translate_lines(text, target_language))
                }
            }

            MockBehavior::Empty => Ok(String::new()),

            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(tokio::time::Duration::from_millis(*delay_ms)).await;
                Ok(Self::translate_lines(text, target_language))
            }
        }
    }

    async fn detect_language(&self, _text: &str, _credential: &str) -> Result<String, ProviderError> {
        match self.behavior {
            MockBehavior::Failing => Err(ProviderError::ConnectionError("Simulated outage".to_string())),
            _ => Ok(self.detected_language.clone()),
        }
    }
}
