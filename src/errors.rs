/*!
 * Error types for the lingosub engine.
 *
 * Each component has its own error enum built with thiserror. `AppError`
 * wraps all of them for the binary and the controller.
 */

use thiserror::Error;

/// Errors that can occur when talking to a translation backend
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The request did not complete within the model's time budget
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

impl ProviderError {
    /// Map a non-success HTTP status to the matching variant
    pub fn from_status(status_code: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status_code {
            429 => Self::RateLimitExceeded(message),
            401 | 403 => Self::AuthenticationError(message),
            _ => Self::ApiError { status_code, message },
        }
    }

    /// Whether the scheduler should treat this failure as a rate limit
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Self::RateLimitExceeded(_))
            || matches!(self, Self::ApiError { status_code: 429, .. })
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout(error.to_string())
        } else if error.is_connect() {
            Self::ConnectionError(error.to_string())
        } else if error.is_decode() {
            Self::ParseError(error.to_string())
        } else if let Some(status) = error.status() {
            Self::from_status(status.as_u16(), error.to_string())
        } else {
            Self::RequestFailed(error.to_string())
        }
    }
}

/// Errors that can occur while parsing or rendering subtitle documents
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubtitleError {
    /// The file extension does not map to a known grammar
    #[error("Unsupported subtitle format: {0}")]
    UnsupportedFormat(String),

    /// A timestamp did not match the accepted grammar
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// A WebVTT document without its header line
    #[error("WebVTT document must start with a WEBVTT header")]
    MissingWebVttHeader,

    /// The document structure could not be read at all
    #[error("Malformed {format} document: {message}")]
    Malformed {
        /// Format being parsed
        format: &'static str,
        /// What went wrong
        message: String,
    },
}

/// Errors raised by the credential vault and store
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CredentialError {
    /// The key does not have the accepted provider key shape
    #[error("Invalid API key format")]
    InvalidFormat,

    /// A record field is missing or blank
    #[error("Credential record is missing its {0}")]
    MissingField(&'static str),

    /// The nonce does not decode to the expected length
    #[error("Invalid nonce length: {0}")]
    InvalidNonce(usize),

    /// The integrity tag does not match the record
    #[error("Credential integrity check failed")]
    Integrity,

    /// One of the cipher layers refused to decrypt
    #[error("Credential decryption failed: {0}")]
    Decryption(String),

    /// One of the cipher layers refused to encrypt
    #[error("Credential encryption failed: {0}")]
    Encryption(String),

    /// The session key pair could not be generated
    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    /// A slot index outside the provider's list
    #[error("No credential slot {index} for provider {provider}")]
    UnknownSlot {
        /// Provider family name
        provider: String,
        /// Requested slot
        index: usize,
    },
}

/// Errors that can occur during translation
#[derive(Error, Debug)]
pub enum TranslationError {
    /// No credential of the active provider survived validation
    #[error("No valid API key available for {0}")]
    NoValidCredential(String),

    /// The model name does not belong to a known backend
    #[error("Unsupported model: {0}")]
    UnsupportedModel(String),

    /// A custom prompt was requested but left empty
    #[error("Custom prompt is enabled but empty")]
    EmptyCustomPrompt,

    /// A batched response did not contain one segment per block
    #[error("Expected {expected} translated entries, found {found}")]
    MarkerMismatch {
        /// Blocks sent
        expected: usize,
        /// Segments recovered
        found: usize,
    },

    /// Error from the provider API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error with subtitle processing
    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),

    /// Error with credential handling
    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from subtitle processing
    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),

    /// Error from credential handling
    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
