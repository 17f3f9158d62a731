/*!
 * Translation session lifecycle.
 *
 * A session owns everything that lives only as long as the user works on
 * a file:
 * - the credential vault and the per-provider credential slots
 * - the key pool with its statuses
 * - the translation cache
 * - the user settings (model, language, chunk size, temperature, prompt)
 *
 * Nothing is persisted; dropping the session drops the keys and the cache.
 */

use std::sync::Arc;

use log::{debug, info, warn};
use uuid::Uuid;

use super::models::{MAX_TEMPERATURE, SessionSettings, TranslationOutcome, TranslationRequest};
use crate::credentials::{CredentialStore, CredentialVault};
use crate::errors::{CredentialError, TranslationError};
use crate::language_utils;
use crate::providers::{DEFAULT_TEMPERATURE, ProviderClient, TranslationProvider};
use crate::subtitle::{self, ParsedDocument, SubtitleBlock};
use crate::translation::formatting::FormatPreserver;
use crate::translation::{
    CacheKey, Clock, KeyPool, KeyStatus, ModelProfile, PipelineSettings, SchedulerConfig, SystemClock,
    TranslationCache, TranslationPipeline,
};

/// Slots at the front of a provider's list that act as primaries
const PRIMARY_SLOTS: usize = 1;

/// One user's translation session
pub struct TranslationSession {
    id: String,
    vault: Arc<CredentialVault>,
    store: CredentialStore,
    pool: KeyPool,
    cache: TranslationCache,
    settings: SessionSettings,
    provider: Box<dyn TranslationProvider>,
    clock: Arc<dyn Clock>,
}

impl TranslationSession {
    /// Create a session talking to the real backend of `settings.model`
    pub fn new(settings: SessionSettings) -> Result<Self, TranslationError> {
        let provider = ProviderClient::for_model(&settings.model)?;
        let vault = CredentialVault::generate()?;
        Ok(Self::with_parts(
            settings,
            Arc::new(vault),
            Box::new(provider),
            Arc::new(SystemClock),
        ))
    }

    /// Create a session from explicit collaborators
    pub fn with_parts(
        settings: SessionSettings,
        vault: Arc<CredentialVault>,
        provider: Box<dyn TranslationProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let id = Uuid::new_v4().to_string();
        info!("Created session {} for model {}", &id[..8], settings.model);

        let mut session = Self {
            id,
            vault,
            store: CredentialStore::new(),
            pool: KeyPool::new(Vec::new(), SchedulerConfig::default()),
            cache: TranslationCache::default(),
            settings,
            provider,
            clock,
        };
        session.settings.chunk_size = session.bounded_chunk_size(session.settings.chunk_size);
        session
    }

    /// Replace the scheduler configuration, keeping the current credentials
    pub fn with_scheduler_config(mut self, config: SchedulerConfig) -> Self {
        self.pool = KeyPool::new(Vec::new(), config);
        self.sync_pool();
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    fn short_id(&self) -> &str {
        &self.id[..8]
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.store
    }

    /// Statuses of the active provider's credentials, in slot order
    pub fn key_statuses(&self) -> Vec<KeyStatus> {
        self.pool.statuses()
    }

    /// Credential family of the configured model
    fn family(&self) -> Result<&'static str, TranslationError> {
        self.settings
            .provider_kind()
            .map(|kind| kind.credential_family())
            .ok_or_else(|| TranslationError::UnsupportedModel(self.settings.model.clone()))
    }

    /// Rebuild the pool from the active provider's valid credentials
    fn sync_pool(&self) {
        match self.family() {
            Ok(family) => self.pool.sync(&self.store.valid_records(family, &self.vault)),
            Err(_) => self.pool.sync(&[]),
        }
    }

    // Credential slots

    pub fn add_key_slot(&mut self, provider: &str) -> usize {
        self.store.add_slot(provider)
    }

    pub fn remove_key_slot(&mut self, provider: &str, index: usize) -> Result<(), CredentialError> {
        self.store.remove_slot(provider, index)?;
        self.sync_pool();
        Ok(())
    }

    /// Validate, encrypt and store a key; a blank value removes the slot
    pub fn update_key(&mut self, provider: &str, index: usize, value: &str) -> Result<(), CredentialError> {
        self.store.update(provider, index, value, &self.vault)?;
        self.sync_pool();
        Ok(())
    }

    /// Append a key after the provider's last slot and return its position
    pub fn add_key(&mut self, provider: &str, value: &str) -> Result<usize, CredentialError> {
        let index = self.store.records(provider).len();
        self.update_key(provider, index, value)?;
        Ok(index)
    }

    pub fn export_credentials(&self) -> Result<String, serde_json::Error> {
        self.store.export_json()
    }

    /// Replace every slot with a previously exported snapshot
    pub fn import_credentials(&mut self, json: &str) -> Result<(), serde_json::Error> {
        self.store = CredentialStore::import_json(json)?;
        self.sync_pool();
        Ok(())
    }

    // Settings

    pub fn clear_cache(&self) {
        self.cache.clear();
        info!("Session {}: cache cleared", self.short_id());
    }

    fn bounded_chunk_size(&self, requested: usize) -> usize {
        ModelProfile::for_model(&self.settings.model).effective_chunk_size(requested)
    }

    /// Set the chunk size, bounded by the model tier; returns the stored value
    pub fn set_chunk_size(&mut self, requested: usize) -> usize {
        let chunk_size = self.bounded_chunk_size(requested);
        if chunk_size != requested {
            debug!("Chunk size {} clamped to {} for {}", requested, chunk_size, self.settings.model);
        }
        self.settings.chunk_size = chunk_size;
        chunk_size
    }

    /// Set the temperature, clamped to the accepted range; returns the stored value
    pub fn set_custom_temperature(&mut self, temperature: f32) -> f32 {
        let temperature = if temperature.is_nan() {
            DEFAULT_TEMPERATURE
        } else {
            temperature.clamp(0.0, MAX_TEMPERATURE)
        };
        self.settings.custom_temperature = Some(temperature);
        temperature
    }

    pub fn clear_custom_temperature(&mut self) {
        self.settings.custom_temperature = None;
    }

    pub fn set_custom_prompt(&mut self, prompt: &str) {
        self.settings.custom_prompt = Some(FormatPreserver::sanitize_prompt_input(prompt));
    }

    pub fn clear_custom_prompt(&mut self) {
        self.settings.custom_prompt = None;
    }

    pub fn set_topic(&mut self, topic: &str) {
        self.settings.topic = FormatPreserver::sanitize_prompt_input(topic);
    }

    pub fn set_target_language(&mut self, target_language: &str) {
        self.settings.target_language = target_language.trim().to_string();
    }

    // Translation

    /// Ask the backend for the language of `text` with the first valid key.
    ///
    /// Detection never fails the session; any problem yields `None`.
    pub async fn detect_language(&self, text: &str) -> Option<String> {
        let family = self.family().ok()?;
        let record = self.store.valid_records(family, &self.vault).into_iter().next()?;
        let credential = self.vault.decrypt(&record);
        if credential.is_empty() {
            return None;
        }

        match self.provider.detect_language(text, &credential).await {
            Ok(reply) => {
                let detected = language_utils::normalize_detected(&reply);
                if detected.is_none() {
                    warn!("Session {}: unrecognised language reply '{}'", self.short_id(), reply.trim());
                }
                detected
            }
            Err(e) => {
                warn!("Session {}: language detection failed: {}", self.short_id(), e);
                None
            }
        }
    }

    /// Parse, translate and render a whole document.
    ///
    /// Fails before any request when the custom prompt is set but empty or
    /// when no credential of the active provider is usable. Provider
    /// failures during the run never fail the document; affected blocks
    /// keep their source text.
    pub async fn translate_document(
        &self,
        request: &TranslationRequest,
        progress: impl FnMut(usize),
    ) -> Result<TranslationOutcome, TranslationError> {
        if let Some(prompt) = &self.settings.custom_prompt {
            if prompt.trim().is_empty() {
                return Err(TranslationError::EmptyCustomPrompt);
            }
        }

        let family = self.family()?;
        let records = self.store.valid_records(family, &self.vault);
        if records.is_empty() {
            return Err(TranslationError::NoValidCredential(family.to_string()));
        }
        self.pool.sync(&records);
        for group in self.pool.groups(PRIMARY_SLOTS) {
            debug!(
                "Session {}: primary {} with {} backups",
                self.short_id(),
                group.primary.ciphertext.get(..8).unwrap_or_default(),
                group.backups.len()
            );
        }

        let settings = &self.settings;
        let temperature = settings.effective_temperature();
        let document_key = CacheKey::document(
            &request.text,
            request.output_format.extension(),
            &settings.target_language,
            &settings.model,
            temperature,
            &settings.topic,
            settings.custom_prompt.as_deref().unwrap_or(""),
        );
        if let Some(output) = self.cache.get(&document_key) {
            info!("Session {}: document served from cache", self.short_id());
            let document = subtitle::parse(&output, request.output_format)?;
            return Ok(TranslationOutcome {
                output,
                document,
                source_language: None,
                report: Default::default(),
                from_cache: true,
            });
        }

        let mut document = subtitle::parse(&request.text, request.input_format)?;
        for block in document.blocks_mut() {
            block.text = FormatPreserver::sanitize_subtitle_text(&block.text);
        }
        info!(
            "Session {}: {} blocks parsed from {} input",
            self.short_id(),
            document.blocks().len(),
            request.input_format
        );

        let source_language = self.detect_language(&sample_text(document.blocks())).await;
        if let Some(code) = &source_language {
            info!("Session {}: detected source language {}", self.short_id(), code);
        }

        let pipeline_settings = PipelineSettings {
            model: settings.model.clone(),
            target_language: language_utils::display_name(&settings.target_language),
            chunk_size: settings.chunk_size,
            context: settings.request_context(),
        };
        let pipeline = TranslationPipeline::new(
            self.provider.as_ref(),
            &self.pool,
            &self.vault,
            &self.cache,
            self.clock.as_ref(),
            pipeline_settings,
        );
        let (blocks, report) = pipeline.run(document.blocks(), progress).await;

        let translated = match document {
            ParsedDocument::Plain(_) => ParsedDocument::Plain(blocks),
            ParsedDocument::Markup { sections, .. } => ParsedDocument::Markup { blocks, sections },
        };
        let output = subtitle::serialize_document(&translated, request.output_format);
        self.cache.put(document_key, &output);

        Ok(TranslationOutcome {
            output,
            document: translated,
            source_language,
            report,
            from_cache: false,
        })
    }
}

/// Non-blank block text joined for language detection
fn sample_text(blocks: &[SubtitleBlock]) -> String {
    blocks
        .iter()
        .filter(|b| !b.is_blank())
        .map(|b| b.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}
