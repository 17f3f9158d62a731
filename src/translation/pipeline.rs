/*!
 * Chunked translation of a block sequence.
 *
 * Blocks are grouped into chunks of the configured size (bounded by the
 * model profile) and processed strictly in order. A chunk is split into
 * sub-chunks that each travel as one marked request. When a sub-chunk
 * fails, its blocks are retried one by one; a block that still fails keeps
 * its source text. Progress is reported after every chunk.
 */

use log::{debug, info, warn};

use super::cache::{CacheKey, TranslationCache};
use super::clock::Clock;
use super::formatting::FormatPreserver;
use super::profile::ModelProfile;
use super::prompts;
use super::scheduler::{Dispatch, KeyPool};
use crate::credentials::CredentialVault;
use crate::errors::{ProviderError, TranslationError};
use crate::providers::{RequestContext, TranslationProvider};
use crate::subtitle::SubtitleBlock;

/// What to translate into and how
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    pub model: String,
    pub target_language: String,
    /// Requested blocks per chunk, clamped by the model profile
    pub chunk_size: usize,
    pub context: RequestContext,
}

/// Counters of one pipeline run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineReport {
    /// Blocks processed
    pub blocks: usize,
    /// Blocks that received a translation, cached ones included
    pub translated: usize,
    /// Blocks served from the cache
    pub cached: usize,
    /// Blocks that kept their source text after failing individually
    pub fallbacks: usize,
    /// Blocks passed through because every credential was rate limited
    pub degraded: usize,
}

/// Result of one scheduled request
enum Outcome {
    Translated(String),
    Degraded,
}

/// Drives provider requests for a block sequence
pub struct TranslationPipeline<'a, P: TranslationProvider + ?Sized> {
    provider: &'a P,
    pool: &'a KeyPool,
    vault: &'a CredentialVault,
    cache: &'a TranslationCache,
    clock: &'a dyn Clock,
    settings: PipelineSettings,
    profile: ModelProfile,
}

impl<'a, P: TranslationProvider + ?Sized> TranslationPipeline<'a, P> {
    pub fn new(
        provider: &'a P,
        pool: &'a KeyPool,
        vault: &'a CredentialVault,
        cache: &'a TranslationCache,
        clock: &'a dyn Clock,
        settings: PipelineSettings,
    ) -> Self {
        let profile = ModelProfile::for_model(&settings.model);
        Self {
            provider,
            pool,
            vault,
            cache,
            clock,
            settings,
            profile,
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.profile.effective_chunk_size(self.settings.chunk_size)
    }

    /// Translate `blocks` in order, calling `progress` with the running
    /// count of processed blocks after each chunk
    pub async fn run(
        &self,
        blocks: &[SubtitleBlock],
        mut progress: impl FnMut(usize),
    ) -> (Vec<SubtitleBlock>, PipelineReport) {
        let chunk_size = self.chunk_size();
        let mut report = PipelineReport::default();
        let mut output = Vec::with_capacity(blocks.len());

        info!(
            "Translating {} blocks into {} with {} (chunk size {})",
            blocks.len(),
            self.settings.target_language,
            self.settings.model,
            chunk_size
        );

        for (chunk_index, chunk) in blocks.chunks(chunk_size).enumerate() {
            let offset = chunk_index * chunk_size;
            let translated = self.process_chunk(chunk, offset, &mut report).await;
            output.extend(translated);
            report.blocks += chunk.len();
            progress(report.blocks);
        }

        info!(
            "Translation finished: {} blocks, {} translated ({} cached), {} fallbacks, {} degraded",
            report.blocks, report.translated, report.cached, report.fallbacks, report.degraded
        );
        (output, report)
    }

    async fn process_chunk(
        &self,
        chunk: &[SubtitleBlock],
        offset: usize,
        report: &mut PipelineReport,
    ) -> Vec<SubtitleBlock> {
        if chunk.iter().all(SubtitleBlock::is_blank) {
            debug!("Chunk at {} is blank; skipping request", offset);
            return chunk.iter().map(with_empty_text).collect();
        }

        let bound = self.profile.max_chunk_size;
        let mut output = Vec::with_capacity(chunk.len());
        for (i, sub_chunk) in chunk.chunks(bound).enumerate() {
            let sub_offset = offset + i * bound;
            match self.translate_sub_chunk(sub_chunk, sub_offset, report).await {
                Ok(blocks) => output.extend(blocks),
                Err(e) => {
                    warn!("Sub-chunk at {} failed ({}); retrying blocks one by one", sub_offset, e);
                    output.extend(self.translate_individually(sub_chunk, sub_offset, report).await);
                }
            }
        }
        output
    }

    /// Translate a sub-chunk as one request; cached and blank blocks are not sent
    async fn translate_sub_chunk(
        &self,
        sub_chunk: &[SubtitleBlock],
        offset: usize,
        report: &mut PipelineReport,
    ) -> Result<Vec<SubtitleBlock>, TranslationError> {
        let mut output: Vec<SubtitleBlock> = Vec::with_capacity(sub_chunk.len());
        let mut pending = Vec::new();
        let mut hits = 0;

        for (i, block) in sub_chunk.iter().enumerate() {
            if block.is_blank() {
                output.push(with_empty_text(block));
            } else if let Some(cached) = self.cached(offset + i, &block.text) {
                hits += 1;
                output.push(with_text(block, cached));
            } else {
                pending.push(i);
                output.push(block.clone());
            }
        }

        let texts: Vec<&str> = pending.iter().map(|&i| sub_chunk[i].text.as_str()).collect();
        let translations = match texts.as_slice() {
            [] => Some(Vec::new()),
            [single] => match self.translate_text(single).await? {
                Outcome::Translated(text) => Some(vec![text]),
                Outcome::Degraded => None,
            },
            many => match self.translate_text(&prompts::build_batch(many)).await? {
                Outcome::Translated(reply) => Some(prompts::split_batch(&reply, many.len())?),
                Outcome::Degraded => None,
            },
        };

        match translations {
            Some(translations) => {
                for (&i, translated) in pending.iter().zip(translations) {
                    let block = &sub_chunk[i];
                    let text = self.finish(offset + i, &block.text, &translated)?;
                    output[i] = with_text(block, text);
                }
                report.translated += pending.len() + hits;
            }
            None => {
                report.translated += hits;
                report.degraded += pending.len();
            }
        }
        report.cached += hits;
        Ok(output)
    }

    /// Fallback after a sub-chunk failure
    async fn translate_individually(
        &self,
        sub_chunk: &[SubtitleBlock],
        offset: usize,
        report: &mut PipelineReport,
    ) -> Vec<SubtitleBlock> {
        let mut output = Vec::with_capacity(sub_chunk.len());
        for (i, block) in sub_chunk.iter().enumerate() {
            if block.is_blank() {
                output.push(with_empty_text(block));
                continue;
            }
            if let Some(cached) = self.cached(offset + i, &block.text) {
                report.cached += 1;
                report.translated += 1;
                output.push(with_text(block, cached));
                continue;
            }

            let result = match self.translate_text(&block.text).await {
                Ok(Outcome::Translated(text)) => self.finish(offset + i, &block.text, &text).map(Some),
                Ok(Outcome::Degraded) => Ok(None),
                Err(e) => Err(TranslationError::from(e)),
            };
            match result {
                Ok(Some(text)) => {
                    report.translated += 1;
                    output.push(with_text(block, text));
                }
                Ok(None) => {
                    report.degraded += 1;
                    output.push(block.clone());
                }
                Err(e) => {
                    warn!("Block {} keeps its source text: {}", block.index, e);
                    report.fallbacks += 1;
                    output.push(block.clone());
                }
            }
        }
        output
    }

    fn cached(&self, position: usize, source: &str) -> Option<String> {
        let settings = &self.settings;
        let temperature = settings.context.temperature;
        self.cache
            .get(&CacheKey::block(position, source, &settings.target_language, &settings.model, temperature))
            .or_else(|| {
                self.cache
                    .get(&CacheKey::text(source, &settings.target_language, &settings.model, temperature))
            })
    }

    /// Clean a translation, reject empty output and cache the result
    fn finish(&self, position: usize, source: &str, translated: &str) -> Result<String, TranslationError> {
        let cleaned = FormatPreserver::clean_translation(translated);
        if cleaned.is_empty() {
            return Err(ProviderError::ParseError("empty translation".to_string()).into());
        }
        let text = FormatPreserver::restore_line_tags(source, &cleaned);

        let settings = &self.settings;
        let temperature = settings.context.temperature;
        self.cache.put(
            CacheKey::block(position, source, &settings.target_language, &settings.model, temperature),
            &text,
        );
        self.cache
            .put(CacheKey::text(source, &settings.target_language, &settings.model, temperature), &text);
        Ok(text)
    }

    /// One request through the key pool
    async fn translate_text(&self, text: &str) -> Result<Outcome, ProviderError> {
        let settings = &self.settings;
        let dispatched = self
            .pool
            .dispatch(self.clock, |record| {
                let credential = self.vault.decrypt(&record);
                async move {
                    if credential.is_empty() {
                        return Err(ProviderError::AuthenticationError(
                            "credential could not be decrypted".to_string(),
                        ));
                    }
                    self.provider
                        .translate(text, &settings.target_language, &credential, &settings.context)
                        .await
                }
            })
            .await?;

        Ok(match dispatched {
            Dispatch::Completed(text) => Outcome::Translated(text),
            Dispatch::Exhausted => Outcome::Degraded,
        })
    }
}

fn with_text(block: &SubtitleBlock, text: String) -> SubtitleBlock {
    SubtitleBlock {
        text,
        ..block.clone()
    }
}

fn with_empty_text(block: &SubtitleBlock) -> SubtitleBlock {
    with_text(block, String::new())
}
