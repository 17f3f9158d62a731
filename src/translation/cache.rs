/*!
 * Translation caching functionality.
 *
 * Results are memoized under content-addressed keys so repeated text is
 * never sent to a provider twice within a session. There is no eviction;
 * `clear` drops everything at once.
 */

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use log::debug;
use parking_lot::RwLock;
use sha2::{Digest, Sha256};

/// SHA-256 digest over the fields that decide a translation result
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    fn digest(kind: &str, fields: &[&str]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(kind.as_bytes());
        for field in fields {
            // Length prefix keeps ("ab", "c") and ("a", "bc") apart
            hasher.update((field.len() as u64).to_le_bytes());
            hasher.update(field.as_bytes());
        }
        Self(hex::encode(hasher.finalize()))
    }

    /// Key for a piece of text regardless of where it appears
    pub fn text(source: &str, target_language: &str, model: &str, temperature: f32) -> Self {
        let temperature = format!("{:.2}", temperature);
        Self::digest("text", &[source, target_language, model, &temperature])
    }

    /// Key for a block's text at a given position in the document
    pub fn block(position: usize, source: &str, target_language: &str, model: &str, temperature: f32) -> Self {
        let temperature = format!("{:.2}", temperature);
        let position = position.to_string();
        Self::digest("block", &[&position, source, target_language, model, &temperature])
    }

    /// Key for a whole document rendered in `output_format`
    pub fn document(
        source: &str,
        output_format: &str,
        target_language: &str,
        model: &str,
        temperature: f32,
        topic: &str,
        custom_prompt: &str,
    ) -> Self {
        let temperature = format!("{:.2}", temperature);
        Self::digest(
            "document",
            &[source, output_format, target_language, model, &temperature, topic, custom_prompt],
        )
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0[..12.min(self.0.len())])
    }
}

/// Translation cache for storing and retrieving translations
pub struct TranslationCache {
    /// Internal cache storage
    cache: Arc<RwLock<HashMap<CacheKey, String>>>,

    /// Cache hit counter
    hits: Arc<RwLock<usize>>,

    /// Cache miss counter
    misses: Arc<RwLock<usize>>,

    /// Whether caching is enabled
    enabled: bool,
}

impl TranslationCache {
    pub fn new(enabled: bool) -> Self {
        Self {
            cache: Arc::new(RwLock::new(HashMap::new())),
            hits: Arc::new(RwLock::new(0)),
            misses: Arc::new(RwLock::new(0)),
            enabled,
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<String> {
        if !self.enabled {
            return None;
        }

        let cache = self.cache.read();
        match cache.get(key) {
            Some(translation) => {
                *self.hits.write() += 1;
                debug!("Cache hit for {}", key);
                Some(translation.clone())
            }
            None => {
                *self.misses.write() += 1;
                debug!("Cache miss for {}", key);
                None
            }
        }
    }

    pub fn put(&self, key: CacheKey, translation: &str) {
        if !self.enabled {
            return;
        }

        debug!("Cached translation for {}: '{}'", key, truncate_text(translation, 30));
        self.cache.write().insert(key, translation.to_string());
    }

    /// Hits, misses and hit rate since the last clear
    pub fn stats(&self) -> (usize, usize, f64) {
        let hits = *self.hits.read();
        let misses = *self.misses.read();
        let total = hits + misses;

        let hit_rate = if total > 0 { hits as f64 / total as f64 } else { 0.0 };

        (hits, misses, hit_rate)
    }

    /// Drop every entry and reset the counters
    pub fn clear(&self) {
        let mut cache = self.cache.write();
        cache.clear();
        *self.hits.write() = 0;
        *self.misses.write() = 0;

        debug!("Translation cache cleared");
    }

    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl Default for TranslationCache {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Clone for TranslationCache {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            hits: self.hits.clone(),
            misses: self.misses.clone(),
            enabled: self.enabled,
        }
    }
}

/// Truncate text to a maximum number of characters with ellipsis
pub(crate) fn truncate_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
