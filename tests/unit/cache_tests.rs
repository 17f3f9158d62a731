/*!
 * Tests for translation cache functionality
 */

use lingosub::translation::{CacheKey, TranslationCache};

/// Test basic cache operations
#[test]
fn test_cache_putThenGet_shouldReturnStoredTranslation() {
    let cache = TranslationCache::new(true);
    let key = CacheKey::text("Hello", "fr", "gemini-2.0-flash", 0.3);

    assert!(cache.get(&key).is_none());
    cache.put(key.clone(), "Bonjour");

    assert_eq!(cache.get(&key).as_deref(), Some("Bonjour"));
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.stats(), (1, 1, 0.5));
}

/// Test a disabled cache neither stores nor counts
#[test]
fn test_cache_whenDisabled_shouldStoreNothing() {
    let cache = TranslationCache::new(false);
    let key = CacheKey::text("Hello", "fr", "gemini-2.0-flash", 0.3);

    cache.put(key.clone(), "Bonjour");

    assert!(cache.get(&key).is_none());
    assert!(cache.is_empty());
    assert_eq!(cache.stats(), (0, 0, 0.0));
}

/// Test clearing drops entries and resets counters
#[test]
fn test_cache_clear_shouldResetEverything() {
    let cache = TranslationCache::default();
    let key = CacheKey::text("Hello", "de", "grok-3-beta", 0.7);
    cache.put(key.clone(), "Hallo");
    cache.get(&key);

    cache.clear();

    assert!(cache.is_empty());
    assert_eq!(cache.stats(), (0, 0, 0.0));
    assert!(cache.get(&key).is_none());
}

/// Test clones share the same storage
#[test]
fn test_cache_clone_shouldShareEntries() {
    let cache = TranslationCache::default();
    let shared = cache.clone();
    let key = CacheKey::text("Hello", "es", "deepseek-chat", 0.7);

    shared.put(key.clone(), "Hola");

    assert_eq!(cache.get(&key).as_deref(), Some("Hola"));
}

/// Test every field that changes a result also changes the key
#[test]
fn test_cache_key_shouldDependOnEveryField() {
    let base = CacheKey::text("Hello", "fr", "gpt-4o", 0.3);

    assert_eq!(base, CacheKey::text("Hello", "fr", "gpt-4o", 0.3));
    assert_ne!(base, CacheKey::text("Hello!", "fr", "gpt-4o", 0.3));
    assert_ne!(base, CacheKey::text("Hello", "de", "gpt-4o", 0.3));
    assert_ne!(base, CacheKey::text("Hello", "fr", "gpt-4o-mini", 0.3));
    assert_ne!(base, CacheKey::text("Hello", "fr", "gpt-4o", 0.4));

    assert_ne!(
        CacheKey::block(0, "Hello", "fr", "gpt-4o", 0.3),
        CacheKey::block(1, "Hello", "fr", "gpt-4o", 0.3)
    );
    assert_ne!(base, CacheKey::block(0, "Hello", "fr", "gpt-4o", 0.3));
}

/// Test field boundaries cannot collide
#[test]
fn test_cache_key_withShiftedBoundaries_shouldNotCollide() {
    assert_ne!(
        CacheKey::text("ab", "c", "m", 0.0),
        CacheKey::text("a", "bc", "m", 0.0)
    );
}

/// Test document keys include the output format and prompt settings
#[test]
fn test_document_key_shouldDependOnFormatAndPrompt() {
    let srt = CacheKey::document("body", "srt", "fr", "gpt-4o", 0.3, "", "");
    let vtt = CacheKey::document("body", "vtt", "fr", "gpt-4o", 0.3, "", "");
    let topic = CacheKey::document("body", "srt", "fr", "gpt-4o", 0.3, "cooking", "");
    let prompt = CacheKey::document("body", "srt", "fr", "gpt-4o", 0.3, "", "Be formal");

    assert_ne!(srt, vtt);
    assert_ne!(srt, topic);
    assert_ne!(srt, prompt);
    assert_ne!(topic, prompt);
}

/// Test the displayed key is a short digest prefix
#[test]
fn test_cache_key_display_shouldBeShortHex() {
    let shown = CacheKey::text("Hello", "fr", "gpt-4o", 0.3).to_string();
    assert_eq!(shown.len(), 12);
    assert!(shown.chars().all(|c| c.is_ascii_hexdigit()));
}
