/*!
 * Integration tests for key failover and pool exhaustion
 */

use std::sync::Arc;

use lingosub::providers::mock::MockProvider;
use lingosub::session::{SessionSettings, TranslationRequest, TranslationSession};
use lingosub::subtitle::SubtitleFormat;
use lingosub::translation::{KeyState, ManualClock, SchedulerConfig};
use lingosub::TranslationError;

use crate::common::{self, SAMPLE_SRT, VAULT};

const MODEL: &str = "gemini-2.0-flash";

/// Five single-block cues, one request each
fn five_cues() -> String {
    (1..=5)
        .map(|i| format!("{}\n00:00:0{},000 --> 00:00:0{},500\nLine number {}\n", i, i, i, i))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Test one primary and three backups keep the document going while
/// most of them answer 429
#[tokio::test]
async fn test_translate_document_withRateLimitedPrimaryAndBackups_shouldFailOverWithoutError() {
    let limited = [common::test_key(0), common::test_key(1), common::test_key(2)];
    let provider = MockProvider::rate_limited_keys(limited.clone());
    let mut session = common::mock_session(MODEL, "fr", &provider);
    for n in 0..4 {
        session.add_key("gemini", &common::test_key(n)).unwrap();
    }

    let outcome = session
        .translate_document(&TranslationRequest::new(five_cues(), SubtitleFormat::Srt), |_| {})
        .await
        .unwrap();

    assert_eq!(outcome.report.translated, 5);
    assert_eq!(outcome.report.degraded, 0);
    assert_eq!(outcome.document.blocks()[4].text, "[French] Line number 5");

    let used = provider.used_credentials();
    assert_eq!(used.len(), 8);
    assert_eq!(&used[..3], &limited);
    assert!(used[3..].iter().all(|key| *key == common::test_key(3)));

    let statuses = session.key_statuses();
    assert_eq!(statuses.len(), 4);
    for status in &statuses[..3] {
        assert_eq!(status.state, KeyState::Cooldown);
        assert_eq!(status.rate_limit_hits, 1);
    }
    assert_eq!(statuses[3].state, KeyState::Available);
    assert_eq!(statuses[3].usage_count, 5);
}

/// Test healthy keys share the load as their usage grows
#[tokio::test]
async fn test_translate_document_withTwoHealthyKeys_shouldSpreadRequests() {
    let provider = MockProvider::working();
    let clock = Arc::new(ManualClock::new(0));
    let mut session = TranslationSession::with_parts(
        SessionSettings::new(MODEL, "fr"),
        VAULT.clone(),
        Box::new(provider.clone()),
        clock.clone(),
    );
    session.add_key("gemini", &common::test_key(0)).unwrap();
    session.add_key("gemini", &common::test_key(1)).unwrap();

    session
        .translate_document(&TranslationRequest::new(SAMPLE_SRT, SubtitleFormat::Srt), |_| {})
        .await
        .unwrap();

    let used = provider.used_credentials();
    assert_eq!(used, vec![common::test_key(0), common::test_key(1), common::test_key(0)]);
    let usage: Vec<u32> = session.key_statuses().iter().map(|s| s.usage_count).collect();
    assert_eq!(usage, vec![2, 1]);
}

/// Test every key rate limited degrades blocks to their source text
#[tokio::test]
async fn test_translate_document_withEveryKeyRateLimited_shouldDegradeWithoutError() {
    let provider = MockProvider::rate_limited();
    let config = SchedulerConfig {
        max_attempts: 2,
        ..SchedulerConfig::default()
    };
    let mut session = common::mock_session(MODEL, "fr", &provider).with_scheduler_config(config);
    session.add_key("gemini", &common::test_key(0)).unwrap();
    session.add_key("gemini", &common::test_key(1)).unwrap();

    let outcome = session
        .translate_document(&TranslationRequest::new(SAMPLE_SRT, SubtitleFormat::Srt), |_| {})
        .await
        .unwrap();

    assert_eq!(outcome.report.degraded, 3);
    assert_eq!(outcome.report.translated, 0);
    assert_eq!(outcome.document.blocks()[0].text, "This is a test subtitle.");
    assert!(session.key_statuses().iter().all(|s| s.state == KeyState::Cooldown));
}

/// Test failures other than rate limits leave the keys usable
#[tokio::test]
async fn test_translate_document_withServerErrors_shouldNotCoolDownKeys() {
    let provider = MockProvider::failing();
    let mut session = common::mock_session(MODEL, "fr", &provider);
    session.add_key("gemini", &common::test_key(0)).unwrap();

    let outcome = session
        .translate_document(&TranslationRequest::new(SAMPLE_SRT, SubtitleFormat::Srt), |_| {})
        .await
        .unwrap();

    assert_eq!(outcome.report.fallbacks, 3);
    let statuses = session.key_statuses();
    assert_eq!(statuses[0].state, KeyState::Available);
    assert_eq!(statuses[0].rate_limit_hits, 0);
    assert_eq!(statuses[0].usage_count, 6);
}

/// Test removing the primary promotes the next slot
#[tokio::test]
async fn test_remove_key_slot_shouldPromoteBackup() {
    let provider = MockProvider::working();
    let mut session = common::mock_session(MODEL, "fr", &provider);
    session.add_key("gemini", &common::test_key(0)).unwrap();
    session.add_key("gemini", &common::test_key(1)).unwrap();

    session.remove_key_slot("gemini", 0).unwrap();
    assert_eq!(session.key_statuses().len(), 1);

    session
        .translate_document(&TranslationRequest::new(SAMPLE_SRT, SubtitleFormat::Srt), |_| {})
        .await
        .unwrap();
    assert!(provider.used_credentials().iter().all(|key| *key == common::test_key(1)));
}

/// Test keys of another provider are never used
#[tokio::test]
async fn test_translate_document_withOnlyForeignProviderKeys_shouldFail() {
    let provider = MockProvider::working();
    let mut session = common::mock_session("grok-3-beta", "fr", &provider);
    session.add_key("gemini", &common::test_key(0)).unwrap();

    let result = session
        .translate_document(&TranslationRequest::new(SAMPLE_SRT, SubtitleFormat::Srt), |_| {})
        .await;

    assert!(matches!(result, Err(TranslationError::NoValidCredential(family)) if family == "grok"));
    assert_eq!(provider.request_count(), 0);
}

/// Test exported keys work again after import into the same session
#[tokio::test]
async fn test_import_credentials_fromExport_shouldRestorePool() {
    let provider = MockProvider::working();
    let mut session = common::mock_session(MODEL, "fr", &provider);
    session.add_key("gemini", &common::test_key(0)).unwrap();
    session.add_key("gemini", &common::test_key(1)).unwrap();

    let snapshot = session.export_credentials().unwrap();
    session.update_key("gemini", 1, "").unwrap();
    session.update_key("gemini", 0, "").unwrap();
    assert!(session.key_statuses().is_empty());

    session.import_credentials(&snapshot).unwrap();
    assert_eq!(session.key_statuses().len(), 2);

    let outcome = session
        .translate_document(&TranslationRequest::new(SAMPLE_SRT, SubtitleFormat::Srt), |_| {})
        .await
        .unwrap();
    assert_eq!(outcome.report.translated, 3);
}
