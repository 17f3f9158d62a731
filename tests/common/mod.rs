/*!
 * Common test utilities for the lingosub test suite
 */

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use once_cell::sync::Lazy;
use tempfile::TempDir;

use lingosub::credentials::CredentialVault;
use lingosub::providers::mock::MockProvider;
use lingosub::session::{SessionSettings, TranslationSession};
use lingosub::translation::ManualClock;

/// Key shaped like a provider key, distinct per `n`
pub fn test_key(n: usize) -> String {
    format!("AIzaSyIntegrationTestKey_{:03}", n)
}

/// One small vault shared by every test; key generation is slow
pub static VAULT: Lazy<Arc<CredentialVault>> =
    Lazy::new(|| Arc::new(CredentialVault::with_key_size(1024).expect("test vault")));

pub const SAMPLE_SRT: &str = "1
00:00:01,000 --> 00:00:04,000
This is a test subtitle.

2
00:00:05,000 --> 00:00:09,000
It contains <i>multiple</i> entries.

3
00:00:10,000 --> 00:00:14,000
{\\an8}For testing purposes.
";

pub const SAMPLE_ASS: &str = "[Script Info]
Title: Sample
ScriptType: v4.00+

[V4+ Styles]
Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding
Style: Sign,Arial,20,&Hffffff,&Hffffff,&H0,&H0,0,0,0,0,100,100,0,0,1,1,0,8,10,10,10,0

[Events]
Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text
Dialogue: 0,0:00:01.00,0:00:03.50,Sign,,0,0,0,,{\\pos(320,50)}Hello, world
Dialogue: 0,0:00:04.00,0:00:06.00,Default,,0,0,0,,Second line\\Nwith a break
";

/// Session for `model` backed by a mock provider and a manual clock
pub fn mock_session(model: &str, target_language: &str, provider: &MockProvider) -> TranslationSession {
    TranslationSession::with_parts(
        SessionSettings::new(model, target_language),
        VAULT.clone(),
        Box::new(provider.clone()),
        Arc::new(ManualClock::new(0)),
    )
}

/// Route log output through the test harness; repeated calls are ignored
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&file_path, content)?;
    Ok(file_path)
}
