/*!
 * Integration tests for the file-level application workflow
 */

use std::fs;

use anyhow::Result;

use lingosub::app_config::Config;
use lingosub::app_controller::{Controller, FolderSummary, ISSUES_LOG};
use lingosub::providers::mock::MockProvider;
use lingosub::subtitle::SubtitleFormat;

use crate::common::{self, SAMPLE_ASS, SAMPLE_SRT};

/// Config for French output with one gemini key
fn french_config() -> Config {
    let mut config = Config::default();
    config.target_language = "fr".to_string();
    config.add_api_keys([common::test_key(1)]);
    config
}

fn controller(config: Config, provider: &MockProvider) -> Result<Controller> {
    let session = common::mock_session(&config.translation.model, &config.target_language, provider);
    Controller::with_session(config, session)
}

/// Test translating a single file writes it next to the chosen directory
#[tokio::test]
async fn test_run_withSrtFile_shouldWriteTranslatedOutput() -> Result<()> {
    common::init_test_logging();
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(temp_dir.path(), "movie.srt", SAMPLE_SRT)?;
    let output_dir = temp_dir.path().join("out");
    let provider = MockProvider::working();
    let controller = controller(french_config(), &provider)?;

    let written = controller.run(input, output_dir.clone(), false).await?;

    let expected = output_dir.join("movie.fr.srt");
    assert_eq!(written.as_deref(), Some(expected.as_path()));
    let content = fs::read_to_string(&expected)?;
    assert!(content.contains("[French] This is a test subtitle"));
    assert!(!output_dir.join(ISSUES_LOG).exists());
    Ok(())
}

/// Test an existing translation is only replaced when forced
#[tokio::test]
async fn test_run_withExistingOutput_shouldSkipUnlessForced() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(temp_dir.path(), "movie.srt", SAMPLE_SRT)?;
    common::create_test_file(temp_dir.path(), "movie.fr.srt", "old")?;
    let provider = MockProvider::working();
    let controller = controller(french_config(), &provider)?;

    let skipped = controller.run(input.clone(), temp_dir.path().to_path_buf(), false).await?;
    assert!(skipped.is_none());
    assert_eq!(provider.request_count(), 0);

    let forced = controller.run(input, temp_dir.path().to_path_buf(), true).await?;
    assert!(forced.is_some());
    assert_ne!(fs::read_to_string(temp_dir.path().join("movie.fr.srt"))?, "old");
    Ok(())
}

/// Test the configured output format decides the extension and grammar
#[tokio::test]
async fn test_run_withOutputFormat_shouldConvertOutput() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(temp_dir.path(), "episode.ass", SAMPLE_ASS)?;
    let mut config = french_config();
    config.output_format = Some("vtt".to_string());
    let provider = MockProvider::working();
    let controller = controller(config, &provider)?;

    let written = controller.run(input, temp_dir.path().to_path_buf(), false).await?;

    let path = written.expect("output path");
    assert_eq!(path.file_name().unwrap(), "episode.fr.vtt");
    let content = fs::read_to_string(path)?;
    assert!(content.starts_with("WEBVTT"));
    assert!(content.contains("position:absolute;left:320px;top:50px;"));
    Ok(())
}

/// Test blocks that kept their source text are written to the issues log
#[tokio::test]
async fn test_run_withFailingProvider_shouldWriteIssuesLog() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(temp_dir.path(), "movie.srt", SAMPLE_SRT)?;
    let provider = MockProvider::failing();
    let controller = controller(french_config(), &provider)?;

    controller.run(input, temp_dir.path().to_path_buf(), false).await?;

    let output = fs::read_to_string(temp_dir.path().join("movie.fr.srt"))?;
    assert!(output.contains("This is a test subtitle."));
    let log = fs::read_to_string(temp_dir.path().join(ISSUES_LOG))?;
    assert!(log.contains("movie.srt"));
    assert!(log.contains("3 of 3 blocks kept their source text"));
    Ok(())
}

/// Test a run without usable keys fails before touching the provider
#[tokio::test]
async fn test_run_withoutKeys_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(temp_dir.path(), "movie.srt", SAMPLE_SRT)?;
    let mut config = Config::default();
    config.target_language = "fr".to_string();
    config.add_api_keys(["not a key"]);
    let provider = MockProvider::working();
    let controller = controller(config, &provider)?;

    let result = controller.run(input, temp_dir.path().to_path_buf(), false).await;

    assert!(result.is_err());
    assert_eq!(provider.request_count(), 0);
    assert!(!temp_dir.path().join("movie.fr.srt").exists());
    Ok(())
}

/// Test folder mode translates every input once and counts failures
#[tokio::test]
async fn test_run_folder_withMixedFiles_shouldSummarize() -> Result<()> {
    common::init_test_logging();
    let temp_dir = common::create_temp_dir()?;
    common::create_test_file(temp_dir.path(), "a.srt", SAMPLE_SRT)?;
    common::create_test_file(temp_dir.path(), "nested/b.ass", SAMPLE_ASS)?;
    common::create_test_file(temp_dir.path(), "old.fr.srt", SAMPLE_SRT)?;
    common::create_test_file(temp_dir.path(), "broken.vtt", "not a web cue file")?;
    common::create_test_file(temp_dir.path(), "notes.txt", "ignored")?;
    let provider = MockProvider::working();
    let controller = controller(french_config(), &provider)?;

    let summary = controller.run_folder(temp_dir.path().to_path_buf(), false).await?;

    assert_eq!(
        summary,
        FolderSummary {
            processed: 2,
            skipped: 0,
            failed: 1
        }
    );
    assert!(temp_dir.path().join("a.fr.srt").exists());
    assert!(temp_dir.path().join("nested").join("b.fr.ass").exists());
    assert!(!temp_dir.path().join("old.fr.fr.srt").exists());

    let again = controller.run_folder(temp_dir.path().to_path_buf(), false).await?;
    assert_eq!(again.skipped, 2);
    assert_eq!(again.processed, 0);
    Ok(())
}

/// Test folder mode on a directory without subtitles
#[tokio::test]
async fn test_run_folder_withoutSubtitles_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_file(temp_dir.path(), "notes.txt", "nothing here")?;
    let provider = MockProvider::working();
    let controller = controller(french_config(), &provider)?;

    assert!(controller.run_folder(temp_dir.path().to_path_buf(), false).await.is_err());
    Ok(())
}

/// Test conversion without translation
#[test]
fn test_convert_file_shouldWriteNewFormatOnce() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(temp_dir.path(), "movie.srt", SAMPLE_SRT)?;

    let written = Controller::convert_file(&input, SubtitleFormat::Ass, false)?;
    let path = written.expect("converted path");
    assert_eq!(path, temp_dir.path().join("movie.ass"));
    assert!(fs::read_to_string(&path)?.contains("[Events]"));

    assert!(Controller::convert_file(&input, SubtitleFormat::Ass, false)?.is_none());
    assert!(Controller::convert_file(&input, SubtitleFormat::Srt, true).is_err());
    Ok(())
}

/// Test a converted file can be translated in its new format
#[test]
fn test_convert_thenRun_shouldTranslateConvertedFile() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(temp_dir.path(), "show.srt", SAMPLE_SRT)?;
    let converted = Controller::convert_file(&input, SubtitleFormat::Ttml, false)?.expect("converted path");
    let provider = MockProvider::working();
    let controller = controller(french_config(), &provider)?;

    let written = tokio_test::block_on(controller.run(converted, temp_dir.path().to_path_buf(), false))?;

    let path = written.expect("output path");
    assert_eq!(path, temp_dir.path().join("show.fr.ttml"));
    let content = fs::read_to_string(path)?;
    assert!(content.contains("[French] This is a test subtitle"));
    assert_eq!(provider.request_count(), 3);
    Ok(())
}
