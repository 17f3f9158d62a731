use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Result, anyhow};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{error, info, warn};

use crate::app_config::Config;
use crate::file_utils::FileManager;
use crate::session::{TranslationRequest, TranslationSession};
use crate::subtitle::{self, SubtitleFormat};
use crate::translation::PipelineReport;

// @module: Application controller for subtitle processing

/// Name of the per-directory file listing blocks that kept their source text
pub const ISSUES_LOG: &str = "lingosub.issues.log";

/// Counters of a folder run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FolderSummary {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Main application controller for subtitle translation
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Session holding keys, pool and cache for the whole run
    session: TranslationSession,
}

impl Controller {
    // @method: Create a controller talking to the configured backend
    pub fn with_config(config: Config) -> Result<Self> {
        let session =
            TranslationSession::new(config.session_settings())?.with_scheduler_config(config.scheduler);
        Self::with_session(config, session)
    }

    // @method: Create a controller around an existing session
    pub fn with_session(config: Config, mut session: TranslationSession) -> Result<Self> {
        let kind = config
            .provider_kind()
            .ok_or_else(|| anyhow!("Unsupported model: {}", config.translation.model))?;
        let family = kind.credential_family();

        for (slot, key) in config.active_api_keys().iter().enumerate() {
            if let Err(e) = session.add_key(family, key) {
                warn!("Ignoring {} key #{}: {}", family, slot + 1, e);
            }
        }
        if session.credentials().records(family).is_empty() {
            warn!("No usable {} API key configured", family);
        }

        Ok(Self { config, session })
    }

    pub fn session(&self) -> &TranslationSession {
        &self.session
    }

    /// Translate one subtitle file into `output_dir`.
    ///
    /// Returns the written path, or `None` when the output already exists
    /// and `force_overwrite` is off.
    pub async fn run(&self, input_file: PathBuf, output_dir: PathBuf, force_overwrite: bool) -> Result<Option<PathBuf>> {
        let multi_progress = MultiProgress::new();
        self.run_with_progress(&input_file, &output_dir, &multi_progress, force_overwrite)
            .await
    }

    async fn run_with_progress(
        &self,
        input_file: &Path,
        output_dir: &Path,
        multi_progress: &MultiProgress,
        force_overwrite: bool,
    ) -> Result<Option<PathBuf>> {
        let start_time = Instant::now();

        if !input_file.is_file() {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }

        let input_format = SubtitleFormat::from_path(input_file)?;
        let output_format = self.config.output_format_for(input_format)?;
        let output_path = FileManager::generate_output_path(
            input_file,
            output_dir,
            &self.config.target_language,
            output_format.extension(),
        );
        if output_path.exists() && !force_overwrite {
            warn!("Skipping file, translation already exists (use -f to force overwrite)");
            return Ok(None);
        }

        let content = FileManager::read_to_string(input_file)?;
        let request = TranslationRequest::new(content, input_format).with_output_format(output_format);

        let total_blocks = subtitle::parse(&request.text, input_format).map_or(0, |d| d.blocks().len());
        let progress_bar = multi_progress.add(ProgressBar::new(total_blocks as u64));
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} blocks ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(template_result.progress_chars("█▓▒░"));
        progress_bar.set_message("Translating");

        info!(
            "Translating {:?} into {} with {}",
            input_file.file_name().unwrap_or_default(),
            self.config.target_language,
            self.config.translation.model
        );

        let pb = progress_bar.clone();
        let outcome = self
            .session
            .translate_document(&request, move |processed| pb.set_position(processed as u64))
            .await;
        progress_bar.finish_and_clear();
        let outcome = outcome?;

        if !outcome.from_cache {
            if let Some(language) = &outcome.source_language {
                info!("Source language: {}", language);
            }
            self.log_report(&outcome.report, input_file, output_dir);
        }

        FileManager::write_to_file(&output_path, &outcome.output)?;
        info!(
            "Success: {} ({})",
            output_path.display(),
            Self::format_duration(start_time.elapsed())
        );
        Ok(Some(output_path))
    }

    /// Translate every subtitle file below `input_dir`, writing next to each input
    pub async fn run_folder(&self, input_dir: PathBuf, force_overwrite: bool) -> Result<FolderSummary> {
        let start_time = Instant::now();

        if !input_dir.is_dir() {
            return Err(anyhow!("Input directory does not exist: {:?}", input_dir));
        }

        let target = &self.config.target_language;
        let files: Vec<PathBuf> = FileManager::find_subtitle_files(&input_dir)?
            .into_iter()
            .filter(|path| !FileManager::is_translation_output(path, target))
            .collect();
        if files.is_empty() {
            return Err(anyhow!("No subtitle files found in directory: {:?}", input_dir));
        }

        let multi_progress = MultiProgress::new();
        let folder_pb = multi_progress.add(ProgressBar::new(files.len() as u64));
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        folder_pb.set_style(template_result.progress_chars("█▓▒░"));

        let mut summary = FolderSummary::default();
        for file in &files {
            let file_name = file
                .file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            folder_pb.set_message(format!("Processing: {}", file_name));

            let output_dir = file.parent().map_or_else(|| input_dir.clone(), Path::to_path_buf);
            match self
                .run_with_progress(file, &output_dir, &multi_progress, force_overwrite)
                .await
            {
                Ok(Some(_)) => summary.processed += 1,
                Ok(None) => summary.skipped += 1,
                Err(e) => {
                    error!("Error processing file {}: {}", file_name, e);
                    summary.failed += 1;
                }
            }
            folder_pb.inc(1);
        }
        folder_pb.finish_with_message("Folder processing complete");

        info!(
            "Folder processing completed: {} processed, {} skipped, {} errors in {}",
            summary.processed,
            summary.skipped,
            summary.failed,
            Self::format_duration(start_time.elapsed())
        );
        Ok(summary)
    }

    /// Re-render a subtitle file in another format without translating it
    pub fn convert_file(input_file: &Path, format: SubtitleFormat, force_overwrite: bool) -> Result<Option<PathBuf>> {
        let input_format = SubtitleFormat::from_path(input_file)?;
        let output_path = input_file.with_extension(format.extension());
        if output_path == input_file {
            return Err(anyhow!("{:?} is already in {} format", input_file, format));
        }
        if output_path.exists() && !force_overwrite {
            warn!("Skipping conversion, {:?} already exists (use -f to force overwrite)", output_path);
            return Ok(None);
        }

        let content = FileManager::read_to_string(input_file)?;
        let converted = subtitle::convert(&content, input_format, format)?;
        FileManager::write_to_file(&output_path, &converted)?;
        info!("Converted {} -> {}", input_file.display(), output_path.display());
        Ok(Some(output_path))
    }

    fn log_report(&self, report: &PipelineReport, input_file: &Path, output_dir: &Path) {
        info!(
            "{} blocks: {} translated ({} cached), {} kept source text, {} rate limited",
            report.blocks, report.translated, report.cached, report.fallbacks, report.degraded
        );

        if report.fallbacks == 0 && report.degraded == 0 {
            return;
        }

        let log_path = output_dir.join(ISSUES_LOG);
        let line = format!(
            "{}: {} of {} blocks kept their source text ({} failed, {} rate limited) - {}",
            input_file.display(),
            report.fallbacks + report.degraded,
            report.blocks,
            report.fallbacks,
            report.degraded,
            self.config.translation.model
        );
        match FileManager::append_to_log_file(&log_path, &line) {
            Ok(()) => info!("Issues written to {}", log_path.display()),
            Err(e) => warn!("Failed to write issues log: {}", e),
        }
    }

    // Format duration in a human-readable format
    fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
