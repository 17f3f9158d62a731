// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info, warn};

use lingosub::app_config::{self, Config};
use lingosub::app_controller::Controller;
use lingosub::subtitle::SubtitleFormat;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

/// CLI Wrapper for SubtitleFormat to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliFormat {
    Srt,
    Vtt,
    Ass,
    Ssa,
    Sub,
    Ttml,
    Smi,
}

impl From<CliFormat> for SubtitleFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Srt => SubtitleFormat::Srt,
            CliFormat::Vtt => SubtitleFormat::WebVtt,
            CliFormat::Ass => SubtitleFormat::Ass,
            CliFormat::Ssa => SubtitleFormat::Ssa,
            CliFormat::Sub => SubtitleFormat::MicroDvd,
            CliFormat::Ttml => SubtitleFormat::Ttml,
            CliFormat::Smi => SubtitleFormat::Sami,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate a subtitle file or every subtitle file in a directory
    Translate(TranslateArgs),

    /// Convert a subtitle file to another format without translating
    Convert {
        /// Subtitle file to convert
        #[arg(value_name = "INPUT_FILE")]
        input_file: PathBuf,

        /// Target format
        #[arg(value_enum)]
        format: CliFormat,

        /// Force overwrite of an existing output file
        #[arg(short, long)]
        force_overwrite: bool,
    },

    /// Generate shell completions for lingosub
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct TranslateArgs {
    /// Subtitle file or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: PathBuf,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    /// Model name; decides the backend (gemini-*, grok-*, gpt-*/chatgpt, deepseek-*)
    #[arg(short, long)]
    model: Option<String>,

    /// Target language code (e.g., 'fa', 'es', 'fr')
    #[arg(short, long)]
    target_language: Option<String>,

    /// API keys for the model's provider, primary first
    #[arg(long = "api-key", env = "LINGOSUB_API_KEYS", value_delimiter = ',')]
    api_keys: Vec<String>,

    /// What the video is about, used as translation context
    #[arg(long)]
    topic: Option<String>,

    /// Blocks per request, bounded by the model tier
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Sampling temperature between 0 and 2
    #[arg(long)]
    temperature: Option<f32>,

    /// Custom prompt replacing the built-in one
    #[arg(long)]
    prompt: Option<String>,

    /// Output format; defaults to the input format
    #[arg(long, value_enum)]
    output_format: Option<CliFormat>,

    /// Directory for output files; defaults to the input's directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// lingosub - subtitle translation with language models
#[derive(Parser, Debug)]
#[command(name = "lingosub")]
#[command(version)]
#[command(about = "Subtitle translation through language model providers")]
#[command(long_about = "lingosub translates subtitle files with Gemini, Grok, ChatGPT or DeepSeek,
spreading requests over several API keys and keeping markup and timing intact.

EXAMPLES:
    lingosub translate movie.srt -t fa                      # Translate using default config
    lingosub translate -f movie.ass -t de -m grok-3-beta    # Force overwrite, pick a model
    lingosub translate movie.srt --output-format vtt        # Translate and convert
    lingosub translate --chunk-size 3 /subtitles/           # Process an entire directory
    lingosub convert movie.srt ass                          # Convert without translating
    lingosub completions bash > lingosub.bash               # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically. API keys may also be given with --api-key or
    the LINGOSUB_API_KEYS environment variable (comma separated).

SUPPORTED FORMATS:
    srt, vtt, ass, ssa, sub (MicroDVD), ttml, smi")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI colour for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let color = Self::color_for_level(record.level());
            let _ = writeln!(
                std::io::stderr(),
                "\x1B[{}m{} {:<5} {}\x1B[0m",
                color,
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logger accepts everything; the effective level is set through max_level
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "lingosub", &mut std::io::stdout());
            Ok(())
        }
        Commands::Convert {
            input_file,
            format,
            force_overwrite,
        } => {
            if !input_file.is_file() {
                return Err(anyhow!("Input file does not exist: {:?}", input_file));
            }
            if Controller::convert_file(&input_file, format.into(), force_overwrite)?.is_none() {
                info!("Nothing converted");
            }
            Ok(())
        }
        Commands::Translate(args) => run_translate(args).await,
    }
}

/// Load the config file and apply command line overrides
fn load_config(options: &TranslateArgs) -> Result<Config> {
    let mut config = Config::load_or_create(&options.config_path)?;

    if let Some(model) = &options.model {
        config.translation.model = model.clone();
    }
    if let Some(target_language) = &options.target_language {
        config.target_language = target_language.clone();
    }
    if let Some(topic) = &options.topic {
        config.translation.topic = topic.clone();
    }
    if let Some(chunk_size) = options.chunk_size {
        config.translation.chunk_size = chunk_size;
    }
    if let Some(temperature) = options.temperature {
        config.translation.temperature = Some(temperature);
    }
    if let Some(prompt) = &options.prompt {
        config.translation.custom_prompt = Some(prompt.clone());
    }
    if let Some(format) = options.output_format {
        config.output_format = Some(SubtitleFormat::from(format).extension().to_string());
    }
    if let Some(log_level) = options.log_level {
        config.log_level = log_level.into();
    }
    config.add_api_keys(&options.api_keys);

    config.validate().context("Configuration validation failed")?;
    Ok(config)
}

async fn run_translate(options: TranslateArgs) -> Result<()> {
    if let Some(log_level) = options.log_level {
        log::set_max_level(app_config::LogLevel::from(log_level).into());
    }

    let config = load_config(&options)?;
    log::set_max_level(config.log_level.into());

    if config.active_api_keys().is_empty() {
        warn!("No API key configured for {}", config.translation.model);
    }

    let controller = Controller::with_config(config)?;

    if options.input_path.is_file() {
        let output_dir = match &options.output_dir {
            Some(dir) => dir.clone(),
            None => options.input_path.parent().unwrap_or(Path::new(".")).to_path_buf(),
        };
        controller
            .run(options.input_path.clone(), output_dir, options.force_overwrite)
            .await?;
    } else if options.input_path.is_dir() {
        if options.output_dir.is_some() {
            warn!("--output-dir is ignored in folder mode; outputs are written next to their inputs");
        }
        let summary = controller
            .run_folder(options.input_path.clone(), options.force_overwrite)
            .await?;
        if summary.failed > 0 {
            return Err(anyhow!("{} file(s) failed", summary.failed));
        }
    } else {
        return Err(anyhow!("Input path does not exist: {:?}", options.input_path));
    }

    Ok(())
}
