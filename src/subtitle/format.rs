use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::errors::SubtitleError;

/// Subtitle grammars understood by the codec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubtitleFormat {
    /// Plain indexed cues (`.srt`)
    Srt,
    /// Web cues (`.vtt`)
    WebVtt,
    /// Advanced SubStation Alpha (`.ass`)
    Ass,
    /// SubStation Alpha (`.ssa`)
    Ssa,
    /// Frame based MicroDVD (`.sub`)
    MicroDvd,
    /// Timed Text Markup Language (`.ttml`)
    Ttml,
    /// Synchronized Accessible Media Interchange (`.smi`)
    Sami,
}

impl SubtitleFormat {
    /// Resolve a format from a bare extension such as `srt` or `.vtt`
    pub fn from_extension(ext: &str) -> Result<Self, SubtitleError> {
        match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "srt" => Ok(Self::Srt),
            "vtt" => Ok(Self::WebVtt),
            "ass" => Ok(Self::Ass),
            "ssa" => Ok(Self::Ssa),
            "sub" => Ok(Self::MicroDvd),
            "ttml" | "dfxp" => Ok(Self::Ttml),
            "smi" | "sami" => Ok(Self::Sami),
            other => Err(SubtitleError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Resolve a format from a file path's extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, SubtitleError> {
        let ext = path
            .as_ref()
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_default();
        Self::from_extension(&ext)
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Srt => "srt",
            Self::WebVtt => "vtt",
            Self::Ass => "ass",
            Self::Ssa => "ssa",
            Self::MicroDvd => "sub",
            Self::Ttml => "ttml",
            Self::Sami => "smi",
        }
    }

    /// Formats that carry script info and style sections
    pub fn is_markup(&self) -> bool {
        matches!(self, Self::Ass | Self::Ssa)
    }

    pub fn all() -> &'static [SubtitleFormat] {
        &[
            Self::Srt,
            Self::WebVtt,
            Self::Ass,
            Self::Ssa,
            Self::MicroDvd,
            Self::Ttml,
            Self::Sami,
        ]
    }
}

impl fmt::Display for SubtitleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl FromStr for SubtitleFormat {
    type Err = SubtitleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_extension(s)
    }
}
