/*!
 * Subtitle codec.
 *
 * Parses the supported grammars into a canonical block sequence and renders
 * blocks back out, in the same or another format:
 * - `srt`: plain indexed cues
 * - `vtt`: web cues
 * - `ass`: advanced markup with script info and style sections
 * - `microdvd`: frame based `{start}{end}text`
 * - `ttml`: XML time-marked paragraphs
 * - `sami`: synchronized caption markup
 *
 * Blocks whose timestamps fail validation, or whose text is empty, are
 * dropped from output with a warning and never fail serialization.
 */

use log::warn;
use serde::{Deserialize, Serialize};

use crate::errors::SubtitleError;

pub mod ass;
pub mod editor;
pub mod format;
pub mod microdvd;
pub mod render;
pub mod sami;
pub mod srt;
pub mod tags;
pub mod timestamp;
pub mod ttml;
pub mod vtt;

pub use editor::{EditEvent, SubtitleEditor};
pub use format::SubtitleFormat;
pub use timestamp::Timestamp;

/// Fixed frame rate assumed by the frame-based grammar
pub const DEFAULT_FPS: f64 = 24.0;

/// One subtitle cue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleBlock {
    /// Display order, starting at 1
    pub index: usize,
    /// Start timestamp as written in the source
    pub start: String,
    /// End timestamp as written in the source
    pub end: String,
    /// Raw markup, lines separated by `\n`
    pub text: String,
    /// Style name
    pub style: String,
    /// Whole-line positioning tags, one per family
    pub line_tags: Vec<String>,
}

impl SubtitleBlock {
    pub fn new(index: usize, start: impl Into<String>, end: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let line_tags = tags::line_tags(&text);
        Self {
            index,
            start: start.into(),
            end: end.into(),
            text,
            style: default_style(),
            line_tags,
        }
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = style.into();
        self
    }

    /// True when the text has nothing to translate
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Validated start and end, or `None` if either fails the grammar
    pub fn timing(&self) -> Option<(Timestamp, Timestamp)> {
        let start = Timestamp::parse(&self.start).ok()?;
        let end = Timestamp::parse(&self.end).ok()?;
        Some((start, end))
    }
}

fn default_style() -> String {
    "Default".to_string()
}

/// Pass-through sections of markup documents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSections {
    /// Verbatim `[Script Info]` section
    pub script_info: Option<String>,
    /// Verbatim styles section
    pub styles: Option<String>,
}

/// Result of parsing a subtitle file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedDocument {
    /// Formats without document-level metadata
    Plain(Vec<SubtitleBlock>),
    /// Formats that carry script info and styles
    Markup {
        blocks: Vec<SubtitleBlock>,
        sections: DocumentSections,
    },
}

impl ParsedDocument {
    pub fn blocks(&self) -> &[SubtitleBlock] {
        match self {
            Self::Plain(blocks) | Self::Markup { blocks, .. } => blocks,
        }
    }

    pub fn blocks_mut(&mut self) -> &mut Vec<SubtitleBlock> {
        match self {
            Self::Plain(blocks) | Self::Markup { blocks, .. } => blocks,
        }
    }

    /// Document sections; empty for plain documents
    pub fn sections(&self) -> DocumentSections {
        match self {
            Self::Plain(_) => DocumentSections::default(),
            Self::Markup { sections, .. } => sections.clone(),
        }
    }

    pub fn into_parts(self) -> (Vec<SubtitleBlock>, DocumentSections) {
        match self {
            Self::Plain(blocks) => (blocks, DocumentSections::default()),
            Self::Markup { blocks, sections } => (blocks, sections),
        }
    }
}

/// Strip a byte order mark and normalise line endings
fn normalize_input(text: &str) -> String {
    text.trim_start_matches('\u{feff}')
        .replace("\r\n", "\n")
        .replace('\r', "\n")
}

/// Parse subtitle text in the given format
pub fn parse(text: &str, format: SubtitleFormat) -> Result<ParsedDocument, SubtitleError> {
    let text = normalize_input(text);
    match format {
        SubtitleFormat::Srt => Ok(ParsedDocument::Plain(srt::parse(&text))),
        SubtitleFormat::WebVtt => vtt::parse(&text).map(ParsedDocument::Plain),
        SubtitleFormat::Ass | SubtitleFormat::Ssa => {
            let (blocks, sections) = ass::parse(&text);
            Ok(ParsedDocument::Markup { blocks, sections })
        }
        SubtitleFormat::MicroDvd => Ok(ParsedDocument::Plain(microdvd::parse(&text, DEFAULT_FPS))),
        SubtitleFormat::Ttml => ttml::parse(&text).map(ParsedDocument::Plain),
        SubtitleFormat::Sami => Ok(ParsedDocument::Plain(sami::parse(&text))),
    }
}

/// Parse using a format hint such as a file extension
pub fn parse_with_hint(text: &str, hint: &str) -> Result<ParsedDocument, SubtitleError> {
    parse(text, SubtitleFormat::from_extension(hint)?)
}

/// Render blocks in the given format
pub fn serialize(blocks: &[SubtitleBlock], format: SubtitleFormat, sections: &DocumentSections) -> String {
    match format {
        SubtitleFormat::Srt => srt::serialize(blocks),
        SubtitleFormat::WebVtt => vtt::serialize(blocks),
        SubtitleFormat::Ass | SubtitleFormat::Ssa => ass::serialize(blocks, sections),
        SubtitleFormat::MicroDvd => microdvd::serialize(blocks, DEFAULT_FPS),
        SubtitleFormat::Ttml => ttml::serialize(blocks),
        SubtitleFormat::Sami => sami::serialize(blocks),
    }
}

/// Render a parsed document, keeping its own sections
pub fn serialize_document(document: &ParsedDocument, format: SubtitleFormat) -> String {
    serialize(document.blocks(), format, &document.sections())
}

/// Parse in one grammar and render in another
pub fn convert(text: &str, from: SubtitleFormat, to: SubtitleFormat) -> Result<String, SubtitleError> {
    let document = parse(text, from)?;
    Ok(serialize_document(&document, to))
}

/// A block that survived output validation
pub(crate) struct Renderable<'a> {
    pub block: &'a SubtitleBlock,
    pub start: Timestamp,
    pub end: Timestamp,
    pub text: String,
}

/// Validate timing and non-empty text; skipped blocks are logged
pub(crate) fn renderable(block: &SubtitleBlock, format: SubtitleFormat) -> Option<Renderable<'_>> {
    let Some((start, end)) = block.timing() else {
        warn!(
            "Skipping {} block {}: invalid timestamps '{}' / '{}'",
            format, block.index, block.start, block.end
        );
        return None;
    };

    let text = block
        .text
        .trim()
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    if text.is_empty() {
        warn!("Skipping empty {} block {}", format, block.index);
        return None;
    }

    Some(Renderable { block, start, end, text })
}
