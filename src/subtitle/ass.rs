/*!
 * Advanced SubStation markup (`.ass`, `.ssa`).
 *
 * `[Script Info]` and the styles section are kept verbatim. Dialogue lines
 * need at least ten comma fields; the text is everything after the ninth
 * comma so commas inside the text survive.
 */

use log::debug;

use super::tags::{self, tag_family};
use super::{renderable, DocumentSections, SubtitleBlock, SubtitleFormat};

const DEFAULT_SCRIPT_INFO: &str = "[Script Info]\nTitle: Translated Subtitles\nScriptType: v4.00+";

const DEFAULT_STYLES: &str = "[V4+ Styles]\n\
Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding\n\
Style: Default,Arial,16,&Hffffff,&Hffffff,&H0,&H0,0,0,0,0,100,100,0,0,1,1,0,2,10,10,10,0";

const EVENTS_FORMAT: &str = "Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text";

#[derive(Debug, Clone, Copy, PartialEq)]
enum Section {
    Preamble,
    ScriptInfo,
    Styles,
    Events,
    Other,
}

fn section_for(header: &str) -> Section {
    match header.to_ascii_lowercase().as_str() {
        "[script info]" => Section::ScriptInfo,
        "[v4+ styles]" | "[v4 styles]" | "[v4 styles+]" => Section::Styles,
        "[events]" => Section::Events,
        _ => Section::Other,
    }
}

pub fn parse(text: &str) -> (Vec<SubtitleBlock>, DocumentSections) {
    let mut section = Section::Preamble;
    let mut script_info: Vec<&str> = Vec::new();
    let mut styles: Vec<&str> = Vec::new();
    let mut blocks = Vec::new();

    for raw in text.lines() {
        let line = raw.trim_end();
        let trimmed = line.trim();
        if trimmed.starts_with('[') && trimmed.ends_with(']') {
            section = section_for(trimmed);
        }

        match section {
            Section::ScriptInfo => script_info.push(line),
            Section::Styles => styles.push(line),
            Section::Events => {
                if let Some(block) = parse_dialogue(trimmed, blocks.len() + 1) {
                    blocks.push(block);
                }
            }
            Section::Preamble | Section::Other => {}
        }
    }

    let verbatim = |lines: Vec<&str>| -> Option<String> {
        let joined = lines.join("\n").trim().to_string();
        (!joined.is_empty()).then_some(joined)
    };

    let sections = DocumentSections {
        script_info: verbatim(script_info),
        styles: verbatim(styles),
    };
    (blocks, sections)
}

fn parse_dialogue(line: &str, index: usize) -> Option<SubtitleBlock> {
    let body = line.strip_prefix("Dialogue:")?;
    let fields: Vec<&str> = body.splitn(10, ',').collect();
    if fields.len() < 10 {
        debug!("Skipping dialogue line with {} fields", fields.len());
        return None;
    }

    let text = fields[9].replace("\\N", "\n").replace("\\n", "\n");
    let block = SubtitleBlock::new(index, fields[1].trim(), fields[2].trim(), text)
        .with_style(fields[3].trim());
    Some(block)
}

/// Blank lines inside a verbatim section are dropped on output
fn clean_section(section: &str) -> String {
    section
        .lines()
        .filter(|l| !l.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Line tags missing from the text go in front of it
fn dialogue_text(block: &SubtitleBlock, text: &str) -> String {
    let present: Vec<&str> = tags::tokenize(text)
        .filter(|t| t.is_tag())
        .map(|t| tag_family(t.as_str()))
        .collect();

    let mut prefix = String::new();
    for tag in &block.line_tags {
        let family = tag_family(tag);
        if !present.contains(&family) && !prefix.contains(tag.as_str()) {
            prefix.push_str(tag);
        }
    }

    let body = tags::dedupe_tags(&format!("{}{}", prefix, text));
    body.replace('\n', "\\N")
}

pub fn serialize(blocks: &[SubtitleBlock], sections: &DocumentSections) -> String {
    let script_info = clean_section(sections.script_info.as_deref().unwrap_or(DEFAULT_SCRIPT_INFO));
    let styles = clean_section(sections.styles.as_deref().unwrap_or(DEFAULT_STYLES));

    let events = blocks
        .iter()
        .filter_map(|b| renderable(b, SubtitleFormat::Ass))
        .map(|r| {
            let style = if r.block.style.trim().is_empty() { "Default" } else { r.block.style.as_str() };
            format!(
                "Dialogue: 0,{},{},{},,0,0,0,,{}",
                r.start.to_ass(),
                r.end.to_ass(),
                style,
                dialogue_text(r.block, &r.text)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!("{}\n\n{}\n\n[Events]\n{}\n{}", script_info, styles, EVENTS_FORMAT, events)
        .trim()
        .to_string()
}
