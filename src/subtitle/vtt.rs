/*!
 * Web cues. Same block layout as plain indexed cues behind a `WEBVTT`
 * header, with `.` as the fraction separator and optional cue identifiers.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use super::render::{render_markup, MarkupDialect};
use super::srt::split_timing;
use super::{renderable, SubtitleBlock, SubtitleFormat};
use crate::errors::SubtitleError;

static BLOCK_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n[ \t]*\n").expect("block separator regex"));

pub fn parse(text: &str) -> Result<Vec<SubtitleBlock>, SubtitleError> {
    let first_line = text.lines().next().unwrap_or("").trim();
    if !first_line.starts_with("WEBVTT") {
        return Err(SubtitleError::MissingWebVttHeader);
    }

    let mut blocks = Vec::new();
    for (i, chunk) in BLOCK_SEPARATOR.split(text.trim()).enumerate() {
        let mut lines: Vec<&str> = chunk.lines().map(str::trim).collect();
        if i == 0 && !lines.is_empty() {
            // header line
            lines.remove(0);
        }
        let Some(head) = lines.first() else { continue };
        if head.starts_with("NOTE") || head.starts_with("STYLE") || head.starts_with("REGION") {
            continue;
        }
        let Some(timing_at) = lines.iter().position(|l| l.contains("-->")) else {
            continue;
        };
        let Some((start, end)) = split_timing(lines[timing_at]) else {
            continue;
        };
        let body = lines[timing_at + 1..].join("\n");
        blocks.push(SubtitleBlock::new(blocks.len() + 1, start, end, body.trim().to_string()));
    }

    Ok(blocks)
}

pub fn serialize(blocks: &[SubtitleBlock]) -> String {
    let cues = blocks
        .iter()
        .filter_map(|b| renderable(b, SubtitleFormat::WebVtt))
        .enumerate()
        .filter_map(|(i, r)| {
            let text = render_markup(&r.text, MarkupDialect::WebVtt);
            if text.trim().is_empty() {
                return None;
            }
            Some(format!("{}\n{} --> {}\n{}\n", i + 1, r.start.to_vtt(), r.end.to_vtt(), text))
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!("WEBVTT\n\n{}", cues).trim().to_string()
}
