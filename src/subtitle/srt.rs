/*!
 * Plain indexed cues: index line, `start --> end`, text lines, blank line.
 */

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use super::render::{render_markup, MarkupDialect};
use super::{renderable, SubtitleBlock, SubtitleFormat};

static BLOCK_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n[ \t]*\n").expect("block separator regex"));

/// Split a `start --> end [settings]` line; `None` when either side is missing
pub(crate) fn split_timing(line: &str) -> Option<(String, String)> {
    let (start, rest) = line.split_once("-->")?;
    let start = start.trim();
    let end = rest.split_whitespace().next()?;
    if start.is_empty() {
        return None;
    }
    Some((start.to_string(), end.to_string()))
}

pub fn parse(text: &str) -> Vec<SubtitleBlock> {
    let mut blocks = Vec::new();

    for chunk in BLOCK_SEPARATOR.split(text.trim()) {
        let lines: Vec<&str> = chunk.lines().map(str::trim).collect();
        let Some(timing_at) = lines.iter().position(|l| l.contains("-->")) else {
            if !chunk.trim().is_empty() {
                debug!("Discarding SRT block without timing: {:?}", chunk.lines().next());
            }
            continue;
        };
        let Some((start, end)) = split_timing(lines[timing_at]) else {
            debug!("Discarding SRT block with incomplete timing: {}", lines[timing_at]);
            continue;
        };

        let index = timing_at
            .checked_sub(1)
            .and_then(|i| lines[i].parse::<usize>().ok())
            .unwrap_or(blocks.len() + 1);
        let body = lines[timing_at + 1..].join("\n");

        blocks.push(SubtitleBlock::new(index, start, end, body.trim().to_string()));
    }

    blocks
}

pub fn serialize(blocks: &[SubtitleBlock]) -> String {
    blocks
        .iter()
        .filter_map(|b| renderable(b, SubtitleFormat::Srt))
        .map(|r| {
            format!(
                "{}\n{} --> {}\n{}\n",
                r.block.index,
                r.start.to_srt(),
                r.end.to_srt(),
                render_markup(&r.text, MarkupDialect::Srt)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
