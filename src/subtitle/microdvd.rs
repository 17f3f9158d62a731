/*!
 * Frame based cues: `{startFrame}{endFrame}text`, `|` separates lines.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use super::render::{render_markup, MarkupDialect};
use super::{renderable, SubtitleBlock, SubtitleFormat, Timestamp};

static CUE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\{(\d+)\}\{(\d+)\}(.*)$").expect("microdvd cue regex"));

pub fn parse(text: &str, fps: f64) -> Vec<SubtitleBlock> {
    text.lines()
        .filter_map(|line| CUE.captures(line.trim()))
        .filter_map(|caps| {
            let start: u64 = caps[1].parse().ok()?;
            let end: u64 = caps[2].parse().ok()?;
            Some((start, end, caps[3].replace('|', "\n")))
        })
        .enumerate()
        .map(|(i, (start, end, body))| {
            SubtitleBlock::new(
                i + 1,
                Timestamp::from_frames(start, fps).to_srt(),
                Timestamp::from_frames(end, fps).to_srt(),
                body.trim().to_string(),
            )
        })
        .collect()
}

pub fn serialize(blocks: &[SubtitleBlock], fps: f64) -> String {
    blocks
        .iter()
        .filter_map(|b| renderable(b, SubtitleFormat::MicroDvd))
        .filter_map(|r| {
            let text = render_markup(&r.text, MarkupDialect::PlainText).replace('\n', "|");
            if text.is_empty() {
                return None;
            }
            Some(format!("{{{}}}{{{}}}{}", r.start.to_frames(fps), r.end.to_frames(fps), text))
        })
        .collect::<Vec<_>>()
        .join("\n")
}
