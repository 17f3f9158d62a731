/*!
 * Synchronized caption markup (`.smi`).
 *
 * A cue runs from its `<SYNC Start=..>` to the next sync point. Syncs with
 * no visible text (usually `&nbsp;`) only end the previous cue. The last
 * cue, having no successor, is given a fixed duration.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use super::render::{render_markup, MarkupDialect};
use super::{renderable, SubtitleBlock, SubtitleFormat, Timestamp};

/// Duration given to a cue that no later sync point closes
pub const TERMINAL_CUE_MS: u64 = 3000;

static SYNC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<sync\s+start\s*=\s*["']?(\d+)["']?[^>]*>"#).expect("sync regex")
});
static BODY_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)</body>|</sami>").expect("body end regex"));
static LINE_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").expect("line break regex"));
static MARKUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("markup regex"));

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
}

fn sync_text(raw: &str) -> String {
    let with_breaks = LINE_BREAK.replace_all(raw, "\n");
    let stripped = MARKUP.replace_all(&with_breaks, "");
    decode_entities(&stripped)
        .lines()
        .map(|l| l.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn parse(text: &str) -> Vec<SubtitleBlock> {
    let syncs: Vec<(u64, usize, usize)> = SYNC
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let start = caps[1].parse::<u64>().ok()?;
            Some((start, whole.start(), whole.end()))
        })
        .collect();

    let mut blocks = Vec::new();
    for (i, (start, _, content_from)) in syncs.iter().enumerate() {
        let next = syncs.get(i + 1);
        let content_to = match next {
            Some((_, next_at, _)) => *next_at,
            None => BODY_END
                .find_at(text, *content_from)
                .map(|m| m.start())
                .unwrap_or(text.len()),
        };

        let body = sync_text(&text[*content_from..content_to]);
        if body.is_empty() {
            continue;
        }

        let end = match next {
            Some((next_start, _, _)) => *next_start,
            None => start.saturating_add(TERMINAL_CUE_MS),
        };
        blocks.push(SubtitleBlock::new(
            blocks.len() + 1,
            Timestamp::from_millis(*start).to_srt(),
            Timestamp::from_millis(end).to_srt(),
            body,
        ));
    }

    blocks
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

pub fn serialize(blocks: &[SubtitleBlock]) -> String {
    let cues: Vec<_> = blocks
        .iter()
        .filter_map(|b| renderable(b, SubtitleFormat::Sami))
        .filter_map(|r| {
            let text = render_markup(&r.text, MarkupDialect::PlainText);
            (!text.is_empty()).then_some((r.start, r.end, text))
        })
        .collect();

    let mut lines = Vec::with_capacity(cues.len() * 2);
    for (i, (start, end, text)) in cues.iter().enumerate() {
        lines.push(format!(
            "  <SYNC Start={}><P Class=ENCC>{}</P></SYNC>",
            start.as_millis(),
            escape(text).replace('\n', "<br>")
        ));
        let next_start = cues.get(i + 1).map(|(s, _, _)| *s);
        if next_start != Some(*end) {
            lines.push(format!("  <SYNC Start={}><P Class=ENCC>&nbsp;</P></SYNC>", end.as_millis()));
        }
    }

    format!(
        "<SAMI>\n<HEAD>\n<STYLE TYPE=\"text/css\">\n<!--\nP {{ margin-left: 8pt; margin-right: 8pt; margin-bottom: 2pt; margin-top: 2pt; }}\n-->\n</STYLE>\n</HEAD>\n<BODY>\n{}\n</BODY>\n</SAMI>",
        lines.join("\n")
    )
}
