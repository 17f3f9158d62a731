/*!
 * XML time-marked paragraphs (`<p begin=".." end="..">`).
 */

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use super::render::{render_markup, MarkupDialect};
use super::{renderable, SubtitleBlock, SubtitleFormat, Timestamp};
use crate::errors::SubtitleError;

static OFFSET_TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+(?:\.\d+)?)(h|m|s|ms)$").expect("offset time regex"));

/// Clock times pass through, offset times (`12.5s`, `1500ms`) are converted
fn parse_time(raw: &str) -> Option<Timestamp> {
    let raw = raw.trim();
    if let Ok(ts) = Timestamp::parse(raw) {
        return Some(ts);
    }
    let caps = OFFSET_TIME.captures(raw)?;
    let value: f64 = caps[1].parse().ok()?;
    let scale = match &caps[2] {
        "h" => 3_600_000.0,
        "m" => 60_000.0,
        "s" => 1000.0,
        _ => 1.0,
    };
    Some(Timestamp::from_millis((value * scale).round() as u64))
}

fn paragraph_text(node: roxmltree::Node) -> String {
    let mut text = String::new();
    for child in node.descendants() {
        if child.is_text() {
            let chunk = child.text().unwrap_or("");
            let words = chunk.split_whitespace().collect::<Vec<_>>().join(" ");
            if chunk.starts_with(char::is_whitespace) && !text.is_empty() && !text.ends_with([' ', '\n']) {
                text.push(' ');
            }
            text.push_str(&words);
            if chunk.ends_with(char::is_whitespace) && !words.is_empty() {
                text.push(' ');
            }
        } else if child.is_element() && child.tag_name().name() == "br" {
            text.push('\n');
        }
    }
    text.lines().map(str::trim).collect::<Vec<_>>().join("\n").trim().to_string()
}

pub fn parse(text: &str) -> Result<Vec<SubtitleBlock>, SubtitleError> {
    let doc = roxmltree::Document::parse(text).map_err(|e| SubtitleError::Malformed {
        format: "ttml",
        message: e.to_string(),
    })?;

    let mut blocks = Vec::new();
    for node in doc
        .root_element()
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "p")
    {
        let Some(start) = node.attribute("begin").and_then(parse_time) else {
            debug!("Skipping TTML paragraph without a usable begin time");
            continue;
        };
        let end = node.attribute("end").and_then(parse_time).or_else(|| {
            node.attribute("dur")
                .and_then(parse_time)
                .map(|dur| start.saturating_add_millis(dur.as_millis()))
        });
        let Some(end) = end else {
            debug!("Skipping TTML paragraph without an end time");
            continue;
        };

        blocks.push(SubtitleBlock::new(
            blocks.len() + 1,
            start.to_vtt(),
            end.to_vtt(),
            paragraph_text(node),
        ));
    }

    Ok(blocks)
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn serialize(blocks: &[SubtitleBlock]) -> String {
    let paragraphs = blocks
        .iter()
        .filter_map(|b| renderable(b, SubtitleFormat::Ttml))
        .filter_map(|r| {
            let text = render_markup(&r.text, MarkupDialect::PlainText);
            if text.is_empty() {
                return None;
            }
            Some(format!(
                "      <p begin=\"{}\" end=\"{}\">{}</p>",
                r.start.to_vtt(),
                r.end.to_vtt(),
                escape_xml(&text).replace('\n', "<br/>")
            ))
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<tt xmlns=\"http://www.w3.org/ns/ttml\">\n  <body>\n    <div>\n{}\n    </div>\n  </body>\n</tt>",
        paragraphs
    )
}
