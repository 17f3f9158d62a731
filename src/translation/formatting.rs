/*!
 * Clean-up of provider output and user-supplied prompt text.
 *
 * Models tend to add trailing periods, repeated commas, stray blank lines
 * and duplicated override tags. `FormatPreserver` strips those artifacts and
 * puts back line-level tags (`{\an8}`, `{\pos(..)}`) that the model dropped.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use crate::subtitle::tags;

static REPEATED_COMMAS: Lazy<Regex> = Lazy::new(|| Regex::new(r",{2,}").expect("comma regex"));
static EXCESS_NEWLINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").expect("newline regex"));
/// Exactly one period per line end: `Wait...` becomes `Wait..`, so an
/// ellipsis still reads as one. Do not widen to `\.+`.
static TRAILING_PERIOD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)\.[ \t]*$").expect("period regex"));
static SCRIPT_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script\b.*?</script\s*>").expect("script regex"));
static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"</?[^>]+(>|$)").expect("html tag regex"));

pub struct FormatPreserver;

impl FormatPreserver {
    /// Normalize a translated block before it is merged back
    pub fn clean_translation(text: &str) -> String {
        if text.trim().is_empty() {
            return String::new();
        }

        let text = REPEATED_COMMAS.replace_all(text, ",");
        let text = TRAILING_PERIOD.replace_all(&text, "");
        let trimmed = text.lines().map(str::trim).collect::<Vec<_>>().join("\n");
        let collapsed = EXCESS_NEWLINES.replace_all(trimmed.trim(), "\n\n");

        tags::dedupe_tags(&collapsed)
    }

    /// Re-insert line-level tags of `original` that `translated` lost
    pub fn restore_line_tags(original: &str, translated: &str) -> String {
        let present = tags::line_tags(translated);
        let missing: String = tags::line_tags(original)
            .into_iter()
            .filter(|tag| {
                let family = tags::tag_family(tag);
                !present.iter().any(|p| tags::tag_family(p) == family)
            })
            .collect();

        if missing.is_empty() {
            translated.to_string()
        } else {
            format!("{}{}", missing, translated)
        }
    }

    /// Topic and custom prompt text: no markup, no control characters
    pub fn sanitize_prompt_input(input: &str) -> String {
        let without_scripts = SCRIPT_BLOCK.replace_all(input, "");
        let without_markup = HTML_TAG.replace_all(&without_scripts, "");
        without_markup
            .chars()
            .filter(|c| !c.is_control() || *c == '\n')
            .collect::<String>()
            .trim()
            .to_string()
    }

    /// Subtitle text sent to a provider keeps its markup; only control
    /// characters other than line breaks are removed
    pub fn sanitize_subtitle_text(input: &str) -> String {
        input.chars().filter(|c| !c.is_control() || *c == '\n').collect()
    }
}
