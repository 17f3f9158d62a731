/*!
 * Inline override tag tokenizer.
 *
 * Subtitle text may carry `{\tag}` overrides. A brace group is a tag only
 * when it holds exactly one `\name` followed by a parenthesised argument
 * list or a plain argument run; anything else is literal text. Within a
 * single pass only the first tag of each family is kept.
 */

use once_cell::sync::Lazy;
use regex::Regex;

static OVERRIDE_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\{\\[a-zA-Z0-9]+(?:\([^)]*\)|[0-9a-zA-Z&,. ]*)?\}$").expect("override tag regex")
});

/// Known families, matched by longest prefix of the tag name.
const FAMILIES: &[&str] = &[
    "pos", "move", "clip", "iclip", "org", "fad", "fade", "an", "a", "b", "i", "u", "s", "c",
    "1c", "2c", "3c", "4c", "1a", "2a", "3a", "4a", "alpha", "fn", "fs", "fscx", "fscy", "fsp",
    "fe", "fr", "frx", "fry", "frz", "bord", "xbord", "ybord", "shad", "xshad", "yshad", "blur",
    "be", "k", "kf", "ko", "K", "q", "p", "pbo", "t", "r",
];

/// Families whose tags attach to the whole line rather than a text span.
pub const LINE_FAMILIES: &[&str] = &["pos", "move", "clip", "iclip", "org", "fad", "fade", "an"];

/// Families that switch a style on and off.
const TOGGLE_FAMILIES: &[&str] = &["b", "i", "u", "s"];

/// One run of a tokenized subtitle line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// Literal text, including invalid brace groups and `\N`
    Text(&'a str),
    /// A complete `{\...}` group
    Tag(&'a str),
}

impl<'a> Token<'a> {
    /// The exact source slice of this token
    pub fn as_str(&self) -> &'a str {
        match self {
            Token::Text(s) | Token::Tag(s) => s,
        }
    }

    pub fn is_tag(&self) -> bool {
        matches!(self, Token::Tag(_))
    }
}

/// Deduplication key: the family plus the switch state for toggles
type FamilyKey<'a> = (&'a str, Option<bool>);

/// Lazy token stream over one line of markup.
///
/// Cloning a fresh stream restarts tokenization; no state outlives it.
#[derive(Debug, Clone)]
pub struct Tokens<'a> {
    input: &'a str,
    pos: usize,
    seen: Vec<FamilyKey<'a>>,
}

/// Tokenize subtitle markup into text and tag runs
pub fn tokenize(text: &str) -> Tokens<'_> {
    Tokens {
        input: text,
        pos: 0,
        seen: Vec::new(),
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        loop {
            let rest = &self.input[self.pos..];
            if rest.is_empty() {
                return None;
            }

            let Some(open) = rest.find('{') else {
                self.pos = self.input.len();
                return Some(Token::Text(rest));
            };

            // An unterminated brace turns everything that follows into text
            let Some(close) = rest[open..].find('}').map(|c| c + open) else {
                self.pos = self.input.len();
                return Some(Token::Text(rest));
            };

            if open > 0 {
                self.pos += open;
                return Some(Token::Text(&rest[..open]));
            }

            let group = &rest[..=close];
            self.pos += close + 1;

            if !is_override_tag(group) {
                return Some(Token::Text(group));
            }

            let key = family_key(group);
            if self.seen.contains(&key) {
                continue;
            }
            self.seen.push(key);
            return Some(Token::Tag(group));
        }
    }
}

/// Whether a `{...}` group is a single valid override tag
pub fn is_override_tag(group: &str) -> bool {
    OVERRIDE_TAG.is_match(group)
}

/// Tag name: the alphanumeric run after the backslash (`b1`, `fnArial`, `pos`)
fn tag_name(tag: &str) -> &str {
    let body = tag.trim_start_matches('{').trim_start_matches('\\');
    let end = body
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(body.len());
    &body[..end]
}

/// Semantic family of a tag group, e.g. `{\fad(10,20)}` -> `fad`, `{\i1}` -> `i`
pub fn tag_family(tag: &str) -> &str {
    let name = tag_name(tag);
    FAMILIES
        .iter()
        .filter(|family| name.starts_with(**family))
        .max_by_key(|family| family.len())
        .copied()
        .unwrap_or_else(|| {
            let end = name
                .find(|c: char| !c.is_ascii_alphabetic())
                .unwrap_or(name.len());
            if end == 0 { name } else { &name[..end] }
        })
}

/// Argument text after the family name, without braces
pub fn tag_argument(tag: &str) -> &str {
    let body = tag
        .trim_start_matches('{')
        .trim_end_matches('}')
        .trim_start_matches('\\');
    let family = tag_family(tag);
    body.strip_prefix(family).unwrap_or(body)
}

fn family_key(tag: &str) -> FamilyKey<'_> {
    let family = tag_family(tag);
    if TOGGLE_FAMILIES.contains(&family) {
        let arg = tag_argument(tag).trim();
        (family, Some(arg != "0"))
    } else {
        (family, None)
    }
}

/// Whether a tag positions or animates the whole line
pub fn is_line_tag(tag: &str) -> bool {
    LINE_FAMILIES.contains(&tag_family(tag))
}

/// Ordered, family-deduplicated line tags found in `text`
pub fn line_tags(text: &str) -> Vec<String> {
    tokenize(text)
        .filter(|t| t.is_tag() && is_line_tag(t.as_str()))
        .map(|t| t.as_str().to_string())
        .collect()
}

/// Re-join a line after dropping duplicate tags of the same family
pub fn dedupe_tags(text: &str) -> String {
    tokenize(text).map(|t| t.as_str()).collect()
}

/// Remove every override tag, turning `\N` into a newline
pub fn strip_tags(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for token in tokenize(text) {
        if let Token::Text(s) = token {
            out.push_str(s);
        }
    }
    out.replace("\\N", "\n").replace("\\n", "\n").replace("\\h", " ")
}
