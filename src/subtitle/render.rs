/*!
 * Rendering of inline override tags into other formats' presentational
 * markup.
 *
 * Web cues get HTML spans with inline CSS. Plain indexed cues get the
 * `<b>`/`<i>`/`<u>`/`<s>`/`<font>` subset and keep `{\anN}` as is.
 * Text-only targets lose all overrides. Every element still open at the
 * end of a cue is closed there.
 */

use super::tags::{self, tag_argument, tag_family, tokenize, Token};

/// Target vocabulary for rendered markup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkupDialect {
    /// HTML spans with inline styles
    WebVtt,
    /// Classic SRT tags plus `{\anN}`
    Srt,
    /// No markup at all
    PlainText,
}

/// An element currently open in the output
struct OpenElement {
    family: &'static str,
    open: String,
    close: &'static str,
}

struct Renderer {
    dialect: MarkupDialect,
    out: String,
    stack: Vec<OpenElement>,
}

impl Renderer {
    fn push(&mut self, family: &'static str, open: String, close: &'static str) {
        self.out.push_str(&open);
        self.stack.push(OpenElement { family, open, close });
    }

    fn is_open(&self, family: &str) -> bool {
        self.stack.iter().any(|e| e.family == family)
    }

    /// Close one element, re-opening anything nested inside it
    fn close(&mut self, family: &str) {
        let Some(at) = self.stack.iter().rposition(|e| e.family == family) else {
            return;
        };
        let nested: Vec<OpenElement> = self.stack.drain(at + 1..).collect();
        for element in nested.iter().rev() {
            self.out.push_str(element.close);
        }
        if let Some(target) = self.stack.pop() {
            self.out.push_str(target.close);
        }
        for element in nested {
            self.out.push_str(&element.open);
            self.stack.push(element);
        }
    }

    fn close_all(&mut self) {
        while let Some(element) = self.stack.pop() {
            self.out.push_str(element.close);
        }
    }

    fn apply(&mut self, tag: &str) {
        let family = tag_family(tag);
        let arg = tag_argument(tag).trim();
        let web = self.dialect == MarkupDialect::WebVtt;

        match family {
            "b" | "i" | "u" | "s" => {
                let element: &'static str = match family {
                    "b" => "b",
                    "i" => "i",
                    "u" => "u",
                    _ => "s",
                };
                if arg != "0" {
                    if !self.is_open(element) {
                        let (open, close) = toggle_markup(element);
                        self.push(element, open.to_string(), close);
                    }
                } else {
                    self.close(element);
                }
            }
            "c" | "1c" => {
                if let Some(rgb) = ass_color_to_rgb(arg) {
                    if web {
                        self.push("span", format!(r#"<span style="color:{};">"#, rgb), "</span>");
                    } else {
                        self.push("font", format!(r#"<font color="{}">"#, rgb), "</font>");
                    }
                }
            }
            "fn" if !arg.is_empty() => {
                if web {
                    self.push("span", format!(r#"<span style="font-family:'{}',sans-serif;">"#, arg), "</span>");
                } else {
                    self.push("font", format!(r#"<font face="{}">"#, arg), "</font>");
                }
            }
            "fs" => {
                if let Ok(size) = arg.parse::<u32>() {
                    if web {
                        self.push("span", format!(r#"<span style="font-size:{}px;">"#, size), "</span>");
                    } else {
                        self.push("font", format!(r#"<font size="{}">"#, size), "</font>");
                    }
                }
            }
            "an" => {
                if let Some(css) = arg.parse::<u8>().ok().and_then(alignment_css) {
                    if web {
                        self.push("span", format!(r#"<span style="{}">"#, css), "</span>");
                    } else {
                        self.out.push_str(tag);
                    }
                }
            }
            "pos" if web => {
                if let Some((x, y)) = parse_pair(arg) {
                    self.push(
                        "span",
                        format!(r#"<span style="position:absolute;left:{}px;top:{}px;">"#, x, y),
                        "</span>",
                    );
                }
            }
            "r" => self.close_all(),
            _ => {}
        }
    }
}

fn toggle_markup(element: &str) -> (&'static str, &'static str) {
    match element {
        "b" => ("<b>", "</b>"),
        "i" => ("<i>", "</i>"),
        "u" => ("<u>", "</u>"),
        _ => ("<s>", "</s>"),
    }
}

/// `&HBBGGRR&` (optionally with a leading alpha byte) to `#RRGGBB`
pub fn ass_color_to_rgb(arg: &str) -> Option<String> {
    let hex = arg
        .trim_matches('&')
        .trim_start_matches(['H', 'h'])
        .trim_end_matches('&');
    if hex.is_empty() || hex.len() > 8 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let padded = format!("{:0>6}", hex);
    let bgr = &padded[padded.len() - 6..];
    Some(format!("#{}{}{}", &bgr[4..6], &bgr[2..4], &bgr[0..2]).to_uppercase())
}

/// Absolute-position CSS for numpad alignment 1-9
fn alignment_css(align: u8) -> Option<String> {
    if !(1..=9).contains(&align) {
        return None;
    }
    let column = (align - 1) % 3;
    let row = (align - 1) / 3;

    let text_align = ["left", "center", "right"][column as usize];
    let vertical = ["bottom", "middle", "top"][row as usize];
    let top = ["bottom:10%", "top:50%", "top:10%"][row as usize];
    let left = ["left:10%", "left:50%;transform:translateX(-50%)", "right:10%"][column as usize];
    let width = if column == 1 { "80%" } else { "auto" };

    Some(format!(
        "display:block;text-align:{};vertical-align:{};position:absolute;{};{};width:{};",
        text_align, vertical, top, left, width
    ))
}

fn parse_pair(arg: &str) -> Option<(f64, f64)> {
    let inner = arg.strip_prefix('(')?.strip_suffix(')')?;
    let (x, y) = inner.split_once(',')?;
    Some((x.trim().parse().ok()?, y.trim().parse().ok()?))
}

fn tidy(text: &str) -> String {
    text.trim()
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render one cue's text for the given dialect
pub fn render_markup(text: &str, dialect: MarkupDialect) -> String {
    if dialect == MarkupDialect::PlainText {
        return tidy(&tags::strip_tags(text));
    }

    let mut renderer = Renderer {
        dialect,
        out: String::with_capacity(text.len() + 16),
        stack: Vec::new(),
    };

    for token in tokenize(text) {
        match token {
            Token::Text(s) => renderer.out.push_str(&s.replace("\\N", "\n").replace("\\h", " ")),
            Token::Tag(tag) => renderer.apply(tag),
        }
    }
    renderer.close_all();

    tidy(&renderer.out)
}
