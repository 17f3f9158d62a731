/*!
 * Prompt text sent to providers.
 *
 * Several blocks can travel in one request. Each is introduced by an
 * `<<ENTRY_n>>` marker and the request ends with `<<END>>`; the reply is
 * expected to keep the markers so it can be split back per block.
 */

use crate::errors::TranslationError;

use super::formatting::FormatPreserver;

/// Characters of the sample used for language detection
pub const DETECTION_SAMPLE_CHARS: usize = 200;

const END_MARKER: &str = "<<END>>";

fn entry_marker(index: usize) -> String {
    format!("<<ENTRY_{}>>", index)
}

/// Translation prompt, or the custom prompt followed by the text
pub fn translation_prompt(text: &str, target_language: &str, topic: &str, custom_prompt: Option<&str>) -> String {
    let text = FormatPreserver::sanitize_subtitle_text(text);

    if let Some(custom) = custom_prompt.map(FormatPreserver::sanitize_prompt_input).filter(|p| !p.is_empty()) {
        return format!("{}\n\n{}", custom, text);
    }

    let topic = FormatPreserver::sanitize_prompt_input(topic);
    let context = if topic.is_empty() {
        String::new()
    } else {
        format!("The video is about {}. ", topic)
    };

    format!(
        "You are an expert subtitle translator with deep knowledge of conversational {lang}. \
{context}Translate the following video subtitle text into {lang}. Ensure the translation is:
  - Fluent, natural, and conversational, as if spoken by a native {lang} speaker in a movie or TV series.
  - Adjusted for colloquial expressions and idioms.
  - Grammatically correct and restructured for natural flow.
  - Preserving proper names, technical terms, and timing/formatting intact.
  - Each line translated separately with the same structure and line breaks.
  - Keep every <<ENTRY_n>> and <<END>> marker exactly where it is.
  - Do not add extra characters like repeated commas, unnecessary spaces, or comments.
Only return the translated subtitles without explanations or extra text:\n\n{text}",
        lang = target_language,
        context = context,
        text = text
    )
}

/// Prompt asking for the language code of a text sample
pub fn detection_prompt(text: &str) -> String {
    let sample: String = text.chars().take(DETECTION_SAMPLE_CHARS).collect();
    format!(
        "Detect the language of the following text and return only the language code (e.g., \"en\", \"fa\"):\n\n{}",
        sample
    )
}

/// Join block texts into one marked request body
pub fn build_batch<S: AsRef<str>>(texts: &[S]) -> String {
    let mut combined = String::new();
    for (idx, text) in texts.iter().enumerate() {
        combined.push_str(&entry_marker(idx));
        combined.push('\n');
        combined.push_str(text.as_ref());
        combined.push('\n');
    }
    combined.push_str(END_MARKER);
    combined
}

/// Split a marked reply back into `expected` segments
pub fn split_batch(response: &str, expected: usize) -> Result<Vec<String>, TranslationError> {
    let mut segments = Vec::with_capacity(expected);
    let mut cursor = 0;

    for idx in 0..expected {
        let start_marker = entry_marker(idx);
        let end_marker = if idx + 1 == expected {
            END_MARKER.to_string()
        } else {
            entry_marker(idx + 1)
        };

        let mismatch = || TranslationError::MarkerMismatch {
            expected,
            found: segments.len(),
        };

        let start = response[cursor..]
            .find(&start_marker)
            .map(|pos| cursor + pos + start_marker.len())
            .ok_or_else(mismatch)?;
        let end = response[start..]
            .find(&end_marker)
            .map(|pos| start + pos)
            .ok_or_else(mismatch)?;

        segments.push(response[start..end].trim().to_string());
        cursor = end;
    }

    Ok(segments)
}
