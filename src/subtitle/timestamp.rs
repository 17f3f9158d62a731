/*!
 * Subtitle timestamp parsing and rendering.
 *
 * Accepted input: `H+:MM:SS` or `M+:SS` followed by `,`, `.` or `:` and a
 * two or three digit fraction. Two digits are centiseconds.
 */

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::SubtitleError;

static TIMESTAMP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+):(\d{2}):(\d{2})[,.:](\d{2,3})$|^(\d+):(\d{2})[,.:](\d{2,3})$")
        .expect("timestamp regex")
});

/// A point on the subtitle timeline with millisecond precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp {
    millis: u64,
}

impl Timestamp {
    pub fn from_millis(millis: u64) -> Self {
        Self { millis }
    }

    pub fn as_millis(&self) -> u64 {
        self.millis
    }

    /// Parse any accepted timestamp spelling
    pub fn parse(text: &str) -> Result<Self, SubtitleError> {
        let trimmed = text.trim();
        let caps = TIMESTAMP
            .captures(trimmed)
            .ok_or_else(|| SubtitleError::InvalidTimestamp(trimmed.to_string()))?;

        let invalid = || SubtitleError::InvalidTimestamp(trimmed.to_string());
        let num = |i: usize| -> Result<u64, SubtitleError> {
            caps.get(i)
                .map_or(Ok(0), |m| m.as_str().parse::<u64>().map_err(|_| invalid()))
        };
        let fraction = |i: usize| -> Result<u64, SubtitleError> {
            let digits = caps.get(i).map_or("0", |m| m.as_str());
            let value = digits.parse::<u64>().map_err(|_| invalid())?;
            Ok(if digits.len() == 2 { value * 10 } else { value })
        };

        // (field, unit) pairs; any overflow rejects the timestamp
        let fields = if caps.get(1).is_some() {
            [(num(1)?, 3_600_000), (num(2)?, 60_000), (num(3)?, 1000)]
        } else {
            [(0, 3_600_000), (num(5)?, 60_000), (num(6)?, 1000)]
        };
        let fraction = fraction(if caps.get(1).is_some() { 4 } else { 7 })?;
        let millis = fields
            .iter()
            .try_fold(fraction, |acc, &(value, unit)| value.checked_mul(unit)?.checked_add(acc))
            .ok_or_else(invalid)?;
        Ok(Self { millis })
    }

    /// Whether `text` matches the timestamp grammar and fits the timeline
    pub fn is_valid(text: &str) -> bool {
        Self::parse(text).is_ok()
    }

    fn parts(&self) -> (u64, u64, u64, u64) {
        let ms = self.millis % 1000;
        let total_secs = self.millis / 1000;
        (total_secs / 3600, (total_secs % 3600) / 60, total_secs % 60, ms)
    }

    /// `HH:MM:SS,mmm`
    pub fn to_srt(&self) -> String {
        let (h, m, s, ms) = self.parts();
        format!("{:02}:{:02}:{:02},{:03}", h, m, s, ms)
    }

    /// `HH:MM:SS.mmm`
    pub fn to_vtt(&self) -> String {
        let (h, m, s, ms) = self.parts();
        format!("{:02}:{:02}:{:02}.{:03}", h, m, s, ms)
    }

    /// `H:MM:SS.cc`
    pub fn to_ass(&self) -> String {
        let (h, m, s, ms) = self.parts();
        format!("{}:{:02}:{:02}.{:02}", h, m, s, ms / 10)
    }

    /// Frame number at the given rate, rounded to the nearest frame
    pub fn to_frames(&self, fps: f64) -> u64 {
        (self.millis as f64 * fps / 1000.0).round() as u64
    }

    pub fn from_frames(frames: u64, fps: f64) -> Self {
        Self::from_millis((frames as f64 * 1000.0 / fps).round() as u64)
    }

    pub fn saturating_add_millis(&self, millis: u64) -> Self {
        Self::from_millis(self.millis.saturating_add(millis))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_srt())
    }
}
