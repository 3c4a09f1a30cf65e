//! Time normalisation for transcript timestamps.
//!
//! Upstream transcript sources hand us numbers, `"m:ss"` strings, numeric
//! strings, or garbage. Everything funnels into a finite, non-negative second
//! value; anything unreadable lands at the start of the timeline so a broken
//! timestamp can only misplace its own segment.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static RE_MINUTES_SECONDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2}):(\d{1,2})$").unwrap());

/// Normalise an arbitrary JSON time value into seconds.
pub fn to_seconds(value: &Value) -> f64 {
    match value {
        Value::Number(number) => number.as_f64().map(sanitize).unwrap_or(0.0),
        Value::String(text) => str_to_seconds(text),
        _ => 0.0,
    }
}

/// Normalise a textual timestamp (`"m:ss"`, `"mm:ss"` or a plain number).
pub fn str_to_seconds(text: &str) -> f64 {
    let trimmed = text.trim();
    if let Some(caps) = RE_MINUTES_SECONDS.captures(trimmed) {
        let minutes: f64 = caps[1].parse().unwrap_or(0.0);
        let seconds: f64 = caps[2].parse().unwrap_or(0.0);
        return minutes * 60.0 + seconds;
    }
    trimmed.parse::<f64>().map(sanitize).unwrap_or(0.0)
}

fn sanitize(value: f64) -> f64 {
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}

/// Render a time-marker label: `m:ss`, or `h:mm:ss` from one hour on.
pub fn format_clock(seconds: f64) -> String {
    let total = sanitize(seconds).floor() as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}
