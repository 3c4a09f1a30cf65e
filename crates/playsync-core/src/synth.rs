//! Approximate timecodes for transcripts that arrive without timing.
//!
//! Untimed text is cut into sentence-like units and each unit starts at a time
//! proportional to the characters that precede it, spread across the media
//! duration. Output is a pure function of `(input, duration)`.

use crate::segment::{RawSegment, Segment, TranscriptInput, normalize_segments};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;
use unicode_normalization::UnicodeNormalization;

static RE_BLOCK_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)<\s*/?\s*(?:p|div|br|li|ul|ol|h[1-6]|section|article|blockquote|header|footer|tr|td|th|pre|hr)\b[^>]*>",
    )
    .unwrap()
});
static RE_ANY_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());
static RE_HORIZONTAL_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t\u{00A0}\r\f]+").unwrap());
static RE_LINE_BREAKS: Lazy<Regex> = Lazy::new(|| Regex::new(r" ?\n[\n ]*").unwrap());

const ENTITIES: [(&str, &str); 7] = [
    ("&nbsp;", " "),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&apos;", "'"),
    ("&amp;", "&"),
];

/// Produce strictly increasing segments for a transcript.
///
/// Timed input keeps its own (floored, non-negative) times; untimed input is
/// synthesized across `max(1, floor(duration_sec))` seconds. Both paths go
/// through the tie-break pass.
pub fn synthesize_timecodes(input: &TranscriptInput, duration_sec: f64) -> Vec<Segment> {
    match input {
        TranscriptInput::Timed(raw) => {
            normalize_segments(raw.iter().map(RawSegment::to_segment).collect())
        }
        TranscriptInput::Untimed(text) => synthesize_from_text(text, duration_sec),
    }
}

fn synthesize_from_text(text: &str, duration_sec: f64) -> Vec<Segment> {
    let units = split_units(&strip_markup(text));
    if units.is_empty() {
        return Vec::new();
    }

    let total_seconds = if duration_sec.is_finite() {
        duration_sec.floor().max(1.0)
    } else {
        1.0
    };
    let lengths: Vec<usize> = units.iter().map(|unit| unit.chars().count()).collect();
    let total_chars = lengths.iter().sum::<usize>().max(1) as f64;

    let mut before = 0usize;
    let segments = units
        .iter()
        .zip(&lengths)
        .map(|(unit, len)| {
            let start = ((before as f64 / total_chars) * total_seconds).floor();
            before += len;
            Segment::from_text(start as u32, unit)
        })
        .collect();

    let segments = normalize_segments(segments);
    debug!(
        units = units.len(),
        total_seconds,
        "Synthesized transcript timecodes"
    );
    segments
}

/// Turn markup into plain text with one line per block.
pub fn strip_markup(text: &str) -> String {
    let blocks = RE_BLOCK_TAG.replace_all(text, "\n");
    let mut plain = RE_ANY_TAG.replace_all(&blocks, "").into_owned();
    for (entity, replacement) in ENTITIES {
        plain = plain.replace(entity, replacement);
    }
    let plain: String = plain.nfc().collect();
    let plain = RE_HORIZONTAL_WS.replace_all(&plain, " ");
    RE_LINE_BREAKS.replace_all(&plain, "\n").trim().to_string()
}

/// Split plain text into sentence-like units on `.`, `!`, `?` and newlines.
///
/// Runs of terminators stay attached to their sentence, and a period between
/// two digits does not end one.
pub fn split_units(text: &str) -> Vec<String> {
    let mut units = Vec::new();
    let mut current = String::new();
    let chars: Vec<char> = text.chars().collect();

    for (idx, ch) in chars.iter().copied().enumerate() {
        if ch == '\n' {
            push_unit(&mut units, &mut current);
            continue;
        }
        current.push(ch);
        if !is_terminator(ch) {
            continue;
        }
        let prev = idx.checked_sub(1).and_then(|i| chars.get(i)).copied();
        let next = chars.get(idx + 1).copied();
        let decimal_point = ch == '.'
            && prev.is_some_and(|c| c.is_ascii_digit())
            && next.is_some_and(|c| c.is_ascii_digit());
        let more_punctuation = next.is_some_and(is_terminator);
        if !decimal_point && !more_punctuation {
            push_unit(&mut units, &mut current);
        }
    }
    push_unit(&mut units, &mut current);
    units
}

fn is_terminator(ch: char) -> bool {
    matches!(ch, '.' | '!' | '?')
}

fn push_unit(units: &mut Vec<String>, current: &mut String) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        units.push(trimmed.to_string());
    }
    current.clear();
}
