//! Transcript segments and transcript ingestion.

use crate::time::to_seconds;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{debug, info};
use ts_rs::TS;

/// One timestamped unit of transcript text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Segment {
    /// Start offset from the beginning of the media, in whole seconds.
    pub time: u32,
    pub words: Vec<String>,
}

impl Segment {
    pub fn new(time: u32, words: Vec<String>) -> Self {
        Self { time, words }
    }

    pub fn from_text(time: u32, text: &str) -> Self {
        Self {
            time,
            words: text.split_whitespace().map(str::to_string).collect(),
        }
    }

    pub fn text(&self) -> String {
        self.words.join(" ")
    }
}

/// Start times as the index search consumes them.
pub fn segment_times(segments: &[Segment]) -> Vec<f64> {
    segments.iter().map(|segment| f64::from(segment.time)).collect()
}

/// Text of a pre-timed segment: either running text or a token list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SegmentText {
    Tokens(Vec<String>),
    Text(String),
}

/// A segment as an upstream source delivers it, before time normalisation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawSegment {
    pub time: Value,
    #[serde(alias = "words")]
    pub text: SegmentText,
}

impl RawSegment {
    pub fn to_segment(&self) -> Segment {
        let seconds = to_seconds(&self.time).floor();
        let time = if seconds >= f64::from(u32::MAX) {
            u32::MAX
        } else {
            seconds as u32
        };
        let words = match &self.text {
            SegmentText::Tokens(tokens) => tokens
                .iter()
                .map(|token| token.trim())
                .filter(|token| !token.is_empty())
                .map(str::to_string)
                .collect(),
            SegmentText::Text(text) => text.split_whitespace().map(str::to_string).collect(),
        };
        Segment { time, words }
    }
}

/// A time-less `{text}` entry; its text is joined into untimed input.
#[derive(Debug, Deserialize)]
struct TextEntry {
    #[serde(alias = "words")]
    text: SegmentText,
}

impl TextEntry {
    fn into_line(self) -> String {
        match self.text {
            SegmentText::Tokens(tokens) => tokens.join(" "),
            SegmentText::Text(text) => text,
        }
    }
}

/// Transcript payload, classified once at ingestion.
#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptInput {
    /// Segments that already carry their own start times.
    Timed(Vec<RawSegment>),
    /// Plain text or markup with no timing information.
    Untimed(String),
}

impl TranscriptInput {
    /// Classify a JSON transcript document.
    ///
    /// An array whose every element is a `{time, text}` object is timed. A JSON
    /// string, an array of strings, or an array of `{text}` objects without
    /// times is untimed text. Any other shape yields an empty untimed
    /// transcript.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::String(text) => TranscriptInput::Untimed(text),
            Value::Array(items) => {
                if !items.is_empty() && items.iter().all(Value::is_string) {
                    let lines: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
                    return TranscriptInput::Untimed(lines.join("\n"));
                }
                let every_timed = items
                    .iter()
                    .all(|item| item.get("time").is_some_and(|time| !time.is_null()));
                if every_timed {
                    let parsed: Result<Vec<RawSegment>, _> = items
                        .into_iter()
                        .map(serde_json::from_value::<RawSegment>)
                        .collect();
                    return match parsed {
                        Ok(segments) => TranscriptInput::Timed(segments),
                        Err(err) => {
                            debug!(error = %err, "Transcript array is not a list of timed segments");
                            TranscriptInput::Untimed(String::new())
                        }
                    };
                }
                let parsed: Result<Vec<TextEntry>, _> = items
                    .into_iter()
                    .map(serde_json::from_value::<TextEntry>)
                    .collect();
                match parsed {
                    Ok(entries) => {
                        debug!(entries = entries.len(), "Transcript entries carry no times");
                        let lines: Vec<String> =
                            entries.into_iter().map(TextEntry::into_line).collect();
                        TranscriptInput::Untimed(lines.join("\n"))
                    }
                    Err(err) => {
                        debug!(error = %err, "Transcript array is not a list of segments");
                        TranscriptInput::Untimed(String::new())
                    }
                }
            }
            other => {
                debug!(kind = json_kind(&other), "Unsupported transcript shape");
                TranscriptInput::Untimed(String::new())
            }
        }
    }

    /// Classify raw file contents: JSON documents are inspected, anything
    /// else is treated as text or markup.
    pub fn from_contents(contents: &str) -> Self {
        let trimmed = contents.trim_start();
        if trimmed.starts_with('[') || trimmed.starts_with('"') {
            if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
                return Self::from_json(value);
            }
        }
        TranscriptInput::Untimed(contents.to_string())
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Reading transcript {}", path.display()))?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let input = if is_json {
            let value: Value = serde_json::from_str(&contents)
                .with_context(|| format!("Parsing transcript JSON {}", path.display()))?;
            Self::from_json(value)
        } else {
            Self::from_contents(&contents)
        };
        info!(
            path = %path.display(),
            timed = input.is_timed(),
            "Loaded transcript"
        );
        Ok(input)
    }

    pub fn is_timed(&self) -> bool {
        matches!(self, TranscriptInput::Timed(_))
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Sort segments by start time and push ties forward so start times are
/// strictly increasing.
///
/// Times near `u32::MAX` are lowered first so every later segment still has
/// room for its tie-break step.
pub fn normalize_segments(mut segments: Vec<Segment>) -> Vec<Segment> {
    segments.sort_by_key(|segment| segment.time);
    let last = segments.len().saturating_sub(1);
    for (idx, segment) in segments.iter_mut().enumerate() {
        let room = u32::try_from(last - idx).unwrap_or(u32::MAX);
        segment.time = segment.time.min(u32::MAX.saturating_sub(room));
    }
    let mut previous: Option<u32> = None;
    for segment in &mut segments {
        if let Some(prev) = previous {
            if segment.time <= prev {
                segment.time = prev.saturating_add(1);
            }
        }
        previous = Some(segment.time);
    }
    segments
}
