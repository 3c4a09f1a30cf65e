//! Rate-limited progress saves for one media session.
//!
//! The throttle turns a stream of playback samples into a sparse sequence of
//! [`ProgressRecord`]s: one immediately, then one per `interval_secs` of media
//! time while playing, plus forced saves on pause and at session end.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use ts_rs::TS;

/// One status tick from the playback source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PlaybackSample {
    pub position_sec: f64,
    #[ts(optional)]
    pub duration_sec: Option<f64>,
    pub is_playing: bool,
}

impl PlaybackSample {
    pub fn playing(position_sec: f64, duration_sec: Option<f64>) -> Self {
        Self {
            position_sec,
            duration_sec,
            is_playing: true,
        }
    }

    pub fn paused(position_sec: f64, duration_sec: Option<f64>) -> Self {
        Self {
            position_sec,
            duration_sec,
            is_playing: false,
        }
    }
}

/// The unit handed to the persistence capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProgressRecord {
    pub media_id: String,
    pub progress_sec: u32,
    pub duration_sec: u32,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ThrottleConfig {
    /// Media seconds that must elapse between periodic saves.
    pub interval_secs: u32,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self { interval_secs: 10 }
    }
}

/// Why a save was emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveReason {
    Initial,
    Interval,
    Paused,
    Flush(FlushReason),
}

/// Events that end (or interrupt) a session and force a save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushReason {
    Unmount,
    NavigateAway,
    /// Browser tab hidden or page unloading.
    Hidden,
    MediaSwitch,
}

#[derive(Debug, Clone, Default)]
pub struct ProgressThrottle {
    config: ThrottleConfig,
    media_id: Option<String>,
    last_sent_sec: Option<u32>,
    sent_once: bool,
    was_playing: bool,
    last_position: Option<f64>,
    last_duration: Option<f64>,
}

impl ProgressThrottle {
    pub fn new(config: ThrottleConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Start a fresh session; the high-water mark and sent-once flag are
    /// cleared.
    pub fn reset_session(&mut self, media_id: impl Into<String>) {
        let media_id = media_id.into();
        debug!(%media_id, "Progress session reset");
        self.media_id = Some(media_id);
        self.last_sent_sec = None;
        self.sent_once = false;
        self.was_playing = false;
        self.last_position = None;
        self.last_duration = None;
    }

    pub fn media_id(&self) -> Option<&str> {
        self.media_id.as_deref()
    }

    pub fn last_sent_sec(&self) -> Option<u32> {
        self.last_sent_sec
    }

    pub fn has_sent(&self) -> bool {
        self.sent_once
    }

    /// Feed one sample; returns the record to save, if one is due.
    pub fn on_sample(&mut self, sample: &PlaybackSample) -> Option<(ProgressRecord, SaveReason)> {
        if self.media_id.is_none() || !sample.position_sec.is_finite() {
            trace!(?sample, "Ignoring progress sample");
            return None;
        }
        let position = sample.position_sec.max(0.0);
        self.last_position = Some(position);
        if let Some(duration) = sample.duration_sec.filter(|d| d.is_finite() && *d > 0.0) {
            self.last_duration = Some(duration);
        }
        let second = whole_seconds(position);

        let reason = if !self.sent_once {
            Some(SaveReason::Initial)
        } else if self.was_playing && !sample.is_playing {
            Some(SaveReason::Paused)
        } else if sample.is_playing && self.interval_elapsed(second) {
            Some(SaveReason::Interval)
        } else {
            None
        };
        self.was_playing = sample.is_playing;

        reason.and_then(|reason| self.emit(second).map(|record| (record, reason)))
    }

    /// Force a save of the last known position.
    pub fn flush(&mut self, reason: FlushReason) -> Option<(ProgressRecord, SaveReason)> {
        let position = self.last_position?;
        self.emit(whole_seconds(position))
            .map(|record| (record, SaveReason::Flush(reason)))
    }

    fn interval_elapsed(&self, second: u32) -> bool {
        let interval = i64::from(self.config.interval_secs.max(1));
        match self.last_sent_sec {
            Some(last) => i64::from(second) - i64::from(last) >= interval,
            None => true,
        }
    }

    fn emit(&mut self, second: u32) -> Option<ProgressRecord> {
        let media_id = self.media_id.clone()?;
        self.last_sent_sec = Some(second);
        self.sent_once = true;
        Some(ProgressRecord {
            media_id,
            progress_sec: second,
            duration_sec: self.last_duration.map(whole_seconds).unwrap_or(0),
        })
    }
}

fn whole_seconds(value: f64) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        0
    } else if value >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        value.floor() as u32
    }
}
