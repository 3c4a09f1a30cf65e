//! One transcript screen's worth of synchronization state.
//!
//! A [`SyncSession`] is a reducer: the host feeds it playback samples and user
//! input, and it answers with [`Effect`]s the host performs (scrolling,
//! seeking, re-rendering rows). Progress records leave through the session's
//! [`ProgressSink`] without waiting on storage.

use crate::arbiter::ScrollArbiter;
use crate::clock::Clock;
use crate::config::SyncConfig;
use crate::geometry::{RowGeometryProvider, Scroller};
use crate::index::ActiveSegmentTracker;
use crate::persist::ProgressSink;
use crate::scroll::compute_scroll_target;
use crate::segment::{Segment, TranscriptInput, segment_times};
use crate::synth::synthesize_timecodes;
use crate::throttle::{FlushReason, PlaybackSample, ProgressThrottle, SaveReason};
use tracing::{debug, info};

/// Work that must be performed by the host outside the reducer.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    ScrollTo { offset: f64, animated: bool },
    Seek { sec: f64 },
    /// Segment times changed (e.g. re-synthesized for a newly known
    /// duration); rows must be re-rendered and re-measured.
    TranscriptReplaced,
}

/// Playback source commands the engine may issue.
pub trait PlaybackControl {
    fn seek_to(&mut self, sec: f64);
}

pub struct SyncSession<C: Clock, S: ProgressSink> {
    config: SyncConfig,
    segments: Vec<Segment>,
    times: Vec<f64>,
    untimed_source: Option<TranscriptInput>,
    synthesized_for: Option<u32>,
    tracker: ActiveSegmentTracker,
    arbiter: ScrollArbiter<C>,
    throttle: ProgressThrottle,
    sink: S,
    ended: bool,
}

impl<C: Clock, S: ProgressSink> SyncSession<C, S> {
    pub fn new(config: SyncConfig, clock: C, sink: S) -> Self {
        let throttle = ProgressThrottle::new(config.progress);
        Self {
            config,
            segments: Vec::new(),
            times: Vec::new(),
            untimed_source: None,
            synthesized_for: None,
            tracker: ActiveSegmentTracker::new(),
            arbiter: ScrollArbiter::new(clock),
            throttle,
            sink,
            ended: false,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn active_index(&self) -> Option<usize> {
        self.tracker.current()
    }

    pub fn media_id(&self) -> Option<&str> {
        self.throttle.media_id()
    }

    pub fn arbiter(&self) -> &ScrollArbiter<C> {
        &self.arbiter
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Install a transcript. Untimed text is synthesized against the duration
    /// and re-synthesized later if a different duration shows up.
    pub fn load_transcript(&mut self, input: TranscriptInput, duration_sec: Option<f64>) {
        let duration = duration_sec.unwrap_or(0.0);
        self.segments = synthesize_timecodes(&input, duration);
        self.times = segment_times(&self.segments);
        self.tracker.reset();
        if input.is_timed() {
            self.untimed_source = None;
            self.synthesized_for = None;
        } else {
            self.synthesized_for = duration_key(duration_sec);
            self.untimed_source = Some(input);
        }
        info!(
            segments = self.segments.len(),
            synthesized = self.untimed_source.is_some(),
            "Transcript loaded"
        );
    }

    /// Begin a new media session. Progress for the previous media (if any) is
    /// flushed first.
    pub fn reset_session(&mut self, media_id: impl Into<String>) {
        let media_id = media_id.into();
        if self.throttle.media_id().is_some_and(|current| current != media_id) && !self.ended {
            self.flush(FlushReason::MediaSwitch);
        }
        self.throttle.reset_session(media_id);
        self.tracker.reset();
        self.arbiter.reset();
        self.ended = false;
    }

    /// Handle one playback status tick.
    pub fn on_sample<G>(&mut self, sample: &PlaybackSample, geometry: &G, effects: &mut Vec<Effect>)
    where
        G: RowGeometryProvider + ?Sized,
    {
        if self.ended {
            return;
        }
        self.maybe_resynthesize(sample.duration_sec, effects);

        if let Some((record, reason)) = self.throttle.on_sample(sample) {
            self.send(record, reason);
        }

        if let Some(idx) =
            self.tracker
                .update(&self.times, sample.position_sec, self.config.epsilon)
        {
            debug!(idx, position = sample.position_sec, "Active segment changed");
            self.auto_scroll(idx, geometry, effects);
        }
    }

    /// Scroll listener hook for user-driven scroll, drag, wheel or touch
    /// events. Events caused by the engine's own scrolls are ignored.
    pub fn on_user_scroll(&mut self) {
        self.arbiter.on_scroll_event();
    }

    /// A scroll the host knows came from the user. Registers even while an
    /// engine scroll is still in flight.
    pub fn mark_manual_interaction(&mut self) {
        self.arbiter.mark_manual_interaction();
    }

    /// The host finished applying the last engine scroll.
    pub fn end_programmatic_scroll(&mut self) {
        self.arbiter.end_programmatic_scroll();
    }

    /// The user tapped a segment's time marker.
    pub fn seek_to_segment(&mut self, index: usize, effects: &mut Vec<Effect>) {
        let Some(segment) = self.segments.get(index) else {
            debug!(index, "Seek to unknown segment ignored");
            return;
        };
        let sec = f64::from(segment.time);
        self.arbiter.mark_manual_interaction();
        self.tracker.update(&self.times, sec, self.config.epsilon);
        info!(index, sec, "Seeking to segment");
        effects.push(Effect::Seek { sec });
    }

    /// Explicit "jump to current line" request. The user asked for it, so the
    /// manual-scroll lock does not apply.
    pub fn scroll_to_active<G>(&mut self, geometry: &G, effects: &mut Vec<Effect>)
    where
        G: RowGeometryProvider + ?Sized,
    {
        let Some(idx) = self.tracker.current() else {
            return;
        };
        if let Some(offset) = compute_scroll_target(geometry, idx, &self.config.scroll) {
            info!(idx, offset, "Jumping to active segment");
            effects.push(Effect::ScrollTo {
                offset,
                animated: self.config.animate_scroll,
            });
        }
    }

    /// Perform effects against the host capabilities. Engine scrolls are
    /// wrapped in the programmatic guard.
    pub fn apply_effects<R, P>(&mut self, effects: Vec<Effect>, scroller: &mut R, playback: &mut P)
    where
        R: Scroller + ?Sized,
        P: PlaybackControl + ?Sized,
    {
        for effect in effects {
            match effect {
                Effect::ScrollTo { offset, animated } => {
                    self.arbiter
                        .begin_programmatic_scroll(self.config.programmatic_guard_ms);
                    scroller.scroll_to(offset, animated);
                }
                Effect::Seek { sec } => playback.seek_to(sec),
                Effect::TranscriptReplaced => {}
            }
        }
    }

    /// Force a save of the last known position without ending the session
    /// (e.g. a browser tab becoming hidden).
    pub fn flush(&mut self, reason: FlushReason) {
        if let Some((record, save_reason)) = self.throttle.flush(reason) {
            self.send(record, save_reason);
        }
    }

    /// End the session: force the final save. Later samples are ignored.
    pub fn end(&mut self, reason: FlushReason) {
        if self.ended {
            return;
        }
        self.flush(reason);
        self.ended = true;
        info!(?reason, "Sync session ended");
    }

    fn auto_scroll<G>(&mut self, idx: usize, geometry: &G, effects: &mut Vec<Effect>)
    where
        G: RowGeometryProvider + ?Sized,
    {
        if !self.config.auto_scroll {
            return;
        }
        if !self.arbiter.is_auto_scroll_allowed(self.config.lock_window_ms) {
            debug!(idx, "Auto-scroll suppressed by recent manual scroll");
            return;
        }
        if let Some(offset) = compute_scroll_target(geometry, idx, &self.config.scroll) {
            debug!(idx, offset, "Auto-scrolling to active segment");
            effects.push(Effect::ScrollTo {
                offset,
                animated: self.config.animate_scroll,
            });
        }
    }

    fn maybe_resynthesize(&mut self, duration_sec: Option<f64>, effects: &mut Vec<Effect>) {
        let Some(source) = &self.untimed_source else {
            return;
        };
        let key = duration_key(duration_sec);
        if key.is_none() || key == self.synthesized_for {
            return;
        }
        let duration = duration_sec.unwrap_or(0.0);
        self.segments = synthesize_timecodes(source, duration);
        self.times = segment_times(&self.segments);
        self.synthesized_for = key;
        self.tracker.reset();
        info!(
            duration,
            segments = self.segments.len(),
            "Re-synthesized transcript timecodes"
        );
        effects.push(Effect::TranscriptReplaced);
    }

    fn send(&self, record: crate::throttle::ProgressRecord, reason: SaveReason) {
        debug!(
            media_id = %record.media_id,
            progress_sec = record.progress_sec,
            duration_sec = record.duration_sec,
            ?reason,
            "Emitting progress save"
        );
        self.sink.send(record);
    }
}

impl<C: Clock, S: ProgressSink> Drop for SyncSession<C, S> {
    fn drop(&mut self) {
        self.end(FlushReason::Unmount);
    }
}

fn duration_key(duration_sec: Option<f64>) -> Option<u32> {
    duration_sec
        .filter(|d| d.is_finite() && *d >= 1.0)
        .map(|d| d.floor().min(f64::from(u32::MAX)) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::geometry::{RowSnapshot, Viewport};
    use crate::throttle::ProgressRecord;
    use std::cell::RefCell;
    use std::rc::Rc;
    use serde_json::json;

    #[derive(Clone, Default)]
    struct RecordingSink {
        saved: Rc<RefCell<Vec<ProgressRecord>>>,
    }

    impl ProgressSink for RecordingSink {
        fn send(&self, record: ProgressRecord) {
            self.saved.borrow_mut().push(record);
        }
    }

    #[derive(Default)]
    struct RecordingHost {
        scrolls: Vec<f64>,
        seeks: Vec<f64>,
    }

    impl Scroller for RecordingHost {
        fn scroll_to(&mut self, offset: f64, _animated: bool) {
            self.scrolls.push(offset);
        }
    }

    impl PlaybackControl for RecordingHost {
        fn seek_to(&mut self, sec: f64) {
            self.seeks.push(sec);
        }
    }

    /// Forty one-line segments five seconds apart, 30px rows, 300px viewport.
    fn build_test_session() -> (
        SyncSession<ManualClock, RecordingSink>,
        ManualClock,
        RecordingSink,
        RowSnapshot,
    ) {
        let clock = ManualClock::new(10_000);
        let sink = RecordingSink::default();
        let mut session = SyncSession::new(SyncConfig::default(), clock.clone(), sink.clone());
        let raw: Vec<_> = (0..40)
            .map(|i| json!({ "time": i * 5, "text": format!("Line {i}") }))
            .collect();
        session.load_transcript(TranscriptInput::from_json(json!(raw)), Some(200.0));
        session.reset_session("lesson-1");
        let rows = RowSnapshot::stacked(&[30.0; 40], 0.0, Viewport::new(0.0, 300.0));
        (session, clock, sink, rows)
    }

    fn progress(sink: &RecordingSink) -> Vec<u32> {
        sink.saved.borrow().iter().map(|r| r.progress_sec).collect()
    }

    fn scroll_offsets(effects: &[Effect]) -> Vec<f64> {
        effects
            .iter()
            .filter_map(|effect| match effect {
                Effect::ScrollTo { offset, .. } => Some(*offset),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn active_row_below_comfort_band_scrolls() {
        let (mut session, _clock, sink, rows) = build_test_session();
        let mut effects = Vec::new();
        session.on_sample(&PlaybackSample::playing(0.0, Some(200.0)), &rows, &mut effects);
        assert_eq!(session.active_index(), Some(0));
        assert!(effects.is_empty(), "row 0 sits in view at offset 0");

        // Row 8 spans 240..270, below the 80..220 band.
        session.on_sample(&PlaybackSample::playing(40.0, Some(200.0)), &rows, &mut effects);
        assert_eq!(session.active_index(), Some(8));
        assert_eq!(scroll_offsets(&effects), vec![30.0]);
        assert_eq!(progress(&sink), vec![0, 40]);
    }

    #[test]
    fn manual_scroll_locks_out_auto_scroll() {
        let (mut session, clock, _sink, rows) = build_test_session();
        let mut effects = Vec::new();
        session.on_sample(&PlaybackSample::playing(0.0, None), &rows, &mut effects);

        session.on_user_scroll();
        clock.advance(300);
        session.on_sample(&PlaybackSample::playing(40.0, None), &rows, &mut effects);
        assert!(effects.is_empty(), "locked requests are dropped");

        clock.advance(500);
        session.on_sample(&PlaybackSample::playing(45.0, None), &rows, &mut effects);
        assert_eq!(scroll_offsets(&effects), vec![60.0]);
    }

    #[test]
    fn engine_scrolls_do_not_count_as_manual() {
        let (mut session, clock, _sink, rows) = build_test_session();
        let mut host = RecordingHost::default();
        let mut effects = Vec::new();
        session.on_sample(&PlaybackSample::playing(40.0, None), &rows, &mut effects);
        session.apply_effects(std::mem::take(&mut effects), &mut host, &mut RecordingHost::default());
        assert_eq!(host.scrolls.len(), 1);

        // The host's scroll listener fires while the animation runs.
        clock.advance(100);
        session.on_user_scroll();
        assert_eq!(session.arbiter().last_manual_at(), None);
        assert!(session.arbiter().is_auto_scroll_allowed(700));
    }

    #[test]
    fn known_user_drag_during_engine_scroll_locks() {
        let (mut session, clock, _sink, rows) = build_test_session();
        let mut host = RecordingHost::default();
        let mut effects = Vec::new();
        session.on_sample(&PlaybackSample::playing(40.0, None), &rows, &mut effects);
        session.apply_effects(std::mem::take(&mut effects), &mut host, &mut RecordingHost::default());
        assert!(session.arbiter().is_programmatic());

        clock.advance(250);
        session.mark_manual_interaction();
        assert_eq!(session.arbiter().last_manual_at(), Some(10_250));
        session.on_sample(&PlaybackSample::playing(45.0, None), &rows, &mut effects);
        assert!(effects.is_empty(), "drag locks out the next auto-scroll");
    }

    #[test]
    fn finished_engine_scroll_reopens_scroll_listener() {
        let (mut session, clock, _sink, rows) = build_test_session();
        let mut host = RecordingHost::default();
        let mut effects = Vec::new();
        session.on_sample(&PlaybackSample::playing(40.0, None), &rows, &mut effects);
        session.apply_effects(std::mem::take(&mut effects), &mut host, &mut RecordingHost::default());

        session.end_programmatic_scroll();
        assert!(!session.arbiter().is_programmatic());
        clock.advance(50);
        session.on_user_scroll();
        assert_eq!(session.arbiter().last_manual_at(), Some(10_050));
    }

    #[test]
    fn tapping_a_marker_seeks_and_locks() {
        let (mut session, _clock, _sink, rows) = build_test_session();
        let mut effects = Vec::new();
        session.seek_to_segment(12, &mut effects);
        assert_eq!(effects, vec![Effect::Seek { sec: 60.0 }]);
        assert_eq!(session.active_index(), Some(12));

        let mut host = RecordingHost::default();
        let mut playback = RecordingHost::default();
        session.apply_effects(effects, &mut host, &mut playback);
        assert_eq!(playback.seeks, vec![60.0]);

        let mut effects = Vec::new();
        session.on_sample(&PlaybackSample::playing(65.0, None), &rows, &mut effects);
        assert!(effects.is_empty(), "seek counts as manual interaction");

        session.seek_to_segment(99, &mut effects);
        assert!(effects.is_empty());
    }

    #[test]
    fn jump_to_active_ignores_the_lock() {
        let (mut session, _clock, _sink, rows) = build_test_session();
        let mut effects = Vec::new();
        session.seek_to_segment(20, &mut effects);
        effects.clear();
        session.scroll_to_active(&rows, &mut effects);
        // Row 20 spans 600..630.
        assert_eq!(scroll_offsets(&effects), vec![630.0 - 300.0 + 60.0]);
    }

    #[test]
    fn drop_forces_final_save() {
        let (mut session, _clock, sink, rows) = build_test_session();
        let mut effects = Vec::new();
        session.on_sample(&PlaybackSample::playing(0.0, Some(200.0)), &rows, &mut effects);
        session.on_sample(&PlaybackSample::playing(7.5, Some(200.0)), &rows, &mut effects);
        drop(session);
        assert_eq!(progress(&sink), vec![0, 7]);
    }

    #[test]
    fn ended_session_ignores_samples_and_flushes_once() {
        let (mut session, _clock, sink, rows) = build_test_session();
        let mut effects = Vec::new();
        session.on_sample(&PlaybackSample::playing(3.0, None), &rows, &mut effects);
        session.end(FlushReason::NavigateAway);
        session.on_sample(&PlaybackSample::playing(50.0, None), &rows, &mut effects);
        drop(session);
        assert_eq!(progress(&sink), vec![3, 3]);
    }

    #[test]
    fn hidden_tab_flushes_without_ending() {
        let (mut session, _clock, sink, rows) = build_test_session();
        let mut effects = Vec::new();
        session.on_sample(&PlaybackSample::playing(4.0, None), &rows, &mut effects);
        session.flush(FlushReason::Hidden);
        assert!(!session.is_ended());
        session.on_sample(&PlaybackSample::playing(14.0, None), &rows, &mut effects);
        session.end(FlushReason::Unmount);
        assert_eq!(progress(&sink), vec![4, 4, 14, 14]);
    }

    #[test]
    fn switching_media_flushes_previous_session() {
        let (mut session, _clock, sink, rows) = build_test_session();
        let mut effects = Vec::new();
        session.on_sample(&PlaybackSample::playing(12.0, None), &rows, &mut effects);
        session.reset_session("lesson-2");
        session.on_sample(&PlaybackSample::playing(1.0, None), &rows, &mut effects);
        session.end(FlushReason::Unmount);

        let saved = sink.saved.borrow();
        let ids: Vec<&str> = saved.iter().map(|r| r.media_id.as_str()).collect();
        assert_eq!(ids, vec!["lesson-1", "lesson-1", "lesson-2", "lesson-2"]);
        assert_eq!(saved[1].progress_sec, 12);
    }

    #[test]
    fn untimed_transcript_resynthesizes_once_duration_is_known() {
        let clock = ManualClock::new(0);
        let sink = RecordingSink::default();
        let mut session = SyncSession::new(SyncConfig::default(), clock, sink);
        session.load_transcript(
            TranscriptInput::Untimed("aaaaaaaaa.\nbbbbbbbbb.".to_string()),
            None,
        );
        session.reset_session("text-lesson");
        let times: Vec<u32> = session.segments().iter().map(|s| s.time).collect();
        assert_eq!(times, vec![0, 1]);

        let rows = RowSnapshot::stacked(&[30.0; 2], 0.0, Viewport::new(0.0, 300.0));
        let mut effects = Vec::new();
        session.on_sample(&PlaybackSample::playing(0.0, Some(100.0)), &rows, &mut effects);
        assert!(effects.contains(&Effect::TranscriptReplaced));
        let times: Vec<u32> = session.segments().iter().map(|s| s.time).collect();
        assert_eq!(times, vec![0, 50]);

        effects.clear();
        session.on_sample(&PlaybackSample::playing(1.0, Some(100.4)), &rows, &mut effects);
        assert!(!effects.contains(&Effect::TranscriptReplaced));
    }

    #[test]
    fn auto_scroll_can_be_disabled() {
        let clock = ManualClock::new(0);
        let config = SyncConfig {
            auto_scroll: false,
            ..SyncConfig::default()
        };
        let mut session = SyncSession::new(config, clock, RecordingSink::default());
        session.load_transcript(
            TranscriptInput::from_json(json!([
                { "time": 0, "text": "a" },
                { "time": 100, "text": "b" }
            ])),
            Some(200.0),
        );
        let rows = RowSnapshot::stacked(&[400.0; 2], 0.0, Viewport::new(0.0, 300.0));
        let mut effects = Vec::new();
        session.on_sample(&PlaybackSample::playing(150.0, None), &rows, &mut effects);
        assert_eq!(session.active_index(), Some(1));
        assert!(effects.is_empty());
    }
}
