//! Headless replay of a transcript against a simulated playback clock.
//!
//! Plays the host-screen role: samples go into a [`SyncSession`], the
//! resulting effects land on a [`ReplayLayout`] and a simulated player, and
//! progress is saved to the file store in the background.

use crate::cancellation::CancellationToken;
use crate::config::AppConfig;
use crate::layout::{LayoutMetrics, ReplayLayout};
use anyhow::{Context, Result};
use playsync_core::clock::SystemClock;
use playsync_core::persist::BackgroundSaver;
use playsync_core::segment::{RawSegment, TranscriptInput};
use playsync_core::session::{Effect, PlaybackControl, SyncSession};
use playsync_core::store::FileProgressStore;
use playsync_core::throttle::{FlushReason, PlaybackSample};
use playsync_core::time::format_clock;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

const BASE_WPM: f64 = 170.0;
const TIMED_TAIL_SECS: f64 = 5.0;

/// Command-line driven replay parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplayOptions {
    pub transcript: PathBuf,
    pub media_id: Option<String>,
    pub duration: Option<f64>,
    pub speed: Option<f64>,
    pub pause_at: Option<f64>,
    /// `(media second, segment index)`: tap a segment's marker at that time.
    pub seek_at: Vec<(f64, usize)>,
    /// `(media second, pixels)`: drag the list by hand at that time.
    pub scroll_at: Vec<(f64, f64)>,
    /// Ignore saved progress and start from zero.
    pub restart: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReplaySummary {
    pub media_id: String,
    pub ticks: usize,
    pub final_position: f64,
    pub duration: f64,
    pub active_index: Option<usize>,
    pub scrolls: usize,
    pub seeks: usize,
    pub interrupted: bool,
}

struct SimulatedPlayer {
    position: f64,
    duration: f64,
    seeks: usize,
}

impl PlaybackControl for SimulatedPlayer {
    fn seek_to(&mut self, sec: f64) {
        self.position = sec.clamp(0.0, self.duration);
        self.seeks += 1;
        info!(position = %format_clock(self.position), "Player seeked");
    }
}

/// Rough media length when none was given.
pub fn estimate_duration(input: &TranscriptInput) -> f64 {
    match input {
        TranscriptInput::Timed(raw) => {
            let last = raw
                .iter()
                .map(RawSegment::to_segment)
                .map(|segment| segment.time)
                .max()
                .unwrap_or(0);
            f64::from(last) + TIMED_TAIL_SECS
        }
        TranscriptInput::Untimed(text) => {
            let words = text.split_whitespace().count() as f64;
            (words / BASE_WPM * 60.0).ceil().max(1.0)
        }
    }
}

pub fn run_replay(
    config: &AppConfig,
    options: &ReplayOptions,
    cancel: &CancellationToken,
) -> Result<ReplaySummary> {
    let input = TranscriptInput::from_path(&options.transcript)?;
    let media_id = options
        .media_id
        .clone()
        .unwrap_or_else(|| options.transcript.display().to_string());
    let duration = options
        .duration
        .filter(|d| d.is_finite() && *d > 0.0)
        .unwrap_or_else(|| estimate_duration(&input));

    let store = FileProgressStore::new(&config.cache_dir);
    let resume_from = if options.restart {
        None
    } else {
        store
            .load_progress(&media_id)
            .map(|record| f64::from(record.progress_sec))
            .filter(|sec| *sec < duration)
    };
    if let Some(sec) = resume_from {
        info!(%media_id, position = %format_clock(sec), "Resuming from saved progress");
    }

    let saver = BackgroundSaver::spawn(store).context("Starting progress saver")?;
    let sync_config = config.to_sync_config();
    info!(
        surface = %sync_config.surface,
        mode = %sync_config.scroll.mode,
        lock_window_ms = sync_config.lock_window_ms,
        interval_secs = sync_config.progress.interval_secs,
        "Active sync configuration"
    );
    let mut session = SyncSession::new(sync_config, SystemClock::new(), &saver);
    session.load_transcript(input, Some(duration));
    session.reset_session(media_id.clone());

    let mut layout = ReplayLayout::build(session.segments(), LayoutMetrics::from_config(config));
    let mut player = SimulatedPlayer {
        position: resume_from.unwrap_or(0.0),
        duration,
        seeks: 0,
    };

    let speed = options
        .speed
        .filter(|s| s.is_finite() && *s > 0.0)
        .map(|s| s.clamp(0.1, 64.0))
        .unwrap_or_else(|| config.speed());
    let tick = Duration::from_millis(config.tick_ms());
    let step = tick.as_secs_f64() * speed;

    let mut seeks = options.seek_at.clone();
    seeks.sort_by(|a, b| a.0.total_cmp(&b.0));
    let mut seeks = seeks.into_iter().peekable();
    let mut scrolls = options.scroll_at.clone();
    scrolls.sort_by(|a, b| a.0.total_cmp(&b.0));
    let mut scrolls = scrolls.into_iter().peekable();

    info!(
        %media_id,
        segments = session.segments().len(),
        duration = %format_clock(duration),
        speed,
        "Starting replay"
    );

    let mut ticks = 0usize;
    let mut interrupted = false;
    loop {
        if cancel.is_cancelled() {
            interrupted = true;
            break;
        }
        ticks += 1;
        let mut effects = Vec::new();

        while let Some((_, delta)) = scrolls.next_if(|(at, _)| *at <= player.position) {
            layout.user_scroll_by(delta);
            session.mark_manual_interaction();
        }
        while let Some((_, index)) = seeks.next_if(|(at, _)| *at <= player.position) {
            session.seek_to_segment(index, &mut effects);
        }
        // Seeks land before the sample so the tick reports the new position.
        apply(&mut session, &mut effects, &mut layout, &mut player);

        let pausing = options.pause_at.is_some_and(|at| player.position >= at);
        let at_end = player.position >= duration;
        let sample = if pausing || at_end {
            PlaybackSample::paused(player.position, Some(duration))
        } else {
            PlaybackSample::playing(player.position, Some(duration))
        };
        let before = session.active_index();
        session.on_sample(&sample, &layout, &mut effects);
        if let Some(idx) = session.active_index().filter(|idx| Some(*idx) != before) {
            if let Some(segment) = session.segments().get(idx) {
                info!(
                    idx,
                    at = %format_clock(f64::from(segment.time)),
                    text = %segment.text(),
                    "Now playing"
                );
            }
        }
        apply(&mut session, &mut effects, &mut layout, &mut player);

        if pausing || at_end {
            debug!(position = player.position, pausing, at_end, "Replay stopped");
            break;
        }
        if !cancel.sleep(tick) {
            continue;
        }
        player.position = (player.position + step).min(duration);
    }

    session.end(FlushReason::Unmount);
    let summary = ReplaySummary {
        media_id,
        ticks,
        final_position: player.position,
        duration,
        active_index: session.active_index(),
        scrolls: layout.scroll_count(),
        seeks: player.seeks,
        interrupted,
    };
    drop(session);
    drop(saver);
    if summary.interrupted {
        warn!(position = %format_clock(summary.final_position), "Replay interrupted");
    }
    Ok(summary)
}

fn apply<S>(
    session: &mut SyncSession<SystemClock, S>,
    effects: &mut Vec<Effect>,
    layout: &mut ReplayLayout,
    player: &mut SimulatedPlayer,
) where
    S: playsync_core::persist::ProgressSink,
{
    if effects.contains(&Effect::TranscriptReplaced) {
        layout.relayout(session.segments());
    }
    let scrolled = effects
        .iter()
        .any(|effect| matches!(effect, Effect::ScrollTo { .. }));
    session.apply_effects(std::mem::take(effects), layout, player);
    // Layout scrolls land instantly, so the guard can close right away.
    if scrolled {
        session.end_programmatic_scroll();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use playsync_core::persist::ProgressStore;
    use playsync_core::throttle::ProgressRecord;
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_temp_dir(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after epoch")
            .as_nanos();
        std::env::temp_dir().join(format!("playsync_replay_{name}_{nanos}"))
    }

    fn build_test_fixture(name: &str) -> (PathBuf, AppConfig, ReplayOptions) {
        let root = unique_temp_dir(name);
        fs::create_dir_all(&root).expect("create temp root");
        let transcript = root.join("lesson.json");
        let segments: Vec<String> = (0..10)
            .map(|i| format!(r#"{{"time": {}, "text": "Sentence number {i}."}}"#, i * 2))
            .collect();
        fs::write(&transcript, format!("[{}]", segments.join(","))).expect("write transcript");
        let config = AppConfig {
            tick_ms: 10,
            cache_dir: root.join("cache").display().to_string(),
            ..AppConfig::default()
        };
        let options = ReplayOptions {
            transcript,
            media_id: Some("lesson".to_string()),
            duration: Some(20.0),
            speed: Some(64.0),
            ..ReplayOptions::default()
        };
        (root, config, options)
    }

    #[test]
    fn full_replay_saves_final_position() {
        let (root, config, options) = build_test_fixture("full");
        let summary = run_replay(&config, &options, &CancellationToken::new()).expect("replay");
        assert!(!summary.interrupted);
        assert_eq!(summary.final_position, 20.0);
        assert_eq!(summary.active_index, Some(9));

        let store = FileProgressStore::new(&config.cache_dir);
        assert_eq!(
            store.load_progress("lesson"),
            Some(ProgressRecord {
                media_id: "lesson".to_string(),
                progress_sec: 20,
                duration_sec: 20,
            })
        );
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn pause_stops_replay_and_seek_moves_player() {
        let (root, config, mut options) = build_test_fixture("pause");
        options.seek_at = vec![(1.0, 6)];
        options.pause_at = Some(15.0);
        let summary = run_replay(&config, &options, &CancellationToken::new()).expect("replay");
        assert_eq!(summary.seeks, 1);
        assert!(summary.final_position >= 15.0 && summary.final_position < 16.0);

        let saved = FileProgressStore::new(&config.cache_dir)
            .load_progress("lesson")
            .expect("saved progress");
        assert_eq!(saved.progress_sec, 15);
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn drag_right_after_engine_scroll_holds_the_list() {
        let (root, mut config, mut options) = build_test_fixture("drag");
        let transcript: Vec<String> = (0..40)
            .map(|i| format!(r#"{{"time": {i}, "text": "Sentence number {i}."}}"#))
            .collect();
        fs::write(&options.transcript, format!("[{}]", transcript.join(","))).expect("write transcript");
        config.viewport_height = 100.0;
        config.line_height = 20.0;
        config.row_gap = 0.0;
        config.line_width_chars = 200.0;
        config.lock_window_ms = Some(60_000);
        options.duration = Some(40.0);

        // 0.64s per tick: the first engine scroll lands at 3.2s (row 3),
        // the drag is picked up on the very next tick.
        let baseline = run_replay(&config, &options, &CancellationToken::new()).expect("replay");
        assert!(baseline.scrolls > 1, "without a drag the list keeps following");

        options.restart = true;
        options.scroll_at = vec![(3.5, -20.0)];
        let summary = run_replay(&config, &options, &CancellationToken::new()).expect("replay");
        assert_eq!(summary.scrolls, 1);
        assert_eq!(summary.final_position, 40.0);
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn saved_progress_is_resumed() {
        let (root, config, options) = build_test_fixture("resume");
        FileProgressStore::new(&config.cache_dir)
            .upsert_progress(&ProgressRecord {
                media_id: "lesson".to_string(),
                progress_sec: 19,
                duration_sec: 20,
            })
            .expect("seed progress");
        let summary = run_replay(&config, &options, &CancellationToken::new()).expect("replay");
        assert!(summary.ticks <= 3, "resumed near the end, ran {} ticks", summary.ticks);
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn cancelled_before_first_tick_saves_nothing() {
        let (root, config, options) = build_test_fixture("cancel");
        let cancel = CancellationToken::new();
        cancel.cancel();
        let summary = run_replay(&config, &options, &cancel).expect("replay");
        assert!(summary.interrupted);
        assert_eq!(summary.ticks, 0);
        // No sample was ever seen, so there is nothing to flush.
        assert_eq!(FileProgressStore::new(&config.cache_dir).load_progress("lesson"), None);
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn duration_estimates() {
        let timed = TranscriptInput::from_contents(r#"[{"time": 0, "text": "a"}, {"time": "1:30", "text": "b"}]"#);
        assert_eq!(estimate_duration(&timed), 95.0);
        let words = vec!["word"; 340].join(" ");
        assert_eq!(estimate_duration(&TranscriptInput::Untimed(words)), 120.0);
        assert_eq!(estimate_duration(&TranscriptInput::Untimed(String::new())), 1.0);
    }
}
