//! Transcript and playback synchronization engine.
//!
//! Keeps the segment that matches the current playback position highlighted
//! and in view, yields to the user while they scroll by hand, and saves
//! listening progress at a bounded rate without ever blocking on storage.

pub mod arbiter;
pub mod bindings;
pub mod clock;
pub mod config;
pub mod geometry;
pub mod index;
pub mod persist;
pub mod scroll;
pub mod segment;
pub mod session;
pub mod store;
pub mod synth;
pub mod throttle;
pub mod time;

pub use arbiter::{ArbiterState, ScrollArbiter};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Surface, SyncConfig};
pub use geometry::{MeasuredRows, RowGeometry, RowGeometryProvider, RowSnapshot, Scroller, Viewport};
pub use index::{ActiveSegmentTracker, pick_active_index};
pub use persist::{BackgroundSaver, ProgressSink, ProgressStore};
pub use scroll::{AlignMode, ScrollConfig, compute_scroll_target};
pub use segment::{Segment, TranscriptInput, normalize_segments};
pub use session::{Effect, PlaybackControl, SyncSession};
pub use store::FileProgressStore;
pub use synth::synthesize_timecodes;
pub use throttle::{FlushReason, PlaybackSample, ProgressRecord, ProgressThrottle, SaveReason};
pub use time::{format_clock, to_seconds};
