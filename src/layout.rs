//! Simulated transcript list for the replay host.
//!
//! Rows are never rendered; their heights are estimated from text length and
//! the configured line width, much like a text widget would wrap them.

use crate::config::AppConfig;
use playsync_core::geometry::{RowGeometry, RowGeometryProvider, RowSnapshot, Scroller, Viewport};
use playsync_core::segment::Segment;
use std::ops::Range;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutMetrics {
    pub line_width_chars: f64,
    pub line_height: f64,
    pub row_gap: f64,
    pub viewport_height: f64,
}

impl LayoutMetrics {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            line_width_chars: config.line_width_chars(),
            line_height: config.line_height(),
            row_gap: config.row_gap(),
            viewport_height: config.viewport_height(),
        }
    }
}

/// Wrapped line count for `text` when at most `max_units_per_line` average
/// glyph widths fit on a line.
pub fn estimate_line_count(text: &str, max_units_per_line: f64) -> usize {
    let max_units = max_units_per_line.max(8.0);
    let mut lines = 1usize;
    let mut line_units = 0.0f64;
    for ch in text.chars() {
        if ch == '\n' {
            lines += 1;
            line_units = 0.0;
            continue;
        }
        let units = if ch.is_whitespace() {
            0.45
        } else if ch.is_ascii_punctuation() {
            0.55
        } else if ch.is_ascii() {
            1.0
        } else {
            1.8
        };
        if line_units + units > max_units {
            lines += 1;
            line_units = units;
        } else {
            line_units += units;
        }
    }
    lines
}

pub struct ReplayLayout {
    metrics: LayoutMetrics,
    snapshot: RowSnapshot,
    scrolls: usize,
}

impl ReplayLayout {
    pub fn build(segments: &[Segment], metrics: LayoutMetrics) -> Self {
        let mut layout = Self {
            metrics,
            snapshot: RowSnapshot::default(),
            scrolls: 0,
        };
        layout.relayout(segments);
        layout
    }

    /// Re-estimate every row, keeping the scroll offset inside the new range.
    pub fn relayout(&mut self, segments: &[Segment]) {
        let heights: Vec<f64> = segments
            .iter()
            .map(|segment| {
                let lines = estimate_line_count(&segment.text(), self.metrics.line_width_chars);
                lines as f64 * self.metrics.line_height
            })
            .collect();
        let scroll_top = self.snapshot.viewport.scroll_top;
        self.snapshot = RowSnapshot::stacked(
            &heights,
            self.metrics.row_gap,
            Viewport::new(0.0, self.metrics.viewport_height),
        );
        self.snapshot.viewport.scroll_top = self.clamp_offset(scroll_top);
        debug!(
            rows = heights.len(),
            content_height = self.snapshot.content_height,
            "Laid out transcript rows"
        );
    }

    pub fn scroll_top(&self) -> f64 {
        self.snapshot.viewport.scroll_top
    }

    pub fn scroll_count(&self) -> usize {
        self.scrolls
    }

    /// Rows that intersect the viewport.
    pub fn visible_rows(&self) -> Range<usize> {
        let viewport = self.snapshot.viewport;
        let first = self
            .snapshot
            .rows
            .iter()
            .position(|row| row.bottom() > viewport.scroll_top);
        let Some(first) = first else {
            return 0..0;
        };
        let end = self.snapshot.rows[first..]
            .iter()
            .position(|row| row.top >= viewport.bottom())
            .map(|offset| first + offset)
            .unwrap_or(self.snapshot.rows.len());
        first..end
    }

    /// Scroll the way a user dragging the list would.
    pub fn user_scroll_by(&mut self, delta: f64) {
        let target = self.clamp_offset(self.scroll_top() + delta);
        info!(from = self.scroll_top(), to = target, "Simulated manual scroll");
        self.snapshot.viewport.scroll_top = target;
    }

    fn clamp_offset(&self, offset: f64) -> f64 {
        let max = (self.snapshot.content_height - self.snapshot.viewport.height).max(0.0);
        if offset.is_finite() {
            offset.clamp(0.0, max)
        } else {
            0.0
        }
    }
}

impl RowGeometryProvider for ReplayLayout {
    fn row_count(&self) -> usize {
        self.snapshot.row_count()
    }

    fn row(&self, index: usize) -> Option<RowGeometry> {
        self.snapshot.row(index)
    }

    fn viewport(&self) -> Viewport {
        self.snapshot.viewport()
    }

    fn content_height(&self) -> f64 {
        self.snapshot.content_height()
    }
}

impl Scroller for ReplayLayout {
    fn scroll_to(&mut self, offset: f64, animated: bool) {
        let target = self.clamp_offset(offset);
        self.snapshot.viewport.scroll_top = target;
        self.scrolls += 1;
        let visible = self.visible_rows();
        info!(
            offset = target,
            animated,
            first_visible = visible.start,
            last_visible = visible.end.saturating_sub(1),
            "Scrolled transcript"
        );
    }
}
