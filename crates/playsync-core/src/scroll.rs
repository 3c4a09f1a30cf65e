//! Scroll destination for the active transcript row.

use crate::geometry::RowGeometryProvider;
use serde::{Deserialize, Serialize};
use tracing::trace;
use ts_rs::TS;

/// Largest inset the smart mode leaves between the active row and the
/// viewport edge.
pub const SMART_STEP_CAP: f64 = 60.0;

/// How the active row should be aligned inside the viewport.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "kebab-case")]
#[ts(export)]
pub enum AlignMode {
    /// Leave the view alone while the row sits inside a comfort band.
    #[default]
    Smart,
    /// Move only when the row leaves the viewport, and only as far as needed.
    Nearest,
    Top,
    Center,
}

impl std::fmt::Display for AlignMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            AlignMode::Smart => "smart",
            AlignMode::Nearest => "nearest",
            AlignMode::Top => "top",
            AlignMode::Center => "center",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, TS)]
#[serde(default)]
#[ts(export)]
pub struct ScrollConfig {
    pub mode: AlignMode,
    /// Inset of the comfort band from each viewport edge (smart mode).
    pub comfort_margin: f64,
    /// Padding kept between the row and the viewport edge (top/nearest modes).
    pub edge_margin: f64,
    /// Targets closer than this to the current offset are dropped.
    pub tolerance: f64,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            mode: AlignMode::Smart,
            comfort_margin: 80.0,
            edge_margin: 16.0,
            tolerance: 4.0,
        }
    }
}

/// Offset the list should scroll to so the active row is well placed, or
/// `None` when no movement is needed or the geometry is unusable.
pub fn compute_scroll_target<G>(
    geometry: &G,
    active_index: usize,
    config: &ScrollConfig,
) -> Option<f64>
where
    G: RowGeometryProvider + ?Sized,
{
    if active_index >= geometry.row_count() {
        return None;
    }
    let row = geometry.row(active_index)?;
    if !row.is_finite() {
        return None;
    }
    let viewport = geometry.viewport();
    if !viewport.scroll_top.is_finite() || !viewport.height.is_finite() || viewport.height <= 0.0
    {
        return None;
    }

    let edge = non_negative(config.edge_margin);
    let desired = match config.mode {
        AlignMode::Top => row.top - edge,
        AlignMode::Center => row.top - (viewport.height - row.height) / 2.0,
        AlignMode::Nearest => {
            if row.top < viewport.scroll_top + edge {
                row.top - edge
            } else if row.bottom() > viewport.bottom() - edge {
                (row.bottom() - viewport.height + edge).min(row.top - edge)
            } else {
                return None;
            }
        }
        AlignMode::Smart => {
            let comfort = non_negative(config.comfort_margin).min(viewport.height * 0.4);
            let inset = comfort.min(SMART_STEP_CAP);
            if row.top < viewport.scroll_top + comfort {
                row.top - inset
            } else if row.bottom() > viewport.bottom() - comfort {
                (row.bottom() - viewport.height + inset).min(row.top - inset)
            } else {
                return None;
            }
        }
    };

    let content_height = geometry.content_height();
    let content_height = if content_height.is_finite() {
        content_height.max(row.bottom())
    } else {
        row.bottom()
    };
    let max_offset = (content_height - viewport.height).max(0.0);
    let target = desired.clamp(0.0, max_offset);

    if (target - viewport.scroll_top).abs() < non_negative(config.tolerance) {
        trace!(
            active_index,
            target,
            current = viewport.scroll_top,
            "Scroll target within tolerance"
        );
        return None;
    }
    Some(target)
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}
