//! Row and viewport geometry, plus the capabilities a layout host provides.
//!
//! The calculator in [`crate::scroll`] only ever talks to a
//! [`RowGeometryProvider`]. Native list surfaces feed [`MeasuredRows`] from
//! per-row layout callbacks; browser surfaces measure every row at once and
//! hand over a [`RowSnapshot`].

/// Position of one transcript row in content coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowGeometry {
    pub top: f64,
    pub height: f64,
}

impl RowGeometry {
    pub fn new(top: f64, height: f64) -> Self {
        Self { top, height }
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn is_finite(&self) -> bool {
        self.top.is_finite() && self.height.is_finite() && self.height >= 0.0
    }
}

/// Current scroll offset and visible height of the list.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub scroll_top: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(scroll_top: f64, height: f64) -> Self {
        Self { scroll_top, height }
    }

    pub fn bottom(&self) -> f64 {
        self.scroll_top + self.height
    }
}

/// Layout-host side of the geometry abstraction.
pub trait RowGeometryProvider {
    fn row_count(&self) -> usize;
    fn row(&self, index: usize) -> Option<RowGeometry>;
    fn viewport(&self) -> Viewport;
    fn content_height(&self) -> f64;
}

/// Accepts scroll commands from the engine.
pub trait Scroller {
    fn scroll_to(&mut self, offset: f64, animated: bool);
}

/// Row geometry collected incrementally from layout callbacks.
///
/// Rows that have not been measured yet are estimated from the first
/// measured row's height, stacked below the nearest measured row above them.
#[derive(Debug, Clone, Default)]
pub struct MeasuredRows {
    rows: Vec<Option<RowGeometry>>,
    viewport: Viewport,
    content_height: Option<f64>,
}

impl MeasuredRows {
    pub fn new(row_count: usize) -> Self {
        Self {
            rows: vec![None; row_count],
            ..Self::default()
        }
    }

    /// Resize for a new transcript; measurements are discarded.
    pub fn reset(&mut self, row_count: usize) {
        self.rows = vec![None; row_count];
        self.content_height = None;
    }

    /// Layout callback for one row. Non-finite measurements are ignored.
    pub fn record_row(&mut self, index: usize, top: f64, height: f64) {
        let geometry = RowGeometry::new(top, height);
        if !geometry.is_finite() {
            return;
        }
        if let Some(slot) = self.rows.get_mut(index) {
            *slot = Some(geometry);
        }
    }

    pub fn set_viewport(&mut self, scroll_top: f64, height: f64) {
        self.viewport = Viewport::new(scroll_top, height);
    }

    pub fn set_content_height(&mut self, height: f64) {
        self.content_height = Some(height).filter(|h| h.is_finite() && *h >= 0.0);
    }

    fn fallback_height(&self) -> Option<f64> {
        self.rows.iter().flatten().map(|row| row.height).next()
    }

    fn estimated_bottom(&self) -> f64 {
        self.rows
            .len()
            .checked_sub(1)
            .and_then(|last| self.row(last))
            .map(|row| row.bottom())
            .unwrap_or(0.0)
    }
}

impl RowGeometryProvider for MeasuredRows {
    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn row(&self, index: usize) -> Option<RowGeometry> {
        let slot = self.rows.get(index)?;
        if let Some(row) = slot {
            return Some(*row);
        }
        let height = self.fallback_height()?;
        let anchor = self.rows[..index]
            .iter()
            .enumerate()
            .rev()
            .find_map(|(idx, row)| row.map(|row| (idx, row)));
        let top = match anchor {
            Some((anchor_idx, row)) => row.bottom() + (index - anchor_idx - 1) as f64 * height,
            None => index as f64 * height,
        };
        Some(RowGeometry::new(top, height))
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn content_height(&self) -> f64 {
        self.content_height
            .unwrap_or_else(|| self.estimated_bottom())
    }
}

/// Geometry for every row captured in one pass.
#[derive(Debug, Clone, Default)]
pub struct RowSnapshot {
    pub rows: Vec<RowGeometry>,
    pub viewport: Viewport,
    pub content_height: f64,
}

impl RowSnapshot {
    pub fn new(rows: Vec<RowGeometry>, viewport: Viewport) -> Self {
        let content_height = rows.iter().map(RowGeometry::bottom).fold(0.0, f64::max);
        Self {
            rows,
            viewport,
            content_height,
        }
    }

    /// Rows stacked top to bottom with the given heights.
    pub fn stacked(heights: &[f64], gap: f64, viewport: Viewport) -> Self {
        let mut top = 0.0;
        let rows = heights
            .iter()
            .map(|height| {
                let row = RowGeometry::new(top, *height);
                top += height + gap;
                row
            })
            .collect();
        Self::new(rows, viewport)
    }
}

impl RowGeometryProvider for RowSnapshot {
    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn row(&self, index: usize) -> Option<RowGeometry> {
        self.rows.get(index).copied()
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn content_height(&self) -> f64 {
        self.content_height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unmeasured_rows_use_first_measured_height() {
        let mut rows = MeasuredRows::new(6);
        rows.record_row(1, 40.0, 30.0);
        rows.record_row(2, 70.0, 50.0);

        assert_eq!(rows.row(0), Some(RowGeometry::new(0.0, 30.0)));
        assert_eq!(rows.row(2), Some(RowGeometry::new(70.0, 50.0)));
        // Stacked under row 2 using row 1's height.
        assert_eq!(rows.row(3), Some(RowGeometry::new(120.0, 30.0)));
        assert_eq!(rows.row(5), Some(RowGeometry::new(180.0, 30.0)));
        assert_eq!(rows.row(6), None);
        assert_eq!(rows.content_height(), 210.0);
    }

    #[test]
    fn nothing_measured_means_no_geometry() {
        let mut rows = MeasuredRows::new(3);
        rows.record_row(0, f64::NAN, 20.0);
        assert_eq!(rows.row(0), None);
        assert_eq!(rows.content_height(), 0.0);
    }

    #[test]
    fn explicit_content_height_wins() {
        let mut rows = MeasuredRows::new(2);
        rows.record_row(0, 0.0, 10.0);
        rows.set_content_height(400.0);
        assert_eq!(rows.content_height(), 400.0);
    }

    #[test]
    fn stacked_snapshot_layout() {
        let snapshot = RowSnapshot::stacked(&[20.0, 40.0, 10.0], 5.0, Viewport::new(0.0, 50.0));
        assert_eq!(snapshot.row(1), Some(RowGeometry::new(25.0, 40.0)));
        assert_eq!(snapshot.row(2), Some(RowGeometry::new(70.0, 10.0)));
        assert_eq!(snapshot.content_height(), 80.0);
    }
}
