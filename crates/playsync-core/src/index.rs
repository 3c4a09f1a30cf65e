//! Active segment selection against a playback position.

/// Default slack so a position sampled a few milliseconds before a segment
/// boundary already counts as having reached it.
pub const DEFAULT_EPSILON: f64 = 0.05;

/// Index of the last segment whose start time is at or before `current_sec`
/// (within `epsilon`).
///
/// `times` must be sorted ascending. An empty list yields `0`; callers treat
/// that as "no transcript". A position before the first segment also yields
/// `0`.
pub fn pick_active_index(times: &[f64], current_sec: f64, epsilon: f64) -> usize {
    let current = if current_sec.is_finite() { current_sec } else { 0.0 };
    let epsilon = if epsilon.is_finite() { epsilon.max(0.0) } else { 0.0 };
    let mut active = 0;
    for (idx, time) in times.iter().enumerate() {
        if current + epsilon >= *time {
            active = idx;
        } else {
            break;
        }
    }
    active
}

/// Reports the active index only when it moves.
#[derive(Debug, Clone, Default)]
pub struct ActiveSegmentTracker {
    current: Option<usize>,
}

impl ActiveSegmentTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<usize> {
        self.current
    }

    /// Feed a position; returns the new index when it differs from the last one.
    pub fn update(&mut self, times: &[f64], current_sec: f64, epsilon: f64) -> Option<usize> {
        if times.is_empty() {
            self.current = None;
            return None;
        }
        let idx = pick_active_index(times, current_sec, epsilon);
        if self.current == Some(idx) {
            return None;
        }
        self.current = Some(idx);
        Some(idx)
    }

    pub fn reset(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_list_yields_zero() {
        assert_eq!(pick_active_index(&[], 10.0, DEFAULT_EPSILON), 0);
    }

    #[test]
    fn floor_search() {
        let times = [0.0, 10.0, 20.0, 30.0];
        assert_eq!(pick_active_index(&times, 0.0, DEFAULT_EPSILON), 0);
        assert_eq!(pick_active_index(&times, 9.5, DEFAULT_EPSILON), 0);
        assert_eq!(pick_active_index(&times, 10.0, DEFAULT_EPSILON), 1);
        assert_eq!(pick_active_index(&times, 25.0, DEFAULT_EPSILON), 2);
        assert_eq!(pick_active_index(&times, 500.0, DEFAULT_EPSILON), 3);
    }

    #[test]
    fn epsilon_reaches_adjacent_boundary() {
        let times = [10.0, 20.0, 30.0];
        assert_eq!(pick_active_index(&times, 19.97, 0.05), 1);
        assert_eq!(pick_active_index(&times, 19.90, 0.05), 0);
    }

    #[test]
    fn before_first_segment_is_zero() {
        assert_eq!(pick_active_index(&[5.0, 8.0], 1.0, DEFAULT_EPSILON), 0);
    }

    #[test]
    fn non_finite_position_is_start() {
        assert_eq!(pick_active_index(&[0.0, 1.0], f64::NAN, DEFAULT_EPSILON), 0);
    }

    #[test]
    fn idempotent_for_same_inputs() {
        let times = [0.0, 3.0, 7.0, 12.0];
        let first = pick_active_index(&times, 8.0, DEFAULT_EPSILON);
        for _ in 0..5 {
            assert_eq!(pick_active_index(&times, 8.0, DEFAULT_EPSILON), first);
        }
    }

    #[test]
    fn monotonic_for_non_decreasing_positions() {
        let times: Vec<f64> = (0..200).map(|i| f64::from(i) * 2.5).collect();
        let mut previous = 0usize;
        let mut position = 0.0f64;
        while position < 520.0 {
            let idx = pick_active_index(&times, position, DEFAULT_EPSILON);
            assert!(idx >= previous, "index went backwards at {position}");
            previous = idx;
            position += 0.37;
        }
        assert_eq!(previous, times.len() - 1);
    }

    #[test]
    fn tracker_reports_only_changes() {
        let times = [0.0, 10.0, 20.0];
        let mut tracker = ActiveSegmentTracker::new();
        assert_eq!(tracker.update(&times, 0.0, DEFAULT_EPSILON), Some(0));
        assert_eq!(tracker.update(&times, 4.0, DEFAULT_EPSILON), None);
        assert_eq!(tracker.update(&times, 10.2, DEFAULT_EPSILON), Some(1));
        assert_eq!(tracker.current(), Some(1));
        assert_eq!(tracker.update(&[], 10.2, DEFAULT_EPSILON), None);
        assert_eq!(tracker.current(), None);
    }
}
