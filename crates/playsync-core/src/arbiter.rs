//! Arbitration between user-driven and automatic scrolling.
//!
//! Any user scroll, drag, wheel, touch move or explicit seek locks automatic
//! scrolling for a short window. Scrolls the engine performs itself are
//! fenced with a programmatic guard so their scroll events are not mistaken
//! for user input.

use crate::clock::Clock;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArbiterState {
    Idle,
    Locked { until_ms: u64 },
}

#[derive(Debug, Clone)]
pub struct ScrollArbiter<C: Clock> {
    clock: C,
    last_manual_at: Option<u64>,
    programmatic_until: Option<u64>,
}

impl<C: Clock> ScrollArbiter<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            last_manual_at: None,
            programmatic_until: None,
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Record a user interaction unconditionally.
    pub fn mark_manual_interaction(&mut self) {
        let now = self.clock.now_ms();
        trace!(now, "Manual scroll interaction");
        self.last_manual_at = Some(now);
    }

    /// Scroll-listener entry point. Events that arrive while the engine's own
    /// scroll is in flight are ignored. Returns whether the event counted.
    pub fn on_scroll_event(&mut self) -> bool {
        if self.is_programmatic() {
            return false;
        }
        self.mark_manual_interaction();
        true
    }

    /// True once more than `lock_window_ms` has passed since the last manual
    /// interaction (or if there never was one).
    pub fn is_auto_scroll_allowed(&self, lock_window_ms: u64) -> bool {
        match self.last_manual_at {
            None => true,
            Some(at) => self.clock.now_ms().saturating_sub(at) > lock_window_ms,
        }
    }

    pub fn state(&self, lock_window_ms: u64) -> ArbiterState {
        match self.last_manual_at {
            Some(at) if !self.is_auto_scroll_allowed(lock_window_ms) => ArbiterState::Locked {
                until_ms: at.saturating_add(lock_window_ms),
            },
            _ => ArbiterState::Idle,
        }
    }

    /// Raise the programmatic guard for the next `guard_ms`.
    pub fn begin_programmatic_scroll(&mut self, guard_ms: u64) {
        self.programmatic_until = Some(self.clock.now_ms().saturating_add(guard_ms));
    }

    pub fn end_programmatic_scroll(&mut self) {
        self.programmatic_until = None;
    }

    pub fn is_programmatic(&self) -> bool {
        self.programmatic_until
            .is_some_and(|until| self.clock.now_ms() < until)
    }

    pub fn last_manual_at(&self) -> Option<u64> {
        self.last_manual_at
    }

    pub fn reset(&mut self) {
        self.last_manual_at = None;
        self.programmatic_until = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    #[test]
    fn idle_until_first_interaction() {
        let arbiter = ScrollArbiter::new(ManualClock::new(5_000));
        assert!(arbiter.is_auto_scroll_allowed(700));
        assert_eq!(arbiter.state(700), ArbiterState::Idle);
    }

    #[test]
    fn lock_window_must_be_exceeded() {
        let clock = ManualClock::new(1_000);
        let mut arbiter = ScrollArbiter::new(clock.clone());
        arbiter.mark_manual_interaction();
        assert_eq!(arbiter.state(700), ArbiterState::Locked { until_ms: 1_700 });

        clock.set(1_700);
        assert!(!arbiter.is_auto_scroll_allowed(700));
        clock.set(1_701);
        assert!(arbiter.is_auto_scroll_allowed(700));
        assert_eq!(arbiter.state(700), ArbiterState::Idle);
    }

    #[test]
    fn later_interaction_extends_lock() {
        let clock = ManualClock::new(0);
        let mut arbiter = ScrollArbiter::new(clock.clone());
        arbiter.mark_manual_interaction();
        clock.advance(500);
        assert!(arbiter.on_scroll_event());
        clock.advance(500);
        assert!(!arbiter.is_auto_scroll_allowed(700));
        clock.advance(201);
        assert!(arbiter.is_auto_scroll_allowed(700));
    }

    #[test]
    fn programmatic_scroll_events_are_not_manual() {
        let clock = ManualClock::new(0);
        let mut arbiter = ScrollArbiter::new(clock.clone());
        arbiter.begin_programmatic_scroll(250);
        clock.advance(100);
        assert!(!arbiter.on_scroll_event());
        assert_eq!(arbiter.last_manual_at(), None);

        clock.advance(200);
        assert!(arbiter.on_scroll_event());
        assert_eq!(arbiter.last_manual_at(), Some(300));
    }

    #[test]
    fn explicit_marks_ignore_the_guard() {
        let clock = ManualClock::new(0);
        let mut arbiter = ScrollArbiter::new(clock.clone());
        arbiter.begin_programmatic_scroll(1_000);
        arbiter.mark_manual_interaction();
        assert!(!arbiter.is_auto_scroll_allowed(100));
        arbiter.reset();
        assert!(arbiter.is_auto_scroll_allowed(100));
        assert!(!arbiter.is_programmatic());
    }
}
