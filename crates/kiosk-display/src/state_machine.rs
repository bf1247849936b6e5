//! Waiting/Showing state machine with inactivity timeout.
//!
//! The display shows the current product until nothing new has happened for
//! longer than the inactivity threshold, then falls back to the waiting
//! screen. Reverting never touches the repository: the current product stays
//! set and the next change of it brings the product screen back.
//!
//! # Transitions
//!
//! - Waiting → Showing: the current product changed to a non-empty value
//! - Showing → Waiting: a check finds more than `threshold` elapsed since the
//!   last activity
//! - any → Waiting: the current product was cleared
//!
//! Every operation takes the caller's `Instant`, so the machine never reads
//! the clock itself.
//!
//! # Examples
//!
//! ```
//! use std::time::{Duration, Instant};
//! use kiosk_display::{DisplayState, DisplayStateMachine};
//!
//! let start = Instant::now();
//! let mut machine = DisplayStateMachine::new(Duration::from_secs(15));
//!
//! machine.on_current_changed(true, start);
//! assert_eq!(machine.state(), DisplayState::Showing);
//!
//! machine.tick(start + Duration::from_millis(14_900));
//! assert_eq!(machine.state(), DisplayState::Showing);
//!
//! machine.tick(start + Duration::from_millis(15_100));
//! assert_eq!(machine.state(), DisplayState::Waiting);
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use kiosk_core::constants::INACTIVITY_TIMEOUT_MS;

/// Maximum number of transitions kept in history.
const MAX_HISTORY_SIZE: usize = 100;

/// What the screen is currently showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayState {
    /// Idle screen waiting for the next product.
    Waiting,

    /// Product screen for the repository's current product.
    Showing,
}

impl fmt::Display for DisplayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayState::Waiting => write!(f, "Waiting"),
            DisplayState::Showing => write!(f, "Showing"),
        }
    }
}

/// Why a transition happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionReason {
    ProductChanged,
    Inactivity,
    ProductCleared,
}

/// A recorded state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayTransition {
    pub from: DisplayState,
    pub to: DisplayState,
    pub reason: TransitionReason,
    pub at: Instant,
}

/// Display state machine.
///
/// Not thread-safe by itself; the kiosk runtime owns it on a single task.
#[derive(Debug, Clone)]
pub struct DisplayStateMachine {
    state: DisplayState,

    /// Whether the repository currently has a current product.
    has_product: bool,

    /// When the current product last changed. `None` until the first product.
    last_activity: Option<Instant>,

    threshold: Duration,

    /// Oldest first, bounded by `MAX_HISTORY_SIZE`.
    history: VecDeque<DisplayTransition>,
}

impl DisplayStateMachine {
    /// Create a machine in the Waiting state.
    pub fn new(threshold: Duration) -> Self {
        Self {
            state: DisplayState::Waiting,
            has_product: false,
            last_activity: None,
            threshold,
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
        }
    }

    /// Create a machine for a display mounted over existing state.
    ///
    /// Starts Showing when a current product already exists.
    pub fn mounted(threshold: Duration, has_current: bool, now: Instant) -> Self {
        let mut machine = Self::new(threshold);
        if has_current {
            machine.state = DisplayState::Showing;
            machine.has_product = true;
            machine.last_activity = Some(now);
        }
        machine
    }

    pub fn state(&self) -> DisplayState {
        self.state
    }

    /// Returns `true` if the product screen should be rendered.
    pub fn is_showing(&self) -> bool {
        self.state == DisplayState::Showing && self.has_product
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    pub fn last_activity(&self) -> Option<Instant> {
        self.last_activity
    }

    /// Whole seconds since the last activity, `None` before the first product.
    pub fn seconds_since_activity(&self, now: Instant) -> Option<u64> {
        self.last_activity
            .map(|at| now.saturating_duration_since(at).as_secs())
    }

    /// Recent transitions, oldest first.
    pub fn history(&self) -> &VecDeque<DisplayTransition> {
        &self.history
    }

    /// The repository's current product reference changed.
    ///
    /// A non-empty current product always resets the activity timestamp,
    /// even when the screen is already Showing. Returns the transition if
    /// the state changed.
    pub fn on_current_changed(&mut self, has_current: bool, now: Instant) -> Option<DisplayTransition> {
        self.has_product = has_current;
        if has_current {
            self.last_activity = Some(now);
            self.transition(DisplayState::Showing, TransitionReason::ProductChanged, now)
        } else {
            self.transition(DisplayState::Waiting, TransitionReason::ProductCleared, now)
        }
    }

    /// Periodic inactivity check.
    ///
    /// Reverts to Waiting when Showing, a product is set, and strictly more
    /// than `threshold` has elapsed since the last activity.
    pub fn tick(&mut self, now: Instant) -> Option<DisplayTransition> {
        if self.state != DisplayState::Showing || !self.has_product {
            return None;
        }
        let last = self.last_activity?;
        let idle = now.saturating_duration_since(last);
        if idle <= self.threshold {
            return None;
        }

        info!(
            idle_ms = idle.as_millis() as u64,
            "inactivity detected, returning to waiting screen"
        );
        self.transition(DisplayState::Waiting, TransitionReason::Inactivity, now)
    }

    fn transition(
        &mut self,
        to: DisplayState,
        reason: TransitionReason,
        now: Instant,
    ) -> Option<DisplayTransition> {
        if self.state == to {
            return None;
        }
        let transition = DisplayTransition {
            from: self.state,
            to,
            reason,
            at: now,
        };
        debug!(from = %transition.from, to = %to, ?reason, "display transition");

        self.state = to;
        self.history.push_back(transition.clone());
        if self.history.len() > MAX_HISTORY_SIZE {
            self.history.pop_front();
        }
        Some(transition)
    }
}

impl Default for DisplayStateMachine {
    fn default() -> Self {
        Self::new(Duration::from_millis(INACTIVITY_TIMEOUT_MS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn test_starts_waiting() {
        let machine = DisplayStateMachine::default();
        assert_eq!(machine.state(), DisplayState::Waiting);
        assert!(!machine.is_showing());
        assert_eq!(machine.threshold(), ms(15_000));
        assert_eq!(machine.seconds_since_activity(Instant::now()), None);
    }

    #[test]
    fn test_mounted_with_current_product_starts_showing() {
        let now = Instant::now();
        let machine = DisplayStateMachine::mounted(ms(15_000), true, now);
        assert!(machine.is_showing());
        assert_eq!(machine.last_activity(), Some(now));

        let machine = DisplayStateMachine::mounted(ms(15_000), false, now);
        assert_eq!(machine.state(), DisplayState::Waiting);
    }

    #[rstest]
    #[case(0, DisplayState::Showing)]
    #[case(14_900, DisplayState::Showing)]
    #[case(15_000, DisplayState::Showing)]
    #[case(15_001, DisplayState::Waiting)]
    #[case(15_100, DisplayState::Waiting)]
    fn test_inactivity_threshold_is_strict(#[case] elapsed: u64, #[case] expected: DisplayState) {
        let start = Instant::now();
        let mut machine = DisplayStateMachine::default();
        machine.on_current_changed(true, start);

        machine.tick(start + ms(elapsed));
        assert_eq!(machine.state(), expected);
    }

    #[test]
    fn test_new_product_after_timeout_shows_again() {
        let start = Instant::now();
        let mut machine = DisplayStateMachine::default();
        machine.on_current_changed(true, start);
        let reverted = machine.tick(start + ms(15_100)).unwrap();
        assert_eq!(reverted.reason, TransitionReason::Inactivity);

        let shown = machine.on_current_changed(true, start + ms(20_000)).unwrap();
        assert_eq!(shown.from, DisplayState::Waiting);
        assert_eq!(shown.to, DisplayState::Showing);
        assert_eq!(machine.seconds_since_activity(start + ms(21_500)), Some(1));

        // The timer restarted from the new activity.
        assert!(machine.tick(start + ms(34_000)).is_none());
        assert!(machine.tick(start + ms(35_001)).is_some());
    }

    #[test]
    fn test_activity_while_showing_extends_timeout() {
        let start = Instant::now();
        let mut machine = DisplayStateMachine::default();
        machine.on_current_changed(true, start);

        assert!(machine.on_current_changed(true, start + ms(10_000)).is_none());
        machine.tick(start + ms(20_000));
        assert_eq!(machine.state(), DisplayState::Showing);
        machine.tick(start + ms(25_001));
        assert_eq!(machine.state(), DisplayState::Waiting);
    }

    #[test]
    fn test_tick_without_product_does_nothing() {
        let mut machine = DisplayStateMachine::default();
        assert!(machine.tick(Instant::now() + ms(60_000)).is_none());
        assert!(machine.history().is_empty());
    }

    #[test]
    fn test_cleared_product_reverts_to_waiting() {
        let now = Instant::now();
        let mut machine = DisplayStateMachine::default();
        machine.on_current_changed(true, now);

        let cleared = machine.on_current_changed(false, now + ms(1)).unwrap();
        assert_eq!(cleared.reason, TransitionReason::ProductCleared);
        assert!(!machine.is_showing());
        // Last activity is kept for the waiting screen.
        assert_eq!(machine.seconds_since_activity(now + ms(3_000)), Some(2));
    }

    #[test]
    fn test_seconds_since_activity_floors() {
        let now = Instant::now();
        let mut machine = DisplayStateMachine::default();
        machine.on_current_changed(true, now);

        assert_eq!(machine.seconds_since_activity(now + ms(999)), Some(0));
        assert_eq!(machine.seconds_since_activity(now + ms(16_999)), Some(16));
    }

    #[test]
    fn test_history_is_bounded() {
        let start = Instant::now();
        let mut machine = DisplayStateMachine::new(ms(10));

        for i in 0..120u64 {
            let at = start + ms(i * 100);
            machine.on_current_changed(true, at);
            machine.tick(at + ms(50));
        }

        assert_eq!(machine.history().len(), MAX_HISTORY_SIZE);
        let last = machine.history().back().unwrap();
        assert_eq!(last.to, DisplayState::Waiting);
    }
}
