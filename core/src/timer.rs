//! Generation-guarded one-shot timer shared by every timed system.

use std::time::Duration;

/// Shortest delay a timer can be armed with through [`Timer::arm`].
///
/// Keeps a zero-length configuration from spinning a scheduler loop forever
/// within a single tick.
pub const MIN_STEP: Duration = Duration::from_millis(1);

/// One-shot deadline owned by a single timed component.
///
/// A component holds exactly one timer, so arming always replaces the pending
/// deadline instead of queueing a second one. Every arm or cancel bumps the
/// generation; two reads with the same generation refer to the same deadline.
/// Components guard their tick handlers with their own running state, since a
/// cancelled timer never fires.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Timer {
    remaining: Option<Duration>,
    generation: u64,
}

impl Timer {
    /// Creates a disarmed timer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            remaining: None,
            generation: 0,
        }
    }

    /// Arms the timer to fire after `delay`, replacing any pending deadline.
    pub fn arm(&mut self, delay: Duration) {
        self.generation = self.generation.wrapping_add(1);
        self.remaining = Some(delay.max(MIN_STEP));
    }

    /// Arms the timer to fire on the very next advance, even a zero-length one.
    pub fn arm_now(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.remaining = Some(Duration::ZERO);
    }

    /// Disarms the timer. Safe to call when nothing is pending.
    pub fn cancel(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.remaining = None;
    }

    /// Reports whether a deadline is pending.
    #[must_use]
    pub const fn is_armed(&self) -> bool {
        self.remaining.is_some()
    }

    /// Time left until the pending deadline, if any.
    #[must_use]
    pub const fn remaining(&self) -> Option<Duration> {
        self.remaining
    }

    /// Counter bumped by every arm and cancel.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Advances the timer by `dt`.
    ///
    /// Returns the portion of `dt` left over after the deadline when the timer
    /// fires; the timer is disarmed at that point. Returns `None` when nothing
    /// is pending or the deadline lies beyond `dt`.
    pub fn advance(&mut self, dt: Duration) -> Option<Duration> {
        let remaining = self.remaining?;
        if dt >= remaining {
            self.remaining = None;
            Some(dt - remaining)
        } else {
            self.remaining = Some(remaining - dt);
            None
        }
    }
}
