//! Pure step producers for the reveal walks.
//!
//! A walk never touches time or the world: each call to `next_step` returns
//! the next visual action together with the delay to wait after it. The
//! sequencer owns the timer and turns actions into commands.

use std::time::Duration;

use lucky_draw_core::{SlotId, MIN_STEP};
use rand::Rng;
use tracing::debug;

use crate::speed_curve::SpeedCurve;

/// Visual action produced by a walk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// Clear every highlight, then highlight the slot.
    Highlight(SlotId),
    /// Clear every highlight.
    ClearHighlights,
    /// Reveal the outcome at `index` on `slot`.
    Reveal {
        /// Outcome position.
        index: usize,
        /// Slot carrying the outcome.
        slot: SlotId,
        /// Whether the reveal itself triggers a celebration.
        celebrate: bool,
    },
    /// Declare the slot the winner and celebrate it.
    Declare(SlotId),
    /// Settle a revealed slot into its finalized state.
    Finalize(SlotId),
    /// Advance past an outcome no slot can carry.
    Skip(usize),
}

/// Action paired with the delay that follows it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Step {
    /// What to show now.
    pub action: Action,
    /// How long to wait before asking for the next step.
    pub delay: Duration,
}

impl Step {
    const fn new(action: Action, delay: Duration) -> Self {
        Self { action, delay }
    }
}

/// Timing of the decelerating random spin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpinTiming {
    /// Total length of the spin.
    pub duration: Duration,
    /// Delay between highlights as a function of progress.
    pub curve: SpeedCurve,
    /// Progress after which picks start gravitating toward the target.
    pub bias_start: f64,
    /// Probability of a biased pick at the very end of the spin.
    pub max_bias: f64,
}

impl Default for SpinTiming {
    fn default() -> Self {
        Self {
            duration: Duration::from_millis(6000),
            curve: SpeedCurve::default(),
            bias_start: 0.95,
            max_bias: 0.7,
        }
    }
}

/// Timing and odds of the precision lock-on.
#[derive(Clone, Debug, PartialEq)]
pub struct LockTiming {
    /// Number of lock-on highlights; the last always hits the target.
    pub attempts: u32,
    /// Delay shared by every attempt.
    pub base_delay: Duration,
    /// Extra delay added per attempt.
    pub step_delay: Duration,
    /// Near-miss probability per attempt, indexed by attempt.
    pub near_miss_odds: Vec<f64>,
    /// Pause after the last attempt before the grid is cleared.
    pub pause: Duration,
}

impl LockTiming {
    fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_add(self.step_delay.saturating_mul(attempt.saturating_add(1)))
    }

    fn near_miss_odds(&self, attempt: u32) -> f64 {
        if attempt.saturating_add(1) >= self.attempts {
            return 0.0;
        }
        usize::try_from(attempt)
            .ok()
            .and_then(|index| self.near_miss_odds.get(index))
            .copied()
            .unwrap_or(0.0)
    }
}

impl Default for LockTiming {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_millis(300),
            step_delay: Duration::from_millis(100),
            near_miss_odds: vec![0.4, 0.2],
            pause: Duration::from_millis(10),
        }
    }
}

/// Beat between the lock-on and the winner announcement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WinnerTiming {
    /// Blank pause before the winning slot lights up.
    pub pause: Duration,
    /// Time the slot spends revealing before it is declared.
    pub reveal: Duration,
}

impl Default for WinnerTiming {
    fn default() -> Self {
        Self {
            pause: Duration::from_millis(300),
            reveal: Duration::from_millis(400),
        }
    }
}

/// Timing of the round-robin sweep used for bulk reveals.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SweepTiming {
    /// Delay between sweep positions.
    pub step: Duration,
    /// Delay between landing on a matching slot and revealing it.
    pub reveal_lead: Duration,
    /// Time a revealed slot stays in the revealing state.
    pub reveal_hold: Duration,
}

impl Default for SweepTiming {
    fn default() -> Self {
        Self {
            step: Duration::from_millis(120),
            reveal_lead: Duration::from_millis(80),
            reveal_hold: Duration::from_millis(500),
        }
    }
}

/// Observable state of a spin walk.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SpinState {
    /// Random decelerating highlights; carries the simulated time spent so far.
    Spinning {
        /// Time consumed by the highlights emitted so far.
        elapsed: Duration,
    },
    /// Spin finished; lock-on is about to begin.
    FinalApproach,
    /// Lock-on highlights around the target.
    PrecisionLock {
        /// Number of attempts already shown.
        attempt: u32,
    },
    /// Target reached; the winner beat plays out.
    Done,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Landing {
    Reveal,
    Declare,
    Finished,
}

/// Single-outcome walk: random spin, precision lock, then the winner beat.
#[derive(Clone, Debug)]
pub struct SpinWalk {
    index: usize,
    target: SlotId,
    slot_count: usize,
    state: SpinState,
    landing: Landing,
    last: Option<usize>,
    spin: SpinTiming,
    lock: LockTiming,
    winner: WinnerTiming,
    linger: Duration,
}

impl SpinWalk {
    /// Creates a walk landing the outcome at `index` on `target`.
    ///
    /// `linger` is the delay after the winner is declared.
    #[must_use]
    pub fn new(
        index: usize,
        target: SlotId,
        slot_count: usize,
        spin: SpinTiming,
        lock: LockTiming,
        winner: WinnerTiming,
        linger: Duration,
    ) -> Self {
        Self {
            index,
            target,
            slot_count,
            state: SpinState::Spinning {
                elapsed: Duration::ZERO,
            },
            landing: Landing::Reveal,
            last: None,
            spin,
            lock,
            winner,
            linger,
        }
    }

    /// Current state of the walk.
    #[must_use]
    pub const fn state(&self) -> SpinState {
        self.state
    }

    /// Produces the next step, or `None` once the winner has been declared.
    pub fn next_step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Step> {
        if self.slot_count == 0 {
            return None;
        }

        loop {
            match self.state {
                SpinState::Spinning { elapsed } => {
                    let progress = self.progress(elapsed);
                    if progress >= 1.0 {
                        self.state = SpinState::FinalApproach;
                        continue;
                    }
                    let delay = self.spin.curve.delay_at(progress).max(MIN_STEP);
                    let slot = self.pick(progress, rng);
                    self.state = SpinState::Spinning {
                        elapsed: elapsed.saturating_add(delay),
                    };
                    return Some(Step::new(Action::Highlight(slot), delay));
                }
                SpinState::FinalApproach => {
                    debug!(index = self.index, target = %self.target, "final approach");
                    self.state = SpinState::PrecisionLock { attempt: 0 };
                }
                SpinState::PrecisionLock { attempt } if attempt < self.lock.attempts => {
                    let slot = self.lock_on(attempt, rng);
                    self.state = SpinState::PrecisionLock {
                        attempt: attempt + 1,
                    };
                    return Some(Step::new(
                        Action::Highlight(slot),
                        self.lock.delay_for(attempt),
                    ));
                }
                SpinState::PrecisionLock { .. } => {
                    self.state = SpinState::Done;
                    return Some(Step::new(
                        Action::ClearHighlights,
                        self.lock.pause.saturating_add(self.winner.pause),
                    ));
                }
                SpinState::Done => return self.land(),
            }
        }
    }

    fn land(&mut self) -> Option<Step> {
        match self.landing {
            Landing::Reveal => {
                self.landing = Landing::Declare;
                Some(Step::new(
                    Action::Reveal {
                        index: self.index,
                        slot: self.target,
                        celebrate: false,
                    },
                    self.winner.reveal,
                ))
            }
            Landing::Declare => {
                self.landing = Landing::Finished;
                Some(Step::new(Action::Declare(self.target), self.linger))
            }
            Landing::Finished => None,
        }
    }

    fn progress(&self, elapsed: Duration) -> f64 {
        if self.spin.duration.is_zero() {
            return 1.0;
        }
        (elapsed.as_secs_f64() / self.spin.duration.as_secs_f64()).min(1.0)
    }

    fn pick<R: Rng + ?Sized>(&mut self, progress: f64, rng: &mut R) -> SlotId {
        let count = self.slot_count;
        let window = 1.0 - self.spin.bias_start;
        let biased = progress > self.spin.bias_start
            && window > 0.0
            && rng.gen::<f64>() < (progress - self.spin.bias_start) / window * self.spin.max_bias;

        let mut index = if biased {
            let neighbourhood = self.neighbourhood();
            neighbourhood[rng.gen_range(0..neighbourhood.len())]
        } else {
            rng.gen_range(0..count)
        };
        if self.last == Some(index) {
            index = (index + 1) % count;
        }
        self.last = Some(index);
        slot_id(index)
    }

    fn lock_on<R: Rng + ?Sized>(&self, attempt: u32, rng: &mut R) -> SlotId {
        let odds = self.lock.near_miss_odds(attempt);
        if odds > 0.0 && rng.gen::<f64>() < odds {
            let [before, _, after] = self.neighbourhood();
            return slot_id(if rng.gen::<bool>() { before } else { after });
        }
        self.target
    }

    fn neighbourhood(&self) -> [usize; 3] {
        let count = self.slot_count;
        let target = self.target.index() % count;
        [(target + count - 1) % count, target, (target + 1) % count]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SweepStage {
    Sweeping,
    Revealing(SlotId),
    Finalizing(SlotId),
}

/// Bulk walk: a round-robin sweep that stops on each assigned slot in turn.
///
/// A slot only counts as a hit after the sweep has completed a full lap, so
/// the first outcome never lands on the very first positions visited.
#[derive(Clone, Debug)]
pub struct SweepWalk {
    assignment: Vec<Option<SlotId>>,
    slot_count: usize,
    position: usize,
    laps: u32,
    outcome: usize,
    stage: SweepStage,
    timing: SweepTiming,
    linger: Duration,
}

impl SweepWalk {
    /// Creates a sweep over `slot_count` slots revealing the assigned outcomes.
    ///
    /// `linger` is the delay after the last outcome before the walk ends.
    #[must_use]
    pub fn new(
        assignment: Vec<Option<SlotId>>,
        slot_count: usize,
        timing: SweepTiming,
        linger: Duration,
    ) -> Self {
        Self {
            assignment,
            slot_count,
            position: 0,
            laps: 0,
            outcome: 0,
            stage: SweepStage::Sweeping,
            timing,
            linger,
        }
    }

    /// Number of outcomes resolved so far.
    #[must_use]
    pub const fn resolved(&self) -> usize {
        self.outcome
    }

    /// Produces the next step, or `None` once every outcome was resolved.
    pub fn next_step(&mut self) -> Option<Step> {
        if self.slot_count == 0 || self.outcome >= self.assignment.len() {
            return None;
        }

        match self.stage {
            SweepStage::Sweeping => {
                let Some(target) = self.assignment[self.outcome] else {
                    let index = self.outcome;
                    self.outcome += 1;
                    return Some(Step::new(Action::Skip(index), self.after_outcome()));
                };

                let slot = slot_id(self.position);
                if self.laps > 0 && slot == target {
                    self.stage = SweepStage::Revealing(slot);
                    return Some(Step::new(Action::Highlight(slot), self.timing.reveal_lead));
                }
                self.advance_position();
                Some(Step::new(Action::Highlight(slot), self.timing.step))
            }
            SweepStage::Revealing(slot) => {
                self.stage = SweepStage::Finalizing(slot);
                Some(Step::new(
                    Action::Reveal {
                        index: self.outcome,
                        slot,
                        celebrate: true,
                    },
                    self.timing.reveal_hold,
                ))
            }
            SweepStage::Finalizing(slot) => {
                self.stage = SweepStage::Sweeping;
                self.outcome += 1;
                self.advance_position();
                Some(Step::new(Action::Finalize(slot), self.after_outcome()))
            }
        }
    }

    fn after_outcome(&self) -> Duration {
        if self.outcome >= self.assignment.len() {
            self.linger
        } else {
            self.timing.step
        }
    }

    fn advance_position(&mut self) {
        self.position = (self.position + 1) % self.slot_count;
        if self.position == 0 {
            self.laps = self.laps.saturating_add(1);
        }
    }
}

fn slot_id(index: usize) -> SlotId {
    SlotId::new(u32::try_from(index).unwrap_or(u32::MAX))
}
