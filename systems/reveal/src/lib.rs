#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Reveal sequencer that walks the grid and lands each outcome on its slot.
//!
//! The sequencer owns a single timer and a seeded random number generator.
//! It consumes [`Event::TimeAdvanced`] and emits highlight, reveal and
//! celebration commands for every step that became due, so the same seed and
//! the same sequence of time deltas always produce the same command stream.

mod assignment;
mod speed_curve;
pub mod walk;

use std::time::Duration;

use lucky_draw_core::{
    CelebrationTarget, Command, Event, Marker, OutcomeList, SlotView, Timer,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub use assignment::Assignment;
pub use speed_curve::SpeedCurve;
use walk::{Action, LockTiming, SpinTiming, SpinWalk, Step, SweepTiming, SweepWalk, WinnerTiming};

/// How the outcomes of a session are revealed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RevealMode {
    /// Single for a one-ticket session, bulk otherwise.
    #[default]
    Auto,
    /// Spin, lock on and declare a winner for every outcome in turn.
    Single,
    /// One round-robin sweep resolving every outcome.
    Bulk,
}

impl RevealMode {
    /// Resolves [`RevealMode::Auto`] for a session with `outcomes` entries.
    #[must_use]
    pub const fn resolve(self, outcomes: usize) -> Self {
        match self {
            Self::Auto if outcomes == 1 => Self::Single,
            Self::Auto => Self::Bulk,
            other => other,
        }
    }
}

/// Configuration parameters required to construct the reveal sequencer.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Spin timing of single reveals.
    pub spin: SpinTiming,
    /// Lock-on timing of single reveals.
    pub lock: LockTiming,
    /// Winner beat of single reveals.
    pub winner: WinnerTiming,
    /// Sweep timing of bulk reveals.
    pub sweep: SweepTiming,
    /// Delay after the last outcome before the sequencer reports completion.
    pub completion_delay: Duration,
    /// Reveal mode selection.
    pub mode: RevealMode,
    /// Seed of the random number generator.
    pub seed: u64,
}

impl Config {
    /// Creates the default configuration with the provided seed.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            spin: SpinTiming::default(),
            lock: LockTiming::default(),
            winner: WinnerTiming::default(),
            sweep: SweepTiming::default(),
            completion_delay: Duration::from_millis(1000),
            mode: RevealMode::Auto,
            seed: 0x6c75_636b_7964_7261,
        }
    }
}

/// Outcomes of a session together with the slots they will land on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RevealPlan {
    outcomes: OutcomeList,
    assignment: Assignment,
    slot_count: usize,
    mode: RevealMode,
}

impl RevealPlan {
    /// Outcomes in reveal order.
    #[must_use]
    pub fn outcomes(&self) -> &OutcomeList {
        &self.outcomes
    }

    /// Slot chosen for every outcome.
    #[must_use]
    pub fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    /// Resolved reveal mode, never [`RevealMode::Auto`].
    #[must_use]
    pub const fn mode(&self) -> RevealMode {
        self.mode
    }

    fn walk_for(&self, index: usize, config: &Config) -> Walk {
        match self.assignment.get(index) {
            Some(target) => Walk::Spin(SpinWalk::new(
                index,
                target,
                self.slot_count,
                config.spin,
                config.lock.clone(),
                config.winner,
                config.completion_delay,
            )),
            None => Walk::Skip {
                index,
                emitted: false,
            },
        }
    }
}

#[derive(Debug)]
enum Walk {
    Spin(SpinWalk),
    Sweep(SweepWalk),
    Skip { index: usize, emitted: bool },
}

#[derive(Debug)]
struct Run {
    plan: RevealPlan,
    walk: Walk,
    index: usize,
}

impl Run {
    fn new(plan: RevealPlan, config: &Config) -> Self {
        let walk = match plan.mode {
            RevealMode::Bulk => Walk::Sweep(SweepWalk::new(
                plan.assignment.as_slice().to_vec(),
                plan.slot_count,
                config.sweep,
                config.completion_delay,
            )),
            _ => plan.walk_for(0, config),
        };
        Self {
            plan,
            walk,
            index: 0,
        }
    }

    fn next_step(&mut self, rng: &mut ChaCha8Rng, config: &Config) -> Option<Step> {
        loop {
            let step = match &mut self.walk {
                Walk::Spin(walk) => walk.next_step(rng),
                Walk::Sweep(walk) => walk.next_step(),
                Walk::Skip { index, emitted } => {
                    if *emitted {
                        None
                    } else {
                        *emitted = true;
                        Some(Step {
                            action: Action::Skip(*index),
                            delay: Duration::ZERO,
                        })
                    }
                }
            };
            if step.is_some() {
                return step;
            }
            if matches!(self.walk, Walk::Sweep(_)) {
                return None;
            }

            self.index += 1;
            if self.index >= self.plan.outcomes.len() {
                return None;
            }
            debug!(index = self.index, "next outcome");
            self.walk = self.plan.walk_for(self.index, config);
        }
    }
}

/// Timed state machine revealing the outcomes of one session.
#[derive(Debug)]
pub struct RevealSequencer {
    config: Config,
    rng: ChaCha8Rng,
    timer: Timer,
    run: Option<Run>,
    finished: bool,
}

impl RevealSequencer {
    /// Creates an idle sequencer using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self {
            config,
            rng,
            timer: Timer::new(),
            run: None,
            finished: false,
        }
    }

    /// Builds the plan for a session: resolves the mode and assigns every outcome to a slot.
    pub fn prepare(&mut self, outcomes: OutcomeList, slots: &SlotView) -> RevealPlan {
        let assignment = Assignment::build(&outcomes, slots, &mut self.rng);
        let mode = self.config.mode.resolve(outcomes.len());
        RevealPlan {
            outcomes,
            assignment,
            slot_count: slots.len(),
            mode,
        }
    }

    /// Starts revealing the plan; the first step is emitted on the next time event.
    ///
    /// A plan without outcomes finishes immediately.
    pub fn start(&mut self, plan: RevealPlan) {
        self.timer.cancel();
        if plan.outcomes.is_empty() {
            self.run = None;
            self.finished = true;
            return;
        }
        info!(
            outcomes = plan.outcomes.len(),
            mode = ?plan.mode,
            "reveal started"
        );
        self.run = Some(Run::new(plan, &self.config));
        self.finished = false;
        self.timer.arm_now();
    }

    /// Reports whether a reveal is in progress.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.run.is_some()
    }

    /// Reports whether the last started reveal ran to completion.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    /// Cancels the pending step and clears every highlight.
    ///
    /// Intended for abnormal teardown; the interrupted reveal does not count
    /// as finished.
    pub fn hard_stop(&mut self, out: &mut Vec<Command>) {
        self.timer.cancel();
        if self.run.take().is_some() {
            out.push(Command::ClearTransient);
            info!("reveal stopped");
        }
    }

    /// Consumes events and emits commands for every step that became due.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        for event in events {
            if let Event::TimeAdvanced { dt } = event {
                let _ = self.advance(*dt, out);
            }
        }
    }

    /// Advances the reveal by `dt`, emitting commands for every step that became due.
    ///
    /// Returns the part of `dt` left after the reveal finished, or `None` while
    /// it is still running or idle.
    pub fn advance(&mut self, dt: Duration, out: &mut Vec<Command>) -> Option<Duration> {
        let mut budget = dt;
        while let Some(overshoot) = self.timer.advance(budget) {
            budget = overshoot;
            if self.fire(out) {
                return Some(budget);
            }
        }
        None
    }

    fn fire(&mut self, out: &mut Vec<Command>) -> bool {
        let Some(run) = self.run.as_mut() else {
            return false;
        };

        match run.next_step(&mut self.rng, &self.config) {
            Some(step) => {
                emit(step.action, out);
                self.timer.arm(step.delay);
                false
            }
            None => {
                self.run = None;
                self.finished = true;
                info!("reveal finished");
                true
            }
        }
    }
}

fn emit(action: Action, out: &mut Vec<Command>) {
    match action {
        Action::Highlight(slot) => {
            out.push(Command::ClearTransient);
            out.push(Command::MarkSlot {
                slot,
                marker: Marker::Primary,
            });
        }
        Action::ClearHighlights => out.push(Command::ClearTransient),
        Action::Reveal {
            index,
            slot,
            celebrate,
        } => {
            out.push(Command::RevealOutcome { index, slot });
            if celebrate {
                out.push(Command::Celebrate {
                    target: CelebrationTarget::Slot(slot),
                });
            }
        }
        Action::Declare(slot) => {
            out.push(Command::DeclareWinner { slot });
            out.push(Command::Celebrate {
                target: CelebrationTarget::Slot(slot),
            });
        }
        Action::Finalize(slot) => out.push(Command::FinalizeSlot { slot }),
        Action::Skip(index) => out.push(Command::SkipOutcome { index }),
    }
}
