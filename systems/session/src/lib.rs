#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Session controller that owns the draw-in-progress flag and the phase machine.
//!
//! The controller is the only component that decides when a draw starts and
//! ends. It stops the idle pattern, opens the session, plays the pre-draw
//! flourish, hands the grid to the reveal sequencer, settles, and finally
//! restarts the idle pattern. Every phase change is announced to the world
//! through [`Command::AnnouncePhase`].

use std::{collections::BTreeSet, time::Duration};

use lucky_draw_core::{
    CelebrationTarget, Command, DrawError, Event, Marker, OutcomeSource, ParticipantId, Phase,
    Selection, SlotView, Timer,
};
use lucky_draw_system_idle_pattern::{self as idle_pattern, IdlePatternPlayer};
use lucky_draw_system_reveal::{self as reveal, RevealPlan, RevealSequencer};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// What to do with outcomes whose prize no slot carries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnassignablePolicy {
    /// Log the outcome and advance past it; the draw continues.
    #[default]
    Skip,
    /// Refuse the whole draw before anything is shown.
    Reject,
}

/// Configuration parameters required to construct the session controller.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Length of the decorative flourish before the reveal.
    pub flourish: Duration,
    /// Length of the celebratory pause after the reveal.
    pub settle: Duration,
    /// Handling of outcomes that cannot be placed on the grid.
    pub unassignable: UnassignablePolicy,
    /// Idle pattern player configuration.
    pub idle: idle_pattern::Config,
    /// Reveal sequencer configuration.
    pub reveal: reveal::Config,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            flourish: Duration::from_millis(1800),
            settle: Duration::from_millis(2000),
            unassignable: UnassignablePolicy::Skip,
            idle: idle_pattern::Config::default(),
            reveal: reveal::Config::default(),
        }
    }
}

/// Result of a draw request that did not fail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DrawRequest {
    /// A new session was opened.
    Started {
        /// Participant being drawn.
        participant: ParticipantId,
        /// Number of outcomes the session reveals.
        tickets: usize,
    },
    /// A draw is already running; the request was ignored.
    Busy,
}

/// Orchestrates idle, flourish, reveal and settle phases.
#[derive(Debug)]
pub struct SessionController {
    flourish: Duration,
    settle: Duration,
    unassignable: UnassignablePolicy,
    idle: IdlePatternPlayer,
    sequencer: RevealSequencer,
    timer: Timer,
    phase: Phase,
    drawing: bool,
    selection: Option<Selection>,
    participant: Option<ParticipantId>,
    pending_plan: Option<RevealPlan>,
    drawn: BTreeSet<ParticipantId>,
}

impl SessionController {
    /// Creates a controller in the idle phase with the idle pattern running.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let mut idle = IdlePatternPlayer::new(config.idle);
        idle.start();
        Self {
            flourish: config.flourish,
            settle: config.settle,
            unassignable: config.unassignable,
            idle,
            sequencer: RevealSequencer::new(config.reveal),
            timer: Timer::new(),
            phase: Phase::Idle,
            drawing: false,
            selection: None,
            participant: None,
            pending_plan: None,
            drawn: BTreeSet::new(),
        }
    }

    /// Phase the controller is in.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Reports whether a draw is in progress.
    #[must_use]
    pub const fn is_drawing(&self) -> bool {
        self.drawing
    }

    /// Reports whether external controls should be enabled.
    #[must_use]
    pub const fn controls_enabled(&self) -> bool {
        !self.drawing && self.phase.accepts_controls()
    }

    /// Participant currently selected, if any.
    #[must_use]
    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// Reports whether the participant already completed a draw in this run.
    #[must_use]
    pub fn has_drawn(&self, participant: &ParticipantId) -> bool {
        self.drawn.contains(participant)
    }

    /// Replaces the selection. Ignored while a draw is running.
    pub fn select(&mut self, selection: Selection) -> bool {
        if self.drawing {
            return false;
        }
        debug!(participant = %selection.participant, tickets = selection.ticket_count, "participant selected");
        self.selection = Some(selection);
        true
    }

    /// Forgets the selection. Ignored while a draw is running.
    pub fn clear_selection(&mut self) -> bool {
        if self.drawing {
            return false;
        }
        self.selection = None;
        true
    }

    /// Starts a draw for the selected participant.
    ///
    /// Returns [`DrawRequest::Busy`] without side effects while a draw is
    /// running. Every error is detected before any command is emitted, so a
    /// refused request leaves the controller idle with controls enabled.
    pub fn request_draw<S>(
        &mut self,
        source: &S,
        slots: &SlotView,
        out: &mut Vec<Command>,
    ) -> Result<DrawRequest, DrawError>
    where
        S: OutcomeSource + ?Sized,
    {
        if self.drawing {
            debug!("draw requested while another is running");
            return Ok(DrawRequest::Busy);
        }

        let selection = self.selection.as_ref().ok_or(DrawError::NoSelection)?;
        let participant = selection.participant.clone();
        if slots.is_empty() {
            return Err(DrawError::EmptyGrid);
        }
        if self.drawn.contains(&participant) {
            return Err(DrawError::AlreadyDrawn(participant));
        }
        let outcomes = source
            .outcome_list(&participant)
            .ok_or_else(|| DrawError::MissingOutcomeData(participant.clone()))?;
        if outcomes.is_empty() {
            return Err(DrawError::NoTickets(participant));
        }
        if usize::try_from(selection.ticket_count).ok() != Some(outcomes.len()) {
            warn!(
                %participant,
                selected = selection.ticket_count,
                outcomes = outcomes.len(),
                "ticket count differs from outcome list; drawing the outcome list"
            );
        }

        let plan = self.sequencer.prepare(outcomes, slots);
        if let Some((index, prize)) = plan.assignment().first_unassigned(plan.outcomes()) {
            match self.unassignable {
                UnassignablePolicy::Reject => {
                    return Err(DrawError::UnassignableOutcome { index, prize });
                }
                UnassignablePolicy::Skip => {
                    warn!(%participant, index, %prize, "outcome has no slot and will be skipped");
                }
            }
        }

        let tickets = plan.outcomes().len();
        info!(%participant, tickets, mode = ?plan.mode(), "draw started");

        self.idle.stop(out);
        self.drawing = true;
        out.push(Command::ResetBoard);
        out.push(Command::OpenSession {
            participant: participant.clone(),
            outcomes: plan.outcomes().clone(),
            assignment: plan.assignment().as_slice().to_vec(),
        });
        self.enter(Phase::PreDrawFlourish, out);
        for slot in slots.iter() {
            out.push(Command::MarkSlot {
                slot: slot.id,
                marker: Marker::Flourish,
            });
        }
        self.timer.arm(self.flourish);
        self.pending_plan = Some(plan);
        self.participant = Some(participant.clone());

        Ok(DrawRequest::Started {
            participant,
            tickets,
        })
    }

    /// Clears resolved slots and the displayed summary. Ignored while a draw is running.
    pub fn request_reset(&mut self, out: &mut Vec<Command>) -> bool {
        if self.drawing {
            return false;
        }
        out.push(Command::ResetBoard);
        true
    }

    /// Tears down a running draw immediately and returns to idle.
    ///
    /// The unfinished session is discarded and the participant may be drawn
    /// again. Does nothing when no draw is running.
    pub fn abort(&mut self, out: &mut Vec<Command>) {
        if !self.drawing {
            return;
        }
        warn!(participant = ?self.participant, phase = ?self.phase, "draw aborted");
        self.sequencer.hard_stop(out);
        self.timer.cancel();
        self.pending_plan = None;
        if self.phase != Phase::Settling {
            out.push(Command::AbandonSession);
        }
        out.push(Command::ClearTransient);
        self.return_to_idle(out);
    }

    /// Consumes events and emits commands for phase changes and animation steps.
    pub fn handle(&mut self, events: &[Event], slot_count: usize, out: &mut Vec<Command>) {
        for event in events {
            if let Event::TimeAdvanced { dt } = event {
                self.advance(*dt, slot_count, out);
            }
        }
    }

    /// Hands `dt` to whichever component owns the current phase.
    ///
    /// When a phase ends partway through `dt`, only the remainder is passed to
    /// the component of the next phase.
    fn advance(&mut self, dt: Duration, slot_count: usize, out: &mut Vec<Command>) {
        let mut budget = dt;
        loop {
            match self.phase {
                Phase::Idle => {
                    self.idle.advance(budget, slot_count, out);
                    return;
                }
                Phase::PreDrawFlourish | Phase::Settling => match self.timer.advance(budget) {
                    Some(overshoot) => {
                        budget = overshoot;
                        self.phase_elapsed(out);
                    }
                    None => return,
                },
                Phase::Revealing => {
                    if !self.sequencer.is_finished() {
                        match self.sequencer.advance(budget, out) {
                            Some(remainder) => budget = remainder,
                            None => return,
                        }
                    }
                    self.finish_reveal(out);
                }
            }
        }
    }

    fn phase_elapsed(&mut self, out: &mut Vec<Command>) {
        match self.phase {
            Phase::PreDrawFlourish => {
                out.push(Command::ClearTransient);
                self.enter(Phase::Revealing, out);
                match self.pending_plan.take() {
                    Some(plan) => self.sequencer.start(plan),
                    None => self.abort(out),
                }
            }
            Phase::Settling => self.return_to_idle(out),
            Phase::Idle | Phase::Revealing => {}
        }
    }

    fn finish_reveal(&mut self, out: &mut Vec<Command>) {
        self.enter(Phase::Settling, out);
        out.push(Command::CompleteSession);
        if let Some(participant) = self.participant.clone() {
            info!(%participant, "draw completed");
            out.push(Command::Celebrate {
                target: CelebrationTarget::Session(participant.clone()),
            });
            let _ = self.drawn.insert(participant);
        }
        self.timer.arm(self.settle);
    }

    fn return_to_idle(&mut self, out: &mut Vec<Command>) {
        self.drawing = false;
        self.enter(Phase::Idle, out);
        self.idle.start();
    }

    fn enter(&mut self, phase: Phase, out: &mut Vec<Command>) {
        debug!(from = ?self.phase, to = ?phase, "phase changed");
        self.phase = phase;
        out.push(Command::AnnouncePhase { phase });
    }
}
