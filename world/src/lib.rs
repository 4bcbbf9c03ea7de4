#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Lucky Draw.
//!
//! The world owns the slot grid built once at startup and the ledger of draw
//! sessions. It is mutated exclusively through [`apply`]; systems observe it
//! through the read-only [`query`] functions.

mod grid;
mod sessions;

use std::time::Duration;

use lucky_draw_core::{Command, Event, PrizeAmount, Rejection, Resolution};
use tracing::{debug, warn};

use grid::{SlotGrid, Transient};
use sessions::{DrawSession, SessionLedger};

const DEFAULT_LAYOUT: [u32; 12] = [20, 20, 20, 50, 50, 50, 100, 100, 200, 200, 500, 1000];

/// Description of a slot used to build the grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlotSpec {
    /// Name displayed on the slot.
    pub display_name: String,
    /// Prize bound to the slot, if any.
    pub prize: Option<PrizeAmount>,
}

impl SlotSpec {
    /// Creates a prize slot labelled after its cash value.
    #[must_use]
    pub fn cash_prize(prize: PrizeAmount) -> Self {
        Self {
            display_name: format!("{prize} Cash Prize"),
            prize: Some(prize),
        }
    }

    /// Creates a slot that only displays a name.
    #[must_use]
    pub fn named(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            prize: None,
        }
    }
}

/// Prize layout used when no custom grid is configured.
#[must_use]
pub fn default_layout() -> Vec<SlotSpec> {
    DEFAULT_LAYOUT
        .iter()
        .map(|value| SlotSpec::cash_prize(PrizeAmount::new(*value)))
        .collect()
}

/// Represents the authoritative Lucky Draw world state.
#[derive(Debug)]
pub struct World {
    grid: SlotGrid,
    sessions: SessionLedger,
    elapsed: Duration,
}

impl World {
    /// Creates a world whose grid holds the provided slots in order.
    #[must_use]
    pub fn new(slots: Vec<SlotSpec>) -> Self {
        Self {
            grid: SlotGrid::new(slots),
            sessions: SessionLedger::default(),
            elapsed: Duration::ZERO,
        }
    }

    /// Creates a world using [`default_layout`].
    #[must_use]
    pub fn with_default_layout() -> Self {
        Self::new(default_layout())
    }
}

impl Default for World {
    fn default() -> Self {
        Self::with_default_layout()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => {
            world.elapsed = world.elapsed.saturating_add(dt);
            out_events.push(Event::TimeAdvanced { dt });
        }
        Command::ClearTransient => {
            world.grid.clear_transient();
            out_events.push(Event::TransientCleared);
        }
        Command::MarkSlot { slot, marker } => match world.grid.get_mut(slot) {
            Some(entry) => {
                entry.transient = Some(Transient::Marker(marker));
                out_events.push(Event::SlotMarked { slot, marker });
            }
            None => reject(Rejection::UnknownSlot(slot), out_events),
        },
        Command::ResetBoard => {
            if world.sessions.is_busy() {
                reject(Rejection::SessionBusy, out_events);
                return;
            }
            world.grid.clear_resolutions();
            world.sessions.dismiss();
            out_events.push(Event::BoardReset);
        }
        Command::OpenSession {
            participant,
            outcomes,
            assignment,
        } => {
            if world.sessions.is_busy() {
                reject(Rejection::SessionBusy, out_events);
                return;
            }
            let tickets = outcomes.len();
            world
                .sessions
                .open(DrawSession::new(participant.clone(), outcomes, assignment));
            debug!(%participant, tickets, "draw session opened");
            out_events.push(Event::SessionOpened {
                participant,
                tickets,
            });
        }
        Command::RevealOutcome { index, slot } => reveal_outcome(world, index, slot, out_events),
        Command::SkipOutcome { index } => {
            let Some(session) = world.sessions.in_progress_mut() else {
                reject(Rejection::NoActiveSession, out_events);
                return;
            };
            if index != session.cursor() {
                reject(
                    Rejection::OutOfOrder {
                        expected: session.cursor(),
                        received: index,
                    },
                    out_events,
                );
                return;
            }
            if let Some(prize) = session.record_skip() {
                warn!(index, %prize, "outcome skipped without a slot");
                out_events.push(Event::OutcomeSkipped { index, prize });
            }
        }
        Command::FinalizeSlot { slot } => match world.grid.get_mut(slot) {
            Some(entry) => {
                entry.transient = None;
                if entry.resolution != Resolution::Won {
                    entry.resolution = Resolution::Finalized;
                }
                out_events.push(Event::SlotFinalized { slot });
            }
            None => reject(Rejection::UnknownSlot(slot), out_events),
        },
        Command::DeclareWinner { slot } => match world.grid.get_mut(slot) {
            Some(entry) => {
                entry.transient = None;
                entry.resolution = Resolution::Won;
                out_events.push(Event::WinnerDeclared {
                    slot,
                    display_name: entry.display_name().to_owned(),
                });
            }
            None => reject(Rejection::UnknownSlot(slot), out_events),
        },
        Command::CompleteSession => {
            let Some(session) = world.sessions.in_progress_mut() else {
                reject(Rejection::NoActiveSession, out_events);
                return;
            };
            if session.cursor() != session.tickets() {
                reject(
                    Rejection::Incomplete {
                        cursor: session.cursor(),
                        tickets: session.tickets(),
                    },
                    out_events,
                );
                return;
            }
            session.complete();
            out_events.push(Event::SessionCompleted {
                participant: session.participant().clone(),
                tickets: session.tickets(),
                total_winnings: session.total_winnings(),
            });
        }
        Command::AbandonSession => match world.sessions.abandon() {
            Some(session) => {
                world.grid.clear_transient();
                warn!(
                    participant = %session.participant(),
                    cursor = session.cursor(),
                    "draw session abandoned"
                );
                out_events.push(Event::SessionAbandoned {
                    participant: session.participant().clone(),
                    cursor: session.cursor(),
                });
            }
            None => reject(Rejection::NoActiveSession, out_events),
        },
        Command::Celebrate { target } => {
            out_events.push(Event::CelebrationRequested { target });
        }
        Command::AnnouncePhase { phase } => {
            if let Some(session) = world.sessions.in_progress_mut() {
                session.phase = phase;
            }
            out_events.push(Event::PhaseChanged { phase });
        }
    }
}

fn reveal_outcome(
    world: &mut World,
    index: usize,
    slot: lucky_draw_core::SlotId,
    out_events: &mut Vec<Event>,
) {
    let Some(slot_prize) = world.grid.get(slot).map(|entry| entry.prize()) else {
        reject(Rejection::UnknownSlot(slot), out_events);
        return;
    };
    let Some(session) = world.sessions.in_progress_mut() else {
        reject(Rejection::NoActiveSession, out_events);
        return;
    };
    if index != session.cursor() {
        reject(
            Rejection::OutOfOrder {
                expected: session.cursor(),
                received: index,
            },
            out_events,
        );
        return;
    }
    if slot_prize.is_none() || slot_prize != session.pending_prize() {
        reject(Rejection::PrizeMismatch { index, slot }, out_events);
        return;
    }
    let Some(prize) = session.record_reveal() else {
        return;
    };
    let cursor = session.cursor();
    let total_winnings = session.total_winnings();

    if let Some(entry) = world.grid.get_mut(slot) {
        entry.transient = Some(Transient::Revealing);
    }
    out_events.push(Event::OutcomeRevealed {
        index,
        slot,
        prize,
        cursor,
        total_winnings,
    });
}

fn reject(reason: Rejection, out_events: &mut Vec<Event>) {
    warn!(?reason, "command rejected");
    out_events.push(Event::CommandRejected { reason });
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use super::World;
    use lucky_draw_core::{ParticipantId, PrizeAmount, SessionSnapshot, SlotId, SlotView};

    /// Captures a read-only view of every slot and its visual state.
    #[must_use]
    pub fn slot_view(world: &World) -> SlotView {
        world.grid.view()
    }

    /// Number of slots in the grid.
    #[must_use]
    pub fn slot_count(world: &World) -> usize {
        world.grid.len()
    }

    /// Identifiers of the slots bound to the provided prize, in grid order.
    #[must_use]
    pub fn slots_with_prize(world: &World, prize: PrizeAmount) -> Vec<SlotId> {
        world.grid.slots_with_prize(prize)
    }

    /// Snapshot of the session currently displayed, finished or not.
    #[must_use]
    pub fn active_session(world: &World) -> Option<SessionSnapshot> {
        world.sessions.active().map(|session| session.snapshot())
    }

    /// Snapshot of the participant's completed session, kept for re-display.
    #[must_use]
    pub fn completed_session(
        world: &World,
        participant: &ParticipantId,
    ) -> Option<SessionSnapshot> {
        world
            .sessions
            .completed(participant)
            .map(|session| session.snapshot())
    }

    /// Total simulated time applied to the world.
    #[must_use]
    pub fn elapsed(world: &World) -> Duration {
        world.elapsed
    }
}
