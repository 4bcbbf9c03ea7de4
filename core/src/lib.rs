#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Lucky Draw engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! views such as [`SlotView`], and respond exclusively with new command batches.

mod timer;

use std::{collections::BTreeMap, fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use timer::{Timer, MIN_STEP};

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Removes every transient marker (highlights and reveal markers) from the grid.
    ClearTransient,
    /// Applies a transient highlight marker to a single slot.
    MarkSlot {
        /// Slot receiving the marker.
        slot: SlotId,
        /// Marker to display on the slot.
        marker: Marker,
    },
    /// Clears every marker and resolution on the grid and forgets the displayed session.
    ResetBoard,
    /// Opens a new draw session for the participant.
    OpenSession {
        /// Participant whose tickets are being drawn.
        participant: ParticipantId,
        /// Ordered outcomes the draw reveals.
        outcomes: OutcomeList,
        /// Slot chosen for each outcome position, `None` when no slot carries the prize.
        assignment: Vec<Option<SlotId>>,
    },
    /// Reveals the outcome at `index` on the provided slot.
    RevealOutcome {
        /// Position of the outcome inside the session's outcome list.
        index: usize,
        /// Slot the outcome lands on.
        slot: SlotId,
    },
    /// Advances the session cursor past an outcome that could not be placed.
    SkipOutcome {
        /// Position of the skipped outcome.
        index: usize,
    },
    /// Clears the transient marker of a slot and marks it as finalized.
    FinalizeSlot {
        /// Slot to finalize.
        slot: SlotId,
    },
    /// Clears the transient marker of a slot and marks it as the winner.
    DeclareWinner {
        /// Slot that won.
        slot: SlotId,
    },
    /// Freezes the active session once every outcome has been revealed.
    CompleteSession,
    /// Discards the active session without archiving it.
    AbandonSession,
    /// Requests a celebration effect from the presentation layer.
    Celebrate {
        /// What is being celebrated.
        target: CelebrationTarget,
    },
    /// Records the phase the session controller transitioned into.
    AnnouncePhase {
        /// Phase that became active.
        phase: Phase,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that all transient markers were removed.
    TransientCleared,
    /// Confirms that a marker was applied to a slot.
    SlotMarked {
        /// Slot that received the marker.
        slot: SlotId,
        /// Marker now displayed on the slot.
        marker: Marker,
    },
    /// Confirms that the grid returned to its pristine state.
    BoardReset,
    /// Announces that a draw session was opened.
    SessionOpened {
        /// Participant whose tickets are drawn.
        participant: ParticipantId,
        /// Number of outcomes the session will reveal.
        tickets: usize,
    },
    /// Announces that an outcome was revealed on a slot.
    OutcomeRevealed {
        /// Position of the revealed outcome.
        index: usize,
        /// Slot carrying the revealed prize.
        slot: SlotId,
        /// Prize that was revealed.
        prize: PrizeAmount,
        /// Number of outcomes resolved so far, including this one.
        cursor: usize,
        /// Accumulated winnings after this reveal.
        total_winnings: u64,
    },
    /// Reports that an outcome was skipped because no slot carries its prize.
    OutcomeSkipped {
        /// Position of the skipped outcome.
        index: usize,
        /// Prize that could not be placed.
        prize: PrizeAmount,
    },
    /// Confirms that a slot was finalized.
    SlotFinalized {
        /// Slot that was finalized.
        slot: SlotId,
    },
    /// Announces the winning slot and its display name.
    WinnerDeclared {
        /// Slot that won.
        slot: SlotId,
        /// Display name bound to the slot.
        display_name: String,
    },
    /// Announces that the active session revealed every outcome.
    SessionCompleted {
        /// Participant whose session completed.
        participant: ParticipantId,
        /// Number of outcomes resolved by the session.
        tickets: usize,
        /// Total winnings accumulated by the session.
        total_winnings: u64,
    },
    /// Announces that an unfinished session was discarded.
    SessionAbandoned {
        /// Participant whose session was discarded.
        participant: ParticipantId,
        /// Outcomes resolved before the session was discarded.
        cursor: usize,
    },
    /// Requests a celebration effect from the presentation layer.
    CelebrationRequested {
        /// What is being celebrated.
        target: CelebrationTarget,
    },
    /// Announces that the session controller entered a new phase.
    PhaseChanged {
        /// Phase that became active.
        phase: Phase,
    },
    /// Reports that the world refused to execute a command.
    CommandRejected {
        /// Specific reason the command was refused.
        reason: Rejection,
    },
}

/// Reasons the world may refuse to execute a command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Rejection {
    /// The command referenced a slot outside the grid.
    UnknownSlot(SlotId),
    /// A session is still being revealed, so a new one cannot be opened.
    SessionBusy,
    /// The command requires an active session but none is open.
    NoActiveSession,
    /// The outcome index did not match the session cursor.
    OutOfOrder {
        /// Index the session expected next.
        expected: usize,
        /// Index carried by the command.
        received: usize,
    },
    /// The slot does not carry the prize of the outcome being revealed.
    PrizeMismatch {
        /// Outcome position being revealed.
        index: usize,
        /// Slot named by the command.
        slot: SlotId,
    },
    /// The session cannot complete while outcomes remain unrevealed.
    Incomplete {
        /// Outcomes resolved so far.
        cursor: usize,
        /// Outcomes the session holds.
        tickets: usize,
    },
}

/// Unique identifier of a display slot, equal to its index within the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotId(u32);

impl SlotId {
    /// Creates a new slot identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Position of the slot inside the grid.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Stable key identifying a participant inside the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Creates a new participant identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrowed string form of the identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Cash value of a prize. Doubles as the prize label (`$100`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PrizeAmount(u32);

impl PrizeAmount {
    /// Creates a prize worth the provided number of whole currency units.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Value of the prize in whole currency units.
    #[must_use]
    pub const fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for PrizeAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.0)
    }
}

/// Suffix used by long-form prize labels such as `$100 Cash Prize`.
const CASH_PRIZE_SUFFIX: &str = "Cash Prize";

impl FromStr for PrizeAmount {
    type Err = ParsePrizeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let without_suffix = trimmed
            .strip_suffix(CASH_PRIZE_SUFFIX)
            .map_or(trimmed, str::trim_end);
        let digits = without_suffix
            .strip_prefix('$')
            .unwrap_or(without_suffix)
            .replace(',', "");

        match digits.parse::<u32>() {
            Ok(amount) if amount > 0 => Ok(Self(amount)),
            _ => Err(ParsePrizeError(value.to_owned())),
        }
    }
}

impl TryFrom<String> for PrizeAmount {
    type Error = ParsePrizeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PrizeAmount> for String {
    fn from(prize: PrizeAmount) -> Self {
        prize.to_string()
    }
}

/// Error returned when a prize label cannot be interpreted.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("'{0}' is not a known prize label")]
pub struct ParsePrizeError(String);

/// Pre-computed, ordered sequence of prizes a participant's tickets reveal.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutcomeList(Vec<PrizeAmount>);

impl OutcomeList {
    /// Wraps the provided outcomes, preserving their order.
    #[must_use]
    pub fn new(outcomes: Vec<PrizeAmount>) -> Self {
        Self(outcomes)
    }

    /// Number of outcomes, equal to the participant's ticket count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Reports whether the list holds no outcomes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Outcome at the provided position.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<PrizeAmount> {
        self.0.get(index).copied()
    }

    /// Outcomes in reveal order.
    #[must_use]
    pub fn as_slice(&self) -> &[PrizeAmount] {
        &self.0
    }

    /// Sum of every outcome's prize value.
    #[must_use]
    pub fn total_value(&self) -> u64 {
        self.0.iter().map(|prize| u64::from(prize.value())).sum()
    }
}

impl FromIterator<PrizeAmount> for OutcomeList {
    fn from_iter<I: IntoIterator<Item = PrizeAmount>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Transient highlight applied to a slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Marker {
    /// Main highlight used by idle patterns and the reveal walk.
    Primary,
    /// Companion highlight used by idle patterns.
    Secondary,
    /// Grid-wide shimmer shown during the pre-draw flourish.
    Flourish,
}

/// Durable outcome recorded on a slot during a session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Resolution {
    /// The slot has not been resolved in the displayed session.
    #[default]
    Unresolved,
    /// The slot received at least one outcome of a bulk reveal.
    Finalized,
    /// The slot won a single-outcome reveal.
    Won,
}

/// Observable state of a slot; transient markers take precedence over resolutions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SlotState {
    /// Nothing is displayed on the slot.
    Idle,
    /// The slot carries a highlight marker.
    Highlighted(Marker),
    /// The slot is in the middle of revealing an outcome.
    Revealing,
    /// The slot holds a finalized bulk outcome.
    Finalized,
    /// The slot is the declared winner.
    Won,
}

impl SlotState {
    /// Reports whether the state is cleared by [`Command::ClearTransient`].
    #[must_use]
    pub const fn is_transient(self) -> bool {
        matches!(self, Self::Highlighted(_) | Self::Revealing)
    }
}

/// Immutable representation of a single slot used for queries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlotSnapshot {
    /// Identifier of the slot, equal to its grid position.
    pub id: SlotId,
    /// Name shown on the slot.
    pub display_name: String,
    /// Prize bound to the slot, if the grid is used for prize drawing.
    pub prize: Option<PrizeAmount>,
    /// Observable state of the slot.
    pub state: SlotState,
    /// Durable resolution underneath any transient marker.
    pub resolution: Resolution,
}

/// Read-only snapshot describing every slot of the grid.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SlotView {
    snapshots: Vec<SlotSnapshot>,
}

impl SlotView {
    /// Creates a new slot view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<SlotSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured slots in grid order.
    pub fn iter(&self) -> impl Iterator<Item = &SlotSnapshot> {
        self.snapshots.iter()
    }

    /// Number of slots in the grid.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the grid has no slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Retrieves the snapshot of a single slot.
    #[must_use]
    pub fn get(&self, slot: SlotId) -> Option<&SlotSnapshot> {
        self.snapshots.get(slot.index())
    }

    /// Identifiers of the slots bound to the provided prize, in grid order.
    #[must_use]
    pub fn slots_with_prize(&self, prize: PrizeAmount) -> Vec<SlotId> {
        self.snapshots
            .iter()
            .filter(|snapshot| snapshot.prize == Some(prize))
            .map(|snapshot| snapshot.id)
            .collect()
    }

    /// Number of slots currently showing a transient marker.
    #[must_use]
    pub fn transient_count(&self) -> usize {
        self.snapshots
            .iter()
            .filter(|snapshot| snapshot.state.is_transient())
            .count()
    }
}

/// Phases of the draw lifecycle driven by the session controller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Phase {
    /// No draw is running; the idle pattern plays.
    #[default]
    Idle,
    /// Decorative flourish shown before the reveal starts.
    PreDrawFlourish,
    /// The reveal sequencer is walking the grid.
    Revealing,
    /// Final celebratory pause before returning to idle.
    Settling,
}

impl Phase {
    /// Reports whether external controls are enabled while in this phase.
    #[must_use]
    pub const fn accepts_controls(self) -> bool {
        matches!(self, Self::Idle)
    }
}

/// Subject of a celebration effect.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CelebrationTarget {
    /// A single resolved outcome landing on a slot.
    Slot(SlotId),
    /// Completion of a participant's whole session.
    Session(ParticipantId),
}

/// Read-only snapshot of a draw session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Participant whose tickets are drawn.
    pub participant: ParticipantId,
    /// Outcomes revealed by the session, in order.
    pub outcomes: OutcomeList,
    /// Slot chosen for each outcome position.
    pub assignment: Vec<Option<SlotId>>,
    /// Number of outcomes resolved so far.
    pub cursor: usize,
    /// Winnings accumulated by the revealed outcomes.
    pub total_winnings: u64,
    /// Number of revealed outcomes per prize.
    pub per_prize_counts: BTreeMap<PrizeAmount, u32>,
    /// Phase the session was last observed in.
    pub phase: Phase,
    /// Whether the session finished and became immutable.
    pub completed: bool,
}

/// Participant and ticket count handed over by the selection surface.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    /// Participant chosen by the operator.
    pub participant: ParticipantId,
    /// Number of tickets the participant holds.
    pub ticket_count: u32,
}

/// Source of the pre-computed outcomes for each participant.
pub trait OutcomeSource {
    /// Returns the ordered outcomes of the participant, if the source knows them.
    fn outcome_list(&self, participant: &ParticipantId) -> Option<OutcomeList>;
}

/// Presentation hook invoked for every celebration request.
pub trait Celebration {
    /// Plays the celebration effect for the provided target.
    fn celebrate(&mut self, target: &CelebrationTarget);
}

/// Reasons a draw request is refused before any animation starts.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DrawError {
    /// No participant has been selected.
    #[error("no participant is selected")]
    NoSelection,
    /// The outcome source does not know the selected participant.
    #[error("no outcome data is available for participant {0}")]
    MissingOutcomeData(ParticipantId),
    /// The participant has no tickets to draw.
    #[error("participant {0} has no tickets to draw")]
    NoTickets(ParticipantId),
    /// The participant already completed a draw during this run.
    #[error("participant {0} has already been drawn")]
    AlreadyDrawn(ParticipantId),
    /// No slot carries the prize of an outcome.
    #[error("outcome {index} ({prize}) has no slot bearing that prize")]
    UnassignableOutcome {
        /// Position of the outcome inside the outcome list.
        index: usize,
        /// Prize that could not be placed.
        prize: PrizeAmount,
    },
    /// The grid has no slots.
    #[error("the slot grid is empty")]
    EmptyGrid,
}
