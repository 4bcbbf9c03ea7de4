//! Draw session ledger: the single active session plus the per-participant archive.

use std::collections::BTreeMap;

use lucky_draw_core::{OutcomeList, ParticipantId, Phase, PrizeAmount, SessionSnapshot, SlotId};

/// Mutable record of one participant's draw.
#[derive(Clone, Debug)]
pub(crate) struct DrawSession {
    participant: ParticipantId,
    outcomes: OutcomeList,
    assignment: Vec<Option<SlotId>>,
    cursor: usize,
    total_winnings: u64,
    per_prize_counts: BTreeMap<PrizeAmount, u32>,
    pub(crate) phase: Phase,
    completed: bool,
}

impl DrawSession {
    pub(crate) fn new(
        participant: ParticipantId,
        outcomes: OutcomeList,
        mut assignment: Vec<Option<SlotId>>,
    ) -> Self {
        assignment.resize(outcomes.len(), None);
        Self {
            participant,
            outcomes,
            assignment,
            cursor: 0,
            total_winnings: 0,
            per_prize_counts: BTreeMap::new(),
            phase: Phase::PreDrawFlourish,
            completed: false,
        }
    }

    pub(crate) fn participant(&self) -> &ParticipantId {
        &self.participant
    }

    pub(crate) const fn cursor(&self) -> usize {
        self.cursor
    }

    pub(crate) fn tickets(&self) -> usize {
        self.outcomes.len()
    }

    pub(crate) const fn total_winnings(&self) -> u64 {
        self.total_winnings
    }

    pub(crate) const fn is_completed(&self) -> bool {
        self.completed
    }

    /// Prize of the next outcome to resolve, if any remain.
    pub(crate) fn pending_prize(&self) -> Option<PrizeAmount> {
        self.outcomes.get(self.cursor)
    }

    /// Records a revealed outcome and returns the prize it carried.
    pub(crate) fn record_reveal(&mut self) -> Option<PrizeAmount> {
        let prize = self.pending_prize()?;
        self.cursor += 1;
        self.total_winnings = self.total_winnings.saturating_add(u64::from(prize.value()));
        *self.per_prize_counts.entry(prize).or_insert(0) += 1;
        Some(prize)
    }

    /// Advances past an outcome without crediting it and returns its prize.
    pub(crate) fn record_skip(&mut self) -> Option<PrizeAmount> {
        let prize = self.pending_prize()?;
        self.cursor += 1;
        Some(prize)
    }

    pub(crate) fn complete(&mut self) {
        self.completed = true;
    }

    pub(crate) fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            participant: self.participant.clone(),
            outcomes: self.outcomes.clone(),
            assignment: self.assignment.clone(),
            cursor: self.cursor,
            total_winnings: self.total_winnings,
            per_prize_counts: self.per_prize_counts.clone(),
            phase: self.phase,
            completed: self.completed,
        }
    }
}

/// Stores every session opened during the run, keyed by participant.
#[derive(Debug, Default)]
pub(crate) struct SessionLedger {
    entries: BTreeMap<ParticipantId, DrawSession>,
    active: Option<ParticipantId>,
}

impl SessionLedger {
    /// Session currently displayed, whether or not it finished.
    pub(crate) fn active(&self) -> Option<&DrawSession> {
        self.active.as_ref().and_then(|id| self.entries.get(id))
    }

    /// Session currently being revealed; `None` once it completed.
    pub(crate) fn in_progress_mut(&mut self) -> Option<&mut DrawSession> {
        let id = self.active.as_ref()?;
        self.entries
            .get_mut(id)
            .filter(|session| !session.is_completed())
    }

    pub(crate) fn is_busy(&self) -> bool {
        self.active().is_some_and(|session| !session.is_completed())
    }

    /// Opens a session, replacing any archived session of the same participant.
    pub(crate) fn open(&mut self, session: DrawSession) {
        let participant = session.participant().clone();
        let _ = self.entries.insert(participant.clone(), session);
        self.active = Some(participant);
    }

    /// Removes the active session if it never completed and returns it.
    pub(crate) fn abandon(&mut self) -> Option<DrawSession> {
        let participant = self.active.take()?;
        if self.entries.get(&participant)?.is_completed() {
            self.active = Some(participant);
            return None;
        }
        self.entries.remove(&participant)
    }

    /// Stops displaying the active session; completed sessions stay archived.
    pub(crate) fn dismiss(&mut self) {
        self.active = None;
    }

    pub(crate) fn completed(&self, participant: &ParticipantId) -> Option<&DrawSession> {
        self.entries
            .get(participant)
            .filter(|session| session.is_completed())
    }
}
