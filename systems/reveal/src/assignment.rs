//! Random placement of outcomes onto slots bearing the matching prize.

use std::collections::BTreeSet;

use lucky_draw_core::{OutcomeList, PrizeAmount, SlotId, SlotView};
use rand::Rng;

/// Slot chosen for every outcome position of a draw.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Assignment {
    slots: Vec<Option<SlotId>>,
}

impl Assignment {
    /// Builds an assignment for the outcomes over the provided grid.
    ///
    /// Each outcome picks a random slot with its prize, preferring slots not yet
    /// used in this draw. Once every slot of a prize has been used the used set
    /// is cleared so placement can continue by reusing slots. Outcomes whose
    /// prize no slot carries stay unassigned.
    pub fn build<R: Rng + ?Sized>(outcomes: &OutcomeList, slots: &SlotView, rng: &mut R) -> Self {
        let mut used = BTreeSet::new();
        let mut assigned = Vec::with_capacity(outcomes.len());

        for prize in outcomes.as_slice() {
            let candidates = slots.slots_with_prize(*prize);
            let mut available: Vec<SlotId> = candidates
                .iter()
                .copied()
                .filter(|slot| !used.contains(slot))
                .collect();
            if available.is_empty() {
                used.clear();
                available = candidates;
            }

            let choice = if available.is_empty() {
                None
            } else {
                Some(available[rng.gen_range(0..available.len())])
            };
            if let Some(slot) = choice {
                let _ = used.insert(slot);
            }
            assigned.push(choice);
        }

        Self { slots: assigned }
    }

    /// Slot assigned to the outcome at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<SlotId> {
        self.slots.get(index).copied().flatten()
    }

    /// Number of outcome positions covered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Reports whether the assignment covers no outcome.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// First outcome that could not be placed, with its prize.
    #[must_use]
    pub fn first_unassigned(&self, outcomes: &OutcomeList) -> Option<(usize, PrizeAmount)> {
        self.slots
            .iter()
            .position(Option::is_none)
            .and_then(|index| outcomes.get(index).map(|prize| (index, prize)))
    }

    /// Per-position slots, `None` where an outcome could not be placed.
    #[must_use]
    pub fn as_slice(&self) -> &[Option<SlotId>] {
        &self.slots
    }
}
