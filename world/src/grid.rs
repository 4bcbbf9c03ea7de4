//! Slot grid storage and visual state.

use lucky_draw_core::{
    Marker, PrizeAmount, Resolution, SlotId, SlotSnapshot, SlotState, SlotView,
};

/// Transient marker currently painted on a slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Transient {
    /// Highlight marker applied by a pattern or walk.
    Marker(Marker),
    /// Outcome reveal in progress.
    Revealing,
}

/// Slot stored inside the world. Identity fields never change after construction.
#[derive(Clone, Debug)]
pub(crate) struct Slot {
    id: SlotId,
    display_name: String,
    prize: Option<PrizeAmount>,
    pub(crate) transient: Option<Transient>,
    pub(crate) resolution: Resolution,
}

impl Slot {
    pub(crate) fn display_name(&self) -> &str {
        &self.display_name
    }

    pub(crate) const fn prize(&self) -> Option<PrizeAmount> {
        self.prize
    }

    pub(crate) fn state(&self) -> SlotState {
        match (self.transient, self.resolution) {
            (Some(Transient::Marker(marker)), _) => SlotState::Highlighted(marker),
            (Some(Transient::Revealing), _) => SlotState::Revealing,
            (None, Resolution::Won) => SlotState::Won,
            (None, Resolution::Finalized) => SlotState::Finalized,
            (None, Resolution::Unresolved) => SlotState::Idle,
        }
    }

    fn snapshot(&self) -> SlotSnapshot {
        SlotSnapshot {
            id: self.id,
            display_name: self.display_name.clone(),
            prize: self.prize,
            state: self.state(),
            resolution: self.resolution,
        }
    }
}

/// Fixed, ordered collection of display slots.
#[derive(Clone, Debug)]
pub(crate) struct SlotGrid {
    slots: Vec<Slot>,
}

impl SlotGrid {
    pub(crate) fn new(specs: Vec<super::SlotSpec>) -> Self {
        let slots = specs
            .into_iter()
            .enumerate()
            .map(|(index, spec)| Slot {
                id: SlotId::new(u32::try_from(index).unwrap_or(u32::MAX)),
                display_name: spec.display_name,
                prize: spec.prize,
                transient: None,
                resolution: Resolution::Unresolved,
            })
            .collect();
        Self { slots }
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn get(&self, slot: SlotId) -> Option<&Slot> {
        self.slots.get(slot.index())
    }

    pub(crate) fn get_mut(&mut self, slot: SlotId) -> Option<&mut Slot> {
        self.slots.get_mut(slot.index())
    }

    pub(crate) fn clear_transient(&mut self) {
        for slot in &mut self.slots {
            slot.transient = None;
        }
    }

    pub(crate) fn clear_resolutions(&mut self) {
        for slot in &mut self.slots {
            slot.transient = None;
            slot.resolution = Resolution::Unresolved;
        }
    }

    pub(crate) fn slots_with_prize(&self, prize: PrizeAmount) -> Vec<SlotId> {
        self.slots
            .iter()
            .filter(|slot| slot.prize == Some(prize))
            .map(|slot| slot.id)
            .collect()
    }

    pub(crate) fn view(&self) -> SlotView {
        SlotView::from_snapshots(self.slots.iter().map(Slot::snapshot).collect())
    }
}
