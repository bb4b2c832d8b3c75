// libs/availability-cell/src/services/reconciler.rs
use std::collections::BTreeSet;

use tracing::debug;

use crate::models::{AvailabilityError, Slot, SlotOption};

/// The generated grid paired with the subset the hospital service reports as
/// still bookable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlotSelection {
    all: Vec<Slot>,
    selectable: BTreeSet<Slot>,
}

/// Mark every slot of `all_slots` selectable iff it appears in `bookable_slots`.
pub fn reconcile(all_slots: &[Slot], bookable_slots: &[Slot]) -> SlotSelection {
    let bookable: BTreeSet<&Slot> = bookable_slots.iter().collect();

    let selectable: BTreeSet<Slot> = all_slots
        .iter()
        .filter(|slot| bookable.contains(slot))
        .cloned()
        .collect();

    debug!(
        "Reconciled {} generated slots against {} bookable: {} selectable",
        all_slots.len(),
        bookable_slots.len(),
        selectable.len()
    );

    SlotSelection {
        all: all_slots.to_vec(),
        selectable,
    }
}

impl SlotSelection {
    pub fn all_slots(&self) -> &[Slot] {
        &self.all
    }

    pub fn selectable(&self) -> &BTreeSet<Slot> {
        &self.selectable
    }

    pub fn is_selectable(&self, slot: &Slot) -> bool {
        self.selectable.contains(slot)
    }

    pub fn options(&self) -> Vec<SlotOption> {
        self.all
            .iter()
            .map(|slot| SlotOption {
                time: slot.clone(),
                selectable: self.is_selectable(slot),
            })
            .collect()
    }

    /// Keep a previous choice only while it is still selectable.
    pub fn retain_selection(&self, chosen: Option<&Slot>) -> Option<Slot> {
        chosen.filter(|slot| self.is_selectable(slot)).cloned()
    }

    /// Validate a raw time picked by the user.
    pub fn validate_choice(&self, raw: &str) -> Result<Slot, AvailabilityError> {
        let slot = Slot::parse(raw).ok_or_else(|| AvailabilityError::SlotNotSelectable(raw.to_string()))?;

        if !self.is_selectable(&slot) {
            return Err(AvailabilityError::SlotNotSelectable(slot.to_string()));
        }

        Ok(slot)
    }
}
