// Copyright (c) 2026 the dnp3-outstation authors. Licensed under Apache License, Version 2.0.

use super::types::{EventClass, EventType, EventValue, EventVariation};

/// One sequence-of-events record (spec.md §3: "SOE record").
///
/// Lives inside an [`super::arena::Arena`] slot; `selected`/`written` are
/// mutated in place as the record moves through selection and write-out
/// without ever being copied or reallocated.
#[derive(Debug, Clone, PartialEq)]
pub struct SoeRecord {
    /// Point value at the time of the update.
    pub value: EventValue,
    /// Point index within its type.
    pub index: u16,
    /// Reporting class this event was recorded under.
    pub class: EventClass,
    /// Point type - also the tag that groups this record during write-out.
    pub ty: EventType,
    /// Variation to use if no read request overrides it.
    pub default_variation: EventVariation,
    /// Variation this record was selected with, if selected.
    pub selected_variation: Option<EventVariation>,
    /// Set once this record has been emitted in a response that has not
    /// yet been confirmed.
    pub written: bool,
}

impl SoeRecord {
    /// Builds a freshly-inserted record: unselected, unwritten.
    #[must_use]
    pub const fn new(
        value: EventValue,
        index: u16,
        class: EventClass,
        ty: EventType,
        default_variation: EventVariation,
    ) -> Self {
        Self { value, index, class, ty, default_variation, selected_variation: None, written: false }
    }

    /// Whether this record has been marked selected (for the current
    /// response cycle).
    #[must_use]
    pub const fn is_selected(&self) -> bool { self.selected_variation.is_some() }

    /// Marks the record selected with its default variation.
    pub fn select_default(&mut self) { self.selected_variation = Some(self.default_variation); }

    /// Marks the record selected with an explicit variation.
    pub fn select_with(&mut self, variation: EventVariation) { self.selected_variation = Some(variation); }

    /// Clears both selection and write state - used by `unselect()`
    /// (spec.md §4.2 "Confirm handling").
    pub fn unselect(&mut self) {
        self.selected_variation = None;
        self.written = false;
    }

    /// The `(type, variation)` grouping key write-out uses to batch records
    /// into one object header (spec.md §4.2 "Write-out").
    #[must_use]
    pub fn grouping_key(&self) -> Option<(EventType, EventVariation)> {
        self.selected_variation.map(|var| (self.ty, var))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SoeRecord {
        SoeRecord::new(
            EventValue::Binary { flags: 1 },
            5,
            EventClass::Class1,
            EventType::Binary,
            EventVariation(2),
        )
    }

    #[test]
    fn new_record_is_unselected_and_unwritten() {
        let record = sample();
        assert!(!record.is_selected());
        assert!(!record.written);
        assert_eq!(record.grouping_key(), None);
    }

    #[test]
    fn select_default_uses_configured_variation() {
        let mut record = sample();
        record.select_default();
        assert_eq!(record.selected_variation, Some(EventVariation(2)));
        assert_eq!(record.grouping_key(), Some((EventType::Binary, EventVariation(2))));
    }

    #[test]
    fn unselect_clears_both_flags() {
        let mut record = sample();
        record.select_default();
        record.written = true;
        record.unselect();
        assert!(!record.is_selected());
        assert!(!record.written);
    }
}
