// Copyright (c) 2026 the dnp3-outstation authors. Licensed under Apache License, Version 2.0.

use super::types::{ClassField, EventClass, EventType};

/// A two-dimensional `(class, type)` counter. Three instances live in
/// [`super::buffer::EventBuffer`]: `total`, `selected`, `written` (spec.md
/// §3). Kept as a flat `3 x 7` array rather than a `HashMap` - both
/// dimensions are small closed enums, so direct indexing is both simpler
/// and faster than hashing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventCount {
    counts: [[u32; EventType::COUNT]; 3],
}

impl EventCount {
    /// All-zero counter.
    #[must_use]
    pub const fn zero() -> Self { Self { counts: [[0; EventType::COUNT]; 3] } }

    /// Increments the `(class, type)` cell by one.
    pub fn increment(&mut self, class: EventClass, ty: EventType) {
        self.counts[class.index()][ty.index()] += 1;
    }

    /// Decrements the `(class, type)` cell by `amount`, saturating at zero.
    pub fn decrement_by(&mut self, class: EventClass, ty: EventType, amount: u32) {
        let cell = &mut self.counts[class.index()][ty.index()];
        *cell = cell.saturating_sub(amount);
    }

    /// Value of one `(class, type)` cell.
    #[must_use]
    pub const fn get(&self, class: EventClass, ty: EventType) -> u32 { self.counts[class.index()][ty.index()] }

    /// Sum across all three classes for one type (`NumOfType` in the
    /// original).
    #[must_use]
    pub fn num_of_type(&self, ty: EventType) -> u32 {
        (0..3).map(|class_idx| self.counts[class_idx][ty.index()]).sum()
    }

    /// Sum across all seven types for one class (`NumOfClass` in the
    /// original).
    #[must_use]
    pub fn num_of_class(&self, class: EventClass) -> u32 { self.counts[class.index()].iter().sum() }

    /// Sum over every cell.
    #[must_use]
    pub fn total(&self) -> u32 { self.counts.iter().flatten().sum() }

    /// The set of classes with at least one event present in this counter.
    #[must_use]
    pub fn nonzero_class_field(&self) -> ClassField {
        use strum::IntoEnumIterator;
        EventClass::iter().filter(|&c| self.num_of_class(c) > 0).collect()
    }
}

impl Default for EventCount {
    fn default() -> Self { Self::zero() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increment_and_totals() {
        let mut count = EventCount::zero();
        count.increment(EventClass::Class1, EventType::Binary);
        count.increment(EventClass::Class1, EventType::Binary);
        count.increment(EventClass::Class2, EventType::Analog);

        assert_eq!(count.get(EventClass::Class1, EventType::Binary), 2);
        assert_eq!(count.num_of_type(EventType::Binary), 2);
        assert_eq!(count.num_of_class(EventClass::Class1), 2);
        assert_eq!(count.total(), 3);
    }

    #[test]
    fn decrement_saturates_at_zero() {
        let mut count = EventCount::zero();
        count.increment(EventClass::Class1, EventType::Binary);
        count.decrement_by(EventClass::Class1, EventType::Binary, 5);
        assert_eq!(count.get(EventClass::Class1, EventType::Binary), 0);
    }

    #[test]
    fn nonzero_class_field_reflects_populated_classes() {
        let mut count = EventCount::zero();
        count.increment(EventClass::Class2, EventType::Counter);
        let field = count.nonzero_class_field();
        assert!(field.contains(EventClass::Class2));
        assert!(!field.contains(EventClass::Class1));
    }
}
