// Copyright (c) 2026 the dnp3-outstation authors. Licensed under Apache License, Version 2.0.

//! Closed variant sets for event classes and event/static point types.
//!
//! Per spec.md Design Notes, the seven point types are *not* seven
//! template/generic instantiations (as in the C++ original) but a single
//! tagged enum - [`EventType`] - carried alongside a tagged value union -
//! [`EventValue`] - in one generic [`super::record::SoeRecord`].

use serde::{Deserialize, Serialize};
use strum_macros::{EnumCount, EnumIter};

/// DNP3 event reporting class. Static (non-event) data has no class of its
/// own in this model; only events are tagged with one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum EventClass {
    /// Class 1 - typically highest priority operator-visible events.
    Class1,
    /// Class 2.
    Class2,
    /// Class 3.
    Class3,
}

impl EventClass {
    /// Index into a 3-element per-class array.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Class1 => 0,
            Self::Class2 => 1,
            Self::Class3 => 2,
        }
    }
}

/// Bitset of [`EventClass`] values, used for `unsolClassMask`,
/// `UnwrittenClassField`, and READ-request class selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassField(u8);

impl ClassField {
    /// The empty set.
    #[must_use]
    pub const fn none() -> Self { Self(0) }

    /// The set containing all three classes.
    #[must_use]
    pub const fn all() -> Self { Self(0b111) }

    /// The set containing just `class`.
    #[must_use]
    pub const fn of(class: EventClass) -> Self { Self(1 << class.index()) }

    /// Unions `class` into the set.
    pub fn set(&mut self, class: EventClass) { self.0 |= 1 << class.index(); }

    /// Removes every class present in `other` from `self`.
    pub fn clear(&mut self, other: Self) { self.0 &= !other.0; }

    /// Whether `class` is a member.
    #[must_use]
    pub const fn contains(self, class: EventClass) -> bool { (self.0 & (1 << class.index())) != 0 }

    /// Whether `self` and `other` share at least one class.
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool { (self.0 & other.0) != 0 }

    /// Whether the set has no classes.
    #[must_use]
    pub const fn is_empty(self) -> bool { self.0 == 0 }
}

impl std::ops::BitOr for ClassField {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self { Self(self.0 | rhs.0) }
}

impl From<EventClass> for ClassField {
    fn from(class: EventClass) -> Self { Self::of(class) }
}

impl FromIterator<EventClass> for ClassField {
    fn from_iter<I: IntoIterator<Item = EventClass>>(iter: I) -> Self {
        let mut field = Self::none();
        for class in iter {
            field.set(class);
        }
        field
    }
}

/// The seven point types this buffer understands, each with its own
/// per-type capacity in [`super::config::EventBufferConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumCount)]
pub enum EventType {
    /// Group 2 - Binary Input Event.
    Binary,
    /// Group 4 - Double-bit Binary Input Event.
    DoubleBitBinary,
    /// Group 32 - Analog Input Event.
    Analog,
    /// Group 22 - Counter Event.
    Counter,
    /// Group 23 - Frozen Counter Event.
    FrozenCounter,
    /// Group 11 - Binary Output Event.
    BinaryOutputStatus,
    /// Group 42 - Analog Output Event.
    AnalogOutputStatus,
}

impl EventType {
    /// Index into a 7-element per-type array, matching declaration order.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Binary => 0,
            Self::DoubleBitBinary => 1,
            Self::Analog => 2,
            Self::Counter => 3,
            Self::FrozenCounter => 4,
            Self::BinaryOutputStatus => 5,
            Self::AnalogOutputStatus => 6,
        }
    }

    /// Number of distinct event types.
    pub const COUNT: usize = 7;

    /// The DNP3 object group number this event type's default variation
    /// belongs to.
    #[must_use]
    pub const fn default_group(self) -> u8 {
        match self {
            Self::Binary => 2,
            Self::DoubleBitBinary => 4,
            Self::Analog => 32,
            Self::Counter => 22,
            Self::FrozenCounter => 23,
            Self::BinaryOutputStatus => 11,
            Self::AnalogOutputStatus => 42,
        }
    }

    /// The event type a READ request addresses by naming this object group
    /// directly (as opposed to a "class N" grouping request), or `None` if
    /// `group` is not one of the seven event object groups.
    #[must_use]
    pub const fn from_group(group: u8) -> Option<Self> {
        match group {
            2 => Some(Self::Binary),
            4 => Some(Self::DoubleBitBinary),
            32 => Some(Self::Analog),
            22 => Some(Self::Counter),
            23 => Some(Self::FrozenCounter),
            11 => Some(Self::BinaryOutputStatus),
            42 => Some(Self::AnalogOutputStatus),
            _ => None,
        }
    }
}

/// The value carried by one SOE record, tagged by [`EventType`].
///
/// A single numeric payload plus an 8-bit DNP3 quality/flags byte covers
/// every one of the seven types at the precision the wire format actually
/// uses; analog values widen to `f64` so both 32- and 64-bit analog
/// variations share one representation until write-out picks the variation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventValue {
    /// Binary / double-bit-binary / binary-output-status flags byte.
    Binary {
        /// DNP3 flags octet (online, restart, chatter filter, state, ...).
        flags: u8,
    },
    /// Analog / analog-output-status numeric value.
    Analog {
        /// Flags octet.
        flags: u8,
        /// Value widened to `f64`; narrowed back to the wire variation's
        /// width at write-out time.
        value: f64,
    },
    /// Counter / frozen-counter numeric value.
    Counter {
        /// Flags octet.
        flags: u8,
        /// 32-bit counter value.
        value: u32,
    },
}

impl EventValue {
    /// The type tag this value must be paired with.
    #[must_use]
    pub const fn matches(self, ty: EventType) -> bool {
        matches!(
            (self, ty),
            (Self::Binary { .. }, EventType::Binary | EventType::DoubleBitBinary | EventType::BinaryOutputStatus)
                | (Self::Analog { .. }, EventType::Analog | EventType::AnalogOutputStatus)
                | (Self::Counter { .. }, EventType::Counter | EventType::FrozenCounter)
        )
    }
}

/// Default and selectable wire variation for one event type, decoded from
/// a READ request's `(group, variation)` object header, or left as the
/// configured default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventVariation(pub u8);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_field_union_and_intersect() {
        let mut field = ClassField::of(EventClass::Class1);
        field = field | ClassField::of(EventClass::Class3);
        assert!(field.contains(EventClass::Class1));
        assert!(!field.contains(EventClass::Class2));
        assert!(field.contains(EventClass::Class3));
        assert!(field.intersects(ClassField::all()));
        assert!(!field.intersects(ClassField::of(EventClass::Class2)));
    }

    #[test]
    fn class_field_clear_removes_only_named_classes() {
        let mut field = ClassField::all();
        field.clear(ClassField::of(EventClass::Class2));
        assert!(field.contains(EventClass::Class1));
        assert!(!field.contains(EventClass::Class2));
        assert!(field.contains(EventClass::Class3));
    }

    #[test]
    fn event_value_matches_expected_types() {
        let binary = EventValue::Binary { flags: 0x01 };
        assert!(binary.matches(EventType::Binary));
        assert!(binary.matches(EventType::BinaryOutputStatus));
        assert!(!binary.matches(EventType::Analog));
    }
}
