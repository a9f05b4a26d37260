// Copyright (c) 2026 the dnp3-outstation authors. Licensed under Apache License, Version 2.0.

use serde::{Deserialize, Serialize};

use super::types::{EventType, EventVariation};

/// Per-type event buffer capacities. A capacity of `0` disables that type
/// entirely - [`super::buffer::EventBuffer::update`] drops events of a
/// disabled type silently (spec.md §4.2 step 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventBufferConfig {
    max: [u16; EventType::COUNT],
    default_variation: [EventVariation; EventType::COUNT],
}

impl EventBufferConfig {
    /// Builds a config with every type set to `0` (disabled) and each
    /// type's protocol-default variation (spec.md §3 "Point types").
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max: [0; EventType::COUNT],
            default_variation: [
                EventVariation(2), // Binary: group 2 var 2, with time
                EventVariation(2), // DoubleBitBinary: group 4 var 2
                EventVariation(5), // Analog: group 32 var 5
                EventVariation(1), // Counter: group 22 var 1
                EventVariation(1), // FrozenCounter: group 23 var 1
                EventVariation(2), // BinaryOutputStatus: group 11 var 2
                EventVariation(1), // AnalogOutputStatus: group 42 var 1
            ],
        }
    }

    /// Sets the capacity for one type, returning `self` for chaining.
    #[must_use]
    pub const fn with_max(mut self, ty: EventType, max: u16) -> Self {
        self.max[ty.index()] = max;
        self
    }

    /// Overrides the default reporting variation for one type, returning
    /// `self` for chaining.
    #[must_use]
    pub const fn with_default_variation(mut self, ty: EventType, variation: EventVariation) -> Self {
        self.default_variation[ty.index()] = variation;
        self
    }

    /// Capacity configured for `ty`.
    #[must_use]
    pub const fn max_for(&self, ty: EventType) -> u16 { self.max[ty.index()] }

    /// The variation newly-recorded events of `ty` are tagged with absent
    /// an explicit read-request override.
    #[must_use]
    pub const fn default_variation_for(&self, ty: EventType) -> EventVariation { self.default_variation[ty.index()] }

    /// Sum of every type's capacity - the arena must hold at least this
    /// many slots (spec.md §3, SOE record: "Capacity N is the sum over
    /// types of configured max counts").
    #[must_use]
    pub fn total_capacity(&self) -> usize { self.max.iter().map(|&m| m as usize).sum() }
}

impl Default for EventBufferConfig {
    fn default() -> Self { Self::none() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_capacity_sums_all_types() {
        let config = EventBufferConfig::none()
            .with_max(EventType::Binary, 10)
            .with_max(EventType::Analog, 20);
        assert_eq!(config.total_capacity(), 30);
        assert_eq!(config.max_for(EventType::Binary), 10);
        assert_eq!(config.max_for(EventType::Counter), 0);
    }
}
