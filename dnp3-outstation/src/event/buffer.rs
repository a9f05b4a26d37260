// Copyright (c) 2026 the dnp3-outstation authors. Licensed under Apache License, Version 2.0.

//! The bounded SOE event buffer: update, class/type selection, write-out,
//! and per-type overflow eviction (spec.md §3-4 "Event Buffer").

use tracing::{debug, warn};

use crate::apdu::ResponseWriter;
use crate::event::arena::{Arena, ArenaIndex};
use crate::event::config::EventBufferConfig;
use crate::event::count::EventCount;
use crate::event::record::SoeRecord;
use crate::event::types::{ClassField, EventClass, EventType, EventValue};

/// A bounded, class-and-type indexed buffer of sequence-of-events records.
///
/// Backed by a single [`Arena`] shared across all event types: insertion
/// order across types is preserved (needed for overflow eviction to always
/// evict the globally oldest record of the overflowing type), while
/// per-type/per-class counts are tracked in parallel in [`EventCount`]
/// rather than recomputed by scanning the arena.
#[derive(Debug)]
pub struct EventBuffer {
    config: EventBufferConfig,
    records: Arena<SoeRecord>,
    total: EventCount,
    selected: EventCount,
    written: EventCount,
    /// Latches `true` the instant any type overflows and stays set until
    /// the next full write-out/confirm cycle clears it (IinBit::EventBufferOverflow
    /// "Event buffer overflow", spec.md §3).
    overflow_latched: bool,
}

impl EventBuffer {
    /// Builds an empty buffer with per-type capacities from `config`.
    #[must_use]
    pub fn new(config: EventBufferConfig) -> Self {
        let capacity = config.total_capacity() as usize;
        Self {
            config,
            records: Arena::with_capacity(capacity),
            total: EventCount::zero(),
            selected: EventCount::zero(),
            written: EventCount::zero(),
            overflow_latched: false,
        }
    }

    /// Total number of records currently buffered, across all types.
    #[must_use]
    pub fn len(&self) -> usize { self.records.len() }

    /// Whether the buffer holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.records.is_empty() }

    /// Whether IinBit::EventBufferOverflow should currently be asserted.
    #[must_use]
    pub const fn is_overflown(&self) -> bool { self.overflow_latched }

    /// Records a new event, evicting the oldest record of the same type if
    /// its per-type capacity is already reached (spec.md §4.2 "Update").
    ///
    /// Returns the index of the newly inserted record, or `None` if the
    /// type's configured capacity is zero (events of that type are
    /// dropped entirely, per spec.md §3 "Capacity 0 for a type disables
    /// buffering that type").
    pub fn update(&mut self, value: EventValue, index: u16, class: EventClass, ty: EventType) -> Option<ArenaIndex> {
        let max = self.config.max_for(ty);
        if max == 0 {
            debug!(?ty, index, "event type has zero capacity, dropping update");
            return None;
        }

        if self.total.num_of_type(ty) >= u32::from(max) {
            self.evict_oldest_of_type(ty);
        }

        let variation = self.config.default_variation_for(ty);
        let record = SoeRecord::new(value, index, class, ty, variation);
        let arena_index = self.records.push_back(record)?;
        self.total.increment(class, ty);
        Some(arena_index)
    }

    fn evict_oldest_of_type(&mut self, ty: EventType) {
        let mut cursor = self.records.head();
        while let Some(index) = cursor {
            let record = self.records.get(index).expect("arena head index must be occupied");
            if record.ty == ty {
                let class = record.class;
                let was_selected = record.is_selected();
                let was_written = record.written;
                self.records.remove(index);
                self.total.decrement_by(class, ty, 1);
                if was_selected {
                    self.selected.decrement_by(class, ty, 1);
                }
                if was_written {
                    self.written.decrement_by(class, ty, 1);
                }
                self.overflow_latched = true;
                warn!(?ty, evicted_index = index, "event buffer overflow, evicted oldest record of type");
                return;
            }
            cursor = self.records.next_of(index);
        }
    }

    /// Marks every currently-unselected record whose class is in `classes`
    /// as selected, in insertion order (spec.md §4.2 "Class/type
    /// selection").
    ///
    /// Returns the number of records newly selected.
    pub fn select_all_by_class(&mut self, classes: ClassField) -> usize {
        let mut count = 0usize;
        let mut cursor = self.records.head();
        while let Some(index) = cursor {
            let record = self.records.get_mut(index).expect("arena head index must be occupied");
            let next = self.records.next_of(index);
            if classes.contains(record.class) && !record.is_selected() {
                record.select_default();
                self.selected.increment(record.class, record.ty);
                count += 1;
            }
            cursor = next;
        }
        count
    }

    /// Marks up to `limit` unselected records of a single type as
    /// selected, oldest first. `limit == 0` means unbounded.
    pub fn select_by_type(&mut self, ty: EventType, limit: u32) -> usize {
        let mut count = 0usize;
        let mut cursor = self.records.head();
        while let Some(index) = cursor {
            if limit != 0 && count as u32 >= limit {
                break;
            }
            let record = self.records.get_mut(index).expect("arena head index must be occupied");
            let next = self.records.next_of(index);
            if record.ty == ty && !record.is_selected() {
                record.select_default();
                self.selected.increment(record.class, record.ty);
                count += 1;
            }
            cursor = next;
        }
        count
    }

    /// Which classes currently have at least one unwritten, unselected
    /// event pending - used to compute the response/unsolicited-trigger
    /// IIN1/2 class bits (spec.md §3 "Dynamic IIN").
    #[must_use]
    pub fn unwritten_class_field(&self) -> ClassField {
        let mut field = ClassField::none();
        for class in [EventClass::Class1, EventClass::Class2, EventClass::Class3] {
            let pending = self.total.num_of_class(class) - self.written.num_of_class(class);
            if pending > 0 {
                field.set(class);
            }
        }
        field
    }

    /// Whether any selected record has not yet been written out - drives
    /// the multi-fragment response loop (spec.md §4.2 "Multi-fragment").
    #[must_use]
    pub fn has_more_unwritten_events(&self) -> bool { self.selected.total() > self.written.total() }

    /// Writes as many selected-but-unwritten records as `writer` has room
    /// for, grouped into `(type, variation)` batches to minimize object
    /// headers, and marks each written record as such.
    ///
    /// Returns the number of records written this call.
    pub fn load(&mut self, writer: &mut dyn ResponseWriter) -> usize {
        let mut total_written = 0usize;

        loop {
            if writer.remaining() == 0 {
                break;
            }
            let Some(group_key) = self.next_unwritten_group_key() else { break };
            let (ty, variation) = group_key;

            let mut batch = Vec::new();
            let mut cursor = self.records.head();
            while let Some(index) = cursor {
                let record = self.records.get(index).expect("arena head index must be occupied");
                let next = self.records.next_of(index);
                if record.grouping_key() == Some(group_key) && !record.written {
                    batch.push((index, record.index, record.value));
                    if batch.len() >= writer.remaining().max(1) {
                        break;
                    }
                }
                cursor = next;
            }
            if batch.is_empty() {
                break;
            }

            let entries: Vec<(u16, EventValue)> = batch.iter().map(|(_, idx, value)| (*idx, *value)).collect();
            let accepted = writer.write_event_group(ty, variation, &entries);
            for &(arena_index, _, _) in batch.iter().take(accepted) {
                let record = self.records.get_mut(arena_index).expect("batch index must be occupied");
                record.written = true;
                self.written.increment(record.class, ty);
            }
            total_written += accepted;
            if accepted < entries.len() {
                break;
            }
        }

        total_written
    }

    fn next_unwritten_group_key(&self) -> Option<(EventType, crate::event::types::EventVariation)> {
        let mut cursor = self.records.head();
        while let Some(index) = cursor {
            let record = self.records.get(index).expect("arena head index must be occupied");
            if !record.written {
                if let Some(key) = record.grouping_key() {
                    return Some(key);
                }
            }
            cursor = self.records.next_of(index);
        }
        None
    }

    /// Clears `written` (but not `selected`) on every record - invoked once
    /// a response carrying them has been confirmed, permanently removing
    /// them (spec.md §4.2 "Confirm handling: remove written+confirmed
    /// events").
    pub fn remove_written(&mut self) {
        let mut cursor = self.records.head();
        let mut to_remove = Vec::new();
        while let Some(index) = cursor {
            let record = self.records.get(index).expect("arena head index must be occupied");
            cursor = self.records.next_of(index);
            if record.written {
                to_remove.push(index);
            }
        }
        for index in to_remove {
            let record = self.records.remove(index);
            self.total.decrement_by(record.class, record.ty, 1);
            self.selected.decrement_by(record.class, record.ty, 1);
            self.written.decrement_by(record.class, record.ty, 1);
        }
        if self.has_spare_capacity_for_every_type() {
            self.overflow_latched = false;
        }
    }

    /// Whether every type currently has at least one free slot under its
    /// configured capacity - the condition spec.md P6 requires before the
    /// overflow latch may clear (spec.md §4.2 "Overflow clearing": a
    /// confirmed removal alone is not enough if some type is still at its
    /// limit).
    #[must_use]
    fn has_spare_capacity_for_every_type(&self) -> bool {
        use strum::IntoEnumIterator;
        EventType::iter().all(|ty| {
            let max = self.config.max_for(ty);
            max == 0 || self.total.num_of_type(ty) < u32::from(max)
        })
    }

    /// Reverts selection (and write) state on every record without
    /// removing them - invoked when a response fails to be confirmed and
    /// must be retransmitted unselected, re-selected on the next pass
    /// (spec.md §4.2 "Confirm handling: on NACK/timeout, unselect").
    pub fn unselect(&mut self) {
        let mut cursor = self.records.head();
        while let Some(index) = cursor {
            let record = self.records.get_mut(index).expect("arena head index must be occupied");
            let next = self.records.next_of(index);
            record.unselect();
            cursor = next;
        }
        self.selected = EventCount::zero();
        self.written = EventCount::zero();
    }

    /// Clears the overflow latch, e.g. once a complete write-out/confirm
    /// cycle has drained the buffer back under capacity.
    pub fn clear_overflow_latch(&mut self) { self.overflow_latched = false; }
}
