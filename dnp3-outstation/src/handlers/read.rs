// Copyright (c) 2026 the dnp3-outstation authors. Licensed under Apache License, Version 2.0.

//! READ request handling: selects static points and/or event classes named
//! by the request's object headers (spec.md §4.1/§4.8).

use crate::apdu::{ObjectHeaderCursor, ObjectRange};
use crate::collaborators::StaticSelector;
use crate::error::FragmentError;
use crate::event::{ClassField, EventBuffer, EventClass, EventType};

/// Group numbers the master uses to request buffered events rather than
/// static data (spec.md §3 "Class read qualifiers").
const CLASS_GROUPS: [(u8, EventClass); 3] = [(1, EventClass::Class1), (2, EventClass::Class2), (3, EventClass::Class3)];

/// Processes a READ request's object headers: event-class groups (60.2-4,
/// conventionally addressed as group `1`/`2`/`3` "class N" objects) select
/// from `events` by class, a direct event object group not already claimed
/// by that convention (e.g. group 32 "Analog Input Event") selects from
/// `events` by type honoring a count-limited qualifier (spec.md §4.2
/// `selectCount(groupVariation, n)`), and everything else is forwarded to
/// the database's static selector.
///
/// # Errors
///
/// Propagates [`FragmentError`] from malformed object headers.
pub fn handle_read(objects: &[u8], database: &mut dyn StaticSelector, events: &mut EventBuffer) -> Result<(), FragmentError> {
    let mut cursor = ObjectHeaderCursor::new(objects);
    while !cursor.is_empty() {
        let header = cursor.next_header()?;

        if let Some((_, class)) = CLASS_GROUPS.iter().find(|(g, _)| *g == header.group) {
            events.select_all_by_class(ClassField::of(*class));
        } else if header.group == 60 && (2..=4).contains(&header.variation) {
            let class = match header.variation {
                2 => EventClass::Class1,
                3 => EventClass::Class2,
                _ => EventClass::Class3,
            };
            events.select_all_by_class(ClassField::of(class));
        } else if let Some(ty) = EventType::from_group(header.group) {
            let limit = match header.range {
                ObjectRange::Count { count } => u32::from(count),
                _ => 0,
            };
            events.select_by_type(ty, limit);
        } else {
            let variation = if header.qualifier_byte == 0x06 && header.variation == 0 {
                None
            } else {
                Some(header.variation)
            };
            database.select_range(header.group, variation, header.range);
        }

        cursor.advance(&header, 0)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventBufferConfig, EventType, EventValue};

    struct FakeSelector {
        calls: Vec<(u8, Option<u8>, ObjectRange)>,
    }
    impl StaticSelector for FakeSelector {
        fn select_range(&mut self, group: u8, variation: Option<u8>, range: ObjectRange) {
            self.calls.push((group, variation, range));
        }
        fn clear_selection(&mut self) { self.calls.clear(); }
    }

    #[test]
    fn class_group_selects_from_event_buffer() {
        let mut events = EventBuffer::new(EventBufferConfig::none().with_max(EventType::Binary, 4));
        events.update(EventValue::Binary { flags: 1 }, 0, EventClass::Class1, EventType::Binary);
        let mut database = FakeSelector { calls: Vec::new() };

        let request = [1u8, 0, 0x06];
        handle_read(&request, &mut database, &mut events).unwrap();

        assert!(database.calls.is_empty());
        assert!(events.has_more_unwritten_events());
    }

    #[test]
    fn static_group_forwards_to_database_selector() {
        let mut events = EventBuffer::new(EventBufferConfig::none());
        let mut database = FakeSelector { calls: Vec::new() };

        let request = [30u8, 1, 0x00, 0, 3];
        handle_read(&request, &mut database, &mut events).unwrap();

        assert_eq!(database.calls, vec![(30, Some(1), ObjectRange::StartStop { start: 0, stop: 3 })]);
    }

    #[test]
    fn direct_event_group_with_count_qualifier_selects_at_most_n_of_that_type() {
        let mut events = EventBuffer::new(EventBufferConfig::none().with_max(EventType::Analog, 4));
        for i in 0..3 {
            events.update(EventValue::Analog { flags: 0, value: f64::from(i) }, i as u16, EventClass::Class1, EventType::Analog);
        }
        let mut database = FakeSelector { calls: Vec::new() };

        // Group 32 (Analog Input Event), variation 1, qualifier 0x07 (1-byte count) = 2.
        let request = [32u8, 1, 0x07, 2];
        handle_read(&request, &mut database, &mut events).unwrap();

        assert!(database.calls.is_empty());
        let mut writer = writer_with_room(10);
        let written = events.load(&mut writer);
        assert_eq!(written, 2, "only the count-limited number of records should have been selected");
    }

    #[test]
    fn direct_event_group_with_all_objects_qualifier_selects_every_record_of_that_type() {
        let mut events = EventBuffer::new(EventBufferConfig::none().with_max(EventType::Analog, 4));
        for i in 0..3 {
            events.update(EventValue::Analog { flags: 0, value: f64::from(i) }, i as u16, EventClass::Class1, EventType::Analog);
        }
        let mut database = FakeSelector { calls: Vec::new() };

        let request = [32u8, 1, 0x06];
        handle_read(&request, &mut database, &mut events).unwrap();

        let mut writer = writer_with_room(10);
        let written = events.load(&mut writer);
        assert_eq!(written, 3);
    }

    fn writer_with_room(capacity: usize) -> impl crate::apdu::ResponseWriter {
        TestEventWriter { capacity, written: 0 }
    }

    struct TestEventWriter {
        capacity: usize,
        written: usize,
    }

    impl crate::apdu::ResponseWriter for TestEventWriter {
        fn remaining(&self) -> usize { self.capacity.saturating_sub(self.written) }

        fn write_event_group(&mut self, _ty: EventType, _variation: crate::event::EventVariation, entries: &[(u16, EventValue)]) -> usize {
            let take = entries.len().min(self.remaining());
            self.written += take;
            take
        }

        fn write_command_statuses(&mut self, _group: u8, _variation: u8, _statuses: &[(u16, crate::apdu::CommandStatus)]) -> usize {
            unimplemented!("not exercised by read handler tests")
        }

        fn write_scalar_object(&mut self, _group: u8, _variation: u8, _value_bytes: &[u8]) -> bool {
            unimplemented!("not exercised by read handler tests")
        }

        fn finish(&mut self, _header: crate::apdu::ApduHeader, _iin: crate::iin::IinField) -> Vec<u8> {
            unimplemented!("not exercised by read handler tests")
        }
    }
}
