// Copyright (c) 2026 the dnp3-outstation authors. Licensed under Apache License, Version 2.0.

//! ASSIGN_CLASS handling (spec.md §4.8): a stream of object headers where
//! a "class marker" header (group 60, variation 2/3/4) sets the class
//! applied to every static-object header that follows it, until the next
//! marker.

use crate::apdu::ObjectHeaderCursor;
use crate::collaborators::ClassAssigner;
use crate::error::FragmentError;
use crate::event::EventClass;

fn class_marker(group: u8, variation: u8) -> Option<EventClass> {
    match (group, variation) {
        (60, 2) => Some(EventClass::Class1),
        (60, 3) => Some(EventClass::Class2),
        (60, 4) => Some(EventClass::Class3),
        _ => None,
    }
}

/// Processes an ASSIGN_CLASS request's object headers.
///
/// # Errors
///
/// Propagates [`FragmentError`] from malformed object headers. Object
/// headers appearing before any class marker are ignored (nothing to
/// assign them to).
pub fn handle_assign_class(objects: &[u8], assigner: &mut dyn ClassAssigner) -> Result<(), FragmentError> {
    let mut cursor = ObjectHeaderCursor::new(objects);
    let mut current_class: Option<EventClass> = None;

    while !cursor.is_empty() {
        let header = cursor.next_header()?;
        if let Some(class) = class_marker(header.group, header.variation) {
            current_class = Some(class);
        } else if let Some(class) = current_class {
            assigner.assign_class(header.group, Some(header.variation), header.range, class);
        }
        cursor.advance(&header, 0)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apdu::ObjectRange;
    use crate::event::ClassField;

    struct FakeAssigner {
        calls: Vec<(u8, Option<u8>, ObjectRange, EventClass)>,
    }
    impl ClassAssigner for FakeAssigner {
        fn assign_class(&mut self, group: u8, variation: Option<u8>, range: ObjectRange, class: EventClass) {
            self.calls.push((group, variation, range, class));
        }
        fn configured_classes(&self) -> ClassField { ClassField::all() }
    }

    #[test]
    fn marker_applies_to_following_header() {
        let request = [60u8, 2, 0x06, 1, 1, 0x00, 0, 9];
        let mut assigner = FakeAssigner { calls: Vec::new() };
        handle_assign_class(&request, &mut assigner).unwrap();
        assert_eq!(assigner.calls.len(), 1);
        assert_eq!(assigner.calls[0].3, EventClass::Class1);
        assert_eq!(assigner.calls[0].0, 1);
    }

    #[test]
    fn header_before_any_marker_is_ignored() {
        let request = [1u8, 1, 0x00, 0, 9];
        let mut assigner = FakeAssigner { calls: Vec::new() };
        handle_assign_class(&request, &mut assigner).unwrap();
        assert!(assigner.calls.is_empty());
    }
}
