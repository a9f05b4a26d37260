// Copyright (c) 2026 the dnp3-outstation authors. Licensed under Apache License, Version 2.0.

//! ENABLE_UNSOLICITED/DISABLE_UNSOLICITED handling (spec.md §4.4, §4.8):
//! decodes which classes a request names via "class N" object headers
//! (group 1/2/3, qualifier 0x06, no range).

use crate::apdu::ObjectHeaderCursor;
use crate::error::FragmentError;
use crate::event::{ClassField, EventClass};

/// Decodes the set of classes an ENABLE_UNSOLICITED/DISABLE_UNSOLICITED
/// request names.
///
/// # Errors
///
/// Propagates [`FragmentError`] from malformed object headers.
pub fn decode_requested_classes(objects: &[u8]) -> Result<ClassField, FragmentError> {
    let mut cursor = ObjectHeaderCursor::new(objects);
    let mut classes = ClassField::none();

    while !cursor.is_empty() {
        let header = cursor.next_header()?;
        match header.group {
            1 => classes.set(EventClass::Class1),
            2 => classes.set(EventClass::Class2),
            3 => classes.set(EventClass::Class3),
            _ => {}
        }
        cursor.advance(&header, 0)?;
    }

    Ok(classes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_multiple_class_headers() {
        let request = [1u8, 0, 0x06, 3, 0, 0x06];
        let classes = decode_requested_classes(&request).unwrap();
        assert!(classes.contains(EventClass::Class1));
        assert!(classes.contains(EventClass::Class3));
        assert!(!classes.contains(EventClass::Class2));
    }

    #[test]
    fn no_class_headers_yields_empty_set() {
        let request: [u8; 0] = [];
        assert_eq!(decode_requested_classes(&request).unwrap(), ClassField::none());
    }
}
