// Copyright (c) 2026 the dnp3-outstation authors. Licensed under Apache License, Version 2.0.

//! WRITE request handling: clock synchronization (Group 50) and the
//! IIN1.7 "Need Time" clear (Group 80 Variation 1), per spec.md §4.8.
//!
//! Resolved open question (see DESIGN.md): clearing IIN2.7/restart is
//! exposed as an explicit `OutstationContext` method, not wired
//! automatically off this handler - a WRITE of Group 80 Variation 1 only
//! ever clears "Need Time" here, matching the narrow, well-defined use of
//! that object in `original_source`.

use crate::apdu::{ObjectHeaderCursor, ObjectRange};
use crate::collaborators::OutstationApplication;
use crate::error::FragmentError;
use crate::time::MonotonicTimestamp;

/// What a WRITE request asked this outstation to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriteOutcome {
    /// Whether a Group 80 Variation 1 index-7 write asked to clear
    /// IIN1.7 ("Need Time").
    pub clear_need_time: bool,
}

/// Processes a WRITE request's object headers.
///
/// # Errors
///
/// Propagates [`FragmentError`] from malformed object headers, or
/// [`FragmentError::OversizedEcho`] if a Group 50 object's payload is
/// shorter than the 6 bytes an absolute time requires.
pub fn handle_write(objects: &[u8], app: &mut dyn OutstationApplication) -> Result<WriteOutcome, FragmentError> {
    let mut outcome = WriteOutcome::default();
    let mut cursor = ObjectHeaderCursor::new(objects);

    while !cursor.is_empty() {
        let header = cursor.next_header()?;
        let count = header.range.len().unwrap_or(0) as usize;

        match (header.group, header.variation) {
            (50, 1) => {
                let payload_len = count * 6;
                if header.remainder.len() < payload_len || payload_len < 6 {
                    return Err(FragmentError::OversizedEcho { payload_len, remaining: header.remainder.len() });
                }
                let bytes = &header.remainder[..6];
                let millis = u64::from_le_bytes([
                    bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], 0, 0,
                ]);
                app.write_absolute_time(MonotonicTimestamp::from_millis(millis));
                cursor.advance(&header, payload_len)?;
            }
            (80, 1) => {
                if matches!(header.range, ObjectRange::StartStop { start, stop } if start <= 7 && stop >= 7) {
                    outcome.clear_need_time = true;
                }
                cursor.advance(&header, 0)?;
            }
            _ => {
                cursor.advance(&header, 0)?;
            }
        }
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeApp {
        last_time: Option<MonotonicTimestamp>,
    }
    impl OutstationApplication for FakeApp {
        fn cold_restart(&mut self) -> Option<crate::collaborators::RestartDelay> { None }
        fn warm_restart(&mut self) -> Option<crate::collaborators::RestartDelay> { None }
        fn write_absolute_time(&mut self, time: MonotonicTimestamp) { self.last_time = Some(time); }
    }

    #[test]
    fn group50_var1_forwards_absolute_time() {
        let mut app = FakeApp { last_time: None };
        let mut objects = vec![50u8, 1, 0x07, 1];
        objects.extend_from_slice(&12_345u64.to_le_bytes()[..6]);
        let outcome = handle_write(&objects, &mut app).unwrap();
        assert!(!outcome.clear_need_time);
        assert_eq!(app.last_time, Some(MonotonicTimestamp::from_millis(12_345)));
    }

    #[test]
    fn group80_var1_index7_clears_need_time() {
        let mut app = FakeApp { last_time: None };
        let objects = [80u8, 1, 0x00, 0, 7];
        let outcome = handle_write(&objects, &mut app).unwrap();
        assert!(outcome.clear_need_time);
    }

    #[test]
    fn group80_var1_without_index7_does_not_clear() {
        let mut app = FakeApp { last_time: None };
        let objects = [80u8, 1, 0x00, 0, 3];
        let outcome = handle_write(&objects, &mut app).unwrap();
        assert!(!outcome.clear_need_time);
    }
}
