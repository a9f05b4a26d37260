// Copyright (c) 2026 the dnp3-outstation authors. Licensed under Apache License, Version 2.0.

//! The SELECT/OPERATE handshake's pending-selection table (spec.md §4.7).

use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

use crate::apdu::AppSeqNum;
use crate::time::MonotonicTimestamp;

/// A pending SELECT, recorded so a following OPERATE can be validated
/// against it.
///
/// Grounded on `OContext::HandleSelect`/`HandleOperate` in
/// `original_source/cpp/libs/src/opendnp3/outstation/OutstationContext.cpp`:
/// OPERATE must (a) arrive with `seq == select.seq + 1`, (b) arrive before
/// `select_timeout` elapses, and (c) carry object bytes identical to the
/// SELECT - enforced here via a fingerprint rather than keeping the full
/// object bytes around.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SelectRecord {
    request_fingerprint: u64,
    seq: AppSeqNum,
    expires_at: MonotonicTimestamp,
}

/// Holds at most one pending SELECT at a time - a new SELECT always
/// replaces whatever was pending, matching the original's single-slot
/// behavior (a second SELECT implicitly cancels the first).
#[derive(Debug, Default)]
pub struct SelectTable {
    pending: Option<SelectRecord>,
}

impl SelectTable {
    /// An empty table.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Records a SELECT accepted at `seq`, valid until `now + timeout`.
    pub fn record(&mut self, object_bytes: &[u8], seq: AppSeqNum, now: MonotonicTimestamp, timeout_ms: u64) {
        self.pending = Some(SelectRecord {
            request_fingerprint: fingerprint(object_bytes),
            seq,
            expires_at: now.checked_add(timeout_ms),
        });
    }

    /// Validates an OPERATE against the pending SELECT: matching object
    /// bytes, `seq == select.seq + 1`, and not yet expired. Clears the
    /// table regardless of outcome - an OPERATE (successful or not)
    /// consumes the selection (spec.md §4.7 "OPERATE always clears the
    /// select table").
    #[must_use]
    pub fn validate_and_clear(&mut self, object_bytes: &[u8], seq: AppSeqNum, now: MonotonicTimestamp) -> bool {
        let record = self.pending.take();
        match record {
            Some(record) => {
                record.request_fingerprint == fingerprint(object_bytes)
                    && seq.is_successor_of(record.seq)
                    && !now.has_elapsed(record.expires_at)
            }
            None => false,
        }
    }

    /// Whether a SELECT is currently pending.
    #[must_use]
    pub fn has_pending(&self) -> bool { self.pending.is_some() }
}

fn fingerprint(bytes: &[u8]) -> u64 {
    let mut hasher = FxHasher::default();
    bytes.hash(&mut hasher);
    hasher.finish()
}
