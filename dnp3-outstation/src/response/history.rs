// Copyright (c) 2026 the dnp3-outstation authors. Licensed under Apache License, Version 2.0.

//! Retains the last processed request/response pair so an identical
//! repeated request can be answered without re-executing it (spec.md §4.6
//! "Repeat request rule").

use rustc_hash::FxHasher;
use std::hash::{Hash, Hasher};

/// Fingerprint of a request fragment, cheap to compare across retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RequestFingerprint(u64);

impl RequestFingerprint {
    fn of(fragment: &[u8]) -> Self {
        let mut hasher = FxHasher::default();
        fragment.hash(&mut hasher);
        Self(hasher.finish())
    }
}

/// The outstation's memory of the most recently fully-processed request.
///
/// Grounded on `OContext::mLastValidRequest`/`mLastResponse` in
/// `original_source/cpp/libs/src/opendnp3/outstation/OutstationContext.cpp`:
/// a non-FIR/FIN or repeated FIR/FIN/!CON request with an unchanged
/// sequence number and identical object bytes is answered by retransmitting
/// the retained response rather than re-running handlers (side-effect-free
/// retries across an unreliable link).
#[derive(Debug, Default)]
pub struct ResponseHistory {
    last_request: Option<RequestFingerprint>,
    last_response: Option<Vec<u8>>,
}

impl ResponseHistory {
    /// Builds an empty history (no prior request recorded).
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Whether `fragment` is byte-identical to the last request recorded.
    #[must_use]
    pub fn is_repeat(&self, fragment: &[u8]) -> bool {
        self.last_request == Some(RequestFingerprint::of(fragment))
    }

    /// The retained response bytes, if any, to resend for a repeat.
    #[must_use]
    pub fn last_response(&self) -> Option<&[u8]> { self.last_response.as_deref() }

    /// Records a freshly-processed request/response pair, replacing
    /// whatever was previously retained.
    pub fn record(&mut self, request: &[u8], response: Vec<u8>) {
        self.last_request = Some(RequestFingerprint::of(request));
        self.last_response = Some(response);
    }

    /// Drops any retained history - called when the link transitions down,
    /// since a repeat detected across a reconnect would be meaningless
    /// (spec.md §4.6 edge case).
    pub fn clear(&mut self) {
        self.last_request = None;
        self.last_response = None;
    }
}
