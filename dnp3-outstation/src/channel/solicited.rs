// Copyright (c) 2026 the dnp3-outstation authors. Licensed under Apache License, Version 2.0.

//! The solicited-response confirm state machine (spec.md §4.3).
//!
//! Grounded on `OContext::HandleConfirm` / the solicited confirm-timer
//! logic in
//! `original_source/cpp/libs/src/opendnp3/outstation/OutstationContext.cpp`;
//! re-expressed as a tagged enum matched in place of the original's
//! polymorphic state-object dispatch (spec.md Design Notes).

use crate::apdu::AppSeqNum;
use crate::time::MonotonicTimestamp;

/// State of the solicited response/confirm cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// No response awaiting confirmation.
    Idle,
    /// A response with CON=1 was sent at `seq` and has not yet been
    /// confirmed or timed out.
    ConfirmWait { seq: AppSeqNum, expires_at: MonotonicTimestamp },
}

/// The solicited-channel confirm tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolicitedChannel {
    state: State,
}

impl SolicitedChannel {
    /// Starts idle.
    #[must_use]
    pub const fn new() -> Self { Self { state: State::Idle } }

    /// Whether a response is currently awaiting CONFIRM.
    #[must_use]
    pub const fn is_waiting_for_confirm(&self) -> bool { matches!(self.state, State::ConfirmWait { .. }) }

    /// Records that a response requiring confirmation was just sent.
    pub fn on_response_sent(&mut self, seq: AppSeqNum, now: MonotonicTimestamp, timeout_ms: u64) {
        self.state = State::ConfirmWait { seq, expires_at: now.checked_add(timeout_ms) };
    }

    /// Records that a response with CON=0 was sent - nothing to wait for.
    pub fn on_unconfirmed_response_sent(&mut self) { self.state = State::Idle; }

    /// Processes an incoming CONFIRM. Returns `true` if it matched the
    /// pending response's sequence number (success); `false` if it arrived
    /// with no pending confirm, or at the wrong sequence (ignored per
    /// spec.md §4.3, "a CONFIRM at the wrong SEQ is silently dropped").
    pub fn on_confirm_received(&mut self, seq: AppSeqNum) -> bool {
        match self.state {
            State::ConfirmWait { seq: expected, .. } if expected == seq => {
                self.state = State::Idle;
                true
            }
            _ => false,
        }
    }

    /// Checks whether the pending confirm has timed out as of `now`;
    /// transitions to `Idle` and returns `true` if so.
    pub fn check_timeout(&mut self, now: MonotonicTimestamp) -> bool {
        match self.state {
            State::ConfirmWait { expires_at, .. } if now.has_elapsed(expires_at) => {
                self.state = State::Idle;
                true
            }
            _ => false,
        }
    }
}

impl Default for SolicitedChannel {
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_confirm_clears_wait_state() {
        let mut channel = SolicitedChannel::new();
        channel.on_response_sent(AppSeqNum::new(3), MonotonicTimestamp::from_millis(0), 1_000);
        assert!(channel.is_waiting_for_confirm());
        assert!(channel.on_confirm_received(AppSeqNum::new(3)));
        assert!(!channel.is_waiting_for_confirm());
    }

    #[test]
    fn wrong_sequence_confirm_is_ignored() {
        let mut channel = SolicitedChannel::new();
        channel.on_response_sent(AppSeqNum::new(3), MonotonicTimestamp::from_millis(0), 1_000);
        assert!(!channel.on_confirm_received(AppSeqNum::new(4)));
        assert!(channel.is_waiting_for_confirm());
    }

    #[test]
    fn timeout_clears_wait_state() {
        let mut channel = SolicitedChannel::new();
        channel.on_response_sent(AppSeqNum::new(0), MonotonicTimestamp::from_millis(0), 1_000);
        assert!(!channel.check_timeout(MonotonicTimestamp::from_millis(500)));
        assert!(channel.check_timeout(MonotonicTimestamp::from_millis(1_000)));
        assert!(!channel.is_waiting_for_confirm());
    }

    #[test]
    fn unconfirmed_response_never_waits() {
        let mut channel = SolicitedChannel::new();
        channel.on_unconfirmed_response_sent();
        assert!(!channel.is_waiting_for_confirm());
    }
}
