// Copyright (c) 2026 the dnp3-outstation authors. Licensed under Apache License, Version 2.0.

//! The unsolicited-response confirm/retry state machine (spec.md §4.4).

use crate::apdu::AppSeqNum;
use crate::time::MonotonicTimestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    ConfirmWait { seq: AppSeqNum, expires_at: MonotonicTimestamp },
}

/// What the caller should do after [`UnsolicitedChannel::check_timeout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutOutcome {
    /// No pending confirm, or it has not yet expired.
    NotExpired,
    /// Expired: retransmit the same fragment (same SEQ) and re-arm the
    /// retry timer.
    Retry,
}

/// The unsolicited-channel confirm tracker, including the one-shot
/// "initial NULL response" handshake flag.
///
/// An open question in spec.md §9 asked whether a send failure should
/// rewind the sequence number before retrying. This implementation
/// deliberately does *not* rewind: [`Self::check_timeout`] reports `Retry`
/// without ever decrementing the sequence counter, so a retried fragment
/// keeps the SEQ it was first sent with (matching `original_source`'s
/// `OContext::OnUnsolTimerExpiration`, which resends the retained APDU
/// verbatim rather than re-running sequence allocation).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnsolicitedChannel {
    state: State,
    completed_null: bool,
}

impl UnsolicitedChannel {
    /// Starts idle, with the initial NULL handshake not yet completed.
    #[must_use]
    pub const fn new() -> Self { Self { state: State::Idle, completed_null: false } }

    /// Whether the initial unsolicited NULL response has been confirmed -
    /// until it has, no other unsolicited response may be sent (spec.md
    /// §4.4 "NULL handshake gate").
    #[must_use]
    pub const fn has_completed_null_handshake(&self) -> bool { self.completed_null }

    /// Whether a response is currently awaiting confirmation.
    #[must_use]
    pub const fn is_waiting_for_confirm(&self) -> bool { matches!(self.state, State::ConfirmWait { .. }) }

    /// Records that an unsolicited response was sent and is awaiting
    /// confirmation.
    pub fn on_response_sent(&mut self, seq: AppSeqNum, now: MonotonicTimestamp, timeout_ms: u64) {
        self.state = State::ConfirmWait { seq, expires_at: now.checked_add(timeout_ms) };
    }

    /// Processes an incoming CONFIRM; returns `true` on a match. The first
    /// matched confirm also completes the NULL handshake.
    pub fn on_confirm_received(&mut self, seq: AppSeqNum) -> bool {
        match self.state {
            State::ConfirmWait { seq: expected, .. } if expected == seq => {
                self.state = State::Idle;
                self.completed_null = true;
                true
            }
            _ => false,
        }
    }

    /// Checks the retry timer; on expiry, re-arms it for `retry_timeout_ms`
    /// from `now` without changing the pending SEQ.
    pub fn check_timeout(&mut self, now: MonotonicTimestamp, retry_timeout_ms: u64) -> TimeoutOutcome {
        match self.state {
            State::ConfirmWait { seq, expires_at } if now.has_elapsed(expires_at) => {
                self.state = State::ConfirmWait { seq, expires_at: now.checked_add(retry_timeout_ms) };
                TimeoutOutcome::Retry
            }
            _ => TimeoutOutcome::NotExpired,
        }
    }
}

impl Default for UnsolicitedChannel {
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_handshake_completes_on_first_matching_confirm() {
        let mut channel = UnsolicitedChannel::new();
        assert!(!channel.has_completed_null_handshake());
        channel.on_response_sent(AppSeqNum::new(0), MonotonicTimestamp::from_millis(0), 1_000);
        assert!(channel.on_confirm_received(AppSeqNum::new(0)));
        assert!(channel.has_completed_null_handshake());
    }

    #[test]
    fn timeout_retries_without_changing_seq() {
        let mut channel = UnsolicitedChannel::new();
        channel.on_response_sent(AppSeqNum::new(5), MonotonicTimestamp::from_millis(0), 1_000);
        let outcome = channel.check_timeout(MonotonicTimestamp::from_millis(1_000), 500);
        assert_eq!(outcome, TimeoutOutcome::Retry);
        assert!(channel.is_waiting_for_confirm());
        match channel.state {
            State::ConfirmWait { seq, .. } => assert_eq!(seq, AppSeqNum::new(5)),
            State::Idle => panic!("expected ConfirmWait"),
        }
    }

    #[test]
    fn no_timeout_before_expiry() {
        let mut channel = UnsolicitedChannel::new();
        channel.on_response_sent(AppSeqNum::new(0), MonotonicTimestamp::from_millis(0), 1_000);
        assert_eq!(channel.check_timeout(MonotonicTimestamp::from_millis(500), 500), TimeoutOutcome::NotExpired);
    }
}
