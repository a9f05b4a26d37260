// Copyright (c) 2026 the dnp3-outstation authors. Licensed under Apache License, Version 2.0.

//! The strand's pooled timer queue: a min-heap ordered by deadline, with
//! idempotent cancellation via a shared flag rather than queue surgery.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;

use crate::time::MonotonicTimestamp;

/// Identifies one scheduled timer for logging/debugging purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

static NEXT_TIMER_ID: AtomicU64 = AtomicU64::new(1);

fn next_timer_id() -> TimerId { TimerId(NEXT_TIMER_ID.fetch_add(1, AtomicOrdering::Relaxed)) }

/// A live reference to a scheduled timer, held by the code that scheduled
/// it. Cancellation is cooperative: the timer still occupies a heap slot
/// until its deadline, but its action will not run.
#[derive(Debug, Clone)]
pub struct TimerHandle {
    id: TimerId,
    cancelled: Arc<AtomicBool>,
}

impl TimerHandle {
    /// This timer's id.
    #[must_use]
    pub const fn id(&self) -> TimerId { self.id }

    /// Cancels the timer. Idempotent - calling this more than once, or
    /// after the timer has already fired, has no further effect (spec.md
    /// §3 "TimerHandle::cancel() is idempotent").
    pub fn cancel(&self) { self.cancelled.store(true, AtomicOrdering::Release); }

    /// Whether this timer has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool { self.cancelled.load(AtomicOrdering::Acquire) }
}

pub(super) struct TimerEntry {
    pub(super) deadline: MonotonicTimestamp,
    id: TimerId,
    cancelled: Arc<AtomicBool>,
    pub(super) action: Option<Box<dyn FnOnce() + Send>>,
}

impl PartialEq for TimerEntry {
    fn eq(&self, other: &Self) -> bool { self.deadline == other.deadline && self.id == other.id }
}
impl Eq for TimerEntry {}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Ord for TimerEntry {
    // Reversed so `BinaryHeap` (a max-heap) pops the *earliest* deadline first.
    fn cmp(&self, other: &Self) -> Ordering { other.deadline.as_millis().cmp(&self.deadline.as_millis()) }
}

/// Min-heap of pending timers, ordered by deadline.
#[derive(Default)]
pub(super) struct TimerQueue {
    heap: BinaryHeap<TimerEntry>,
}

impl TimerQueue {
    pub(super) fn new() -> Self { Self { heap: BinaryHeap::new() } }

    /// Schedules `action` to run at `deadline`, returning a handle the
    /// caller can use to cancel it.
    pub(super) fn schedule(&mut self, deadline: MonotonicTimestamp, action: Box<dyn FnOnce() + Send>) -> TimerHandle {
        let id = next_timer_id();
        let cancelled = Arc::new(AtomicBool::new(false));
        self.heap.push(TimerEntry { deadline, id, cancelled: Arc::clone(&cancelled), action: Some(action) });
        TimerHandle { id, cancelled }
    }

    /// The earliest pending deadline, if any timer is scheduled.
    pub(super) fn next_deadline(&self) -> Option<MonotonicTimestamp> { self.heap.peek().map(|entry| entry.deadline) }

    /// Pops and returns every timer whose deadline has elapsed as of `now`,
    /// already filtered to those that were not cancelled.
    pub(super) fn drain_due(&mut self, now: MonotonicTimestamp) -> Vec<Box<dyn FnOnce() + Send>> {
        let mut due = Vec::new();
        while let Some(entry) = self.heap.peek() {
            if !now.has_elapsed(entry.deadline) {
                break;
            }
            let mut entry = self.heap.pop().expect("peek just confirmed an entry exists");
            if !entry.cancelled.load(AtomicOrdering::Acquire) {
                if let Some(action) = entry.action.take() {
                    due.push(action);
                }
            }
        }
        due
    }
}
