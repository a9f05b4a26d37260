// Copyright (c) 2026 the dnp3-outstation authors. Licensed under Apache License, Version 2.0.

//! The executor: a single logical thread of control (a "strand") layered
//! over tokio's multi-threaded runtime, serializing posted work and fired
//! timers through one mailbox drained by one dedicated task.
//!
//! Grounded on the worker-thread-plus-mailbox shape of
//! `tui`'s `resilient_reactor_thread` module: a dedicated task owns all
//! mutable state (here, the [`TimerQueue`]) and every external interaction
//! goes through channels rather than shared locks, so callers never
//! observe partial mutation.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::error::ExecutorError;
use crate::executor::timer::{TimerHandle, TimerQueue};
use crate::time::MonotonicTimestamp;

type Job = Box<dyn FnOnce() + Send>;

enum Message {
    Post(Job),
    StartAfter { delay_ms: u64, action: Job, reply: oneshot::Sender<TimerHandle> },
    StartAt { at: MonotonicTimestamp, action: Job, reply: oneshot::Sender<TimerHandle> },
    Shutdown(oneshot::Sender<()>),
}

/// A cloneable handle to a running strand; posting work never blocks the
/// caller and never runs the work on the caller's own task.
#[derive(Clone)]
pub struct Strand {
    sender: mpsc::UnboundedSender<Message>,
}

impl Strand {
    /// Spawns the strand's worker task on the current tokio runtime and
    /// returns a handle to it.
    #[must_use]
    pub fn spawn() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        tokio::spawn(run_worker(receiver));
        Self { sender }
    }

    /// Posts a closure to run on the strand, serialized with every other
    /// posted closure and fired timer. Never blocks.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutorError::ShuttingDown`] if the strand's worker has
    /// already exited.
    pub fn post<F>(&self, job: F) -> Result<(), ExecutorError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.sender.send(Message::Post(Box::new(job))).map_err(|_| ExecutorError::ShuttingDown)
    }

    /// Posts a closure and awaits its result, computed on the strand.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutorError::ShuttingDown`] if posting fails, or
    /// [`ExecutorError::WorkerGone`] if the strand exits before replying.
    pub async fn block_for<F, T>(&self, job: F) -> Result<T, ExecutorError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.post(move || {
            let _ = reply_tx.send(job());
        })?;
        reply_rx.await.map_err(|_| ExecutorError::WorkerGone)
    }

    /// Schedules `action` to run after `delay` on the strand.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutorError::ShuttingDown`]/[`ExecutorError::WorkerGone`]
    /// under the same conditions as [`Self::block_for`].
    pub async fn start_after<F>(&self, delay: Duration, action: F) -> Result<TimerHandle, ExecutorError>
    where
        F: FnOnce() + Send + 'static,
    {
        let (reply, reply_rx) = oneshot::channel();
        self.sender
            .send(Message::StartAfter { delay_ms: delay.as_millis() as u64, action: Box::new(action), reply })
            .map_err(|_| ExecutorError::ShuttingDown)?;
        reply_rx.await.map_err(|_| ExecutorError::WorkerGone)
    }

    /// Schedules `action` to run at the absolute strand-clock time `at`.
    ///
    /// # Errors
    ///
    /// See [`Self::start_after`].
    pub async fn start_at<F>(&self, at: MonotonicTimestamp, action: F) -> Result<TimerHandle, ExecutorError>
    where
        F: FnOnce() + Send + 'static,
    {
        let (reply, reply_rx) = oneshot::channel();
        self.sender
            .send(Message::StartAt { at, action: Box::new(action), reply })
            .map_err(|_| ExecutorError::ShuttingDown)?;
        reply_rx.await.map_err(|_| ExecutorError::WorkerGone)
    }

    /// Requests the strand shut down once its mailbox drains, and awaits
    /// confirmation that it has stopped.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutorError::WorkerGone`] if the worker had already
    /// exited (e.g. due to a panic) before this call.
    pub async fn initiate_shutdown(&self) -> Result<(), ExecutorError> {
        let (reply, reply_rx) = oneshot::channel();
        if self.sender.send(Message::Shutdown(reply)).is_err() {
            return Ok(()); // already gone: shutdown is trivially complete
        }
        reply_rx.await.map_err(|_| ExecutorError::WorkerGone)
    }
}

async fn run_worker(mut receiver: mpsc::UnboundedReceiver<Message>) {
    let mut timers = TimerQueue::new();
    let mut shutdown_reply: Option<oneshot::Sender<()>> = None;

    loop {
        let sleep_duration = timers.next_deadline().map(|deadline| {
            let now = MonotonicTimestamp::now();
            Duration::from_millis(deadline.duration_since(now))
        });

        tokio::select! {
            biased;

            maybe_msg = receiver.recv() => {
                match maybe_msg {
                    Some(Message::Post(job)) => job(),
                    Some(Message::StartAfter { delay_ms, action, reply }) => {
                        let deadline = MonotonicTimestamp::now().checked_add(delay_ms);
                        let handle = timers.schedule(deadline, action);
                        let _ = reply.send(handle);
                    }
                    Some(Message::StartAt { at, action, reply }) => {
                        let handle = timers.schedule(at, action);
                        let _ = reply.send(handle);
                    }
                    Some(Message::Shutdown(reply)) => {
                        shutdown_reply = Some(reply);
                    }
                    None => {
                        debug!("strand mailbox closed, worker exiting");
                        break;
                    }
                }
                if shutdown_reply.is_some() && timers.next_deadline().is_none() {
                    break;
                }
            }

            () = sleep_until(sleep_duration), if sleep_duration.is_some() => {
                let now = MonotonicTimestamp::now();
                for action in timers.drain_due(now) {
                    action();
                }
            }
        }
    }

    info!("strand worker shut down");
    if let Some(reply) = shutdown_reply {
        let _ = reply.send(());
    } else {
        warn!("strand worker exited without a pending shutdown request");
    }
}

async fn sleep_until(duration: Option<Duration>) {
    match duration {
        Some(d) => tokio::time::sleep(d).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn post_runs_the_closure() {
        let strand = Strand::spawn();
        let result = strand.block_for(|| 1 + 1).await.unwrap();
        assert_eq!(result, 2);
    }

    #[tokio::test]
    async fn start_after_fires_the_timer() {
        let strand = Strand::spawn();
        let (tx, rx) = oneshot::channel();
        strand.start_after(Duration::from_millis(10), move || { let _ = tx.send(()); }).await.unwrap();
        tokio::time::timeout(Duration::from_secs(1), rx).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn cancelled_timer_never_fires() {
        let strand = Strand::spawn();
        let (tx, mut rx) = oneshot::channel::<()>();
        let handle = strand.start_after(Duration::from_millis(20), move || { let _ = tx.send(()); }).await.unwrap();
        handle.cancel();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn initiate_shutdown_completes() {
        let strand = Strand::spawn();
        strand.initiate_shutdown().await.unwrap();
        assert!(matches!(strand.post(|| ()), Err(ExecutorError::ShuttingDown)));
    }
}
