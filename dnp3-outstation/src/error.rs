// Copyright (c) 2026 the dnp3-outstation authors. Licensed under Apache License, Version 2.0.

//! Error taxonomy (§7). Nothing in this crate unwinds across the strand -
//! protocol-level problems (malformed fragment, parse error, oversized
//! echo) are values the [`crate::context::OutstationContext`] folds into an
//! IIN bit or a dropped fragment, never a [`Result::Err`] surfaced to an
//! embedder. The two enums here cover the two classes of failure that *do*
//! need to be reported to a caller: a collaborator/wire-format problem
//! local to one request ([`FragmentError`]), and a failure of the executor
//! itself ([`ExecutorError`]).

use thiserror::Error;

/// A problem parsing or routing a single request fragment.
///
/// These never propagate as panics. The context matches on this enum to
/// decide whether to drop the fragment silently (with a `tracing::warn!`)
/// or fold it into a response IIN bit, per spec.md §7's error table.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FragmentError {
    /// Fragment shorter than the two-byte application request header.
    #[error("fragment too short to contain a request header ({len} bytes)")]
    HeaderTooShort {
        /// Number of bytes actually present.
        len: usize,
    },

    /// Request violated FIR=FIN=1, CON=0 (spec.md §3, §4.5 step 2).
    #[error("request fragment is not FIR/FIN/!CON")]
    NotFirFinNoCon,

    /// Object-header cursor ran past the end of the buffer while a handler
    /// was walking headers.
    #[error("object header truncated at offset {offset}")]
    ObjectHeaderTruncated {
        /// Byte offset where parsing stopped.
        offset: usize,
    },

    /// Qualifier code value with no defined meaning for the calling
    /// handler (e.g. a range qualifier on a command object header).
    #[error("unsupported qualifier code 0x{qualifier:02x} for group {group} variation {variation}")]
    UnsupportedQualifier {
        /// Raw qualifier byte.
        qualifier: u8,
        /// Object group.
        group: u8,
        /// Object variation.
        variation: u8,
    },

    /// Echoed payload would not fit in the remaining response buffer.
    #[error("echo payload of {payload_len} bytes exceeds {remaining} bytes remaining in response")]
    OversizedEcho {
        /// Size of the payload that needed to be echoed.
        payload_len: usize,
        /// Space left in the writer.
        remaining: usize,
    },

    /// A control request named a group/variation this crate does not
    /// recognize as a control point (only group 12 variation 1, and group
    /// 41 variations 1-4, are control objects).
    #[error("group {group} variation {variation} is not a recognized control object")]
    UnrecognizedControlObject {
        /// Object group.
        group: u8,
        /// Object variation.
        variation: u8,
    },

    /// A SELECT/OPERATE/DIRECT_OPERATE request named more control points
    /// than `max_controls_per_request` permits.
    #[error("request carries {count} control objects, exceeding the configured limit of {max}")]
    TooManyControls {
        /// Number of control objects the request named.
        count: usize,
        /// Configured limit.
        max: u16,
    },
}

/// A failure intrinsic to the executor/timer strand, not to any one
/// fragment. Unlike [`FragmentError`] these *do* propagate to the caller of
/// [`crate::executor::Strand::post`]/`start_after`/`block_for`, because they
/// indicate a programming or resource error rather than a protocol
/// condition a master can trigger.
#[derive(Debug, Error, miette::Diagnostic)]
pub enum ExecutorError {
    /// [`crate::executor::Strand::post`] (or a timer/`block_for` call) was
    /// issued after [`crate::executor::Strand::initiate_shutdown`].
    #[error("executor strand has been shut down")]
    #[diagnostic(
        code(dnp3_outstation::executor::shut_down),
        help("the owning OutstationContext has already been torn down; stop posting work to it")
    )]
    ShuttingDown,

    /// The strand's worker task panicked or was dropped without completing
    /// an in-flight `block_for` call.
    #[error("strand worker task terminated before replying")]
    #[diagnostic(
        code(dnp3_outstation::executor::worker_gone),
        help("the executor's worker task exited unexpectedly; this is a bug, not a protocol condition")
    )]
    WorkerGone,
}

/// A problem with a caller-supplied [`crate::config::OutstationConfig`].
#[derive(Debug, Error, miette::Diagnostic)]
pub enum ConfigError {
    /// An [`crate::event::EventBufferConfig`] capacity summed to more
    /// slots than the arena was constructed to hold.
    #[error("event buffer config requests {requested} total slots, arena capacity is {capacity}")]
    #[diagnostic(
        code(dnp3_outstation::config::event_buffer_overcommitted),
        help("lower one or more per-type max counts, or construct the EventBuffer with a larger capacity")
    )]
    EventBufferOvercommitted {
        /// Sum of per-type max counts requested.
        requested: usize,
        /// Arena capacity actually available.
        capacity: usize,
    },
}
