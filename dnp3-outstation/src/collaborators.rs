// Copyright (c) 2026 the dnp3-outstation authors. Licensed under Apache License, Version 2.0.

//! Traits the embedding application implements to plug in I/O, the point
//! database, and command/restart behavior (spec.md §6 "External
//! interfaces").
//!
//! These mirror the seams the original C++ outstation exposes as abstract
//! base classes (`ICommandHandler`, `IOutstationApplication`,
//! `LowerLayer`); here they are plain traits an embedder implements once
//! and a generic [`crate::context::OutstationContext`] is built over.

use crate::apdu::{AnalogOutput, CommandStatus, Crob, ObjectRange, ResponseWriter};
use crate::event::{ClassField, EventClass};
use crate::time::MonotonicTimestamp;

/// Sends completed application fragments to the link/transport layers
/// below, and reports whether the channel is currently usable.
///
/// Transmission is asynchronous: `begin_transmit` returns once the bytes
/// have been handed off, and the context later learns the outcome through
/// whatever channel wires [`crate::context::OutstationContext::on_send_result`]
/// (kept out of this trait so embedders aren't forced into one specific
/// callback shape).
pub trait LowerLayer: Send {
    /// Hands a complete application fragment to the layer below for
    /// transmission.
    fn begin_transmit(&mut self, fragment: &[u8]);

    /// Whether the channel below is currently up (affects whether
    /// unsolicited responses and retries may be attempted).
    fn is_up(&self) -> bool;
}

/// Validates and executes SELECT/OPERATE/DIRECT_OPERATE requests for the
/// two control object families this crate understands (spec.md §4.7).
pub trait CommandHandler: Send {
    /// Checks whether `command` would be accepted on `index` without
    /// executing it (the SELECT phase, and the validation half of
    /// DIRECT_OPERATE).
    fn select_crob(&mut self, command: Crob, index: u16) -> CommandStatus;

    /// Executes a previously-selected or direct-operate CROB.
    fn operate_crob(&mut self, command: Crob, index: u16) -> CommandStatus;

    /// Checks whether `command` would be accepted on `index`.
    fn select_analog_output(&mut self, command: AnalogOutput, index: u16) -> CommandStatus;

    /// Executes a previously-selected or direct-operate analog output.
    fn operate_analog_output(&mut self, command: AnalogOutput, index: u16) -> CommandStatus;
}

/// Outcome of a restart request: how long the device reports it will take
/// to come back, at whichever precision the application can supply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartDelay {
    /// Coarse delay in whole seconds (Group 52 Variation 1).
    Seconds(u16),
    /// Fine delay in milliseconds (Group 52 Variation 2).
    Milliseconds(u16),
}

/// Device-level behavior not tied to a specific point: restart and clock
/// synchronization handling (spec.md §4.8 "COLD/WARM_RESTART",
/// "DELAY_MEASURE").
pub trait OutstationApplication: Send {
    /// Initiates a cold restart, returning the delay to report, or `None`
    /// if cold restart is not supported.
    fn cold_restart(&mut self) -> Option<RestartDelay>;

    /// Initiates a warm restart, returning the delay to report, or `None`
    /// if warm restart is not supported.
    fn warm_restart(&mut self) -> Option<RestartDelay>;

    /// Called when the master writes an absolute time (Group 50 Variation
    /// 1) in response to a DELAY_MEASURE round trip.
    fn write_absolute_time(&mut self, time: MonotonicTimestamp);
}

/// Marks a subset of the static database as "of interest" for the next
/// response, by object range (spec.md §4.1 "READ handling: static
/// selection").
pub trait StaticSelector: Send {
    /// Selects every point of `group`/`variation` in `range`. `variation =
    /// None` means "default variation for this group" (qualifier `0x06`
    /// class reads commonly omit it).
    fn select_range(&mut self, group: u8, variation: Option<u8>, range: ObjectRange);

    /// Clears any selection left over from a prior response cycle.
    fn clear_selection(&mut self);
}

/// Writes previously-selected static points into a response
/// (spec.md §4.1 "READ handling: static load").
pub trait StaticResponseLoader: Send {
    /// Writes as much of the current static selection as `writer` has room
    /// for. Returns `true` if any selected points remain unwritten.
    fn load(&mut self, writer: &mut dyn ResponseWriter) -> bool;
}

/// Assigns points to an event reporting class (spec.md §4.8
/// "ASSIGN_CLASS").
pub trait ClassAssigner: Send {
    /// Assigns every point of `group`/`variation` in `range` to `class`.
    fn assign_class(&mut self, group: u8, variation: Option<u8>, range: ObjectRange, class: EventClass);

    /// The classes currently assigned to at least one point - used to
    /// reject ENABLE_UNSOLICITED/READ class requests for classes with no
    /// members configured, mirroring the original's validation.
    fn configured_classes(&self) -> ClassField;
}

/// The full point database surface: static selection/load plus class
/// assignment. Most embedders implement this on a single type that also
/// owns their actual point storage.
pub trait Database: StaticSelector + StaticResponseLoader + ClassAssigner {}

impl<T> Database for T where T: StaticSelector + StaticResponseLoader + ClassAssigner {}
