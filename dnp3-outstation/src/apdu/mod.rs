// Copyright (c) 2026 the dnp3-outstation authors. Licensed under Apache License, Version 2.0.

//! Application-layer wire types: headers, function codes, object-header
//! parsing, and the fixed-size control object codecs.

pub mod control;
pub mod control_object;
pub mod function;
pub mod header;
pub mod object_header;

pub use control::{AppControlField, AppSeqNum};
pub use control_object::{AnalogOutput, CommandStatus, ControlCode, ControlCommand, Crob, OperateType};
pub use function::FunctionCode;
pub use header::ApduHeader;
pub use object_header::{ObjectHeader, ObjectHeaderCursor, ObjectRange};

use crate::event::{EventType, EventValue, EventVariation};
use crate::iin::IinField;

/// The external write-out surface response assembly drives.
///
/// Bit-level APDU *encoding* is an external collaborator's concern (spec.md
/// §6); this crate only decides which events/static points go into the
/// response and in what grouping, and when the response is complete.
/// Implementations own the actual byte buffer and report back how much
/// they could fit, which is what lets [`crate::event::EventBuffer::load`]
/// stop mid-group when a fragment fills up.
pub trait ResponseWriter {
    /// Upper bound on further objects this writer can still accept before
    /// the current fragment is full.
    fn remaining(&self) -> usize;

    /// Writes one object-header's worth of same-(type, variation) events.
    /// Returns how many of `entries` were actually written; write-out halts
    /// once this is less than `entries.len()`.
    fn write_event_group(&mut self, ty: EventType, variation: EventVariation, entries: &[(u16, EventValue)]) -> usize;

    /// Echoes SELECT/OPERATE/DIRECT_OPERATE results for one
    /// group/variation's worth of control points. Returns how many were
    /// written, same convention as [`Self::write_event_group`].
    fn write_command_statuses(&mut self, group: u8, variation: u8, statuses: &[(u16, CommandStatus)]) -> usize;

    /// Writes a single fixed-size scalar object (restart delay, delay
    /// measurement) with a little-endian value of `value_bytes.len()`
    /// bytes. Returns whether it fit.
    fn write_scalar_object(&mut self, group: u8, variation: u8, value_bytes: &[u8]) -> bool;

    /// Finalizes the fragment with `header` and `iin`, returning the
    /// complete bytes ready for [`crate::collaborators::LowerLayer::begin_transmit`].
    fn finish(&mut self, header: ApduHeader, iin: IinField) -> Vec<u8>;
}
