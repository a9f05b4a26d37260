// Copyright (c) 2026 the dnp3-outstation authors. Licensed under Apache License, Version 2.0.

//! In-memory implementations of every collaborator trait in
//! [`crate::collaborators`] and [`crate::apdu::ResponseWriter`], shared by
//! the integration tests and `dnp3-outstation-demo` rather than redefined
//! in each `#[cfg(test)]` module.
//!
//! None of this is meant to be a reference point database or wire encoder -
//! bit-level APDU encoding is an external collaborator's concern (spec.md
//! §6) - it is the simplest thing that actually drives
//! [`crate::context::OutstationContext`] end to end.

use std::collections::BTreeMap;

use crate::apdu::{AnalogOutput, ApduHeader, CommandStatus, Crob, ObjectRange, ResponseWriter};
use crate::collaborators::{
    ClassAssigner, CommandHandler, LowerLayer, OutstationApplication, RestartDelay, StaticResponseLoader, StaticSelector,
};
use crate::event::{ClassField, EventClass, EventType, EventValue, EventVariation};
use crate::iin::IinField;
use crate::time::MonotonicTimestamp;

/// One static point: its addressing and current raw value bytes.
#[derive(Debug, Clone, Copy)]
struct StaticPoint {
    group: u8,
    variation: u8,
    index: u16,
    value_bytes: [u8; 8],
    len: usize,
}

fn range_contains(range: ObjectRange, index: u16) -> bool {
    match range {
        ObjectRange::StartStop { start, stop } => index >= start && index <= stop,
        ObjectRange::AllObjects | ObjectRange::Count { .. } | ObjectRange::CountWithPrefix { .. } => true,
    }
}

/// A flat vector of static points plus class assignments - enough to drive
/// READ/ASSIGN_CLASS through a [`crate::context::OutstationContext`] without
/// an embedder's real point database.
#[derive(Debug, Default)]
pub struct InMemoryDatabase {
    points: Vec<StaticPoint>,
    classes: BTreeMap<(u8, u16), EventClass>,
    selected: Vec<usize>,
}

impl InMemoryDatabase {
    /// An empty database.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Adds a static point, truncating `value_bytes` to 8 bytes.
    pub fn add_point(&mut self, group: u8, variation: u8, index: u16, value_bytes: &[u8]) {
        let len = value_bytes.len().min(8);
        let mut bytes = [0u8; 8];
        bytes[..len].copy_from_slice(&value_bytes[..len]);
        self.points.push(StaticPoint { group, variation, index, value_bytes: bytes, len });
    }
}

impl StaticSelector for InMemoryDatabase {
    fn select_range(&mut self, group: u8, variation: Option<u8>, range: ObjectRange) {
        for (i, point) in self.points.iter().enumerate() {
            if point.group != group {
                continue;
            }
            if variation.is_some_and(|v| v != point.variation) {
                continue;
            }
            if range_contains(range, point.index) && !self.selected.contains(&i) {
                self.selected.push(i);
            }
        }
    }

    fn clear_selection(&mut self) { self.selected.clear(); }
}

impl StaticResponseLoader for InMemoryDatabase {
    fn load(&mut self, writer: &mut dyn ResponseWriter) -> bool {
        let mut remaining = Vec::new();
        for &i in &self.selected {
            let point = self.points[i];
            if writer.remaining() == 0 || !writer.write_scalar_object(point.group, point.variation, &point.value_bytes[..point.len]) {
                remaining.push(i);
            }
        }
        let more_pending = !remaining.is_empty();
        self.selected = remaining;
        more_pending
    }
}

impl ClassAssigner for InMemoryDatabase {
    fn assign_class(&mut self, group: u8, variation: Option<u8>, range: ObjectRange, class: EventClass) {
        for point in &self.points {
            if point.group != group {
                continue;
            }
            if variation.is_some_and(|v| v != point.variation) {
                continue;
            }
            if range_contains(range, point.index) {
                self.classes.insert((group, point.index), class);
            }
        }
    }

    fn configured_classes(&self) -> ClassField { self.classes.values().copied().collect() }
}

/// A [`CommandHandler`] that accepts every command and records what it saw,
/// for assertions in tests.
#[derive(Debug, Default)]
pub struct RecordingCommandHandler {
    /// Every `(index, status)` pair returned from a `select_*` call.
    pub selected: Vec<(u16, CommandStatus)>,
    /// Every `(index, status)` pair returned from an `operate_*` call.
    pub operated: Vec<(u16, CommandStatus)>,
}

impl RecordingCommandHandler {
    /// An empty handler.
    #[must_use]
    pub fn new() -> Self { Self::default() }
}

impl CommandHandler for RecordingCommandHandler {
    fn select_crob(&mut self, _command: Crob, index: u16) -> CommandStatus {
        self.selected.push((index, CommandStatus::Success));
        CommandStatus::Success
    }

    fn operate_crob(&mut self, _command: Crob, index: u16) -> CommandStatus {
        self.operated.push((index, CommandStatus::Success));
        CommandStatus::Success
    }

    fn select_analog_output(&mut self, _command: AnalogOutput, index: u16) -> CommandStatus {
        self.selected.push((index, CommandStatus::Success));
        CommandStatus::Success
    }

    fn operate_analog_output(&mut self, _command: AnalogOutput, index: u16) -> CommandStatus {
        self.operated.push((index, CommandStatus::Success));
        CommandStatus::Success
    }
}

/// An [`OutstationApplication`] with configurable restart delays and no
/// other behavior.
#[derive(Debug, Clone, Copy)]
pub struct SimpleApplication {
    /// Delay reported for COLD_RESTART, or `None` to answer with
    /// `IinBit::FuncNotSupported`.
    pub cold_restart_delay: Option<RestartDelay>,
    /// Delay reported for WARM_RESTART, or `None`.
    pub warm_restart_delay: Option<RestartDelay>,
}

impl Default for SimpleApplication {
    fn default() -> Self {
        Self {
            cold_restart_delay: Some(RestartDelay::Seconds(30)),
            warm_restart_delay: Some(RestartDelay::Seconds(2)),
        }
    }
}

impl OutstationApplication for SimpleApplication {
    fn cold_restart(&mut self) -> Option<RestartDelay> { self.cold_restart_delay }
    fn warm_restart(&mut self) -> Option<RestartDelay> { self.warm_restart_delay }
    fn write_absolute_time(&mut self, _time: MonotonicTimestamp) {}
}

/// A [`LowerLayer`] that just retains every transmitted fragment, for
/// inspection or for feeding straight back into a peer context.
///
/// The sent list lives behind an `Arc<Mutex<_>>` so a caller can keep a
/// [`Self::observer`] clone after handing the layer itself into an
/// [`crate::context::OutstationContext`] that owns it from then on.
#[derive(Debug, Clone)]
pub struct LoopbackLowerLayer {
    sent: std::sync::Arc<std::sync::Mutex<Vec<Vec<u8>>>>,
    up: bool,
}

impl Default for LoopbackLowerLayer {
    fn default() -> Self { Self::new() }
}

impl LoopbackLowerLayer {
    /// A layer that reports `is_up() == true` from construction.
    #[must_use]
    pub fn new() -> Self { Self { sent: std::sync::Arc::default(), up: true } }

    /// A cheaply-cloneable handle sharing this layer's sent-fragment list,
    /// for a caller to retain after the layer itself has been moved into a
    /// context.
    #[must_use]
    pub fn observer(&self) -> Self { self.clone() }

    /// Takes every fragment transmitted since the last call.
    pub fn take_sent(&self) -> Vec<Vec<u8>> {
        std::mem::take(&mut self.sent.lock().expect("sent fragment list mutex poisoned"))
    }

    /// Sets whether [`LowerLayer::is_up`] reports the channel as usable.
    pub fn set_up(&mut self, up: bool) { self.up = up; }
}

impl LowerLayer for LoopbackLowerLayer {
    fn begin_transmit(&mut self, fragment: &[u8]) {
        self.sent.lock().expect("sent fragment list mutex poisoned").push(fragment.to_vec());
    }
    fn is_up(&self) -> bool { self.up }
}

fn encode_event_value(value: EventValue) -> Vec<u8> {
    match value {
        EventValue::Binary { flags } => vec![flags],
        EventValue::Analog { flags, value } => {
            let mut bytes = vec![flags];
            bytes.extend_from_slice(&(value as f32).to_le_bytes());
            bytes
        }
        EventValue::Counter { flags, value } => {
            let mut bytes = vec![flags];
            bytes.extend_from_slice(&value.to_le_bytes());
            bytes
        }
    }
}

/// A [`ResponseWriter`] that encodes into a flat byte buffer bounded by
/// `max_size`. The wire shape it writes (group, variation, little-endian
/// index, payload) is a simplified stand-in for the qualifier-driven
/// encoding a production embedder would use - good enough to drive and
/// observe the fragment pipeline, not a second DNP3 codec.
#[derive(Debug)]
pub struct VecResponseWriter {
    max_size: usize,
    buf: Vec<u8>,
}

impl VecResponseWriter {
    /// A writer that will accept at most `max_size` bytes of object data
    /// before the two-byte header and two-byte IIN field.
    #[must_use]
    pub fn new(max_size: usize) -> Self { Self { max_size, buf: Vec::new() } }
}

impl ResponseWriter for VecResponseWriter {
    fn remaining(&self) -> usize { self.max_size.saturating_sub(self.buf.len()) }

    fn write_event_group(&mut self, ty: EventType, variation: EventVariation, entries: &[(u16, EventValue)]) -> usize {
        let mut written = 0usize;
        for &(index, value) in entries {
            let payload = encode_event_value(value);
            let needed = 2 + 2 + payload.len();
            if self.remaining() < needed {
                break;
            }
            self.buf.push(ty.default_group());
            self.buf.push(variation.0);
            self.buf.extend_from_slice(&index.to_le_bytes());
            self.buf.extend_from_slice(&payload);
            written += 1;
        }
        written
    }

    fn write_command_statuses(&mut self, group: u8, variation: u8, statuses: &[(u16, CommandStatus)]) -> usize {
        let mut written = 0usize;
        for &(index, status) in statuses {
            let needed = 2 + 2 + 1;
            if self.remaining() < needed {
                break;
            }
            self.buf.push(group);
            self.buf.push(variation);
            self.buf.extend_from_slice(&index.to_le_bytes());
            self.buf.push(status.to_byte());
            written += 1;
        }
        written
    }

    fn write_scalar_object(&mut self, group: u8, variation: u8, value_bytes: &[u8]) -> bool {
        let needed = 2 + value_bytes.len();
        if self.remaining() < needed {
            return false;
        }
        self.buf.push(group);
        self.buf.push(variation);
        self.buf.extend_from_slice(value_bytes);
        true
    }

    fn finish(&mut self, header: ApduHeader, iin: IinField) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 + self.buf.len());
        out.extend_from_slice(&header.to_bytes());
        out.extend_from_slice(&iin.to_u16().to_le_bytes());
        out.append(&mut self.buf);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apdu::FunctionCode;
    use crate::apdu::{AppControlField, AppSeqNum};

    #[test]
    fn in_memory_database_selects_and_loads_points_in_range() {
        let mut db = InMemoryDatabase::new();
        db.add_point(30, 1, 0, &[1, 2, 3, 4]);
        db.add_point(30, 1, 1, &[5, 6, 7, 8]);
        db.select_range(30, Some(1), ObjectRange::StartStop { start: 0, stop: 0 });

        let mut writer = VecResponseWriter::new(128);
        let more = db.load(&mut writer);
        assert!(!more);

        let header = ApduHeader::new(AppControlField::single_fragment(AppSeqNum::new(0)), FunctionCode::Response);
        let bytes = writer.finish(header, IinField::empty());
        assert_eq!(&bytes[4..], &[30, 1, 1, 2, 3, 4]);
    }

    #[test]
    fn assign_class_only_affects_points_in_range() {
        let mut db = InMemoryDatabase::new();
        db.add_point(1, 2, 0, &[0]);
        db.add_point(1, 2, 5, &[0]);
        db.assign_class(1, Some(2), ObjectRange::StartStop { start: 0, stop: 0 }, EventClass::Class2);
        assert_eq!(db.configured_classes(), ClassField::of(EventClass::Class2));
    }

    #[test]
    fn loopback_lower_layer_retains_fragments() {
        let mut lower = LoopbackLowerLayer::new();
        assert!(lower.is_up());
        lower.begin_transmit(&[1, 2, 3]);
        assert_eq!(lower.take_sent(), vec![vec![1, 2, 3]]);
        assert!(lower.take_sent().is_empty());
    }

    #[test]
    fn vec_response_writer_stops_accepting_once_full() {
        let mut writer = VecResponseWriter::new(3);
        assert!(writer.write_scalar_object(1, 1, &[0, 0]));
        assert!(!writer.write_scalar_object(1, 1, &[0, 0]));
    }
}
