// Copyright (c) 2026 the dnp3-outstation authors. Licensed under Apache License, Version 2.0.

//! End-to-end exercises of [`OutstationContext`] through its public API
//! only - no field access, same constraint a real embedder is under. Each
//! test corresponds to one of the walkthroughs a protocol conformance
//! reviewer would actually run by hand: a repeated control request, a
//! SELECT/OPERATE window, the unsolicited NULL handshake, a deferred
//! fragment, and a confirm timeout mid multi-fragment response.

use dnp3_outstation::apdu::{AppControlField, AppSeqNum, ApduHeader, Crob, FunctionCode};
use dnp3_outstation::config::OutstationConfig;
use dnp3_outstation::context::OutstationContext;
use dnp3_outstation::event::{EventBufferConfig, EventClass, EventType, EventValue};
use dnp3_outstation::test_fixtures::{
    InMemoryDatabase, LoopbackLowerLayer, RecordingCommandHandler, SimpleApplication, VecResponseWriter,
};
use dnp3_outstation::time::MonotonicTimestamp;

fn header_bytes(seq: u8, function: FunctionCode) -> Vec<u8> {
    ApduHeader::new(AppControlField::single_fragment(AppSeqNum::new(seq)), function).to_bytes().to_vec()
}

fn crob_request(seq: u8, function: FunctionCode, index: u8, code_nibble: u8) -> Vec<u8> {
    let mut bytes = header_bytes(seq, function);
    bytes.extend_from_slice(&[12, 1, 0x17, 1, index]);
    let mut crob = [0u8; Crob::WIRE_SIZE];
    crob[0] = code_nibble;
    crob[1] = 1; // count
    bytes.extend_from_slice(&crob);
    bytes
}

fn read_range_request(seq: u8, group: u8, variation: u8, start: u16, stop: u16) -> Vec<u8> {
    let mut bytes = header_bytes(seq, FunctionCode::Read);
    bytes.extend_from_slice(&[group, variation, 0x00, start as u8, stop as u8]);
    bytes
}

fn enable_unsolicited_request(seq: u8, class: u8) -> Vec<u8> {
    let mut bytes = header_bytes(seq, FunctionCode::EnableUnsolicited);
    bytes.extend_from_slice(&[class, 0, 0x06]);
    bytes
}

fn confirm_bytes(seq: u8, unsolicited: bool) -> Vec<u8> {
    let control = AppControlField::new(true, true, false, unsolicited, AppSeqNum::new(seq));
    ApduHeader::new(control, FunctionCode::Confirm).to_bytes().to_vec()
}

fn control_byte(fragment: &[u8]) -> AppControlField {
    AppControlField::from_byte(fragment[0])
}

fn new_context(config: OutstationConfig) -> (
    OutstationContext<InMemoryDatabase, RecordingCommandHandler, SimpleApplication, LoopbackLowerLayer>,
    LoopbackLowerLayer,
) {
    let database = InMemoryDatabase::new();
    let lower = LoopbackLowerLayer::new();
    let observer = lower.observer();
    let mut context = OutstationContext::new(config, database, RecordingCommandHandler::new(), SimpleApplication::default(), lower);
    context.on_lower_layer_up();
    (context, observer)
}

/// A config with unsolicited reporting turned off, for scenarios that are
/// not themselves about the unsolicited handshake - otherwise the NULL
/// handshake `checkForTaskStart` fires automatically as soon as the lower
/// layer is up, interleaving an extra fragment into `observer.take_sent()`.
fn config_without_unsolicited() -> OutstationConfig {
    OutstationConfig { allow_unsolicited: false, ..OutstationConfig::default() }
}

/// Scenario 1: a DIRECT_OPERATE resent byte-for-byte must not re-invoke the
/// command handler, and must answer with the exact bytes retained from the
/// first response.
#[test]
fn repeat_direct_operate_is_idempotent() {
    let (mut context, observer) = new_context(config_without_unsolicited());
    let request = crob_request(3, FunctionCode::DirectOperate, 5, 3); // LatchOn

    let mut writer = VecResponseWriter::new(2048);
    context.on_receive(&request, MonotonicTimestamp::from_millis(0), &mut writer);
    let mut drain = VecResponseWriter::new(2048);
    context.on_send_result(true, MonotonicTimestamp::from_millis(1), &mut drain);

    let mut writer = VecResponseWriter::new(2048);
    context.on_receive(&request, MonotonicTimestamp::from_millis(10), &mut writer);

    let sent = observer.take_sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0], sent[1], "repeated request must answer with the exact retained response");
}

/// Scenario 2: OPERATE executes within the SELECT window and is rejected
/// once the window has elapsed, with the handler untouched either way.
#[test]
fn select_then_operate_respects_the_select_window() {
    use dnp3_outstation::apdu::CommandStatus;

    let (mut context, observer) = new_context(config_without_unsolicited());

    let select = crob_request(4, FunctionCode::Select, 2, 1); // PulseOn
    let mut writer = VecResponseWriter::new(2048);
    context.on_receive(&select, MonotonicTimestamp::from_millis(0), &mut writer);
    let mut drain = VecResponseWriter::new(2048);
    context.on_send_result(true, MonotonicTimestamp::from_millis(1), &mut drain);

    let operate = crob_request(5, FunctionCode::Operate, 2, 1);
    let mut writer = VecResponseWriter::new(2048);
    context.on_receive(&operate, MonotonicTimestamp::from_millis(9_000), &mut writer);
    let mut drain = VecResponseWriter::new(2048);
    context.on_send_result(true, MonotonicTimestamp::from_millis(9_001), &mut drain);

    let sent = observer.take_sent();
    assert_eq!(sent.len(), 2);
    // object payload starts right after the 4-byte header+IIN: group, var, index lo, index hi, status
    let status_byte = sent[1][8];
    assert_eq!(status_byte, CommandStatus::Success.to_byte());

    // A second SELECT/OPERATE pair, but the OPERATE arrives after the
    // select window (10s by default) has elapsed.
    let select = crob_request(6, FunctionCode::Select, 2, 1);
    let mut writer = VecResponseWriter::new(2048);
    context.on_receive(&select, MonotonicTimestamp::from_millis(20_000), &mut writer);
    let mut drain = VecResponseWriter::new(2048);
    context.on_send_result(true, MonotonicTimestamp::from_millis(20_001), &mut drain);

    let operate = crob_request(7, FunctionCode::Operate, 2, 1);
    let mut writer = VecResponseWriter::new(2048);
    context.on_receive(&operate, MonotonicTimestamp::from_millis(31_000), &mut writer);

    let sent = observer.take_sent();
    assert_eq!(sent.len(), 2);
    let status_byte = sent[1][8];
    assert_eq!(status_byte, CommandStatus::NoSelect.to_byte());
}

/// Scenario 4: the first `check_for_unsolicited` call sends an unconfirmed
/// NULL response; its CONFIRM completes the handshake, and a class 1 event
/// reported afterward triggers an unsolicited event response.
#[test]
fn unsolicited_null_handshake_then_event_report() {
    let (mut context, observer) = new_context(OutstationConfig::default());

    let mut writer = VecResponseWriter::new(2048);
    let sent = context.check_for_unsolicited(MonotonicTimestamp::from_millis(0), &mut writer);
    assert!(sent);
    assert!(!context.events().has_more_unwritten_events());

    let frames = observer.take_sent();
    assert_eq!(frames.len(), 1);
    let null_control = control_byte(&frames[0]);
    assert!(null_control.fir && null_control.fin && null_control.con && null_control.uns);
    let mut drain = VecResponseWriter::new(2048);
    context.on_send_result(true, MonotonicTimestamp::from_millis(5), &mut drain);

    let mut writer = VecResponseWriter::new(2048);
    context.on_receive(&confirm_bytes(null_control.seq.value(), true), MonotonicTimestamp::from_millis(10), &mut writer);

    // No further NULL is sent once the handshake has completed.
    let mut writer = VecResponseWriter::new(2048);
    assert!(!context.check_for_unsolicited(MonotonicTimestamp::from_millis(20), &mut writer));
    assert!(observer.take_sent().is_empty());

    let mut writer = VecResponseWriter::new(2048);
    context.on_receive(&enable_unsolicited_request(1, 1), MonotonicTimestamp::from_millis(30), &mut writer);
    observer.take_sent();
    let mut drain = VecResponseWriter::new(2048);
    context.on_send_result(true, MonotonicTimestamp::from_millis(31), &mut drain);

    context.events_mut().update(EventValue::Binary { flags: 0x01 }, 0, EventClass::Class1, EventType::Binary);

    let mut writer = VecResponseWriter::new(2048);
    let sent = context.check_for_unsolicited(MonotonicTimestamp::from_millis(40), &mut writer);
    assert!(sent);
    let frames = observer.take_sent();
    assert_eq!(frames.len(), 1);
    let event_control = control_byte(&frames[0]);
    assert!(event_control.uns && event_control.fir && event_control.fin);
}

/// Scenario 5: a request that arrives while the prior response is still in
/// flight at the lower layer is set aside, and is only answered once
/// `on_send_result` reports that transmission finished (spec.md §4.5 steps
/// 4 and 7).
#[test]
fn request_is_deferred_while_transmitting_then_drained_on_send_result() {
    let (mut context, observer) = new_context(config_without_unsolicited());
    let first = read_range_request(7, 30, 1, 0, 0);
    let second = read_range_request(8, 30, 1, 0, 0);

    let mut writer = VecResponseWriter::new(2048);
    context.on_receive(&first, MonotonicTimestamp::from_millis(0), &mut writer);
    assert_eq!(observer.take_sent().len(), 1);

    let mut writer2 = VecResponseWriter::new(2048);
    context.on_receive(&second, MonotonicTimestamp::from_millis(1), &mut writer2);
    assert!(observer.take_sent().is_empty(), "a fragment arriving mid-transmit must not itself produce a response");

    let mut drain = VecResponseWriter::new(2048);
    context.on_send_result(true, MonotonicTimestamp::from_millis(2), &mut drain);
    assert_eq!(observer.take_sent().len(), 1, "on_send_result drains and reprocesses the deferred fragment");
}

/// Scenario 6: a multi-fragment solicited response continues across a
/// matching CONFIRM, and a CONFIRM that never arrives abandons the cycle so
/// the next READ starts clean rather than resuming stale selection state.
#[test]
fn multi_fragment_response_continues_on_confirm_and_resets_on_timeout() {
    let mut database = InMemoryDatabase::new();
    database.add_point(30, 1, 0, &1.0f32.to_le_bytes());
    database.add_point(30, 1, 1, &2.0f32.to_le_bytes());

    let config = config_without_unsolicited();
    let lower = LoopbackLowerLayer::new();
    let observer = lower.observer();
    let mut context = OutstationContext::new(config, database, RecordingCommandHandler::new(), SimpleApplication::default(), lower);
    context.on_lower_layer_up();

    // Only 6 bytes of object capacity: exactly one 4-byte float point (2
    // bytes group/variation + 4 bytes value) fits per fragment.
    let mut writer = VecResponseWriter::new(6);
    context.on_receive(&read_range_request(0, 30, 1, 0, 1), MonotonicTimestamp::from_millis(0), &mut writer);

    let sent = observer.take_sent();
    assert_eq!(sent.len(), 1);
    let first = control_byte(&sent[0]);
    assert!(first.fir && !first.fin && first.con, "first fragment must ask for a CONFIRM before continuing");
    let mut drain = VecResponseWriter::new(6);
    context.on_send_result(true, MonotonicTimestamp::from_millis(1), &mut drain);

    let mut writer = VecResponseWriter::new(6);
    context.on_receive(&confirm_bytes(first.seq.value(), false), MonotonicTimestamp::from_millis(10), &mut writer);

    let sent = observer.take_sent();
    assert_eq!(sent.len(), 1);
    let second = control_byte(&sent[0]);
    assert!(!second.fir && second.fin && !second.con, "second fragment completes the response with no further CONFIRM needed");
    let mut drain = VecResponseWriter::new(6);
    context.on_send_result(true, MonotonicTimestamp::from_millis(11), &mut drain);

    // A fresh multi-fragment read whose CONFIRM never arrives must not
    // leave the next READ resuming a stale selection.
    let mut writer = VecResponseWriter::new(6);
    context.on_receive(&read_range_request(1, 30, 1, 0, 1), MonotonicTimestamp::from_millis(100), &mut writer);
    let sent = observer.take_sent();
    assert_eq!(sent.len(), 1);
    assert!(!control_byte(&sent[0]).fin);
    let mut drain = VecResponseWriter::new(2048);
    context.on_send_result(true, MonotonicTimestamp::from_millis(101), &mut drain);

    let timeout_ms = OutstationConfig::default().sol_confirm_timeout.as_millis() as u64;
    let mut writer = VecResponseWriter::new(2048);
    context.check_for_unsolicited(MonotonicTimestamp::from_millis(100 + timeout_ms), &mut writer);

    // The abandoned cycle must not answer a late CONFIRM for the old
    // exchange with a continuation fragment.
    let mut writer = VecResponseWriter::new(2048);
    context.on_receive(&confirm_bytes(1, false), MonotonicTimestamp::from_millis(100 + timeout_ms + 10), &mut writer);
    assert!(observer.take_sent().is_empty());

    // The next READ starts clean and answers both points in one final
    // fragment rather than continuing the abandoned selection.
    let mut writer = VecResponseWriter::new(2048);
    context.on_receive(&read_range_request(2, 30, 1, 0, 1), MonotonicTimestamp::from_millis(100 + timeout_ms + 20), &mut writer);
    let sent = observer.take_sent();
    assert_eq!(sent.len(), 1);
    let fresh = control_byte(&sent[0]);
    assert!(fresh.fir && fresh.fin && !fresh.con);
    assert_eq!(sent[0].len(), 4 + 2 * (2 + 4));
}
