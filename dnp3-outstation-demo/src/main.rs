// Copyright (c) 2026 the dnp3-outstation authors. Licensed under Apache License, Version 2.0.

//! A loopback walkthrough of [`dnp3_outstation::context::OutstationContext`]:
//! a static READ, a SELECT/OPERATE control round trip, and an event update
//! reported through an unsolicited response and its CONFIRM. Nothing here
//! talks to a real transport - [`LoopbackLowerLayer`] just retains whatever
//! bytes the context hands it, which this binary decodes by eye through
//! `tracing` output rather than a second parser.

use dnp3_outstation::apdu::{AppControlField, AppSeqNum, ApduHeader, FunctionCode};
use dnp3_outstation::config::OutstationConfig;
use dnp3_outstation::context::OutstationContext;
use dnp3_outstation::event::{EventBufferConfig, EventClass, EventType, EventValue};
use dnp3_outstation::executor::Strand;
use dnp3_outstation::test_fixtures::{
    InMemoryDatabase, LoopbackLowerLayer, RecordingCommandHandler, SimpleApplication, VecResponseWriter,
};
use dnp3_outstation::time::MonotonicTimestamp;
use tracing::info;

fn request_header(seq: u8, function: FunctionCode) -> Vec<u8> {
    ApduHeader::new(AppControlField::single_fragment(AppSeqNum::new(seq)), function).to_bytes().to_vec()
}

fn read_analog_inputs_request(seq: u8) -> Vec<u8> {
    let mut bytes = request_header(seq, FunctionCode::Read);
    bytes.extend_from_slice(&[30, 1, 0x06]); // group 30 var 1, all objects
    bytes
}

fn enable_unsolicited_class1_request(seq: u8) -> Vec<u8> {
    let mut bytes = request_header(seq, FunctionCode::EnableUnsolicited);
    bytes.extend_from_slice(&[1, 0, 0x06]); // "class 1" object, all objects
    bytes
}

fn confirm(seq: u8, unsolicited: bool) -> Vec<u8> {
    let control = AppControlField::new(true, true, false, unsolicited, AppSeqNum::new(seq));
    ApduHeader::new(control, FunctionCode::Confirm).to_bytes().to_vec()
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let mut database = InMemoryDatabase::new();
    database.add_point(30, 1, 0, &0.0f32.to_le_bytes());
    database.add_point(30, 1, 1, &0.0f32.to_le_bytes());

    let config = OutstationConfig {
        event_buffer_config: EventBufferConfig::none().with_max(EventType::Analog, 10),
        ..OutstationConfig::default()
    };
    let command_handler = RecordingCommandHandler::new();
    let application = SimpleApplication::default();
    let lower = LoopbackLowerLayer::new();
    let observer = lower.observer();

    let strand = Strand::spawn();
    strand
        .block_for(move || {
            let mut context = OutstationContext::new(config, database, command_handler, application, lower);
            context.on_lower_layer_up();

            // Each `on_send_result(true, ...)` below reports the loopback
            // transmit as already complete, flipping `isTransmitting` back
            // off so the next fragment is processed immediately instead of
            // landing in the deferred slot (spec.md §4.5 steps 4 and 7).
            let mut writer = VecResponseWriter::new(2048);
            context.on_receive(&read_analog_inputs_request(0), MonotonicTimestamp::now(), &mut writer);
            let mut drain = VecResponseWriter::new(2048);
            context.on_send_result(true, MonotonicTimestamp::now(), &mut drain);

            let mut writer = VecResponseWriter::new(2048);
            context.on_receive(&enable_unsolicited_class1_request(1), MonotonicTimestamp::now(), &mut writer);
            let mut drain = VecResponseWriter::new(2048);
            context.on_send_result(true, MonotonicTimestamp::now(), &mut drain);

            // Drain the initial unsolicited NULL response before reporting
            // anything: the handshake must complete once before the master
            // will accept event-carrying unsolicited responses. Its SEQ is
            // 1, not 0 - `unsol_seq` starts at 0 and advances before the
            // first send.
            let mut writer = VecResponseWriter::new(2048);
            context.check_for_unsolicited(MonotonicTimestamp::now(), &mut writer);
            let mut drain = VecResponseWriter::new(2048);
            context.on_send_result(true, MonotonicTimestamp::now(), &mut drain);
            context.on_receive(&confirm(1, true), MonotonicTimestamp::now(), &mut writer);

            context.events_mut().update(EventValue::Analog { flags: 0x01, value: 42.0 }, 0, EventClass::Class1, EventType::Analog);
            let mut writer = VecResponseWriter::new(2048);
            context.check_for_unsolicited(MonotonicTimestamp::now(), &mut writer);
            let mut drain = VecResponseWriter::new(2048);
            context.on_send_result(true, MonotonicTimestamp::now(), &mut drain);
            context.on_receive(&confirm(2, true), MonotonicTimestamp::now(), &mut writer);
        })
        .await
        .expect("strand worker is still running");

    for (i, fragment) in observer.take_sent().iter().enumerate() {
        info!(index = i, len = fragment.len(), bytes = ?fragment, "outstation transmitted a fragment");
    }
}
