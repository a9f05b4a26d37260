// Copyright (c) 2026 the dnp3-outstation authors. Licensed under Apache License, Version 2.0.

//! [`OutstationContext`] - the fragment-driven application state machine
//! tying the executor, event buffer, and collaborator traits together
//! (spec.md §4 "Fragment processing pipeline").
//!
//! Grounded on `OContext::OnReceive`/`HandleConfirm` in
//! `original_source/cpp/libs/src/opendnp3/outstation/OutstationContext.cpp`:
//! one method parses the request header, routes by function code, and
//! assembles the response, same as the original's single dispatch loop -
//! re-expressed here as plain matches over the tagged types in
//! [`crate::apdu`] rather than the original's visitor-style command
//! handler dispatch.

use tracing::{debug, warn};

use crate::apdu::{ApduHeader, AppControlField, AppSeqNum, CommandStatus, FunctionCode, ResponseWriter};
use crate::channel::{SequenceInfo, SolicitedChannel, TimeoutOutcome, UnsolicitedChannel};
use crate::collaborators::{CommandHandler, Database, LowerLayer, OutstationApplication};
use crate::config::OutstationConfig;
use crate::event::{ClassField, EventBuffer, EventClass};
use crate::handlers;
use crate::iin::{IinBit, IinField};
use crate::response::{DeferredRequest, ResponseHistory, ResponseSession, SelectTable};
use crate::time::MonotonicTimestamp;

/// Ties one outstation's database, command handler, application callbacks,
/// and lower layer to the protocol state this crate owns: sequencing,
/// confirm/retry, the SOE buffer, and the SELECT/OPERATE table.
///
/// Every mutating method here is meant to run on the single
/// [`crate::executor::Strand`] the owning application posts work through -
/// nothing in this type is internally synchronized, by design.
pub struct OutstationContext<D, C, A, L> {
    config: OutstationConfig,
    database: D,
    command_handler: C,
    application: A,
    lower: L,
    events: EventBuffer,
    sol: SolicitedChannel,
    unsol: UnsolicitedChannel,
    sol_seq: SequenceInfo,
    unsol_seq: SequenceInfo,
    select_table: SelectTable,
    history: ResponseHistory,
    deferred: DeferredRequest,
    /// Set once a response goes out with more static/event data still
    /// selected but unwritten; cleared when the matching CONFIRM's
    /// continuation fragment finishes the cycle. `None` outside a
    /// multi-fragment exchange.
    sol_continuation: Option<ResponseSession>,
    /// Classes the master has enabled for unsolicited reporting via
    /// ENABLE_UNSOLICITED, already restricted to `config.unsol_class_mask`.
    unsol_enabled: ClassField,
    need_time: bool,
    device_restart: bool,
    lower_layer_up: bool,
    /// Whether a response handed to the lower layer is still in flight,
    /// awaiting `on_send_result` (spec.md §4.5 step 4, P3: at most one of
    /// the solicited/unsolicited channels transmits at a time). Distinct
    /// from `sol`/`unsol`'s `ConfirmWait`, which tracks waiting for the
    /// master's CONFIRM fragment after a transmit has already completed.
    is_transmitting: bool,
}

impl<D, C, A, L> OutstationContext<D, C, A, L>
where
    D: Database,
    C: CommandHandler,
    A: OutstationApplication,
    L: LowerLayer,
{
    /// Builds a context in its post-restart state: `NeedTime` and
    /// `DeviceRestart` both asserted, nothing selected or pending.
    #[must_use]
    pub fn new(config: OutstationConfig, database: D, command_handler: C, application: A, lower: L) -> Self {
        let events = EventBuffer::new(config.event_buffer_config);
        Self {
            config,
            database,
            command_handler,
            application,
            lower,
            events,
            sol: SolicitedChannel::new(),
            unsol: UnsolicitedChannel::new(),
            sol_seq: SequenceInfo::new(),
            unsol_seq: SequenceInfo::new(),
            select_table: SelectTable::new(),
            history: ResponseHistory::new(),
            deferred: DeferredRequest::new(),
            sol_continuation: None,
            unsol_enabled: ClassField::none(),
            need_time: true,
            device_restart: true,
            lower_layer_up: false,
            is_transmitting: false,
        }
    }

    /// The event buffer, for direct inspection/testing.
    #[must_use]
    pub fn events(&self) -> &EventBuffer { &self.events }

    /// The event buffer, mutable - the embedder's point-update path calls
    /// [`EventBuffer::update`] through this as values change.
    pub fn events_mut(&mut self) -> &mut EventBuffer { &mut self.events }

    /// Notifies the context that the lower layer has come up.
    pub fn on_lower_layer_up(&mut self) { self.lower_layer_up = true; }

    /// Notifies the context that the lower layer has gone down. Drops all
    /// per-link state that would be meaningless after a reconnect: the
    /// solicited/unsolicited confirm state, repeat-request history, and any
    /// deferred fragment. The event buffer and its selections survive -
    /// buffered events are not lost to a transport bounce.
    pub fn on_lower_layer_down(&mut self) {
        self.lower_layer_up = false;
        self.sol = SolicitedChannel::new();
        self.unsol = UnsolicitedChannel::new();
        self.history.clear();
        self.deferred.take();
        self.sol_continuation = None;
        self.database.clear_selection();
        self.events.unselect();
        self.is_transmitting = false;
    }

    /// Reports the outcome of a previously requested transmission. Flips
    /// `isTransmitting` back to `false` and drives `checkForTaskStart()` -
    /// a deferred fragment (if any) is reprocessed, otherwise an
    /// unsolicited response may now be considered (spec.md §4.5). Send
    /// failures are not retried at this layer; upper sequencing retries via
    /// the confirm timeout instead.
    pub fn on_send_result(&mut self, success: bool, now: MonotonicTimestamp, writer: &mut dyn ResponseWriter) {
        if !success {
            warn!("lower layer reported a failed transmission");
        }
        self.is_transmitting = false;
        self.check_for_task_start(now, writer);
    }

    /// Explicitly clears `IIN1.5` (`DeviceRestart`). Not wired
    /// automatically off any WRITE object - see the resolved open question
    /// in `handlers::write`.
    pub fn clear_restart_iin(&mut self) { self.device_restart = false; }

    /// Hands `bytes` to the lower layer and marks a transmission as in
    /// flight until the matching `on_send_result` arrives.
    fn transmit(&mut self, bytes: &[u8]) {
        self.lower.begin_transmit(bytes);
        self.is_transmitting = true;
    }

    /// Drains a deferred fragment once any in-flight transmission has
    /// finished, reprocessing it through `on_receive`; otherwise considers
    /// sending an unsolicited response (spec.md §4.5 step 7,
    /// `checkForTaskStart`).
    fn check_for_task_start(&mut self, now: MonotonicTimestamp, writer: &mut dyn ResponseWriter) {
        if self.is_transmitting {
            return;
        }
        if let Some(fragment) = self.deferred.take() {
            self.on_receive(&fragment, now, writer);
            return;
        }
        self.check_for_unsolicited(now, writer);
    }

    fn static_iin(&self) -> IinField {
        let mut iin = IinField::empty();
        if self.need_time {
            iin.set(IinBit::NeedTime);
        }
        if self.device_restart {
            iin.set(IinBit::DeviceRestart);
        }
        if self.events.is_overflown() {
            iin.set(IinBit::EventBufferOverflow);
        }
        let unwritten = self.events.unwritten_class_field();
        if unwritten.contains(EventClass::Class1) {
            iin.set(IinBit::Class1Events);
        }
        if unwritten.contains(EventClass::Class2) {
            iin.set(IinBit::Class2Events);
        }
        if unwritten.contains(EventClass::Class3) {
            iin.set(IinBit::Class3Events);
        }
        iin
    }

    /// Processes one request fragment, driving collaborators and producing
    /// a response through `writer` when the function code calls for one.
    ///
    /// Follows spec.md §4.5's fragment pipeline exactly: malformed or
    /// non-FIR/FIN/!CON fragments are dropped outright; a no-ack request
    /// always executes immediately; anything else is deferred whole while a
    /// prior response is still in flight at the lower layer; CONFIRM is
    /// routed to whichever channel's UNS bit names it; everything else goes
    /// through the repeat-request rule (§4.6) and normal dispatch. Every
    /// path that isn't an outright drop ends in `checkForTaskStart`.
    pub fn on_receive(&mut self, fragment: &[u8], now: MonotonicTimestamp, writer: &mut dyn ResponseWriter) {
        let (header, objects) = match ApduHeader::parse(fragment) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(%err, "dropping unparseable fragment");
                return;
            }
        };

        if !header.control.is_valid_request() {
            debug!(function = %header.function, "dropping non-FIR/FIN/!CON fragment");
            return;
        }

        if header.function == FunctionCode::DirectOperateNoAck {
            let mut iin = self.static_iin();
            self.handle_direct_operate_no_ack(objects, &mut iin);
        } else if self.is_transmitting {
            debug!(function = %header.function, "response transmit in flight, deferring fragment");
            self.deferred.defer(fragment.to_vec());
        } else if header.function == FunctionCode::Confirm {
            self.handle_confirm(header, now, writer);
        } else {
            self.on_receive_sol_request(header, objects, fragment, now, writer);
        }

        self.check_for_task_start(now, writer);
    }

    /// Applies the repeat-request rule (spec.md §4.6) and, for a genuinely
    /// new request, dispatches it and assembles the first response
    /// fragment. Only reached once §4.5's no-ack/deferral/CONFIRM branches
    /// have been ruled out.
    fn on_receive_sol_request(
        &mut self,
        header: ApduHeader,
        objects: &[u8],
        fragment: &[u8],
        now: MonotonicTimestamp,
        writer: &mut dyn ResponseWriter,
    ) {
        // `ignore_repeat_reads` governs READ only. A repeated non-READ
        // (same SEQ, byte-identical objects) always retransmits the
        // retained response without re-executing - the essential
        // idempotence guarantee (P4) - regardless of that flag.
        if header.function == FunctionCode::Read {
            if self.config.ignore_repeat_reads && self.history.is_repeat(fragment) {
                debug!(function = %header.function, "repeat READ request, discarding and holding current state");
                return;
            }
        } else if self.history.is_repeat(fragment) {
            debug!(function = %header.function, "repeat non-READ request, resending retained response without re-executing");
            if let Some(response) = self.history.last_response().map(<[u8]>::to_vec) {
                self.transmit(&response);
            }
            return;
        }

        let seq = header.control.seq;
        let mut iin = self.static_iin();
        self.dispatch(header.function, objects, seq, now, &mut iin, writer);
        self.finish_solicited_response(true, seq, iin, Some(fragment), now, writer);
    }

    /// Loads whatever is currently selected into `writer`, sends the
    /// resulting fragment, and arms or clears the confirm wait depending on
    /// whether anything selected is still unwritten.
    ///
    /// `fir` is `true` for the first fragment of a request's response,
    /// `false` for a continuation sent off the matching CONFIRM. History is
    /// only recorded for the first fragment - continuations are never
    /// themselves subject to repeat-request detection.
    fn finish_solicited_response(
        &mut self,
        fir: bool,
        seq: AppSeqNum,
        iin: IinField,
        history_fragment: Option<&[u8]>,
        now: MonotonicTimestamp,
        writer: &mut dyn ResponseWriter,
    ) {
        let static_more = self.database.load(writer);
        let events_written = self.events.load(writer);
        let events_more = self.events.has_more_unwritten_events();

        let mut session = ResponseSession::new();
        if !static_more {
            session.mark_static_exhausted();
        }
        if !events_more {
            session.mark_events_exhausted();
        }
        let fin = session.is_complete();
        let con = events_written > 0 || !fin;

        let response_header = ApduHeader::new(AppControlField::new(fir, fin, con, false, seq), FunctionCode::Response);
        let bytes = writer.finish(response_header, iin);
        self.transmit(&bytes);
        if let Some(fragment) = history_fragment {
            self.history.record(fragment, bytes.clone());
        }
        self.sol_seq.advance(bytes);
        if con {
            self.sol.on_response_sent(seq, now, self.config.sol_confirm_timeout.as_millis() as u64);
            self.sol_continuation = if fin { None } else { Some(session) };
        } else {
            self.sol.on_unconfirmed_response_sent();
            self.sol_continuation = None;
        }
    }

    fn handle_direct_operate_no_ack(&mut self, objects: &[u8], iin: &mut IinField) {
        match handlers::decode_control_objects(objects, self.config.max_controls_per_request) {
            Ok(commands) => {
                handlers::operate_all(&commands, &mut self.command_handler);
            }
            Err(err) => {
                warn!(%err, "malformed DIRECT_OPERATE_NO_ACK request");
                iin.set(IinBit::ParamError);
            }
        }
    }

    fn handle_confirm(&mut self, header: ApduHeader, now: MonotonicTimestamp, writer: &mut dyn ResponseWriter) {
        let seq = header.control.seq;
        if header.control.uns {
            if self.unsol.on_confirm_received(seq) {
                self.unsol_seq.clear_tx_record();
            }
        } else if self.sol.on_confirm_received(seq) {
            self.events.remove_written();
            match self.sol_continuation.take() {
                Some(_) => {
                    let iin = self.static_iin();
                    self.finish_solicited_response(false, seq.next(), iin, None, now, writer);
                    if self.sol_continuation.is_none() {
                        self.database.clear_selection();
                        self.sol_seq.clear_tx_record();
                    }
                }
                None => {
                    self.database.clear_selection();
                    self.sol_seq.clear_tx_record();
                }
            }
        }
    }

    fn dispatch(
        &mut self,
        function: FunctionCode,
        objects: &[u8],
        seq: AppSeqNum,
        now: MonotonicTimestamp,
        iin: &mut IinField,
        writer: &mut dyn ResponseWriter,
    ) {
        match function {
            FunctionCode::Read => {
                // A fresh READ starts clean: anything left selected by an
                // abandoned prior response (e.g. its CONFIRM never arrived)
                // is dropped rather than carried into this one.
                self.database.clear_selection();
                self.events.unselect();
                self.sol_continuation = None;
                if let Err(err) = handlers::handle_read(objects, &mut self.database, &mut self.events) {
                    warn!(%err, "malformed READ request");
                    iin.set(IinBit::ParamError);
                }
            }
            FunctionCode::Write => match handlers::handle_write(objects, &mut self.application) {
                Ok(outcome) => {
                    if outcome.clear_need_time {
                        self.need_time = false;
                    }
                }
                Err(err) => {
                    warn!(%err, "malformed WRITE request");
                    iin.set(IinBit::ParamError);
                }
            },
            FunctionCode::Select => self.handle_select(objects, seq, now, iin, writer),
            FunctionCode::Operate => self.handle_operate(objects, seq, now, iin, writer),
            FunctionCode::DirectOperate => self.handle_direct_operate(objects, iin, writer),
            FunctionCode::ColdRestart => self.handle_restart(true, iin, writer),
            FunctionCode::WarmRestart => self.handle_restart(false, iin, writer),
            FunctionCode::AssignClass => {
                if let Err(err) = handlers::handle_assign_class(objects, &mut self.database) {
                    warn!(%err, "malformed ASSIGN_CLASS request");
                    iin.set(IinBit::ParamError);
                }
            }
            FunctionCode::DelayMeasure => {
                // Request arrival and response assembly happen within the
                // same synchronous call here, so the measured round trip
                // is always reported as zero; a lower layer that buffers
                // frames before handing them to on_receive would need to
                // plumb the true arrival delay in separately.
                let (variation, value) = handlers::restart::restart_response_object(
                    handlers::delay_measure_object(0),
                );
                let _ = writer.write_scalar_object(52, variation, &value.to_le_bytes());
            }
            FunctionCode::EnableUnsolicited => match handlers::decode_requested_classes(objects) {
                Ok(requested) => self.unsol_enabled = self.unsol_enabled | restrict_to_mask(requested, self.config.unsol_class_mask),
                Err(err) => {
                    warn!(%err, "malformed ENABLE_UNSOLICITED request");
                    iin.set(IinBit::ParamError);
                }
            },
            FunctionCode::DisableUnsolicited => match handlers::decode_requested_classes(objects) {
                Ok(requested) => self.unsol_enabled.clear(requested),
                Err(err) => {
                    warn!(%err, "malformed DISABLE_UNSOLICITED request");
                    iin.set(IinBit::ParamError);
                }
            },
            FunctionCode::DirectOperateNoAck => unreachable!("handled before dispatch"),
            FunctionCode::Confirm => unreachable!("handled before dispatch"),
            FunctionCode::Response | FunctionCode::UnsolicitedResponse | FunctionCode::Unknown(_) => {
                iin.set(IinBit::FuncNotSupported);
            }
        }
    }

    fn handle_select(&mut self, objects: &[u8], seq: AppSeqNum, now: MonotonicTimestamp, iin: &mut IinField, writer: &mut dyn ResponseWriter) {
        let commands = match handlers::decode_control_objects(objects, self.config.max_controls_per_request) {
            Ok(commands) => commands,
            Err(err) => {
                warn!(%err, "malformed SELECT request");
                iin.set(IinBit::ParamError);
                return;
            }
        };
        let statuses = handlers::select_all(&commands, &mut self.command_handler);
        if statuses.iter().all(|(_, status)| *status == CommandStatus::Success) {
            self.select_table.record(objects, seq, now, self.config.select_timeout.as_millis() as u64);
        }
        handlers::write_command_responses(&commands, &statuses, writer);
    }

    fn handle_operate(&mut self, objects: &[u8], seq: AppSeqNum, now: MonotonicTimestamp, iin: &mut IinField, writer: &mut dyn ResponseWriter) {
        let commands = match handlers::decode_control_objects(objects, self.config.max_controls_per_request) {
            Ok(commands) => commands,
            Err(err) => {
                warn!(%err, "malformed OPERATE request");
                iin.set(IinBit::ParamError);
                return;
            }
        };
        let valid = self.select_table.validate_and_clear(objects, seq, now);
        let statuses = if valid {
            handlers::operate_all(&commands, &mut self.command_handler)
        } else {
            commands.iter().map(|&(index, _)| (index, CommandStatus::NoSelect)).collect()
        };
        handlers::write_command_responses(&commands, &statuses, writer);
    }

    fn handle_direct_operate(&mut self, objects: &[u8], iin: &mut IinField, writer: &mut dyn ResponseWriter) {
        let commands = match handlers::decode_control_objects(objects, self.config.max_controls_per_request) {
            Ok(commands) => commands,
            Err(err) => {
                warn!(%err, "malformed DIRECT_OPERATE request");
                iin.set(IinBit::ParamError);
                return;
            }
        };
        let statuses = handlers::operate_all(&commands, &mut self.command_handler);
        handlers::write_command_responses(&commands, &statuses, writer);
    }

    fn handle_restart(&mut self, cold: bool, iin: &mut IinField, writer: &mut dyn ResponseWriter) {
        let outcome = if cold {
            handlers::handle_cold_restart(&mut self.application)
        } else {
            handlers::handle_warm_restart(&mut self.application)
        };
        match outcome {
            Some((variation, value)) => {
                let _ = writer.write_scalar_object(52, variation, &value.to_le_bytes());
            }
            None => iin.set(IinBit::FuncNotSupported),
        }
    }

    /// Called periodically (or on timer fire) from the owning strand, and
    /// from `checkForTaskStart` after a fragment is processed: abandons a
    /// solicited response whose CONFIRM never arrived, then - unless a
    /// response is already in flight at the lower layer (`isTransmitting`,
    /// P3) - sends the initial unsolicited NULL response, retries an
    /// unconfirmed one, or pushes newly buffered events for an
    /// already-enabled class. Returns whether a fragment was transmitted.
    pub fn check_for_unsolicited(&mut self, now: MonotonicTimestamp, writer: &mut dyn ResponseWriter) -> bool {
        if self.lower_layer_up && self.sol.check_timeout(now) {
            self.abandon_solicited_response();
        }

        if self.is_transmitting || !self.config.allow_unsolicited || !self.lower_layer_up {
            return false;
        }

        if self.unsol.is_waiting_for_confirm() {
            return match self.unsol.check_timeout(now, self.config.unsol_retry_timeout.as_millis() as u64) {
                TimeoutOutcome::Retry => {
                    if let Some(bytes) = self.unsol_seq.last_tx().map(<[u8]>::to_vec) {
                        self.transmit(&bytes);
                        return true;
                    }
                    false
                }
                TimeoutOutcome::NotExpired => false,
            };
        }

        if !self.unsol.has_completed_null_handshake() {
            self.send_unsolicited(now, writer);
            return true;
        }

        let pending = self.events.unwritten_class_field();
        let eligible = restrict_to_mask(pending, self.unsol_enabled);
        if eligible.is_empty() {
            return false;
        }
        self.events.select_all_by_class(eligible);
        if self.events.load(writer) == 0 {
            return false;
        }
        self.send_unsolicited(now, writer);
        true
    }

    /// Drops a solicited response (and any in-progress multi-fragment
    /// continuation) whose CONFIRM never arrived in time (spec.md §4.3,
    /// "ConfirmWait | Confirm timeout").
    fn abandon_solicited_response(&mut self) {
        self.sol_continuation = None;
        self.database.clear_selection();
        self.events.unselect();
        self.sol_seq.clear_tx_record();
    }

    fn send_unsolicited(&mut self, now: MonotonicTimestamp, writer: &mut dyn ResponseWriter) {
        let iin = self.static_iin();
        let seq = self.unsol_seq.current().next();
        let header = ApduHeader::new(AppControlField::new(true, true, true, true, seq), FunctionCode::UnsolicitedResponse);
        let bytes = writer.finish(header, iin);
        self.transmit(&bytes);
        self.unsol_seq.advance(bytes);
        self.unsol.on_response_sent(seq, now, self.config.unsol_confirm_timeout.as_millis() as u64);
    }
}

fn restrict_to_mask(requested: ClassField, mask: ClassField) -> ClassField {
    let mut out = ClassField::none();
    for class in [EventClass::Class1, EventClass::Class2, EventClass::Class3] {
        if requested.contains(class) && mask.contains(class) {
            out.set(class);
        }
    }
    out
}
