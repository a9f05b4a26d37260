// Copyright (c) 2026 the dnp3-outstation authors. Licensed under Apache License, Version 2.0.

//! Decoding and dispatch for SELECT/OPERATE/DIRECT_OPERATE(_NOACK) request
//! objects (spec.md §4.7 "Control handling").

use crate::apdu::{AnalogOutput, CommandStatus, ControlCommand, Crob, ObjectHeaderCursor, ObjectRange, ResponseWriter};
use crate::collaborators::CommandHandler;
use crate::error::FragmentError;

/// Decodes every control object in a request, enforcing
/// `max_controls_per_request`.
///
/// Only the index-prefixed count encoding (qualifiers `0x17`/`0x28`) is
/// supported, matching how every control object this crate recognizes
/// (CROB, analog output) is actually sent on the wire.
///
/// # Errors
///
/// [`FragmentError::TooManyControls`] if the request names more objects
/// than `max_controls` allows; [`FragmentError::UnrecognizedControlObject`]
/// for any group/variation other than 12/1 or 41/1-4;
/// [`FragmentError::ObjectHeaderTruncated`] for a short payload.
pub fn decode_control_objects(objects: &[u8], max_controls: u16) -> Result<Vec<(u16, ControlCommand)>, FragmentError> {
    let mut out = Vec::new();
    let mut cursor = ObjectHeaderCursor::new(objects);

    while !cursor.is_empty() {
        let header = cursor.next_header()?;
        let ObjectRange::CountWithPrefix { count, prefix_size } = header.range else {
            return Err(FragmentError::UnrecognizedControlObject { group: header.group, variation: header.variation });
        };

        let object_size = match (header.group, header.variation) {
            (12, 1) => Crob::WIRE_SIZE,
            (41, variation) => AnalogOutput::wire_size(variation)
                .ok_or(FragmentError::UnrecognizedControlObject { group: 41, variation })?,
            (group, variation) => return Err(FragmentError::UnrecognizedControlObject { group, variation }),
        };

        let entry_size = usize::from(prefix_size) + object_size;
        let payload_len = usize::from(count) * entry_size;
        if header.remainder.len() < payload_len {
            return Err(FragmentError::ObjectHeaderTruncated { offset: 0 });
        }

        for entry in header.remainder[..payload_len].chunks_exact(entry_size) {
            let index = match prefix_size {
                1 => u16::from(entry[0]),
                _ => u16::from_le_bytes([entry[0], entry[1]]),
            };
            let payload = &entry[usize::from(prefix_size)..];
            let command = if header.group == 12 {
                let bytes: [u8; Crob::WIRE_SIZE] = payload.try_into().expect("chunk sized to object_size");
                ControlCommand::Crob(Crob::decode(&bytes))
            } else {
                ControlCommand::AnalogOutput(
                    AnalogOutput::decode(header.variation, payload).expect("chunk sized to object_size"),
                )
            };
            out.push((index, command));
            if out.len() > usize::from(max_controls) {
                return Err(FragmentError::TooManyControls { count: out.len(), max: max_controls });
            }
        }

        cursor.advance(&header, payload_len)?;
    }

    Ok(out)
}

/// Runs the SELECT (validate-only) phase over every decoded command.
pub fn select_all(commands: &[(u16, ControlCommand)], handler: &mut dyn CommandHandler) -> Vec<(u16, CommandStatus)> {
    commands
        .iter()
        .map(|&(index, command)| (index, dispatch(command, index, handler, false)))
        .collect()
}

/// Runs the OPERATE (execute) phase over every decoded command.
pub fn operate_all(commands: &[(u16, ControlCommand)], handler: &mut dyn CommandHandler) -> Vec<(u16, CommandStatus)> {
    commands
        .iter()
        .map(|&(index, command)| (index, dispatch(command, index, handler, true)))
        .collect()
}

/// The `(group, variation)` a control command echoes its status under.
#[must_use]
fn command_group_variation(command: ControlCommand) -> (u8, u8) {
    match command {
        ControlCommand::Crob(_) => (12, 1),
        ControlCommand::AnalogOutput(ao) => (41, ao.variation),
    }
}

/// Echoes SELECT/OPERATE/DIRECT_OPERATE statuses into a response, grouped
/// into contiguous runs of the same `(group, variation)` so a request
/// mixing CROBs and analog outputs produces one object header per group
/// rather than one per point.
pub fn write_command_responses(commands: &[(u16, ControlCommand)], statuses: &[(u16, CommandStatus)], writer: &mut dyn ResponseWriter) {
    debug_assert_eq!(commands.len(), statuses.len());
    let mut start = 0;
    while start < commands.len() {
        let key = command_group_variation(commands[start].1);
        let mut end = start + 1;
        while end < commands.len() && command_group_variation(commands[end].1) == key {
            end += 1;
        }
        writer.write_command_statuses(key.0, key.1, &statuses[start..end]);
        start = end;
    }
}

fn dispatch(command: ControlCommand, index: u16, handler: &mut dyn CommandHandler, operate: bool) -> CommandStatus {
    match (command, operate) {
        (ControlCommand::Crob(crob), false) => handler.select_crob(crob, index),
        (ControlCommand::Crob(crob), true) => handler.operate_crob(crob, index),
        (ControlCommand::AnalogOutput(ao), false) => handler.select_analog_output(ao, index),
        (ControlCommand::AnalogOutput(ao), true) => handler.operate_analog_output(ao, index),
    }
}
