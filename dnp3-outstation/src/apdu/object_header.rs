// Copyright (c) 2026 the dnp3-outstation authors. Licensed under Apache License, Version 2.0.

//! A minimal, zero-copy cursor over DNP3 object headers.
//!
//! Full object *payload* encoding/decoding for the point database is an
//! external collaborator's job per spec.md §6 ("bit-level APDU
//! parsing/building ... is an external collaborator"); this cursor decodes
//! only the wire grammar every handler needs to route a request: group,
//! variation, qualifier code, and the index/count range that qualifier
//! implies. Handlers for control objects (SELECT/OPERATE/DIRECT_OPERATE)
//! additionally decode fixed-size CROB/analog-output payloads themselves
//! (`super::control_object`) since those six control classes are named
//! operations of this crate, not database internals.

use crate::error::FragmentError;

/// How a qualifier code expresses which points a header addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectRange {
    /// Start/stop index range, inclusive (qualifiers `0x00`/`0x01`).
    StartStop {
        /// First index, inclusive.
        start: u16,
        /// Last index, inclusive.
        stop: u16,
    },
    /// `count` objects follow, each carrying its own index prefix
    /// (qualifiers `0x17`/`0x28` - used by command objects).
    CountWithPrefix {
        /// Number of objects.
        count: u16,
        /// Width of each object's index prefix, in bytes (1 or 2).
        prefix_size: u8,
    },
    /// `count` objects follow with no index prefix, indices implied by
    /// context (qualifiers `0x07`/`0x08`).
    Count {
        /// Number of objects.
        count: u16,
    },
    /// No range information - qualifier `0x06`, "all objects of this
    /// group/variation" (used by class-0/class-N read requests).
    AllObjects,
}

/// One decoded object header plus the raw bytes following it up to (but not
/// including) the next header - the handler is responsible for consuming
/// however many of those bytes its range/count implies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectHeader<'a> {
    /// DNP3 object group.
    pub group: u8,
    /// DNP3 object variation. `0` for qualifier `0x06` requests that name
    /// no specific variation (e.g. "Class 0 data").
    pub variation: u8,
    /// Raw qualifier byte, preserved for error messages.
    pub qualifier_byte: u8,
    /// Decoded range.
    pub range: ObjectRange,
    /// Bytes immediately following the header/range, not yet consumed.
    pub remainder: &'a [u8],
}

/// Walks consecutive object headers in a request's object buffer.
///
/// Each call to [`ObjectHeaderCursor::next_header`] returns the header at
/// the current position; the caller (a function handler) advances the
/// cursor past that header's payload with [`ObjectHeaderCursor::advance`]
/// once it knows how many bytes the payload occupied - the cursor itself
/// has no per-group size table, matching the "handlers own their own
/// object decoding" split described above.
#[derive(Debug, Clone, Copy)]
pub struct ObjectHeaderCursor<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> ObjectHeaderCursor<'a> {
    /// Starts a cursor over `buf` (everything after the two-byte request
    /// header).
    #[must_use]
    pub const fn new(buf: &'a [u8]) -> Self { Self { buf, offset: 0 } }

    /// Whether every byte has been consumed.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.offset >= self.buf.len() }

    /// Decodes the header at the current offset without consuming the
    /// range/payload bytes that follow it - call [`Self::advance`]
    /// afterward with however many payload bytes were consumed.
    pub fn next_header(&self) -> Result<ObjectHeader<'a>, FragmentError> {
        let tail = &self.buf[self.offset..];
        if tail.len() < 3 {
            return Err(FragmentError::ObjectHeaderTruncated { offset: self.offset });
        }
        let group = tail[0];
        let variation = tail[1];
        let qualifier_byte = tail[2];
        let mut cursor = 3usize;

        let range = match qualifier_byte {
            0x00 => {
                let (start, stop) = read_u8_pair(tail, &mut cursor, self.offset)?;
                ObjectRange::StartStop { start: u16::from(start), stop: u16::from(stop) }
            }
            0x01 => {
                let (start, stop) = read_u16_pair(tail, &mut cursor, self.offset)?;
                ObjectRange::StartStop { start, stop }
            }
            0x06 => ObjectRange::AllObjects,
            0x07 => {
                let count = read_u8(tail, &mut cursor, self.offset)?;
                ObjectRange::Count { count: u16::from(count) }
            }
            0x08 => {
                let count = read_u16(tail, &mut cursor, self.offset)?;
                ObjectRange::Count { count }
            }
            0x17 => {
                let count = read_u8(tail, &mut cursor, self.offset)?;
                ObjectRange::CountWithPrefix { count: u16::from(count), prefix_size: 1 }
            }
            0x28 => {
                let count = read_u16(tail, &mut cursor, self.offset)?;
                ObjectRange::CountWithPrefix { count, prefix_size: 2 }
            }
            other => {
                return Err(FragmentError::UnsupportedQualifier { qualifier: other, group, variation });
            }
        };

        Ok(ObjectHeader {
            group,
            variation,
            qualifier_byte,
            range,
            remainder: &tail[cursor..],
        })
    }

    /// Advances the cursor past the current header's 3-byte prefix, its
    /// range-encoding bytes, and `payload_len` bytes of object payload.
    pub fn advance(&mut self, header: &ObjectHeader<'a>, payload_len: usize) -> Result<(), FragmentError> {
        let range_bytes = self.buf.len() - self.offset - 3 - header.remainder.len();
        self.offset += 3 + range_bytes + payload_len;
        if self.offset > self.buf.len() {
            return Err(FragmentError::ObjectHeaderTruncated { offset: self.offset });
        }
        Ok(())
    }
}

fn read_u8(buf: &[u8], cursor: &mut usize, base_offset: usize) -> Result<u8, FragmentError> {
    let value = *buf.get(*cursor).ok_or(FragmentError::ObjectHeaderTruncated { offset: base_offset + *cursor })?;
    *cursor += 1;
    Ok(value)
}

fn read_u16(buf: &[u8], cursor: &mut usize, base_offset: usize) -> Result<u16, FragmentError> {
    let bytes = buf
        .get(*cursor..*cursor + 2)
        .ok_or(FragmentError::ObjectHeaderTruncated { offset: base_offset + *cursor })?;
    *cursor += 2;
    Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
}

fn read_u8_pair(buf: &[u8], cursor: &mut usize, base_offset: usize) -> Result<(u8, u8), FragmentError> {
    let a = read_u8(buf, cursor, base_offset)?;
    let b = read_u8(buf, cursor, base_offset)?;
    Ok((a, b))
}

fn read_u16_pair(buf: &[u8], cursor: &mut usize, base_offset: usize) -> Result<(u16, u16), FragmentError> {
    let a = read_u16(buf, cursor, base_offset)?;
    let b = read_u16(buf, cursor, base_offset)?;
    Ok((a, b))
}

impl ObjectRange {
    /// Number of indices/objects this range addresses, where known. `None`
    /// for [`ObjectRange::AllObjects`], whose count depends on the
    /// database's current point count.
    #[must_use]
    pub const fn len(self) -> Option<u32> {
        match self {
            Self::StartStop { start, stop } if stop >= start => Some((stop - start) as u32 + 1),
            Self::StartStop { .. } => Some(0),
            Self::CountWithPrefix { count, .. } | Self::Count { count } => Some(count as u32),
            Self::AllObjects => None,
        }
    }
}
