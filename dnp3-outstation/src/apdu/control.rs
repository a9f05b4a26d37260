// Copyright (c) 2026 the dnp3-outstation authors. Licensed under Apache License, Version 2.0.

//! The two-bit-flag-plus-sequence application control field and the 4-bit
//! wrapping sequence number it carries.

/// A 4-bit application-layer sequence number, wrapping modulo 16.
///
/// Used both for `sol.seq`/`unsol.seq` (spec.md §3 "Sequence Info") and for
/// the select-table's recorded SEQ (spec.md §4.7 OPERATE: "must be
/// select.seq+1").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AppSeqNum(u8);

impl AppSeqNum {
    /// Wraps a raw nibble, masking to 4 bits.
    #[must_use]
    pub const fn new(value: u8) -> Self { Self(value & 0x0f) }

    /// The raw 4-bit value.
    #[must_use]
    pub const fn value(self) -> u8 { self.0 }

    /// Returns `self + 1 (mod 16)`.
    #[must_use]
    pub const fn next(self) -> Self { Self((self.0 + 1) & 0x0f) }

    /// Whether `self` is exactly one greater than `other`, mod 16 - the
    /// OPERATE-after-SELECT sequencing rule (spec.md §4.7).
    #[must_use]
    pub const fn is_successor_of(self, other: Self) -> bool { self.0 == other.next().0 }
}

/// The FIR/FIN/CON/UNS flags and 4-bit SEQ of an application control byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppControlField {
    /// First fragment of a multi-fragment message.
    pub fir: bool,
    /// Final fragment of a multi-fragment message.
    pub fin: bool,
    /// Confirmation requested.
    pub con: bool,
    /// Unsolicited response bit.
    pub uns: bool,
    /// 4-bit sequence number.
    pub seq: AppSeqNum,
}

impl AppControlField {
    /// Builds a control field from its components.
    #[must_use]
    pub const fn new(fir: bool, fin: bool, con: bool, uns: bool, seq: AppSeqNum) -> Self {
        Self { fir, fin, con, uns, seq }
    }

    /// A single-fragment, no-confirm, solicited control field with the
    /// given sequence number - the common case for non-READ responses and
    /// single-fragment READ responses.
    #[must_use]
    pub const fn single_fragment(seq: AppSeqNum) -> Self { Self::new(true, true, false, false, seq) }

    /// Decodes the control byte.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Self {
        Self {
            fir: byte & 0b1000_0000 != 0,
            fin: byte & 0b0100_0000 != 0,
            con: byte & 0b0010_0000 != 0,
            uns: byte & 0b0001_0000 != 0,
            seq: AppSeqNum::new(byte & 0x0f),
        }
    }

    /// Encodes back to the wire byte.
    #[must_use]
    pub const fn to_byte(self) -> u8 {
        (if self.fir { 0b1000_0000 } else { 0 })
            | (if self.fin { 0b0100_0000 } else { 0 })
            | (if self.con { 0b0010_0000 } else { 0 })
            | (if self.uns { 0b0001_0000 } else { 0 })
            | self.seq.value()
    }

    /// Whether this control field meets the request-acceptance gate
    /// (spec.md §3: "Only FIR=FIN=1 and CON=0 fragments are accepted as
    /// requests").
    #[must_use]
    pub const fn is_valid_request(self) -> bool { self.fir && self.fin && !self.con }
}
