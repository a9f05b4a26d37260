// Copyright (c) 2026 the dnp3-outstation authors. Licensed under Apache License, Version 2.0.

//! Internal Indications (IIN) - the 16 status bits returned with every
//! response. See [`IinField`] and [`IinBit`].

/// One of the 16 named IIN bits, split across two octets on the wire
/// (IIN1 = low byte, IIN2 = high byte in this enum's bit numbering below).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum IinBit {
    /// IIN1.0 - at least one class 1 event is present and unreported.
    Class1Events = 1 << 0,
    /// IIN1.1 - at least one class 2 event is present and unreported.
    Class2Events = 1 << 1,
    /// IIN1.2 - at least one class 3 event is present and unreported.
    Class3Events = 1 << 2,
    /// IIN1.3 - time synchronization required.
    NeedTime = 1 << 3,
    /// IIN1.4 - outstation requires local operator action (not modeled;
    /// carried for completeness of the wire representation).
    LocalControl = 1 << 4,
    /// IIN1.5 - outstation has restarted since the last bit clear.
    DeviceRestart = 1 << 5,
    /// IIN1.6 - the outstation does not support the requested function.
    FuncNotSupported = 1 << 6,
    /// IIN1.7 - an object in the request was not parseable into a known
    /// qualifier/range/object combination.
    ObjectUnknown = 1 << 7,
    /// IIN2.0 - malformed request or unsupported qualifier/range.
    ParamError = 1 << 8,
    /// IIN2.1 - outstation is busy with a higher priority task.
    EventBufferOverflow = 1 << 9,
    /// IIN2.2 - the requested operation is already executing.
    AlreadyExecuting = 1 << 10,
    /// IIN2.3 - cold or warm restart unsupported by configuration.
    ConfigCorrupt = 1 << 11,
    /// IIN2.6 - reserved bit, carried for completeness.
    Reserved2_6 = 1 << 14,
    /// IIN2.7 - reserved bit whose clearing via WRITE is discussed in
    /// spec.md Design Notes Open Question (ii).
    Reserved2_7 = 1 << 15,
}

/// The bitfield of [`IinBit`]s returned with every response.
///
/// `staticIIN` in [`crate::context::OutstationContext`] persists across
/// responses until explicitly cleared; the dynamic portion (class-event
/// presence, overflow) is recomputed on every response per spec.md §4.8.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IinField(u16);

impl IinField {
    /// The empty field - no bits set.
    #[must_use]
    pub const fn empty() -> Self { Self(0) }

    /// A field with a single bit already set.
    #[must_use]
    pub const fn with(bit: IinBit) -> Self { Self(bit as u16) }

    /// Sets `bit`.
    pub fn set(&mut self, bit: IinBit) { self.0 |= bit as u16; }

    /// Clears `bit`.
    pub fn clear(&mut self, bit: IinBit) { self.0 &= !(bit as u16); }

    /// Returns whether `bit` is set.
    #[must_use]
    pub const fn is_set(self, bit: IinBit) -> bool { (self.0 & bit as u16) != 0 }

    /// Bitwise union of two fields.
    #[must_use]
    pub const fn union(self, other: Self) -> Self { Self(self.0 | other.0) }

    /// Raw 16-bit wire value, IIN1 in the low byte, IIN2 in the high byte.
    #[must_use]
    pub const fn to_u16(self) -> u16 { self.0 }
}

impl std::ops::BitOr for IinField {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self { self.union(rhs) }
}

impl std::ops::BitOrAssign for IinField {
    fn bitor_assign(&mut self, rhs: Self) { self.0 |= rhs.0; }
}

impl From<IinBit> for IinField {
    fn from(bit: IinBit) -> Self { Self::with(bit) }
}
