// Copyright (c) 2026 the dnp3-outstation authors. Licensed under Apache License, Version 2.0.

use strum_macros::{Display, EnumIter};

/// DNP3 application-layer function codes relevant to an outstation.
///
/// Only the codes an outstation must act on are modeled; master-only codes
/// (e.g. `INITIALIZE_DATA`, `FREEZE*` master-side variants) are out of
/// scope per spec.md §1 Non-goals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum FunctionCode {
    /// 0x01
    Read,
    /// 0x02
    Write,
    /// 0x03
    Select,
    /// 0x04
    Operate,
    /// 0x05
    DirectOperate,
    /// 0x06 - direct operate, no response requested.
    DirectOperateNoAck,
    /// 0x0d
    ColdRestart,
    /// 0x0e
    WarmRestart,
    /// 0x17
    AssignClass,
    /// 0x18
    DelayMeasure,
    /// 0x14
    EnableUnsolicited,
    /// 0x15
    DisableUnsolicited,
    /// 0x81 on the wire, but outstations only ever send this - kept for
    /// completeness/round-trip symmetry, never produced by the request
    /// parser.
    Response,
    /// 0x82
    UnsolicitedResponse,
    /// 0x00
    Confirm,
    /// Anything this outstation does not recognize; handlers respond with
    /// `IinBit::FuncNotSupported`.
    Unknown(u8),
}

impl FunctionCode {
    /// Decodes a raw function-code byte.
    #[must_use]
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0x00 => Self::Confirm,
            0x01 => Self::Read,
            0x02 => Self::Write,
            0x03 => Self::Select,
            0x04 => Self::Operate,
            0x05 => Self::DirectOperate,
            0x06 => Self::DirectOperateNoAck,
            0x0d => Self::ColdRestart,
            0x0e => Self::WarmRestart,
            0x14 => Self::EnableUnsolicited,
            0x15 => Self::DisableUnsolicited,
            0x17 => Self::AssignClass,
            0x18 => Self::DelayMeasure,
            0x81 => Self::Response,
            0x82 => Self::UnsolicitedResponse,
            other => Self::Unknown(other),
        }
    }

    /// Encodes back to the wire byte.
    #[must_use]
    pub fn to_byte(self) -> u8 {
        match self {
            Self::Confirm => 0x00,
            Self::Read => 0x01,
            Self::Write => 0x02,
            Self::Select => 0x03,
            Self::Operate => 0x04,
            Self::DirectOperate => 0x05,
            Self::DirectOperateNoAck => 0x06,
            Self::ColdRestart => 0x0d,
            Self::WarmRestart => 0x0e,
            Self::EnableUnsolicited => 0x14,
            Self::DisableUnsolicited => 0x15,
            Self::AssignClass => 0x17,
            Self::DelayMeasure => 0x18,
            Self::Response => 0x81,
            Self::UnsolicitedResponse => 0x82,
            Self::Unknown(byte) => byte,
        }
    }

    /// Whether this is a "no ack" function code - the only kind processed
    /// while the outstation is mid-transmit (spec.md §4.5 step 3).
    #[must_use]
    pub const fn is_no_ack(self) -> bool { matches!(self, Self::DirectOperateNoAck) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_known_code() {
        for code in [
            FunctionCode::Confirm,
            FunctionCode::Read,
            FunctionCode::Write,
            FunctionCode::Select,
            FunctionCode::Operate,
            FunctionCode::DirectOperate,
            FunctionCode::DirectOperateNoAck,
            FunctionCode::ColdRestart,
            FunctionCode::WarmRestart,
            FunctionCode::EnableUnsolicited,
            FunctionCode::DisableUnsolicited,
            FunctionCode::AssignClass,
            FunctionCode::DelayMeasure,
            FunctionCode::Response,
            FunctionCode::UnsolicitedResponse,
        ] {
            assert_eq!(FunctionCode::from_byte(code.to_byte()), code);
        }
    }

    #[test]
    fn unknown_byte_round_trips() {
        assert_eq!(FunctionCode::from_byte(0x7f).to_byte(), 0x7f);
    }

    #[test]
    fn only_direct_operate_no_ack_is_no_ack() {
        assert!(FunctionCode::DirectOperateNoAck.is_no_ack());
        assert!(!FunctionCode::DirectOperate.is_no_ack());
        assert!(!FunctionCode::Read.is_no_ack());
    }
}
