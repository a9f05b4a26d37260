// Copyright (c) 2026 the dnp3-outstation authors. Licensed under Apache License, Version 2.0.

use crate::apdu::control::AppControlField;
use crate::apdu::function::FunctionCode;
use crate::error::FragmentError;

/// The two-byte application-layer request/response header: control field
/// followed by function code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApduHeader {
    /// FIR/FIN/CON/UNS flags and sequence number.
    pub control: AppControlField,
    /// Requested or responded-to function.
    pub function: FunctionCode,
}

impl ApduHeader {
    /// Builds a header from its two fields.
    #[must_use]
    pub const fn new(control: AppControlField, function: FunctionCode) -> Self { Self { control, function } }

    /// Parses the two-byte header from the front of a fragment, returning
    /// the header and the remaining object bytes.
    ///
    /// # Errors
    ///
    /// Returns [`FragmentError::HeaderTooShort`] if fewer than two bytes are
    /// available.
    pub fn parse(fragment: &[u8]) -> Result<(Self, &[u8]), FragmentError> {
        if fragment.len() < 2 {
            return Err(FragmentError::HeaderTooShort { len: fragment.len() });
        }
        let control = AppControlField::from_byte(fragment[0]);
        let function = FunctionCode::from_byte(fragment[1]);
        Ok((Self::new(control, function), &fragment[2..]))
    }

    /// Encodes the header's two bytes.
    #[must_use]
    pub const fn to_bytes(self) -> [u8; 2] { [self.control.to_byte(), self.function.to_byte()] }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apdu::control::AppSeqNum;

    #[test]
    fn parses_header_and_leaves_remainder() {
        let fragment = [0xC0u8, 0x01, 0xAA, 0xBB];
        let (header, rest) = ApduHeader::parse(&fragment).unwrap();
        assert_eq!(header.function, FunctionCode::Read);
        assert!(header.control.fir && header.control.fin);
        assert_eq!(rest, &[0xAA, 0xBB]);
    }

    #[test]
    fn rejects_short_fragment() {
        assert!(matches!(ApduHeader::parse(&[0xC0]), Err(FragmentError::HeaderTooShort { len: 1 })));
        assert!(matches!(ApduHeader::parse(&[]), Err(FragmentError::HeaderTooShort { len: 0 })));
    }

    #[test]
    fn round_trips_to_bytes() {
        let header = ApduHeader::new(AppControlField::single_fragment(AppSeqNum::new(7)), FunctionCode::Response);
        let bytes = header.to_bytes();
        let (decoded, _) = ApduHeader::parse(&bytes).unwrap();
        assert_eq!(decoded, header);
    }
}
