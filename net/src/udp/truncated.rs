// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! UDP header type and logic, for potentially truncated datagrams.

use crate::layers::{Header, ParsePayload};
use crate::parse::{LengthError, Parse, ParseError, ParseWith, Reader, Truncation};
use crate::udp::Udp;
use std::convert::Infallible;
use std::num::NonZero;

/// A truncated UDP header: the ports, without length and checksum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TruncatedUdpHeader {
    source_port: u16,
    destination_port: u16,
}

impl TruncatedUdpHeader {
    #[allow(clippy::unwrap_used)] // const-eval and trivially safe
    const MIN_HEADER_LEN: NonZero<usize> = NonZero::new(4).unwrap();

    /// Get the source port
    #[must_use]
    pub const fn source(&self) -> u16 {
        self.source_port
    }

    /// Get the destination port
    #[must_use]
    pub const fn destination(&self) -> u16 {
        self.destination_port
    }
}

impl Parse for TruncatedUdpHeader {
    type Error = Infallible;

    fn parse(buf: &[u8]) -> Result<(Self, NonZero<usize>), ParseError<Self::Error>> {
        let Some(ports) = buf.first_chunk::<4>() else {
            return Err(ParseError::Length(LengthError {
                expected: TruncatedUdpHeader::MIN_HEADER_LEN,
                actual: buf.len(),
            }));
        };
        let parsed = Self {
            source_port: u16::from_be_bytes([ports[0], ports[1]]),
            destination_port: u16::from_be_bytes([ports[2], ports[3]]),
        };
        let consumed = NonZero::new(buf.len()).unwrap_or(TruncatedUdpHeader::MIN_HEADER_LEN);
        Ok((parsed, consumed))
    }
}

/// A UDP header, possibly truncated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TruncatedUdp {
    /// A full UDP header, whether payload is full or not
    FullHeader(Udp),
    /// A truncated UDP header (< 8 bytes)
    PartialHeader(TruncatedUdpHeader),
}

impl TruncatedUdp {
    /// Get the source port
    #[must_use]
    pub const fn source(&self) -> u16 {
        match self {
            TruncatedUdp::FullHeader(udp) => udp.source(),
            TruncatedUdp::PartialHeader(udp) => udp.source(),
        }
    }

    /// Get the destination port
    #[must_use]
    pub const fn destination(&self) -> u16 {
        match self {
            TruncatedUdp::FullHeader(udp) => udp.destination(),
            TruncatedUdp::PartialHeader(udp) => udp.destination(),
        }
    }

    /// The full header, if it was not truncated.
    #[must_use]
    pub const fn full(&self) -> Option<&Udp> {
        match self {
            TruncatedUdp::FullHeader(udp) => Some(udp),
            TruncatedUdp::PartialHeader(_) => None,
        }
    }
}

impl ParseWith for TruncatedUdp {
    type Error = Infallible;
    type Param = Truncation;

    fn parse_with(
        param: Truncation,
        raw: &[u8],
    ) -> Result<(Self, NonZero<usize>), ParseError<Self::Error>> {
        match (Udp::parse(raw), param) {
            (Ok((udp, consumed)), _) => Ok((TruncatedUdp::FullHeader(udp), consumed)),
            (Err(ParseError::Length(_)), Truncation::Allowed) => {
                let (header, consumed) = TruncatedUdpHeader::parse(raw)?;
                Ok((TruncatedUdp::PartialHeader(header), consumed))
            }
            (Err(e), _) => Err(e),
        }
    }
}

impl ParsePayload for TruncatedUdp {
    fn parse_payload<'buf>(&self, _: Truncation, _: &mut Reader<'buf>) -> Option<Header<'buf>> {
        None
    }
}

#[cfg(test)]
mod test {
    use super::TruncatedUdp;
    use crate::parse::{ParseError, ParseWith, Truncation};

    #[test]
    fn partial_header_only_when_allowed() {
        let bytes = [0x13, 0x88, 0x00, 0x35, 0x00];
        let (udp, consumed) = TruncatedUdp::parse_with(Truncation::Allowed, &bytes).unwrap();
        assert_eq!(consumed.get(), 5);
        assert!(udp.full().is_none());
        assert_eq!(udp.source(), 5000);
        assert_eq!(udp.destination(), 53);
        assert!(matches!(
            TruncatedUdp::parse_with(Truncation::Forbidden, &bytes),
            Err(ParseError::Length(_))
        ));
    }

    #[test]
    fn full_header() {
        let bytes = [0x13, 0x88, 0x00, 0x35, 0x00, 0x08, 0x00, 0x00];
        let (udp, consumed) = TruncatedUdp::parse_with(Truncation::Forbidden, &bytes).unwrap();
        assert_eq!(consumed.get(), 8);
        assert_eq!(udp.full().map(super::Udp::length), Some(8));
    }
}
