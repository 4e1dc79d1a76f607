// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! TCP header type and logic, for potentially truncated datagrams.

use crate::layers::{Header, ParsePayload};
use crate::parse::{LengthError, Parse, ParseError, ParseWith, Reader, Truncation};
use crate::tcp::{Tcp, TcpError};
use std::num::NonZero;

/// A truncated TCP header.
///
/// This truncated header is built from the start of a regular TCP header, down to the last byte of
/// the packet, but does not contain a full header. The only fields that are guaranteed to be
/// present are the source and destination ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TruncatedTcpHeader {
    source_port: u16,
    destination_port: u16,
}

impl TruncatedTcpHeader {
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

impl Parse for TruncatedTcpHeader {
    type Error = TcpError;

    fn parse(buf: &[u8]) -> Result<(Self, NonZero<usize>), ParseError<Self::Error>> {
        // RFC 792 (ICMP) says embedded packets in ICMP Error messages contain the IP header plus at
        // least the first 64 bits from the datagram, so the ports are always there.
        let Some(ports) = buf.first_chunk::<4>() else {
            return Err(ParseError::Length(LengthError {
                expected: TruncatedTcpHeader::MIN_HEADER_LEN,
                actual: buf.len(),
            }));
        };
        let parsed = Self {
            source_port: u16::from_be_bytes([ports[0], ports[1]]),
            destination_port: u16::from_be_bytes([ports[2], ports[3]]),
        };
        // the rest of the header is consumed along with the ports
        let consumed = NonZero::new(buf.len()).unwrap_or(TruncatedTcpHeader::MIN_HEADER_LEN);
        Ok((parsed, consumed))
    }
}

/// A TCP header, possibly truncated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TruncatedTcp {
    /// A full TCP header, whether payload is full or not
    FullHeader(Tcp),
    /// A truncated TCP header (< 20 bytes)
    PartialHeader(TruncatedTcpHeader),
}

impl TruncatedTcp {
    /// Get the source port
    #[must_use]
    pub const fn source(&self) -> u16 {
        match self {
            TruncatedTcp::FullHeader(tcp) => tcp.source(),
            TruncatedTcp::PartialHeader(tcp) => tcp.source(),
        }
    }

    /// Get the destination port
    #[must_use]
    pub const fn destination(&self) -> u16 {
        match self {
            TruncatedTcp::FullHeader(tcp) => tcp.destination(),
            TruncatedTcp::PartialHeader(tcp) => tcp.destination(),
        }
    }

    /// The full header, if it was not truncated.
    #[must_use]
    pub const fn full(&self) -> Option<&Tcp> {
        match self {
            TruncatedTcp::FullHeader(tcp) => Some(tcp),
            TruncatedTcp::PartialHeader(_) => None,
        }
    }
}

impl ParseWith for TruncatedTcp {
    type Error = TcpError;
    type Param = Truncation;

    fn parse_with(
        param: Truncation,
        raw: &[u8],
    ) -> Result<(Self, NonZero<usize>), ParseError<Self::Error>> {
        match (Tcp::parse(raw), param) {
            (Ok((tcp, consumed)), _) => Ok((TruncatedTcp::FullHeader(tcp), consumed)),
            // a short header may stand for a complete one in an ICMP error payload
            (Err(ParseError::Length(_)), Truncation::Allowed) => {
                let (header, consumed) = TruncatedTcpHeader::parse(raw)?;
                Ok((TruncatedTcp::PartialHeader(header), consumed))
            }
            (Err(e), _) => Err(e),
        }
    }
}

impl ParsePayload for TruncatedTcp {
    fn parse_payload<'buf>(&self, _: Truncation, _: &mut Reader<'buf>) -> Option<Header<'buf>> {
        None
    }
}
