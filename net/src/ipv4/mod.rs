// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! IPv4 header type and logic

use crate::layers::{Header, ParsePayload, parse_transport};
use crate::parse::{Parse, ParseError, Reader, Truncation, consumed, length_error};
use etherparse::err::ipv4::{HeaderError, HeaderSliceError};
use etherparse::{IpNumber, Ipv4Header};
use std::net::Ipv4Addr;
use std::num::NonZero;

/// An IPv4 header
#[repr(transparent)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ipv4(pub(crate) Ipv4Header);

/// Errors which may occur when parsing an [`Ipv4`] header.
#[derive(Debug, thiserror::Error)]
pub enum Ipv4Error {
    /// The header's content is illegal (wrong version, IHL too small)
    #[error(transparent)]
    Invalid(HeaderError),
}

impl Ipv4 {
    /// The minimum length of an IPv4 header (i.e., a header with no options)
    pub const MIN_LEN: usize = 20;

    /// Get the source ip address of the header
    #[must_use]
    pub fn source(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.0.source)
    }

    /// Get the destination ip address of the header
    #[must_use]
    pub fn destination(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.0.destination)
    }

    /// Get the next layer protocol which follows this header.
    #[must_use]
    pub fn protocol(&self) -> IpNumber {
        self.0.protocol
    }

    /// Length of the header (includes options) in bytes.
    #[must_use]
    pub fn header_len(&self) -> usize {
        self.0.header_len()
    }

    /// Value of total length ip header field
    #[must_use]
    pub fn total_len(&self) -> u16 {
        self.0.total_len
    }

    /// Number of payload bytes announced by the header (total length minus header length).
    ///
    /// Zero when the total length is unset, as with segmentation offload.
    #[must_use]
    pub fn payload_len(&self) -> usize {
        usize::from(self.0.total_len).saturating_sub(self.header_len())
    }

    /// The number of routing hops the packet is allowed to take.
    #[must_use]
    pub fn ttl(&self) -> u8 {
        self.0.time_to_live
    }

    /// Return the headers "identification".
    /// See [IP fragmentation]
    ///
    /// [IP Fragmentation]: https://en.wikipedia.org/wiki/IP_fragmentation
    #[must_use]
    pub fn identification(&self) -> u16 {
        self.0.identification
    }

    /// Returns true if the "more-fragments" bit is set in this header.
    #[must_use]
    pub fn more_fragments(&self) -> bool {
        self.0.more_fragments
    }

    /// Offset of this fragment's payload within the original datagram, in units of 8 bytes.
    #[must_use]
    pub fn fragment_offset(&self) -> u16 {
        self.0.fragment_offset.value()
    }

    /// Returns true if this datagram is one piece of a fragmented datagram.
    #[must_use]
    pub fn is_fragment(&self) -> bool {
        self.more_fragments() || self.fragment_offset() != 0
    }
}

impl Parse for Ipv4 {
    type Error = Ipv4Error;

    fn parse(buf: &[u8]) -> Result<(Self, NonZero<usize>), ParseError<Self::Error>> {
        let (header, rest) = Ipv4Header::from_slice(buf).map_err(|e| match e {
            HeaderSliceError::Len(len) => {
                ParseError::Length(length_error(len.required_len, buf.len()))
            }
            HeaderSliceError::Content(content) => ParseError::Invalid(Ipv4Error::Invalid(content)),
        })?;
        let consumed = consumed(buf, rest)
            .ok_or_else(|| ParseError::Length(length_error(Ipv4::MIN_LEN, buf.len())))?;
        Ok((Self(header), consumed))
    }
}

impl ParsePayload for Ipv4 {
    fn parse_payload<'buf>(
        &self,
        mode: Truncation,
        cursor: &mut Reader<'buf>,
    ) -> Option<Header<'buf>> {
        if self.fragment_offset() != 0 {
            return Some(Header::Fragment(cursor.rest()));
        }
        parse_transport(self.protocol(), mode, cursor)
    }
}
