// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! IPv6 header and fragment extension header

use crate::layers::{Header, ParsePayload, parse_transport};
use crate::parse::{Parse, ParseError, Reader, Truncation, consumed, length_error};
use etherparse::err::ipv6::{HeaderError, HeaderSliceError};
use etherparse::{IpNumber, Ipv6FragmentHeader, Ipv6Header};
use std::convert::Infallible;
use std::net::Ipv6Addr;
use std::num::NonZero;
use tracing::debug;

/// An IPv6 header
#[repr(transparent)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ipv6(pub(crate) Ipv6Header);

/// Errors which may occur when parsing an [`Ipv6`] header.
#[derive(Debug, thiserror::Error)]
pub enum Ipv6Error {
    /// The header's content is illegal (wrong version)
    #[error(transparent)]
    Invalid(HeaderError),
}

impl Ipv6 {
    /// The length of the fixed IPv6 header
    pub const HEADER_LEN: usize = 40;

    /// Get the source ip address of the header
    #[must_use]
    pub fn source(&self) -> Ipv6Addr {
        Ipv6Addr::from(self.0.source)
    }

    /// Get the destination ip address of the header
    #[must_use]
    pub fn destination(&self) -> Ipv6Addr {
        Ipv6Addr::from(self.0.destination)
    }

    /// Get the protocol of the header which immediately follows this one.
    #[must_use]
    pub fn next_header(&self) -> IpNumber {
        self.0.next_header
    }

    /// The number of routing hops the packet is allowed to take.
    #[must_use]
    pub fn hop_limit(&self) -> u8 {
        self.0.hop_limit
    }

    /// Value of the payload length field (extension headers included).
    #[must_use]
    pub fn payload_length(&self) -> u16 {
        self.0.payload_length
    }

    /// Returns true if a fragment extension header follows this header.
    #[must_use]
    pub fn is_fragment(&self) -> bool {
        self.next_header() == IpNumber::IPV6_FRAGMENTATION_HEADER
    }
}

impl Parse for Ipv6 {
    type Error = Ipv6Error;

    fn parse(buf: &[u8]) -> Result<(Self, NonZero<usize>), ParseError<Self::Error>> {
        let (header, rest) = Ipv6Header::from_slice(buf).map_err(|e| match e {
            HeaderSliceError::Len(len) => {
                ParseError::Length(length_error(len.required_len, buf.len()))
            }
            HeaderSliceError::Content(content) => ParseError::Invalid(Ipv6Error::Invalid(content)),
        })?;
        let consumed = consumed(buf, rest)
            .ok_or_else(|| ParseError::Length(length_error(Ipv6::HEADER_LEN, buf.len())))?;
        Ok((Self(header), consumed))
    }
}

impl ParsePayload for Ipv6 {
    fn parse_payload<'buf>(
        &self,
        mode: Truncation,
        cursor: &mut Reader<'buf>,
    ) -> Option<Header<'buf>> {
        if self.is_fragment() {
            return cursor
                .parse::<Ipv6Fragment>()
                .map_err(|e| {
                    debug!("failed to parse ipv6 fragment header: {e:?}");
                })
                .map(|(fragment, _)| Header::Ipv6Fragment(fragment))
                .ok();
        }
        parse_transport(self.next_header(), mode, cursor)
    }
}

/// An IPv6 fragment extension header
#[repr(transparent)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ipv6Fragment(pub(crate) Ipv6FragmentHeader);

impl Ipv6Fragment {
    /// The length of a fragment extension header
    pub const HEADER_LEN: usize = 8;

    /// Get the protocol carried by the fragmented datagram.
    #[must_use]
    pub fn next_header(&self) -> IpNumber {
        self.0.next_header
    }

    /// Offset of this fragment's payload within the original datagram, in units of 8 bytes.
    #[must_use]
    pub fn fragment_offset(&self) -> u16 {
        self.0.fragment_offset.value()
    }

    /// Returns true if the "more-fragments" bit is set in this header.
    #[must_use]
    pub fn more_fragments(&self) -> bool {
        self.0.more_fragments
    }

    /// Identification shared by all fragments of the original datagram.
    #[must_use]
    pub fn identification(&self) -> u32 {
        self.0.identification
    }
}

impl Parse for Ipv6Fragment {
    type Error = Infallible;

    fn parse(buf: &[u8]) -> Result<(Self, NonZero<usize>), ParseError<Self::Error>> {
        let (header, rest) = Ipv6FragmentHeader::from_slice(buf)
            .map_err(|e| ParseError::Length(length_error(e.required_len, buf.len())))?;
        let consumed = consumed(buf, rest).ok_or_else(|| {
            ParseError::Length(length_error(Ipv6Fragment::HEADER_LEN, buf.len()))
        })?;
        Ok((Self(header), consumed))
    }
}

impl ParsePayload for Ipv6Fragment {
    fn parse_payload<'buf>(
        &self,
        mode: Truncation,
        cursor: &mut Reader<'buf>,
    ) -> Option<Header<'buf>> {
        if self.fragment_offset() != 0 {
            return Some(Header::Fragment(cursor.rest()));
        }
        parse_transport(self.next_header(), mode, cursor)
    }
}

#[cfg(test)]
mod test {
    use super::{Ipv6, Ipv6Error, Ipv6Fragment};
    use crate::parse::{Parse, ParseError};
    use etherparse::err::ipv6::HeaderError;
    use etherparse::{IpFragOffset, IpNumber, Ipv6FragmentHeader, Ipv6Header};
    use std::net::Ipv6Addr;

    fn header() -> Ipv6Header {
        Ipv6Header {
            payload_length: 8,
            next_header: IpNumber::UDP,
            hop_limit: 17,
            source: Ipv6Addr::new(0xfd00, 0, 0, 0, 0, 0, 0, 5).octets(),
            destination: Ipv6Addr::new(0xfd00, 0, 0, 0, 0, 0, 0, 1).octets(),
            ..Default::default()
        }
    }

    #[test]
    fn parse_reads_fields() {
        let bytes = header().to_bytes();
        let (ipv6, consumed) = Ipv6::parse(&bytes).unwrap();
        assert_eq!(consumed.get(), Ipv6::HEADER_LEN);
        assert_eq!(ipv6.source(), Ipv6Addr::new(0xfd00, 0, 0, 0, 0, 0, 0, 5));
        assert_eq!(ipv6.destination(), Ipv6Addr::new(0xfd00, 0, 0, 0, 0, 0, 0, 1));
        assert_eq!(ipv6.hop_limit(), 17);
        assert_eq!(ipv6.payload_length(), 8);
        assert!(!ipv6.is_fragment());
    }

    #[test]
    fn version_four_is_reported() {
        let mut bytes = header().to_bytes();
        bytes[0] = 0x40;
        match Ipv6::parse(&bytes) {
            Err(ParseError::Invalid(Ipv6Error::Invalid(HeaderError::UnexpectedVersion {
                version_number,
            }))) => assert_eq!(version_number, 4),
            other => unreachable!("{other:?}"),
        }
    }

    #[test]
    fn parse_fragment_header() {
        let fragment = Ipv6FragmentHeader::new(
            IpNumber::TCP,
            IpFragOffset::try_new(7).unwrap(),
            true,
            0xdead_beef,
        );
        let (parsed, consumed) = Ipv6Fragment::parse(&fragment.to_bytes()).unwrap();
        assert_eq!(consumed.get(), Ipv6Fragment::HEADER_LEN);
        assert_eq!(parsed.next_header(), IpNumber::TCP);
        assert_eq!(parsed.fragment_offset(), 7);
        assert!(parsed.more_fragments());
        assert_eq!(parsed.identification(), 0xdead_beef);
    }

    #[test]
    fn parse_arbitrary_bytes() {
        bolero::check!().for_each(|buf: &[u8]| {
            if let Ok((_, consumed)) = Ipv6::parse(buf) {
                assert_eq!(consumed.get(), Ipv6::HEADER_LEN);
            }
            match Ipv6Fragment::parse(buf) {
                Ok((_, consumed)) => assert_eq!(consumed.get(), Ipv6Fragment::HEADER_LEN),
                Err(ParseError::Length(e)) => assert!(e.actual() < Ipv6Fragment::HEADER_LEN),
                Err(ParseError::Invalid(e)) => unreachable!("{e:?}"),
            }
        });
    }
}
