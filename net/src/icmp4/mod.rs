// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! `ICMPv4` header type and logic.

use crate::layers::{Header, ParsePayload};
use crate::parse::{Parse, ParseError, Reader, Truncation, consumed, length_error};
use crate::protocol::Unsupported;
use etherparse::Icmpv4Header;
use std::convert::Infallible;
use std::num::NonZero;

/// An `ICMPv4` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Icmp4 {
    header: Icmpv4Header,
    icmp_type: u8,
    code: u8,
    rest_of_header: [u8; 4],
}

/// The two families of `ICMPv4` messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Icmp4Kind {
    /// Echo, timestamp, information and address mask requests and replies.
    ///
    /// These carry an identifier used to match replies to requests.
    Query,
    /// Destination unreachable, source quench, redirect, time exceeded and parameter problem.
    ///
    /// These carry the IP header and first bytes of the datagram which caused them.
    Error,
}

impl Icmp4 {
    /// The minimum length of an `ICMPv4` header
    pub const MIN_LEN: usize = 8;

    /// The message type
    #[must_use]
    pub const fn type_u8(&self) -> u8 {
        self.icmp_type
    }

    /// The message code
    #[must_use]
    pub const fn code_u8(&self) -> u8 {
        self.code
    }

    /// Classify the message as a query or an error.
    ///
    /// # Errors
    ///
    /// Returns [`Unsupported::Icmp4Type`] for types which are neither (e.g. router advertisement).
    pub fn kind(&self) -> Result<Icmp4Kind, Unsupported> {
        match self.type_u8() {
            0 | 8 | 13 | 14 | 15 | 16 | 17 | 18 => Ok(Icmp4Kind::Query),
            3 | 4 | 5 | 11 | 12 => Ok(Icmp4Kind::Error),
            other => Err(Unsupported::Icmp4Type(other)),
        }
    }

    /// The identifier of a query message (`None` for error messages).
    #[must_use]
    pub fn identifier(&self) -> Option<u16> {
        match self.kind() {
            Ok(Icmp4Kind::Query) => Some(u16::from_be_bytes([
                self.rest_of_header[0],
                self.rest_of_header[1],
            ])),
            Ok(Icmp4Kind::Error) | Err(_) => None,
        }
    }

    /// Length of the header in bytes (timestamp messages carry a longer header).
    #[must_use]
    pub fn header_len(&self) -> usize {
        self.header.header_len()
    }
}

impl Parse for Icmp4 {
    type Error = Infallible;

    fn parse(buf: &[u8]) -> Result<(Self, NonZero<usize>), ParseError<Self::Error>> {
        let (header, rest) = Icmpv4Header::from_slice(buf)
            .map_err(|e| ParseError::Length(length_error(e.required_len, buf.len())))?;
        let consumed = consumed(buf, rest)
            .ok_or_else(|| ParseError::Length(length_error(Icmp4::MIN_LEN, buf.len())))?;
        // raw type, code and rest of header, whatever the message type
        let Some([icmp_type, code, _, _, a, b, c, d]) = buf.first_chunk::<{ Icmp4::MIN_LEN }>()
        else {
            return Err(ParseError::Length(length_error(Icmp4::MIN_LEN, buf.len())));
        };
        let icmp = Icmp4 {
            header,
            icmp_type: *icmp_type,
            code: *code,
            rest_of_header: [*a, *b, *c, *d],
        };
        Ok((icmp, consumed))
    }
}

impl ParsePayload for Icmp4 {
    /// The embedded datagram of an error message is decoded by the packet descriptor, not here.
    fn parse_payload<'buf>(&self, _: Truncation, _: &mut Reader<'buf>) -> Option<Header<'buf>> {
        None
    }
}

#[cfg(test)]
mod test {
    use super::{Icmp4, Icmp4Kind};
    use crate::parse::Parse;
    use crate::protocol::Unsupported;
    use etherparse::{IcmpEchoHeader, Icmpv4Header, Icmpv4Type, icmpv4};

    #[test]
    fn echo_request_is_query() {
        let header = Icmpv4Header::new(Icmpv4Type::EchoRequest(IcmpEchoHeader {
            id: 0x1234,
            seq: 9,
        }));
        let (icmp, consumed) = Icmp4::parse(&header.to_bytes()).unwrap();
        assert_eq!(consumed.get(), Icmp4::MIN_LEN);
        assert_eq!(icmp.type_u8(), 8);
        assert_eq!(icmp.kind(), Ok(Icmp4Kind::Query));
        assert_eq!(icmp.identifier(), Some(0x1234));
    }

    #[test]
    fn timestamp_is_query() {
        let mut bytes = [0u8; 20];
        bytes[0] = 13;
        bytes[4..6].copy_from_slice(&[0xab, 0xcd]);
        let (icmp, _) = Icmp4::parse(&bytes).unwrap();
        assert_eq!(icmp.kind(), Ok(Icmp4Kind::Query));
        assert_eq!(icmp.identifier(), Some(0xabcd));
    }

    #[test]
    fn unreachable_is_error() {
        let header = Icmpv4Header::new(Icmpv4Type::DestinationUnreachable(
            icmpv4::DestUnreachableHeader::Port,
        ));
        let (icmp, _) = Icmp4::parse(&header.to_bytes()).unwrap();
        assert_eq!(icmp.type_u8(), 3);
        assert_eq!(icmp.code_u8(), 3);
        assert_eq!(icmp.kind(), Ok(Icmp4Kind::Error));
        assert_eq!(icmp.identifier(), None);
    }

    #[test]
    fn router_advertisement_is_unsupported() {
        let bytes = [9u8, 16, 0, 0, 1, 0, 0, 0];
        let (icmp, _) = Icmp4::parse(&bytes).unwrap();
        assert_eq!(icmp.type_u8(), 9);
        assert_eq!(icmp.code_u8(), 16);
        assert_eq!(icmp.kind(), Err(Unsupported::Icmp4Type(9)));
        assert_eq!(icmp.identifier(), None);
    }

    #[test]
    fn kind_and_identifier_agree() {
        bolero::check!().for_each(|buf: &[u8]| {
            if let Ok((icmp, consumed)) = Icmp4::parse(buf) {
                assert_eq!(consumed.get(), icmp.header_len());
                assert_eq!(icmp.type_u8(), buf[0]);
                assert_eq!(icmp.code_u8(), buf[1]);
                match icmp.kind() {
                    Ok(Icmp4Kind::Query) => {
                        assert_eq!(icmp.identifier(), Some(u16::from_be_bytes([buf[4], buf[5]])));
                    }
                    Ok(Icmp4Kind::Error) | Err(_) => assert_eq!(icmp.identifier(), None),
                }
            }
        });
    }
}
