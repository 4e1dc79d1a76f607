// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Address resolution protocol (IPv4 over ethernet only).

use crate::eth::mac::Mac;
use crate::layers::{Header, ParsePayload};
use crate::parse::{Parse, ParseError, Reader, Truncation, length_error};
use etherparse::err::arp::ArpEthIpv4FromError;
use etherparse::{ArpEthIpv4Packet, ArpPacket};
use std::net::Ipv4Addr;
use std::num::NonZero;

/// An ARP message resolving IPv4 addresses to ethernet [`Mac`]s.
///
/// This is a wrapper around etherparse's [`ArpEthIpv4Packet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arp(ArpEthIpv4Packet);

/// Errors which may occur when parsing an [`Arp`] message.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ArpError {
    /// Hardware type other than ethernet
    #[error("unsupported arp hardware type {0}")]
    HardwareType(u16),
    /// Protocol type other than IPv4
    #[error("unsupported arp protocol type {0:#06x}")]
    ProtocolType(u16),
    /// Hardware address length other than 6
    #[error("unsupported arp hardware address length {0}")]
    HardwareAddressLength(u8),
    /// Protocol address length other than 4
    #[error("unsupported arp protocol address length {0}")]
    ProtocolAddressLength(u8),
}

impl From<ArpEthIpv4FromError> for ArpError {
    fn from(value: ArpEthIpv4FromError) -> Self {
        match value {
            ArpEthIpv4FromError::NonMatchingHwType(hw) => ArpError::HardwareType(hw.0),
            ArpEthIpv4FromError::NonMatchingProtocolType(proto) => ArpError::ProtocolType(proto.0),
            ArpEthIpv4FromError::NonMatchingHwAddrSize(len) => ArpError::HardwareAddressLength(len),
            ArpEthIpv4FromError::NonMatchingProtoAddrSize(len) => {
                ArpError::ProtocolAddressLength(len)
            }
        }
    }
}

impl Arp {
    /// The length (in bytes) of an IPv4-over-ethernet [`Arp`] message
    pub const LEN: usize = ArpEthIpv4Packet::LEN;

    /// ARP request operation code
    pub const REQUEST: u16 = 1;
    /// ARP reply operation code
    pub const REPLY: u16 = 2;

    /// The operation code (request, reply, ...)
    #[must_use]
    pub const fn operation(&self) -> u16 {
        self.0.operation.0
    }

    /// Hardware address of the sender
    #[must_use]
    pub const fn sender_hardware(&self) -> Mac {
        Mac(self.0.sender_mac)
    }

    /// Protocol (IPv4) address of the sender
    #[must_use]
    pub const fn sender_protocol(&self) -> Ipv4Addr {
        self.0.sender_ipv4_addr()
    }

    /// Hardware address of the target (zero in requests)
    #[must_use]
    pub const fn target_hardware(&self) -> Mac {
        Mac(self.0.target_mac)
    }

    /// Protocol (IPv4) address of the target
    #[must_use]
    pub const fn target_protocol(&self) -> Ipv4Addr {
        self.0.target_ipv4_addr()
    }
}

impl Parse for Arp {
    type Error = ArpError;

    fn parse(buf: &[u8]) -> Result<(Self, NonZero<usize>), ParseError<Self::Error>> {
        let packet = ArpPacket::from_slice(buf)
            .map_err(|e| ParseError::Length(length_error(e.required_len, buf.len())))?;
        let consumed = NonZero::new(packet.packet_len())
            .ok_or_else(|| ParseError::Length(length_error(Arp::LEN, buf.len())))?;
        let inner = packet
            .try_eth_ipv4()
            .map_err(|e| ParseError::Invalid(e.into()))?;
        Ok((Arp(inner), consumed))
    }
}

impl ParsePayload for Arp {
    fn parse_payload<'buf>(&self, _: Truncation, _: &mut Reader<'buf>) -> Option<Header<'buf>> {
        None
    }
}

#[cfg(test)]
mod test {
    use super::{Arp, ArpError};
    use crate::eth::mac::Mac;
    use crate::parse::{Parse, ParseError};
    use std::net::Ipv4Addr;

    fn request() -> [u8; Arp::LEN] {
        [
            0x00, 0x01, 0x08, 0x00, 0x06, 0x04, 0x00, 0x01, // ethernet, ipv4, request
            0x02, 0x00, 0x00, 0x00, 0x00, 0x01, 10, 0, 0, 5, // sender
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 10, 0, 0, 1, // target
        ]
    }

    #[test]
    fn parse_request() {
        let (arp, consumed) = Arp::parse(&request()).unwrap();
        assert_eq!(consumed.get(), Arp::LEN);
        assert_eq!(arp.operation(), Arp::REQUEST);
        assert_eq!(arp.sender_hardware(), Mac([0x02, 0, 0, 0, 0, 1]));
        assert_eq!(arp.sender_protocol(), Ipv4Addr::new(10, 0, 0, 5));
        assert!(arp.target_hardware().is_zero());
        assert_eq!(arp.target_protocol(), Ipv4Addr::new(10, 0, 0, 1));
    }

    #[test]
    fn reject_other_address_families() {
        let mut bytes = request();
        bytes[3] = 0xdd;
        bytes[2] = 0x86;
        match Arp::parse(&bytes) {
            Err(ParseError::Invalid(e)) => assert_eq!(e, ArpError::ProtocolType(0x86dd)),
            other => unreachable!("{other:?}"),
        }
        let mut bytes = request();
        bytes[1] = 6;
        match Arp::parse(&bytes) {
            Err(ParseError::Invalid(e)) => assert_eq!(e, ArpError::HardwareType(6)),
            other => unreachable!("{other:?}"),
        }
        // ipv6 sized protocol addresses
        let mut bytes = [0u8; 8 + 2 * (6 + 16)];
        bytes[..8].copy_from_slice(&[0x00, 0x01, 0x08, 0x00, 6, 16, 0x00, 0x01]);
        match Arp::parse(&bytes) {
            Err(ParseError::Invalid(e)) => assert_eq!(e, ArpError::ProtocolAddressLength(16)),
            other => unreachable!("{other:?}"),
        }
    }

    #[test]
    fn trailing_bytes_are_not_consumed() {
        let mut bytes = request().to_vec();
        bytes.extend_from_slice(&[0u8; 18]);
        let (arp, consumed) = Arp::parse(&bytes).unwrap();
        assert_eq!(consumed.get(), Arp::LEN);
        assert_eq!(arp.operation(), Arp::REQUEST);
    }

    #[test]
    fn truncated_message() {
        let bytes = request();
        match Arp::parse(&bytes[..27]) {
            Err(ParseError::Length(e)) => {
                assert_eq!(e.expected().get(), Arp::LEN);
                assert_eq!(e.actual(), 27);
            }
            other => unreachable!("{other:?}"),
        }
    }
}
