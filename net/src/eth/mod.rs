// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Ethernet types

pub mod ethtype;
pub mod mac;

use crate::arp::Arp;
use crate::eth::ethtype::EthType;
use crate::eth::mac::Mac;
use crate::ipv4::Ipv4;
use crate::ipv6::Ipv6;
use crate::layer::LayerType;
use crate::layers::{Header, ParsePayload};
use crate::parse::{Parse, ParseError, Reader, Truncation, consumed, length_error};
use crate::protocol::{Unsupported, classify_link_ethertype};
use etherparse::Ethernet2Header;
use std::convert::Infallible;
use std::num::NonZero;
use tracing::{debug, trace};

/// An ethernet header.
///
/// Unlike a header built for transmission, a parsed header may carry any source or destination
/// [`Mac`]; captured traffic is described as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eth(Ethernet2Header);

impl Eth {
    /// The length (in bytes) of an [`Eth`] header
    pub const HEADER_LEN: usize = 14;

    /// Get the source [Mac] of the header.
    #[must_use]
    pub fn source(&self) -> Mac {
        Mac(self.0.source)
    }

    /// Get the destination [Mac] of the header.
    #[must_use]
    pub fn destination(&self) -> Mac {
        Mac(self.0.destination)
    }

    /// Get the ethertype of the header.
    #[must_use]
    pub fn ether_type(&self) -> EthType {
        EthType(self.0.ether_type)
    }

    /// The network layer announced by the ethertype.
    ///
    /// # Errors
    ///
    /// Returns [`Unsupported::EtherType`] if the ethertype is not IPv4, IPv6 or ARP.
    pub fn next_layer(&self) -> Result<LayerType, Unsupported> {
        classify_link_ethertype(self.ether_type())
    }
}

impl Parse for Eth {
    type Error = Infallible;

    fn parse(buf: &[u8]) -> Result<(Self, NonZero<usize>), ParseError<Self::Error>> {
        let (inner, rest) = Ethernet2Header::from_slice(buf)
            .map_err(|e| ParseError::Length(length_error(e.required_len, buf.len())))?;
        let consumed = consumed(buf, rest)
            .ok_or_else(|| ParseError::Length(length_error(Eth::HEADER_LEN, buf.len())))?;
        Ok((Self(inner), consumed))
    }
}

impl ParsePayload for Eth {
    fn parse_payload<'buf>(
        &self,
        _: Truncation,
        cursor: &mut Reader<'buf>,
    ) -> Option<Header<'buf>> {
        match self.next_layer() {
            Ok(LayerType::Ipv4) => cursor
                .parse::<Ipv4>()
                .map_err(|e| {
                    debug!("failed to parse ipv4: {e:?}");
                })
                .map(|(ipv4, _)| Header::Ipv4(ipv4))
                .ok(),
            Ok(LayerType::Ipv6) => cursor
                .parse::<Ipv6>()
                .map_err(|e| {
                    debug!("failed to parse ipv6: {e:?}");
                })
                .map(|(ipv6, _)| Header::Ipv6(ipv6))
                .ok(),
            Ok(LayerType::Arp) => cursor
                .parse::<Arp>()
                .map_err(|e| {
                    debug!("failed to parse arp: {e:?}");
                })
                .map(|(arp, _)| Header::Arp(arp))
                .ok(),
            Ok(other) => {
                trace!("ethernet payload {other} not decoded");
                None
            }
            Err(e) => {
                trace!("{e}");
                None
            }
        }
    }
}
