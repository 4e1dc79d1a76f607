// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Null/loopback link layer header.
//!
//! Captures taken on a loopback device (`DLT_NULL`) prefix each packet with the sender's address
//! family as a 32 bit integer in the capturing host's byte order.

use crate::ipv4::Ipv4;
use crate::ipv6::Ipv6;
use crate::layer::LayerType;
use crate::layers::{Header, ParsePayload};
use crate::parse::{LengthError, Parse, ParseError, Reader, Truncation};
use crate::protocol::Unsupported;
use std::convert::Infallible;
use std::num::NonZero;
use tracing::{debug, trace};

/// A loopback header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Loopback {
    family: u32,
}

impl Loopback {
    /// The length (in bytes) of a [`Loopback`] header
    pub const HEADER_LEN: usize = 4;

    #[allow(clippy::unwrap_used)] // const-eval and trivially safe
    const LEN: NonZero<usize> = NonZero::new(Loopback::HEADER_LEN).unwrap();

    /// `AF_INET` on every platform
    pub const AF_INET: u32 = 2;
    /// `AF_INET6` values in use: Linux, NetBSD/OpenBSD, FreeBSD, Darwin
    pub const AF_INET6: [u32; 4] = [10, 24, 28, 30];

    /// Create a header announcing `family`.
    #[must_use]
    pub const fn new(family: u32) -> Loopback {
        Loopback { family }
    }

    /// The address family, normalized to host order regardless of the capturing host.
    #[must_use]
    pub const fn family(&self) -> u32 {
        self.family
    }

    /// The network layer announced by the address family.
    ///
    /// # Errors
    ///
    /// Returns [`Unsupported::LoopbackFamily`] for anything but IPv4 and IPv6.
    pub fn next_layer(&self) -> Result<LayerType, Unsupported> {
        match self.family {
            Loopback::AF_INET => Ok(LayerType::Ipv4),
            family if Loopback::AF_INET6.contains(&family) => Ok(LayerType::Ipv6),
            family => Err(Unsupported::LoopbackFamily(family)),
        }
    }
}

impl Parse for Loopback {
    type Error = Infallible;

    fn parse(buf: &[u8]) -> Result<(Self, NonZero<usize>), ParseError<Self::Error>> {
        let Some(raw) = buf.first_chunk::<{ Loopback::HEADER_LEN }>() else {
            return Err(ParseError::Length(LengthError {
                expected: Loopback::LEN,
                actual: buf.len(),
            }));
        };
        // family values are small; a large big-endian reading means a little-endian host
        let mut family = u32::from_be_bytes(*raw);
        if family > u32::from(u16::MAX) {
            family = u32::from_le_bytes(*raw);
        }
        Ok((Loopback { family }, Loopback::LEN))
    }
}

impl ParsePayload for Loopback {
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
            Ok(other) => {
                trace!("loopback payload {other} not decoded");
                None
            }
            Err(e) => {
                trace!("{e}");
                None
            }
        }
    }
}
