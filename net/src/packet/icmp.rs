// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! `ICMPv4` message classification.

use crate::icmp4::{Icmp4, Icmp4Kind};
use crate::layer::{LayerType, Level};
use crate::packet::addr::Endpoint;
use crate::packet::{Depth, Packet, PacketError, parse_embedded};
use crate::parse::Truncation;
use tracing::debug;

/// An `ICMPv4` message and, for error messages, the datagram it reports on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Icmp4Indicator<'buf> {
    icmp: Icmp4,
    kind: Icmp4Kind,
    embedded: Option<Box<Packet<'buf>>>,
}

impl<'buf> Icmp4Indicator<'buf> {
    /// Classify `icmp`, decoding the datagram quoted in `payload` if it is an error message.
    pub(crate) fn new(
        icmp: Icmp4,
        payload: Option<&'buf [u8]>,
        depth: Depth,
    ) -> Result<Icmp4Indicator<'buf>, PacketError> {
        let kind = icmp.kind()?;
        let embedded = match (kind, depth) {
            (Icmp4Kind::Query, _) => None,
            // RFC 1122: no error message is sent about an error message
            (Icmp4Kind::Error, Depth::Embedded) => return Err(PacketError::NestedIcmpError),
            (Icmp4Kind::Error, Depth::Outer) => {
                let quoted = payload.unwrap_or_default();
                let packet = parse_embedded(quoted, Truncation::Allowed, Depth::Embedded)
                    .and_then(|packet| match packet.transport_layer_type() {
                        Some(_) => Ok(packet),
                        None => Err(PacketError::MissingLayer(Level::Transport)),
                    })
                    .map_err(|e| {
                        debug!("malformed datagram in icmp error: {e}");
                        PacketError::MalformedEmbedded(Box::new(e))
                    })?;
                Some(Box::new(packet))
            }
        };
        Ok(Icmp4Indicator {
            icmp,
            kind,
            embedded,
        })
    }

    /// The `ICMPv4` header
    #[must_use]
    pub const fn icmp(&self) -> &Icmp4 {
        &self.icmp
    }

    /// Query or error
    #[must_use]
    pub const fn kind(&self) -> Icmp4Kind {
        self.kind
    }

    /// Returns true for query messages
    #[must_use]
    pub const fn is_query(&self) -> bool {
        matches!(self.kind, Icmp4Kind::Query)
    }

    /// The identifier of a query message
    #[must_use]
    pub fn identifier(&self) -> Option<u16> {
        self.icmp.identifier()
    }

    /// The datagram quoted by an error message
    #[must_use]
    pub fn embedded(&self) -> Option<&Packet<'buf>> {
        self.embedded.as_deref()
    }

    /// Source of the flow an error message reports on
    #[must_use]
    pub fn embedded_src(&self) -> Option<Endpoint> {
        self.embedded()?.nat_src()
    }

    /// Destination of the flow an error message reports on
    #[must_use]
    pub fn embedded_dst(&self) -> Option<Endpoint> {
        self.embedded()?.nat_dst()
    }

    /// Transport protocol of the flow an error message reports on
    #[must_use]
    pub fn embedded_protocol(&self) -> Option<LayerType> {
        self.embedded()?.transport_layer_type()
    }
}
