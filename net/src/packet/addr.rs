// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Flow endpoints and NAT flow keys.

use crate::layer::LayerType;
use std::fmt::Display;
use std::net::{IpAddr, SocketAddr};

/// The address of an `ICMPv4` query flow.
///
/// Queries have no ports; the identifier plays the port's role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IcmpQueryAddr {
    ip: IpAddr,
    id: u16,
}

impl IcmpQueryAddr {
    /// Create a query address
    #[must_use]
    pub const fn new(ip: IpAddr, id: u16) -> IcmpQueryAddr {
        IcmpQueryAddr { ip, id }
    }

    /// The ip address of the query's sender or receiver
    #[must_use]
    pub const fn ip(&self) -> IpAddr {
        self.ip
    }

    /// The query identifier
    #[must_use]
    pub const fn id(&self) -> u16 {
        self.id
    }
}

impl Display for IcmpQueryAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", SocketAddr::new(self.ip, self.id))
    }
}

/// One end of a flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Endpoint {
    /// Network layer address only
    Ip(IpAddr),
    /// TCP socket address
    Tcp(SocketAddr),
    /// UDP socket address
    Udp(SocketAddr),
    /// `ICMPv4` query address
    IcmpQuery(IcmpQueryAddr),
}

impl Endpoint {
    /// The ip address of the endpoint
    #[must_use]
    pub const fn ip(&self) -> IpAddr {
        match self {
            Endpoint::Ip(ip) => *ip,
            Endpoint::Tcp(addr) | Endpoint::Udp(addr) => addr.ip(),
            Endpoint::IcmpQuery(addr) => addr.ip(),
        }
    }

    /// The port of a TCP or UDP endpoint
    #[must_use]
    pub const fn port(&self) -> Option<u16> {
        match self {
            Endpoint::Tcp(addr) | Endpoint::Udp(addr) => Some(addr.port()),
            Endpoint::Ip(_) | Endpoint::IcmpQuery(_) => None,
        }
    }

    /// The transport protocol of the endpoint (`None` for network layer addresses)
    #[must_use]
    pub const fn protocol(&self) -> Option<LayerType> {
        match self {
            Endpoint::Ip(_) => None,
            Endpoint::Tcp(_) => Some(LayerType::Tcp),
            Endpoint::Udp(_) => Some(LayerType::Udp),
            Endpoint::IcmpQuery(_) => Some(LayerType::Icmp4),
        }
    }
}

impl Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Endpoint::Ip(ip) => write!(f, "{ip}"),
            Endpoint::Tcp(addr) | Endpoint::Udp(addr) => write!(f, "{addr}"),
            Endpoint::IcmpQuery(addr) => write!(f, "{addr}"),
        }
    }
}

/// Minimal NAT flow key: the translated source and the protocol it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NatGuide {
    /// String form of the NAT source
    pub src: String,
    /// Protocol of the flow
    pub protocol: LayerType,
}

impl NatGuide {
    /// Build the flow key of `src`.
    #[must_use]
    pub fn new(src: &Endpoint, protocol: LayerType) -> NatGuide {
        NatGuide {
            src: src.to_string(),
            protocol,
        }
    }
}

impl Display for NatGuide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.protocol, self.src)
    }
}
