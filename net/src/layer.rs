// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Layer type tags.

/// Tag naming one kind of protocol layer.
///
/// The set is wider than what a [`crate::packet::Packet`] accepts: the decoder names every layer
/// it recognises so that validation can report exactly what it rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(any(test, feature = "bolero"), derive(bolero::TypeGenerator))]
pub enum LayerType {
    /// BSD style null/loopback link header
    #[strum(to_string = "Loopback")]
    Loopback,
    /// Ethernet II
    #[strum(to_string = "Ethernet")]
    Ethernet,
    /// Address resolution protocol
    #[strum(to_string = "ARP")]
    Arp,
    /// Internet protocol version 4
    #[strum(to_string = "IPv4")]
    Ipv4,
    /// Internet protocol version 6
    #[strum(to_string = "IPv6")]
    Ipv6,
    /// IPv6 fragment extension header
    #[strum(to_string = "IPv6Fragment")]
    Ipv6Fragment,
    /// Transmission control protocol
    #[strum(to_string = "TCP")]
    Tcp,
    /// User datagram protocol
    #[strum(to_string = "UDP")]
    Udp,
    /// Internet control message protocol (v4)
    #[strum(to_string = "ICMPv4")]
    Icmp4,
    /// Internet control message protocol (v6)
    #[strum(to_string = "ICMPv6")]
    Icmp6,
    /// Non-initial piece of a fragmented IP datagram
    #[strum(to_string = "Fragment")]
    Fragment,
    /// Application bytes following the transport header
    #[strum(to_string = "Payload")]
    Payload,
}

/// The level of the layering model a layer belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Level {
    /// Loopback or ethernet
    Link,
    /// IPv4, IPv6 or ARP
    Network,
    /// TCP, UDP or `ICMPv4`
    Transport,
}

impl LayerType {
    /// Returns true for link layer kinds.
    #[must_use]
    pub const fn is_link(self) -> bool {
        matches!(self, LayerType::Loopback | LayerType::Ethernet)
    }

    /// Returns true for network layer kinds.
    #[must_use]
    pub const fn is_network(self) -> bool {
        matches!(self, LayerType::Arp | LayerType::Ipv4 | LayerType::Ipv6)
    }

    /// Returns true for transport layer kinds.
    #[must_use]
    pub const fn is_transport(self) -> bool {
        matches!(
            self,
            LayerType::Tcp | LayerType::Udp | LayerType::Icmp4 | LayerType::Icmp6
        )
    }
}
