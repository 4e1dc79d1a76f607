// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Mapping from "next protocol" fields to the layer they announce.
//!
//! Both tables fail closed: a code outside the supported set is an [`Unsupported`] error, never a
//! default layer.

use crate::eth::ethtype::EthType;
use crate::layer::LayerType;
use etherparse::IpNumber;

/// A protocol code, version or layer kind outside the supported set.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unsupported {
    /// IP protocol / next header number
    #[error("ip protocol {0} not supported")]
    IpProtocol(u8),
    /// Ethernet type field
    #[error("ethernet type {0:#06x} not supported")]
    EtherType(u16),
    /// Loopback address family
    #[error("loopback address family {0} not supported")]
    LoopbackFamily(u32),
    /// IP version nibble
    #[error("ip version {0} not supported")]
    IpVersion(u8),
    /// `ICMPv4` message type
    #[error("icmpv4 type {0} not supported")]
    Icmp4Type(u8),
    /// Transport layer kind
    #[error("transport layer type {0} not supported")]
    TransportLayer(LayerType),
    /// The network layer announces one transport but another one follows it
    #[error("network layer announces {declared} but carries {found}")]
    Mismatch {
        /// announced by the network layer
        declared: LayerType,
        /// actually decoded
        found: LayerType,
    },
}

/// Map an IP "protocol" (IPv4) or "next header" (IPv6) number to the transport layer it announces.
///
/// # Errors
///
/// Returns [`Unsupported::IpProtocol`] for anything but TCP, UDP, `ICMPv4` and `ICMPv6`.
pub fn classify_ip_next_protocol(protocol: IpNumber) -> Result<LayerType, Unsupported> {
    match protocol {
        IpNumber::TCP => Ok(LayerType::Tcp),
        IpNumber::UDP => Ok(LayerType::Udp),
        IpNumber::ICMP => Ok(LayerType::Icmp4),
        IpNumber::IPV6_ICMP => Ok(LayerType::Icmp6),
        other => Err(Unsupported::IpProtocol(other.0)),
    }
}

/// Map an ethernet frame's type field to the network layer it announces.
///
/// # Errors
///
/// Returns [`Unsupported::EtherType`] for anything but IPv4, IPv6 and ARP.
pub fn classify_link_ethertype(ether_type: EthType) -> Result<LayerType, Unsupported> {
    match ether_type {
        EthType::IPV4 => Ok(LayerType::Ipv4),
        EthType::IPV6 => Ok(LayerType::Ipv6),
        EthType::ARP => Ok(LayerType::Arp),
        other => Err(Unsupported::EtherType(other.raw())),
    }
}

#[cfg(test)]
mod test {
    use super::{Unsupported, classify_ip_next_protocol, classify_link_ethertype};
    use crate::eth::ethtype::EthType;
    use crate::layer::LayerType;
    use etherparse::IpNumber;

    #[test]
    fn ip_protocols() {
        assert_eq!(classify_ip_next_protocol(IpNumber::TCP), Ok(LayerType::Tcp));
        assert_eq!(classify_ip_next_protocol(IpNumber::UDP), Ok(LayerType::Udp));
        assert_eq!(classify_ip_next_protocol(IpNumber::ICMP), Ok(LayerType::Icmp4));
        assert_eq!(
            classify_ip_next_protocol(IpNumber::IPV6_ICMP),
            Ok(LayerType::Icmp6)
        );
        assert_eq!(
            classify_ip_next_protocol(IpNumber::IPV6_FRAGMENTATION_HEADER),
            Err(Unsupported::IpProtocol(44))
        );
    }

    #[test]
    fn ethertypes() {
        assert_eq!(classify_link_ethertype(EthType::IPV4), Ok(LayerType::Ipv4));
        assert_eq!(classify_link_ethertype(EthType::IPV6), Ok(LayerType::Ipv6));
        assert_eq!(classify_link_ethertype(EthType::ARP), Ok(LayerType::Arp));
        assert_eq!(
            classify_link_ethertype(EthType::VLAN),
            Err(Unsupported::EtherType(0x8100))
        );
    }

    #[test]
    fn tables_fail_closed() {
        bolero::check!().with_type().for_each(|raw: &u8| {
            match classify_ip_next_protocol(IpNumber(*raw)) {
                Ok(layer) => {
                    assert!(layer.is_transport());
                    assert!(matches!(*raw, 1 | 6 | 17 | 58));
                }
                Err(Unsupported::IpProtocol(code)) => assert_eq!(code, *raw),
                Err(e) => unreachable!("{e:?}"),
            }
        });
        bolero::check!().with_type().for_each(|raw: &u16| {
            match classify_link_ethertype(EthType::new(*raw)) {
                Ok(layer) => {
                    assert!(layer.is_network());
                    assert!(matches!(*raw, 0x0800 | 0x0806 | 0x86dd));
                }
                Err(Unsupported::EtherType(code)) => assert_eq!(code, *raw),
                Err(e) => unreachable!("{e:?}"),
            }
        });
    }
}
