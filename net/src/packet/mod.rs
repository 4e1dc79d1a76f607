// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Packet descriptor: a validated, queryable view of one packet.
//!
//! A [`Packet`] is built from a decoded [`Layers`] stack. Construction checks that every layer is
//! of a supported type and that each layer announces the one which follows it; once built, every
//! query is a total function of the validated layers.

pub mod addr;
pub mod conn;
pub mod icmp;

#[cfg(any(test, feature = "test_packets"))]
pub mod test_utils;

use crate::arp::Arp;
use crate::eth::mac::Mac;
use crate::icmp4::Icmp4;
use crate::ipv4::{Ipv4, Ipv4Error};
use crate::ipv6::{Ipv6, Ipv6Fragment};
use crate::layer::{LayerType, Level};
use crate::layers::{LayerParts, Layers, Link, Net, Transport};
use crate::packet::addr::{Endpoint, IcmpQueryAddr, NatGuide};
use crate::packet::icmp::Icmp4Indicator;
use crate::parse::{Parse, ParseError, Truncation};
use crate::protocol::{Unsupported, classify_ip_next_protocol};
use crate::tcp::TruncatedTcp;
use crate::udp::TruncatedUdp;
use etherparse::err::ipv4::HeaderError;
use std::net::{IpAddr, SocketAddr};
use tracing::debug;

/// Errors which may occur when building a [`Packet`].
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum PacketError {
    /// A layer required at this level could not be found
    #[error("missing {0} layer")]
    MissingLayer(Level),
    /// A layer is of a type, version or protocol outside the supported set
    #[error(transparent)]
    UnsupportedType(#[from] Unsupported),
    /// The IPv6 header announces a fragment extension header which was not decoded
    #[error("missing ipv6 fragment extension header")]
    MissingIpv6Fragment,
    /// An `ICMPv4` error message quotes another `ICMPv4` error message
    #[error("icmpv4 error message about an icmpv4 error message")]
    NestedIcmpError,
    /// The datagram quoted by an `ICMPv4` error message is not acceptable
    #[error("malformed datagram in icmpv4 error message: {0}")]
    MalformedEmbedded(Box<PacketError>),
}

/// Transport layer of a [`Packet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportLayer<'buf> {
    /// TCP header (possibly truncated when quoted by an `ICMPv4` error)
    Tcp(TruncatedTcp),
    /// UDP header (possibly truncated when quoted by an `ICMPv4` error)
    Udp(TruncatedUdp),
    /// `ICMPv4` message
    Icmp4(Icmp4Indicator<'buf>),
}

impl TransportLayer<'_> {
    /// The [`LayerType`] of this header
    #[must_use]
    pub const fn layer_type(&self) -> LayerType {
        match self {
            TransportLayer::Tcp(_) => LayerType::Tcp,
            TransportLayer::Udp(_) => LayerType::Udp,
            TransportLayer::Icmp4(_) => LayerType::Icmp4,
        }
    }
}

/// Whether a packet was captured as-is or quoted inside an `ICMPv4` error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Depth {
    Outer,
    Embedded,
}

/// A validated packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet<'buf> {
    data: &'buf [u8],
    link: Option<Link>,
    net: Net,
    ipv6_fragment: Option<Ipv6Fragment>,
    transport: Option<TransportLayer<'buf>>,
    net_payload: Option<&'buf [u8]>,
    payload: Option<&'buf [u8]>,
}

impl<'buf> Packet<'buf> {
    /// Validate a decoded layer stack.
    ///
    /// # Errors
    ///
    /// Returns a [`PacketError`] if a required layer is missing, if a layer is of an unsupported
    /// type, or if an `ICMPv4` error message quotes an unacceptable datagram.
    pub fn new(layers: Layers<'buf>) -> Result<Packet<'buf>, PacketError> {
        Packet::validate(layers.into_parts(), Depth::Outer).inspect_err(|e| {
            debug!("packet rejected: {e}");
        })
    }

    fn validate(parts: LayerParts<'buf>, depth: Depth) -> Result<Packet<'buf>, PacketError> {
        let LayerParts {
            data,
            link,
            net,
            net_payload,
            ipv6_fragment,
            transport,
            fragment,
            payload,
        } = parts;
        if let Some(link) = &link {
            link.next_layer()?;
        }
        let Some(net) = net else {
            return Err(PacketError::MissingLayer(Level::Network));
        };
        let declared = match &net {
            Net::Arp(_) => {
                return Ok(Packet {
                    data,
                    link,
                    net,
                    ipv6_fragment: None,
                    transport: None,
                    net_payload: None,
                    payload: None,
                });
            }
            Net::Ipv4(ipv4) => classify_ip_next_protocol(ipv4.protocol())?,
            Net::Ipv6(ipv6) if ipv6.is_fragment() => {
                let fragment = ipv6_fragment
                    .as_ref()
                    .ok_or(PacketError::MissingIpv6Fragment)?;
                classify_ip_next_protocol(fragment.next_header())?
            }
            Net::Ipv6(ipv6) => classify_ip_next_protocol(ipv6.next_header())?,
        };
        if declared == LayerType::Icmp6 {
            return Err(Unsupported::TransportLayer(declared).into());
        }
        let transport = match transport {
            None if fragment.is_some() => None,
            None => return Err(PacketError::MissingLayer(Level::Transport)),
            Some(found) if found.layer_type() != declared => {
                return Err(Unsupported::Mismatch {
                    declared,
                    found: found.layer_type(),
                }
                .into());
            }
            Some(Transport::Tcp(tcp)) => Some(TransportLayer::Tcp(tcp)),
            Some(Transport::Udp(udp)) => Some(TransportLayer::Udp(udp)),
            Some(Transport::Icmp4(icmp)) => Some(TransportLayer::Icmp4(Icmp4Indicator::new(
                icmp, payload, depth,
            )?)),
            Some(Transport::Icmp6(_)) => {
                return Err(Unsupported::TransportLayer(LayerType::Icmp6).into());
            }
        };
        Ok(Packet {
            data,
            link,
            net,
            ipv6_fragment,
            transport,
            net_payload,
            payload,
        })
    }

    /// The link layer (absent for embedded packets)
    #[must_use]
    pub const fn link(&self) -> Option<&Link> {
        self.link.as_ref()
    }

    /// The network layer
    #[must_use]
    pub const fn net(&self) -> &Net {
        &self.net
    }

    /// The transport layer (absent for ARP and non-initial fragments)
    #[must_use]
    pub const fn transport(&self) -> Option<&TransportLayer<'buf>> {
        self.transport.as_ref()
    }

    /// The type of the link layer
    #[must_use]
    pub fn link_layer_type(&self) -> Option<LayerType> {
        self.link.as_ref().map(Link::layer_type)
    }

    /// The type of the network layer
    #[must_use]
    pub const fn network_layer_type(&self) -> LayerType {
        self.net.layer_type()
    }

    /// The type of the transport layer
    #[must_use]
    pub fn transport_layer_type(&self) -> Option<LayerType> {
        self.transport.as_ref().map(TransportLayer::layer_type)
    }

    /// The IPv4 header, if this is an IPv4 packet
    #[must_use]
    pub const fn ipv4(&self) -> Option<&Ipv4> {
        match &self.net {
            Net::Ipv4(ipv4) => Some(ipv4),
            Net::Ipv6(_) | Net::Arp(_) => None,
        }
    }

    /// The IPv6 header, if this is an IPv6 packet
    #[must_use]
    pub const fn ipv6(&self) -> Option<&Ipv6> {
        match &self.net {
            Net::Ipv6(ipv6) => Some(ipv6),
            Net::Ipv4(_) | Net::Arp(_) => None,
        }
    }

    /// The IPv6 fragment extension header, if this is an IPv6 fragment
    #[must_use]
    pub const fn ipv6_fragment(&self) -> Option<&Ipv6Fragment> {
        self.ipv6_fragment.as_ref()
    }

    /// The ARP message, if this is an ARP packet
    #[must_use]
    pub const fn arp(&self) -> Option<&Arp> {
        match &self.net {
            Net::Arp(arp) => Some(arp),
            Net::Ipv4(_) | Net::Ipv6(_) => None,
        }
    }

    /// The TCP header, if the transport is TCP
    #[must_use]
    pub const fn tcp(&self) -> Option<&TruncatedTcp> {
        match &self.transport {
            Some(TransportLayer::Tcp(tcp)) => Some(tcp),
            _ => None,
        }
    }

    /// The UDP header, if the transport is UDP
    #[must_use]
    pub const fn udp(&self) -> Option<&TruncatedUdp> {
        match &self.transport {
            Some(TransportLayer::Udp(udp)) => Some(udp),
            _ => None,
        }
    }

    /// The `ICMPv4` message and its classification, if the transport is `ICMPv4`
    #[must_use]
    pub const fn icmp4_indicator(&self) -> Option<&Icmp4Indicator<'buf>> {
        match &self.transport {
            Some(TransportLayer::Icmp4(indicator)) => Some(indicator),
            _ => None,
        }
    }

    /// The `ICMPv4` header, if the transport is `ICMPv4`
    #[must_use]
    pub fn icmp4(&self) -> Option<&Icmp4> {
        self.icmp4_indicator().map(Icmp4Indicator::icmp)
    }

    /// Source [`Mac`] (ethernet only)
    #[must_use]
    pub fn src_hardware_addr(&self) -> Option<Mac> {
        match &self.link {
            Some(Link::Ethernet(eth)) => Some(eth.source()),
            Some(Link::Loopback(_)) | None => None,
        }
    }

    /// Destination [`Mac`] (ethernet only)
    #[must_use]
    pub fn dst_hardware_addr(&self) -> Option<Mac> {
        match &self.link {
            Some(Link::Ethernet(eth)) => Some(eth.destination()),
            Some(Link::Loopback(_)) | None => None,
        }
    }

    /// Source ip address (sender protocol address for ARP)
    #[must_use]
    pub fn src_ip(&self) -> IpAddr {
        match &self.net {
            Net::Ipv4(ipv4) => IpAddr::V4(ipv4.source()),
            Net::Ipv6(ipv6) => IpAddr::V6(ipv6.source()),
            Net::Arp(arp) => IpAddr::V4(arp.sender_protocol()),
        }
    }

    /// Destination ip address (target protocol address for ARP)
    #[must_use]
    pub fn dst_ip(&self) -> IpAddr {
        match &self.net {
            Net::Ipv4(ipv4) => IpAddr::V4(ipv4.destination()),
            Net::Ipv6(ipv6) => IpAddr::V6(ipv6.destination()),
            Net::Arp(arp) => IpAddr::V4(arp.target_protocol()),
        }
    }

    /// TTL (IPv4) or hop limit (IPv6)
    #[must_use]
    pub fn hop(&self) -> Option<u8> {
        match &self.net {
            Net::Ipv4(ipv4) => Some(ipv4.ttl()),
            Net::Ipv6(ipv6) => Some(ipv6.hop_limit()),
            Net::Arp(_) => None,
        }
    }

    /// Identifier shared by the fragments of one datagram.
    ///
    /// Read from the IPv4 header, or from the IPv6 fragment extension header (`None` for
    /// IPv6 packets which are not fragments).
    #[must_use]
    pub fn network_id(&self) -> Option<u32> {
        match &self.net {
            Net::Ipv4(ipv4) => Some(u32::from(ipv4.identification())),
            Net::Ipv6(_) => self.ipv6_fragment.as_ref().map(Ipv6Fragment::identification),
            Net::Arp(_) => None,
        }
    }

    /// Returns true if this packet is one piece of a fragmented datagram.
    #[must_use]
    pub fn is_fragment(&self) -> bool {
        match &self.net {
            Net::Ipv4(ipv4) => ipv4.is_fragment(),
            Net::Ipv6(ipv6) => ipv6.is_fragment(),
            Net::Arp(_) => false,
        }
    }

    /// Fragment offset in units of 8 bytes (0 for packets which are not fragments)
    #[must_use]
    pub fn fragment_offset(&self) -> u16 {
        match &self.net {
            Net::Ipv4(ipv4) => ipv4.fragment_offset(),
            Net::Ipv6(_) => self
                .ipv6_fragment
                .as_ref()
                .map_or(0, Ipv6Fragment::fragment_offset),
            Net::Arp(_) => 0,
        }
    }

    /// Returns true if more fragments of the datagram follow this one
    #[must_use]
    pub fn more_fragments(&self) -> bool {
        match &self.net {
            Net::Ipv4(ipv4) => ipv4.more_fragments(),
            Net::Ipv6(_) => self
                .ipv6_fragment
                .as_ref()
                .is_some_and(Ipv6Fragment::more_fragments),
            Net::Arp(_) => false,
        }
    }

    /// The protocol carried by the datagram, whether or not its header is in this fragment.
    #[must_use]
    pub fn transport_protocol(&self) -> Option<LayerType> {
        let protocol = match &self.net {
            Net::Ipv4(ipv4) => ipv4.protocol(),
            Net::Ipv6(ipv6) => match &self.ipv6_fragment {
                Some(fragment) if ipv6.is_fragment() => fragment.next_header(),
                _ => ipv6.next_header(),
            },
            Net::Arp(_) => return None,
        };
        classify_ip_next_protocol(protocol).ok()
    }

    /// Source port (TCP and UDP only)
    #[must_use]
    pub const fn src_port(&self) -> Option<u16> {
        match &self.transport {
            Some(TransportLayer::Tcp(tcp)) => Some(tcp.source()),
            Some(TransportLayer::Udp(udp)) => Some(udp.source()),
            Some(TransportLayer::Icmp4(_)) | None => None,
        }
    }

    /// Destination port (TCP and UDP only)
    #[must_use]
    pub const fn dst_port(&self) -> Option<u16> {
        match &self.transport {
            Some(TransportLayer::Tcp(tcp)) => Some(tcp.destination()),
            Some(TransportLayer::Udp(udp)) => Some(udp.destination()),
            Some(TransportLayer::Icmp4(_)) | None => None,
        }
    }

    /// Source endpoint of the flow this packet belongs to.
    ///
    /// For `ICMPv4` error messages this is the source of the quoted datagram, i.e. the flow the
    /// error reports on rather than the error message itself.
    #[must_use]
    pub fn nat_src(&self) -> Option<Endpoint> {
        match self.transport.as_ref()? {
            TransportLayer::Icmp4(indicator) if !indicator.is_query() => indicator.embedded_src(),
            transport => Packet::endpoint(transport, self.src_ip(), self.src_port()),
        }
    }

    /// Destination endpoint of the flow this packet belongs to (see [`Packet::nat_src`]).
    #[must_use]
    pub fn nat_dst(&self) -> Option<Endpoint> {
        match self.transport.as_ref()? {
            TransportLayer::Icmp4(indicator) if !indicator.is_query() => indicator.embedded_dst(),
            transport => Packet::endpoint(transport, self.dst_ip(), self.dst_port()),
        }
    }

    /// Protocol of the flow this packet belongs to.
    #[must_use]
    pub fn nat_protocol(&self) -> Option<LayerType> {
        match self.transport.as_ref()? {
            TransportLayer::Icmp4(indicator) if !indicator.is_query() => {
                indicator.embedded_protocol()
            }
            transport => Some(transport.layer_type()),
        }
    }

    /// NAT flow key of this packet.
    #[must_use]
    pub fn nat_guide(&self) -> Option<NatGuide> {
        Some(NatGuide::new(&self.nat_src()?, self.nat_protocol()?))
    }

    /// Source endpoint of this packet as seen on the wire.
    ///
    /// Falls back to the bare ip address when there is no transport layer or when the packet is
    /// an `ICMPv4` error message.
    #[must_use]
    pub fn src(&self) -> Endpoint {
        let ip = self.src_ip();
        self.transport
            .as_ref()
            .and_then(|transport| Packet::endpoint(transport, ip, self.src_port()))
            .unwrap_or(Endpoint::Ip(ip))
    }

    /// Destination endpoint of this packet as seen on the wire (see [`Packet::src`]).
    #[must_use]
    pub fn dst(&self) -> Endpoint {
        let ip = self.dst_ip();
        self.transport
            .as_ref()
            .and_then(|transport| Packet::endpoint(transport, ip, self.dst_port()))
            .unwrap_or(Endpoint::Ip(ip))
    }

    fn endpoint(
        transport: &TransportLayer<'buf>,
        ip: IpAddr,
        port: Option<u16>,
    ) -> Option<Endpoint> {
        match transport {
            TransportLayer::Tcp(_) => Some(Endpoint::Tcp(SocketAddr::new(ip, port?))),
            TransportLayer::Udp(_) => Some(Endpoint::Udp(SocketAddr::new(ip, port?))),
            TransportLayer::Icmp4(indicator) => {
                let id = indicator.identifier()?;
                Some(Endpoint::IcmpQuery(IcmpQueryAddr::new(ip, id)))
            }
        }
    }

    /// Bytes after the network layer (after the fragment extension header for IPv6 fragments)
    #[must_use]
    pub const fn network_payload(&self) -> Option<&'buf [u8]> {
        self.net_payload
    }

    /// Bytes after the transport layer
    #[must_use]
    pub const fn payload(&self) -> Option<&'buf [u8]> {
        self.payload
    }

    /// The packet as captured
    #[must_use]
    pub const fn data(&self) -> &'buf [u8] {
        self.data
    }

    /// Length of the packet as captured
    #[must_use]
    pub const fn size(&self) -> usize {
        self.data.len()
    }
}

/// Validate a decoded layer stack (see [`Packet::new`]).
///
/// # Errors
///
/// See [`Packet::new`].
pub fn parse_packet(layers: Layers<'_>) -> Result<Packet<'_>, PacketError> {
    Packet::new(layers)
}

/// Decode `data` as IPv4.
///
/// When `data` is not IPv4, the error carries the version number found, if a header could be read
/// at all. The version nibble is read back from the failed IPv4 decode, so the first bytes of a
/// non-IPv4 packet are parsed twice.
fn try_ipv4(data: &[u8], mode: Truncation) -> Result<Layers<'_>, Option<u8>> {
    let layers = Layers::decode_with(data, LayerType::Ipv4, mode);
    if layers.net().is_some() {
        return Ok(layers);
    }
    match Ipv4::parse(data) {
        Err(ParseError::Invalid(Ipv4Error::Invalid(HeaderError::UnexpectedVersion {
            version_number,
        }))) => Err(Some(version_number)),
        _ => Err(None),
    }
}

fn embedded_layers(data: &[u8], mode: Truncation) -> Result<Layers<'_>, PacketError> {
    match try_ipv4(data, mode) {
        Ok(layers) => Ok(layers),
        Err(Some(6)) => {
            let layers = Layers::decode_with(data, LayerType::Ipv6, mode);
            if layers.net().is_none() {
                return Err(PacketError::MissingLayer(Level::Network));
            }
            Ok(layers)
        }
        Err(Some(version)) => Err(Unsupported::IpVersion(version).into()),
        Err(None) => Err(PacketError::MissingLayer(Level::Network)),
    }
}

pub(crate) fn parse_embedded(
    data: &[u8],
    mode: Truncation,
    depth: Depth,
) -> Result<Packet<'_>, PacketError> {
    Packet::validate(embedded_layers(data, mode)?.into_parts(), depth)
}

/// Parse a packet with no link layer, guessing its IP version.
///
/// # Errors
///
/// Returns [`PacketError::UnsupportedType`] for IP versions other than 4 and 6,
/// [`PacketError::MissingLayer`] if no IP header can be read, and any error of [`Packet::new`].
pub fn parse_embedded_packet(data: &[u8]) -> Result<Packet<'_>, PacketError> {
    parse_embedded(data, Truncation::Forbidden, Depth::Outer).inspect_err(|e| {
        debug!("embedded packet rejected: {e}");
    })
}

fn supported_link(layers: &Layers<'_>) -> bool {
    layers.link().is_some_and(|link| link.next_layer().is_ok())
}

/// Decode a frame whose link layer is ethernet or loopback.
///
/// Ethernet is preferred. A loopback reading is only taken when a network layer decodes behind
/// it; otherwise any buffer holding a complete ethernet header is returned as ethernet, leaving
/// an unsupported ethertype for [`Packet::new`] to report.
///
/// # Errors
///
/// Returns [`PacketError::MissingLayer`] if neither link layer fits.
pub fn parse_raw_packet(data: &[u8]) -> Result<Layers<'_>, PacketError> {
    let eth = Layers::decode(data, LayerType::Ethernet);
    if supported_link(&eth) {
        return Ok(eth);
    }
    let lo = Layers::decode(data, LayerType::Loopback);
    if supported_link(&lo) && lo.net().is_some() {
        return Ok(lo);
    }
    if eth.link().is_some() {
        return Ok(eth);
    }
    debug!("no link layer in {} bytes", data.len());
    Err(PacketError::MissingLayer(Level::Link))
}

/// Parse a full frame (ethernet or loopback) into a [`Packet`].
///
/// # Errors
///
/// See [`parse_raw_packet`] and [`Packet::new`].
pub fn parse_frame(data: &[u8]) -> Result<Packet<'_>, PacketError> {
    Packet::new(parse_raw_packet(data)?)
}

#[cfg(test)]
mod test {
    use super::{
        PacketError, TransportLayer, parse_embedded_packet, parse_frame, parse_packet,
        parse_raw_packet,
    };
    use crate::eth::mac::Mac;
    use crate::icmp4::Icmp4Kind;
    use crate::layer::{LayerType, Level};
    use crate::layers::Layers;
    use crate::packet::addr::{Endpoint, IcmpQueryAddr, NatGuide};
    use crate::packet::test_utils::{
        DST_MAC, FRAGMENT_DST, FRAGMENT_SRC, SRC_MAC, eth_arp_request, eth_icmp4_echo,
        eth_icmp4_unreachable, eth_ipv4_fragment, eth_ipv4_tcp_syn, eth_ipv4_udp,
        eth_ipv6_fragment, eth_ipv6_tcp_syn, eth_ipv6_udp, ipv4_udp, ipv6_udp, loopback,
    };
    use crate::protocol::Unsupported;
    use etherparse::{EtherType, Ethernet2Header, IpNumber};
    use pretty_assertions::assert_eq;
    use std::net::{IpAddr, Ipv4Addr, SocketAddr, SocketAddrV4, SocketAddrV6};
    use tracing_test::traced_test;

    fn client() -> SocketAddrV4 {
        "10.0.0.5:5000".parse().unwrap()
    }

    fn server() -> SocketAddrV4 {
        "93.184.216.34:53".parse().unwrap()
    }

    fn client6() -> SocketAddrV6 {
        "[fd00::5]:40000".parse().unwrap()
    }

    fn server6() -> SocketAddrV6 {
        "[fd00::1]:443".parse().unwrap()
    }

    #[test]
    fn udp_over_ipv4_reads_back() {
        let frame = eth_ipv4_udp(client(), server(), 61, b"hello");
        let packet = parse_frame(&frame).unwrap();
        assert_eq!(packet.link_layer_type(), Some(LayerType::Ethernet));
        assert_eq!(packet.network_layer_type(), LayerType::Ipv4);
        assert_eq!(packet.transport_layer_type(), Some(LayerType::Udp));
        assert_eq!(packet.src_hardware_addr(), Some(SRC_MAC));
        assert_eq!(packet.dst_hardware_addr(), Some(DST_MAC));
        assert_eq!(packet.src_ip(), IpAddr::V4(*client().ip()));
        assert_eq!(packet.dst_ip(), IpAddr::V4(*server().ip()));
        assert_eq!(packet.hop(), Some(61));
        assert!(!packet.is_fragment());
        assert_eq!(packet.fragment_offset(), 0);
        assert!(!packet.more_fragments());
        assert_eq!(packet.transport_protocol(), Some(LayerType::Udp));
        assert_eq!(packet.src_port(), Some(5000));
        assert_eq!(packet.dst_port(), Some(53));
        assert_eq!(packet.nat_src(), Some(Endpoint::Udp(client().into())));
        assert_eq!(packet.nat_dst(), Some(Endpoint::Udp(server().into())));
        assert_eq!(packet.nat_protocol(), Some(LayerType::Udp));
        assert_eq!(packet.src(), Endpoint::Udp(client().into()));
        assert_eq!(packet.dst(), Endpoint::Udp(server().into()));
        assert_eq!(packet.payload(), Some(&b"hello"[..]));
        assert_eq!(packet.network_payload().map(<[u8]>::len), Some(8 + 5));
        assert_eq!(packet.size(), frame.len());
        assert_eq!(
            packet.nat_guide(),
            Some(NatGuide {
                src: "10.0.0.5:5000".to_string(),
                protocol: LayerType::Udp
            })
        );
    }

    #[test]
    fn tcp_over_ipv6_reads_back() {
        let frame = eth_ipv6_tcp_syn(client6(), server6(), b"");
        let packet = parse_frame(&frame).unwrap();
        assert_eq!(packet.network_layer_type(), LayerType::Ipv6);
        assert_eq!(packet.transport_layer_type(), Some(LayerType::Tcp));
        assert_eq!(packet.hop(), Some(64));
        assert_eq!(packet.network_id(), None);
        assert!(!packet.is_fragment());
        assert_eq!(packet.transport_protocol(), Some(LayerType::Tcp));
        assert!(packet.tcp().and_then(|tcp| tcp.full()).is_some_and(|tcp| tcp.syn()));
        assert_eq!(packet.nat_src(), Some(Endpoint::Tcp(client6().into())));
        assert_eq!(packet.nat_dst(), Some(Endpoint::Tcp(server6().into())));
        assert_eq!(packet.src().to_string(), "[fd00::5]:40000");
        assert_eq!(
            packet.nat_guide().map(|guide| guide.src),
            Some("[fd00::5]:40000".to_string())
        );
    }

    #[test]
    fn bare_syn_has_no_payload() {
        let frame = eth_ipv4_tcp_syn(client(), server(), b"");
        let packet = parse_frame(&frame).unwrap();
        assert_eq!(packet.transport_layer_type(), Some(LayerType::Tcp));
        assert_eq!(packet.payload(), None);
        assert_eq!(packet.network_payload().map(<[u8]>::len), Some(20));
    }

    #[test]
    fn udp_over_ipv6_over_loopback() {
        let frame = eth_ipv6_udp(client6(), server6(), 9, b"x");
        let lo = loopback(10, &frame[14..]);
        let packet = parse_frame(&lo).unwrap();
        assert_eq!(packet.link_layer_type(), Some(LayerType::Loopback));
        assert_eq!(packet.src_hardware_addr(), None);
        assert_eq!(packet.hop(), Some(9));
        assert_eq!(packet.nat_dst(), Some(Endpoint::Udp(server6().into())));
    }

    #[test]
    fn arp_stops_at_network_layer() {
        let sender = Ipv4Addr::new(10, 0, 0, 5);
        let target = Ipv4Addr::new(10, 0, 0, 1);
        let frame = eth_arp_request(sender, target);
        let packet = parse_frame(&frame).unwrap();
        assert_eq!(packet.network_layer_type(), LayerType::Arp);
        assert_eq!(packet.dst_hardware_addr(), Some(Mac::BROADCAST));
        assert_eq!(packet.src_ip(), IpAddr::V4(sender));
        assert_eq!(packet.dst_ip(), IpAddr::V4(target));
        assert_eq!(packet.arp().map(|arp| arp.target_hardware()), Some(Mac::ZERO));
        assert_eq!(packet.transport_layer_type(), None);
        assert_eq!(packet.transport_protocol(), None);
        assert_eq!(packet.hop(), None);
        assert_eq!(packet.network_id(), None);
        assert_eq!(packet.nat_src(), None);
        assert_eq!(packet.nat_guide(), None);
        assert_eq!(packet.src(), Endpoint::Ip(IpAddr::V4(sender)));
        assert_eq!(packet.payload(), None);
    }

    #[test]
    fn ipv4_fragments() {
        let first = eth_ipv4_fragment(0x4242, true, 0, IpNumber::UDP, &[0u8; 16]);
        let packet = parse_frame(&first).unwrap();
        assert!(packet.is_fragment());
        assert_eq!(packet.fragment_offset(), 0);
        assert!(packet.more_fragments());
        assert_eq!(packet.network_id(), Some(0x4242));
        assert_eq!(packet.transport_layer_type(), Some(LayerType::Udp));

        let last = eth_ipv4_fragment(0x4242, false, 185, IpNumber::UDP, &[0u8; 16]);
        let packet = parse_frame(&last).unwrap();
        assert!(packet.is_fragment());
        assert_eq!(packet.fragment_offset(), 185);
        assert!(!packet.more_fragments());
        assert_eq!(packet.transport_layer_type(), None);
        assert_eq!(packet.transport_protocol(), Some(LayerType::Udp));
        assert_eq!(packet.nat_src(), None);
        assert_eq!(packet.src(), Endpoint::Ip(IpAddr::V4(FRAGMENT_SRC)));
        assert_eq!(packet.dst(), Endpoint::Ip(IpAddr::V4(FRAGMENT_DST)));
        assert_eq!(packet.network_payload(), Some(&[0u8; 16][..]));
    }

    #[test]
    fn ipv6_fragments() {
        let first = eth_ipv6_fragment(0xdead_beef, true, 0, IpNumber::UDP, &[0u8; 16]);
        let packet = parse_frame(&first).unwrap();
        assert!(packet.is_fragment());
        assert_eq!(packet.fragment_offset(), 0);
        assert!(packet.more_fragments());
        assert_eq!(packet.network_id(), Some(0xdead_beef));
        assert_eq!(packet.transport_protocol(), Some(LayerType::Udp));
        assert_eq!(packet.transport_layer_type(), Some(LayerType::Udp));

        let later = eth_ipv6_fragment(0xdead_beef, false, 2, IpNumber::TCP, &[0u8; 16]);
        let packet = parse_frame(&later).unwrap();
        assert!(packet.is_fragment());
        assert_eq!(packet.fragment_offset(), 2);
        assert!(!packet.more_fragments());
        assert_eq!(packet.transport_layer_type(), None);
        assert_eq!(packet.transport_protocol(), Some(LayerType::Tcp));
    }

    #[test]
    fn icmp_query_nat_address() {
        let src = Ipv4Addr::new(10, 0, 0, 5);
        let dst = Ipv4Addr::new(8, 8, 8, 8);
        let frame = eth_icmp4_echo(src, dst, 0x1234, 1);
        let packet = parse_frame(&frame).unwrap();
        let indicator = packet.icmp4_indicator().unwrap();
        assert!(indicator.is_query());
        assert!(indicator.embedded().is_none());
        assert_eq!(
            packet.nat_src(),
            Some(Endpoint::IcmpQuery(IcmpQueryAddr::new(IpAddr::V4(src), 0x1234)))
        );
        assert_eq!(
            packet.nat_dst(),
            Some(Endpoint::IcmpQuery(IcmpQueryAddr::new(IpAddr::V4(dst), 0x1234)))
        );
        assert_eq!(packet.nat_protocol(), Some(LayerType::Icmp4));
        assert_eq!(packet.src_port(), None);
        assert_eq!(packet.payload(), Some(&b"ping"[..]));
    }

    #[test]
    fn icmp_error_nat_address_is_embedded() {
        let original = ipv4_udp(client(), server(), b"a dns query");
        let router = Ipv4Addr::new(93, 184, 216, 1);
        let frame = eth_icmp4_unreachable(router, *client().ip(), &original);
        let packet = parse_frame(&frame).unwrap();
        let indicator = packet.icmp4_indicator().unwrap();
        assert_eq!(indicator.kind(), Icmp4Kind::Error);
        assert_eq!(indicator.identifier(), None);
        let embedded = indicator.embedded().unwrap();
        assert_eq!(embedded.link_layer_type(), None);
        assert_eq!(embedded.transport_layer_type(), Some(LayerType::Udp));
        assert_eq!(packet.nat_src(), Some(Endpoint::Udp(client().into())));
        assert_eq!(packet.nat_dst(), Some(Endpoint::Udp(server().into())));
        assert_eq!(packet.nat_protocol(), Some(LayerType::Udp));
        // the wire view describes the error message itself
        assert_eq!(packet.src(), Endpoint::Ip(IpAddr::V4(router)));
        assert_eq!(packet.dst(), Endpoint::Ip(IpAddr::V4(*client().ip())));
    }

    #[test]
    fn icmp_error_quoting_truncated_tcp() {
        let original = eth_ipv4_tcp_syn(client(), server(), b"");
        let router = Ipv4Addr::new(93, 184, 216, 1);
        let frame = eth_icmp4_unreachable(router, *client().ip(), &original[14..]);
        let packet = parse_frame(&frame).unwrap();
        let embedded = packet.icmp4_indicator().and_then(|i| i.embedded()).unwrap();
        assert!(embedded.tcp().is_some_and(|tcp| tcp.full().is_none()));
        assert_eq!(
            packet.nat_src(),
            Some(Endpoint::Tcp(SocketAddr::V4(client())))
        );
        assert_eq!(packet.nat_protocol(), Some(LayerType::Tcp));
    }

    #[test]
    fn icmp_error_about_icmp_error_is_rejected() {
        let original = ipv4_udp(client(), server(), b"");
        let router = Ipv4Addr::new(93, 184, 216, 1);
        let error = eth_icmp4_unreachable(router, *client().ip(), &original);
        let frame = eth_icmp4_unreachable(*client().ip(), router, &error[14..]);
        assert_eq!(
            parse_frame(&frame),
            Err(PacketError::MalformedEmbedded(Box::new(
                PacketError::NestedIcmpError
            )))
        );
    }

    #[test]
    fn icmp_error_about_icmp_query() {
        let echo = eth_icmp4_echo(*client().ip(), *server().ip(), 7, 1);
        let router = Ipv4Addr::new(93, 184, 216, 1);
        let frame = eth_icmp4_unreachable(router, *client().ip(), &echo[14..]);
        let packet = parse_frame(&frame).unwrap();
        assert_eq!(packet.nat_protocol(), Some(LayerType::Icmp4));
        assert_eq!(
            packet.nat_src(),
            Some(Endpoint::IcmpQuery(IcmpQueryAddr::new(
                IpAddr::V4(*client().ip()),
                7
            )))
        );
    }

    #[test]
    fn icmp_error_with_garbage_is_malformed() {
        let router = Ipv4Addr::new(93, 184, 216, 1);
        let frame = eth_icmp4_unreachable(router, *client().ip(), &[0x45, 0, 0]);
        assert!(matches!(
            parse_frame(&frame),
            Err(PacketError::MalformedEmbedded(_))
        ));
    }

    #[test]
    fn embedded_ipv4() {
        let bytes = ipv4_udp(client(), server(), b"payload");
        let packet = parse_embedded_packet(&bytes).unwrap();
        assert_eq!(packet.link_layer_type(), None);
        assert_eq!(packet.network_layer_type(), LayerType::Ipv4);
        assert_eq!(packet.nat_src(), Some(Endpoint::Udp(client().into())));
    }

    #[test]
    fn embedded_ipv6_is_decoded_on_second_attempt() {
        let bytes = ipv6_udp(client6(), server6(), b"payload");
        let packet = parse_embedded_packet(&bytes).unwrap();
        assert_eq!(packet.network_layer_type(), LayerType::Ipv6);
        assert_eq!(packet.dst_port(), Some(443));
        assert_eq!(packet.payload(), Some(&b"payload"[..]));
    }

    #[test]
    fn embedded_other_versions() {
        let mut bytes = ipv4_udp(client(), server(), b"");
        bytes[0] = 0x55;
        assert_eq!(
            parse_embedded_packet(&bytes),
            Err(PacketError::UnsupportedType(Unsupported::IpVersion(5)))
        );
        assert_eq!(
            parse_embedded_packet(&[]),
            Err(PacketError::MissingLayer(Level::Network))
        );
    }

    #[test]
    fn raw_link_layer_guess() {
        let frame = eth_ipv4_udp(client(), server(), 64, b"");
        let layers = parse_raw_packet(&frame).unwrap();
        assert!(layers.layer(LayerType::Ethernet));

        let lo = loopback(2, &frame[14..]);
        let layers = parse_raw_packet(&lo).unwrap();
        assert!(layers.layer(LayerType::Loopback));
        assert!(layers.layer(LayerType::Udp));

        assert_eq!(
            parse_raw_packet(&[0xff; 8]),
            Err(PacketError::MissingLayer(Level::Link))
        );
        // a loopback family without an ip packet behind it
        assert_eq!(
            parse_raw_packet(&[2, 0, 0, 0, 0xff, 0xff]),
            Err(PacketError::MissingLayer(Level::Link))
        );
    }

    fn eth_frame(destination: [u8; 6], ether_type: u16) -> Vec<u8> {
        let mut frame = Ethernet2Header {
            source: SRC_MAC.0,
            destination,
            ether_type: EtherType(ether_type),
        }
        .to_bytes()
        .to_vec();
        frame.extend_from_slice(&[0x02, 0x07, 0x04, 0x00, 0x11, 0x22, 0x33, 0x44]);
        frame
    }

    #[test]
    fn unsupported_ethertype_is_not_mistaken_for_loopback() {
        // the destination mac reads as AF_INET in either byte order
        let lldp = eth_frame(DST_MAC.0, 0x88cc);
        assert_eq!(
            parse_frame(&lldp),
            Err(PacketError::UnsupportedType(Unsupported::EtherType(0x88cc)))
        );
        let vlan = eth_frame([0, 0, 0, 2, 0x11, 0x22], 0x8100);
        let layers = parse_raw_packet(&vlan).unwrap();
        assert!(layers.layer(LayerType::Ethernet));
        assert!(!layers.layer(LayerType::Loopback));
        assert_eq!(
            parse_packet(layers),
            Err(PacketError::UnsupportedType(Unsupported::EtherType(0x8100)))
        );
    }

    #[test]
    fn unsupported_types() {
        // vlan tagged
        let mut frame = eth_ipv4_udp(client(), server(), 64, b"");
        frame[12..14].copy_from_slice(&[0x81, 0x00]);
        let layers = Layers::decode(&frame, LayerType::Ethernet);
        assert_eq!(
            parse_packet(layers),
            Err(PacketError::UnsupportedType(Unsupported::EtherType(0x8100)))
        );

        // gre
        let frame = eth_ipv4_fragment(1, false, 0, IpNumber(47), &[0u8; 8]);
        assert_eq!(
            parse_frame(&frame),
            Err(PacketError::UnsupportedType(Unsupported::IpProtocol(47)))
        );

        // icmpv6
        let echo = [128, 0, 0, 0, 0, 0, 0, 0];
        let frame = eth_ipv6_fragment(1, false, 0, IpNumber::IPV6_ICMP, &echo);
        assert_eq!(
            parse_frame(&frame),
            Err(PacketError::UnsupportedType(Unsupported::TransportLayer(
                LayerType::Icmp6
            )))
        );

        // router advertisement
        let mut frame = eth_icmp4_echo(*client().ip(), *server().ip(), 1, 1);
        frame[14 + 20] = 9;
        assert_eq!(
            parse_frame(&frame),
            Err(PacketError::UnsupportedType(Unsupported::Icmp4Type(9)))
        );
    }

    #[test]
    fn missing_layers() {
        let frame = eth_ipv4_udp(client(), server(), 64, b"");
        assert_eq!(
            parse_frame(&frame[..14 + 10]),
            Err(PacketError::MissingLayer(Level::Network))
        );
        let mut short = frame[..14 + 20 + 4].to_vec();
        short[14 + 3] = 24; // total length
        assert_eq!(
            parse_frame(&short),
            Err(PacketError::MissingLayer(Level::Transport))
        );
    }

    #[test]
    #[traced_test]
    fn rejections_are_logged() {
        let frame = eth_ipv4_fragment(1, false, 0, IpNumber(47), &[0u8; 8]);
        assert!(parse_frame(&frame).is_err());
        assert!(logs_contain("packet rejected: ip protocol 47 not supported"));
    }

    #[test]
    fn arbitrary_bytes_never_panic() {
        bolero::check!().for_each(|buf: &[u8]| {
            if let Ok(packet) = parse_frame(buf) {
                assert!(packet.link_layer_type().is_some());
                assert_eq!(packet.size(), buf.len());
                let _ = (packet.nat_guide(), packet.src(), packet.dst());
                if let Some(TransportLayer::Icmp4(indicator)) = packet.transport() {
                    assert_eq!(indicator.is_query(), indicator.embedded().is_none());
                }
            }
            if let Ok(packet) = parse_embedded_packet(buf) {
                assert_eq!(packet.link_layer_type(), None);
                let _ = (packet.nat_src(), packet.nat_dst(), packet.transport_protocol());
            }
        });
    }
}
