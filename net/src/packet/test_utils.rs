// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

//! Synthetic packets for tests.
//!
//! Ethernet frames go from [`SRC_MAC`] to [`DST_MAC`].

use crate::eth::mac::Mac;
use etherparse::icmpv4::DestUnreachableHeader;
use etherparse::{
    EtherType, Ethernet2Header, Icmpv4Type, IpFragOffset, IpNumber, Ipv4Header, Ipv6FragmentHeader,
    Ipv6Header, PacketBuilder,
};
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddrV4, SocketAddrV6};

/// Source mac of every synthetic frame
pub const SRC_MAC: Mac = Mac([0x02, 0, 0, 0, 0, 1]);
/// Destination mac of every synthetic frame
pub const DST_MAC: Mac = Mac([0x02, 0, 0, 0, 0, 2]);

/// Source address of synthetic fragments
pub const FRAGMENT_SRC: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 10);
/// Destination address of synthetic fragments
pub const FRAGMENT_DST: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 20);

/// Serialize a final `PacketBuilderStep` (udp, tcp or icmpv4) with `payload`.
macro_rules! build {
    ($builder:expr, $payload:expr) => {{
        let builder = $builder;
        let payload: &[u8] = $payload;
        let mut packet = Vec::with_capacity(builder.size(payload.len()));
        builder.write(&mut packet, payload).unwrap();
        packet
    }};
}

fn eth_header(ether_type: EtherType) -> Vec<u8> {
    Ethernet2Header {
        source: SRC_MAC.0,
        destination: DST_MAC.0,
        ether_type,
    }
    .to_bytes()
    .to_vec()
}

#[must_use]
/// Builds a UDP/IPv4/Eth frame
pub fn eth_ipv4_udp(src: SocketAddrV4, dst: SocketAddrV4, ttl: u8, payload: &[u8]) -> Vec<u8> {
    let builder = PacketBuilder::ethernet2(SRC_MAC.0, DST_MAC.0)
        .ipv4(src.ip().octets(), dst.ip().octets(), ttl)
        .udp(src.port(), dst.port());
    build!(builder, payload)
}

#[must_use]
/// Builds a TCP SYN/IPv4/Eth frame
pub fn eth_ipv4_tcp_syn(src: SocketAddrV4, dst: SocketAddrV4, payload: &[u8]) -> Vec<u8> {
    let builder = PacketBuilder::ethernet2(SRC_MAC.0, DST_MAC.0)
        .ipv4(src.ip().octets(), dst.ip().octets(), 64)
        .tcp(src.port(), dst.port(), 1000, 64240)
        .syn();
    build!(builder, payload)
}

#[must_use]
/// Builds a UDP/IPv6/Eth frame
pub fn eth_ipv6_udp(
    src: SocketAddrV6,
    dst: SocketAddrV6,
    hop_limit: u8,
    payload: &[u8],
) -> Vec<u8> {
    let builder = PacketBuilder::ethernet2(SRC_MAC.0, DST_MAC.0)
        .ipv6(src.ip().octets(), dst.ip().octets(), hop_limit)
        .udp(src.port(), dst.port());
    build!(builder, payload)
}

#[must_use]
/// Builds a TCP SYN/IPv6/Eth frame
pub fn eth_ipv6_tcp_syn(src: SocketAddrV6, dst: SocketAddrV6, payload: &[u8]) -> Vec<u8> {
    let builder = PacketBuilder::ethernet2(SRC_MAC.0, DST_MAC.0)
        .ipv6(src.ip().octets(), dst.ip().octets(), 64)
        .tcp(src.port(), dst.port(), 1000, 64240)
        .syn();
    build!(builder, payload)
}

#[must_use]
/// Builds a headless UDP/IPv4 packet
pub fn ipv4_udp(src: SocketAddrV4, dst: SocketAddrV4, payload: &[u8]) -> Vec<u8> {
    let builder = PacketBuilder::ipv4(src.ip().octets(), dst.ip().octets(), 64)
        .udp(src.port(), dst.port());
    build!(builder, payload)
}

#[must_use]
/// Builds a headless UDP/IPv6 packet
pub fn ipv6_udp(src: SocketAddrV6, dst: SocketAddrV6, payload: &[u8]) -> Vec<u8> {
    let builder = PacketBuilder::ipv6(src.ip().octets(), dst.ip().octets(), 64)
        .udp(src.port(), dst.port());
    build!(builder, payload)
}

#[must_use]
/// Prefix an IP packet with a loopback header, in little-endian byte order.
pub fn loopback(family: u32, packet: &[u8]) -> Vec<u8> {
    let mut frame = family.to_le_bytes().to_vec();
    frame.extend_from_slice(packet);
    frame
}

#[must_use]
/// Builds an `ICMPv4` echo request in an Eth frame
pub fn eth_icmp4_echo(src: Ipv4Addr, dst: Ipv4Addr, id: u16, seq: u16) -> Vec<u8> {
    let builder = PacketBuilder::ethernet2(SRC_MAC.0, DST_MAC.0)
        .ipv4(src.octets(), dst.octets(), 64)
        .icmpv4_echo_request(id, seq);
    build!(builder, b"ping")
}

#[must_use]
/// Builds an `ICMPv4` port unreachable message in an Eth frame.
///
/// The message carries the IP header and first 8 payload bytes of `original`, a headless IPv4
/// packet.
pub fn eth_icmp4_unreachable(src: Ipv4Addr, dst: Ipv4Addr, original: &[u8]) -> Vec<u8> {
    let ihl = usize::from(original[0] & 0x0f) * 4;
    let quoted = &original[..original.len().min(ihl + 8)];
    let builder = PacketBuilder::ethernet2(SRC_MAC.0, DST_MAC.0)
        .ipv4(src.octets(), dst.octets(), 64)
        .icmpv4(Icmpv4Type::DestinationUnreachable(DestUnreachableHeader::Port));
    build!(builder, quoted)
}

#[must_use]
/// Builds an ARP request in an Eth broadcast frame
pub fn eth_arp_request(sender: Ipv4Addr, target: Ipv4Addr) -> Vec<u8> {
    let mut frame = Ethernet2Header {
        source: SRC_MAC.0,
        destination: Mac::BROADCAST.0,
        ether_type: EtherType::ARP,
    }
    .to_bytes()
    .to_vec();
    frame.extend_from_slice(&[0x00, 0x01, 0x08, 0x00, 6, 4, 0x00, 0x01]);
    frame.extend_from_slice(&SRC_MAC.0);
    frame.extend_from_slice(&sender.octets());
    frame.extend_from_slice(&Mac::ZERO.0);
    frame.extend_from_slice(&target.octets());
    frame
}

#[must_use]
/// Builds one fragment of an IPv4 datagram from [`FRAGMENT_SRC`] to [`FRAGMENT_DST`].
///
/// `offset` is in units of 8 bytes; `payload` is written as-is after the header.
pub fn eth_ipv4_fragment(
    id: u16,
    more_fragments: bool,
    offset: u16,
    protocol: IpNumber,
    payload: &[u8],
) -> Vec<u8> {
    let header = Ipv4Header {
        total_len: u16::try_from(20 + payload.len()).unwrap(),
        identification: id,
        more_fragments,
        fragment_offset: IpFragOffset::try_new(offset).unwrap(),
        time_to_live: 64,
        protocol,
        source: FRAGMENT_SRC.octets(),
        destination: FRAGMENT_DST.octets(),
        ..Default::default()
    };
    let mut frame = eth_header(EtherType::IPV4);
    frame.extend_from_slice(&header.to_bytes());
    frame.extend_from_slice(payload);
    frame
}

#[must_use]
/// Builds one fragment of an IPv6 datagram from `fd00::a` to `fd00::14`.
pub fn eth_ipv6_fragment(
    id: u32,
    more_fragments: bool,
    offset: u16,
    next_header: IpNumber,
    payload: &[u8],
) -> Vec<u8> {
    let header = Ipv6Header {
        payload_length: u16::try_from(8 + payload.len()).unwrap(),
        next_header: IpNumber::IPV6_FRAGMENTATION_HEADER,
        hop_limit: 64,
        source: Ipv6Addr::new(0xfd00, 0, 0, 0, 0, 0, 0, 0xa).octets(),
        destination: Ipv6Addr::new(0xfd00, 0, 0, 0, 0, 0, 0, 0x14).octets(),
        ..Default::default()
    };
    let fragment = Ipv6FragmentHeader::new(
        next_header,
        IpFragOffset::try_new(offset).unwrap(),
        more_fragments,
        id,
    );
    let mut frame = eth_header(EtherType::IPV6);
    frame.extend_from_slice(&header.to_bytes());
    frame.extend_from_slice(&fragment.to_bytes());
    frame.extend_from_slice(payload);
    frame
}
