// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The decoded layer stack of a packet and the generic decoder producing it.
//!
//! Decoding is lenient: it walks as far as it can and stops at the first layer it does not know or
//! cannot parse. Deciding whether the resulting stack is acceptable is the job of
//! [`crate::packet::Packet`].

use crate::arp::Arp;
use crate::eth::Eth;
use crate::icmp4::Icmp4;
use crate::icmp6::Icmp6;
use crate::ipv4::Ipv4;
use crate::ipv6::{Ipv6, Ipv6Fragment};
use crate::layer::LayerType;
use crate::loopback::Loopback;
use crate::parse::{Reader, Truncation};
use crate::protocol::{Unsupported, classify_ip_next_protocol};
use crate::tcp::TruncatedTcp;
use crate::udp::TruncatedUdp;
use etherparse::IpNumber;
use tracing::{debug, trace};

/// Link layer of a decoded packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Link {
    /// Null/loopback header
    Loopback(Loopback),
    /// Ethernet II header
    Ethernet(Eth),
}

impl Link {
    /// The [`LayerType`] of this header
    #[must_use]
    pub const fn layer_type(&self) -> LayerType {
        match self {
            Link::Loopback(_) => LayerType::Loopback,
            Link::Ethernet(_) => LayerType::Ethernet,
        }
    }

    /// The network layer announced by this header.
    ///
    /// # Errors
    ///
    /// Returns an [`Unsupported`] error if the ethertype or address family is not supported.
    pub fn next_layer(&self) -> Result<LayerType, Unsupported> {
        match self {
            Link::Loopback(lo) => lo.next_layer(),
            Link::Ethernet(eth) => eth.next_layer(),
        }
    }
}

/// Network layer of a decoded packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Net {
    /// IPv4 header
    Ipv4(Ipv4),
    /// IPv6 header
    Ipv6(Ipv6),
    /// ARP message
    Arp(Arp),
}

impl Net {
    /// The [`LayerType`] of this header
    #[must_use]
    pub const fn layer_type(&self) -> LayerType {
        match self {
            Net::Ipv4(_) => LayerType::Ipv4,
            Net::Ipv6(_) => LayerType::Ipv6,
            Net::Arp(_) => LayerType::Arp,
        }
    }
}

/// Transport layer of a decoded packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    /// TCP header (possibly truncated)
    Tcp(TruncatedTcp),
    /// UDP header (possibly truncated)
    Udp(TruncatedUdp),
    /// `ICMPv4` header
    Icmp4(Icmp4),
    /// `ICMPv6` header
    Icmp6(Icmp6),
}

impl Transport {
    /// The [`LayerType`] of this header
    #[must_use]
    pub const fn layer_type(&self) -> LayerType {
        match self {
            Transport::Tcp(_) => LayerType::Tcp,
            Transport::Udp(_) => LayerType::Udp,
            Transport::Icmp4(_) => LayerType::Icmp4,
            Transport::Icmp6(_) => LayerType::Icmp6,
        }
    }
}

/// One decoded header, as produced by a single step of the decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Header<'buf> {
    Loopback(Loopback),
    Eth(Eth),
    Arp(Arp),
    Ipv4(Ipv4),
    Ipv6(Ipv6),
    Ipv6Fragment(Ipv6Fragment),
    Tcp(TruncatedTcp),
    Udp(TruncatedUdp),
    Icmp4(Icmp4),
    Icmp6(Icmp6),
    /// Payload of a non-initial fragment
    Fragment(&'buf [u8]),
}

/// Decode the header following `self` from the cursor.
pub(crate) trait ParsePayload {
    fn parse_payload<'buf>(&self, mode: Truncation, cursor: &mut Reader<'buf>)
    -> Option<Header<'buf>>;
}

impl<'buf> Header<'buf> {
    fn parse_payload(&self, mode: Truncation, cursor: &mut Reader<'buf>) -> Option<Header<'buf>> {
        match self {
            Header::Loopback(lo) => lo.parse_payload(mode, cursor),
            Header::Eth(eth) => eth.parse_payload(mode, cursor),
            Header::Arp(arp) => arp.parse_payload(mode, cursor),
            Header::Ipv4(ipv4) => ipv4.parse_payload(mode, cursor),
            Header::Ipv6(ipv6) => ipv6.parse_payload(mode, cursor),
            Header::Ipv6Fragment(fragment) => fragment.parse_payload(mode, cursor),
            Header::Tcp(tcp) => tcp.parse_payload(mode, cursor),
            Header::Udp(udp) => udp.parse_payload(mode, cursor),
            Header::Icmp4(icmp) => icmp.parse_payload(mode, cursor),
            Header::Icmp6(icmp) => icmp.parse_payload(mode, cursor),
            Header::Fragment(_) => None,
        }
    }
}

/// Decode the transport header announced by an IP protocol / next header number.
pub(crate) fn parse_transport<'buf>(
    protocol: IpNumber,
    mode: Truncation,
    cursor: &mut Reader<'buf>,
) -> Option<Header<'buf>> {
    match classify_ip_next_protocol(protocol) {
        Ok(LayerType::Tcp) => cursor
            .parse_with::<TruncatedTcp>(mode)
            .map_err(|e| {
                debug!("failed to parse tcp: {e:?}");
            })
            .map(|(tcp, _)| Header::Tcp(tcp))
            .ok(),
        Ok(LayerType::Udp) => cursor
            .parse_with::<TruncatedUdp>(mode)
            .map_err(|e| {
                debug!("failed to parse udp: {e:?}");
            })
            .map(|(udp, _)| Header::Udp(udp))
            .ok(),
        Ok(LayerType::Icmp4) => cursor
            .parse::<Icmp4>()
            .map_err(|e| {
                debug!("failed to parse icmp4: {e:?}");
            })
            .map(|(icmp, _)| Header::Icmp4(icmp))
            .ok(),
        Ok(LayerType::Icmp6) => cursor
            .parse::<Icmp6>()
            .map_err(|e| {
                debug!("failed to parse icmp6: {e:?}");
            })
            .map(|(icmp, _)| Header::Icmp6(icmp))
            .ok(),
        Ok(other) => {
            trace!("ip payload {other} not decoded");
            None
        }
        Err(e) => {
            trace!("{e}");
            None
        }
    }
}

/// The layers found in a packet buffer.
///
/// Every layer is optional; a layer is present only if all layers below it were decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layers<'buf> {
    data: &'buf [u8],
    link: Option<Link>,
    net: Option<Net>,
    net_payload: Option<&'buf [u8]>,
    ipv6_fragment: Option<Ipv6Fragment>,
    fragment_payload: Option<&'buf [u8]>,
    transport: Option<Transport>,
    fragment: Option<&'buf [u8]>,
    payload: Option<&'buf [u8]>,
}

fn non_empty(bytes: &[u8]) -> Option<&[u8]> {
    if bytes.is_empty() { None } else { Some(bytes) }
}

impl<'buf> Layers<'buf> {
    /// Decode `data`, starting with a header of type `first`.
    ///
    /// `first` may be [`LayerType::Ethernet`], [`LayerType::Loopback`], [`LayerType::Ipv4`] or
    /// [`LayerType::Ipv6`]; any other start yields an empty stack.
    #[must_use]
    pub fn decode(data: &'buf [u8], first: LayerType) -> Layers<'buf> {
        Layers::decode_with(data, first, Truncation::Forbidden)
    }

    /// Decode `data` like [`Layers::decode`], choosing whether transport headers may be truncated.
    #[must_use]
    pub fn decode_with(data: &'buf [u8], first: LayerType, mode: Truncation) -> Layers<'buf> {
        let mut this = Layers {
            data,
            link: None,
            net: None,
            net_payload: None,
            ipv6_fragment: None,
            fragment_payload: None,
            transport: None,
            fragment: None,
            payload: None,
        };
        let mut cursor = Reader::new(data);
        let first = match first {
            LayerType::Ethernet => cursor.parse::<Eth>().map(|(eth, _)| Header::Eth(eth)).ok(),
            LayerType::Loopback => cursor
                .parse::<Loopback>()
                .map(|(lo, _)| Header::Loopback(lo))
                .ok(),
            LayerType::Ipv4 => cursor
                .parse::<Ipv4>()
                .map_err(|e| {
                    debug!("failed to parse ipv4: {e:?}");
                })
                .map(|(ipv4, _)| Header::Ipv4(ipv4))
                .ok(),
            LayerType::Ipv6 => cursor
                .parse::<Ipv6>()
                .map_err(|e| {
                    debug!("failed to parse ipv6: {e:?}");
                })
                .map(|(ipv6, _)| Header::Ipv6(ipv6))
                .ok(),
            other => {
                trace!("cannot start decoding at {other}");
                None
            }
        };
        let Some(mut prior) = first else {
            return this;
        };
        loop {
            match &prior {
                // a zero total length (segmentation offload) runs to the end of the buffer
                Header::Ipv4(ipv4) if ipv4.total_len() != 0 => cursor.bound(ipv4.payload_len()),
                Header::Ipv6(ipv6) if ipv6.payload_length() != 0 => {
                    cursor.bound(usize::from(ipv6.payload_length()));
                }
                _ => {}
            }
            let rest = non_empty(cursor.rest());
            let header = prior.parse_payload(mode, &mut cursor);
            match prior {
                Header::Loopback(lo) => this.link = Some(Link::Loopback(lo)),
                Header::Eth(eth) => this.link = Some(Link::Ethernet(eth)),
                Header::Arp(arp) => this.net = Some(Net::Arp(arp)),
                Header::Ipv4(ipv4) => {
                    this.net = Some(Net::Ipv4(ipv4));
                    this.net_payload = rest;
                }
                Header::Ipv6(ipv6) => {
                    this.net = Some(Net::Ipv6(ipv6));
                    this.net_payload = rest;
                }
                Header::Ipv6Fragment(fragment) => {
                    this.ipv6_fragment = Some(fragment);
                    this.fragment_payload = rest;
                }
                Header::Tcp(tcp) => {
                    this.transport = Some(Transport::Tcp(tcp));
                    this.payload = rest;
                }
                Header::Udp(udp) => {
                    this.transport = Some(Transport::Udp(udp));
                    this.payload = rest;
                }
                Header::Icmp4(icmp) => {
                    this.transport = Some(Transport::Icmp4(icmp));
                    this.payload = rest;
                }
                Header::Icmp6(icmp) => {
                    this.transport = Some(Transport::Icmp6(icmp));
                    this.payload = rest;
                }
                Header::Fragment(bytes) => this.fragment = Some(bytes),
            }
            match header {
                None => break,
                Some(next) => prior = next,
            }
        }
        this
    }

    /// The whole decoded buffer
    #[must_use]
    pub const fn data(&self) -> &'buf [u8] {
        self.data
    }

    /// The link layer, if one was decoded
    #[must_use]
    pub const fn link(&self) -> Option<&Link> {
        self.link.as_ref()
    }

    /// The network layer, if one was decoded
    #[must_use]
    pub const fn net(&self) -> Option<&Net> {
        self.net.as_ref()
    }

    /// The IPv6 fragment extension header, if one was decoded
    #[must_use]
    pub const fn ipv6_fragment(&self) -> Option<&Ipv6Fragment> {
        self.ipv6_fragment.as_ref()
    }

    /// The transport layer, if one was decoded
    #[must_use]
    pub const fn transport(&self) -> Option<&Transport> {
        self.transport.as_ref()
    }

    /// Payload of a non-initial fragment (which carries no transport header)
    #[must_use]
    pub const fn fragment(&self) -> Option<&'buf [u8]> {
        self.fragment
    }

    /// Bytes following the network header, bounded by the length it announces.
    ///
    /// For IPv6 fragments these are the bytes after the fragment extension header.
    #[must_use]
    pub fn net_payload(&self) -> Option<&'buf [u8]> {
        if self.ipv6_fragment.is_some() {
            self.fragment_payload
        } else {
            self.net_payload
        }
    }

    /// Bytes following the transport header
    #[must_use]
    pub const fn payload(&self) -> Option<&'buf [u8]> {
        self.payload
    }

    /// Returns true if a layer of type `layer` was decoded.
    #[must_use]
    pub fn layer(&self, layer: LayerType) -> bool {
        match layer {
            LayerType::Loopback | LayerType::Ethernet => {
                self.link.as_ref().map(Link::layer_type) == Some(layer)
            }
            LayerType::Arp | LayerType::Ipv4 | LayerType::Ipv6 => {
                self.net.as_ref().map(Net::layer_type) == Some(layer)
            }
            LayerType::Ipv6Fragment => self.ipv6_fragment.is_some(),
            LayerType::Tcp | LayerType::Udp | LayerType::Icmp4 | LayerType::Icmp6 => {
                self.transport.as_ref().map(Transport::layer_type) == Some(layer)
            }
            LayerType::Fragment => self.fragment.is_some(),
            LayerType::Payload => self.payload.is_some(),
        }
    }

    pub(crate) fn into_parts(self) -> LayerParts<'buf> {
        let net_payload = self.net_payload();
        LayerParts {
            data: self.data,
            link: self.link,
            net: self.net,
            net_payload,
            ipv6_fragment: self.ipv6_fragment,
            transport: self.transport,
            fragment: self.fragment,
            payload: self.payload,
        }
    }
}

/// The owned pieces of a [`Layers`], handed over to the packet descriptor.
pub(crate) struct LayerParts<'buf> {
    pub(crate) data: &'buf [u8],
    pub(crate) link: Option<Link>,
    pub(crate) net: Option<Net>,
    pub(crate) net_payload: Option<&'buf [u8]>,
    pub(crate) ipv6_fragment: Option<Ipv6Fragment>,
    pub(crate) transport: Option<Transport>,
    pub(crate) fragment: Option<&'buf [u8]>,
    pub(crate) payload: Option<&'buf [u8]>,
}
