// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

#![forbid(unsafe_code)] // Validation logic should always be strictly safe
#![deny(missing_docs, clippy::all, clippy::pedantic)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

//! Packet dissection for raw-socket tunnels.
//!
//! Frames captured on a raw socket are decoded into a [`layers::Layers`] stack, validated into a
//! [`packet::Packet`] descriptor, and queried for the addresses, fragmentation state and NAT flow
//! key a forwarding loop needs.

pub mod arp;
pub mod eth;
pub mod icmp4;
pub mod icmp6;
pub mod ipv4;
pub mod ipv6;
pub mod layer;
pub mod layers;
pub mod loopback;
pub mod packet;
pub mod parse;
pub mod protocol;
pub mod send;
pub mod tcp;
pub mod udp;
