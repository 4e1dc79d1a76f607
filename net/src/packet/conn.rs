// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Pairings of packets with the connection they travel on.

use crate::packet::Packet;

/// A parsed packet and the connection it arrived on.
#[derive(Debug, Clone)]
pub struct ConnPacket<'buf, C> {
    packet: Packet<'buf>,
    conn: C,
}

impl<'buf, C> ConnPacket<'buf, C> {
    /// Pair `packet` with `conn`
    #[must_use]
    pub const fn new(packet: Packet<'buf>, conn: C) -> ConnPacket<'buf, C> {
        ConnPacket { packet, conn }
    }

    /// The packet
    #[must_use]
    pub const fn packet(&self) -> &Packet<'buf> {
        &self.packet
    }

    /// The connection
    #[must_use]
    pub const fn conn(&self) -> &C {
        &self.conn
    }

    /// Split the pairing
    #[must_use]
    pub fn into_parts(self) -> (Packet<'buf>, C) {
        (self.packet, self.conn)
    }
}

/// Raw bytes and the connection they must be sent on.
#[derive(Debug, Clone)]
pub struct ConnBytes<C> {
    bytes: Vec<u8>,
    conn: C,
}

impl<C> ConnBytes<C> {
    /// Pair `bytes` with `conn`
    #[must_use]
    pub const fn new(bytes: Vec<u8>, conn: C) -> ConnBytes<C> {
        ConnBytes { bytes, conn }
    }

    /// The bytes
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The connection
    #[must_use]
    pub const fn conn(&self) -> &C {
        &self.conn
    }

    /// Split the pairing
    #[must_use]
    pub fn into_parts(self) -> (Vec<u8>, C) {
        (self.bytes, self.conn)
    }
}
