// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! `ICMPv6` header type.
//!
//! `ICMPv6` is decoded so that it can be named when rejected; no message is interpreted.

use crate::layers::{Header, ParsePayload};
use crate::parse::{Parse, ParseError, Reader, Truncation, consumed, length_error};
use etherparse::Icmpv6Header;
use std::convert::Infallible;
use std::num::NonZero;

/// An `ICMPv6` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Icmp6(Icmpv6Header);

impl Icmp6 {
    /// The message type
    #[must_use]
    pub fn type_u8(&self) -> u8 {
        self.0.icmp_type.type_u8()
    }
}

impl Parse for Icmp6 {
    type Error = Infallible;

    fn parse(buf: &[u8]) -> Result<(Self, NonZero<usize>), ParseError<Self::Error>> {
        let (inner, rest) = Icmpv6Header::from_slice(buf)
            .map_err(|e| ParseError::Length(length_error(e.required_len, buf.len())))?;
        let consumed =
            consumed(buf, rest).ok_or_else(|| ParseError::Length(length_error(8, buf.len())))?;
        Ok((Self(inner), consumed))
    }
}

impl ParsePayload for Icmp6 {
    fn parse_payload<'buf>(&self, _: Truncation, _: &mut Reader<'buf>) -> Option<Header<'buf>> {
        None
    }
}
