// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! UDP header type and logic.

mod truncated;

pub use truncated::{TruncatedUdp, TruncatedUdpHeader};

use crate::parse::{Parse, ParseError, consumed, length_error};
use etherparse::UdpHeader;
use std::convert::Infallible;
use std::num::NonZero;

/// A UDP header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Udp(UdpHeader);

impl Udp {
    /// The length of a UDP header.
    pub const LENGTH: usize = 8;

    /// Get the header's source port
    #[must_use]
    pub const fn source(&self) -> u16 {
        self.0.source_port
    }

    /// Get the header's dest port
    #[must_use]
    pub const fn destination(&self) -> u16 {
        self.0.destination_port
    }

    /// The length of the packet (including the 8-byte udp header).
    ///
    /// No attempt is made to ensure this value is correct (you can't always trust the packet).
    #[must_use]
    pub const fn length(&self) -> u16 {
        self.0.length
    }

    /// Get the header's checksum.  No attempt is made to ensure that the checksum is correct.
    #[must_use]
    pub const fn checksum(&self) -> u16 {
        self.0.checksum
    }
}

impl Parse for Udp {
    type Error = Infallible;

    fn parse(buf: &[u8]) -> Result<(Self, NonZero<usize>), ParseError<Self::Error>> {
        let (header, rest) = UdpHeader::from_slice(buf)
            .map_err(|e| ParseError::Length(length_error(e.required_len, buf.len())))?;
        let consumed = consumed(buf, rest)
            .ok_or_else(|| ParseError::Length(length_error(Udp::LENGTH, buf.len())))?;
        Ok((Self(header), consumed))
    }
}

#[cfg(test)]
mod test {
    use super::Udp;
    use crate::parse::Parse;
    use etherparse::UdpHeader;

    #[test]
    fn fields_read_back() {
        bolero::check!()
            .with_type()
            .for_each(|(source_port, destination_port, length, checksum): &(u16, u16, u16, u16)| {
                let header = UdpHeader {
                    source_port: *source_port,
                    destination_port: *destination_port,
                    length: *length,
                    checksum: *checksum,
                };
                let (udp, consumed) = Udp::parse(&header.to_bytes()).unwrap();
                assert_eq!(consumed.get(), Udp::LENGTH);
                assert_eq!(udp.source(), *source_port);
                assert_eq!(udp.destination(), *destination_port);
                assert_eq!(udp.length(), *length);
                assert_eq!(udp.checksum(), *checksum);
            });
    }
}
