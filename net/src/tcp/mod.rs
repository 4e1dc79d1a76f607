// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! TCP header type and logic.

mod truncated;

pub use truncated::{TruncatedTcp, TruncatedTcpHeader};

use crate::parse::{Parse, ParseError, consumed, length_error};
use etherparse::TcpHeader;
use etherparse::err::tcp::{HeaderError, HeaderSliceError};
use std::num::NonZero;

/// A TCP header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tcp(TcpHeader);

/// Errors which can occur when attempting to parse arbitrary bytes into a [`Tcp`] header.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TcpError {
    /// The data offset is smaller than the fixed header
    #[error("data offset too small: {0}")]
    DataOffsetTooSmall(u8),
}

impl Tcp {
    /// The minimum length of a [`Tcp`]
    pub const MIN_LENGTH: usize = 20;

    /// Get the source port
    #[must_use]
    pub const fn source(&self) -> u16 {
        self.0.source_port
    }

    /// Get the destination port
    #[must_use]
    pub const fn destination(&self) -> u16 {
        self.0.destination_port
    }

    /// Get the header length
    #[must_use]
    pub fn header_len(&self) -> usize {
        self.0.header_len()
    }

    /// Get the sequence number of the header.
    #[must_use]
    pub const fn sequence_number(&self) -> u32 {
        self.0.sequence_number
    }

    /// Returns true if the syn flag is set in this header
    #[must_use]
    pub const fn syn(&self) -> bool {
        self.0.syn
    }

    /// Returns true if the ack flag is set in this header
    #[must_use]
    pub const fn ack(&self) -> bool {
        self.0.ack
    }

    /// Returns true if the fin flag is set in this header
    #[must_use]
    pub const fn fin(&self) -> bool {
        self.0.fin
    }

    /// Returns true if the rst flag is set in this header
    #[must_use]
    pub const fn rst(&self) -> bool {
        self.0.rst
    }
}

impl Parse for Tcp {
    type Error = TcpError;

    fn parse(buf: &[u8]) -> Result<(Self, NonZero<usize>), ParseError<Self::Error>> {
        let (inner, rest) = TcpHeader::from_slice(buf).map_err(|e| match e {
            HeaderSliceError::Len(len) => {
                ParseError::Length(length_error(len.required_len, buf.len()))
            }
            HeaderSliceError::Content(content) => match content {
                HeaderError::DataOffsetTooSmall { data_offset } => {
                    ParseError::Invalid(TcpError::DataOffsetTooSmall(data_offset))
                }
            },
        })?;
        let consumed = consumed(buf, rest)
            .ok_or_else(|| ParseError::Length(length_error(Tcp::MIN_LENGTH, buf.len())))?;
        Ok((Self(inner), consumed))
    }
}
