// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Header parsing traits and the bounded cursor used to walk a packet.

use std::num::NonZero;

/// A header which can be read from the start of a byte buffer.
pub trait Parse: Sized {
    /// Content error of this header
    type Error: core::error::Error;
    /// Parse from a buffer.
    ///
    /// Returns the parsed value and the number of bytes it occupies at the start of `buf`.
    ///
    /// # Errors
    ///
    /// Returns an error in the event that parsing fails.
    fn parse(buf: &[u8]) -> Result<(Self, NonZero<usize>), ParseError<Self::Error>>;
}

/// A header whose parsing depends on a parameter.
pub trait ParseWith {
    /// Content error of this header
    type Error: core::error::Error;
    /// The parameter
    type Param;
    /// This function is spiritually similar to [`Parse::parse`] but is used in cases
    /// where parsing must be parameterized.
    ///
    /// # Errors
    ///
    /// Will return an error if parsing fails.
    fn parse_with(
        param: Self::Param,
        raw: &[u8],
    ) -> Result<(Self, NonZero<usize>), ParseError<Self::Error>>
    where
        Self: Sized;
}

/// Whether a transport header may be cut short by the end of the buffer.
///
/// Packets embedded in ICMP error messages only carry the first 64 bits of the original
/// datagram's payload (RFC 792), so TCP and UDP headers found there are often incomplete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Truncation {
    /// Every header must be complete.
    Forbidden,
    /// Transport headers may be truncated to their port fields.
    Allowed,
}

/// The buffer is shorter than the header being parsed.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("expected at least {expected} bytes, got {actual}")]
pub struct LengthError {
    pub(crate) expected: NonZero<usize>,
    pub(crate) actual: usize,
}

impl LengthError {
    /// The number of bytes the parser needed.
    #[must_use]
    pub fn expected(&self) -> NonZero<usize> {
        self.expected
    }

    /// The number of bytes that were available.
    #[must_use]
    pub fn actual(&self) -> usize {
        self.actual
    }
}

/// Errors which may occur when parsing a header.
#[derive(thiserror::Error, Debug)]
pub enum ParseError<E: core::error::Error> {
    /// Not enough bytes
    #[error(transparent)]
    Length(LengthError),
    /// The bytes do not form a valid header
    #[error(transparent)]
    Invalid(E),
}

/// Read-only cursor over a packet buffer.
///
/// The cursor never reads past `end`, which starts at the end of the buffer and can only shrink
/// (see [`Reader::bound`]).
#[derive(Debug)]
pub(crate) struct Reader<'buf> {
    inner: &'buf [u8],
    pos: usize,
    end: usize,
}

impl<'buf> Reader<'buf> {
    pub(crate) fn new(buf: &'buf [u8]) -> Reader<'buf> {
        Reader {
            inner: buf,
            pos: 0,
            end: buf.len(),
        }
    }

    /// The bytes not yet consumed.
    pub(crate) fn rest(&self) -> &'buf [u8] {
        &self.inner[self.pos..self.end]
    }

    /// Restrict the readable window to at most `len` bytes past the current position.
    ///
    /// Used to drop link-layer padding after an IP datagram whose length is known.
    pub(crate) fn bound(&mut self, len: usize) {
        self.end = self.end.min(self.pos.saturating_add(len));
    }

    fn consume(&mut self, n: NonZero<usize>) -> Result<(), LengthError> {
        let remaining = self.end - self.pos;
        if n.get() > remaining {
            return Err(LengthError {
                expected: n,
                actual: remaining,
            });
        }
        self.pos += n.get();
        Ok(())
    }

    pub(crate) fn parse<T: Parse>(&mut self) -> Result<(T, NonZero<usize>), ParseError<T::Error>> {
        let (value, len_consumed) = T::parse(self.rest())?;
        match self.consume(len_consumed) {
            Ok(()) => Ok((value, len_consumed)),
            Err(e) => Err(ParseError::Length(e)),
        }
    }

    pub(crate) fn parse_with<T: ParseWith>(
        &mut self,
        param: <T as ParseWith>::Param,
    ) -> Result<(T, NonZero<usize>), ParseError<T::Error>> {
        let (value, len_consumed) = T::parse_with(param, self.rest())?;
        match self.consume(len_consumed) {
            Ok(()) => Ok((value, len_consumed)),
            Err(e) => Err(ParseError::Length(e)),
        }
    }
}

/// Map a header length reported by etherparse to a [`LengthError`].
pub(crate) fn length_error(required: usize, actual: usize) -> LengthError {
    LengthError {
        expected: NonZero::new(required).unwrap_or(NonZero::<usize>::MIN),
        actual,
    }
}

/// Number of bytes consumed by a parser which returned the unparsed rest of `buf`.
pub(crate) fn consumed(buf: &[u8], rest: &[u8]) -> Option<NonZero<usize>> {
    NonZero::new(buf.len() - rest.len())
}
