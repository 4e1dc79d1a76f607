// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! One-shot transport senders.
//!
//! Each call opens a fresh connection, writes once and drops the connection on return.

use std::io::Write;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, TcpStream, ToSocketAddrs, UdpSocket};
use tracing::debug;

/// Errors which may occur when sending.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    /// The peer could not be resolved or reached
    #[error("dial {addr}: {source}")]
    Dial {
        /// target address
        addr: String,
        /// underlying cause
        source: std::io::Error,
    },
    /// The connection was established but the write failed
    #[error("write to {addr}: {source}")]
    Write {
        /// target address
        addr: String,
        /// underlying cause
        source: std::io::Error,
    },
}

impl SendError {
    fn dial(addr: &str, source: std::io::Error) -> SendError {
        debug!("dial {addr} failed: {source}");
        SendError::Dial {
            addr: addr.to_string(),
            source,
        }
    }

    fn write(addr: &str, source: std::io::Error) -> SendError {
        debug!("write to {addr} failed: {source}");
        SendError::Write {
            addr: addr.to_string(),
            source,
        }
    }
}

/// Send `data` over a new TCP connection to `addr` (`host:port`).
///
/// # Errors
///
/// Returns [`SendError::Dial`] if the connection cannot be established and [`SendError::Write`]
/// if the data cannot be written.
pub fn send_tcp(addr: &str, data: &[u8]) -> Result<(), SendError> {
    let mut stream = TcpStream::connect(addr).map_err(|e| SendError::dial(addr, e))?;
    stream.write_all(data).map_err(|e| SendError::write(addr, e))
}

fn resolve(addr: &str) -> std::io::Result<SocketAddr> {
    addr.to_socket_addrs()?.next().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::NotFound, "no address to send to")
    })
}

/// Send `data` as one datagram to `addr` (`host:port`) from an ephemeral local port.
///
/// # Errors
///
/// Returns [`SendError::Dial`] if `addr` cannot be resolved or no socket can be bound and
/// [`SendError::Write`] if the datagram cannot be sent.
pub fn send_udp(addr: &str, data: &[u8]) -> Result<(), SendError> {
    let peer = resolve(addr).map_err(|e| SendError::dial(addr, e))?;
    let local = match peer {
        SocketAddr::V4(_) => SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
        SocketAddr::V6(_) => SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0)),
    };
    let socket = UdpSocket::bind(local).map_err(|e| SendError::dial(addr, e))?;
    socket.connect(peer).map_err(|e| SendError::dial(addr, e))?;
    socket.send(data).map_err(|e| SendError::write(addr, e))?;
    Ok(())
}
