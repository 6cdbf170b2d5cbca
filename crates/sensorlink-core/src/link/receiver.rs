//! Datagram receiver
//!
//! Owns the bound UDP socket for the lifetime of the monitor and hands out raw
//! payloads. Updating the last-contact clock is left to the caller.

use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;

use super::{LinkError, MAX_DATAGRAM_SIZE};

/// Result of a single receive poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    /// A datagram arrived
    Datagram {
        /// Raw payload bytes
        payload: Vec<u8>,
        /// Sender address
        from: SocketAddr,
    },
    /// Nothing arrived within the poll timeout
    Timeout,
}

/// UDP receiver bound to a single local endpoint
#[derive(Debug)]
pub struct DatagramReceiver {
    socket: UdpSocket,
    // One spare byte so oversized datagrams show up as oversized
    buf: Vec<u8>,
}

impl DatagramReceiver {
    /// Bind the receiver to `addr` (e.g. `0.0.0.0:5005`)
    pub async fn bind(addr: &str) -> Result<Self, LinkError> {
        let addr: SocketAddr = addr
            .parse()
            .map_err(|_| LinkError::InvalidAddress(addr.to_string()))?;

        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|source| LinkError::Bind {
                addr: addr.to_string(),
                source,
            })?;

        tracing::info!("Listening for telemetry on {}", addr);

        Ok(Self {
            socket,
            buf: vec![0u8; MAX_DATAGRAM_SIZE + 1],
        })
    }

    /// Local address the socket is bound to
    pub fn local_addr(&self) -> Result<SocketAddr, LinkError> {
        Ok(self.socket.local_addr()?)
    }

    /// Wait up to `timeout` for the next datagram
    ///
    /// Cancel safe: dropping the returned future before completion loses no
    /// datagram.
    pub async fn poll(&mut self, timeout: Duration) -> Result<Incoming, LinkError> {
        match tokio::time::timeout(timeout, self.socket.recv_from(&mut self.buf)).await {
            Err(_) => Ok(Incoming::Timeout),
            Ok(Ok((len, from))) => Ok(Incoming::Datagram {
                payload: self.buf[..len].to_vec(),
                from,
            }),
            Ok(Err(e)) => Err(LinkError::Receive(e)),
        }
    }

    /// Close the socket
    pub fn close(self) {
        if let Ok(addr) = self.socket.local_addr() {
            tracing::info!("Closing telemetry socket on {}", addr);
        }
        drop(self.socket);
    }
}
