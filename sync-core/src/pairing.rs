//! Pairing codes and peer address derivation.
//!
//! The pairing flow:
//! 1. The serving peer looks up its own IPv4 address and shows the last
//!    octet as the pairing code.
//! 2. The code is relayed out-of-band (read aloud, typed in).
//! 3. The connecting peer takes its own first three octets and appends the
//!    code, yielding the server's address on a shared /24.
//!
//! Peers on different subnets derive a wrong address; that surfaces as a
//! connection failure, not as a protocol error.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};
use std::str::FromStr;
use thiserror::Error;

/// Port shared by the service and the client.
pub const DEFAULT_PORT: u16 = 27125;

/// Error type for pairing operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PairingError {
    /// The code is not a decimal number in 0..=255.
    #[error("invalid pairing code {0:?}: expected a number from 0 to 255")]
    InvalidCode(String),
    /// No usable (non-loopback) IPv4 address could be determined.
    #[error("could not determine a local IPv4 address: {0}")]
    NoLocalAddress(String),
}

/// The last octet of the serving peer's IPv4 address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PairingCode(u8);

impl PairingCode {
    /// Wrap a raw octet.
    pub fn new(octet: u8) -> Self {
        Self(octet)
    }

    /// The code for a local address.
    pub fn from_local(addr: Ipv4Addr) -> Self {
        Self(addr.octets()[3])
    }

    /// The raw octet.
    pub fn octet(&self) -> u8 {
        self.0
    }
}

impl FromStr for PairingCode {
    type Err = PairingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
            return Err(PairingError::InvalidCode(s.to_string()));
        }
        trimmed
            .parse::<u8>()
            .map(Self)
            .map_err(|_| PairingError::InvalidCode(s.to_string()))
    }
}

impl fmt::Display for PairingCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A peer address derived from a subnet prefix and a pairing code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairingAddress {
    /// First three octets, taken from the connecting peer's own address.
    pub prefix: [u8; 3],
    /// Host octet supplied by the user.
    pub host: PairingCode,
}

impl PairingAddress {
    /// Combine the local /24 prefix with the peer's code.
    pub fn resolve(local: Ipv4Addr, code: PairingCode) -> Self {
        let [a, b, c, _] = local.octets();
        Self {
            prefix: [a, b, c],
            host: code,
        }
    }

    /// The derived IPv4 address.
    pub fn ip(&self) -> Ipv4Addr {
        let [a, b, c] = self.prefix;
        Ipv4Addr::new(a, b, c, self.host.octet())
    }

    /// The derived socket address on `port`.
    pub fn socket_addr(&self, port: u16) -> SocketAddr {
        SocketAddr::new(IpAddr::V4(self.ip()), port)
    }
}

impl fmt::Display for PairingAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ip())
    }
}

/// Determine the IPv4 address of the interface that routes off-host.
///
/// Connects an unbound UDP socket to a public address, which makes the OS
/// pick a source address without sending any packet.
pub fn probe_local_ipv4() -> Result<Ipv4Addr, PairingError> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
        .map_err(|e| PairingError::NoLocalAddress(e.to_string()))?;
    socket
        .connect((Ipv4Addr::new(192, 0, 2, 1), 9))
        .map_err(|e| PairingError::NoLocalAddress(e.to_string()))?;
    let local = socket
        .local_addr()
        .map_err(|e| PairingError::NoLocalAddress(e.to_string()))?;

    match local.ip() {
        IpAddr::V4(ip) if usable(ip) => Ok(ip),
        other => Err(PairingError::NoLocalAddress(format!(
            "no routable interface (got {})",
            other
        ))),
    }
}

fn usable(ip: Ipv4Addr) -> bool {
    !ip.is_loopback() && !ip.is_unspecified() && !ip.is_broadcast()
}
