use std::io::{ErrorKind, Result};
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use socket2::{Domain, Protocol, SockAddr, Socket};

use crate::error::ProbeError;

/// Result of a bounded wait for an incoming datagram.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    TimedOut,
}

pub trait IcmpSocket {
    fn send_to(&self, buf: &[u8], destination: Ipv4Addr) -> Result<usize>;

    /// Blocks until a datagram can be read or `timeout` elapses. Never
    /// consumes the datagram.
    fn wait_readable(&self, timeout: Duration) -> Result<Readiness>;

    /// Reads one whole datagram, IP header included.
    fn recv(&self, buf: &mut [u8]) -> Result<usize>;
}

/// Raw ICMPv4 socket bound to the wildcard address. The kernel prepends the
/// IP header to everything read from it.
pub struct RawSocket {
    socket: Socket,
}

impl RawSocket {
    pub fn open(ttl: Option<u32>) -> std::result::Result<Self, ProbeError> {
        let stype = socket2::Type::raw().cloexec();
        let socket = Socket::new(Domain::ipv4(), stype, Some(Protocol::icmpv4()))
            .map_err(ProbeError::SocketCreation)?;

        let local = SockAddr::from(SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)));
        socket.bind(&local).map_err(ProbeError::Bind)?;

        if let Some(t) = ttl {
            socket.set_ttl(t).map_err(ProbeError::SetOption)?;
        }

        tracing::debug!("raw icmp socket open");
        Ok(RawSocket { socket })
    }
}

impl IcmpSocket for RawSocket {
    fn send_to(&self, buf: &[u8], destination: Ipv4Addr) -> Result<usize> {
        // ICMP has no ports
        let sock_addr = SockAddr::from(SocketAddr::from((destination, 0)));
        self.socket.send_to(buf, &sock_addr)
    }

    fn wait_readable(&self, timeout: Duration) -> Result<Readiness> {
        if timeout == Duration::from_secs(0) {
            return Ok(Readiness::TimedOut);
        }
        self.socket.set_read_timeout(Some(timeout))?;

        // A one byte peek blocks like a read but leaves the datagram queued
        let mut probe = [0u8; 1];
        match self.socket.peek(&mut probe) {
            Ok(_) => Ok(Readiness::Ready),
            Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => {
                Ok(Readiness::TimedOut)
            }
            Err(e) => Err(e),
        }
    }

    fn recv(&self, buf: &mut [u8]) -> Result<usize> {
        self.socket.recv(buf)
    }
}
