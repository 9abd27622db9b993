use std::net::Ipv4Addr;
use std::thread;
use std::time::{Duration, Instant};

use crate::config::PingConfig;
use crate::error::ProbeError;
use crate::packet::{self, EchoRequest, ReceivedMessage};
use crate::socket::{IcmpSocket, RawSocket, Readiness};
use crate::stats::{RttStats, StopReason, Summary};

// Room for an IP header with options and a full echo message
const RECV_BUF_LEN: usize = 1024;

pub trait Clock {
    fn now(&self) -> Instant;
}

pub struct MonotonicClock;

impl Clock for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A successful echo reply.
#[derive(Clone, Debug, PartialEq)]
pub struct Pong {
    pub source: Ipv4Addr,
    pub sequence: u16,
    pub ttl: u8,
    /// Datagram size, IP header included.
    pub size: usize,
    pub rtt: Duration,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Reply(Pong),
    /// Nothing arrived within the wait window.
    TimedOut,
    /// An Echo Request came back instead of a reply.
    NotProcessed,
    IcmpError {
        source: Ipv4Addr,
        message_type: u8,
        code: u8,
        description: &'static str,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Attempt {
    pub sequence: u16,
    pub outcome: Outcome,
}

pub struct Pinger<S, C> {
    socket: S,
    clock: C,
    destination: Ipv4Addr,
    config: PingConfig,
    identifier: u16, // Used as 'identifier' word of every request in the run
}

impl Pinger<RawSocket, MonotonicClock> {
    /// Opens the raw socket. The echo identifier is the low half of the process id.
    pub fn new(destination: Ipv4Addr, config: PingConfig) -> Result<Self, ProbeError> {
        let socket = RawSocket::open(config.ttl)?;
        let identifier = std::process::id() as u16;
        Ok(Pinger::with_socket(
            socket,
            MonotonicClock,
            destination,
            config,
            identifier,
        ))
    }
}

impl<S: IcmpSocket, C: Clock> Pinger<S, C> {
    pub fn with_socket(
        socket: S,
        clock: C,
        destination: Ipv4Addr,
        config: PingConfig,
        identifier: u16,
    ) -> Self {
        Pinger {
            socket,
            clock,
            destination,
            config,
            identifier,
        }
    }

    pub fn destination(&self) -> Ipv4Addr {
        self.destination
    }

    /// Probes the destination until the attempt cap is reached or an attempt
    /// ends in anything but an echo reply. One request is outstanding at a
    /// time. `on_attempt` sees every resolved attempt in order.
    pub fn run<F>(&self, mut on_attempt: F) -> Result<Summary, ProbeError>
    where
        F: FnMut(&Attempt),
    {
        let mut rtt = RttStats::default();
        let mut transmitted = 0;
        if self.config.count == 0 {
            return Ok(Summary {
                transmitted,
                rtt,
                stop: StopReason::Completed,
            });
        }

        let mut request = EchoRequest::new(self.identifier);
        let stop = loop {
            let sent_at = self.send(&request)?;
            transmitted += 1;

            let outcome = self.await_reply(&request, sent_at)?;
            let stop = match &outcome {
                Outcome::Reply(pong) => {
                    rtt.record(pong.rtt);
                    None
                }
                Outcome::TimedOut => Some(StopReason::TimedOut),
                Outcome::NotProcessed => Some(StopReason::NotProcessed),
                Outcome::IcmpError { .. } => Some(StopReason::IcmpError),
            };
            on_attempt(&Attempt {
                sequence: request.sequence(),
                outcome,
            });

            if let Some(reason) = stop {
                break reason;
            }
            if transmitted >= self.config.count {
                break StopReason::Completed;
            }

            request = request.next();
            thread::sleep(self.config.interval);
        };

        tracing::info!(transmitted, received = rtt.count(), ?stop, "probing finished");
        Ok(Summary {
            transmitted,
            rtt,
            stop,
        })
    }

    fn send(&self, request: &EchoRequest) -> Result<Instant, ProbeError> {
        let message = request.encode()?;
        let sent_at = self.clock.now();
        self.socket
            .send_to(&message, self.destination)
            .map_err(ProbeError::Send)?;
        tracing::debug!(
            sequence = request.sequence(),
            bytes = message.len(),
            "echo request sent to {}",
            self.destination
        );
        Ok(sent_at)
    }

    fn await_reply(&self, request: &EchoRequest, sent_at: Instant) -> Result<Outcome, ProbeError> {
        match self
            .socket
            .wait_readable(self.config.timeout)
            .map_err(ProbeError::Wait)?
        {
            Readiness::Ready => {}
            Readiness::TimedOut => {
                tracing::trace!(sequence = request.sequence(), "no reply within {:?}", self.config.timeout);
                return Ok(Outcome::TimedOut);
            }
        }

        let mut buf = [0u8; RECV_BUF_LEN];
        let n = self.socket.recv(&mut buf).map_err(ProbeError::Receive)?;
        let received_at = self.clock.now();

        let message = ReceivedMessage::parse(&buf[..n])?;
        tracing::debug!(
            message_type = message.icmp.message_type,
            code = message.icmp.message_code,
            bytes = n,
            destination = %message.ip.destination(),
            "datagram from {}",
            message.ip.source()
        );

        Ok(self.classify(request, &message, received_at.duration_since(sent_at)))
    }

    fn classify(&self, request: &EchoRequest, message: &ReceivedMessage, rtt: Duration) -> Outcome {
        if message.is_echo_reply() {
            if message.icmp.identifier != request.identifier()
                || message.icmp.sequence_num != request.sequence()
            {
                tracing::warn!(
                    identifier = message.icmp.identifier,
                    sequence = message.icmp.sequence_num,
                    "echo reply does not match the outstanding request"
                );
            }
            Outcome::Reply(Pong {
                source: message.ip.source(),
                sequence: message.icmp.sequence_num,
                ttl: message.ip.ttl,
                size: message.size,
                rtt,
            })
        } else if message.is_echo_request() {
            // Treated as the end of the run, not as noise to skip: on some
            // loopback setups the request would keep coming back.
            Outcome::NotProcessed
        } else {
            let (message_type, code) = (message.icmp.message_type, message.icmp.message_code);
            Outcome::IcmpError {
                source: message.ip.source(),
                message_type,
                code,
                description: packet::describe_icmp_error(message_type, code),
            }
        }
    }
}
