use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

use crate::error::ProbeError;
use crate::util;

pub const ICMP_ECHO_REPLY: u8 = 0;
pub const ICMP_ECHO_REQUEST: u8 = 8;

pub const IPV4_HEADER_LEN: usize = 20;
pub const ECHO_HEADER_LEN: usize = 8;
pub const PAYLOAD_LEN: usize = 64;
pub const ECHO_MESSAGE_LEN: usize = ECHO_HEADER_LEN + PAYLOAD_LEN;

const PAYLOAD_MARKER: &[u8] = b"Echo to Check Availability";

/// Type, code and checksum of any ICMP message, followed by the echo
/// identifier and sequence words. Error messages share the first four bytes;
/// for them the last two fields are just the "unused" word reinterpreted.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct EchoHeader {
    pub message_type: u8,
    pub message_code: u8,
    pub checksum: u16,
    pub identifier: u16,
    pub sequence_num: u16,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct IPv4Header {
    pub version_and_header_len: u8,
    pub type_of_service: u8,
    pub datagram_length: u16,
    pub ip_identifier: u16,
    pub flags_and_frag_offset: u16, // flags are u3
    pub ttl: u8,
    pub protocol: u8,
    pub checksum: u16,
    pub source_ip: u32,
    pub destination_ip: u32,
}

impl IPv4Header {
    /// Header length in bytes, encoded on the wire as a count of 32 bit words.
    pub fn header_len(&self) -> usize {
        4 * (self.version_and_header_len & 0x0F) as usize
    }

    pub fn source(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.source_ip)
    }

    pub fn destination(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.destination_ip)
    }
}

/// ICMP and IP headers use big endian with fixed width integers.
pub fn coder() -> bincode::Config {
    let mut coder = bincode::config();
    coder.big_endian();
    coder
}

/// An Echo Request as a value. Each attempt gets its own request built with
/// [`EchoRequest::next`], and the checksum is derived in [`EchoRequest::encode`]
/// from the exact bytes that go out.
#[derive(Clone, Debug, PartialEq)]
pub struct EchoRequest {
    identifier: u16,
    sequence: u16,
    payload: [u8; PAYLOAD_LEN],
}

impl EchoRequest {
    /// First request of a run: sequence 1, marker payload.
    pub fn new(identifier: u16) -> Self {
        let mut payload = [0u8; PAYLOAD_LEN];
        payload[..PAYLOAD_MARKER.len()].copy_from_slice(PAYLOAD_MARKER);
        EchoRequest {
            identifier,
            sequence: 1,
            payload,
        }
    }

    pub fn identifier(&self) -> u16 {
        self.identifier
    }

    pub fn sequence(&self) -> u16 {
        self.sequence
    }

    /// The request for the following attempt.
    pub fn next(&self) -> Self {
        EchoRequest {
            sequence: self.sequence.wrapping_add(1),
            ..self.clone()
        }
    }

    fn header(&self, checksum: u16) -> EchoHeader {
        EchoHeader {
            message_type: ICMP_ECHO_REQUEST,
            message_code: 0,
            checksum,
            identifier: self.identifier,
            sequence_num: self.sequence,
        }
    }

    /// Serializes header and payload with the checksum computed over the
    /// whole message while its field is zero.
    pub fn encode(&self) -> Result<Vec<u8>, ProbeError> {
        let coder = coder();
        let mut message = coder.serialize(&self.header(0))?;
        message.extend_from_slice(&self.payload);

        let sum = util::checksum(&message);
        message[2..4].copy_from_slice(&sum.to_be_bytes());
        Ok(message)
    }
}

/// A datagram read from the raw socket: the IP header the kernel prepends and
/// the leading ICMP words of whatever message followed it.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceivedMessage {
    pub ip: IPv4Header,
    pub icmp: EchoHeader,
    /// Bytes actually received, IP header included.
    pub size: usize,
}

impl ReceivedMessage {
    pub fn parse(datagram: &[u8]) -> Result<Self, ProbeError> {
        let malformed = || ProbeError::MalformedReply {
            len: datagram.len(),
        };
        if datagram.len() < IPV4_HEADER_LEN {
            return Err(malformed());
        }

        let coder = coder();
        let ip = coder.deserialize::<IPv4Header>(datagram)?;

        // The ICMP portion will be located after the IP header, options included
        let data_offset = ip.header_len();
        if data_offset < IPV4_HEADER_LEN || datagram.len() < data_offset + ECHO_HEADER_LEN {
            return Err(malformed());
        }
        let icmp = coder.deserialize::<EchoHeader>(&datagram[data_offset..])?;

        Ok(ReceivedMessage {
            ip,
            icmp,
            size: datagram.len(),
        })
    }

    pub fn is_echo_reply(&self) -> bool {
        self.icmp.message_type == ICMP_ECHO_REPLY && self.icmp.message_code == 0
    }

    pub fn is_echo_request(&self) -> bool {
        self.icmp.message_type == ICMP_ECHO_REQUEST && self.icmp.message_code == 0
    }
}

/// Human readable classification of an ICMP error message.
pub fn describe_icmp_error(message_type: u8, code: u8) -> &'static str {
    match (message_type, code) {
        (3, 0) => "Destination Unreachable: Net Unreachable (Type 3, Code 0)",
        (3, 1) => "Destination Unreachable: Host Unreachable (Type 3, Code 1)",
        (3, 2) => "Destination Unreachable: Protocol Unreachable (Type 3, Code 2)",
        (3, 3) => "Destination Unreachable: Port Unreachable (Type 3, Code 3)",
        (3, 4) => "Destination Unreachable: Fragmentation Needed (Type 3, Code 4)",
        (3, 5) => "Destination Unreachable: Source Route Failed (Type 3, Code 5)",
        (3, 6) => "Destination Unreachable: Destination Network Unknown (Type 3, Code 6)",
        (3, 7) => "Destination Unreachable: Destination Host Unknown (Type 3, Code 7)",
        (3, 8) => "Destination Unreachable: Source Host Isolated (Type 3, Code 8)",
        (3, 11) => "Destination Unreachable: Destination Network Unreachable for Type of Service (Type 3, Code 11)",
        (3, 12) => "Destination Unreachable: Destination Host Unreachable for Type of Service (Type 3, Code 12)",
        (3, 13) => "Destination Unreachable: Communication Administratively Prohibited (Type 3, Code 13)",
        (3, 14) => "Destination Unreachable: Host Precedence Violation (Type 3, Code 14)",
        (3, 15) => "Destination Unreachable: Precedence Cutoff in Effect (Type 3, Code 15)",
        (3, _) => "Destination Unreachable: Unknown Code",

        (5, 1) => "Redirect: Redirect for Destination Host (Type 5, Code 1)",
        (5, 3) => "Redirect: Redirect for Destination Host Based on Type-of-Service (Type 5, Code 3)",
        (5, _) => "Redirect: Unknown Code",

        (11, 0) => "Time Exceeded: Time-to-Live Exceeded in Transit (Type 11, Code 0)",
        (11, 1) => "Time Exceeded: Fragment Reassembly Time Exceeded (Type 11, Code 1)",
        (11, _) => "Time Exceeded: Unknown Code",

        (12, 0) => "Parameter Problem: Pointer indicates the error (Type 12, Code 0)",
        (12, 1) => "Parameter Problem: Missing a Required Option (Type 12, Code 1)",
        (12, 2) => "Parameter Problem: Bad Length (Type 12, Code 2)",
        (12, _) => "Parameter Problem: Unknown Code",

        _ => "ICMP Error: Unknown Type",
    }
}
