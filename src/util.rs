use std::io::{Error, ErrorKind, Result};
use std::net::Ipv4Addr;

/// Parses a literal dotted-quad address. No name resolution is attempted.
pub fn parse_destination(dest: &str) -> Result<Ipv4Addr> {
    dest.parse::<Ipv4Addr>()
        .map_err(|e| Error::new(ErrorKind::InvalidInput, format!("{}: {}", dest, e)))
}

/// Internet checksum (RFC 1071) of `data`.
///
/// The checksum field inside `data` must already be zero. The returned value
/// is meant to be written back big endian.
pub fn checksum(data: &[u8]) -> u16 {
    let mut sum = sum_be_words(data);
    while sum >> 16 != 0 {
        sum = (sum >> 16) + (sum & 0xFFFF);
    }

    !sum as u16 // The checksum field should be the ones complement of the sum
}

/// Sum all words (16 bit chunks) in the given data, each treated as big endian.
/// A trailing odd byte is padded with a zero low byte.
fn sum_be_words(data: &[u8]) -> u32 {
    data.chunks(2)
        .map(|word| match *word {
            [wh] => u16::from_be_bytes([wh, 0]),
            [wh, wl] => u16::from_be_bytes([wh, wl]),
            _ => unreachable!(),
        })
        .fold(0, |acc, w| acc.wrapping_add(w as u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zeroed_buffer_sums_to_all_ones() {
        assert_eq!(0xFFFF, checksum(&[0u8; 72]));
        assert_eq!(0xFFFF, checksum(&[]));
    }

    #[test]
    fn odd_byte_is_high_byte_of_padded_word() {
        assert_eq!(!0xAB00u16, checksum(&[0xAB]));
        // 0x0102 + 0x0300
        assert_eq!(!0x0402u16, checksum(&[0x01, 0x02, 0x03]));
    }

    #[test]
    fn carries_are_folded() {
        // 0xFFFF + 0x0001 = 0x1_0000 -> 0x0001
        assert_eq!(!0x0001u16, checksum(&[0xFF, 0xFF, 0x00, 0x01]));
    }

    #[test]
    fn rfc1071_sample() {
        let data = [0x00, 0x01, 0xF2, 0x03, 0xF4, 0xF5, 0xF6, 0xF7];
        assert_eq!(!0xDDF2u16, checksum(&data));
    }

    #[test]
    fn verifying_a_checksummed_buffer_yields_zero() {
        for len in [4usize, 8, 9, 72, 73].iter() {
            let mut data: Vec<u8> = (0..*len).map(|i| (i * 37 + 11) as u8).collect();
            data[2] = 0;
            data[3] = 0;
            let sum = checksum(&data);
            data[2..4].copy_from_slice(&sum.to_be_bytes());
            assert_eq!(0, checksum(&data), "len {}", len);
        }
    }

    #[test]
    fn parse_destination_accepts_dotted_quad_only() {
        assert_eq!(
            Ipv4Addr::new(192, 168, 1, 20),
            parse_destination("192.168.1.20").unwrap()
        );
        assert!(parse_destination("localhost").is_err());
        assert!(parse_destination("::1").is_err());
        assert!(parse_destination("256.0.0.1").is_err());

        let err = parse_destination("10.0.0").unwrap_err();
        assert_eq!(ErrorKind::InvalidInput, err.kind());
    }
}
