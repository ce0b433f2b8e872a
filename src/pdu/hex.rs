// ABOUTME: Uppercase hex conversion helpers for PDU wire strings
// ABOUTME: Rejects odd-length or non-hex input with typed errors

use crate::pdu::error::{PduError, PduResult};

/// Render bytes as uppercase hex, the form modems expect on the wire.
pub fn bytes_to_hex(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 2);
    for b in data {
        out.push_str(&format!("{b:02X}"));
    }
    out
}

/// Parse a hex string into bytes. Case-insensitive; whitespace is not allowed.
pub fn hex_to_bytes(data: &str) -> PduResult<Vec<u8>> {
    if data.len() % 2 != 0 {
        return Err(PduError::InvalidPdu("odd-length hex string"));
    }
    data.as_bytes()
        .chunks(2)
        .map(|pair| {
            let hi = hex_digit(pair[0])?;
            let lo = hex_digit(pair[1])?;
            Ok(hi << 4 | lo)
        })
        .collect()
}

fn hex_digit(b: u8) -> PduResult<u8> {
    match b {
        b'0'..=b'9' => Ok(b - b'0'),
        b'A'..=b'F' => Ok(b - b'A' + 10),
        b'a'..=b'f' => Ok(b - b'a' + 10),
        _ => Err(PduError::InvalidPdu("invalid hex digit")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let data = [0x01, 0x23, 0x45, 0x67, 0x89, 0xAB, 0xCD, 0xEF];
        let hex = bytes_to_hex(&data);
        assert_eq!(hex, "0123456789ABCDEF");
        assert_eq!(hex_to_bytes(&hex).unwrap(), data);
    }

    #[test]
    fn accepts_lowercase() {
        assert_eq!(hex_to_bytes("c8329bfd06").unwrap(), [0xC8, 0x32, 0x9B, 0xFD, 0x06]);
    }

    #[test]
    fn rejects_odd_length() {
        assert!(matches!(hex_to_bytes("ABC"), Err(PduError::InvalidPdu(_))));
    }

    #[test]
    fn rejects_non_hex() {
        assert!(matches!(hex_to_bytes("ZZ"), Err(PduError::InvalidPdu(_))));
    }
}
