// ABOUTME: UCS-2 (UTF-16 big-endian) user data encoding for SMS
// ABOUTME: Preserves surrogate pairs bit-exactly across encode/decode

use crate::pdu::error::{PduError, PduResult};

/// Encode text as big-endian UTF-16 code units.
///
/// Characters outside the BMP become surrogate pairs, so a single `char`
/// may occupy four octets.
pub fn encode(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() * 2);
    for unit in text.encode_utf16() {
        out.extend_from_slice(&unit.to_be_bytes());
    }
    out
}

/// Decode big-endian UTF-16 code units back into text.
pub fn decode(data: &[u8]) -> PduResult<String> {
    if data.len() % 2 != 0 {
        return Err(PduError::InvalidEncoding(
            "UCS-2 user data has odd octet count".into(),
        ));
    }
    let units: Vec<u16> = data
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16(&units)
        .map_err(|_| PduError::InvalidEncoding("invalid UTF-16 in UCS-2 user data".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_cjk_big_endian() {
        assert_eq!(encode("你好"), [0x4F, 0x60, 0x59, 0x7D]);
    }

    #[test]
    fn round_trips_surrogate_pairs() {
        let text = "emoji \u{1F600} outside the BMP";
        assert_eq!(decode(&encode(text)).unwrap(), text);
    }

    #[test]
    fn rejects_odd_length() {
        assert!(matches!(
            decode(&[0x4F]),
            Err(PduError::InvalidEncoding(_))
        ));
    }

    #[test]
    fn rejects_lone_surrogate() {
        assert!(decode(&[0xD8, 0x00, 0x00, 0x41]).is_err());
    }
}
