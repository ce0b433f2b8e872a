// ABOUTME: Phone number BCD codec with swapped nibbles per TS 23.040 §9.1.2.5
// ABOUTME: Handles international, unknown and alphanumeric address types

use crate::pdu::error::{PduError, PduResult};
use crate::pdu::gsm7;

/// Type-of-address octet as carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AddressType {
    /// National or otherwise unqualified number
    Unknown = 0x81,
    /// International number; decoded form carries a leading `+`
    International = 0x91,
    /// 7-bit packed text instead of digits (sender names used by banks etc.)
    Alphanumeric = 0xD0,
}

impl AddressType {
    /// Classify a raw type-of-address octet by its type-of-number bits.
    ///
    /// The top bit is a fixed marker in TS 23.040; an octet without it is
    /// not an address type at all.
    pub fn from_octet(octet: u8) -> PduResult<Self> {
        if octet & 0x80 == 0 {
            return Err(PduError::InvalidPdu("address type octet missing marker bit"));
        }
        Ok(match octet & 0x70 {
            0x10 => AddressType::International,
            0x50 => AddressType::Alphanumeric,
            _ => AddressType::Unknown,
        })
    }
}

/// True when `number` is an optional `+` followed by 4-15 decimal digits.
pub fn validate_phone_number(number: &str) -> bool {
    let digits = number.strip_prefix('+').unwrap_or(number);
    !digits.is_empty()
        && digits.bytes().all(|b| b.is_ascii_digit())
        && (4..=15).contains(&digits.len())
}

/// Encode a phone number into its address type and swapped-nibble BCD bytes.
///
/// A leading `+` selects the international address type and is not encoded
/// itself. An odd digit count pads the final high nibble with `0xF`.
pub fn encode_phone_number(number: &str) -> PduResult<(AddressType, Vec<u8>)> {
    if !validate_phone_number(number) {
        return Err(PduError::InvalidPhoneNumber(number.to_owned()));
    }
    let (addr_type, digits) = match number.strip_prefix('+') {
        Some(rest) => (AddressType::International, rest),
        None => (AddressType::Unknown, number),
    };

    let digits = digits.as_bytes();
    let mut out = Vec::with_capacity(digits.len().div_ceil(2));
    for pair in digits.chunks(2) {
        let low = pair[0] - b'0';
        let high = if pair.len() == 2 { pair[1] - b'0' } else { 0xF };
        out.push(high << 4 | low);
    }
    Ok((addr_type, out))
}

/// Count of address digits in a number string, excluding any `+`.
pub fn digit_count(number: &str) -> usize {
    number.bytes().filter(|b| b.is_ascii_digit()).count()
}

/// Decode `digits` address digits (semi-octets for alphanumeric addresses)
/// from swapped-nibble BCD bytes. The inverse of [`encode_phone_number`].
pub fn decode_phone_number(data: &[u8], digits: usize, addr_type: AddressType) -> PduResult<String> {
    if data.len() < digits.div_ceil(2) {
        return Err(PduError::InvalidPdu("address shorter than declared digit count"));
    }

    if addr_type == AddressType::Alphanumeric {
        // The length field counts semi-octets; 7 bits per character.
        let septets = digits * 4 / 7;
        return Ok(gsm7::from_septets(&gsm7::unpack(data, septets, 0)));
    }

    let mut out = String::with_capacity(digits + 1);
    if addr_type == AddressType::International {
        out.push('+');
    }
    for &byte in data.iter().take(digits.div_ceil(2)) {
        for nibble in [byte & 0x0F, byte >> 4] {
            if out.len() - usize::from(addr_type == AddressType::International) >= digits {
                break;
            }
            // The 0xF pad nibble only ever appears past the declared count.
            if nibble > 9 {
                return Err(PduError::InvalidPhoneNumber(out));
            }
            out.push((b'0' + nibble) as char);
        }
    }
    Ok(out)
}
