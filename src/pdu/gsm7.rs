// ABOUTME: GSM 03.38 default alphabet tables and 7-bit septet packing
// ABOUTME: Implements TS 23.038 tables 6.2.1.1/6.2.1.2 with LSB-first octet packing

use crate::pdu::error::{PduError, PduResult};

/// Escape septet introducing the extension table.
pub const ESCAPE: u8 = 0x1B;

/// The 128-entry GSM 7-bit default alphabet (TS 23.038 table 6.2.1.1).
///
/// Index 0x1B is the escape septet and never decodes to a character on its
/// own; the placeholder at that slot is unreachable through `from_septets`.
const BASE_ALPHABET: [char; 128] = [
    '@', '£', '$', '¥', 'è', 'é', 'ù', 'ì', 'ò', 'Ç', '\n', 'Ø', 'ø', '\r', 'Å', 'å',
    'Δ', '_', 'Φ', 'Γ', 'Λ', 'Ω', 'Π', 'Ψ', 'Σ', 'Θ', 'Ξ', '\u{1B}', 'Æ', 'æ', 'ß', 'É',
    ' ', '!', '"', '#', '¤', '%', '&', '\'', '(', ')', '*', '+', ',', '-', '.', '/',
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', ':', ';', '<', '=', '>', '?',
    '¡', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O',
    'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', 'Ä', 'Ö', 'Ñ', 'Ü', '§',
    '¿', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o',
    'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z', 'ä', 'ö', 'ñ', 'ü', 'à',
];

/// Extension table (TS 23.038 table 6.2.1.2), reached via the escape septet.
/// Every character here occupies two septets on the wire.
const EXT_ALPHABET: [(u8, char); 10] = [
    (0x0A, '\u{0C}'),
    (0x14, '^'),
    (0x28, '{'),
    (0x29, '}'),
    (0x2F, '\\'),
    (0x3C, '['),
    (0x3D, '~'),
    (0x3E, ']'),
    (0x40, '|'),
    (0x65, '€'),
];

fn base_septet(c: char) -> Option<u8> {
    if c == '\u{1B}' {
        return None;
    }
    BASE_ALPHABET.iter().position(|&b| b == c).map(|i| i as u8)
}

fn ext_septet(c: char) -> Option<u8> {
    EXT_ALPHABET.iter().find(|&&(_, e)| e == c).map(|&(s, _)| s)
}

fn ext_char(s: u8) -> Option<char> {
    EXT_ALPHABET.iter().find(|&&(e, _)| e == s).map(|&(_, c)| c)
}

/// True when every character of `text` is representable in the base or
/// extension alphabet; otherwise the message must use UCS-2.
pub fn is_gsm7_compatible(text: &str) -> bool {
    text.chars().all(|c| base_septet(c).is_some() || ext_septet(c).is_some())
}

/// Number of septets `text` occupies once encoded.
/// Extension characters count as two.
pub fn septet_length(text: &str) -> usize {
    text.chars()
        .map(|c| if ext_septet(c).is_some() { 2 } else { 1 })
        .sum()
}

/// Translate text to its septet values, escape pairs included.
pub fn to_septets(text: &str) -> PduResult<Vec<u8>> {
    let mut out = Vec::with_capacity(text.len());
    for c in text.chars() {
        if let Some(s) = base_septet(c) {
            out.push(s);
        } else if let Some(s) = ext_septet(c) {
            out.push(ESCAPE);
            out.push(s);
        } else {
            return Err(PduError::InvalidEncoding(format!(
                "character {c:?} is not in the GSM 7-bit alphabet"
            )));
        }
    }
    Ok(out)
}

/// Translate septet values back to text, resolving escape pairs.
///
/// An unknown escape combination falls back to the base character of the
/// second septet; a trailing lone escape is dropped.
pub fn from_septets(septets: &[u8]) -> String {
    let mut out = String::with_capacity(septets.len());
    let mut iter = septets.iter();
    while let Some(&s) = iter.next() {
        if s == ESCAPE {
            if let Some(&e) = iter.next() {
                match ext_char(e) {
                    Some(c) => out.push(c),
                    None => out.push(BASE_ALPHABET[(e & 0x7F) as usize]),
                }
            }
        } else {
            out.push(BASE_ALPHABET[(s & 0x7F) as usize]);
        }
    }
    out
}

/// Pack a septet stream into octets LSB-first: septet `n` starts at bit
/// `(pad_bits + 7n) mod 8` of octet `(pad_bits + 7n) / 8`. `pad_bits` zero
/// bits are inserted before the first septet to align text after a UDH.
pub fn pack(septets: &[u8], pad_bits: u8) -> Vec<u8> {
    if septets.is_empty() {
        return Vec::new();
    }
    let mut out = Vec::with_capacity((septets.len() * 7 + pad_bits as usize + 7) / 8);
    let mut acc: u32 = 0;
    let mut nbits: u32 = u32::from(pad_bits);
    for &s in septets {
        acc |= u32::from(s & 0x7F) << nbits;
        nbits += 7;
        while nbits >= 8 {
            out.push((acc & 0xFF) as u8);
            acc >>= 8;
            nbits -= 8;
        }
    }
    if nbits > 0 {
        out.push(acc as u8);
    }
    out
}

/// Unpack `count` septets from an LSB-first packed octet stream, skipping
/// `pad_bits` alignment bits first. The inverse of [`pack`].
pub fn unpack(data: &[u8], count: usize, pad_bits: u8) -> Vec<u8> {
    let mut out = Vec::with_capacity(count);
    let mut acc: u32 = 0;
    let mut nbits: u32 = 0;
    let mut skip = u32::from(pad_bits);
    for &b in data {
        acc |= u32::from(b) << nbits;
        nbits += 8;
        if skip > 0 {
            let take = skip.min(nbits);
            acc >>= take;
            nbits -= take;
            skip -= take;
        }
        while nbits >= 7 && out.len() < count {
            out.push((acc & 0x7F) as u8);
            acc >>= 7;
            nbits -= 7;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_hello_to_known_octets() {
        let septets = to_septets("Hello").unwrap();
        assert_eq!(pack(&septets, 0), [0xC8, 0x32, 0x9B, 0xFD, 0x06]);
    }

    #[test]
    fn pack_length_law() {
        for n in 1..=160 {
            let septets: Vec<u8> = (0..n).map(|i| (i % 128) as u8).collect();
            assert_eq!(pack(&septets, 0).len(), (7 * n as usize).div_ceil(8));
        }
    }

    #[test]
    fn unpack_inverts_pack() {
        let septets: Vec<u8> = (0..160).map(|i| (i % 128) as u8).collect();
        let packed = pack(&septets, 0);
        assert_eq!(unpack(&packed, septets.len(), 0), septets);
    }

    #[test]
    fn unpack_inverts_pack_with_padding() {
        let septets = to_septets("padded text").unwrap();
        for pad in 0..7u8 {
            let packed = pack(&septets, pad);
            assert_eq!(unpack(&packed, septets.len(), pad), septets);
        }
    }

    #[test]
    fn extension_characters_cost_two_septets() {
        assert_eq!(septet_length("€"), 2);
        assert_eq!(septet_length("a€b"), 4);
        let septets = to_septets("€").unwrap();
        assert_eq!(septets, [ESCAPE, 0x65]);
    }

    #[test]
    fn seven_bit_text_round_trip() {
        let text = "Hello @£$¥ {braces} [brackets] ^~|\\ €uro";
        assert!(is_gsm7_compatible(text));
        let septets = to_septets(text).unwrap();
        assert_eq!(from_septets(&septets), text);
    }

    #[test]
    fn cjk_is_not_compatible() {
        assert!(!is_gsm7_compatible("你好"));
        assert!(matches!(
            to_septets("你好"),
            Err(PduError::InvalidEncoding(_))
        ));
    }

    #[test]
    fn escape_is_never_a_plain_character() {
        assert!(!is_gsm7_compatible("\u{1B}"));
    }
}
