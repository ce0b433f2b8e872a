// ABOUTME: SMS PDU decoding for DELIVER, SUBMIT and STATUS-REPORT layouts
// ABOUTME: Strict bounds checking so arbitrary bytes never panic the decoder

use crate::pdu::address::{decode_phone_number, AddressType};
use crate::pdu::error::{PduError, PduResult};
use crate::pdu::hex::hex_to_bytes;
use crate::pdu::timestamp::Timestamp;
use crate::pdu::{gsm7, ucs2};
use crate::pdu::{DeliveryStatus, Message, MessageEncoding, MessageType};

/// Decode a hex PDU string (SMSC prefix included) into a [`Message`].
pub fn decode(pdu_hex: &str) -> PduResult<Message> {
    let bytes = hex_to_bytes(pdu_hex.trim())?;
    let mut r = Reader::new(&bytes);

    let smsc = read_smsc(&mut r)?;

    let first_octet = r.u8("truncated first octet")?;
    let message_type = MessageType::try_from(first_octet & 0x03)
        .map_err(|_| PduError::Unsupported("reserved message type"))?;
    let udhi = first_octet & 0x40 != 0;

    let mut msg = Message {
        message_type,
        smsc,
        ..Message::default()
    };

    match message_type {
        MessageType::Deliver => {
            msg.phone_number = read_address(&mut r)?;
            let _pid = r.u8("truncated protocol identifier")?;
            let dcs = r.u8("truncated data coding scheme")?;
            (msg.encoding, msg.flash) = parse_dcs(dcs)?;
            msg.timestamp = Some(Timestamp::decode(r.take(7, "truncated timestamp")?)?);
            read_user_data(&mut r, &mut msg, udhi)?;
        }
        MessageType::Submit => {
            msg.request_status_report = first_octet & 0x20 != 0;
            let _mr = r.u8("truncated message reference")?;
            msg.phone_number = read_address(&mut r)?;
            let _pid = r.u8("truncated protocol identifier")?;
            let dcs = r.u8("truncated data coding scheme")?;
            (msg.encoding, msg.flash) = parse_dcs(dcs)?;
            match (first_octet >> 3) & 0x03 {
                0 => {}
                2 => {
                    msg.validity_period =
                        Some(crate::pdu::ValidityPeriod(r.u8("truncated validity period")?));
                }
                // Enhanced and absolute formats occupy 7 octets; skipped
                // without interpretation.
                _ => {
                    r.take(7, "truncated validity period")?;
                }
            }
            read_user_data(&mut r, &mut msg, udhi)?;
        }
        MessageType::StatusReport => {
            // The reference here is the MR of the original submit, which is
            // what callers correlate delivery reports by.
            msg.reference = r.u8("truncated message reference")?;
            msg.phone_number = read_address(&mut r)?;
            msg.timestamp = Some(Timestamp::decode(r.take(7, "truncated timestamp")?)?);
            let _discharge = Timestamp::decode(r.take(7, "truncated discharge time")?)?;
            msg.delivery_status = Some(DeliveryStatus(r.u8("truncated delivery status")?));
        }
    }

    Ok(msg)
}

fn read_smsc(r: &mut Reader<'_>) -> PduResult<String> {
    let len = r.u8("truncated SMSC length")? as usize;
    if len == 0 {
        return Ok(String::new());
    }
    let type_octet = r.u8("truncated SMSC address type")?;
    let addr_type = AddressType::from_octet(type_octet)?;
    let body = r.take(len - 1, "truncated SMSC address")?;

    let mut digits = body.len() * 2;
    if body.last().is_some_and(|b| b >> 4 == 0xF) {
        digits -= 1;
    }
    decode_phone_number(body, digits, addr_type).map_err(|_| {
        PduError::InvalidSmsc(crate::pdu::hex::bytes_to_hex(body))
    })
}

fn read_address(r: &mut Reader<'_>) -> PduResult<String> {
    let digits = r.u8("truncated address length")? as usize;
    let type_octet = r.u8("truncated address type")?;
    let addr_type = AddressType::from_octet(type_octet)?;
    let body = r.take(digits.div_ceil(2), "truncated address")?;
    decode_phone_number(body, digits, addr_type)
}

fn parse_dcs(dcs: u8) -> PduResult<(MessageEncoding, bool)> {
    match dcs & 0xC0 {
        0x00 => {
            let encoding = MessageEncoding::try_from(dcs & 0x0C).map_err(|_| {
                PduError::InvalidEncoding(format!("reserved alphabet in DCS {dcs:#04X}"))
            })?;
            // Class present with class 0 is a flash message.
            let flash = dcs & 0x10 != 0 && dcs & 0x03 == 0;
            Ok((encoding, flash))
        }
        // Message-waiting groups (TS 23.038 §4): text is 7-bit except the
        // UCS-2 storage group 0xE0.
        0xC0 => match dcs & 0xF0 {
            0xE0 => Ok((MessageEncoding::Ucs2, false)),
            0xF0 if dcs & 0x04 != 0 => Ok((MessageEncoding::EightBit, false)),
            _ => Ok((MessageEncoding::Gsm7Bit, false)),
        },
        _ => Err(PduError::InvalidEncoding(format!(
            "unsupported DCS {dcs:#04X}"
        ))),
    }
}

fn read_user_data(r: &mut Reader<'_>, msg: &mut Message, udhi: bool) -> PduResult<()> {
    let udl = r.u8("truncated user data length")? as usize;
    let ud = r.rest();

    let (udh_octets, body) = if udhi {
        let header_len = *ud.first().ok_or(PduError::InvalidUdh("missing header length"))? as usize;
        if 1 + header_len > ud.len() {
            return Err(PduError::InvalidUdh("header longer than user data"));
        }
        msg.udh = ud[1..1 + header_len].to_vec();
        if let Some((reference, total, part)) = parse_concat(&msg.udh)? {
            if total == 0 || part == 0 || part > total {
                return Err(PduError::InvalidUdh("concat index outside 1..=total"));
            }
            msg.reference = reference;
            msg.parts = total;
            msg.part = part;
        }
        (1 + header_len, &ud[1 + header_len..])
    } else {
        (0, ud)
    };

    match msg.encoding {
        MessageEncoding::Gsm7Bit => {
            // UDL counts septets across the whole field; the header region
            // rounds up to the next septet boundary.
            let header_septets = (udh_octets * 8).div_ceil(7);
            let pad = ((7 - (udh_octets * 8) % 7) % 7) as u8;
            let text_septets = udl
                .checked_sub(header_septets)
                .ok_or(PduError::InvalidPdu("UDL smaller than header"))?;
            if (body.len() * 8).saturating_sub(pad as usize) < text_septets * 7 {
                return Err(PduError::InvalidPdu("user data shorter than declared length"));
            }
            msg.text = gsm7::from_septets(&gsm7::unpack(body, text_septets, pad));
        }
        MessageEncoding::Ucs2 => {
            let text_len = udl
                .checked_sub(udh_octets)
                .ok_or(PduError::InvalidPdu("UDL smaller than header"))?;
            let body = body
                .get(..text_len)
                .ok_or(PduError::InvalidPdu("user data shorter than declared length"))?;
            msg.text = ucs2::decode(body)?;
        }
        MessageEncoding::EightBit => {
            let text_len = udl
                .checked_sub(udh_octets)
                .ok_or(PduError::InvalidPdu("UDL smaller than header"))?;
            let body = body
                .get(..text_len)
                .ok_or(PduError::InvalidPdu("user data shorter than declared length"))?;
            msg.text = body.iter().map(|&b| b as char).collect();
        }
    }
    Ok(())
}

/// Walk the UDH information elements, returning the 8-bit concatenation
/// triple when present. A 16-bit reference element (IEI 0x08) and unknown
/// elements are skipped by their declared length.
fn parse_concat(udh: &[u8]) -> PduResult<Option<(u8, u8, u8)>> {
    let mut found = None;
    let mut i = 0;
    while i < udh.len() {
        if i + 2 > udh.len() {
            return Err(PduError::InvalidUdh("truncated information element"));
        }
        let iei = udh[i];
        let len = udh[i + 1] as usize;
        i += 2;
        if i + len > udh.len() {
            return Err(PduError::InvalidUdh("information element overruns header"));
        }
        if iei == 0x00 {
            if len != 3 {
                return Err(PduError::InvalidUdh("concat element must be 3 bytes"));
            }
            found = Some((udh[i], udh[i + 1], udh[i + 2]));
        }
        i += len;
    }
    Ok(found)
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Reader { data, pos: 0 }
    }

    fn u8(&mut self, context: &'static str) -> PduResult<u8> {
        let b = *self
            .data
            .get(self.pos)
            .ok_or(PduError::InvalidPdu(context))?;
        self.pos += 1;
        Ok(b)
    }

    fn take(&mut self, n: usize, context: &'static str) -> PduResult<&'a [u8]> {
        let end = self.pos + n;
        let slice = self
            .data
            .get(self.pos..end)
            .ok_or(PduError::InvalidPdu(context))?;
        self.pos = end;
        Ok(slice)
    }

    fn rest(&mut self) -> &'a [u8] {
        let slice = &self.data[self.pos..];
        self.pos = self.data.len();
        slice
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdu::{encode, Message};

    // SMSC + first octet + OA + PID + DCS + SCTS; UDL and UD appended per test.
    const DELIVER_HELLO: &str = "07911326040000F0040B911346610089F6000020806291731408";

    fn deliver_hello() -> String {
        format!("{DELIVER_HELLO}05C8329BFD06")
    }

    #[test]
    fn decodes_classic_deliver() {
        let msg = decode(&deliver_hello()).unwrap();
        assert_eq!(msg.message_type, MessageType::Deliver);
        assert_eq!(msg.smsc, "+31624000000");
        assert_eq!(msg.phone_number, "+31641600986");
        assert_eq!(msg.encoding, MessageEncoding::Gsm7Bit);
        assert_eq!(msg.text, "Hello");
        let ts = msg.timestamp.unwrap();
        assert_eq!((ts.year, ts.month, ts.day), (2, 8, 26));
        assert_eq!((ts.hour, ts.minute, ts.second), (19, 37, 41));
    }

    #[test]
    fn submit_round_trip() {
        let original = Message::submit("+8613800138000", "Hello round trip");
        let pdus = encode(&original).unwrap();
        let decoded = decode(&pdus[0].data).unwrap();
        assert_eq!(decoded.message_type, MessageType::Submit);
        assert_eq!(decoded.phone_number, original.phone_number);
        assert_eq!(decoded.text, original.text);
        assert_eq!(decoded.encoding, original.encoding);
    }

    #[test]
    fn ucs2_round_trip_preserves_astral_plane() {
        let original = Message::submit("+8613800138000", "你好 \u{1F600}");
        let pdus = encode(&original).unwrap();
        let decoded = decode(&pdus[0].data).unwrap();
        assert_eq!(decoded.text, "你好 \u{1F600}");
        assert_eq!(decoded.encoding, MessageEncoding::Ucs2);
    }

    #[test]
    fn concat_part_round_trip_restores_triple() {
        let original = Message {
            reference: 0x42,
            ..Message::submit("+8613800138000", "a".repeat(200))
        };
        let pdus = encode(&original).unwrap();
        let first = decode(&pdus[0].data).unwrap();
        let second = decode(&pdus[1].data).unwrap();
        assert_eq!((first.reference, first.parts, first.part), (0x42, 2, 1));
        assert_eq!((second.reference, second.parts, second.part), (0x42, 2, 2));
        assert_eq!(first.text.len(), 153);
        assert_eq!(second.text.len(), 47);
        assert_eq!(format!("{}{}", first.text, second.text), original.text);
    }

    #[test]
    fn submit_with_validity_round_trip() {
        let original = Message {
            validity_period: Some(crate::pdu::ValidityPeriod::ONE_WEEK),
            ..Message::submit("+8613800138000", "expiring")
        };
        let pdus = encode(&original).unwrap();
        let decoded = decode(&pdus[0].data).unwrap();
        assert_eq!(decoded.validity_period, original.validity_period);
    }

    #[test]
    fn decodes_alphanumeric_sender() {
        // OA: 12 semi-octets, type D0, "Google" packed 7-bit.
        let oa = gsm7::pack(&gsm7::to_septets("Google").unwrap(), 0);
        let pdu = format!(
            "0004{:02X}D0{}000020806291731408{:02X}{}",
            oa.len() * 2,
            crate::pdu::hex::bytes_to_hex(&oa),
            5,
            "C8329BFD06",
        );
        let msg = decode(&pdu).unwrap();
        assert_eq!(msg.phone_number, "Google");
        assert_eq!(msg.text, "Hello");
    }

    #[test]
    fn decodes_status_report() {
        let pdu = format!(
            "0006{:02X}0B911346610089F6{}{}{:02X}",
            0x15, "20806291731408", "20806291741408", 0x00,
        );
        let msg = decode(&pdu).unwrap();
        assert_eq!(msg.message_type, MessageType::StatusReport);
        assert_eq!(msg.reference, 0x15);
        assert_eq!(msg.phone_number, "+31641600986");
        assert!(msg.delivery_status.unwrap().is_success());
    }

    #[test]
    fn rejects_udl_longer_than_data() {
        // Same deliver but UDL claims 12 septets for 5 octets of data.
        let pdu = format!("{DELIVER_HELLO}0CC8329BFD06");
        assert!(matches!(decode(&pdu), Err(PduError::InvalidPdu(_))));
    }

    #[test]
    fn rejects_truncated_pdu() {
        let full = deliver_hello();
        for cut in [2, 6, 10, 20, full.len() - 4] {
            assert!(decode(&full[..cut]).is_err());
        }
    }

    #[test]
    fn rejects_udh_longer_than_user_data() {
        // First octet 0x44 = deliver with UDHI; header claims 255 bytes.
        let pdu = "07911326040000F0440B911346610089F600002080629173140805FF0003420201";
        assert!(matches!(decode(pdu), Err(PduError::InvalidUdh(_))));
    }

    #[test]
    fn rejects_concat_element_overrunning_header() {
        // UDH length 5 but the contained IE declares 9 bytes of data.
        let pdu = "07911326040000F0440B911346610089F60000208062917314080D0500094202016161616161";
        assert!(matches!(decode(pdu), Err(PduError::InvalidUdh(_))));
    }

    #[test]
    fn reserved_message_type_is_unsupported() {
        assert!(matches!(decode("0003"), Err(PduError::Unsupported(_))));
    }

    #[test]
    fn decode_never_panics_on_noise() {
        for input in ["", "00", "again not hex", "FF", "00FF", "0001", "07FFFF"] {
            let _ = decode(input);
        }
    }
}
