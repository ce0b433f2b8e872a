// ABOUTME: SMS-SUBMIT assembly and long-message segmentation (TS 23.040 §9.2.2.2)
// ABOUTME: Splits by septet or UCS-2 unit cost and stamps the concatenation UDH

use crate::pdu::address::{digit_count, encode_phone_number};
use crate::pdu::error::{PduError, PduResult};
use crate::pdu::hex::bytes_to_hex;
use crate::pdu::{gsm7, ucs2};
use crate::pdu::{
    Message, MessageEncoding, MessageType, Pdu, MAX_CONCAT_7BIT, MAX_CONCAT_8BIT, MAX_CONCAT_UCS2,
    MAX_SINGLE_7BIT, MAX_SINGLE_8BIT, MAX_SINGLE_UCS2,
};
use std::time::{SystemTime, UNIX_EPOCH};

/// Measured user-data length of `text` in the units the UDL field counts:
/// septets for the 7-bit alphabet (extension characters cost two), UTF-16
/// code units for UCS-2, octets for 8-bit.
pub fn message_length(text: &str, encoding: MessageEncoding) -> usize {
    match encoding {
        MessageEncoding::Gsm7Bit => gsm7::septet_length(text),
        MessageEncoding::Ucs2 => text.encode_utf16().count(),
        MessageEncoding::EightBit => text.len(),
    }
}

fn capacities(encoding: MessageEncoding) -> (usize, usize) {
    match encoding {
        MessageEncoding::Gsm7Bit => (MAX_SINGLE_7BIT, MAX_CONCAT_7BIT),
        MessageEncoding::EightBit => (MAX_SINGLE_8BIT, MAX_CONCAT_8BIT),
        MessageEncoding::Ucs2 => (MAX_SINGLE_UCS2, MAX_CONCAT_UCS2),
    }
}

/// Estimate how many SMS parts `text` needs under `encoding`.
pub fn calculate_parts(text: &str, encoding: MessageEncoding) -> usize {
    let (single, concat) = capacities(encoding);
    let len = message_length(text, encoding);
    if len <= single {
        1
    } else {
        len.div_ceil(concat)
    }
}

/// Encode a message into one or more PDUs, segmenting automatically when
/// the text exceeds the single-SMS capacity of its encoding.
pub fn encode(msg: &Message) -> PduResult<Vec<Pdu>> {
    msg.validate()?;
    if msg.message_type != MessageType::Submit {
        return Err(PduError::Unsupported("only SMS-SUBMIT can be encoded"));
    }

    let (single, concat) = capacities(msg.encoding);
    if message_length(&msg.text, msg.encoding) <= single {
        return Ok(vec![encode_single(msg)?]);
    }
    encode_concat(msg, concat)
}

fn encode_single(msg: &Message) -> PduResult<Pdu> {
    let smsc = encode_smsc(&msg.smsc)?;

    // PDU-Type: SUBMIT base, plus status-report / validity / UDH flags.
    let mut first_octet: u8 = 0x01;
    if msg.request_status_report {
        first_octet |= 0x20;
    }
    if msg.validity_period.is_some() {
        first_octet |= 0x10;
    }
    if !msg.udh.is_empty() {
        first_octet |= 0x40;
    }

    let mut buf = smsc.clone();
    buf.push(first_octet);
    buf.push(0x00); // MR: let the modem assign one

    let (addr_type, addr) = encode_phone_number(&msg.phone_number)?;
    buf.push(digit_count(&msg.phone_number) as u8);
    buf.push(addr_type as u8);
    buf.extend_from_slice(&addr);

    buf.push(0x00); // PID: standard short message

    let mut dcs = msg.encoding as u8;
    if msg.flash {
        dcs |= 0x10;
    }
    buf.push(dcs);

    if let Some(vp) = msg.validity_period {
        buf.push(vp.0);
    }

    let (user_data, udl) = encode_user_data(&msg.text, msg.encoding, &msg.udh)?;
    buf.push(udl as u8);
    buf.extend_from_slice(&user_data);

    Ok(Pdu {
        tpdu_length: buf.len() - smsc.len(),
        data: bytes_to_hex(&buf),
    })
}

fn encode_concat(msg: &Message, max_len: usize) -> PduResult<Vec<Pdu>> {
    let cost = |c: char| match msg.encoding {
        MessageEncoding::Gsm7Bit => {
            if gsm7::septet_length(&c.to_string()) == 2 {
                2
            } else {
                1
            }
        }
        MessageEncoding::Ucs2 => c.len_utf16(),
        MessageEncoding::EightBit => c.len_utf8(),
    };
    let parts = split_text(&msg.text, max_len, cost);
    if parts.len() > 255 {
        return Err(PduError::MessageTooLong(parts.len()));
    }

    let total = parts.len() as u8;
    let reference = if msg.reference != 0 {
        msg.reference
    } else {
        auto_reference()
    };

    let mut pdus = Vec::with_capacity(parts.len());
    for (i, part) in parts.into_iter().enumerate() {
        let index = (i + 1) as u8;
        let part_msg = Message {
            text: part,
            udh: vec![0x00, 0x03, reference, total, index],
            reference,
            parts: total,
            part: index,
            ..msg.clone()
        };
        pdus.push(encode_single(&part_msg)?);
    }
    Ok(pdus)
}

fn encode_smsc(smsc: &str) -> PduResult<Vec<u8>> {
    if smsc.is_empty() {
        return Ok(vec![0x00]);
    }
    let (addr_type, addr) =
        encode_phone_number(smsc).map_err(|_| PduError::InvalidSmsc(smsc.to_owned()))?;
    // The SMSC length field counts bytes (type octet included), unlike the
    // destination address whose length counts digits.
    let mut out = Vec::with_capacity(addr.len() + 2);
    out.push((addr.len() + 1) as u8);
    out.push(addr_type as u8);
    out.extend_from_slice(&addr);
    Ok(out)
}

fn encode_user_data(
    text: &str,
    encoding: MessageEncoding,
    udh: &[u8],
) -> PduResult<(Vec<u8>, usize)> {
    let mut data = Vec::new();
    if !udh.is_empty() {
        data.push(udh.len() as u8);
        data.extend_from_slice(udh);
    }

    let udl = match encoding {
        MessageEncoding::Gsm7Bit => {
            let septets = gsm7::to_septets(text)?;
            if udh.is_empty() {
                data.extend_from_slice(&gsm7::pack(&septets, 0));
                septets.len()
            } else {
                // Pad so the first text septet starts on a septet boundary
                // after the UDH; UDL then counts the padded header too.
                let udh_bits = (udh.len() + 1) * 8;
                let pad = (7 - udh_bits % 7) % 7;
                data.extend_from_slice(&gsm7::pack(&septets, pad as u8));
                septets.len() + (udh_bits + pad) / 7
            }
        }
        MessageEncoding::EightBit => {
            data.extend_from_slice(text.as_bytes());
            data.len()
        }
        MessageEncoding::Ucs2 => {
            data.extend_from_slice(&ucs2::encode(text));
            data.len()
        }
    };
    Ok((data, udl))
}

/// Greedy split on character cost, so a two-septet extension character (or
/// a surrogate pair) is never divided across parts.
fn split_text(text: &str, max_len: usize, cost: impl Fn(char) -> usize) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for c in text.chars() {
        let char_len = cost(c);
        if current_len + char_len > max_len {
            parts.push(std::mem::take(&mut current));
            current_len = 0;
        }
        current.push(c);
        current_len += char_len;
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

fn auto_reference() -> u8 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u8)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdu::ValidityPeriod;

    #[test]
    fn short_ascii_submit() {
        let msg = Message::submit("+8613800138000", "Hello");
        let pdus = encode(&msg).unwrap();
        assert_eq!(pdus.len(), 1);
        assert_eq!(
            pdus[0].data,
            "0001000D91683108108300F0000005C8329BFD06"
        );
        assert_eq!(pdus[0].tpdu_length, 19);
    }

    #[test]
    fn cjk_submit_uses_ucs2() {
        let msg = Message::submit("+8613800138000", "你好");
        let pdus = encode(&msg).unwrap();
        assert_eq!(pdus.len(), 1);
        // DCS 08, UDL 04, big-endian UTF-16 user data.
        assert!(pdus[0].data.ends_with("0008044F60597D"));
    }

    #[test]
    fn validity_period_sets_type_bit_and_octet() {
        let msg = Message {
            validity_period: Some(ValidityPeriod::ONE_DAY),
            ..Message::submit("+8613800138000", "Hello")
        };
        let pdu = encode(&msg).unwrap().remove(0);
        assert!(pdu.data.starts_with("0011000D91"));
        assert!(pdu.data.contains("0000A705"));
        assert_eq!(pdu.tpdu_length, 20);
    }

    #[test]
    fn status_report_request_sets_type_bit() {
        let msg = Message {
            request_status_report: true,
            ..Message::submit("+8613800138000", "Hello")
        };
        let pdu = encode(&msg).unwrap().remove(0);
        assert!(pdu.data.starts_with("0021000D91"));
    }

    #[test]
    fn flash_sets_dcs_bit() {
        let msg = Message {
            flash: true,
            ..Message::submit("+8613800138000", "Hi")
        };
        let pdu = encode(&msg).unwrap().remove(0);
        // PID 00 followed by DCS 10.
        assert_eq!(&pdu.data[24..28], "0010");
    }

    #[test]
    fn smsc_prefix_is_excluded_from_tpdu_length() {
        let bare = Message::submit("+8613800138000", "Hello");
        let with_smsc = Message {
            smsc: "+8613800100500".into(),
            ..bare.clone()
        };
        let a = encode(&bare).unwrap().remove(0);
        let b = encode(&with_smsc).unwrap().remove(0);
        assert_eq!(a.tpdu_length, b.tpdu_length);
        assert!(b.data.starts_with("089168"));
    }

    #[test]
    fn long_seven_bit_message_splits_at_153() {
        let msg = Message {
            reference: 0x42,
            ..Message::submit("+8613800138000", "a".repeat(200))
        };
        let pdus = encode(&msg).unwrap();
        assert_eq!(pdus.len(), 2);
        // Each part carries the 05 00 03 ref total index header and the
        // UDH flag in the first octet.
        assert!(pdus[0].data.starts_with("0041000D91"));
        assert!(pdus[0].data.contains("050003420201"));
        assert!(pdus[1].data.contains("050003420202"));
        // UDL: 153 + 7 header septets, then 47 + 7.
        let udl_first = u8::from_str_radix(&pdus[0].data[28..30], 16).unwrap();
        let udl_second = u8::from_str_radix(&pdus[1].data[28..30], 16).unwrap();
        assert_eq!(udl_first, 160);
        assert_eq!(udl_second, 54);
    }

    #[test]
    fn parts_share_generated_reference() {
        let msg = Message::submit("+8613800138000", "b".repeat(400));
        let pdus = encode(&msg).unwrap();
        assert_eq!(pdus.len(), 3);
        let refs: Vec<&str> = pdus.iter().map(|p| &p.data[36..38]).collect();
        assert_eq!(refs[0], refs[1]);
        assert_eq!(refs[1], refs[2]);
    }

    #[test]
    fn extension_character_is_not_split() {
        // 152 plain septets, then a euro sign (2 septets) that no longer
        // fits in the 153-septet first part and must move whole.
        let text = format!("{}€{}", "a".repeat(152), "a".repeat(100));
        let msg = Message {
            reference: 0x01,
            ..Message::submit("+8613800138000", text)
        };
        let pdus = encode(&msg).unwrap();
        assert_eq!(pdus.len(), 2);
        let udl_first = u8::from_str_radix(&pdus[0].data[28..30], 16).unwrap();
        // 152 septets of text + 7 septets of padded UDH.
        assert_eq!(udl_first, 159);
    }

    #[test]
    fn ucs2_long_message_splits_at_67() {
        let msg = Message {
            reference: 0x10,
            ..Message::submit("+8613800138000", "好".repeat(100))
        };
        let pdus = encode(&msg).unwrap();
        assert_eq!(pdus.len(), 2);
        let udl_first = u8::from_str_radix(&pdus[0].data[28..30], 16).unwrap();
        // 6 UDH bytes (with length octet) + 67 UCS-2 units.
        assert_eq!(udl_first as usize, 6 + 67 * 2);
    }

    #[test]
    fn deliver_cannot_be_encoded() {
        let msg = Message {
            message_type: MessageType::Deliver,
            ..Message::submit("+8613800138000", "Hello")
        };
        assert!(matches!(encode(&msg), Err(PduError::Unsupported(_))));
    }

    #[test]
    fn seven_bit_rejects_incompatible_text() {
        let msg = Message {
            encoding: MessageEncoding::Gsm7Bit,
            ..Message::submit("+8613800138000", "你好")
        };
        assert!(matches!(encode(&msg), Err(PduError::InvalidEncoding(_))));
    }

    #[test]
    fn calculate_parts_matches_capacities() {
        assert_eq!(calculate_parts(&"a".repeat(160), MessageEncoding::Gsm7Bit), 1);
        assert_eq!(calculate_parts(&"a".repeat(161), MessageEncoding::Gsm7Bit), 2);
        assert_eq!(calculate_parts(&"a".repeat(200), MessageEncoding::Gsm7Bit), 2);
        assert_eq!(calculate_parts(&"好".repeat(70), MessageEncoding::Ucs2), 1);
        assert_eq!(calculate_parts(&"好".repeat(71), MessageEncoding::Ucs2), 2);
    }
}
