// ABOUTME: SMS operations in PDU mode: list, read, send, delete
// ABOUTME: Composes the PDU codec with the session's prompt-driven CMGS flow

use crate::error::{AtError, AtResult};
use crate::modem::Modem;
use crate::pdu::{self, ConcatManager, Message};
use num_enum::FromPrimitive;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Ctrl-Z, terminating a PDU body after the `>` prompt.
const CTRL_Z: u8 = 0x1A;

/// Network round trips for an SMS submit routinely take tens of seconds
/// on 2G, far beyond the default command timeout.
const SEND_TIMEOUT: Duration = Duration::from_secs(30);

/// Storage state of a listed message, from the `<stat>` field of `+CMGL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
#[repr(u8)]
pub enum SmsStatus {
    ReceivedUnread = 0,
    ReceivedRead = 1,
    StoredUnsent = 2,
    StoredSent = 3,
    #[num_enum(default)]
    Unknown = 255,
}

/// Filter argument for `AT+CMGL` in PDU mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum SmsListFilter {
    ReceivedUnread = 0,
    ReceivedRead = 1,
    StoredUnsent = 2,
    StoredSent = 3,
    #[default]
    All = 4,
}

/// A message slot as reported by `AT+CMGL` / `AT+CMGR`.
#[derive(Debug, Clone)]
pub struct SmsRecord {
    /// Storage index, usable with [`Modem::delete_sms`]
    pub index: u32,
    pub status: SmsStatus,
    /// Decoded (and, for fragments, reassembled) message
    pub message: Message,
    /// Set when the stored PDU failed to decode; `message` is empty then
    pub error: Option<String>,
}

impl Modem {
    /// Select PDU mode (`AT+CMGF=0`), required by every other SMS
    /// operation here.
    pub async fn set_sms_format_pdu(&self) -> AtResult<()> {
        self.expect_ok(&format!("{}=0", self.commands.sms_format))
            .await
    }

    /// Select text mode (`AT+CMGF=1`). Behaviour in text mode is
    /// modem-dependent; the wrappers in this module assume PDU mode.
    pub async fn set_sms_format_text(&self) -> AtResult<()> {
        self.expect_ok(&format!("{}=1", self.commands.sms_format))
            .await
    }

    /// List stored messages, reassembling concatenated fragments.
    ///
    /// Response lines come in pairs: `+CMGL: <idx>,<stat>,,<len>` followed
    /// by the PDU hex. Fragments are merged through a [`ConcatManager`];
    /// the merged record carries the index and status of part 1. The
    /// result is sorted by storage index.
    pub async fn list_sms(&self, filter: SmsListFilter) -> AtResult<Vec<SmsRecord>> {
        let responses = self
            .session
            .send_command_expect(&format!("{}={}", self.commands.list_sms, filter as u8), "OK")
            .await?;

        let mut records = Vec::new();
        let mut manager = ConcatManager::new();
        // Reference byte -> (index, status) of the first fragment seen.
        let mut fragment_meta: HashMap<u8, (u32, SmsStatus)> = HashMap::new();

        let mut lines = responses.iter().peekable();
        while let Some(line) = lines.next() {
            let Some(params) = line.strip_prefix("+CMGL:") else {
                continue;
            };
            let Some(pdu_hex) = lines.peek() else {
                break;
            };
            if self.session.responses().is_final(pdu_hex) {
                break;
            }
            let (index, status) = parse_cmgl_params(params)?;

            match pdu::decode(pdu_hex) {
                Ok(msg) => {
                    let is_fragment = msg.parts > 1;
                    let reference = msg.reference;
                    if is_fragment {
                        fragment_meta.entry(reference).or_insert((index, status));
                        if msg.part == 1 {
                            fragment_meta.insert(reference, (index, status));
                        }
                    }
                    match manager.add(msg) {
                        Ok(Some(message)) => {
                            let (index, status) = if is_fragment {
                                fragment_meta.remove(&reference).unwrap_or((index, status))
                            } else {
                                (index, status)
                            };
                            records.push(SmsRecord {
                                index,
                                status,
                                message,
                                error: None,
                            });
                        }
                        Ok(None) => {}
                        Err(e) => records.push(SmsRecord {
                            index,
                            status,
                            message: Message::default(),
                            error: Some(e.to_string()),
                        }),
                    }
                }
                Err(e) => records.push(SmsRecord {
                    index,
                    status,
                    message: Message::default(),
                    error: Some(e.to_string()),
                }),
            }
            lines.next(); // consume the PDU line
        }

        if manager.pending() > 0 {
            debug!(
                pending = manager.pending(),
                "incomplete concatenated messages left unmerged"
            );
        }

        records.sort_by_key(|r| r.index);
        Ok(records)
    }

    /// Read a single message slot (`AT+CMGR=<index>`).
    pub async fn read_sms(&self, index: u32) -> AtResult<SmsRecord> {
        let responses = self
            .session
            .send_command_expect(&format!("{}={}", self.commands.read_sms, index), "OK")
            .await?;

        let mut lines = responses.iter();
        let params = lines
            .by_ref()
            .find_map(|line| line.strip_prefix("+CMGR:"))
            .ok_or_else(|| AtError::Parse("no +CMGR line in response".into()))?;
        let pdu_hex = lines
            .next()
            .ok_or_else(|| AtError::Parse("missing PDU line after +CMGR".into()))?;

        let status = params
            .split(',')
            .next()
            .and_then(|v| v.trim().parse::<u8>().ok())
            .map(SmsStatus::from)
            .unwrap_or(SmsStatus::Unknown);

        let message = pdu::decode(pdu_hex)?;
        Ok(SmsRecord {
            index,
            status,
            message,
            error: None,
        })
    }

    /// Send a text message, segmenting into concatenated parts when it
    /// exceeds a single SMS. The encoding is chosen from the text.
    pub async fn send_sms(&self, number: &str, text: &str) -> AtResult<()> {
        let message = Message::submit(number, text);
        for part in pdu::encode(&message)? {
            self.submit_pdu(&part.data, part.tpdu_length).await?;
        }
        Ok(())
    }

    /// Send one pre-encoded PDU (`AT+CMGS=<tpdu_len>`, `>` prompt, hex
    /// body, Ctrl-Z).
    pub async fn send_sms_pdu(&self, pdu_hex: &str, tpdu_length: usize) -> AtResult<()> {
        self.submit_pdu(pdu_hex, tpdu_length).await
    }

    async fn submit_pdu(&self, pdu_hex: &str, tpdu_length: usize) -> AtResult<()> {
        self.session
            .send_command_expect(&format!("{}={}", self.commands.send_sms, tpdu_length), ">")
            .await?;

        let mut body = Vec::with_capacity(pdu_hex.len() + 1);
        body.extend_from_slice(pdu_hex.as_bytes());
        body.push(CTRL_Z);

        let responses = self.session.send_raw(&body, SEND_TIMEOUT).await?;
        self.session.expect_in(responses, "OK")?;
        Ok(())
    }

    /// Delete one message slot (`AT+CMGD=<index>`).
    pub async fn delete_sms(&self, index: u32) -> AtResult<()> {
        self.expect_ok(&format!("{}={}", self.commands.delete_sms, index))
            .await
    }

    /// Delete all messages (`AT+CMGD=1,4`).
    pub async fn delete_all_sms(&self) -> AtResult<()> {
        self.expect_ok(&format!("{}=1,4", self.commands.delete_sms))
            .await
    }
}

fn parse_cmgl_params(params: &str) -> AtResult<(u32, SmsStatus)> {
    let mut fields = params.split(',').map(str::trim);
    let index = fields
        .next()
        .and_then(|v| v.parse::<u32>().ok())
        .ok_or_else(|| AtError::Parse(format!("malformed +CMGL line: {params}")))?;
    let status = fields
        .next()
        .and_then(|v| v.parse::<u8>().ok())
        .map(SmsStatus::from)
        .unwrap_or(SmsStatus::Unknown);
    Ok((index, status))
}
