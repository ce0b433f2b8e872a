// ABOUTME: Reassembly of concatenated SMS fragments keyed by reference byte
// ABOUTME: Buffers parts until complete, then emits one merged message

use crate::pdu::error::{PduError, PduResult};
use crate::pdu::Message;
use std::collections::{BTreeMap, HashMap};

/// Reassembly state for one in-flight concatenated message.
#[derive(Debug, Default)]
pub struct ConcatBuffer {
    reference: u8,
    total: u8,
    parts: BTreeMap<u8, Message>,
}

impl ConcatBuffer {
    fn new(reference: u8, total: u8) -> Self {
        ConcatBuffer {
            reference,
            total,
            parts: BTreeMap::new(),
        }
    }

    pub fn reference(&self) -> u8 {
        self.reference
    }

    pub fn total(&self) -> u8 {
        self.total
    }

    /// Number of fragments received so far.
    pub fn received(&self) -> usize {
        self.parts.len()
    }

    /// Store one fragment. A reference or total that disagrees with the
    /// buffer is rejected without touching the stored parts; with only 8
    /// bits of reference, two senders can collide on the same value.
    fn add_part(&mut self, msg: Message) -> PduResult<()> {
        if msg.reference != self.reference {
            return Err(PduError::InvalidUdh("fragment reference mismatch"));
        }
        if msg.parts != self.total {
            return Err(PduError::InvalidUdh("fragment total mismatch"));
        }
        if msg.part < 1 || msg.part > self.total {
            return Err(PduError::InvalidUdh("fragment index outside 1..=total"));
        }
        self.parts.insert(msg.part, msg);
        Ok(())
    }

    fn is_complete(&self) -> bool {
        self.parts.len() == usize::from(self.total)
    }

    /// Merge the fragments in index order, adopting the first fragment's
    /// header fields.
    fn into_message(self) -> Message {
        let mut iter = self.parts.into_values();
        let first = iter.next().unwrap_or_default();
        let mut text = first.text.clone();
        for part in iter {
            text.push_str(&part.text);
        }
        Message {
            message_type: first.message_type,
            phone_number: first.phone_number,
            text,
            encoding: first.encoding,
            smsc: first.smsc,
            timestamp: first.timestamp,
            flash: first.flash,
            ..Message::default()
        }
    }
}

/// Tracks all in-flight concatenated messages, keyed by reference byte.
///
/// Feed every decoded message through [`ConcatManager::add`]: single-part
/// messages pass straight through, fragments are buffered until the set
/// completes, at which point the merged message is returned and the buffer
/// evicted.
#[derive(Debug, Default)]
pub struct ConcatManager {
    buffers: HashMap<u8, ConcatBuffer>,
}

impl ConcatManager {
    pub fn new() -> Self {
        ConcatManager::default()
    }

    /// Add a decoded message.
    ///
    /// Returns `Ok(Some(_))` for a single-part message or a completing
    /// fragment, `Ok(None)` while fragments are outstanding, and an error
    /// for a fragment that contradicts its buffer (the buffer is kept).
    pub fn add(&mut self, msg: Message) -> PduResult<Option<Message>> {
        if msg.parts == 0 || (msg.parts == 1 && msg.part == 1) {
            return Ok(Some(msg));
        }
        if msg.part < 1 || msg.part > msg.parts {
            return Err(PduError::InvalidUdh("fragment index outside 1..=total"));
        }

        let reference = msg.reference;
        let buffer = self
            .buffers
            .entry(reference)
            .or_insert_with(|| ConcatBuffer::new(reference, msg.parts));
        buffer.add_part(msg)?;

        if !buffer.is_complete() {
            return Ok(None);
        }
        Ok(self
            .buffers
            .remove(&reference)
            .map(ConcatBuffer::into_message))
    }

    /// Number of incomplete message groups currently buffered.
    pub fn pending(&self) -> usize {
        self.buffers.len()
    }

    /// Drop all incomplete buffers.
    pub fn clear(&mut self) {
        self.buffers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdu::{MessageType, Timestamp};

    fn fragment(reference: u8, parts: u8, part: u8, text: &str) -> Message {
        Message {
            message_type: MessageType::Deliver,
            phone_number: "+8613800138000".into(),
            text: text.into(),
            timestamp: Some(Timestamp {
                year: 24,
                month: 6,
                day: 1,
                hour: 10,
                minute: 0,
                second: part, // distinguishes the fragments
                ..Timestamp::default()
            }),
            reference,
            parts,
            part,
            ..Message::default()
        }
    }

    #[test]
    fn single_part_passes_through() {
        let mut manager = ConcatManager::new();
        let msg = fragment(0, 0, 0, "standalone");
        let out = manager.add(msg.clone()).unwrap().unwrap();
        assert_eq!(out, msg);
        assert_eq!(manager.pending(), 0);
    }

    #[test]
    fn reassembles_out_of_order() {
        let mut manager = ConcatManager::new();
        assert!(manager.add(fragment(0x42, 3, 2, "world ")).unwrap().is_none());
        assert!(manager.add(fragment(0x42, 3, 3, "again")).unwrap().is_none());
        assert_eq!(manager.pending(), 1);

        let merged = manager
            .add(fragment(0x42, 3, 1, "hello "))
            .unwrap()
            .expect("third fragment completes the message");
        assert_eq!(merged.text, "hello world again");
        // Header fields come from part 1.
        assert_eq!(merged.timestamp.unwrap().second, 1);
        assert_eq!(merged.phone_number, "+8613800138000");
        assert_eq!(merged.parts, 0);
        assert_eq!(manager.pending(), 0);
    }

    #[test]
    fn total_mismatch_leaves_buffer_intact() {
        let mut manager = ConcatManager::new();
        assert!(manager.add(fragment(0x42, 2, 1, "first ")).unwrap().is_none());

        // A colliding sender claims the same reference with a different total.
        let err = manager.add(fragment(0x42, 5, 2, "intruder")).unwrap_err();
        assert!(matches!(err, PduError::InvalidUdh(_)));
        assert_eq!(manager.pending(), 1);

        let merged = manager.add(fragment(0x42, 2, 2, "second")).unwrap().unwrap();
        assert_eq!(merged.text, "first second");
    }

    #[test]
    fn rejects_out_of_range_index() {
        let mut manager = ConcatManager::new();
        assert!(manager.add(fragment(1, 3, 0, "x")).is_err());
        assert!(manager.add(fragment(1, 3, 4, "x")).is_err());
        assert_eq!(manager.pending(), 0);
    }

    #[test]
    fn duplicate_fragment_replaces_previous() {
        let mut manager = ConcatManager::new();
        assert!(manager.add(fragment(7, 2, 1, "old")).unwrap().is_none());
        assert!(manager.add(fragment(7, 2, 1, "new ")).unwrap().is_none());
        let merged = manager.add(fragment(7, 2, 2, "tail")).unwrap().unwrap();
        assert_eq!(merged.text, "new tail");
    }

    #[test]
    fn independent_references_do_not_mix() {
        let mut manager = ConcatManager::new();
        assert!(manager.add(fragment(1, 2, 1, "a")).unwrap().is_none());
        assert!(manager.add(fragment(2, 2, 1, "x")).unwrap().is_none());
        assert_eq!(manager.pending(), 2);

        assert_eq!(manager.add(fragment(2, 2, 2, "y")).unwrap().unwrap().text, "xy");
        assert_eq!(manager.add(fragment(1, 2, 2, "b")).unwrap().unwrap().text, "ab");
    }

    #[test]
    fn clear_drops_pending_buffers() {
        let mut manager = ConcatManager::new();
        assert!(manager.add(fragment(9, 2, 1, "half")).unwrap().is_none());
        manager.clear();
        assert_eq!(manager.pending(), 0);
    }
}
