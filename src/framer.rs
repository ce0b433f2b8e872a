// ABOUTME: Incremental line framer for the AT byte stream
// ABOUTME: Splits on newline, trims CR and whitespace, surfaces the bare `>` prompt

use bytes::BytesMut;

/// Accumulates serial bytes and yields complete, trimmed lines.
///
/// AT responses are `\r\n`-terminated, but the SMS input prompt `> ` is
/// sent without any terminator; when the residual buffer trims to `>`, it
/// is flushed as a line of its own so `AT+CMGS` can proceed.
#[derive(Debug, Default)]
pub struct LineFramer {
    buf: BytesMut,
}

impl LineFramer {
    pub fn new() -> Self {
        LineFramer {
            buf: BytesMut::with_capacity(1024),
        }
    }

    /// The read buffer to append incoming bytes to.
    pub fn buffer_mut(&mut self) -> &mut BytesMut {
        &mut self.buf
    }

    /// Pop the next complete non-empty line, if any.
    ///
    /// Invalid UTF-8 is replaced lossily; a modem speaking AT is ASCII
    /// apart from the hex payloads, which are ASCII too.
    pub fn next_line(&mut self) -> Option<String> {
        loop {
            match self.buf.iter().position(|&b| b == b'\n') {
                Some(pos) => {
                    let raw = self.buf.split_to(pos + 1);
                    let line = String::from_utf8_lossy(&raw).trim().to_owned();
                    if line.is_empty() {
                        continue;
                    }
                    return Some(line);
                }
                None => {
                    let residual = String::from_utf8_lossy(&self.buf);
                    if residual.trim() == ">" {
                        self.buf.clear();
                        return Some(">".to_owned());
                    }
                    return None;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(framer: &mut LineFramer, bytes: &[u8]) {
        framer.buffer_mut().extend_from_slice(bytes);
    }

    #[test]
    fn splits_crlf_lines() {
        let mut framer = LineFramer::new();
        feed(&mut framer, b"+CSQ: 20,99\r\n\r\nOK\r\n");
        assert_eq!(framer.next_line().as_deref(), Some("+CSQ: 20,99"));
        assert_eq!(framer.next_line().as_deref(), Some("OK"));
        assert_eq!(framer.next_line(), None);
    }

    #[test]
    fn holds_partial_lines_until_complete() {
        let mut framer = LineFramer::new();
        feed(&mut framer, b"+CMGL: 1,");
        assert_eq!(framer.next_line(), None);
        feed(&mut framer, b"1,,24\r\n");
        assert_eq!(framer.next_line().as_deref(), Some("+CMGL: 1,1,,24"));
    }

    #[test]
    fn emits_prompt_without_terminator() {
        let mut framer = LineFramer::new();
        feed(&mut framer, b"\r\n> ");
        assert_eq!(framer.next_line().as_deref(), Some(">"));
        assert_eq!(framer.next_line(), None);
    }

    #[test]
    fn prompt_after_command_echo() {
        let mut framer = LineFramer::new();
        feed(&mut framer, b"AT+CMGS=19\r\n> ");
        assert_eq!(framer.next_line().as_deref(), Some("AT+CMGS=19"));
        assert_eq!(framer.next_line().as_deref(), Some(">"));
    }

    #[test]
    fn skips_blank_lines() {
        let mut framer = LineFramer::new();
        feed(&mut framer, b"\r\n\r\n  \r\nRING\r\n");
        assert_eq!(framer.next_line().as_deref(), Some("RING"));
    }

    #[test]
    fn partial_non_prompt_data_stays_buffered() {
        let mut framer = LineFramer::new();
        feed(&mut framer, b"+CS");
        assert_eq!(framer.next_line(), None);
        feed(&mut framer, b"Q: 3,0\r\n");
        assert_eq!(framer.next_line().as_deref(), Some("+CSQ: 3,0"));
    }
}
