//! Newline framing for the parley wire protocol.
//!
//! Wire format: UTF-8 text, one message per `\n`-terminated line, no header.
//! Lines longer than [`MAX_MESSAGE_SIZE`] bytes are truncated, never rejected.

/// Maximum number of bytes kept from a single line.
pub const MAX_MESSAGE_SIZE: usize = 1024;

/// Streaming line decoder: accumulates bytes and yields complete, trimmed lines.
///
/// Bytes beyond the cap are dropped until the next newline, so an oversized
/// line never bleeds into the one after it.
#[derive(Debug)]
pub struct LineDecoder {
    buffer: Vec<u8>,
    max_len: usize,
    truncated: bool,
}

impl Default for LineDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::with_max_len(MAX_MESSAGE_SIZE)
    }

    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(max_len.min(MAX_MESSAGE_SIZE)),
            max_len,
            truncated: false,
        }
    }

    /// Feed bytes into the decoder and return every line completed by them.
    pub fn feed(&mut self, mut data: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();

        loop {
            let newline = data.iter().position(|b| *b == b'\n');
            let segment = match newline {
                Some(pos) => &data[..pos],
                None => data,
            };
            self.push_capped(segment);

            match newline {
                Some(pos) => {
                    lines.push(self.take_line());
                    data = &data[pos + 1..];
                }
                None => break,
            }
        }

        lines
    }

    /// Flush a final line that was not newline-terminated (stream ended).
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() && !self.truncated {
            return None;
        }
        Some(self.take_line())
    }

    /// Number of bytes held for the line in progress.
    #[cfg(test)]
    fn pending(&self) -> usize {
        self.buffer.len()
    }

    fn push_capped(&mut self, segment: &[u8]) {
        let room = self.max_len - self.buffer.len();
        if segment.len() > room {
            self.buffer.extend_from_slice(&segment[..room]);
            self.truncated = true;
        } else {
            self.buffer.extend_from_slice(segment);
        }
    }

    fn take_line(&mut self) -> String {
        let mut bytes = std::mem::take(&mut self.buffer);
        if std::mem::take(&mut self.truncated) {
            // The cap may have split a multi-byte character; drop the tail.
            if let Err(e) = std::str::from_utf8(&bytes) {
                if e.error_len().is_none() {
                    bytes.truncate(e.valid_up_to());
                }
            }
        }
        String::from_utf8_lossy(&bytes).trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_newline_and_trims() {
        let mut decoder = LineDecoder::new();
        let lines = decoder.feed(b"  hello \r\nbye\n");
        assert_eq!(lines, vec!["hello", "bye"]);
        assert_eq!(decoder.pending(), 0);
    }

    #[test]
    fn incremental_feed() {
        let mut decoder = LineDecoder::new();
        assert!(decoder.feed(b"/echo te").is_empty());
        assert_eq!(decoder.pending(), 8);
        assert_eq!(decoder.feed(b"st 123\nx"), vec!["/echo test 123"]);
        assert_eq!(decoder.finish(), Some("x".to_string()));
        assert_eq!(decoder.finish(), None);
    }

    #[test]
    fn empty_line_is_emitted() {
        let mut decoder = LineDecoder::new();
        assert_eq!(decoder.feed(b"\n   \n"), vec!["", ""]);
    }

    #[test]
    fn oversized_line_is_truncated_to_cap() {
        let mut decoder = LineDecoder::new();
        let mut input = vec![b'a'; 3000];
        input.extend_from_slice(b"\nnext\n");
        let lines = decoder.feed(&input);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].len(), MAX_MESSAGE_SIZE);
        assert!(lines[0].bytes().all(|b| b == b'a'));
        assert_eq!(lines[1], "next");
    }

    #[test]
    fn truncation_spans_chunks() {
        let mut decoder = LineDecoder::with_max_len(4);
        assert!(decoder.feed(b"abc").is_empty());
        assert!(decoder.feed(b"defgh").is_empty());
        assert_eq!(decoder.feed(b"ij\nok\n"), vec!["abcd", "ok"]);
    }

    #[test]
    fn truncation_drops_split_character() {
        let mut decoder = LineDecoder::new();
        let mut input = vec![b'a'; MAX_MESSAGE_SIZE - 1];
        input.extend_from_slice("é\n".as_bytes());
        let lines = decoder.feed(&input);
        assert_eq!(lines[0].len(), MAX_MESSAGE_SIZE - 1);
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let mut decoder = LineDecoder::new();
        let lines = decoder.feed(b"hi\xff\n");
        assert_eq!(lines, vec!["hi\u{fffd}"]);
    }
}
