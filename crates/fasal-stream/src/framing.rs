//! Incremental UTF-8 decoding and newline framing

/// Splits an incrementally arriving body into lines.
///
/// Bytes are decoded as UTF-8 across chunk boundaries: a multi-byte character
/// split between two chunks is held back until its remaining bytes arrive.
/// Invalid sequences are replaced with U+FFFD. After every push the buffer
/// holds at most one partial, newline-less line.
#[derive(Debug, Default)]
pub struct LineFramer {
    /// Text received since the last newline
    buffer: String,
    /// Leading bytes of a character whose tail has not arrived yet
    partial_utf8: Vec<u8>,
}

impl LineFramer {
    /// Create an empty framer
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a raw chunk and return every line it completes
    pub fn push_bytes(&mut self, bytes: &[u8]) -> Vec<String> {
        let text = self.decode(bytes);
        self.push_str(&text)
    }

    /// Append already-decoded text and return every line it completes.
    ///
    /// Lines exclude the `\n` terminator and a single trailing `\r`.
    pub fn push_str(&mut self, chunk: &str) -> Vec<String> {
        self.buffer.push_str(chunk);

        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.buffer[start..].find('\n') {
            let end = start + offset;
            let line = &self.buffer[start..end];
            lines.push(line.strip_suffix('\r').unwrap_or(line).to_string());
            start = end + 1;
        }
        self.buffer.drain(..start);
        lines
    }

    /// Text waiting for its newline
    pub fn pending(&self) -> &str {
        &self.buffer
    }

    /// Consume the framer, returning the unterminated remainder if any.
    ///
    /// Undecodable trailing bytes are flushed as U+FFFD.
    pub fn finish(mut self) -> Option<String> {
        if !self.partial_utf8.is_empty() {
            self.buffer.push('\u{FFFD}');
        }
        if self.buffer.is_empty() {
            None
        } else {
            Some(self.buffer)
        }
    }

    fn decode(&mut self, bytes: &[u8]) -> String {
        let mut input = std::mem::take(&mut self.partial_utf8);
        input.extend_from_slice(bytes);

        let mut out = String::with_capacity(input.len());
        let mut rest = input.as_slice();
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    break;
                }
                Err(err) => {
                    let (valid, after) = rest.split_at(err.valid_up_to());
                    out.push_str(&String::from_utf8_lossy(valid));
                    match err.error_len() {
                        Some(len) => {
                            out.push('\u{FFFD}');
                            rest = &after[len..];
                        }
                        None => {
                            // Incomplete sequence at the end of the chunk
                            self.partial_utf8 = after.to_vec();
                            break;
                        }
                    }
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_chunks(chunks: &[&[u8]]) -> (Vec<String>, LineFramer) {
        let mut framer = LineFramer::new();
        let mut lines = Vec::new();
        for chunk in chunks {
            lines.extend(framer.push_bytes(chunk));
        }
        (lines, framer)
    }

    #[test]
    fn test_single_chunk_multiple_lines() {
        let mut framer = LineFramer::new();
        let lines = framer.push_str("one\ntwo\nthree");
        assert_eq!(lines, vec!["one", "two"]);
        assert_eq!(framer.pending(), "three");
    }

    #[test]
    fn test_strips_trailing_carriage_return() {
        let mut framer = LineFramer::new();
        let lines = framer.push_str("data: a\r\n\r\n");
        assert_eq!(lines, vec!["data: a", ""]);
        assert_eq!(framer.pending(), "");
    }

    #[test]
    fn test_only_one_carriage_return_stripped() {
        let mut framer = LineFramer::new();
        assert_eq!(framer.push_str("x\r\r\n"), vec!["x\r"]);
    }

    #[test]
    fn test_crlf_split_across_chunks() {
        let mut framer = LineFramer::new();
        assert!(framer.push_str("data: a\r").is_empty());
        assert_eq!(framer.pending(), "data: a\r");
        assert_eq!(framer.push_str("\n"), vec!["data: a"]);
    }

    #[test]
    fn test_split_invariant_for_every_two_way_split() {
        let text = "data: {\"a\":1}\r\n: keepalive\n\ndata: [DONE]\nrest";
        let bytes = text.as_bytes();
        let (expected, whole) = frame_chunks(&[bytes]);

        for split in 0..=bytes.len() {
            let (lines, framer) = frame_chunks(&[&bytes[..split], &bytes[split..]]);
            assert_eq!(lines, expected, "split at {}", split);
            assert_eq!(framer.pending(), whole.pending(), "split at {}", split);
        }
    }

    #[test]
    fn test_split_invariant_for_every_three_way_split() {
        let text = "a\r\nbc\n\nd: é\nlast";
        let bytes = text.as_bytes();
        let (expected, _) = frame_chunks(&[bytes]);

        for i in 0..=bytes.len() {
            for j in i..=bytes.len() {
                let (lines, framer) = frame_chunks(&[&bytes[..i], &bytes[i..j], &bytes[j..]]);
                assert_eq!(lines, expected, "splits at {} and {}", i, j);
                assert_eq!(framer.pending(), "last");
            }
        }
    }

    #[test]
    fn test_byte_at_a_time() {
        let text = "data: गेहूं उत्पादन\ndata: 🌾\n";
        let chunks: Vec<&[u8]> = text.as_bytes().chunks(1).collect();
        let (lines, framer) = frame_chunks(&chunks);
        assert_eq!(lines, vec!["data: गेहूं उत्पादन", "data: 🌾"]);
        assert_eq!(framer.finish(), None);
    }

    #[test]
    fn test_multibyte_character_split_is_held_back() {
        let crop = "🌾".as_bytes();
        let mut framer = LineFramer::new();
        assert!(framer.push_bytes(&crop[..2]).is_empty());
        assert_eq!(framer.pending(), "");
        assert_eq!(framer.push_bytes(&crop[2..]), Vec::<String>::new());
        assert_eq!(framer.pending(), "🌾");
    }

    #[test]
    fn test_invalid_utf8_replaced() {
        let mut framer = LineFramer::new();
        let lines = framer.push_bytes(b"ab\xffcd\n");
        assert_eq!(lines, vec!["ab\u{FFFD}cd"]);
    }

    #[test]
    fn test_finish_returns_remainder() {
        let mut framer = LineFramer::new();
        framer.push_str("data: {\"choices\"");
        assert_eq!(framer.finish().as_deref(), Some("data: {\"choices\""));
    }

    #[test]
    fn test_finish_flushes_truncated_character() {
        let mut framer = LineFramer::new();
        framer.push_bytes(&"é".as_bytes()[..1]);
        assert_eq!(framer.finish().as_deref(), Some("\u{FFFD}"));
    }

    #[test]
    fn test_no_line_length_limit() {
        let long = "x".repeat(256 * 1024);
        let mut framer = LineFramer::new();
        for chunk in long.as_bytes().chunks(4096) {
            assert!(framer.push_bytes(chunk).is_empty());
        }
        let lines = framer.push_str("\n");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].len(), long.len());
    }
}
