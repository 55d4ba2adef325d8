//! Server-sent event line classification

/// Prefix of a data line. Only the form with a single space is recognized.
pub const DATA_PREFIX: &str = "data: ";

/// Payload that terminates a response
pub const DONE_SENTINEL: &str = "[DONE]";

/// What a single framed line means
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SseLine<'a> {
    /// Empty or whitespace-only (keepalive / event separator)
    Blank,
    /// Starts with `:`
    Comment,
    /// Any other field (`event:`, `id:`, `retry:`, `data:` without the space)
    Other,
    /// Trimmed payload of a `data: ` line
    Data(&'a str),
    /// `data: [DONE]`
    Done,
}

impl SseLine<'_> {
    /// Whether the line carries nothing for the decoder
    pub fn is_ignored(&self) -> bool {
        matches!(self, SseLine::Blank | SseLine::Comment | SseLine::Other)
    }
}

/// Classify one framed line
pub fn classify_line(line: &str) -> SseLine<'_> {
    if line.trim().is_empty() {
        return SseLine::Blank;
    }
    if line.starts_with(':') {
        return SseLine::Comment;
    }
    let Some(rest) = line.strip_prefix(DATA_PREFIX) else {
        return SseLine::Other;
    };

    let payload = rest.trim();
    if payload == DONE_SENTINEL {
        SseLine::Done
    } else {
        SseLine::Data(payload)
    }
}
