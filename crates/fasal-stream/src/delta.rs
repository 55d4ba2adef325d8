//! Decoding of OpenAI-style streaming chunks

use serde::Deserialize;

/// Result of decoding one `data:` payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delta {
    /// Non-empty text to append to the reply
    Fragment(String),
    /// Well-formed chunk without text (role announcement, finish reason, usage)
    Empty,
    /// Payload that is not a valid chunk; carries the parse error
    Malformed(String),
}

impl Delta {
    /// The text fragment, if any
    pub fn fragment(&self) -> Option<&str> {
        match self {
            Delta::Fragment(text) => Some(text),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: Option<StreamDelta>,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Extract `choices[0].delta.content` from a payload.
///
/// Never fails: anything that does not decode is reported as
/// [`Delta::Malformed`] and the caller moves on to the next line.
pub fn decode_delta(payload: &str) -> Delta {
    let chunk: StreamChunk = match serde_json::from_str(payload) {
        Ok(chunk) => chunk,
        Err(e) => return Delta::Malformed(e.to_string()),
    };

    match chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta)
        .and_then(|delta| delta.content)
    {
        Some(content) if !content.is_empty() => Delta::Fragment(content),
        _ => Delta::Empty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment() {
        let delta = decode_delta(r#"{"choices":[{"delta":{"content":"Millet"}}]}"#);
        assert_eq!(delta, Delta::Fragment("Millet".to_string()));
        assert_eq!(delta.fragment(), Some("Millet"));
    }

    #[test]
    fn test_fragment_keeps_whitespace() {
        let delta = decode_delta(r#"{"choices":[{"delta":{"content":" and sorghum.\n"}}]}"#);
        assert_eq!(delta.fragment(), Some(" and sorghum.\n"));
    }

    #[test]
    fn test_extra_fields_ignored() {
        let payload = r#"{"id":"c1","object":"chat.completion.chunk","choices":[{"index":0,"delta":{"role":"assistant","content":"Rice"},"finish_reason":null}]}"#;
        assert_eq!(decode_delta(payload).fragment(), Some("Rice"));
    }

    #[test]
    fn test_only_first_choice_used() {
        let payload = r#"{"choices":[{"delta":{}},{"delta":{"content":"second"}}]}"#;
        assert_eq!(decode_delta(payload), Delta::Empty);
    }

    #[test]
    fn test_empty_variants() {
        assert_eq!(decode_delta("{}"), Delta::Empty);
        assert_eq!(decode_delta(r#"{"choices":[]}"#), Delta::Empty);
        assert_eq!(decode_delta(r#"{"choices":[{}]}"#), Delta::Empty);
        assert_eq!(decode_delta(r#"{"choices":[{"delta":{"role":"assistant"}}]}"#), Delta::Empty);
        assert_eq!(decode_delta(r#"{"choices":[{"delta":{"content":""}}]}"#), Delta::Empty);
        assert_eq!(decode_delta(r#"{"choices":[{"delta":{"content":null}}]}"#), Delta::Empty);
        assert_eq!(decode_delta(r#"{"choices":[{"finish_reason":"stop","delta":null}]}"#), Delta::Empty);
    }

    #[test]
    fn test_malformed() {
        assert!(matches!(decode_delta("{not json"), Delta::Malformed(_)));
        assert!(matches!(decode_delta(r#"{"choices":[{"delta":{"content":"Mil"#), Delta::Malformed(_)));
        assert!(matches!(decode_delta(""), Delta::Malformed(_)));
    }

    #[test]
    fn test_shape_mismatch_is_malformed() {
        assert!(matches!(decode_delta(r#"{"choices":"none"}"#), Delta::Malformed(_)));
        assert!(matches!(decode_delta(r#"{"choices":[{"delta":{"content":42}}]}"#), Delta::Malformed(_)));
        assert!(matches!(decode_delta("[1,2]"), Delta::Malformed(_)));
    }
}
