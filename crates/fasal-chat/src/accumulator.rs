//! Accumulation of streamed fragments into a reply

/// The growing text of one in-flight reply.
///
/// Its value is always the in-order concatenation of every pushed fragment.
#[derive(Debug, Default, Clone)]
pub struct StreamAccumulator {
    text: String,
    fragments: usize,
}

impl StreamAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment and return the full text so far
    pub fn push(&mut self, fragment: &str) -> &str {
        self.text.push_str(fragment);
        self.fragments += 1;
        &self.text
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Number of fragments pushed
    pub fn fragments(&self) -> usize {
        self.fragments
    }

    pub fn into_string(self) -> String {
        self.text
    }
}
