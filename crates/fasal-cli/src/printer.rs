//! Plain-text rendering of session events for line and one-shot modes

use fasal_chat::{ChatEvent, NoticeLevel};
use std::io::{self, Write};

/// Writes reply text as it streams in.
///
/// Session events carry the full reply so far; only the new suffix is written.
pub struct LinePrinter<W: Write, E: Write> {
    out: W,
    err: E,
    /// Bytes of the current reply already written
    printed: usize,
    /// Whether the current reply has written anything
    started: bool,
}

impl LinePrinter<io::Stdout, io::Stderr> {
    pub fn stdio() -> Self {
        Self::new(io::stdout(), io::stderr())
    }
}

impl<W: Write, E: Write> LinePrinter<W, E> {
    pub fn new(out: W, err: E) -> Self {
        Self {
            out,
            err,
            printed: 0,
            started: false,
        }
    }

    fn write_suffix(&mut self, content: &str) -> io::Result<()> {
        if let Some(suffix) = content.get(self.printed..) {
            if !suffix.is_empty() {
                self.out.write_all(suffix.as_bytes())?;
                self.out.flush()?;
                self.started = true;
            }
        }
        self.printed = content.len();
        Ok(())
    }

    fn finish_reply(&mut self) -> io::Result<()> {
        if self.started {
            writeln!(self.out)?;
        }
        self.printed = 0;
        self.started = false;
        self.out.flush()
    }

    pub fn handle(&mut self, event: &ChatEvent) -> io::Result<()> {
        match event {
            ChatEvent::AssistantStart => {
                self.printed = 0;
                self.started = false;
            }
            ChatEvent::AssistantUpdate { content } => self.write_suffix(content)?,
            ChatEvent::AssistantEnd { content, .. } => {
                self.write_suffix(content)?;
                self.finish_reply()?;
            }
            ChatEvent::Aborted { .. } => {
                self.finish_reply()?;
                writeln!(self.err, "[stopped]")?;
            }
            ChatEvent::Failed { .. } => self.finish_reply()?,
            ChatEvent::Notice(notice) => {
                let marker = match notice.level {
                    NoticeLevel::Success => "✓",
                    NoticeLevel::Error => "✖",
                };
                writeln!(self.err, "{} {}", marker, notice.message)?;
            }
            ChatEvent::RequestStart { .. }
            | ChatEvent::PhaseChanged { .. }
            | ChatEvent::Cleared => {}
        }
        Ok(())
    }
}
