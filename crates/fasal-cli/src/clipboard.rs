//! Copying replies to the system clipboard over OSC 52

use base64::Engine;
use fasal_chat::{ChatHandle, Notice};
use std::io::{self, Write};

/// The OSC 52 escape sequence that sets the clipboard to `text`
pub fn osc52_sequence(text: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(text);
    format!("\x1b]52;c;{}\x07", encoded)
}

/// Ask the terminal to put `text` on the clipboard
pub fn copy_to_clipboard(text: &str) -> io::Result<()> {
    let mut stdout = io::stdout();
    stdout.write_all(osc52_sequence(text).as_bytes())?;
    stdout.flush()
}

/// Copy reply `n` (1-based), or the latest reply, and describe the result
pub fn copy_reply(handle: &ChatHandle, n: Option<usize>) -> Notice {
    let Some(text) = handle.reply_text(n) else {
        return match n {
            Some(n) => Notice::error(format!("No response #{} to copy", n)),
            None => Notice::error("No response to copy yet"),
        };
    };

    match copy_to_clipboard(&text) {
        Ok(()) => Notice::copied(),
        Err(e) => {
            tracing::warn!("Clipboard write failed: {}", e);
            Notice::error(format!("Copy failed: {}", e))
        }
    }
}
