//! Question input widget

use crate::input::Action;
use crate::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::Line,
    widgets::{Block, Borders, Paragraph, Widget},
};
use unicode_width::UnicodeWidthChar;

/// Single-line text input.
///
/// The cursor is a character index, never a byte index, so editing is safe
/// for Devanagari and other multi-byte input.
#[derive(Debug, Default)]
pub struct InputBox {
    content: String,
    cursor: usize,
    /// Horizontal scroll offset in display columns
    scroll: usize,
    placeholder: String,
    /// Shown in the border while the input cannot be sent
    busy_title: Option<String>,
    focused: bool,
}

impl InputBox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    /// Mark the input as not sendable; typing still works
    pub fn set_busy(&mut self, title: Option<String>) {
        self.busy_title = title;
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Cursor position in characters
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Replace the content and move the cursor to the end
    pub fn set_content(&mut self, content: impl Into<String>, width: u16) {
        self.content = content.into().replace(['\r', '\n'], " ");
        self.cursor = self.content.chars().count();
        self.scroll = 0;
        self.update_scroll(width as usize);
    }

    /// Take the content, leaving the input empty
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        self.scroll = 0;
        std::mem::take(&mut self.content)
    }

    pub fn clear(&mut self) {
        self.take();
    }

    fn byte_offset(&self, char_index: usize) -> usize {
        self.content
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.content.len())
    }

    fn cursor_display_width(&self) -> usize {
        self.content
            .chars()
            .take(self.cursor)
            .map(|c| c.width().unwrap_or(0))
            .sum()
    }

    /// Remove the characters in `start..end` (character indices)
    fn remove_range(&mut self, start: usize, end: usize) {
        let start_byte = self.byte_offset(start);
        let end_byte = self.byte_offset(end);
        self.content.drain(start_byte..end_byte);
    }

    /// Apply an editing action. Returns whether the action was consumed.
    pub fn handle_action(&mut self, action: &Action, width: u16) -> bool {
        let char_count = self.content.chars().count();

        let handled = match action {
            Action::Char(c) => {
                self.insert_char(*c);
                true
            }
            Action::Backspace if self.cursor > 0 => {
                self.remove_range(self.cursor - 1, self.cursor);
                self.cursor -= 1;
                true
            }
            Action::Delete if self.cursor < char_count => {
                self.remove_range(self.cursor, self.cursor + 1);
                true
            }
            Action::Left if self.cursor > 0 => {
                self.cursor -= 1;
                true
            }
            Action::Right if self.cursor < char_count => {
                self.cursor += 1;
                true
            }
            Action::Home => {
                self.cursor = 0;
                true
            }
            Action::End => {
                self.cursor = char_count;
                true
            }
            Action::ClearLine => {
                self.clear();
                true
            }
            Action::DeleteWord => {
                let chars: Vec<char> = self.content.chars().collect();
                let mut start = self.cursor;
                while start > 0 && chars[start - 1].is_whitespace() {
                    start -= 1;
                }
                while start > 0 && !chars[start - 1].is_whitespace() {
                    start -= 1;
                }
                self.remove_range(start, self.cursor);
                self.cursor = start;
                true
            }
            Action::Paste(text) => {
                for c in text.chars() {
                    if c == '\n' || c == '\r' {
                        // Collapse line breaks into single spaces
                        if self.cursor > 0 && !self.content.ends_with(' ') {
                            self.insert_char(' ');
                        }
                    } else {
                        self.insert_char(c);
                    }
                }
                true
            }
            _ => false,
        };

        if handled {
            self.update_scroll(width as usize);
        }
        handled
    }

    fn insert_char(&mut self, c: char) {
        let byte_offset = self.byte_offset(self.cursor);
        self.content.insert(byte_offset, c);
        self.cursor += 1;
    }

    fn update_scroll(&mut self, width: usize) {
        // Borders plus one column for the cursor
        let visible_width = width.saturating_sub(3).max(1);
        let cursor_pos = self.cursor_display_width();

        if cursor_pos < self.scroll {
            self.scroll = cursor_pos;
        } else if cursor_pos >= self.scroll + visible_width {
            self.scroll = cursor_pos + 1 - visible_width;
        }
    }

    /// The part of the content visible in `width` columns
    fn visible_text(&self, width: usize) -> String {
        let mut skipped = 0;
        let mut used = 0;
        let mut visible = String::new();
        for c in self.content.chars() {
            let char_width = c.width().unwrap_or(0);
            if skipped < self.scroll {
                skipped += char_width;
                continue;
            }
            if used + char_width > width {
                break;
            }
            visible.push(c);
            used += char_width;
        }
        visible
    }

    pub fn render(&self, area: Rect, buf: &mut Buffer, theme: &Theme) {
        let mut block = Block::default()
            .borders(Borders::ALL)
            .border_style(if self.focused {
                theme.accent_style()
            } else {
                theme.border_style()
            });
        if let Some(title) = &self.busy_title {
            block = block.title(Line::styled(format!(" {} ", title), theme.dim_style()));
        }

        let inner = block.inner(area);
        block.render(area, buf);

        let (text, style) = if self.content.is_empty() {
            (self.placeholder.clone(), theme.dim_style())
        } else {
            (self.visible_text(inner.width as usize), theme.base_style())
        };
        Paragraph::new(text).style(style).render(inner, buf);

        if self.focused && inner.width > 0 && inner.height > 0 {
            let cursor_x = self.cursor_display_width().saturating_sub(self.scroll);
            if cursor_x < inner.width as usize {
                if let Some(cell) = buf.cell_mut((inner.x + cursor_x as u16, inner.y)) {
                    cell.set_style(Style::default().bg(theme.accent));
                }
            }
        }
    }
}
