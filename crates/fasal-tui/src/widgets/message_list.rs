//! Message list widget for displaying the conversation

use crate::theme::Theme;
use crate::widgets::spinner;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};
use std::time::Duration;

/// Who a displayed message belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    User,
    /// An assistant reply; `index` is its 1-based copy number
    Assistant { index: Option<usize> },
    /// A local message (command output, help)
    Info,
}

/// A single message in the conversation view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
    /// Whether text is still arriving
    pub is_streaming: bool,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content.into())
    }

    pub fn assistant(content: impl Into<String>, index: Option<usize>) -> Self {
        Self::new(MessageRole::Assistant { index }, content.into())
    }

    /// An assistant reply that is still streaming
    pub fn assistant_streaming(content: impl Into<String>) -> Self {
        Self {
            is_streaming: true,
            ..Self::assistant(content, None)
        }
    }

    pub fn info(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Info, content.into())
    }

    fn new(role: MessageRole, content: String) -> Self {
        Self {
            role,
            content,
            is_streaming: false,
        }
    }

    pub fn is_assistant(&self) -> bool {
        matches!(self.role, MessageRole::Assistant { .. })
    }
}

/// Widget for displaying a list of chat messages
pub struct MessageList<'a> {
    messages: &'a [ChatMessage],
    theme: &'a Theme,
    scroll: usize,
    /// Time since the current reply started, for the waiting animation
    elapsed: Duration,
}

impl<'a> MessageList<'a> {
    pub fn new(messages: &'a [ChatMessage], theme: &'a Theme) -> Self {
        Self {
            messages,
            theme,
            scroll: 0,
            elapsed: Duration::ZERO,
        }
    }

    /// Set scroll offset in lines
    pub fn scroll(mut self, scroll: usize) -> Self {
        self.scroll = scroll;
        self
    }

    /// Set the animation clock for the waiting indicator
    pub fn elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }
}

fn header(msg: &ChatMessage, theme: &Theme) -> Line<'static> {
    let (text, style) = match msg.role {
        MessageRole::User => ("▶ You".to_string(), theme.user_header()),
        MessageRole::Assistant { index: Some(n) } => {
            (format!("◀ Assistant #{}", n), theme.assistant_header())
        }
        MessageRole::Assistant { index: None } => {
            ("◀ Assistant".to_string(), theme.assistant_header())
        }
        MessageRole::Info => ("● Info".to_string(), theme.dim_style()),
    };
    let text = if msg.is_streaming {
        format!("{} ▌", text)
    } else {
        text
    };
    Line::from(Span::styled(text, style))
}

fn content_style(msg: &ChatMessage, theme: &Theme) -> Style {
    match msg.role {
        MessageRole::Info => theme.dim_style(),
        _ => theme.base_style(),
    }
}

/// Lay out one message: header, content split on newlines and wrapped, blank
/// separator line.
fn message_lines(
    msg: &ChatMessage,
    width: usize,
    theme: &Theme,
    elapsed: Duration,
) -> Vec<Line<'static>> {
    let mut lines = vec![header(msg, theme)];
    let content_width = width.saturating_sub(2).max(1);

    if msg.is_streaming && msg.content.is_empty() {
        lines.push(Line::from(Span::styled(
            format!("  {} analyzing data...", spinner::frame_at(elapsed)),
            theme.harvest_style(),
        )));
    } else {
        let style = content_style(msg, theme);
        for paragraph in msg.content.split('\n') {
            if paragraph.trim().is_empty() {
                lines.push(Line::from(""));
                continue;
            }
            for wrapped in textwrap::wrap(paragraph, content_width) {
                lines.push(Line::from(Span::styled(format!("  {}", wrapped), style)));
            }
        }
    }

    lines.push(Line::from(""));
    lines
}

impl Widget for MessageList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let width = area.width as usize;
        let visible: Vec<Line> = self
            .messages
            .iter()
            .flat_map(|msg| message_lines(msg, width, self.theme, self.elapsed))
            .skip(self.scroll)
            .take(area.height as usize)
            .collect();

        Paragraph::new(visible).render(area, buf);
    }
}

/// Total height in lines of `messages` rendered at `width`
pub fn calculate_message_height(messages: &[ChatMessage], width: usize) -> usize {
    let theme = Theme::dark();
    messages
        .iter()
        .map(|msg| message_lines(msg, width, &theme, Duration::ZERO).len())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width)
            .map(|x| buf[(x, y)].symbol().to_string())
            .collect()
    }

    #[test]
    fn test_height_counts_header_lines_and_separator() {
        let messages = vec![ChatMessage::user("Hi")];
        assert_eq!(calculate_message_height(&messages, 40), 3);
    }

    #[test]
    fn test_height_splits_on_newlines() {
        let messages = vec![ChatMessage::assistant("Punjab\nHaryana\n\nUttar Pradesh", Some(1))];
        // header + 4 content lines + separator
        assert_eq!(calculate_message_height(&messages, 40), 6);
    }

    #[test]
    fn test_height_wraps_long_lines() {
        let text = "Millet and sorghum tolerate low rainfall better than rice";
        let messages = vec![ChatMessage::assistant(text, None)];
        let narrow = calculate_message_height(&messages, 20);
        let wide = calculate_message_height(&messages, 200);
        assert_eq!(wide, 3);
        assert!(narrow > wide);
    }

    #[test]
    fn test_streaming_placeholder_has_indicator_line() {
        let messages = vec![ChatMessage::assistant_streaming("")];
        assert_eq!(calculate_message_height(&messages, 40), 3);

        let theme = Theme::dark();
        let lines = message_lines(&messages[0], 40, &theme, Duration::ZERO);
        assert!(lines[0].to_string().ends_with('▌'));
        assert!(lines[1].to_string().contains("analyzing data"));
    }

    #[test]
    fn test_render_with_scroll() {
        let theme = Theme::dark();
        let messages = vec![
            ChatMessage::user("Which crops suit low rainfall?"),
            ChatMessage::assistant("Millet", Some(1)),
        ];
        let area = Rect::new(0, 0, 40, 3);

        let mut buf = Buffer::empty(area);
        MessageList::new(&messages, &theme).render(area, &mut buf);
        assert!(row(&buf, 0).contains("You"));
        assert!(row(&buf, 1).contains("Which crops suit low rainfall?"));

        let mut buf = Buffer::empty(area);
        MessageList::new(&messages, &theme).scroll(3).render(area, &mut buf);
        assert!(row(&buf, 0).contains("Assistant #1"));
        assert!(row(&buf, 1).contains("Millet"));
    }
}
