//! Welcome screen shown before the first question

use crate::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

/// A highlighted capability on the welcome screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    pub title: String,
    pub description: String,
}

impl Feature {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Text of the welcome screen
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Landing {
    pub badge: String,
    pub title: String,
    pub tagline: String,
    pub features: Vec<Feature>,
    pub examples: Vec<String>,
    /// Key binding hints as (keys, description)
    pub hints: Vec<(String, String)>,
    pub footer: Vec<String>,
}

/// Renders a [`Landing`] centered horizontally
pub struct Banner<'a> {
    landing: &'a Landing,
    theme: &'a Theme,
}

impl<'a> Banner<'a> {
    pub fn new(landing: &'a Landing, theme: &'a Theme) -> Self {
        Self { landing, theme }
    }

    fn lines(&self, width: usize) -> Vec<Line<'static>> {
        let theme = self.theme;
        let landing = self.landing;
        let text_width = width.saturating_sub(4).max(10);
        let mut lines = Vec::new();

        lines.push(Line::from(""));
        if !landing.badge.is_empty() {
            lines.push(Line::from(Span::styled(
                format!("[ {} ]", landing.badge),
                theme.harvest_style(),
            )));
            lines.push(Line::from(""));
        }
        lines.push(Line::from(Span::styled(
            landing.title.clone(),
            theme.accent_bold(),
        )));
        lines.push(Line::from(""));
        for wrapped in textwrap::wrap(&landing.tagline, text_width) {
            lines.push(Line::from(Span::styled(wrapped.into_owned(), theme.base_style())));
        }

        if !landing.features.is_empty() {
            lines.push(Line::from(""));
            for feature in &landing.features {
                lines.push(Line::from(vec![
                    Span::styled(
                        format!("{}  ", feature.title),
                        theme.harvest_style().add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(feature.description.clone(), theme.dim_style()),
                ]));
            }
        }

        if !landing.examples.is_empty() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled("Try asking", theme.accent_style())));
            for (i, example) in landing.examples.iter().enumerate() {
                lines.push(Line::from(Span::styled(
                    format!("{}. {}", i + 1, example),
                    theme.base_style(),
                )));
            }
        }

        if !landing.hints.is_empty() {
            lines.push(Line::from(""));
            let mut spans = Vec::new();
            for (i, (keys, description)) in landing.hints.iter().enumerate() {
                if i > 0 {
                    spans.push(Span::styled("  │  ", theme.dim_style()));
                }
                spans.push(Span::styled(keys.clone(), theme.accent_style()));
                spans.push(Span::styled(format!(" {}", description), theme.dim_style()));
            }
            lines.push(Line::from(spans));
        }

        if !landing.footer.is_empty() {
            lines.push(Line::from(""));
            for footer in &landing.footer {
                for wrapped in textwrap::wrap(footer, text_width) {
                    lines.push(Line::from(Span::styled(wrapped.into_owned(), theme.dim_style())));
                }
            }
        }

        lines
    }

    /// Lines needed at `width`
    pub fn height(&self, width: u16) -> usize {
        self.lines(width as usize).len()
    }
}

impl Widget for Banner<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        let lines = self.lines(area.width as usize);
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .render(area, buf);
    }
}
