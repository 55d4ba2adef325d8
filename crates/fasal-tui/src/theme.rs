//! Color theme support

use ratatui::style::{Color, Modifier, Style};

/// Color theme for the UI
#[derive(Debug, Clone)]
pub struct Theme {
    pub bg: Color,
    /// Primary text color
    pub fg: Color,
    /// Dimmed/secondary text
    pub dim: Color,
    /// Brand color (title, prompts, focused borders)
    pub accent: Color,
    /// Secondary brand color (badge, feature titles)
    pub harvest: Color,
    /// User turns
    pub user: Color,
    /// Assistant turns
    pub assistant: Color,
    pub error: Color,
    pub success: Color,
    pub border: Color,
    /// Selection/highlight background
    pub selection_bg: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

impl Theme {
    /// Dark theme (default)
    pub fn dark() -> Self {
        Self {
            bg: Color::Reset,
            fg: Color::White,
            dim: Color::DarkGray,
            accent: Color::Rgb(74, 170, 92),
            harvest: Color::Rgb(230, 170, 60),
            user: Color::Cyan,
            assistant: Color::Rgb(120, 200, 130),
            error: Color::Red,
            success: Color::Green,
            border: Color::DarkGray,
            selection_bg: Color::Rgb(40, 70, 45),
        }
    }

    /// Light theme
    pub fn light() -> Self {
        Self {
            bg: Color::White,
            fg: Color::Black,
            dim: Color::Gray,
            accent: Color::Rgb(30, 120, 50),
            harvest: Color::Rgb(170, 110, 0),
            user: Color::Blue,
            assistant: Color::Rgb(30, 120, 50),
            error: Color::Red,
            success: Color::Rgb(0, 130, 0),
            border: Color::Gray,
            selection_bg: Color::Rgb(200, 235, 200),
        }
    }

    /// Pick a theme by name, falling back to dark
    pub fn by_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "light" => Self::light(),
            _ => Self::dark(),
        }
    }

    pub fn base_style(&self) -> Style {
        Style::default().fg(self.fg).bg(self.bg)
    }

    pub fn dim_style(&self) -> Style {
        Style::default().fg(self.dim)
    }

    pub fn accent_style(&self) -> Style {
        Style::default().fg(self.accent)
    }

    pub fn accent_bold(&self) -> Style {
        Style::default()
            .fg(self.accent)
            .add_modifier(Modifier::BOLD)
    }

    pub fn harvest_style(&self) -> Style {
        Style::default().fg(self.harvest)
    }

    /// Header of a user turn
    pub fn user_header(&self) -> Style {
        Style::default().fg(self.user).add_modifier(Modifier::BOLD)
    }

    /// Header of an assistant turn
    pub fn assistant_header(&self) -> Style {
        Style::default()
            .fg(self.assistant)
            .add_modifier(Modifier::BOLD)
    }

    pub fn error_style(&self) -> Style {
        Style::default().fg(self.error)
    }

    pub fn success_style(&self) -> Style {
        Style::default().fg(self.success)
    }

    pub fn border_style(&self) -> Style {
        Style::default().fg(self.border)
    }

    /// Highlighted row in a list
    pub fn selected_style(&self) -> Style {
        Style::default()
            .bg(self.selection_bg)
            .fg(self.fg)
            .add_modifier(Modifier::BOLD)
    }
}
