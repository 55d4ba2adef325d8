//! Popup list for picking one of several options

use crate::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, HighlightSpacing, List, ListItem, ListState, StatefulWidget, Widget},
};
use unicode_width::UnicodeWidthStr;

const MAX_POPUP_WIDTH: u16 = 90;
const MAX_POPUP_HEIGHT: u16 = 20;

/// An item in the selector
pub struct SelectorItem<'a> {
    pub label: &'a str,
    /// Dimmed text after the label
    pub description: Option<&'a str>,
}

/// A centered popup list with one highlighted row
pub struct Selector<'a> {
    title: &'a str,
    items: Vec<SelectorItem<'a>>,
    selected: usize,
    theme: &'a Theme,
}

impl<'a> Selector<'a> {
    pub fn new(title: &'a str, items: Vec<SelectorItem<'a>>, theme: &'a Theme) -> Self {
        Self {
            title,
            items,
            selected: 0,
            theme,
        }
    }

    /// Set the highlighted row, clamped to the item count
    pub fn with_selected(mut self, index: usize) -> Self {
        self.selected = index.min(self.items.len().saturating_sub(1));
        self
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    /// Popup size needed for the items, before clamping to the screen
    fn popup_size(&self) -> (u16, u16) {
        let widest = self
            .items
            .iter()
            .map(|item| {
                item.label.width() + item.description.map(|d| d.width() + 2).unwrap_or(0) + 6
            })
            .max()
            .unwrap_or(0)
            .max(self.title.width() + 4);
        let width = (widest as u16).clamp(20, MAX_POPUP_WIDTH);
        let height = (self.items.len() as u16 + 2).min(MAX_POPUP_HEIGHT);
        (width, height)
    }

    /// Render the selector centered in `area`
    pub fn render_centered(&self, area: Rect, buf: &mut Buffer) {
        let (width, height) = self.popup_size();
        let width = width.min(area.width);
        let height = height.min(area.height);
        let popup = Rect::new(
            area.x + (area.width - width) / 2,
            area.y + (area.height - height) / 2,
            width,
            height,
        );

        Clear.render(popup, buf);

        let block = Block::default()
            .title(format!(" {} ", self.title))
            .title_style(self.theme.accent_bold())
            .borders(Borders::ALL)
            .border_style(self.theme.accent_style());

        let items: Vec<ListItem> = self
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let mut spans = vec![Span::styled(format!("{}. {}", i + 1, item.label), self.theme.base_style())];
                if let Some(description) = item.description {
                    spans.push(Span::styled(format!("  {}", description), self.theme.dim_style()));
                }
                ListItem::new(Line::from(spans))
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(self.theme.selected_style())
            .highlight_symbol("› ")
            .highlight_spacing(HighlightSpacing::Always);

        let mut state = ListState::default();
        state.select(Some(self.selected));
        StatefulWidget::render(list, popup, buf, &mut state);
    }
}

/// Visibility and highlighted row of a selector popup
#[derive(Debug, Default)]
pub struct SelectorState {
    pub selected: usize,
    pub visible: bool,
}

impl SelectorState {
    /// Show the popup with the first row highlighted
    pub fn show(&mut self) {
        self.visible = true;
        self.selected = 0;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    /// Move the highlight up, wrapping to the bottom
    pub fn up(&mut self, item_count: usize) {
        if item_count == 0 {
            return;
        }
        self.selected = if self.selected == 0 {
            item_count - 1
        } else {
            self.selected - 1
        };
    }

    /// Move the highlight down, wrapping to the top
    pub fn down(&mut self, item_count: usize) {
        if item_count == 0 {
            return;
        }
        self.selected = (self.selected + 1) % item_count;
    }
}
