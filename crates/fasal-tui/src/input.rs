//! Input handling

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Processed input action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Regular character input
    Char(char),
    /// Enter/submit
    Submit,
    Backspace,
    Delete,
    Left,
    Right,
    Up,
    Down,
    /// Move to start of line
    Home,
    /// Move to end of line
    End,
    PageUp,
    PageDown,
    /// Escape (abort request / close popup)
    Escape,
    /// Ctrl+C (abort request, quit when idle)
    Interrupt,
    /// Ctrl+L (clear conversation)
    Clear,
    /// Ctrl+U (clear input line)
    ClearLine,
    /// Ctrl+W (delete word)
    DeleteWord,
    /// Bracketed paste
    Paste(String),
    /// Ctrl+Y (copy latest reply)
    CopyReply,
    /// Ctrl+E or Tab on an empty line (example questions)
    Examples,
    /// Tab
    Tab,
    /// Ctrl+Q
    Quit,
    /// Unknown/unhandled
    Unknown,
}

/// Convert a crossterm key event to an action
pub fn key_to_action(event: KeyEvent) -> Action {
    let KeyEvent {
        code, modifiers, ..
    } = event;

    if modifiers.contains(KeyModifiers::CONTROL) {
        return match code {
            KeyCode::Char('c') => Action::Interrupt,
            KeyCode::Char('l') => Action::Clear,
            KeyCode::Char('u') => Action::ClearLine,
            KeyCode::Char('w') => Action::DeleteWord,
            KeyCode::Char('y') => Action::CopyReply,
            KeyCode::Char('e') => Action::Examples,
            KeyCode::Char('q') => Action::Quit,
            KeyCode::Char('a') => Action::Home,
            _ => Action::Unknown,
        };
    }

    if modifiers.contains(KeyModifiers::ALT) {
        return Action::Unknown;
    }

    match code {
        KeyCode::Char(c) => Action::Char(c),
        KeyCode::Enter => Action::Submit,
        KeyCode::Backspace => Action::Backspace,
        KeyCode::Delete => Action::Delete,
        KeyCode::Left => Action::Left,
        KeyCode::Right => Action::Right,
        KeyCode::Up => Action::Up,
        KeyCode::Down => Action::Down,
        KeyCode::Home => Action::Home,
        KeyCode::End => Action::End,
        KeyCode::PageUp => Action::PageUp,
        KeyCode::PageDown => Action::PageDown,
        KeyCode::Tab => Action::Tab,
        KeyCode::Esc => Action::Escape,
        _ => Action::Unknown,
    }
}

/// Convert a crossterm event to an action.
///
/// Key releases are ignored so terminals that report them do not double input.
pub fn event_to_action(event: Event) -> Option<Action> {
    match event {
        Event::Key(key_event) if key_event.kind != KeyEventKind::Release => {
            Some(key_to_action(key_event))
        }
        Event::Paste(text) => Some(Action::Paste(text)),
        _ => None,
    }
}
