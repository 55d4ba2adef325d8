//! fasal-tui: Terminal UI components
//!
//! Building blocks for the chat screen, built on ratatui and crossterm.

pub mod app;
pub mod input;
pub mod theme;
pub mod widgets;

pub use app::TerminalSession;
pub use theme::Theme;
