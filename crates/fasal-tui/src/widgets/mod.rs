//! Custom widgets for the TUI

pub mod banner;
pub mod input_box;
pub mod message_list;
pub mod selector;
pub mod spinner;

pub use banner::{Banner, Feature, Landing};
pub use input_box::InputBox;
pub use message_list::{ChatMessage, MessageList, MessageRole};
pub use selector::{Selector, SelectorItem, SelectorState};
pub use spinner::Spinner;
