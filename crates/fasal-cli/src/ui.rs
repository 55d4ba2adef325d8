//! TUI implementation for fasal

use crossterm::event::{Event, EventStream, MouseEventKind};
use fasal_chat::{ChatEvent, ChatHandle, ChatSession, Notice, NoticeLevel, RequestPhase, Role};
use fasal_tui::{
    TerminalSession, Theme,
    input::{Action, event_to_action},
    widgets::{
        Banner, ChatMessage, InputBox, Landing, MessageList, Selector, SelectorItem,
        SelectorState, Spinner, message_list::calculate_message_height,
    },
};
use futures::StreamExt;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
};
use std::time::{Duration, Instant};
use tokio::sync::broadcast::{
    self,
    error::{RecvError, TryRecvError},
};

use crate::clipboard;
use crate::commands::{CommandResult, execute_command};
use crate::config::Settings;
use crate::content;

/// How long a notice stays in the status line
const NOTICE_TTL: Duration = Duration::from_secs(4);

/// What the event loop should do after an input action
#[derive(Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// Send this question
    Send(String),
    Quit,
}

/// TUI application state
pub struct TuiState {
    messages: Vec<ChatMessage>,
    input: InputBox,
    /// Scroll offset in lines; `usize::MAX` sticks to the bottom
    scroll: usize,
    is_loading: bool,
    phase: RequestPhase,
    notice: Option<(Notice, Instant)>,
    theme: Theme,
    spinner_start: Instant,
    landing: Landing,
    examples: Vec<String>,
    example_selector: SelectorState,
    /// Number of non-empty replies, for copy numbering
    reply_count: usize,
    handle: ChatHandle,
}

impl TuiState {
    pub fn new(handle: ChatHandle, examples: Vec<String>, theme: Theme) -> Self {
        let mut input = InputBox::new().with_placeholder(content::INPUT_PLACEHOLDER);
        input.set_focused(true);

        Self {
            messages: vec![],
            input,
            scroll: 0,
            is_loading: false,
            phase: RequestPhase::Idle,
            notice: None,
            theme,
            spinner_start: Instant::now(),
            landing: content::landing(&examples),
            examples,
            example_selector: SelectorState::default(),
            reply_count: 0,
            handle,
        }
    }

    fn scroll_to_bottom(&mut self) {
        // Resolved against the content height during render
        self.scroll = usize::MAX;
    }

    fn show_notice(&mut self, notice: Notice) {
        self.notice = Some((notice, Instant::now()));
    }

    /// The notice to display, if it has not expired
    fn active_notice(&self, now: Instant) -> Option<&Notice> {
        self.notice
            .as_ref()
            .filter(|(_, shown)| now.duration_since(*shown) < NOTICE_TTL)
            .map(|(notice, _)| notice)
    }

    fn set_loading(&mut self, loading: bool) {
        self.is_loading = loading;
        self.input.set_busy(if loading {
            Some("waiting for reply · Esc to stop".to_string())
        } else {
            None
        });
    }

    /// Show a local message in the conversation
    pub fn show_info(&mut self, content: &str) {
        self.messages.push(ChatMessage::info(content));
        self.scroll_to_bottom();
    }

    /// Settle the streaming reply: drop it if nothing arrived, otherwise
    /// number it for copying. Returns false if no reply was streaming.
    fn settle_streaming(&mut self, content: Option<&str>) -> bool {
        let Some(last) = self.messages.last_mut() else {
            return false;
        };
        if !last.is_streaming {
            return false;
        }
        let text = content.map(str::to_string).unwrap_or_else(|| last.content.clone());
        if text.is_empty() {
            self.messages.pop();
            return true;
        }
        self.reply_count += 1;
        *last = ChatMessage::assistant(text, Some(self.reply_count));
        true
    }

    /// Rebuild the conversation view from the session's turns.
    ///
    /// Local info messages are not part of the session and are dropped.
    fn resync(&mut self, streaming: bool) {
        let turns = self.handle.turns();
        let last = turns.len().saturating_sub(1);
        self.messages.clear();
        self.reply_count = 0;
        for (i, turn) in turns.into_iter().enumerate() {
            let message = match turn.role {
                Role::User => ChatMessage::user(turn.content),
                Role::Assistant if streaming && i == last => {
                    ChatMessage::assistant_streaming(turn.content)
                }
                Role::Assistant if turn.content.is_empty() => ChatMessage::assistant("", None),
                Role::Assistant => {
                    self.reply_count += 1;
                    ChatMessage::assistant(turn.content, Some(self.reply_count))
                }
            };
            self.messages.push(message);
        }
        self.scroll_to_bottom();
    }

    /// Catch up after the event channel overflowed: skip what is still
    /// queued (keeping notices) and rebuild from the session.
    fn recover_from_lag(&mut self, rx: &mut broadcast::Receiver<ChatEvent>) {
        loop {
            match rx.try_recv() {
                Ok(ChatEvent::Notice(notice)) => self.show_notice(notice),
                Ok(_) | Err(TryRecvError::Lagged(_)) => {}
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
        self.phase = self.handle.phase();
        self.set_loading(self.handle.is_loading());
        self.resync(self.phase == RequestPhase::Streaming);
    }

    /// Apply the result of a `recv` on the session's event channel
    pub fn apply_recv(
        &mut self,
        event: Result<ChatEvent, RecvError>,
        rx: &mut broadcast::Receiver<ChatEvent>,
    ) {
        match event {
            Ok(event) => self.handle_chat_event(event),
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "UI fell behind session events");
                self.recover_from_lag(rx);
            }
            Err(RecvError::Closed) => {}
        }
    }

    /// Apply every queued session event
    pub fn drain_events(&mut self, rx: &mut broadcast::Receiver<ChatEvent>) {
        loop {
            match rx.try_recv() {
                Ok(event) => self.handle_chat_event(event),
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "UI fell behind session events");
                    self.recover_from_lag(rx);
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
    }

    /// Handle session events
    pub fn handle_chat_event(&mut self, event: ChatEvent) {
        match event {
            ChatEvent::RequestStart { message } => {
                self.messages.push(ChatMessage::user(message));
                self.set_loading(true);
                self.spinner_start = Instant::now();
                self.scroll_to_bottom();
            }
            ChatEvent::PhaseChanged { phase } => {
                self.phase = phase;
                if phase == RequestPhase::Idle {
                    self.set_loading(false);
                }
            }
            ChatEvent::AssistantStart => {
                self.messages.push(ChatMessage::assistant_streaming(""));
                self.scroll_to_bottom();
            }
            ChatEvent::AssistantUpdate { content } => {
                if let Some(last) = self.messages.last_mut() {
                    if last.is_streaming {
                        last.content = content;
                        self.scroll_to_bottom();
                    }
                }
            }
            ChatEvent::AssistantEnd { content, .. } => {
                if !self.settle_streaming(Some(&content)) {
                    self.resync(false);
                    return;
                }
                // An empty completed reply still shows as a turn
                if content.is_empty() {
                    self.messages.push(ChatMessage::assistant("", None));
                }
                self.scroll_to_bottom();
            }
            ChatEvent::Aborted { content } => {
                // An abort before the reply started has nothing to show
                if !self.settle_streaming(Some(&content)) && !content.is_empty() {
                    self.resync(false);
                    return;
                }
                self.scroll_to_bottom();
            }
            ChatEvent::Failed { .. } => {
                self.settle_streaming(None);
            }
            ChatEvent::Cleared => {
                self.messages.clear();
                self.reply_count = 0;
                self.scroll = 0;
            }
            ChatEvent::Notice(notice) => self.show_notice(notice),
        }
    }

    fn handle_selector_action(&mut self, action: Action, width: u16) -> Flow {
        match action {
            Action::Up => self.example_selector.up(self.examples.len()),
            Action::Down | Action::Tab => self.example_selector.down(self.examples.len()),
            Action::Submit => {
                if let Some(example) = self.examples.get(self.example_selector.selected) {
                    self.input.set_content(example.clone(), width);
                }
                self.example_selector.hide();
            }
            Action::Char(c) if c.is_ascii_digit() => {
                let index = c.to_digit(10).and_then(|d| (d as usize).checked_sub(1));
                if let Some(example) = index.and_then(|i| self.examples.get(i)) {
                    self.input.set_content(example.clone(), width);
                    self.example_selector.hide();
                }
            }
            Action::Escape | Action::Examples => self.example_selector.hide(),
            Action::Interrupt | Action::Quit => return Flow::Quit,
            _ => {}
        }
        Flow::Continue
    }

    /// Run a slash command typed into the input
    fn run_command(&mut self, command: CommandResult) -> Flow {
        match command {
            CommandResult::Clear => self.handle.clear(),
            CommandResult::Copy(n) => {
                let notice = clipboard::copy_reply(&self.handle, n);
                self.show_notice(notice);
            }
            CommandResult::Examples => self.example_selector.show(),
            CommandResult::Message(msg) => self.show_info(&msg),
            CommandResult::Exit => return Flow::Quit,
            CommandResult::Unknown(cmd) => self.show_info(&format!(
                "Unknown command: /{}\nType /help for available commands.",
                cmd
            )),
        }
        Flow::Continue
    }

    /// Handle keyboard action
    pub fn handle_action(&mut self, action: Action, width: u16) -> Flow {
        if self.example_selector.visible {
            return self.handle_selector_action(action, width);
        }

        match action {
            Action::Submit => {
                if self.input.content().trim().is_empty() || self.is_loading {
                    return Flow::Continue;
                }
                let content = self.input.take();
                if let Some(command) = execute_command(&content) {
                    return self.run_command(command);
                }
                // Shown immediately so a fast reply cannot race a second Enter
                self.set_loading(true);
                Flow::Send(content)
            }
            Action::Quit => Flow::Quit,
            Action::Interrupt => {
                if self.is_loading {
                    self.handle.abort();
                    Flow::Continue
                } else {
                    Flow::Quit
                }
            }
            Action::Escape => {
                if self.is_loading {
                    self.handle.abort();
                } else {
                    self.notice = None;
                }
                Flow::Continue
            }
            Action::Clear => {
                self.handle.clear();
                Flow::Continue
            }
            Action::CopyReply => self.run_command(CommandResult::Copy(None)),
            Action::Examples => {
                self.example_selector.show();
                Flow::Continue
            }
            Action::Tab if self.input.is_empty() => {
                self.example_selector.show();
                Flow::Continue
            }
            Action::PageUp => {
                self.scroll = self.scroll.saturating_sub(10);
                Flow::Continue
            }
            Action::PageDown => {
                self.scroll = self.scroll.saturating_add(10);
                Flow::Continue
            }
            Action::Up => {
                self.scroll = self.scroll.saturating_sub(1);
                Flow::Continue
            }
            Action::Down => {
                self.scroll = self.scroll.saturating_add(1);
                Flow::Continue
            }
            _ => {
                self.input.handle_action(&action, width);
                Flow::Continue
            }
        }
    }

    /// Render the UI
    pub fn render(&mut self, frame: &mut Frame) {
        let size = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(1),    // Messages
                Constraint::Length(1), // Status
                Constraint::Length(3), // Input
            ])
            .split(size);

        self.render_messages(frame, chunks[0]);
        self.render_status(frame, chunks[1]);
        self.input.render(chunks[2], frame.buffer_mut(), &self.theme);

        if self.example_selector.visible {
            self.render_example_selector(frame, size);
        }
    }

    fn render_example_selector(&self, frame: &mut Frame, area: Rect) {
        let items: Vec<SelectorItem> = self
            .examples
            .iter()
            .map(|example| SelectorItem {
                label: example.as_str(),
                description: None,
            })
            .collect();

        Selector::new("Example questions", items, &self.theme)
            .with_selected(self.example_selector.selected)
            .render_centered(area, frame.buffer_mut());
    }

    fn render_messages(&mut self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border_style())
            .title(Span::styled(
                format!(" {} ", content::TITLE),
                self.theme.accent_bold(),
            ));

        let inner = block.inner(area);
        frame.render_widget(block, area);

        if inner.height == 0 {
            return;
        }

        if self.messages.is_empty() {
            frame.render_widget(Banner::new(&self.landing, &self.theme), inner);
            return;
        }

        let content_height = calculate_message_height(&self.messages, inner.width as usize);
        let max_scroll = content_height.saturating_sub(inner.height as usize);
        self.scroll = self.scroll.min(max_scroll);

        let message_list = MessageList::new(&self.messages, &self.theme)
            .scroll(self.scroll)
            .elapsed(self.spinner_start.elapsed());
        frame.render_widget(message_list, inner);

        if content_height > inner.height as usize {
            let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("↑"))
                .end_symbol(Some("↓"))
                .track_symbol(Some("│"))
                .thumb_symbol("█");

            let mut scrollbar_state = ScrollbarState::new(content_height)
                .position(self.scroll)
                .viewport_content_length(inner.height as usize);

            frame.render_stateful_widget(scrollbar, inner, &mut scrollbar_state);
        }
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        if let Some(notice) = self.active_notice(Instant::now()) {
            let style = match notice.level {
                NoticeLevel::Success => self.theme.success_style(),
                NoticeLevel::Error => self.theme.error_style(),
            };
            frame.render_widget(Paragraph::new(Line::styled(notice.message.as_str(), style)), area);
            return;
        }

        if self.is_loading {
            let label = match self.phase {
                RequestPhase::Streaming => "Receiving answer...",
                _ => "Analyzing data...",
            };
            let spinner = Spinner::new(label, &self.theme).with_start_time(self.spinner_start);
            frame.render_widget(spinner, area);
            return;
        }

        let left = if self.reply_count > 0 {
            format!("{} replies", self.reply_count)
        } else {
            "Ready".to_string()
        };
        let right = "Ctrl+E: examples │ Ctrl+Y: copy │ Ctrl+L: clear │ Ctrl+C: quit";
        let left_width = left.chars().count();
        let right_width = right.chars().count();
        let available = area.width as usize;

        let line = if left_width + right_width + 2 <= available {
            Line::from(vec![
                Span::styled(left, self.theme.dim_style()),
                Span::raw(" ".repeat(available - left_width - right_width)),
                Span::styled(right, self.theme.dim_style()),
            ])
        } else {
            Line::from(Span::styled(left, self.theme.dim_style()))
        };
        frame.render_widget(Paragraph::new(line), area);
    }
}

fn apply_mouse(state: &mut TuiState, kind: MouseEventKind) {
    match kind {
        MouseEventKind::ScrollUp => state.scroll = state.scroll.saturating_sub(3),
        MouseEventKind::ScrollDown => state.scroll = state.scroll.saturating_add(3),
        _ => {}
    }
}

pub async fn run_tui(session: &ChatSession, settings: &Settings) -> anyhow::Result<()> {
    let mut terminal = TerminalSession::new()?.with_theme(Theme::by_name(&settings.theme));
    let mut state = TuiState::new(
        session.handle(),
        settings.examples.clone(),
        terminal.theme().clone(),
    );
    let mut chat_rx = session.subscribe();
    let mut event_stream = EventStream::new();

    // Tick interval for animations and notice expiry
    let mut tick_interval = tokio::time::interval(Duration::from_millis(80));

    let mut pending: Option<String> = None;

    loop {
        if let Some(question) = pending.take() {
            let mut submit = std::pin::pin!(session.submit(&question));

            // Poll the request alongside input until it settles
            loop {
                terminal.draw(|frame| state.render(frame))?;
                let width = terminal.size()?.width;

                tokio::select! {
                    biased;

                    outcome = &mut submit => {
                        match outcome {
                            Ok(outcome) => tracing::debug!(?outcome, "Request settled"),
                            Err(e) => tracing::debug!("Request failed: {}", e),
                        }
                        break;
                    }

                    event = chat_rx.recv() => state.apply_recv(event, &mut chat_rx),

                    // Input keeps working while the reply streams
                    event = event_stream.next() => match event {
                        Some(Ok(Event::Mouse(mouse))) => apply_mouse(&mut state, mouse.kind),
                        Some(Ok(event)) => {
                            if let Some(action) = event_to_action(event) {
                                if state.handle_action(action, width) == Flow::Quit {
                                    session.handle().abort();
                                    return Ok(());
                                }
                            }
                        }
                        Some(Err(e)) => return Err(anyhow::anyhow!("Event error: {}", e)),
                        None => return Ok(()),
                    },

                    _ = tick_interval.tick() => {}
                }
            }

            // Drain events published while the request settled
            state.drain_events(&mut chat_rx);
            continue;
        }

        terminal.draw(|frame| state.render(frame))?;
        let width = terminal.size()?.width;

        tokio::select! {
            biased;

            event = chat_rx.recv() => state.apply_recv(event, &mut chat_rx),

            event = event_stream.next() => match event {
                Some(Ok(Event::Mouse(mouse))) => apply_mouse(&mut state, mouse.kind),
                Some(Ok(event)) => {
                    if let Some(action) = event_to_action(event) {
                        match state.handle_action(action, width) {
                            Flow::Continue => {}
                            Flow::Send(question) => pending = Some(question),
                            Flow::Quit => break,
                        }
                    }
                }
                Some(Err(e)) => return Err(anyhow::anyhow!("Event error: {}", e)),
                None => break,
            },

            _ = tick_interval.tick() => {}
        }
    }

    Ok(())
}
