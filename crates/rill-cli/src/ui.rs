//! TUI implementation for rill

use tokio::sync::{broadcast, mpsc};

use crate::commands::{CommandResult, execute_command};
use crate::config::Settings;
use crate::utils::{format_size, truncate_chars};
use crossterm::event::{Event, EventStream};
use futures::StreamExt;
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap},
};
use rill_ai::{Attachment, ChatRequest, EndpointKind, Message, ModelSelector, models};
use rill_session::{
    RejectReason, SessionEvent, SessionHandle, StreamingChatSession, SubmitOutcome,
};
use rill_tui::{
    Theme,
    input::{Action, event_to_action},
    widgets::{InputBox, MessageList, Selector, SelectorItem, SelectorState, TypingIndicator},
};
use std::io;
use std::time::Instant;

/// Messages sent from the key handler to the event loop
#[derive(Debug)]
pub enum UiMessage {
    /// User submitted a prompt
    Submit(String),
    /// Slash command
    Command(String),
    /// Change model (index into the model registry)
    ChangeModel(usize),
    /// User requested clear
    Clear,
    /// User requested quit
    Quit,
    /// A spawned submit resolved
    Finished(SubmitOutcome),
}

/// TUI application state
pub struct TuiState {
    /// Local copy of the conversation, kept in step with session events
    messages: Vec<Message>,
    input: InputBox,
    /// Current scroll position, `usize::MAX` pins to the bottom
    scroll: usize,
    /// Whether a reply is streaming
    streaming: bool,
    /// Typing indicator start time for animation
    streaming_since: Instant,
    /// Current status message
    status: String,
    /// Multi-line text shown in a popup until the next key
    notice: Option<String>,
    theme: Theme,
    /// Model used for the next submit
    model: ModelSelector,
    kind: EndpointKind,
    /// File to send with the next prompt
    attachment: Option<Attachment>,
    model_selector: SelectorState,
    /// Cancels the in-flight reply without going through the event loop
    handle: SessionHandle,
    ui_tx: mpsc::Sender<UiMessage>,
}

impl TuiState {
    pub fn new(
        model: ModelSelector,
        kind: EndpointKind,
        theme: Theme,
        handle: SessionHandle,
        ui_tx: mpsc::Sender<UiMessage>,
    ) -> Self {
        let mut input = InputBox::new().with_placeholder("Type a message...");
        input.set_focused(true);

        Self {
            messages: vec![],
            input,
            scroll: 0,
            streaming: false,
            streaming_since: Instant::now(),
            status: "Ready".to_string(),
            notice: None,
            theme,
            model,
            kind,
            attachment: None,
            model_selector: SelectorState::default(),
            handle,
            ui_tx,
        }
    }

    /// Mirror one session event into the local conversation
    pub fn apply_event(&mut self, event: SessionEvent) {
        if event.changes_conversation() {
            self.scroll_to_bottom();
        }

        match event {
            SessionEvent::MessageAppended { index, message } => {
                if index == self.messages.len() {
                    self.messages.push(message);
                } else if let Some(slot) = self.messages.get_mut(index) {
                    *slot = message;
                }
            }
            SessionEvent::MessageReplaced { index, message } => {
                if let Some(slot) = self.messages.get_mut(index) {
                    *slot = message;
                }
            }
            SessionEvent::Cleared => {
                self.messages.clear();
            }
            SessionEvent::SubmitStart { .. } | SessionEvent::SubmitEnd { .. } => {}
        }
    }

    /// Replace the local conversation wholesale (after missed events)
    pub fn sync_messages(&mut self, messages: Vec<Message>) {
        self.messages = messages;
        self.scroll_to_bottom();
    }

    pub fn set_streaming(&mut self, streaming: bool) {
        if streaming == self.streaming {
            return;
        }
        self.streaming = streaming;
        self.input.set_disabled(streaming);
        if streaming {
            self.streaming_since = Instant::now();
            self.status = "Thinking...".to_string();
        }
    }

    /// Record how a submit ended
    pub fn finish(&mut self, outcome: SubmitOutcome) {
        self.status = match outcome {
            SubmitOutcome::Completed { .. } => "Ready".to_string(),
            SubmitOutcome::Cancelled => "Cancelled".to_string(),
            SubmitOutcome::Failed { error } => format!("Error: {}", truncate_chars(&error, 80)),
            SubmitOutcome::Rejected(RejectReason::Empty) => "Nothing to send".to_string(),
            SubmitOutcome::Rejected(RejectReason::Busy) => {
                "Still waiting for the previous reply".to_string()
            }
        };
    }

    pub fn set_model(&mut self, model: ModelSelector) {
        self.model = model;
        self.status = format!("Switched to: {}", model.display_name());
    }

    pub fn set_attachment(&mut self, attachment: Option<Attachment>) {
        let title = attachment.as_ref().map(|a| {
            format!(
                "File: {} ({}) │ Ctrl+X: remove",
                truncate_chars(&a.file_name, 30),
                format_size(a.len())
            )
        });
        self.input.set_title(title);
        self.attachment = attachment;
    }

    fn take_attachment(&mut self) -> Option<Attachment> {
        self.input.set_title(None);
        self.attachment.take()
    }

    fn scroll_to_bottom(&mut self) {
        // Will be calculated during render based on content height
        self.scroll = usize::MAX;
    }

    fn open_model_selector(&mut self) {
        let current = models::get_all_models()
            .iter()
            .position(|m| m.id == self.model.id())
            .unwrap_or(0);
        self.model_selector.show_at(current);
    }

    /// Whether Enter should send what is in the input box
    fn can_send(&self, content: &str) -> bool {
        !content.trim().is_empty()
            || (self.attachment.is_some() && self.kind.supports_attachments())
    }

    /// Handle keyboard action. Returns false when the app should exit.
    pub async fn handle_action(&mut self, action: Action, width: u16) -> bool {
        if self.notice.is_some() {
            self.notice = None;
            return true;
        }

        // Handle model selector if visible
        if self.model_selector.visible {
            let count = models::get_all_models().len();
            match action {
                Action::Up => self.model_selector.up(count),
                Action::Down => self.model_selector.down(count),
                Action::Submit => {
                    let selected = self.model_selector.selected;
                    self.model_selector.hide();
                    let _ = self.ui_tx.send(UiMessage::ChangeModel(selected)).await;
                }
                Action::Escape | Action::ModelSelect => self.model_selector.hide(),
                // Ignore other actions while selector is open
                _ => {}
            }
            return true;
        }

        match action {
            Action::Submit => {
                let content = self.input.content();
                if self.streaming {
                    return true;
                }
                if content.trim_start().starts_with('/') {
                    self.input.clear();
                    let _ = self.ui_tx.send(UiMessage::Command(content)).await;
                } else if self.can_send(&content) {
                    self.input.clear();
                    let _ = self.ui_tx.send(UiMessage::Submit(content)).await;
                }
                true
            }
            Action::Quit => {
                let _ = self.ui_tx.send(UiMessage::Quit).await;
                false
            }
            Action::Interrupt => {
                if self.streaming {
                    self.cancel();
                    true
                } else {
                    let _ = self.ui_tx.send(UiMessage::Quit).await;
                    false
                }
            }
            Action::Escape => {
                if self.streaming {
                    self.cancel();
                }
                true
            }
            Action::PageUp => {
                self.scroll = self.scroll.saturating_sub(10);
                true
            }
            Action::PageDown => {
                self.scroll = self.scroll.saturating_add(10);
                true
            }
            Action::Up => {
                self.scroll = self.scroll.saturating_sub(1);
                true
            }
            Action::Down => {
                self.scroll = self.scroll.saturating_add(1);
                true
            }
            Action::Clear => {
                let _ = self.ui_tx.send(UiMessage::Clear).await;
                true
            }
            Action::ModelSelect => {
                if !self.streaming {
                    self.open_model_selector();
                }
                true
            }
            Action::Attach => {
                let path = self.input.content().trim().to_string();
                if path.is_empty() {
                    self.status = "Type a file path, then press Ctrl+O".to_string();
                } else if !self.streaming {
                    self.input.clear();
                    let _ = self
                        .ui_tx
                        .send(UiMessage::Command(format!("/attach {}", path)))
                        .await;
                }
                true
            }
            Action::Detach => {
                let _ = self.ui_tx.send(UiMessage::Command("/detach".to_string())).await;
                true
            }
            _ => {
                self.input.handle_action(&action, width);
                true
            }
        }
    }

    fn cancel(&mut self) {
        if self.handle.cancel() {
            self.status = "Cancelled".to_string();
        }
    }

    /// Render the UI
    pub fn render(&mut self, frame: &mut Frame) {
        let size = frame.area();

        // Layout: messages (flex), status bar (1), input (3)
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

        if self.model_selector.visible {
            self.render_model_selector(frame, size);
        }

        if let Some(ref notice) = self.notice {
            self.render_notice(frame, size, notice);
        }
    }

    fn render_model_selector(&self, frame: &mut Frame, area: Rect) {
        let ids: Vec<String> = models::get_all_models()
            .iter()
            .map(|m| m.id.to_string())
            .collect();
        let items: Vec<SelectorItem> = models::get_all_models()
            .iter()
            .zip(&ids)
            .map(|(m, id)| SelectorItem {
                label: m.name,
                description: Some(id.as_str()),
                is_current: m.id == self.model.id(),
            })
            .collect();

        Selector::new("Select Model", items, &self.theme)
            .with_selected(self.model_selector.selected)
            .render_centered(area, frame.buffer_mut());
    }

    fn render_notice(&self, frame: &mut Frame, area: Rect, notice: &str) {
        let widest = notice.lines().map(|l| l.chars().count()).max().unwrap_or(0);
        let width = (widest as u16 + 4).min(area.width);
        let height = (notice.lines().count() as u16 + 2).min(area.height);
        let popup = Rect::new(
            area.x + area.width.saturating_sub(width) / 2,
            area.y + area.height.saturating_sub(height) / 2,
            width,
            height,
        );

        frame.render_widget(Clear, popup);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.accent_style())
            .title(" rill ")
            .title_bottom(Line::from(" any key to close ").right_aligned());
        let paragraph = Paragraph::new(notice.to_string())
            .style(self.theme.base_style())
            .wrap(Wrap { trim: false })
            .block(block);
        frame.render_widget(paragraph, popup);
    }

    fn welcome_lines(&self) -> Vec<Line<'static>> {
        let key = |k: &'static str, what: &'static str| {
            Line::from(vec![
                Span::styled(format!("    {:<10}", k), self.theme.accent_style()),
                Span::styled(what, self.theme.base_style()),
            ])
        };

        vec![
            Line::from(""),
            Line::from(vec![
                Span::styled("  ≈ ", self.theme.accent_bold()),
                Span::styled("rill", self.theme.base_style()),
                Span::styled(" - chat with your local models", self.theme.dim_style()),
            ]),
            Line::from(""),
            Line::from(Span::styled(
                format!(
                    "  Model: {} │ Endpoint: {}",
                    self.model.display_name(),
                    self.kind.name()
                ),
                self.theme.dim_style(),
            )),
            Line::from(""),
            Line::from(""),
            Line::from(Span::styled("  Keybindings", self.theme.accent_bold())),
            Line::from(""),
            key("Enter", "Send message"),
            key("Esc", "Stop the reply"),
            key("Ctrl+O", "Attach the file whose path is typed in the input"),
            key("Ctrl+X", "Remove the attachment"),
            key("Ctrl+K", "Select model"),
            key("Ctrl+L", "Clear conversation"),
            key("Ctrl+C", "Stop / Quit"),
            key("PgUp/Dn", "Scroll history"),
            Line::from(""),
            Line::from(""),
            Line::from(Span::styled(
                "  Type a message to get started, or /help for commands...",
                self.theme.dim_style(),
            )),
        ]
    }

    fn render_messages(&mut self, frame: &mut Frame, area: Rect) {
        let title = format!(" rill │ {} ", self.model.display_name());
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border_style())
            .title(title);

        let inner = block.inner(area);
        frame.render_widget(block, area);

        if inner.height == 0 || self.messages.is_empty() {
            frame.render_widget(Paragraph::new(self.welcome_lines()), inner);
            return;
        }

        let list = MessageList::new(&self.messages, &self.theme)
            .streaming(self.streaming, self.streaming_since);
        let content_height = list.height(inner.width as usize);
        let max_scroll = content_height.saturating_sub(inner.height as usize);

        // usize::MAX lands on the bottom
        self.scroll = self.scroll.min(max_scroll);

        frame.render_widget(list.scroll(self.scroll), inner);

        // Render scrollbar if content overflows
        if content_height > inner.height as usize {
            let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("↑"))
                .end_symbol(Some("↓"))
                .track_symbol(Some("│"))
                .thumb_symbol("█");

            let mut scrollbar_state = ScrollbarState::new(max_scroll)
                .position(self.scroll)
                .viewport_content_length(inner.height as usize);

            frame.render_stateful_widget(scrollbar, inner, &mut scrollbar_state);
        }
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let (left, right) = if self.streaming {
            let indicator = TypingIndicator::new(&self.theme)
                .with_label(&self.status)
                .with_start_time(self.streaming_since);
            (indicator.line(), "Esc: cancel")
        } else {
            let text = format!(
                "{} │ {} │ {}",
                self.model.display_name(),
                self.kind.name(),
                self.status
            );
            let style = if self.status.starts_with("Error") {
                self.theme.error_style()
            } else {
                self.theme.dim_style()
            };
            (
                Line::from(Span::styled(text, style)),
                "Enter: send │ Ctrl+K: model │ Ctrl+O: attach │ Ctrl+C: quit",
            )
        };

        let left_width = left.width();
        let right_width = right.chars().count();
        let available = area.width as usize;

        // Build the line with spacing
        let line = if left_width + right_width + 2 <= available {
            let mut spans = left.spans;
            spans.push(Span::raw(" ".repeat(available - left_width - right_width)));
            spans.push(Span::styled(right, self.theme.dim_style()));
            Line::from(spans)
        } else {
            left
        };

        frame.render_widget(Paragraph::new(line), area);
    }
}

/// Run the TUI application
pub async fn run_tui(
    session: &StreamingChatSession,
    settings: &Settings,
    attachment: Option<Attachment>,
) -> anyhow::Result<()> {
    use crossterm::{
        event::{DisableBracketedPaste, EnableBracketedPaste},
        execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    };

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let (ui_tx, ui_rx) = mpsc::channel::<UiMessage>(32);
    let theme = Theme::by_name(&settings.theme).unwrap_or_else(Theme::dark);
    let mut state = TuiState::new(
        settings.model,
        settings.kind,
        theme,
        session.handle(),
        ui_tx.clone(),
    );
    state.set_attachment(attachment);

    let result = event_loop(&mut terminal, &mut state, session, ui_tx, ui_rx).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableBracketedPaste)?;
    terminal.show_cursor()?;

    // a reply still streaming on exit is abandoned
    session.cancel();

    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    state: &mut TuiState,
    session: &StreamingChatSession,
    ui_tx: mpsc::Sender<UiMessage>,
    mut ui_rx: mpsc::Receiver<UiMessage>,
) -> anyhow::Result<()> {
    let mut session_rx = session.subscribe();
    let mut event_stream = EventStream::new();

    // Tick interval for animations
    let mut tick_interval = tokio::time::interval(std::time::Duration::from_millis(80));

    loop {
        state.set_streaming(session.is_streaming());
        terminal.draw(|frame| state.render(frame))?;
        let area_width = terminal.size()?.width;

        tokio::select! {
            biased;

            // Session events first so streamed text shows up promptly
            event = session_rx.recv() => {
                match event {
                    Ok(event) => state.apply_event(event),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::debug!("TUI missed {} session events, resyncing", n);
                        state.sync_messages(session.messages());
                    }
                    Err(broadcast::error::RecvError::Closed) => return Ok(()),
                }
            }

            // Handle terminal events (keyboard input)
            event = event_stream.next() => {
                match event {
                    Some(Ok(Event::Resize(_, _))) => {}
                    Some(Ok(event)) => {
                        if let Some(action) = event_to_action(event) {
                            if !state.handle_action(action, area_width).await {
                                return Ok(());
                            }
                        }
                    }
                    Some(Err(e)) => return Err(anyhow::anyhow!("Event error: {}", e)),
                    None => return Ok(()),
                }
            }

            // Tick for animations (typing indicator)
            _ = tick_interval.tick() => {}

            msg = ui_rx.recv() => {
                match msg {
                    Some(UiMessage::Submit(content)) => {
                        let mut request = ChatRequest::new(content, state.model);
                        request.attachment = state.take_attachment();

                        let session = session.clone();
                        let tx = ui_tx.clone();
                        tokio::spawn(async move {
                            let outcome = session.submit(request).await;
                            let _ = tx.send(UiMessage::Finished(outcome)).await;
                        });
                    }
                    Some(UiMessage::Finished(outcome)) => state.finish(outcome),
                    Some(UiMessage::Command(cmd)) => {
                        if !run_command(state, session, &cmd).await {
                            return Ok(());
                        }
                    }
                    Some(UiMessage::ChangeModel(index)) => {
                        if let Some(model) = models::get_all_models().get(index) {
                            state.set_model(model.selector());
                        }
                    }
                    Some(UiMessage::Clear) => {
                        session.clear();
                        state.status = "Cleared".to_string();
                    }
                    Some(UiMessage::Quit) | None => return Ok(()),
                }
            }
        }
    }
}

/// Apply a slash command. Returns false on /quit.
async fn run_command(state: &mut TuiState, session: &StreamingChatSession, cmd: &str) -> bool {
    let Some(result) = execute_command(cmd) else {
        return true;
    };

    match result {
        CommandResult::Message(msg) => {
            state.notice = Some(msg);
        }
        CommandResult::Clear => {
            session.clear();
            state.status = "Cleared".to_string();
        }
        CommandResult::ChangeModel(model) => {
            state.set_model(model);
        }
        CommandResult::Attach(path) => match Attachment::from_path(&path).await {
            Ok(attachment) => {
                state.status = if state.kind.supports_attachments() {
                    format!("Attached {}", attachment.file_name)
                } else {
                    format!(
                        "Attached {} (the {} endpoint will not send it)",
                        attachment.file_name,
                        state.kind.name()
                    )
                };
                state.set_attachment(Some(attachment));
            }
            Err(e) => {
                state.status = format!("Could not attach {}: {}", path.display(), e);
            }
        },
        CommandResult::Detach => {
            state.status = match state.take_attachment() {
                Some(attachment) => format!("Removed {}", attachment.file_name),
                None => "No file attached".to_string(),
            };
        }
        CommandResult::Exit => return false,
        CommandResult::Unknown(cmd) => {
            state.status = format!("Unknown command: /{} (try /help)", cmd);
        }
        CommandResult::OpenModelSelector => {
            state.open_model_selector();
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ratatui::backend::TestBackend;
    use rill_ai::{ByteStream, InferenceEndpoint};
    use rill_session::SessionConfig;
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    struct UnusedEndpoint;

    #[async_trait]
    impl InferenceEndpoint for UnusedEndpoint {
        fn kind(&self) -> EndpointKind {
            EndpointKind::Chat
        }

        async fn open(
            &self,
            _request: &ChatRequest,
            _cancel: CancellationToken,
        ) -> rill_ai::Result<ByteStream> {
            Err(rill_ai::Error::Aborted)
        }
    }

    fn state() -> (TuiState, mpsc::Receiver<UiMessage>) {
        let session = StreamingChatSession::new(SessionConfig::default(), Arc::new(UnusedEndpoint));
        let (tx, rx) = mpsc::channel(8);
        let state = TuiState::new(
            ModelSelector(1),
            EndpointKind::Chat,
            Theme::dark(),
            session.handle(),
            tx,
        );
        (state, rx)
    }

    async fn type_text(state: &mut TuiState, text: &str) {
        for c in text.chars() {
            state.handle_action(Action::Char(c), 80).await;
        }
    }

    #[test]
    fn test_apply_event_mirrors_conversation() {
        let (mut state, _rx) = state();
        state.scroll = 3;

        state.apply_event(SessionEvent::MessageAppended {
            index: 0,
            message: Message::user("hi"),
        });
        state.apply_event(SessionEvent::MessageAppended {
            index: 1,
            message: Message::assistant_placeholder(),
        });
        state.apply_event(SessionEvent::MessageReplaced {
            index: 1,
            message: Message::assistant("Hello"),
        });

        assert_eq!(state.messages.len(), 2);
        assert_eq!(state.messages[1].content, "Hello");
        assert_eq!(state.scroll, usize::MAX);

        state.apply_event(SessionEvent::Cleared);
        assert!(state.messages.is_empty());
    }

    #[tokio::test]
    async fn test_enter_sends_prompt_and_clears_input() {
        let (mut state, mut rx) = state();
        type_text(&mut state, "Hello").await;

        assert!(state.handle_action(Action::Submit, 80).await);
        assert!(matches!(rx.try_recv(), Ok(UiMessage::Submit(text)) if text == "Hello"));
        assert!(state.input.is_empty());
    }

    #[tokio::test]
    async fn test_blank_input_is_not_sent() {
        let (mut state, mut rx) = state();
        type_text(&mut state, "   ").await;
        state.handle_action(Action::Submit, 80).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_attachment_alone_can_be_sent() {
        let (mut state, mut rx) = state();
        state.set_attachment(Some(Attachment::new("notes.txt", b"abc".to_vec())));
        state.handle_action(Action::Submit, 80).await;
        assert!(matches!(rx.try_recv(), Ok(UiMessage::Submit(text)) if text.is_empty()));
    }

    #[tokio::test]
    async fn test_input_is_locked_while_streaming() {
        let (mut state, mut rx) = state();
        type_text(&mut state, "draft").await;
        state.set_streaming(true);

        state.handle_action(Action::Char('!'), 80).await;
        state.handle_action(Action::Submit, 80).await;

        assert_eq!(state.input.content(), "draft");
        assert!(rx.try_recv().is_err());
        assert_eq!(state.status, "Thinking...");
    }

    #[tokio::test]
    async fn test_slash_input_goes_to_commands() {
        let (mut state, mut rx) = state();
        type_text(&mut state, "/model gemini").await;
        state.handle_action(Action::Submit, 80).await;
        assert!(matches!(rx.try_recv(), Ok(UiMessage::Command(cmd)) if cmd == "/model gemini"));
    }

    #[tokio::test]
    async fn test_interrupt_quits_when_idle_but_escape_does_not() {
        let (mut state, mut rx) = state();
        assert!(state.handle_action(Action::Escape, 80).await);
        assert!(rx.try_recv().is_err());

        assert!(!state.handle_action(Action::Interrupt, 80).await);
        assert!(matches!(rx.try_recv(), Ok(UiMessage::Quit)));
    }

    #[tokio::test]
    async fn test_ctrl_o_attaches_typed_path() {
        let (mut state, mut rx) = state();
        state.handle_action(Action::Attach, 80).await;
        assert!(state.status.contains("Ctrl+O"));
        assert!(rx.try_recv().is_err());

        type_text(&mut state, "/tmp/report.pdf").await;
        state.handle_action(Action::Attach, 80).await;
        assert!(
            matches!(rx.try_recv(), Ok(UiMessage::Command(cmd)) if cmd == "/attach /tmp/report.pdf")
        );
        assert!(state.input.is_empty());
    }

    #[tokio::test]
    async fn test_model_selector_picks_by_index() {
        let (mut state, mut rx) = state();
        state.handle_action(Action::ModelSelect, 80).await;
        assert!(state.model_selector.visible);
        assert_eq!(state.model_selector.selected, 0);

        state.handle_action(Action::Down, 80).await;
        state.handle_action(Action::Submit, 80).await;

        assert!(!state.model_selector.visible);
        assert!(matches!(rx.try_recv(), Ok(UiMessage::ChangeModel(1))));
    }

    #[tokio::test]
    async fn test_notice_closes_on_any_key() {
        let (mut state, mut rx) = state();
        state.notice = Some("help".to_string());
        state.handle_action(Action::Submit, 80).await;
        assert!(state.notice.is_none());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_finish_sets_status() {
        let (mut state, _rx) = state();
        state.finish(SubmitOutcome::Failed {
            error: "Endpoint returned status 500: boom".into(),
        });
        assert!(state.status.starts_with("Error: Endpoint returned status 500"));
        state.finish(SubmitOutcome::Cancelled);
        assert_eq!(state.status, "Cancelled");
    }

    #[test]
    fn test_attachment_shows_in_input_title() {
        let (mut state, _rx) = state();
        state.set_attachment(Some(Attachment::new("notes.txt", vec![0u8; 2048])));
        assert_eq!(
            state.input.title(),
            Some("File: notes.txt (2.0 KB) │ Ctrl+X: remove")
        );
        assert!(state.take_attachment().is_some());
        assert_eq!(state.input.title(), None);
    }

    #[test]
    fn test_welcome_screen_renders() {
        let (mut state, _rx) = state();
        let mut terminal = Terminal::new(TestBackend::new(80, 30)).unwrap();
        terminal.draw(|frame| state.render(frame)).unwrap();

        let buffer = terminal.backend().buffer();
        let text: String = buffer.content.iter().map(|c| c.symbol()).collect();
        assert!(text.contains("rill │ Ollama"));
        assert!(text.contains("Keybindings"));
        assert!(text.contains("Ctrl+C: quit"));
    }
}
