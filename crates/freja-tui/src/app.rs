// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! The interactive chat session: terminal event loop, streaming state and
//! the bridge between the backend stream and the content classifier.

use std::sync::Arc;

use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::{DefaultTerminal, Frame};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use freja_config::Config;
use freja_content::{StreamClassifier, UnicodeTypesetter};
use freja_model::{ChatBackend, Message, ResponseEvent};

use crate::entry::{messages_for_request, ChatEntry};
use crate::markdown::StyledLines;
use crate::render::render_transcript;

/// Shown in place of an answer when the backend stream fails.
const BACKEND_ERROR_MESSAGE: &str = "Sorry, I encountered an error while processing \
your request. Please make sure Ollama is running locally.";

/// Options passed when constructing the TUI app.
pub struct AppOptions {
    pub initial_prompt: Option<String>,
    pub show_reasoning: bool,
    pub ascii: bool,
}

/// The top-level TUI application state.
pub struct App {
    config: Arc<Config>,
    backend: Arc<dyn ChatBackend>,
    entries: Vec<ChatEntry>,
    /// Splits incoming deltas into visible and reasoning channels while a
    /// response is streaming.
    classifier: StreamClassifier,
    typesetter: UnicodeTypesetter,
    chat_lines: StyledLines,
    scroll_offset: u16,
    input_buffer: String,
    input_cursor: usize,
    queued_prompt: Option<String>,
    busy: bool,
    show_reasoning: bool,
    ascii: bool,
    chat_height: u16,
    chat_width: u16,
    event_rx: Option<mpsc::Receiver<ResponseEvent>>,
}

impl App {
    pub fn new(config: Arc<Config>, backend: Arc<dyn ChatBackend>, opts: AppOptions) -> Self {
        Self {
            config,
            backend,
            entries: Vec::new(),
            classifier: StreamClassifier::new(),
            typesetter: UnicodeTypesetter,
            chat_lines: Vec::new(),
            scroll_offset: 0,
            input_buffer: String::new(),
            input_cursor: 0,
            queued_prompt: opts.initial_prompt,
            busy: false,
            show_reasoning: opts.show_reasoning,
            ascii: opts.ascii,
            chat_height: 24,
            chat_width: 80,
            event_rx: None,
        }
    }

    /// Run the TUI event loop.
    pub async fn run(mut self, mut terminal: DefaultTerminal) -> anyhow::Result<()> {
        if let Some(prompt) = self.queued_prompt.take() {
            self.submit(prompt);
        }

        let mut crossterm_events = EventStream::new();

        loop {
            if let Ok(size) = terminal.size() {
                // Borders take two rows/columns; one more row for the input bar
                // and one for the status line.
                self.chat_height = size.height.saturating_sub(5).max(1);
                self.chat_width = size.width.saturating_sub(2).max(20);
            }
            self.rerender_chat();

            terminal.draw(|frame| draw(frame, &self))?;

            tokio::select! {
                Some(event) = recv_response_event(&mut self.event_rx) => {
                    self.handle_response_event(event);
                }
                Some(Ok(term_event)) = crossterm_events.next() => {
                    if self.handle_term_event(term_event) {
                        break;
                    }
                }
            }
        }

        Ok(())
    }

    // ── Response stream handling ──────────────────────────────────────────────

    fn handle_response_event(&mut self, event: ResponseEvent) {
        match event {
            ResponseEvent::TextDelta(delta) => {
                self.classifier.feed(&delta);
                self.scroll_to_bottom();
            }
            ResponseEvent::Done => {
                self.commit_response(None);
            }
            ResponseEvent::Error(msg) => {
                warn!(error = %msg, "backend stream failed");
                self.commit_response(Some(msg));
            }
        }
    }

    /// Finish the in-flight response: flush the classifier and move its
    /// channels into the transcript.  On error, substitute the fallback
    /// message for a missing answer and record the detail separately.
    fn commit_response(&mut self, error: Option<String>) {
        self.classifier.finalize();

        let reasoning = self.classifier.reasoning_text().trim().to_string();
        if !reasoning.is_empty() {
            self.entries.push(ChatEntry::Reasoning { content: reasoning });
        }

        let visible = self.classifier.visible_text().trim().to_string();
        match error {
            None => {
                if !visible.is_empty() {
                    self.entries.push(ChatEntry::Message(Message::assistant(visible)));
                }
            }
            Some(detail) => {
                if !visible.is_empty() {
                    self.entries.push(ChatEntry::Message(Message::assistant(visible)));
                }
                self.entries
                    .push(ChatEntry::Message(Message::assistant(BACKEND_ERROR_MESSAGE)));
                self.entries.push(ChatEntry::Error(detail));
            }
        }

        self.classifier.reset();
        self.event_rx = None;
        self.busy = false;
        self.scroll_to_bottom();
    }

    // ── Prompt submission ─────────────────────────────────────────────────────

    fn submit(&mut self, prompt: String) {
        let prompt = prompt.trim().to_string();
        if prompt.is_empty() || self.busy {
            return;
        }
        debug!(chars = prompt.chars().count(), "submitting prompt");

        self.entries.push(ChatEntry::Message(Message::user(prompt)));
        let messages = messages_for_request(&self.config.chat.system_preamble, &self.entries);

        let (tx, rx) = mpsc::channel::<ResponseEvent>(256);
        self.event_rx = Some(rx);
        self.busy = true;
        self.scroll_to_bottom();

        let backend = self.backend.clone();
        tokio::spawn(async move {
            stream_response(backend, messages, tx).await;
        });
    }

    /// Drop the in-flight stream and keep whatever already arrived.
    fn abort_response(&mut self) {
        if !self.busy {
            return;
        }
        debug!("aborting in-flight response");
        self.event_rx = None;
        self.commit_response(None);
    }

    // ── Terminal event handling ───────────────────────────────────────────────

    /// Returns `true` when the app should exit.
    fn handle_term_event(&mut self, event: Event) -> bool {
        match event {
            Event::Key(k) if k.kind == KeyEventKind::Press => self.handle_key(k),
            Event::Resize(..) => false,
            _ => false,
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> bool {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') | KeyCode::Char('q') if ctrl => return true,
            KeyCode::Char('r') if ctrl => {
                self.show_reasoning = !self.show_reasoning;
            }
            KeyCode::Esc => self.abort_response(),
            KeyCode::Enter => {
                let prompt = std::mem::take(&mut self.input_buffer);
                self.input_cursor = 0;
                self.submit(prompt);
            }
            KeyCode::Backspace => {
                if self.input_cursor > 0 {
                    self.input_cursor -= 1;
                    let byte = byte_index(&self.input_buffer, self.input_cursor);
                    self.input_buffer.remove(byte);
                }
            }
            KeyCode::Left => self.input_cursor = self.input_cursor.saturating_sub(1),
            KeyCode::Right => {
                let max = self.input_buffer.chars().count();
                self.input_cursor = (self.input_cursor + 1).min(max);
            }
            KeyCode::Up => self.scroll_offset = self.scroll_offset.saturating_sub(1),
            KeyCode::Down => self.scroll_by(1),
            KeyCode::PageUp => {
                self.scroll_offset = self.scroll_offset.saturating_sub(self.chat_height)
            }
            KeyCode::PageDown => self.scroll_by(self.chat_height),
            KeyCode::Char(c) if !ctrl => {
                let byte = byte_index(&self.input_buffer, self.input_cursor);
                self.input_buffer.insert(byte, c);
                self.input_cursor += 1;
            }
            _ => {}
        }
        false
    }

    // ── Rendering state ───────────────────────────────────────────────────────

    fn rerender_chat(&mut self) {
        self.chat_lines = render_transcript(
            &self.entries,
            self.classifier.visible_text(),
            self.classifier.reasoning_text(),
            self.busy,
            &self.typesetter,
            self.chat_width,
            self.ascii,
            self.show_reasoning,
        );
    }

    fn max_scroll(&self) -> u16 {
        (self.chat_lines.len() as u16).saturating_sub(self.chat_height)
    }

    fn scroll_by(&mut self, amount: u16) {
        self.scroll_offset = (self.scroll_offset + amount).min(self.max_scroll());
    }

    fn scroll_to_bottom(&mut self) {
        self.scroll_offset = self.max_scroll();
    }
}

async fn recv_response_event(
    rx: &mut Option<mpsc::Receiver<ResponseEvent>>,
) -> Option<ResponseEvent> {
    match rx {
        Some(rx) => rx.recv().await,
        None => None,
    }
}

/// Drive one backend request to completion, forwarding framed events to the
/// session.  Stream-level failures become a terminal `Error` event.
async fn stream_response(
    backend: Arc<dyn ChatBackend>,
    messages: Vec<Message>,
    tx: mpsc::Sender<ResponseEvent>,
) {
    let mut stream = match backend.chat(&messages).await {
        Ok(s) => s,
        Err(e) => {
            let _ = tx.send(ResponseEvent::Error(e.to_string())).await;
            return;
        }
    };

    while let Some(item) = stream.next().await {
        let event = match item {
            Ok(ev) => ev,
            Err(e) => ResponseEvent::Error(e.to_string()),
        };
        let done = matches!(event, ResponseEvent::Done | ResponseEvent::Error(_));
        if tx.send(event).await.is_err() {
            // Receiver dropped: the user aborted the response.
            return;
        }
        if done {
            return;
        }
    }

    // Stream ended without a terminal frame; treat it as done.
    let _ = tx.send(ResponseEvent::Done).await;
}

fn byte_index(s: &str, char_pos: usize) -> usize {
    s.char_indices()
        .nth(char_pos)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

// ── Drawing ───────────────────────────────────────────────────────────────────

fn draw(frame: &mut Frame, app: &App) {
    let [status_area, chat_area, input_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(3),
        Constraint::Length(3),
    ])
    .areas(frame.area());

    draw_status(frame, status_area, app);
    draw_chat(frame, chat_area, app);
    draw_input(frame, input_area, app);
}

fn draw_status(frame: &mut Frame, area: Rect, app: &App) {
    let state = if app.busy { "streaming" } else { "ready" };
    let reasoning = if app.show_reasoning { "shown" } else { "hidden" };
    let line = Line::from(vec![
        Span::styled(
            format!(" {} ", app.backend.model_name()),
            Style::default().fg(Color::Black).bg(Color::Blue),
        ),
        Span::raw(format!(
            " {state} | reasoning {reasoning} | ctrl-r reasoning, esc abort, ctrl-q quit"
        )),
    ]);
    frame.render_widget(
        Paragraph::new(line).style(Style::default().fg(Color::DarkGray)),
        area,
    );
}

fn draw_chat(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default().borders(Borders::ALL).title(" chat ");
    let paragraph = Paragraph::new(app.chat_lines.clone())
        .block(block)
        .scroll((app.scroll_offset, 0));
    frame.render_widget(paragraph, area);
}

fn draw_input(frame: &mut Frame, area: Rect, app: &App) {
    let title = if app.busy { " input (streaming…) " } else { " input " };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(Color::Green));
    let paragraph = Paragraph::new(app.input_buffer.as_str()).block(block);
    frame.render_widget(paragraph, area);

    let cursor_cols: u16 = app
        .input_buffer
        .chars()
        .take(app.input_cursor)
        .count() as u16;
    frame.set_cursor_position((
        area.x + 1 + cursor_cols.min(area.width.saturating_sub(3)),
        area.y + 1,
    ));
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use freja_model::ScriptedMockBackend;

    fn test_app(backend: Arc<dyn ChatBackend>) -> App {
        App::new(
            Arc::new(Config::default()),
            backend,
            AppOptions { initial_prompt: None, show_reasoning: false, ascii: true },
        )
    }

    fn assistant_texts(app: &App) -> Vec<&str> {
        app.entries
            .iter()
            .filter_map(|e| match e {
                ChatEntry::Message(m) if m.role == freja_model::Role::Assistant => {
                    Some(m.content.as_str())
                }
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn deltas_accumulate_and_commit_as_assistant_message() {
        let backend: Arc<dyn ChatBackend> = Arc::new(ScriptedMockBackend::from_deltas(&[]));
        let mut app = test_app(backend);
        app.busy = true;

        app.handle_response_event(ResponseEvent::TextDelta("hel".into()));
        app.handle_response_event(ResponseEvent::TextDelta("lo".into()));
        assert_eq!(app.classifier.visible_text(), "hello");

        app.handle_response_event(ResponseEvent::Done);
        assert!(!app.busy);
        assert_eq!(assistant_texts(&app), vec!["hello"]);
        assert_eq!(app.classifier.visible_text(), "", "classifier resets after commit");
    }

    #[tokio::test]
    async fn reasoning_channel_becomes_its_own_entry() {
        let backend: Arc<dyn ChatBackend> = Arc::new(ScriptedMockBackend::from_deltas(&[]));
        let mut app = test_app(backend);
        app.busy = true;

        app.handle_response_event(ResponseEvent::TextDelta("<thi".into()));
        app.handle_response_event(ResponseEvent::TextDelta("nk>plan</think>answer".into()));
        app.handle_response_event(ResponseEvent::Done);

        assert!(app.entries.iter().any(|e| matches!(
            e,
            ChatEntry::Reasoning { content } if content == "plan"
        )));
        assert_eq!(assistant_texts(&app), vec!["answer"]);
    }

    #[tokio::test]
    async fn error_commits_partial_text_and_fallback_message() {
        let backend: Arc<dyn ChatBackend> = Arc::new(ScriptedMockBackend::from_deltas(&[]));
        let mut app = test_app(backend);
        app.busy = true;

        app.handle_response_event(ResponseEvent::TextDelta("partial".into()));
        app.handle_response_event(ResponseEvent::Error("connection refused".into()));

        let texts = assistant_texts(&app);
        assert_eq!(texts[0], "partial", "partial answer survives the error");
        assert_eq!(texts[1], BACKEND_ERROR_MESSAGE);
        assert!(app.entries.iter().any(|e| matches!(
            e,
            ChatEntry::Error(msg) if msg.contains("connection refused")
        )));
        assert!(!app.busy);
    }

    #[tokio::test]
    async fn scripted_stream_delivers_split_tags_intact() {
        let backend = Arc::new(ScriptedMockBackend::from_deltas(&[
            "<th", "ink>let me see</th", "ink>the answer is $x^2$",
        ]));
        let mut app = test_app(backend);
        app.submit("question".into());

        let mut rx = app.event_rx.take().expect("submit opens a stream");
        while let Some(event) = rx.recv().await {
            let done = matches!(event, ResponseEvent::Done | ResponseEvent::Error(_));
            app.handle_response_event(event);
            if done {
                break;
            }
        }

        assert_eq!(assistant_texts(&app), vec!["the answer is $x^2$"]);
        assert!(app.entries.iter().any(|e| matches!(
            e,
            ChatEntry::Reasoning { content } if content == "let me see"
        )));
    }

    #[tokio::test]
    async fn abort_keeps_partial_answer() {
        let backend: Arc<dyn ChatBackend> = Arc::new(ScriptedMockBackend::from_deltas(&[]));
        let mut app = test_app(backend);
        app.busy = true;
        app.event_rx = Some(mpsc::channel(1).1);

        app.handle_response_event(ResponseEvent::TextDelta("half an ans".into()));
        app.abort_response();

        assert_eq!(assistant_texts(&app), vec!["half an ans"]);
        assert!(!app.busy);
        assert!(app.event_rx.is_none());
    }

    #[tokio::test]
    async fn empty_prompt_is_not_submitted() {
        let backend: Arc<dyn ChatBackend> = Arc::new(ScriptedMockBackend::from_deltas(&[]));
        let mut app = test_app(backend);
        app.submit("   ".into());
        assert!(app.entries.is_empty());
        assert!(!app.busy);
    }
}
