use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use advisor_core::markdown::render_transcript_html;
use advisor_core::{ChatSession, ClientError, RelayApi};
use anyhow::Result;
use ratatui::layout::Rect;
use tokio::task::JoinHandle;
use unicode_width::UnicodeWidthStr;

pub const TITLE: &str = "Real Estate AI Advisor";
pub const SUBTITLE: &str = "Powered by Gemini AI - Market insights updated daily";
pub const PLACEHOLDER: &str = "Ask about real estate...";

/// Maximum visible rows of the input box before it scrolls.
pub const INPUT_MAX_ROWS: u16 = 4;

/// Size of the chat history area, recorded on each render.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub session: ChatSession,

    // Input state
    pub input: String,
    pub input_cursor: usize, // cursor position in chars

    // In-flight request
    pub query_task: Option<JoinHandle<Result<String, ClientError>>>,
    pub relay: Arc<dyn RelayApi>,
    pub relay_url: String,

    // Chat history scrolling
    pub chat_scroll: u16,
    pub follow_tail: bool,
    pub chat_viewport: Viewport,
    pub chat_area: Option<Rect>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Footer status line (export results etc.)
    pub status: Option<String>,
}

impl App {
    pub fn new(relay: Arc<dyn RelayApi>, relay_url: &str) -> Self {
        Self {
            should_quit: false,
            session: ChatSession::new(),
            input: String::new(),
            input_cursor: 0,
            query_task: None,
            relay,
            relay_url: relay_url.to_string(),
            chat_scroll: 0,
            follow_tail: true,
            chat_viewport: Viewport::default(),
            chat_area: None,
            animation_frame: 0,
            status: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.session.is_loading()
    }

    /// Send the current input. Ignored when blank or while a reply is pending.
    pub fn submit(&mut self) {
        let Some(prompt) = self.session.begin_submit(&self.input) else {
            return;
        };

        self.input.clear();
        self.input_cursor = 0;
        self.status = None;
        // New user message plus "Thinking..." should be visible
        self.follow_tail = true;

        tracing::debug!(prompt_len = prompt.len(), "submitting prompt");
        let relay = Arc::clone(&self.relay);
        self.query_task = Some(tokio::spawn(async move { relay.ask(&prompt).await }));
    }

    /// Collect the reply once the background request has finished.
    pub async fn poll_query(&mut self) {
        let finished = self.query_task.as_ref().is_some_and(|task| task.is_finished());
        if !finished {
            return;
        }

        if let Some(task) = self.query_task.take() {
            let result = match task.await {
                Ok(result) => result,
                Err(e) => Err(ClientError::Aborted(e.to_string())),
            };
            self.session.complete(result);
            self.follow_tail = true;
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.is_loading() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    // Input editing. All edits are ignored while a reply is pending.

    pub fn insert_char(&mut self, c: char) {
        if self.is_loading() {
            return;
        }
        let byte_pos = char_to_byte_index(&self.input, self.input_cursor);
        self.input.insert(byte_pos, c);
        self.input_cursor += 1;
    }

    pub fn insert_newline(&mut self) {
        self.insert_char('\n');
    }

    pub fn backspace(&mut self) {
        if self.is_loading() || self.input_cursor == 0 {
            return;
        }
        self.input_cursor -= 1;
        let byte_pos = char_to_byte_index(&self.input, self.input_cursor);
        self.input.remove(byte_pos);
    }

    pub fn delete(&mut self) {
        if self.is_loading() {
            return;
        }
        if self.input_cursor < self.input.chars().count() {
            let byte_pos = char_to_byte_index(&self.input, self.input_cursor);
            self.input.remove(byte_pos);
        }
    }

    pub fn cursor_left(&mut self) {
        self.input_cursor = self.input_cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        let char_count = self.input.chars().count();
        self.input_cursor = (self.input_cursor + 1).min(char_count);
    }

    pub fn cursor_home(&mut self) {
        self.input_cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.input_cursor = self.input.chars().count();
    }

    pub fn clear_input(&mut self) {
        if self.is_loading() {
            return;
        }
        self.input.clear();
        self.input_cursor = 0;
    }

    /// (row, column) of the cursor within the input. The column is in
    /// terminal cells, so wide characters count twice.
    pub fn input_cursor_position(&self) -> (u16, u16) {
        let before = &self.input[..char_to_byte_index(&self.input, self.input_cursor)];
        let row = before.matches('\n').count();
        let col = before.rsplit('\n').next().map(|l| l.width()).unwrap_or(0);
        (row as u16, col as u16)
    }

    pub fn input_rows(&self) -> u16 {
        let rows = self.input.split('\n').count() as u16;
        rows.clamp(1, INPUT_MAX_ROWS)
    }

    // Chat history scrolling

    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
        self.follow_tail = false;
    }

    /// Scrolling is clamped at render time; reaching the bottom re-attaches
    /// to the tail.
    pub fn scroll_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines);
    }

    pub fn page_height(&self) -> u16 {
        self.chat_viewport.height.max(1)
    }

    /// Apply the scroll position for a history of `total_lines` rendered rows.
    pub fn settle_scroll(&mut self, total_lines: u16) {
        let max_scroll = total_lines.saturating_sub(self.chat_viewport.height);
        if self.follow_tail || self.chat_scroll >= max_scroll {
            self.chat_scroll = max_scroll;
            self.follow_tail = true;
        }
    }

    /// Write the conversation as an HTML page into the working directory.
    pub fn export_transcript(&mut self) -> Result<PathBuf> {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let path = std::env::current_dir()?.join(format!("advisor-transcript-{}.html", stamp));

        let html = render_transcript_html(TITLE, self.session.messages());
        std::fs::write(&path, html)?;
        tracing::info!(path = %path.display(), messages = self.session.messages().len(), "exported transcript");
        Ok(path)
    }
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubRelay {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RelayApi for StubRelay {
        async fn ask(&self, prompt: &str) -> Result<String, ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("re: {}", prompt))
        }
    }

    fn app() -> (App, Arc<StubRelay>) {
        let relay = Arc::new(StubRelay {
            calls: AtomicUsize::new(0),
        });
        let app = App::new(relay.clone(), "http://127.0.0.1:3000");
        (app, relay)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.insert_char(c);
        }
    }

    async fn wait_for_reply(app: &mut App) {
        while app.query_task.is_some() {
            tokio::task::yield_now().await;
            app.poll_query().await;
        }
    }

    #[tokio::test]
    async fn submit_clears_input_and_receives_reply() {
        let (mut app, relay) = app();
        type_text(&mut app, "Is Miami overvalued?");
        app.submit();

        assert!(app.input.is_empty());
        assert_eq!(app.input_cursor, 0);
        assert!(app.is_loading());
        assert_eq!(app.session.messages().len(), 1);

        wait_for_reply(&mut app).await;

        assert!(!app.is_loading());
        assert_eq!(relay.calls.load(Ordering::SeqCst), 1);
        assert_eq!(app.session.messages()[1].text(), "re: Is Miami overvalued?");
    }

    #[tokio::test]
    async fn edits_and_resubmits_ignored_while_loading() {
        let (mut app, relay) = app();
        type_text(&mut app, "first");
        app.submit();

        type_text(&mut app, "second");
        assert!(app.input.is_empty());
        app.submit();

        wait_for_reply(&mut app).await;
        assert_eq!(relay.calls.load(Ordering::SeqCst), 1);
        assert_eq!(app.session.messages().len(), 2);
    }

    #[tokio::test]
    async fn blank_input_does_not_spawn() {
        let (mut app, _relay) = app();
        type_text(&mut app, "  ");
        app.insert_newline();
        app.submit();

        assert!(app.query_task.is_none());
        assert!(app.session.messages().is_empty());
    }

    #[tokio::test]
    async fn utf8_editing() {
        let (mut app, _relay) = app();
        type_text(&mut app, "café");
        app.cursor_left();
        app.backspace();
        assert_eq!(app.input, "caé");
        app.cursor_home();
        app.delete();
        assert_eq!(app.input, "aé");
    }

    #[tokio::test]
    async fn cursor_position_spans_lines() {
        let (mut app, _relay) = app();
        type_text(&mut app, "line one");
        app.insert_newline();
        type_text(&mut app, "ab");

        assert_eq!(app.input_cursor_position(), (1, 2));
        assert_eq!(app.input_rows(), 2);
    }

    #[tokio::test]
    async fn cursor_column_counts_display_width() {
        let (mut app, _relay) = app();
        type_text(&mut app, "東京 rent");
        assert_eq!(app.input_cursor_position(), (0, 9));

        app.cursor_home();
        app.cursor_right();
        assert_eq!(app.input_cursor_position(), (0, 2));
    }

    #[tokio::test]
    async fn settle_scroll_follows_tail() {
        let (mut app, _relay) = app();
        app.chat_viewport = Viewport { width: 40, height: 10 };

        app.settle_scroll(25);
        assert_eq!(app.chat_scroll, 15);

        app.scroll_up(5);
        app.settle_scroll(30);
        assert_eq!(app.chat_scroll, 10);
        assert!(!app.follow_tail);

        app.scroll_down(100);
        app.settle_scroll(30);
        assert_eq!(app.chat_scroll, 20);
        assert!(app.follow_tail);
    }
}
