use advisor_core::{ChatRole, Message};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::app::{App, PLACEHOLDER, SUBTITLE, TITLE};
use crate::markdown::render_markdown_lines;

const USER_COLOR: Color = Color::Cyan;
const ASSISTANT_COLOR: Color = Color::Yellow;

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, chat history, input, footer
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(2),
        Constraint::Min(0),
        Constraint::Length(app.input_rows() + 2),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(frame, header_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(frame: &mut Frame, area: Rect) {
    let header = Paragraph::new(vec![
        Line::from(Span::styled(TITLE, Style::default().fg(Color::Blue).bold())),
        Line::from(Span::styled(SUBTITLE, Style::default().fg(Color::DarkGray))),
    ])
    .alignment(Alignment::Center);
    frame.render_widget(header, area);
}

/// One bubble: a role line followed by the rendered markdown, each content
/// line behind a colored gutter.
fn message_lines(message: &Message) -> Vec<Line<'static>> {
    let (color, base) = match message.role() {
        ChatRole::User => (USER_COLOR, Style::default().fg(USER_COLOR)),
        ChatRole::Assistant => (ASSISTANT_COLOR, Style::default()),
    };

    let mut lines = vec![Line::from(Span::styled(
        format!("{}:", message.role().label()),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    ))];

    for line in render_markdown_lines(message.text(), base) {
        let mut spans = vec![Span::styled("▌ ", Style::default().fg(color))];
        spans.extend(line.spans);
        lines.push(Line::from(spans));
    }
    lines.push(Line::default());
    lines
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(format!(" Chat · {} ", app.relay_url));

    // Viewport handle for scroll calculations (inner size minus borders)
    app.chat_area = Some(area);
    app.chat_viewport.width = area.width.saturating_sub(2);
    app.chat_viewport.height = area.height.saturating_sub(2);

    let messages = app.session.messages();
    let chat_text = if messages.is_empty() && !app.is_loading() {
        Text::from(Span::styled(
            "Ask a question about property markets, prices, or rentals...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let mut lines: Vec<Line> = messages.iter().flat_map(message_lines).collect();

        if app.is_loading() {
            lines.push(Line::from(Span::styled(
                format!("{}:", ChatRole::Assistant.label()),
                Style::default().fg(ASSISTANT_COLOR).add_modifier(Modifier::BOLD),
            )));
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            lines.push(Line::from(Span::styled(
                format!("Thinking{}", dots),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )));
        }

        Text::from(lines)
    };

    let chat = Paragraph::new(chat_text).wrap(Wrap { trim: false });

    let total_lines = chat.line_count(app.chat_viewport.width).min(u16::MAX as usize) as u16;
    app.settle_scroll(total_lines);

    let chat = chat.block(chat_block).scroll((app.chat_scroll, 0));
    frame.render_widget(chat, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let loading = app.is_loading();
    let (border_color, title) = if loading {
        (Color::DarkGray, " Waiting for reply... ")
    } else {
        (Color::Yellow, " Ask (Enter to send, Shift+Enter for newline) ")
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    let inner_width = area.width.saturating_sub(2);
    let inner_height = area.height.saturating_sub(2);
    let (cursor_row, cursor_col) = app.input_cursor_position();

    // Scroll so the cursor stays inside the box
    let scroll_y = (cursor_row + 1).saturating_sub(inner_height);
    let scroll_x = (cursor_col + 1).saturating_sub(inner_width);

    let input = if app.input.is_empty() {
        Paragraph::new(Span::styled(PLACEHOLDER, Style::default().fg(Color::DarkGray)))
    } else {
        let style = if loading {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default().fg(USER_COLOR)
        };
        Paragraph::new(app.input.as_str())
            .style(style)
            .scroll((scroll_y, scroll_x))
    };

    frame.render_widget(input.block(input_block), area);

    if !loading {
        frame.set_cursor_position((
            area.x + 1 + cursor_col - scroll_x,
            area.y + 1 + cursor_row - scroll_y,
        ));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().fg(Color::Gray);

    let mut spans = Vec::new();
    for (key, label) in [
        ("Enter", "send"),
        ("PgUp/PgDn", "scroll"),
        ("Ctrl+S", "export"),
        ("Ctrl+C", "quit"),
    ] {
        spans.push(Span::styled(format!(" {} ", key), key_style));
        spans.push(Span::styled(format!(" {} ", label), label_style));
    }

    if let Some(status) = &app.status {
        spans.push(Span::styled(format!(" {}", status), Style::default().fg(Color::Green)));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use advisor_core::{ClientError, RelayApi};
    use async_trait::async_trait;
    use ratatui::{backend::TestBackend, Terminal};
    use std::sync::Arc;

    struct SilentRelay;

    #[async_trait]
    impl RelayApi for SilentRelay {
        async fn ask(&self, _prompt: &str) -> Result<String, ClientError> {
            Ok(String::new())
        }
    }

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let mut out = String::new();
        for row in buffer.content().chunks(buffer.area.width as usize) {
            for cell in row {
                out.push_str(cell.symbol());
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn empty_session_shows_title_and_placeholder() {
        let mut app = App::new(Arc::new(SilentRelay), "http://127.0.0.1:3000");
        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();

        let text = screen_text(&terminal);
        assert!(text.contains(TITLE));
        assert!(text.contains(PLACEHOLDER));
    }

    #[test]
    fn long_history_scrolls_to_latest_message() {
        let mut app = App::new(Arc::new(SilentRelay), "http://127.0.0.1:3000");
        for i in 0..15 {
            app.session.begin_submit(&format!("question {}", i));
            app.session.complete(Ok(format!("answer number {}", i)));
        }

        let mut terminal = Terminal::new(TestBackend::new(60, 20)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();

        let text = screen_text(&terminal);
        assert!(text.contains("answer number 14"));
        assert!(!text.contains("question 0 "));
        assert!(app.chat_scroll > 0);
    }

    #[test]
    fn bubble_has_role_label_and_gutter() {
        let mut session = advisor_core::ChatSession::new();
        session.begin_submit("hello");
        let lines = message_lines(&session.messages()[0]);

        assert_eq!(lines[0].spans[0].content, "You:");
        assert_eq!(lines[1].spans[0].content, "▌ ");
        assert_eq!(lines[1].spans[1].content, "hello");
        assert_eq!(lines[1].spans[1].style.fg, Some(USER_COLOR));
    }
}
