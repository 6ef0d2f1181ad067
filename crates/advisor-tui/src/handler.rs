use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

use crate::app::App;
use crate::tui::AppEvent;

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize => {}
        AppEvent::Tick => {
            app.tick_animation();
        }
    }
    app.poll_query().await;
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    // Global keys
    if ctrl {
        match key.code {
            KeyCode::Char('c') => app.should_quit = true,
            KeyCode::Char('s') => export(app),
            KeyCode::Char('u') => app.clear_input(),
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Esc => {
            if app.input.is_empty() {
                app.should_quit = true;
            } else {
                app.clear_input();
            }
        }
        // Modified Enter inserts a line break, plain Enter sends
        KeyCode::Enter if key.modifiers.intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) => {
            app.insert_newline();
        }
        KeyCode::Enter => app.submit(),
        KeyCode::Backspace => app.backspace(),
        KeyCode::Delete => app.delete(),
        KeyCode::Left => app.cursor_left(),
        KeyCode::Right => app.cursor_right(),
        KeyCode::Home => app.cursor_home(),
        KeyCode::End => app.cursor_end(),
        KeyCode::Up => app.scroll_up(1),
        KeyCode::Down => app.scroll_down(1),
        KeyCode::PageUp => {
            let page = app.page_height();
            app.scroll_up(page);
        }
        KeyCode::PageDown => {
            let page = app.page_height();
            app.scroll_down(page);
        }
        KeyCode::Char(c) => app.insert_char(c),
        _ => {}
    }
}

fn export(app: &mut App) {
    app.status = Some(match app.export_transcript() {
        Ok(path) => format!("Saved {}", path.display()),
        Err(e) => {
            tracing::error!(error = %e, "transcript export failed");
            format!("Export failed: {}", e)
        }
    });
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let in_chat = app
        .chat_area
        .map(|r| point_in_rect(mouse.column, mouse.row, r))
        .unwrap_or(false);
    if !in_chat {
        return;
    }

    match mouse.kind {
        MouseEventKind::ScrollDown => app.scroll_down(3),
        MouseEventKind::ScrollUp => app.scroll_up(3),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use advisor_core::{ClientError, RelayApi};
    use async_trait::async_trait;
    use crossterm::event::{KeyEventKind, KeyEventState};
    use std::sync::Arc;

    struct EchoRelay;

    #[async_trait]
    impl RelayApi for EchoRelay {
        async fn ask(&self, prompt: &str) -> Result<String, ClientError> {
            Ok(prompt.to_string())
        }
    }

    fn key(code: KeyCode, modifiers: KeyModifiers) -> AppEvent {
        AppEvent::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        })
    }

    async fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            handle_event(app, key(KeyCode::Char(c), KeyModifiers::NONE)).await.unwrap();
        }
    }

    #[tokio::test]
    async fn shift_enter_inserts_newline() {
        let mut app = App::new(Arc::new(EchoRelay), "http://127.0.0.1:3000");
        type_text(&mut app, "line one").await;
        handle_event(&mut app, key(KeyCode::Enter, KeyModifiers::SHIFT)).await.unwrap();
        type_text(&mut app, "line two").await;

        assert_eq!(app.input, "line one\nline two");
        assert!(app.session.messages().is_empty());
    }

    #[tokio::test]
    async fn plain_enter_submits() {
        let mut app = App::new(Arc::new(EchoRelay), "http://127.0.0.1:3000");
        type_text(&mut app, "Vancouver condo prices").await;
        handle_event(&mut app, key(KeyCode::Enter, KeyModifiers::NONE)).await.unwrap();

        assert!(app.input.is_empty());
        assert_eq!(app.session.messages().len(), 1);
        assert!(app.is_loading());

        while app.is_loading() {
            tokio::task::yield_now().await;
            handle_event(&mut app, AppEvent::Tick).await.unwrap();
        }
        assert_eq!(app.session.messages()[1].text(), "Vancouver condo prices");
    }

    #[tokio::test]
    async fn ctrl_c_quits_and_esc_clears_first() {
        let mut app = App::new(Arc::new(EchoRelay), "http://127.0.0.1:3000");
        type_text(&mut app, "draft").await;

        handle_event(&mut app, key(KeyCode::Esc, KeyModifiers::NONE)).await.unwrap();
        assert!(app.input.is_empty());
        assert!(!app.should_quit);

        handle_event(&mut app, key(KeyCode::Char('c'), KeyModifiers::CONTROL)).await.unwrap();
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn resize_leaves_input_and_scroll_alone() {
        let mut app = App::new(Arc::new(EchoRelay), "http://127.0.0.1:3000");
        type_text(&mut app, "draft").await;
        app.chat_scroll = 4;

        handle_event(&mut app, AppEvent::Resize).await.unwrap();

        assert_eq!(app.input, "draft");
        assert_eq!(app.chat_scroll, 4);
        assert!(!app.should_quit);
    }

    #[test]
    fn point_in_rect_bounds() {
        let rect = Rect::new(2, 2, 4, 3);
        assert!(point_in_rect(2, 2, rect));
        assert!(point_in_rect(5, 4, rect));
        assert!(!point_in_rect(6, 4, rect));
        assert!(!point_in_rect(1, 2, rect));
    }
}
