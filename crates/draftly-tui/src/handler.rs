use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, Focus};
use crate::tui::AppEvent;
use draftly_core::{EditAction, Motion, ToolbarState};

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => {
            app.tick_animation();
            app.poll_tasks().await;
        }
    }
    app.sync_document();
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any pane
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q')) {
        app.should_quit = true;
        return;
    }
    if key.code == KeyCode::Tab {
        app.toggle_focus();
        return;
    }

    match app.focus {
        Focus::Editor => handle_editor(app, key),
        Focus::Chat => handle_chat(app, key),
    }
}

fn handle_editor(app: &mut App, key: KeyEvent) {
    match app.toolbar.state() {
        ToolbarState::Reviewing => match key.code {
            KeyCode::Enter => {
                app.toolbar.confirm(&mut app.editor);
                app.scroll_to_cursor();
                return;
            }
            KeyCode::Esc => {
                app.toolbar.cancel();
                return;
            }
            _ => {}
        },
        ToolbarState::Menu => {
            let action = match key.code {
                KeyCode::F(n) => EditAction::all().get(usize::from(n).wrapping_sub(1)).copied(),
                _ => None,
            };
            if let Some(action) = action {
                app.request_edit(action);
                return;
            }
        }
        ToolbarState::Hidden => {}
    }

    let before = app.editor.selection();
    let shift = key.modifiers.contains(KeyModifiers::SHIFT);
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);

    match key.code {
        // Formatting
        KeyCode::Char('b') if alt => app.editor.toggle_bold(),
        KeyCode::Char('i') if alt => app.editor.toggle_italic(),
        KeyCode::Char('l') if alt => app.editor.toggle_bullet_list(),
        KeyCode::Char(c @ '1'..='6') if alt => app.editor.toggle_heading(c as u8 - b'0'),

        KeyCode::Char('a') if ctrl => {
            let end = app.editor.text().chars().count();
            app.editor.select(0, end);
        }

        // Cursor movement, Shift extends the selection
        KeyCode::Left => app.editor.move_cursor(Motion::Left, shift),
        KeyCode::Right => app.editor.move_cursor(Motion::Right, shift),
        KeyCode::Up => app.editor.move_cursor(Motion::Up, shift),
        KeyCode::Down => app.editor.move_cursor(Motion::Down, shift),
        KeyCode::Home => app.editor.move_cursor(Motion::LineStart, shift),
        KeyCode::End => app.editor.move_cursor(Motion::LineEnd, shift),
        KeyCode::Esc => {
            let head = app.editor.selection().head;
            app.editor.select(head, head);
        }

        // Editing
        KeyCode::Enter => app.editor.split_block(),
        KeyCode::Backspace => app.editor.delete_backward(),
        KeyCode::Char(c) if !ctrl && !alt => {
            let mut buf = [0u8; 4];
            app.editor.insert_text(c.encode_utf8(&mut buf));
        }
        _ => return,
    }

    app.scroll_to_cursor();
    if app.editor.selection() != before {
        app.sync_toolbar();
    }
}

fn handle_chat(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.focus = Focus::Editor,
        KeyCode::Enter => app.submit_chat(),
        KeyCode::Backspace => app.chat.backspace(),
        KeyCode::Delete => app.chat.delete(),
        KeyCode::Left => app.chat.cursor_left(),
        KeyCode::Right => app.chat.cursor_right(),
        KeyCode::Home => app.chat.cursor_home(),
        KeyCode::End => app.chat.cursor_end(),
        KeyCode::Char(c) => app.chat.insert_char(c),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::layout::Rect;

    fn press(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
        handle_key(app, KeyEvent::new(code, modifiers));
        app.sync_document();
    }

    fn app() -> App {
        let mut app = App::new("http://127.0.0.1:9").unwrap();
        app.editor_area = Rect::new(0, 0, 60, 20);
        app
    }

    #[tokio::test]
    async fn test_typing_updates_document() {
        let mut app = app();
        press(&mut app, KeyCode::End, KeyModifiers::NONE);
        press(&mut app, KeyCode::Char('!'), KeyModifiers::NONE);
        assert_eq!(app.shell.document(), "<p>Hello! Start writing here…!</p>");
    }

    #[tokio::test]
    async fn test_shift_arrows_open_toolbar() {
        let mut app = app();
        press(&mut app, KeyCode::Home, KeyModifiers::NONE);
        for _ in 0..5 {
            press(&mut app, KeyCode::Right, KeyModifiers::SHIFT);
        }
        assert_eq!(app.toolbar.state(), ToolbarState::Menu);
        assert_eq!(app.toolbar.context().unwrap().selected_text, "Hello");

        press(&mut app, KeyCode::Esc, KeyModifiers::NONE);
        assert_eq!(app.toolbar.state(), ToolbarState::Hidden);
    }

    #[tokio::test]
    async fn test_tab_routes_keys_to_chat() {
        let mut app = app();
        press(&mut app, KeyCode::Tab, KeyModifiers::NONE);
        press(&mut app, KeyCode::Char('h'), KeyModifiers::NONE);
        press(&mut app, KeyCode::Char('i'), KeyModifiers::NONE);
        assert_eq!(app.chat.input(), "hi");
        assert_eq!(app.shell.document(), "<p>Hello! Start writing here…</p>");
    }

    #[tokio::test]
    async fn test_ctrl_c_quits() {
        let mut app = app();
        press(&mut app, KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert!(app.should_quit);
    }
}
