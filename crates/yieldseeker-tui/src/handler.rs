use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use yieldseeker_core::View;

use crate::app::{App, EntryField, InputMode};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick_animation(),
        AppEvent::AuthChanged(signals) => app.on_auth_changed(signals),
        AppEvent::HistoryLoaded(id, result) => app.on_history_loaded(id, result),
        AppEvent::ReplyReceived(id, result) => app.on_reply_received(id, result),
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('c') => {
                app.should_quit = true;
                return;
            }
            KeyCode::Char('l') => {
                app.logout();
                return;
            }
            KeyCode::Char('d') => {
                app.disconnect();
                return;
            }
            _ => {}
        }
    }

    match (app.view, app.input_mode) {
        (View::Entry, InputMode::Normal) => handle_entry_normal(app, key),
        (View::Entry, InputMode::Editing) => handle_entry_editing(app, key),
        (View::Chat, InputMode::Normal) => handle_chat_normal(app, key),
        (View::Chat, InputMode::Editing) => handle_chat_editing(app, key),
    }
}

fn handle_entry_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('i') | KeyCode::Enter => app.input_mode = InputMode::Editing,
        KeyCode::Tab | KeyCode::Char('j') | KeyCode::Down => app.entry_field = app.entry_field.next(),
        KeyCode::BackTab | KeyCode::Char('k') | KeyCode::Up => app.entry_field = app.entry_field.prev(),
        _ => {}
    }
}

fn handle_entry_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.input_mode = InputMode::Normal,
        KeyCode::Tab | KeyCode::Down => app.entry_field = app.entry_field.next(),
        KeyCode::BackTab | KeyCode::Up => app.entry_field = app.entry_field.prev(),
        KeyCode::Enter => match app.entry_field {
            EntryField::Address | EntryField::ChainId => app.connect_wallet(),
            EntryField::Signature => app.login(),
        },
        KeyCode::Backspace => {
            app.entry_input_mut().pop();
        }
        KeyCode::Char(c) => app.entry_input_mut().push(c),
        _ => {}
    }
}

fn handle_chat_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('i') | KeyCode::Enter => app.input_mode = InputMode::Editing,
        KeyCode::Char('j') | KeyCode::Down => app.scroll_down(),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_up(),
        KeyCode::Char('G') | KeyCode::End => app.scroll_chat_to_bottom(),
        KeyCode::Char('g') | KeyCode::Home => app.chat_scroll = 0,
        _ => {}
    }
}

fn handle_chat_editing(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Esc {
        app.input_mode = InputMode::Normal;
        return;
    }

    // The input is disabled while waiting for the agent
    if app.chat.is_loading() {
        return;
    }

    match key.code {
        KeyCode::Enter => app.submit_message(),
        KeyCode::Backspace => {
            if app.chat_cursor > 0 {
                app.chat_cursor -= 1;
                let input = app.chat.input_mut();
                let byte_pos = char_to_byte_index(input, app.chat_cursor);
                input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let cursor = app.chat_cursor;
            let input = app.chat.input_mut();
            if cursor < input.chars().count() {
                let byte_pos = char_to_byte_index(input, cursor);
                input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.chat_cursor = app.chat_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.chat.input().chars().count();
            app.chat_cursor = (app.chat_cursor + 1).min(char_count);
        }
        KeyCode::Home => app.chat_cursor = 0,
        KeyCode::End => app.chat_cursor = app.chat.input().chars().count(),
        KeyCode::Char(c) => {
            let cursor = app.chat_cursor;
            let input = app.chat.input_mut();
            let byte_pos = char_to_byte_index(input, cursor);
            input.insert(byte_pos, c);
            app.chat_cursor += 1;
        }
        _ => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    if app.view != View::Chat {
        return;
    }
    match mouse.kind {
        MouseEventKind::ScrollDown => app.scroll_down(),
        MouseEventKind::ScrollUp => app.scroll_up(),
        _ => {}
    }
}
