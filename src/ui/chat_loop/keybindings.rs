//! Key-to-action mapping for the chat screen.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::core::app::{App, AppAction};

pub enum KeyResult {
    Actions(Vec<AppAction>),
    /// Hand the key to the input box as an edit.
    ForwardToInput,
    Ignored,
}

pub fn map_key(app: &App, key: &KeyEvent) -> KeyResult {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);

    if ctrl && key.code == KeyCode::Char('c') {
        return KeyResult::Actions(vec![AppAction::Quit]);
    }

    if app.picker.is_some() {
        let action = match key.code {
            KeyCode::Up | KeyCode::Char('k') => AppAction::PickerMoveUp,
            KeyCode::Down | KeyCode::Char('j') => AppAction::PickerMoveDown,
            KeyCode::Enter => AppAction::PickerApplySelection,
            KeyCode::Esc => AppAction::PickerEscape,
            _ => return KeyResult::Ignored,
        };
        return KeyResult::Actions(vec![action]);
    }

    // Arrow keys scroll the transcript unless the input spans several lines.
    let single_line_input = app.ui.input_line_count() <= 1;
    let action = match key.code {
        KeyCode::Enter if alt || key.modifiers.contains(KeyModifiers::SHIFT) => {
            AppAction::InsertNewline
        }
        KeyCode::Enter => AppAction::SubmitInput,
        KeyCode::Char('p') if ctrl => AppAction::OpenPersonaPicker,
        KeyCode::F(2) => AppAction::OpenPersonaPicker,
        KeyCode::PageUp => AppAction::PageUp,
        KeyCode::PageDown => AppAction::PageDown,
        KeyCode::Up if single_line_input => AppAction::ScrollUp { lines: 1 },
        KeyCode::Down if single_line_input => AppAction::ScrollDown { lines: 1 },
        _ => return KeyResult::ForwardToInput,
    };
    KeyResult::Actions(vec![action])
}
