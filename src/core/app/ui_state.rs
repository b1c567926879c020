use std::time::Instant;

use tui_textarea::TextArea;

use crate::utils::scroll::ScrollState;

/// Presentation state that sits beside the conversation: the input box,
/// transcript scrolling, and the streaming pulse clock.
pub struct UiState {
    textarea: TextArea<'static>,
    pub scroll: ScrollState,
    pub pulse_start: Instant,
    pub exit_requested: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self::new()
    }
}

impl UiState {
    pub fn new() -> Self {
        Self {
            textarea: TextArea::default(),
            scroll: ScrollState::default(),
            pulse_start: Instant::now(),
            exit_requested: false,
        }
    }

    pub fn textarea(&self) -> &TextArea<'static> {
        &self.textarea
    }

    pub fn textarea_mut(&mut self) -> &mut TextArea<'static> {
        &mut self.textarea
    }

    /// Current input with lines joined by `\n`.
    pub fn input_text(&self) -> String {
        self.textarea.lines().join("\n")
    }

    pub fn set_input_text(&mut self, text: &str) {
        let lines: Vec<String> = text.split('\n').map(str::to_string).collect();
        self.textarea = TextArea::new(lines);
        self.textarea.move_cursor(tui_textarea::CursorMove::Bottom);
        self.textarea.move_cursor(tui_textarea::CursorMove::End);
    }

    pub fn clear_input(&mut self) {
        self.textarea = TextArea::default();
    }

    pub fn insert_newline(&mut self) {
        self.textarea.insert_newline();
    }

    pub fn input_line_count(&self) -> usize {
        self.textarea.lines().len().max(1)
    }
}
