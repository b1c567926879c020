//! Application state for the interactive chat.
//!
//! `App` is owned by the event loop. Background stream tasks never touch it;
//! their output arrives as messages and is applied through [`actions`].

use std::sync::Arc;

use tracing::info;

use crate::core::chat_stream::{ReplySource, StreamParams};
use crate::core::conversation::Conversation;
use crate::core::persona::PersonaId;
use crate::ui::picker::PersonaPicker;

pub mod actions;
pub mod ui_state;


pub use actions::{
    action_for_stream_message, apply_action, apply_actions, AppAction, AppCommand,
};
pub use ui_state::UiState;

pub struct App {
    pub conversation: Conversation,
    pub persona: PersonaId,
    pub ui: UiState,
    pub picker: Option<PersonaPicker>,
    source: Arc<dyn ReplySource>,
    current_stream_id: u64,
}

impl App {
    pub fn new(persona: PersonaId, source: Arc<dyn ReplySource>) -> Self {
        Self {
            conversation: Conversation::new(),
            persona,
            ui: UiState::new(),
            picker: None,
            source,
            current_stream_id: 0,
        }
    }

    /// Persona whose reply is on screen: the in-flight one while streaming,
    /// otherwise the active selection.
    pub fn speaking_persona(&self) -> PersonaId {
        self.conversation
            .in_flight_turn()
            .and_then(|turn| turn.persona_used)
            .unwrap_or(self.persona)
    }

    pub fn is_loading(&self) -> bool {
        self.conversation.is_loading()
    }

    /// Id of the most recently started stream. Messages tagged with any other
    /// id are stale.
    pub fn current_stream_id(&self) -> u64 {
        self.current_stream_id
    }

    pub fn open_persona_picker(&mut self) {
        self.picker = Some(PersonaPicker::new(self.persona));
    }

    pub fn close_persona_picker(&mut self) {
        self.picker = None;
    }

    /// Switch the active persona. An exchange already in flight keeps the
    /// persona it started with.
    pub fn select_persona(&mut self, persona: PersonaId) {
        if persona != self.persona {
            info!(from = %self.persona, to = %persona, "persona switched");
        }
        self.persona = persona;
    }

    /// Start an exchange from the input box. The input is cleared only when
    /// the exchange actually starts.
    pub(crate) fn prepare_stream(&mut self) -> Option<StreamParams> {
        if self.is_loading() {
            return None;
        }
        let input = self.ui.input_text();
        let pending = self.conversation.begin_exchange(&input, self.persona)?;

        self.ui.clear_input();
        self.ui.scroll.follow();
        self.ui.pulse_start = std::time::Instant::now();
        self.current_stream_id += 1;

        Some(StreamParams {
            source: Arc::clone(&self.source),
            prompt: pending.prompt,
            persona: pending.persona,
            history: pending.history,
            stream_id: self.current_stream_id,
        })
    }
}
