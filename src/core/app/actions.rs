use tracing::debug;

use super::App;
use crate::core::chat_stream::{StreamMessage, StreamParams, TransportError};

pub enum AppAction {
    AppendResponseChunk { content: String },
    StreamErrored { error: TransportError },
    StreamCompleted,
    SubmitInput,
    InsertNewline,
    ScrollUp { lines: usize },
    ScrollDown { lines: usize },
    PageUp,
    PageDown,
    OpenPersonaPicker,
    PickerMoveUp,
    PickerMoveDown,
    PickerApplySelection,
    PickerEscape,
    Quit,
}

pub enum AppCommand {
    SpawnStream(StreamParams),
}

pub fn apply_actions(app: &mut App, actions: impl IntoIterator<Item = AppAction>) -> Vec<AppCommand> {
    actions
        .into_iter()
        .filter_map(|action| apply_action(app, action))
        .collect()
}

pub fn apply_action(app: &mut App, action: AppAction) -> Option<AppCommand> {
    match action {
        AppAction::AppendResponseChunk { content } => {
            app.conversation.append_fragment(&content);
            None
        }
        AppAction::StreamErrored { error } => {
            app.conversation.fail_exchange(&error);
            None
        }
        AppAction::StreamCompleted => {
            app.conversation.complete_exchange();
            None
        }
        AppAction::SubmitInput => app.prepare_stream().map(AppCommand::SpawnStream),
        AppAction::InsertNewline => {
            app.ui.insert_newline();
            None
        }
        AppAction::ScrollUp { lines } => {
            app.ui.scroll.scroll_up(lines);
            None
        }
        AppAction::ScrollDown { lines } => {
            app.ui.scroll.scroll_down(lines);
            None
        }
        AppAction::PageUp => {
            app.ui.scroll.page_up();
            None
        }
        AppAction::PageDown => {
            app.ui.scroll.page_down();
            None
        }
        AppAction::OpenPersonaPicker => {
            app.open_persona_picker();
            None
        }
        AppAction::PickerMoveUp => {
            if let Some(picker) = app.picker.as_mut() {
                picker.move_up();
            }
            None
        }
        AppAction::PickerMoveDown => {
            if let Some(picker) = app.picker.as_mut() {
                picker.move_down();
            }
            None
        }
        AppAction::PickerApplySelection => {
            if let Some(picker) = app.picker.take() {
                app.select_persona(picker.selected_persona());
            }
            None
        }
        AppAction::PickerEscape => {
            app.close_persona_picker();
            None
        }
        AppAction::Quit => {
            app.ui.exit_requested = true;
            None
        }
    }
}

/// Translate a message from a stream task into an action, dropping messages
/// from streams that are no longer current.
pub fn action_for_stream_message(
    app: &App,
    message: StreamMessage,
    stream_id: u64,
) -> Option<AppAction> {
    if stream_id != app.current_stream_id() || !app.is_loading() {
        debug!(
            stream_id,
            current = app.current_stream_id(),
            "dropping stale stream message"
        );
        return None;
    }

    Some(match message {
        StreamMessage::Chunk(content) => AppAction::AppendResponseChunk { content },
        StreamMessage::Error(error) => AppAction::StreamErrored { error },
        StreamMessage::End => AppAction::StreamCompleted,
    })
}
