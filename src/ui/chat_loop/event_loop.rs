//! Event polling, dispatching, and UI rendering loop.

use std::{
    error::Error,
    sync::Arc,
    time::{Duration, Instant},
};

use ratatui::crossterm::event::{self, Event, KeyEventKind};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::core::app::{
    action_for_stream_message, apply_action, apply_actions, App, AppCommand,
};
use crate::core::chat_stream::{ChatStreamService, GeminiClient, ReplySource, StreamMessage};
use crate::core::persona::PersonaId;
use crate::ui::renderer::ui;
use crate::ui::theme::Theme;

use super::keybindings::{map_key, KeyResult};
use super::lifecycle::{restore_terminal, setup_terminal, ChatTerminal};

const MAX_FPS: u64 = 30;

#[derive(Debug)]
pub enum UiEvent {
    Crossterm(Event),
}

fn spawn_event_reader(event_tx: mpsc::UnboundedSender<UiEvent>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if let Ok(true) = event::poll(Duration::from_millis(10)) {
                match event::read() {
                    Ok(ev) => {
                        if event_tx.send(UiEvent::Crossterm(ev)).is_err() {
                            break;
                        }
                    }
                    Err(_) => continue,
                }
            } else {
                tokio::task::yield_now().await;
            }
        }
    })
}

pub async fn run_chat(persona: PersonaId, base_url: String) -> Result<(), Box<dyn Error>> {
    let client = GeminiClient::from_env(base_url);
    info!(persona = %persona, base_url = client.base_url(), "starting chat");
    let source: Arc<dyn ReplySource> = Arc::new(client);
    let mut app = App::new(persona, source);
    let theme = Theme::dark_default();

    let mut terminal = setup_terminal()?;
    let (stream_service, mut stream_rx) = ChatStreamService::new();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<UiEvent>();
    let event_reader = spawn_event_reader(event_tx);

    let result = main_loop(
        &mut terminal,
        &mut app,
        &theme,
        &stream_service,
        &mut event_rx,
        &mut stream_rx,
    )
    .await;

    event_reader.abort();
    restore_terminal(&mut terminal)?;
    info!(turns = app.conversation.turns().len(), "chat closed");
    result
}

async fn main_loop(
    terminal: &mut ChatTerminal,
    app: &mut App,
    theme: &Theme,
    stream_service: &ChatStreamService,
    event_rx: &mut mpsc::UnboundedReceiver<UiEvent>,
    stream_rx: &mut mpsc::UnboundedReceiver<(StreamMessage, u64)>,
) -> Result<(), Box<dyn Error>> {
    let frame_duration = Duration::from_millis(1000 / MAX_FPS);
    let mut request_redraw = true;
    let mut last_draw = Instant::now() - frame_duration;

    loop {
        if app.ui.exit_requested {
            return Ok(());
        }

        // The streaming pulse animates even when nothing else changes.
        let animate = app.is_loading() && last_draw.elapsed() >= frame_duration;
        if request_redraw || animate {
            terminal.draw(|f| ui(f, app, theme))?;
            last_draw = Instant::now();
            request_redraw = false;
        }

        let mut events_processed = false;
        while let Ok(UiEvent::Crossterm(event)) = event_rx.try_recv() {
            events_processed = true;
            for command in handle_event(app, event) {
                run_command(stream_service, command);
            }
        }

        let mut received_any = false;
        while let Ok((message, stream_id)) = stream_rx.try_recv() {
            received_any = true;
            if let Some(action) = action_for_stream_message(app, message, stream_id) {
                apply_action(app, action);
            }
        }

        if events_processed || received_any {
            request_redraw = true;
        } else {
            tokio::time::sleep(Duration::from_millis(16)).await;
        }
    }
}

fn handle_event(app: &mut App, event: Event) -> Vec<AppCommand> {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => match map_key(app, &key) {
            KeyResult::Actions(actions) => apply_actions(app, actions),
            KeyResult::ForwardToInput => {
                app.ui.textarea_mut().input(key);
                Vec::new()
            }
            KeyResult::Ignored => Vec::new(),
        },
        Event::Paste(text) => {
            if app.picker.is_none() {
                let text = text.replace("\r\n", "\n").replace('\r', "\n");
                app.ui.textarea_mut().insert_str(text);
            }
            Vec::new()
        }
        _ => Vec::new(),
    }
}

fn run_command(stream_service: &ChatStreamService, command: AppCommand) {
    match command {
        AppCommand::SpawnStream(params) => {
            debug!(stream_id = params.stream_id, "spawning reply stream");
            stream_service.spawn_stream(params);
        }
    }
}
