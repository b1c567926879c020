use std::time::Duration;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::core::app::App;
use crate::core::conversation::{Role, Turn};
use crate::core::persona::PersonaId;
use crate::core::text_wrapping::wrap_text;
use crate::ui::picker::render_persona_picker;
use crate::ui::theme::Theme;

const TRANSCRIPT_INDENT: &str = "  ";
const MAX_INPUT_LINES: usize = 6;

pub fn ui(f: &mut Frame, app: &mut App, theme: &Theme) {
    let input_lines = app.ui.input_line_count().clamp(1, MAX_INPUT_LINES) as u16;
    let status_height = u16::from(app.conversation.last_error().is_some());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(status_height),
            Constraint::Length(input_lines + 2),
        ])
        .split(f.area());

    f.render_widget(Paragraph::new(title_line(app, theme)), chunks[0]);
    render_transcript(f, app, theme, chunks[1]);

    if let Some(error) = app.conversation.last_error() {
        let status = Paragraph::new(Line::from(Span::styled(
            format!("Error: {error}"),
            theme.error_text_style,
        )));
        f.render_widget(status, chunks[2]);
    }

    render_input(f, app, theme, chunks[3]);

    if let Some(picker) = app.picker.as_ref() {
        render_persona_picker(f, picker, app.persona, theme);
    }
}

fn title_line(app: &App, theme: &Theme) -> Line<'static> {
    let speaking = app.speaking_persona();
    let persona = speaking.config();
    let accent = theme.accent_style(speaking);
    let mut spans = vec![
        Span::styled(
            format!("Polymind v{} • ", env!("CARGO_PKG_VERSION")),
            theme.title_style,
        ),
        Span::styled(
            format!("{} {}", persona.style.glyph, persona.label),
            accent.add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!(" ({})", persona.model_name), theme.title_style),
    ];
    if app.is_loading() {
        spans.push(Span::styled(
            format!(" • {} streaming", pulse_symbol(app.ui.pulse_start.elapsed())),
            theme.streaming_indicator_style,
        ));
    }
    Line::from(spans)
}

/// Two pulses per second through three fill levels.
fn pulse_symbol(elapsed: Duration) -> &'static str {
    let phase = (elapsed.as_millis() % 500) as f32 / 500.0;
    let intensity = if phase < 0.5 { phase * 2.0 } else { 2.0 - phase * 2.0 };
    if intensity < 0.33 {
        "○"
    } else if intensity < 0.66 {
        "◐"
    } else {
        "●"
    }
}

fn render_transcript(f: &mut Frame, app: &mut App, theme: &Theme, area: Rect) {
    let lines = build_transcript_lines(app, theme, area.width as usize);
    app.ui.scroll.update_bounds(lines.len(), area.height as usize);
    let offset = u16::try_from(app.ui.scroll.offset()).unwrap_or(u16::MAX);
    f.render_widget(Paragraph::new(lines).scroll((offset, 0)), area);
}

/// Pre-wrapped transcript rows for a viewport `width` columns wide.
pub fn build_transcript_lines(app: &App, theme: &Theme, width: usize) -> Vec<Line<'static>> {
    let body_width = width.saturating_sub(TRANSCRIPT_INDENT.len()).max(1);

    if app.conversation.is_empty() {
        return welcome_lines(app.persona, theme, body_width);
    }

    let in_flight = app.conversation.in_flight_turn().map(|turn| turn.id);
    let mut lines = Vec::new();
    for turn in app.conversation.turns() {
        let streaming = in_flight == Some(turn.id);
        push_turn_lines(&mut lines, turn, streaming, app.persona, theme, body_width);
        lines.push(Line::from(""));
    }
    lines
}

fn push_turn_lines(
    lines: &mut Vec<Line<'static>>,
    turn: &Turn,
    streaming: bool,
    active: PersonaId,
    theme: &Theme,
    width: usize,
) {
    let body_style = match turn.role {
        Role::User => {
            lines.push(Line::from(Span::styled("You", theme.user_prefix_style)));
            theme.user_text_style
        }
        Role::Assistant => {
            let persona = turn.persona_used.unwrap_or(active);
            let config = persona.config();
            lines.push(Line::from(Span::styled(
                format!("{} {}", config.style.glyph, config.label),
                theme.accent_style(persona).add_modifier(Modifier::BOLD),
            )));
            theme.assistant_text_style
        }
        Role::System => theme.error_text_style,
    };

    if turn.content.is_empty() {
        let placeholder = if streaming { "…" } else { "(empty reply)" };
        let style = if streaming {
            theme.streaming_indicator_style
        } else {
            theme.system_text_style
        };
        lines.push(indented(placeholder.to_string(), style));
        return;
    }

    for row in wrap_text(&turn.content, width) {
        lines.push(indented(row, body_style));
    }
}

fn welcome_lines(persona: PersonaId, theme: &Theme, width: usize) -> Vec<Line<'static>> {
    let config = persona.config();
    let mut lines = vec![Line::from(Span::styled(
        format!("{} {} is ready", config.style.glyph, config.label),
        theme.accent_style(persona).add_modifier(Modifier::BOLD),
    ))];
    for row in wrap_text(config.description, width) {
        lines.push(indented(row, theme.system_text_style));
    }
    lines.push(Line::from(""));
    lines.push(indented(
        "Type a message and press Enter. Ctrl+P switches personas.".to_string(),
        theme.system_text_style,
    ));
    lines
}

fn indented(text: String, style: Style) -> Line<'static> {
    Line::from(vec![
        Span::raw(TRANSCRIPT_INDENT),
        Span::styled(text, style),
    ])
}

fn render_input(f: &mut Frame, app: &mut App, theme: &Theme, area: Rect) {
    let speaking = app.speaking_persona();
    let label = speaking.config().label;
    let title = if app.is_loading() {
        format!("Waiting for {label}… (Ctrl+C to quit)")
    } else {
        format!("Message {label} (Enter to send, Alt+Enter for new line, Ctrl+P personas, Ctrl+C to quit)")
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.accent_border_style(speaking))
        .title(Span::styled(title, theme.input_title_style));

    let textarea = app.ui.textarea_mut();
    textarea.set_block(block);
    textarea.set_style(theme.input_text_style);
    textarea.set_cursor_style(theme.input_cursor_style);
    textarea.set_cursor_line_style(Style::default());

    f.render_widget(app.ui.textarea(), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::app::{apply_action, AppAction};
    use crate::core::chat_stream::{FragmentStream, HistoryEntry, ReplySource, TransportError};
    use futures_util::stream;
    use ratatui::{backend::TestBackend, Terminal};
    use std::sync::Arc;

    struct UnusedSource;

    impl ReplySource for UnusedSource {
        fn stream_reply(&self, _: &str, _: PersonaId, _: &[HistoryEntry]) -> FragmentStream {
            Box::pin(stream::empty())
        }
    }

    fn draw(app: &mut App, width: u16, height: u16) -> Vec<String> {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).expect("terminal");
        let theme = Theme::dark_default();
        terminal
            .draw(|f| ui(f, app, &theme))
            .expect("draw should succeed");
        let buffer = terminal.backend().buffer();
        (0..height)
            .map(|y| {
                (0..width)
                    .map(|x| buffer[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect()
    }

    fn contains(rows: &[String], needle: &str) -> bool {
        rows.iter().any(|row| row.contains(needle))
    }

    fn start(app: &mut App, text: &str) {
        app.ui.set_input_text(text);
        assert!(apply_action(app, AppAction::SubmitInput).is_some());
    }

    #[test]
    fn empty_conversation_shows_welcome() {
        let mut app = App::new(PersonaId::Grok, Arc::new(UnusedSource));
        let rows = draw(&mut app, 80, 20);
        assert!(contains(&rows, "Grok 2 is ready"));
        assert!(contains(&rows, "gemini-2.5-flash"));
    }

    #[test]
    fn transcript_labels_turns_and_marks_streaming() {
        let mut app = App::new(PersonaId::Gemini3, Arc::new(UnusedSource));
        start(&mut app, "hello there");
        apply_action(
            &mut app,
            AppAction::AppendResponseChunk {
                content: "Privet".into(),
            },
        );

        let rows = draw(&mut app, 80, 20);
        assert!(contains(&rows, "You"));
        assert!(contains(&rows, "hello there"));
        assert!(contains(&rows, "Gemini 3.0"));
        assert!(contains(&rows, "Privet"));
        assert!(contains(&rows, "streaming"));
        assert!(contains(&rows, "Waiting for Gemini 3.0"));
    }

    #[test]
    fn failed_exchange_shows_notice_and_status_line() {
        let mut app = App::new(PersonaId::ChatGpt, Arc::new(UnusedSource));
        start(&mut app, "hi");
        apply_action(
            &mut app,
            AppAction::StreamErrored {
                error: TransportError::MissingCredential,
            },
        );

        let rows = draw(&mut app, 100, 20);
        assert!(contains(&rows, "Sorry, an error occurred"));
        assert!(contains(&rows, "Error: No API key configured"));
        assert!(!contains(&rows, "streaming"));
    }

    #[test]
    fn assistant_label_follows_persona_used_not_active() {
        let mut app = App::new(PersonaId::DeepSeek, Arc::new(UnusedSource));
        start(&mut app, "hi");
        apply_action(&mut app, AppAction::StreamCompleted);
        app.select_persona(PersonaId::Grok);

        let theme = Theme::dark_default();
        let lines = build_transcript_lines(&app, &theme, 60);
        let text: Vec<String> = lines.iter().map(|line| line.to_string()).collect();
        assert!(text.iter().any(|line| line.contains("DeepSeek R1")));
        assert!(text.iter().any(|line| line.contains("(empty reply)")));
    }

    #[test]
    fn streaming_labels_stay_with_the_in_flight_persona() {
        let mut app = App::new(PersonaId::Gemini3, Arc::new(UnusedSource));
        start(&mut app, "hi");
        app.select_persona(PersonaId::Grok);

        let rows = draw(&mut app, 100, 20);
        assert!(contains(&rows, "Waiting for Gemini 3.0"));
        assert!(!contains(&rows, "Waiting for Grok 2"));
        assert!(contains(&rows, &format!("({})", PersonaId::Gemini3.config().model_name)));

        apply_action(&mut app, AppAction::StreamCompleted);
        let rows = draw(&mut app, 100, 20);
        assert!(contains(&rows, "Message Grok 2"));
        assert!(contains(&rows, "(gemini-2.5-flash)"));
    }

    #[test]
    fn long_replies_scroll_to_the_bottom() {
        let mut app = App::new(PersonaId::Gemini3, Arc::new(UnusedSource));
        start(&mut app, "count");
        let body: String = (1..=40).map(|n| format!("line{n}\n")).collect();
        apply_action(&mut app, AppAction::AppendResponseChunk { content: body });

        let rows = draw(&mut app, 60, 15);
        assert!(contains(&rows, "line40"));
        assert!(!contains(&rows, "line1 "));
    }

    #[test]
    fn picker_overlay_lists_every_persona() {
        let mut app = App::new(PersonaId::Gemini3, Arc::new(UnusedSource));
        apply_action(&mut app, AppAction::OpenPersonaPicker);
        let rows = draw(&mut app, 100, 20);
        for label in ["Gemini 3.0", "ChatGPT 4o", "Grok 2", "DeepSeek R1"] {
            assert!(contains(&rows, label), "missing {label}");
        }
    }
}
