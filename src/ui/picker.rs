use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState},
    Frame,
};

use crate::core::persona::PersonaId;
use crate::ui::theme::Theme;

/// Selection state for the persona picker overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersonaPicker {
    pub selected: usize,
}

impl PersonaPicker {
    /// Open with the cursor on `current`.
    pub fn new(current: PersonaId) -> Self {
        Self {
            selected: current.position(),
        }
    }

    pub fn move_up(&mut self) {
        let count = PersonaId::ALL.len();
        self.selected = (self.selected + count - 1) % count;
    }

    pub fn move_down(&mut self) {
        self.selected = (self.selected + 1) % PersonaId::ALL.len();
    }

    pub fn selected_persona(&self) -> PersonaId {
        PersonaId::ALL
            .get(self.selected)
            .copied()
            .unwrap_or_default()
    }
}

pub fn render_persona_picker(f: &mut Frame, picker: &PersonaPicker, active: PersonaId, theme: &Theme) {
    let height = (PersonaId::ALL.len() as u16) * 2 + 2;
    let area = centered_rect(60, height, f.area());

    let items: Vec<ListItem> = PersonaId::ALL
        .iter()
        .map(|id| {
            let config = id.config();
            let accent = theme.accent_style(*id);
            let mut header = vec![
                Span::styled(format!("{} ", config.style.glyph), accent),
                Span::styled(config.label, accent.add_modifier(Modifier::BOLD)),
                Span::styled(format!("  {}", config.model_name), theme.system_text_style),
            ];
            if *id == active {
                header.push(Span::styled("  (active)", theme.system_text_style));
            }
            ListItem::new(vec![
                Line::from(header),
                Line::from(Span::styled(
                    format!("  {}", config.description),
                    theme.system_text_style,
                )),
            ])
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.input_border_style)
                .title(Span::styled(
                    "Choose a persona (↑/↓, Enter to apply, Esc to cancel)",
                    theme.title_style,
                )),
        )
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    let mut state = ListState::default().with_selected(Some(picker.selected));
    f.render_widget(Clear, area);
    f.render_stateful_widget(list, area, &mut state);
}

/// A rect `percent_x` wide and `height` rows tall, centered in `area`.
fn centered_rect(percent_x: u16, height: u16, area: Rect) -> Rect {
    let height = height.min(area.height);
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(area.height.saturating_sub(height) / 2),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movement_wraps_around_the_catalog() {
        let mut picker = PersonaPicker::new(PersonaId::Gemini3);
        picker.move_up();
        assert_eq!(picker.selected_persona(), PersonaId::DeepSeek);
        picker.move_down();
        picker.move_down();
        assert_eq!(picker.selected_persona(), PersonaId::ChatGpt);
    }

    #[test]
    fn opens_on_the_active_persona() {
        let picker = PersonaPicker::new(PersonaId::Grok);
        assert_eq!(picker.selected_persona(), PersonaId::Grok);
    }
}
