use ratatui::style::{Color, Modifier, Style};

use crate::core::persona::PersonaId;
use crate::utils::color::hex_or;

#[derive(Debug, Clone)]
pub struct Theme {
    // Transcript
    pub user_prefix_style: Style,
    pub user_text_style: Style,
    pub assistant_text_style: Style,
    pub system_text_style: Style,
    pub error_text_style: Style,

    // Chrome
    pub title_style: Style,
    pub streaming_indicator_style: Style,
    pub input_border_style: Style,
    pub input_title_style: Style,

    // Input area
    pub input_text_style: Style,
    pub input_cursor_style: Style,
}

impl Theme {
    pub fn dark_default() -> Self {
        Theme {
            user_prefix_style: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            user_text_style: Style::default().fg(Color::Cyan),
            assistant_text_style: Style::default().fg(Color::White),
            system_text_style: Style::default().fg(Color::DarkGray),
            error_text_style: Style::default().fg(Color::LightRed),

            title_style: Style::default().fg(Color::Gray),
            streaming_indicator_style: Style::default().fg(Color::White),
            input_border_style: Style::default().fg(Color::Gray),
            input_title_style: Style::default().fg(Color::Gray),

            input_text_style: Style::default().fg(Color::White),
            input_cursor_style: Style::default().add_modifier(Modifier::REVERSED),
        }
    }

    /// Foreground style in the persona's primary accent.
    pub fn accent_style(&self, persona: PersonaId) -> Style {
        Style::default().fg(hex_or(persona.config().style.accent, Color::White))
    }

    /// Border style in the persona's secondary accent.
    pub fn accent_border_style(&self, persona: PersonaId) -> Style {
        Style::default().fg(hex_or(
            persona.config().style.accent_secondary,
            Color::Gray,
        ))
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persona_accents_resolve_to_rgb() {
        let theme = Theme::dark_default();
        assert_eq!(
            theme.accent_style(PersonaId::Gemini3).fg,
            Some(Color::Rgb(0x60, 0xa5, 0xfa))
        );
        assert_eq!(
            theme.accent_border_style(PersonaId::DeepSeek).fg,
            Some(Color::Rgb(0x63, 0x66, 0xf1))
        );
    }
}
