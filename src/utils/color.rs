use ratatui::style::Color;

/// Parse a `#rrggbb` (or `rrggbb`) string into an RGB color.
pub fn parse_hex_color(value: &str) -> Option<Color> {
    let hex = value.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }

    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
    Some(Color::Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

/// Like [`parse_hex_color`] but never fails; malformed input falls back to `fallback`.
pub fn hex_or(value: &str, fallback: Color) -> Color {
    parse_hex_color(value).unwrap_or(fallback)
}
