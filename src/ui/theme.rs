//! Colour palette and text styles used across the UI.

use ratatui::style::{Color, Modifier, Style};

/// Central theme. Change colours here and they propagate everywhere.
pub struct Theme;

impl Theme {
    // ── grid ───────────────────────────────────────────────────
    pub fn background() -> Color {
        Color::Rgb(14, 14, 18)
    }

    /// Tile fill when no thumbnail is available.
    pub fn tile_fill() -> Color {
        Color::Rgb(52, 54, 64)
    }

    pub fn focused_border_style() -> Style {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    }

    /// Label colours are RGB so they can be faded with the tile.
    pub fn label_fg() -> Color {
        Color::Rgb(236, 236, 240)
    }

    pub fn price_fg() -> Color {
        Color::Rgb(120, 220, 140)
    }

    // ── chrome ─────────────────────────────────────────────────
    pub fn status_bar_style() -> Style {
        Style::default().bg(Color::DarkGray).fg(Color::White)
    }

    pub fn status_focus_style() -> Style {
        Style::default()
            .bg(Color::DarkGray)
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    }
}

/// Scale an RGB colour toward the background by `opacity` (0..=1).
/// Non-RGB colours are returned unchanged.
pub fn fade(color: Color, opacity: f64) -> Color {
    let (Color::Rgb(r, g, b), Color::Rgb(br, bg, bb)) = (color, Theme::background()) else {
        return color;
    };
    let a = opacity.clamp(0.0, 1.0);
    let mix = |c: u8, base: u8| (base as f64 + (c as f64 - base as f64) * a).round() as u8;
    Color::Rgb(mix(r, br), mix(g, bg), mix(b, bb))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fade_interpolates_toward_background() {
        let white = Color::Rgb(255, 255, 255);
        assert_eq!(fade(white, 1.0), white);
        assert_eq!(fade(white, 0.0), Theme::background());
        assert_eq!(fade(Color::Red, 0.3), Color::Red);
        let Color::Rgb(r, _, _) = fade(white, 0.5) else {
            panic!("expected rgb");
        };
        assert!(r > 14 && r < 255);
    }
}
