//! Theme: glyphs and colours, passed explicitly into the renderers.
//!
//! Colours are ANSI-256 indices so they round-trip through YAML as plain
//! numbers.

use ratatui::style::{Color, Modifier, Style};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    /// Shown for a probe whose reply arrived.
    pub success_glyph: String,
    /// Shown for a probe with no reply (yet), and before any data.
    pub neutral_glyph: String,
    pub border: u8,
    pub selected_fg: u8,
    pub selected_bg: u8,
    pub error: u8,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            success_glyph: "✅".into(),
            neutral_glyph: "🔲".into(),
            border: 240,
            selected_fg: 229,
            selected_bg: 57,
            error: 203,
        }
    }
}

impl Theme {
    pub fn glyph(&self, received: bool) -> &str {
        if received {
            &self.success_glyph
        } else {
            &self.neutral_glyph
        }
    }

    pub fn border_style(&self) -> Style {
        Style::default().fg(Color::Indexed(self.border))
    }

    pub fn header_style(&self) -> Style {
        Style::default().add_modifier(Modifier::UNDERLINED)
    }

    pub fn selected_style(&self) -> Style {
        Style::default()
            .fg(Color::Indexed(self.selected_fg))
            .bg(Color::Indexed(self.selected_bg))
    }

    pub fn error_style(&self) -> Style {
        Style::default().fg(Color::Indexed(self.error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glyph_picks_by_outcome() {
        let theme = Theme::default();
        assert_eq!(theme.glyph(true), "✅");
        assert_eq!(theme.glyph(false), "🔲");
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let theme: Theme = serde_yaml::from_str("success_glyph: \"+\"\n").unwrap();
        assert_eq!(theme.success_glyph, "+");
        assert_eq!(theme.neutral_glyph, "🔲");
        assert_eq!(theme.border, 240);
    }
}
