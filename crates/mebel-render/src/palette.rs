//! Color names used by the catalog, resolved to display colors.

use std::fmt;

/// How much [`Color::darker`] takes off each channel.
pub const SHADE_STEP: u8 = 40;

pub const NEUTRAL_GRAY: Color = Color::rgb(0xCC, 0xCC, 0xCC);

const NAMED: [(&str, Color); 12] = [
    ("белый", Color::rgb(0xFF, 0xFF, 0xFF)),
    ("черный", Color::rgb(0x00, 0x00, 0x00)),
    ("серый", Color::rgb(0x80, 0x80, 0x80)),
    ("коричневый", Color::rgb(0x8B, 0x45, 0x13)),
    ("бежевый", Color::rgb(0xF5, 0xF5, 0xDC)),
    ("натуральный", Color::rgb(0xDE, 0xB8, 0x87)),
    ("дуб", Color::rgb(0xD2, 0xB4, 0x8C)),
    ("орех", Color::rgb(0xA0, 0x52, 0x2D)),
    ("бордовый", Color::rgb(0x80, 0x00, 0x00)),
    ("красный", Color::rgb(0xFF, 0x00, 0x00)),
    ("синий", Color::rgb(0x00, 0x00, 0xFF)),
    ("зеленый", Color::rgb(0x00, 0x80, 0x00)),
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub alpha: f64,
}

impl Color {
    pub const WHITE: Color = Color::rgb(0xFF, 0xFF, 0xFF);
    pub const BLACK: Color = Color::rgb(0x00, 0x00, 0x00);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, alpha: 1.0 }
    }

    pub const fn with_alpha(self, alpha: f64) -> Self {
        Self { alpha, ..self }
    }

    pub fn darker(self) -> Self {
        Self {
            r: self.r.saturating_sub(SHADE_STEP),
            g: self.g.saturating_sub(SHADE_STEP),
            b: self.b.saturating_sub(SHADE_STEP),
            alpha: self.alpha,
        }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.alpha >= 1.0 {
            f.write_str(&self.to_hex())
        } else {
            write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.alpha)
        }
    }
}

/// Display color for a catalog color name; unknown names are neutral gray.
pub fn resolve(name: &str) -> Color {
    let name = name.to_lowercase();
    NAMED
        .iter()
        .find(|(known, _)| *known == name)
        .map(|(_, color)| *color)
        .unwrap_or(NEUTRAL_GRAY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_resolve_case_insensitively() {
        assert_eq!(resolve("Красный"), Color::rgb(0xFF, 0x00, 0x00));
        assert_eq!(resolve("орех").to_hex(), "#a0522d");
    }

    #[test]
    fn unknown_names_are_gray() {
        assert_eq!(resolve("фиолетовый"), NEUTRAL_GRAY);
        assert_eq!(resolve(""), NEUTRAL_GRAY);
    }

    #[test]
    fn darker_saturates_at_zero() {
        assert_eq!(Color::rgb(0x8B, 0x45, 0x13).darker().to_hex(), "#631d00");
        assert_eq!(Color::BLACK.darker(), Color::BLACK);
    }

    #[test]
    fn translucent_colors_display_as_rgba() {
        assert_eq!(Color::BLACK.with_alpha(0.4).to_string(), "rgba(0, 0, 0, 0.4)");
        assert_eq!(Color::WHITE.to_string(), "#ffffff");
    }
}
