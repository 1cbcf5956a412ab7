use super::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The named colors Notion accepts for text and block annotations.
///
/// Every hue exists as a foreground color (`red`) and as a background
/// highlight (`red_background`); which one applies is decided by where the
/// color is used, not by the variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    Gray,
    Brown,
    Orange,
    Yellow,
    Green,
    Blue,
    Purple,
    Pink,
    Red,
}

impl std::str::FromStr for Color {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hue = s.strip_suffix("_background").unwrap_or(s);
        match hue {
            "gray" => Ok(Color::Gray),
            "brown" => Ok(Color::Brown),
            "orange" => Ok(Color::Orange),
            "yellow" => Ok(Color::Yellow),
            "green" => Ok(Color::Green),
            "blue" => Ok(Color::Blue),
            "purple" => Ok(Color::Purple),
            "pink" => Ok(Color::Pink),
            "red" => Ok(Color::Red),
            _ => Err(ValidationError::InvalidColor(s.to_string())),
        }
    }
}

impl Color {
    /// Foreground name as used in Notion annotations.
    pub fn as_str(&self) -> &'static str {
        match self {
            Color::Gray => "gray",
            Color::Brown => "brown",
            Color::Orange => "orange",
            Color::Yellow => "yellow",
            Color::Green => "green",
            Color::Blue => "blue",
            Color::Purple => "purple",
            Color::Pink => "pink",
            Color::Red => "red",
        }
    }

    /// Background highlight name as used in Notion annotations.
    pub fn as_background_str(&self) -> &'static str {
        match self {
            Color::Gray => "gray_background",
            Color::Brown => "brown_background",
            Color::Orange => "orange_background",
            Color::Yellow => "yellow_background",
            Color::Green => "green_background",
            Color::Blue => "blue_background",
            Color::Purple => "purple_background",
            Color::Pink => "pink_background",
            Color::Red => "red_background",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A plain 8-bit RGB triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    fn distance_sq(&self, other: &Rgb) -> u32 {
        let dr = self.0 as i32 - other.0 as i32;
        let dg = self.1 as i32 - other.1 as i32;
        let db = self.2 as i32 - other.2 as i32;
        (dr * dr + dg * dg + db * db) as u32
    }
}

/// A fixed set of reference colors. Entries mapped to `None` are the
/// neutral colors a note uses when it means "no color at all".
pub struct Palette {
    entries: &'static [(Option<Color>, Rgb)],
}

impl Palette {
    /// Maps an arbitrary RGB value onto the closest palette entry.
    pub fn nearest(&self, rgb: Rgb) -> Option<Color> {
        self.entries
            .iter()
            .min_by_key(|(_, reference)| reference.distance_sq(&rgb))
            .and_then(|(color, _)| *color)
    }

    /// Reference RGB value for a color, used when rendering the palette back out.
    pub fn rgb_of(&self, color: Color) -> Option<Rgb> {
        self.entries
            .iter()
            .find(|(c, _)| *c == Some(color))
            .map(|(_, rgb)| *rgb)
    }

    pub fn colors(&self) -> impl Iterator<Item = (Color, Rgb)> + '_ {
        self.entries
            .iter()
            .filter_map(|(color, rgb)| color.map(|c| (c, *rgb)))
    }
}

/// Text colors as Notion renders them in the light theme, plus black.
pub const FOREGROUND_PALETTE: Palette = Palette {
    entries: &[
        (None, Rgb(0, 0, 0)),
        (None, Rgb(55, 53, 47)),
        (Some(Color::Gray), Rgb(120, 119, 116)),
        (Some(Color::Brown), Rgb(159, 107, 83)),
        (Some(Color::Orange), Rgb(217, 115, 13)),
        (Some(Color::Yellow), Rgb(203, 145, 47)),
        (Some(Color::Green), Rgb(68, 131, 97)),
        (Some(Color::Blue), Rgb(51, 126, 169)),
        (Some(Color::Purple), Rgb(144, 101, 176)),
        (Some(Color::Pink), Rgb(193, 76, 138)),
        (Some(Color::Red), Rgb(212, 76, 71)),
    ],
};

/// Highlight colors as Notion renders them in the light theme, plus white.
pub const BACKGROUND_PALETTE: Palette = Palette {
    entries: &[
        (None, Rgb(255, 255, 255)),
        (Some(Color::Gray), Rgb(241, 241, 239)),
        (Some(Color::Brown), Rgb(244, 238, 238)),
        (Some(Color::Orange), Rgb(251, 236, 221)),
        (Some(Color::Yellow), Rgb(251, 243, 219)),
        (Some(Color::Green), Rgb(237, 243, 236)),
        (Some(Color::Blue), Rgb(231, 243, 248)),
        (Some(Color::Purple), Rgb(244, 240, 247)),
        (Some(Color::Pink), Rgb(249, 238, 243)),
        (Some(Color::Red), Rgb(253, 235, 236)),
    ],
};
