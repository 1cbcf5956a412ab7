// src/parser/style.rs
//! Inline `style` attribute handling: declarations, colors, indentation.

use crate::constants::{INDENT_PX_PER_LEVEL, MAX_INDENT_LEVEL};
use crate::types::Rgb;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref RGB_RE: Regex =
        Regex::new(r"(?i)rgba?\(\s*(\d{1,3})\s*,\s*(\d{1,3})\s*,\s*(\d{1,3})").unwrap();
    static ref HEX_RE: Regex = Regex::new(r"#([0-9a-fA-F]{6}|[0-9a-fA-F]{3})\b").unwrap();
    static ref PX_RE: Regex = Regex::new(r"^\s*(-?\d+(?:\.\d+)?)\s*(px)?\s*$").unwrap();
}

/// Parsed `style` attribute: ordered `property: value` pairs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InlineStyle {
    declarations: Vec<(String, String)>,
}

impl InlineStyle {
    pub fn parse(style: &str) -> Self {
        let declarations = style
            .split(';')
            .filter_map(|decl| {
                let (property, value) = decl.split_once(':')?;
                let property = property.trim().to_ascii_lowercase();
                if property.is_empty() {
                    return None;
                }
                Some((property, value.trim().to_string()))
            })
            .collect();
        Self { declarations }
    }

    /// Value of the last declaration of `property`.
    pub fn get(&self, property: &str) -> Option<&str> {
        self.declarations
            .iter()
            .rev()
            .find(|(name, _)| name == property)
            .map(|(_, value)| value.as_str())
    }

    /// Evernote's custom boolean markers, e.g. `--en-todo:true`.
    pub fn flag(&self, property: &str) -> bool {
        self.get(property)
            .map(|value| value.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    /// Indentation level encoded by `padding-left` or `margin-left`.
    pub fn indent_level(&self) -> usize {
        let px = self
            .get("padding-left")
            .and_then(parse_px)
            .or_else(|| self.get("margin-left").and_then(parse_px))
            .unwrap_or(0.0);
        if px <= 0.0 {
            return 0;
        }
        let level = (px / INDENT_PX_PER_LEVEL as f32).floor() as usize;
        level.min(MAX_INDENT_LEVEL)
    }
}

/// Pixel length such as `40px` or `40`.
pub fn parse_px(value: &str) -> Option<f32> {
    let captures = PX_RE.captures(value)?;
    captures.get(1)?.as_str().parse().ok()
}

/// Parses `rgb()`, `rgba()`, `#rrggbb`, `#rgb` or a basic color name found
/// anywhere in `value`. Unparseable values give `None`.
pub fn parse_color(value: &str) -> Option<Rgb> {
    if let Some(captures) = RGB_RE.captures(value) {
        let channel = |i: usize| -> Option<u8> {
            let n: u16 = captures.get(i)?.as_str().parse().ok()?;
            Some(n.min(255) as u8)
        };
        return Some(Rgb(channel(1)?, channel(2)?, channel(3)?));
    }

    if let Some(captures) = HEX_RE.captures(value) {
        let hex = captures.get(1)?.as_str();
        let expanded: String = if hex.len() == 3 {
            hex.chars().flat_map(|c| [c, c]).collect()
        } else {
            hex.to_string()
        };
        let channel = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).ok();
        return Some(Rgb(channel(0)?, channel(2)?, channel(4)?));
    }

    value
        .split_whitespace()
        .find_map(|word| named_color(&word.to_ascii_lowercase()))
}

fn named_color(name: &str) -> Option<Rgb> {
    let rgb = match name {
        "black" => Rgb(0, 0, 0),
        "white" => Rgb(255, 255, 255),
        "gray" | "grey" => Rgb(128, 128, 128),
        "red" => Rgb(255, 0, 0),
        "green" => Rgb(0, 128, 0),
        "blue" => Rgb(0, 0, 255),
        "yellow" => Rgb(255, 255, 0),
        "orange" => Rgb(255, 165, 0),
        "purple" => Rgb(128, 0, 128),
        "brown" => Rgb(165, 42, 42),
        "pink" => Rgb(255, 192, 203),
        _ => return None,
    };
    Some(rgb)
}

/// Display dimension from an attribute or style value (`640`, `640px`).
pub fn parse_dimension(value: &str) -> Option<u32> {
    let px = parse_px(value)?;
    if px >= 1.0 {
        Some(px.round() as u32)
    } else {
        None
    }
}
