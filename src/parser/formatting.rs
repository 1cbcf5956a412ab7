// src/parser/formatting.rs
//! Text formatting inherited down the element tree.

use super::dom::Element;
use super::style::{parse_color, InlineStyle};
use crate::types::{Annotations, Color, BACKGROUND_PALETTE, FOREGROUND_PALETTE};

const MONOSPACE_FONTS: &[&str] = &[
    "monospace", "courier", "consolas", "menlo", "monaco", "source code pro", "andale mono",
];

/// Formatting for the content of `element`, given what its parent passes down.
///
/// Boolean attributes accumulate along the ancestor chain; colors and links
/// are replaced by the nearest element that sets them.
pub fn apply_formatting(element: &Element, inherited: &Annotations) -> Annotations {
    let mut ann = inherited.clone();

    match element.name.as_str() {
        "b" | "strong" => ann.bold = true,
        "i" | "em" | "cite" | "var" => ann.italic = true,
        "u" | "ins" => ann.underline = true,
        "s" | "strike" | "del" => ann.strikethrough = true,
        "code" | "tt" | "kbd" | "samp" => ann.code = true,
        "mark" => ann.background = Some(Color::Yellow),
        "a" => {
            if let Some(href) = element.attr("href").map(str::trim).filter(|h| is_linkable(h)) {
                ann.link = Some(href.to_string());
            }
        }
        "font" => {
            if let Some(rgb) = element.attr("color").and_then(parse_color) {
                ann.color = FOREGROUND_PALETTE.nearest(rgb);
            }
        }
        _ => {}
    }

    if let Some(style) = element.attr("style") {
        apply_style(&InlineStyle::parse(style), &mut ann);
    }

    ann
}

fn apply_style(style: &InlineStyle, ann: &mut Annotations) {
    if let Some(weight) = style.get("font-weight") {
        let weight = weight.to_ascii_lowercase();
        ann.bold = match weight.as_str() {
            "bold" | "bolder" => true,
            "normal" | "lighter" => false,
            numeric => numeric.parse::<u16>().map(|w| w >= 600).unwrap_or(ann.bold),
        };
    }

    if let Some(font_style) = style.get("font-style") {
        let font_style = font_style.to_ascii_lowercase();
        if font_style.contains("italic") || font_style.contains("oblique") {
            ann.italic = true;
        }
    }

    for property in ["text-decoration", "text-decoration-line"] {
        if let Some(decoration) = style.get(property) {
            let decoration = decoration.to_ascii_lowercase();
            if decoration.contains("underline") {
                ann.underline = true;
            }
            if decoration.contains("line-through") {
                ann.strikethrough = true;
            }
        }
    }

    if let Some(family) = style.get("font-family") {
        let family = family.to_ascii_lowercase();
        if MONOSPACE_FONTS.iter().any(|font| family.contains(font)) {
            ann.code = true;
        }
    }

    if let Some(rgb) = style.get("color").and_then(parse_color) {
        ann.color = FOREGROUND_PALETTE.nearest(rgb);
    }

    let background = style
        .get("background-color")
        .or_else(|| style.get("background"))
        .and_then(parse_color);
    match background {
        Some(rgb) => ann.background = BACKGROUND_PALETTE.nearest(rgb),
        None if style.flag("-evernote-highlight") => ann.background = Some(Color::Yellow),
        None => {}
    }
}

fn is_linkable(href: &str) -> bool {
    !href.is_empty() && !href.starts_with('#') && !href.to_ascii_lowercase().starts_with("javascript:")
}
