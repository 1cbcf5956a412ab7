// src/parser/dispatch.rs
//! The tag dispatch table: which role each element plays in a note body.
//!
//! Roles are decided from the tag name plus a few attribute predicates
//! (Evernote marks code blocks, rich links and checklists with custom
//! style properties rather than dedicated tags).

use super::dom::Element;
use super::style::InlineStyle;
use crate::model::Block;

/// What an element contributes to the block stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagRole {
    /// Contributes nothing but its children (`en-note`, unknown tags).
    Transparent,
    /// Dropped with its whole subtree.
    Skip,
    /// Starts and ends a line of text (`div`, `p`, ...).
    Line,
    /// Inline formatting; text flows into the current line.
    Inline,
    /// Ends the current line.
    LineBreak,
    Heading(u8),
    List { ordered: bool, todo: bool },
    Quote,
    Code,
    Divider,
    Table,
    /// Embedded resource referenced by hash.
    Media,
    /// Remote image referenced by URL.
    ExternalImage,
    /// Rich link card.
    Bookmark,
    /// Checkbox that turns the current line into a to-do item.
    TodoMarker,
    Encrypted,
}

const LINE_TAGS: &[&str] = &[
    "div", "p", "section", "article", "header", "footer", "center", "main", "aside", "nav",
    "address", "figure", "figcaption", "dl", "dt", "dd", "li", "form", "fieldset",
];

const INLINE_TAGS: &[&str] = &[
    "b", "strong", "i", "em", "u", "ins", "s", "strike", "del", "code", "tt", "kbd", "samp",
    "var", "a", "span", "font", "sub", "sup", "small", "big", "mark", "abbr", "cite", "q",
    "label",
];

const SKIPPED_TAGS: &[&str] = &[
    "script", "style", "head", "title", "meta", "link", "object", "noscript", "iframe", "svg",
    "button", "input", "select", "textarea", "map", "canvas",
];

/// Looks up the role of an element.
pub fn role_of(element: &Element) -> TagRole {
    let name = element.name.as_str();
    let style = element.attr("style").map(InlineStyle::parse).unwrap_or_default();

    match name {
        "en-note" | "#document" | "html" | "body" => TagRole::Transparent,
        "div" if style.flag("--en-richlink") => TagRole::Bookmark,
        "div" | "pre" if is_codeblock(&style) => TagRole::Code,
        "pre" => TagRole::Code,
        "h1" => TagRole::Heading(1),
        "h2" => TagRole::Heading(2),
        "h3" | "h4" | "h5" | "h6" => TagRole::Heading(3),
        "ul" => TagRole::List {
            ordered: false,
            todo: style.flag("--en-todo"),
        },
        "ol" => TagRole::List {
            ordered: true,
            todo: false,
        },
        "blockquote" => TagRole::Quote,
        "hr" => TagRole::Divider,
        "table" => TagRole::Table,
        "en-media" => TagRole::Media,
        "img" if is_remote(element.attr("src")) => TagRole::ExternalImage,
        "img" => TagRole::Skip,
        "en-todo" => TagRole::TodoMarker,
        "en-crypt" => TagRole::Encrypted,
        "br" => TagRole::LineBreak,
        _ if SKIPPED_TAGS.contains(&name) => TagRole::Skip,
        _ if LINE_TAGS.contains(&name) => TagRole::Line,
        _ if INLINE_TAGS.contains(&name) => TagRole::Inline,
        _ => TagRole::Transparent,
    }
}

fn is_codeblock(style: &InlineStyle) -> bool {
    style.flag("-en-codeblock") || style.flag("--en-codeblock")
}

fn is_remote(src: Option<&str>) -> bool {
    src.map(|s| {
        let s = s.trim().to_ascii_lowercase();
        s.starts_with("http://") || s.starts_with("https://")
    })
    .unwrap_or(false)
}

/// Result of evaluating one block-producing element.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    /// The element produced these blocks (possibly none).
    Parsed(Vec<Block>),
    /// The element was deliberately ignored.
    Skipped,
    /// The element could not be represented; a stand-in block is emitted.
    Placeholder(Block),
}

impl ParseOutcome {
    pub fn into_blocks(self) -> Vec<Block> {
        match self {
            ParseOutcome::Parsed(blocks) => blocks,
            ParseOutcome::Skipped => Vec::new(),
            ParseOutcome::Placeholder(block) => vec![block],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn el(name: &str, attrs: &[(&str, &str)]) -> Element {
        let mut element = Element::new(name);
        for (key, value) in attrs {
            element.set_attr(key, *value);
        }
        element
    }

    #[test]
    fn test_structural_tags() {
        assert_eq!(role_of(&el("en-note", &[])), TagRole::Transparent);
        assert_eq!(role_of(&el("div", &[])), TagRole::Line);
        assert_eq!(role_of(&el("p", &[])), TagRole::Line);
        assert_eq!(role_of(&el("blockquote", &[])), TagRole::Quote);
        assert_eq!(role_of(&el("hr", &[])), TagRole::Divider);
        assert_eq!(role_of(&el("table", &[])), TagRole::Table);
        assert_eq!(role_of(&el("br", &[])), TagRole::LineBreak);
        assert_eq!(role_of(&el("made-up", &[])), TagRole::Transparent);
    }

    #[test]
    fn test_headings_clamp() {
        assert_eq!(role_of(&el("h1", &[])), TagRole::Heading(1));
        assert_eq!(role_of(&el("h2", &[])), TagRole::Heading(2));
        assert_eq!(role_of(&el("h6", &[])), TagRole::Heading(3));
    }

    #[test]
    fn test_attribute_predicates() {
        assert_eq!(
            role_of(&el("div", &[("style", "--en-richlink:true; --en-href:https://x.y")])),
            TagRole::Bookmark
        );
        assert_eq!(
            role_of(&el("div", &[("style", "-en-codeblock:true;")])),
            TagRole::Code
        );
        assert_eq!(
            role_of(&el("div", &[("style", "--en-codeblock:true")])),
            TagRole::Code
        );
        assert_eq!(role_of(&el("pre", &[])), TagRole::Code);
        assert_eq!(
            role_of(&el("ul", &[("style", "--en-todo:true;")])),
            TagRole::List {
                ordered: false,
                todo: true
            }
        );
        assert_eq!(
            role_of(&el("ol", &[])),
            TagRole::List {
                ordered: true,
                todo: false
            }
        );
    }

    #[test]
    fn test_media_tags() {
        assert_eq!(role_of(&el("en-media", &[("hash", "abc")])), TagRole::Media);
        assert_eq!(
            role_of(&el("img", &[("src", "https://example.com/a.png")])),
            TagRole::ExternalImage
        );
        assert_eq!(role_of(&el("img", &[("src", "data:image/png;base64,AA")])), TagRole::Skip);
        assert_eq!(role_of(&el("en-todo", &[])), TagRole::TodoMarker);
        assert_eq!(role_of(&el("en-crypt", &[])), TagRole::Encrypted);
    }

    #[test]
    fn test_inline_and_skipped() {
        for tag in ["b", "strong", "i", "em", "u", "s", "code", "a", "span", "font"] {
            assert_eq!(role_of(&el(tag, &[])), TagRole::Inline, "{}", tag);
        }
        for tag in ["script", "style", "head", "title", "object"] {
            assert_eq!(role_of(&el(tag, &[])), TagRole::Skip, "{}", tag);
        }
    }

    #[test]
    fn test_outcome_blocks() {
        assert!(ParseOutcome::Skipped.into_blocks().is_empty());
        assert_eq!(
            ParseOutcome::Placeholder(Block::empty_paragraph()).into_blocks().len(),
            1
        );
    }
}
