// src/parser/mod.rs
//! Conversion of note bodies (ENML) into Notion block trees.
//!
//! The body is read into a forgiving DOM, walked into a flat list of blocks
//! tagged with indentation levels, nested by indentation, and finally
//! post-processed according to the run's rules.

mod builder;
mod dispatch;
mod dom;
mod formatting;
mod indent;
mod postprocess;
mod style;
mod tables;
mod webclip;

pub use builder::{BlockBuilder, ENCRYPTED_PLACEHOLDER};
pub use dispatch::{role_of, ParseOutcome, TagRole};
pub use dom::{parse_html, Element, Node};
pub use indent::nest_by_indent;
pub use postprocess::{condense_lines, metadata_block};
pub use style::{parse_color, InlineStyle};
pub use webclip::{clip_text, printable_html};

use crate::config::Rules;
use crate::error::AppError;
use crate::model::{Block, Note, Resource};
use crate::render::HtmlRenderer;
use std::sync::Arc;

/// Parses an ENML body into root blocks.
pub fn parse_note_blocks(html: &str, resources: &[Arc<Resource>], rules: &Rules) -> Vec<Block> {
    let document = parse_html(html);
    let body = document.find("en-note").unwrap_or(&document);
    let flat = BlockBuilder::new(resources).build(body);
    let nested = nest_by_indent(flat);
    condense_lines(nested, rules.condense_lines)
}

/// Parses a whole note, applying web clip handling and the metadata header.
pub fn parse_note(
    note: &Note,
    rules: &Rules,
    renderer: Option<&dyn HtmlRenderer>,
) -> Result<Vec<Block>, AppError> {
    let mut blocks = if note.is_webclip {
        webclip::webclip_blocks(note, rules, renderer)?
    } else {
        parse_note_blocks(&note.content, &note.resources, rules)
    };

    if blocks.is_empty() {
        return Ok(blocks);
    }

    if rules.add_meta {
        blocks.insert(0, metadata_block(note));
    }

    log::trace!("Parsed note '{}' into {} root blocks", note.title, blocks.len());
    Ok(blocks)
}
