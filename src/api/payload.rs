// src/api/payload.rs
//! Lowering of blocks and note metadata into Notion request bodies.

use super::files::sizeof_fmt;
use crate::constants::{NOTION_MAX_RICH_TEXT_ITEMS, NOTION_MAX_TEXT_LENGTH};
use crate::model::{Block, MediaContent, Note, TextBlockContent};
use crate::types::{Color, FileUploadId, RichTextItem};
use indexmap::IndexMap;
use serde_json::{json, Map, Value};

pub const PROP_TITLE: &str = "Title";
pub const PROP_TAGS: &str = "Tags";
pub const PROP_URL: &str = "URL";
pub const PROP_CREATED: &str = "Created";
pub const PROP_UPDATED: &str = "Updated";

/// How a media block refers to its bytes.
#[derive(Debug, Clone, Copy)]
pub enum MediaRef<'a> {
    Upload(&'a FileUploadId),
    External(&'a str),
}

/// Lowers one block into one or more request objects.
///
/// Text blocks with more than 100 rich text items are split into several
/// consecutive blocks of the same kind. Children are not included, except
/// the rows of a table.
pub fn block_payloads(block: &Block, media: Option<MediaRef<'_>>) -> Vec<Value> {
    match block {
        Block::Paragraph(b) => text_payloads("paragraph", &b.content, Map::new()),
        Block::Heading1(b) => text_payloads("heading_1", &b.content, Map::new()),
        Block::Heading2(b) => text_payloads("heading_2", &b.content, Map::new()),
        Block::Heading3(b) => text_payloads("heading_3", &b.content, Map::new()),
        Block::BulletedListItem(b) => text_payloads("bulleted_list_item", &b.content, Map::new()),
        Block::NumberedListItem(b) => text_payloads("numbered_list_item", &b.content, Map::new()),
        Block::ToDo(b) => {
            let mut extra = Map::new();
            extra.insert("checked".into(), json!(b.checked));
            text_payloads("to_do", &b.content, extra)
        }
        Block::Quote(b) => text_payloads("quote", &b.content, Map::new()),
        Block::Code(b) => {
            let mut extra = Map::new();
            extra.insert("language".into(), json!(b.language));
            text_payloads("code", &b.content, extra)
        }
        Block::Divider(_) => vec![wrap("divider", json!({}))],
        Block::Table(table) => {
            let rows: Vec<Value> = table
                .cell_matrix()
                .iter()
                .map(|cells| table_row_payload(cells))
                .collect();
            vec![wrap(
                "table",
                json!({
                    "table_width": table.table_width,
                    "has_column_header": table.has_column_header,
                    "has_row_header": false,
                    "children": rows,
                }),
            )]
        }
        Block::TableRow(row) => vec![table_row_payload(&row.cells)],
        Block::Image(b) => media_payload("image", &b.media, media, false),
        Block::Pdf(b) => media_payload("pdf", &b.media, media, false),
        Block::File(b) => media_payload("file", &b.media, media, true),
        Block::Bookmark(b) => {
            let caption = b
                .title
                .as_deref()
                .map(|title| rich_text_payload(&[RichTextItem::plain_text(title)]))
                .unwrap_or_default();
            vec![wrap("bookmark", json!({ "url": b.url, "caption": caption }))]
        }
    }
}

fn wrap(block_type: &str, body: Value) -> Value {
    json!({
        "object": "block",
        "type": block_type,
        block_type: body,
    })
}

fn text_payloads(block_type: &str, content: &TextBlockContent, extra: Map<String, Value>) -> Vec<Value> {
    let color = content.color.map(|c| c.as_str()).unwrap_or("default");
    let items = rich_text_payload(&content.rich_text);

    let chunks: Vec<Vec<Value>> = if items.is_empty() {
        vec![Vec::new()]
    } else {
        items
            .chunks(NOTION_MAX_RICH_TEXT_ITEMS)
            .map(<[Value]>::to_vec)
            .collect()
    };

    chunks
        .into_iter()
        .map(|chunk| {
            let mut body = extra.clone();
            body.insert("rich_text".into(), Value::Array(chunk));
            if block_type != "code" {
                body.insert("color".into(), json!(color));
            }
            wrap(block_type, Value::Object(body))
        })
        .collect()
}

fn table_row_payload(cells: &[Vec<RichTextItem>]) -> Value {
    let cells: Vec<Value> = cells
        .iter()
        .map(|cell| {
            let mut items = rich_text_payload(cell);
            items.truncate(NOTION_MAX_RICH_TEXT_ITEMS);
            Value::Array(items)
        })
        .collect();
    wrap("table_row", json!({ "cells": cells }))
}

fn media_payload(
    block_type: &str,
    content: &MediaContent,
    media: Option<MediaRef<'_>>,
    with_size_caption: bool,
) -> Vec<Value> {
    let mut body = match media {
        Some(MediaRef::Upload(id)) => json!({
            "type": "file_upload",
            "file_upload": { "id": id.to_dashed() },
        }),
        Some(MediaRef::External(url)) => json!({
            "type": "external",
            "external": { "url": url },
        }),
        None => return Vec::new(),
    };

    if with_size_caption {
        if let Some(resource) = content.resource() {
            let caption = rich_text_payload(&[RichTextItem::plain_text(&sizeof_fmt(
                resource.size() as u64,
            ))]);
            body["caption"] = Value::Array(caption);
        }
    }
    vec![wrap(block_type, body)]
}

/// Rich text array with every run cut into pieces Notion accepts.
pub fn rich_text_payload(runs: &[RichTextItem]) -> Vec<Value> {
    let mut items = Vec::new();
    for run in runs {
        for piece in split_text(&run.content, NOTION_MAX_TEXT_LENGTH) {
            items.push(text_item(piece, run));
        }
    }
    items
}

fn text_item(content: &str, run: &RichTextItem) -> Value {
    let ann = &run.annotations;
    let link = ann.link.as_ref().map(|url| json!({ "url": url }));
    json!({
        "type": "text",
        "text": { "content": content, "link": link },
        "annotations": {
            "bold": ann.bold,
            "italic": ann.italic,
            "strikethrough": ann.strikethrough,
            "underline": ann.underline,
            "code": ann.code,
            "color": annotation_color(ann.color, ann.background),
        },
    })
}

/// Background wins over foreground; Notion holds one color per run.
fn annotation_color(color: Option<Color>, background: Option<Color>) -> &'static str {
    match (background, color) {
        (Some(bg), _) => bg.as_background_str(),
        (None, Some(fg)) => fg.as_str(),
        (None, None) => "default",
    }
}

/// Splits text into pieces of at most `limit` characters.
fn split_text(text: &str, limit: usize) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        let end = rest
            .char_indices()
            .nth(limit)
            .map(|(index, _)| index)
            .unwrap_or(rest.len());
        pieces.push(&rest[..end]);
        rest = &rest[end..];
    }
    pieces
}

// --- Pages and databases ---

/// Properties of a plain child page.
pub fn page_title_properties(title_property: &str, title: &str) -> Value {
    json!({ title_property: { "title": title_payload(title) } })
}

fn title_payload(title: &str) -> Vec<Value> {
    rich_text_payload(&[RichTextItem::plain_text(title)])
}

/// Properties of a database row for a note.
pub fn note_row_properties(title_property: &str, title: &str, note: &Note) -> Value {
    let tags: Vec<Value> = note
        .tags
        .iter()
        .map(|tag| json!({ "name": tag.replace(',', " ") }))
        .collect();

    let mut properties = Map::new();
    properties.insert(title_property.into(), json!({ "title": title_payload(title) }));
    properties.insert(PROP_TAGS.into(), json!({ "multi_select": tags }));
    properties.insert(
        PROP_URL.into(),
        json!({ "url": note.url.as_deref().filter(|u| !u.is_empty()) }),
    );
    properties.insert(
        PROP_CREATED.into(),
        json!({ "date": { "start": note.created.to_rfc3339() } }),
    );
    properties.insert(
        PROP_UPDATED.into(),
        json!({ "date": { "start": note.updated.to_rfc3339() } }),
    );
    Value::Object(properties)
}

/// Schema of a notebook database, in column order.
pub fn database_schema() -> IndexMap<String, Value> {
    let mut schema = IndexMap::new();
    schema.insert(PROP_TITLE.to_string(), json!({ "title": {} }));
    schema.insert(PROP_TAGS.to_string(), json!({ "multi_select": {} }));
    schema.insert(PROP_URL.to_string(), json!({ "url": {} }));
    schema.insert(PROP_CREATED.to_string(), json!({ "date": {} }));
    schema.insert(PROP_UPDATED.to_string(), json!({ "date": {} }));
    schema
}

/// Notion property type a schema entry declares.
pub fn schema_kind(config: &Value) -> Option<&str> {
    config.as_object()?.keys().next().map(String::as_str)
}
