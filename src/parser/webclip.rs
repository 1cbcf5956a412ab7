// src/parser/webclip.rs
//! Web clips are imported as a single block: plain text or a rendered PDF.

use super::dispatch::{role_of, TagRole};
use super::dom::{parse_html, Element, Node};
use crate::config::{Rules, WebClipMode};
use crate::error::AppError;
use crate::model::{Block, BlockCommon, ImageBlock, MediaContent, Note, PdfBlock, Resource};
use crate::render::HtmlRenderer;
use crate::types::RichTextItem;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::sync::Arc;

pub fn webclip_blocks(
    note: &Note,
    rules: &Rules,
    renderer: Option<&dyn HtmlRenderer>,
) -> Result<Vec<Block>, AppError> {
    match rules.mode_webclips {
        WebClipMode::Txt => {
            let text = clip_text(&note.content);
            if text.is_empty() {
                return Ok(Vec::new());
            }
            Ok(vec![Block::paragraph(vec![RichTextItem::plain_text(&text)])])
        }
        WebClipMode::Pdf => {
            let renderer = renderer.ok_or_else(|| {
                AppError::MissingRenderer("PDF web clips need wkhtmltopdf".to_string())
            })?;
            pdf_blocks(note, rules.add_pdf_preview, renderer)
        }
    }
}

fn pdf_blocks(
    note: &Note,
    add_preview: bool,
    renderer: &dyn HtmlRenderer,
) -> Result<Vec<Block>, AppError> {
    let html = printable_html(&note.content, &note.resources);
    let base_name = file_safe(&note.title);
    let mut blocks = Vec::new();

    let pdf = renderer.render_pdf(&html)?;
    log::debug!("Rendered web clip '{}' to {} byte PDF", note.title, pdf.len());

    if add_preview {
        let png = renderer.render_preview(&html)?;
        let preview = Resource::new(png, "image/png", Some(format!("{}.png", base_name)));
        blocks.push(Block::Image(ImageBlock {
            common: BlockCommon::default(),
            media: MediaContent::attachment(Arc::new(preview)),
        }));
    }

    let document = Resource::new(pdf, "application/pdf", Some(format!("{}.pdf", base_name)));
    blocks.push(Block::Pdf(PdfBlock {
        common: BlockCommon::default(),
        media: MediaContent::attachment(Arc::new(document)),
    }));
    Ok(blocks)
}

fn file_safe(title: &str) -> String {
    title
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' => '_',
            other => other,
        })
        .collect()
}

/// Standalone HTML document for the renderer, with embedded images
/// inlined as `data:` URIs.
pub fn printable_html(content: &str, resources: &[Arc<Resource>]) -> String {
    let root = parse_html(content);
    let mut body = match root.find("en-note") {
        Some(note) => note.clone(),
        None => root,
    };
    body.name = "div".to_string();
    inline_media(&mut body, resources);

    format!(
        "<!DOCTYPE html><html><head><meta charset=\"UTF-8\"/></head><body>{}</body></html>",
        body.to_html()
    )
}

fn inline_media(element: &mut Element, resources: &[Arc<Resource>]) {
    for child in element.children.iter_mut() {
        if let Node::Element(el) = child {
            if el.name == "en-media" {
                if let Some(img) = data_uri_image(el, resources) {
                    *el = img;
                }
                continue;
            }
            inline_media(el, resources);
        }
    }
}

fn data_uri_image(media: &Element, resources: &[Arc<Resource>]) -> Option<Element> {
    let hash = media.attr("hash")?.trim();
    let resource = resources
        .iter()
        .find(|r| r.md5.eq_ignore_ascii_case(hash))
        .filter(|r| r.is_image())?;

    let mut img = Element::new("img");
    img.set_attr(
        "src",
        format!("data:{};base64,{}", resource.mime, STANDARD.encode(&resource.data)),
    );
    for attr in ["width", "height", "style", "alt"] {
        if let Some(value) = media.attr(attr) {
            img.set_attr(attr, value);
        }
    }
    Some(img)
}

/// Whitespace-normalized text of a clip: block elements on their own
/// lines, at most one blank line in a row.
pub fn clip_text(content: &str) -> String {
    let root = parse_html(content);
    let body = root.find("en-note").unwrap_or(&root);
    let mut raw = String::new();
    collect_text(body, &mut raw);

    let mut lines: Vec<String> = Vec::new();
    let mut blank = false;
    for line in raw.split('\n') {
        let line = line.replace('\u{a0}', " ");
        let line = line.trim();
        if line.is_empty() {
            blank = !lines.is_empty();
            continue;
        }
        if blank {
            lines.push(String::new());
            blank = false;
        }
        lines.push(line.to_string());
    }
    lines.join("\n")
}

fn collect_text(element: &Element, out: &mut String) {
    for child in &element.children {
        match child {
            Node::Text(text) => {
                let mut previous_space = out.ends_with(' ') || out.ends_with('\n');
                for c in text.chars() {
                    if c.is_ascii_whitespace() {
                        if !previous_space {
                            out.push(' ');
                        }
                        previous_space = true;
                    } else {
                        out.push(c);
                        previous_space = false;
                    }
                }
            }
            Node::Element(el) => match role_of(el) {
                TagRole::Skip | TagRole::Media | TagRole::Encrypted => {}
                TagRole::LineBreak => out.push('\n'),
                TagRole::Inline | TagRole::Transparent | TagRole::TodoMarker => {
                    collect_text(el, out)
                }
                _ => {
                    end_line(out);
                    collect_text(el, out);
                    end_line(out);
                }
            },
        }
    }
}

fn end_line(out: &mut String) {
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}
