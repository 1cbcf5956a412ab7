// src/parser/builder.rs
//! Walks a note body and emits a flat list of blocks tagged with their
//! indentation level. Nesting is reconstructed afterwards.

use super::dispatch::{role_of, ParseOutcome, TagRole};
use super::dom::{Element, Node};
use super::formatting::apply_formatting;
use super::style::{parse_dimension, InlineStyle};
use super::tables::parse_table;
use crate::model::{
    Block, BlockCommon, BookmarkBlock, BulletedListItemBlock, CodeBlock, DividerBlock, FileBlock,
    ImageBlock, MediaContent, MediaSource, NumberedListItemBlock, PdfBlock, QuoteBlock, Resource,
    TextBlockContent,
};
use crate::model::find_resource;
use crate::types::{push_run, Annotations, RichTextItem};
use std::sync::Arc;

pub const ENCRYPTED_PLACEHOLDER: &str = "[Encrypted content]";

/// Formatting and indentation in effect at a point of the walk.
#[derive(Debug, Clone, Default)]
struct Context {
    indent: usize,
    ann: Annotations,
}

impl Context {
    fn descend(&self, element: &Element) -> Self {
        Self {
            indent: self.indent + own_indent(element),
            ann: apply_formatting(element, &self.ann),
        }
    }
}

fn own_indent(element: &Element) -> usize {
    element
        .attr("style")
        .map(|style| InlineStyle::parse(style).indent_level())
        .unwrap_or(0)
}

/// The text line being assembled.
#[derive(Debug, Default)]
struct Line {
    runs: Vec<RichTextItem>,
    started: bool,
    todo: Option<bool>,
    indent: usize,
}

impl Line {
    fn start(&mut self, indent: usize) {
        if !self.started {
            self.started = true;
            self.indent = indent;
        }
    }

    fn ends_with_space(&self) -> bool {
        self.runs
            .last()
            .map(|run| run.content.ends_with(' '))
            .unwrap_or(true)
    }
}

pub struct BlockBuilder<'a> {
    resources: &'a [Arc<Resource>],
    blocks: Vec<Block>,
    line: Line,
}

impl<'a> BlockBuilder<'a> {
    pub fn new(resources: &'a [Arc<Resource>]) -> Self {
        Self {
            resources,
            blocks: Vec::new(),
            line: Line::default(),
        }
    }

    /// Converts the children of `root` into flat blocks.
    pub fn build(self, root: &Element) -> Vec<Block> {
        self.build_with(root, &Context::default())
    }

    fn build_with(mut self, root: &Element, ctx: &Context) -> Vec<Block> {
        self.walk_children(root, ctx);
        self.flush_line();
        self.blocks
    }

    fn walk_children(&mut self, element: &Element, ctx: &Context) {
        for child in &element.children {
            match child {
                Node::Text(text) => self.push_text(text, ctx),
                Node::Element(el) => self.walk_element(el, ctx),
            }
        }
    }

    fn walk_element(&mut self, element: &Element, ctx: &Context) {
        match role_of(element) {
            TagRole::Skip => {}
            TagRole::Transparent => self.walk_children(element, &ctx.descend(element)),
            TagRole::Inline => {
                let inner = Context {
                    indent: ctx.indent,
                    ann: apply_formatting(element, &ctx.ann),
                };
                self.walk_children(element, &inner);
            }
            TagRole::LineBreak => self.break_line(ctx),
            TagRole::Line => {
                self.flush_line();
                self.walk_children(element, &ctx.descend(element));
                self.flush_line();
            }
            TagRole::TodoMarker => {
                if self.line.started {
                    self.flush_line();
                }
                let checked = element
                    .attr("checked")
                    .map(|v| v.eq_ignore_ascii_case("true"))
                    .unwrap_or(false);
                self.line.start(ctx.indent);
                self.line.todo = Some(checked);
            }
            role => {
                self.flush_line();
                let outcome = self.evaluate(role, element, ctx);
                if outcome == ParseOutcome::Skipped {
                    log::trace!("Skipped <{}>", element.name);
                }
                self.blocks.extend(outcome.into_blocks());
            }
        }
    }

    /// Builds the blocks of a block-level element.
    fn evaluate(&self, role: TagRole, element: &Element, ctx: &Context) -> ParseOutcome {
        let inner = ctx.descend(element);
        let indent = inner.indent;

        match role {
            TagRole::Heading(level) => text_block(inline_runs(element, &inner.ann), |runs| {
                Block::heading(level, runs).with_indent(indent)
            }),
            TagRole::Quote => text_block(inline_runs(element, &inner.ann), |runs| {
                Block::Quote(QuoteBlock {
                    common: BlockCommon::at_level(indent),
                    content: TextBlockContent::new(runs),
                })
            }),
            TagRole::Code => {
                let text = code_text(element);
                if text.trim().is_empty() {
                    return ParseOutcome::Skipped;
                }
                ParseOutcome::Parsed(vec![Block::Code(CodeBlock {
                    common: BlockCommon::at_level(indent),
                    language: "plain text".to_string(),
                    content: TextBlockContent::new(vec![RichTextItem::plain_text(&text)]),
                })])
            }
            TagRole::Divider => ParseOutcome::Parsed(vec![Block::Divider(DividerBlock {
                common: BlockCommon::at_level(ctx.indent),
            })]),
            TagRole::Table => match parse_table(element, &inner.ann) {
                Some(table) => ParseOutcome::Parsed(vec![table.with_indent(indent)]),
                None => ParseOutcome::Skipped,
            },
            TagRole::List { ordered, todo } => {
                ParseOutcome::Parsed(list_items(element, indent, ordered, todo, &inner.ann))
            }
            TagRole::Media => self.media_block(element, ctx.indent),
            TagRole::ExternalImage => {
                let src = element.attr("src").unwrap_or_default().trim().to_string();
                let (width, height) = media_dimensions(element);
                ParseOutcome::Parsed(vec![Block::Image(ImageBlock {
                    common: BlockCommon::at_level(ctx.indent),
                    media: MediaContent {
                        source: MediaSource::External(src),
                        width,
                        height,
                    },
                })])
            }
            TagRole::Bookmark => match bookmark(element, indent) {
                Some(block) => ParseOutcome::Parsed(vec![block]),
                None => ParseOutcome::Parsed(
                    BlockBuilder::new(self.resources).build_with(element, &inner),
                ),
            },
            TagRole::Encrypted => ParseOutcome::Placeholder(
                Block::paragraph(vec![RichTextItem::plain_text(ENCRYPTED_PLACEHOLDER)])
                    .with_indent(ctx.indent),
            ),
            TagRole::Skip => ParseOutcome::Skipped,
            TagRole::Transparent
            | TagRole::Inline
            | TagRole::Line
            | TagRole::LineBreak
            | TagRole::TodoMarker => {
                ParseOutcome::Parsed(BlockBuilder::new(self.resources).build_with(element, ctx))
            }
        }
    }

    fn media_block(&self, element: &Element, indent: usize) -> ParseOutcome {
        let hash = element.attr("hash").unwrap_or_default().trim();

        let Some(resource) = find_resource(self.resources, hash) else {
            let name = if hash.is_empty() { "unknown" } else { hash };
            log::debug!("Attachment {} is referenced but not embedded", name);
            return ParseOutcome::Placeholder(
                Block::paragraph(vec![RichTextItem::plain_text(&format!(
                    "[Missing attachment: {}]",
                    name
                ))])
                .with_indent(indent),
            );
        };

        let (width, height) = media_dimensions(element);
        let media = MediaContent {
            source: MediaSource::Attachment(Arc::clone(resource)),
            width,
            height,
        };
        let common = BlockCommon::at_level(indent);
        let (is_image, is_pdf) = if resource.mime.is_empty() {
            let declared = element.attr("type").unwrap_or_default();
            (declared.starts_with("image/"), declared == "application/pdf")
        } else {
            (resource.is_image(), resource.is_pdf())
        };

        let block = if is_image {
            Block::Image(ImageBlock { common, media })
        } else if is_pdf {
            Block::Pdf(PdfBlock { common, media })
        } else {
            Block::File(FileBlock { common, media })
        };
        ParseOutcome::Parsed(vec![block])
    }

    fn push_text(&mut self, text: &str, ctx: &Context) {
        let mut collapsed = collapse_whitespace(text);
        if self.line.ends_with_space() || !self.line.started {
            collapsed = collapsed.trim_start_matches(' ').to_string();
        }
        if collapsed.is_empty() {
            return;
        }
        self.line.start(ctx.indent);
        push_run(
            &mut self.line.runs,
            RichTextItem::styled(collapsed.replace('\u{a0}', " "), ctx.ann.clone()),
        );
    }

    fn break_line(&mut self, ctx: &Context) {
        if !self.line.started {
            self.line.start(ctx.indent);
        }
        self.flush_line();
    }

    fn flush_line(&mut self) {
        let line = std::mem::take(&mut self.line);
        if !line.started {
            return;
        }
        let runs = trim_runs(line.runs);
        let block = match line.todo {
            Some(checked) => Block::todo(runs, checked),
            None => Block::paragraph(runs),
        };
        self.blocks.push(block.with_indent(line.indent));
    }
}

fn text_block(runs: Vec<RichTextItem>, make: impl FnOnce(Vec<RichTextItem>) -> Block) -> ParseOutcome {
    if runs.is_empty() {
        ParseOutcome::Skipped
    } else {
        ParseOutcome::Parsed(vec![make(runs)])
    }
}

fn list_items(
    list: &Element,
    indent: usize,
    ordered: bool,
    todo: bool,
    ann: &Annotations,
) -> Vec<Block> {
    let mut blocks = Vec::new();

    for child in list.child_elements() {
        if let TagRole::List {
            ordered: nested_ordered,
            todo: nested_todo,
        } = role_of(child)
        {
            let inner = apply_formatting(child, ann);
            blocks.extend(list_items(child, indent + 1, nested_ordered, nested_todo, &inner));
            continue;
        }
        if child.name != "li" {
            continue;
        }

        let item_ann = apply_formatting(child, ann);
        let mut runs = Vec::new();
        let mut nested = Vec::new();
        for node in &child.children {
            match node {
                Node::Element(el) if matches!(role_of(el), TagRole::List { .. }) => nested.push(el),
                other => collect_inline_node(other, &item_ann, &mut runs),
            }
        }
        let runs = trim_runs(runs);

        let content = TextBlockContent::new(runs);
        let common = BlockCommon::at_level(indent);
        let item_style = child.attr("style").map(InlineStyle::parse).unwrap_or_default();
        let block = if todo {
            Block::todo(content.rich_text, item_style.flag("--en-checked")).with_indent(indent)
        } else if ordered {
            Block::NumberedListItem(NumberedListItemBlock { common, content })
        } else {
            Block::BulletedListItem(BulletedListItemBlock { common, content })
        };
        blocks.push(block);

        for list in nested {
            if let TagRole::List {
                ordered: nested_ordered,
                todo: nested_todo,
            } = role_of(list)
            {
                let inner = apply_formatting(list, &item_ann);
                blocks.extend(list_items(list, indent + 1, nested_ordered, nested_todo, &inner));
            }
        }
    }

    blocks
}

fn bookmark(element: &Element, indent: usize) -> Option<Block> {
    let style = element.attr("style").map(InlineStyle::parse).unwrap_or_default();
    let anchor = element.find("a");

    let url = style
        .get("--en-href")
        .map(strip_quotes)
        .filter(|u| !u.is_empty())
        .or_else(|| anchor.and_then(|a| a.attr("href")).map(|h| h.trim().to_string()))
        .filter(|u| !u.is_empty())?;

    let title = style
        .get("--en-title")
        .map(strip_quotes)
        .filter(|t| !t.is_empty())
        .or_else(|| {
            anchor
                .map(|a| collapse_whitespace(&a.text()).trim().to_string())
                .filter(|t| !t.is_empty())
        });

    Some(Block::Bookmark(BookmarkBlock {
        common: BlockCommon::at_level(indent),
        url,
        title,
    }))
}

fn strip_quotes(value: &str) -> String {
    value
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim()
        .to_string()
}

fn media_dimensions(element: &Element) -> (Option<u32>, Option<u32>) {
    let style = element.attr("style").map(InlineStyle::parse).unwrap_or_default();
    let dimension = |attr: &str, natural: &str| {
        element
            .attr(attr)
            .and_then(parse_dimension)
            .or_else(|| style.get(attr).and_then(parse_dimension))
            .or_else(|| style.get(natural).and_then(parse_dimension))
    };
    (
        dimension("width", "--en-naturalwidth"),
        dimension("height", "--en-naturalheight"),
    )
}

/// Text of a code block with line structure kept.
fn code_text(element: &Element) -> String {
    let preformatted = element.name == "pre";
    let mut out = String::new();
    collect_code(element, preformatted, &mut out);
    let text = out.strip_prefix('\n').unwrap_or(&out);
    text.trim_end_matches('\n').to_string()
}

fn collect_code(element: &Element, preformatted: bool, out: &mut String) {
    for child in &element.children {
        match child {
            Node::Text(text) => {
                if !preformatted && text.trim().is_empty() && text.contains('\n') {
                    continue;
                }
                out.push_str(&text.replace('\u{a0}', " "));
            }
            Node::Element(el) => match role_of(el) {
                TagRole::LineBreak => out.push('\n'),
                TagRole::Skip => {}
                TagRole::Inline | TagRole::Transparent => collect_code(el, preformatted, out),
                _ => {
                    if !out.is_empty() && !out.ends_with('\n') {
                        out.push('\n');
                    }
                    collect_code(el, preformatted, out);
                    if !out.ends_with('\n') {
                        out.push('\n');
                    }
                }
            },
        }
    }
}

/// Rich text of an element whose block-level descendants are flattened
/// into lines separated by `"\n"`.
pub(super) fn inline_runs(element: &Element, ann: &Annotations) -> Vec<RichTextItem> {
    let mut runs = Vec::new();
    for child in &element.children {
        collect_inline_node(child, ann, &mut runs);
    }
    trim_runs(runs)
}

fn collect_inline_node(node: &Node, ann: &Annotations, runs: &mut Vec<RichTextItem>) {
    match node {
        Node::Text(text) => {
            let mut collapsed = collapse_whitespace(text);
            let at_line_start = runs
                .last()
                .map(|r| r.content.ends_with('\n') || r.content.ends_with(' '))
                .unwrap_or(true);
            if at_line_start {
                collapsed = collapsed.trim_start_matches(' ').to_string();
            }
            if !collapsed.is_empty() {
                push_run(
                    runs,
                    RichTextItem::styled(collapsed.replace('\u{a0}', " "), ann.clone()),
                );
            }
        }
        Node::Element(el) => match role_of(el) {
            TagRole::Skip
            | TagRole::Media
            | TagRole::ExternalImage
            | TagRole::TodoMarker
            | TagRole::Encrypted
            | TagRole::Divider => {}
            TagRole::LineBreak => push_run(runs, RichTextItem::line_break()),
            TagRole::Inline | TagRole::Transparent => {
                let inner = apply_formatting(el, ann);
                for child in &el.children {
                    collect_inline_node(child, &inner, runs);
                }
            }
            _ => {
                let inner = apply_formatting(el, ann);
                end_line(runs);
                for child in &el.children {
                    collect_inline_node(child, &inner, runs);
                }
                end_line(runs);
            }
        },
    }
}

fn end_line(runs: &mut Vec<RichTextItem>) {
    let needs_break = runs
        .last()
        .map(|r| !r.content.ends_with('\n'))
        .unwrap_or(false);
    if needs_break {
        // Trailing spaces before a break carry no meaning.
        if let Some(last) = runs.last_mut() {
            let trimmed = last.content.trim_end_matches(' ').len();
            last.content.truncate(trimmed);
        }
        runs.retain(|r| !r.content.is_empty());
        push_run(runs, RichTextItem::line_break());
    }
}

/// Collapses runs of ASCII whitespace to one space. Non-breaking spaces are
/// content and survive.
pub(super) fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_ascii_whitespace() {
            if !in_space {
                out.push(' ');
                in_space = true;
            }
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

/// Strips leading and trailing whitespace and line breaks from a run list.
pub(super) fn trim_runs(mut runs: Vec<RichTextItem>) -> Vec<RichTextItem> {
    while let Some(first) = runs.first_mut() {
        let trimmed = first.content.trim_start_matches([' ', '\n']).to_string();
        if trimmed.is_empty() {
            runs.remove(0);
        } else {
            first.content = trimmed;
            break;
        }
    }
    while let Some(last) = runs.last_mut() {
        let len = last.content.trim_end_matches([' ', '\n']).len();
        if len == 0 {
            runs.pop();
        } else {
            last.content.truncate(len);
            break;
        }
    }
    runs
}
