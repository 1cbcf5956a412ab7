// src/parser/postprocess.rs
//! Tree rewrites applied after parsing: line condensing and the metadata
//! header.

use crate::config::CondenseMode;
use crate::model::{Block, Note, ParagraphBlock, TextBlockContent};
use crate::types::{push_run, Annotations, Color, RichTextItem};

const META_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Merges consecutive plain paragraphs, recursively through children.
pub fn condense_lines(blocks: Vec<Block>, mode: CondenseMode) -> Vec<Block> {
    match mode {
        CondenseMode::Off => blocks,
        CondenseMode::Condensed => condense_siblings(blocks, false),
        CondenseMode::Sparse => condense_siblings(blocks, true),
    }
}

fn condense_siblings(blocks: Vec<Block>, sparse: bool) -> Vec<Block> {
    let mut merger = LineMerger::new(sparse);

    for mut block in blocks {
        let children = block.take_children();
        block.set_children(condense_siblings(children, sparse));

        if !is_plain_paragraph(&block) {
            merger.emit(block);
            continue;
        }
        if block.is_empty_paragraph() && block.children().is_empty() {
            merger.separator();
            continue;
        }

        let closes_group = !block.children().is_empty();
        merger.group.push(block);
        if closes_group {
            merger.close_group();
        }
    }

    merger.finish()
}

fn is_plain_paragraph(block: &Block) -> bool {
    matches!(block, Block::Paragraph(p) if p.content.color.is_none())
}

struct LineMerger {
    sparse: bool,
    out: Vec<Block>,
    group: Vec<Block>,
    gap: bool,
}

impl LineMerger {
    fn new(sparse: bool) -> Self {
        Self {
            sparse,
            out: Vec::new(),
            group: Vec::new(),
            gap: false,
        }
    }

    fn separator(&mut self) {
        self.close_group();
        self.gap = true;
    }

    fn emit(&mut self, block: Block) {
        self.close_group();
        self.push(block);
    }

    fn push(&mut self, block: Block) {
        if self.sparse && self.gap && !self.out.is_empty() {
            self.out.push(Block::empty_paragraph());
        }
        self.gap = false;
        self.out.push(block);
    }

    fn close_group(&mut self) {
        if self.group.is_empty() {
            return;
        }
        let group = std::mem::take(&mut self.group);
        let merged = merge_paragraphs(group);
        self.push(merged);
    }

    fn finish(mut self) -> Vec<Block> {
        self.close_group();
        self.out
    }
}

/// Joins paragraphs with line breaks; the result adopts the last
/// paragraph's indent and children.
fn merge_paragraphs(group: Vec<Block>) -> Block {
    let mut runs = Vec::new();
    let mut indent = 0;
    let mut children = Vec::new();

    for (i, mut block) in group.into_iter().enumerate() {
        if i > 0 {
            push_run(&mut runs, RichTextItem::line_break());
        }
        indent = block.indent_level();
        children = block.take_children();
        if let Block::Paragraph(ParagraphBlock { content, .. }) = block {
            for run in content.rich_text {
                push_run(&mut runs, run);
            }
        }
    }

    let mut merged = Block::paragraph(runs).with_indent(indent);
    merged.set_children(children);
    merged
}

/// Paragraph summarizing the note's metadata, rendered gray.
pub fn metadata_block(note: &Note) -> Block {
    let mut lines: Vec<(&str, Vec<RichTextItem>)> = vec![
        (
            "Created",
            vec![RichTextItem::plain_text(
                &note.created.format(META_DATE_FORMAT).to_string(),
            )],
        ),
        (
            "Updated",
            vec![RichTextItem::plain_text(
                &note.updated.format(META_DATE_FORMAT).to_string(),
            )],
        ),
    ];

    if !note.tags.is_empty() {
        lines.push(("Tags", vec![RichTextItem::plain_text(&note.tags.join(", "))]));
    }
    if let Some(author) = note.author.as_deref().filter(|a| !a.is_empty()) {
        lines.push(("Author", vec![RichTextItem::plain_text(author)]));
    }
    if let Some(url) = note.url.as_deref().filter(|u| !u.is_empty()) {
        let link = Annotations {
            link: Some(url.to_string()),
            ..Default::default()
        };
        lines.push(("URL", vec![RichTextItem::styled(url, link)]));
    }

    let bold = Annotations {
        bold: true,
        ..Default::default()
    };
    let mut runs = Vec::new();
    for (i, (label, value)) in lines.into_iter().enumerate() {
        if i > 0 {
            push_run(&mut runs, RichTextItem::line_break());
        }
        push_run(&mut runs, RichTextItem::styled(format!("{}: ", label), bold.clone()));
        for run in value {
            push_run(&mut runs, run);
        }
    }

    Block::Paragraph(ParagraphBlock {
        common: Default::default(),
        content: TextBlockContent {
            rich_text: runs,
            color: Some(Color::Gray),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::plain_text_of;
    use chrono::{TimeZone, Utc};

    fn para(text: &str) -> Block {
        Block::paragraph(vec![RichTextItem::plain_text(text)])
    }

    fn texts(blocks: &[Block]) -> Vec<String> {
        blocks
            .iter()
            .map(|b| plain_text_of(&b.text_content().unwrap().rich_text))
            .collect()
    }

    fn sample() -> Vec<Block> {
        vec![
            para("a"),
            para("b"),
            Block::empty_paragraph(),
            Block::empty_paragraph(),
            para("c"),
            Block::heading(1, vec![RichTextItem::plain_text("h")]),
            para("d"),
            Block::empty_paragraph(),
        ]
    }

    #[test]
    fn test_off_leaves_tree() {
        assert_eq!(condense_lines(sample(), CondenseMode::Off), sample());
    }

    #[test]
    fn test_condensed() {
        let out = condense_lines(sample(), CondenseMode::Condensed);
        assert_eq!(texts(&out), vec!["a\nb", "c", "h", "d"]);
    }

    #[test]
    fn test_sparse_keeps_one_separator() {
        let out = condense_lines(sample(), CondenseMode::Sparse);
        assert_eq!(texts(&out), vec!["a\nb", "", "c", "h", "d"]);
    }

    #[test]
    fn test_paragraph_with_children_closes_group() {
        let mut parent = para("b");
        parent.set_children(vec![para("x"), para("y")]);
        let out = condense_lines(vec![para("a"), parent, para("c")], CondenseMode::Condensed);

        assert_eq!(texts(&out), vec!["a\nb", "c"]);
        assert_eq!(texts(out[0].children()), vec!["x\ny"]);
    }

    #[test]
    fn test_condensing_is_idempotent() {
        let once = condense_lines(sample(), CondenseMode::Sparse);
        let twice = condense_lines(once.clone(), CondenseMode::Sparse);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_metadata_block() {
        let created = Utc.with_ymd_and_hms(2021, 3, 4, 5, 6, 7).unwrap();
        let note = Note::new(
            "t".into(),
            created,
            created,
            String::new(),
            vec!["one".into(), "two".into()],
            None,
            Some("https://example.com".into()),
            false,
            Vec::new(),
        );
        let block = metadata_block(&note);
        let content = block.text_content().unwrap();

        assert_eq!(content.color, Some(Color::Gray));
        assert_eq!(
            plain_text_of(&content.rich_text),
            "Created: 2021-03-04 05:06:07\nUpdated: 2021-03-04 05:06:07\nTags: one, two\nURL: https://example.com"
        );
        assert!(content.rich_text[0].annotations.bold);
        let url_run = content.rich_text.last().unwrap();
        assert_eq!(url_run.annotations.link.as_deref(), Some("https://example.com"));
    }
}
