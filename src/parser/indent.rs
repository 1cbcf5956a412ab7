// src/parser/indent.rs
use crate::model::Block;

/// Re-parents a flat, indent-tagged block list into a tree.
///
/// A block at level N becomes a child of the nearest preceding block at
/// level N-1. Missing intermediate levels are filled with empty paragraphs
/// so that tree depth always equals indent level.
pub fn nest_by_indent(flat: Vec<Block>) -> Vec<Block> {
    let mut roots = Vec::new();
    let mut open: Vec<Block> = Vec::new();

    for block in flat {
        let level = block.indent_level();

        while open.len() > level {
            close_last(&mut open, &mut roots);
        }
        while open.len() < level {
            let filler = Block::empty_paragraph().with_indent(open.len());
            open.push(filler);
        }
        open.push(block);
    }

    while !open.is_empty() {
        close_last(&mut open, &mut roots);
    }
    roots
}

fn close_last(open: &mut Vec<Block>, roots: &mut Vec<Block>) {
    let Some(block) = open.pop() else {
        return;
    };
    match open.last_mut() {
        Some(parent) => parent.children_mut().push(block),
        None => roots.push(block),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{plain_text_of, RichTextItem};

    fn para(text: &str, level: usize) -> Block {
        Block::paragraph(vec![RichTextItem::plain_text(text)]).with_indent(level)
    }

    fn text(block: &Block) -> String {
        plain_text_of(&block.text_content().unwrap().rich_text)
    }

    #[test]
    fn test_mixed_levels() {
        let tree = nest_by_indent(vec![
            para("a", 0),
            para("b", 1),
            para("c", 1),
            para("d", 0),
            para("e", 2),
        ]);

        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].children().len(), 2);
        assert_eq!(text(&tree[0].children()[1]), "c");

        let filler = &tree[1].children()[0];
        assert_eq!(tree[1].children().len(), 1);
        assert!(filler.is_empty_paragraph());
        assert_eq!(filler.children().len(), 1);
        assert_eq!(text(&filler.children()[0]), "e");
    }

    #[test]
    fn test_leading_indent_gets_filler_root() {
        let tree = nest_by_indent(vec![para("deep", 1), para("top", 0)]);
        assert_eq!(tree.len(), 2);
        assert!(tree[0].is_empty_paragraph());
        assert_eq!(text(&tree[0].children()[0]), "deep");
        assert_eq!(text(&tree[1]), "top");
    }

    #[test]
    fn test_flat_input_stays_flat() {
        let tree = nest_by_indent(vec![para("a", 0), para("b", 0)]);
        assert_eq!(tree.len(), 2);
        assert!(tree.iter().all(|b| b.children().is_empty()));
    }
}
