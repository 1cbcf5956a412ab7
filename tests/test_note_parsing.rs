// tests/test_note_parsing.rs
//! Whole-note parsing: export file in, block tree out.

mod common;

use common::{write_export, FixtureNote};
use enex2notion::types::plain_text_of;
use enex2notion::{iter_notes, parse_note, Block, CondenseMode, Note, Rules};
use pretty_assertions::assert_eq;

fn read_single(body: &str) -> (tempfile::TempDir, Note) {
    let dir = tempfile::tempdir().unwrap();
    let export = write_export(dir.path(), "Notebook", &[FixtureNote::new("Note", body)]);
    let note = iter_notes(&export).unwrap().next().unwrap().unwrap();
    (dir, note)
}

fn text_of(block: &Block) -> String {
    block
        .text_content()
        .map(|content| plain_text_of(&content.rich_text))
        .unwrap_or_default()
}

#[test]
fn indented_lines_nest_under_previous_line() {
    let (_dir, note) = read_single(
        r#"<div>top</div><div style="padding-left:40px;">child</div><div style="padding-left:40px;">child 2</div><div>next</div>"#,
    );
    let blocks = parse_note(&note, &Rules::default(), None).unwrap();

    assert_eq!(blocks.len(), 2);
    assert_eq!(text_of(&blocks[0]), "top");
    let children: Vec<String> = blocks[0].children().iter().map(text_of).collect();
    assert_eq!(children, vec!["child", "child 2"]);
    assert_eq!(text_of(&blocks[1]), "next");
}

#[test]
fn parsing_is_repeatable() {
    let (_dir, note) = read_single(
        "<h2>Plan</h2><ul><li>one</li><li>two</li></ul><table><tr><td>a</td></tr></table><hr/>",
    );
    let rules = Rules::default();

    let first = parse_note(&note, &rules, None).unwrap();
    let second = parse_note(&note, &rules, None).unwrap();
    assert_eq!(first, second);

    let kinds: Vec<&str> = first.iter().map(Block::block_type).collect();
    assert_eq!(
        kinds,
        vec!["heading_2", "bulleted_list_item", "bulleted_list_item", "table", "divider"]
    );
}

#[test]
fn metadata_block_comes_first() {
    let (_dir, note) = read_single("<div>body</div>");
    let rules = Rules {
        add_meta: true,
        ..Rules::default()
    };
    let blocks = parse_note(&note, &rules, None).unwrap();

    assert_eq!(blocks.len(), 2);
    assert!(text_of(&blocks[0]).contains("Created: 2021-11-18 08:53:32"));
    assert_eq!(text_of(&blocks[1]), "body");
}

#[test]
fn empty_note_has_no_blocks_even_with_metadata() {
    let (_dir, note) = read_single("");
    let rules = Rules {
        add_meta: true,
        ..Rules::default()
    };
    assert!(parse_note(&note, &rules, None).unwrap().is_empty());
}

#[test]
fn condensed_lines_merge_into_paragraphs() {
    let (_dir, note) = read_single("<div>a</div><div>b</div><div><br/></div><div>c</div>");

    let condensed = parse_note(
        &note,
        &Rules {
            condense_lines: CondenseMode::Condensed,
            ..Rules::default()
        },
        None,
    )
    .unwrap();
    let texts: Vec<String> = condensed.iter().map(text_of).collect();
    assert_eq!(texts, vec!["a\nb", "c"]);

    let sparse = parse_note(
        &note,
        &Rules {
            condense_lines: CondenseMode::Sparse,
            ..Rules::default()
        },
        None,
    )
    .unwrap();
    let texts: Vec<String> = sparse.iter().map(text_of).collect();
    assert_eq!(texts, vec!["a\nb", "", "c"]);
}
