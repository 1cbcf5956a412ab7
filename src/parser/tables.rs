// src/parser/tables.rs
use super::builder::inline_runs;
use super::dom::Element;
use super::formatting::apply_formatting;
use crate::model::{Block, BlockCommon, TableBlock, TableRowBlock};
use crate::types::{Annotations, RichTextItem};

struct RawRow {
    cells: Vec<Vec<RichTextItem>>,
    all_header: bool,
}

/// Builds a `Table` block with its rows as children. Returns `None` for a
/// table without cells.
pub fn parse_table(table: &Element, ann: &Annotations) -> Option<Block> {
    let mut rows = Vec::new();
    collect_rows(table, ann, &mut rows);
    rows.retain(|row| !row.cells.is_empty());

    let width = rows.iter().map(|row| row.cells.len()).max().unwrap_or(0);
    if width == 0 {
        return None;
    }
    let has_column_header = rows.first().map(|row| row.all_header).unwrap_or(false);

    let children = rows
        .into_iter()
        .map(|mut row| {
            row.cells.resize_with(width, Vec::new);
            Block::TableRow(TableRowBlock {
                common: BlockCommon::default(),
                cells: row.cells,
            })
        })
        .collect();

    Some(Block::Table(TableBlock {
        common: BlockCommon::default().with_children(children),
        table_width: width,
        has_column_header,
    }))
}

fn collect_rows(element: &Element, ann: &Annotations, rows: &mut Vec<RawRow>) {
    for child in element.child_elements() {
        match child.name.as_str() {
            "thead" | "tbody" | "tfoot" => collect_rows(child, &apply_formatting(child, ann), rows),
            "tr" => rows.push(parse_row(child, &apply_formatting(child, ann))),
            _ => {}
        }
    }
}

fn parse_row(row: &Element, ann: &Annotations) -> RawRow {
    let mut cells = Vec::new();
    let mut all_header = true;
    for cell in row.child_elements() {
        match cell.name.as_str() {
            "td" => all_header = false,
            "th" => {}
            _ => continue,
        }
        cells.push(inline_runs(cell, &apply_formatting(cell, ann)));
    }
    RawRow {
        all_header: all_header && !cells.is_empty(),
        cells,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::dom::parse_html;
    use crate::types::plain_text_of;

    fn table(html: &str) -> Option<Block> {
        let doc = parse_html(html);
        parse_table(doc.find("table").unwrap(), &Annotations::default())
    }

    fn matrix(block: &Block) -> Vec<Vec<String>> {
        match block {
            Block::Table(t) => t
                .cell_matrix()
                .iter()
                .map(|row| row.iter().map(|cell| plain_text_of(cell)).collect())
                .collect(),
            other => panic!("expected table, got {:?}", other),
        }
    }

    #[test]
    fn test_three_by_three() {
        let block = table(
            "<table><tbody>\
             <tr><td>a1</td><td>a2</td><td>a3</td></tr>\
             <tr><td>b1</td><td><b>b2</b></td><td>b3</td></tr>\
             <tr><td>c1</td><td>c2</td><td><div>c3</div><div>more</div></td></tr>\
             </tbody></table>",
        )
        .unwrap();

        assert_eq!(
            matrix(&block),
            vec![
                vec!["a1", "a2", "a3"],
                vec!["b1", "b2", "b3"],
                vec!["c1", "c2", "c3\nmore"],
            ]
        );
        match &block {
            Block::Table(t) => {
                assert_eq!(t.table_width, 3);
                assert!(!t.has_column_header);
                assert_eq!(t.common.children.len(), 3);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_header_and_padding() {
        let block = table(
            "<table><thead><tr><th>h1</th><th>h2</th></tr></thead>\
             <tr><td>only</td></tr></table>",
        )
        .unwrap();
        assert_eq!(matrix(&block), vec![vec!["h1", "h2"], vec!["only", ""]]);
        assert!(matches!(&block, Block::Table(t) if t.has_column_header));
    }

    #[test]
    fn test_empty_table_is_skipped() {
        assert!(table("<table><tr></tr></table>").is_none());
        assert!(table("<table></table>").is_none());
    }
}
