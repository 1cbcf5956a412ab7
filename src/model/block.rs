use super::blocks::*;
use super::common::BlockCommon;
use crate::types::RichTextItem;

/// Macro to reduce boilerplate in Block enum methods
macro_rules! match_all_blocks {
    ($self:expr, $pattern:pat => $result:expr) => {
        match $self {
            Block::Paragraph($pattern) => $result,
            Block::Heading1($pattern) => $result,
            Block::Heading2($pattern) => $result,
            Block::Heading3($pattern) => $result,
            Block::BulletedListItem($pattern) => $result,
            Block::NumberedListItem($pattern) => $result,
            Block::ToDo($pattern) => $result,
            Block::Quote($pattern) => $result,
            Block::Code($pattern) => $result,
            Block::Divider($pattern) => $result,
            Block::Table($pattern) => $result,
            Block::TableRow($pattern) => $result,
            Block::Image($pattern) => $result,
            Block::File($pattern) => $result,
            Block::Pdf($pattern) => $result,
            Block::Bookmark($pattern) => $result,
        }
    };
}

/// Block represents every content block a note can turn into
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph(ParagraphBlock),
    Heading1(Heading1Block),
    Heading2(Heading2Block),
    Heading3(Heading3Block),
    BulletedListItem(BulletedListItemBlock),
    NumberedListItem(NumberedListItemBlock),
    ToDo(ToDoBlock),
    Quote(QuoteBlock),
    Code(CodeBlock),
    Divider(DividerBlock),
    Table(TableBlock),
    TableRow(TableRowBlock),
    Image(ImageBlock),
    File(FileBlock),
    Pdf(PdfBlock),
    Bookmark(BookmarkBlock),
}

impl Block {
    pub fn paragraph(rich_text: Vec<RichTextItem>) -> Self {
        Block::Paragraph(ParagraphBlock {
            common: BlockCommon::default(),
            content: TextBlockContent::new(rich_text),
        })
    }

    /// A paragraph with no text, used as a separator and as an indentation filler.
    pub fn empty_paragraph() -> Self {
        Self::paragraph(Vec::new())
    }

    /// Heading clamped to the three levels Notion supports.
    pub fn heading(level: u8, rich_text: Vec<RichTextItem>) -> Self {
        let common = BlockCommon::default();
        let content = TextBlockContent::new(rich_text);
        match level {
            0 | 1 => Block::Heading1(Heading1Block { common, content }),
            2 => Block::Heading2(Heading2Block { common, content }),
            _ => Block::Heading3(Heading3Block { common, content }),
        }
    }

    pub fn todo(rich_text: Vec<RichTextItem>, checked: bool) -> Self {
        Block::ToDo(ToDoBlock {
            common: BlockCommon::default(),
            content: TextBlockContent::new(rich_text),
            checked,
        })
    }

    /// Get the block's children
    pub fn children(&self) -> &Vec<Block> {
        match_all_blocks!(self, b => &b.common.children)
    }

    /// Get mutable reference to children
    pub fn children_mut(&mut self) -> &mut Vec<Block> {
        match_all_blocks!(self, b => &mut b.common.children)
    }

    /// Get common block data
    pub fn common(&self) -> &BlockCommon {
        match_all_blocks!(self, b => &b.common)
    }

    /// Get mutable common block data
    pub fn common_mut(&mut self) -> &mut BlockCommon {
        match_all_blocks!(self, b => &mut b.common)
    }

    /// Set children
    pub fn set_children(&mut self, children: Vec<Block>) {
        self.common_mut().children = children;
    }

    /// Detaches and returns the children.
    pub fn take_children(&mut self) -> Vec<Block> {
        std::mem::take(self.children_mut())
    }

    pub fn indent_level(&self) -> usize {
        self.common().indent_level
    }

    pub fn with_indent(mut self, indent_level: usize) -> Self {
        self.common_mut().indent_level = indent_level;
        self
    }

    /// Text content of text-bearing blocks.
    pub fn text_content(&self) -> Option<&TextBlockContent> {
        match self {
            Block::Paragraph(b) => Some(&b.content),
            Block::Heading1(b) => Some(&b.content),
            Block::Heading2(b) => Some(&b.content),
            Block::Heading3(b) => Some(&b.content),
            Block::BulletedListItem(b) => Some(&b.content),
            Block::NumberedListItem(b) => Some(&b.content),
            Block::ToDo(b) => Some(&b.content),
            Block::Quote(b) => Some(&b.content),
            Block::Code(b) => Some(&b.content),
            _ => None,
        }
    }

    pub fn text_content_mut(&mut self) -> Option<&mut TextBlockContent> {
        match self {
            Block::Paragraph(b) => Some(&mut b.content),
            Block::Heading1(b) => Some(&mut b.content),
            Block::Heading2(b) => Some(&mut b.content),
            Block::Heading3(b) => Some(&mut b.content),
            Block::BulletedListItem(b) => Some(&mut b.content),
            Block::NumberedListItem(b) => Some(&mut b.content),
            Block::ToDo(b) => Some(&mut b.content),
            Block::Quote(b) => Some(&mut b.content),
            Block::Code(b) => Some(&mut b.content),
            _ => None,
        }
    }

    /// A paragraph whose text is empty (children are not considered).
    pub fn is_empty_paragraph(&self) -> bool {
        matches!(self, Block::Paragraph(p) if p.content.is_empty())
    }

    /// Whether Notion accepts children under this kind of block.
    pub fn can_have_children(&self) -> bool {
        matches!(
            self,
            Block::Paragraph(_)
                | Block::BulletedListItem(_)
                | Block::NumberedListItem(_)
                | Block::ToDo(_)
                | Block::Quote(_)
                | Block::Table(_)
        )
    }

    /// Get block type name
    pub fn block_type(&self) -> &'static str {
        match self {
            Block::Paragraph(_) => "paragraph",
            Block::Heading1(_) => "heading_1",
            Block::Heading2(_) => "heading_2",
            Block::Heading3(_) => "heading_3",
            Block::BulletedListItem(_) => "bulleted_list_item",
            Block::NumberedListItem(_) => "numbered_list_item",
            Block::ToDo(_) => "to_do",
            Block::Quote(_) => "quote",
            Block::Code(_) => "code",
            Block::Divider(_) => "divider",
            Block::Table(_) => "table",
            Block::TableRow(_) => "table_row",
            Block::Image(_) => "image",
            Block::File(_) => "file",
            Block::Pdf(_) => "pdf",
            Block::Bookmark(_) => "bookmark",
        }
    }

    /// Accept a visitor
    pub fn accept<V: BlockVisitor>(&self, visitor: &mut V) -> V::Output {
        match self {
            Block::Paragraph(b) => visitor.visit_paragraph(&b.content),
            Block::Heading1(b) => visitor.visit_heading(1, &b.content),
            Block::Heading2(b) => visitor.visit_heading(2, &b.content),
            Block::Heading3(b) => visitor.visit_heading(3, &b.content),
            Block::BulletedListItem(b) => visitor.visit_bulleted_list_item(&b.content),
            Block::NumberedListItem(b) => visitor.visit_numbered_list_item(&b.content),
            Block::ToDo(b) => visitor.visit_todo(b),
            Block::Quote(b) => visitor.visit_quote(&b.content),
            Block::Code(b) => visitor.visit_code(b),
            Block::Divider(_) => visitor.visit_divider(),
            Block::Table(b) => visitor.visit_table(b),
            Block::TableRow(b) => visitor.visit_table_row(&b.cells),
            Block::Image(b) => visitor.visit_image(&b.media),
            Block::File(b) => visitor.visit_file(&b.media),
            Block::Pdf(b) => visitor.visit_pdf(&b.media),
            Block::Bookmark(b) => visitor.visit_bookmark(b),
        }
    }
}

/// Visitor trait for traversing block structures.
///
/// All methods have default implementations that return `Default::default()`,
/// so implementors only need to override the methods they care about.
pub trait BlockVisitor {
    type Output: Default;

    fn visit_paragraph(&mut self, _content: &TextBlockContent) -> Self::Output {
        Default::default()
    }
    fn visit_heading(&mut self, _level: u8, _content: &TextBlockContent) -> Self::Output {
        Default::default()
    }
    fn visit_bulleted_list_item(&mut self, _content: &TextBlockContent) -> Self::Output {
        Default::default()
    }
    fn visit_numbered_list_item(&mut self, _content: &TextBlockContent) -> Self::Output {
        Default::default()
    }
    fn visit_todo(&mut self, _todo: &ToDoBlock) -> Self::Output {
        Default::default()
    }
    fn visit_quote(&mut self, _content: &TextBlockContent) -> Self::Output {
        Default::default()
    }
    fn visit_code(&mut self, _code: &CodeBlock) -> Self::Output {
        Default::default()
    }
    fn visit_divider(&mut self) -> Self::Output {
        Default::default()
    }
    fn visit_table(&mut self, _table: &TableBlock) -> Self::Output {
        Default::default()
    }
    fn visit_table_row(&mut self, _cells: &[Vec<RichTextItem>]) -> Self::Output {
        Default::default()
    }
    fn visit_image(&mut self, _media: &MediaContent) -> Self::Output {
        Default::default()
    }
    fn visit_file(&mut self, _media: &MediaContent) -> Self::Output {
        Default::default()
    }
    fn visit_pdf(&mut self, _media: &MediaContent) -> Self::Output {
        Default::default()
    }
    fn visit_bookmark(&mut self, _bookmark: &BookmarkBlock) -> Self::Output {
        Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_levels_clamp() {
        assert_eq!(Block::heading(1, vec![]).block_type(), "heading_1");
        assert_eq!(Block::heading(2, vec![]).block_type(), "heading_2");
        assert_eq!(Block::heading(5, vec![]).block_type(), "heading_3");
    }

    #[test]
    fn test_empty_paragraph_ignores_children() {
        let mut block = Block::empty_paragraph();
        block.set_children(vec![Block::paragraph(vec![RichTextItem::plain_text("x")])]);
        assert!(block.is_empty_paragraph());
        assert_eq!(block.take_children().len(), 1);
        assert!(block.children().is_empty());
    }

    #[test]
    fn test_cell_matrix() {
        let row = |text: &str| {
            Block::TableRow(TableRowBlock {
                common: BlockCommon::default(),
                cells: vec![vec![RichTextItem::plain_text(text)]],
            })
        };
        let table = TableBlock {
            common: BlockCommon::default().with_children(vec![row("a"), row("b")]),
            table_width: 1,
            has_column_header: false,
        };
        let matrix = table.cell_matrix();
        assert_eq!(matrix.len(), 2);
        assert_eq!(matrix[1][0][0].content, "b");
    }
}
