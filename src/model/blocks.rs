use super::common::BlockCommon;
use super::note::Resource;
use crate::types::{Color, RichTextItem};
use std::sync::Arc;

/// Text content block
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextBlockContent {
    pub rich_text: Vec<RichTextItem>,
    /// Block-level color; `None` renders with the default text color.
    pub color: Option<Color>,
}

impl TextBlockContent {
    pub fn new(rich_text: Vec<RichTextItem>) -> Self {
        Self {
            rich_text,
            color: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rich_text.iter().all(|r| r.content.is_empty())
    }
}

/// Paragraph block
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParagraphBlock {
    pub common: BlockCommon,
    pub content: TextBlockContent,
}

/// Heading 1 block
#[derive(Debug, Clone, PartialEq)]
pub struct Heading1Block {
    pub common: BlockCommon,
    pub content: TextBlockContent,
}

/// Heading 2 block
#[derive(Debug, Clone, PartialEq)]
pub struct Heading2Block {
    pub common: BlockCommon,
    pub content: TextBlockContent,
}

/// Heading 3 block
#[derive(Debug, Clone, PartialEq)]
pub struct Heading3Block {
    pub common: BlockCommon,
    pub content: TextBlockContent,
}

/// Bulleted list item block
#[derive(Debug, Clone, PartialEq)]
pub struct BulletedListItemBlock {
    pub common: BlockCommon,
    pub content: TextBlockContent,
}

/// Numbered list item block
#[derive(Debug, Clone, PartialEq)]
pub struct NumberedListItemBlock {
    pub common: BlockCommon,
    pub content: TextBlockContent,
}

/// To-do block
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ToDoBlock {
    pub common: BlockCommon,
    pub content: TextBlockContent,
    pub checked: bool,
}

/// Quote block
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteBlock {
    pub common: BlockCommon,
    pub content: TextBlockContent,
}

/// Code block
#[derive(Debug, Clone, PartialEq)]
pub struct CodeBlock {
    pub common: BlockCommon,
    /// Notion language identifier ("plain text" when unknown).
    pub language: String,
    pub content: TextBlockContent,
}

/// Divider block
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DividerBlock {
    pub common: BlockCommon,
}

/// Table block; its children are exactly its rows.
#[derive(Debug, Clone, PartialEq)]
pub struct TableBlock {
    pub common: BlockCommon,
    pub table_width: usize,
    pub has_column_header: bool,
}

impl TableBlock {
    /// Row-major cell matrix of the table's rows.
    pub fn cell_matrix(&self) -> Vec<Vec<Vec<RichTextItem>>> {
        self.common
            .children
            .iter()
            .filter_map(|child| match child {
                super::Block::TableRow(row) => Some(row.cells.clone()),
                _ => None,
            })
            .collect()
    }
}

/// Table row block
#[derive(Debug, Clone, PartialEq)]
pub struct TableRowBlock {
    pub common: BlockCommon,
    pub cells: Vec<Vec<RichTextItem>>,
}

/// Where an embedded media block gets its bytes from.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaSource {
    /// A resource shipped inside the note; uploaded before the block is created.
    Attachment(Arc<Resource>),
    /// A remote URL referenced directly.
    External(String),
}

/// Media payload shared by image, file and PDF blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaContent {
    pub source: MediaSource,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl MediaContent {
    pub fn attachment(resource: Arc<Resource>) -> Self {
        Self {
            source: MediaSource::Attachment(resource),
            width: None,
            height: None,
        }
    }

    pub fn resource(&self) -> Option<&Arc<Resource>> {
        match &self.source {
            MediaSource::Attachment(resource) => Some(resource),
            MediaSource::External(_) => None,
        }
    }
}

/// Image block
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBlock {
    pub common: BlockCommon,
    pub media: MediaContent,
}

/// File block
#[derive(Debug, Clone, PartialEq)]
pub struct FileBlock {
    pub common: BlockCommon,
    pub media: MediaContent,
}

/// PDF block
#[derive(Debug, Clone, PartialEq)]
pub struct PdfBlock {
    pub common: BlockCommon,
    pub media: MediaContent,
}

/// Bookmark block
#[derive(Debug, Clone, PartialEq)]
pub struct BookmarkBlock {
    pub common: BlockCommon,
    pub url: String,
    pub title: Option<String>,
}
