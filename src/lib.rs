// src/lib.rs
//! enex2notion library: uploads Evernote ENEX exports into a Notion workspace.
//!
//! # Public API
//!
//! The library exposes types organized by concern:
//! - **Error handling**: `AppError`, `ValidationError`
//! - **Configuration**: `CommandLineInput`, `RunConfig`, `Rules`
//! - **Reading exports**: `iter_notes`, `count_notes`
//! - **Domain model**: `Note`, `Resource`, `Block` and the block types
//! - **Parsing**: `parse_note`, `parse_note_blocks`
//! - **Notion access**: the `NotionWorkspace` trait and `NotionHttpClient`
//! - **Uploading**: `EnexUploader`, `BlockUploader`, `upload_note`, `DoneLedger`

pub mod analytics;
pub mod api;
pub mod config;
pub mod constants;
pub mod enex;
pub mod error;
pub mod error_recovery;
pub mod ledger;
pub mod model;
pub mod parser;
pub mod render;
pub mod types;
pub mod upload;

// --- Error Handling ---
pub use crate::error::{AppError, NotionErrorCode};
pub use crate::types::ValidationError;

// --- Configuration ---
pub use crate::config::{
    CommandLineInput, CondenseMode, ImportMode, Rules, RunConfig, WebClipMode,
};
pub use crate::error_recovery::RetryPolicy;

// --- Reading Exports ---
pub use crate::enex::{count_notes, iter_notes};

// --- Domain Model ---
pub use crate::model::{Block, BlockCommon, BlockVisitor, Note, Resource};

// --- Block Types ---
pub use crate::model::blocks::{
    BookmarkBlock, BulletedListItemBlock, CodeBlock, DividerBlock, FileBlock, Heading1Block,
    Heading2Block, Heading3Block, ImageBlock, MediaContent, MediaSource, NumberedListItemBlock,
    ParagraphBlock, PdfBlock, QuoteBlock, TableBlock, TableRowBlock, TextBlockContent, ToDoBlock,
};

// --- Domain Types ---
pub use crate::types::{
    Annotations, ApiKey, BlockId, Color, DatabaseId, FileUploadId, Fingerprint, NotionId, PageId,
    RichTextItem,
};

// --- Parsing ---
pub use crate::parser::{parse_note, parse_note_blocks};
pub use crate::render::{HtmlRenderer, WkHtmlRenderer};

// --- Notion Access ---
pub use crate::api::{extract_file_id, sizeof_fmt, NotionHttpClient, NotionWorkspace};

// --- Uploading ---
pub use crate::ledger::DoneLedger;
pub use crate::upload::{
    upload_note, BlockUploader, Container, Destination, EnexUploader, UploadSummary,
};
