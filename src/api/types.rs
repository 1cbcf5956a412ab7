// src/api/types.rs
//! Type definitions for the Notion API module.

use crate::types::{BlockId, DatabaseId, FileUploadId, NotionId, PageId};
use indexmap::IndexMap;
use serde::Deserialize;

// --- Workspace objects ---

/// A page found by search.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSummary {
    pub id: PageId,
    pub title: String,
    /// Whether the page sits at the top level of the workspace.
    pub at_workspace_root: bool,
    pub archived: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildKind {
    Page,
    Database,
    Other,
}

/// A child block of a page, as far as container lookup cares.
#[derive(Debug, Clone, PartialEq)]
pub struct ChildObject {
    pub id: NotionId,
    pub kind: ChildKind,
    pub title: String,
}

/// Where a new page is created.
#[derive(Debug, Clone, PartialEq)]
pub enum PageParent {
    Page(PageId),
    Database(DatabaseId),
}

/// Schema summary of a database.
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseInfo {
    pub id: DatabaseId,
    /// Name of the database's title property.
    pub title_property: String,
    /// Property name to Notion property type, in schema order.
    pub properties: IndexMap<String, String>,
}

/// A block returned by an append call.
#[derive(Debug, Clone, PartialEq)]
pub struct AppendedBlock {
    pub id: BlockId,
    pub block_type: String,
    /// Hosted URL of an uploaded file, for file-backed blocks.
    pub file_url: Option<String>,
}

/// A completed upload, referencable from file blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    pub upload_id: FileUploadId,
    /// Identifier extracted from the hosted URL once the file is attached.
    /// Blocks keep referencing the upload itself; this confirms the file landed.
    pub file_id: Option<String>,
}

// --- API Response Types ---

/// Generic paginated response from Notion API.
#[derive(Debug, Clone, Deserialize)]
pub struct PaginatedResponse<T> {
    #[allow(dead_code)]
    pub object: String,
    pub results: Vec<T>,
    pub next_cursor: Option<String>,
    pub has_more: bool,
}

// --- Pagination Types ---

/// Result of a pagination operation.
#[derive(Debug, Clone)]
pub struct PaginationResult<T> {
    pub items: Vec<T>,
}
