// src/api/mod.rs
//! Notion API interaction: the ability to write content into a workspace.
//!
//! Upload logic depends on the `NotionWorkspace` trait only; the HTTP
//! details, request payloads and response parsing live in the submodules.

pub mod client;
mod files;
pub mod parser;
pub mod payload;
mod responses;
mod simple_pagination;
mod types;

use crate::error::AppError;
use crate::model::Resource;
use crate::types::{DatabaseId, FileUploadId, NotionId, PageId};
use indexmap::IndexMap;
use serde_json::Value;

pub use client::NotionHttpClient;
pub use files::{extract_file_id, sizeof_fmt};
pub use types::{
    AppendedBlock, ChildKind, ChildObject, DatabaseInfo, PageParent, PageSummary, UploadedFile,
};

/// The remote operations the uploader needs from a Notion workspace.
#[async_trait::async_trait]
pub trait NotionWorkspace: Send + Sync {
    /// Verifies the token. An invalid token is an `Authentication` error.
    async fn authenticate(&self) -> Result<(), AppError>;

    /// Pages whose title matches `query` (Notion's fuzzy search; callers
    /// filter for exact titles).
    async fn search_pages(&self, query: &str) -> Result<Vec<PageSummary>, AppError>;

    async fn create_workspace_page(&self, title: &str) -> Result<PageId, AppError>;

    async fn list_children(&self, parent: &NotionId) -> Result<Vec<ChildObject>, AppError>;

    async fn create_page(&self, parent: &PageParent, properties: Value) -> Result<PageId, AppError>;

    async fn create_database(
        &self,
        parent: &PageId,
        title: &str,
        schema: &IndexMap<String, Value>,
    ) -> Result<DatabaseInfo, AppError>;

    async fn retrieve_database(&self, id: &DatabaseId) -> Result<DatabaseInfo, AppError>;

    /// Adds properties to a database schema and returns the updated schema.
    async fn add_database_properties(
        &self,
        id: &DatabaseId,
        properties: &IndexMap<String, Value>,
    ) -> Result<DatabaseInfo, AppError>;

    /// Appends at most 100 blocks; returns the created blocks in order.
    async fn append_children(
        &self,
        parent: &NotionId,
        children: &[Value],
    ) -> Result<Vec<AppendedBlock>, AppError>;

    async fn set_page_title(
        &self,
        page: &PageId,
        title_property: &str,
        title: &str,
    ) -> Result<(), AppError>;

    async fn delete_block(&self, id: &NotionId) -> Result<(), AppError>;

    /// Uploads the bytes of a resource, ready to be attached to a block.
    async fn upload_file(&self, resource: &Resource) -> Result<FileUploadId, AppError>;
}
