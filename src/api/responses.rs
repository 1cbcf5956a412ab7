// src/api/responses.rs
//! Response bodies of the Notion endpoints this tool calls.
//!
//! Only the fields the uploader reads are modelled; everything else in a
//! response is ignored by serde.

use super::types::{AppendedBlock, ChildKind, ChildObject, DatabaseInfo, PageSummary};
use crate::error::AppError;
use crate::types::{BlockId, DatabaseId, NotionId, PageId};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Error body returned with non-2xx statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct NotionError {
    pub status: u16,
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub request_id: Option<String>,
}

/// Any object where only the identifier matters.
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectRef {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParentRef {
    Workspace,
    PageId,
    DatabaseId,
    BlockId,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PageObject {
    pub id: String,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub in_trash: bool,
    pub parent: ParentRef,
    #[serde(default)]
    pub properties: IndexMap<String, Value>,
}

impl PageObject {
    /// Plain text of the page's title property.
    pub fn title(&self) -> String {
        self.properties
            .values()
            .find(|prop| prop.get("type").and_then(Value::as_str) == Some("title"))
            .and_then(|prop| prop.get("title"))
            .map(plain_text_of_value)
            .unwrap_or_default()
    }

    pub fn into_summary(self) -> Result<PageSummary, AppError> {
        Ok(PageSummary {
            title: self.title(),
            at_workspace_root: matches!(self.parent, ParentRef::Workspace),
            archived: self.archived || self.in_trash,
            id: PageId::parse(&self.id)?,
        })
    }
}

/// Concatenated `plain_text` of a rich text array.
fn plain_text_of_value(rich_text: &Value) -> String {
    rich_text
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("plain_text").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default()
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlockObject {
    pub id: String,
    #[serde(rename = "type")]
    pub block_type: String,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl BlockObject {
    fn payload(&self) -> Option<&Value> {
        self.rest.get(&self.block_type)
    }

    /// Hosted URL of a file-backed block.
    pub fn file_url(&self) -> Option<String> {
        let payload = self.payload()?;
        payload
            .get("file")
            .and_then(|file| file.get("url"))
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    pub fn into_child(self) -> Result<ChildObject, AppError> {
        let kind = match self.block_type.as_str() {
            "child_page" => ChildKind::Page,
            "child_database" => ChildKind::Database,
            _ => ChildKind::Other,
        };
        let title = self
            .payload()
            .and_then(|payload| payload.get("title"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Ok(ChildObject {
            id: NotionId::parse(&self.id)?,
            kind,
            title,
        })
    }

    pub fn into_appended(self) -> Result<AppendedBlock, AppError> {
        Ok(AppendedBlock {
            file_url: self.file_url(),
            id: BlockId::parse(&self.id)?,
            block_type: self.block_type,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PropertySchema {
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseObject {
    pub id: String,
    #[serde(default)]
    pub properties: IndexMap<String, PropertySchema>,
}

impl DatabaseObject {
    pub fn into_info(self) -> Result<DatabaseInfo, AppError> {
        let title_property = self
            .properties
            .iter()
            .find(|(_, schema)| schema.kind == "title")
            .map(|(name, _)| name.clone())
            .ok_or_else(|| {
                AppError::MalformedResponse(format!("Database {} has no title property", self.id))
            })?;

        Ok(DatabaseInfo {
            id: DatabaseId::parse(&self.id)?,
            title_property,
            properties: self
                .properties
                .into_iter()
                .map(|(name, schema)| (name, schema.kind))
                .collect(),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileUploadObject {
    pub id: String,
    #[serde(default)]
    pub status: String,
}
