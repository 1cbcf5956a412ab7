// tests/common/mod.rs
//! Shared test helpers: an in-memory Notion workspace and ENEX fixtures.

#![allow(dead_code)]

use async_trait::async_trait;
use enex2notion::api::{
    AppendedBlock, ChildKind, ChildObject, DatabaseInfo, NotionWorkspace, PageParent, PageSummary,
};
use enex2notion::{AppError, BlockId, DatabaseId, FileUploadId, NotionId, PageId, Resource};
use indexmap::IndexMap;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

const BUCKET_URL: &str = "https://prod-files-secure.s3.us-west-2.amazonaws.com";
const WORKSPACE_UUID: &str = "7e1a2f1c-4f3e-4a8b-9c1d-0a1b2c3d4e5f";

#[derive(Debug, Clone, PartialEq)]
pub enum FakeParent {
    Workspace,
    Page(String),
    Database(String),
}

#[derive(Debug, Clone)]
pub struct FakePage {
    pub id: String,
    pub parent: FakeParent,
    pub title: String,
    pub properties: Value,
    pub archived: bool,
}

#[derive(Debug, Clone)]
pub struct FakeDatabase {
    pub id: String,
    pub parent: String,
    pub title: String,
    pub title_property: String,
    pub properties: IndexMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct FakeBlock {
    pub id: String,
    pub parent: String,
    pub payload: Value,
}

#[derive(Debug, Clone)]
pub struct FakeUpload {
    pub id: FileUploadId,
    pub name: String,
    pub size: usize,
}

#[derive(Debug, Default)]
pub struct WorkspaceState {
    pub pages: Vec<FakePage>,
    pub databases: Vec<FakeDatabase>,
    pub blocks: Vec<FakeBlock>,
    pub uploads: Vec<FakeUpload>,
    /// Every call, as `"<operation>"`.
    pub calls: Vec<String>,
    /// The next this many appends fail with a transient error.
    pub failing_appends: u32,
    /// Every `list_children` call fails.
    pub failing_children: bool,
    pub reject_token: bool,
    /// Hosted URL returned for uploaded files instead of a bucket URL.
    pub file_url_override: Option<String>,
}

/// A Notion workspace held in memory.
#[derive(Debug, Default)]
pub struct InMemoryWorkspace {
    state: Mutex<WorkspaceState>,
}

impl InMemoryWorkspace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MutexGuard<'_, WorkspaceState> {
        self.state.lock().unwrap()
    }

    pub fn add_workspace_page(&self, title: &str) -> PageId {
        let id = PageId::new_v4();
        self.state().pages.push(FakePage {
            id: key(&id),
            parent: FakeParent::Workspace,
            title: title.to_string(),
            properties: Value::Null,
            archived: false,
        });
        id
    }

    pub fn add_database(&self, parent: &PageId, title: &str, columns: &[(&str, &str)]) -> DatabaseId {
        let id = DatabaseId::new_v4();
        let properties: IndexMap<String, String> = columns
            .iter()
            .map(|(name, kind)| (name.to_string(), kind.to_string()))
            .collect();
        let title_property = title_column(&properties);
        self.state().databases.push(FakeDatabase {
            id: key(&id),
            parent: key(parent),
            title: title.to_string(),
            title_property,
            properties,
        });
        id
    }

    /// Live (non-archived) pages with the given parent.
    pub fn pages_under(&self, parent: &FakeParent) -> Vec<FakePage> {
        self.state()
            .pages
            .iter()
            .filter(|page| &page.parent == parent && !page.archived)
            .cloned()
            .collect()
    }

    pub fn blocks_under(&self, parent: &str) -> Vec<FakeBlock> {
        self.state()
            .blocks
            .iter()
            .filter(|block| block.parent == parent)
            .cloned()
            .collect()
    }

    pub fn count_calls(&self, operation: &str) -> usize {
        self.state().calls.iter().filter(|c| *c == operation).count()
    }

    fn record(&self, operation: &str) -> MutexGuard<'_, WorkspaceState> {
        let mut state = self.state();
        state.calls.push(operation.to_string());
        state
    }
}

/// The normalized string form of any id.
pub fn key<T>(id: &enex2notion::types::Id<T>) -> String {
    NotionId::from(id).as_str().to_string()
}

/// Block type of a recorded payload.
pub fn block_type(block: &FakeBlock) -> &str {
    block.payload["type"].as_str().unwrap_or_default()
}

/// Concatenated plain text of a recorded text block.
pub fn block_text(block: &FakeBlock) -> String {
    let kind = block_type(block);
    block.payload[kind]["rich_text"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item["text"]["content"].as_str())
                .collect()
        })
        .unwrap_or_default()
}

fn title_column(properties: &IndexMap<String, String>) -> String {
    properties
        .iter()
        .find(|(_, kind)| kind.as_str() == "title")
        .map(|(name, _)| name.clone())
        .unwrap_or_else(|| "Name".to_string())
}

fn title_of(properties: &Value) -> String {
    properties
        .as_object()
        .and_then(|props| props.values().find_map(|p| p.get("title")))
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item["text"]["content"].as_str())
                .collect()
        })
        .unwrap_or_default()
}

fn injected_failure() -> AppError {
    AppError::MalformedResponse("injected failure".to_string())
}

#[async_trait]
impl NotionWorkspace for InMemoryWorkspace {
    async fn authenticate(&self) -> Result<(), AppError> {
        if self.record("authenticate").reject_token {
            return Err(AppError::Authentication("401 unauthorized".to_string()));
        }
        Ok(())
    }

    async fn search_pages(&self, query: &str) -> Result<Vec<PageSummary>, AppError> {
        let state = self.record("search_pages");
        state
            .pages
            .iter()
            .filter(|page| page.title.contains(query))
            .map(|page| {
                Ok(PageSummary {
                    id: PageId::parse(&page.id)?,
                    title: page.title.clone(),
                    at_workspace_root: page.parent == FakeParent::Workspace,
                    archived: page.archived,
                })
            })
            .collect()
    }

    async fn create_workspace_page(&self, title: &str) -> Result<PageId, AppError> {
        self.record("create_workspace_page");
        Ok(self.add_workspace_page(title))
    }

    async fn list_children(&self, parent: &NotionId) -> Result<Vec<ChildObject>, AppError> {
        let state = self.record("list_children");
        if state.failing_children {
            return Err(injected_failure());
        }
        let parent = FakeParent::Page(parent.as_str().to_string());
        let mut children = Vec::new();
        for page in state.pages.iter().filter(|p| p.parent == parent && !p.archived) {
            children.push(ChildObject {
                id: NotionId::parse(&page.id)?,
                kind: ChildKind::Page,
                title: page.title.clone(),
            });
        }
        for database in state
            .databases
            .iter()
            .filter(|d| FakeParent::Page(d.parent.clone()) == parent)
        {
            children.push(ChildObject {
                id: NotionId::parse(&database.id)?,
                kind: ChildKind::Database,
                title: database.title.clone(),
            });
        }
        Ok(children)
    }

    async fn create_page(&self, parent: &PageParent, properties: Value) -> Result<PageId, AppError> {
        let mut state = self.record("create_page");
        let id = PageId::new_v4();
        let parent = match parent {
            PageParent::Page(page) => FakeParent::Page(key(page)),
            PageParent::Database(database) => FakeParent::Database(key(database)),
        };
        state.pages.push(FakePage {
            id: key(&id),
            parent,
            title: title_of(&properties),
            properties,
            archived: false,
        });
        Ok(id)
    }

    async fn create_database(
        &self,
        parent: &PageId,
        title: &str,
        schema: &IndexMap<String, Value>,
    ) -> Result<DatabaseInfo, AppError> {
        self.record("create_database");
        let columns: Vec<(String, String)> = schema
            .iter()
            .map(|(name, config)| {
                let kind = config
                    .as_object()
                    .and_then(|c| c.keys().next().cloned())
                    .unwrap_or_default();
                (name.clone(), kind)
            })
            .collect();
        let columns: Vec<(&str, &str)> = columns
            .iter()
            .map(|(name, kind)| (name.as_str(), kind.as_str()))
            .collect();
        let id = self.add_database(parent, title, &columns);
        self.retrieve_database(&id).await
    }

    async fn retrieve_database(&self, id: &DatabaseId) -> Result<DatabaseInfo, AppError> {
        let state = self.record("retrieve_database");
        let database = state
            .databases
            .iter()
            .find(|d| d.id == key(id))
            .ok_or_else(|| AppError::MalformedResponse("no such database".to_string()))?;
        Ok(DatabaseInfo {
            id: id.clone(),
            title_property: database.title_property.clone(),
            properties: database.properties.clone(),
        })
    }

    async fn add_database_properties(
        &self,
        id: &DatabaseId,
        properties: &IndexMap<String, Value>,
    ) -> Result<DatabaseInfo, AppError> {
        {
            let mut state = self.record("add_database_properties");
            let database = state
                .databases
                .iter_mut()
                .find(|d| d.id == key(id))
                .ok_or_else(|| AppError::MalformedResponse("no such database".to_string()))?;
            for (name, config) in properties {
                let kind = config
                    .as_object()
                    .and_then(|c| c.keys().next().cloned())
                    .unwrap_or_default();
                database.properties.insert(name.clone(), kind);
            }
        }
        self.retrieve_database(id).await
    }

    async fn append_children(
        &self,
        parent: &NotionId,
        children: &[Value],
    ) -> Result<Vec<AppendedBlock>, AppError> {
        let mut state = self.record("append_children");
        if state.failing_appends > 0 {
            state.failing_appends -= 1;
            return Err(injected_failure());
        }

        let mut created = Vec::new();
        for payload in children {
            let id = BlockId::new_v4();
            let kind = payload["type"].as_str().unwrap_or_default().to_string();
            let file_url = payload[kind.as_str()]["file_upload"]["id"].as_str().map(|upload| {
                state.file_url_override.clone().unwrap_or_else(|| {
                    format!(
                        "{}/{}/{}/{}",
                        BUCKET_URL,
                        WORKSPACE_UUID,
                        uuid::Uuid::new_v4().hyphenated(),
                        upload
                    )
                })
            });
            state.blocks.push(FakeBlock {
                id: key(&id),
                parent: parent.as_str().to_string(),
                payload: payload.clone(),
            });
            created.push(AppendedBlock {
                id,
                block_type: kind,
                file_url,
            });
        }
        Ok(created)
    }

    async fn set_page_title(
        &self,
        page: &PageId,
        _title_property: &str,
        title: &str,
    ) -> Result<(), AppError> {
        let mut state = self.record("set_page_title");
        let page = state
            .pages
            .iter_mut()
            .find(|p| p.id == key(page))
            .ok_or_else(|| AppError::MalformedResponse("no such page".to_string()))?;
        page.title = title.to_string();
        Ok(())
    }

    async fn delete_block(&self, id: &NotionId) -> Result<(), AppError> {
        let mut state = self.record("delete_block");
        if let Some(page) = state.pages.iter_mut().find(|p| p.id == id.as_str()) {
            page.archived = true;
        }
        state.blocks.retain(|block| block.id != id.as_str());
        Ok(())
    }

    async fn upload_file(&self, resource: &Resource) -> Result<FileUploadId, AppError> {
        let mut state = self.record("upload_file");
        let id = FileUploadId::new_v4();
        state.uploads.push(FakeUpload {
            id: id.clone(),
            name: resource.upload_name(),
            size: resource.size(),
        });
        Ok(id)
    }
}

/// One note of an export fixture.
pub struct FixtureNote<'a> {
    pub title: &'a str,
    pub created: &'a str,
    pub body: &'a str,
}

impl<'a> FixtureNote<'a> {
    pub fn new(title: &'a str, body: &'a str) -> Self {
        Self {
            title,
            created: "20211118T085332Z",
            body,
        }
    }
}

/// Writes an export file with the given notes and returns its path.
pub fn write_export(dir: &Path, notebook: &str, notes: &[FixtureNote<'_>]) -> PathBuf {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <en-export export-date=\"20211218T085932Z\" application=\"Evernote\">\n",
    );
    for note in notes {
        xml.push_str(&format!(
            "  <note>\n    <title>{}</title>\n    <created>{}</created>\n    \
             <updated>{}</updated>\n    <content><![CDATA[<en-note>{}</en-note>]]></content>\n  </note>\n",
            note.title, note.created, note.created, note.body
        ));
    }
    xml.push_str("</en-export>\n");

    let path = dir.join(format!("{}.enex", notebook));
    std::fs::write(&path, xml).unwrap();
    path
}
