// src/upload/containers.rs
//! Destination lookup: the import root page and one container per notebook.

use crate::api::payload::{database_schema, page_title_properties, schema_kind, PROP_TITLE};
use crate::api::{ChildKind, DatabaseInfo, NotionWorkspace, PageParent};
use crate::config::ImportMode;
use crate::error::AppError;
use crate::types::{DatabaseId, NotionId, PageId};
use indexmap::IndexMap;
use std::collections::HashMap;

/// Where the notes of one notebook are created.
#[derive(Debug, Clone, PartialEq)]
pub enum Container {
    /// Notes become child pages of this page.
    Page(PageId),
    /// Notes become rows of this database.
    Database {
        id: DatabaseId,
        title_property: String,
    },
}

/// Containers resolved so far in this run, keyed by notebook title.
#[derive(Debug, Default)]
pub struct ContainerCache {
    entries: HashMap<String, Container>,
}

impl ContainerCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, notebook: &str) -> Option<&Container> {
        self.entries.get(notebook)
    }

    pub fn insert(&mut self, notebook: &str, container: Container) {
        self.entries.insert(notebook.to_string(), container);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Finds the top-level page titled `name`, creating it when absent.
pub async fn resolve_root(workspace: &dyn NotionWorkspace, name: &str) -> Result<PageId, AppError> {
    let candidates = workspace.search_pages(name).await?;
    let existing = candidates
        .into_iter()
        .find(|page| page.title == name && page.at_workspace_root && !page.archived);

    match existing {
        Some(page) => {
            log::debug!("Using existing root page '{}' ({})", name, page.id);
            Ok(page.id)
        }
        None => {
            log::info!("Creating '{}' page...", name);
            workspace.create_workspace_page(name).await
        }
    }
}

/// Finds or creates the container for `notebook` under the import root.
pub async fn resolve_container(
    workspace: &dyn NotionWorkspace,
    root: &PageId,
    mode: ImportMode,
    notebook: &str,
) -> Result<Container, AppError> {
    let children = workspace.list_children(&NotionId::from(root)).await?;
    let wanted = match mode {
        ImportMode::Page => ChildKind::Page,
        ImportMode::Db => ChildKind::Database,
    };
    let existing = children
        .into_iter()
        .find(|child| child.kind == wanted && child.title == notebook);

    match (mode, existing) {
        (ImportMode::Page, Some(child)) => Ok(Container::Page(PageId::parse(child.id.as_str())?)),
        (ImportMode::Page, None) => {
            log::debug!("Creating page for notebook '{}'", notebook);
            let id = workspace
                .create_page(
                    &PageParent::Page(root.clone()),
                    page_title_properties("title", notebook),
                )
                .await?;
            Ok(Container::Page(id))
        }
        (ImportMode::Db, Some(child)) => {
            let info = workspace
                .retrieve_database(&DatabaseId::parse(child.id.as_str())?)
                .await?;
            let info = ensure_schema(workspace, info).await?;
            Ok(database_container(info))
        }
        (ImportMode::Db, None) => {
            log::debug!("Creating database for notebook '{}'", notebook);
            let info = workspace
                .create_database(root, notebook, &database_schema())
                .await?;
            Ok(database_container(info))
        }
    }
}

fn database_container(info: DatabaseInfo) -> Container {
    Container::Database {
        id: info.id,
        title_property: info.title_property,
    }
}

/// Adds the note columns an existing database lacks.
async fn ensure_schema(
    workspace: &dyn NotionWorkspace,
    info: DatabaseInfo,
) -> Result<DatabaseInfo, AppError> {
    let missing = missing_properties(&info);
    if missing.is_empty() {
        return Ok(info);
    }

    log::debug!(
        "Adding properties {:?} to database {}",
        missing.keys().collect::<Vec<_>>(),
        info.id
    );
    workspace.add_database_properties(&info.id, &missing).await
}

/// Schema entries absent from `info`. The title column is never added since
/// every database already has one.
fn missing_properties(info: &DatabaseInfo) -> IndexMap<String, serde_json::Value> {
    database_schema()
        .into_iter()
        .filter(|(name, _)| name != PROP_TITLE)
        .filter(|(name, config)| match info.properties.get(name) {
            None => true,
            Some(kind) => {
                if Some(kind.as_str()) != schema_kind(config) {
                    log::warn!(
                        "Database {} has property '{}' of type '{}', expected '{}'",
                        info.id,
                        name,
                        kind,
                        schema_kind(config).unwrap_or("?")
                    );
                }
                false
            }
        })
        .collect()
}
