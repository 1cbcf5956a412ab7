// src/upload/note.rs
//! Uploading a single note into its container.

use super::containers::Container;
use super::mapper::BlockUploader;
use crate::api::payload::{note_row_properties, page_title_properties};
use crate::api::{NotionWorkspace, PageParent};
use crate::constants::UNFINISHED_UPLOAD_SUFFIX;
use crate::error::AppError;
use crate::model::{Block, Note};
use crate::types::{NotionId, PageId};

/// Title property of a plain (non-database) page.
const PAGE_TITLE_PROPERTY: &str = "title";

/// Creates the note page, uploads its blocks and finally gives it its real
/// title.
///
/// Until the last call succeeds the page is titled `<title> [UNFINISHED
/// UPLOAD]`. On failure the page is deleted, or left in place with that
/// title when `keep_failed` is set.
pub async fn upload_note(
    workspace: &dyn NotionWorkspace,
    container: &Container,
    note: &Note,
    blocks: &[Block],
    keep_failed: bool,
) -> Result<PageId, AppError> {
    let unfinished = format!("{}{}", note.title, UNFINISHED_UPLOAD_SUFFIX);
    let (parent, properties, title_property) = match container {
        Container::Page(id) => (
            PageParent::Page(id.clone()),
            page_title_properties(PAGE_TITLE_PROPERTY, &unfinished),
            PAGE_TITLE_PROPERTY,
        ),
        Container::Database { id, title_property } => (
            PageParent::Database(id.clone()),
            note_row_properties(title_property, &unfinished, note),
            title_property.as_str(),
        ),
    };

    let page = workspace.create_page(&parent, properties).await?;
    let page_ref = NotionId::from(&page);

    let result = async {
        BlockUploader::new(workspace).upload(&page_ref, blocks).await?;
        workspace
            .set_page_title(&page, title_property, &note.title)
            .await
    }
    .await;

    match result {
        Ok(()) => Ok(page),
        Err(error) => {
            if keep_failed {
                log::debug!("Keeping unfinished page {} for '{}'", page, note.title);
            } else if let Err(cleanup) = workspace.delete_block(&page_ref).await {
                log::warn!(
                    "Failed to remove unfinished page for '{}': {}",
                    note.title,
                    cleanup
                );
            }
            Err(error)
        }
    }
}
