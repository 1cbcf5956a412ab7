// src/upload/mapper.rs
//! Writes a block tree under an existing page, level by level.

use crate::api::payload::{block_payloads, MediaRef};
use crate::api::{extract_file_id, NotionWorkspace, UploadedFile};
use crate::constants::NOTION_MAX_CHILDREN_PER_APPEND;
use crate::error::AppError;
use crate::model::{Block, MediaContent, MediaSource, Resource};
use crate::types::{FileUploadId, NotionId};
use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// One request object waiting to be appended.
struct Pending<'b> {
    payload: Value,
    /// Block whose children go under the created block.
    owner: Option<&'b Block>,
    /// Resource uploaded for this block for the first time.
    fresh_upload: Option<Arc<Resource>>,
}

/// Uploads the blocks of one note.
///
/// Files are uploaded once per note: a resource referenced again reuses the
/// earlier upload.
pub struct BlockUploader<'a> {
    workspace: &'a dyn NotionWorkspace,
    uploads: HashMap<String, UploadedFile>,
}

impl<'a> BlockUploader<'a> {
    pub fn new(workspace: &'a dyn NotionWorkspace) -> Self {
        Self {
            workspace,
            uploads: HashMap::new(),
        }
    }

    /// Appends `blocks` (and their descendants) under `parent`.
    pub async fn upload(&mut self, parent: &NotionId, blocks: &[Block]) -> Result<(), AppError> {
        self.upload_level(parent.clone(), blocks).await
    }

    /// Uploads recorded so far, keyed by resource MD5.
    pub fn uploads(&self) -> &HashMap<String, UploadedFile> {
        &self.uploads
    }

    fn upload_level<'b>(
        &'b mut self,
        parent: NotionId,
        blocks: &'b [Block],
    ) -> BoxFuture<'b, Result<(), AppError>> {
        async move {
            let mut pending = Vec::new();
            for block in flatten_siblings(blocks) {
                self.lower(block, &mut pending).await?;
            }

            for chunk in pending.chunks(NOTION_MAX_CHILDREN_PER_APPEND) {
                let payloads: Vec<Value> = chunk.iter().map(|p| p.payload.clone()).collect();
                let created = self.workspace.append_children(&parent, &payloads).await?;
                if created.len() != chunk.len() {
                    return Err(AppError::MalformedResponse(format!(
                        "appended {} blocks but {} were returned",
                        chunk.len(),
                        created.len()
                    )));
                }

                for (entry, block) in chunk.iter().zip(created) {
                    if let Some(resource) = &entry.fresh_upload {
                        let url = block.file_url.as_deref().ok_or_else(|| {
                            AppError::MalformedResponse(format!(
                                "{} block {} has no file URL",
                                block.block_type, block.id
                            ))
                        })?;
                        let file_id = extract_file_id(url)?;
                        if let Some(upload) = self.uploads.get_mut(&resource.md5) {
                            upload.file_id = Some(file_id);
                        }
                    }
                    if let Some(owner) = entry.owner {
                        self.upload_level(NotionId::from(&block.id), owner.children())
                            .await?;
                    }
                }
            }
            Ok(())
        }
        .boxed()
    }

    /// Turns one block into pending request objects, uploading its file first.
    async fn lower<'b>(
        &mut self,
        block: &'b Block,
        pending: &mut Vec<Pending<'b>>,
    ) -> Result<(), AppError> {
        let (payloads, fresh_upload) = match media_of(block) {
            Some(media) => match &media.source {
                MediaSource::External(url) => {
                    (block_payloads(block, Some(MediaRef::External(url))), None)
                }
                MediaSource::Attachment(resource) => {
                    let (upload_id, fresh) = self.upload_resource(resource).await?;
                    let payloads = block_payloads(block, Some(MediaRef::Upload(&upload_id)));
                    (payloads, fresh.then(|| resource.clone()))
                }
            },
            None => (block_payloads(block, None), None),
        };

        let nests_children = takes_children(block);
        let last = payloads.len().saturating_sub(1);
        for (index, payload) in payloads.into_iter().enumerate() {
            pending.push(Pending {
                payload,
                owner: (nests_children && index == last).then_some(block),
                fresh_upload: if index == 0 { fresh_upload.clone() } else { None },
            });
        }
        Ok(())
    }

    /// Returns the upload id for `resource` and whether it was uploaded now.
    async fn upload_resource(&mut self, resource: &Resource) -> Result<(FileUploadId, bool), AppError> {
        if let Some(existing) = self.uploads.get(&resource.md5) {
            log::debug!(
                "Reusing upload of {} (file {})",
                resource.upload_name(),
                existing.file_id.as_deref().unwrap_or("pending")
            );
            return Ok((existing.upload_id.clone(), false));
        }

        let upload_id = self.workspace.upload_file(resource).await?;
        self.uploads.insert(
            resource.md5.clone(),
            UploadedFile {
                upload_id: upload_id.clone(),
                file_id: None,
            },
        );
        Ok((upload_id, true))
    }
}

fn media_of(block: &Block) -> Option<&MediaContent> {
    match block {
        Block::Image(b) => Some(&b.media),
        Block::File(b) => Some(&b.media),
        Block::Pdf(b) => Some(&b.media),
        _ => None,
    }
}

/// Whether the block's children are appended under it as a separate call.
/// Table rows travel inline with their table.
fn takes_children(block: &Block) -> bool {
    block.can_have_children() && !matches!(block, Block::Table(_)) && !block.children().is_empty()
}

/// The blocks of one sibling list, with the children of blocks that cannot
/// nest lifted in right after their parent. A table keeps only its rows;
/// anything else nested under it follows the table.
fn flatten_siblings<'b>(blocks: impl IntoIterator<Item = &'b Block>) -> Vec<&'b Block> {
    let mut out = Vec::new();
    for block in blocks {
        out.push(block);
        match block {
            Block::Table(_) => out.extend(flatten_siblings(
                &mut block
                    .children()
                    .iter()
                    .filter(|child| !matches!(child, Block::TableRow(_)))
                    as &mut dyn Iterator<Item = &'b Block>,
            )),
            _ if !block.can_have_children() => out.extend(flatten_siblings(
                &mut block.children().iter() as &mut dyn Iterator<Item = &'b Block>,
            )),
            _ => {}
        }
    }
    out
}
