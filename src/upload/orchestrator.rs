// src/upload/orchestrator.rs
//! Drives an import: notebooks in order, notes in order, one at a time.

use super::containers::{resolve_container, Container, ContainerCache};
use super::note::upload_note;
use crate::analytics::measure_blocks;
use crate::api::NotionWorkspace;
use crate::config::{discover_inputs, Rules};
use crate::enex::iter_notes;
use crate::error::AppError;
use crate::error_recovery::retry_with_policy;
use crate::ledger::DoneLedger;
use crate::model::{Block, Note};
use crate::parser::parse_note;
use crate::render::HtmlRenderer;
use crate::types::PageId;
use std::path::{Path, PathBuf};

/// The workspace and import root notes are written to.
#[derive(Clone, Copy)]
pub struct Destination<'a> {
    pub workspace: &'a dyn NotionWorkspace,
    pub root: &'a PageId,
}

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadSummary {
    pub notebooks: usize,
    pub uploaded: usize,
    pub already_done: usize,
    pub empty: usize,
    pub failed: usize,
    /// Notes parsed without uploading (dry run).
    pub parsed_only: usize,
}

/// Uploads export files into a Notion workspace.
///
/// Without a destination the run is a dry run: notes are read and parsed
/// but nothing is sent.
pub struct EnexUploader<'a> {
    destination: Option<Destination<'a>>,
    rules: Rules,
    renderer: Option<&'a dyn HtmlRenderer>,
    ledger: DoneLedger,
    containers: ContainerCache,
    summary: UploadSummary,
}

impl<'a> EnexUploader<'a> {
    pub fn new(
        destination: Option<Destination<'a>>,
        rules: Rules,
        renderer: Option<&'a dyn HtmlRenderer>,
        ledger: DoneLedger,
    ) -> Self {
        Self {
            destination,
            rules,
            renderer,
            ledger,
            containers: ContainerCache::new(),
            summary: UploadSummary::default(),
        }
    }

    pub fn summary(&self) -> &UploadSummary {
        &self.summary
    }

    pub fn ledger(&self) -> &DoneLedger {
        &self.ledger
    }

    /// Uploads every input: export files directly, directories by the
    /// `.enex` files found below them.
    pub async fn upload_inputs(&mut self, inputs: &[PathBuf]) -> Result<(), AppError> {
        for input in inputs {
            if input.is_dir() {
                log::info!("Processing directory '{}'...", display_name(input));
                for file in discover_inputs(std::slice::from_ref(input))? {
                    self.upload_notebook(&file).await?;
                }
            } else {
                self.upload_notebook(input).await?;
            }
        }
        Ok(())
    }

    /// Uploads one export file as a notebook named after the file stem.
    pub async fn upload_notebook(&mut self, path: &Path) -> Result<(), AppError> {
        let notebook = notebook_name(path);
        log::info!("Processing notebook '{}'...", notebook);
        self.summary.notebooks += 1;

        let destination = self.destination;
        let container = match destination {
            Some(destination) => match self.container_for(destination, &notebook).await {
                Ok(container) => Some(container),
                Err(error) => {
                    log::error!("Failed to get notebook root for '{}'", notebook);
                    if self.rules.skip_failed && !error.is_fatal() {
                        log::warn!("Skipping notebook '{}': {}", notebook, error);
                        return Ok(());
                    }
                    return Err(AppError::ContainerResolution {
                        notebook,
                        source: Box::new(error),
                    });
                }
            },
            None => None,
        };

        for note in iter_notes(path)? {
            self.process_note(note?, container.as_ref()).await?;
        }
        Ok(())
    }

    async fn container_for(
        &mut self,
        destination: Destination<'a>,
        notebook: &str,
    ) -> Result<Container, AppError> {
        if let Some(container) = self.containers.get(notebook) {
            return Ok(container.clone());
        }
        let container = resolve_container(
            destination.workspace,
            destination.root,
            self.rules.mode,
            notebook,
        )
        .await?;
        self.containers.insert(notebook, container.clone());
        Ok(container)
    }

    async fn process_note(
        &mut self,
        mut note: Note,
        container: Option<&Container>,
    ) -> Result<(), AppError> {
        if self.ledger.contains(note.fingerprint()) {
            log::debug!("Skipping note '{}' (already uploaded)", note.title);
            self.summary.already_done += 1;
            return Ok(());
        }

        if let Some(tag) = &self.rules.tag {
            note.add_tag(tag);
        }

        let blocks = self.parse(&note)?;
        if blocks.is_empty() {
            log::debug!("Skipping note '{}' (no content)", note.title);
            self.summary.empty += 1;
            return Ok(());
        }

        let (Some(destination), Some(container)) = (self.destination, container) else {
            self.summary.parsed_only += 1;
            return Ok(());
        };

        match self.upload_with_retry(destination.workspace, container, &note, &blocks).await {
            Ok(()) => {
                self.ledger.mark_done(note.fingerprint())?;
                self.summary.uploaded += 1;
                Ok(())
            }
            Err(error) if self.rules.skip_failed && !error.is_fatal() => {
                log::error!("Failed to upload note '{}' to Notion!", note.title);
                log::debug!("{}", error);
                self.summary.failed += 1;
                Ok(())
            }
            Err(error) => Err(error),
        }
    }

    fn parse(&self, note: &Note) -> Result<Vec<Block>, AppError> {
        let blocks = parse_note(note, &self.rules, self.renderer).map_err(|error| {
            log::error!("Failed to parse note '{}'", note.title);
            if error.is_fatal() {
                error
            } else {
                AppError::ParseFailed {
                    note: note.title.clone(),
                    message: error.to_string(),
                }
            }
        })?;

        let stats = measure_blocks(&blocks);
        log::debug!(
            "Parsed note '{}': {} blocks, {} files, depth {}",
            note.title,
            stats.total_blocks,
            stats.media_blocks,
            stats.deepest_nesting
        );
        Ok(blocks)
    }

    async fn upload_with_retry(
        &self,
        workspace: &dyn NotionWorkspace,
        container: &Container,
        note: &Note,
        blocks: &[Block],
    ) -> Result<(), AppError> {
        let keep_failed = self.rules.keep_failed;
        retry_with_policy(
            self.rules.retry,
            |_| async move {
                upload_note(workspace, container, note, blocks, keep_failed)
                    .await
                    .map(|_| ())
            },
            |attempt, error| {
                log::warn!(
                    "Failed to upload note '{}' to Notion! Retrying...",
                    note.title
                );
                log::debug!("Attempt {} failed: {}", attempt, error);
            },
        )
        .await
        .map_err(|failure| {
            if failure.error.is_fatal() {
                failure.error
            } else {
                AppError::UploadFailed {
                    note: note.title.clone(),
                    attempts: failure.attempts,
                    source: Box::new(failure.error),
                }
            }
        })
    }
}

fn notebook_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| display_name(path))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notebook_name_is_file_stem() {
        assert_eq!(notebook_name(Path::new("/exports/Travel Plans.enex")), "Travel Plans");
        assert_eq!(notebook_name(Path::new("recipes.ENEX")), "recipes");
    }
}
