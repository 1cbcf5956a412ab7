// src/upload/mod.rs
//! Writing parsed notes into Notion.
//!
//! The orchestrator walks notebooks and notes, resolves one container per
//! notebook, and uploads each note with retry. Everything here talks to
//! Notion through the `NotionWorkspace` trait.

pub mod containers;
pub mod mapper;
pub mod note;
pub mod orchestrator;

pub use containers::{resolve_container, resolve_root, Container, ContainerCache};
pub use mapper::BlockUploader;
pub use note::upload_note;
pub use orchestrator::{Destination, EnexUploader, UploadSummary};
