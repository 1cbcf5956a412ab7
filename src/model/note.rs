use crate::types::Fingerprint;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// A binary attachment embedded in a note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub data: Vec<u8>,
    pub mime: String,
    /// Hex MD5 of `data`; the note body references resources by it.
    pub md5: String,
    pub file_name: Option<String>,
}

impl Resource {
    pub fn new(data: Vec<u8>, mime: impl Into<String>, file_name: Option<String>) -> Self {
        let md5 = format!("{:x}", md5::compute(&data));
        Self {
            data,
            mime: mime.into(),
            md5,
            file_name: file_name.filter(|name| !name.trim().is_empty()),
        }
    }

    /// File name to upload under; derived from the hash when the note gave none.
    pub fn upload_name(&self) -> String {
        match &self.file_name {
            Some(name) => name.clone(),
            None => format!("{}.{}", self.md5, extension_for_mime(&self.mime)),
        }
    }

    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }

    pub fn is_pdf(&self) -> bool {
        self.mime == "application/pdf"
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }
}

fn extension_for_mime(mime: &str) -> &'static str {
    match mime {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" | "image/pjpeg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/svg+xml" => "svg",
        "image/bmp" => "bmp",
        "image/tiff" => "tiff",
        "application/pdf" => "pdf",
        "text/plain" => "txt",
        "text/html" => "html",
        "audio/mpeg" => "mp3",
        "audio/wav" | "audio/x-wav" => "wav",
        "video/mp4" => "mp4",
        "application/zip" => "zip",
        _ => "bin",
    }
}

/// One note read from an export file.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub title: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    /// ENML body.
    pub content: String,
    pub tags: Vec<String>,
    pub author: Option<String>,
    pub url: Option<String>,
    pub is_webclip: bool,
    pub resources: Vec<Arc<Resource>>,
    fingerprint: Fingerprint,
}

impl Note {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        title: String,
        created: DateTime<Utc>,
        updated: DateTime<Utc>,
        content: String,
        tags: Vec<String>,
        author: Option<String>,
        url: Option<String>,
        is_webclip: bool,
        resources: Vec<Arc<Resource>>,
    ) -> Self {
        let fingerprint = note_fingerprint(&title, &created, &updated, &content);
        Self {
            title,
            created,
            updated,
            content,
            tags,
            author,
            url,
            is_webclip,
            resources,
            fingerprint,
        }
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    /// Adds a tag unless already present. Tags are not part of the fingerprint.
    pub fn add_tag(&mut self, tag: &str) {
        if !self.tags.iter().any(|t| t == tag) {
            self.tags.push(tag.to_string());
        }
    }
}

/// Finds the resource whose MD5 matches `md5`, ignoring case.
pub fn find_resource<'r>(resources: &'r [Arc<Resource>], md5: &str) -> Option<&'r Arc<Resource>> {
    let md5 = md5.trim();
    if md5.is_empty() {
        return None;
    }
    resources.iter().find(|r| r.md5.eq_ignore_ascii_case(md5))
}

fn note_fingerprint(
    title: &str,
    created: &DateTime<Utc>,
    updated: &DateTime<Utc>,
    content: &str,
) -> Fingerprint {
    let created = created.to_rfc3339();
    let updated = updated.to_rfc3339();
    Fingerprint::compute([
        title.as_bytes(),
        created.as_bytes(),
        updated.as_bytes(),
        content.as_bytes(),
    ])
}
