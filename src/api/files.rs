// src/api/files.rs
//! Helpers for uploaded files: hosted URL parsing and size captions.

use crate::error::AppError;
use url::Url;
use uuid::Uuid;

const HOSTED_FILE_DOMAIN: &str = ".amazonaws.com";

/// Extracts the file identifier from a hosted file URL of the form
/// `https://<bucket>.amazonaws.com/<workspace-uuid>/<file-uuid>/<name>`.
pub fn extract_file_id(file_url: &str) -> Result<String, AppError> {
    let mismatch = || AppError::FormatMismatch {
        url: file_url.to_string(),
    };

    let url = Url::parse(file_url).map_err(|_| mismatch())?;
    if url.scheme() != "https" {
        return Err(mismatch());
    }
    let host = url.host_str().ok_or_else(mismatch)?;
    if !host.ends_with(HOSTED_FILE_DOMAIN) || host.len() == HOSTED_FILE_DOMAIN.len() {
        return Err(mismatch());
    }

    let segments: Vec<&str> = url
        .path_segments()
        .map(|segments| segments.collect())
        .unwrap_or_default();
    let [workspace, file, name, ..] = segments.as_slice() else {
        return Err(mismatch());
    };
    if name.is_empty() {
        return Err(mismatch());
    }

    Uuid::parse_str(workspace).map_err(|_| mismatch())?;
    let file_id = Uuid::parse_str(file).map_err(|_| mismatch())?;
    Ok(file_id.hyphenated().to_string())
}

/// Human-readable size in binary units: `100B`, `2.0KB`, `1024.0TB`.
pub fn sizeof_fmt(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{}B", bytes);
    }
    let mut size = bytes as f64;
    for unit in ["KB", "MB", "GB"] {
        size /= 1024.0;
        if size < 1024.0 {
            return format!("{:.1}{}", size, unit);
        }
    }
    format!("{:.1}TB", size / 1024.0)
}
