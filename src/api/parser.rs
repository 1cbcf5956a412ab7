// src/api/parser.rs
//! Turns raw HTTP results into typed responses or structured errors.

use super::client::ApiResponse;
use super::responses::{BlockObject, NotionError, PageObject};
use super::types::{AppendedBlock, ChildObject, PageSummary, PaginatedResponse};
use crate::constants::ERROR_BODY_PREVIEW_LENGTH;
use crate::error::{AppError, NotionErrorCode};
use reqwest::StatusCode;

/// Parse any Notion API response into `T`, or into the error it carries.
pub fn parse_api_response<T>(result: ApiResponse<String>) -> Result<T, AppError>
where
    T: serde::de::DeserializeOwned,
{
    if result.status.is_success() {
        parse_success(&result.data, &result.url)
    } else {
        parse_error(&result.data, result.status, &result.url)
    }
}

fn parse_success<T>(body: &str, url: &str) -> Result<T, AppError>
where
    T: serde::de::DeserializeOwned,
{
    serde_json::from_str(body).map_err(|e| {
        log::error!("Failed to parse response from {}: {}", url, e);
        AppError::MalformedResponse(format!("{}; body: {}", e, preview(body)))
    })
}

fn preview(body: &str) -> String {
    if body.len() <= ERROR_BODY_PREVIEW_LENGTH {
        return body.to_string();
    }
    let mut end = ERROR_BODY_PREVIEW_LENGTH;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

fn parse_error<T>(body: &str, status: StatusCode, url: &str) -> Result<T, AppError> {
    if let Ok(notion_error) = serde_json::from_str::<NotionError>(body) {
        log::debug!(
            "{} failed with {} ({}): {}",
            url,
            notion_error.status,
            notion_error.code,
            notion_error.message
        );
        return Err(AppError::NotionApi {
            status: notion_error.status,
            code: notion_error.code,
            message: notion_error.message,
            request_id: notion_error.request_id,
        });
    }

    // Fallback to generic error with HTTP status code
    Err(AppError::NotionService {
        code: NotionErrorCode::from_http_status(status.as_u16()),
        message: format!("HTTP {} from {}", status, url),
        status,
    })
}

/// Succeeds on any 2xx status, ignoring the body.
pub fn parse_empty_response(result: ApiResponse<String>) -> Result<(), AppError> {
    if result.status.is_success() {
        Ok(())
    } else {
        parse_error(&result.data, result.status, &result.url)
    }
}

pub fn parse_search_pagination(
    result: ApiResponse<String>,
) -> Result<PaginatedResponse<PageSummary>, AppError> {
    let response: PaginatedResponse<serde_json::Value> = parse_api_response(result)?;
    let mut results = Vec::new();
    for item in response.results {
        // Search may return databases too; only pages are containers here.
        if item.get("object").and_then(|o| o.as_str()) != Some("page") {
            continue;
        }
        let page: PageObject = serde_json::from_value(item)?;
        results.push(page.into_summary()?);
    }
    Ok(PaginatedResponse {
        object: response.object,
        results,
        next_cursor: response.next_cursor,
        has_more: response.has_more,
    })
}

pub fn parse_children_pagination(
    result: ApiResponse<String>,
) -> Result<PaginatedResponse<ChildObject>, AppError> {
    let response: PaginatedResponse<BlockObject> = parse_api_response(result)?;
    Ok(PaginatedResponse {
        object: response.object,
        results: response
            .results
            .into_iter()
            .map(BlockObject::into_child)
            .collect::<Result<_, _>>()?,
        next_cursor: response.next_cursor,
        has_more: response.has_more,
    })
}

pub fn parse_appended_blocks(result: ApiResponse<String>) -> Result<Vec<AppendedBlock>, AppError> {
    let response: PaginatedResponse<BlockObject> = parse_api_response(result)?;
    response
        .results
        .into_iter()
        .map(BlockObject::into_appended)
        .collect()
}
