// src/api/client.rs
//! HTTP client for the Notion API.
//!
//! A thin wrapper around reqwest that handles authentication headers and
//! request logging, plus the `NotionWorkspace` implementation built on it.
//! Transient failures (rate limits, 5xx) are retried with backoff here;
//! everything else is surfaced to the caller.

use super::parser::{
    parse_api_response, parse_appended_blocks, parse_children_pagination, parse_empty_response,
    parse_search_pagination,
};
use super::payload::page_title_properties;
use super::responses::{DatabaseObject, FileUploadObject, ObjectRef};
use super::simple_pagination::fetch_all_pages_simple;
use super::types::{AppendedBlock, ChildObject, DatabaseInfo, PageParent, PageSummary};
use super::NotionWorkspace;
use crate::constants::{
    HTTP_RETRY_ATTEMPTS, HTTP_RETRY_INITIAL_DELAY_MS, HTTP_RETRY_MAX_DELAY_MS,
    NOTION_SINGLE_PART_UPLOAD_LIMIT, NOTION_UPLOAD_PART_SIZE,
};
use crate::error::{AppError, NotionErrorCode};
use crate::error_recovery::retry_with_backoff;
use crate::model::Resource;
use crate::types::{ApiKey, DatabaseId, FileUploadId, NotionId, PageId};
use indexmap::IndexMap;
use reqwest::{header, multipart, Client, Method, Response};
use serde_json::{json, Value};
use std::time::Duration;

const NOTION_VERSION: &str = "2022-06-28";
const API_BASE_URL: &str = "https://api.notion.com/v1";
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

type ParseFn<T> = fn(ApiResponse<String>) -> Result<T, AppError>;

/// A thin wrapper around reqwest Client for Notion API requests.
#[derive(Clone)]
pub struct NotionHttpClient {
    client: Client,
}

impl NotionHttpClient {
    /// Creates a new HTTP client with Notion API authentication.
    pub fn new(api_key: &ApiKey) -> Result<Self, AppError> {
        let client = Client::builder()
            .default_headers(Self::create_headers(api_key)?)
            .build()?;
        Ok(Self { client })
    }

    /// Creates the default headers for Notion API requests.
    fn create_headers(api_key: &ApiKey) -> Result<header::HeaderMap, AppError> {
        let mut headers = header::HeaderMap::new();

        let auth_header = format!("Bearer {}", api_key.as_str());
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&auth_header).map_err(|e| {
                AppError::MissingConfiguration(format!("Invalid API token format: {}", e))
            })?,
        );

        headers.insert(
            "Notion-Version",
            header::HeaderValue::from_static(NOTION_VERSION),
        );

        Ok(headers)
    }

    /// Makes a GET request to the specified endpoint.
    pub async fn get(&self, endpoint: &str) -> Result<Response, AppError> {
        self.send(&Method::GET, endpoint, None).await
    }

    /// Makes a POST request with JSON body to the specified endpoint.
    pub async fn post(&self, endpoint: &str, body: &Value) -> Result<Response, AppError> {
        self.send(&Method::POST, endpoint, Some(body)).await
    }

    /// Makes a PATCH request with JSON body to the specified endpoint.
    pub async fn patch(&self, endpoint: &str, body: &Value) -> Result<Response, AppError> {
        self.send(&Method::PATCH, endpoint, Some(body)).await
    }

    pub async fn delete(&self, endpoint: &str) -> Result<Response, AppError> {
        self.send(&Method::DELETE, endpoint, None).await
    }

    async fn send(
        &self,
        method: &Method,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<Response, AppError> {
        let url = format!("{}/{}", API_BASE_URL, endpoint);
        log::debug!("{} {}", method, url);

        let mut request = self.client.request(method.clone(), url);
        if let Some(body) = body {
            request = request.json(body);
        }
        Ok(request.send().await?)
    }

    async fn send_and_parse<T>(
        &self,
        method: &Method,
        endpoint: &str,
        body: Option<&Value>,
        parse: ParseFn<T>,
    ) -> Result<T, AppError> {
        let response = self.send(method, endpoint, body).await?;
        let result = extract_response_text(response).await?;
        parse(result)
    }

    /// Sends a request, retrying transient failures, and parses the result.
    async fn execute<T>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
        parse: ParseFn<T>,
    ) -> Result<T, AppError> {
        retry_with_backoff(
            || self.send_and_parse(&method, endpoint, body, parse),
            HTTP_RETRY_ATTEMPTS,
            Duration::from_millis(HTTP_RETRY_INITIAL_DELAY_MS),
            Duration::from_millis(HTTP_RETRY_MAX_DELAY_MS),
        )
        .await
    }

    async fn send_part(
        &self,
        upload_id: &str,
        data: &[u8],
        file_name: &str,
        content_type: &str,
        part_number: Option<usize>,
    ) -> Result<FileUploadObject, AppError> {
        let endpoint = format!("file_uploads/{}/send", upload_id);
        let url = format!("{}/{}", API_BASE_URL, endpoint);
        log::debug!("POST {} ({} bytes)", url, data.len());

        let part = multipart::Part::bytes(data.to_vec())
            .file_name(file_name.to_string())
            .mime_str(content_type)?;
        let mut form = multipart::Form::new().part("file", part);
        if let Some(number) = part_number {
            form = form.text("part_number", number.to_string());
        }

        let response = self.client.post(url).multipart(form).send().await?;
        let result = extract_response_text(response).await?;
        parse_api_response(result)
    }

    async fn send_part_with_retry(
        &self,
        upload_id: &str,
        data: &[u8],
        file_name: &str,
        content_type: &str,
        part_number: Option<usize>,
    ) -> Result<FileUploadObject, AppError> {
        retry_with_backoff(
            || self.send_part(upload_id, data, file_name, content_type, part_number),
            HTTP_RETRY_ATTEMPTS,
            Duration::from_millis(HTTP_RETRY_INITIAL_DELAY_MS),
            Duration::from_millis(HTTP_RETRY_MAX_DELAY_MS),
        )
        .await
    }
}

fn content_type_of(resource: &Resource) -> &str {
    let mime = resource.mime.as_str();
    if mime.contains('/') && header::HeaderValue::from_str(mime).is_ok() {
        mime
    } else {
        FALLBACK_CONTENT_TYPE
    }
}

fn is_unauthorized(error: &AppError) -> bool {
    match error {
        AppError::NotionApi { status, .. } => *status == 401,
        AppError::NotionService { code, .. } => *code == NotionErrorCode::Unauthorized,
        _ => false,
    }
}

#[async_trait::async_trait]
impl NotionWorkspace for NotionHttpClient {
    async fn authenticate(&self) -> Result<(), AppError> {
        let result: Result<ObjectRef, AppError> = self
            .execute(Method::GET, "users/me", None, parse_api_response)
            .await;
        match result {
            Ok(user) => {
                log::debug!("Authenticated as integration {}", user.id);
                Ok(())
            }
            Err(e) if is_unauthorized(&e) => Err(AppError::Authentication(e.to_string())),
            Err(e) => Err(e),
        }
    }

    async fn search_pages(&self, query: &str) -> Result<Vec<PageSummary>, AppError> {
        let pagination_result = fetch_all_pages_simple(
            |page_size, cursor| {
                let mut body = json!({
                    "query": query,
                    "filter": { "property": "object", "value": "page" },
                    "page_size": page_size,
                });
                if let Some(cursor) = cursor {
                    body["start_cursor"] = json!(cursor);
                }
                async move {
                    self.execute(Method::POST, "search", Some(&body), parse_search_pagination)
                        .await
                }
            },
            None,
        )
        .await?;
        Ok(pagination_result.items)
    }

    async fn create_workspace_page(&self, title: &str) -> Result<PageId, AppError> {
        let body = json!({
            "parent": { "type": "workspace", "workspace": true },
            "properties": page_title_properties("title", title),
        });
        let page: ObjectRef = self
            .execute(Method::POST, "pages", Some(&body), parse_api_response)
            .await?;
        Ok(PageId::parse(&page.id)?)
    }

    async fn list_children(&self, parent: &NotionId) -> Result<Vec<ChildObject>, AppError> {
        let base = format!("blocks/{}/children", parent.to_hyphenated());
        let pagination_result = fetch_all_pages_simple(
            |page_size, cursor| {
                let endpoint = match cursor {
                    Some(cursor) => format!("{}?page_size={}&start_cursor={}", base, page_size, cursor),
                    None => format!("{}?page_size={}", base, page_size),
                };
                async move {
                    self.execute(Method::GET, &endpoint, None, parse_children_pagination)
                        .await
                }
            },
            None,
        )
        .await?;
        Ok(pagination_result.items)
    }

    async fn create_page(&self, parent: &PageParent, properties: Value) -> Result<PageId, AppError> {
        let parent = match parent {
            PageParent::Page(id) => json!({ "type": "page_id", "page_id": id.to_dashed() }),
            PageParent::Database(id) => {
                json!({ "type": "database_id", "database_id": id.to_dashed() })
            }
        };
        let body = json!({ "parent": parent, "properties": properties });
        let page: ObjectRef = self
            .execute(Method::POST, "pages", Some(&body), parse_api_response)
            .await?;
        Ok(PageId::parse(&page.id)?)
    }

    async fn create_database(
        &self,
        parent: &PageId,
        title: &str,
        schema: &IndexMap<String, Value>,
    ) -> Result<DatabaseInfo, AppError> {
        let body = json!({
            "parent": { "type": "page_id", "page_id": parent.to_dashed() },
            "title": [{ "type": "text", "text": { "content": title } }],
            "properties": schema,
        });
        let database: DatabaseObject = self
            .execute(Method::POST, "databases", Some(&body), parse_api_response)
            .await?;
        database.into_info()
    }

    async fn retrieve_database(&self, id: &DatabaseId) -> Result<DatabaseInfo, AppError> {
        let endpoint = format!("databases/{}", id.to_dashed());
        let database: DatabaseObject = self
            .execute(Method::GET, &endpoint, None, parse_api_response)
            .await?;
        database.into_info()
    }

    async fn add_database_properties(
        &self,
        id: &DatabaseId,
        properties: &IndexMap<String, Value>,
    ) -> Result<DatabaseInfo, AppError> {
        let endpoint = format!("databases/{}", id.to_dashed());
        let body = json!({ "properties": properties });
        let database: DatabaseObject = self
            .execute(Method::PATCH, &endpoint, Some(&body), parse_api_response)
            .await?;
        database.into_info()
    }

    async fn append_children(
        &self,
        parent: &NotionId,
        children: &[Value],
    ) -> Result<Vec<AppendedBlock>, AppError> {
        let endpoint = format!("blocks/{}/children", parent.to_hyphenated());
        let body = json!({ "children": children });
        self.execute(Method::PATCH, &endpoint, Some(&body), parse_appended_blocks)
            .await
    }

    async fn set_page_title(
        &self,
        page: &PageId,
        title_property: &str,
        title: &str,
    ) -> Result<(), AppError> {
        let endpoint = format!("pages/{}", page.to_dashed());
        let body = json!({ "properties": page_title_properties(title_property, title) });
        self.execute(Method::PATCH, &endpoint, Some(&body), parse_empty_response)
            .await
    }

    async fn delete_block(&self, id: &NotionId) -> Result<(), AppError> {
        let endpoint = format!("blocks/{}", id.to_hyphenated());
        self.execute(Method::DELETE, &endpoint, None, parse_empty_response)
            .await
    }

    async fn upload_file(&self, resource: &Resource) -> Result<FileUploadId, AppError> {
        let file_name = resource.upload_name();
        let content_type = content_type_of(resource);

        let upload: FileUploadObject = if resource.size() <= NOTION_SINGLE_PART_UPLOAD_LIMIT {
            let body = json!({
                "mode": "single_part",
                "filename": file_name,
                "content_type": content_type,
            });
            let created: FileUploadObject = self
                .execute(Method::POST, "file_uploads", Some(&body), parse_api_response)
                .await?;
            self.send_part_with_retry(&created.id, &resource.data, &file_name, content_type, None)
                .await?
        } else {
            let parts: Vec<&[u8]> = resource.data.chunks(NOTION_UPLOAD_PART_SIZE).collect();
            let body = json!({
                "mode": "multi_part",
                "number_of_parts": parts.len(),
                "filename": file_name,
                "content_type": content_type,
            });
            let created: FileUploadObject = self
                .execute(Method::POST, "file_uploads", Some(&body), parse_api_response)
                .await?;
            for (index, part) in parts.iter().enumerate() {
                self.send_part_with_retry(
                    &created.id,
                    part,
                    &file_name,
                    content_type,
                    Some(index + 1),
                )
                .await?;
            }
            let endpoint = format!("file_uploads/{}/complete", created.id);
            self.execute(Method::POST, &endpoint, Some(&json!({})), parse_api_response)
                .await?
        };

        log::debug!(
            "Uploaded '{}' ({} bytes), status {}",
            file_name,
            resource.size(),
            upload.status
        );
        Ok(FileUploadId::parse(&upload.id)?)
    }
}

/// Result of an HTTP operation with response metadata.
#[derive(Debug)]
pub struct ApiResponse<T> {
    pub data: T,
    pub status: reqwest::StatusCode,
    pub url: String,
}

/// Extracts the response body as text with metadata.
pub async fn extract_response_text(response: Response) -> Result<ApiResponse<String>, AppError> {
    let status = response.status();
    let url = response.url().to_string();
    let text = response.text().await?;

    Ok(ApiResponse {
        data: text,
        status,
        url,
    })
}
