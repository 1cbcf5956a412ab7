// src/api/simple_pagination.rs
//! Cursor pagination over list endpoints.

use super::types::{PaginatedResponse, PaginationResult};
use crate::constants::NOTION_API_PAGE_SIZE;
use crate::error::AppError;

/// Fetches all pages using async closures directly.
pub async fn fetch_all_pages_simple<T, F, Fut>(
    mut fetch_fn: F,
    max_pages: Option<u32>,
) -> Result<PaginationResult<T>, AppError>
where
    F: FnMut(u32, Option<String>) -> Fut,
    Fut: std::future::Future<Output = Result<PaginatedResponse<T>, AppError>>,
{
    let mut all_items = Vec::new();
    let mut cursor = None;
    let mut pages_fetched = 0u32;

    loop {
        if let Some(max) = max_pages {
            if pages_fetched >= max {
                log::debug!("Reached maximum page limit: {}", max);
                break;
            }
        }

        let response = fetch_fn(NOTION_API_PAGE_SIZE as u32, cursor).await?;

        let has_more = response.has_more;
        cursor = response.next_cursor;
        all_items.extend(response.results);
        pages_fetched += 1;

        if !has_more || cursor.is_none() {
            break;
        }
    }

    log::trace!("Fetched {} items over {} pages", all_items.len(), pages_fetched);
    Ok(PaginationResult { items: all_items })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[tokio::test]
    async fn test_follows_cursor_until_exhausted() {
        let cursors = RefCell::new(Vec::new());
        let result = fetch_all_pages_simple(
            |page_size, cursor: Option<String>| {
                cursors.borrow_mut().push(cursor.clone());
                async move {
                    assert_eq!(page_size, 100);
                    let (results, next) = match cursor.as_deref() {
                        None => (vec![1, 2], Some("c1".to_string())),
                        Some("c1") => (vec![3], None),
                        other => panic!("unexpected cursor {:?}", other),
                    };
                    Ok(PaginatedResponse {
                        object: "list".into(),
                        has_more: next.is_some(),
                        results,
                        next_cursor: next,
                    })
                }
            },
            None,
        )
        .await
        .unwrap();

        assert_eq!(result.items, vec![1, 2, 3]);
        assert_eq!(*cursors.borrow(), vec![None, Some("c1".to_string())]);
    }
}
