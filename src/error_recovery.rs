// src/error_recovery.rs
//! Retry strategies for remote operations.
//!
//! Two flavours live here: exponential backoff for transient HTTP failures
//! (rate limits, 5xx), and the note-level attempt policy driven by `--retry`.

use crate::error::AppError;
use std::time::Duration;

/// Retries an async operation with exponential backoff.
///
/// Only errors the Notion API marks as transient are retried; anything else
/// is returned on the first failure.
pub async fn retry_with_backoff<F, T, Fut>(
    mut operation: F,
    max_attempts: u32,
    initial_delay: Duration,
    max_delay: Duration,
) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, AppError>>,
{
    let mut delay = initial_delay;
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if attempt < max_attempts && is_transient(&e) => {
                log::debug!("Attempt {} failed ({}), retrying after {:?}", attempt, e, delay);
                tokio::time::sleep(delay).await;

                // Exponential backoff with cap
                delay = std::cmp::min(delay * 2, max_delay);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

fn is_transient(error: &AppError) -> bool {
    match error {
        AppError::NotionService { code, .. } => code.is_retryable(),
        AppError::NotionApi { status, code, .. } => {
            *status == 429
                || *status >= 500
                || crate::error::NotionErrorCode::from_api_response(code).is_retryable()
        }
        _ => false,
    }
}

/// How many times a note upload may be attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPolicy {
    /// At most this many attempts in total (never zero).
    Bounded(u32),
    /// Keep trying until the upload succeeds or hits a fatal error.
    Unbounded,
}

impl RetryPolicy {
    /// Maps the command line count: `0` means unbounded.
    pub fn from_count(count: u32) -> Self {
        if count == 0 {
            RetryPolicy::Unbounded
        } else {
            RetryPolicy::Bounded(count)
        }
    }

    /// Whether another attempt may follow attempt number `attempt` (1-based).
    pub fn allows_after(&self, attempt: u32) -> bool {
        match self {
            RetryPolicy::Bounded(max) => attempt < *max,
            RetryPolicy::Unbounded => true,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::Bounded(crate::constants::DEFAULT_UPLOAD_ATTEMPTS)
    }
}

/// The last error of an operation that ran out of attempts.
#[derive(Debug)]
pub struct RetryFailure {
    pub attempts: u32,
    pub error: AppError,
}

/// Runs `operation` until it succeeds, the policy is exhausted, or it fails
/// with a fatal error. `on_retry` is called before every repeated attempt.
///
/// There is no delay between attempts.
pub async fn retry_with_policy<F, T, Fut, R>(
    policy: RetryPolicy,
    mut operation: F,
    mut on_retry: R,
) -> Result<T, RetryFailure>
where
    F: FnMut(u32) -> Fut,
    Fut: std::future::Future<Output = Result<T, AppError>>,
    R: FnMut(u32, &AppError),
{
    let mut attempt = 1;
    loop {
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(error) if !error.is_fatal() && policy.allows_after(attempt) => {
                on_retry(attempt, &error);
                attempt += 1;
            }
            Err(error) => {
                return Err(RetryFailure {
                    attempts: attempt,
                    error,
                })
            }
        }
    }
}
