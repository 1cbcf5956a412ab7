// src/constants.rs
//! Domain constants that define the operational boundaries of the system.
//!
//! Each constant is named for the domain concept it constrains. Most of
//! them mirror hard limits of the Notion API or conventions of the
//! Evernote note format.

// ---------------------------------------------------------------------------
// Notion API boundaries
// ---------------------------------------------------------------------------

/// How many objects the Notion API returns per page of results.
pub const NOTION_API_PAGE_SIZE: usize = 100;

/// Maximum number of blocks accepted by one "append block children" call.
pub const NOTION_MAX_CHILDREN_PER_APPEND: usize = 100;

/// Maximum length of the `content` of a single rich text object.
pub const NOTION_MAX_TEXT_LENGTH: usize = 2000;

/// Maximum number of rich text objects in one block.
pub const NOTION_MAX_RICH_TEXT_ITEMS: usize = 100;

/// Files up to this size are sent in a single request.
pub const NOTION_SINGLE_PART_UPLOAD_LIMIT: usize = 20 * 1024 * 1024;

/// Part size used for multi-part file uploads.
pub const NOTION_UPLOAD_PART_SIZE: usize = 10 * 1024 * 1024;

/// Attempts per HTTP request when Notion answers with a transient error.
pub const HTTP_RETRY_ATTEMPTS: u32 = 4;

/// First backoff delay between transient HTTP failures, in milliseconds.
pub const HTTP_RETRY_INITIAL_DELAY_MS: u64 = 500;

/// Cap on the backoff delay, in milliseconds.
pub const HTTP_RETRY_MAX_DELAY_MS: u64 = 8_000;

// ---------------------------------------------------------------------------
// Evernote note format
// ---------------------------------------------------------------------------

/// Pixels of left padding Evernote uses per indentation level.
pub const INDENT_PX_PER_LEVEL: u32 = 40;

/// Deepest indentation level the parser will reconstruct.
///
/// Notes pasted from other editors sometimes carry absurd padding values;
/// anything deeper than this is clamped.
pub const MAX_INDENT_LEVEL: usize = 10;

// ---------------------------------------------------------------------------
// Upload behaviour
// ---------------------------------------------------------------------------

/// Attempts per note when `--retry` is not given.
pub const DEFAULT_UPLOAD_ATTEMPTS: u32 = 5;

/// Suffix marking a note page whose upload has not completed.
pub const UNFINISHED_UPLOAD_SUFFIX: &str = " [UNFINISHED UPLOAD]";

/// Title of the page that holds every imported notebook.
pub const DEFAULT_ROOT_PAGE: &str = "Evernote ENEX Import";

// ---------------------------------------------------------------------------
// Error display
// ---------------------------------------------------------------------------

/// Maximum characters shown when previewing error response bodies.
pub const ERROR_BODY_PREVIEW_LENGTH: usize = 500;
