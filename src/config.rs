// src/config.rs
use crate::constants::{DEFAULT_ROOT_PAGE, DEFAULT_UPLOAD_ATTEMPTS};
use crate::error::AppError;
use crate::error_recovery::RetryPolicy;
use crate::types::ApiKey;
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Environment variable consulted when `--token` is not given.
pub const TOKEN_ENV_VAR: &str = "NOTION_TOKEN";

/// Where notes of a notebook end up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum ImportMode {
    /// One database per notebook, one row per note
    #[default]
    #[value(name = "DB")]
    Db,
    /// One page per notebook, one sub-page per note
    #[value(name = "PAGE")]
    Page,
}

/// How web clips are converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum WebClipMode {
    /// Plain text paragraph
    #[default]
    #[value(name = "TXT")]
    Txt,
    /// PDF rendering of the clipped page
    #[value(name = "PDF")]
    Pdf,
}

/// Line condensing applied after parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CondenseMode {
    #[default]
    Off,
    /// Runs of plain lines merge into one paragraph; blank lines are dropped.
    Condensed,
    /// Like `Condensed`, but one blank paragraph separates merged groups.
    Sparse,
}

/// Per-run conversion and upload settings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Rules {
    pub mode: ImportMode,
    pub mode_webclips: WebClipMode,
    pub add_pdf_preview: bool,
    pub add_meta: bool,
    pub condense_lines: CondenseMode,
    pub tag: Option<String>,
    pub retry: RetryPolicy,
    pub skip_failed: bool,
    pub keep_failed: bool,
}

/// Parsed and validated command-line input.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Uploads Evernote ENEX exports into a Notion workspace",
    long_about = None
)]
pub struct CommandLineInput {
    /// ENEX files or directories containing them
    #[arg(value_name = "FILE/DIR", required = true)]
    pub enex_input: Vec<PathBuf>,

    /// Notion integration token (falls back to the NOTION_TOKEN environment variable).
    /// Without a token nothing is uploaded (dry run).
    #[arg(long)]
    pub token: Option<String>,

    /// Title of the page that receives the imported notebooks
    #[arg(long, value_name = "NAME", default_value = DEFAULT_ROOT_PAGE)]
    pub root_page: String,

    /// Upload notebooks as databases or as pages
    #[arg(long, value_enum, default_value_t = ImportMode::Db)]
    pub mode: ImportMode,

    /// Convert web clips to text or to PDF (PDF needs wkhtmltopdf)
    #[arg(long, value_enum, default_value_t = WebClipMode::Txt)]
    pub mode_webclips: WebClipMode,

    /// Put a preview image above PDF web clips
    #[arg(long, default_value_t = false)]
    pub add_pdf_preview: bool,

    /// Prepend a block with the note's metadata (dates, tags, author, URL)
    #[arg(long, default_value_t = false)]
    pub add_meta: bool,

    /// Add this tag to every uploaded note
    #[arg(long)]
    pub tag: Option<String>,

    /// Merge consecutive text lines into paragraphs
    #[arg(long, default_value_t = false)]
    pub condense_lines: bool,

    /// Like --condense-lines, but keep a blank line between paragraphs
    #[arg(long, default_value_t = false)]
    pub condense_lines_sparse: bool,

    /// Upload attempts per note (0 = retry forever)
    #[arg(long, value_name = "N", default_value_t = DEFAULT_UPLOAD_ATTEMPTS)]
    pub retry: u32,

    /// Continue with the next note when a note fails to upload
    #[arg(long, default_value_t = false)]
    pub skip_failed: bool,

    /// Keep partially uploaded pages instead of deleting them
    #[arg(long, default_value_t = false)]
    pub keep_failed: bool,

    /// File recording uploaded notes; notes listed there are skipped
    #[arg(long, value_name = "FILE")]
    pub done_file: Option<PathBuf>,

    /// Also write the log to this file
    #[arg(long, value_name = "FILE")]
    pub log: Option<PathBuf>,

    /// Enable verbose logging (debug level)
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

/// Resolved run configuration — validated and ready to drive the import.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub inputs: Vec<PathBuf>,
    /// `None` means dry run.
    pub api_key: Option<ApiKey>,
    pub root_page: String,
    pub rules: Rules,
    pub done_file: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    pub verbose: bool,
}

impl RunConfig {
    /// Resolves a complete run configuration from CLI input and environment.
    pub fn resolve(cli: CommandLineInput) -> Result<Self, AppError> {
        let token = cli
            .token
            .or_else(|| std::env::var(TOKEN_ENV_VAR).ok())
            .filter(|t| !t.trim().is_empty());
        let api_key = token.map(ApiKey::new).transpose()?;

        if cli.root_page.trim().is_empty() {
            return Err(AppError::MissingConfiguration(
                "--root-page cannot be empty".to_string(),
            ));
        }

        let condense_lines = if cli.condense_lines_sparse {
            CondenseMode::Sparse
        } else if cli.condense_lines {
            CondenseMode::Condensed
        } else {
            CondenseMode::Off
        };

        let rules = Rules {
            mode: cli.mode,
            mode_webclips: cli.mode_webclips,
            add_pdf_preview: cli.add_pdf_preview,
            add_meta: cli.add_meta,
            condense_lines,
            tag: cli.tag.filter(|t| !t.trim().is_empty()),
            retry: RetryPolicy::from_count(cli.retry),
            skip_failed: cli.skip_failed,
            keep_failed: cli.keep_failed,
        };

        Ok(RunConfig {
            inputs: validate_inputs(cli.enex_input)?,
            api_key,
            root_page: cli.root_page,
            rules,
            done_file: cli.done_file,
            log_file: cli.log,
            verbose: cli.verbose,
        })
    }

    pub fn is_dry_run(&self) -> bool {
        self.api_key.is_none()
    }
}

/// Checks that every input path exists. Directories are expanded later,
/// when they are processed.
fn validate_inputs(paths: Vec<PathBuf>) -> Result<Vec<PathBuf>, AppError> {
    if let Some(missing) = paths.iter().find(|path| !path.exists()) {
        return Err(AppError::MissingConfiguration(format!(
            "Input path does not exist: {}",
            missing.display()
        )));
    }
    Ok(paths)
}

/// Expands directories into the `.enex` files below them.
///
/// Files named explicitly are kept as given; files found in a directory are
/// sorted by path.
pub fn discover_inputs(paths: &[PathBuf]) -> Result<Vec<PathBuf>, AppError> {
    let mut inputs = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(path)
                .follow_links(true)
                .into_iter()
                .filter_map(|entry| match entry {
                    Ok(entry) => Some(entry),
                    Err(err) => {
                        log::warn!("Skipping unreadable entry under '{}': {}", path.display(), err);
                        None
                    }
                })
                .filter(|entry| entry.file_type().is_file() && is_enex(entry.path()))
                .map(|entry| entry.into_path())
                .collect();
            found.sort();
            inputs.extend(found);
        } else if path.is_file() {
            inputs.push(path.clone());
        } else {
            return Err(AppError::MissingConfiguration(format!(
                "Input path does not exist: {}",
                path.display()
            )));
        }
    }
    Ok(inputs)
}

fn is_enex(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("enex"))
        .unwrap_or(false)
}
