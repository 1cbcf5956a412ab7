// src/render/mod.rs
//! HTML rendering for web clips.
//!
//! Web clips imported as PDF are rendered by the external `wkhtmltopdf`
//! tool; the optional preview image comes from `wkhtmltoimage`. Both read
//! the page from stdin and write the result to stdout.

use crate::error::AppError;
use std::io::Write;
use std::process::{Command, Stdio};

const PDF_TOOL: &str = "wkhtmltopdf";
const IMAGE_TOOL: &str = "wkhtmltoimage";

/// Turns a standalone HTML document into PDF or image bytes.
pub trait HtmlRenderer: Send + Sync {
    /// Fails with `MissingRenderer` when the tool cannot be run.
    fn ensure_available(&self) -> Result<(), AppError>;

    fn render_pdf(&self, html: &str) -> Result<Vec<u8>, AppError>;

    /// PNG image of the page.
    fn render_preview(&self, html: &str) -> Result<Vec<u8>, AppError>;
}

/// Renderer backed by the wkhtmltopdf tool family found on `PATH`.
#[derive(Debug, Clone, Default)]
pub struct WkHtmlRenderer;

impl WkHtmlRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl HtmlRenderer for WkHtmlRenderer {
    fn ensure_available(&self) -> Result<(), AppError> {
        let output = Command::new(PDF_TOOL)
            .arg("--version")
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .map_err(|e| AppError::MissingRenderer(format!("{}: {}", PDF_TOOL, e)))?;

        if !output.status.success() {
            return Err(AppError::MissingRenderer(format!(
                "{} --version exited with {}",
                PDF_TOOL, output.status
            )));
        }

        log::debug!(
            "Using {}",
            String::from_utf8_lossy(&output.stdout).trim()
        );
        Ok(())
    }

    fn render_pdf(&self, html: &str) -> Result<Vec<u8>, AppError> {
        run_tool(PDF_TOOL, &["--quiet", "--encoding", "utf-8", "-", "-"], html)
    }

    fn render_preview(&self, html: &str) -> Result<Vec<u8>, AppError> {
        run_tool(
            IMAGE_TOOL,
            &["--quiet", "--encoding", "utf-8", "--format", "png", "-", "-"],
            html,
        )
    }
}

/// Pipes `input` through `program` and returns its stdout.
fn run_tool(program: &str, args: &[&str], input: &str) -> Result<Vec<u8>, AppError> {
    log::debug!("Running {} on {} bytes of HTML", program, input.len());

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| AppError::MissingRenderer(format!("Failed to spawn {}: {}", program, e)))?;

    // The tool may fill its stdout pipe before it finishes reading stdin.
    let writer = child.stdin.take().map(|mut stdin| {
        let payload = input.as_bytes().to_vec();
        std::thread::spawn(move || stdin.write_all(&payload))
    });

    let output = child
        .wait_with_output()
        .map_err(|e| AppError::RenderFailed(format!("Failed to wait for {}: {}", program, e)))?;

    if let Some(handle) = writer {
        match handle.join() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                return Err(AppError::RenderFailed(format!(
                    "Failed to write to {}: {}",
                    program, e
                )))
            }
            Err(_) => {
                return Err(AppError::RenderFailed(format!(
                    "Writer thread for {} panicked",
                    program
                )))
            }
        }
    }

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(AppError::RenderFailed(format!(
            "{} exited with {}: {}",
            program,
            output.status,
            stderr.trim()
        )));
    }
    if output.stdout.is_empty() {
        return Err(AppError::RenderFailed(format!("{} produced no output", program)));
    }

    Ok(output.stdout)
}
