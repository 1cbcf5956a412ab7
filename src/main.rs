// src/main.rs

use clap::Parser;
use enex2notion::api::NotionWorkspace;
use enex2notion::config::{CommandLineInput, RunConfig, WebClipMode};
use enex2notion::upload::resolve_root;
use enex2notion::{
    AppError, Destination, DoneLedger, EnexUploader, HtmlRenderer, NotionHttpClient, PageId,
    UploadSummary, WkHtmlRenderer,
};
use log::LevelFilter;
use log4rs::{
    append::console::ConsoleAppender,
    append::file::FileAppender,
    config::{Appender, Logger, Root},
    encode::pattern::PatternEncoder,
    Config,
};
use std::path::Path;

/// Crates whose own logging is noise at our verbosity.
const QUIET_LOGGERS: [&str; 3] = ["reqwest", "hyper", "rustls"];

/// Sets up console logging plus the optional log file.
fn setup_logging(verbose: bool, log_file: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let log_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let stdout_appender = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new("{l}: {m}{n}")))
        .build();

    let mut builder =
        Config::builder().appender(Appender::builder().build("stdout", Box::new(stdout_appender)));
    let mut root = Root::builder().appender("stdout");

    if let Some(path) = log_file {
        let file_appender = FileAppender::builder()
            .encoder(Box::new(PatternEncoder::new(
                "{d(%Y-%m-%d %H:%M:%S)} [{l}] {m}{n}",
            )))
            .build(path)?;
        builder = builder.appender(Appender::builder().build("file", Box::new(file_appender)));
        root = root.appender("file");
    }

    for name in QUIET_LOGGERS {
        builder = builder.logger(Logger::builder().build(name, LevelFilter::Error));
    }

    log4rs::init_config(builder.build(root.build(log_level))?)?;
    Ok(())
}

/// Authenticates and resolves the import root. `None` means dry run.
async fn connect(config: &RunConfig) -> Result<Option<(NotionHttpClient, PageId)>, AppError> {
    let Some(api_key) = &config.api_key else {
        log::warn!("No token provided, dry run mode. Nothing will be uploaded to Notion!");
        return Ok(None);
    };

    let client = NotionHttpClient::new(api_key)?;
    client.authenticate().await?;
    let root = resolve_root(&client, &config.root_page).await?;
    Ok(Some((client, root)))
}

/// Runs the whole import described by `config`.
async fn run(config: &RunConfig) -> Result<UploadSummary, AppError> {
    let renderer = WkHtmlRenderer::new();
    let renderer: Option<&dyn HtmlRenderer> = match config.rules.mode_webclips {
        WebClipMode::Pdf => {
            renderer.ensure_available()?;
            Some(&renderer)
        }
        WebClipMode::Txt => None,
    };

    let ledger = match &config.done_file {
        Some(path) => DoneLedger::open(path)?,
        None => DoneLedger::in_memory(),
    };

    let connection = connect(config).await?;
    let destination = connection.as_ref().map(|(client, root)| Destination {
        workspace: client as &dyn NotionWorkspace,
        root,
    });

    let mut uploader = EnexUploader::new(destination, config.rules.clone(), renderer, ledger);
    uploader.upload_inputs(&config.inputs).await?;
    Ok(uploader.summary().clone())
}

fn report(summary: &UploadSummary, dry_run: bool) {
    if dry_run {
        log::info!(
            "Parsed {} notes from {} notebooks ({} empty)",
            summary.parsed_only,
            summary.notebooks,
            summary.empty
        );
        return;
    }

    log::info!(
        "Uploaded {} notes from {} notebooks",
        summary.uploaded,
        summary.notebooks
    );
    if summary.already_done > 0 {
        log::info!("{} notes were already uploaded", summary.already_done);
    }
    if summary.failed > 0 {
        log::warn!("{} notes failed to upload", summary.failed);
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CommandLineInput::parse();

    setup_logging(cli.verbose, cli.log.as_deref())?;

    let config = RunConfig::resolve(cli)?;

    match run(&config).await {
        Ok(summary) => {
            report(&summary, config.is_dry_run());
            Ok(())
        }
        Err(AppError::Authentication(details)) => {
            log::error!("Invalid token provided!");
            log::debug!("{}", details);
            std::process::exit(1);
        }
        Err(error) => {
            log::error!("{}", error);
            std::process::exit(1);
        }
    }
}
