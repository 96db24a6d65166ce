// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Docscan — scan pages to PDF, recognise their text, keep an index of them.
//
// Entry point. Initialises logging, resolves the data directory, builds the
// service layer and dispatches the requested command.

mod services;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use docscan_core::error::{DocscanError, Result};
use docscan_core::human_errors::{OcrNotice, humanize_error};
use docscan_core::types::{DocumentRecord, OcrStatus};
use tracing_subscriber::EnvFilter;

use services::data_dir;
use services::scan_service::{ScanService, load_config};

#[derive(Parser)]
#[command(name = "docscan", version)]
#[command(about = "Scan pages to PDF, recognise their text, and manage saved documents")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Save page images as one PDF and recognise the first page's text
    Scan {
        /// Page images, in page order
        #[arg(required = true)]
        pages: Vec<PathBuf>,

        /// Document name (defaults to Scan_<n>)
        #[arg(short, long)]
        name: Option<String>,

        /// Seconds to wait for text recognition before saving
        #[arg(long)]
        grace_secs: Option<u64>,

        /// Keep waiting for text recognition that outlives the grace period
        #[arg(long)]
        wait: bool,
    },

    /// Recognise the text in an image or in a saved document
    Ocr {
        /// Image to recognise
        #[arg(required_unless_present = "document", conflicts_with = "document")]
        image: Option<PathBuf>,

        /// PDF path of a saved document whose page image should be recognised
        #[arg(long)]
        document: Option<String>,
    },

    /// List saved documents
    List {
        /// Print the records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Find saved documents whose name contains QUERY (case-insensitive)
    Search { query: String },

    /// Rename every saved document stored at PDF_PATH
    Rename { pdf_path: String, new_name: String },

    /// Remove every saved document stored at PDF_PATH and delete its files
    Delete { pdf_path: String },

    /// Rewrite the stored index in its current format
    Normalize,

    /// Show the effective configuration
    Config {
        /// Write the configuration file with all settings filled in
        #[arg(long)]
        write: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            let human = humanize_error(&e);
            eprintln!("error: {}", human.message);
            eprintln!("{}", human.suggestion);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let dir = data_dir::data_dir()?;
    let svc = ScanService::init(dir)?;

    match cli.command {
        Command::Scan {
            pages,
            name,
            grace_secs,
            wait,
        } => {
            let svc = match grace_secs {
                Some(secs) => svc.with_save_grace(Duration::from_secs(secs)),
                None => svc,
            };
            let saved = svc.save_scan(&pages, name.as_deref()).await?;
            println!("saved {} -> {}", saved.record.name, saved.record.pdf_path);

            let status = if wait && saved.ocr_pending() {
                eprintln!("waiting for text recognition...");
                saved.wait_for_ocr().await
            } else {
                saved.ocr
            };
            report_ocr(&status);
            Ok(ExitCode::SUCCESS)
        }

        Command::Ocr { image, document } => {
            let status = match (image, document) {
                (_, Some(pdf_path)) => svc.recognize_document(&pdf_path).await?,
                (Some(image), None) => svc.recognize(&image).await,
                (None, None) => {
                    return Err(DocscanError::Config(
                        "give an image or --document".into(),
                    ));
                }
            };
            if let OcrStatus::Success(result) = &status {
                tracing::info!(
                    source = %result.source,
                    confidence = result.confidence,
                    "text recognised"
                );
                println!("{}", result.text);
            }
            report_ocr(&status);
            Ok(if matches!(status, OcrStatus::Failed(_)) {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            })
        }

        Command::List { json } => {
            let records = svc.list()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else {
                print_records(&records);
            }
            Ok(ExitCode::SUCCESS)
        }

        Command::Search { query } => {
            print_records(&svc.search(&query)?);
            Ok(ExitCode::SUCCESS)
        }

        Command::Rename { pdf_path, new_name } => {
            let renamed = svc.rename(&pdf_path, &new_name)?;
            if renamed == 0 {
                eprintln!("no document stored at {pdf_path}");
            } else {
                println!("renamed {renamed} document(s) to {new_name}");
            }
            Ok(ExitCode::SUCCESS)
        }

        Command::Delete { pdf_path } => {
            let removed = svc.delete_document(&pdf_path).await?;
            if removed.is_empty() {
                eprintln!("no document stored at {pdf_path}");
            } else {
                println!("deleted {} document(s)", removed.len());
            }
            Ok(ExitCode::SUCCESS)
        }

        Command::Normalize => {
            let report = svc.normalize()?;
            println!(
                "{} document(s): {} migrated, {} dropped",
                report.records, report.migrated, report.dropped
            );
            Ok(ExitCode::SUCCESS)
        }

        Command::Config { write } => {
            if write {
                // The file gets what is on disk, never the env-supplied key.
                svc.save_config(&load_config(svc.data_dir()))?;
                eprintln!("wrote {}", svc.data_dir().join("config.json").display());
            }
            let mut shown = svc.config().clone();
            if shown.ocr.cloud_api_key.is_some() {
                shown.ocr.cloud_api_key = Some("<redacted>".into());
            }
            println!("{}", serde_json::to_string_pretty(&shown)?);
            println!("data directory: {}", svc.data_dir().display());
            println!("documents directory: {}", svc.documents_dir().display());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn print_records(records: &[DocumentRecord]) {
    if records.is_empty() {
        println!("no documents");
        return;
    }
    for record in records {
        let date = record
            .date
            .with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M");
        let text = if record.ocr_text.is_some() { "text" } else { "    " };
        println!("{date}  {text}  {}  {}", record.name, record.pdf_path);
    }
}

fn report_ocr(status: &OcrStatus) {
    if let Some(message) = OcrNotice::for_status(status).message() {
        eprintln!("{message}");
    }
    if let OcrStatus::Failed(reason) = status {
        eprintln!("{reason}");
    }
}
