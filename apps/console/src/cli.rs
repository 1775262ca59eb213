//! Terminal front end: turns commands into intake/vision actions and prints what the views would show.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use tracing::info;

use crate::config::Config;
use crate::dispatcher::HttpDispatcher;
use crate::models::history::{DocumentList, DocumentRecord, IntakeHistory};
use crate::models::UploadFile;
use crate::render::render_vision;
use crate::render::text::{format_fields, format_vision};
use crate::session::{IntakeSession, Outcome, RequestState, VisionSession};
use crate::stub::{self, Fixtures, StubState};

/// Recruiting pipeline console.
#[derive(Parser, Debug)]
#[command(author, version, about = "Recruiting pipeline console: intake and document extraction", long_about = None)]
pub struct Cli {
    /// Base URL of the pipeline API (overrides PIPELINE_API_BASE).
    #[arg(long, global = true)]
    pub api_base: Option<String>,

    /// Request timeout in seconds (overrides REQUEST_TIMEOUT_SECS).
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Print results as JSON.
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase log verbosity.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract hiring preferences from a free-text description.
    Text {
        text: String,
    },
    /// Extract hiring preferences from an image or document.
    Image {
        path: PathBuf,
    },
    /// Extract hiring preferences from a voice recording (not implemented; sends a canned transcript).
    Voice,
    /// Extract fields from one or more documents.
    Vision {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// List recent intakes.
    History {
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
    /// List processed documents.
    Documents {
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
    /// Show one processed document with its extracted fields.
    Document {
        id: u64,
    },
    /// Serve a local stand-in backend with canned extraction payloads.
    Stub {
        /// Port to listen on (overrides STUB_PORT).
        #[arg(short, long)]
        port: Option<u16>,
        /// JSON fixtures file replacing the built-in payloads.
        #[arg(long)]
        fixtures: Option<PathBuf>,
    },
}

pub async fn run(cli: Cli, config: Config) -> Result<()> {
    let json = cli.json;
    match cli.command {
        Commands::Stub { port, fixtures } => {
            let fixtures = match fixtures {
                Some(path) => Fixtures::load(&path).await?,
                None => Fixtures::builtin().context("built-in fixtures are malformed")?,
            };
            stub::serve(port.unwrap_or(config.stub_port), StubState::new(fixtures)).await
        }
        Commands::Text { text } => {
            let session = intake_session(&config)?;
            let outcome = session.submit_text(&text).await;
            report_intake(&session, outcome, json).await
        }
        Commands::Image { path } => {
            let file = read_upload(&path).await?;
            let session = intake_session(&config)?;
            let outcome = session.submit_image(file).await;
            report_intake(&session, outcome, json).await
        }
        Commands::Voice => {
            let session = intake_session(&config)?;
            let outcome = session.submit_voice().await;
            report_intake(&session, outcome, json).await
        }
        Commands::Vision { paths } => run_vision(&config, &paths, json).await,
        Commands::History { limit } => {
            let history = dispatcher(&config)?.intake_history(limit).await?;
            if json {
                print_json(&history)
            } else {
                print!("{}", format_history(&history));
                Ok(())
            }
        }
        Commands::Documents { limit } => {
            let documents = dispatcher(&config)?.list_documents(limit).await?;
            if json {
                print_json(&documents)
            } else {
                print!("{}", format_documents(&documents));
                Ok(())
            }
        }
        Commands::Document { id } => {
            let doc = dispatcher(&config)?.get_document(id).await?;
            if json {
                print_json(&doc)
            } else {
                print!("{}", format_document(&doc));
                Ok(())
            }
        }
    }
}

fn dispatcher(config: &Config) -> Result<HttpDispatcher> {
    let dispatcher = HttpDispatcher::new(config).context("building HTTP client")?;
    info!("Dispatching to {}", dispatcher.base());
    Ok(dispatcher)
}

fn intake_session(config: &Config) -> Result<IntakeSession> {
    Ok(IntakeSession::new(Arc::new(dispatcher(config)?)))
}

async fn run_vision(config: &Config, paths: &[PathBuf], json: bool) -> Result<()> {
    let session = VisionSession::new(Arc::new(dispatcher(config)?));
    let mut failures = 0;

    for path in paths {
        let file = read_upload(path).await?;
        session.submit_document(file).await;

        match (session.state(), session.rendered()) {
            (_, Some((doc_type, rows))) => {
                if json {
                    print_json(&json!({ "file": path, "doc_type": doc_type, "fields": rows }))?;
                } else {
                    println!("== {}", path.display());
                    print!("{}", format_vision(&doc_type, &rows));
                }
            }
            (RequestState::Failed(e), _) => {
                failures += 1;
                eprintln!("{}: {e}", path.display());
            }
            _ => {}
        }
    }

    let processed = session.processed();
    if json {
        print_json(&json!({ "processed": processed }))?;
    } else {
        println!("Processed documents ({} files)", processed.len());
        for doc in &processed {
            println!("  {} · {} · {} fields", doc.name, doc.doc_type, doc.field_count);
        }
    }

    if failures > 0 {
        bail!("{failures} of {} documents failed", paths.len());
    }
    Ok(())
}

async fn report_intake(session: &IntakeSession, outcome: Outcome, json: bool) -> Result<()> {
    if let Outcome::Rejected(e) = outcome {
        bail!("nothing submitted: {e}");
    }

    match session.state() {
        RequestState::Succeeded(_) => {
            let fields = session.rendered().unwrap_or_default();
            if json {
                print_json(&fields)
            } else if fields.is_empty() {
                println!("No fields extracted");
                Ok(())
            } else {
                print!("{}", format_fields(&fields));
                Ok(())
            }
        }
        RequestState::Failed(e) => bail!("{e}"),
        RequestState::Idle | RequestState::Pending => Ok(()),
    }
}

/// Reads a file from disk into an upload, named after the file.
pub async fn read_upload(path: &Path) -> Result<UploadFile> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload.bin")
        .to_string();
    UploadFile::new(bytes, filename).with_context(|| format!("cannot upload {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn format_history(history: &IntakeHistory) -> String {
    let mut out = format!("Recent intakes ({})\n", history.total);
    for intake in &history.intakes {
        out.push_str(&format!(
            "  #{:<4} {:<6} {:<32} {:<10} {}\n",
            intake.id,
            intake.mode,
            intake.job_title().unwrap_or("Unknown Role"),
            intake.status,
            intake.created_at.format("%Y-%m-%d %H:%M")
        ));
    }
    out
}

fn format_documents(list: &DocumentList) -> String {
    let mut out = format!("Processed documents ({})\n", list.total);
    for doc in &list.documents {
        let fields = doc.extracted_fields.as_ref().map_or(0, Vec::len);
        out.push_str(&format!(
            "  #{:<4} {} · {} · {} fields · {}\n",
            doc.id,
            doc.filename,
            doc.doc_type.as_deref().unwrap_or("Document"),
            fields,
            doc.status
        ));
    }
    out
}

fn format_document(doc: &DocumentRecord) -> String {
    let doc_type = doc.doc_type.as_deref().unwrap_or("Document");
    let mut out = format!("#{} {} ({})\n", doc.id, doc.filename, doc.status);
    match &doc.extracted_fields {
        Some(fields) => out.push_str(&format_vision(doc_type, &render_vision(fields))),
        None => out.push_str(&format!("{doc_type}: no fields extracted yet\n")),
    }
    out
}
