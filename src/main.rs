//! doidates - DOI Date Retriever
//!
//! Looks up the Crossref creation date of every DOI in one or more CSV
//! files, appends it as a `Created Date` column and exports full and
//! date-filtered results.
//!
//! ## Usage
//!
//! ### CLI Mode
//! ```bash
//! doidates process papers.csv more.csv --start 2020-01-01 --end 2022-12-31
//! ```
//!
//! ### HTTP Server Mode
//! ```bash
//! doidates serve --port 3000
//! ```

use anyhow::{Context, Result};
use axum::{
    extract::State,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::Local;
use clap::{Parser, Subcommand};
use doidates::{
    batch::DEFAULT_WORKERS,
    cache::{run_key, RunCache},
    crossref::{CrossrefClient, CrossrefConfig},
    csv_io::{self, Artifact},
    filter::{parse_bound, DateRange},
    pipeline::{self, RunOutput, Summary},
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::{fmt, EnvFilter};

// ============================================================================
// CLI Definition
// ============================================================================

/// DOI Date Retriever - enrich DOI tables with Crossref creation dates
#[derive(Parser)]
#[command(name = "doidates")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Retrieve creation dates for every DOI in the given CSV files
    Process {
        /// CSV files containing a DOI column
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Keep rows created on or after this date (YYYY-MM-DD)
        #[arg(long)]
        start: Option<String>,

        /// Keep rows created on or before this date (YYYY-MM-DD)
        #[arg(long)]
        end: Option<String>,

        /// Concurrent lookups
        #[arg(short, long, default_value_t = DEFAULT_WORKERS)]
        workers: usize,

        /// Output directory
        #[arg(short, long, default_value = "./output")]
        output: PathBuf,

        /// Crossref works endpoint
        #[arg(long)]
        base_url: Option<String>,

        /// Contact address sent to Crossref
        #[arg(long)]
        mailto: Option<String>,
    },

    /// Run as HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Contact address sent to Crossref
        #[arg(long)]
        mailto: Option<String>,
    },
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    if cli.json_logs {
        fmt().json().with_env_filter(filter).init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(false)
            .init();
    }

    match cli.command {
        Commands::Process {
            files,
            start,
            end,
            workers,
            output,
            base_url,
            mailto,
        } => run_process(files, start, end, workers, output, base_url, mailto).await,
        Commands::Serve { port, host, mailto } => run_server(host, port, mailto).await,
    }
}

fn crossref_config(base_url: Option<&str>, mailto: Option<&str>) -> Result<CrossrefConfig> {
    let config = match base_url {
        Some(url) => CrossrefConfig::with_base_url(url)?,
        None => CrossrefConfig::default(),
    };
    Ok(match mailto {
        Some(email) => config.mailto(email),
        None => config,
    })
}

fn parse_range(start: Option<&str>, end: Option<&str>) -> doidates::Result<DateRange> {
    Ok(DateRange::new(
        start.map(parse_bound).transpose()?,
        end.map(parse_bound).transpose()?,
    ))
}

// ============================================================================
// Process Command
// ============================================================================

async fn run_process(
    files: Vec<PathBuf>,
    start: Option<String>,
    end: Option<String>,
    workers: usize,
    output_dir: PathBuf,
    base_url: Option<String>,
    mailto: Option<String>,
) -> Result<()> {
    let range = parse_range(start.as_deref(), end.as_deref()).context("Invalid date range")?;
    let client = CrossrefClient::new(crossref_config(base_url.as_deref(), mailto.as_deref())?)?;

    println!("Processing {} files:", files.len());
    let table = csv_io::load_files(&files)?;
    println!("Total combined rows: {}", table.len());

    println!("Processing DOIs...");
    let mut last_decile = 0u32;
    let output = pipeline::process(table, &client, workers, |fraction| {
        let decile = (fraction * 10.0).floor() as u32;
        if decile > last_decile {
            last_decile = decile;
            println!("Progress: {}%", decile * 10);
        }
    })
    .await?;

    std::fs::create_dir_all(&output_dir).context("Failed to create output directory")?;
    let now = Local::now();

    if !range.is_unbounded() {
        let filtered = output.filtered(&range);
        if filtered.is_empty() {
            println!("No records found in the specified date range");
        } else {
            println!("Found {} records in date range", filtered.len());
            let path = output_dir.join(Artifact::Filtered.file_name(&now));
            csv_io::save_csv(&path, &filtered).context("Failed to save filtered results")?;
            println!("Saved filtered results: {}", path.display());
        }
    }

    let full_path = output_dir.join(Artifact::Full.file_name(&now));
    csv_io::save_csv(&full_path, &output.table).context("Failed to save full results")?;
    println!("Saved full results: {}", full_path.display());

    println!("\nSummary:\n{}", output.summary);

    if !output.errors.is_empty() {
        println!("\nErrors ({}):", output.errors.len());
        for line in &output.errors {
            println!("  {}", line);
        }
    }

    Ok(())
}

// ============================================================================
// HTTP Server
// ============================================================================

async fn run_server(host: String, port: u16, mailto: Option<String>) -> Result<()> {
    info!(host = %host, port = port, "Starting HTTP server");

    let client = CrossrefClient::new(crossref_config(None, mailto.as_deref())?)?;
    let app_state = Arc::new(AppState {
        client,
        last_run: Mutex::new(RunCache::default()),
    });

    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/process", post(process_handler))
        .route("/results", delete(clear_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .context("Invalid host:port")?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    println!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}

struct AppState {
    client: CrossrefClient,
    last_run: Mutex<RunCache<RunOutput>>,
}

impl AppState {
    fn cached_run(&self, key: u64) -> Option<Arc<RunOutput>> {
        self.last_run.lock().ok().and_then(|cache| cache.get(key))
    }

    fn store_run(&self, key: u64, output: RunOutput) -> Arc<RunOutput> {
        match self.last_run.lock() {
            Ok(mut cache) => cache.store(key, output),
            Err(_) => Arc::new(output),
        }
    }
}

/// Health check endpoint
async fn health_handler() -> &'static str {
    "OK"
}

/// One uploaded CSV document
#[derive(Debug, Deserialize)]
struct UploadedFile {
    name: String,
    content: String,
}

/// Process request body
#[derive(Debug, Deserialize)]
struct ProcessRequest {
    files: Vec<UploadedFile>,
    start_date: Option<String>,
    end_date: Option<String>,
    #[serde(default = "default_workers")]
    workers: usize,
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

/// Process response
#[derive(Debug, Default, Serialize)]
struct ProcessResponse {
    status: String,
    cached: bool,
    summary: Option<Summary>,
    rows: usize,
    errors: Vec<String>,
    full_filename: Option<String>,
    full_csv: Option<String>,
    filtered_rows: Option<usize>,
    filtered_filename: Option<String>,
    filtered_csv: Option<String>,
}

impl ProcessResponse {
    fn failed(e: impl std::fmt::Display) -> Self {
        Self {
            status: format!("error: {}", e),
            ..Default::default()
        }
    }
}

/// Process endpoint handler
async fn process_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ProcessRequest>,
) -> Json<ProcessResponse> {
    info!(files = req.files.len(), workers = req.workers, "Process request");

    let range = match parse_range(req.start_date.as_deref(), req.end_date.as_deref()) {
        Ok(range) => range,
        Err(e) => return Json(ProcessResponse::failed(e)),
    };

    let contents: Vec<&str> = req.files.iter().map(|f| f.content.as_str()).collect();
    let key = run_key(&(contents, req.workers));

    let (output, cached) = match state.cached_run(key) {
        Some(output) => (output, true),
        None => {
            let documents = req.files.iter().map(|f| (f.name.as_str(), f.content.as_str()));
            let table = match csv_io::load_documents(documents) {
                Ok(table) => table,
                Err(e) => return Json(ProcessResponse::failed(e)),
            };

            let result = pipeline::process(table, &state.client, req.workers, |fraction| {
                debug!(progress = fraction, "Progress");
            })
            .await;

            match result {
                Ok(output) => (state.store_run(key, output), false),
                Err(e) => {
                    if e.is_run_level() {
                        warn!(error = %e, "Rejected input");
                    } else {
                        error!(error = %e, "Processing failed");
                    }
                    return Json(ProcessResponse::failed(e));
                }
            }
        }
    };

    Json(render_response(&output, &range, cached))
}

fn render_response(output: &RunOutput, range: &DateRange, cached: bool) -> ProcessResponse {
    let now = Local::now();
    let full_csv = match csv_io::to_csv_string(&output.table) {
        Ok(csv) => csv,
        Err(e) => return ProcessResponse::failed(e),
    };

    let mut response = ProcessResponse {
        status: "success".to_string(),
        cached,
        summary: Some(output.summary),
        rows: output.table.len(),
        errors: output.errors.clone(),
        full_filename: Some(Artifact::Full.file_name(&now)),
        full_csv: Some(full_csv),
        ..Default::default()
    };

    if !range.is_unbounded() {
        let filtered = output.filtered(range);
        response.filtered_rows = Some(filtered.len());
        if !filtered.is_empty() {
            match csv_io::to_csv_string(&filtered) {
                Ok(csv) => {
                    response.filtered_filename = Some(Artifact::Filtered.file_name(&now));
                    response.filtered_csv = Some(csv);
                }
                Err(e) => return ProcessResponse::failed(e),
            }
        }
    }

    response
}

/// Drop the cached run
async fn clear_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let cleared = state
        .last_run
        .lock()
        .map(|mut cache| cache.clear())
        .unwrap_or(false);
    info!(cleared = cleared, "Cleared results");
    Json(serde_json::json!({ "cleared": cleared }))
}
