//! # doidates
//!
//! DOI Date Retriever - enrich DOI tables with Crossref creation dates.
//!
//! ## Modules
//!
//! - [`date`] - Canonical `YYYY` / `YYYY-MM` dates and payload normalization
//! - [`crossref`] - Crossref API client, one lookup per DOI
//! - [`batch`] - Concurrent batch lookup with progress reporting
//! - [`table`] - Table/record/cell model
//! - [`csv_io`] - CSV import and export
//! - [`merge`] - Join results onto rows and sort by date
//! - [`filter`] - Inclusive date range filtering
//! - [`pipeline`] - End-to-end run and summary counts
//! - [`cache`] - Single-entry cache of the last run
//! - [`error`] - Custom error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use doidates::{crossref::{CrossrefClient, CrossrefConfig}, csv_io, pipeline};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let table = csv_io::load_files(&[std::path::PathBuf::from("papers.csv")])?;
//!     let client = CrossrefClient::new(CrossrefConfig::default())?;
//!     let output = pipeline::process(table, &client, 4, |_| {}).await?;
//!     println!("{}", output.summary);
//!     Ok(())
//! }
//! ```

pub mod batch;
pub mod cache;
pub mod crossref;
pub mod csv_io;
pub mod date;
pub mod error;
pub mod filter;
pub mod merge;
pub mod pipeline;
pub mod table;

pub use error::{DoiDatesError, Result};
