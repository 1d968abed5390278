//! Concurrent batch lookup with bounded parallelism.
//!
//! Every identifier is dispatched as its own unit of work (duplicates
//! included) and at most `workers` lookups are in flight at once. Results
//! are consumed in completion order by a single aggregator that owns the
//! date map, the error log and the progress counter, so workers share no
//! mutable state.

use crate::crossref::{is_placeholder, DateLookup};
use crate::date::CreatedDate;
use futures::stream::{self, StreamExt};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Default worker pool width
pub const DEFAULT_WORKERS: usize = 4;

/// Identifier -> canonical date. `Unavailable` results are never stored.
pub type DateMap = BTreeMap<String, CreatedDate>;

/// Aggregated result of one batch
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Dated and `Error` results keyed by identifier (last writer wins)
    pub dates: DateMap,
    /// One diagnostic line per failed lookup, in completion order
    pub errors: Vec<String>,
    /// Units dispatched
    pub dispatched: usize,
}

/// Look up every identifier with at most `workers` concurrent requests.
///
/// `on_progress` receives `completed / total` after each finished unit and
/// a final `1.0` once the batch is done (also for an empty batch).
pub async fn run_batch<L, F>(
    lookup: &L,
    identifiers: &[String],
    workers: usize,
    mut on_progress: F,
) -> BatchOutcome
where
    L: DateLookup,
    F: FnMut(f64),
{
    let units: Vec<String> = identifiers
        .iter()
        .filter(|doi| !is_placeholder(doi))
        .cloned()
        .collect();
    let total = units.len();
    let width = workers.max(1);

    info!(count = total, workers = width, "Starting batch lookup");

    let mut outcome = BatchOutcome {
        dispatched: total,
        ..Default::default()
    };

    let mut completions = stream::iter(units)
        .map(|doi| async move { lookup.lookup(&doi).await })
        .buffer_unordered(width);

    let mut completed = 0usize;
    while let Some(result) = completions.next().await {
        completed += 1;

        if let Some(line) = result.diagnostic() {
            warn!(doi = %result.doi, "{}", line);
            outcome.errors.push(line);
        }

        let date = result.created_date();
        if date != CreatedDate::Unavailable {
            outcome.dates.insert(result.doi, date);
        }

        on_progress((completed as f64 / total as f64).min(1.0));
    }

    on_progress(1.0);

    info!(
        total = total,
        stored = outcome.dates.len(),
        failed = outcome.errors.len(),
        "Batch lookup complete"
    );

    outcome
}
