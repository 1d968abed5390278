//! Crossref API client for creation-date lookup.
//!
//! One GET per DOI against `https://api.crossref.org/works/{doi}`. Every
//! outcome is folded into a [`DateResult`]: transport failures, timeouts and
//! non-success statuses become [`CreatedDate::Error`] with the cause kept for
//! the error log, while successful responses without a usable date become
//! [`CreatedDate::Unavailable`].

use crate::date::{normalize_body, CreatedDate};
use crate::error::{DoiDatesError, Result};
use std::future::Future;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Crossref works endpoint
pub const CROSSREF_API_URL: &str = "https://api.crossref.org/works";

/// Contact address sent in the user agent (Crossref polite pool)
pub const DEFAULT_MAILTO: &str = "your-email@example.com";

/// Per-request timeout
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Pause after each successful response
pub const POLITENESS_DELAY: Duration = Duration::from_millis(100);

/// Connection settings for [`CrossrefClient`]
#[derive(Debug, Clone)]
pub struct CrossrefConfig {
    /// Works endpoint; the DOI is appended as a path
    pub base_url: String,
    /// Client identification header
    pub user_agent: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Delay observed after every successful remote call
    pub delay: Duration,
}

impl CrossrefConfig {
    /// Default settings pointed at a different endpoint
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| DoiDatesError::Config(format!("Invalid base URL '{}': {}", base_url, e)))?;
        Ok(Self {
            base_url: base_url.into(),
            ..Self::default()
        })
    }

    /// Replace the contact address in the user agent
    pub fn mailto(mut self, email: &str) -> Self {
        self.user_agent = user_agent_for(email);
        self
    }

    /// URL for one work
    pub fn work_url(&self, doi: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            doi.trim()
        )
    }
}

impl Default for CrossrefConfig {
    fn default() -> Self {
        Self {
            base_url: CROSSREF_API_URL.to_string(),
            user_agent: user_agent_for(DEFAULT_MAILTO),
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            delay: POLITENESS_DELAY,
        }
    }
}

fn user_agent_for(email: &str) -> String {
    format!("DOI_Date_Retriever/1.0 (mailto:{})", email)
}

/// Outcome of one identifier lookup
#[derive(Debug)]
pub struct DateResult {
    /// Identifier as dispatched
    pub doi: String,
    /// Normalized date, or the failure that downgraded it to `Error`
    pub outcome: Result<CreatedDate>,
}

impl DateResult {
    /// Canonical date; failures map to [`CreatedDate::Error`]
    pub fn created_date(&self) -> CreatedDate {
        match &self.outcome {
            Ok(date) => *date,
            Err(_) => CreatedDate::Error,
        }
    }

    /// Diagnostic line for the error log, if the lookup failed
    pub fn diagnostic(&self) -> Option<String> {
        self.outcome
            .as_ref()
            .err()
            .map(|e| format!("Error with DOI {}: {}", self.doi, e))
    }
}

/// Whether an identifier cell should be skipped (blank or `nan`)
pub fn is_placeholder(doi: &str) -> bool {
    let doi = doi.trim();
    doi.is_empty() || doi.eq_ignore_ascii_case("nan")
}

/// A source of creation dates, one identifier at a time.
///
/// Implementations must never panic or return early with an error: every
/// failure is reported inside the returned [`DateResult`].
pub trait DateLookup: Sync {
    fn lookup(&self, doi: &str) -> impl Future<Output = DateResult> + Send;
}

/// Crossref API client
pub struct CrossrefClient {
    client: reqwest::Client,
    config: CrossrefConfig,
}

impl CrossrefClient {
    /// Create a new CrossrefClient
    pub fn new(config: CrossrefConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()
            .map_err(|e| DoiDatesError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Internal lookup implementation
    async fn do_lookup(&self, doi: &str) -> Result<CreatedDate> {
        let timeout_secs = self.config.timeout.as_secs();
        let url = self.config.work_url(doi);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| DoiDatesError::from_transport(e, timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DoiDatesError::Api {
                code: status.as_u16(),
                message: format!("Crossref API error: {}", status),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| DoiDatesError::from_transport(e, timeout_secs))?;

        let date = normalize_body(&body);

        tokio::time::sleep(self.config.delay).await;

        Ok(date)
    }
}

impl DateLookup for CrossrefClient {
    async fn lookup(&self, doi: &str) -> DateResult {
        if is_placeholder(doi) {
            return DateResult {
                doi: doi.to_string(),
                outcome: Ok(CreatedDate::Unavailable),
            };
        }

        let outcome = self.do_lookup(doi).await;
        match &outcome {
            Ok(date) => debug!(doi = %doi, date = %date, "Lookup complete"),
            Err(e) => debug!(doi = %doi, error = %e, "Lookup failed"),
        }

        DateResult {
            doi: doi.to_string(),
            outcome,
        }
    }
}
