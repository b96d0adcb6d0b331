//! Multi-query batch runner
//!
//! Looks up queries one after another through a [`LookupClient`], reporting
//! through a [`BatchObserver`]. Recoverable failures become error rows;
//! cancellation and verification challenges end the run early with the rows
//! collected so far.

pub mod observer;

pub use observer::{BatchObserver, NoOpObserver};

use serde::Serialize;
use std::collections::HashSet;
use tracing::{error, info, warn};

use crate::client::LookupClient;
use crate::error::{LookupError, LookupResult};
use crate::fetch_engine::CancellationSignal;
use crate::models::SearchResult;
use crate::utils::{clean_tax_code, is_valid_tax_code};

/// Outcome for one query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchRow {
    pub query: String,
    /// First match, details merged when they could be fetched
    pub result: Option<SearchResult>,
    pub error: Option<String>,
}

impl BatchRow {
    fn found(query: &str, result: Option<SearchResult>) -> Self {
        Self {
            query: query.to_string(),
            result,
            error: None,
        }
    }

    fn failed(query: &str, error: &LookupError) -> Self {
        Self {
            query: query.to_string(),
            result: None,
            error: Some(error.to_string()),
        }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Rows collected by a run and how it ended
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchOutcome {
    pub rows: Vec<BatchRow>,
    /// Queries that produced a row
    pub completed: usize,
    pub cancelled: bool,
    /// Stopped by a verification challenge
    pub blocked: bool,
}

/// Batch form of one input line.
///
/// Lines made only of digits and `-`/`.`/space separators are treated as tax
/// codes: they are reduced to their digits, or dropped when the digit count
/// is not a valid tax code. Anything else is kept as a trimmed name query.
fn normalize_query(raw: &str) -> Option<String> {
    let query = raw.trim();
    if query.is_empty() {
        return None;
    }
    let formatted_code = query
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '-' | '.' | ' '));
    if !formatted_code {
        return Some(query.to_string());
    }
    if !is_valid_tax_code(query) {
        warn!(query, "Invalid tax code, skipped");
        return None;
    }
    let code = clean_tax_code(query);
    if !matches!(code.len(), 10 | 13) {
        warn!(query, code = %code, "Unusual tax code length, looking it up anyway");
    }
    Some(code)
}

/// Normalized queries with duplicates removed, first occurrence kept
#[must_use]
pub fn dedup_queries<I, S>(queries: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    queries
        .into_iter()
        .filter_map(|q| normalize_query(q.as_ref()))
        .filter(|q| seen.insert(q.clone()))
        .collect()
}

pub struct BatchRunner<'a> {
    client: &'a LookupClient,
}

impl<'a> BatchRunner<'a> {
    #[must_use]
    pub fn new(client: &'a LookupClient) -> Self {
        Self { client }
    }

    /// Look up every query in order.
    ///
    /// Never fails: the outcome records whether the run was cancelled or
    /// blocked along with the rows gathered before it stopped.
    pub async fn run(
        &self,
        queries: &[String],
        observer: &dyn BatchObserver,
        cancel: &dyn CancellationSignal,
    ) -> BatchOutcome {
        let total = queries.len();
        let mut outcome = BatchOutcome::default();

        for (index, query) in queries.iter().enumerate() {
            let ordinal = index + 1;
            if cancel.is_cancelled() {
                info!(ordinal, total, "Batch cancelled");
                outcome.cancelled = true;
                break;
            }
            observer.on_progress(ordinal, total, query);

            match self.process(query, cancel).await {
                Ok(row) => {
                    observer.on_result(&row);
                    outcome.rows.push(row);
                }
                Err(LookupError::Cancelled) => {
                    info!(ordinal, total, "Batch cancelled during lookup");
                    outcome.cancelled = true;
                    break;
                }
                Err(e @ LookupError::Blocked { .. }) => {
                    warn!(ordinal, total, error = %e, "Verification required, stopping batch");
                    observer.on_verification_required(ordinal, total, &e.user_message());
                    outcome.blocked = true;
                    break;
                }
                Err(e) => {
                    error!(query = %query, error = %e, "Query failed");
                    let row = BatchRow::failed(query, &e);
                    observer.on_result(&row);
                    outcome.rows.push(row);
                    observer.on_error(query, &e);
                }
            }
        }

        outcome.completed = outcome.rows.len();
        info!(
            completed = outcome.completed,
            total,
            cancelled = outcome.cancelled,
            blocked = outcome.blocked,
            "Batch finished"
        );
        outcome
    }

    /// First match for `query` with its details merged. A failed detail
    /// fetch keeps the bare search result unless it was cancelled or blocked.
    async fn process(&self, query: &str, cancel: &dyn CancellationSignal) -> LookupResult<BatchRow> {
        let results = self.client.lookup(query, cancel).await?;
        let Some(mut first) = results.into_iter().next() else {
            return Ok(BatchRow::found(query, None));
        };

        if !first.has_details() {
            if let Some(detail_url) = first.detail_url.clone() {
                match self.client.fetch_details(&detail_url, cancel).await {
                    Ok(details) => first.merge_details(&details),
                    Err(e @ (LookupError::Cancelled | LookupError::Blocked { .. })) => return Err(e),
                    Err(e) => warn!(url = %detail_url, error = %e, "Details unavailable"),
                }
            }
        }
        Ok(BatchRow::found(query, Some(first)))
    }
}
