use crate::analysis::Analysis;
use crate::analyzer;
use crate::config::{DateWindow, RepoId};
use crate::error::Result;
use crate::github::RawData;
use chrono::{DateTime, Utc};
use std::future::Future;

/// Source of raw issue and pull request records.
///
/// Implementations return the complete, already-paginated data set for the
/// window or fail the whole call; the analyzer never sees partial results.
pub trait Fetcher {
    fn fetch(
        &self,
        repo_id: &RepoId,
        window: &DateWindow,
    ) -> impl Future<Output = Result<RawData>> + Send;
}

/// Fetches records for `repo_id` and analyzes them.
///
/// This separates data retrieval and processing from the CLI layer. Fetch
/// errors propagate unchanged; there is no fallback to an imported analysis.
pub async fn generate_analysis<F: Fetcher>(
    fetcher: &F,
    repo_id: &RepoId,
    window: &DateWindow,
    now: DateTime<Utc>,
) -> Result<Analysis> {
    tracing::info!(repository = %repo_id, start = %window.start, end = %window.end, "Fetching issues and pull requests");
    let raw = fetcher.fetch(repo_id, window).await?;
    tracing::info!(
        repository = %repo_id,
        issues = raw.issues.len(),
        pulls = raw.pulls.len(),
        "Fetched records"
    );

    analyzer::analyze(&raw, now)
}
