use crate::analysis::{Analysis, ItemSummary, LabelCount};
use crate::config::RepoId;
use crate::error::{Error, Result};
use crate::github::{RawData, RawItem};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;

const SECONDS_IN_A_YEAR: i64 = 31_556_926;
const SECONDS_IN_A_MONTH: i64 = 2_629_743;
const SECONDS_IN_A_WEEK: i64 = 604_800;
const SECONDS_IN_A_DAY: i64 = 86_400;

/// Computes an [`Analysis`] from fetched records.
///
/// # Arguments
/// * `raw` - The fetched issues and pull requests. Never modified.
/// * `now` - The reference point for item ages.
///
/// Fails with [`Error::InvalidInput`] if the payload names no repository.
pub fn analyze(raw: &RawData, now: DateTime<Utc>) -> Result<Analysis> {
    let repository = match raw.repository.as_deref().map(str::trim) {
        Some(repository) if !repository.is_empty() => repository,
        _ => return Err(Error::InvalidInput("raw data has no repository".to_string())),
    };
    let repo_id: RepoId = repository
        .parse()
        .map_err(|_| Error::InvalidInput(format!("malformed repository `{repository}'")))?;

    let issues_url = format!("https://github.com/{repo_id}/issues");
    let pulls_url = format!("https://github.com/{repo_id}/pulls");

    let analysis = Analysis {
        repository: repo_id.to_string(),
        start_date: raw.start_date,
        end_date: raw.end_date.unwrap_or_else(|| now.date_naive()),

        number_of_issues: raw.issues.len(),
        number_of_pulls: raw.pulls.len(),

        issues_with_label: label_histogram(&raw.issues, &issues_url),
        issues_with_no_label: LabelCount {
            link: None,
            total: count_without_labels(&raw.issues),
        },

        average_issue_age: average_age(&raw.issues, now),
        average_pull_age: average_age(&raw.pulls, now),

        oldest_issue: oldest(&raw.issues).map(summarize),
        newest_issue: newest(&raw.issues).map(summarize),
        oldest_pull: oldest(&raw.pulls).map(summarize),
        newest_pull: newest(&raw.pulls).map(summarize),

        new_contributors: raw.new_contributors.clone(),

        issues_url,
        pulls_url,
    };

    tracing::debug!(
        repository = %analysis.repository,
        issues = analysis.number_of_issues,
        pulls = analysis.number_of_pulls,
        labels = analysis.issues_with_label.len(),
        "Analysis complete"
    );

    Ok(analysis)
}

/// Counts label usage across `items`; an item with two labels counts toward both.
/// Items with no label collection contribute nothing.
pub fn label_histogram(items: &[RawItem], issues_url: &str) -> IndexMap<String, LabelCount> {
    let mut histogram: IndexMap<String, LabelCount> = IndexMap::new();

    for label in items.iter().filter_map(|item| item.labels.as_ref()).flatten() {
        histogram
            .entry(label.name.clone())
            .or_insert_with(|| LabelCount {
                link: Some(label_link(issues_url, &label.name)),
                total: 0,
            })
            .total += 1;
    }

    histogram
}

/// Search link listing the open issues carrying `label`.
pub fn label_link(issues_url: &str, label: &str) -> String {
    let query = format!("is:open is:issue label:\"{label}\"");
    let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
    format!("{issues_url}?q={encoded}")
}

/// Items whose label collection is present and empty.
pub fn count_without_labels(items: &[RawItem]) -> usize {
    items
        .iter()
        .filter(|item| item.labels.as_ref().is_some_and(|labels| labels.is_empty()))
        .count()
}

/// Mean age of `items` relative to `now`, described in words.
/// Returns `None` for an empty collection.
pub fn average_age(items: &[RawItem], now: DateTime<Utc>) -> Option<String> {
    if items.is_empty() {
        return None;
    }

    let total: i64 = items
        .iter()
        .map(|item| (now - item.created_at).num_seconds())
        .sum();
    // Floor division; items created after `now` count as zero age overall.
    let mean = total.div_euclid(items.len() as i64).max(0);

    Some(describe_age(mean))
}

/// Renders a duration in seconds as its two most significant calendar units,
/// e.g. "approximately 1 year and 2 months". Each unit is truncated.
pub fn describe_age(seconds: i64) -> String {
    let years = seconds / SECONDS_IN_A_YEAR;
    let remainder = seconds % SECONDS_IN_A_YEAR;

    let months = remainder / SECONDS_IN_A_MONTH;
    let remainder = remainder % SECONDS_IN_A_MONTH;

    let weeks = remainder / SECONDS_IN_A_WEEK;
    let remainder = remainder % SECONDS_IN_A_WEEK;

    let days = remainder / SECONDS_IN_A_DAY;

    let parts: Vec<String> = [(years, "year"), (months, "month"), (weeks, "week"), (days, "day")]
        .into_iter()
        .filter(|(value, _)| *value != 0)
        .take(2)
        .map(|(value, unit)| {
            if value == 1 {
                format!("{value} {unit}")
            } else {
                format!("{value} {unit}s")
            }
        })
        .collect();

    if parts.is_empty() {
        return "approximately 0 days".to_string();
    }

    format!("approximately {}", parts.join(" and "))
}

/// Items ordered by creation time; equal timestamps keep their input order.
fn by_creation(items: &[RawItem]) -> Vec<&RawItem> {
    let mut sorted: Vec<&RawItem> = items.iter().collect();
    sorted.sort_by_key(|item| item.created_at);
    sorted
}

/// The earliest-created item; the first one seen wins a tie.
pub fn oldest(items: &[RawItem]) -> Option<&RawItem> {
    by_creation(items).first().copied()
}

/// The latest-created item; the last one seen wins a tie.
pub fn newest(items: &[RawItem]) -> Option<&RawItem> {
    by_creation(items).last().copied()
}

fn summarize(item: &RawItem) -> ItemSummary {
    ItemSummary {
        html_url: item.html_url.clone(),
        number: item.number,
        date: item.created_at,
    }
}
