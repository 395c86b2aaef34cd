//! The computed summary of a repository's open issues and pull requests.
//!
//! An [`Analysis`] is produced once per report run and is read-only after
//! that. Its JSON form doubles as a checkpoint: a previously exported report
//! can be imported with [`Analysis::from_file`] and rendered again without
//! touching the network.

use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDate, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Number of issues carrying a label, and a link to those issues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelCount {
    pub link: Option<String>,
    pub total: usize,
}

/// The oldest or newest item of a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSummary {
    pub html_url: String,
    pub number: u64,
    pub date: DateTime<Utc>,
}

/// Counts, ages and label statistics for one repository over one report window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analysis {
    /// "owner/name".
    pub repository: String,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    pub end_date: NaiveDate,

    pub issues_url: String,
    pub pulls_url: String,

    pub number_of_issues: usize,
    pub number_of_pulls: usize,

    /// Label name to count, in first-seen order.
    pub issues_with_label: IndexMap<String, LabelCount>,
    pub issues_with_no_label: LabelCount,

    /// `None` when there are no items to average.
    pub average_issue_age: Option<String>,
    pub average_pull_age: Option<String>,

    #[serde(with = "empty_record")]
    pub oldest_issue: Option<ItemSummary>,
    #[serde(with = "empty_record")]
    pub newest_issue: Option<ItemSummary>,
    #[serde(with = "empty_record")]
    pub oldest_pull: Option<ItemSummary>,
    #[serde(with = "empty_record")]
    pub newest_pull: Option<ItemSummary>,

    /// Logins whose first commit falls inside the window. `None` when the
    /// source did not look at commits.
    #[serde(default)]
    pub new_contributors: Option<Vec<String>>,
}

/// Which half of the analysis a summary refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Issue,
    Pull,
}

impl ItemKind {
    /// Human-readable singular name.
    pub fn label(self) -> &'static str {
        match self {
            ItemKind::Issue => "issue",
            ItemKind::Pull => "pull request",
        }
    }
}

/// Borrowed view over the fields that describe one item kind.
pub struct KindStats<'a> {
    pub count: usize,
    pub url: &'a str,
    pub average_age: Option<&'a str>,
    pub oldest: Option<&'a ItemSummary>,
    pub newest: Option<&'a ItemSummary>,
}

impl Analysis {
    pub fn stats(&self, kind: ItemKind) -> KindStats<'_> {
        match kind {
            ItemKind::Issue => KindStats {
                count: self.number_of_issues,
                url: &self.issues_url,
                average_age: self.average_issue_age.as_deref(),
                oldest: self.oldest_issue.as_ref(),
                newest: self.newest_issue.as_ref(),
            },
            ItemKind::Pull => KindStats {
                count: self.number_of_pulls,
                url: &self.pulls_url,
                average_age: self.average_pull_age.as_deref(),
                oldest: self.oldest_pull.as_ref(),
                newest: self.newest_pull.as_ref(),
            },
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(source: &str) -> Result<Self> {
        Ok(serde_json::from_str(source)?)
    }

    /// Imports a previous JSON export. Only `.json` files are accepted.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        if extension != "json" {
            return Err(Error::UnsupportedImportFormat(extension.to_string()));
        }

        let analysis = Self::from_json(&std::fs::read_to_string(path)?)?;
        tracing::debug!(path = %path.display(), repository = %analysis.repository, "Imported analysis");
        Ok(analysis)
    }
}

/// Serializes a missing item as an empty mapping (`{}`) rather than `null`.
mod empty_record {
    use super::ItemSummary;
    use serde::de::Error as _;
    use serde::ser::SerializeMap;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<ItemSummary>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(item) => item.serialize(serializer),
            None => serializer.serialize_map(Some(0))?.end(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<ItemSummary>, D::Error> {
        match Option::<serde_json::Map<String, serde_json::Value>>::deserialize(deserializer)? {
            None => Ok(None),
            Some(record) if record.is_empty() => Ok(None),
            // Anything but `{}` must be a complete item.
            Some(record) => ItemSummary::deserialize(serde_json::Value::Object(record))
                .map(Some)
                .map_err(D::Error::custom),
        }
    }
}
