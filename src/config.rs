//! Configuration: repository identifiers, report windows and config sources.
//!
//! Two sources feed a run. Fetch settings (GitHub token, page limit) come from
//! the environment, optionally seeded from a `.env` file. Report settings
//! (which formats to write, where, and with what frontmatter) come from a YAML
//! file.

use crate::error::{Error, Result};
use crate::report::Format;
use chrono::{DateTime, Months, NaiveDate, NaiveTime, TimeDelta, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// A unique identifier for a GitHub repository.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoId {
    /// The owner of the repository (e.g., "rust-lang").
    pub owner: String,
    /// The name of the repository (e.g., "cargo").
    pub repo: String,
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

impl FromStr for RepoId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.trim().split('/').map(str::trim).collect();
        match parts.as_slice() {
            [owner, repo] if !owner.is_empty() && !repo.is_empty() => Ok(RepoId {
                owner: owner.to_string(),
                repo: repo.to_string(),
            }),
            _ => Err(Error::Config(format!(
                "expected repository of the form owner/name, got `{s}'"
            ))),
        }
    }
}

/// Inclusive range of days a report covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(Error::Config(format!(
                "start date {start} is after end date {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// The month leading up to (and including) `end`.
    pub fn month_ending(end: NaiveDate) -> Self {
        let start = end.checked_sub_months(Months::new(1)).unwrap_or(end);
        Self { start, end }
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    /// Midnight UTC at the start of the window.
    pub fn start_time(&self) -> DateTime<Utc> {
        self.start.and_time(NaiveTime::MIN).and_utc()
    }

    /// The last second of the window's final day, UTC.
    pub fn end_time(&self) -> DateTime<Utc> {
        self.end.and_time(NaiveTime::MIN).and_utc() + TimeDelta::days(1) - TimeDelta::seconds(1)
    }
}

/// Fetch settings loaded from environment variables.
#[derive(Clone, Debug, Deserialize)]
pub struct FetchConfig {
    /// Optional GitHub Personal Access Token for higher rate limits.
    pub github_token: Option<String>,

    /// Hard limit on the number of paginated requests per item type.
    #[serde(default = "default_max_pages")]
    pub max_github_api_pages: u32,

    /// API root for GitHub Enterprise installations. Defaults to api.github.com.
    pub github_api_url: Option<String>,
}

fn default_max_pages() -> u32 {
    10
}

impl FetchConfig {
    pub fn from_env() -> Result<Self> {
        Ok(envy::from_env()?)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            github_token: None,
            max_github_api_pages: default_max_pages(),
            github_api_url: None,
        }
    }
}

/// Where and how one output format is written.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ReportTarget {
    pub directory: String,
    /// File name, with `%{key}` placeholders filled from the report values.
    pub filename: String,
    /// Frontmatter template; values may contain `%{key}` placeholders.
    #[serde(default)]
    pub frontmatter: Option<IndexMap<String, String>>,
}

/// Contents of a report config file.
#[derive(Clone, Debug, Deserialize)]
pub struct ReportConfig {
    pub repository: Option<String>,
    #[serde(default)]
    pub reports: IndexMap<String, ReportTarget>,
}

impl ReportConfig {
    pub fn from_yaml(source: &str) -> Result<Self> {
        serde_yaml::from_str(source).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read config file {}: {e}", path.display()))
        })?;
        Self::from_yaml(&source)
    }

    pub fn repository(&self) -> Result<RepoId> {
        match &self.repository {
            Some(repository) => repository.parse(),
            None => Err(Error::Config("expected key `repository'".to_string())),
        }
    }

    /// Resolves every configured report to its format, failing on the first
    /// unsupported one so nothing is generated for a partially valid config.
    pub fn targets(&self) -> Result<Vec<(Format, &ReportTarget)>> {
        if self.reports.is_empty() {
            return Err(Error::Config("expected key `reports'".to_string()));
        }
        self.reports
            .iter()
            .map(|(format, target)| Ok((format.parse::<Format>()?, target)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    #[serial]
    fn test_fetch_config_from_env() {
        env::set_var("GITHUB_TOKEN", "secret");
        env::set_var("MAX_GITHUB_API_PAGES", "5");
        env::set_var("GITHUB_API_URL", "https://github.example.com/api/v3");

        let config = FetchConfig::from_env().expect("Failed to load config");

        assert_eq!(config.github_token.as_deref(), Some("secret"));
        assert_eq!(config.max_github_api_pages, 5);
        assert_eq!(
            config.github_api_url.as_deref(),
            Some("https://github.example.com/api/v3")
        );

        env::remove_var("GITHUB_TOKEN");
        env::remove_var("MAX_GITHUB_API_PAGES");
        env::remove_var("GITHUB_API_URL");
    }

    #[test]
    #[serial]
    fn test_fetch_config_defaults() {
        env::remove_var("GITHUB_TOKEN");
        env::remove_var("MAX_GITHUB_API_PAGES");
        env::remove_var("GITHUB_API_URL");

        let config = FetchConfig::from_env().expect("Failed to load config");

        assert!(config.github_token.is_none());
        assert_eq!(config.max_github_api_pages, 10);
        assert!(config.github_api_url.is_none());
    }

    #[test]
    #[serial]
    fn test_fetch_config_invalid_page_limit() {
        env::set_var("MAX_GITHUB_API_PAGES", "lots");
        let result = FetchConfig::from_env();
        env::remove_var("MAX_GITHUB_API_PAGES");

        assert!(matches!(result, Err(Error::Env(_))));
    }

    #[test]
    fn test_repo_id_parsing() {
        let id: RepoId = "rust-lang/cargo".parse().unwrap();
        assert_eq!(id.owner, "rust-lang");
        assert_eq!(id.repo, "cargo");
        assert_eq!(id.to_string(), "rust-lang/cargo");

        assert!("cargo".parse::<RepoId>().is_err());
        assert!("a/b/c".parse::<RepoId>().is_err());
        assert!("/cargo".parse::<RepoId>().is_err());
    }

    #[test]
    fn test_date_window() {
        let window = DateWindow::month_ending(day(2017, 3, 31));
        assert_eq!(window.start, day(2017, 2, 28));
        assert!(window.contains(day(2017, 3, 1)));
        assert!(window.contains(day(2017, 3, 31)));
        assert!(!window.contains(day(2017, 4, 1)));

        assert!(DateWindow::new(day(2017, 2, 1), day(2017, 1, 1)).is_err());
    }

    #[test]
    fn test_date_window_bounds_in_utc() {
        let window = DateWindow::new(day(2016, 10, 1), day(2016, 10, 31)).unwrap();
        assert_eq!(window.start_time().to_rfc3339(), "2016-10-01T00:00:00+00:00");
        assert_eq!(window.end_time().to_rfc3339(), "2016-10-31T23:59:59+00:00");

        let single = DateWindow::new(day(2016, 10, 1), day(2016, 10, 1)).unwrap();
        assert_eq!(single.end_time().to_rfc3339(), "2016-10-01T23:59:59+00:00");
    }

    #[test]
    fn test_report_config_from_yaml() {
        let config = ReportConfig::from_yaml(
            r#"
repository: rubygems/rubygems
reports:
  html:
    directory: output
    filename: report.html
    frontmatter:
      title: "%{repository} report"
      layout: default
  json:
    directory: output
    filename: report.json
"#,
        )
        .unwrap();

        assert_eq!(config.repository().unwrap().to_string(), "rubygems/rubygems");

        let targets = config.targets().unwrap();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].0, Format::Html);
        assert_eq!(targets[1].0, Format::Json);

        let frontmatter = targets[0].1.frontmatter.as_ref().unwrap();
        let keys: Vec<&str> = frontmatter.keys().map(String::as_str).collect();
        assert_eq!(keys, ["title", "layout"]);
        assert!(targets[1].1.frontmatter.is_none());
    }

    #[test]
    fn test_report_config_rejects_unknown_format() {
        let config = ReportConfig::from_yaml(
            r#"
repository: a/b
reports:
  html: { directory: out, filename: r.html }
  pdf: { directory: out, filename: r.pdf }
"#,
        )
        .unwrap();

        assert!(matches!(
            config.targets(),
            Err(Error::UnsupportedExportFormat(format)) if format == "pdf"
        ));
    }

    #[test]
    fn test_report_config_missing_keys() {
        let config = ReportConfig::from_yaml("reports: {}").unwrap();
        assert!(matches!(config.repository(), Err(Error::Config(_))));
        assert!(matches!(config.targets(), Err(Error::Config(_))));

        assert!(matches!(
            ReportConfig::from_yaml("repository: [unclosed"),
            Err(Error::Config(_))
        ));
    }
}
