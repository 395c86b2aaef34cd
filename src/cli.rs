//! Command-line arguments and how they resolve into a run.

use crate::config::{DateWindow, RepoId, ReportConfig};
use crate::error::{Error, Result};
use crate::report::{self, Format};
use chrono::{Months, NaiveDate};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "repo-pulse",
    version,
    about = "Generate health reports for a GitHub repository's open issues and pull requests"
)]
pub struct Args {
    /// YAML config file for automated reports.
    #[arg(long, value_name = "CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Repository to generate a report for.
    #[arg(long, value_name = "USER/REPO", value_parser = parse_repository)]
    pub repository: Option<RepoId>,

    /// Last date of a one-month report.
    #[arg(long, value_name = "YYYY-MM-DD", conflicts_with_all = ["start_date", "end_date"])]
    pub date: Option<NaiveDate>,

    /// Start date of the report. Defaults to one month before the end date.
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub start_date: Option<NaiveDate>,

    /// Last date of the report. Defaults to today.
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub end_date: Option<NaiveDate>,

    /// Render from a previously exported JSON report instead of fetching.
    #[arg(long, value_name = "JSON_REPORT")]
    pub from: Option<PathBuf>,

    /// Output file for the report. Ignored when --config is given.
    #[arg(long, value_name = "REPORT_FILE", default_value = "report.html", value_parser = parse_output)]
    pub output: PathBuf,

    /// Print debug information.
    #[arg(long)]
    pub verbose: bool,
}

fn parse_repository(s: &str) -> std::result::Result<RepoId, String> {
    s.parse().map_err(|e: Error| e.to_string())
}

fn parse_output(s: &str) -> std::result::Result<PathBuf, String> {
    match Format::from_path(s) {
        Ok(_) => Ok(PathBuf::from(s)),
        Err(e) => Err(format!(
            "{e}. Supported file formats: {}",
            report::supported_formats().join(", ")
        )),
    }
}

/// Where the analysis for a run comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// A previous JSON export.
    Import(PathBuf),
    /// A fresh fetch from GitHub.
    Fetch { repo_id: RepoId, window: DateWindow },
}

impl Args {
    /// The report window, if any date option was given.
    pub fn window(&self, today: NaiveDate) -> Result<Option<DateWindow>> {
        if let Some(date) = self.date {
            return Ok(Some(DateWindow::month_ending(date)));
        }
        if self.start_date.is_none() && self.end_date.is_none() {
            return Ok(None);
        }

        let end = self.end_date.unwrap_or(today);
        let start = match self.start_date {
            Some(start) => start,
            None => end.checked_sub_months(Months::new(1)).unwrap_or(end),
        };
        DateWindow::new(start, end).map(Some)
    }

    /// Decides between importing and fetching. `--repository` takes
    /// precedence over the repository named in the config file.
    pub fn source(&self, config: Option<&ReportConfig>, today: NaiveDate) -> Result<Source> {
        if let Some(path) = &self.from {
            return Ok(Source::Import(path.clone()));
        }

        let repo_id = match (&self.repository, config) {
            (Some(repo_id), _) => repo_id.clone(),
            (None, Some(config)) => config.repository()?,
            (None, None) => {
                return Err(Error::Config(
                    "one of --repository, --config or --from is required".to_string(),
                ))
            }
        };
        let window = self.window(today)?.ok_or_else(|| {
            Error::Config("one of --date, --start-date or --end-date is required".to_string())
        })?;

        Ok(Source::Fetch { repo_id, window })
    }
}
