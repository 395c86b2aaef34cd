//! Repository health reports.
//!
//! Open issues and pull requests are fetched for a window, summarized into an
//! [`Analysis`], and rendered as HTML or JSON documents, optionally prefixed
//! with YAML frontmatter for static-site generators.

pub mod analysis;
pub mod analyzer;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod frontmatter;
pub mod github;
pub mod report;

pub use analysis::Analysis;
pub use error::{Error, Result};
pub use fetcher::{generate_analysis, Fetcher};
pub use report::{render, render_file, Format};

use config::ReportConfig;
use indexmap::IndexMap;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Values available to `%{key}` placeholders in file names and frontmatter.
pub fn report_values(analysis: &Analysis) -> frontmatter::Values {
    let mut values = frontmatter::values([
        ("repository", analysis.repository.clone()),
        ("date", analysis.end_date.format("%Y-%m-%d").to_string()),
        ("friendly_date", analysis.end_date.format("%B %d, %y").to_string()),
    ]);
    if let Some(start) = analysis.start_date {
        values.insert("start_date".to_string(), start.format("%Y-%m-%d").to_string());
    }
    values
}

/// Renders every report named in `config`, keyed by output path.
///
/// Nothing is written here; an unsupported format or a bad placeholder fails
/// the whole batch.
pub fn generate_reports(config: &ReportConfig, analysis: &Analysis) -> Result<IndexMap<PathBuf, String>> {
    let targets = config.targets()?;
    let values = report_values(analysis);

    let mut reports = IndexMap::new();
    for (format, target) in targets {
        let filename = frontmatter::interpolate(&target.filename, &values)?;
        let path = Path::new(&target.directory).join(filename);

        // A static site's layout supplies the page around frontmatter'd HTML.
        let body = match (format, &target.frontmatter) {
            (Format::Html, Some(_)) => report::render_partial(analysis),
            _ => render(analysis, format)?,
        };
        let document = frontmatter::build_report(target.frontmatter.as_ref(), &values, &body)?;

        tracing::debug!(path = %path.display(), %format, "Generated report");
        reports.insert(path, document);
    }

    Ok(reports)
}

/// Writes generated reports, creating directories as needed.
///
/// Every document is first staged in a temporary file next to its target, so
/// a failure while staging leaves no report behind. If moving a staged file
/// into place fails, reports already moved are removed again.
pub fn write_reports(reports: &IndexMap<PathBuf, String>) -> Result<()> {
    let mut staged = Vec::with_capacity(reports.len());
    for (path, document) in reports {
        let directory = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(directory)?;

        let mut file = staging_file(directory)?;
        file.write_all(document.as_bytes())?;
        staged.push((path, file));
    }

    let mut written: Vec<&PathBuf> = Vec::with_capacity(staged.len());
    for (path, file) in staged {
        if let Err(e) = file.persist(path) {
            for done in written {
                if let Err(remove_err) = std::fs::remove_file(done) {
                    tracing::warn!(path = %done.display(), "Failed to remove partial report: {}", remove_err);
                }
            }
            return Err(e.error.into());
        }
        tracing::info!(path = %path.display(), "Wrote report");
        written.push(path);
    }

    Ok(())
}

/// A temporary file in `directory` with the permissions a plain write would give.
fn staging_file(directory: &Path) -> std::io::Result<tempfile::NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(".repo-pulse-");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o644));
    }
    builder.tempfile_in(directory)
}
