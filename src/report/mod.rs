//! Report rendering.
//!
//! The content of a report is described once, as an ordered list of
//! [`Instruction`]s built by [`script`]. A format-specific [`Backend`]
//! interprets those instructions into a document. Adding an output format
//! means implementing the backend, not restating what the report says.
//!
//! JSON is the exception: it serializes the [`Analysis`] directly and never
//! runs the script.

pub mod html;
pub mod json;

use crate::analysis::{Analysis, ItemKind};
use crate::error::{Error, Result};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

pub use html::HtmlBackend;

const ITEM_DATE_FORMAT: &str = "%b %-d, %Y";
const REPORT_DATE_FORMAT: &str = "%B %-d, %Y";
const NO_LABEL: &str = "(No label)";

/// Output formats with a registered renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Html,
    Json,
}

impl Format {
    pub const ALL: [Format; 2] = [Format::Html, Format::Json];

    pub fn extension(self) -> &'static str {
        match self {
            Format::Html => "html",
            Format::Json => "json",
        }
    }

    /// Infers the format from a file name's extension. Matching is case-sensitive.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        extension.parse()
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Format::ALL
            .into_iter()
            .find(|format| format.extension() == s)
            .ok_or_else(|| Error::UnsupportedExportFormat(s.to_string()))
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Names of every format reports can be exported to.
pub fn supported_formats() -> Vec<&'static str> {
    Format::ALL.into_iter().map(Format::extension).collect()
}

/// Whether `path` names a file a report can be exported to.
pub fn can_export_to(path: impl AsRef<Path>) -> bool {
    Format::from_path(path).is_ok()
}

/// A run of inline content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Plain(String),
    Link { text: String, url: String },
}

fn plain(text: impl Into<String>) -> Inline {
    Inline::Plain(text.into())
}

fn link(text: impl Into<String>, url: impl Into<String>) -> Inline {
    Inline::Link {
        text: text.into(),
        url: url.into(),
    }
}

/// One bar of a horizontal bar graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarRow {
    pub label: String,
    pub count: usize,
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    Title(String),
    Header(String),
    Text(Vec<Inline>),
    List(Vec<Vec<Inline>>),
    BarGraph(Vec<BarRow>),
    /// Pointer to GitHub's own summary of recent activity.
    PulseSummary { url: String },
}

/// A format-specific interpreter of [`Instruction`]s.
pub trait Backend {
    fn title(&mut self, text: &str);
    fn header(&mut self, text: &str);
    fn text(&mut self, content: &[Inline]);
    fn list(&mut self, items: &[Vec<Inline>]);
    fn bar_graph(&mut self, rows: &[BarRow]);
    fn pulse_summary(&mut self, url: &str);

    fn execute(&mut self, instructions: &[Instruction]) {
        for instruction in instructions {
            match instruction {
                Instruction::Title(text) => self.title(text),
                Instruction::Header(text) => self.header(text),
                Instruction::Text(content) => self.text(content),
                Instruction::List(items) => self.list(items),
                Instruction::BarGraph(rows) => self.bar_graph(rows),
                Instruction::PulseSummary { url } => self.pulse_summary(url),
            }
        }
    }
}

/// The report, as format-agnostic instructions.
pub fn script(analysis: &Analysis) -> Vec<Instruction> {
    let mut instructions = vec![
        Instruction::Title(format!("How is {}?", analysis.repository)),
        Instruction::Text(vec![plain(format!(
            "Monthly report, ending on {}.",
            analysis.end_date.format(REPORT_DATE_FORMAT)
        ))]),
        Instruction::PulseSummary {
            url: format!("https://github.com/{}/pulse/monthly", analysis.repository),
        },
        Instruction::Header("Pull Requests".to_string()),
    ];
    instructions.extend(summary(analysis, ItemKind::Pull));

    instructions.push(Instruction::Header("Issues".to_string()));
    instructions.extend(summary(analysis, ItemKind::Issue));

    instructions.push(Instruction::Header("Issues Per Label".to_string()));
    instructions.push(Instruction::BarGraph(label_rows(analysis)));

    if let Some(logins) = &analysis.new_contributors {
        instructions.push(Instruction::Header("New Contributors".to_string()));
        instructions.push(new_contributors(logins));
    }

    instructions
}

fn new_contributors(logins: &[String]) -> Instruction {
    if logins.is_empty() {
        return Instruction::Text(vec![plain("No new contributors this period.")]);
    }
    Instruction::List(
        logins
            .iter()
            .map(|login| vec![link(login.as_str(), format!("https://github.com/{login}"))])
            .collect(),
    )
}

/// Count sentence plus age details for one item kind.
pub fn summary(analysis: &Analysis, kind: ItemKind) -> Vec<Instruction> {
    let stats = analysis.stats(kind);
    let type_label = kind.label();

    if stats.count == 0 {
        return vec![Instruction::Text(vec![
            plain("There are "),
            link(format!("no {type_label}s open"), stats.url),
            plain("."),
        ])];
    }

    let count_text = format!(
        "{} {} open",
        stats.count,
        pluralize(type_label, stats.count)
    );
    let mut details = Vec::new();
    if let Some(age) = stats.average_age {
        details.push(vec![plain(format!("Average age: {age}."))]);
    }
    for (which, item) in [("oldest", stats.oldest), ("newest", stats.newest)] {
        if let Some(item) = item {
            details.push(vec![
                plain("The "),
                link(format!("{which} {type_label}"), item.html_url.as_str()),
                plain(format!(" was opened on {}.", item.date.format(ITEM_DATE_FORMAT))),
            ]);
        }
    }

    vec![
        Instruction::Text(vec![
            plain(format!("There {} ", are_is(stats.count))),
            link(count_text, stats.url),
            plain("."),
        ]),
        Instruction::List(details),
    ]
}

/// Labels by descending issue count, followed by the unlabelled count.
///
/// Labels with equal counts keep their first-seen order; the "(No label)" row
/// is always last regardless of its count.
pub fn label_rows(analysis: &Analysis) -> Vec<BarRow> {
    let mut rows: Vec<BarRow> = analysis
        .issues_with_label
        .iter()
        .map(|(label, count)| BarRow {
            label: label.clone(),
            count: count.total,
            link: count.link.clone(),
        })
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count));

    rows.push(BarRow {
        label: NO_LABEL.to_string(),
        count: analysis.issues_with_no_label.total,
        link: None,
    });
    rows
}

/// Bar widths as integer percentages of the largest count.
pub fn percentages(rows: &[BarRow]) -> Vec<usize> {
    let biggest = rows.iter().map(|row| row.count).max().unwrap_or(0);
    rows.iter()
        .map(|row| {
            if biggest == 0 {
                0
            } else {
                row.count * 100 / biggest
            }
        })
        .collect()
}

/// Width, in characters, of the longest label.
pub fn label_width(rows: &[BarRow]) -> usize {
    rows.iter()
        .map(|row| row.label.chars().count())
        .max()
        .unwrap_or(0)
}

fn pluralize(text: &str, number: usize) -> String {
    if number == 1 {
        text.to_string()
    } else {
        format!("{text}s")
    }
}

fn are_is(number: usize) -> &'static str {
    if number == 1 {
        "is"
    } else {
        "are"
    }
}

/// Renders a complete report document.
pub fn render(analysis: &Analysis, format: Format) -> Result<String> {
    tracing::debug!(repository = %analysis.repository, %format, "Rendering report");
    match format {
        Format::Html => {
            let mut backend = HtmlBackend::default();
            backend.execute(&script(analysis));
            Ok(backend.into_document())
        }
        Format::Json => json::render(analysis),
    }
}

/// Renders only the body of the HTML report, for embedding in a page layout.
pub fn render_partial(analysis: &Analysis) -> String {
    let mut backend = HtmlBackend::default();
    backend.execute(&script(analysis));
    backend.into_partial()
}

/// Renders a report to `path`, choosing the format from its extension.
///
/// The format is resolved and the document fully rendered before the file is
/// created, so a failure leaves nothing on disk.
pub fn render_file(analysis: &Analysis, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let format = Format::from_path(path)?;
    let document = render(analysis, format)?;
    std::fs::write(path, document)?;
    tracing::info!(path = %path.display(), %format, "Wrote report");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{ItemSummary, LabelCount};
    use chrono::{NaiveDate, TimeZone, Utc};
    use indexmap::IndexMap;

    fn row(label: &str, count: usize) -> BarRow {
        BarRow {
            label: label.to_string(),
            count,
            link: None,
        }
    }

    fn empty_analysis() -> Analysis {
        Analysis {
            repository: "a/b".to_string(),
            start_date: None,
            end_date: NaiveDate::from_ymd_opt(2016, 11, 1).unwrap(),
            issues_url: "https://github.com/a/b/issues".to_string(),
            pulls_url: "https://github.com/a/b/pulls".to_string(),
            number_of_issues: 0,
            number_of_pulls: 0,
            issues_with_label: IndexMap::new(),
            issues_with_no_label: LabelCount { link: None, total: 0 },
            average_issue_age: None,
            average_pull_age: None,
            oldest_issue: None,
            newest_issue: None,
            oldest_pull: None,
            newest_pull: None,
            new_contributors: None,
        }
    }

    fn with_labels(labels: &[(&str, usize)], no_label: usize) -> Analysis {
        let mut analysis = empty_analysis();
        for (name, total) in labels {
            analysis.issues_with_label.insert(
                name.to_string(),
                LabelCount {
                    link: Some(format!("https://github.com/a/b/labels/{name}")),
                    total: *total,
                },
            );
        }
        analysis.issues_with_no_label.total = no_label;
        analysis
    }

    #[test]
    fn test_format_lookup() {
        assert_eq!("html".parse::<Format>().unwrap(), Format::Html);
        assert_eq!(Format::from_path("out/report.json").unwrap(), Format::Json);
        assert!(matches!(
            "pdf".parse::<Format>(),
            Err(Error::UnsupportedExportFormat(format)) if format == "pdf"
        ));
        assert!(Format::from_path("report.HTML").is_err());
        assert!(Format::from_path("report").is_err());

        assert_eq!(supported_formats(), ["html", "json"]);
        assert!(can_export_to("a/b/c.html"));
        assert!(!can_export_to("c.pdf"));
    }

    #[test]
    fn test_percentages_use_integer_math() {
        assert_eq!(percentages(&[row("a", 10), row("b", 5)]), [100, 50]);
        assert_eq!(percentages(&[row("a", 3), row("b", 2), row("c", 1)]), [100, 66, 33]);
        assert_eq!(percentages(&[row("(No label)", 0)]), [0]);
        assert_eq!(label_width(&[row("a", 1), row("(No label)", 0)]), 10);
    }

    #[test]
    fn test_label_rows_sorting() {
        let analysis = with_labels(&[("docs", 1), ("bug", 4), ("ux", 1), ("feature", 4)], 9);
        let rows = label_rows(&analysis);

        let order: Vec<(&str, usize)> = rows.iter().map(|r| (r.label.as_str(), r.count)).collect();
        assert_eq!(
            order,
            [("bug", 4), ("feature", 4), ("docs", 1), ("ux", 1), ("(No label)", 9)]
        );
        assert!(rows.last().unwrap().link.is_none());
        assert_eq!(rows[0].link.as_deref(), Some("https://github.com/a/b/labels/bug"));
    }

    #[test]
    fn test_summary_without_items() {
        let analysis = empty_analysis();

        assert_eq!(
            summary(&analysis, ItemKind::Issue),
            [Instruction::Text(vec![
                plain("There are "),
                link("no issues open", "https://github.com/a/b/issues"),
                plain("."),
            ])]
        );
        assert_eq!(
            summary(&analysis, ItemKind::Pull),
            [Instruction::Text(vec![
                plain("There are "),
                link("no pull requests open", "https://github.com/a/b/pulls"),
                plain("."),
            ])]
        );
    }

    #[test]
    fn test_summary_with_one_item() {
        let mut analysis = empty_analysis();
        let item = ItemSummary {
            html_url: "https://github.com/a/b/pull/4".to_string(),
            number: 4,
            date: Utc.with_ymd_and_hms(2016, 9, 1, 10, 0, 0).unwrap(),
        };
        analysis.number_of_pulls = 1;
        analysis.average_pull_age = Some("approximately 2 months".to_string());
        analysis.oldest_pull = Some(item.clone());
        analysis.newest_pull = Some(item);

        let instructions = summary(&analysis, ItemKind::Pull);
        assert_eq!(
            instructions[0],
            Instruction::Text(vec![
                plain("There is "),
                link("1 pull request open", "https://github.com/a/b/pulls"),
                plain("."),
            ])
        );
        assert_eq!(
            instructions[1],
            Instruction::List(vec![
                vec![plain("Average age: approximately 2 months.")],
                vec![
                    plain("The "),
                    link("oldest pull request", "https://github.com/a/b/pull/4"),
                    plain(" was opened on Sep 1, 2016."),
                ],
                vec![
                    plain("The "),
                    link("newest pull request", "https://github.com/a/b/pull/4"),
                    plain(" was opened on Sep 1, 2016."),
                ],
            ])
        );
    }

    #[test]
    fn test_summary_pluralizes() {
        let mut analysis = empty_analysis();
        analysis.number_of_issues = 3;

        let instructions = summary(&analysis, ItemKind::Issue);
        assert_eq!(
            instructions[0],
            Instruction::Text(vec![
                plain("There are "),
                link("3 issues open", "https://github.com/a/b/issues"),
                plain("."),
            ])
        );
        // Missing details are skipped rather than treated as errors.
        assert_eq!(instructions[1], Instruction::List(vec![]));
    }

    #[test]
    fn test_script_order() {
        let instructions = script(&with_labels(&[("bug", 2)], 1));

        assert_eq!(instructions[0], Instruction::Title("How is a/b?".to_string()));
        assert_eq!(
            instructions[1],
            Instruction::Text(vec![plain("Monthly report, ending on November 1, 2016.")])
        );
        assert_eq!(
            instructions[2],
            Instruction::PulseSummary {
                url: "https://github.com/a/b/pulse/monthly".to_string()
            }
        );
        assert_eq!(instructions[3], Instruction::Header("Pull Requests".to_string()));
        assert_eq!(instructions[5], Instruction::Header("Issues".to_string()));
        assert_eq!(instructions[7], Instruction::Header("Issues Per Label".to_string()));
        assert!(matches!(&instructions[8], Instruction::BarGraph(rows) if rows.len() == 2));
        assert_eq!(instructions.len(), 9);
    }

    #[test]
    fn test_new_contributors_section() {
        let mut analysis = empty_analysis();
        analysis.new_contributors = Some(vec!["alice".to_string(), "bob".to_string()]);

        let instructions = script(&analysis);
        assert_eq!(instructions.len(), 11);
        assert_eq!(instructions[9], Instruction::Header("New Contributors".to_string()));
        assert_eq!(
            instructions[10],
            Instruction::List(vec![
                vec![link("alice", "https://github.com/alice")],
                vec![link("bob", "https://github.com/bob")],
            ])
        );

        analysis.new_contributors = Some(vec![]);
        let instructions = script(&analysis);
        assert_eq!(
            instructions[10],
            Instruction::Text(vec![plain("No new contributors this period.")])
        );
    }

    #[test]
    fn test_render_file_rejects_unknown_extension_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.pdf");

        let result = render_file(&empty_analysis(), &path);

        assert!(matches!(result, Err(Error::UnsupportedExportFormat(format)) if format == "pdf"));
        assert!(!path.exists());
    }

    #[test]
    fn test_render_file_writes_inferred_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");

        render_file(&empty_analysis(), &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(Analysis::from_json(&written).unwrap(), empty_analysis());
    }
}
