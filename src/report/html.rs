//! HTML backend.
//!
//! Text is emitted as given: list items and paragraphs are not HTML-escaped,
//! so label names or URLs containing markup pass through unchanged.

use super::{label_width, percentages, Backend, BarRow, Inline};

const STYLESHEET: &str = r#"
  body { font-family: sans-serif; }
  main {
    max-width: 600px;
    max-width: 72ch;
    margin: auto;
  }

  .horizontal-bar-graph {
    position: relative;
    width: 100%;
  }
  .horizontal-bar-graph .fill {
    display: inline-block;
    background: #CCC;
  }
"#;

#[derive(Debug, Default)]
pub struct HtmlBackend {
    title: Option<String>,
    body: String,
}

impl HtmlBackend {
    /// The rendered instructions without the surrounding document.
    pub fn into_partial(self) -> String {
        self.body
    }

    /// A standalone page with its own stylesheet.
    pub fn into_document(self) -> String {
        format!(
            r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>{title}</title>
  <style>{css}  </style>
</head>
<body>
  <main>
{body}  </main>
</body>
</html>
"#,
            title = self.title.as_deref().unwrap_or_default(),
            css = STYLESHEET,
            body = self.body,
        )
    }

    fn line(&mut self, html: &str) {
        self.body.push_str(html);
        self.body.push('\n');
    }

    fn inline(content: &[Inline]) -> String {
        content
            .iter()
            .map(|part| match part {
                Inline::Plain(text) => text.clone(),
                Inline::Link { text, url } => anchor(text, url),
            })
            .collect()
    }
}

fn anchor(text: &str, url: &str) -> String {
    format!(r#"<a href="{url}">{text}</a>"#)
}

impl Backend for HtmlBackend {
    fn title(&mut self, text: &str) {
        self.title = Some(text.to_string());
        self.line(&format!("<h1>{text}</h1>"));
    }

    fn header(&mut self, text: &str) {
        self.line(&format!("<h2>{text}</h2>"));
    }

    fn text(&mut self, content: &[Inline]) {
        self.line(&format!("<p>{}</p>", Self::inline(content)));
    }

    fn list(&mut self, items: &[Vec<Inline>]) {
        self.body.push_str("<ul>\n");
        for item in items {
            // TODO: escape markup in item text once golden reports can be regenerated.
            self.line(&format!("  <li>{}</li>", Self::inline(item)));
        }
        self.body.push_str("</ul>\n");
    }

    fn bar_graph(&mut self, rows: &[BarRow]) {
        let label_width = format!("{}ch", label_width(rows));

        self.body.push_str("<table class=\"horizontal-bar-graph\">\n");
        for (row, percentage) in rows.iter().zip(percentages(rows)) {
            let label = match &row.link {
                Some(url) => anchor(&row.label, url),
                None => row.label.clone(),
            };
            self.body.push_str(&format!(
                r#"  <tr>
    <td style="width: {label_width}">{label}</td>
    <td><span class="fill" style="width: {percentage}%">{count}</span></td>
  </tr>
"#,
                count = row.count,
            ));
        }
        self.body.push_str("</table>\n");
    }

    fn pulse_summary(&mut self, url: &str) {
        self.line(&format!(
            "<p>See the {} for a summary of recent activity.</p>",
            anchor("monthly pulse", url)
        ));
    }
}
