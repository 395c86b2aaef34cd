//! YAML frontmatter for static-site generators.
//!
//! Template values use `%{key}` placeholders; `%%` is a literal percent sign.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use std::collections::BTreeMap;

/// Placeholder values, keyed by normalized name.
pub type Values = BTreeMap<String, String>;

/// Keys may be written as `name` or in symbol form `:name`; both refer to the same value.
fn normalize_key(key: &str) -> &str {
    let key = key.trim();
    key.strip_prefix(':').unwrap_or(key)
}

/// Builds a value map from any string-like keys, normalizing them.
pub fn values<K, V, I>(pairs: I) -> Values
where
    K: AsRef<str>,
    V: ToString,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(key, value)| (normalize_key(key.as_ref()).to_string(), value.to_string()))
        .collect()
}

/// Replaces every `%{key}` in `template` with its value.
pub fn interpolate(template: &str, values: &Values) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos + 1..];

        if let Some(after) = tail.strip_prefix('%') {
            out.push('%');
            rest = after;
        } else if let Some(placeholder) = tail.strip_prefix('{') {
            let Some(end) = placeholder.find('}') else {
                return Err(Error::Config(format!(
                    "unterminated placeholder in `{template}'"
                )));
            };
            let key = normalize_key(&placeholder[..end]);
            let value = values
                .get(key)
                .ok_or_else(|| Error::MissingPlaceholder(key.to_string()))?;
            out.push_str(value);
            rest = &placeholder[end + 1..];
        } else {
            out.push('%');
            rest = tail;
        }
    }
    out.push_str(rest);

    Ok(out)
}

/// Fills in `template` and serializes the result as a block-style YAML mapping,
/// without document delimiters.
pub fn generate<K: AsRef<str>>(template: &IndexMap<K, String>, values: &Values) -> Result<String> {
    let filled = template
        .iter()
        .map(|(key, value)| {
            interpolate(value, values).map(|filled| (normalize_key(key.as_ref()).to_string(), filled))
        })
        .collect::<Result<IndexMap<String, String>>>()?;

    Ok(serde_yaml::to_string(&filled)?)
}

/// Frontmatter block ready to prepend to a report: delimited by `---` lines
/// and followed by a blank line.
pub fn block<K: AsRef<str>>(template: &IndexMap<K, String>, values: &Values) -> Result<String> {
    Ok(format!("---\n{}---\n\n", generate(template, values)?))
}

/// Prepends frontmatter (if any) to a rendered report.
pub fn build_report<K: AsRef<str>>(
    template: Option<&IndexMap<K, String>>,
    values: &Values,
    report: &str,
) -> Result<String> {
    let mut document = match template {
        Some(template) => block(template, values)?,
        None => String::new(),
    };
    document.push_str(report);
    if !document.ends_with('\n') {
        document.push('\n');
    }
    Ok(document)
}
