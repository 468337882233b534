//! Fixed-width NFO and `file_id.diz` rendering.
//!
//! NFO files are plain text read in 80-column viewers, so every line the
//! formatter emits fits within its configured width. Long lines are filled
//! word by word; words longer than the width are broken.

use crate::release::{Metadata, display_value, is_blank};
use crate::rules::DizSpec;
use crate::rules::spec::DEFAULT_NFO_WIDTH;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;

/// Body fields in display order with their labels.
const BODY_FIELDS: [(&str, &str); 10] = [
    ("title", "Title"),
    ("author", "Author"),
    ("publisher", "Publisher"),
    ("isbn", "ISBN"),
    ("year", "Year"),
    ("language", "Language"),
    ("format", "Format"),
    ("size", "Size"),
    ("pages", "Pages"),
    ("description", "Description"),
];

const UNTITLED: &str = "Untitled Release";

static PLACEHOLDER: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"\{\{(\w+)\}\}|\{(\w+)\}").ok());

/// Renders release metadata as NFO text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NfoFormatter {
    max_width: usize,
}

impl Default for NfoFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_NFO_WIDTH)
    }
}

impl NfoFormatter {
    /// A formatter producing lines of at most `max_width` characters.
    ///
    /// A width of zero is raised to one.
    #[must_use]
    pub const fn new(max_width: usize) -> Self {
        Self {
            max_width: if max_width == 0 { 1 } else { max_width },
        }
    }

    /// The effective line width.
    #[must_use]
    pub const fn max_width(&self) -> usize {
        self.max_width
    }

    /// Renders `metadata`, through `template` when one is given.
    ///
    /// Templates use `{{field}}` or `{field}` placeholders, replaced in a
    /// single pass; absent and null fields render empty. Without a template
    /// the standard header, body and footer layout is used.
    ///
    /// # Examples
    ///
    /// ```
    /// use scenepack::{Metadata, NfoFormatter};
    /// use serde_json::json;
    ///
    /// let mut metadata = Metadata::new();
    /// metadata.insert("title".into(), json!("Dune"));
    ///
    /// let nfo = NfoFormatter::new(40).render(&metadata, Some("** {{title}} **"));
    /// assert_eq!(nfo, "** Dune **");
    /// ```
    #[must_use]
    pub fn render(&self, metadata: &Metadata, template: Option<&str>) -> String {
        let text = match template {
            Some(template) => substitute(template, metadata),
            None => self.layout(metadata).join("\n"),
        };
        wrap(&text, self.max_width).join("\n")
    }

    /// Renders a short `file_id.diz` body within the DIZ box of `spec`.
    #[must_use]
    pub fn render_diz(&self, metadata: &Metadata, spec: &DizSpec) -> String {
        let field = |key: &str| present(metadata, key);
        let mut lines = Vec::new();

        if let Some(title) = field("title") {
            lines.push(title);
        }
        if let Some(author) = field("author") {
            lines.push(format!("by {author}"));
        }
        let edition: Vec<String> = ["format", "year"].into_iter().filter_map(field).collect();
        if !edition.is_empty() {
            lines.push(edition.join(" "));
        }
        if let Some(group) = field("group") {
            lines.push(format!("[{group}]"));
        }

        let mut wrapped = wrap(&lines.join("\n"), spec.max_width.max(1));
        wrapped.truncate(spec.max_height.max(1));
        wrapped.join("\n")
    }

    fn layout(&self, metadata: &Metadata) -> Vec<String> {
        let rule = "=".repeat(self.max_width);
        let group = present(metadata, "group");
        let date = present(metadata, "date");
        let mut lines = vec![rule.clone(), String::new()];

        match metadata.get("title") {
            None => lines.push(format!("Title: {UNTITLED}")),
            Some(title) if !is_blank(title) => lines.push(format!("Title: {}", display_value(title))),
            Some(_) => {}
        }
        match (&group, &date) {
            (Some(group), Some(date)) => lines.push(format!("Release: {group} - {date}")),
            (Some(group), None) => lines.push(format!("Group: {group}")),
            _ => {}
        }
        lines.extend([String::new(), rule.clone(), String::new()]);

        for (key, label) in BODY_FIELDS {
            if let Some(value) = present(metadata, key) {
                lines.push(format!("{label}: {value}"));
            }
        }
        lines.extend([String::new(), rule.clone(), String::new()]);

        if let Some(group) = &group {
            lines.push(format!("Released by: {group}"));
        }
        if let Some(date) = &date {
            lines.push(format!("Release Date: {date}"));
        }
        if let Some(Value::Object(checksums)) = metadata.get("checksums") {
            for (key, label) in [("sha256", "SHA-256"), ("md5", "MD5")] {
                if let Some(value) = checksums.get(key) {
                    lines.push(format!("{label}: {}", display_value(value)));
                }
            }
        }
        lines.extend([String::new(), rule]);
        lines
    }
}

/// Display text of a populated field.
fn present(metadata: &Metadata, key: &str) -> Option<String> {
    metadata
        .get(key)
        .filter(|value| !is_blank(value))
        .map(display_value)
}

fn substitute(template: &str, metadata: &Metadata) -> String {
    let Some(placeholder) = PLACEHOLDER.as_ref() else {
        return template.to_owned();
    };
    placeholder
        .replace_all(template, |caps: &Captures<'_>| {
            caps.get(1)
                .or_else(|| caps.get(2))
                .and_then(|name| metadata.get(name.as_str()))
                .map(display_value)
                .unwrap_or_default()
        })
        .into_owned()
}

/// Splits `text` into lines of at most `width` characters.
///
/// Lines already within the limit pass through untouched, so wrapping is
/// idempotent. Longer lines are filled word by word and words longer than
/// `width` are broken across lines. An over-long blank line becomes an empty
/// line, so the line count never shrinks.
#[must_use]
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    text.split('\n')
        .flat_map(|line| {
            if line.chars().count() <= width {
                vec![line.to_owned()]
            } else {
                fill(line, width)
            }
        })
        .collect()
}

fn fill(line: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in line.split_whitespace() {
        let word_len = word.chars().count();
        if current_len > 0 && current_len + 1 + word_len <= width {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
            continue;
        }
        if current_len > 0 {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if word_len <= width {
            current.push_str(word);
            current_len = word_len;
            continue;
        }

        let chars: Vec<char> = word.chars().collect();
        let mut chunks = chars.chunks(width).peekable();
        while let Some(chunk) = chunks.next() {
            if chunks.peek().is_some() {
                lines.push(chunk.iter().collect());
            } else {
                current = chunk.iter().collect();
                current_len = chunk.len();
            }
        }
    }

    if current_len > 0 || lines.is_empty() {
        lines.push(current);
    }
    lines
}
