//! Canonical release names and metadata normalisation.

use crate::release::{Metadata, is_blank};
use chrono::NaiveDate;
use serde_json::Value;
use thiserror::Error;

/// Longest release name the formatter produces.
pub const MAX_RELEASE_NAME_LENGTH: usize = 255;

/// Metadata keys whose numeric strings become numbers.
const NUMERIC_KEYS: [&str; 3] = ["year", "pages", "size"];

/// Errors raised while formatting a release name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// The group is empty once normalised.
    #[error("group name cannot be empty")]
    EmptyGroup,

    /// The date is not a `YYYYMMDD` calendar date.
    #[error("invalid date '{date}': expected YYYYMMDD")]
    InvalidDate {
        /// The rejected date.
        date: String,
    },
}

/// Builds a `Title-GROUP-YYYYMMDD` release name.
///
/// Spaces in the title become dashes, characters outside `[A-Za-z0-9-]` are
/// dropped and dash runs collapse. The group is upper-cased and filtered the
/// same way. The title is shortened so the whole name fits in
/// [`MAX_RELEASE_NAME_LENGTH`] characters.
///
/// # Errors
///
/// Returns [`FormatError::EmptyGroup`] or [`FormatError::InvalidDate`].
///
/// # Examples
///
/// ```
/// use scenepack::formatter::format_release_name;
///
/// let name = format_release_name("Test Book: Vol. 2", "grp", "20250124")?;
/// assert_eq!(name, "Test-Book-Vol-2-GRP-20250124");
/// # Ok::<(), scenepack::formatter::FormatError>(())
/// ```
pub fn format_release_name(title: &str, group: &str, date: &str) -> Result<String, FormatError> {
    let group = clean(&group.trim().to_uppercase());
    if group.is_empty() {
        return Err(FormatError::EmptyGroup);
    }
    let date = date.trim();
    if date.len() != 8
        || !date.chars().all(|c| c.is_ascii_digit())
        || NaiveDate::parse_from_str(date, "%Y%m%d").is_err()
    {
        return Err(FormatError::InvalidDate {
            date: date.to_owned(),
        });
    }

    let room = MAX_RELEASE_NAME_LENGTH.saturating_sub(group.len() + date.len() + 2);
    let title: String = clean(&title.trim().replace(' ', "-"))
        .chars()
        .take(room)
        .collect();
    let title = title.trim_end_matches('-');

    if title.is_empty() {
        Ok(format!("{group}-{date}"))
    } else {
        Ok(format!("{title}-{group}-{date}"))
    }
}

/// Appends `extension` to `base`, adding the leading dot when missing.
#[must_use]
pub fn format_filename(base: &str, extension: &str) -> String {
    match extension {
        "" => base.to_owned(),
        ext if ext.starts_with('.') => format!("{base}{ext}"),
        ext => format!("{base}.{ext}"),
    }
}

/// Returns a cleaned copy of `metadata`.
///
/// Null and blank values are dropped, strings are trimmed, and numeric
/// strings under `year`, `pages` and `size` become integers. Arrays lose
/// their null and blank items and are dropped when nothing remains.
#[must_use]
pub fn normalize_metadata(metadata: &Metadata) -> Metadata {
    metadata
        .iter()
        .filter_map(|(key, value)| normalize_value(key, value).map(|v| (key.clone(), v)))
        .collect()
}

fn normalize_value(key: &str, value: &Value) -> Option<Value> {
    if is_blank(value) {
        return None;
    }
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if NUMERIC_KEYS.contains(&key) {
                if let Ok(n) = trimmed.parse::<i64>() {
                    return Some(Value::from(n));
                }
            }
            Some(Value::from(trimmed))
        }
        Value::Array(items) => {
            let kept: Vec<Value> = items
                .iter()
                .filter(|item| !is_blank(item))
                .map(|item| match item {
                    Value::String(s) => Value::from(s.trim()),
                    other => other.clone(),
                })
                .collect();
            (!kept.is_empty()).then_some(Value::Array(kept))
        }
        other => Some(other.clone()),
    }
}

/// Drops characters outside `[A-Za-z0-9-]` and collapses dash runs.
fn clean(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars().filter(|c| c.is_ascii_alphanumeric() || *c == '-') {
        if c == '-' && (out.is_empty() || out.ends_with('-')) {
            continue;
        }
        out.push(c);
    }
    out.trim_end_matches('-').to_owned()
}
