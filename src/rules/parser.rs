//! Heuristic extraction of a [`RuleSpec`] from free-form rule text.
//!
//! Rule texts loosely follow the NFO convention with section headers such as
//! `OTHER`, `DIRNAMING` and `PACKAGING`. Each section is parsed independently
//! and falls back to its eBook-2022 default when absent or unrecognised, so
//! parsing never fails.

use super::spec::{
    NamingSpec, PackagingSpec, RuleSpec, default_file_formats, default_required_files,
};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

const BYTES_PER_MB: u64 = 1_000_000;

static OTHER_HEADER: Lazy<Option<Regex>> = Lazy::new(|| header_regex("OTHER"));
static DIRNAMING_HEADER: Lazy<Option<Regex>> = Lazy::new(|| header_regex("DIRNAMING"));
static PACKAGING_HEADER: Lazy<Option<Regex>> = Lazy::new(|| header_regex("PACKAGING"));

/// Whole-word format tokens and the extension each implies.
static FORMAT_TOKENS: Lazy<Vec<(Regex, &'static [&'static str])>> = Lazy::new(|| {
    [
        ("PDF", &[".pdf"][..]),
        ("EPUB", &[".epub"][..]),
        ("CBZ", &[".cbz"][..]),
        ("AZW", &[".azw"][..]),
        ("KF8", &[".kf8"][..]),
        ("PRC", &[".prc"][..]),
        ("MOBI", &[".mobi"][..]),
        ("KINDLE", &[".azw", ".kf8"][..]),
        ("MOBIPOCKET", &[".mobi", ".prc"][..]),
    ]
    .into_iter()
    .filter_map(|(token, extensions)| word_regex(token).map(|re| (re, extensions)))
    .collect()
});

static NAMING_RUN: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"[A-Za-z]+(?:-[A-Za-z]+)+").ok());

static MANDATORY: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:obligatoire|mandatory)\b").ok());

static NFO_MANDATORY: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?is)\.nfo\b.*\b(?:obligatoire|mandatory)\b").ok());

static RAR_MANDATORY: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?i)\bRAR\b[^,;.\n]*\b(?:obligatoire|mandatory)\b").ok());

static ZIP_WORD: Lazy<Option<Regex>> = Lazy::new(|| word_regex("ZIP"));
static DIZ_WORD: Lazy<Option<Regex>> = Lazy::new(|| word_regex("DIZ"));

static SIZE_WITH_UNIT: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?i)(\d[\d.,]*)\s*(bytes?|mb|b)\b").ok());

/// Parse rule text into a [`RuleSpec`].
///
/// Sections missing from `rule_text` take their documented defaults; a rule
/// lacking only `DIRNAMING` still yields its parsed formats and packaging.
///
/// # Examples
///
/// ```
/// use scenepack::rules::parse_rule_spec;
///
/// let spec = parse_rule_spec("OTHER\nPDF, EPUB\n");
/// let formats: Vec<_> = spec.file_formats.iter().map(String::as_str).collect();
/// assert_eq!(formats, [".epub", ".pdf"]);
/// assert_eq!(spec.naming.max_length, 243);
/// ```
#[must_use]
pub fn parse_rule_spec(rule_text: &str) -> RuleSpec {
    let text = rule_text.replace("\r\n", "\n");
    RuleSpec {
        file_formats: extract_file_formats(&text),
        naming: extract_naming(&text),
        required_files: extract_required_files(&text),
        packaging: extract_packaging(&text),
        ..RuleSpec::default()
    }
}

/// Extract accepted payload extensions from the `OTHER` section.
#[must_use]
pub fn extract_file_formats(text: &str) -> BTreeSet<String> {
    let formats: BTreeSet<String> = section_body(text, &OTHER_HEADER)
        .map(|body| {
            FORMAT_TOKENS
                .iter()
                .filter(|(re, _)| re.is_match(&body))
                .flat_map(|(_, extensions)| extensions.iter().map(|e| (*e).to_owned()))
                .collect()
        })
        .unwrap_or_default();

    if formats.is_empty() {
        debug!("no file formats recognised; using eBook-2022 defaults");
        return default_file_formats();
    }
    formats
}

/// Extract the naming template from the `DIRNAMING` section.
#[must_use]
pub fn extract_naming(text: &str) -> NamingSpec {
    let template = section_body(text, &DIRNAMING_HEADER).and_then(|body| {
        NAMING_RUN
            .as_ref()
            .and_then(|re| re.find(&body))
            .map(|m| m.as_str().to_owned())
    });

    match template {
        Some(pattern) => NamingSpec::from_template(&pattern),
        None => {
            debug!("no naming template recognised; using eBook-2022 default");
            NamingSpec::default()
        }
    }
}

/// Extract required companion files from the `PACKAGING` section.
#[must_use]
pub fn extract_required_files(text: &str) -> BTreeSet<String> {
    let mut required = BTreeSet::new();

    if let Some(body) = section_body(text, &PACKAGING_HEADER) {
        if matches(&ZIP_WORD, &body) && matches(&DIZ_WORD, &body) && matches(&MANDATORY, &body) {
            required.insert("zip".to_owned());
            required.insert("diz".to_owned());
        }
        if matches(&NFO_MANDATORY, &body) {
            required.insert("nfo".to_owned());
        }
        if matches(&RAR_MANDATORY, &body) {
            required.insert("rar".to_owned());
        }
    }

    if required.is_empty() {
        debug!("no required files recognised; using eBook-2022 defaults");
        return default_required_files();
    }
    required
}

/// Extract packaging constraints, overriding ZIP sizes when the text states
/// them explicitly.
#[must_use]
pub fn extract_packaging(text: &str) -> PackagingSpec {
    let mut packaging = PackagingSpec::default();
    let sizes = explicit_zip_sizes(text);
    if !sizes.is_empty() {
        packaging.zip.allowed_sizes_bytes = sizes;
    }
    packaging
}

/// Collect sizes written after a `ZIP` token on the same line.
fn explicit_zip_sizes(text: &str) -> BTreeSet<u64> {
    let (Some(zip_word), Some(size_re)) = (ZIP_WORD.as_ref(), SIZE_WITH_UNIT.as_ref()) else {
        return BTreeSet::new();
    };

    text.lines()
        .filter_map(|line| {
            let start = zip_word.find(line)?.end();
            line.get(start..)
        })
        .flat_map(|tail| size_re.captures_iter(tail))
        .filter_map(|caps| {
            let digits: String = caps
                .get(1)?
                .as_str()
                .chars()
                .filter(char::is_ascii_digit)
                .collect();
            let value: u64 = digits.parse().ok()?;
            let unit = caps.get(2)?.as_str();
            if unit.eq_ignore_ascii_case("mb") {
                value.checked_mul(BYTES_PER_MB)
            } else {
                Some(value)
            }
        })
        .collect()
}

/// Return the body of the section introduced by `header`, if any.
///
/// The header is the first line starting with the section token.
/// The body is the remainder of the header line plus following lines, up to
/// the next blank line or the next all-caps section header. Leading blank
/// lines are skipped and the first content line is never taken as a header.
fn section_body(text: &str, header: &Lazy<Option<Regex>>) -> Option<String> {
    let found = header.as_ref()?.find(text)?;
    let rest = text.get(found.end()..)?;
    let mut lines = rest.lines();
    let mut body: Vec<&str> = Vec::new();

    if let Some(first) = lines.next() {
        let first = first.trim();
        if !first.is_empty() {
            body.push(first);
        }
    }

    for line in lines {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if body.is_empty() {
                continue;
            }
            break;
        }
        if !body.is_empty() && is_section_header(trimmed) {
            break;
        }
        body.push(trimmed);
    }

    if body.is_empty() {
        None
    } else {
        Some(body.join("\n"))
    }
}

/// Whether a trimmed line looks like an all-caps section header.
fn is_section_header(line: &str) -> bool {
    let label = line.trim_end_matches([':', ';']).trim_end();
    let letters = label.chars().filter(char::is_ascii_uppercase).count();
    letters >= 2
        && label.chars().all(|c| {
            c.is_ascii_uppercase() || c.is_ascii_digit() || matches!(c, ' ' | '[' | ']' | '/' | '&' | '_' | '-')
        })
}

/// A header opens its line and is followed by `:`, `;` or the line end, so
/// mentions inside prose never start a section.
fn header_regex(token: &str) -> Option<Regex> {
    Regex::new(&format!(
        r"(?im)^[^\S\n]*\[?[^\S\n]*{token}[^\S\n]*\]?[^\S\n]*(?:[:;]|$)"
    ))
    .ok()
}

fn word_regex(token: &str) -> Option<Regex> {
    Regex::new(&format!(r"(?i)\b{token}\b")).ok()
}

fn matches(re: &Lazy<Option<Regex>>, haystack: &str) -> bool {
    re.as_ref().is_some_and(|re| re.is_match(haystack))
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
