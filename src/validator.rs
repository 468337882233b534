//! Release compliance checks.
//!
//! Validation never fails: every finding is collected into a
//! [`ValidationResult`], errors for rule violations and warnings for missing
//! recommended fields. Malformed regular expressions supplied by a rule are
//! reported as findings too.

use crate::release::{FileEntry, Metadata, ReleaseDescriptor, display_value, is_blank};
use crate::rules::{NamingSpec, RuleSpec};
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Outcome of validating a release.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// `true` exactly when `errors` is empty.
    pub valid: bool,
    /// Rule violations.
    pub errors: Vec<String>,
    /// Non-blocking findings.
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// Builds a result, deriving `valid` from `errors`.
    #[must_use]
    pub fn new(errors: Vec<String>, warnings: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }
}

/// Validates `release` against `spec`.
///
/// # Examples
///
/// ```
/// use scenepack::{ReleaseDescriptor, RuleSpec, validate};
///
/// let mut spec = RuleSpec::default();
/// spec.required_files.clear();
/// let release = ReleaseDescriptor::new("Author-Title-EPUB-2024-GRP", "GRP")
///     .with_file("/tmp/book.epub");
///
/// assert!(validate(&release, &spec).valid);
/// ```
#[must_use]
pub fn validate(release: &ReleaseDescriptor, spec: &RuleSpec) -> ValidationResult {
    let mut errors = validate_naming(&release.name, &spec.naming);
    errors.extend(validate_metadata(&release.metadata, spec));
    errors.extend(validate_structure(&release.files, spec));

    let warnings: Vec<String> = spec
        .recommended_fields
        .iter()
        .filter(|field| release.metadata.get(*field).is_none_or(is_blank))
        .map(|field| format!("Recommended field missing: {field}"))
        .collect();

    debug!(
        "validated {}: {} error(s), {} warning(s)",
        release.name,
        errors.len(),
        warnings.len()
    );
    ValidationResult::new(errors, warnings)
}

/// Checks a release name against the naming constraints.
#[must_use]
pub fn validate_naming(name: &str, naming: &NamingSpec) -> Vec<String> {
    if name.trim().is_empty() {
        return vec!["Release name cannot be empty".to_owned()];
    }

    let mut errors = Vec::new();
    if let Some(pattern) = &naming.name_regex {
        match full_match(pattern) {
            Ok(re) if !re.is_match(name) => errors.push(format!(
                "Release name '{name}' does not match the required pattern: {pattern}"
            )),
            Ok(_) => {}
            Err(err) => errors.push(format!("Invalid naming pattern in rule: {err}")),
        }
    }

    let length = name.chars().count();
    if length > naming.max_length {
        errors.push(format!(
            "Release name '{name}' exceeds the maximum length of {} characters ({length})",
            naming.max_length
        ));
    }

    if let Some(allowed) = &naming.allowed_chars {
        match full_match(allowed) {
            Ok(re) if !re.is_match(name) => {
                errors.push(format!("Release name '{name}' contains disallowed characters"));
            }
            Ok(_) => {}
            Err(err) => errors.push(format!("Invalid allowed-characters pattern in rule: {err}")),
        }
    }
    errors
}

/// Checks required fields and per-field formats.
#[must_use]
pub fn validate_metadata(metadata: &Metadata, spec: &RuleSpec) -> Vec<String> {
    let mut errors: Vec<String> = spec
        .required_fields
        .iter()
        .filter(|field| metadata.get(*field).is_none_or(is_blank))
        .map(|field| format!("Required field missing: {field}"))
        .collect();

    for (field, pattern) in &spec.metadata_formats {
        let Some(value) = metadata.get(field).filter(|v| !is_blank(v)) else {
            continue;
        };
        let text = display_value(value);
        match full_match(pattern) {
            Ok(re) if !re.is_match(&text) => errors.push(format!(
                "Invalid format for '{field}': '{text}' does not match pattern '{pattern}'"
            )),
            Ok(_) => {}
            Err(err) => errors.push(format!("Invalid format pattern for '{field}': {err}")),
        }
    }
    errors
}

/// Checks required companion files and accepted payload formats.
#[must_use]
pub fn validate_structure(files: &[FileEntry], spec: &RuleSpec) -> Vec<String> {
    let extensions: BTreeSet<String> = files.iter().filter_map(extension).collect();
    let compound: BTreeSet<String> = files.iter().filter_map(compound_token).collect();

    let mut errors: Vec<String> = spec
        .required_files
        .iter()
        .filter(|token| {
            let bare = token.trim_start_matches('.').to_lowercase();
            !extensions.contains(&format!(".{bare}")) && !compound.contains(&bare)
        })
        .map(|token| format!("Required file missing: {token}"))
        .collect();

    if !spec.file_formats.is_empty() {
        let accepted: BTreeSet<String> = spec
            .file_formats
            .iter()
            .map(|f| format!(".{}", f.trim_start_matches('.').to_lowercase()))
            .collect();
        let listing = spec
            .file_formats
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        errors.extend(
            files
                .iter()
                .filter_map(extension)
                .filter(|ext| !accepted.contains(ext))
                .map(|ext| format!("File format not accepted: {ext} (accepted formats: {listing})")),
        );
    }
    errors
}

/// Lowercased extension with its leading dot.
fn extension(file: &FileEntry) -> Option<String> {
    file.effective_path()
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
}

/// Last dot-segment of the file stem, e.g. `nfo` for `release.nfo.txt`.
fn compound_token(file: &FileEntry) -> Option<String> {
    let stem = file.effective_path().file_stem()?.to_string_lossy().to_lowercase();
    stem.rsplit('.').next().map(str::to_owned)
}

fn full_match(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("^(?:{pattern})$"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::release::FileEntry;
    use rstest::{fixture, rstest};
    use serde_json::json;

    #[fixture]
    fn spec() -> RuleSpec {
        RuleSpec::default()
    }

    fn files(names: &[&str]) -> Vec<FileEntry> {
        names.iter().map(|n| FileEntry::from(*n)).collect()
    }

    #[rstest]
    fn compliant_release_is_valid(spec: RuleSpec) {
        let release = ReleaseDescriptor {
            files: files(&["book.epub", "release.zip", "file_id.diz", "release.nfo.epub"]),
            ..ReleaseDescriptor::new("Author-Title-EPUB-2024-GRP", "GRP")
        };
        let mut spec = spec;
        spec.file_formats.extend([".zip".to_owned(), ".diz".to_owned()]);

        let result = validate(&release, &spec);

        assert_eq!(result, ValidationResult::new(Vec::new(), Vec::new()));
        assert!(result.valid);
    }

    #[rstest]
    fn empty_name_short_circuits_naming_checks() {
        let naming = NamingSpec {
            name_regex: Some("[A-Z]+".to_owned()),
            allowed_chars: Some("[a-z]+".to_owned()),
            ..NamingSpec::default()
        };

        assert_eq!(
            validate_naming("   ", &naming),
            ["Release name cannot be empty"]
        );
    }

    #[rstest]
    fn name_regex_must_match_the_whole_name() {
        let naming = NamingSpec {
            name_regex: Some("[A-Za-z]+-[A-Z]+".to_owned()),
            ..NamingSpec::default()
        };

        assert!(validate_naming("Title-GRP", &naming).is_empty());
        assert_eq!(validate_naming("Title-GRP-2024", &naming).len(), 1);
    }

    #[rstest]
    fn malformed_patterns_are_reported_not_raised() {
        let naming = NamingSpec {
            name_regex: Some("(unclosed".to_owned()),
            allowed_chars: Some("[".to_owned()),
            ..NamingSpec::default()
        };

        let errors = validate_naming("Title-GRP", &naming);

        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| e.starts_with("Invalid")));
    }

    #[rstest]
    fn length_is_counted_in_characters() {
        let naming = NamingSpec {
            max_length: 5,
            ..NamingSpec::default()
        };

        assert!(validate_naming("ÉÉÉÉÉ", &naming).is_empty());
        assert_eq!(validate_naming("ÉÉÉÉÉÉ", &naming).len(), 1);
    }

    #[rstest]
    fn allowed_chars_are_checked_independently() {
        let naming = NamingSpec {
            allowed_chars: Some(r"[A-Za-z0-9.\-_]+".to_owned()),
            max_length: 3,
            ..NamingSpec::default()
        };

        let errors = validate_naming("Bad Name", &naming);

        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.contains("disallowed characters")));
    }

    #[rstest]
    fn required_and_formatted_fields(mut spec: RuleSpec) {
        spec.required_fields = vec!["title".to_owned(), "author".to_owned(), "tags".to_owned()];
        spec.metadata_formats.insert("year".to_owned(), r"\d{4}".to_owned());
        spec.metadata_formats.insert("isbn".to_owned(), r"\d{13}".to_owned());
        spec.metadata_formats.insert("lang".to_owned(), "(".to_owned());
        let mut metadata = Metadata::new();
        metadata.insert("title".to_owned(), json!("Dune"));
        metadata.insert("author".to_owned(), json!("  "));
        metadata.insert("tags".to_owned(), json!([]));
        metadata.insert("year".to_owned(), json!(1965));
        metadata.insert("isbn".to_owned(), json!("978-0"));
        metadata.insert("lang".to_owned(), json!("en"));

        let errors = validate_metadata(&metadata, &spec);

        assert_eq!(errors.len(), 4, "{errors:?}");
        assert_eq!(
            errors.get(..3),
            Some(
                &[
                    "Required field missing: author".to_owned(),
                    "Required field missing: tags".to_owned(),
                    r"Invalid format for 'isbn': '978-0' does not match pattern '\d{13}'".to_owned(),
                ][..]
            )
        );
        assert!(errors.last().is_some_and(|e| e.starts_with("Invalid format pattern for 'lang'")));
    }

    #[rstest]
    fn required_tokens_accept_extension_or_compound_name(spec: RuleSpec) {
        let mut spec = spec;
        spec.file_formats.clear();

        let errors = validate_structure(&files(&["a.ZIP", "b.diz", "release.nfo.txt"]), &spec);

        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(
            validate_structure(&files(&["a.zip"]), &spec),
            ["Required file missing: diz", "Required file missing: nfo"]
        );
    }

    #[rstest]
    fn dotted_required_tokens_are_normalised(mut spec: RuleSpec) {
        spec.required_files = [".NFO".to_owned()].into_iter().collect();
        spec.file_formats.clear();

        assert!(validate_structure(&files(&["x.nfo"]), &spec).is_empty());
    }

    #[rstest]
    fn each_unaccepted_file_is_one_error(mut spec: RuleSpec) {
        spec.required_files.clear();

        let errors = validate_structure(&files(&["a.epub", "b.exe", "c.EXE", "README"]), &spec);

        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| e.starts_with("File format not accepted: .exe")));
    }

    #[rstest]
    fn empty_format_set_accepts_anything(mut spec: RuleSpec) {
        spec.required_files.clear();
        spec.file_formats.clear();

        assert!(validate_structure(&files(&["a.exe"]), &spec).is_empty());
    }

    #[rstest]
    fn renamed_entries_are_checked_by_target_name(mut spec: RuleSpec) {
        spec.required_files.clear();

        let entries = vec![FileEntry::renamed("/tmp/upload.bin", "book.pdf")];

        assert!(validate_structure(&entries, &spec).is_empty());
    }

    #[rstest]
    fn missing_recommended_fields_only_warn(mut spec: RuleSpec) {
        spec.required_files.clear();
        spec.recommended_fields = vec!["isbn".to_owned()];
        let release = ReleaseDescriptor::new("Author-Title-GRP", "GRP");

        let result = validate(&release, &spec);

        assert!(result.valid);
        assert_eq!(result.warnings, ["Recommended field missing: isbn"]);
    }

    #[rstest]
    fn validity_tracks_errors(spec: RuleSpec) {
        let release = ReleaseDescriptor::new("", "GRP");

        let result = validate(&release, &spec);

        assert!(!result.valid);
        assert_eq!(result.valid, result.errors.is_empty());
        let json = serde_json::to_value(&result).expect("serialise");
        assert_eq!(json["valid"], false);
    }
}
