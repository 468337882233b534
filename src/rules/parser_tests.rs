//! Unit tests for rule text parsing.

use super::*;
use crate::rules::spec::{ComponentConstraint, DEFAULT_NAMING_PATTERN, DEFAULT_ZIP_SIZES_BYTES};
use rstest::rstest;

fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| (*s).to_owned()).collect()
}

#[rstest]
fn other_section_yields_sorted_formats() {
    let text = "OTHER\nPDF, EPUB, CBZ, Kindle (.azw, .kf8), MOBIPOCKET (.prc, .mobi)";
    let formats = extract_file_formats(text);

    assert_eq!(
        formats.into_iter().collect::<Vec<_>>(),
        vec![".azw", ".cbz", ".epub", ".kf8", ".mobi", ".pdf", ".prc"]
    );
}

#[rstest]
fn indented_other_section_is_found() {
    let text = "\n        OTHER\n        PDF, EPUB\n        ";

    assert_eq!(extract_file_formats(text), set(&[".epub", ".pdf"]));
}

#[rstest]
fn kindle_mention_implies_both_kindle_extensions() {
    assert_eq!(
        extract_file_formats("OTHER: Kindle only"),
        set(&[".azw", ".kf8"])
    );
}

#[rstest]
#[case::pdfx("OTHER: PDFX only")]
#[case::epubs("OTHER\nEPUBS and CBZX")]
fn partial_tokens_do_not_match(#[case] text: &str) {
    assert_eq!(extract_file_formats(text), default_file_formats());
}

#[rstest]
fn other_section_stops_at_blank_line() {
    let text = "OTHER\nEPUB\n\nPDF is discussed elsewhere";

    assert_eq!(extract_file_formats(text), set(&[".epub"]));
}

#[rstest]
fn other_section_stops_at_next_header() {
    let text = "OTHER\nEPUB\nDIRNAMING\nPDF-Mention-Here";

    assert_eq!(extract_file_formats(text), set(&[".epub"]));
}

#[rstest]
fn missing_other_section_uses_defaults() {
    let text = "DIRNAMING\nGroupName-Author-Title-Format-Language-Year-ISBN-eBook";

    assert_eq!(extract_file_formats(text).len(), 7);
    assert_eq!(extract_file_formats(text), default_file_formats());
}

#[rstest]
fn dirnaming_template_is_split_into_required_components() {
    let naming = extract_naming("DIRNAMING:\nAuthor-Title-Year-GROUP\n");

    assert_eq!(naming.pattern, "Author-Title-Year-GROUP");
    assert_eq!(naming.separators, vec!["-".to_owned()]);
    assert_eq!(naming.max_length, 243);
    let names: Vec<&str> = naming.components.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["Author", "Title", "Year", "GROUP"]);
    assert!(naming.components.iter().all(|c| c.required));
    assert!(
        naming
            .components
            .iter()
            .all(|c| c.constraint == ComponentConstraint::Format("string".to_owned()))
    );
}

#[rstest]
#[case::absent("OTHER\nPDF")]
#[case::no_run("DIRNAMING\nuse a sensible name")]
fn naming_falls_back_to_default(#[case] text: &str) {
    let naming = extract_naming(text);

    assert_eq!(naming, NamingSpec::default());
    assert_eq!(naming.pattern, DEFAULT_NAMING_PATTERN);
}

#[rstest]
fn packaging_section_with_french_marker() {
    let text = "PACKAGING\nZIP+DIZ obligatoire, fichier .nfo obligatoire\n";

    assert_eq!(extract_required_files(text), set(&["diz", "nfo", "zip"]));
}

#[rstest]
fn optional_rar_is_not_required() {
    let text = "PACKAGING: ZIP and DIZ mandatory, RAR optional";

    assert_eq!(extract_required_files(text), set(&["diz", "zip"]));
}

#[rstest]
fn rar_paired_with_marker_is_required() {
    let text = "PACKAGING\nRAR mandatory\n";

    assert_eq!(extract_required_files(text), set(&["rar"]));
}

#[rstest]
fn missing_packaging_section_uses_default_required_files() {
    assert_eq!(extract_required_files("OTHER\nPDF"), set(&["diz", "nfo", "zip"]));
}

#[rstest]
fn explicit_zip_sizes_replace_defaults() {
    let text = "ZIP volumes: 5,000,000 bytes or 20 MB\nZIP 10 MB";
    let packaging = extract_packaging(text);

    assert_eq!(
        packaging.zip.allowed_sizes_bytes.into_iter().collect::<Vec<_>>(),
        vec![5_000_000, 10_000_000, 20_000_000]
    );
    assert_eq!(packaging.zip.max_files, 99);
}

#[rstest]
fn sizes_before_zip_token_are_ignored() {
    let packaging = extract_packaging("Use 5 MB volumes for the ZIP");

    assert_eq!(
        packaging.zip.allowed_sizes_bytes,
        DEFAULT_ZIP_SIZES_BYTES.into_iter().collect::<BTreeSet<u64>>()
    );
}

#[rstest]
fn packaging_defaults_without_explicit_sizes() {
    let packaging = extract_packaging("");

    assert_eq!(packaging, PackagingSpec::default());
    assert_eq!(packaging.nfo.max_width, 80);
    assert_eq!(packaging.diz.max_width, 44);
    assert_eq!(packaging.diz.max_height, 30);
    assert!(!packaging.rar.required);
}

#[rstest]
fn sections_degrade_independently() {
    let text = "OTHER\nEPUB\n\nPACKAGING\nZIP+DIZ mandatory\n";
    let spec = parse_rule_spec(text);

    assert_eq!(spec.file_formats, set(&[".epub"]));
    assert_eq!(spec.naming, NamingSpec::default());
    assert_eq!(spec.required_files, set(&["diz", "zip"]));
}

#[rstest]
fn matching_is_case_insensitive() {
    let spec = parse_rule_spec("other\nepub, pdf\n\ndirnaming: author-title-group\n");

    assert_eq!(spec.file_formats, set(&[".epub", ".pdf"]));
    assert_eq!(spec.naming.pattern, "author-title-group");
}

#[rstest]
fn crlf_line_endings_are_normalised() {
    let spec = parse_rule_spec("OTHER\r\nCBZ\r\n\r\nPDF later\r\n");

    assert_eq!(spec.file_formats, set(&[".cbz"]));
}

#[rstest]
#[case::mid_sentence("Releases in any other format are nuked.\n\nOTHER\nEPUB\n")]
#[case::line_start("Other formats are nuked.\n\nOTHER\nEPUB\n")]
fn format_mentions_in_prose_are_not_headers(#[case] text: &str) {
    assert_eq!(extract_file_formats(text), set(&[".epub"]));
}

#[rstest]
fn packaging_mentions_in_prose_are_not_headers() {
    let text = "Proper packaging is important.\n\nPACKAGING\nRAR mandatory\n";

    assert_eq!(extract_required_files(text), set(&["rar"]));
}

#[rstest]
fn naming_mentions_in_prose_are_not_headers() {
    let text = "See dirnaming below for Foo-Bar.\n\n[ DIRNAMING ]\nAuthor-Title-GROUP\n";

    assert_eq!(extract_naming(text).pattern, "Author-Title-GROUP");
}

#[rstest]
#[case::empty("")]
#[case::noise("lorem ipsum dolor sit amet")]
fn empty_text_parses_to_full_defaults(#[case] text: &str) {
    assert_eq!(parse_rule_spec(text), RuleSpec::default());
}

#[rstest]
#[case::plain("DIRNAMING", true)]
#[case::colon("PACKAGING:", true)]
#[case::bracketed("[ OTHER ]", true)]
#[case::single_letter("A", false)]
#[case::sentence("ZIP+DIZ obligatoire", false)]
#[case::list("PDF, EPUB", false)]
fn section_header_detection(#[case] line: &str, #[case] expected: bool) {
    assert_eq!(is_section_header(line), expected);
}
