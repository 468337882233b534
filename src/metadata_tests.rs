//! Unit tests for eBook metadata extraction.

use super::*;
use crate::nfo::NfoFormatter;
use rstest::{fixture, rstest};
use serde_json::json;
use std::io::Write;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const CONTAINER: &str = r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

const PACKAGE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="2.0" unique-identifier="uid">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:opf="http://www.idpf.org/2007/opf">
    <dc:title>Dune</dc:title>
    <dc:creator opf:role="aut">Frank Herbert</dc:creator>
    <dc:publisher>Chilton   Books</dc:publisher>
    <dc:identifier id="uid">urn:uuid:1b4e28ba-2fa1-11d2-883f-0016d3cca427</dc:identifier>
    <dc:identifier opf:scheme="ISBN">0-441-17271-7</dc:identifier>
    <dc:language>eng</dc:language>
    <dc:date>1965-08-01T00:00:00Z</dc:date>
    <dc:description>Spice &amp; sand
      on Arrakis.</dc:description>
  </metadata>
  <manifest>
    <item id="ch1" href="ch1.xhtml" media-type="application/xhtml+xml"/>
  </manifest>
</package>"#;

#[fixture]
fn temp_dir() -> TempDir {
    TempDir::new().expect("temp dir creation succeeds")
}

fn epub(dir: &TempDir, entries: &[(&str, &str)]) -> PathBuf {
    let path = dir.path().join("book.epub");
    let mut zip = ZipWriter::new(fs::File::create(&path).expect("create epub"));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    for (name, body) in entries {
        zip.start_file(*name, options).expect("start entry");
        zip.write_all(body.as_bytes()).expect("write entry");
    }
    zip.finish().expect("finish epub");
    path
}

#[rstest]
fn reads_dublin_core_fields(temp_dir: TempDir) {
    let path = epub(
        &temp_dir,
        &[
            ("mimetype", "application/epub+zip"),
            ("META-INF/container.xml", CONTAINER),
            ("OEBPS/content.opf", PACKAGE),
        ],
    );

    let metadata = extract_epub_metadata(&path).expect("metadata");

    assert_eq!(metadata.get("title"), Some(&json!("Dune")));
    assert_eq!(metadata.get("author"), Some(&json!("Frank Herbert")));
    assert_eq!(metadata.get("publisher"), Some(&json!("Chilton Books")));
    assert_eq!(metadata.get("isbn"), Some(&json!("9780441172719")));
    assert_eq!(metadata.get("language"), Some(&json!("en")));
    assert_eq!(metadata.get("year"), Some(&json!(1965)));
    assert_eq!(metadata.get("publication_date"), Some(&json!("1965-08-01")));
    assert_eq!(
        metadata.get("description"),
        Some(&json!("Spice & sand on Arrakis."))
    );
}

#[rstest]
fn several_creators_become_an_author_list(temp_dir: TempDir) {
    let package = r#"<package><metadata>
        <dc:title>Good Omens</dc:title>
        <dc:creator>Terry Pratchett</dc:creator>
        <dc:creator>Neil Gaiman</dc:creator>
    </metadata></package>"#;
    let path = epub(
        &temp_dir,
        &[
            ("META-INF/container.xml", CONTAINER),
            ("OEBPS/content.opf", package),
        ],
    );

    let metadata = extract_epub_metadata(&path).expect("metadata");

    assert_eq!(
        metadata.get("author"),
        Some(&json!(["Terry Pratchett", "Neil Gaiman"]))
    );
    assert!(!metadata.contains_key("isbn"));
}

#[rstest]
fn package_document_is_found_without_a_container(temp_dir: TempDir) {
    let path = epub(
        &temp_dir,
        &[
            ("mimetype", "application/epub+zip"),
            ("content.opf", "<package><metadata><dc:title>Dune</dc:title></metadata></package>"),
        ],
    );

    let metadata = extract_epub_metadata(&path).expect("metadata");

    assert_eq!(metadata.get("title"), Some(&json!("Dune")));
}

#[rstest]
fn titles_outside_the_metadata_block_are_ignored(temp_dir: TempDir) {
    let package = "<package><metadata><dc:language>fr-CA</dc:language></metadata>\
                   <guide><title>Cover</title></guide></package>";
    let path = epub(&temp_dir, &[("content.opf", package)]);

    let metadata = extract_epub_metadata(&path).expect("metadata");

    assert!(!metadata.contains_key("title"));
    assert_eq!(metadata.get("language"), Some(&json!("fr")));
}

#[rstest]
fn epub_without_package_document_is_rejected(temp_dir: TempDir) {
    let path = epub(&temp_dir, &[("mimetype", "application/epub+zip")]);

    let err = extract_epub_metadata(&path).expect_err("no opf");

    assert!(matches!(err, MetadataError::MissingPackageDocument { path: p } if p == path));
}

#[rstest]
fn non_zip_files_are_rejected(temp_dir: TempDir) {
    let path = temp_dir.path().join("broken.epub");
    fs::write(&path, b"not a zip at all").expect("write file");

    assert!(matches!(
        extract_epub_metadata(&path),
        Err(MetadataError::Zip(_))
    ));
}

#[rstest]
fn malformed_package_document_is_an_xml_error(temp_dir: TempDir) {
    let path = epub(
        &temp_dir,
        &[("content.opf", "<package><metadata><dc:title>Dune</dc:creator></metadata>")],
    );

    assert!(matches!(
        extract_epub_metadata(&path),
        Err(MetadataError::Xml(_))
    ));
}

#[rstest]
#[case::pdf("book.pdf", "pdf")]
#[case::none("README", "")]
fn other_formats_are_unsupported(#[case] name: &str, #[case] expected: &str) {
    assert!(matches!(
        extract_metadata(Path::new(name)),
        Err(MetadataError::UnsupportedFormat { extension }) if extension == expected
    ));
}

#[rstest]
fn extracted_metadata_renders_into_the_nfo(temp_dir: TempDir) {
    let path = epub(
        &temp_dir,
        &[
            ("META-INF/container.xml", CONTAINER),
            ("OEBPS/content.opf", PACKAGE),
        ],
    );

    let metadata = extract_metadata(&path).expect("metadata");
    let nfo = NfoFormatter::default().render(&metadata, None);

    assert!(nfo.contains("Title: Dune"));
    assert!(nfo.contains("Author: Frank Herbert"));
    assert!(nfo.contains("ISBN: 9780441172719"));
    assert!(nfo.contains("Language: en"));
    assert!(nfo.contains("Year: 1965"));
}

#[rstest]
#[case::isbn13_dashed("978-0-441-17271-9", Some("9780441172719"))]
#[case::isbn10("0441172717", Some("9780441172719"))]
#[case::isbn10_check_x("0-8044-2957-X", Some("9780804429573"))]
#[case::lower_x("080442957x", Some("9780804429573"))]
#[case::prefixed("urn:isbn:9780804429573", Some("9780804429573"))]
#[case::bad_check("9780441172710", None)]
#[case::bad_prefix("1230441172719", None)]
#[case::too_short("12345", None)]
#[case::uuid("urn:uuid:1b4e28ba-2fa1", None)]
fn isbns_normalise_to_thirteen_digits(#[case] raw: &str, #[case] expected: Option<&str>) {
    assert_eq!(normalize_isbn(raw).as_deref(), expected);
}

#[rstest]
#[case::name("English", Some("en"))]
#[case::iso_639_2("ger", Some("de"))]
#[case::bibliographic("fre", Some("fr"))]
#[case::region("pt-BR", Some("pt"))]
#[case::underscore("es_MX", Some("es"))]
#[case::passthrough(" IS ", Some("is"))]
#[case::unknown("Klingon", Some("klingon"))]
#[case::blank("  ", None)]
fn languages_normalise_to_iso_codes(#[case] raw: &str, #[case] expected: Option<&str>) {
    assert_eq!(normalize_language(raw).as_deref(), expected);
}
