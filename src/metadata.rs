//! Release metadata read from eBook files.
//!
//! EPUB files are ZIP containers whose package document (the OPF file named
//! by `META-INF/container.xml`) carries Dublin Core metadata. The fields the
//! NFO layout knows about are lifted out, ISBNs are normalised to ISBN-13 and
//! languages to ISO 639-1 codes where a mapping exists, and the result goes
//! through [`normalize_metadata`].

use crate::formatter::normalize_metadata;
use crate::release::Metadata;
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use regex::Regex;
use serde_json::Value;
use std::fs;
use std::io::{self, Read, Seek};
use std::path::{Path, PathBuf};
use thiserror::Error;
use zip::ZipArchive;
use zip::result::ZipError;

const CONTAINER_PATH: &str = "META-INF/container.xml";

/// ISO 639-2 codes and English names mapped to ISO 639-1.
const LANGUAGE_CODES: [(&str, &str); 30] = [
    ("english", "en"),
    ("eng", "en"),
    ("french", "fr"),
    ("francais", "fr"),
    ("fre", "fr"),
    ("fra", "fr"),
    ("spanish", "es"),
    ("spa", "es"),
    ("german", "de"),
    ("ger", "de"),
    ("deu", "de"),
    ("italian", "it"),
    ("ita", "it"),
    ("portuguese", "pt"),
    ("por", "pt"),
    ("dutch", "nl"),
    ("dut", "nl"),
    ("nld", "nl"),
    ("russian", "ru"),
    ("rus", "ru"),
    ("chinese", "zh"),
    ("chi", "zh"),
    ("zho", "zh"),
    ("japanese", "ja"),
    ("jpn", "ja"),
    ("korean", "ko"),
    ("kor", "ko"),
    ("polish", "pl"),
    ("pol", "pl"),
    ("swedish", "sv"),
];

static ISBN_CANDIDATE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"\d{13}|\d{9}[\dX]").ok());

static LEADING_DATE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^(\d{4})(-\d{2}-\d{2})?").ok());

/// Errors raised while reading metadata from a file.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// The file type has no metadata reader.
    #[error("unsupported eBook format: '{extension}'")]
    UnsupportedFormat {
        /// Lower-cased extension, empty when the file has none.
        extension: String,
    },

    /// The EPUB holds no OPF package document.
    #[error("no package document found in {}", path.display())]
    MissingPackageDocument {
        /// The EPUB that was read.
        path: PathBuf,
    },

    /// The file could not be read.
    #[error("I/O error reading metadata: {0}")]
    Io(#[from] io::Error),

    /// The file is not a readable ZIP container.
    #[error("archive error: {0}")]
    Zip(#[from] ZipError),

    /// A container or package document is not well-formed XML.
    #[error("malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),
}

/// Reads metadata from `path`, choosing a reader by file extension.
///
/// # Errors
///
/// Returns [`MetadataError::UnsupportedFormat`] for anything but `.epub`,
/// otherwise as for [`extract_epub_metadata`].
pub fn extract_metadata(path: &Path) -> Result<Metadata, MetadataError> {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "epub" => extract_epub_metadata(path),
        _ => Err(MetadataError::UnsupportedFormat { extension }),
    }
}

/// Reads the Dublin Core metadata of an EPUB.
///
/// Produces `title`, `author` (a string, or an array for several creators),
/// `publisher`, `isbn`, `language`, `year`, `publication_date` and
/// `description` where present. Identifiers that do not normalise to a valid
/// ISBN are left out.
///
/// # Errors
///
/// Returns [`MetadataError::Zip`] when the file is not a ZIP container,
/// [`MetadataError::MissingPackageDocument`] when no OPF file can be found,
/// and [`MetadataError::Xml`] when the container or OPF file is malformed.
pub fn extract_epub_metadata(path: &Path) -> Result<Metadata, MetadataError> {
    let mut archive = ZipArchive::new(fs::File::open(path)?)?;
    let Some(opf_path) = package_document_path(&mut archive)? else {
        return Err(MetadataError::MissingPackageDocument {
            path: path.to_path_buf(),
        });
    };
    debug!("reading package document {opf_path} from {}", path.display());

    let mut xml = String::new();
    archive.by_name(&opf_path)?.read_to_string(&mut xml)?;
    let metadata = normalize_metadata(&read_package_document(&xml)?.into_metadata());
    info!("read {} metadata fields from {}", metadata.len(), path.display());
    Ok(metadata)
}

/// Normalises an ISBN to its 13-digit form.
///
/// Dashes and spaces are ignored and any prefix such as `ISBN:` or
/// `urn:isbn:` is skipped. A valid ISBN-10 is converted to ISBN-13; check
/// digits are verified for both forms.
///
/// # Examples
///
/// ```
/// use scenepack::metadata::normalize_isbn;
///
/// assert_eq!(normalize_isbn("ISBN 0-441-17271-7").as_deref(), Some("9780441172719"));
/// assert_eq!(normalize_isbn("0-441-17271-8"), None);
/// ```
#[must_use]
pub fn normalize_isbn(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .chars()
        .filter(|c| *c != '-' && !c.is_whitespace())
        .collect::<String>()
        .to_ascii_uppercase();
    let normalised = ISBN_CANDIDATE
        .as_ref()
        .and_then(|pattern| pattern.find(&cleaned))
        .and_then(|candidate| isbn13(candidate.as_str()));
    if normalised.is_none() {
        warn!("ignoring invalid ISBN '{raw}'");
    }
    normalised
}

fn isbn13(candidate: &str) -> Option<String> {
    let digits: Vec<u32> = candidate
        .chars()
        .map(|c| if c == 'X' { Some(10) } else { c.to_digit(10) })
        .collect::<Option<_>>()?;

    match digits.as_slice() {
        [body @ .., check] if digits.len() == 13 => {
            let prefixed = candidate.starts_with("978") || candidate.starts_with("979");
            (prefixed && isbn13_check(body) == *check).then(|| candidate.to_owned())
        }
        [body @ .., _] if digits.len() == 10 => {
            let weighted: u32 = digits.iter().zip((1..=10).rev()).map(|(d, w)| d * w).sum();
            if weighted % 11 != 0 || body.contains(&10) {
                return None;
            }
            let mut full = vec![9, 7, 8];
            full.extend_from_slice(body);
            full.push(isbn13_check(&full));
            Some(full.iter().map(u32::to_string).collect())
        }
        _ => None,
    }
}

fn isbn13_check(body: &[u32]) -> u32 {
    let sum: u32 = body.iter().zip([1, 3].iter().cycle()).map(|(d, w)| d * w).sum();
    (10 - sum % 10) % 10
}

/// Normalises a language to an ISO 639-1 code where one is known.
///
/// Names and ISO 639-2 codes map to their two-letter code, region subtags
/// (`en-US`, `pt_BR`) are dropped, and other two or three letter codes pass
/// through. Anything else is returned lower-cased. Blank input yields `None`.
#[must_use]
pub fn normalize_language(raw: &str) -> Option<String> {
    let lowered = raw.trim().to_lowercase();
    if lowered.is_empty() {
        return None;
    }
    let primary = lowered.split(['-', '_']).next().unwrap_or(&lowered);
    if let Some((_, code)) = LANGUAGE_CODES.iter().find(|(name, _)| *name == primary) {
        return Some((*code).to_owned());
    }
    if (2..=3).contains(&primary.len()) && primary.chars().all(|c| c.is_ascii_alphabetic()) {
        return Some(primary.to_owned());
    }
    Some(lowered)
}

/// Locates the OPF file: the container's first `rootfile`, else any `.opf`.
fn package_document_path<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
) -> Result<Option<String>, MetadataError> {
    match archive.by_name(CONTAINER_PATH) {
        Ok(mut entry) => {
            let mut xml = String::new();
            entry.read_to_string(&mut xml)?;
            if let Some(path) = rootfile_path(&xml)? {
                return Ok(Some(path));
            }
        }
        Err(ZipError::FileNotFound) => debug!("no {CONTAINER_PATH}; searching for an OPF file"),
        Err(err) => return Err(err.into()),
    }
    Ok(archive
        .file_names()
        .find(|name| name.to_ascii_lowercase().ends_with(".opf"))
        .map(str::to_owned))
}

fn rootfile_path(xml: &str) -> Result<Option<String>, MetadataError> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event()? {
            Event::Start(element) | Event::Empty(element)
                if element.local_name().as_ref() == b"rootfile" =>
            {
                for attr in element.attributes().flatten() {
                    if attr.key.local_name().as_ref() == b"full-path" {
                        return Ok(Some(attr.unescape_value()?.into_owned()));
                    }
                }
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DcField {
    Title,
    Creator,
    Publisher,
    Identifier,
    Language,
    Date,
    Description,
}

impl DcField {
    fn from_local_name(name: &[u8]) -> Option<Self> {
        match name {
            b"title" => Some(Self::Title),
            b"creator" => Some(Self::Creator),
            b"publisher" => Some(Self::Publisher),
            b"identifier" => Some(Self::Identifier),
            b"language" => Some(Self::Language),
            b"date" => Some(Self::Date),
            b"description" => Some(Self::Description),
            _ => None,
        }
    }
}

struct OpenField {
    field: DcField,
    name: Vec<u8>,
    isbn_hint: bool,
    text: String,
}

struct Identifier {
    value: String,
    isbn_hint: bool,
}

/// First-seen Dublin Core values; creators and identifiers accumulate.
#[derive(Default)]
struct DublinCore {
    title: Option<String>,
    creators: Vec<String>,
    publisher: Option<String>,
    identifiers: Vec<Identifier>,
    language: Option<String>,
    date: Option<String>,
    description: Option<String>,
}

impl DublinCore {
    fn record(&mut self, open: &OpenField) {
        let text = open.text.split_whitespace().collect::<Vec<_>>().join(" ");
        if text.is_empty() {
            return;
        }
        let first = |slot: &mut Option<String>, text: String| {
            slot.get_or_insert(text);
        };
        match open.field {
            DcField::Title => first(&mut self.title, text),
            DcField::Creator => self.creators.push(text),
            DcField::Publisher => first(&mut self.publisher, text),
            DcField::Identifier => self.identifiers.push(Identifier {
                isbn_hint: open.isbn_hint || text.to_ascii_lowercase().contains("isbn"),
                value: text,
            }),
            DcField::Language => first(&mut self.language, text),
            DcField::Date => first(&mut self.date, text),
            DcField::Description => first(&mut self.description, text),
        }
    }

    fn into_metadata(self) -> Metadata {
        let mut metadata = Metadata::new();
        let mut insert = |key: &str, value: Option<Value>| {
            if let Some(value) = value {
                metadata.insert(key.to_owned(), value);
            }
        };

        let isbn = self
            .identifiers
            .iter()
            .find(|id| id.isbn_hint)
            .or_else(|| self.identifiers.first())
            .and_then(|id| normalize_isbn(&id.value));
        let author = match self.creators.as_slice() {
            [] => None,
            [single] => Some(Value::from(single.as_str())),
            several => Some(Value::from(several.to_vec())),
        };
        let (year, publication_date) = self.date.as_deref().map_or((None, None), split_date);

        insert("title", self.title.map(Value::from));
        insert("author", author);
        insert("publisher", self.publisher.map(Value::from));
        insert("isbn", isbn.map(Value::from));
        insert(
            "language",
            self.language
                .as_deref()
                .and_then(normalize_language)
                .map(Value::from),
        );
        insert("year", year.map(Value::from));
        insert("publication_date", publication_date.map(Value::from));
        insert("description", self.description.map(Value::from));
        metadata
    }
}

/// Year and ISO date from a `dc:date` such as `1965-08-01T00:00:00Z`.
fn split_date(date: &str) -> (Option<String>, Option<String>) {
    let Some(caps) = LEADING_DATE.as_ref().and_then(|pattern| pattern.captures(date)) else {
        return (None, None);
    };
    let year = caps.get(1).map(|m| m.as_str().to_owned());
    let full = caps
        .get(2)
        .and(caps.get(0))
        .map(|m| m.as_str().to_owned());
    (year, full)
}

fn read_package_document(xml: &str) -> Result<DublinCore, MetadataError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut core = DublinCore::default();
    let mut in_metadata = false;
    let mut open: Option<OpenField> = None;

    loop {
        match reader.read_event()? {
            Event::Start(element) => {
                let name = element.local_name();
                if name.as_ref() == b"metadata" {
                    in_metadata = true;
                } else if in_metadata && open.is_none() {
                    open = DcField::from_local_name(name.as_ref()).map(|field| OpenField {
                        field,
                        name: name.as_ref().to_vec(),
                        isbn_hint: mentions_isbn(&element),
                        text: String::new(),
                    });
                }
            }
            Event::Text(text) => {
                if let Some(field) = open.as_mut() {
                    field.text.push_str(&text.unescape()?);
                    field.text.push(' ');
                }
            }
            Event::CData(data) => {
                if let Some(field) = open.as_mut() {
                    field.text.push_str(&String::from_utf8_lossy(&data));
                    field.text.push(' ');
                }
            }
            Event::End(element) => {
                let name = element.local_name();
                if name.as_ref() == b"metadata" {
                    in_metadata = false;
                } else if let Some(field) = open.take_if(|field| field.name == name.as_ref()) {
                    core.record(&field);
                }
            }
            Event::Eof => return Ok(core),
            _ => {}
        }
    }
}

/// Whether an element's attributes mark it as an ISBN, e.g. `opf:scheme="ISBN"`.
fn mentions_isbn(element: &BytesStart<'_>) -> bool {
    element.attributes().flatten().any(|attr| {
        attr.unescape_value()
            .is_ok_and(|value| value.to_ascii_lowercase().contains("isbn"))
    })
}

#[cfg(test)]
#[path = "metadata_tests.rs"]
mod tests;
