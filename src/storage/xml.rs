//! XML interchange format for a processed corpus.
//!
//! ```xml
//! <corpus>
//!   <files>
//!     <file name="cake.txt" mtime="1700000000.5">
//!       <raw_text>The cake.</raw_text>
//!       <tokens><token>the</token><token>cake</token></tokens>
//!       <tagged_tokens><tagged_token token="the" tag="DT"/>...</tagged_tokens>
//!       <lemmas><lemma>the</lemma><lemma>cake</lemma></lemmas>
//!     </file>
//!   </files>
//! </corpus>
//! ```

use crate::core::error::{Error, Result};
use crate::corpus::index::CorpusIndex;
use crate::corpus::occurrence::{Occurrence, RawDocument, UNKNOWN_MTIME};
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::QName;
use quick_xml::{Reader, Writer};
use std::borrow::Cow;
use std::fmt::Display;
use std::path::Path;

const CORPUS: &[u8] = b"corpus";
const FILES: &[u8] = b"files";
const FILE: &[u8] = b"file";
const RAW_TEXT: &[u8] = b"raw_text";
const TOKENS: &[u8] = b"tokens";
const TOKEN: &[u8] = b"token";
const TAGGED_TOKENS: &[u8] = b"tagged_tokens";
const TAGGED_TOKEN: &[u8] = b"tagged_token";
const LEMMAS: &[u8] = b"lemmas";
const LEMMA: &[u8] = b"lemma";

fn xml_err(context: &str, e: impl Display) -> Error {
    Error::Xml(format!("{}: {}", context, e))
}

/// Write `index` to `path` as pretty-printed UTF-8 XML
pub fn export(index: &CorpusIndex, path: &Path) -> Result<()> {
    let bytes = write_corpus(index)?;
    std::fs::write(path, bytes)?;
    tracing::info!(
        path = %path.display(),
        files = index.document_count(),
        tokens = index.token_count(),
        "Corpus exported to XML"
    );
    Ok(())
}

/// Read a complete index from the XML file at `path`
pub fn import(path: &Path) -> Result<CorpusIndex> {
    let content = std::fs::read_to_string(path)?;
    let index = parse_corpus(&content)?;
    tracing::info!(
        path = %path.display(),
        files = index.document_count(),
        tokens = index.token_count(),
        "Corpus imported from XML"
    );
    Ok(index)
}

/// Serialize `index`. Fails when there are no documents.
pub fn write_corpus(index: &CorpusIndex) -> Result<Vec<u8>> {
    if index.document_count() == 0 {
        return Err(Error::Xml("Corpus has no documents to export".to_string()));
    }

    // Restricted control characters only have a legal spelling in XML 1.1
    let version = if any_value(index, is_restricted) {
        tracing::warn!("Corpus contains control characters, exporting as XML 1.1");
        "1.1"
    } else {
        "1.0"
    };
    if any_value(index, |c| c == '\0') {
        tracing::warn!("NUL characters cannot be stored in XML and are dropped");
    }

    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new(version, Some("UTF-8"), None)))
        .map_err(|e| xml_err("Failed to write declaration", e))?;

    start(&mut writer, BytesStart::new("corpus"))?;
    start(&mut writer, BytesStart::new("files"))?;

    for doc in index.documents() {
        let mtime = doc.mtime.to_string();
        let mut file = BytesStart::new("file");
        file.push_attribute(escaped_attribute("name", &doc.filename));
        file.push_attribute(escaped_attribute("mtime", &mtime));
        start(&mut writer, file)?;

        text_element(&mut writer, "raw_text", &doc.text)?;

        let occurrences: Vec<&Occurrence> = index.occurrences_of(&doc.filename).collect();
        if !occurrences.is_empty() {
            start(&mut writer, BytesStart::new("tokens"))?;
            for occ in &occurrences {
                text_element(&mut writer, "token", &occ.surface)?;
            }
            end(&mut writer, "tokens")?;

            start(&mut writer, BytesStart::new("tagged_tokens"))?;
            for occ in &occurrences {
                let mut tagged = BytesStart::new("tagged_token");
                tagged.push_attribute(escaped_attribute("token", &occ.surface));
                tagged.push_attribute(escaped_attribute("tag", &occ.tag));
                writer
                    .write_event(Event::Empty(tagged))
                    .map_err(|e| xml_err("Failed to write tagged token", e))?;
            }
            end(&mut writer, "tagged_tokens")?;

            start(&mut writer, BytesStart::new("lemmas"))?;
            for occ in &occurrences {
                text_element(&mut writer, "lemma", &occ.lemma)?;
            }
            end(&mut writer, "lemmas")?;
        }

        end(&mut writer, "file")?;
    }

    end(&mut writer, "files")?;
    end(&mut writer, "corpus")?;

    let mut bytes = writer.into_inner();
    bytes.push(b'\n');
    Ok(bytes)
}

fn start(writer: &mut Writer<Vec<u8>>, element: BytesStart<'_>) -> Result<()> {
    writer
        .write_event(Event::Start(element))
        .map_err(|e| xml_err("Failed to write element", e))
}

fn end(writer: &mut Writer<Vec<u8>>, name: &str) -> Result<()> {
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(|e| xml_err("Failed to close element", e))
}

fn text_element(writer: &mut Writer<Vec<u8>>, name: &str, text: &str) -> Result<()> {
    start(writer, BytesStart::new(name))?;
    writer
        .write_event(Event::Text(BytesText::from_escaped(escape_value(text, false))))
        .map_err(|e| xml_err("Failed to write text", e))?;
    end(writer, name)
}

fn escaped_attribute<'a>(key: &'a str, value: &str) -> Attribute<'a> {
    Attribute {
        key: QName(key.as_bytes()),
        value: Cow::Owned(escape_value(value, true).into_bytes()),
    }
}

/// C0 controls other than tab, newline and carriage return
fn is_restricted(c: char) -> bool {
    matches!(c, '\u{1}'..='\u{8}' | '\u{b}' | '\u{c}' | '\u{e}'..='\u{1f}')
}

/// Whether any stored string of `index` holds a character matching `pred`
fn any_value(index: &CorpusIndex, pred: impl Fn(char) -> bool + Copy) -> bool {
    let has = |s: &str| s.chars().any(pred);
    index
        .documents()
        .any(|d| has(&d.filename) || has(&d.text))
        || index
            .occurrences()
            .iter()
            .any(|o| has(&o.surface) || has(&o.tag) || has(&o.lemma))
}

/// Escape markup, and write as character references everything a
/// conforming parser would reject or normalize: control characters,
/// carriage returns, and tabs or newlines inside attributes. NUL has no
/// representation and is dropped.
fn escape_value(value: &str, in_attribute: bool) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if in_attribute => out.push_str("&quot;"),
            '\0' => {}
            '\t' | '\n' if in_attribute => out.push_str(&format!("&#x{:X};", c as u32)),
            '\r' | '\u{7f}'..='\u{9f}' => out.push_str(&format!("&#x{:X};", c as u32)),
            c if is_restricted(c) => out.push_str(&format!("&#x{:X};", c as u32)),
            c => out.push(c),
        }
    }
    out
}

/// One `<file>` element as read, before alignment checking
#[derive(Debug, Default)]
struct FileEntry {
    name: String,
    mtime: f64,
    text: String,
    tokens: Vec<String>,
    tagged: Vec<(String, String)>,
    lemmas: Vec<String>,
}

impl FileEntry {
    /// Zip the three per-file lists into occurrences.
    ///
    /// Lists of different lengths, or a token list that disagrees with the
    /// tagged list, leave the file without occurrences.
    fn into_parts(self) -> (RawDocument, Vec<Occurrence>) {
        let aligned = self.tokens.len() == self.tagged.len()
            && self.tokens.len() == self.lemmas.len()
            && self
                .tokens
                .iter()
                .zip(&self.tagged)
                .all(|(token, (tagged, _))| token == tagged);

        let occurrences = if aligned {
            self.tokens
                .into_iter()
                .zip(self.tagged)
                .zip(self.lemmas)
                .map(|((token, (_, tag)), lemma)| {
                    Occurrence::new(token, tag, lemma, self.name.as_str())
                })
                .collect()
        } else {
            tracing::warn!(
                file = %self.name,
                tokens = self.tokens.len(),
                tagged = self.tagged.len(),
                lemmas = self.lemmas.len(),
                "Token lists are misaligned, annotations skipped"
            );
            Vec::new()
        };

        (RawDocument::new(self.name, self.text, self.mtime), occurrences)
    }
}

/// Parse a complete corpus document
pub fn parse_corpus(xml: &str) -> Result<CorpusIndex> {
    let mut reader = Reader::from_str(xml);

    loop {
        match reader.read_event().map_err(|e| xml_err("Malformed XML", e))? {
            Event::Start(e) if e.name().as_ref() == CORPUS => break,
            Event::Empty(e) if e.name().as_ref() == CORPUS => {
                return Err(Error::Xml("Missing <files> element".to_string()));
            }
            Event::Start(e) | Event::Empty(e) => {
                return Err(Error::Xml(format!(
                    "Root element is <{}>, expected <corpus>",
                    String::from_utf8_lossy(e.name().as_ref())
                )));
            }
            Event::Eof => return Err(Error::Xml("Missing <corpus> root element".to_string())),
            _ => {}
        }
    }

    let mut entries = None;
    loop {
        match reader.read_event().map_err(|e| xml_err("Malformed XML", e))? {
            Event::Start(e) if e.name().as_ref() == FILES && entries.is_none() => {
                entries = Some(read_files(&mut reader)?);
            }
            Event::Empty(e) if e.name().as_ref() == FILES && entries.is_none() => {
                entries = Some(Vec::new());
            }
            Event::Start(e) => {
                reader
                    .read_to_end(e.name())
                    .map_err(|e| xml_err("Malformed XML", e))?;
            }
            Event::End(_) => break,
            Event::Eof => return Err(Error::Xml("Unexpected end of document".to_string())),
            _ => {}
        }
    }

    let entries = entries.ok_or_else(|| Error::Xml("Missing <files> element".to_string()))?;

    let mut documents = Vec::with_capacity(entries.len());
    let mut occurrences = Vec::new();
    for entry in entries {
        let (doc, occs) = entry.into_parts();
        documents.push(doc);
        occurrences.extend(occs);
    }
    Ok(CorpusIndex::new(documents, occurrences))
}

fn read_files(reader: &mut Reader<&[u8]>) -> Result<Vec<FileEntry>> {
    let mut entries = Vec::new();
    loop {
        match reader.read_event().map_err(|e| xml_err("Malformed XML", e))? {
            Event::Start(e) if e.name().as_ref() == FILE => match file_header(&e)? {
                Some(mut entry) => {
                    read_file_body(reader, &mut entry)?;
                    entries.push(entry);
                }
                None => {
                    tracing::warn!("Skipping <file> element without a name");
                    reader
                        .read_to_end(e.name())
                        .map_err(|e| xml_err("Malformed XML", e))?;
                }
            },
            Event::Empty(e) if e.name().as_ref() == FILE => match file_header(&e)? {
                Some(entry) => entries.push(entry),
                None => tracing::warn!("Skipping <file> element without a name"),
            },
            Event::Start(e) => {
                reader
                    .read_to_end(e.name())
                    .map_err(|e| xml_err("Malformed XML", e))?;
            }
            Event::End(_) => return Ok(entries),
            Event::Eof => return Err(Error::Xml("Unexpected end of document".to_string())),
            _ => {}
        }
    }
}

/// Name and mtime of a `<file>`; `None` when the name is missing or empty
fn file_header(element: &BytesStart<'_>) -> Result<Option<FileEntry>> {
    let Some(name) = attribute(element, "name")?.filter(|n| !n.is_empty()) else {
        return Ok(None);
    };

    let mtime = match attribute(element, "mtime")? {
        None => UNKNOWN_MTIME,
        Some(raw) if raw.trim().is_empty() => UNKNOWN_MTIME,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(file = %name, mtime = %raw, "Invalid mtime, using 0");
            UNKNOWN_MTIME
        }),
    };

    Ok(Some(FileEntry {
        name,
        mtime,
        ..FileEntry::default()
    }))
}

fn read_file_body(reader: &mut Reader<&[u8]>, entry: &mut FileEntry) -> Result<()> {
    loop {
        match reader.read_event().map_err(|e| xml_err("Malformed XML", e))? {
            Event::Start(e) => match e.name().as_ref() {
                RAW_TEXT => entry.text = read_text(reader, RAW_TEXT)?,
                TOKENS => read_list(reader, TOKEN, |text| entry.tokens.push(text))?,
                LEMMAS => read_list(reader, LEMMA, |text| entry.lemmas.push(text))?,
                TAGGED_TOKENS => read_tagged(reader, &mut entry.tagged)?,
                _ => {
                    reader
                        .read_to_end(e.name())
                        .map_err(|e| xml_err("Malformed XML", e))?;
                }
            },
            Event::End(_) => return Ok(()),
            Event::Eof => return Err(Error::Xml("Unexpected end of document".to_string())),
            _ => {}
        }
    }
}

/// Collect the non-empty text of each `<item>` child until the list closes
fn read_list(
    reader: &mut Reader<&[u8]>,
    item: &[u8],
    mut push: impl FnMut(String),
) -> Result<()> {
    loop {
        match reader.read_event().map_err(|e| xml_err("Malformed XML", e))? {
            Event::Start(e) if e.name().as_ref() == item => {
                let text = read_text(reader, item)?;
                if !text.is_empty() {
                    push(text);
                }
            }
            Event::Start(e) => {
                reader
                    .read_to_end(e.name())
                    .map_err(|e| xml_err("Malformed XML", e))?;
            }
            Event::End(_) => return Ok(()),
            Event::Eof => return Err(Error::Xml("Unexpected end of document".to_string())),
            _ => {}
        }
    }
}

fn read_tagged(reader: &mut Reader<&[u8]>, tagged: &mut Vec<(String, String)>) -> Result<()> {
    loop {
        match reader.read_event().map_err(|e| xml_err("Malformed XML", e))? {
            Event::Empty(e) if e.name().as_ref() == TAGGED_TOKEN => push_tagged(&e, tagged)?,
            Event::Start(e) if e.name().as_ref() == TAGGED_TOKEN => {
                push_tagged(&e, tagged)?;
                reader
                    .read_to_end(e.name())
                    .map_err(|e| xml_err("Malformed XML", e))?;
            }
            Event::Start(e) => {
                reader
                    .read_to_end(e.name())
                    .map_err(|e| xml_err("Malformed XML", e))?;
            }
            Event::End(_) => return Ok(()),
            Event::Eof => return Err(Error::Xml("Unexpected end of document".to_string())),
            _ => {}
        }
    }
}

fn push_tagged(element: &BytesStart<'_>, tagged: &mut Vec<(String, String)>) -> Result<()> {
    let token = attribute(element, "token")?.filter(|t| !t.is_empty());
    let tag = attribute(element, "tag")?.filter(|t| !t.is_empty());
    if let (Some(token), Some(tag)) = (token, tag) {
        tagged.push((token, tag));
    }
    Ok(())
}

/// Text content up to the closing `end` tag, exactly as written
fn read_text(reader: &mut Reader<&[u8]>, end: &[u8]) -> Result<String> {
    let mut text = String::new();
    loop {
        match reader.read_event().map_err(|e| xml_err("Malformed XML", e))? {
            Event::Text(t) => {
                text.push_str(&t.unescape().map_err(|e| xml_err("Invalid text", e))?)
            }
            Event::CData(c) => text.push_str(
                std::str::from_utf8(&c).map_err(|e| xml_err("Invalid CDATA", e))?,
            ),
            Event::Start(e) => {
                reader
                    .read_to_end(e.name())
                    .map_err(|e| xml_err("Malformed XML", e))?;
            }
            Event::End(e) if e.name().as_ref() == end => return Ok(text),
            Event::End(e) => {
                return Err(Error::Xml(format!(
                    "Unexpected </{}>",
                    String::from_utf8_lossy(e.name().as_ref())
                )))
            }
            Event::Eof => return Err(Error::Xml("Unexpected end of document".to_string())),
            _ => {}
        }
    }
}

fn attribute(element: &BytesStart<'_>, name: &str) -> Result<Option<String>> {
    let attr = element
        .try_get_attribute(name)
        .map_err(|e| xml_err("Invalid attribute", e))?;
    attr.map(|a| {
        a.unescape_value()
            .map(|v| v.into_owned())
            .map_err(|e| xml_err("Invalid attribute value", e))
    })
    .transpose()
}
