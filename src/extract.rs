//! Plain-text extraction for source documents.
//!
//! `.docx` files are read as OOXML: the text runs of `word/document.xml` are
//! concatenated, with each paragraph followed by a blank line so that the
//! splitter sees the same line structure a word processor shows. `.txt` and
//! `.md` files are read as UTF-8.

use std::io::Read;
use std::path::Path;

/// Maximum decompressed bytes to read from `word/document.xml` (zip-bomb protection).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

const DOCUMENT_XML: &str = "word/document.xml";

/// Extraction error. The pipeline reports it and skips the document.
#[derive(Debug)]
pub enum ExtractError {
    UnsupportedExtension(String),
    Io(String),
    Docx(String),
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::UnsupportedExtension(ext) => {
                write!(f, "unsupported document type: {}", ext)
            }
            ExtractError::Io(e) => write!(f, "could not read document: {}", e),
            ExtractError::Docx(e) => write!(f, "DOCX extraction failed: {}", e),
        }
    }
}

impl std::error::Error for ExtractError {}

/// Extracts plain text from the document at `path`, choosing the format by extension.
pub fn extract_file(path: &Path) -> Result<String, ExtractError> {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "docx" => {
            let bytes = std::fs::read(path).map_err(|e| ExtractError::Io(e.to_string()))?;
            extract_docx(&bytes)
        }
        "txt" | "md" => std::fs::read_to_string(path).map_err(|e| ExtractError::Io(e.to_string())),
        other => Err(ExtractError::UnsupportedExtension(if other.is_empty() {
            "(none)".to_string()
        } else {
            other.to_string()
        })),
    }
}

/// Extracts the text of a `.docx` archive held in memory.
pub fn extract_docx(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|e| ExtractError::Docx(e.to_string()))?;
    let entry = archive
        .by_name(DOCUMENT_XML)
        .map_err(|_| ExtractError::Docx(format!("{} not found", DOCUMENT_XML)))?;

    let mut doc_xml = Vec::new();
    entry
        .take(MAX_XML_ENTRY_BYTES)
        .read_to_end(&mut doc_xml)
        .map_err(|e| ExtractError::Docx(e.to_string()))?;
    if doc_xml.len() as u64 >= MAX_XML_ENTRY_BYTES {
        return Err(ExtractError::Docx(format!(
            "{} exceeds size limit ({} bytes)",
            DOCUMENT_XML, MAX_XML_ENTRY_BYTES
        )));
    }
    extract_paragraphs(&doc_xml)
}

/// Walks WordprocessingML, emitting `w:t` text, `w:tab` inside a run as a tab,
/// `w:br` and `w:cr` as a newline, and a blank line after every `w:p`.
/// Tab-stop definitions (`w:pPr/w:tabs/w:tab`) are not runs and emit nothing.
fn extract_paragraphs(xml: &[u8]) -> Result<String, ExtractError> {
    use quick_xml::events::Event;

    let mut out = String::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut in_text = false;
    let mut in_run = false;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                match e.local_name().as_ref() {
                    b"t" => in_text = true,
                    b"r" => in_run = true,
                    _ => {}
                }
            }
            Ok(Event::Text(te)) if in_text => {
                out.push_str(te.unescape().unwrap_or_default().as_ref());
            }
            Ok(Event::CData(cd)) if in_text => {
                out.push_str(&String::from_utf8_lossy(&cd));
            }
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"tab" if in_run => out.push('\t'),
                b"br" | b"cr" => out.push('\n'),
                b"p" => out.push_str("\n\n"),
                _ => {}
            },
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"r" => in_run = false,
                b"p" => out.push_str("\n\n"),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractError::Docx(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(out.trim_end().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn docx_with_body(body: &str) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
            zip.start_file(DOCUMENT_XML, zip::write::SimpleFileOptions::default())
                .unwrap();
            let xml = format!(
                "<?xml version=\"1.0\"?><w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\"><w:body>{}</w:body></w:document>",
                body
            );
            zip.write_all(xml.as_bytes()).unwrap();
            zip.finish().unwrap();
        }
        buf
    }

    #[test]
    fn paragraphs_become_blank_line_separated() {
        let bytes = docx_with_body(
            "<w:p><w:r><w:t>First heading</w:t></w:r></w:p>\
             <w:p><w:r><w:t xml:space=\"preserve\">Body </w:t></w:r><w:r><w:t>text &amp; more</w:t></w:r></w:p>",
        );
        let text = extract_docx(&bytes).unwrap();
        assert_eq!(text, "First heading\n\nBody text & more");
    }

    #[test]
    fn breaks_and_tabs_are_kept() {
        let bytes = docx_with_body("<w:p><w:r><w:t>a</w:t><w:br/><w:t>b</w:t><w:tab/><w:t>c</w:t></w:r></w:p>");
        assert_eq!(extract_docx(&bytes).unwrap(), "a\nb\tc");
    }

    #[test]
    fn tab_stop_definitions_emit_nothing() {
        let bytes = docx_with_body(
            "<w:p><w:pPr><w:tabs><w:tab w:val=\"left\" w:pos=\"720\"/></w:tabs></w:pPr>\
             <w:r><w:t>Name</w:t><w:tab/><w:t>Value</w:t></w:r></w:p>",
        );
        assert_eq!(extract_docx(&bytes).unwrap(), "Name\tValue");
    }

    #[test]
    fn invalid_zip_returns_error() {
        let err = extract_docx(b"not a zip").unwrap_err();
        assert!(matches!(err, ExtractError::Docx(_)));
    }

    #[test]
    fn missing_document_xml_returns_error() {
        let mut buf = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
            zip.start_file("other.xml", zip::write::SimpleFileOptions::default())
                .unwrap();
            zip.write_all(b"<x/>").unwrap();
            zip.finish().unwrap();
        }
        let err = extract_docx(&buf).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let err = extract_file(Path::new("notes.pdf")).unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedExtension(ref e) if e == "pdf"));
    }

    #[test]
    fn plain_text_files_are_read_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.txt");
        std::fs::write(&path, "Title\n\nBody").unwrap();
        assert_eq!(extract_file(&path).unwrap(), "Title\n\nBody");
    }

    #[test]
    fn unreadable_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = extract_file(&dir.path().join("missing.docx")).unwrap_err();
        assert!(matches!(err, ExtractError::Io(_)));
    }
}
