//! Heuristic refinement of ZIP container hits.
//!
//! Office Open XML documents are ZIP archives whose member names live under a
//! format-specific directory. The classifier looks for those directory names in
//! the raw bytes that follow the magic, in a fixed priority order. It does not
//! parse the central directory: this is a best-effort guess, not a ZIP reader.

use aho_corasick::AhoCorasick;
use encoding_rs::Encoding;
use log::{debug, warn};
use std::fmt;
use std::io::{Read, Seek};

use super::carve_error::CarveError;
use crate::utils::u16_le_at;
use crate::volume::reader::VolumeReader;
use crate::volume::volume_error::VolumeError;

/// Number of bytes inspected after a ZIP magic.
pub const ZIP_WINDOW_LEN: usize = 4096;

/// Offset of the file name length in a local file header.
const NAME_LEN_OFFSET: usize = 0x1A;

/// Offset of the file name in a local file header.
const NAME_OFFSET: usize = 0x1E;

/// OOXML member directories, highest priority first.
const OOXML_MARKERS: [&str; 3] = ["word/", "ppt/", "xl/"];

/// Refined type of a ZIP container.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ZipKind {
    /// Contains "word/" members
    DocxLike,
    /// Contains "ppt/" members
    PptxLike,
    /// Contains "xl/" members
    XlsxLike,
    /// Any other archive, named after its first member
    Zip { name: String },
}

impl fmt::Display for ZipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZipKind::DocxLike => write!(f, "zip[docx]"),
            ZipKind::PptxLike => write!(f, "zip[pptx]"),
            ZipKind::XlsxLike => write!(f, "zip[xlsx]"),
            ZipKind::Zip { name } => write!(f, "zip{{{name}}}"),
        }
    }
}

/// Classifier for the bytes following a ZIP local file header magic.
#[derive(Debug, Clone)]
pub struct ZipSubclassifier {
    markers: AhoCorasick,
    charset: &'static Encoding,
}

impl ZipSubclassifier {
    /// Creates a classifier decoding member names with `charset`.
    ///
    /// # Errors
    /// - `CarveError::Configuration` if the marker automaton cannot be built
    pub fn new(charset: &'static Encoding) -> Result<Self, CarveError> {
        let markers = AhoCorasick::new(OOXML_MARKERS)
            .map_err(|err| CarveError::Configuration(format!("ZIP markers: {err}")))?;

        Ok(Self { markers, charset })
    }

    /// Reads the window at `offset` and classifies it.
    ///
    /// A window cut short by the end of the volume is classified as is.
    pub fn classify_at<R: Read + Seek>(
        &self,
        reader: &mut VolumeReader<R>,
        offset: u64,
    ) -> Result<ZipKind, VolumeError> {
        let window = reader.read_at(offset, ZIP_WINDOW_LEN)?;
        Ok(self.classify(&window))
    }

    /// Classifies a window that starts at a ZIP local file header.
    ///
    /// "word/" wins over "ppt/", which wins over "xl/", wherever they occur in
    /// the window. Without any of them, the first member name is decoded.
    pub fn classify(&self, window: &[u8]) -> ZipKind {
        let best = self
            .markers
            .find_overlapping_iter(window)
            .map(|m| m.pattern().as_usize())
            .min();

        match best {
            Some(0) => ZipKind::DocxLike,
            Some(1) => ZipKind::PptxLike,
            Some(_) => ZipKind::XlsxLike,
            None => ZipKind::Zip {
                name: self.first_member_name(window),
            },
        }
    }

    fn first_member_name(&self, window: &[u8]) -> String {
        let name_len = u16_le_at(window, NAME_LEN_OFFSET).unwrap_or(0) as usize;
        let end = window.len().min(NAME_OFFSET + name_len);
        let raw = window.get(NAME_OFFSET..end).unwrap_or_default();

        let (name, had_errors) = self.charset.decode_without_bom_handling(raw);
        if !had_errors {
            return name.into_owned();
        }

        match std::str::from_utf8(raw) {
            Ok(utf8) => {
                debug!("ZIP member name is not {}, using UTF-8", self.charset.name());
                utf8.to_string()
            }
            Err(_) => {
                warn!(
                    "ZIP member name is not valid {}, replacing invalid bytes",
                    self.charset.name()
                );
                name.into_owned()
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use encoding_rs::{EUC_KR, UTF_8};
    use std::io::Cursor;

    /// Builds a local file header for a single member named `name`.
    pub(crate) fn local_header(name: &[u8]) -> Vec<u8> {
        let mut buf = vec![0x50, 0x4B, 0x03, 0x04];
        buf.resize(NAME_OFFSET, 0);
        buf[NAME_LEN_OFFSET..NAME_LEN_OFFSET + 2]
            .copy_from_slice(&(name.len() as u16).to_le_bytes());
        buf.extend_from_slice(name);
        buf
    }

    fn classifier() -> ZipSubclassifier {
        ZipSubclassifier::new(EUC_KR).unwrap()
    }

    #[test]
    fn ooxml_markers_are_detected() {
        let c = classifier();
        assert_eq!(c.classify(&local_header(b"word/document.xml")), ZipKind::DocxLike);
        assert_eq!(c.classify(&local_header(b"ppt/slides/slide1.xml")), ZipKind::PptxLike);
        assert_eq!(c.classify(&local_header(b"xl/workbook.xml")), ZipKind::XlsxLike);
    }

    #[test]
    fn word_takes_precedence_over_later_markers() {
        let mut window = local_header(b"xl/workbook.xml");
        window.extend_from_slice(b"ppt/");
        window.extend_from_slice(b"word/");
        window.resize(ZIP_WINDOW_LEN, 0);

        assert_eq!(classifier().classify(&window), ZipKind::DocxLike);
    }

    #[test]
    fn ppt_takes_precedence_over_xl() {
        let mut window = local_header(b"xl/");
        window.extend_from_slice(b"ppt/");

        assert_eq!(classifier().classify(&window), ZipKind::PptxLike);
    }

    #[test]
    fn plain_archive_reports_member_name() {
        let kind = classifier().classify(&local_header(b"evidence.txt"));
        assert_eq!(
            kind,
            ZipKind::Zip {
                name: "evidence.txt".to_string()
            }
        );
        assert_eq!(kind.to_string(), "zip{evidence.txt}");
    }

    #[test]
    fn member_name_uses_configured_charset() {
        // "한글.txt" in EUC-KR
        let name = [0xC7, 0xD1, 0xB1, 0xDB, b'.', b't', b'x', b't'];
        let kind = classifier().classify(&local_header(&name));
        assert_eq!(
            kind,
            ZipKind::Zip {
                name: "한글.txt".to_string()
            }
        );
    }

    #[test]
    fn undecodable_name_falls_back_to_utf8() {
        // 0xC3 0x80 is not a valid EUC-KR pair
        let kind = classifier().classify(&local_header("À.txt".as_bytes()));
        assert_eq!(
            kind,
            ZipKind::Zip {
                name: "À.txt".to_string()
            }
        );
    }

    #[test]
    fn invalid_bytes_are_replaced() {
        let kind = ZipSubclassifier::new(UTF_8)
            .unwrap()
            .classify(&local_header(&[b'a', 0xFF, b'b']));
        assert_eq!(
            kind,
            ZipKind::Zip {
                name: "a\u{FFFD}b".to_string()
            }
        );
    }

    #[test]
    fn name_length_past_window_is_clamped() {
        let mut window = local_header(b"abc");
        window[NAME_LEN_OFFSET] = 0xFF;
        window[NAME_LEN_OFFSET + 1] = 0xFF;

        let kind = classifier().classify(&window);
        assert_eq!(
            kind,
            ZipKind::Zip {
                name: "abc".to_string()
            }
        );
    }

    #[test]
    fn truncated_header_yields_empty_name() {
        let kind = classifier().classify(&[0x50, 0x4B, 0x03, 0x04]);
        assert_eq!(
            kind,
            ZipKind::Zip {
                name: String::new()
            }
        );
    }

    #[test]
    fn classify_at_reads_window_from_volume() {
        let mut image = vec![0u8; 8192];
        let header = local_header(b"xl/styles.xml");
        image[4096..4096 + header.len()].copy_from_slice(&header);
        let mut reader = VolumeReader::new(Cursor::new(image));

        let kind = classifier().classify_at(&mut reader, 4096).unwrap();
        assert_eq!(kind, ZipKind::XlsxLike);
    }

    #[test]
    fn markers_beyond_window_are_ignored() {
        let mut image = local_header(b"a.bin");
        image.resize(ZIP_WINDOW_LEN, 0);
        image.extend_from_slice(b"word/");
        let mut reader = VolumeReader::new(Cursor::new(image));

        let kind = classifier().classify_at(&mut reader, 0).unwrap();
        assert_eq!(
            kind,
            ZipKind::Zip {
                name: "a.bin".to_string()
            }
        );
    }
}
