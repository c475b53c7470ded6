//! Magic-number classification of cluster prefixes.
//!
//! A cluster is treated as the start of a file when its first bytes match one of
//! the known magics exactly. Two-byte magics are checked before four-byte ones;
//! the magics are distinct so the order never changes a result.

use std::fmt;

use super::zip::ZipKind;
use crate::utils::{u16_be_at, u32_be_at};

/// Number of leading cluster bytes inspected by [`classify`].
pub const PREFIX_LEN: usize = 16;

/// File type recognized from a cluster's leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signature {
    /// "MZ" DOS/PE header (exe, dll)
    Executable,
    /// "BM"
    Bitmap,
    /// JPEG start-of-image marker
    Jpeg,
    /// ZIP local file header; the payload needs subclassification
    ZipContainer,
    /// "%PDF"
    Pdf,
    /// "GIF8"
    Gif,
    /// PNG signature
    Png,
    /// "RIFF" container
    Avi,
}

/// Big-endian 16-bit magics at offset 0.
const WORD_MAGICS: [(u16, Signature); 3] = [
    (0x4D5A, Signature::Executable),
    (0x424D, Signature::Bitmap),
    (0xFFD8, Signature::Jpeg),
];

/// Big-endian 32-bit magics at offset 0.
const DWORD_MAGICS: [(u32, Signature); 5] = [
    (0x504B0304, Signature::ZipContainer),
    (0x25504446, Signature::Pdf),
    (0x47494638, Signature::Gif),
    (0x89504E47, Signature::Png),
    (0x52494646, Signature::Avi),
];

/// Classifies the leading bytes of a cluster.
///
/// # Parameters
/// - `prefix`: The first bytes of a cluster, normally [`PREFIX_LEN`] of them
///
/// # Returns
/// - `Some(Signature)`: If the prefix starts with a known magic
/// - `None`: If it does not, or is too short to hold one
pub fn classify(prefix: &[u8]) -> Option<Signature> {
    if let Some(word) = u16_be_at(prefix, 0) {
        if let Some((_, sig)) = WORD_MAGICS.iter().find(|(magic, _)| *magic == word) {
            return Some(*sig);
        }
    }

    let dword = u32_be_at(prefix, 0)?;
    DWORD_MAGICS
        .iter()
        .find(|(magic, _)| *magic == dword)
        .map(|(_, sig)| *sig)
}

impl Signature {
    /// Maps the signature to a final file kind.
    ///
    /// Returns `None` for [`Signature::ZipContainer`], whose kind depends on the
    /// archive content.
    pub fn file_kind(self) -> Option<FileKind> {
        match self {
            Signature::Executable => Some(FileKind::Executable),
            Signature::Bitmap => Some(FileKind::Bitmap),
            Signature::Jpeg => Some(FileKind::Jpeg),
            Signature::ZipContainer => None,
            Signature::Pdf => Some(FileKind::Pdf),
            Signature::Gif => Some(FileKind::Gif),
            Signature::Png => Some(FileKind::Png),
            Signature::Avi => Some(FileKind::Avi),
        }
    }
}

/// Guessed type of a carved file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FileKind {
    Executable,
    Bitmap,
    Jpeg,
    Pdf,
    Gif,
    Png,
    Avi,
    /// ZIP container, refined by content
    Zip(ZipKind),
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileKind::Executable => write!(f, "exe/dll"),
            FileKind::Bitmap => write!(f, "bmp"),
            FileKind::Jpeg => write!(f, "jpg"),
            FileKind::Pdf => write!(f, "pdf"),
            FileKind::Gif => write!(f, "gif"),
            FileKind::Png => write!(f, "png"),
            FileKind::Avi => write!(f, "avi"),
            FileKind::Zip(zip) => write!(f, "{zip}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn prefix(lead: &[u8]) -> [u8; PREFIX_LEN] {
        let mut buf = [0u8; PREFIX_LEN];
        buf[..lead.len()].copy_from_slice(lead);
        buf
    }

    #[test]
    fn recognizes_every_magic() {
        let cases: [(&[u8], Signature); 8] = [
            (b"MZ", Signature::Executable),
            (b"BM", Signature::Bitmap),
            (&[0xFF, 0xD8, 0xFF, 0xE0], Signature::Jpeg),
            (&[0x50, 0x4B, 0x03, 0x04], Signature::ZipContainer),
            (b"%PDF-1.7", Signature::Pdf),
            (b"GIF89a", Signature::Gif),
            (&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A], Signature::Png),
            (b"RIFF", Signature::Avi),
        ];

        for (lead, expected) in cases {
            assert_eq!(classify(&prefix(lead)), Some(expected), "lead {lead:02X?}");
        }
    }

    #[test]
    fn unknown_or_empty_prefix_is_none() {
        assert_eq!(classify(&prefix(b"\x7FELF")), None);
        assert_eq!(classify(&[0u8; PREFIX_LEN]), None);
        assert_eq!(classify(&[]), None);
        assert_eq!(classify(b"PK"), None);
    }

    #[test]
    fn magic_must_start_at_offset_zero() {
        assert_eq!(classify(&prefix(b"\0MZ")), None);
        assert_eq!(classify(&prefix(b"\0%PDF")), None);
    }

    #[test]
    fn zip_has_no_direct_kind() {
        assert_eq!(Signature::ZipContainer.file_kind(), None);
        assert_eq!(Signature::Png.file_kind(), Some(FileKind::Png));
    }

    #[test]
    fn kinds_use_report_labels() {
        assert_eq!(FileKind::Executable.to_string(), "exe/dll");
        assert_eq!(FileKind::Jpeg.to_string(), "jpg");
        assert_eq!(FileKind::Zip(ZipKind::DocxLike).to_string(), "zip[docx]");
    }

    proptest! {
        #[test]
        fn classify_is_deterministic(bytes in proptest::collection::vec(any::<u8>(), 0..=PREFIX_LEN)) {
            prop_assert_eq!(classify(&bytes), classify(&bytes.clone()));
        }

        #[test]
        fn mz_prefix_is_always_executable(tail in proptest::array::uniform14(any::<u8>())) {
            let mut bytes = vec![0x4D, 0x5A];
            bytes.extend_from_slice(&tail);
            prop_assert_eq!(classify(&bytes), Some(Signature::Executable));
        }
    }
}
