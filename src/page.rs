//! Page entries and file-type dispatch.

use std::sync::Arc;

/// Container format of the currently open file, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Zip,
    Cbz,
    Rar,
    Cbr,
    Pdf,
}

impl FileType {
    /// Classifies a file name by its (case-insensitive) extension.
    pub fn from_name(name: &str) -> Option<Self> {
        match extension_of(name)?.as_str() {
            "zip" => Some(Self::Zip),
            "cbz" => Some(Self::Cbz),
            "rar" => Some(Self::Rar),
            "cbr" => Some(Self::Cbr),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    /// True for the container formats that go through the unarchive pipeline.
    pub fn is_archive(self) -> bool {
        !matches!(self, Self::Pdf)
    }

    /// True for the RAR family, which gets the signature pre-check.
    pub fn is_rar_family(self) -> bool {
        matches!(self, Self::Rar | Self::Cbr)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Zip => "zip",
            Self::Cbz => "cbz",
            Self::Rar => "rar",
            Self::Cbr => "cbr",
            Self::Pdf => "pdf",
        }
    }
}

/// Lowercased extension of a file name, if it has one.
pub fn extension_of(name: &str) -> Option<String> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}

/// One viewable page extracted from an archive.
///
/// Immutable once created; the raw bytes are shared so the store can hand
/// out copies without duplicating page data.
#[derive(Debug, Clone, PartialEq)]
pub struct PageEntry {
    /// Path of the entry within the archive.
    pub name: String,
    /// Raw (still encoded) image bytes.
    pub file_data: Arc<Vec<u8>>,
    /// MIME type derived from the entry's extension.
    pub mime: &'static str,
}

impl PageEntry {
    pub fn new(name: String, file_data: Vec<u8>) -> Self {
        let mime = mime_for_name(&name);
        Self {
            name,
            file_data: Arc::new(file_data),
            mime,
        }
    }
}

/// Maps a file name to a MIME type purely by extension.
pub fn mime_for_name(name: &str) -> &'static str {
    match extension_of(name).as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("svg") => "image/svg",
        _ => "application/octet-stream",
    }
}
