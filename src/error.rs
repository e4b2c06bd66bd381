//! Unified error types for the viewer application.

/// Application-specific errors.
///
/// Every ingestion failure is recovered at the file-selection boundary;
/// per-page failures during navigation are logged and leave the previous
/// page displayed.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The archive uses the RAR5 container sub-format, which no bundled
    /// decompression engine can read.
    #[error("RAR5/CBR5 files are not supported")]
    UnsupportedContainerSubFormat,

    /// No decompression provider recognized the buffer's container format.
    #[error("unknown or unsupported archive format")]
    UnrecognizedArchiveFormat,

    /// The decompression provider reported an error during extraction.
    #[error("{0}")]
    ArchiveExtractionFailure(String),

    /// Extraction (or PDF load) produced zero viewable pages.
    #[error("no viewable images were found in this file")]
    NoViewablePages,

    /// The selected file's extension matches no known format.
    #[error("unsupported file format: .{0}")]
    UnsupportedFileType(String),

    /// A page image failed to decode.
    #[error("failed to load image: {0}")]
    ImageDecodeFailure(String),

    /// The PDF provider failed to open or render the document.
    #[error("failed to process PDF: {0}")]
    PdfLoadFailure(String),
}

/// Type alias for Results in this application.
pub type Result<T> = std::result::Result<T, AppError>;
