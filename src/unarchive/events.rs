//! Event payloads emitted by decompression providers.
//!
//! Observed providers disagree about where a payload lives: some set a
//! direct field, some nest it under a `detail` field, some deliver the
//! payload as the event itself. One adapter function per event kind
//! resolves the shapes with a fixed priority: direct field first, then the
//! nested detail, then the bare payload. Nothing else in the pipeline is
//! allowed to sniff shapes.

/// Message used when an error event carries no message of its own.
const FALLBACK_ERROR_MESSAGE: &str = "failed to process the archive file";

/// One event from a decompression provider.
#[derive(Debug, Clone)]
pub enum ArchiveEvent {
    Progress(ProgressPayload),
    Extract(ExtractPayload),
    Finish,
    Error(ErrorPayload),
}

/// Progress notification in any of the observed shapes.
#[derive(Debug, Clone, Default)]
pub struct ProgressPayload {
    /// Direct percentage, when the provider computes one.
    pub percent: Option<f32>,
    /// Bytes consumed so far.
    pub loaded: Option<u64>,
    /// Alternative name some providers use for `loaded`.
    pub total_compressed_bytes_read: Option<u64>,
    /// Total bytes, for providers that only report byte counts.
    pub total: Option<u64>,
    /// Nested payload, for providers that wrap everything in a detail field.
    pub detail: Option<Box<ProgressPayload>>,
}

/// A fully extracted archive member.
#[derive(Debug, Clone, PartialEq)]
pub struct UnarchivedFile {
    pub filename: String,
    pub file_data: Vec<u8>,
}

/// Extraction notification in any of the observed shapes.
#[derive(Debug, Clone, Default)]
pub struct ExtractPayload {
    /// Direct field carrying the extracted member.
    pub unarchived_file: Option<UnarchivedFile>,
    /// Nested payload.
    pub detail: Option<Box<ExtractPayload>>,
    /// Bare shape: the payload is the member itself.
    pub filename: Option<String>,
    pub file_data: Option<Vec<u8>>,
}

/// Error notification in any of the observed shapes.
#[derive(Debug, Clone, Default)]
pub struct ErrorPayload {
    pub message: Option<String>,
    pub detail: Option<Box<ErrorPayload>>,
}

/// Resolves a progress payload to a percentage, clamped to at most 100.
///
/// Priority: direct percent, then the detail payload, then the
/// loaded/total byte ratio.
pub fn resolve_percent(payload: &ProgressPayload) -> Option<f32> {
    if let Some(percent) = payload.percent {
        return Some(percent.min(100.0));
    }
    if let Some(detail) = &payload.detail {
        if let Some(percent) = resolve_percent(detail) {
            return Some(percent);
        }
    }
    let total = payload.total.filter(|total| *total > 0)?;
    let loaded = payload
        .loaded
        .or(payload.total_compressed_bytes_read)
        .unwrap_or(0);
    Some(((loaded as f32 / total as f32) * 100.0).min(100.0))
}

/// Resolves an extract payload to the member it carries, if any.
///
/// Priority: direct field, then the detail payload, then the bare shape.
/// Entries missing either the name or the data are ignored.
pub fn resolve_unarchived_file(payload: ExtractPayload) -> Option<UnarchivedFile> {
    let ExtractPayload {
        unarchived_file,
        detail,
        filename,
        file_data,
    } = payload;

    if let Some(file) = unarchived_file {
        return Some(file);
    }
    if let Some(detail) = detail {
        if let Some(file) = resolve_unarchived_file(*detail) {
            return Some(file);
        }
    }
    match (filename, file_data) {
        (Some(filename), Some(file_data)) => Some(UnarchivedFile {
            filename,
            file_data,
        }),
        _ => None,
    }
}

/// Resolves an error payload to a displayable message.
pub fn resolve_error_message(payload: &ErrorPayload) -> String {
    if let Some(message) = &payload.message {
        return message.clone();
    }
    if let Some(detail) = &payload.detail {
        if detail.message.is_some() || detail.detail.is_some() {
            return resolve_error_message(detail);
        }
    }
    FALLBACK_ERROR_MESSAGE.to_string()
}
