//! Application configuration constants.

/// Image file extensions accepted as viewable pages inside an archive.
pub const SUPPORTED_IMAGE_EXTENSIONS: [&str; 7] =
    ["jpg", "jpeg", "png", "gif", "webp", "bmp", "svg"];

/// Archive container extensions handled by the unarchive pipeline.
pub const ARCHIVE_EXTENSIONS: [&str; 4] = ["zip", "cbz", "rar", "cbr"];

/// Default prompt shown while a file is being processed.
pub const DEFAULT_LOADING_MESSAGE: &str = "Please wait, processing comic...";

/// Surface widths above this many pixels render PDF pages at a fixed scale.
pub const WIDE_VIEWPORT_PX: u32 = 768;

/// Fixed PDF render scale used on wide surfaces.
pub const WIDE_VIEWPORT_SCALE: f32 = 1.5;

/// Narrow surfaces derive the PDF render scale from this reference width.
pub const NARROW_VIEWPORT_REFERENCE_PX: f32 = 600.0;
