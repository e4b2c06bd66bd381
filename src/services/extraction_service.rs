//! Entry normalization layer.
//!
//! Adapts a decompression provider's event stream into an ordered sequence
//! of page entries plus normalized 0-100 progress. Filtering decides what
//! counts as a viewable page; the final natural sort fixes page order, since
//! archive member enumeration order is not guaranteed to match it.

use log::{debug, error};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::SUPPORTED_IMAGE_EXTENSIONS;
use crate::error::{AppError, Result};
use crate::page::PageEntry;
use crate::sort::natural_cmp;
use crate::unarchive::events::{resolve_error_message, resolve_percent, resolve_unarchived_file};
use crate::unarchive::{self, ArchiveEvent, Unarchiver};

static VIEWABLE_IMAGE_RE: Lazy<Regex> = Lazy::new(|| {
    let pattern = format!(r"(?i)\.({})$", SUPPORTED_IMAGE_EXTENSIONS.join("|"));
    Regex::new(&pattern).expect("valid pattern")
});

/// True when an archive member should become a page: not a directory, not
/// macOS metadata, not a Finder marker, and named like an image.
fn is_viewable_entry(filename: &str) -> bool {
    !filename.ends_with('/')
        && !filename.contains("__MACOSX/")
        && !filename.contains(".DS_Store")
        && VIEWABLE_IMAGE_RE.is_match(filename)
}

/// Runs a provider for `buffer` and collects its viewable pages in natural
/// order. Progress percentages go to `progress`, per-file notes to `status`.
pub fn process_archive(
    buffer: &[u8],
    progress: &mut dyn FnMut(f32),
    status: &mut dyn FnMut(&str),
) -> Result<Vec<PageEntry>> {
    let mut unarchiver =
        unarchive::get_unarchiver(buffer).ok_or(AppError::UnrecognizedArchiveFormat)?;
    collect_entries(unarchiver.as_mut(), progress, status)
}

fn collect_entries(
    unarchiver: &mut dyn Unarchiver,
    progress: &mut dyn FnMut(f32),
    status: &mut dyn FnMut(&str),
) -> Result<Vec<PageEntry>> {
    let mut files: Vec<PageEntry> = Vec::new();
    // First finish or error settles the outcome; later events are ignored.
    let mut outcome: Option<Result<()>> = None;

    unarchiver.start(&mut |event| {
        if outcome.is_some() {
            return;
        }
        match event {
            ArchiveEvent::Progress(payload) => {
                if let Some(percent) = resolve_percent(&payload) {
                    progress(percent);
                }
            }
            ArchiveEvent::Extract(payload) => {
                if let Some(file) = resolve_unarchived_file(payload) {
                    if is_viewable_entry(&file.filename) {
                        status(&format!("Found file: {}", file.filename));
                        files.push(PageEntry::new(file.filename, file.file_data));
                    } else {
                        debug!("skipping non-viewable entry: {}", file.filename);
                    }
                }
            }
            ArchiveEvent::Finish => {
                files.sort_by(|a, b| natural_cmp(&a.name, &b.name));
                progress(100.0);
                outcome = Some(if files.is_empty() {
                    Err(AppError::NoViewablePages)
                } else {
                    Ok(())
                });
            }
            ArchiveEvent::Error(payload) => {
                let message = resolve_error_message(&payload);
                error!("unarchiver reported: {message}");
                outcome = Some(Err(AppError::ArchiveExtractionFailure(message)));
            }
        }
    });

    match outcome {
        Some(Ok(())) => Ok(files),
        Some(Err(e)) => Err(e),
        None => Err(AppError::ArchiveExtractionFailure(
            "archive processing ended without a result".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unarchive::{ErrorPayload, ExtractPayload, UnarchivedFile};

    /// Provider stand-in that replays a scripted event sequence.
    struct ScriptedUnarchiver {
        events: Vec<ArchiveEvent>,
    }

    impl Unarchiver for ScriptedUnarchiver {
        fn start(&mut self, listener: &mut dyn FnMut(ArchiveEvent)) {
            for event in self.events.drain(..) {
                listener(event);
            }
        }
    }

    fn extract(name: &str) -> ArchiveEvent {
        ArchiveEvent::Extract(ExtractPayload {
            unarchived_file: Some(UnarchivedFile {
                filename: name.to_string(),
                file_data: vec![0xFF],
            }),
            ..Default::default()
        })
    }

    fn run(events: Vec<ArchiveEvent>) -> Result<Vec<PageEntry>> {
        let mut provider = ScriptedUnarchiver { events };
        collect_entries(&mut provider, &mut |_| {}, &mut |_| {})
    }

    #[test]
    fn filters_directories_metadata_and_non_images() {
        let pages = run(vec![
            extract("img1.jpg"),
            extract("__MACOSX/img1.jpg"),
            extract(".DS_Store"),
            extract("notes.txt/"),
            ArchiveEvent::Finish,
        ])
        .unwrap();
        let names: Vec<&str> = pages.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["img1.jpg"]);
    }

    #[test]
    fn pages_come_back_in_natural_order() {
        let pages = run(vec![
            extract("page10.png"),
            extract("page2.png"),
            extract("page1.png"),
            ArchiveEvent::Finish,
        ])
        .unwrap();
        let names: Vec<&str> = pages.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["page1.png", "page2.png", "page10.png"]);
    }

    #[test]
    fn empty_result_is_no_viewable_pages() {
        let result = run(vec![extract("notes.txt"), ArchiveEvent::Finish]);
        assert!(matches!(result, Err(AppError::NoViewablePages)));
    }

    #[test]
    fn provider_error_carries_its_message() {
        let result = run(vec![
            extract("page1.png"),
            ArchiveEvent::Error(ErrorPayload {
                message: Some("bad central directory".to_string()),
                ..Default::default()
            }),
        ]);
        match result {
            Err(AppError::ArchiveExtractionFailure(message)) => {
                assert_eq!(message, "bad central directory");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn events_after_an_error_are_ignored() {
        let result = run(vec![
            ArchiveEvent::Error(ErrorPayload::default()),
            extract("page1.png"),
            ArchiveEvent::Finish,
        ]);
        assert!(matches!(result, Err(AppError::ArchiveExtractionFailure(_))));
    }

    #[test]
    fn finish_reports_one_hundred_percent() {
        let mut provider = ScriptedUnarchiver {
            events: vec![extract("a.png"), ArchiveEvent::Finish],
        };
        let mut reports = Vec::new();
        collect_entries(&mut provider, &mut |p| reports.push(p), &mut |_| {}).unwrap();
        assert_eq!(reports.last().copied(), Some(100.0));
    }

    #[test]
    fn missing_provider_means_unrecognized_format() {
        let result = process_archive(b"not an archive", &mut |_| {}, &mut |_| {});
        assert!(matches!(result, Err(AppError::UnrecognizedArchiveFormat)));
    }

    #[test]
    fn status_callback_names_each_accepted_file() {
        let mut provider = ScriptedUnarchiver {
            events: vec![extract("a.png"), extract("skip.txt"), ArchiveEvent::Finish],
        };
        let mut lines = Vec::new();
        collect_entries(&mut provider, &mut |_| {}, &mut |line| {
            lines.push(line.to_string())
        })
        .unwrap();
        assert_eq!(lines, vec!["Found file: a.png"]);
    }
}
