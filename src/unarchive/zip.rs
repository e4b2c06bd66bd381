//! Zip-backed decompression provider covering the zip/cbz containers.

use std::io::{Cursor, Read};

use log::debug;

use super::events::{ArchiveEvent, ErrorPayload, ExtractPayload, ProgressPayload, UnarchivedFile};
use super::Unarchiver;

/// Extracts every member of an in-memory zip buffer, reporting progress as
/// compressed bytes consumed. Directory members are surfaced as-is;
/// filtering is the normalization layer's job.
pub struct ZipUnarchiver<'a> {
    buffer: &'a [u8],
}

impl<'a> ZipUnarchiver<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer }
    }
}

impl Unarchiver for ZipUnarchiver<'_> {
    fn start(&mut self, listener: &mut dyn FnMut(ArchiveEvent)) {
        let mut archive = match zip::ZipArchive::new(Cursor::new(self.buffer)) {
            Ok(archive) => archive,
            Err(e) => {
                listener(ArchiveEvent::Error(ErrorPayload {
                    message: Some(e.to_string()),
                    ..Default::default()
                }));
                return;
            }
        };

        let total = self.buffer.len() as u64;
        let mut compressed_read = 0u64;

        for index in 0..archive.len() {
            let mut entry = match archive.by_index(index) {
                Ok(entry) => entry,
                Err(e) => {
                    listener(ArchiveEvent::Error(ErrorPayload {
                        message: Some(e.to_string()),
                        ..Default::default()
                    }));
                    return;
                }
            };

            let filename = entry.name().to_string();
            compressed_read += entry.compressed_size();

            let file_data = if entry.is_dir() {
                Vec::new()
            } else {
                let mut data = Vec::with_capacity(entry.size() as usize);
                if let Err(e) = entry.read_to_end(&mut data) {
                    listener(ArchiveEvent::Error(ErrorPayload {
                        message: Some(format!("failed to extract {filename}: {e}")),
                        ..Default::default()
                    }));
                    return;
                }
                data
            };

            debug!("extracted {filename} ({} bytes)", file_data.len());
            listener(ArchiveEvent::Extract(ExtractPayload {
                unarchived_file: Some(UnarchivedFile {
                    filename,
                    file_data,
                }),
                ..Default::default()
            }));
            listener(ArchiveEvent::Progress(ProgressPayload {
                loaded: Some(compressed_read.min(total)),
                total: Some(total),
                ..Default::default()
            }));
        }

        listener(ArchiveEvent::Finish);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::FileOptions;

    fn sample_zip() -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default();
        writer.add_directory("chapter1/", options).unwrap();
        writer.start_file("chapter1/page1.png", options).unwrap();
        writer.write_all(b"png-bytes").unwrap();
        writer.start_file("readme.txt", options).unwrap();
        writer.write_all(b"hello").unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn emits_every_member_then_finish() {
        let buffer = sample_zip();
        let mut events = Vec::new();
        ZipUnarchiver::new(&buffer).start(&mut |event| events.push(event));

        let names: Vec<String> = events
            .iter()
            .filter_map(|event| match event {
                ArchiveEvent::Extract(payload) => payload
                    .unarchived_file
                    .as_ref()
                    .map(|file| file.filename.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(names, vec!["chapter1/", "chapter1/page1.png", "readme.txt"]);
        assert!(matches!(events.last(), Some(ArchiveEvent::Finish)));
    }

    #[test]
    fn member_bytes_round_trip() {
        let buffer = sample_zip();
        let mut page_data = None;
        ZipUnarchiver::new(&buffer).start(&mut |event| {
            if let ArchiveEvent::Extract(payload) = event {
                if let Some(file) = payload.unarchived_file {
                    if file.filename == "chapter1/page1.png" {
                        page_data = Some(file.file_data);
                    }
                }
            }
        });
        assert_eq!(page_data.as_deref(), Some(b"png-bytes".as_slice()));
    }

    #[test]
    fn corrupt_buffer_reports_an_error_event() {
        let buffer = b"PK\x03\x04 this is not really a zip".to_vec();
        let mut saw_error = false;
        ZipUnarchiver::new(&buffer).start(&mut |event| {
            if matches!(event, ArchiveEvent::Error(_)) {
                saw_error = true;
            }
        });
        assert!(saw_error);
    }

    #[test]
    fn progress_is_byte_shaped_and_bounded() {
        let buffer = sample_zip();
        let total = buffer.len() as u64;
        let mut reports = Vec::new();
        ZipUnarchiver::new(&buffer).start(&mut |event| {
            if let ArchiveEvent::Progress(payload) = event {
                reports.push((payload.loaded.unwrap(), payload.total.unwrap()));
            }
        });
        assert!(!reports.is_empty());
        for (loaded, reported_total) in reports {
            assert_eq!(reported_total, total);
            assert!(loaded <= total);
        }
    }
}
