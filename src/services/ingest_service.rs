//! File selection boundary.
//!
//! Dispatches one selected file into the archive or PDF ingestion path and
//! populates the store. Every failure is typed and recovered by the caller;
//! the store is left showing the loader so the caller decides which screen
//! comes next.

use log::info;

use crate::config::DEFAULT_LOADING_MESSAGE;
use crate::error::{AppError, Result};
use crate::page::{extension_of, FileType};
use crate::pdf::PdfProvider;
use crate::services::extraction_service;
use crate::signature;
use crate::state::{StateValue, StoreHandle};

/// Ingests selected files into the shared store.
pub struct IngestService {
    store: StoreHandle,
    pdf_provider: Option<Box<dyn PdfProvider>>,
}

impl IngestService {
    pub fn new(store: StoreHandle, pdf_provider: Option<Box<dyn PdfProvider>>) -> Self {
        Self {
            store,
            pdf_provider,
        }
    }

    /// Opens one file: resets the session, classifies the file by
    /// extension, runs the matching ingestion path, and reveals the viewer.
    ///
    /// `progress` receives 0-100 percentages, `status` human-readable notes.
    pub fn open_file(
        &self,
        file_name: &str,
        bytes: &[u8],
        progress: &mut dyn FnMut(f32),
        status: &mut dyn FnMut(&str),
    ) -> Result<()> {
        {
            let mut store = self.store.lock().unwrap();
            store.reset();
            store.set(StateValue::CurrentFileName(file_name.to_string()));
            store.show_loader(DEFAULT_LOADING_MESSAGE);
        }

        let file_type = FileType::from_name(file_name).ok_or_else(|| {
            AppError::UnsupportedFileType(extension_of(file_name).unwrap_or_default())
        })?;
        self.store
            .lock()
            .unwrap()
            .set(StateValue::CurrentFileType(Some(file_type)));

        if file_type.is_archive() {
            // The newer RAR sub-format is rejected before any provider is
            // constructed.
            if file_type.is_rar_family() && signature::is_rar5(bytes) {
                return Err(AppError::UnsupportedContainerSubFormat);
            }

            status(&format!(
                "Processing {} file...",
                file_type.as_str().to_uppercase()
            ));
            let images = extraction_service::process_archive(bytes, progress, status)?;
            info!("archive yielded {} pages", images.len());

            let total = images.len();
            let mut store = self.store.lock().unwrap();
            store.set(StateValue::CurrentImages(images));
            store.set(StateValue::TotalPages(total));
            store.set(StateValue::CurrentPage(0));
        } else {
            status("Loading PDF...");
            let provider = self.pdf_provider.as_ref().ok_or_else(|| {
                AppError::PdfLoadFailure("no PDF engine in this build".to_string())
            })?;
            let doc = provider.open(bytes, &mut |loaded, total| {
                if total > 0 {
                    progress((loaded as f32 / total as f32) * 100.0);
                }
            })?;
            progress(100.0);

            let mut store = self.store.lock().unwrap();
            store.set(StateValue::PdfDoc(Some(doc.clone())));
            store.set(StateValue::TotalPages(doc.page_count()));
        }

        let mut store = self.store.lock().unwrap();
        if store.total_pages() == 0 {
            return Err(AppError::NoViewablePages);
        }
        store.show_viewer();
        store.hide_loader();
        Ok(())
    }
}
