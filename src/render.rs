//! Render pipeline: materializes the current page into the display surface.
//!
//! At most one render is in flight at a time. Every display request bumps a
//! generation token before the in-flight check, so a completion whose token
//! went stale commits nothing. Cancellation is cooperative: superseded work
//! is discarded at commit time, never preempted.

use std::rc::Rc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use log::{debug, error};

use crate::config::{NARROW_VIEWPORT_REFERENCE_PX, WIDE_VIEWPORT_PX, WIDE_VIEWPORT_SCALE};
use crate::error::{AppError, Result};
use crate::page::{FileType, PageEntry};
use crate::pdf::{Canvas, PdfDocument};
use crate::state::StoreHandle;
use crate::surface::{DisplaySurface, Frame};

/// Latch plus generation token shared by everything that can request a page
/// display.
pub struct RenderGate {
    generation: AtomicU64,
    rendering: AtomicBool,
}

impl RenderGate {
    pub fn new() -> Self {
        Self {
            generation: AtomicU64::new(0),
            rendering: AtomicBool::new(false),
        }
    }

    /// Registers a display request. The generation token is always bumped;
    /// the captured token comes back when the request may proceed, `None`
    /// when a render is already in flight and the request is dropped.
    pub fn begin(&self) -> Option<u64> {
        let token = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if self.rendering.swap(true, Ordering::SeqCst) {
            None
        } else {
            Some(token)
        }
    }

    /// True while no newer request has superseded the captured token.
    pub fn is_current(&self, token: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == token
    }

    /// Releases the latch once a render attempt is over.
    pub fn finish(&self) {
        self.rendering.store(false, Ordering::SeqCst);
    }
}

impl Default for RenderGate {
    fn default() -> Self {
        Self::new()
    }
}

/// What the current page materializes from.
enum PageSource {
    Pdf(Rc<dyn PdfDocument>),
    Image(PageEntry),
    Nothing,
}

struct Snapshot {
    source: PageSource,
    page_index: usize,
}

/// Drives page materialization against the store and a display surface.
pub struct PageRenderer {
    store: StoreHandle,
    surface: Box<dyn DisplaySurface>,
    gate: Arc<RenderGate>,
    zoom: f32,
}

impl PageRenderer {
    pub fn new(store: StoreHandle, surface: Box<dyn DisplaySurface>) -> Self {
        Self {
            store,
            surface,
            gate: Arc::new(RenderGate::new()),
            zoom: 1.0,
        }
    }

    /// The gate display requests go through. Collaborators that learn about
    /// page changes asynchronously hold a clone to supersede in-flight work.
    pub fn gate(&self) -> Arc<RenderGate> {
        self.gate.clone()
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = zoom;
    }

    /// Displays the page the store currently points at.
    ///
    /// The loader is shown for the duration of the attempt and hidden again
    /// on every exit path; failures keep the previous page on the surface.
    pub fn show_current_page(&mut self) {
        let Some(token) = self.gate.begin() else {
            debug!("display request dropped: render already in flight");
            return;
        };

        let snapshot = {
            let mut store = self.store.lock().unwrap();
            let message = format!(
                "Loading page {} of {}...",
                store.current_page() + 1,
                store.total_pages()
            );
            store.show_loader(&message);

            let source = match store.current_file_type() {
                Some(FileType::Pdf) => match store.pdf_doc() {
                    Some(doc) => PageSource::Pdf(doc),
                    None => PageSource::Nothing,
                },
                _ => match store.current_images().get(store.current_page()) {
                    Some(entry) => PageSource::Image(entry.clone()),
                    None => PageSource::Nothing,
                },
            };
            Snapshot {
                source,
                page_index: store.current_page(),
            }
        };

        match self.materialize(&snapshot) {
            Ok(Some(frame)) => {
                if self.gate.is_current(token) {
                    self.surface.clear();
                    self.surface.present(frame);
                    self.zoom = 1.0;
                } else {
                    debug!(
                        "discarding stale render of page {}",
                        snapshot.page_index + 1
                    );
                }
            }
            Ok(None) => {}
            Err(e) => error!("error loading page {}: {e}", snapshot.page_index + 1),
        }

        self.gate.finish();
        self.store.lock().unwrap().hide_loader();
    }

    fn materialize(&mut self, snapshot: &Snapshot) -> Result<Option<Frame>> {
        match &snapshot.source {
            PageSource::Nothing => Ok(None),
            PageSource::Pdf(doc) => self
                .materialize_pdf(doc.as_ref(), snapshot.page_index)
                .map(Some),
            PageSource::Image(entry) => self.materialize_image(entry).map(Some),
        }
    }

    fn materialize_pdf(&mut self, doc: &dyn PdfDocument, page_index: usize) -> Result<Frame> {
        let page = doc.page(page_index + 1)?;

        let viewport_width = self.surface.viewport_width();
        let scale = if viewport_width > WIDE_VIEWPORT_PX {
            WIDE_VIEWPORT_SCALE
        } else {
            viewport_width as f32 / NARROW_VIEWPORT_REFERENCE_PX
        };

        let viewport = page.viewport(scale);
        let mut canvas = Canvas::new(viewport.width.ceil() as u32, viewport.height.ceil() as u32);
        page.render(&mut canvas, &viewport)?;
        // The page handle drops here, releasing engine resources.
        Ok(canvas.into_frame())
    }

    fn materialize_image(&mut self, entry: &PageEntry) -> Result<Frame> {
        // The decoded buffer is temporary either way: converted into a frame
        // on success, dropped on failure.
        let decoded = image::load_from_memory(&entry.file_data)
            .map_err(|e| AppError::ImageDecodeFailure(format!("{}: {e}", entry.name)))?;
        let rgb = decoded.to_rgb8();
        let (width, height) = rgb.dimensions();
        Ok(Frame {
            width,
            height,
            data: rgb.into_raw(),
        })
    }
}
