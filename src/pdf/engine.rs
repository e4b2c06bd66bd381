//! MuPDF-backed implementation of the PDF provider boundary.

use std::io::Write;
use std::rc::Rc;

use log::debug;
use mupdf::{Colorspace, Document, Matrix, Page, Pixmap};

use super::{Canvas, PdfDocument, PdfPage, PdfProvider, PdfViewport};
use crate::error::{AppError, Result};

fn engine_error(e: impl std::fmt::Display) -> AppError {
    AppError::PdfLoadFailure(e.to_string())
}

/// Opens documents with MuPDF. The engine reads from a path, so the buffer
/// is spooled to a temporary file that lives as long as the document.
pub struct MupdfProvider;

impl PdfProvider for MupdfProvider {
    fn open(
        &self,
        data: &[u8],
        on_progress: &mut dyn FnMut(u64, u64),
    ) -> Result<Rc<dyn PdfDocument>> {
        let mut spool = tempfile::NamedTempFile::new().map_err(engine_error)?;
        spool.write_all(data).map_err(engine_error)?;

        let document =
            Document::open(spool.path().to_string_lossy().as_ref()).map_err(engine_error)?;
        let page_count = document.page_count().map_err(engine_error)? as usize;
        debug!("opened PDF with {page_count} pages");
        on_progress(data.len() as u64, data.len() as u64);

        Ok(Rc::new(MupdfDocument {
            document,
            page_count,
            _spool: spool,
        }))
    }
}

struct MupdfDocument {
    document: Document,
    page_count: usize,
    _spool: tempfile::NamedTempFile,
}

impl PdfDocument for MupdfDocument {
    fn page_count(&self) -> usize {
        self.page_count
    }

    fn page(&self, page_number: usize) -> Result<Box<dyn PdfPage + '_>> {
        if page_number == 0 || page_number > self.page_count {
            return Err(AppError::PdfLoadFailure(format!(
                "page {page_number} out of range 1..={}",
                self.page_count
            )));
        }
        let page = self
            .document
            .load_page((page_number - 1) as i32)
            .map_err(engine_error)?;
        let bounds = page.bounds().map_err(engine_error)?;
        Ok(Box::new(MupdfPage {
            page,
            width: bounds.x1 - bounds.x0,
            height: bounds.y1 - bounds.y0,
        }))
    }
}

struct MupdfPage {
    page: Page,
    width: f32,
    height: f32,
}

impl PdfPage for MupdfPage {
    fn viewport(&self, scale: f32) -> PdfViewport {
        PdfViewport {
            width: self.width * scale,
            height: self.height * scale,
        }
    }

    fn render(&self, canvas: &mut Canvas, viewport: &PdfViewport) -> Result<()> {
        let magnification = if self.width > 0.0 {
            viewport.width / self.width
        } else {
            1.0
        };
        let transform = Matrix::new_scale(magnification, magnification);
        let rgb = Colorspace::device_rgb();
        let pixmap = self
            .page
            .to_pixmap(&transform, &rgb, false, false)
            .map_err(engine_error)?;

        canvas.fill(pixmap.width(), pixmap.height(), pixmap_to_rgb(&pixmap)?);
        Ok(())
    }
}

/// Copies pixmap samples into a tightly packed RGB8 buffer, honoring the
/// engine's row stride and dropping any alpha channel.
fn pixmap_to_rgb(pixmap: &Pixmap) -> Result<Vec<u8>> {
    let n = pixmap.n() as usize;
    if n < 3 {
        return Err(AppError::PdfLoadFailure(format!(
            "unsupported pixmap format: {n} channels"
        )));
    }

    let width = pixmap.width() as usize;
    let height = pixmap.height() as usize;
    let stride = pixmap.stride() as usize;
    let samples = pixmap.samples();
    let row_bytes = width * n;
    if samples.len() < stride.saturating_mul(height) || row_bytes > stride {
        return Err(AppError::PdfLoadFailure(
            "pixmap buffer size mismatch".to_string(),
        ));
    }

    let mut out = Vec::with_capacity(width * height * 3);
    for y in 0..height {
        let row_start = y * stride;
        let row = &samples[row_start..row_start + row_bytes];
        if n == 3 {
            out.extend_from_slice(row);
        } else {
            for px in row.chunks_exact(n) {
                out.extend_from_slice(&px[..3]);
            }
        }
    }
    Ok(out)
}
