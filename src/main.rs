use std::path::PathBuf;

use anyhow::Result;

use cbview::render::PageRenderer;
use cbview::services::{IngestService, NavigationService};
use cbview::state::AppState;
use cbview::ui::{self, ShellSurface};

fn main() -> Result<()> {
    env_logger::Builder::from_default_env().init();

    let initial = startup_file_from_args().or_else(pick_file);

    let store = AppState::new_handle();
    let ingest = IngestService::new(store.clone(), pdf_provider());
    let navigation = NavigationService::new(store.clone());
    let renderer = PageRenderer::new(store.clone(), Box::new(ShellSurface::new()));

    ui::run(store, ingest, navigation, renderer, initial)
}

fn startup_file_from_args() -> Option<PathBuf> {
    std::env::args_os()
        .skip(1)
        .filter(|arg| !arg.to_string_lossy().starts_with('-'))
        .map(PathBuf::from)
        .next()
}

fn pick_file() -> Option<PathBuf> {
    let mut extensions: Vec<&str> = cbview::config::ARCHIVE_EXTENSIONS.to_vec();
    extensions.push("pdf");
    rfd::FileDialog::new()
        .add_filter("Comics and PDF", &extensions)
        .pick_file()
}

#[cfg(feature = "pdf")]
fn pdf_provider() -> Option<Box<dyn cbview::pdf::PdfProvider>> {
    Some(Box::new(cbview::pdf::MupdfProvider))
}

#[cfg(not(feature = "pdf"))]
fn pdf_provider() -> Option<Box<dyn cbview::pdf::PdfProvider>> {
    None
}
