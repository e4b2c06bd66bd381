//! Terminal shell wired to the store.
//!
//! Plain UI plumbing: registers store listeners, forwards commands to the
//! navigation controller, and owns the display surface the render pipeline
//! writes into. Page-change listeners enqueue repaint requests instead of
//! rendering inline; the command loop drains the queue once the store call
//! has returned.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};

use log::error;

use crate::error::AppError;
use crate::render::PageRenderer;
use crate::services::{IngestService, NavigationService};
use crate::state::{StateKey, StateValue, StoreHandle};
use crate::surface::{DisplaySurface, Frame};

/// Fixed viewport width the shell pretends to have. Wide enough that PDF
/// pages use the fixed render scale.
const SHELL_VIEWPORT_WIDTH: u32 = 1024;

/// Surface that reports committed pages on the terminal.
pub struct ShellSurface {
    current: Option<Frame>,
}

impl ShellSurface {
    pub fn new() -> Self {
        Self { current: None }
    }

    /// The most recently committed frame, if a page is on screen.
    pub fn current_frame(&self) -> Option<&Frame> {
        self.current.as_ref()
    }
}

impl Default for ShellSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplaySurface for ShellSurface {
    fn viewport_width(&self) -> u32 {
        SHELL_VIEWPORT_WIDTH
    }

    fn clear(&mut self) {
        self.current = None;
    }

    fn present(&mut self, frame: Frame) {
        println!("[page] {}x{} px", frame.width, frame.height);
        self.current = Some(frame);
    }
}

/// Registers the store subscriptions the shell cares about.
fn setup_state_listeners(store: &StoreHandle, repaint: Sender<()>) {
    let mut store = store.lock().unwrap();

    store.on(
        StateKey::IsLoaderVisible,
        Box::new(|new, old| {
            if let (StateValue::IsLoaderVisible(false), StateValue::IsLoaderVisible(true)) =
                (new, old)
            {
                println!("[loader] done");
            }
        }),
    );

    store.on(
        StateKey::LoadingMessage,
        Box::new(|new, _| {
            if let StateValue::LoadingMessage(message) = new {
                println!("[loader] {message}");
            }
        }),
    );

    store.on(
        StateKey::IsViewerVisible,
        Box::new(|new, _| {
            if let StateValue::IsViewerVisible(visible) = new {
                if *visible {
                    println!("[viewer] shown");
                } else {
                    println!("[viewer] upload screen");
                }
            }
        }),
    );

    store.on(
        StateKey::CurrentFileName,
        Box::new(|new, _| {
            if let StateValue::CurrentFileName(name) = new {
                if !name.is_empty() {
                    println!("[file] {name}");
                }
            }
        }),
    );

    store.on(
        StateKey::TotalPages,
        Box::new(|new, _| {
            if let StateValue::TotalPages(total) = new {
                println!("[pages] {total}");
            }
        }),
    );

    // Rendering must not run inside the notification; enqueue and let the
    // command loop drain once the store call has returned.
    store.on(
        StateKey::CurrentPage,
        Box::new(move |_, _| {
            let _ = repaint.send(());
        }),
    );
}

/// Runs every queued repaint request; returns how many ran.
fn drain_repaints(repaint: &Receiver<()>, renderer: &mut PageRenderer) -> usize {
    let mut drained = 0;
    while repaint.try_recv().is_ok() {
        renderer.show_current_page();
        drained += 1;
    }
    drained
}

/// Routes an ingestion failure by kind: the RAR5 sub-format gets a
/// dedicated explanation with a remediation hint, everything else a
/// one-line notification. Both paths end back on the upload screen.
fn report_ingest_error(store: &StoreHandle, error: &AppError) {
    error!("failed to process file: {error}");
    match error {
        AppError::UnsupportedContainerSubFormat => {
            store.lock().unwrap().hide_loader();
            println!("error: this archive uses the RAR5/CBR5 format, which the viewer cannot read.");
            println!("hint: repack it as ZIP/CBZ to view it (see the convert-format tutorial).");
        }
        _ => {
            println!("error: {error}");
        }
    }
    store.lock().unwrap().show_upload_screen();
}

fn open_path(
    path: &Path,
    store: &StoreHandle,
    ingest: &IngestService,
    renderer: &mut PageRenderer,
    repaint: &Receiver<()>,
) {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("failed to read {}: {e}", path.display());
            println!("error: could not read {}", path.display());
            store.lock().unwrap().show_upload_screen();
            return;
        }
    };

    let mut last_percent = -1;
    let mut progress = |percent: f32| {
        let rounded = percent.round() as i32;
        if rounded != last_percent {
            last_percent = rounded;
            print!("\r[progress] {rounded:>3}%");
            let _ = io::stdout().flush();
        }
    };
    let mut status = |line: &str| println!("\n[status] {line}");

    let result = ingest.open_file(&file_name, &bytes, &mut progress, &mut status);
    println!();
    match result {
        Ok(()) => {
            // The archive path queued a repaint by assigning the current
            // page; the PDF path did not, so draw explicitly.
            if drain_repaints(repaint, renderer) == 0 {
                renderer.show_current_page();
            }
        }
        Err(e) => report_ingest_error(store, &e),
    }
}

fn print_help() {
    println!("commands: next (n), prev (p), go <page> (g), open <path> (o), help (h), quit (q)");
}

/// Command loop: reads lines from stdin until quit or end of input.
pub fn run(
    store: StoreHandle,
    ingest: IngestService,
    navigation: NavigationService,
    mut renderer: PageRenderer,
    initial: Option<PathBuf>,
) -> anyhow::Result<()> {
    let (repaint_tx, repaint_rx) = mpsc::channel();
    setup_state_listeners(&store, repaint_tx);

    match initial {
        Some(path) => open_path(&path, &store, &ingest, &mut renderer, &repaint_rx),
        None => println!("no file selected; use `open <path>`"),
    }
    print_help();

    let stdin = io::stdin();
    print!("> ");
    let _ = io::stdout().flush();
    for line in stdin.lock().lines() {
        let line = line?;
        let mut words = line.split_whitespace();
        match words.next() {
            Some("n") | Some("next") => navigation.next(),
            Some("p") | Some("prev") => navigation.previous(),
            Some("g") | Some("go") => match words.next().and_then(|w| w.parse::<usize>().ok()) {
                Some(page_number) => {
                    if !navigation.go_to_page(page_number) {
                        println!("page {page_number} is out of range");
                    }
                }
                None => println!("usage: go <page>"),
            },
            Some("o") | Some("open") => match words.next() {
                Some(path) => {
                    open_path(Path::new(path), &store, &ingest, &mut renderer, &repaint_rx)
                }
                None => println!("usage: open <path>"),
            },
            Some("h") | Some("help") => print_help(),
            Some("q") | Some("quit") => break,
            Some(_) => print_help(),
            None => {}
        }
        drain_repaints(&repaint_rx, &mut renderer);
        print!("> ");
        let _ = io::stdout().flush();
    }

    Ok(())
}
