//! State management for the viewer application.
//!
//! `AppState` holds all view-relevant state behind a typed observer
//! registry: subscribers register per `StateKey` and are invoked
//! synchronously, in registration order, whenever that key is assigned.
//! All mutation happens on one logical thread; subscriber callbacks run
//! while the store is borrowed and therefore must not call back into it.
//! Collaborators that need to react re-entrantly enqueue work instead and
//! drain it after the store call returns.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use log::warn;

use crate::config::DEFAULT_LOADING_MESSAGE;
use crate::page::{FileType, PageEntry};
use crate::pdf::PdfDocument;

/// Shared handle collaborators hold onto the store.
///
/// The mutex exists for handle-sharing; everything runs on one logical
/// thread, so it is uncontended by construction.
pub type StoreHandle = Arc<Mutex<AppState>>;

/// Identifies one state field. The set is closed: every observable field
/// has exactly one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKey {
    CurrentFileType,
    CurrentImages,
    PdfDoc,
    CurrentPage,
    TotalPages,
    CurrentFileName,
    IsViewerVisible,
    IsUploadScreenVisible,
    IsLoaderVisible,
    LoadingMessage,
}

/// A typed value for one state field; the variant names the key.
#[derive(Clone)]
pub enum StateValue {
    CurrentFileType(Option<FileType>),
    CurrentImages(Vec<PageEntry>),
    PdfDoc(Option<Rc<dyn PdfDocument>>),
    CurrentPage(usize),
    TotalPages(usize),
    CurrentFileName(String),
    IsViewerVisible(bool),
    IsUploadScreenVisible(bool),
    IsLoaderVisible(bool),
    LoadingMessage(String),
}

impl StateValue {
    pub fn key(&self) -> StateKey {
        match self {
            Self::CurrentFileType(_) => StateKey::CurrentFileType,
            Self::CurrentImages(_) => StateKey::CurrentImages,
            Self::PdfDoc(_) => StateKey::PdfDoc,
            Self::CurrentPage(_) => StateKey::CurrentPage,
            Self::TotalPages(_) => StateKey::TotalPages,
            Self::CurrentFileName(_) => StateKey::CurrentFileName,
            Self::IsViewerVisible(_) => StateKey::IsViewerVisible,
            Self::IsUploadScreenVisible(_) => StateKey::IsUploadScreenVisible,
            Self::IsLoaderVisible(_) => StateKey::IsLoaderVisible,
            Self::LoadingMessage(_) => StateKey::LoadingMessage,
        }
    }
}

impl fmt::Debug for StateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CurrentFileType(v) => write!(f, "CurrentFileType({v:?})"),
            Self::CurrentImages(v) => write!(f, "CurrentImages({} entries)", v.len()),
            Self::PdfDoc(Some(_)) => write!(f, "PdfDoc(Some(..))"),
            Self::PdfDoc(None) => write!(f, "PdfDoc(None)"),
            Self::CurrentPage(v) => write!(f, "CurrentPage({v})"),
            Self::TotalPages(v) => write!(f, "TotalPages({v})"),
            Self::CurrentFileName(v) => write!(f, "CurrentFileName({v:?})"),
            Self::IsViewerVisible(v) => write!(f, "IsViewerVisible({v})"),
            Self::IsUploadScreenVisible(v) => write!(f, "IsUploadScreenVisible({v})"),
            Self::IsLoaderVisible(v) => write!(f, "IsLoaderVisible({v})"),
            Self::LoadingMessage(v) => write!(f, "LoadingMessage({v:?})"),
        }
    }
}

/// One entry of a batched change notification.
#[derive(Debug, Clone)]
pub struct StateChange {
    pub key: StateKey,
    pub value: StateValue,
    pub old_value: StateValue,
}

/// Handle returned by `on`/`on_change`, used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

/// Per-key subscriber, invoked with `(new, old)`.
pub type KeyListener = Box<dyn FnMut(&StateValue, &StateValue)>;

/// Generic subscriber, invoked with every batch of applied changes.
pub type BatchListener = Box<dyn FnMut(&[StateChange])>;

/// Application-wide state container with observer dispatch.
pub struct AppState {
    current_file_type: Option<FileType>,
    current_images: Vec<PageEntry>,
    pdf_doc: Option<Rc<dyn PdfDocument>>,
    current_page: usize,
    total_pages: usize,
    current_file_name: String,
    is_viewer_visible: bool,
    is_upload_screen_visible: bool,
    is_loader_visible: bool,
    loading_message: String,

    key_listeners: HashMap<StateKey, Vec<(SubscriptionId, KeyListener)>>,
    batch_listeners: Vec<(SubscriptionId, BatchListener)>,
    next_subscription: u64,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            current_file_type: None,
            current_images: Vec::new(),
            pdf_doc: None,
            current_page: 0,
            total_pages: 0,
            current_file_name: String::new(),
            is_viewer_visible: false,
            is_upload_screen_visible: true,
            is_loader_visible: false,
            loading_message: DEFAULT_LOADING_MESSAGE.to_string(),
            key_listeners: HashMap::new(),
            batch_listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Creates a store already wrapped in its shared handle.
    pub fn new_handle() -> StoreHandle {
        Arc::new(Mutex::new(Self::new()))
    }

    pub fn current_file_type(&self) -> Option<FileType> {
        self.current_file_type
    }

    pub fn current_images(&self) -> &[PageEntry] {
        &self.current_images
    }

    pub fn pdf_doc(&self) -> Option<Rc<dyn PdfDocument>> {
        self.pdf_doc.clone()
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn total_pages(&self) -> usize {
        self.total_pages
    }

    pub fn current_file_name(&self) -> &str {
        &self.current_file_name
    }

    pub fn is_viewer_visible(&self) -> bool {
        self.is_viewer_visible
    }

    pub fn is_upload_screen_visible(&self) -> bool {
        self.is_upload_screen_visible
    }

    pub fn is_loader_visible(&self) -> bool {
        self.is_loader_visible
    }

    pub fn loading_message(&self) -> &str {
        &self.loading_message
    }

    /// Assigns one field unconditionally, then notifies that key's
    /// subscribers with `(new, old)` and the generic subscribers with a
    /// one-entry batch.
    pub fn set(&mut self, value: StateValue) {
        let key = value.key();
        let old_value = self.assign(value.clone());
        self.notify_key(key, &value, &old_value);
        let changes = [StateChange {
            key,
            value,
            old_value,
        }];
        self.notify_batch(&changes);
    }

    /// Applies several updates atomically: only values that actually differ
    /// are assigned, all assignments land before any subscriber fires, and
    /// the generic subscribers see one batch listing every applied change.
    pub fn set_many(&mut self, updates: Vec<StateValue>) {
        let mut changes = Vec::new();
        for value in updates {
            if !self.differs(&value) {
                continue;
            }
            let key = value.key();
            let old_value = self.assign(value.clone());
            changes.push(StateChange {
                key,
                value,
                old_value,
            });
        }

        for change in &changes {
            self.notify_key(change.key, &change.value, &change.old_value);
        }
        if !changes.is_empty() {
            self.notify_batch(&changes);
        }
    }

    /// Registers a subscriber for one key. Duplicate registrations are
    /// independent and all fire, in registration order.
    pub fn on(&mut self, key: StateKey, callback: KeyListener) -> SubscriptionId {
        let id = self.next_id();
        self.key_listeners.entry(key).or_default().push((id, callback));
        id
    }

    /// Removes a subscriber; unknown ids are a no-op.
    pub fn off(&mut self, key: StateKey, id: SubscriptionId) {
        if let Some(subscribers) = self.key_listeners.get_mut(&key) {
            subscribers.retain(|(existing, _)| *existing != id);
        }
    }

    /// Registers a generic subscriber for batched change notifications.
    pub fn on_change(&mut self, callback: BatchListener) -> SubscriptionId {
        let id = self.next_id();
        self.batch_listeners.push((id, callback));
        id
    }

    pub fn off_change(&mut self, id: SubscriptionId) {
        self.batch_listeners.retain(|(existing, _)| *existing != id);
    }

    /// Returns every ingestion-related field to its initial value.
    /// Listener registrations and the loading message persist.
    pub fn reset(&mut self) {
        self.set_many(vec![
            StateValue::CurrentFileType(None),
            StateValue::CurrentImages(Vec::new()),
            StateValue::CurrentPage(0),
            StateValue::TotalPages(0),
            StateValue::PdfDoc(None),
            StateValue::CurrentFileName(String::new()),
            StateValue::IsViewerVisible(false),
            StateValue::IsUploadScreenVisible(true),
            StateValue::IsLoaderVisible(false),
        ]);
    }

    /// Moves the current page by `direction`; out-of-bounds moves are
    /// rejected.
    pub fn navigate(&mut self, direction: isize) {
        let target = self.current_page as isize + direction;
        if target >= 0 && (target as usize) < self.total_pages {
            self.set(StateValue::CurrentPage(target as usize));
        } else {
            warn!(
                "navigation rejected: target index {target} outside 0..{}",
                self.total_pages
            );
        }
    }

    /// Jumps to a 1-based page number. Returns false (and changes nothing)
    /// when the number is out of range.
    pub fn go_to_page(&mut self, page_number: usize) -> bool {
        if page_number >= 1 && page_number <= self.total_pages {
            self.set(StateValue::CurrentPage(page_number - 1));
            true
        } else {
            warn!("go_to_page rejected: {page_number} outside 1..={}", self.total_pages);
            false
        }
    }

    pub fn show_viewer(&mut self) {
        self.set(StateValue::IsViewerVisible(true));
        self.set(StateValue::IsUploadScreenVisible(false));
        self.set(StateValue::IsLoaderVisible(false));
    }

    /// Returns to the upload screen and resets the session.
    pub fn show_upload_screen(&mut self) {
        self.set(StateValue::IsViewerVisible(false));
        self.set(StateValue::IsUploadScreenVisible(true));
        self.set(StateValue::IsLoaderVisible(false));
        self.reset();
    }

    pub fn show_loader(&mut self, message: &str) {
        self.set(StateValue::IsLoaderVisible(true));
        self.set(StateValue::LoadingMessage(message.to_string()));
        self.set(StateValue::IsUploadScreenVisible(false));
    }

    pub fn hide_loader(&mut self) {
        self.set(StateValue::IsLoaderVisible(false));
    }

    fn next_id(&mut self) -> SubscriptionId {
        self.next_subscription += 1;
        SubscriptionId(self.next_subscription)
    }

    /// Strict-inequality check against the current field value. The PDF
    /// handle compares by pointer identity.
    fn differs(&self, value: &StateValue) -> bool {
        match value {
            StateValue::CurrentFileType(v) => *v != self.current_file_type,
            StateValue::CurrentImages(v) => *v != self.current_images,
            StateValue::PdfDoc(v) => match (v, &self.pdf_doc) {
                (Some(a), Some(b)) => !Rc::ptr_eq(a, b),
                (None, None) => false,
                _ => true,
            },
            StateValue::CurrentPage(v) => *v != self.current_page,
            StateValue::TotalPages(v) => *v != self.total_pages,
            StateValue::CurrentFileName(v) => *v != self.current_file_name,
            StateValue::IsViewerVisible(v) => *v != self.is_viewer_visible,
            StateValue::IsUploadScreenVisible(v) => *v != self.is_upload_screen_visible,
            StateValue::IsLoaderVisible(v) => *v != self.is_loader_visible,
            StateValue::LoadingMessage(v) => *v != self.loading_message,
        }
    }

    /// Writes the value into its field and returns the previous value.
    fn assign(&mut self, value: StateValue) -> StateValue {
        match value {
            StateValue::CurrentFileType(v) => StateValue::CurrentFileType(
                std::mem::replace(&mut self.current_file_type, v),
            ),
            StateValue::CurrentImages(v) => {
                StateValue::CurrentImages(std::mem::replace(&mut self.current_images, v))
            }
            StateValue::PdfDoc(v) => {
                StateValue::PdfDoc(std::mem::replace(&mut self.pdf_doc, v))
            }
            StateValue::CurrentPage(v) => {
                StateValue::CurrentPage(std::mem::replace(&mut self.current_page, v))
            }
            StateValue::TotalPages(v) => {
                StateValue::TotalPages(std::mem::replace(&mut self.total_pages, v))
            }
            StateValue::CurrentFileName(v) => {
                StateValue::CurrentFileName(std::mem::replace(&mut self.current_file_name, v))
            }
            StateValue::IsViewerVisible(v) => {
                StateValue::IsViewerVisible(std::mem::replace(&mut self.is_viewer_visible, v))
            }
            StateValue::IsUploadScreenVisible(v) => StateValue::IsUploadScreenVisible(
                std::mem::replace(&mut self.is_upload_screen_visible, v),
            ),
            StateValue::IsLoaderVisible(v) => {
                StateValue::IsLoaderVisible(std::mem::replace(&mut self.is_loader_visible, v))
            }
            StateValue::LoadingMessage(v) => {
                StateValue::LoadingMessage(std::mem::replace(&mut self.loading_message, v))
            }
        }
    }

    fn notify_key(&mut self, key: StateKey, value: &StateValue, old_value: &StateValue) {
        if let Some(subscribers) = self.key_listeners.get_mut(&key) {
            for (_, callback) in subscribers.iter_mut() {
                callback(value, old_value);
            }
        }
    }

    fn notify_batch(&mut self, changes: &[StateChange]) {
        for (_, callback) in self.batch_listeners.iter_mut() {
            callback(changes);
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn page_listener(log: &Rc<RefCell<Vec<(usize, usize)>>>) -> KeyListener {
        let log = log.clone();
        Box::new(move |new, old| {
            if let (StateValue::CurrentPage(n), StateValue::CurrentPage(o)) = (new, old) {
                log.borrow_mut().push((*n, *o));
            }
        })
    }

    #[test]
    fn set_notifies_with_new_and_old() {
        let mut state = AppState::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        state.on(StateKey::CurrentPage, page_listener(&log));

        state.set(StateValue::CurrentPage(3));
        state.set(StateValue::CurrentPage(7));
        assert_eq!(*log.borrow(), vec![(3, 0), (7, 3)]);
    }

    #[test]
    fn set_fires_even_when_the_value_is_unchanged() {
        let mut state = AppState::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        state.on(StateKey::CurrentPage, page_listener(&log));

        state.set(StateValue::CurrentPage(0));
        assert_eq!(*log.borrow(), vec![(0, 0)]);
    }

    #[test]
    fn set_many_skips_unchanged_keys_entirely() {
        let mut state = AppState::new();
        let page_log = Rc::new(RefCell::new(Vec::new()));
        state.on(StateKey::CurrentPage, page_listener(&page_log));

        let batches = Rc::new(RefCell::new(0usize));
        let batches_clone = batches.clone();
        state.on_change(Box::new(move |_| *batches_clone.borrow_mut() += 1));

        state.set_many(vec![
            StateValue::CurrentPage(0),
            StateValue::TotalPages(0),
            StateValue::IsLoaderVisible(false),
        ]);
        assert!(page_log.borrow().is_empty());
        assert_eq!(*batches.borrow(), 0);
    }

    #[test]
    fn set_many_applies_all_before_notifying() {
        let mut state = AppState::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let seen_clone = seen.clone();
        state.on_change(Box::new(move |changes| {
            seen_clone
                .borrow_mut()
                .extend(changes.iter().map(|c| c.key));
        }));

        state.set_many(vec![
            StateValue::TotalPages(12),
            StateValue::CurrentPage(4),
        ]);
        assert_eq!(
            *seen.borrow(),
            vec![StateKey::TotalPages, StateKey::CurrentPage]
        );
        assert_eq!(state.total_pages(), 12);
        assert_eq!(state.current_page(), 4);
    }

    #[test]
    fn duplicate_registrations_both_fire_in_order() {
        let mut state = AppState::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        for tag in ["first", "second"] {
            let order = order.clone();
            state.on(
                StateKey::TotalPages,
                Box::new(move |_, _| order.borrow_mut().push(tag)),
            );
        }

        state.set(StateValue::TotalPages(2));
        assert_eq!(*order.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn off_removes_only_the_given_subscription() {
        let mut state = AppState::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let id = state.on(StateKey::CurrentPage, page_listener(&log));
        state.on(StateKey::CurrentPage, page_listener(&log));
        state.off(StateKey::CurrentPage, id);

        state.set(StateValue::CurrentPage(1));
        assert_eq!(log.borrow().len(), 1);

        // Removing again is a no-op.
        state.off(StateKey::CurrentPage, id);
    }

    #[test]
    fn navigate_stays_inside_bounds() {
        let mut state = AppState::new();
        state.set(StateValue::TotalPages(5));
        state.set(StateValue::CurrentPage(4));

        state.navigate(1);
        assert_eq!(state.current_page(), 4);

        state.navigate(-1);
        assert_eq!(state.current_page(), 3);

        state.set(StateValue::CurrentPage(0));
        state.navigate(-1);
        assert_eq!(state.current_page(), 0);
    }

    #[test]
    fn go_to_page_validates_its_one_based_range() {
        let mut state = AppState::new();
        state.set(StateValue::TotalPages(3));
        state.set(StateValue::CurrentPage(2));

        assert!(!state.go_to_page(0));
        assert_eq!(state.current_page(), 2);
        assert!(!state.go_to_page(4));
        assert_eq!(state.current_page(), 2);

        assert!(state.go_to_page(1));
        assert_eq!(state.current_page(), 0);
    }

    #[test]
    fn visibility_transitions_keep_the_invariant() {
        let mut state = AppState::new();

        state.show_loader("working");
        assert!(state.is_loader_visible());
        assert!(!state.is_upload_screen_visible());
        assert_eq!(state.loading_message(), "working");

        state.show_viewer();
        assert!(state.is_viewer_visible());
        assert!(!state.is_upload_screen_visible());
        assert!(!state.is_loader_visible());

        state.show_upload_screen();
        assert!(!state.is_viewer_visible());
        assert!(state.is_upload_screen_visible());
        assert!(!state.is_loader_visible());
    }

    #[test]
    fn reset_preserves_listeners_and_loading_message() {
        let mut state = AppState::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        state.on(StateKey::CurrentPage, page_listener(&log));

        state.set(StateValue::TotalPages(9));
        state.set(StateValue::CurrentPage(5));
        state.set(StateValue::LoadingMessage("custom".into()));
        state.reset();

        assert_eq!(state.current_page(), 0);
        assert_eq!(state.total_pages(), 0);
        assert_eq!(state.loading_message(), "custom");

        // Listener registered before reset saw the reset and still fires.
        state.set(StateValue::CurrentPage(2));
        assert_eq!(*log.borrow(), vec![(5, 0), (0, 5), (2, 0)]);
    }
}
