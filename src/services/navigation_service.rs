//! Service for page navigation operations.
//!
//! Thin operations over the store's bounds-checked page mutations. UI
//! wiring (buttons, keys, swipes) are collaborators that merely invoke it.

use crate::state::StoreHandle;

/// Service for navigating between pages of the open document.
#[derive(Clone)]
pub struct NavigationService {
    store: StoreHandle,
}

impl NavigationService {
    /// Creates a new navigation service over the shared store.
    pub fn new(store: StoreHandle) -> Self {
        Self { store }
    }

    /// Advances to the next page, if one exists.
    pub fn next(&self) {
        self.store.lock().unwrap().navigate(1);
    }

    /// Returns to the previous page, if one exists.
    pub fn previous(&self) {
        self.store.lock().unwrap().navigate(-1);
    }

    /// Jumps to a 1-based page number. False when out of range.
    pub fn go_to_page(&self, page_number: usize) -> bool {
        self.store.lock().unwrap().go_to_page(page_number)
    }
}
