//! Controller - A named set of pages with one selected page.
//!
//! The selection is a `Signal<usize>`, so effects created by gears re-run
//! when the page changes. An untracked copy of the selection is kept for
//! readers that must not subscribe (listeners running inside effects).
//!
//! # Example
//!
//! ```ignore
//! use spark_relations::state::Controller;
//!
//! let state = Controller::new("state", &["up", "down"]);
//! state.select_by_name("down");
//! assert_eq!(state.selected_page(), 1);
//! ```

use std::cell::Cell;
use std::rc::Rc;

use spark_signals::{signal, Signal};

struct ControllerInner {
    name: String,
    pages: Vec<String>,
    selected: Signal<usize>,
    selected_page: Cell<usize>,
}

/// Shared handle to a controller. Cloning is cheap.
#[derive(Clone)]
pub struct Controller {
    inner: Rc<ControllerInner>,
}

impl Controller {
    /// Create a controller. Page 0 starts selected.
    pub fn new(name: &str, pages: &[&str]) -> Self {
        Self {
            inner: Rc::new(ControllerInner {
                name: name.to_string(),
                pages: pages.iter().map(|page| page.to_string()).collect(),
                selected: signal(0),
                selected_page: Cell::new(0),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn page_count(&self) -> usize {
        self.inner.pages.len()
    }

    pub fn page_name(&self, page: usize) -> Option<&str> {
        self.inner.pages.get(page).map(String::as_str)
    }

    pub fn page_index(&self, name: &str) -> Option<usize> {
        self.inner.pages.iter().position(|page| page == name)
    }

    /// Select a page. Out-of-range pages are ignored.
    pub fn select(&self, page: usize) {
        if page >= self.page_count() || page == self.inner.selected_page.get() {
            return;
        }
        tracing::debug!(controller = %self.inner.name, page, "page selected");
        self.inner.selected_page.set(page);
        self.inner.selected.set(page);
    }

    /// Select a page by name. Unknown names are ignored.
    pub fn select_by_name(&self, name: &str) {
        if let Some(page) = self.page_index(name) {
            self.select(page);
        }
    }

    /// Selected page without subscribing.
    pub fn selected_page(&self) -> usize {
        self.inner.selected_page.get()
    }

    /// The selection signal. Reading it inside an effect subscribes.
    pub fn selected_signal(&self) -> Signal<usize> {
        self.inner.selected.clone()
    }

    /// Whether two handles point at the same controller.
    pub fn ptr_eq(&self, other: &Controller) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("name", &self.inner.name)
            .field("pages", &self.inner.pages)
            .field("selected", &self.inner.selected_page.get())
            .finish()
    }
}
