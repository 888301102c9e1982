//! Application state shared across request handlers.

use std::sync::Arc;

use dispatch_kitchen::Kitchen;

/// Shared application state.
///
/// This is passed to all request handlers via Axum's state extractor.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    kitchen: Arc<Kitchen>,
}

impl AppState {
    /// Create a new application state around a shared kitchen.
    pub fn new(kitchen: Arc<Kitchen>) -> Self {
        Self {
            inner: Arc::new(AppStateInner { kitchen }),
        }
    }

    /// Get a reference to the kitchen.
    pub fn kitchen(&self) -> &Kitchen {
        &self.inner.kitchen
    }
}
