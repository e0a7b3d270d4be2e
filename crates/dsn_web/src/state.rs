use std::sync::Arc;

use dsn_core::ArticleStorage;

/// Shared by every handler. The dashboard only reads from storage.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn ArticleStorage>,
}

impl AppState {
    pub fn new(storage: Arc<dyn ArticleStorage>) -> Self {
        Self { storage }
    }
}
