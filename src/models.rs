use crate::config::Config;
use crate::storage::ObjectStore;
use std::sync::Arc;

/// Shared state handed to every route.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ObjectStore>,
    pub config: Config,
}

impl AppState {
    pub fn new(store: Arc<dyn ObjectStore>, config: Config) -> Self {
        Self { store, config }
    }
}
