use asi_core::BigramStore;
use std::sync::Arc;

/// Shared application state, handed to every handler behind an `Arc`.
///
/// `database` and `backend` are the labels echoed in the `meta` block of
/// every successful response; they describe the store implementation in
/// use, not the request.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn BigramStore>,
    pub database: String,
    pub backend: String,
}

impl AppState {
    pub fn new(store: Arc<dyn BigramStore>, database: String, backend: String) -> Self {
        Self {
            store,
            database,
            backend,
        }
    }
}
