//! Shared application state

use std::sync::Arc;

use purse_core::PurseContext;

/// State handed to every handler. Cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub ctx: Arc<PurseContext>,
}

impl AppState {
    pub fn new(ctx: Arc<PurseContext>) -> Self {
        Self { ctx }
    }
}
