//! HTTP API for the chat server

mod assets;
mod handlers;
mod types;

pub use handlers::create_router;

use crate::config::Pages;
use crate::engine::ProductionEngine;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ProductionEngine>,
    pub pages: Arc<Pages>,
}

impl AppState {
    pub fn new(engine: ProductionEngine, pages: Pages) -> Self {
        Self {
            engine: Arc::new(engine),
            pages: Arc::new(pages),
        }
    }
}
