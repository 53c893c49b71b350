// src/handlers/mod.rs
use std::sync::Arc;

use crate::services::db::LatestStore;
use crate::services::providers::TextGenerator;

pub mod error;
pub mod health;
pub mod insights;
pub mod latest;

/// What a request handler may touch: the store and the text generator.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn LatestStore>,
    pub generator: Arc<dyn TextGenerator>,
}
