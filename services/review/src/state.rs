//! Application state shared across handlers

use common::ProcessStore;
use std::sync::Arc;

use crate::sessions::SessionRegistry;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ProcessStore>,
    pub sessions: SessionRegistry,
}
