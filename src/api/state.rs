use std::sync::Arc;

use tokio::sync::RwLock;

use crate::services::{providers::RecommendationProvider, session::Session};

/// Shared application state
///
/// The session is the sole mutable state in the process; the provider is
/// constructed once at startup and reused for the process lifetime.
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<RwLock<Session>>,
    pub provider: Arc<dyn RecommendationProvider>,
}

impl AppState {
    /// Creates application state around a dependency-injected provider.
    pub fn new(provider: Arc<dyn RecommendationProvider>) -> Self {
        Self {
            session: Arc::new(RwLock::new(Session::new())),
            provider,
        }
    }
}
