use std::sync::Arc;

use crate::config::AuthConfig;
use crate::database::Database;

/// Shared application state passed to all Axum handlers via `.with_state()`.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub auth: Arc<AuthConfig>,
}

impl AppState {
    pub fn new(db: Database, auth: AuthConfig) -> Self {
        Self {
            db,
            auth: Arc::new(auth),
        }
    }
}
