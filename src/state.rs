use std::sync::Arc;

use crate::auth::AuthService;
use crate::config::{Config, RedirectMode, ShortIdConfig};
use crate::storage::Storage;

/// Shared state handed to every handler
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub auth: Arc<AuthService>,
    pub short_id: ShortIdConfig,
    pub redirect_status: RedirectMode,
}

impl AppState {
    pub fn new(storage: Arc<dyn Storage>, auth: Arc<AuthService>, config: &Config) -> Self {
        Self {
            storage,
            auth,
            short_id: config.short_id.clone(),
            redirect_status: config.redirect_status,
        }
    }
}
