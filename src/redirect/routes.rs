use axum::{routing::get, Router};
use std::sync::Arc;

use crate::state::AppState;

use super::handlers::redirect_url;

/// Public `/u/{id}` routes; no session required
pub fn create_redirect_router() -> Router<Arc<AppState>> {
    Router::new().route("/u/{id}", get(redirect_url))
}
