use axum::{
    extract::Request,
    middleware::{self, Next},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::auth::session_middleware;
use crate::redirect::create_redirect_router;
use crate::state::AppState;

use super::handlers::{
    create_url, delete_url, health_check, list_urls, login, login_page, logout, new_url_page,
    register, register_page, root, show_url, update_url,
};

/// Full application router: account pages, link management and public redirects
pub fn create_app(state: Arc<AppState>) -> Router {
    let auth_service = Arc::clone(&state.auth);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/login", get(login_page).post(login))
        .route("/register", get(register_page).post(register))
        .route("/logout", post(logout))
        .route("/urls", get(list_urls).post(create_url))
        .route("/urls/new", get(new_url_page))
        .route("/urls/{id}", get(show_url).post(update_url))
        .route("/urls/{id}/delete", post(delete_url))
        .merge(create_redirect_router())
        .layer(middleware::from_fn(move |request: Request, next: Next| {
            let auth = Arc::clone(&auth_service);
            session_middleware(auth, request, next)
        }))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
