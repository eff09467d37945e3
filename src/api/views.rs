use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use rust_embed::RustEmbed;

#[derive(RustEmbed)]
#[folder = "views"]
struct Views;

/// Serve an embedded HTML form
pub fn render(name: &str) -> Response {
    match Views::get(name) {
        Some(file) => Html(file.data.into_owned()).into_response(),
        None => {
            tracing::error!(view = name, "embedded view is missing");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
        }
    }
}
