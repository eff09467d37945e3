use axum::{
    extract::{Path, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::error::AppError;
use crate::service::{helpers::location_for, links};
use crate::state::AppState;

/// Redirect to the stored destination
pub async fn redirect_url(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let destination = links::resolve(&state, &id).await?;

    let location = location_for(&destination)
        .and_then(|value| HeaderValue::from_str(&value).ok())
        .ok_or_else(|| {
            AppError::Validation(
                "This short URL points to an unsupported destination.".to_string(),
            )
        })?;

    tracing::debug!(short_id = %id, "redirecting");
    Ok((
        state.redirect_status.status_code(),
        [(header::LOCATION, location)],
    )
        .into_response())
}
