use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Redirect, Response},
    Extension, Form, Json,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::views;
use crate::auth::Session;
use crate::error::AppError;
use crate::models::{AccountSummary, Credentials, LinkForm, LinkView, ShortLink};
use crate::service::{accounts, links};
use crate::state::AppState;

#[derive(Serialize)]
pub struct SuccessResponse {
    pub message: String,
}

/// Body of `GET /urls`
#[derive(Serialize)]
pub struct UrlsResponse {
    pub user: AccountSummary,
    pub urls: BTreeMap<String, LinkView>,
}

fn redirect_with_session(state: &AppState, account_id: &str, to: &str) -> Result<Response, AppError> {
    let cookie = state.auth.issue_cookie(account_id)?;
    Ok(([(header::SET_COOKIE, cookie)], Redirect::to(to)).into_response())
}

/// Send logged-in callers to their links, everyone else to the login form
pub async fn root(Extension(session): Extension<Session>) -> Redirect {
    if session.is_authenticated() {
        Redirect::to("/urls")
    } else {
        Redirect::to("/login")
    }
}

pub async fn login_page(Extension(session): Extension<Session>) -> Response {
    if session.is_authenticated() {
        return Redirect::to("/urls").into_response();
    }
    views::render("login.html")
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Form(credentials): Form<Credentials>,
) -> Result<Response, AppError> {
    let account = accounts::login(&state, credentials).await?;
    redirect_with_session(&state, &account.id, "/urls")
}

pub async fn register_page(Extension(session): Extension<Session>) -> Response {
    if session.is_authenticated() {
        return Redirect::to("/urls").into_response();
    }
    views::render("register.html")
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Form(credentials): Form<Credentials>,
) -> Result<Response, AppError> {
    let account = accounts::register(&state, credentials).await?;
    redirect_with_session(&state, &account.id, "/urls")
}

/// Always succeeds, with or without a session
pub async fn logout(State(state): State<Arc<AppState>>) -> Response {
    (
        [(header::SET_COOKIE, state.auth.clear_cookie())],
        Redirect::to("/login"),
    )
        .into_response()
}

pub async fn list_urls(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Result<Json<UrlsResponse>, AppError> {
    let (account, owned) = links::list(&state, &session).await?;

    Ok(Json(UrlsResponse {
        user: AccountSummary::from(&account),
        urls: owned
            .iter()
            .map(|(id, link)| (id.clone(), LinkView::from(link)))
            .collect(),
    }))
}

pub async fn new_url_page(Extension(session): Extension<Session>) -> Response {
    if !session.is_authenticated() {
        return Redirect::to("/login").into_response();
    }
    views::render("urls_new.html")
}

pub async fn create_url(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Form(form): Form<LinkForm>,
) -> Result<Redirect, AppError> {
    let link = links::create(&state, &session, &form.long_url).await?;
    Ok(Redirect::to(&format!("/urls/{}", link.id)))
}

pub async fn show_url(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Result<Json<ShortLink>, AppError> {
    let link = links::detail(&state, &session, &id).await?;
    Ok(Json(link))
}

pub async fn update_url(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    Form(form): Form<LinkForm>,
) -> Result<Redirect, AppError> {
    links::update(&state, &session, &id, &form.long_url).await?;
    Ok(Redirect::to("/urls"))
}

pub async fn delete_url(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Result<Redirect, AppError> {
    links::delete(&state, &session, &id).await?;
    Ok(Redirect::to("/urls"))
}

/// Health check endpoint
pub async fn health_check() -> Json<SuccessResponse> {
    Json(SuccessResponse {
        message: "OK".to_string(),
    })
}
