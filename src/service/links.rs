use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::auth::Session;
use crate::error::AppError;
use crate::models::{Account, ShortLink};
use crate::service::helpers::{
    is_redirectable, urls_for_user, validate_destination, with_fresh_identifier,
};
use crate::state::AppState;
use crate::storage::StorageError;

/// The caller's account, which must still exist
pub async fn current_account(state: &AppState, session: &Session) -> Result<Account, AppError> {
    let account_id = session.account_id().ok_or_else(AppError::not_logged_in)?;
    state
        .storage
        .get_account(account_id)
        .await?
        .ok_or_else(AppError::not_logged_in)
}

/// Existence, then session, then ownership. The order matters: a link that
/// exists globally is still refused unless the caller owns it.
async fn owned_link(state: &AppState, session: &Session, id: &str) -> Result<ShortLink, AppError> {
    let link = state
        .storage
        .get_link(id)
        .await?
        .ok_or_else(|| AppError::link_not_found(id))?;

    let account_id = session.account_id().ok_or_else(AppError::not_logged_in)?;

    let mine = urls_for_user(state.storage.as_ref(), account_id).await?;
    if !mine.contains_key(id) {
        return Err(AppError::link_forbidden(id));
    }

    Ok(link)
}

fn ownership_error(err: StorageError, id: &str) -> AppError {
    match err {
        StorageError::NotOwner => AppError::link_forbidden(id),
        other => other.into(),
    }
}

pub async fn list(
    state: &AppState,
    session: &Session,
) -> Result<(Account, BTreeMap<String, ShortLink>), AppError> {
    let account = current_account(state, session).await?;
    let links = urls_for_user(state.storage.as_ref(), &account.id).await?;
    Ok((account, links))
}

pub async fn create(state: &AppState, session: &Session, long_url: &str) -> Result<ShortLink, AppError> {
    let account = current_account(state, session).await?;
    let long_url = validate_destination(long_url)?;
    let created_at = chrono::Utc::now().timestamp();
    let storage = state.storage.as_ref();

    let link = with_fresh_identifier(&state.short_id, |id| {
        storage.create_link(ShortLink {
            id,
            long_url: long_url.clone(),
            owner_id: account.id.clone(),
            created_at,
        })
    })
    .await?;

    info!(short_id = %link.id, owner = %link.owner_id, "created short link");
    Ok(link)
}

pub async fn detail(state: &AppState, session: &Session, id: &str) -> Result<ShortLink, AppError> {
    owned_link(state, session, id).await
}

pub async fn update(
    state: &AppState,
    session: &Session,
    id: &str,
    long_url: &str,
) -> Result<ShortLink, AppError> {
    let mut link = owned_link(state, session, id).await?;
    let long_url = validate_destination(long_url)?;

    let updated = state
        .storage
        .update_link_url(id, &link.owner_id, &long_url)
        .await
        .map_err(|err| ownership_error(err, id))?;
    if !updated {
        return Err(AppError::link_not_found(id));
    }

    info!(short_id = %id, "updated short link");
    link.long_url = long_url;
    Ok(link)
}

pub async fn delete(state: &AppState, session: &Session, id: &str) -> Result<(), AppError> {
    let link = owned_link(state, session, id).await?;

    let deleted = state
        .storage
        .delete_link(id, &link.owner_id)
        .await
        .map_err(|err| ownership_error(err, id))?;
    if !deleted {
        return Err(AppError::link_not_found(id));
    }

    info!(short_id = %id, "deleted short link");
    Ok(())
}

/// Public lookup for `/u/:id`; no session involved
pub async fn resolve(state: &AppState, id: &str) -> Result<String, AppError> {
    let link = state
        .storage
        .get_link(id)
        .await?
        .ok_or_else(|| AppError::link_not_found(id))?;

    if !is_redirectable(&link.long_url) {
        warn!(short_id = %id, "refusing to redirect to a non-http destination");
        return Err(AppError::Validation(
            "This short URL points to an unsupported destination.".to_string(),
        ));
    }

    Ok(link.long_url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthService;
    use crate::config::Config;
    use crate::models::Credentials;
    use crate::service::accounts;
    use crate::storage::MemoryStorage;
    use std::sync::Arc;

    fn state() -> AppState {
        let mut config = Config::default();
        config.session.secret = Some("links-test".to_string());
        AppState::new(
            Arc::new(MemoryStorage::new()),
            Arc::new(AuthService::new(&config.session).unwrap()),
            &config,
        )
    }

    async fn signed_up(state: &AppState, email: &str) -> Session {
        let account = accounts::register(
            state,
            Credentials {
                email: email.to_string(),
                password: "pw".to_string(),
            },
        )
        .await
        .unwrap();
        Session::Authenticated(account.id)
    }

    #[tokio::test]
    async fn create_then_detail_shows_destination() {
        let state = state();
        let alice = signed_up(&state, "alice@example.com").await;

        let link = create(&state, &alice, "https://example.com").await.unwrap();
        assert_eq!(link.owner_id, alice.account_id().unwrap());

        let shown = detail(&state, &alice, &link.id).await.unwrap();
        assert_eq!(shown.long_url, "https://example.com");
    }

    #[tokio::test]
    async fn anonymous_callers_cannot_list_or_create() {
        let state = state();
        assert!(matches!(
            list(&state, &Session::Anonymous).await,
            Err(AppError::NotLoggedIn(_))
        ));
        assert!(matches!(
            create(&state, &Session::Anonymous, "https://example.com").await,
            Err(AppError::NotLoggedIn(_))
        ));
        assert_eq!(state.storage.count_links().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn session_for_unknown_account_is_not_logged_in() {
        let state = state();
        let ghost = Session::Authenticated("ghost1".to_string());
        assert!(matches!(
            create(&state, &ghost, "https://example.com").await,
            Err(AppError::NotLoggedIn(_))
        ));
    }

    #[tokio::test]
    async fn listing_contains_only_own_links() {
        let state = state();
        let alice = signed_up(&state, "alice@example.com").await;
        let bob = signed_up(&state, "bob@example.com").await;

        let a1 = create(&state, &alice, "https://a.example").await.unwrap();
        let a2 = create(&state, &alice, "https://b.example").await.unwrap();
        let b1 = create(&state, &bob, "https://c.example").await.unwrap();

        let (account, links) = list(&state, &alice).await.unwrap();
        assert_eq!(account.email, "alice@example.com");
        assert_eq!(links.len(), 2);
        assert!(links.contains_key(&a1.id));
        assert!(links.contains_key(&a2.id));
        assert!(!links.contains_key(&b1.id));
    }

    #[tokio::test]
    async fn check_order_is_existence_session_ownership() {
        let state = state();
        let alice = signed_up(&state, "alice@example.com").await;
        let bob = signed_up(&state, "bob@example.com").await;
        let link = create(&state, &alice, "https://example.com").await.unwrap();

        // Missing link wins over missing session
        assert!(matches!(
            detail(&state, &Session::Anonymous, "nope00").await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            detail(&state, &Session::Anonymous, &link.id).await,
            Err(AppError::NotLoggedIn(_))
        ));
        assert!(matches!(
            detail(&state, &bob, &link.id).await,
            Err(AppError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn only_owner_can_update_or_delete() {
        let state = state();
        let alice = signed_up(&state, "alice@example.com").await;
        let bob = signed_up(&state, "bob@example.com").await;
        let link = create(&state, &alice, "https://example.com").await.unwrap();

        assert!(matches!(
            update(&state, &bob, &link.id, "https://evil.example").await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            delete(&state, &bob, &link.id).await,
            Err(AppError::Forbidden(_))
        ));
        let unchanged = state.storage.get_link(&link.id).await.unwrap().unwrap();
        assert_eq!(unchanged.long_url, "https://example.com");

        let updated = update(&state, &alice, &link.id, "https://rust-lang.org")
            .await
            .unwrap();
        assert_eq!(updated.long_url, "https://rust-lang.org");
        assert_eq!(updated.owner_id, link.owner_id);

        delete(&state, &alice, &link.id).await.unwrap();
        assert!(state.storage.get_link(&link.id).await.unwrap().is_none());
        assert!(matches!(
            delete(&state, &alice, &link.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn update_rejects_bad_destination() {
        let state = state();
        let alice = signed_up(&state, "alice@example.com").await;
        let link = create(&state, &alice, "https://example.com").await.unwrap();

        assert!(matches!(
            update(&state, &alice, &link.id, "javascript:alert(1)").await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            create(&state, &alice, "").await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn resolve_is_public() {
        let state = state();
        let alice = signed_up(&state, "alice@example.com").await;
        let link = create(&state, &alice, "https://example.com").await.unwrap();

        assert_eq!(
            resolve(&state, &link.id).await.unwrap(),
            "https://example.com"
        );
        assert!(matches!(
            resolve(&state, "unknwn").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn resolve_refuses_script_destinations() {
        let state = state();
        state
            .storage
            .create_link(ShortLink {
                id: "legacy".to_string(),
                long_url: "javascript:alert(1)".to_string(),
                owner_id: "someone".to_string(),
                created_at: 0,
            })
            .await
            .unwrap();

        assert!(matches!(
            resolve(&state, "legacy").await,
            Err(AppError::Validation(_))
        ));
    }
}
