use tracing::info;

use crate::auth::password;
use crate::error::AppError;
use crate::models::{Account, Credentials};
use crate::service::helpers::{get_account_by_email, with_fresh_identifier};
use crate::state::AppState;

fn invalid_credentials() -> AppError {
    AppError::InvalidCredentials("Invalid email or password. Please try again.".to_string())
}

/// Create an account. The caller establishes the session on success.
pub async fn register(state: &AppState, credentials: Credentials) -> Result<Account, AppError> {
    let email = credentials.email.trim().to_string();
    if email.is_empty() || credentials.password.is_empty() {
        return Err(AppError::Validation(
            "Please fill both email and password fields.".to_string(),
        ));
    }

    // Fast path; the store enforces uniqueness atomically below.
    if get_account_by_email(state.storage.as_ref(), &email)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(
            "Email already exists. Please try a different email.".to_string(),
        ));
    }

    let password_hash = password::hash_password(&credentials.password)?;
    let created_at = chrono::Utc::now().timestamp();
    let storage = state.storage.as_ref();

    let account = with_fresh_identifier(&state.short_id, |id| {
        storage.create_account(Account {
            id,
            email: email.clone(),
            password_hash: password_hash.clone(),
            created_at,
        })
    })
    .await?;

    info!(account_id = %account.id, "registered account");
    Ok(account)
}

/// Check credentials and return the matching account
pub async fn login(state: &AppState, credentials: Credentials) -> Result<Account, AppError> {
    let Some(account) =
        get_account_by_email(state.storage.as_ref(), credentials.email.trim()).await?
    else {
        return Err(invalid_credentials());
    };

    if !password::verify_password(&credentials.password, &account.password_hash)? {
        return Err(invalid_credentials());
    }

    info!(account_id = %account.id, "account logged in");
    Ok(account)
}
