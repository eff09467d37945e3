use anyhow::{anyhow, Result};
use std::collections::BTreeMap;
use std::future::Future;
use tracing::debug;
use url::Url;

use crate::config::ShortIdConfig;
use crate::error::AppError;
use crate::models::{Account, ShortLink};
use crate::storage::{Storage, StorageError, StorageResult};

const IDENTIFIER_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Random lowercase alphanumeric identifier of the given length
pub fn generate_identifier(length: usize) -> String {
    use rand::RngExt;
    let mut rng = rand::rng();
    (0..length)
        .map(|_| IDENTIFIER_ALPHABET[rng.random_range(0..IDENTIFIER_ALPHABET.len())] as char)
        .collect()
}

/// Run `insert` with freshly generated identifiers until one is not taken.
///
/// Only `StorageError::DuplicateId` triggers a retry; every other outcome is
/// returned as is.
pub async fn with_fresh_identifier<T, F, Fut>(config: &ShortIdConfig, mut insert: F) -> Result<T, AppError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = StorageResult<T>>,
{
    for _ in 0..config.max_attempts {
        let id = generate_identifier(config.length);
        match insert(id.clone()).await {
            Err(StorageError::DuplicateId) => {
                debug!(id = %id, "identifier collision, regenerating");
            }
            other => return other.map_err(AppError::from),
        }
    }

    Err(AppError::Internal(anyhow!(
        "failed to generate a unique identifier after {} attempts",
        config.max_attempts
    )))
}

pub async fn get_account_by_email(storage: &dyn Storage, email: &str) -> Result<Option<Account>> {
    storage.find_account_by_email(email).await
}

/// Links owned by the account, keyed by short id
pub async fn urls_for_user(
    storage: &dyn Storage,
    account_id: &str,
) -> Result<BTreeMap<String, ShortLink>> {
    let links = storage.list_links_by_owner(account_id).await?;
    Ok(links
        .into_iter()
        .map(|link| (link.id.clone(), link))
        .collect())
}

/// Check a submitted destination and return the value to store.
pub fn validate_destination(raw: &str) -> Result<String, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("URL cannot be empty.".to_string()));
    }
    // The URL parser drops tabs and newlines; the stored string keeps them.
    if trimmed.chars().any(char::is_control) {
        return Err(AppError::Validation(
            "URL cannot contain control characters.".to_string(),
        ));
    }

    let parsed = Url::parse(trimmed).map_err(|_| {
        AppError::Validation(format!("'{trimmed}' is not a valid absolute URL."))
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(AppError::Validation(
            "Only http and https URLs can be shortened.".to_string(),
        ));
    }

    Ok(trimmed.to_string())
}

/// Whether a stored destination is safe to redirect to
pub fn is_redirectable(destination: &str) -> bool {
    if destination.chars().any(char::is_control) {
        return false;
    }
    Url::parse(destination)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// Destination as an ASCII `Location` value. Non-ASCII hosts are punycoded and
/// non-ASCII paths percent-encoded; ASCII destinations pass through unchanged.
pub fn location_for(destination: &str) -> Option<String> {
    if destination.is_ascii() {
        return Some(destination.to_string());
    }
    Url::parse(destination).ok().map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn link(id: &str, owner: &str) -> ShortLink {
        ShortLink {
            id: id.to_string(),
            long_url: "https://example.com".to_string(),
            owner_id: owner.to_string(),
            created_at: 0,
        }
    }

    #[test]
    fn generated_identifiers_are_lowercase_alphanumeric() {
        for length in [4, 6, 32] {
            let id = generate_identifier(length);
            assert_eq!(id.len(), length);
            assert!(id
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
        }
    }

    #[test]
    fn generated_identifiers_vary() {
        let ids: HashSet<String> = (0..100).map(|_| generate_identifier(6)).collect();
        assert!(ids.len() > 90);
    }

    #[tokio::test]
    async fn retries_on_collision_then_succeeds() {
        let calls = AtomicUsize::new(0);
        let config = ShortIdConfig {
            length: 6,
            max_attempts: 5,
        };

        let id = with_fresh_identifier(&config, |id| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(StorageError::DuplicateId)
                } else {
                    Ok(id)
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(id.len(), 6);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let config = ShortIdConfig {
            length: 6,
            max_attempts: 3,
        };
        let result: Result<String, AppError> =
            with_fresh_identifier(&config, |_| async { Err(StorageError::DuplicateId) }).await;
        assert!(matches!(result, Err(AppError::Internal(_))));
    }

    #[tokio::test]
    async fn other_storage_errors_are_not_retried() {
        let calls = AtomicUsize::new(0);
        let config = ShortIdConfig {
            length: 6,
            max_attempts: 5,
        };
        let result: Result<String, AppError> = with_fresh_identifier(&config, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(StorageError::DuplicateEmail) }
        })
        .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn urls_for_user_filters_exactly() {
        let storage = MemoryStorage::new();
        storage.create_link(link("aaaaaa", "alice")).await.unwrap();
        storage.create_link(link("bbbbbb", "bob")).await.unwrap();
        storage.create_link(link("cccccc", "alice")).await.unwrap();

        let alice = urls_for_user(&storage, "alice").await.unwrap();
        assert_eq!(
            alice.keys().cloned().collect::<Vec<_>>(),
            vec!["aaaaaa".to_string(), "cccccc".to_string()]
        );
        assert!(!alice.contains_key("bbbbbb"));
        assert!(urls_for_user(&storage, "nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn account_lookup_by_email() {
        let storage = MemoryStorage::new();
        storage
            .create_account(Account {
                id: "abc123".to_string(),
                email: "alice@example.com".to_string(),
                password_hash: String::new(),
                created_at: 0,
            })
            .await
            .unwrap();

        let found = get_account_by_email(&storage, "alice@example.com")
            .await
            .unwrap();
        assert_eq!(found.map(|a| a.id), Some("abc123".to_string()));
        assert!(get_account_by_email(&storage, "ALICE@example.com")
            .await
            .unwrap()
            .is_none());
    }

    #[test]
    fn destination_validation() {
        assert_eq!(
            validate_destination("  https://example.com ").unwrap(),
            "https://example.com"
        );
        assert!(validate_destination("http://localhost:8080/path?q=1").is_ok());
        assert!(matches!(
            validate_destination(""),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            validate_destination("example.com"),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            validate_destination("javascript:alert(1)"),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            validate_destination("ftp://example.com/file"),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn destinations_with_control_characters_are_rejected() {
        for raw in [
            "https://example.com/a\nb",
            "https://example.com/a\tb",
            "https://exa\rmple.com",
            "https://example.com/\u{7f}",
        ] {
            assert!(
                matches!(validate_destination(raw), Err(AppError::Validation(_))),
                "accepted {raw:?}"
            );
        }
        // Surrounding whitespace is still trimmed away
        assert!(validate_destination("\thttps://example.com\n").is_ok());
    }

    #[test]
    fn redirectable_destinations() {
        assert!(is_redirectable("https://www.tsn.ca"));
        assert!(!is_redirectable("javascript:alert(1)"));
        assert!(!is_redirectable("not a url"));
        assert!(!is_redirectable("https://example.com/a\nb"));
    }

    #[test]
    fn location_is_ascii() {
        assert_eq!(
            location_for("https://www.tsn.ca").as_deref(),
            Some("https://www.tsn.ca")
        );
        assert_eq!(
            location_for("https://example.com/caf\u{e9}").as_deref(),
            Some("https://example.com/caf%C3%A9")
        );
        assert_eq!(
            location_for("https://b\u{fc}cher.example/").as_deref(),
            Some("https://xn--bcher-kva.example/")
        );
    }
}
