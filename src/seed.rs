//! Demo accounts and links for local development.

use anyhow::{Context, Result};
use tracing::info;

use crate::auth::password::hash_password;
use crate::models::{Account, ShortLink};
use crate::storage::{Storage, StorageError};

const DEMO_ACCOUNTS: &[(&str, &str, &str)] = &[
    ("userRandomID", "user@example.com", "purple-monkey-dinosaur"),
    ("user2RandomID", "user2@example.com", "dishwasher-funk"),
];

const DEMO_LINKS: &[(&str, &str, &str)] = &[
    ("b6UTxQ", "https://www.tsn.ca", "userRandomID"),
    ("i3BoGr", "https://www.google.ca", "userRandomID"),
];

/// Insert the demo data. Entries that already exist are left untouched.
pub async fn seed_demo_data(storage: &dyn Storage) -> Result<()> {
    let now = chrono::Utc::now().timestamp();

    for (id, email, password) in DEMO_ACCOUNTS {
        let account = Account {
            id: id.to_string(),
            email: email.to_string(),
            password_hash: hash_password(password)?,
            created_at: now,
        };
        match storage.create_account(account).await {
            Ok(_)
            | Err(StorageError::DuplicateEmail)
            | Err(StorageError::DuplicateId)
            | Err(StorageError::NotOwner) => {}
            Err(StorageError::Other(e)) => return Err(e).context("failed to seed demo account"),
        }
    }

    for (id, long_url, owner_id) in DEMO_LINKS {
        let link = ShortLink {
            id: id.to_string(),
            long_url: long_url.to_string(),
            owner_id: owner_id.to_string(),
            created_at: now,
        };
        match storage.create_link(link).await {
            Ok(_)
            | Err(StorageError::DuplicateId)
            | Err(StorageError::DuplicateEmail)
            | Err(StorageError::NotOwner) => {}
            Err(StorageError::Other(e)) => return Err(e).context("failed to seed demo link"),
        }
    }

    info!(
        accounts = DEMO_ACCOUNTS.len(),
        links = DEMO_LINKS.len(),
        "seeded demo data"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::verify_password;
    use crate::storage::MemoryStorage;

    #[tokio::test]
    async fn seeds_accounts_and_owned_links() {
        let storage = MemoryStorage::new();
        seed_demo_data(&storage).await.unwrap();

        let user = storage
            .find_account_by_email("user@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.id, "userRandomID");
        assert!(verify_password("purple-monkey-dinosaur", &user.password_hash).unwrap());

        let links = storage.list_links_by_owner("userRandomID").await.unwrap();
        assert_eq!(links.len(), 2);
        assert!(storage
            .list_links_by_owner("user2RandomID")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn seeding_twice_is_harmless() {
        let storage = MemoryStorage::new();
        seed_demo_data(&storage).await.unwrap();
        seed_demo_data(&storage).await.unwrap();
        assert_eq!(storage.count_accounts().await.unwrap(), 2);
        assert_eq!(storage.count_links().await.unwrap(), 2);
    }
}
