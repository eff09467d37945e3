use crate::models::{Account, ShortLink};
use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("email is already registered")]
    DuplicateEmail,
    #[error("identifier already exists")]
    DuplicateId,
    #[error("entity belongs to another account")]
    NotOwner,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

#[async_trait]
pub trait Storage: Send + Sync {
    /// Insert a new account. Rejects a taken email or id without writing anything.
    async fn create_account(&self, account: Account) -> StorageResult<Account>;

    /// Get an account by id
    async fn get_account(&self, id: &str) -> Result<Option<Account>>;

    /// Get the account registered with this exact email
    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>>;

    /// Insert a new short link. Rejects an id that is already in use.
    async fn create_link(&self, link: ShortLink) -> StorageResult<ShortLink>;

    /// Get a short link by id, regardless of owner
    async fn get_link(&self, id: &str) -> Result<Option<ShortLink>>;

    /// Replace the destination of a link owned by `owner_id`. Returns false if
    /// the link does not exist and `NotOwner` if someone else owns it.
    async fn update_link_url(
        &self,
        id: &str,
        owner_id: &str,
        long_url: &str,
    ) -> StorageResult<bool>;

    /// Remove a link owned by `owner_id`. Returns false if the link does not
    /// exist and `NotOwner` if someone else owns it.
    async fn delete_link(&self, id: &str, owner_id: &str) -> StorageResult<bool>;

    /// All links owned by the account, oldest first
    async fn list_links_by_owner(&self, owner_id: &str) -> Result<Vec<ShortLink>>;

    async fn count_accounts(&self) -> Result<usize>;

    async fn count_links(&self) -> Result<usize>;
}
