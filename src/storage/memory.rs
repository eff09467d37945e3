use crate::models::{Account, ShortLink};
use crate::storage::{Storage, StorageError, StorageResult};
use anyhow::Result;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Volatile storage held entirely in process memory.
///
/// Lock order is always `emails` before `accounts`, so account creation can
/// reserve the email and the id together.
#[derive(Default)]
pub struct MemoryStorage {
    accounts: DashMap<String, Account>,
    /// email -> account id
    emails: DashMap<String, String>,
    links: DashMap<String, ShortLink>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn create_account(&self, account: Account) -> StorageResult<Account> {
        let email_slot = match self.emails.entry(account.email.clone()) {
            Entry::Occupied(_) => return Err(StorageError::DuplicateEmail),
            Entry::Vacant(slot) => slot,
        };

        match self.accounts.entry(account.id.clone()) {
            Entry::Occupied(_) => Err(StorageError::DuplicateId),
            Entry::Vacant(slot) => {
                slot.insert(account.clone());
                email_slot.insert(account.id.clone());
                Ok(account)
            }
        }
    }

    async fn get_account(&self, id: &str) -> Result<Option<Account>> {
        Ok(self.accounts.get(id).map(|entry| entry.value().clone()))
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>> {
        let Some(id) = self.emails.get(email).map(|entry| entry.value().clone()) else {
            return Ok(None);
        };
        self.get_account(&id).await
    }

    async fn create_link(&self, link: ShortLink) -> StorageResult<ShortLink> {
        match self.links.entry(link.id.clone()) {
            Entry::Occupied(_) => Err(StorageError::DuplicateId),
            Entry::Vacant(slot) => {
                slot.insert(link.clone());
                Ok(link)
            }
        }
    }

    async fn get_link(&self, id: &str) -> Result<Option<ShortLink>> {
        Ok(self.links.get(id).map(|entry| entry.value().clone()))
    }

    async fn update_link_url(
        &self,
        id: &str,
        owner_id: &str,
        long_url: &str,
    ) -> StorageResult<bool> {
        // The shard write lock is held across the owner check and the write
        match self.links.get_mut(id) {
            Some(entry) if entry.owner_id != owner_id => Err(StorageError::NotOwner),
            Some(mut entry) => {
                entry.long_url = long_url.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_link(&self, id: &str, owner_id: &str) -> StorageResult<bool> {
        match self.links.entry(id.to_string()) {
            Entry::Occupied(entry) if entry.get().owner_id != owner_id => {
                Err(StorageError::NotOwner)
            }
            Entry::Occupied(entry) => {
                entry.remove();
                Ok(true)
            }
            Entry::Vacant(_) => Ok(false),
        }
    }

    async fn list_links_by_owner(&self, owner_id: &str) -> Result<Vec<ShortLink>> {
        let mut links = self
            .links
            .iter()
            .filter(|entry| entry.owner_id == owner_id)
            .map(|entry| entry.value().clone())
            .collect::<Vec<_>>();

        links.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(links)
    }

    async fn count_accounts(&self) -> Result<usize> {
        Ok(self.accounts.len())
    }

    async fn count_links(&self) -> Result<usize> {
        Ok(self.links.len())
    }
}
