//! Page and account store interfaces.
//!
//! The cache only needs two operations on pages (get by name, put) and one
//! on accounts (list). Keeping the seams this narrow lets the revalidation
//! logic run against in-memory fakes.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use dropweb_common::{Account, Error, PageName, Result};

use crate::page::Page;

/// Persistence of page records keyed by name.
#[async_trait]
pub trait PageStore: Send + Sync {
    /// Load the record for `name`, if one was ever stored.
    async fn get(&self, name: &PageName) -> Result<Option<Page>>;

    /// Insert or replace the record for `page.name()`.
    ///
    /// # Postconditions
    /// - A later `get` returns a record equal to `page`
    async fn put(&self, page: &Page) -> Result<()>;
}

/// Source of publishing accounts.
#[async_trait]
pub trait AccountSource: Send + Sync {
    /// All configured accounts.
    async fn accounts(&self) -> Result<Vec<Account>>;

    /// The single configured account.
    ///
    /// # Errors
    /// - `Error::Configuration` if zero or more than one account exists, or
    ///   if the account's URL template has no placeholder
    async fn load_account(&self) -> Result<Account> {
        let mut accounts = self.accounts().await?;
        match accounts.len() {
            0 => Err(Error::Configuration("No account configured".to_string())),
            1 => {
                let account = accounts.remove(0);
                account.validate()?;
                Ok(account)
            }
            n => Err(Error::Configuration(format!(
                "Expected exactly one account, found {}",
                n
            ))),
        }
    }
}

/// In-memory page store.
///
/// Useful for testing. All records are lost on drop.
#[derive(Default)]
pub struct MemoryPageStore {
    pages: RwLock<HashMap<PageName, Page>>,
}

impl MemoryPageStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.pages.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl PageStore for MemoryPageStore {
    async fn get(&self, name: &PageName) -> Result<Option<Page>> {
        let pages = self.pages.read().unwrap_or_else(|e| e.into_inner());
        Ok(pages.get(name).cloned())
    }

    async fn put(&self, page: &Page) -> Result<()> {
        let mut pages = self.pages.write().unwrap_or_else(|e| e.into_inner());
        pages.insert(page.name().clone(), page.clone());
        Ok(())
    }
}

/// Fixed list of accounts, typically read from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticAccounts {
    accounts: Vec<Account>,
}

impl StaticAccounts {
    pub fn new(accounts: Vec<Account>) -> Self {
        Self { accounts }
    }

    /// Exactly one account.
    pub fn single(account: Account) -> Self {
        Self::new(vec![account])
    }
}

#[async_trait]
impl AccountSource for StaticAccounts {
    async fn accounts(&self) -> Result<Vec<Account>> {
        Ok(self.accounts.clone())
    }
}
