//! Account Store seam.
//!
//! The engine only needs per-key atomic read-modify-write plus a two-key
//! variant for transfers and two-player wagers. Mutators run against a copy of
//! the stored accounts and the copy is committed only once they return, so a
//! failure or panic leaves the stored state untouched.

use arcade_types::{Account, UserId};
use std::{
    collections::HashMap,
    future::Future,
    sync::{Mutex, MutexGuard},
};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("account store unavailable: {0}")]
    Unavailable(String),
    #[error("cannot pair account {0} with itself")]
    SameAccount(UserId),
}

pub trait AccountStore: Send + Sync + 'static {
    fn get(&self, user: UserId) -> impl Future<Output = Result<Option<Account>, StoreError>> + Send;

    /// Create a zeroed account, or return the existing one.
    fn create(&self, user: UserId) -> impl Future<Output = Result<Account, StoreError>> + Send;

    /// Atomically mutate one account, creating it first if missing.
    fn update<T, F>(
        &self,
        user: UserId,
        mutator: F,
    ) -> impl Future<Output = Result<T, StoreError>> + Send
    where
        F: FnOnce(&mut Account) -> T + Send,
        T: Send;

    /// Atomically mutate two distinct accounts. Either both writes land or neither.
    fn update_pair<T, F>(
        &self,
        first: UserId,
        second: UserId,
        mutator: F,
    ) -> impl Future<Output = Result<T, StoreError>> + Send
    where
        F: FnOnce(&mut Account, &mut Account) -> T + Send,
        T: Send;

    /// Read an account, creating it with zeroed defaults when missing.
    fn load(&self, user: UserId) -> impl Future<Output = Result<Account, StoreError>> + Send {
        async move {
            match self.get(user).await? {
                Some(account) => Ok(account),
                None => self.create(user).await,
            }
        }
    }
}

/// In-process store.
#[derive(Default)]
pub struct MemoryStore {
    accounts: Mutex<HashMap<UserId, Account>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing accounts.
    pub fn with_accounts(accounts: impl IntoIterator<Item = Account>) -> Self {
        let accounts = accounts
            .into_iter()
            .map(|account| (account.user_id, account))
            .collect();
        Self {
            accounts: Mutex::new(accounts),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<UserId, Account>> {
        self.accounts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> Vec<Account> {
        let mut accounts: Vec<Account> = self.lock().values().cloned().collect();
        accounts.sort_by_key(|account| account.user_id);
        accounts
    }
}

impl AccountStore for MemoryStore {
    async fn get(&self, user: UserId) -> Result<Option<Account>, StoreError> {
        Ok(self.lock().get(&user).cloned())
    }

    async fn create(&self, user: UserId) -> Result<Account, StoreError> {
        Ok(self
            .lock()
            .entry(user)
            .or_insert_with(|| Account::new(user))
            .clone())
    }

    async fn update<T, F>(&self, user: UserId, mutator: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Account) -> T + Send,
        T: Send,
    {
        let mut accounts = self.lock();
        let mut next = accounts
            .get(&user)
            .cloned()
            .unwrap_or_else(|| Account::new(user));
        let out = mutator(&mut next);
        accounts.insert(user, next);
        Ok(out)
    }

    async fn update_pair<T, F>(&self, first: UserId, second: UserId, mutator: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Account, &mut Account) -> T + Send,
        T: Send,
    {
        if first == second {
            return Err(StoreError::SameAccount(first));
        }
        let mut accounts = self.lock();
        let mut a = accounts
            .get(&first)
            .cloned()
            .unwrap_or_else(|| Account::new(first));
        let mut b = accounts
            .get(&second)
            .cloned()
            .unwrap_or_else(|| Account::new(second));
        let out = mutator(&mut a, &mut b);
        accounts.insert(first, a);
        accounts.insert(second, b);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_creates_zeroed_account() {
        let store = MemoryStore::new();
        assert_eq!(store.get(UserId(1)).await.unwrap(), None);
        let account = store.load(UserId(1)).await.unwrap();
        assert_eq!(account, Account::new(UserId(1)));
        assert!(store.get(UserId(1)).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_update_returns_mutator_output() {
        let store = MemoryStore::new();
        let balance = store
            .update(UserId(1), |account| {
                account.balance += 25;
                account.balance
            })
            .await
            .unwrap();
        assert_eq!(balance, 25);
    }

    #[tokio::test]
    async fn test_update_pair_rejects_same_account() {
        let store = MemoryStore::new();
        let result = store.update_pair(UserId(1), UserId(1), |_, _| ()).await;
        assert_eq!(result, Err(StoreError::SameAccount(UserId(1))));
    }

    #[tokio::test]
    async fn test_panicking_mutator_leaves_state_untouched() {
        let store = std::sync::Arc::new(MemoryStore::new());
        store
            .update(UserId(1), |account| account.balance = 10)
            .await
            .unwrap();

        let task_store = store.clone();
        let result = tokio::spawn(async move {
            task_store
                .update(UserId(1), |account| {
                    account.balance = 99;
                    panic!("rule bug");
                })
                .await
        })
        .await;
        assert!(result.is_err());
        assert_eq!(store.load(UserId(1)).await.unwrap().balance, 10);
    }
}
