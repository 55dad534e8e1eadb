//! SQLite backed account store.
//!
//! Each account is one row in `accounts`, keyed by user id and holding the
//! account as a JSON document. Every mutation runs inside a single SQLite
//! transaction: the mutator sees the committed rows, and its result is only
//! visible once the transaction commits. A two-account update writes both
//! rows in the same transaction, so the database itself guarantees that both
//! land or neither does.

use arcade_execution::{AccountStore, StoreError};
use arcade_types::{Account, UserId};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::{
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum SqliteStoreError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: rusqlite::Error,
    },
    #[error("failed to initialise schema in {path}: {source}")]
    Schema {
        path: PathBuf,
        source: rusqlite::Error,
    },
}

pub struct SqliteStore {
    path: PathBuf,
    conn: Mutex<Connection>,
}

fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode=WAL;
         PRAGMA synchronous=NORMAL;
         CREATE TABLE IF NOT EXISTS accounts (
             user_id INTEGER PRIMARY KEY,
             account TEXT NOT NULL
         );",
    )
}

fn unavailable(err: impl std::fmt::Display) -> StoreError {
    StoreError::Unavailable(err.to_string())
}

fn read_account(tx: &Transaction<'_>, user: UserId) -> Result<Option<Account>, StoreError> {
    let row: Option<String> = tx
        .query_row(
            "SELECT account FROM accounts WHERE user_id = ?",
            params![user.0],
            |row| row.get(0),
        )
        .optional()
        .map_err(unavailable)?;
    row.map(|json| {
        serde_json::from_str(&json)
            .map_err(|err| StoreError::Unavailable(format!("decode account {user}: {err}")))
    })
    .transpose()
}

fn write_account(tx: &Transaction<'_>, account: &Account) -> Result<(), StoreError> {
    let json = serde_json::to_string(account)
        .map_err(|err| StoreError::Unavailable(format!("encode account {}: {err}", account.user_id)))?;
    tx.execute(
        "INSERT OR REPLACE INTO accounts (user_id, account) VALUES (?, ?)",
        params![account.user_id.0, json],
    )
    .map_err(unavailable)?;
    Ok(())
}

impl SqliteStore {
    /// Open (or create) the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SqliteStoreError> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path).map_err(|source| SqliteStoreError::Open {
            path: path.clone(),
            source,
        })?;
        init_schema(&conn).map_err(|source| SqliteStoreError::Schema {
            path: path.clone(),
            source,
        })?;
        let store = Self {
            path,
            conn: Mutex::new(conn),
        };
        info!(path = %store.path.display(), "account store opened");
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // A panicking mutator drops its transaction, which rolls back, so the
    // connection is still consistent after poisoning.
    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Number of stored accounts.
    pub fn len(&self) -> Result<u64, StoreError> {
        self.lock()
            .query_row("SELECT COUNT(*) FROM accounts", [], |row| row.get(0))
            .map_err(unavailable)
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    /// Run `op` inside one transaction, committing only if it succeeds.
    fn transact<T>(
        &self,
        op: impl FnOnce(&Transaction<'_>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut conn = self.lock();
        let tx = conn.transaction().map_err(unavailable)?;
        let out = op(&tx)?;
        tx.commit().map_err(unavailable)?;
        Ok(out)
    }
}

impl AccountStore for SqliteStore {
    async fn get(&self, user: UserId) -> Result<Option<Account>, StoreError> {
        self.transact(|tx| read_account(tx, user))
    }

    async fn create(&self, user: UserId) -> Result<Account, StoreError> {
        self.transact(|tx| {
            if let Some(existing) = read_account(tx, user)? {
                return Ok(existing);
            }
            let account = Account::new(user);
            write_account(tx, &account)?;
            Ok(account)
        })
    }

    async fn update<T, F>(&self, user: UserId, mutator: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Account) -> T + Send,
        T: Send,
    {
        self.transact(|tx| {
            let stored = read_account(tx, user)?;
            let mut next = stored.clone().unwrap_or_else(|| Account::new(user));
            let out = mutator(&mut next);
            if stored.as_ref() != Some(&next) {
                write_account(tx, &next)?;
            }
            Ok(out)
        })
    }

    async fn update_pair<T, F>(&self, first: UserId, second: UserId, mutator: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Account, &mut Account) -> T + Send,
        T: Send,
    {
        if first == second {
            return Err(StoreError::SameAccount(first));
        }
        self.transact(|tx| {
            let mut a = read_account(tx, first)?.unwrap_or_else(|| Account::new(first));
            let mut b = read_account(tx, second)?.unwrap_or_else(|| Account::new(second));
            let out = mutator(&mut a, &mut b);
            write_account(tx, &a)?;
            write_account(tx, &b)?;
            Ok(out)
        })
    }
}
