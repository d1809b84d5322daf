//! Async access to a [`Database`].
//!
//! `rusqlite` is synchronous, so every call is moved onto tokio's blocking
//! pool. The connection mutex is taken inside that blocking task and released
//! when the closure returns; it is never held across an `.await`.

use std::sync::{Arc, Mutex};

use crate::database::Database;
use crate::error::{Result, StoreError};

/// Cloneable handle to one [`Database`] shared between tasks.
#[derive(Clone)]
pub struct SharedDatabase {
    inner: Arc<Mutex<Database>>,
}

impl SharedDatabase {
    pub fn new(db: Database) -> Self {
        Self {
            inner: Arc::new(Mutex::new(db)),
        }
    }

    /// Run `f` against the database on the blocking pool.
    pub async fn call<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Database) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || {
            let db = inner
                .lock()
                .map_err(|_| StoreError::Blocking("database lock poisoned".into()))?;
            f(&*db)
        })
        .await
        .map_err(|e| StoreError::Blocking(e.to_string()))?
    }
}
