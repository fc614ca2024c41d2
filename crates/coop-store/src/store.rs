//! Atomic unit-of-work over [`Tables`].
//!
//! A transaction runs its closure against a private working copy while
//! holding the store lock. `Ok` publishes the copy, `Err` discards it, so a
//! failed operation leaves no partial state. Holding the lock for the whole
//! closure also serializes read-then-delete sequences: two callers racing on
//! the same intent run one after the other, and the second sees it gone.

use std::sync::{Mutex, MutexGuard};

use coop_types::{CoopError, ErrorCode, Result};

use crate::Tables;

/// In-process record store with serializable transactions.
#[derive(Debug, Default)]
pub struct Store {
    tables: Mutex<Tables>,
}

impl Store {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` as one atomic transaction.
    pub fn transaction<T>(&self, f: impl FnOnce(&mut Tables) -> Result<T>) -> Result<T> {
        let mut guard = self.lock()?;
        let mut working = guard.clone();
        match f(&mut working) {
            Ok(value) => {
                *guard = working;
                Ok(value)
            }
            Err(err) => {
                tracing::debug!(code = %err.code(), "Store transaction rolled back");
                Err(err)
            }
        }
    }

    /// Run a read-only closure against the committed state.
    pub fn read<T>(&self, f: impl FnOnce(&Tables) -> Result<T>) -> Result<T> {
        let guard = self.lock()?;
        f(&guard)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| CoopError::internal(ErrorCode::IntStore, "store lock poisoned"))
    }
}
