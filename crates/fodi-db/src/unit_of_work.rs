//! # Unit of Work
//!
//! [`LedgerTx`] wraps one open SQLite transaction. It is only ever handed out
//! by [`Database::with_transaction`](crate::Database::with_transaction), which
//! owns the begin/commit/rollback decision.
//!
//! The ledger operations themselves live next to their repositories
//! (`impl LedgerTx` blocks in `repository/*`), so the SQL for a table stays in
//! one file whether it runs on the pool or inside a unit.

use sqlx::{Sqlite, SqliteConnection, Transaction};

use crate::error::{DbError, DbResult};

/// An open ledger transaction.
pub struct LedgerTx {
    tx: Transaction<'static, Sqlite>,
}

impl std::fmt::Debug for LedgerTx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerTx").finish_non_exhaustive()
    }
}

impl LedgerTx {
    pub(crate) fn new(tx: Transaction<'static, Sqlite>) -> Self {
        LedgerTx { tx }
    }

    /// Raw connection for queries not covered by the ledger methods.
    pub fn conn(&mut self) -> &mut SqliteConnection {
        &mut self.tx
    }

    pub(crate) async fn commit(self) -> DbResult<()> {
        self.tx
            .commit()
            .await
            .map_err(DbError::from)
    }

    pub(crate) async fn rollback(self) -> DbResult<()> {
        self.tx
            .rollback()
            .await
            .map_err(DbError::from)
    }
}
