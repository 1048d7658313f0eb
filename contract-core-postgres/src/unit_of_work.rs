//! Shared-transaction handle.
//!
//! One handle owns one `sqlx` transaction for the duration of a mutation.
//! Repositories borrow the transaction through the handle's lock; commit
//! and rollback take it out, so any later use fails loudly instead of
//! silently running outside the unit of work.

use std::sync::Arc;

use sqlx::{PgPool, Postgres, Transaction};
use tokio::sync::{Mutex, MutexGuard};

type PgTx = Transaction<'static, Postgres>;

#[derive(Clone)]
pub struct TxHandle {
    tx: Arc<Mutex<Option<PgTx>>>,
}

impl TxHandle {
    /// Open a new transaction on the pool.
    pub async fn begin(pool: &PgPool) -> Result<Self, sqlx::Error> {
        let tx = pool.begin().await?;
        Ok(TxHandle {
            tx: Arc::new(Mutex::new(Some(tx))),
        })
    }

    pub(crate) async fn lock(&self) -> MutexGuard<'_, Option<PgTx>> {
        self.tx.lock().await
    }

    pub async fn commit(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut tx = self.tx.lock().await;
        match tx.take() {
            Some(transaction) => {
                transaction.commit().await?;
                Ok(())
            }
            None => Err("Transaction has been consumed".into()),
        }
    }

    pub async fn rollback(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut tx = self.tx.lock().await;
        match tx.take() {
            Some(transaction) => {
                transaction.rollback().await?;
                Ok(())
            }
            None => Err("Transaction has been consumed".into()),
        }
    }
}
