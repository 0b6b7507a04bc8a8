//! Transaction scope shared by the services
//!
//! A `UnitOfWork` owns one Postgres transaction. Repository calls borrow its
//! connection; `commit` makes every write visible at once. Returning early
//! with `?` drops the unit of work, and sqlx rolls the transaction back.

use sqlx::{PgConnection, PgPool, Postgres, Transaction};

use crate::error::{AppError, AppResult};

pub struct UnitOfWork {
    tx: Option<Transaction<'static, Postgres>>,
    label: &'static str,
}

impl UnitOfWork {
    /// Begin a transaction; `label` names the operation in logs
    pub async fn begin(pool: &PgPool, label: &'static str) -> AppResult<Self> {
        let tx = pool.begin().await?;
        tracing::debug!(operation = label, "transaction started");
        Ok(Self {
            tx: Some(tx),
            label,
        })
    }

    /// Connection for repository calls inside the transaction
    pub fn conn(&mut self) -> AppResult<&mut PgConnection> {
        match self.tx.as_mut() {
            Some(tx) => Ok(&mut **tx),
            None => Err(AppError::Internal(format!(
                "unit of work '{}' already finished",
                self.label
            ))),
        }
    }

    pub async fn commit(mut self) -> AppResult<()> {
        let label = self.label;
        if let Some(tx) = self.tx.take() {
            tx.commit().await.map_err(|e| {
                tracing::error!(operation = label, error = %e, "commit failed, transaction rolled back");
                e
            })?;
            tracing::debug!(operation = label, "transaction committed");
        }
        Ok(())
    }

    /// Roll back after a failure part way through a multi-row write
    pub async fn rollback(mut self) -> AppResult<()> {
        let label = self.label;
        if let Some(tx) = self.tx.take() {
            tx.rollback().await?;
            tracing::warn!(operation = label, "transaction rolled back");
        }
        Ok(())
    }
}

impl Drop for UnitOfWork {
    fn drop(&mut self) {
        if self.tx.is_some() {
            tracing::debug!(operation = self.label, "transaction dropped, rolling back");
        }
    }
}
