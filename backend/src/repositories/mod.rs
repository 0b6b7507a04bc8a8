//! Query wrappers per table
//!
//! Every function takes the connection it runs on, so the same call works on a
//! pooled connection for reads and on a `UnitOfWork` connection for writes.
//! Rows that a transition is about to change are loaded with `lock_*`
//! (`SELECT ... FOR UPDATE`).

pub mod back_orders;
pub mod catalog;
pub mod goods_issues;
pub mod goods_receipts;
pub mod ledger;
pub mod locations;
pub mod notifications;
pub mod pallets;
pub mod purchase_orders;
pub mod sales_orders;
pub mod stocktaking;
pub mod users;

use chrono::NaiveDate;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::AppResult;

/// Bookkeeping columns written together with a document's new status
#[derive(Debug, Default, Clone)]
pub struct StatusChange {
    pub approval_by: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
    /// Stored as given; `None` clears a previous rejection
    pub rejection_reason: Option<String>,
    /// Stamp `approved_at` with the current time
    pub approved: bool,
}

/// Next per-day sequence number for the document codes of `table`
pub async fn next_document_sequence(
    conn: &mut PgConnection,
    table: &'static str,
    prefix: &str,
    date: NaiveDate,
) -> AppResult<i64> {
    // Serializes code allocation per table until the transaction ends
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
        .bind(table)
        .execute(&mut *conn)
        .await?;

    let sql = format!("SELECT code FROM {} WHERE code LIKE $1", table);
    let codes: Vec<String> = sqlx::query_scalar(&sql)
        .bind(format!("{}%", shared::document_code_stem(prefix, date)))
        .fetch_all(&mut *conn)
        .await?;
    Ok(shared::next_document_sequence(
        codes.iter().map(String::as_str),
        prefix,
        date,
    ))
}
