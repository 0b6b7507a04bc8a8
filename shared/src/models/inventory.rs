//! Inventory ledger and stock availability

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

string_enum! {
    pub enum LedgerReason as "ledger_reason" {
        /// Accepted packages from an approved goods receipt note
        Receipt => "receipt",
        /// Packages shipped by an approved goods issue note
        Issue => "issue",
        /// Stocktaking variance or manual pallet correction
        Adjustment => "adjustment",
    }
}

/// An append-only stock movement
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct LedgerEntry {
    pub id: Uuid,
    pub goods_id: Uuid,
    pub pallet_id: Option<Uuid>,
    pub delta: i32,
    pub reason: LedgerReason,
    pub document_type: String,
    pub document_id: Uuid,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// A movement to be written by a document transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerDraft {
    pub goods_id: Uuid,
    pub pallet_id: Option<Uuid>,
    pub delta: i32,
    pub reason: LedgerReason,
}

/// Stock position of one goods item
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockLevel {
    pub goods_id: Uuid,
    /// Packages physically on pallets
    pub stock: i64,
    /// Packages promised to open sales orders
    pub committed: i64,
}

impl StockLevel {
    pub fn available(&self) -> i64 {
        self.stock - self.committed
    }
}

/// Stock summary row for reports
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockSummary {
    pub goods_id: Uuid,
    pub goods_code: String,
    pub goods_name: String,
    pub stock: i64,
    pub committed: i64,
    pub available: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("goods {goods_id}: requested {requested}, available {available}")]
pub struct ShortageError {
    pub goods_id: Uuid,
    pub requested: i64,
    pub available: i64,
}

impl ShortageError {
    pub fn message_vi(&self) -> String {
        format!(
            "Số lượng tồn kho khả dụng không đủ (khả dụng {}, yêu cầu {})",
            self.available, self.requested
        )
    }
}

/// Check `available = stock - committed >= requested` for every line.
///
/// Lines for the same goods are summed first; goods with no stock row have
/// zero availability.
pub fn check_availability(
    lines: &[(Uuid, i32)],
    levels: &HashMap<Uuid, StockLevel>,
) -> Result<(), ShortageError> {
    let mut requested: Vec<(Uuid, i64)> = Vec::new();
    for (goods_id, quantity) in lines {
        match requested.iter_mut().find(|(g, _)| g == goods_id) {
            Some((_, total)) => *total += i64::from(*quantity),
            None => requested.push((*goods_id, i64::from(*quantity))),
        }
    }

    for (goods_id, quantity) in requested {
        let available = levels
            .get(&goods_id)
            .map(StockLevel::available)
            .unwrap_or(0);
        if available < quantity {
            return Err(ShortageError {
                goods_id,
                requested: quantity,
                available,
            });
        }
    }
    Ok(())
}
