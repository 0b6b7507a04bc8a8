//! Pallets: physical units of stored goods

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

string_enum! {
    pub enum PalletStatus as "pallet_status" {
        /// Created from a receipt, not yet put away
        Unassigned => "unassigned",
        Stored => "stored",
        /// Package quantity reached zero
        Empty => "empty",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Pallet {
    pub id: Uuid,
    pub goods_id: Uuid,
    pub goods_receipt_note_detail_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub batch_code: String,
    pub manufacturing_date: NaiveDate,
    pub expiry_date: NaiveDate,
    pub package_quantity: i32,
    /// Packages put on the pallet when it was built from the receipt line
    pub initial_quantity: i32,
    pub status: PalletStatus,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePalletInput {
    pub goods_receipt_note_detail_id: Uuid,
    #[validate(length(min = 1, max = 50))]
    pub batch_code: String,
    pub manufacturing_date: NaiveDate,
    pub expiry_date: NaiveDate,
    #[validate(range(min = 1))]
    pub package_quantity: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssignLocationInput {
    pub location_id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdjustPalletInput {
    /// Signed change in packages
    pub delta: i32,
    pub reason: Option<String>,
}

/// Pallet quantity violations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PalletQuantityError {
    #[error("pallet {pallet_id} has {available} packages, {requested} requested")]
    Insufficient {
        pallet_id: Uuid,
        available: i32,
        requested: i32,
    },

    #[error("pallets for receipt line exceed accepted quantity: {total} > {accepted}")]
    ExceedsAccepted { total: i64, accepted: i32 },

    #[error("quantity change on pallet {pallet_id} is out of range")]
    Overflow { pallet_id: Uuid },
}

impl PalletQuantityError {
    pub fn message_vi(&self) -> String {
        match self {
            PalletQuantityError::Insufficient { available, requested, .. } => format!(
                "Số lượng trên pallet không đủ (còn {}, yêu cầu {})",
                available, requested
            ),
            PalletQuantityError::ExceedsAccepted { total, accepted } => format!(
                "Tổng số lượng pallet ({}) vượt quá số lượng đạt kiểm tra ({})",
                total, accepted
            ),
            PalletQuantityError::Overflow { .. } => {
                "Số lượng điều chỉnh vượt quá giới hạn cho phép".to_string()
            }
        }
    }
}

/// Apply a signed change to a pallet's package quantity; it never goes negative
pub fn adjust_package_quantity(
    pallet_id: Uuid,
    current: i32,
    delta: i32,
) -> Result<i32, PalletQuantityError> {
    match current.checked_add(delta) {
        Some(next) if next >= 0 => Ok(next),
        Some(_) => Err(PalletQuantityError::Insufficient {
            pallet_id,
            available: current,
            requested: delta.saturating_neg(),
        }),
        None => Err(PalletQuantityError::Overflow { pallet_id }),
    }
}

/// Status implied by a quantity change
pub fn status_after_quantity(current: PalletStatus, quantity: i32) -> PalletStatus {
    if quantity == 0 {
        PalletStatus::Empty
    } else if current == PalletStatus::Empty {
        PalletStatus::Stored
    } else {
        current
    }
}

/// First-expired-first-out ordering: earliest expiry, then oldest batch
pub fn sort_fefo(pallets: &mut [Pallet]) {
    pallets.sort_by(|a, b| {
        a.expiry_date
            .cmp(&b.expiry_date)
            .then(a.manufacturing_date.cmp(&b.manufacturing_date))
            .then(a.created_at.cmp(&b.created_at))
    });
}

/// Packages palletized so far from one receipt line.
///
/// Counts what each pallet was built with, so shipping or correcting a
/// pallet never frees room on the line.
pub fn palletized_quantity(pallets: &[Pallet]) -> i64 {
    pallets.iter().map(|p| i64::from(p.initial_quantity)).sum()
}

/// Check that new pallets for a receipt line fit the accepted quantity
pub fn check_palletized_total(
    already_palletized: i64,
    new_quantity: i32,
    accepted: i32,
) -> Result<(), PalletQuantityError> {
    let total = already_palletized + i64::from(new_quantity);
    if total > i64::from(accepted) {
        return Err(PalletQuantityError::ExceedsAccepted { total, accepted });
    }
    Ok(())
}
