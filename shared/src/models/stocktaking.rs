//! Stocktaking: sheet → areas → locations → pallets

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{adjust_package_quantity, LedgerDraft, LedgerReason, PalletQuantityError, Role};
use crate::workflow::{Relationship, Transition, Workflow};

string_enum! {
    pub enum StocktakingStatus as "stocktaking_status" {
        Draft => "draft",
        InProgress => "in_progress",
        PendingApproval => "pending_approval",
        Rejected => "rejected",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

string_enum! {
    pub enum StocktakingAction {
        Start => "start",
        Submit => "submit",
        Approve => "approve",
        Reject => "reject",
        Cancel => "cancel",
    }
}

string_enum! {
    pub enum StocktakingPalletStatus as "stocktaking_pallet_status" {
        Pending => "pending",
        Counted => "counted",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StocktakingSheet {
    pub id: Uuid,
    pub code: String,
    pub status: StocktakingStatus,
    pub created_by: Uuid,
    pub approval_by: Option<Uuid>,
    pub rejection_reason: Option<String>,
    pub note: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StocktakingArea {
    pub id: Uuid,
    pub stocktaking_sheet_id: Uuid,
    pub area_id: Uuid,
    /// Keeper counting this area
    pub assigned_to: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StocktakingLocation {
    pub id: Uuid,
    pub stocktaking_area_id: Uuid,
    pub location_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StocktakingPallet {
    pub id: Uuid,
    pub stocktaking_location_id: Uuid,
    pub pallet_id: Uuid,
    pub goods_id: Uuid,
    pub expected_quantity: i32,
    pub counted_quantity: Option<i32>,
    pub status: StocktakingPalletStatus,
    pub counted_by: Option<Uuid>,
    pub counted_at: Option<DateTime<Utc>>,
}

impl StocktakingPallet {
    /// counted − expected; zero until counted
    pub fn variance(&self) -> i32 {
        self.counted_quantity
            .map(|c| c - self.expected_quantity)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StocktakingSheetWithDetails {
    #[serde(flatten)]
    pub sheet: StocktakingSheet,
    pub areas: Vec<StocktakingArea>,
    pub locations: Vec<StocktakingLocation>,
    pub pallets: Vec<StocktakingPallet>,
    pub allowed_actions: Vec<StocktakingAction>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct StocktakingAreaInput {
    pub area_id: Uuid,
    pub assigned_to: Uuid,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateStocktakingInput {
    #[validate(length(min = 1))]
    pub areas: Vec<StocktakingAreaInput>,
    #[validate(length(max = 500))]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RecordCountInput {
    #[validate(range(min = 0))]
    pub counted_quantity: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StocktakingTransitionInput {
    pub rejection_reason: Option<String>,
}

/// One line of the variance report
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StocktakingVarianceRow {
    pub area_code: String,
    pub location_code: String,
    pub pallet_id: Uuid,
    pub goods_code: String,
    pub expected_quantity: i32,
    pub counted_quantity: Option<i32>,
    pub variance: i32,
}

/// True when every pallet has been counted (and there is at least one)
pub fn all_pallets_counted(pallets: &[StocktakingPallet]) -> bool {
    !pallets.is_empty()
        && pallets
            .iter()
            .all(|p| p.status == StocktakingPalletStatus::Counted)
}

/// Ledger adjustments implied by the counted figures; zero variances are skipped
pub fn reconcile(pallets: &[StocktakingPallet]) -> Vec<LedgerDraft> {
    pallets
        .iter()
        .filter(|p| p.variance() != 0)
        .map(|p| LedgerDraft {
            goods_id: p.goods_id,
            pallet_id: Some(p.pallet_id),
            delta: p.variance(),
            reason: LedgerReason::Adjustment,
        })
        .collect()
}

/// Quantities each adjusted pallet ends at, checked for every pallet before
/// any of them is written. A pallet missing from `current` counts as empty.
pub fn plan_adjustments(
    adjustments: &[LedgerDraft],
    current: &HashMap<Uuid, i32>,
) -> Result<Vec<(Uuid, i32)>, PalletQuantityError> {
    adjustments
        .iter()
        .filter_map(|a| a.pallet_id.map(|id| (id, a.delta)))
        .map(|(pallet_id, delta)| {
            let quantity = current.get(&pallet_id).copied().unwrap_or(0);
            adjust_package_quantity(pallet_id, quantity, delta).map(|next| (pallet_id, next))
        })
        .collect()
}

pub struct StocktakingWorkflow;

use StocktakingAction as A;
use StocktakingStatus as S;

const STOCKTAKING_TRANSITIONS: &[Transition<StocktakingStatus, StocktakingAction>] = &[
    Transition {
        action: A::Start,
        from: &[S::Draft],
        to: S::InProgress,
        actor: Relationship::Creator,
    },
    Transition {
        action: A::Submit,
        from: &[S::InProgress, S::Rejected],
        to: S::PendingApproval,
        actor: Relationship::Creator,
    },
    Transition {
        action: A::Approve,
        from: &[S::PendingApproval],
        to: S::Completed,
        actor: Relationship::Approver,
    },
    Transition {
        action: A::Reject,
        from: &[S::PendingApproval],
        to: S::Rejected,
        actor: Relationship::Approver,
    },
    Transition {
        action: A::Cancel,
        from: &[S::Draft, S::InProgress],
        to: S::Cancelled,
        actor: Relationship::Creator,
    },
];

impl Workflow for StocktakingWorkflow {
    type Status = StocktakingStatus;
    type Action = StocktakingAction;

    const DOCUMENT: &'static str = "stocktaking_sheet";
    const DOCUMENT_VI: &'static str = "phiếu kiểm kê";

    fn transitions() -> &'static [Transition<S, A>] {
        STOCKTAKING_TRANSITIONS
    }

    fn approvers() -> &'static [Role] {
        &[Role::WarehouseManager, Role::Admin]
    }
}

impl StocktakingStatus {
    /// Counts may be recorded while the sheet is being worked on
    pub fn accepts_counts(&self) -> bool {
        matches!(self, S::InProgress | S::Rejected)
    }
}
