//! Goods issue notes (GIN): picking and shipping a sales order

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use super::{PalletQuantityError, PalletStatus, Role};
use crate::workflow::{Relationship, Transition, Workflow};

string_enum! {
    pub enum GoodsIssueNoteStatus as "goods_issue_note_status" {
        Draft => "draft",
        Picking => "picking",
        PendingApproval => "pending_approval",
        Rejected => "rejected",
        Completed => "completed",
    }
}

string_enum! {
    pub enum GoodsIssueNoteAction {
        StartPicking => "start_picking",
        Submit => "submit",
        Approve => "approve",
        Reject => "reject",
    }
}

string_enum! {
    pub enum GoodsIssueDetailStatus as "goods_issue_detail_status" {
        Pending => "pending",
        Picked => "picked",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct GoodsIssueNote {
    pub id: Uuid,
    pub code: String,
    pub sales_order_id: Uuid,
    pub status: GoodsIssueNoteStatus,
    pub created_by: Uuid,
    /// Warehouse keeper doing the picking
    pub assigned_to: Uuid,
    pub approval_by: Option<Uuid>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct GoodsIssueNoteDetail {
    pub id: Uuid,
    pub goods_issue_note_id: Uuid,
    pub goods_id: Uuid,
    pub requested_quantity: i32,
    pub status: GoodsIssueDetailStatus,
}

/// Packages taken from one pallet for one detail line
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct GoodsIssueAllocation {
    pub id: Uuid,
    pub goods_issue_note_detail_id: Uuid,
    pub pallet_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct GoodsIssueNoteWithDetails {
    #[serde(flatten)]
    pub note: GoodsIssueNote,
    pub details: Vec<GoodsIssueNoteDetail>,
    pub allocations: Vec<GoodsIssueAllocation>,
    pub allowed_actions: Vec<GoodsIssueNoteAction>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AllocateInput {
    pub pallet_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GoodsIssueTransitionInput {
    pub rejection_reason: Option<String>,
}

/// Pallet quantity change computed for an approval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PalletDecrement {
    pub pallet_id: Uuid,
    pub goods_id: Uuid,
    pub quantity: i32,
    pub remaining: i32,
}

/// Allocation problems detected while picking
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocationError {
    #[error("allocation of {allocated} exceeds requested {requested}")]
    ExceedsRequested { requested: i32, allocated: i32 },

    #[error("pallet holds different goods")]
    GoodsMismatch,

    #[error("pallet is {0}, only stored pallets can be picked")]
    NotStored(PalletStatus),

    #[error(transparent)]
    Pallet(#[from] PalletQuantityError),
}

impl AllocationError {
    pub fn message_vi(&self) -> String {
        match self {
            AllocationError::ExceedsRequested { requested, allocated } => format!(
                "Tổng số lượng lấy hàng ({}) vượt quá số lượng yêu cầu ({})",
                allocated, requested
            ),
            AllocationError::GoodsMismatch => "Pallet không chứa đúng mặt hàng".to_string(),
            AllocationError::NotStored(PalletStatus::Empty) => "Pallet đã hết hàng".to_string(),
            AllocationError::NotStored(_) => {
                "Pallet chưa được xếp vào vị trí lưu kho".to_string()
            }
            AllocationError::Pallet(e) => e.message_vi(),
        }
    }
}

/// Pallet data needed to plan an approval
#[derive(Debug, Clone, Copy)]
pub struct PalletStock {
    pub goods_id: Uuid,
    pub package_quantity: i32,
}

/// Validate one more allocation for a detail line.
///
/// `already_allocated` is the sum of existing allocations of the line and
/// `pallet_reserved` the sum of existing allocations on the pallet across
/// open notes. Returns the new allocated total of the line.
pub fn check_allocation(
    detail: &GoodsIssueNoteDetail,
    already_allocated: i32,
    pallet_id: Uuid,
    pallet: PalletStock,
    pallet_reserved: i32,
    quantity: i32,
) -> Result<i32, AllocationError> {
    if pallet.goods_id != detail.goods_id {
        return Err(AllocationError::GoodsMismatch);
    }
    let allocated = match already_allocated.checked_add(quantity) {
        Some(total) if total <= detail.requested_quantity => total,
        total => {
            return Err(AllocationError::ExceedsRequested {
                requested: detail.requested_quantity,
                allocated: total.unwrap_or(i32::MAX),
            })
        }
    };
    let free = pallet.package_quantity.saturating_sub(pallet_reserved);
    if quantity > free {
        return Err(PalletQuantityError::Insufficient {
            pallet_id,
            available: free.max(0),
            requested: quantity,
        }
        .into());
    }
    Ok(allocated)
}

/// Only pallets put away in a location can be picked
pub fn check_pickable(status: PalletStatus) -> Result<(), AllocationError> {
    match status {
        PalletStatus::Stored => Ok(()),
        other => Err(AllocationError::NotStored(other)),
    }
}

/// Sub-status of a line given its allocated total
pub fn detail_status_for(requested: i32, allocated: i32) -> GoodsIssueDetailStatus {
    if allocated >= requested {
        GoodsIssueDetailStatus::Picked
    } else {
        GoodsIssueDetailStatus::Pending
    }
}

/// True when every line is picked (and there is at least one)
pub fn all_details_picked(details: &[GoodsIssueNoteDetail]) -> bool {
    !details.is_empty()
        && details
            .iter()
            .all(|d| d.status == GoodsIssueDetailStatus::Picked)
}

/// Plan the pallet decrements of an approval.
///
/// Allocations on the same pallet are summed; any pallet whose total exceeds
/// its package quantity fails the whole plan. Output is ordered by pallet id
/// so updates lock rows in a stable order.
pub fn plan_pallet_decrements(
    allocations: &[GoodsIssueAllocation],
    pallets: &HashMap<Uuid, PalletStock>,
) -> Result<Vec<PalletDecrement>, PalletQuantityError> {
    let mut totals: Vec<(Uuid, i64)> = Vec::new();
    for allocation in allocations {
        let quantity = i64::from(allocation.quantity);
        match totals.iter_mut().find(|(p, _)| *p == allocation.pallet_id) {
            Some((_, total)) => *total += quantity,
            None => totals.push((allocation.pallet_id, quantity)),
        }
    }
    totals.sort_by_key(|(pallet_id, _)| *pallet_id);

    totals
        .into_iter()
        .map(|(pallet_id, quantity)| {
            let stock = pallets.get(&pallet_id).copied().unwrap_or(PalletStock {
                goods_id: Uuid::nil(),
                package_quantity: 0,
            });
            let quantity = match i32::try_from(quantity) {
                Ok(q) if q <= stock.package_quantity => q,
                other => {
                    return Err(PalletQuantityError::Insufficient {
                        pallet_id,
                        available: stock.package_quantity,
                        requested: other.unwrap_or(i32::MAX),
                    })
                }
            };
            Ok(PalletDecrement {
                pallet_id,
                goods_id: stock.goods_id,
                quantity,
                remaining: stock.package_quantity - quantity,
            })
        })
        .collect()
}

pub struct GoodsIssueNoteWorkflow;

use GoodsIssueNoteAction as A;
use GoodsIssueNoteStatus as S;

const GOODS_ISSUE_TRANSITIONS: &[Transition<GoodsIssueNoteStatus, GoodsIssueNoteAction>] = &[
    Transition {
        action: A::StartPicking,
        from: &[S::Draft, S::Rejected],
        to: S::Picking,
        actor: Relationship::Assignee,
    },
    Transition {
        action: A::Submit,
        from: &[S::Picking],
        to: S::PendingApproval,
        actor: Relationship::Assignee,
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
];

impl Workflow for GoodsIssueNoteWorkflow {
    type Status = GoodsIssueNoteStatus;
    type Action = GoodsIssueNoteAction;

    const DOCUMENT: &'static str = "goods_issue_note";
    const DOCUMENT_VI: &'static str = "phiếu xuất kho";

    fn transitions() -> &'static [Transition<S, A>] {
        GOODS_ISSUE_TRANSITIONS
    }

    fn approvers() -> &'static [Role] {
        &[Role::WarehouseManager, Role::Admin]
    }
}
