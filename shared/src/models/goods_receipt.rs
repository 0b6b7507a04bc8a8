//! Goods receipt notes (GRN): inbound inspection of a purchase order delivery

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use super::Role;
use crate::workflow::{Relationship, Transition, Workflow};

string_enum! {
    pub enum GoodsReceiptNoteStatus as "goods_receipt_note_status" {
        Draft => "draft",
        PendingApproval => "pending_approval",
        Rejected => "rejected",
        Completed => "completed",
    }
}

string_enum! {
    pub enum GoodsReceiptNoteAction {
        Submit => "submit",
        Approve => "approve",
        Reject => "reject",
    }
}

string_enum! {
    pub enum GoodsReceiptDetailStatus as "goods_receipt_detail_status" {
        Pending => "pending",
        Inspected => "inspected",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct GoodsReceiptNote {
    pub id: Uuid,
    pub code: String,
    pub purchase_order_id: Uuid,
    pub status: GoodsReceiptNoteStatus,
    pub created_by: Uuid,
    /// Warehouse keeper performing the inspection
    pub assigned_to: Uuid,
    pub approval_by: Option<Uuid>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct GoodsReceiptNoteDetail {
    pub id: Uuid,
    pub goods_receipt_note_id: Uuid,
    pub goods_id: Uuid,
    pub expected_quantity: i32,
    pub received_quantity: Option<i32>,
    pub rejected_quantity: Option<i32>,
    pub status: GoodsReceiptDetailStatus,
    pub note: Option<String>,
}

impl GoodsReceiptNoteDetail {
    /// Packages that passed inspection and enter stock
    pub fn accepted_quantity(&self) -> i32 {
        match (self.received_quantity, self.rejected_quantity) {
            (Some(received), rejected) => received - rejected.unwrap_or(0),
            (None, _) => 0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GoodsReceiptNoteWithDetails {
    #[serde(flatten)]
    pub note: GoodsReceiptNote,
    pub details: Vec<GoodsReceiptNoteDetail>,
    pub allowed_actions: Vec<GoodsReceiptNoteAction>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateGoodsReceiptNoteInput {
    pub purchase_order_id: Uuid,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct InspectDetailInput {
    #[validate(range(min = 0))]
    pub received_quantity: i32,
    #[validate(range(min = 0))]
    pub rejected_quantity: i32,
    #[validate(length(max = 500))]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GoodsReceiptTransitionInput {
    pub rejection_reason: Option<String>,
}

/// Inspection figures that do not add up
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InspectionError {
    #[error("received {received} exceeds expected {expected}")]
    OverDelivered { expected: i32, received: i32 },

    #[error("rejected {rejected} exceeds received {received}")]
    RejectedExceedsReceived { received: i32, rejected: i32 },

    #[error("quantities cannot be negative")]
    Negative,
}

impl InspectionError {
    pub fn message_vi(&self) -> String {
        match self {
            InspectionError::OverDelivered { expected, received } => format!(
                "Số lượng nhận ({}) vượt quá số lượng đặt ({})",
                received, expected
            ),
            InspectionError::RejectedExceedsReceived { received, rejected } => format!(
                "Số lượng loại ({}) vượt quá số lượng nhận ({})",
                rejected, received
            ),
            InspectionError::Negative => "Số lượng không được âm".to_string(),
        }
    }
}

/// Validate inspection figures and return the accepted quantity
pub fn inspect_quantities(
    expected: i32,
    received: i32,
    rejected: i32,
) -> Result<i32, InspectionError> {
    if received < 0 || rejected < 0 {
        return Err(InspectionError::Negative);
    }
    if received > expected {
        return Err(InspectionError::OverDelivered { expected, received });
    }
    if rejected > received {
        return Err(InspectionError::RejectedExceedsReceived { received, rejected });
    }
    Ok(received - rejected)
}

/// True when every line has been inspected (and there is at least one)
pub fn all_details_inspected(details: &[GoodsReceiptNoteDetail]) -> bool {
    !details.is_empty()
        && details
            .iter()
            .all(|d| d.status == GoodsReceiptDetailStatus::Inspected)
}

pub struct GoodsReceiptNoteWorkflow;

use GoodsReceiptNoteAction as A;
use GoodsReceiptNoteStatus as S;

const GOODS_RECEIPT_TRANSITIONS: &[Transition<GoodsReceiptNoteStatus, GoodsReceiptNoteAction>] = &[
    Transition {
        action: A::Submit,
        from: &[S::Draft, S::Rejected],
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

impl Workflow for GoodsReceiptNoteWorkflow {
    type Status = GoodsReceiptNoteStatus;
    type Action = GoodsReceiptNoteAction;

    const DOCUMENT: &'static str = "goods_receipt_note";
    const DOCUMENT_VI: &'static str = "phiếu nhập kho";

    fn transitions() -> &'static [Transition<S, A>] {
        GOODS_RECEIPT_TRANSITIONS
    }

    fn approvers() -> &'static [Role] {
        &[Role::WarehouseManager, Role::Admin]
    }
}

impl GoodsReceiptNoteStatus {
    /// Inspection figures may be recorded while the note is open
    pub fn accepts_inspection(&self) -> bool {
        matches!(self, S::Draft | S::Rejected)
    }
}
