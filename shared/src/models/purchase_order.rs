//! Purchase orders placed with suppliers

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::Role;
use crate::workflow::{Relationship, Transition, Workflow};

string_enum! {
    pub enum PurchaseOrderStatus as "purchase_order_status" {
        Draft => "draft",
        PendingApproval => "pending_approval",
        Approved => "approved",
        Rejected => "rejected",
        AwaitingArrival => "awaiting_arrival",
        GoodsReceived => "goods_received",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

string_enum! {
    pub enum PurchaseOrderAction {
        Submit => "submit",
        Approve => "approve",
        Reject => "reject",
        ConfirmArrival => "confirm_arrival",
        ReceiveGoods => "receive_goods",
        Complete => "complete",
        Cancel => "cancel",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PurchaseOrder {
    pub id: Uuid,
    pub code: String,
    pub supplier_id: Uuid,
    pub status: PurchaseOrderStatus,
    pub created_by: Uuid,
    pub approval_by: Option<Uuid>,
    /// Warehouse keeper receiving the delivery
    pub assigned_to: Option<Uuid>,
    pub estimated_arrival_date: Option<NaiveDate>,
    pub rejection_reason: Option<String>,
    pub note: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PurchaseOrderDetail {
    pub id: Uuid,
    pub purchase_order_id: Uuid,
    pub goods_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct PurchaseOrderWithDetails {
    #[serde(flatten)]
    pub order: PurchaseOrder,
    pub details: Vec<PurchaseOrderDetail>,
    pub total_amount: Decimal,
    pub allowed_actions: Vec<PurchaseOrderAction>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct OrderLineInput {
    pub goods_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
    pub unit_price: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePurchaseOrderInput {
    pub supplier_id: Uuid,
    #[validate(length(min = 1))]
    pub details: Vec<OrderLineInput>,
    #[validate(length(max = 500))]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdatePurchaseOrderInput {
    #[validate(length(min = 1))]
    pub details: Vec<OrderLineInput>,
    #[validate(length(max = 500))]
    pub note: Option<String>,
}

/// Action-specific payload for a purchase order transition
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PurchaseOrderTransitionInput {
    pub rejection_reason: Option<String>,
    pub estimated_arrival_date: Option<NaiveDate>,
    pub assignee_id: Option<Uuid>,
}

pub struct PurchaseOrderWorkflow;

use PurchaseOrderAction as A;
use PurchaseOrderStatus as S;

const PURCHASE_ORDER_TRANSITIONS: &[Transition<PurchaseOrderStatus, PurchaseOrderAction>] = &[
    Transition {
        action: A::Submit,
        from: &[S::Draft, S::Rejected],
        to: S::PendingApproval,
        actor: Relationship::Creator,
    },
    Transition {
        action: A::Approve,
        from: &[S::PendingApproval],
        to: S::Approved,
        actor: Relationship::Approver,
    },
    Transition {
        action: A::Reject,
        from: &[S::PendingApproval],
        to: S::Rejected,
        actor: Relationship::Approver,
    },
    Transition {
        action: A::ConfirmArrival,
        from: &[S::Approved],
        to: S::AwaitingArrival,
        actor: Relationship::Creator,
    },
    Transition {
        action: A::ReceiveGoods,
        from: &[S::AwaitingArrival],
        to: S::GoodsReceived,
        actor: Relationship::Approver,
    },
    Transition {
        action: A::Complete,
        from: &[S::GoodsReceived],
        to: S::Completed,
        actor: Relationship::Approver,
    },
    Transition {
        action: A::Cancel,
        from: &[S::Draft, S::PendingApproval, S::Approved],
        to: S::Cancelled,
        actor: Relationship::Creator,
    },
];

impl Workflow for PurchaseOrderWorkflow {
    type Status = PurchaseOrderStatus;
    type Action = PurchaseOrderAction;

    const DOCUMENT: &'static str = "purchase_order";
    const DOCUMENT_VI: &'static str = "đơn mua hàng";

    fn transitions() -> &'static [Transition<S, A>] {
        PURCHASE_ORDER_TRANSITIONS
    }

    fn approvers() -> &'static [Role] {
        &[Role::WarehouseManager, Role::Admin]
    }
}

impl PurchaseOrderStatus {
    /// Lines may only be edited before submission or after rejection
    pub fn is_editable(&self) -> bool {
        matches!(self, S::Draft | S::Rejected)
    }
}

/// Sum of quantity × unit price over all lines
pub fn order_total(details: &[PurchaseOrderDetail]) -> Decimal {
    details
        .iter()
        .map(|d| d.unit_price * Decimal::from(d.quantity))
        .sum()
}
