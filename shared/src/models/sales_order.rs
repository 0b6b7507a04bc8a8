//! Sales orders from retailers

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{OrderLineInput, Role};
use crate::workflow::{Relationship, Transition, Workflow};

string_enum! {
    pub enum SalesOrderStatus as "sales_order_status" {
        Draft => "draft",
        PendingApproval => "pending_approval",
        Approved => "approved",
        Rejected => "rejected",
        AssignedForPicking => "assigned_for_picking",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

string_enum! {
    pub enum SalesOrderAction {
        Submit => "submit",
        Approve => "approve",
        Reject => "reject",
        AssignForPicking => "assign_for_picking",
        Complete => "complete",
        Cancel => "cancel",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SalesOrder {
    pub id: Uuid,
    pub code: String,
    pub retailer_id: Uuid,
    pub status: SalesOrderStatus,
    pub created_by: Uuid,
    pub approval_by: Option<Uuid>,
    /// Warehouse keeper picking the order
    pub assigned_to: Option<Uuid>,
    pub requested_delivery_date: Option<NaiveDate>,
    pub rejection_reason: Option<String>,
    pub note: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SalesOrderDetail {
    pub id: Uuid,
    pub sales_order_id: Uuid,
    pub goods_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct SalesOrderWithDetails {
    #[serde(flatten)]
    pub order: SalesOrder,
    pub details: Vec<SalesOrderDetail>,
    pub total_amount: Decimal,
    pub allowed_actions: Vec<SalesOrderAction>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSalesOrderInput {
    pub retailer_id: Uuid,
    #[validate(length(min = 1))]
    pub details: Vec<OrderLineInput>,
    pub requested_delivery_date: Option<NaiveDate>,
    #[validate(length(max = 500))]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SalesOrderTransitionInput {
    pub rejection_reason: Option<String>,
    /// Warehouse keeper who will pick the order
    pub assignee_id: Option<Uuid>,
}

pub struct SalesOrderWorkflow;

use SalesOrderAction as A;
use SalesOrderStatus as S;

const SALES_ORDER_TRANSITIONS: &[Transition<SalesOrderStatus, SalesOrderAction>] = &[
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
        action: A::AssignForPicking,
        from: &[S::Approved],
        to: S::AssignedForPicking,
        actor: Relationship::Approver,
    },
    Transition {
        action: A::Complete,
        from: &[S::AssignedForPicking],
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

impl Workflow for SalesOrderWorkflow {
    type Status = SalesOrderStatus;
    type Action = SalesOrderAction;

    const DOCUMENT: &'static str = "sales_order";
    const DOCUMENT_VI: &'static str = "đơn bán hàng";

    fn transitions() -> &'static [Transition<S, A>] {
        SALES_ORDER_TRANSITIONS
    }

    fn approvers() -> &'static [Role] {
        &[Role::SalesManager, Role::Admin]
    }
}

impl SalesOrderStatus {
    /// Statuses whose lines count as committed stock
    pub const COMMITTED: &'static [SalesOrderStatus] =
        &[S::PendingApproval, S::Approved, S::AssignedForPicking];

    pub fn commits_stock(&self) -> bool {
        Self::COMMITTED.contains(self)
    }
}

/// Sum of quantity × unit price over all lines
pub fn sales_order_total(details: &[SalesOrderDetail]) -> Decimal {
    details
        .iter()
        .map(|d| d.unit_price * Decimal::from(d.quantity))
        .sum()
}
