//! Back orders: retailer demand that could not be served from stock

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::Role;
use crate::workflow::{Relationship, Transition, Workflow};

string_enum! {
    pub enum BackOrderStatus as "back_order_status" {
        Waiting => "waiting",
        Fulfilled => "fulfilled",
        Cancelled => "cancelled",
    }
}

string_enum! {
    pub enum BackOrderAction {
        Fulfil => "fulfil",
        Cancel => "cancel",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct BackOrder {
    pub id: Uuid,
    pub retailer_id: Uuid,
    pub goods_id: Uuid,
    pub quantity: i32,
    pub status: BackOrderStatus,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateBackOrderInput {
    pub retailer_id: Uuid,
    pub goods_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
}

pub struct BackOrderWorkflow;

const BACK_ORDER_TRANSITIONS: &[Transition<BackOrderStatus, BackOrderAction>] = &[
    Transition {
        action: BackOrderAction::Fulfil,
        from: &[BackOrderStatus::Waiting],
        to: BackOrderStatus::Fulfilled,
        actor: Relationship::Approver,
    },
    Transition {
        action: BackOrderAction::Cancel,
        from: &[BackOrderStatus::Waiting],
        to: BackOrderStatus::Cancelled,
        actor: Relationship::Creator,
    },
];

impl Workflow for BackOrderWorkflow {
    type Status = BackOrderStatus;
    type Action = BackOrderAction;

    const DOCUMENT: &'static str = "back_order";
    const DOCUMENT_VI: &'static str = "đơn hàng chờ";

    fn transitions() -> &'static [Transition<BackOrderStatus, BackOrderAction>] {
        BACK_ORDER_TRANSITIONS
    }

    fn approvers() -> &'static [Role] {
        &[Role::SalesManager, Role::Admin]
    }
}
