//! User and role models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

string_enum! {
    /// Warehouse roles; approver pools are expressed in terms of these
    pub enum Role as "user_role" {
        Admin => "admin",
        WarehouseManager => "warehouse_manager",
        WarehouseKeeper => "warehouse_keeper",
        SalesManager => "sales_manager",
        SalesRepresentative => "sales_representative",
        Purchaser => "purchaser",
    }
}

impl Role {
    /// Vietnamese display name
    pub fn label_vi(&self) -> &'static str {
        match self {
            Role::Admin => "Quản trị viên",
            Role::WarehouseManager => "Quản lý kho",
            Role::WarehouseKeeper => "Thủ kho",
            Role::SalesManager => "Quản lý kinh doanh",
            Role::SalesRepresentative => "Nhân viên kinh doanh",
            Role::Purchaser => "Nhân viên mua hàng",
        }
    }
}

/// A user account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
