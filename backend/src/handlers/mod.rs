//! HTTP handlers
//!
//! Handlers build the service from `AppState`, call it with the
//! authenticated user and wrap the result in the `ApiResponse` envelope.

pub mod auth;
pub mod back_order;
pub mod catalog;
pub mod goods_issue;
pub mod goods_receipt;
pub mod health;
pub mod inventory;
pub mod location;
pub mod notification;
pub mod pallet;
pub mod purchase_order;
pub mod sales_order;
pub mod stocktaking;

pub use auth::*;
pub use back_order::*;
pub use catalog::*;
pub use goods_issue::*;
pub use goods_receipt::*;
pub use health::*;
pub use inventory::*;
pub use location::*;
pub use notification::*;
pub use pallet::*;
pub use purchase_order::*;
pub use sales_order::*;
pub use stocktaking::*;

use std::str::FromStr;

use serde::Deserialize;
use shared::Pagination;

use crate::error::{AppError, AppResult};
use crate::AppState;

/// Query string of list endpoints: `?page=&per_page=&status=`
#[derive(Debug, Deserialize)]
pub struct ListQuery<S> {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub status: Option<S>,
}

impl<S> ListQuery<S> {
    pub fn pagination(&self, state: &AppState) -> Pagination {
        page_of(state, self.page, self.per_page)
    }
}

/// Query string of paged endpoints without a status filter
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl PageQuery {
    pub fn pagination(&self, state: &AppState) -> Pagination {
        page_of(state, self.page, self.per_page)
    }
}

/// Missing page size falls back to the configured default
pub(crate) fn page_of(state: &AppState, page: Option<u32>, per_page: Option<u32>) -> Pagination {
    Pagination {
        page: page.unwrap_or(1),
        per_page: per_page.unwrap_or(state.config.warehouse.default_page_size),
    }
}

/// Parse the `:action` path segment of a transition route
pub(crate) fn parse_action<A: FromStr>(raw: &str) -> AppResult<A> {
    raw.parse::<A>().map_err(|_| AppError::Validation {
        field: "action".to_string(),
        message: format!("Unknown action '{}'", raw),
        message_vi: format!("Thao tác '{}' không hợp lệ", raw),
    })
}

/// `?format=csv` switch of report endpoints
#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub format: Option<String>,
}

impl ExportQuery {
    pub fn wants_csv(&self) -> bool {
        self.format.as_deref() == Some("csv")
    }
}

/// CSV attachment response
pub(crate) fn csv_attachment(filename: &str, body: String) -> axum::response::Response {
    use axum::{http::header, response::IntoResponse};

    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{GoodsIssueNoteAction, PurchaseOrderAction};

    #[test]
    fn test_parse_action() {
        assert_eq!(
            parse_action::<PurchaseOrderAction>("confirm_arrival").unwrap(),
            PurchaseOrderAction::ConfirmArrival
        );
        assert_eq!(
            parse_action::<GoodsIssueNoteAction>("start_picking").unwrap(),
            GoodsIssueNoteAction::StartPicking
        );
        let err = parse_action::<PurchaseOrderAction>("teleport").unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "action"));
    }

    #[test]
    fn test_export_query() {
        assert!(ExportQuery { format: Some("csv".into()) }.wants_csv());
        assert!(!ExportQuery { format: Some("json".into()) }.wants_csv());
        assert!(!ExportQuery { format: None }.wants_csv());
    }
}
