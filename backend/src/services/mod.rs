//! Business logic services
//!
//! Document services follow one shape for every status change: open a
//! `UnitOfWork`, lock the document, validate the transition against its
//! workflow table, apply payload checks, write the new status together with
//! ledger rows and notifications, then commit.

pub mod auth;
pub mod back_order;
pub mod catalog;
pub mod goods_issue;
pub mod goods_receipt;
pub mod inventory;
pub mod location;
pub mod notification;
pub mod pallet;
pub mod purchase_order;
pub mod sales_order;
pub mod stocktaking;

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use sqlx::PgConnection;
use uuid::Uuid;

use shared::{generate_document_code, validate_rejection_reason, Role, Workflow};

use crate::error::{AppError, AppResult};
use crate::repositories::{self, catalog as catalog_repo, users};

pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Allocate the next code for a document table, e.g. `PO-20261016-0003`
pub(crate) async fn next_code(
    conn: &mut PgConnection,
    table: &'static str,
    prefix: &str,
) -> AppResult<String> {
    let date = today();
    let sequence = repositories::next_document_sequence(conn, table, prefix, date).await?;
    Ok(generate_document_code(prefix, date, sequence))
}

/// Rejection payloads must carry a reason
pub(crate) fn rejection_reason(reason: Option<&str>) -> AppResult<String> {
    validate_rejection_reason(reason)
        .map(str::to_string)
        .map_err(|m| AppError::invalid("rejection_reason", m))
}

/// Active users of the workflow's approver pool
pub(crate) async fn approver_pool<W: Workflow>(conn: &mut PgConnection) -> AppResult<Vec<Uuid>> {
    users::active_ids_with_roles(conn, W::approvers()).await
}

/// Check that `user_id` is an active user holding `role`
pub(crate) async fn ensure_user_with_role(
    conn: &mut PgConnection,
    user_id: Uuid,
    role: Role,
    field: &str,
) -> AppResult<()> {
    match users::find_by_id(conn, user_id).await? {
        Some(user) if user.is_active && user.role == role => Ok(()),
        Some(_) => Err(AppError::invalid(
            field,
            &format!("Người được phân công phải là {}", role.label_vi()),
        )),
        None => Err(AppError::not_found("User", "người dùng")),
    }
}

/// Fail when any goods id is unknown or inactive
pub(crate) async fn ensure_goods_exist(conn: &mut PgConnection, goods_ids: &[Uuid]) -> AppResult<()> {
    let missing = catalog_repo::missing_goods(conn, goods_ids).await?;
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::invalid(
            "goods_id",
            &format!("Không tìm thấy hàng hóa {}", missing[0]),
        ))
    }
}

/// Serialize rows to CSV with a header line
pub fn export_to_csv<T: Serialize>(rows: &[T]) -> AppResult<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for row in rows {
        wtr.serialize(row)
            .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Row {
        goods_code: &'static str,
        variance: i32,
    }

    #[test]
    fn test_export_to_csv_writes_header_and_rows() {
        let csv = export_to_csv(&[
            Row { goods_code: "SUA-01", variance: -2 },
            Row { goods_code: "SUA-02", variance: 0 },
        ])
        .unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines, vec!["goods_code,variance", "SUA-01,-2", "SUA-02,0"]);
    }

    #[test]
    fn test_rejection_reason_required() {
        assert!(rejection_reason(None).is_err());
        assert_eq!(rejection_reason(Some(" hỏng bao bì ")).unwrap(), "hỏng bao bì");
    }
}
