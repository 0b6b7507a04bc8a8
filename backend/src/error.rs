//! Error handling for the warehouse server
//!
//! Every error is rendered as the uniform `ApiResponse` envelope with a
//! Vietnamese message for the UI and an English message for logs and clients.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::{
    AllocationError, ApiResponse, InspectionError, PalletQuantityError, ShortageError,
    TransitionError,
};
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Insufficient permissions")]
    InsufficientPermissions,

    #[error("Unauthorized: {message}")]
    Unauthorized { message: String, message_vi: String },

    // Validation errors
    #[error("Validation error: {message}")]
    Validation {
        field: String,
        message: String,
        message_vi: String,
    },

    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    #[error("Conflict: {message}")]
    Conflict {
        resource: String,
        message: String,
        message_vi: String,
    },

    #[error("{entity} not found")]
    NotFound {
        entity: &'static str,
        entity_vi: &'static str,
    },

    // Business rule errors
    #[error("Invalid state transition: {0}")]
    Transition(#[from] TransitionError),

    #[error("Insufficient quantity: {0}")]
    InsufficientQuantity(#[from] PalletQuantityError),

    #[error("Insufficient stock: {0}")]
    InsufficientStock(#[from] ShortageError),

    #[error("Invalid allocation: {0}")]
    Allocation(#[from] AllocationError),

    #[error("Invalid inspection: {0}")]
    Inspection(#[from] InspectionError),

    #[error("Incomplete lines: {message}")]
    IncompleteLines { message: String, message_vi: String },

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(entity: &'static str, entity_vi: &'static str) -> Self {
        AppError::NotFound { entity, entity_vi }
    }

    /// Validation error on a single field with a Vietnamese message
    pub fn invalid(field: &str, message_vi: &str) -> Self {
        AppError::Validation {
            field: field.to_string(),
            message: format!("Invalid value for {}", field),
            message_vi: message_vi.to_string(),
        }
    }

    /// Map a unique-constraint violation to `DuplicateEntry`, anything else to `DatabaseError`
    pub fn from_insert(err: sqlx::Error, field: &str) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::DuplicateEntry(field.to_string())
            }
            _ => AppError::DatabaseError(err),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let field = errors
            .field_errors()
            .keys()
            .next()
            .map(|k| k.to_string())
            .unwrap_or_default();
        AppError::Validation {
            message: errors.to_string(),
            message_vi: format!("Dữ liệu không hợp lệ: {}", field),
            field,
        }
    }
}

/// Error payload carried in the envelope's `data`
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message_en: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

/// Error response structure
pub type ErrorResponse = ApiResponse<ErrorDetail>;

/// Build an error envelope
pub fn error_envelope(
    status: StatusCode,
    code: &str,
    message_vi: String,
    message_en: String,
    field: Option<String>,
) -> ErrorResponse {
    ApiResponse {
        status_code: status.as_u16(),
        message: message_vi,
        data: Some(ErrorDetail {
            code: code.to_string(),
            message_en,
            field,
        }),
    }
}

impl AppError {
    /// Status code, machine code, Vietnamese message and optional field
    fn parts(&self) -> (StatusCode, &'static str, String, Option<String>) {
        match self {
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS",
                "Tên đăng nhập hoặc mật khẩu không đúng".to_string(),
                None,
            ),
            AppError::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                "TOKEN_EXPIRED",
                "Phiên đăng nhập đã hết hạn".to_string(),
                None,
            ),
            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "INVALID_TOKEN",
                "Mã xác thực không hợp lệ".to_string(),
                None,
            ),
            AppError::InsufficientPermissions => (
                StatusCode::FORBIDDEN,
                "INSUFFICIENT_PERMISSIONS",
                "Bạn không có quyền thực hiện thao tác này".to_string(),
                None,
            ),
            AppError::Unauthorized { message_vi, .. } => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                message_vi.clone(),
                None,
            ),
            AppError::Validation { field, message_vi, .. } => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                message_vi.clone(),
                Some(field.clone()),
            ),
            AppError::DuplicateEntry(field) => (
                StatusCode::CONFLICT,
                "DUPLICATE_ENTRY",
                format!("Giá trị {} đã tồn tại", field),
                Some(field.clone()),
            ),
            AppError::Conflict { resource, message_vi, .. } => (
                StatusCode::CONFLICT,
                "CONFLICT",
                message_vi.clone(),
                Some(resource.clone()),
            ),
            AppError::NotFound { entity_vi, .. } => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("Không tìm thấy {}", entity_vi),
                None,
            ),
            AppError::Transition(e) if e.is_forbidden() => (
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                e.message_vi(),
                None,
            ),
            AppError::Transition(e) => (
                StatusCode::BAD_REQUEST,
                "INVALID_STATE_TRANSITION",
                e.message_vi(),
                None,
            ),
            AppError::InsufficientQuantity(e) => (
                StatusCode::BAD_REQUEST,
                "INSUFFICIENT_QUANTITY",
                e.message_vi(),
                None,
            ),
            AppError::InsufficientStock(e) => (
                StatusCode::BAD_REQUEST,
                "INSUFFICIENT_STOCK",
                e.message_vi(),
                Some(e.goods_id.to_string()),
            ),
            AppError::Allocation(e) => (
                StatusCode::BAD_REQUEST,
                "INVALID_ALLOCATION",
                e.message_vi(),
                None,
            ),
            AppError::Inspection(e) => (
                StatusCode::BAD_REQUEST,
                "INVALID_INSPECTION",
                e.message_vi(),
                None,
            ),
            AppError::IncompleteLines { message_vi, .. } => (
                StatusCode::BAD_REQUEST,
                "INCOMPLETE_LINES",
                message_vi.clone(),
                None,
            ),
            AppError::DatabaseError(_) | AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "SYSTEM_ERROR",
                "Lỗi hệ thống, vui lòng thử lại sau".to_string(),
                None,
            ),
        }
    }

    /// Envelope for this error
    pub fn to_envelope(&self) -> (StatusCode, ErrorResponse) {
        let (status, code, message_vi, field) = self.parts();
        let message_en = match self {
            // The cause stays in the logs
            AppError::DatabaseError(_) | AppError::Internal(_) => {
                "A system error occurred".to_string()
            }
            other => other.to_string(),
        };
        (
            status,
            error_envelope(status, code, message_vi, message_en, field),
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.to_envelope();

        if status.is_server_error() {
            tracing::error!("Error: {:?}", self);
        } else {
            tracing::warn!("Request rejected: {}", self);
        }

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers and services
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{PurchaseOrderAction, PurchaseOrderStatus, PurchaseOrderWorkflow, Workflow};
    use uuid::Uuid;

    #[test]
    fn test_database_errors_are_masked() {
        let (status, body) = AppError::DatabaseError(sqlx::Error::RowNotFound).to_envelope();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.status_code, 500);
        assert_eq!(body.message, "Lỗi hệ thống, vui lòng thử lại sau");
        let detail = body.data.unwrap();
        assert_eq!(detail.code, "SYSTEM_ERROR");
        assert!(!detail.message_en.contains("no rows"));
    }

    #[test]
    fn test_internal_errors_are_masked() {
        let (status, body) = AppError::Internal("CSV writer error: disk full".into()).to_envelope();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let detail = body.data.unwrap();
        assert_eq!(detail.code, "SYSTEM_ERROR");
        assert_eq!(detail.message_en, "A system error occurred");
    }

    #[test]
    fn test_allocation_of_unstored_pallet() {
        let (status, body) =
            AppError::from(AllocationError::NotStored(shared::PalletStatus::Unassigned)).to_envelope();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.data.unwrap().code, "INVALID_ALLOCATION");
        assert!(body.message.contains("vị trí"));
    }

    #[test]
    fn test_not_found_message() {
        let (status, body) = AppError::not_found("Pallet", "pallet").to_envelope();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.message, "Không tìm thấy pallet");
    }

    #[test]
    fn test_transition_error_is_bad_request() {
        let err = PurchaseOrderWorkflow::next_status(
            PurchaseOrderStatus::Completed,
            PurchaseOrderAction::Approve,
        )
        .unwrap_err();
        let (status, body) = AppError::from(err).to_envelope();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.data.unwrap().code, "INVALID_STATE_TRANSITION");
    }

    #[test]
    fn test_insufficient_quantity_message() {
        let err = PalletQuantityError::Insufficient {
            pallet_id: Uuid::nil(),
            available: 5,
            requested: 10,
        };
        let (status, body) = AppError::from(err).to_envelope();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.message.contains("không đủ"));
    }

    #[test]
    fn test_envelope_shape() {
        let (_, body) = AppError::invalid("action", "Thao tác không hợp lệ").to_envelope();
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "status_code": 400,
                "message": "Thao tác không hợp lệ",
                "data": {
                    "code": "VALIDATION_ERROR",
                    "message_en": "Validation error: Invalid value for action",
                    "field": "action"
                }
            })
        );
    }
}
