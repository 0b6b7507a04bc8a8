//! Purchase orders: creation, editing and the approval/arrival lifecycle

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;
use validator::Validate;

use shared::{
    order_total, validate_arrival_date, validate_order_lines, ActorContext,
    CreatePurchaseOrderInput, PaginatedResponse, Pagination, PurchaseOrder, PurchaseOrderAction,
    PurchaseOrderStatus, PurchaseOrderTransitionInput, PurchaseOrderWithDetails,
    PurchaseOrderWorkflow, Role, UpdatePurchaseOrderInput, Workflow,
};

use super::notification::{draft, notify};
use super::{approver_pool, ensure_goods_exist, ensure_user_with_role, next_code, rejection_reason, today};
use crate::config::WarehouseConfig;
use crate::error::{AppError, AppResult};
use crate::middleware::{require_any_role, AuthUser};
use crate::repositories::{catalog, purchase_orders, StatusChange};
use crate::unit_of_work::UnitOfWork;

const BUYER_ROLES: &[Role] = &[Role::Admin, Role::WarehouseManager, Role::Purchaser];

#[derive(Clone)]
pub struct PurchaseOrderService {
    db: PgPool,
    notify_approver_pool: bool,
}

impl PurchaseOrderService {
    pub fn new(db: PgPool, config: &WarehouseConfig) -> Self {
        Self {
            db,
            notify_approver_pool: config.notify_approver_pool,
        }
    }

    pub async fn create(
        &self,
        actor: &AuthUser,
        input: CreatePurchaseOrderInput,
    ) -> AppResult<PurchaseOrderWithDetails> {
        require_any_role(actor, BUYER_ROLES)?;
        input.validate()?;
        validate_order_lines(&input.details).map_err(|m| AppError::invalid("details", m))?;

        let mut uow = UnitOfWork::begin(&self.db, "purchase_order.create").await?;
        let conn = uow.conn()?;

        catalog::find_supplier(conn, input.supplier_id)
            .await?
            .ok_or_else(|| AppError::not_found("Supplier", "nhà cung cấp"))?;
        let goods_ids: Vec<Uuid> = input.details.iter().map(|d| d.goods_id).collect();
        ensure_goods_exist(conn, &goods_ids).await?;

        let code = next_code(conn, "purchase_orders", "PO").await?;
        let order = purchase_orders::insert(
            conn,
            &code,
            input.supplier_id,
            input.note.as_deref(),
            actor.user_id,
        )
        .await?;
        purchase_orders::insert_details(conn, order.id, &input.details).await?;
        let result = load_with_details(conn, order).await?;
        uow.commit().await?;

        tracing::info!(
            purchase_order_id = %result.order.id,
            code = %result.order.code,
            lines = result.details.len(),
            actor = %actor.user_id,
            "purchase order created"
        );
        Ok(result)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<PurchaseOrderWithDetails> {
        let mut conn = self.db.acquire().await?;
        let order = purchase_orders::find_by_id(&mut conn, id)
            .await?
            .ok_or_else(order_not_found)?;
        load_with_details(&mut conn, order).await
    }

    pub async fn list(
        &self,
        status: Option<PurchaseOrderStatus>,
        pagination: &Pagination,
    ) -> AppResult<PaginatedResponse<PurchaseOrder>> {
        let (limit, offset) = pagination.limit_offset();
        let mut conn = self.db.acquire().await?;
        let (orders, total) = purchase_orders::list(&mut conn, status, limit, offset).await?;
        Ok(PaginatedResponse::new(orders, pagination, total as u64))
    }

    /// Replace the lines of a draft or rejected order; creator only
    pub async fn update(
        &self,
        actor: &AuthUser,
        id: Uuid,
        input: UpdatePurchaseOrderInput,
    ) -> AppResult<PurchaseOrderWithDetails> {
        input.validate()?;
        validate_order_lines(&input.details).map_err(|m| AppError::invalid("details", m))?;

        let mut uow = UnitOfWork::begin(&self.db, "purchase_order.update").await?;
        let conn = uow.conn()?;

        let order = purchase_orders::lock_by_id(conn, id)
            .await?
            .ok_or_else(order_not_found)?;
        if order.created_by != actor.user_id {
            return Err(AppError::InsufficientPermissions);
        }
        if !order.status.is_editable() {
            return Err(not_editable(order.status));
        }

        let goods_ids: Vec<Uuid> = input.details.iter().map(|d| d.goods_id).collect();
        ensure_goods_exist(conn, &goods_ids).await?;
        purchase_orders::replace_details(conn, order.id, &input.details).await?;
        purchase_orders::update_note(conn, order.id, input.note.as_deref()).await?;

        let order = purchase_orders::find_by_id(conn, id)
            .await?
            .ok_or_else(order_not_found)?;
        let result = load_with_details(conn, order).await?;
        uow.commit().await?;

        tracing::info!(purchase_order_id = %id, lines = result.details.len(), "purchase order updated");
        Ok(result)
    }

    /// Delete a draft; creator only
    pub async fn delete(&self, actor: &AuthUser, id: Uuid) -> AppResult<()> {
        let mut uow = UnitOfWork::begin(&self.db, "purchase_order.delete").await?;
        let conn = uow.conn()?;

        let order = purchase_orders::lock_by_id(conn, id)
            .await?
            .ok_or_else(order_not_found)?;
        if order.created_by != actor.user_id {
            return Err(AppError::InsufficientPermissions);
        }
        if order.status != PurchaseOrderStatus::Draft {
            return Err(AppError::Conflict {
                resource: "purchase_order".to_string(),
                message: format!("Only draft orders can be deleted, order is {}", order.status),
                message_vi: "Chỉ được xóa đơn mua hàng ở trạng thái nháp".to_string(),
            });
        }
        purchase_orders::delete(conn, id).await?;
        uow.commit().await?;

        tracing::info!(purchase_order_id = %id, code = %order.code, "purchase order deleted");
        Ok(())
    }

    /// Apply one workflow action with its payload
    pub async fn update_status(
        &self,
        actor: &AuthUser,
        id: Uuid,
        action: PurchaseOrderAction,
        input: PurchaseOrderTransitionInput,
    ) -> AppResult<PurchaseOrderWithDetails> {
        let mut uow = UnitOfWork::begin(&self.db, "purchase_order.update_status").await?;
        let conn = uow.conn()?;

        let order = purchase_orders::lock_by_id(conn, id)
            .await?
            .ok_or_else(order_not_found)?;
        let ctx = ActorContext {
            user_id: actor.user_id,
            role: actor.role,
            creator_id: order.created_by,
            assignee_id: order.assigned_to,
        };
        let next = PurchaseOrderWorkflow::validate(&ctx, order.status, action)?;

        let mut change = StatusChange::default();
        let mut arrival_date = None;
        let mut recipients: Vec<Uuid> = Vec::new();
        let (title, message) = match action {
            PurchaseOrderAction::Submit => {
                if purchase_orders::details(conn, id).await?.is_empty() {
                    return Err(AppError::IncompleteLines {
                        message: "Purchase order has no lines".to_string(),
                        message_vi: "Đơn mua hàng chưa có mặt hàng nào".to_string(),
                    });
                }
                if self.notify_approver_pool {
                    recipients = approver_pool::<PurchaseOrderWorkflow>(conn).await?;
                }
                (
                    "Đơn mua hàng chờ duyệt".to_string(),
                    format!("Đơn mua hàng {} đang chờ duyệt", order.code),
                )
            }
            PurchaseOrderAction::Approve => {
                change.approval_by = Some(actor.user_id);
                change.approved = true;
                recipients.push(order.created_by);
                (
                    "Đơn mua hàng đã được duyệt".to_string(),
                    format!("Đơn mua hàng {} đã được duyệt", order.code),
                )
            }
            PurchaseOrderAction::Reject => {
                let reason = rejection_reason(input.rejection_reason.as_deref())?;
                let message = format!("Đơn mua hàng {} bị từ chối: {}", order.code, reason);
                change.approval_by = Some(actor.user_id);
                change.rejection_reason = Some(reason);
                recipients.push(order.created_by);
                ("Đơn mua hàng bị từ chối".to_string(), message)
            }
            PurchaseOrderAction::ConfirmArrival => {
                let date = input.estimated_arrival_date.ok_or_else(|| {
                    AppError::invalid("estimated_arrival_date", "Vui lòng nhập ngày dự kiến hàng về")
                })?;
                validate_arrival_date(date, today())
                    .map_err(|m| AppError::invalid("estimated_arrival_date", m))?;
                arrival_date = Some(date);
                (
                    "Đơn mua hàng chờ hàng về".to_string(),
                    format!("Đơn mua hàng {} dự kiến về ngày {}", order.code, date),
                )
            }
            PurchaseOrderAction::ReceiveGoods => {
                let assignee = input.assignee_id.ok_or_else(|| {
                    AppError::invalid("assignee_id", "Vui lòng chọn thủ kho nhận hàng")
                })?;
                ensure_user_with_role(conn, assignee, Role::WarehouseKeeper, "assignee_id").await?;
                change.assigned_to = Some(assignee);
                recipients.push(assignee);
                (
                    "Nhận hàng theo đơn mua".to_string(),
                    format!("Bạn được phân công nhận hàng cho đơn mua hàng {}", order.code),
                )
            }
            PurchaseOrderAction::Complete => {
                recipients.push(order.created_by);
                (
                    "Đơn mua hàng hoàn tất".to_string(),
                    format!("Đơn mua hàng {} đã hoàn tất", order.code),
                )
            }
            PurchaseOrderAction::Cancel => (
                "Đơn mua hàng đã hủy".to_string(),
                format!("Đơn mua hàng {} đã bị hủy", order.code),
            ),
        };

        let updated = purchase_orders::update_status(conn, id, next, &change, arrival_date).await?;
        notify(
            conn,
            draft(PurchaseOrderWorkflow::DOCUMENT, id, recipients, title, message),
            actor.user_id,
        )
        .await?;
        let result = load_with_details(conn, updated).await?;
        uow.commit().await?;

        tracing::info!(
            document = PurchaseOrderWorkflow::DOCUMENT,
            id = %id,
            action = %action,
            from = %order.status,
            to = %next,
            actor = %actor.user_id,
            "status changed"
        );
        Ok(result)
    }
}

fn order_not_found() -> AppError {
    AppError::not_found("Purchase order", "đơn mua hàng")
}

fn not_editable(status: PurchaseOrderStatus) -> AppError {
    AppError::Conflict {
        resource: "purchase_order".to_string(),
        message: format!("Order lines cannot be edited in status {}", status),
        message_vi: "Chỉ được sửa đơn mua hàng ở trạng thái nháp hoặc bị từ chối".to_string(),
    }
}

async fn load_with_details(
    conn: &mut PgConnection,
    order: PurchaseOrder,
) -> AppResult<PurchaseOrderWithDetails> {
    let details = purchase_orders::details(conn, order.id).await?;
    Ok(PurchaseOrderWithDetails {
        total_amount: order_total(&details),
        allowed_actions: PurchaseOrderWorkflow::allowed_actions(order.status),
        order,
        details,
    })
}
