//! Sales orders: availability-checked orders from retailers

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;
use validator::Validate;

use shared::{
    check_availability, sales_order_total, validate_delivery_date, validate_order_lines,
    ActorContext, CreateSalesOrderInput, PaginatedResponse, Pagination, Role, SalesOrder,
    SalesOrderAction, SalesOrderDetail, SalesOrderStatus, SalesOrderTransitionInput,
    SalesOrderWithDetails, SalesOrderWorkflow, Workflow,
};

use super::notification::{draft, notify};
use super::{approver_pool, ensure_goods_exist, ensure_user_with_role, next_code, rejection_reason, today};
use crate::config::WarehouseConfig;
use crate::error::{AppError, AppResult};
use crate::middleware::{require_any_role, AuthUser};
use crate::repositories::{catalog, goods_issues, ledger, sales_orders, StatusChange};
use crate::unit_of_work::UnitOfWork;

const SELLER_ROLES: &[Role] = &[Role::Admin, Role::SalesManager, Role::SalesRepresentative];

#[derive(Clone)]
pub struct SalesOrderService {
    db: PgPool,
    notify_approver_pool: bool,
}

impl SalesOrderService {
    pub fn new(db: PgPool, config: &WarehouseConfig) -> Self {
        Self {
            db,
            notify_approver_pool: config.notify_approver_pool,
        }
    }

    /// Create a draft order; every line must be covered by available stock
    pub async fn create(
        &self,
        actor: &AuthUser,
        input: CreateSalesOrderInput,
    ) -> AppResult<SalesOrderWithDetails> {
        require_any_role(actor, SELLER_ROLES)?;
        input.validate()?;
        validate_order_lines(&input.details).map_err(|m| AppError::invalid("details", m))?;
        if let Some(date) = input.requested_delivery_date {
            validate_delivery_date(date, today())
                .map_err(|m| AppError::invalid("requested_delivery_date", m))?;
        }

        let mut uow = UnitOfWork::begin(&self.db, "sales_order.create").await?;
        let conn = uow.conn()?;

        catalog::find_retailer(conn, input.retailer_id)
            .await?
            .ok_or_else(|| AppError::not_found("Retailer", "nhà bán lẻ"))?;
        let lines: Vec<(Uuid, i32)> = input.details.iter().map(|d| (d.goods_id, d.quantity)).collect();
        let goods_ids: Vec<Uuid> = lines.iter().map(|(g, _)| *g).collect();
        ensure_goods_exist(conn, &goods_ids).await?;
        ensure_available(conn, &lines, None).await?;

        let code = next_code(conn, "sales_orders", "SO").await?;
        let order = sales_orders::insert(conn, &code, &input, actor.user_id).await?;
        sales_orders::insert_details(conn, order.id, &input.details).await?;
        let result = load_with_details(conn, order).await?;
        uow.commit().await?;

        tracing::info!(
            sales_order_id = %result.order.id,
            code = %result.order.code,
            lines = result.details.len(),
            actor = %actor.user_id,
            "sales order created"
        );
        Ok(result)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<SalesOrderWithDetails> {
        let mut conn = self.db.acquire().await?;
        let order = sales_orders::find_by_id(&mut conn, id)
            .await?
            .ok_or_else(order_not_found)?;
        load_with_details(&mut conn, order).await
    }

    pub async fn list(
        &self,
        status: Option<SalesOrderStatus>,
        pagination: &Pagination,
    ) -> AppResult<PaginatedResponse<SalesOrder>> {
        let (limit, offset) = pagination.limit_offset();
        let mut conn = self.db.acquire().await?;
        let (orders, total) = sales_orders::list(&mut conn, status, limit, offset).await?;
        Ok(PaginatedResponse::new(orders, pagination, total as u64))
    }

    pub async fn update_status(
        &self,
        actor: &AuthUser,
        id: Uuid,
        action: SalesOrderAction,
        input: SalesOrderTransitionInput,
    ) -> AppResult<SalesOrderWithDetails> {
        let mut uow = UnitOfWork::begin(&self.db, "sales_order.update_status").await?;
        let conn = uow.conn()?;

        let order = sales_orders::lock_by_id(conn, id)
            .await?
            .ok_or_else(order_not_found)?;
        let ctx = ActorContext {
            user_id: actor.user_id,
            role: actor.role,
            creator_id: order.created_by,
            assignee_id: order.assigned_to,
        };
        let next = SalesOrderWorkflow::validate(&ctx, order.status, action)?;
        let details = sales_orders::details(conn, id).await?;

        let mut change = StatusChange::default();
        let mut recipients: Vec<Uuid> = Vec::new();
        let (title, message) = match action {
            SalesOrderAction::Submit => {
                if details.is_empty() {
                    return Err(AppError::IncompleteLines {
                        message: "Sales order has no lines".to_string(),
                        message_vi: "Đơn bán hàng chưa có mặt hàng nào".to_string(),
                    });
                }
                ensure_available(conn, &detail_lines(&details), Some(id)).await?;
                if self.notify_approver_pool {
                    recipients = approver_pool::<SalesOrderWorkflow>(conn).await?;
                }
                (
                    "Đơn bán hàng chờ duyệt".to_string(),
                    format!("Đơn bán hàng {} đang chờ duyệt", order.code),
                )
            }
            SalesOrderAction::Approve => {
                // Stock may have moved since submission
                ensure_available(conn, &detail_lines(&details), Some(id)).await?;
                change.approval_by = Some(actor.user_id);
                change.approved = true;
                recipients.push(order.created_by);
                (
                    "Đơn bán hàng đã được duyệt".to_string(),
                    format!("Đơn bán hàng {} đã được duyệt", order.code),
                )
            }
            SalesOrderAction::Reject => {
                let reason = rejection_reason(input.rejection_reason.as_deref())?;
                let message = format!("Đơn bán hàng {} bị từ chối: {}", order.code, reason);
                change.approval_by = Some(actor.user_id);
                change.rejection_reason = Some(reason);
                recipients.push(order.created_by);
                ("Đơn bán hàng bị từ chối".to_string(), message)
            }
            SalesOrderAction::AssignForPicking => {
                let assignee = input.assignee_id.ok_or_else(|| {
                    AppError::invalid("assignee_id", "Vui lòng chọn thủ kho soạn hàng")
                })?;
                ensure_user_with_role(conn, assignee, Role::WarehouseKeeper, "assignee_id").await?;
                change.assigned_to = Some(assignee);

                let code = next_code(conn, "goods_issue_notes", "GIN").await?;
                let note = goods_issues::insert(conn, &code, id, actor.user_id, assignee).await?;
                goods_issues::insert_details_from_order(conn, note.id, id).await?;
                tracing::info!(
                    goods_issue_note_id = %note.id,
                    sales_order_id = %id,
                    assignee = %assignee,
                    "goods issue note created"
                );

                recipients.push(assignee);
                (
                    "Phân công soạn hàng".to_string(),
                    format!(
                        "Bạn được phân công soạn hàng cho đơn {} (phiếu xuất {})",
                        order.code, note.code
                    ),
                )
            }
            SalesOrderAction::Complete => {
                return Err(AppError::Conflict {
                    resource: "sales_order".to_string(),
                    message: "Sales orders complete through goods issue approval".to_string(),
                    message_vi: "Đơn bán hàng chỉ hoàn tất khi phiếu xuất kho được duyệt"
                        .to_string(),
                });
            }
            SalesOrderAction::Cancel => (
                "Đơn bán hàng đã hủy".to_string(),
                format!("Đơn bán hàng {} đã bị hủy", order.code),
            ),
        };

        let updated = sales_orders::update_status(conn, id, next, &change).await?;
        notify(
            conn,
            draft(SalesOrderWorkflow::DOCUMENT, id, recipients, title, message),
            actor.user_id,
        )
        .await?;
        let result = SalesOrderWithDetails {
            total_amount: sales_order_total(&details),
            allowed_actions: user_actions(updated.status),
            order: updated,
            details,
        };
        uow.commit().await?;

        tracing::info!(
            document = SalesOrderWorkflow::DOCUMENT,
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
    AppError::not_found("Sales order", "đơn bán hàng")
}

/// Actions a user can request directly; completion follows the goods issue
fn user_actions(status: SalesOrderStatus) -> Vec<SalesOrderAction> {
    SalesOrderWorkflow::allowed_actions(status)
        .into_iter()
        .filter(|a| *a != SalesOrderAction::Complete)
        .collect()
}

fn detail_lines(details: &[SalesOrderDetail]) -> Vec<(Uuid, i32)> {
    details.iter().map(|d| (d.goods_id, d.quantity)).collect()
}

/// Lock the goods rows, then check `stock - committed >= requested` for every
/// line. `excluding_order` leaves an order's own lines out of the committed sum.
pub(crate) async fn ensure_available(
    conn: &mut PgConnection,
    lines: &[(Uuid, i32)],
    excluding_order: Option<Uuid>,
) -> AppResult<()> {
    let goods_ids: Vec<Uuid> = lines.iter().map(|(g, _)| *g).collect();
    catalog::lock_goods(conn, &goods_ids).await?;
    let levels = ledger::stock_levels(conn, &goods_ids, excluding_order).await?;
    check_availability(lines, &levels)?;
    Ok(())
}

async fn load_with_details(
    conn: &mut PgConnection,
    order: SalesOrder,
) -> AppResult<SalesOrderWithDetails> {
    let details = sales_orders::details(conn, order.id).await?;
    Ok(SalesOrderWithDetails {
        total_amount: sales_order_total(&details),
        allowed_actions: user_actions(order.status),
        order,
        details,
    })
}
