//! Back orders: demand waiting for stock

use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use shared::{
    ActorContext, BackOrder, BackOrderAction, BackOrderStatus, BackOrderWorkflow,
    CreateBackOrderInput, PaginatedResponse, Pagination, Role, Workflow,
};

use super::ensure_goods_exist;
use super::notification::{draft, notify};
use super::sales_order::ensure_available;
use crate::error::{AppError, AppResult};
use crate::middleware::{require_any_role, AuthUser};
use crate::repositories::{back_orders, catalog};
use crate::unit_of_work::UnitOfWork;

const SELLER_ROLES: &[Role] = &[Role::Admin, Role::SalesManager, Role::SalesRepresentative];

#[derive(Clone)]
pub struct BackOrderService {
    db: PgPool,
}

impl BackOrderService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create(&self, actor: &AuthUser, input: CreateBackOrderInput) -> AppResult<BackOrder> {
        require_any_role(actor, SELLER_ROLES)?;
        input.validate()?;

        let mut uow = UnitOfWork::begin(&self.db, "back_order.create").await?;
        let conn = uow.conn()?;
        catalog::find_retailer(conn, input.retailer_id)
            .await?
            .ok_or_else(|| AppError::not_found("Retailer", "nhà bán lẻ"))?;
        ensure_goods_exist(conn, &[input.goods_id]).await?;
        let back_order = back_orders::insert(conn, &input, actor.user_id).await?;
        uow.commit().await?;

        tracing::info!(
            back_order_id = %back_order.id,
            goods_id = %back_order.goods_id,
            quantity = back_order.quantity,
            "back order created"
        );
        Ok(back_order)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<BackOrder> {
        let mut conn = self.db.acquire().await?;
        back_orders::find_by_id(&mut conn, id)
            .await?
            .ok_or_else(back_order_not_found)
    }

    pub async fn list(
        &self,
        status: Option<BackOrderStatus>,
        pagination: &Pagination,
    ) -> AppResult<PaginatedResponse<BackOrder>> {
        let (limit, offset) = pagination.limit_offset();
        let mut conn = self.db.acquire().await?;
        let (rows, total) = back_orders::list(&mut conn, status, limit, offset).await?;
        Ok(PaginatedResponse::new(rows, pagination, total as u64))
    }

    /// Fulfil or cancel a waiting back order.
    ///
    /// Fulfilment needs the full quantity to be available right now.
    pub async fn update_status(
        &self,
        actor: &AuthUser,
        id: Uuid,
        action: BackOrderAction,
    ) -> AppResult<BackOrder> {
        let mut uow = UnitOfWork::begin(&self.db, "back_order.update_status").await?;
        let conn = uow.conn()?;

        let back_order = back_orders::lock_by_id(conn, id)
            .await?
            .ok_or_else(back_order_not_found)?;
        let ctx = ActorContext {
            user_id: actor.user_id,
            role: actor.role,
            creator_id: back_order.created_by,
            assignee_id: None,
        };
        let next = BackOrderWorkflow::validate(&ctx, back_order.status, action)?;

        let message = match action {
            BackOrderAction::Fulfil => {
                ensure_available(conn, &[(back_order.goods_id, back_order.quantity)], None).await?;
                "Đơn hàng chờ đã được đáp ứng"
            }
            BackOrderAction::Cancel => "Đơn hàng chờ đã bị hủy",
        };

        let updated = back_orders::update_status(conn, id, next).await?;
        notify(
            conn,
            draft(
                BackOrderWorkflow::DOCUMENT,
                id,
                vec![back_order.created_by],
                message.to_string(),
                format!("{} ({} kiện)", message, back_order.quantity),
            ),
            actor.user_id,
        )
        .await?;
        uow.commit().await?;

        tracing::info!(
            document = BackOrderWorkflow::DOCUMENT,
            id = %id,
            action = %action,
            from = %back_order.status,
            to = %next,
            actor = %actor.user_id,
            "status changed"
        );
        Ok(updated)
    }
}

fn back_order_not_found() -> AppError {
    AppError::not_found("Back order", "đơn hàng chờ")
}
