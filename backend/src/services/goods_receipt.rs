//! Goods receipt notes: inspecting a purchase order delivery into stock

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;
use validator::Validate;

use shared::{
    all_details_inspected, inspect_quantities, ActorContext, CreateGoodsReceiptNoteInput,
    GoodsReceiptNote, GoodsReceiptNoteAction, GoodsReceiptNoteDetail, GoodsReceiptNoteStatus,
    GoodsReceiptNoteWithDetails, GoodsReceiptNoteWorkflow, GoodsReceiptTransitionInput,
    InspectDetailInput, LedgerDraft, LedgerReason, PaginatedResponse, Pagination,
    PurchaseOrderAction, PurchaseOrderStatus, PurchaseOrderWorkflow, Workflow,
};

use super::notification::{draft, notify};
use super::{approver_pool, next_code, rejection_reason};
use crate::config::WarehouseConfig;
use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::repositories::{goods_receipts, ledger, purchase_orders, StatusChange};
use crate::unit_of_work::UnitOfWork;

#[derive(Clone)]
pub struct GoodsReceiptService {
    db: PgPool,
    notify_approver_pool: bool,
}

impl GoodsReceiptService {
    pub fn new(db: PgPool, config: &WarehouseConfig) -> Self {
        Self {
            db,
            notify_approver_pool: config.notify_approver_pool,
        }
    }

    /// Open a receipt for a purchase order whose goods have arrived.
    ///
    /// The note is assigned to the keeper who received the delivery and gets
    /// one pending line per order line.
    pub async fn create(
        &self,
        actor: &AuthUser,
        input: CreateGoodsReceiptNoteInput,
    ) -> AppResult<GoodsReceiptNoteWithDetails> {
        let mut uow = UnitOfWork::begin(&self.db, "goods_receipt.create").await?;
        let conn = uow.conn()?;

        let order = purchase_orders::lock_by_id(conn, input.purchase_order_id)
            .await?
            .ok_or_else(|| AppError::not_found("Purchase order", "đơn mua hàng"))?;
        if order.status != PurchaseOrderStatus::GoodsReceived {
            return Err(AppError::invalid(
                "purchase_order_id",
                "Đơn mua hàng chưa ở trạng thái đã nhận hàng",
            ));
        }
        let assignee = order.assigned_to.ok_or_else(|| {
            AppError::invalid("purchase_order_id", "Đơn mua hàng chưa có thủ kho nhận hàng")
        })?;
        let is_approver = GoodsReceiptNoteWorkflow::approvers().contains(&actor.role);
        if actor.user_id != assignee && !is_approver {
            return Err(AppError::InsufficientPermissions);
        }

        let code = next_code(conn, "goods_receipt_notes", "GRN").await?;
        let note = goods_receipts::insert(conn, &code, order.id, actor.user_id, assignee).await?;
        goods_receipts::insert_details_from_order(conn, note.id, order.id).await?;
        let result = load_with_details(conn, note).await?;
        uow.commit().await?;

        tracing::info!(
            goods_receipt_note_id = %result.note.id,
            purchase_order_id = %order.id,
            lines = result.details.len(),
            "goods receipt note created"
        );
        Ok(result)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<GoodsReceiptNoteWithDetails> {
        let mut conn = self.db.acquire().await?;
        let note = goods_receipts::find_by_id(&mut conn, id)
            .await?
            .ok_or_else(note_not_found)?;
        load_with_details(&mut conn, note).await
    }

    pub async fn list(
        &self,
        status: Option<GoodsReceiptNoteStatus>,
        pagination: &Pagination,
    ) -> AppResult<PaginatedResponse<GoodsReceiptNote>> {
        let (limit, offset) = pagination.limit_offset();
        let mut conn = self.db.acquire().await?;
        let (notes, total) = goods_receipts::list(&mut conn, status, limit, offset).await?;
        Ok(PaginatedResponse::new(notes, pagination, total as u64))
    }

    /// Record received and rejected packages for one line; assignee only
    pub async fn inspect_detail(
        &self,
        actor: &AuthUser,
        detail_id: Uuid,
        input: InspectDetailInput,
    ) -> AppResult<GoodsReceiptNoteDetail> {
        input.validate()?;

        let mut uow = UnitOfWork::begin(&self.db, "goods_receipt.inspect_detail").await?;
        let conn = uow.conn()?;

        let detail = goods_receipts::lock_detail(conn, detail_id)
            .await?
            .ok_or_else(|| AppError::not_found("Goods receipt detail", "dòng phiếu nhập kho"))?;
        let note = goods_receipts::lock_by_id(conn, detail.goods_receipt_note_id)
            .await?
            .ok_or_else(note_not_found)?;
        if note.assigned_to != actor.user_id {
            return Err(AppError::InsufficientPermissions);
        }
        if !note.status.accepts_inspection() {
            return Err(AppError::Conflict {
                resource: "goods_receipt_note".to_string(),
                message: format!("Inspection is closed in status {}", note.status),
                message_vi: "Phiếu nhập kho không còn cho phép kiểm tra".to_string(),
            });
        }

        let accepted = inspect_quantities(
            detail.expected_quantity,
            input.received_quantity,
            input.rejected_quantity,
        )?;
        let inspected = goods_receipts::record_inspection(
            conn,
            detail.id,
            input.received_quantity,
            input.rejected_quantity,
            input.note.as_deref(),
        )
        .await?;
        uow.commit().await?;

        tracing::info!(
            goods_receipt_note_id = %note.id,
            detail_id = %detail.id,
            received = input.received_quantity,
            rejected = input.rejected_quantity,
            accepted,
            "receipt line inspected"
        );
        Ok(inspected)
    }

    pub async fn update_status(
        &self,
        actor: &AuthUser,
        id: Uuid,
        action: GoodsReceiptNoteAction,
        input: GoodsReceiptTransitionInput,
    ) -> AppResult<GoodsReceiptNoteWithDetails> {
        let mut uow = UnitOfWork::begin(&self.db, "goods_receipt.update_status").await?;
        let conn = uow.conn()?;

        let note = goods_receipts::lock_by_id(conn, id)
            .await?
            .ok_or_else(note_not_found)?;
        let ctx = ActorContext {
            user_id: actor.user_id,
            role: actor.role,
            creator_id: note.created_by,
            assignee_id: Some(note.assigned_to),
        };
        let next = GoodsReceiptNoteWorkflow::validate(&ctx, note.status, action)?;
        let details = goods_receipts::details(conn, id).await?;

        let mut change = StatusChange::default();
        let mut recipients: Vec<Uuid> = Vec::new();
        let (title, message) = match action {
            GoodsReceiptNoteAction::Submit => {
                if !all_details_inspected(&details) {
                    return Err(AppError::IncompleteLines {
                        message: "Every receipt line must be inspected".to_string(),
                        message_vi: "Tất cả các dòng phiếu nhập phải được kiểm tra".to_string(),
                    });
                }
                if self.notify_approver_pool {
                    recipients = approver_pool::<GoodsReceiptNoteWorkflow>(conn).await?;
                }
                (
                    "Phiếu nhập kho chờ duyệt".to_string(),
                    format!("Phiếu nhập kho {} đang chờ duyệt", note.code),
                )
            }
            GoodsReceiptNoteAction::Approve => {
                change.approval_by = Some(actor.user_id);
                let purchaser = receive_into_stock(conn, &note, &details, actor).await?;
                recipients.push(note.assigned_to);
                recipients.push(purchaser);
                (
                    "Phiếu nhập kho đã được duyệt".to_string(),
                    format!("Phiếu nhập kho {} đã được duyệt, hàng đã nhập kho", note.code),
                )
            }
            GoodsReceiptNoteAction::Reject => {
                let reason = rejection_reason(input.rejection_reason.as_deref())?;
                let message = format!("Phiếu nhập kho {} bị từ chối: {}", note.code, reason);
                change.approval_by = Some(actor.user_id);
                change.rejection_reason = Some(reason);
                recipients.push(note.assigned_to);
                ("Phiếu nhập kho bị từ chối".to_string(), message)
            }
        };

        let updated = goods_receipts::update_status(conn, id, next, &change).await?;
        notify(
            conn,
            draft(GoodsReceiptNoteWorkflow::DOCUMENT, id, recipients, title, message),
            actor.user_id,
        )
        .await?;
        let result = GoodsReceiptNoteWithDetails {
            allowed_actions: GoodsReceiptNoteWorkflow::allowed_actions(updated.status),
            note: updated,
            details,
        };
        uow.commit().await?;

        tracing::info!(
            document = GoodsReceiptNoteWorkflow::DOCUMENT,
            id = %id,
            action = %action,
            from = %note.status,
            to = %next,
            actor = %actor.user_id,
            "status changed"
        );
        Ok(result)
    }
}

/// Approval side effects: receipt ledger rows for accepted packages and the
/// purchase order moved to `Completed`. Returns the order's creator.
async fn receive_into_stock(
    conn: &mut PgConnection,
    note: &GoodsReceiptNote,
    details: &[GoodsReceiptNoteDetail],
    actor: &AuthUser,
) -> AppResult<Uuid> {
    let drafts: Vec<LedgerDraft> = details
        .iter()
        .filter(|d| d.accepted_quantity() > 0)
        .map(|d| LedgerDraft {
            goods_id: d.goods_id,
            pallet_id: None,
            delta: d.accepted_quantity(),
            reason: LedgerReason::Receipt,
        })
        .collect();
    ledger::append(
        conn,
        &drafts,
        GoodsReceiptNoteWorkflow::DOCUMENT,
        note.id,
        actor.user_id,
    )
    .await?;

    let order = purchase_orders::lock_by_id(conn, note.purchase_order_id)
        .await?
        .ok_or_else(|| AppError::not_found("Purchase order", "đơn mua hàng"))?;
    let completed = PurchaseOrderWorkflow::next_status(order.status, PurchaseOrderAction::Complete)?;
    purchase_orders::update_status(conn, order.id, completed, &StatusChange::default(), None).await?;

    tracing::info!(
        document = PurchaseOrderWorkflow::DOCUMENT,
        id = %order.id,
        from = %order.status,
        to = %completed,
        "status changed by goods receipt approval"
    );
    Ok(order.created_by)
}

fn note_not_found() -> AppError {
    AppError::not_found("Goods receipt note", "phiếu nhập kho")
}

async fn load_with_details(
    conn: &mut PgConnection,
    note: GoodsReceiptNote,
) -> AppResult<GoodsReceiptNoteWithDetails> {
    let details = goods_receipts::details(conn, note.id).await?;
    Ok(GoodsReceiptNoteWithDetails {
        allowed_actions: GoodsReceiptNoteWorkflow::allowed_actions(note.status),
        note,
        details,
    })
}
