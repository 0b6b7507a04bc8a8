//! Goods issue notes: picking pallets for a sales order and shipping them

use std::collections::HashMap;

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;
use validator::Validate;

use shared::{
    all_details_picked, check_allocation, check_pickable, detail_status_for, plan_pallet_decrements,
    ActorContext, AllocateInput, GoodsIssueAllocation, GoodsIssueNote, GoodsIssueNoteAction,
    GoodsIssueNoteStatus, GoodsIssueNoteWithDetails, GoodsIssueNoteWorkflow,
    GoodsIssueTransitionInput, LedgerDraft, LedgerReason, PaginatedResponse, Pagination,
    PalletStock, SalesOrderAction, SalesOrderWorkflow, Workflow,
};

use super::notification::{draft, notify};
use super::pallet::apply_quantity_change;
use super::{approver_pool, rejection_reason};
use crate::config::WarehouseConfig;
use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::repositories::{goods_issues, ledger, pallets, sales_orders, StatusChange};
use crate::unit_of_work::UnitOfWork;

#[derive(Clone)]
pub struct GoodsIssueService {
    db: PgPool,
    notify_approver_pool: bool,
}

impl GoodsIssueService {
    pub fn new(db: PgPool, config: &WarehouseConfig) -> Self {
        Self {
            db,
            notify_approver_pool: config.notify_approver_pool,
        }
    }

    pub async fn get(&self, id: Uuid) -> AppResult<GoodsIssueNoteWithDetails> {
        let mut conn = self.db.acquire().await?;
        let note = goods_issues::find_by_id(&mut conn, id)
            .await?
            .ok_or_else(note_not_found)?;
        load_with_details(&mut conn, note).await
    }

    pub async fn list(
        &self,
        status: Option<GoodsIssueNoteStatus>,
        pagination: &Pagination,
    ) -> AppResult<PaginatedResponse<GoodsIssueNote>> {
        let (limit, offset) = pagination.limit_offset();
        let mut conn = self.db.acquire().await?;
        let (notes, total) = goods_issues::list(&mut conn, status, limit, offset).await?;
        Ok(PaginatedResponse::new(notes, pagination, total as u64))
    }

    /// Take packages from a pallet for one line while the note is being picked.
    ///
    /// A line whose allocations reach the requested quantity becomes `Picked`.
    pub async fn allocate(
        &self,
        actor: &AuthUser,
        detail_id: Uuid,
        input: AllocateInput,
    ) -> AppResult<GoodsIssueAllocation> {
        input.validate()?;

        let mut uow = UnitOfWork::begin(&self.db, "goods_issue.allocate").await?;
        let conn = uow.conn()?;

        let detail = goods_issues::lock_detail(conn, detail_id)
            .await?
            .ok_or_else(|| AppError::not_found("Goods issue detail", "dòng phiếu xuất kho"))?;
        let note = goods_issues::lock_by_id(conn, detail.goods_issue_note_id)
            .await?
            .ok_or_else(note_not_found)?;
        if note.assigned_to != actor.user_id {
            return Err(AppError::InsufficientPermissions);
        }
        if note.status != GoodsIssueNoteStatus::Picking {
            return Err(AppError::Conflict {
                resource: "goods_issue_note".to_string(),
                message: format!("Allocations need status picking, note is {}", note.status),
                message_vi: "Chỉ lấy hàng khi phiếu xuất kho đang soạn hàng".to_string(),
            });
        }

        let pallet = pallets::lock_by_id(conn, input.pallet_id)
            .await?
            .ok_or_else(|| AppError::not_found("Pallet", "pallet"))?;
        check_pickable(pallet.status)?;

        let already = goods_issues::allocated_to_detail(conn, detail.id).await?;
        let reserved = goods_issues::reserved_on_pallet(conn, pallet.id).await?;
        let allocated = check_allocation(
            &detail,
            already,
            pallet.id,
            PalletStock {
                goods_id: pallet.goods_id,
                package_quantity: pallet.package_quantity,
            },
            reserved,
            input.quantity,
        )?;

        let allocation =
            goods_issues::insert_allocation(conn, detail.id, pallet.id, input.quantity).await?;
        let status = detail_status_for(detail.requested_quantity, allocated);
        if status != detail.status {
            goods_issues::set_detail_status(conn, detail.id, status).await?;
        }
        uow.commit().await?;

        tracing::info!(
            goods_issue_note_id = %note.id,
            detail_id = %detail.id,
            pallet_id = %pallet.id,
            quantity = input.quantity,
            allocated,
            requested = detail.requested_quantity,
            "packages allocated"
        );
        Ok(allocation)
    }

    pub async fn update_status(
        &self,
        actor: &AuthUser,
        id: Uuid,
        action: GoodsIssueNoteAction,
        input: GoodsIssueTransitionInput,
    ) -> AppResult<GoodsIssueNoteWithDetails> {
        let mut uow = UnitOfWork::begin(&self.db, "goods_issue.update_status").await?;
        let conn = uow.conn()?;

        let note = goods_issues::lock_by_id(conn, id)
            .await?
            .ok_or_else(note_not_found)?;
        let ctx = ActorContext {
            user_id: actor.user_id,
            role: actor.role,
            creator_id: note.created_by,
            assignee_id: Some(note.assigned_to),
        };
        let next = GoodsIssueNoteWorkflow::validate(&ctx, note.status, action)?;

        let mut change = StatusChange::default();
        let mut recipients: Vec<Uuid> = Vec::new();
        let (title, message) = match action {
            GoodsIssueNoteAction::StartPicking => {
                recipients.push(note.created_by);
                (
                    "Bắt đầu soạn hàng".to_string(),
                    format!("Phiếu xuất kho {} đang được soạn hàng", note.code),
                )
            }
            GoodsIssueNoteAction::Submit => {
                let details = goods_issues::details(conn, id).await?;
                if !all_details_picked(&details) {
                    return Err(AppError::IncompleteLines {
                        message: "Every issue line must be fully picked".to_string(),
                        message_vi: "Tất cả các dòng phiếu xuất phải được lấy đủ hàng".to_string(),
                    });
                }
                if self.notify_approver_pool {
                    recipients = approver_pool::<GoodsIssueNoteWorkflow>(conn).await?;
                }
                (
                    "Phiếu xuất kho chờ duyệt".to_string(),
                    format!("Phiếu xuất kho {} đang chờ duyệt", note.code),
                )
            }
            GoodsIssueNoteAction::Approve => {
                change.approval_by = Some(actor.user_id);
                let seller = match ship(conn, &note, actor).await {
                    Ok(seller) => seller,
                    Err(e) => {
                        // Some pallets may already be decremented
                        uow.rollback().await?;
                        return Err(e);
                    }
                };
                recipients.push(note.assigned_to);
                recipients.push(seller);
                (
                    "Phiếu xuất kho đã được duyệt".to_string(),
                    format!("Phiếu xuất kho {} đã được duyệt, hàng đã xuất kho", note.code),
                )
            }
            GoodsIssueNoteAction::Reject => {
                let reason = rejection_reason(input.rejection_reason.as_deref())?;
                let message = format!("Phiếu xuất kho {} bị từ chối: {}", note.code, reason);
                change.approval_by = Some(actor.user_id);
                change.rejection_reason = Some(reason);
                recipients.push(note.assigned_to);
                ("Phiếu xuất kho bị từ chối".to_string(), message)
            }
        };

        let updated = goods_issues::update_status(conn, id, next, &change).await?;
        notify(
            conn,
            draft(GoodsIssueNoteWorkflow::DOCUMENT, id, recipients, title, message),
            actor.user_id,
        )
        .await?;
        let result = load_with_details(conn, updated).await?;
        uow.commit().await?;

        tracing::info!(
            document = GoodsIssueNoteWorkflow::DOCUMENT,
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

/// Approval side effects: decrement every allocated pallet, write issue ledger
/// rows and complete the sales order. Returns the sales order's creator.
///
/// The decrement plan is computed before the first write, so a shortfall on
/// any pallet leaves all pallets untouched.
async fn ship(conn: &mut PgConnection, note: &GoodsIssueNote, actor: &AuthUser) -> AppResult<Uuid> {
    let allocations = goods_issues::allocations(conn, note.id).await?;
    let mut pallet_ids: Vec<Uuid> = allocations.iter().map(|a| a.pallet_id).collect();
    pallet_ids.sort();
    pallet_ids.dedup();

    let locked = pallets::lock_many(conn, &pallet_ids).await?;
    let stock: HashMap<Uuid, PalletStock> = locked
        .iter()
        .map(|p| {
            (
                p.id,
                PalletStock {
                    goods_id: p.goods_id,
                    package_quantity: p.package_quantity,
                },
            )
        })
        .collect();
    let plan = plan_pallet_decrements(&allocations, &stock)?;

    let mut drafts = Vec::with_capacity(plan.len());
    for decrement in &plan {
        if let Some(pallet) = locked.iter().find(|p| p.id == decrement.pallet_id) {
            apply_quantity_change(conn, pallet, -decrement.quantity).await?;
        }
        drafts.push(LedgerDraft {
            goods_id: decrement.goods_id,
            pallet_id: Some(decrement.pallet_id),
            delta: -decrement.quantity,
            reason: LedgerReason::Issue,
        });
    }
    ledger::append(
        conn,
        &drafts,
        GoodsIssueNoteWorkflow::DOCUMENT,
        note.id,
        actor.user_id,
    )
    .await?;

    let order = sales_orders::lock_by_id(conn, note.sales_order_id)
        .await?
        .ok_or_else(|| AppError::not_found("Sales order", "đơn bán hàng"))?;
    let completed = SalesOrderWorkflow::next_status(order.status, SalesOrderAction::Complete)?;
    sales_orders::update_status(conn, order.id, completed, &StatusChange::default()).await?;

    tracing::info!(
        document = SalesOrderWorkflow::DOCUMENT,
        id = %order.id,
        from = %order.status,
        to = %completed,
        pallets = plan.len(),
        "status changed by goods issue approval"
    );
    Ok(order.created_by)
}

fn note_not_found() -> AppError {
    AppError::not_found("Goods issue note", "phiếu xuất kho")
}

async fn load_with_details(
    conn: &mut PgConnection,
    note: GoodsIssueNote,
) -> AppResult<GoodsIssueNoteWithDetails> {
    let details = goods_issues::details(conn, note.id).await?;
    let allocations = goods_issues::allocations(conn, note.id).await?;
    Ok(GoodsIssueNoteWithDetails {
        allowed_actions: GoodsIssueNoteWorkflow::allowed_actions(note.status),
        note,
        details,
        allocations,
    })
}
