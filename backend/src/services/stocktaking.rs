//! Stocktaking sheets: snapshot, count, reconcile

use std::collections::{HashMap, HashSet};

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;
use validator::Validate;

use shared::{
    all_pallets_counted, plan_adjustments, reconcile, ActorContext, CreateStocktakingInput, PaginatedResponse,
    Pagination, RecordCountInput, Role, StocktakingAction, StocktakingPallet, StocktakingSheet,
    StocktakingSheetWithDetails, StocktakingStatus, StocktakingTransitionInput,
    StocktakingVarianceRow, StocktakingWorkflow, Workflow,
};

use super::notification::{draft, notify};
use super::pallet::apply_quantity_change;
use super::{approver_pool, ensure_user_with_role, next_code, rejection_reason};
use crate::config::WarehouseConfig;
use crate::error::{AppError, AppResult};
use crate::middleware::{require_any_role, AuthUser};
use crate::repositories::{ledger, locations, pallets, stocktaking, StatusChange};
use crate::unit_of_work::UnitOfWork;

const PLANNER_ROLES: &[Role] = &[Role::Admin, Role::WarehouseManager];

#[derive(Clone)]
pub struct StocktakingService {
    db: PgPool,
    notify_approver_pool: bool,
}

impl StocktakingService {
    pub fn new(db: PgPool, config: &WarehouseConfig) -> Self {
        Self {
            db,
            notify_approver_pool: config.notify_approver_pool,
        }
    }

    /// Create a sheet over a set of areas.
    ///
    /// Every stored pallet in the areas' locations is snapshotted with its
    /// current package quantity as the expected figure.
    pub async fn create(
        &self,
        actor: &AuthUser,
        input: CreateStocktakingInput,
    ) -> AppResult<StocktakingSheetWithDetails> {
        require_any_role(actor, PLANNER_ROLES)?;
        input.validate()?;
        let mut seen = HashSet::new();
        if !input.areas.iter().all(|a| seen.insert(a.area_id)) {
            return Err(AppError::invalid("areas", "Mỗi khu vực chỉ được kiểm kê một lần trong phiếu"));
        }

        let mut uow = UnitOfWork::begin(&self.db, "stocktaking.create").await?;
        let conn = uow.conn()?;

        for area in &input.areas {
            locations::find_area(conn, area.area_id)
                .await?
                .ok_or_else(|| AppError::not_found("Area", "khu vực"))?;
            ensure_user_with_role(conn, area.assigned_to, Role::WarehouseKeeper, "assigned_to")
                .await?;
        }

        let code = next_code(conn, "stocktaking_sheets", "ST").await?;
        let sheet = stocktaking::insert_sheet(conn, &code, input.note.as_deref(), actor.user_id).await?;

        let mut snapshotted = 0usize;
        for area in &input.areas {
            let st_area = stocktaking::insert_area(conn, sheet.id, area.area_id, area.assigned_to).await?;
            let slots = locations::list_locations_in_areas(conn, &[area.area_id]).await?;
            let slot_ids: Vec<Uuid> = slots.iter().map(|l| l.id).collect();
            let stored = pallets::list_stored_in_locations(conn, &slot_ids).await?;
            for slot in &slots {
                let on_slot: Vec<_> = stored
                    .iter()
                    .filter(|p| p.location_id == Some(slot.id))
                    .collect();
                if on_slot.is_empty() {
                    continue;
                }
                let st_location = stocktaking::insert_location(conn, st_area.id, slot.id).await?;
                for pallet in on_slot {
                    stocktaking::insert_pallet(
                        conn,
                        st_location.id,
                        pallet.id,
                        pallet.goods_id,
                        pallet.package_quantity,
                    )
                    .await?;
                    snapshotted += 1;
                }
            }
        }

        let assignees: Vec<Uuid> = input.areas.iter().map(|a| a.assigned_to).collect();
        notify(
            conn,
            draft(
                StocktakingWorkflow::DOCUMENT,
                sheet.id,
                assignees,
                "Phân công kiểm kê".to_string(),
                format!("Bạn được phân công kiểm kê theo phiếu {}", sheet.code),
            ),
            actor.user_id,
        )
        .await?;
        let result = load_with_details(conn, sheet).await?;
        uow.commit().await?;

        tracing::info!(
            stocktaking_sheet_id = %result.sheet.id,
            code = %result.sheet.code,
            areas = result.areas.len(),
            pallets = snapshotted,
            actor = %actor.user_id,
            "stocktaking sheet created"
        );
        Ok(result)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<StocktakingSheetWithDetails> {
        let mut conn = self.db.acquire().await?;
        let sheet = stocktaking::find_sheet(&mut conn, id)
            .await?
            .ok_or_else(sheet_not_found)?;
        load_with_details(&mut conn, sheet).await
    }

    pub async fn list(
        &self,
        status: Option<StocktakingStatus>,
        pagination: &Pagination,
    ) -> AppResult<PaginatedResponse<StocktakingSheet>> {
        let (limit, offset) = pagination.limit_offset();
        let mut conn = self.db.acquire().await?;
        let (sheets, total) = stocktaking::list_sheets(&mut conn, status, limit, offset).await?;
        Ok(PaginatedResponse::new(sheets, pagination, total as u64))
    }

    /// Record the counted quantity of one snapshotted pallet
    pub async fn record_count(
        &self,
        actor: &AuthUser,
        stocktaking_pallet_id: Uuid,
        input: RecordCountInput,
    ) -> AppResult<StocktakingPallet> {
        input.validate()?;

        let mut uow = UnitOfWork::begin(&self.db, "stocktaking.record_count").await?;
        let conn = uow.conn()?;

        let target = stocktaking::count_target(conn, stocktaking_pallet_id)
            .await?
            .ok_or_else(|| AppError::not_found("Stocktaking pallet", "pallet kiểm kê"))?;
        let sheet = stocktaking::lock_sheet(conn, target.stocktaking_sheet_id)
            .await?
            .ok_or_else(sheet_not_found)?;
        if target.assigned_to != actor.user_id {
            return Err(AppError::InsufficientPermissions);
        }
        if !sheet.status.accepts_counts() {
            return Err(AppError::Conflict {
                resource: "stocktaking_sheet".to_string(),
                message: format!("Counts are not accepted while the sheet is {}", sheet.status),
                message_vi: "Phiếu kiểm kê không ở trạng thái ghi nhận số đếm".to_string(),
            });
        }

        let counted =
            stocktaking::record_count(conn, target.id, input.counted_quantity, actor.user_id).await?;
        uow.commit().await?;

        tracing::debug!(
            stocktaking_sheet_id = %sheet.id,
            pallet_id = %counted.pallet_id,
            expected = counted.expected_quantity,
            counted = input.counted_quantity,
            "pallet counted"
        );
        Ok(counted)
    }

    pub async fn update_status(
        &self,
        actor: &AuthUser,
        id: Uuid,
        action: StocktakingAction,
        input: StocktakingTransitionInput,
    ) -> AppResult<StocktakingSheetWithDetails> {
        let mut uow = UnitOfWork::begin(&self.db, "stocktaking.update_status").await?;
        let conn = uow.conn()?;

        let sheet = stocktaking::lock_sheet(conn, id)
            .await?
            .ok_or_else(sheet_not_found)?;
        let ctx = ActorContext {
            user_id: actor.user_id,
            role: actor.role,
            creator_id: sheet.created_by,
            assignee_id: None,
        };
        let next = StocktakingWorkflow::validate(&ctx, sheet.status, action)?;

        let mut change = StatusChange::default();
        let mut recipients: Vec<Uuid> = Vec::new();
        let (title, message) = match action {
            StocktakingAction::Start => {
                recipients = area_assignees(conn, id).await?;
                (
                    "Bắt đầu kiểm kê".to_string(),
                    format!("Phiếu kiểm kê {} đã bắt đầu", sheet.code),
                )
            }
            StocktakingAction::Submit => {
                let counted = stocktaking::pallets(conn, id).await?;
                if !all_pallets_counted(&counted) {
                    return Err(AppError::IncompleteLines {
                        message: "Every pallet must be counted".to_string(),
                        message_vi: "Tất cả pallet trong phiếu phải được đếm".to_string(),
                    });
                }
                if self.notify_approver_pool {
                    recipients = approver_pool::<StocktakingWorkflow>(conn).await?;
                }
                (
                    "Phiếu kiểm kê chờ duyệt".to_string(),
                    format!("Phiếu kiểm kê {} đang chờ duyệt", sheet.code),
                )
            }
            StocktakingAction::Approve => {
                change.approval_by = Some(actor.user_id);
                let adjusted = match apply_counts(conn, &sheet, actor).await {
                    Ok(adjusted) => adjusted,
                    Err(e) => {
                        uow.rollback().await?;
                        return Err(e);
                    }
                };
                recipients.push(sheet.created_by);
                recipients.extend(area_assignees(conn, id).await?);
                (
                    "Phiếu kiểm kê đã được duyệt".to_string(),
                    format!(
                        "Phiếu kiểm kê {} đã được duyệt, {} pallet được điều chỉnh",
                        sheet.code, adjusted
                    ),
                )
            }
            StocktakingAction::Reject => {
                let reason = rejection_reason(input.rejection_reason.as_deref())?;
                let message = format!("Phiếu kiểm kê {} bị từ chối: {}", sheet.code, reason);
                change.approval_by = Some(actor.user_id);
                change.rejection_reason = Some(reason);
                recipients.push(sheet.created_by);
                recipients.extend(area_assignees(conn, id).await?);
                ("Phiếu kiểm kê bị từ chối".to_string(), message)
            }
            StocktakingAction::Cancel => {
                recipients = area_assignees(conn, id).await?;
                (
                    "Phiếu kiểm kê đã hủy".to_string(),
                    format!("Phiếu kiểm kê {} đã bị hủy", sheet.code),
                )
            }
        };

        let updated = stocktaking::update_status(conn, id, next, &change).await?;
        notify(
            conn,
            draft(StocktakingWorkflow::DOCUMENT, id, recipients, title, message),
            actor.user_id,
        )
        .await?;
        let result = load_with_details(conn, updated).await?;
        uow.commit().await?;

        tracing::info!(
            document = StocktakingWorkflow::DOCUMENT,
            id = %id,
            action = %action,
            from = %sheet.status,
            to = %next,
            actor = %actor.user_id,
            "status changed"
        );
        Ok(result)
    }

    /// Expected vs counted per pallet, ordered by area and location code
    pub async fn variance_report(&self, id: Uuid) -> AppResult<Vec<StocktakingVarianceRow>> {
        let mut conn = self.db.acquire().await?;
        stocktaking::find_sheet(&mut conn, id)
            .await?
            .ok_or_else(sheet_not_found)?;
        stocktaking::variance_report(&mut conn, id).await
    }
}

/// Apply every non-zero variance to its pallet and write the adjustments to
/// the ledger. Returns the number of pallets changed.
async fn apply_counts(
    conn: &mut PgConnection,
    sheet: &StocktakingSheet,
    actor: &AuthUser,
) -> AppResult<usize> {
    let counted = stocktaking::pallets(conn, sheet.id).await?;
    let adjustments = reconcile(&counted);
    if adjustments.is_empty() {
        return Ok(0);
    }

    let ids: Vec<Uuid> = adjustments.iter().filter_map(|a| a.pallet_id).collect();
    let locked = pallets::lock_many(conn, &ids).await?;
    let current: HashMap<Uuid, i32> = locked.iter().map(|p| (p.id, p.package_quantity)).collect();
    plan_adjustments(&adjustments, &current)?;
    for adjustment in &adjustments {
        let pallet = locked
            .iter()
            .find(|p| Some(p.id) == adjustment.pallet_id)
            .ok_or_else(|| AppError::not_found("Pallet", "pallet"))?;
        apply_quantity_change(conn, pallet, adjustment.delta).await?;
    }
    ledger::append(
        conn,
        &adjustments,
        StocktakingWorkflow::DOCUMENT,
        sheet.id,
        actor.user_id,
    )
    .await?;
    Ok(adjustments.len())
}

async fn area_assignees(conn: &mut PgConnection, sheet_id: Uuid) -> AppResult<Vec<Uuid>> {
    Ok(stocktaking::areas(conn, sheet_id)
        .await?
        .into_iter()
        .map(|a| a.assigned_to)
        .collect())
}

fn sheet_not_found() -> AppError {
    AppError::not_found("Stocktaking sheet", "phiếu kiểm kê")
}

async fn load_with_details(
    conn: &mut PgConnection,
    sheet: StocktakingSheet,
) -> AppResult<StocktakingSheetWithDetails> {
    let areas = stocktaking::areas(conn, sheet.id).await?;
    let locations = stocktaking::locations(conn, sheet.id).await?;
    let pallets = stocktaking::pallets(conn, sheet.id).await?;
    Ok(StocktakingSheetWithDetails {
        allowed_actions: StocktakingWorkflow::allowed_actions(sheet.status),
        sheet,
        areas,
        locations,
        pallets,
    })
}
