//! Pallet lifecycle: palletizing receipts, put-away, moves and corrections

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;
use validator::Validate;

use shared::{
    adjust_package_quantity, check_palletized_total, palletized_quantity, sort_fefo,
    status_after_quantity, validate_shelf_life, AdjustPalletInput, CreatePalletInput, GoodsReceiptDetailStatus,
    GoodsReceiptNoteStatus, LedgerDraft, LedgerReason, Pallet, PalletStatus, Role,
};

use crate::error::{AppError, AppResult};
use crate::middleware::{require_any_role, AuthUser};
use crate::repositories::{goods_receipts, ledger, locations, pallets};
use crate::unit_of_work::UnitOfWork;

const HANDLING_ROLES: &[Role] = &[Role::Admin, Role::WarehouseManager, Role::WarehouseKeeper];
const CORRECTION_ROLES: &[Role] = &[Role::Admin, Role::WarehouseManager];

pub const PALLET_DOCUMENT: &str = "pallet";

#[derive(Clone)]
pub struct PalletService {
    db: PgPool,
}

impl PalletService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a pallet from an inspected line of an approved receipt
    pub async fn create(&self, actor: &AuthUser, input: CreatePalletInput) -> AppResult<Pallet> {
        require_any_role(actor, HANDLING_ROLES)?;
        input.validate()?;
        validate_shelf_life(input.manufacturing_date, input.expiry_date)
            .map_err(|m| AppError::invalid("expiry_date", m))?;

        let mut uow = UnitOfWork::begin(&self.db, "pallet.create").await?;
        let conn = uow.conn()?;

        let detail = goods_receipts::lock_detail(conn, input.goods_receipt_note_detail_id)
            .await?
            .ok_or_else(|| AppError::not_found("Goods receipt detail", "dòng phiếu nhập kho"))?;
        if detail.status != GoodsReceiptDetailStatus::Inspected {
            return Err(AppError::invalid(
                "goods_receipt_note_detail_id",
                "Dòng phiếu nhập chưa được kiểm tra",
            ));
        }
        let note = goods_receipts::find_by_id(conn, detail.goods_receipt_note_id)
            .await?
            .ok_or_else(|| AppError::not_found("Goods receipt note", "phiếu nhập kho"))?;
        if note.status != GoodsReceiptNoteStatus::Completed {
            return Err(AppError::invalid(
                "goods_receipt_note_detail_id",
                "Phiếu nhập kho chưa được duyệt",
            ));
        }

        let existing = pallets::list_by_receipt_detail(conn, detail.id).await?;
        check_palletized_total(
            palletized_quantity(&existing),
            input.package_quantity,
            detail.accepted_quantity(),
        )?;

        let pallet = pallets::insert(conn, detail.goods_id, &input, actor.user_id).await?;
        uow.commit().await?;

        tracing::info!(
            pallet_id = %pallet.id,
            goods_id = %pallet.goods_id,
            quantity = pallet.package_quantity,
            "pallet created"
        );
        Ok(pallet)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Pallet> {
        let mut conn = self.db.acquire().await?;
        pallets::find_by_id(&mut conn, id).await?.ok_or_else(pallet_not_found)
    }

    /// Non-empty pallets of one goods item, earliest expiry first
    pub async fn list_fefo(&self, goods_id: Uuid) -> AppResult<Vec<Pallet>> {
        let mut conn = self.db.acquire().await?;
        let mut rows = pallets::list_by_goods(&mut conn, goods_id).await?;
        sort_fefo(&mut rows);
        Ok(rows)
    }

    /// Put an unassigned pallet away into a free location
    pub async fn assign_location(
        &self,
        actor: &AuthUser,
        pallet_id: Uuid,
        location_id: Uuid,
    ) -> AppResult<Pallet> {
        self.place(actor, pallet_id, location_id, false).await
    }

    /// Move a stored pallet to another free location
    pub async fn move_pallet(
        &self,
        actor: &AuthUser,
        pallet_id: Uuid,
        location_id: Uuid,
    ) -> AppResult<Pallet> {
        self.place(actor, pallet_id, location_id, true).await
    }

    async fn place(
        &self,
        actor: &AuthUser,
        pallet_id: Uuid,
        location_id: Uuid,
        moving: bool,
    ) -> AppResult<Pallet> {
        require_any_role(actor, HANDLING_ROLES)?;

        let mut uow = UnitOfWork::begin(&self.db, "pallet.place").await?;
        let conn = uow.conn()?;

        let pallet = pallets::lock_by_id(conn, pallet_id)
            .await?
            .ok_or_else(pallet_not_found)?;
        let expected = if moving {
            PalletStatus::Stored
        } else {
            PalletStatus::Unassigned
        };
        if pallet.status != expected {
            return Err(AppError::Conflict {
                resource: "pallet".to_string(),
                message: format!("Pallet is {}, expected {}", pallet.status, expected),
                message_vi: if moving {
                    "Chỉ di chuyển được pallet đang lưu kho".to_string()
                } else {
                    "Pallet đã được xếp vào vị trí".to_string()
                },
            });
        }
        if pallet.location_id == Some(location_id) {
            return Ok(pallet);
        }

        let location = locations::lock_location(conn, location_id)
            .await?
            .ok_or_else(|| AppError::not_found("Location", "vị trí"))?;
        if !location.is_available {
            return Err(AppError::Conflict {
                resource: "location".to_string(),
                message: format!("Location {} is occupied", location.code),
                message_vi: format!("Vị trí {} đã có pallet", location.code),
            });
        }

        if let Some(previous) = pallet.location_id {
            locations::set_available(conn, previous, true).await?;
        }
        locations::set_available(conn, location.id, false).await?;
        let placed =
            pallets::set_location(conn, pallet.id, Some(location.id), PalletStatus::Stored).await?;
        uow.commit().await?;

        tracing::info!(
            pallet_id = %placed.id,
            from = ?pallet.location_id,
            to = %location.code,
            actor = %actor.user_id,
            "pallet placed"
        );
        Ok(placed)
    }

    /// Manual correction of a pallet's package quantity
    pub async fn adjust(
        &self,
        actor: &AuthUser,
        pallet_id: Uuid,
        input: AdjustPalletInput,
    ) -> AppResult<Pallet> {
        require_any_role(actor, CORRECTION_ROLES)?;
        if input.delta == 0 {
            return Err(AppError::invalid("delta", "Số lượng điều chỉnh phải khác 0"));
        }

        let mut uow = UnitOfWork::begin(&self.db, "pallet.adjust").await?;
        let conn = uow.conn()?;

        let pallet = pallets::lock_by_id(conn, pallet_id)
            .await?
            .ok_or_else(pallet_not_found)?;
        let adjusted = apply_quantity_change(conn, &pallet, input.delta).await?;
        ledger::append(
            conn,
            &[LedgerDraft {
                goods_id: pallet.goods_id,
                pallet_id: Some(pallet.id),
                delta: input.delta,
                reason: LedgerReason::Adjustment,
            }],
            PALLET_DOCUMENT,
            pallet.id,
            actor.user_id,
        )
        .await?;
        uow.commit().await?;

        tracing::info!(
            pallet_id = %pallet.id,
            delta = input.delta,
            quantity = adjusted.package_quantity,
            reason = input.reason.as_deref().unwrap_or(""),
            "pallet quantity adjusted"
        );
        Ok(adjusted)
    }
}

fn pallet_not_found() -> AppError {
    AppError::not_found("Pallet", "pallet")
}

/// Apply a signed change to a locked pallet.
///
/// The quantity never goes below zero; a pallet reaching zero becomes
/// `Empty` and frees its location.
pub(crate) async fn apply_quantity_change(
    conn: &mut PgConnection,
    pallet: &Pallet,
    delta: i32,
) -> AppResult<Pallet> {
    let quantity = adjust_package_quantity(pallet.id, pallet.package_quantity, delta)?;
    let status = match status_after_quantity(pallet.status, quantity) {
        PalletStatus::Stored if pallet.location_id.is_none() => PalletStatus::Unassigned,
        status => status,
    };
    if status == PalletStatus::Empty {
        if let Some(location_id) = pallet.location_id {
            locations::set_available(conn, location_id, true).await?;
        }
    }
    pallets::set_quantity(conn, pallet.id, quantity, status).await
}
