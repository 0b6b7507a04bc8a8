//! Goods, suppliers and retailers

use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use shared::{CreateGoodsInput, CreatePartnerInput, Goods, Retailer, Role, Supplier};

use crate::error::{AppError, AppResult};
use crate::middleware::{require_any_role, AuthUser};
use crate::repositories::catalog;

const PURCHASING_ROLES: &[Role] = &[Role::Admin, Role::WarehouseManager, Role::Purchaser];
const SALES_ROLES: &[Role] = &[Role::Admin, Role::SalesManager, Role::SalesRepresentative];

#[derive(Clone)]
pub struct CatalogService {
    db: PgPool,
}

impl CatalogService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create_goods(&self, actor: &AuthUser, input: CreateGoodsInput) -> AppResult<Goods> {
        require_any_role(actor, PURCHASING_ROLES)?;
        input.validate()?;

        let mut conn = self.db.acquire().await?;
        if let Some(supplier_id) = input.supplier_id {
            catalog::find_supplier(&mut conn, supplier_id)
                .await?
                .ok_or_else(|| AppError::not_found("Supplier", "nhà cung cấp"))?;
        }
        let goods = catalog::insert_goods(&mut conn, &input).await?;
        tracing::info!(goods_id = %goods.id, code = %goods.code, "goods created");
        Ok(goods)
    }

    pub async fn get_goods(&self, id: Uuid) -> AppResult<Goods> {
        let mut conn = self.db.acquire().await?;
        catalog::find_goods(&mut conn, id)
            .await?
            .ok_or_else(|| AppError::not_found("Goods", "hàng hóa"))
    }

    pub async fn list_goods(&self) -> AppResult<Vec<Goods>> {
        let mut conn = self.db.acquire().await?;
        catalog::list_goods(&mut conn).await
    }

    pub async fn create_supplier(
        &self,
        actor: &AuthUser,
        input: CreatePartnerInput,
    ) -> AppResult<Supplier> {
        require_any_role(actor, PURCHASING_ROLES)?;
        input.validate()?;
        let mut conn = self.db.acquire().await?;
        let supplier = catalog::insert_supplier(&mut conn, &input).await?;
        tracing::info!(supplier_id = %supplier.id, "supplier created");
        Ok(supplier)
    }

    pub async fn get_supplier(&self, id: Uuid) -> AppResult<Supplier> {
        let mut conn = self.db.acquire().await?;
        catalog::find_supplier(&mut conn, id)
            .await?
            .ok_or_else(|| AppError::not_found("Supplier", "nhà cung cấp"))
    }

    pub async fn list_suppliers(&self) -> AppResult<Vec<Supplier>> {
        let mut conn = self.db.acquire().await?;
        catalog::list_suppliers(&mut conn).await
    }

    pub async fn create_retailer(
        &self,
        actor: &AuthUser,
        input: CreatePartnerInput,
    ) -> AppResult<Retailer> {
        require_any_role(actor, SALES_ROLES)?;
        input.validate()?;
        let mut conn = self.db.acquire().await?;
        let retailer = catalog::insert_retailer(&mut conn, &input).await?;
        tracing::info!(retailer_id = %retailer.id, "retailer created");
        Ok(retailer)
    }

    pub async fn get_retailer(&self, id: Uuid) -> AppResult<Retailer> {
        let mut conn = self.db.acquire().await?;
        catalog::find_retailer(&mut conn, id)
            .await?
            .ok_or_else(|| AppError::not_found("Retailer", "nhà bán lẻ"))
    }

    pub async fn list_retailers(&self) -> AppResult<Vec<Retailer>> {
        let mut conn = self.db.acquire().await?;
        catalog::list_retailers(&mut conn).await
    }
}
