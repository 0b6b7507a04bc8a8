//! Warehouse areas and rack locations

use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use shared::{location_code, Area, CreateAreaInput, CreateLocationInput, Location, Role};

use crate::error::{AppError, AppResult};
use crate::middleware::{require_any_role, AuthUser};
use crate::repositories::locations;

const LAYOUT_ROLES: &[Role] = &[Role::Admin, Role::WarehouseManager];

#[derive(Clone)]
pub struct LocationService {
    db: PgPool,
}

impl LocationService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create_area(&self, actor: &AuthUser, input: CreateAreaInput) -> AppResult<Area> {
        require_any_role(actor, LAYOUT_ROLES)?;
        input.validate()?;
        let mut conn = self.db.acquire().await?;
        let area = locations::insert_area(&mut conn, &input).await?;
        tracing::info!(area_id = %area.id, code = %area.code, "area created");
        Ok(area)
    }

    pub async fn list_areas(&self) -> AppResult<Vec<Area>> {
        let mut conn = self.db.acquire().await?;
        locations::list_areas(&mut conn).await
    }

    /// Create a rack slot; its code is derived from area, rack and level
    pub async fn create_location(
        &self,
        actor: &AuthUser,
        input: CreateLocationInput,
    ) -> AppResult<Location> {
        require_any_role(actor, LAYOUT_ROLES)?;
        input.validate()?;
        let mut conn = self.db.acquire().await?;
        let area = locations::find_area(&mut conn, input.area_id)
            .await?
            .ok_or_else(|| AppError::not_found("Area", "khu vực"))?;
        let rack = input.rack.trim().to_uppercase();
        let code = location_code(&area.code, &rack, input.level);
        let location =
            locations::insert_location(&mut conn, area.id, &code, &rack, input.level).await?;
        tracing::info!(location_id = %location.id, code = %location.code, "location created");
        Ok(location)
    }

    pub async fn list_locations(
        &self,
        area_id: Option<Uuid>,
        available: Option<bool>,
    ) -> AppResult<Vec<Location>> {
        let mut conn = self.db.acquire().await?;
        locations::list_locations(&mut conn, area_id, available).await
    }
}
