//! Warehouse areas and storage locations

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

string_enum! {
    /// Storage temperature band of an area
    pub enum TemperatureClass as "temperature_class" {
        Ambient => "ambient",
        Chilled => "chilled",
        Frozen => "frozen",
    }
}

/// A zone of the warehouse (e.g. cold room A)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Area {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub temperature_class: TemperatureClass,
}

/// A single pallet slot inside an area
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Location {
    pub id: Uuid,
    pub area_id: Uuid,
    pub code: String,
    pub rack: String,
    pub level: i32,
    pub is_available: bool,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateAreaInput {
    #[validate(length(min = 1, max = 20))]
    pub code: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub temperature_class: TemperatureClass,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateLocationInput {
    pub area_id: Uuid,
    #[validate(length(min = 1, max = 10))]
    pub rack: String,
    #[validate(range(min = 1, max = 20))]
    pub level: i32,
}

/// Location code derived from area, rack and level, e.g. `A-R03-L2`
pub fn location_code(area_code: &str, rack: &str, level: i32) -> String {
    format!("{}-{}-L{}", area_code, rack, level)
}
