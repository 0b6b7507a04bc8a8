//! WebAssembly module for the milk warehouse UI
//!
//! Provides client-side checks so forms can react before a round trip:
//! - Actions offered for a document in a given status
//! - Stock availability for draft sales orders
//! - Order totals and date validation
//! - Location code preview

use std::collections::HashMap;
use std::str::FromStr;

use js_sys::Array;
use rust_decimal::Decimal;
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::types::*;
pub use shared::validation::*;
pub use shared::workflow::*;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    web_sys::console::debug_1(&JsValue::from_str("milk-warehouse-wasm loaded"));
}

fn actions_for<W>(status: &str) -> Result<Vec<String>, String>
where
    W: Workflow,
    W::Status: FromStr<Err = String>,
{
    let status = W::Status::from_str(status)?;
    Ok(W::allowed_actions(status)
        .into_iter()
        .map(|a| a.to_string())
        .collect())
}

/// Action names reachable from `status`, before permission checks
pub fn document_actions(document: &str, status: &str) -> Result<Vec<String>, String> {
    match document {
        "purchase_order" => actions_for::<PurchaseOrderWorkflow>(status),
        "goods_receipt_note" => actions_for::<GoodsReceiptNoteWorkflow>(status),
        "sales_order" => {
            // Completion is driven by the goods issue approval
            let mut actions = actions_for::<SalesOrderWorkflow>(status)?;
            actions.retain(|a| a != SalesOrderAction::Complete.as_str());
            Ok(actions)
        }
        "goods_issue_note" => actions_for::<GoodsIssueNoteWorkflow>(status),
        "stocktaking_sheet" => actions_for::<StocktakingWorkflow>(status),
        "back_order" => actions_for::<BackOrderWorkflow>(status),
        other => Err(format!("unknown document type: {}", other)),
    }
}

/// Allowed actions as a JS array of strings
#[wasm_bindgen]
pub fn allowed_actions(document: &str, status: &str) -> Result<Array, JsValue> {
    let actions = document_actions(document, status).map_err(|e| JsValue::from_str(&e))?;
    Ok(actions.into_iter().map(|a| JsValue::from_str(&a)).collect())
}

/// Check draft order lines against stock levels.
///
/// `lines_json` is a list of `{goods_id, quantity}`; `levels_json` a list of
/// `{goods_id, stock, committed}`. Returns an empty string when every line
/// fits, otherwise the Vietnamese shortage message.
#[wasm_bindgen]
pub fn check_order_availability(lines_json: &str, levels_json: &str) -> Result<String, JsValue> {
    let lines: Vec<OrderLineInput> = serde_json::from_str(lines_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid lines JSON: {}", e)))?;
    let levels: Vec<StockLevel> = serde_json::from_str(levels_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid stock JSON: {}", e)))?;

    let requested: Vec<_> = lines.iter().map(|l| (l.goods_id, l.quantity)).collect();
    let levels: HashMap<_, _> = levels.into_iter().map(|l| (l.goods_id, l)).collect();

    Ok(match check_availability(&requested, &levels) {
        Ok(()) => String::new(),
        Err(e) => e.message_vi(),
    })
}

/// Sum of quantity × unit price; lines without a price count as zero
pub fn lines_total(lines: &[OrderLineInput]) -> Decimal {
    lines
        .iter()
        .map(|l| Decimal::from(l.quantity) * l.unit_price.unwrap_or(Decimal::ZERO))
        .sum()
}

/// Order total as a decimal string
#[wasm_bindgen]
pub fn calculate_order_total(lines_json: &str) -> Result<String, JsValue> {
    let lines: Vec<OrderLineInput> = serde_json::from_str(lines_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid lines JSON: {}", e)))?;
    Ok(lines_total(&lines).to_string())
}

fn parse_date(value: &str) -> Result<chrono::NaiveDate, String> {
    chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| format!("Ngày không hợp lệ: {}", value))
}

fn date_check(
    check: fn(chrono::NaiveDate, chrono::NaiveDate) -> Result<(), &'static str>,
    first: &str,
    second: &str,
) -> String {
    match (parse_date(first), parse_date(second)) {
        (Ok(a), Ok(b)) => check(a, b).err().unwrap_or_default().to_string(),
        (Err(e), _) | (_, Err(e)) => e,
    }
}

/// Empty when the delivery date is acceptable, otherwise the error message
#[wasm_bindgen]
pub fn check_delivery_date(date: &str, today: &str) -> String {
    date_check(validate_delivery_date, date, today)
}

/// Empty when the arrival date is acceptable, otherwise the error message
#[wasm_bindgen]
pub fn check_arrival_date(date: &str, today: &str) -> String {
    date_check(validate_arrival_date, date, today)
}

/// Empty when expiry follows manufacturing, otherwise the error message
#[wasm_bindgen]
pub fn check_shelf_life(manufacturing: &str, expiry: &str) -> String {
    date_check(validate_shelf_life, manufacturing, expiry)
}

#[wasm_bindgen]
pub fn preview_location_code(area_code: &str, rack: &str, level: i32) -> String {
    location_code(area_code, rack, level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_actions() {
        assert_eq!(
            document_actions("purchase_order", "draft").unwrap(),
            vec!["submit", "cancel"]
        );
        assert!(document_actions("goods_issue_note", "completed")
            .unwrap()
            .is_empty());
        assert!(document_actions("invoice", "draft").is_err());
        assert!(document_actions("sales_order", "shipped").is_err());
    }

    #[test]
    fn test_sales_order_complete_not_offered() {
        let actions = document_actions("sales_order", "assigned_for_picking").unwrap();
        assert!(!actions.contains(&"complete".to_string()));
    }

    #[test]
    fn test_lines_total() {
        let lines: Vec<OrderLineInput> = serde_json::from_str(
            r#"[
                {"goods_id": "00000000-0000-0000-0000-000000000001", "quantity": 10, "unit_price": "12000"},
                {"goods_id": "00000000-0000-0000-0000-000000000002", "quantity": 3}
            ]"#,
        )
        .unwrap();
        assert_eq!(lines_total(&lines), Decimal::from(120_000));
    }

    #[test]
    fn test_date_checks() {
        assert_eq!(check_delivery_date("2026-10-16", "2026-10-16"), "");
        assert!(!check_delivery_date("2026-10-15", "2026-10-16").is_empty());
        assert!(!check_arrival_date("16/10/2026", "2026-10-16").is_empty());
        assert_eq!(check_shelf_life("2026-10-01", "2026-10-20"), "");
        assert!(!check_shelf_life("2026-10-20", "2026-10-01").is_empty());
    }

    #[test]
    fn test_location_code_preview() {
        assert_eq!(preview_location_code("B", "R01", 3), "B-R01-L3");
    }
}
