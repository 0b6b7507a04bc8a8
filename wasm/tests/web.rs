//! Browser-side checks for the exported bindings

#![cfg(target_arch = "wasm32")]

use milk_warehouse_wasm::*;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn allowed_actions_returns_js_array() {
    let actions = allowed_actions("stocktaking_sheet", "pending_approval").unwrap();
    assert_eq!(actions.length(), 2);
    assert_eq!(actions.get(0).as_string().as_deref(), Some("approve"));
}

#[wasm_bindgen_test]
fn unknown_document_is_an_error() {
    assert!(allowed_actions("invoice", "draft").is_err());
}

#[wasm_bindgen_test]
fn availability_message_for_short_stock() {
    let lines = r#"[{"goods_id": "00000000-0000-0000-0000-000000000001", "quantity": 5}]"#;
    let levels = r#"[{"goods_id": "00000000-0000-0000-0000-000000000001", "stock": 10, "committed": 8}]"#;
    let message = check_order_availability(lines, levels).unwrap();
    assert!(message.contains("khả dụng 2"));
}
