//! Sales order availability
//!
//! available = stock − committed, where committed counts lines of orders in
//! PendingApproval, Approved or AssignedForPicking.

use std::collections::HashMap;

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::*;
use uuid::Uuid;

fn level(goods_id: Uuid, stock: i64, committed: i64) -> StockLevel {
    StockLevel {
        goods_id,
        stock,
        committed,
    }
}

fn levels(rows: &[StockLevel]) -> HashMap<Uuid, StockLevel> {
    rows.iter().map(|l| (l.goods_id, *l)).collect()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_order_within_available_stock() {
        let milk = Uuid::new_v4();
        let table = levels(&[level(milk, 100, 60)]);
        assert!(check_availability(&[(milk, 40)], &table).is_ok());
    }

    #[test]
    fn test_order_above_available_stock() {
        let milk = Uuid::new_v4();
        let table = levels(&[level(milk, 100, 60)]);
        let err = check_availability(&[(milk, 41)], &table).unwrap_err();
        assert_eq!(
            err,
            ShortageError {
                goods_id: milk,
                requested: 41,
                available: 40,
            }
        );
        assert!(err.message_vi().contains("khả dụng 40"));
    }

    #[test]
    fn test_goods_without_stock_row_is_unavailable() {
        let err = check_availability(&[(Uuid::new_v4(), 1)], &HashMap::new()).unwrap_err();
        assert_eq!(err.available, 0);
    }

    #[test]
    fn test_any_short_line_fails_the_order() {
        let (milk, yogurt) = (Uuid::new_v4(), Uuid::new_v4());
        let table = levels(&[level(milk, 100, 0), level(yogurt, 10, 8)]);
        let err = check_availability(&[(milk, 50), (yogurt, 3)], &table).unwrap_err();
        assert_eq!(err.goods_id, yogurt);
    }

    #[test]
    fn test_over_committed_goods_report_negative_availability() {
        // Stock shrank after a stocktaking; committed lines stay as they were
        let milk = Uuid::new_v4();
        let table = levels(&[level(milk, 5, 8)]);
        assert_eq!(table[&milk].available(), -3);
        assert!(check_availability(&[(milk, 1)], &table).is_err());
    }

    #[test]
    fn test_committed_statuses() {
        let committed: Vec<_> = SalesOrderStatus::ALL
            .iter()
            .filter(|s| s.commits_stock())
            .copied()
            .collect();
        assert_eq!(
            committed,
            vec![
                SalesOrderStatus::PendingApproval,
                SalesOrderStatus::Approved,
                SalesOrderStatus::AssignedForPicking,
            ]
        );
    }

    #[test]
    fn test_order_total() {
        let detail = |quantity: i32, price: i64| SalesOrderDetail {
            id: Uuid::new_v4(),
            sales_order_id: Uuid::nil(),
            goods_id: Uuid::new_v4(),
            quantity,
            unit_price: Decimal::from(price),
        };
        let total = sales_order_total(&[detail(10, 12_000), detail(3, 25_000)]);
        assert_eq!(total, Decimal::from(195_000));
        assert_eq!(sales_order_total(&[]), Decimal::ZERO);
    }

    #[test]
    fn test_delivery_date_may_be_today() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        assert!(validate_delivery_date(today, today).is_ok());
        assert!(validate_delivery_date(today.pred_opt().unwrap(), today).is_err());
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// A single line passes exactly when stock − committed ≥ requested
        #[test]
        fn prop_availability_matches_formula(
            stock in 0i64..1_000,
            committed in 0i64..1_000,
            requested in 1i32..1_000
        ) {
            let goods = Uuid::new_v4();
            let table = levels(&[level(goods, stock, committed)]);
            let ok = check_availability(&[(goods, requested)], &table).is_ok();
            prop_assert_eq!(ok, stock - committed >= i64::from(requested));
        }

        /// Lines of the same goods are summed before the check
        #[test]
        fn prop_split_lines_equal_one_line(
            stock in 0i64..500,
            parts in prop::collection::vec(1i32..100, 1..5)
        ) {
            let goods = Uuid::new_v4();
            let table = levels(&[level(goods, stock, 0)]);
            let split: Vec<(Uuid, i32)> = parts.iter().map(|q| (goods, *q)).collect();
            let whole = [(goods, parts.iter().sum::<i32>())];
            prop_assert_eq!(
                check_availability(&split, &table).is_ok(),
                check_availability(&whole, &table).is_ok()
            );
        }
    }
}
