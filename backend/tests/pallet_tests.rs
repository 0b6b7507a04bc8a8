//! Pallet quantities, FEFO ordering, locations and notifications

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use proptest::prelude::*;
use shared::*;
use uuid::Uuid;

fn pallet(expiry: NaiveDate, manufactured: NaiveDate, created_minute: u32) -> Pallet {
    let created = Utc
        .with_ymd_and_hms(2026, 10, 1, 8, created_minute, 0)
        .unwrap();
    Pallet {
        id: Uuid::new_v4(),
        goods_id: Uuid::nil(),
        goods_receipt_note_detail_id: Some(Uuid::new_v4()),
        location_id: None,
        batch_code: format!("LOT-{}", created_minute),
        manufacturing_date: manufactured,
        expiry_date: expiry,
        package_quantity: 10,
        initial_quantity: 10,
        status: PalletStatus::Stored,
        created_by: Uuid::new_v4(),
        created_at: created,
        updated_at: created,
    }
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_fefo_earliest_expiry_first() {
        let late = pallet(day(30), day(1), 0);
        let early = pallet(day(20), day(2), 1);
        let mut pallets = vec![late.clone(), early.clone()];
        sort_fefo(&mut pallets);
        assert_eq!(pallets[0].id, early.id);
        assert_eq!(pallets[1].id, late.id);
    }

    #[test]
    fn test_fefo_ties_broken_by_age() {
        let newer_batch = pallet(day(20), day(5), 0);
        let older_batch = pallet(day(20), day(3), 1);
        let same_batch_later = pallet(day(20), day(3), 2);
        let mut pallets = vec![same_batch_later.clone(), newer_batch.clone(), older_batch.clone()];
        sort_fefo(&mut pallets);
        let ids: Vec<_> = pallets.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![older_batch.id, same_batch_later.id, newer_batch.id]);
    }

    #[test]
    fn test_adjust_never_goes_negative() {
        let id = Uuid::new_v4();
        assert_eq!(adjust_package_quantity(id, 10, -10), Ok(0));
        assert_eq!(
            adjust_package_quantity(id, 10, -11),
            Err(PalletQuantityError::Insufficient {
                pallet_id: id,
                available: 10,
                requested: 11,
            })
        );
        assert_eq!(adjust_package_quantity(id, 0, 4), Ok(4));
    }

    #[test]
    fn test_adjust_overflow_is_rejected() {
        let id = Uuid::new_v4();
        assert_eq!(
            adjust_package_quantity(id, i32::MAX, 1),
            Err(PalletQuantityError::Overflow { pallet_id: id })
        );
        assert_eq!(adjust_package_quantity(id, i32::MAX, 0), Ok(i32::MAX));
        assert_eq!(
            adjust_package_quantity(id, 0, i32::MIN),
            Err(PalletQuantityError::Insufficient {
                pallet_id: id,
                available: 0,
                requested: i32::MAX,
            })
        );
    }

    /// A receipt line of 20 palletized as 12 + 8, then 12 shipped: the line
    /// is still fully palletized
    #[test]
    fn test_shipped_pallets_still_count_as_palletized() {
        let mut first = pallet(day(20), day(1), 0);
        first.package_quantity = 12;
        first.initial_quantity = 12;
        let mut second = pallet(day(20), day(1), 1);
        second.package_quantity = 8;
        second.initial_quantity = 8;
        assert_eq!(palletized_quantity(&[first.clone(), second.clone()]), 20);

        first.package_quantity = adjust_package_quantity(first.id, 12, -12).unwrap();
        first.status = status_after_quantity(first.status, first.package_quantity);
        assert_eq!(first.status, PalletStatus::Empty);

        let palletized = palletized_quantity(&[first, second]);
        assert_eq!(palletized, 20);
        assert_eq!(
            check_palletized_total(palletized, 1, 20),
            Err(PalletQuantityError::ExceedsAccepted {
                total: 21,
                accepted: 20,
            })
        );
    }

    #[test]
    fn test_status_follows_quantity() {
        assert_eq!(status_after_quantity(PalletStatus::Stored, 0), PalletStatus::Empty);
        assert_eq!(status_after_quantity(PalletStatus::Unassigned, 0), PalletStatus::Empty);
        assert_eq!(status_after_quantity(PalletStatus::Empty, 3), PalletStatus::Stored);
        assert_eq!(status_after_quantity(PalletStatus::Unassigned, 3), PalletStatus::Unassigned);
    }

    #[test]
    fn test_location_code() {
        assert_eq!(location_code("A", "R03", 2), "A-R03-L2");
    }

    #[test]
    fn test_shelf_life() {
        assert!(validate_shelf_life(day(1), day(1) + Duration::days(10)).is_ok());
        assert!(validate_shelf_life(day(10), day(1)).is_err());
    }

    #[test]
    fn test_notification_skips_actor_and_duplicates() {
        let (actor, keeper, manager) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let draft = NotificationDraft {
            recipients: vec![keeper, actor, manager, keeper],
            title: "Phiếu xuất kho đã duyệt".to_string(),
            message: "GIN-20261016-0001".to_string(),
            document_type: GoodsIssueNoteWorkflow::DOCUMENT,
            document_id: Uuid::new_v4(),
        }
        .without_actor(actor);

        assert_eq!(draft.recipients.len(), 2);
        assert!(!draft.recipients.contains(&actor));
        assert!(draft.recipients.contains(&keeper));
        assert!(draft.recipients.contains(&manager));
    }

    #[test]
    fn test_notification_to_self_only_is_empty() {
        let actor = Uuid::new_v4();
        let draft = NotificationDraft {
            recipients: vec![actor],
            title: String::new(),
            message: String::new(),
            document_type: PurchaseOrderWorkflow::DOCUMENT,
            document_id: Uuid::new_v4(),
        }
        .without_actor(actor);
        assert!(draft.recipients.is_empty());
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

        /// A successful adjustment is exact and non-negative
        #[test]
        fn prop_adjustment_is_exact(current in 0i32..1_000, delta in -1_000i32..1_000) {
            match adjust_package_quantity(Uuid::nil(), current, delta) {
                Ok(next) => {
                    prop_assert!(next >= 0);
                    prop_assert_eq!(next, current + delta);
                }
                Err(_) => prop_assert!(current + delta < 0),
            }
        }

        /// Shipping or counting pallets down never frees palletizing room
        #[test]
        fn prop_palletized_quantity_ignores_current_stock(
            lots in prop::collection::vec((1i32..50, 0i32..50), 1..8)
        ) {
            let pallets: Vec<_> = lots
                .iter()
                .enumerate()
                .map(|(i, (initial, taken))| {
                    let mut p = pallet(day(20), day(1), i as u32);
                    p.initial_quantity = *initial;
                    p.package_quantity = (initial - taken).max(0);
                    p
                })
                .collect();
            let expected: i64 = lots.iter().map(|(initial, _)| i64::from(*initial)).sum();
            prop_assert_eq!(palletized_quantity(&pallets), expected);
        }

        /// FEFO output never has a later expiry ahead of an earlier one
        #[test]
        fn prop_fefo_sorted_by_expiry(expiries in prop::collection::vec(1u32..28, 1..15)) {
            let mut pallets: Vec<_> = expiries
                .iter()
                .enumerate()
                .map(|(i, d)| pallet(day(*d), day(1), i as u32))
                .collect();
            sort_fefo(&mut pallets);
            for pair in pallets.windows(2) {
                prop_assert!(pair[0].expiry_date <= pair[1].expiry_date);
            }
        }
    }
}
