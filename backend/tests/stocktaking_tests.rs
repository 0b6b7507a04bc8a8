//! Stocktaking reconciliation
//!
//! Counted figures become signed ledger adjustments on approval. Pallets
//! whose count matches the snapshot produce no movement.

use std::collections::HashMap;

use proptest::prelude::*;
use shared::*;
use uuid::Uuid;

fn counted(expected: i32, counted: Option<i32>) -> StocktakingPallet {
    StocktakingPallet {
        id: Uuid::new_v4(),
        stocktaking_location_id: Uuid::new_v4(),
        pallet_id: Uuid::new_v4(),
        goods_id: Uuid::new_v4(),
        expected_quantity: expected,
        counted_quantity: counted,
        status: if counted.is_some() {
            StocktakingPalletStatus::Counted
        } else {
            StocktakingPalletStatus::Pending
        },
        counted_by: None,
        counted_at: None,
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_variance() {
        assert_eq!(counted(20, Some(18)).variance(), -2);
        assert_eq!(counted(20, Some(23)).variance(), 3);
        assert_eq!(counted(20, None).variance(), 0);
    }

    #[test]
    fn test_reconcile_skips_matching_counts() {
        let short = counted(20, Some(18));
        let over = counted(10, Some(11));
        let pallets = vec![counted(5, Some(5)), short.clone(), over.clone()];

        let drafts = reconcile(&pallets);
        assert_eq!(
            drafts,
            vec![
                LedgerDraft {
                    goods_id: short.goods_id,
                    pallet_id: Some(short.pallet_id),
                    delta: -2,
                    reason: LedgerReason::Adjustment,
                },
                LedgerDraft {
                    goods_id: over.goods_id,
                    pallet_id: Some(over.pallet_id),
                    delta: 1,
                    reason: LedgerReason::Adjustment,
                },
            ]
        );
    }

    #[test]
    fn test_submit_requires_every_pallet_counted() {
        assert!(!all_pallets_counted(&[]));
        assert!(!all_pallets_counted(&[counted(5, Some(5)), counted(3, None)]));
        assert!(all_pallets_counted(&[counted(5, Some(5)), counted(3, Some(0))]));
    }

    #[test]
    fn test_counts_accepted_while_open() {
        assert!(StocktakingStatus::InProgress.accepts_counts());
        assert!(StocktakingStatus::Rejected.accepts_counts());
        assert!(!StocktakingStatus::Draft.accepts_counts());
        assert!(!StocktakingStatus::PendingApproval.accepts_counts());
        assert!(!StocktakingStatus::Completed.accepts_counts());
    }

    #[test]
    fn test_rejected_sheet_can_be_resubmitted() {
        assert_eq!(
            StocktakingWorkflow::next_status(StocktakingStatus::Rejected, StocktakingAction::Submit),
            Ok(StocktakingStatus::PendingApproval)
        );
        assert!(StocktakingWorkflow::next_status(
            StocktakingStatus::PendingApproval,
            StocktakingAction::Cancel
        )
        .is_err());
    }

    #[test]
    fn test_adjustment_applied_to_current_quantity() {
        // Snapshot said 20, counted 18, but 5 were shipped meanwhile
        let delta = counted(20, Some(18)).variance();
        assert_eq!(adjust_package_quantity(Uuid::nil(), 15, delta), Ok(13));
        assert!(adjust_package_quantity(Uuid::nil(), 1, delta).is_err());
    }

    /// One pallet that would go negative fails the whole approval, so no
    /// pallet of the sheet is written
    #[test]
    fn test_adjustment_plan_is_all_or_nothing() {
        let ok = counted(20, Some(18));
        let short = counted(20, Some(10));
        let adjustments = reconcile(&[ok.clone(), short.clone()]);
        assert_eq!(adjustments.len(), 2);

        // 15 left on the first pallet, only 4 on the second after shipping
        let current = HashMap::from([(ok.pallet_id, 15), (short.pallet_id, 4)]);
        assert_eq!(
            plan_adjustments(&adjustments, &current),
            Err(PalletQuantityError::Insufficient {
                pallet_id: short.pallet_id,
                available: 4,
                requested: 10,
            })
        );

        let current = HashMap::from([(ok.pallet_id, 15), (short.pallet_id, 12)]);
        assert_eq!(
            plan_adjustments(&adjustments, &current),
            Ok(vec![(ok.pallet_id, 13), (short.pallet_id, 2)])
        );
    }

    #[test]
    fn test_adjustment_plan_without_pallet_row() {
        let missing = counted(5, Some(3));
        assert!(plan_adjustments(&reconcile(&[missing]), &HashMap::new()).is_err());
        assert_eq!(plan_adjustments(&[], &HashMap::new()), Ok(vec![]));
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Applying the adjustments to the snapshot yields the counted total
        #[test]
        fn prop_reconcile_restores_counted_total(
            rows in prop::collection::vec((0i32..200, 0i32..200), 0..20)
        ) {
            let pallets: Vec<_> = rows.iter().map(|(e, c)| counted(*e, Some(*c))).collect();
            let expected: i64 = rows.iter().map(|(e, _)| i64::from(*e)).sum();
            let actual: i64 = rows.iter().map(|(_, c)| i64::from(*c)).sum();
            let deltas: i64 = reconcile(&pallets).iter().map(|d| i64::from(d.delta)).sum();
            prop_assert_eq!(expected + deltas, actual);
        }

        /// A plan either covers every adjusted pallet or fails
        #[test]
        fn prop_adjustment_plan_never_negative(
            rows in prop::collection::vec((0i32..50, 0i32..50, 0i32..50), 1..12)
        ) {
            let pallets: Vec<_> = rows.iter().map(|(e, c, _)| counted(*e, Some(*c))).collect();
            let current: HashMap<_, _> = pallets
                .iter()
                .zip(&rows)
                .map(|(p, (_, _, now))| (p.pallet_id, *now))
                .collect();
            let adjustments = reconcile(&pallets);
            match plan_adjustments(&adjustments, &current) {
                Ok(plan) => {
                    prop_assert_eq!(plan.len(), adjustments.len());
                    prop_assert!(plan.iter().all(|(_, q)| *q >= 0));
                }
                Err(_) => prop_assert!(adjustments
                    .iter()
                    .any(|a| a.pallet_id.map_or(0, |id| current[&id]) + a.delta < 0)),
            }
        }

        /// No draft ever carries a zero delta
        #[test]
        fn prop_reconcile_has_no_zero_deltas(
            rows in prop::collection::vec((0i32..50, prop::option::of(0i32..50)), 0..20)
        ) {
            let pallets: Vec<_> = rows.iter().map(|(e, c)| counted(*e, *c)).collect();
            prop_assert!(reconcile(&pallets).iter().all(|d| d.delta != 0));
        }
    }
}
