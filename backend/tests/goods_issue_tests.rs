//! Goods issue picking and approval
//!
//! Allocation checks while picking and the pallet decrement plan computed
//! when a goods issue note is approved.

use std::collections::HashMap;

use proptest::prelude::*;
use shared::*;
use uuid::Uuid;

fn detail(goods_id: Uuid, requested: i32) -> GoodsIssueNoteDetail {
    GoodsIssueNoteDetail {
        id: Uuid::new_v4(),
        goods_issue_note_id: Uuid::new_v4(),
        goods_id,
        requested_quantity: requested,
        status: GoodsIssueDetailStatus::Pending,
    }
}

fn allocation(pallet_id: Uuid, quantity: i32) -> GoodsIssueAllocation {
    GoodsIssueAllocation {
        id: Uuid::new_v4(),
        goods_issue_note_detail_id: Uuid::new_v4(),
        pallet_id,
        quantity,
    }
}

fn stock(goods_id: Uuid, package_quantity: i32) -> PalletStock {
    PalletStock {
        goods_id,
        package_quantity,
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Pallet of 15 packages, 10 allocated: 5 left after approval and the
    /// sales order moves to Completed
    #[test]
    fn test_approval_decrements_pallet_and_completes_order() {
        let goods = Uuid::new_v4();
        let pallet = Uuid::new_v4();
        let pallets = HashMap::from([(pallet, stock(goods, 15))]);

        let plan = plan_pallet_decrements(&[allocation(pallet, 10)], &pallets).unwrap();
        assert_eq!(
            plan,
            vec![PalletDecrement {
                pallet_id: pallet,
                goods_id: goods,
                quantity: 10,
                remaining: 5,
            }]
        );

        let pallet_status = status_after_quantity(PalletStatus::Stored, plan[0].remaining);
        assert_eq!(pallet_status, PalletStatus::Stored);

        let order_status = SalesOrderWorkflow::next_status(
            SalesOrderStatus::AssignedForPicking,
            SalesOrderAction::Complete,
        );
        assert_eq!(order_status, Ok(SalesOrderStatus::Completed));
    }

    #[test]
    fn test_allocation_above_pallet_quantity_fails_whole_plan() {
        let goods = Uuid::new_v4();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let pallets = HashMap::from([(a, stock(goods, 15)), (b, stock(goods, 4))]);

        let err = plan_pallet_decrements(&[allocation(a, 10), allocation(b, 5)], &pallets)
            .unwrap_err();
        assert_eq!(
            err,
            PalletQuantityError::Insufficient {
                pallet_id: b,
                available: 4,
                requested: 5,
            }
        );
        assert!(err.message_vi().contains("không đủ"));
    }

    /// Two allocations of 8 on a pallet of 15 fail together even though each fits
    #[test]
    fn test_allocations_on_one_pallet_are_summed() {
        let goods = Uuid::new_v4();
        let pallet = Uuid::new_v4();
        let pallets = HashMap::from([(pallet, stock(goods, 15))]);

        let err = plan_pallet_decrements(&[allocation(pallet, 8), allocation(pallet, 8)], &pallets)
            .unwrap_err();
        assert!(matches!(err, PalletQuantityError::Insufficient { requested: 16, .. }));

        let plan =
            plan_pallet_decrements(&[allocation(pallet, 8), allocation(pallet, 7)], &pallets).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].remaining, 0);
        assert_eq!(status_after_quantity(PalletStatus::Stored, 0), PalletStatus::Empty);
    }

    #[test]
    fn test_plan_is_ordered_by_pallet_id() {
        let goods = Uuid::new_v4();
        let ids: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();
        let pallets: HashMap<Uuid, PalletStock> = ids.iter().map(|id| (*id, stock(goods, 10))).collect();
        let allocations: Vec<_> = ids.iter().rev().map(|id| allocation(*id, 1)).collect();

        let plan = plan_pallet_decrements(&allocations, &pallets).unwrap();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(plan.iter().map(|d| d.pallet_id).collect::<Vec<_>>(), sorted);
    }

    #[test]
    fn test_unknown_pallet_has_no_stock() {
        let err = plan_pallet_decrements(&[allocation(Uuid::new_v4(), 1)], &HashMap::new())
            .unwrap_err();
        assert!(matches!(err, PalletQuantityError::Insufficient { available: 0, .. }));
    }

    #[test]
    fn test_check_allocation_marks_line_picked() {
        let goods = Uuid::new_v4();
        let line = detail(goods, 10);
        let pallet = Uuid::new_v4();

        let allocated = check_allocation(&line, 4, pallet, stock(goods, 15), 0, 6).unwrap();
        assert_eq!(allocated, 10);
        assert_eq!(detail_status_for(10, allocated), GoodsIssueDetailStatus::Picked);
        assert_eq!(detail_status_for(10, 4), GoodsIssueDetailStatus::Pending);
    }

    #[test]
    fn test_check_allocation_rejections() {
        let goods = Uuid::new_v4();
        let line = detail(goods, 10);
        let pallet = Uuid::new_v4();

        assert_eq!(
            check_allocation(&line, 0, pallet, stock(Uuid::new_v4(), 15), 0, 5),
            Err(AllocationError::GoodsMismatch)
        );
        assert_eq!(
            check_allocation(&line, 8, pallet, stock(goods, 15), 0, 3),
            Err(AllocationError::ExceedsRequested {
                requested: 10,
                allocated: 11,
            })
        );
        // 15 on the pallet, 12 already reserved by another open note
        assert_eq!(
            check_allocation(&line, 0, pallet, stock(goods, 15), 12, 5),
            Err(AllocationError::Pallet(PalletQuantityError::Insufficient {
                pallet_id: pallet,
                available: 3,
                requested: 5,
            }))
        );
    }

    #[test]
    fn test_check_allocation_at_integer_limits() {
        let goods = Uuid::new_v4();
        let line = detail(goods, 10);
        let pallet = Uuid::new_v4();

        assert_eq!(
            check_allocation(&line, i32::MAX, pallet, stock(goods, 15), 0, 1),
            Err(AllocationError::ExceedsRequested {
                requested: 10,
                allocated: i32::MAX,
            })
        );
        // Reservations above the pallet quantity leave nothing free
        let huge = detail(goods, i32::MAX);
        assert_eq!(
            check_allocation(&huge, 0, pallet, stock(goods, 15), i32::MAX, 1),
            Err(AllocationError::Pallet(PalletQuantityError::Insufficient {
                pallet_id: pallet,
                available: 0,
                requested: 1,
            }))
        );
    }

    #[test]
    fn test_only_stored_pallets_can_be_picked() {
        assert_eq!(check_pickable(PalletStatus::Stored), Ok(()));
        assert_eq!(
            check_pickable(PalletStatus::Unassigned),
            Err(AllocationError::NotStored(PalletStatus::Unassigned))
        );
        assert_eq!(
            check_pickable(PalletStatus::Empty),
            Err(AllocationError::NotStored(PalletStatus::Empty))
        );
        assert!(AllocationError::NotStored(PalletStatus::Unassigned)
            .message_vi()
            .contains("vị trí"));
        assert!(AllocationError::NotStored(PalletStatus::Empty)
            .message_vi()
            .contains("hết hàng"));
    }

    /// Allocations whose sum does not fit an i32 fail instead of wrapping
    #[test]
    fn test_plan_rejects_overflowing_allocations() {
        let goods = Uuid::new_v4();
        let pallet = Uuid::new_v4();
        let pallets = HashMap::from([(pallet, stock(goods, i32::MAX))]);

        let err = plan_pallet_decrements(
            &[allocation(pallet, i32::MAX), allocation(pallet, i32::MAX)],
            &pallets,
        )
        .unwrap_err();
        assert_eq!(
            err,
            PalletQuantityError::Insufficient {
                pallet_id: pallet,
                available: i32::MAX,
                requested: i32::MAX,
            }
        );
    }

    #[test]
    fn test_submit_requires_every_line_picked() {
        let goods = Uuid::new_v4();
        let mut lines = vec![detail(goods, 5), detail(Uuid::new_v4(), 3)];
        assert!(!all_details_picked(&lines));
        lines[0].status = GoodsIssueDetailStatus::Picked;
        assert!(!all_details_picked(&lines));
        lines[1].status = GoodsIssueDetailStatus::Picked;
        assert!(all_details_picked(&lines));
        assert!(!all_details_picked(&[]));
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

        /// Approval either fails or leaves every pallet at quantity minus its allocations
        #[test]
        fn prop_plan_conserves_packages(
            quantities in prop::collection::vec(0i32..50, 1..6),
            picks in prop::collection::vec((0usize..6, 1i32..20), 0..12)
        ) {
            let goods = Uuid::new_v4();
            let ids: Vec<Uuid> = quantities.iter().map(|_| Uuid::new_v4()).collect();
            let pallets: HashMap<Uuid, PalletStock> = ids
                .iter()
                .zip(&quantities)
                .map(|(id, q)| (*id, stock(goods, *q)))
                .collect();
            let allocations: Vec<_> = picks
                .iter()
                .map(|(i, q)| allocation(ids[i % ids.len()], *q))
                .collect();

            let mut totals: HashMap<Uuid, i32> = HashMap::new();
            for a in &allocations {
                *totals.entry(a.pallet_id).or_default() += a.quantity;
            }
            let feasible = totals.iter().all(|(id, t)| *t <= pallets[id].package_quantity);

            match plan_pallet_decrements(&allocations, &pallets) {
                Ok(plan) => {
                    prop_assert!(feasible);
                    prop_assert_eq!(plan.len(), totals.len());
                    for d in plan {
                        prop_assert!(d.remaining >= 0);
                        prop_assert_eq!(d.quantity, totals[&d.pallet_id]);
                        prop_assert_eq!(d.remaining, pallets[&d.pallet_id].package_quantity - d.quantity);
                    }
                }
                Err(_) => prop_assert!(!feasible),
            }
        }

        /// Successful allocations never exceed the requested quantity or the free stock
        #[test]
        fn prop_allocation_bounds(
            requested in 1i32..100,
            already in 0i32..100,
            on_pallet in 0i32..100,
            reserved in 0i32..100,
            quantity in 1i32..100
        ) {
            let goods = Uuid::new_v4();
            let line = detail(goods, requested);
            if let Ok(total) = check_allocation(&line, already, Uuid::new_v4(), stock(goods, on_pallet), reserved, quantity) {
                prop_assert_eq!(total, already + quantity);
                prop_assert!(total <= requested);
                prop_assert!(quantity <= on_pallet - reserved);
            }
        }
    }
}
