//! Status transition tables
//!
//! Every document type shares the same validator: the acting user's
//! relationship is checked first, then the current status against the
//! action's allowed predecessors.

use proptest::prelude::*;
use shared::*;
use uuid::Uuid;

fn actor(role: Role) -> ActorContext {
    ActorContext {
        user_id: Uuid::new_v4(),
        role,
        creator_id: Uuid::new_v4(),
        assignee_id: None,
    }
}

fn as_creator(role: Role) -> ActorContext {
    let mut ctx = actor(role);
    ctx.creator_id = ctx.user_id;
    ctx
}

fn as_assignee(role: Role) -> ActorContext {
    let mut ctx = actor(role);
    ctx.assignee_id = Some(ctx.user_id);
    ctx
}

/// Every action of a table appears exactly once
fn assert_unique_actions<W: Workflow>() {
    let actions: Vec<W::Action> = W::transitions().iter().map(|t| t.action).collect();
    for a in &actions {
        assert_eq!(
            actions.iter().filter(|x| *x == a).count(),
            1,
            "{}: duplicate rule for {}",
            W::DOCUMENT,
            a
        );
    }
}

/// `allowed_actions` agrees with `next_status` for every status
fn assert_allowed_actions_consistent<W: Workflow>(statuses: &[W::Status]) {
    for status in statuses {
        let allowed = W::allowed_actions(*status);
        for rule in W::transitions() {
            let ok = W::next_status(*status, rule.action).is_ok();
            assert_eq!(
                ok,
                allowed.contains(&rule.action),
                "{}: {} from {}",
                W::DOCUMENT,
                rule.action,
                status
            );
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_tables_have_unique_actions() {
        assert_unique_actions::<PurchaseOrderWorkflow>();
        assert_unique_actions::<GoodsReceiptNoteWorkflow>();
        assert_unique_actions::<SalesOrderWorkflow>();
        assert_unique_actions::<GoodsIssueNoteWorkflow>();
        assert_unique_actions::<StocktakingWorkflow>();
        assert_unique_actions::<BackOrderWorkflow>();
    }

    #[test]
    fn test_allowed_actions_match_next_status() {
        assert_allowed_actions_consistent::<PurchaseOrderWorkflow>(PurchaseOrderStatus::ALL);
        assert_allowed_actions_consistent::<GoodsReceiptNoteWorkflow>(GoodsReceiptNoteStatus::ALL);
        assert_allowed_actions_consistent::<SalesOrderWorkflow>(SalesOrderStatus::ALL);
        assert_allowed_actions_consistent::<GoodsIssueNoteWorkflow>(GoodsIssueNoteStatus::ALL);
        assert_allowed_actions_consistent::<StocktakingWorkflow>(StocktakingStatus::ALL);
        assert_allowed_actions_consistent::<BackOrderWorkflow>(BackOrderStatus::ALL);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(PurchaseOrderWorkflow::is_terminal(PurchaseOrderStatus::Completed));
        assert!(PurchaseOrderWorkflow::is_terminal(PurchaseOrderStatus::Cancelled));
        assert!(!PurchaseOrderWorkflow::is_terminal(PurchaseOrderStatus::Rejected));
        assert!(GoodsIssueNoteWorkflow::is_terminal(GoodsIssueNoteStatus::Completed));
        assert!(StocktakingWorkflow::is_terminal(StocktakingStatus::Cancelled));
        assert!(BackOrderWorkflow::is_terminal(BackOrderStatus::Fulfilled));
    }

    #[test]
    fn test_goods_issue_approve_only_from_pending_approval() {
        let manager = actor(Role::WarehouseManager);
        for status in GoodsIssueNoteStatus::ALL {
            let result =
                GoodsIssueNoteWorkflow::validate(&manager, *status, GoodsIssueNoteAction::Approve);
            if *status == GoodsIssueNoteStatus::PendingApproval {
                assert_eq!(result, Ok(GoodsIssueNoteStatus::Completed));
            } else {
                assert!(matches!(result, Err(TransitionError::NotPermitted { .. })));
            }
        }
    }

    #[test]
    fn test_keeper_cannot_approve_goods_issue() {
        let keeper = as_assignee(Role::WarehouseKeeper);
        let err = GoodsIssueNoteWorkflow::validate(
            &keeper,
            GoodsIssueNoteStatus::PendingApproval,
            GoodsIssueNoteAction::Approve,
        )
        .unwrap_err();
        assert!(err.is_forbidden());
    }

    #[test]
    fn test_only_assignee_picks() {
        let someone = actor(Role::WarehouseKeeper);
        assert!(GoodsIssueNoteWorkflow::validate(
            &someone,
            GoodsIssueNoteStatus::Draft,
            GoodsIssueNoteAction::StartPicking
        )
        .unwrap_err()
        .is_forbidden());

        let keeper = as_assignee(Role::WarehouseKeeper);
        assert_eq!(
            GoodsIssueNoteWorkflow::validate(
                &keeper,
                GoodsIssueNoteStatus::Rejected,
                GoodsIssueNoteAction::StartPicking
            ),
            Ok(GoodsIssueNoteStatus::Picking)
        );
    }

    #[test]
    fn test_admin_is_in_every_approver_pool() {
        assert!(PurchaseOrderWorkflow::approvers().contains(&Role::Admin));
        assert!(GoodsReceiptNoteWorkflow::approvers().contains(&Role::Admin));
        assert!(SalesOrderWorkflow::approvers().contains(&Role::Admin));
        assert!(GoodsIssueNoteWorkflow::approvers().contains(&Role::Admin));
        assert!(StocktakingWorkflow::approvers().contains(&Role::Admin));
        assert!(BackOrderWorkflow::approvers().contains(&Role::Admin));
    }

    #[test]
    fn test_admin_is_not_creator() {
        // Admin approves, but only the creator submits
        let admin = actor(Role::Admin);
        assert!(SalesOrderWorkflow::validate(
            &admin,
            SalesOrderStatus::Draft,
            SalesOrderAction::Submit
        )
        .unwrap_err()
        .is_forbidden());
    }

    #[test]
    fn test_stocktaking_lifecycle() {
        let creator = as_creator(Role::WarehouseManager);
        let mut status = StocktakingStatus::Draft;
        for action in [StocktakingAction::Start, StocktakingAction::Submit] {
            status = StocktakingWorkflow::validate(&creator, status, action).unwrap();
        }
        assert_eq!(status, StocktakingStatus::PendingApproval);

        let approver = actor(Role::WarehouseManager);
        status = StocktakingWorkflow::validate(&approver, status, StocktakingAction::Reject).unwrap();
        assert_eq!(status, StocktakingStatus::Rejected);
        // Recounting after a rejection goes straight back to approval
        status = StocktakingWorkflow::validate(&creator, status, StocktakingAction::Submit).unwrap();
        status = StocktakingWorkflow::validate(&approver, status, StocktakingAction::Approve).unwrap();
        assert_eq!(status, StocktakingStatus::Completed);
    }

    #[test]
    fn test_action_names_round_trip_through_path_segments() {
        for action in SalesOrderAction::ALL {
            assert_eq!(action.as_str().parse::<SalesOrderAction>(), Ok(*action));
        }
        assert!("assign".parse::<SalesOrderAction>().is_err());
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn role_strategy() -> impl Strategy<Value = Role> {
        prop::sample::select(Role::ALL.to_vec())
    }

    fn po_status_strategy() -> impl Strategy<Value = PurchaseOrderStatus> {
        prop::sample::select(PurchaseOrderStatus::ALL.to_vec())
    }

    fn po_action_strategy() -> impl Strategy<Value = PurchaseOrderAction> {
        prop::sample::select(PurchaseOrderAction::ALL.to_vec())
    }

    fn so_status_strategy() -> impl Strategy<Value = SalesOrderStatus> {
        prop::sample::select(SalesOrderStatus::ALL.to_vec())
    }

    fn so_action_strategy() -> impl Strategy<Value = SalesOrderAction> {
        prop::sample::select(SalesOrderAction::ALL.to_vec())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// A successful validation always lands on the rule's target
        #[test]
        fn prop_validate_returns_rule_target(
            role in role_strategy(),
            is_creator in any::<bool>(),
            status in po_status_strategy(),
            action in po_action_strategy()
        ) {
            let ctx = if is_creator { as_creator(role) } else { actor(role) };
            if let Ok(next) = PurchaseOrderWorkflow::validate(&ctx, status, action) {
                let rule = PurchaseOrderWorkflow::rule(action).unwrap();
                prop_assert_eq!(next, rule.to);
                prop_assert!(rule.from.contains(&status));
            }
        }

        /// The relationship error wins over the status error
        #[test]
        fn prop_relationship_checked_first(
            role in role_strategy(),
            status in so_status_strategy(),
            action in so_action_strategy()
        ) {
            let ctx = actor(role);
            let rule = SalesOrderWorkflow::rule(action).unwrap();
            let related = match rule.actor {
                Relationship::Creator | Relationship::Assignee => false,
                Relationship::Approver => SalesOrderWorkflow::approvers().contains(&role),
            };
            let result = SalesOrderWorkflow::validate(&ctx, status, action);
            if !related {
                prop_assert!(result.unwrap_err().is_forbidden());
            } else {
                prop_assert_eq!(result.is_ok(), rule.from.contains(&status));
            }
        }

        /// Terminal statuses accept no action from anyone
        #[test]
        fn prop_terminal_statuses_reject_everything(
            role in role_strategy(),
            action in po_action_strategy()
        ) {
            let ctx = as_creator(role);
            for status in [PurchaseOrderStatus::Completed, PurchaseOrderStatus::Cancelled] {
                prop_assert!(PurchaseOrderWorkflow::validate(&ctx, status, action).is_err());
            }
        }
    }
}
