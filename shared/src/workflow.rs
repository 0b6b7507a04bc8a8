//! Table-driven status transitions for warehouse documents
//!
//! Every document type (purchase order, goods receipt note, sales order,
//! goods issue note, stocktaking sheet, back order) declares a static table of
//! `(allowed predecessors, action) -> target` rows together with the
//! relationship the acting user must have to the document. Services call
//! [`Workflow::validate`] before touching any row, so a rejected action never
//! leaves a partial mutation behind.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::Role;

/// Relationship the acting user must have to the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relationship {
    /// The user who created the document
    Creator,
    /// The user the document (or its picking/inspection work) is assigned to
    Assignee,
    /// Any user whose role is in the document's approver pool
    Approver,
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Relationship::Creator => write!(f, "creator"),
            Relationship::Assignee => write!(f, "assignee"),
            Relationship::Approver => write!(f, "approver"),
        }
    }
}

impl Relationship {
    fn label_vi(&self) -> &'static str {
        match self {
            Relationship::Creator => "người tạo",
            Relationship::Assignee => "người được phân công",
            Relationship::Approver => "người duyệt",
        }
    }
}

/// One row of a transition table
#[derive(Debug, Clone, Copy)]
pub struct Transition<S: 'static, A: 'static> {
    pub action: A,
    pub from: &'static [S],
    pub to: S,
    pub actor: Relationship,
}

/// Who is acting and how they relate to the document
#[derive(Debug, Clone, Copy)]
pub struct ActorContext {
    pub user_id: Uuid,
    pub role: Role,
    pub creator_id: Uuid,
    pub assignee_id: Option<Uuid>,
}

/// Reasons a transition is refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("{document}: action '{action}' is not allowed from status '{from}'")]
    NotPermitted {
        document: &'static str,
        document_vi: &'static str,
        action: String,
        from: String,
    },

    #[error("{document}: action '{action}' requires the {relationship}")]
    Forbidden {
        document: &'static str,
        document_vi: &'static str,
        action: String,
        relationship: Relationship,
    },

    #[error("{document}: action '{action}' has no transition rule")]
    Unsupported {
        document: &'static str,
        document_vi: &'static str,
        action: String,
    },
}

impl TransitionError {
    /// Human-readable Vietnamese message for the response envelope
    pub fn message_vi(&self) -> String {
        match self {
            TransitionError::NotPermitted { document_vi, from, .. } => format!(
                "Trạng thái hiện tại của {} ({}) không cho phép thao tác này",
                document_vi, from
            ),
            TransitionError::Forbidden { document_vi, relationship, .. } => format!(
                "Chỉ {} của {} mới được thực hiện thao tác này",
                relationship.label_vi(),
                document_vi
            ),
            TransitionError::Unsupported { document_vi, .. } => {
                format!("Thao tác không hợp lệ đối với {}", document_vi)
            }
        }
    }

    /// True when the refusal is about who acts rather than the document state
    pub fn is_forbidden(&self) -> bool {
        matches!(self, TransitionError::Forbidden { .. })
    }
}

/// A document lifecycle described by a static transition table
pub trait Workflow {
    type Status: Copy + Eq + fmt::Debug + fmt::Display + 'static;
    type Action: Copy + Eq + fmt::Debug + fmt::Display + 'static;

    /// Machine name used in logs and notifications
    const DOCUMENT: &'static str;
    /// Vietnamese name used in user-facing messages
    const DOCUMENT_VI: &'static str;

    fn transitions() -> &'static [Transition<Self::Status, Self::Action>];

    /// Roles allowed to act as approver
    fn approvers() -> &'static [Role];

    fn rule(
        action: Self::Action,
    ) -> Result<&'static Transition<Self::Status, Self::Action>, TransitionError> {
        Self::transitions()
            .iter()
            .find(|t| t.action == action)
            .ok_or_else(|| TransitionError::Unsupported {
                document: Self::DOCUMENT,
                document_vi: Self::DOCUMENT_VI,
                action: action.to_string(),
            })
    }

    /// Status reached by `action` from `current`, ignoring who acts
    fn next_status(
        current: Self::Status,
        action: Self::Action,
    ) -> Result<Self::Status, TransitionError> {
        let rule = Self::rule(action)?;
        if rule.from.contains(&current) {
            Ok(rule.to)
        } else {
            Err(TransitionError::NotPermitted {
                document: Self::DOCUMENT,
                document_vi: Self::DOCUMENT_VI,
                action: action.to_string(),
                from: current.to_string(),
            })
        }
    }

    /// Actions whose predecessor set contains `current`
    fn allowed_actions(current: Self::Status) -> Vec<Self::Action> {
        Self::transitions()
            .iter()
            .filter(|t| t.from.contains(&current))
            .map(|t| t.action)
            .collect()
    }

    fn is_terminal(current: Self::Status) -> bool {
        Self::allowed_actions(current).is_empty()
    }

    fn has_relationship(relationship: Relationship, ctx: &ActorContext) -> bool {
        match relationship {
            Relationship::Creator => ctx.user_id == ctx.creator_id,
            Relationship::Assignee => ctx.assignee_id == Some(ctx.user_id),
            Relationship::Approver => Self::approvers().contains(&ctx.role),
        }
    }

    /// Relationship check first, then the predecessor check
    fn validate(
        ctx: &ActorContext,
        current: Self::Status,
        action: Self::Action,
    ) -> Result<Self::Status, TransitionError> {
        let rule = Self::rule(action)?;
        if !Self::has_relationship(rule.actor, ctx) {
            return Err(TransitionError::Forbidden {
                document: Self::DOCUMENT,
                document_vi: Self::DOCUMENT_VI,
                action: action.to_string(),
                relationship: rule.actor,
            });
        }
        Self::next_status(current, action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PurchaseOrderAction, PurchaseOrderStatus, PurchaseOrderWorkflow};

    fn ctx(role: Role, is_creator: bool) -> ActorContext {
        let user_id = Uuid::new_v4();
        ActorContext {
            user_id,
            role,
            creator_id: if is_creator { user_id } else { Uuid::new_v4() },
            assignee_id: None,
        }
    }

    #[test]
    fn test_every_action_has_exactly_one_rule() {
        let actions: Vec<_> = PurchaseOrderWorkflow::transitions()
            .iter()
            .map(|t| t.action)
            .collect();
        for a in &actions {
            assert_eq!(actions.iter().filter(|x| *x == a).count(), 1, "{a}");
        }
    }

    #[test]
    fn test_relationship_checked_before_status() {
        // Not the creator and the status is wrong: the relationship error wins
        let err = PurchaseOrderWorkflow::validate(
            &ctx(Role::Purchaser, false),
            PurchaseOrderStatus::Completed,
            PurchaseOrderAction::Submit,
        )
        .unwrap_err();
        assert!(err.is_forbidden());
    }

    #[test]
    fn test_message_vi_mentions_document() {
        let err = PurchaseOrderWorkflow::next_status(
            PurchaseOrderStatus::Completed,
            PurchaseOrderAction::Approve,
        )
        .unwrap_err();
        assert!(err.message_vi().contains(PurchaseOrderWorkflow::DOCUMENT_VI));
    }
}
