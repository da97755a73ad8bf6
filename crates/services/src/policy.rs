//! Ownership and authorization policy.
//!
//! A pure decision function: no side effects, no storage access. Denials
//! carry a machine-distinguishable [`DenyReason`] so the transport layer
//! can map them to the right user-facing message.

use domains::{DenyReason, Identity, Review};

/// The mutating operations the policy rules on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutateAction {
    Create,
    Edit,
    DeleteOwn,
    ChangeVisibility,
    Reply,
}

/// Rules, evaluated in order:
///
/// 1. `Create`: any authenticated, non-anonymous identity.
/// 2. `Edit` / `DeleteOwn`: the caller owns the review and it is not
///    already deleted. Ownership is checked before the terminal-state
///    check, so a non-owner probing a deleted review learns nothing.
/// 3. `ChangeVisibility` / `Reply`: the caller holds the moderation
///    capability; the record itself does not gate these.
pub fn authorize(
    identity: &Identity,
    review: Option<&Review>,
    action: MutateAction,
) -> Result<(), DenyReason> {
    match action {
        MutateAction::Create => {
            if identity.is_anonymous() {
                Err(DenyReason::InsufficientRole)
            } else {
                Ok(())
            }
        }
        MutateAction::Edit | MutateAction::DeleteOwn => {
            let Some(review) = review else {
                return Err(DenyReason::NotOwner);
            };
            if !identity.owns(review.author_id) {
                return Err(DenyReason::NotOwner);
            }
            if review.status.is_terminal() {
                return Err(DenyReason::AlreadyDeleted);
            }
            Ok(())
        }
        MutateAction::ChangeVisibility | MutateAction::Reply => {
            if identity.can_moderate() {
                Ok(())
            } else {
                Err(DenyReason::InsufficientRole)
            }
        }
    }
}
