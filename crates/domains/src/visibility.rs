//! # Visibility State Machine
//!
//! INVARIANT: `deleted` is terminal. A request that does not match an edge
//! below is an error, never a silent no-op — a second `hide` on an
//! already-hidden review must fail so concurrent moderators observe each
//! other's transitions.
//!
//! ```text
//!            hide
//!   public ────────▶ hidden
//!      ▲    unhide     │
//!      └───────────────┘
//!        \            /
//!  delete \          / delete
//!          ▼        ▼
//!           deleted (terminal)
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::ReviewStatus;

/// A moderator-requested visibility transition. The author-scoped
/// self-delete path reuses `Delete` and lands in the same terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisibilityAction {
    Hide,
    Unhide,
    Delete,
}

impl fmt::Display for VisibilityAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VisibilityAction::Hide => f.write_str("hide"),
            VisibilityAction::Unhide => f.write_str("unhide"),
            VisibilityAction::Delete => f.write_str("delete"),
        }
    }
}

/// The transition table. Returns the next status, or `None` when no edge
/// exists from `current` under `action`.
pub fn next_status(current: ReviewStatus, action: VisibilityAction) -> Option<ReviewStatus> {
    match (current, action) {
        (ReviewStatus::Public, VisibilityAction::Hide) => Some(ReviewStatus::Hidden),
        (ReviewStatus::Hidden, VisibilityAction::Unhide) => Some(ReviewStatus::Public),
        (ReviewStatus::Public | ReviewStatus::Hidden, VisibilityAction::Delete) => {
            Some(ReviewStatus::Deleted)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legal_edges() {
        assert_eq!(
            next_status(ReviewStatus::Public, VisibilityAction::Hide),
            Some(ReviewStatus::Hidden)
        );
        assert_eq!(
            next_status(ReviewStatus::Hidden, VisibilityAction::Unhide),
            Some(ReviewStatus::Public)
        );
        assert_eq!(
            next_status(ReviewStatus::Public, VisibilityAction::Delete),
            Some(ReviewStatus::Deleted)
        );
        assert_eq!(
            next_status(ReviewStatus::Hidden, VisibilityAction::Delete),
            Some(ReviewStatus::Deleted)
        );
    }

    #[test]
    fn repeated_actions_are_not_edges() {
        assert_eq!(next_status(ReviewStatus::Hidden, VisibilityAction::Hide), None);
        assert_eq!(next_status(ReviewStatus::Public, VisibilityAction::Unhide), None);
    }

    #[test]
    fn deleted_is_terminal() {
        for action in [
            VisibilityAction::Hide,
            VisibilityAction::Unhide,
            VisibilityAction::Delete,
        ] {
            assert_eq!(next_status(ReviewStatus::Deleted, action), None);
        }
    }
}
