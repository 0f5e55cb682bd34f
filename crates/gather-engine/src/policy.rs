//! Eligibility gate — preconditions checked before any computation runs.
//!
//! A violation is surfaced as a typed error distinct from computation
//! failures, so callers can tell "nobody is free" (an empty window list) from
//! "can't compute yet". Both the read and recompute paths go through the same
//! checks.

use thiserror::Error;

use crate::interval::{GroupId, MemberId};

/// Minimum number of simultaneously free members for a window to qualify,
/// and the minimum group size for computation to be attempted at all.
pub const DEFAULT_MIN_MEMBERS: usize = 2;

/// A failed precondition. Never retried, never reaches the solver.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyViolation {
    /// The group is below the minimum-member threshold.
    #[error("group has {have} member(s); at least {required} required")]
    InsufficientMembers { have: usize, required: usize },

    /// The requesting user is not a member of the group.
    #[error("user {member} is not a member of group {group}")]
    NotAMember { member: MemberId, group: GroupId },
}

/// Check the minimum-member threshold for a group of `have` members.
pub fn ensure_member_count(have: usize, required: usize) -> Result<(), PolicyViolation> {
    if have < required {
        return Err(PolicyViolation::InsufficientMembers { have, required });
    }
    Ok(())
}

/// Check that a membership lookup (already performed by the caller) passed.
pub fn ensure_membership(
    is_member: bool,
    member: MemberId,
    group: GroupId,
) -> Result<(), PolicyViolation> {
    if !is_member {
        return Err(PolicyViolation::NotAMember { member, group });
    }
    Ok(())
}
