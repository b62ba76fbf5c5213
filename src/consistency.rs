//! Consistency Evaluator
//!
//! Decides whether the passel views collected from every peer agree with each other.
//! Snapshots arrive in passel order; only neighbours are compared, so a repeated run
//! against an unchanged passel always gives the same answer.

use crate::types::PasselState;

/// True iff there is at least one snapshot and every adjacent pair is structurally equal.
///
/// An empty sequence means nothing was collected and is never consistent.
pub fn are_consistent(snapshots: &[PasselState]) -> bool {
    if snapshots.is_empty() {
        return false;
    }
    snapshots.windows(2).all(|pair| pair[0] == pair[1])
}
