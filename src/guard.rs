//! State Transition Guard
//!
//! The one safety rule of the passel: no change may leave every possum dead.

use crate::types::PasselState;

/// Overlay `desired` on `baseline`: desired entries win, untouched baseline entries are kept.
pub fn overlay(desired: &PasselState, baseline: &PasselState) -> PasselState {
    let mut merged = baseline.clone();
    merged.extend(desired.iter().map(|(possum, state)| (possum.clone(), *state)));
    merged
}

/// True iff at least one possum is alive once `desired` is applied over `baseline`.
pub fn at_least_one_alive(desired: &PasselState, baseline: &PasselState) -> bool {
    overlay(desired, baseline)
        .values()
        .any(|state| state.is_alive())
}
