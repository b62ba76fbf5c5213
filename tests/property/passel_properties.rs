//! Property-based tests for the consistency evaluator and the transition guard

use possum::consistency::are_consistent;
use possum::guard::{at_least_one_alive, overlay};
use possum::types::{PasselState, PossumState};
use proptest::prelude::*;

fn possum_state() -> impl Strategy<Value = PossumState> {
    prop_oneof![Just(PossumState::Alive), Just(PossumState::Dead)]
}

/// Small key space so generated maps overlap often
fn passel_state() -> impl Strategy<Value = PasselState> {
    prop::collection::btree_map("possum-[a-e]", possum_state(), 0..5)
}

/// Any number of copies of one snapshot agree
#[test]
fn test_identical_snapshots_are_consistent() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(passel_state(), 1usize..6), |(snapshot, copies)| {
            let snapshots = vec![snapshot; copies];
            prop_assert!(are_consistent(&snapshots));
            Ok(())
        })
        .unwrap();
}

/// One differing snapshot anywhere in the sequence breaks consistency
#[test]
fn test_one_divergent_snapshot_is_inconsistent() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(passel_state(), passel_state(), 1usize..5, 0usize..5),
            |(common, other, copies, position)| {
                prop_assume!(common != other);
                let mut snapshots = vec![common; copies];
                let position = position.min(snapshots.len());
                snapshots.insert(position, other);
                prop_assert!(!are_consistent(&snapshots));
                Ok(())
            },
        )
        .unwrap();
}

/// The verdict does not depend on the order snapshots arrived in
#[test]
fn test_verdict_is_order_independent() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&prop::collection::vec(passel_state(), 0..5), |snapshots| {
            let mut reversed = snapshots.clone();
            reversed.reverse();
            prop_assert_eq!(are_consistent(&snapshots), are_consistent(&reversed));
            Ok(())
        })
        .unwrap();
}

/// The guard rejects exactly the changes that leave every possum dead
#[test]
fn test_guard_rejects_iff_all_dead() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(passel_state(), passel_state()), |(desired, baseline)| {
            let merged = overlay(&desired, &baseline);
            let all_dead = merged.values().all(|s| !s.is_alive());
            prop_assert_eq!(at_least_one_alive(&desired, &baseline), !all_dead);
            Ok(())
        })
        .unwrap();
}

/// Desired entries win, untouched baseline entries survive, nothing else appears
#[test]
fn test_overlay_keeps_untouched_entries() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(passel_state(), passel_state()), |(desired, baseline)| {
            let merged = overlay(&desired, &baseline);
            for (possum, state) in &desired {
                prop_assert_eq!(merged.get(possum), Some(state));
            }
            for (possum, state) in &baseline {
                if !desired.contains_key(possum) {
                    prop_assert_eq!(merged.get(possum), Some(state));
                }
            }
            prop_assert!(merged
                .keys()
                .all(|k| desired.contains_key(k) || baseline.contains_key(k)));
            Ok(())
        })
        .unwrap();
}

/// Applying the same change twice gives the same result as applying it once
#[test]
fn test_overlay_is_idempotent() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(passel_state(), passel_state()), |(desired, baseline)| {
            let once = overlay(&desired, &baseline);
            prop_assert_eq!(overlay(&desired, &once), once);
            Ok(())
        })
        .unwrap();
}
