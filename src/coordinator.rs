//! Passel Coordinator
//!
//! Implements the five passel operations on top of the local store and the peer client:
//!
//! * `get_state` / `get_passel_state` read the local store only.
//! * `get_passel_state_consistency` asks every peer for its view and compares them.
//! * `set_state` applies a change on this node and verifies it through its own endpoint.
//! * `set_passel_state` relays a change to every peer and checks they agree afterwards.
//!
//! Every operation is a single pass. Peers are contacted one at a time in passel order
//! and the first failure ends the operation; nothing is retried and nothing is rolled back.
//! Before any write the transition guard must approve the change.

use crate::concurrency::PossumLockManager;
use crate::consistency::are_consistent;
use crate::directory::Credentials;
use crate::error::{ConsistencyStage, PasselError, StorageError};
use crate::guard::{at_least_one_alive, overlay};
use crate::peer::PeerClient;
use crate::store::StateStore;
use crate::types::{ConsistencyReport, Passel, PasselContext, PasselState, PossumId, PossumState};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Passel coordination service
pub struct PasselCoordinator {
    /// Local durable record of every possum's state
    store: Arc<dyn StateStore + Send + Sync>,
    /// Outbound calls to peers (including this node's own endpoint)
    peers: Arc<dyn PeerClient>,
    /// Serializes coordinated writes arriving at this node
    lock_manager: Arc<PossumLockManager>,
}

impl PasselCoordinator {
    pub fn new(
        store: Arc<dyn StateStore + Send + Sync>,
        peers: Arc<dyn PeerClient>,
        lock_manager: Arc<PossumLockManager>,
    ) -> Self {
        Self {
            store,
            peers,
            lock_manager,
        }
    }

    /// Fails the way `set_state` would if this node cannot name itself in the passel
    pub fn resolve_identity(&self, ctx: &PasselContext) -> Result<(), PasselError> {
        require_identity(ctx).map(|_| ())
    }

    /// Fails the way `set_passel_state` would if the passel is empty
    pub fn resolve_passel(&self, ctx: &PasselContext) -> Result<(), PasselError> {
        require_passel(ctx).map(|_| ())
    }

    /// State of this node's own possum, read from the local store
    pub fn get_state(&self, ctx: &PasselContext) -> Result<PossumState, PasselError> {
        let possum = require_identity(ctx)?;
        let state = self.store.get(possum)?;
        debug!(possum = %possum, state = %state, "Read own state");
        Ok(state)
    }

    /// State of every possum in the passel, read from the local store
    pub fn get_passel_state(&self, ctx: &PasselContext) -> Result<PasselState, PasselError> {
        let passel = require_passel(ctx)?;
        Ok(self.store.get_all(passel)?)
    }

    /// Collect every peer's view of the passel and report whether they agree.
    ///
    /// Disagreement is an `Inconsistent` error carrying every snapshot.
    pub async fn get_passel_state_consistency(
        &self,
        ctx: &PasselContext,
    ) -> Result<ConsistencyReport, PasselError> {
        let passel = require_passel(ctx)?;
        let passel_states = self.gather_states(passel).await?;
        check_consistency(ConsistencyStage::Check, passel_states)
    }

    /// Apply `desired` to the local store of this node.
    ///
    /// The baseline is this node's own published view, fetched through its endpoint. The
    /// change must pass the guard against that baseline, and the view published after the
    /// write must equal the baseline with `desired` laid over it.
    pub async fn set_state(
        &self,
        ctx: &PasselContext,
        desired: &PasselState,
    ) -> Result<PasselState, PasselError> {
        let possum = require_identity(ctx)?;
        validate_desired(ctx, desired)?;

        let lock = self.lock_manager.get_lock(possum);
        let _guard = lock.lock().await;

        let baseline = self.peers.fetch_state(possum).await?;
        if !at_least_one_alive(desired, &baseline) {
            warn!(possum = %possum, desired = ?desired, "Refusing change that kills every possum");
            return Err(PasselError::SafetyViolation);
        }

        self.write_local(desired).await?;
        for (target, state) in desired {
            info!(possum = %possum, target = %target, state = %state, "Applied state change");
        }

        let expected = overlay(desired, &baseline);
        let actual = self.peers.fetch_state(possum).await?;
        if actual != expected {
            warn!(
                possum = %possum,
                expected = ?expected,
                actual = ?actual,
                "Post-write state does not match the request"
            );
            return Err(PasselError::VerificationFailed { expected, actual });
        }

        Ok(actual)
    }

    /// Apply `desired` on every possum in the passel.
    ///
    /// Peers must agree before the update unless `force` is set; the guard is always
    /// checked against the first peer's view. Each peer applies the change through its own
    /// `set_state`, and the views returned must agree afterwards.
    pub async fn set_passel_state(
        &self,
        ctx: &PasselContext,
        desired: &PasselState,
        force: bool,
        credentials: &Credentials,
    ) -> Result<ConsistencyReport, PasselError> {
        let passel = require_passel(ctx)?;
        validate_desired(ctx, desired)?;

        let _guard = self.lock_manager.passel_lock().lock().await;

        let before = self.gather_states(passel).await?;
        if force {
            debug!("Skipping pre-update consistency check");
        } else if !are_consistent(&before) {
            return Err(inconsistent(ConsistencyStage::BeforeUpdate, before));
        }

        let baseline = before.first().cloned().unwrap_or_default();
        if !at_least_one_alive(desired, &baseline) {
            warn!(desired = ?desired, "Refusing passel change that kills every possum");
            return Err(PasselError::SafetyViolation);
        }

        let after = self.push_states(passel, desired, credentials).await?;
        let report = check_consistency(ConsistencyStage::AfterUpdate, after)?;
        info!(
            peers = report.passel_states.len(),
            changes = desired.len(),
            force,
            "Passel state updated"
        );
        Ok(report)
    }

    // Each store write flushes to disk, so run them on the blocking pool
    async fn write_local(&self, desired: &PasselState) -> Result<(), PasselError> {
        let store = Arc::clone(&self.store);
        let desired = desired.clone();
        tokio::task::spawn_blocking(move || {
            desired
                .iter()
                .try_for_each(|(target, state)| store.set(target, *state))
        })
        .await
        .map_err(|e| {
            StorageError::IoError(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("State write task failed: {}", e),
            ))
        })??;
        Ok(())
    }

    /// `fetch_state` on every possum in passel order, stopping at the first failure
    async fn gather_states(&self, passel: &[PossumId]) -> Result<Vec<PasselState>, PasselError> {
        let mut passel_states = Vec::with_capacity(passel.len());
        for possum in passel {
            let state = self.peers.fetch_state(possum).await.map_err(|e| {
                debug!(possum = %possum, error = %e, "Fetch failed, abandoning fan-out");
                e
            })?;
            passel_states.push(state);
        }
        Ok(passel_states)
    }

    /// `push_state` on every possum in passel order, stopping at the first failure
    async fn push_states(
        &self,
        passel: &[PossumId],
        desired: &PasselState,
        credentials: &Credentials,
    ) -> Result<Vec<PasselState>, PasselError> {
        let mut passel_states = Vec::with_capacity(passel.len());
        for possum in passel {
            let state = self
                .peers
                .push_state(possum, desired, credentials)
                .await
                .map_err(|e| {
                    warn!(possum = %possum, error = %e, "Push failed, abandoning fan-out");
                    e
                })?;
            passel_states.push(state);
        }
        Ok(passel_states)
    }
}

fn require_passel(ctx: &PasselContext) -> Result<&Passel, PasselError> {
    if ctx.passel.is_empty() {
        debug!("Passel had 0 members");
        return Err(PasselError::EmptyPassel);
    }
    Ok(&ctx.passel)
}

/// The passel entry naming this node
fn require_identity(ctx: &PasselContext) -> Result<&PossumId, PasselError> {
    if ctx.application_uris.is_empty() {
        return Err(PasselError::NoApplicationUris);
    }
    require_passel(ctx)?;
    ctx.matched_possum().ok_or_else(|| {
        debug!(uris = ?ctx.application_uris, "Could not match any possum");
        PasselError::NoMatchingPossum
    })
}

/// Every key of the request must be a passel member
fn validate_desired(ctx: &PasselContext, desired: &PasselState) -> Result<(), PasselError> {
    match desired.keys().find(|possum| !ctx.contains(possum)) {
        Some(stranger) => Err(PasselError::Validation(format!(
            "Possum {} is not part of my passel",
            stranger
        ))),
        None => Ok(()),
    }
}

fn inconsistent(stage: ConsistencyStage, passel_states: Vec<PasselState>) -> PasselError {
    warn!(stage = stage.message(), passel_states = ?passel_states, "Passel views disagree");
    PasselError::Inconsistent {
        stage,
        passel_states,
    }
}

fn check_consistency(
    stage: ConsistencyStage,
    passel_states: Vec<PasselState>,
) -> Result<ConsistencyReport, PasselError> {
    if !are_consistent(&passel_states) {
        return Err(inconsistent(stage, passel_states));
    }
    Ok(ConsistencyReport {
        consistent: true,
        passel_states,
    })
}
