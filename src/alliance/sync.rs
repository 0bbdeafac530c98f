use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::selections::{AllianceSelections, RemoteSelections, SelectionState, SyncOutcome};
use crate::backend::{BackendClient, BackendError};

pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(
        "alliance selections were changed elsewhere since the last sync \
         (remote {remote:.0}, last seen {seen:.0}); sync first or force the save"
    )]
    Conflict { remote: f64, seen: f64 },

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Where the shared alliance board lives.
pub trait SelectionStore {
    fn load(&self) -> impl Future<Output = Result<RemoteSelections, BackendError>>;
    fn save(&self, selections: &AllianceSelections) -> impl Future<Output = Result<f64, BackendError>>;
}

impl SelectionStore for BackendClient {
    fn load(&self) -> impl Future<Output = Result<RemoteSelections, BackendError>> {
        self.load_selections()
    }

    fn save(&self, selections: &AllianceSelections) -> impl Future<Output = Result<f64, BackendError>> {
        self.save_selections(selections)
    }
}

/// Polling sync of the alliance board with a last-writer check on save.
///
/// Consistency is eventual: two sessions editing between polls will see the
/// second save refused until it re-syncs (or forces).
pub struct SelectionSync<S> {
    store: S,
    state: SelectionState,
}

impl<S: SelectionStore> SelectionSync<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            state: SelectionState::new(),
        }
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut SelectionState {
        &mut self.state
    }

    pub async fn poll(&mut self) -> Result<SyncOutcome, SyncError> {
        let remote = self.store.load().await?;
        let outcome = self.state.apply_remote(remote);
        match outcome {
            SyncOutcome::Reset => info!("Alliance selections reset by another user"),
            SyncOutcome::Updated => info!("Alliance selections synced from server"),
            SyncOutcome::Unchanged => debug!("Alliance selections unchanged"),
        }
        Ok(outcome)
    }

    /// Push local selections. Refused with `Conflict` when the backend has
    /// a write we have not seen, unless `force` is set.
    pub async fn save(&mut self, force: bool) -> Result<f64, SyncError> {
        let remote = self.store.load().await?;
        if remote.timestamp > self.state.timestamp {
            if !force {
                return Err(SyncError::Conflict {
                    remote: remote.timestamp,
                    seen: self.state.timestamp,
                });
            }
            warn!("Overwriting alliance selections saved elsewhere");
        }

        let timestamp = self.store.save(&self.state.selections).await?;
        self.state.mark_saved(timestamp);
        Ok(timestamp)
    }

    /// Poll every `interval` until `shutdown` completes, reporting each
    /// outcome. Failed polls are logged and retried on the next tick.
    pub async fn run<F, Q>(&mut self, interval: Duration, shutdown: Q, mut on_outcome: F)
    where
        F: FnMut(&SelectionState, SyncOutcome),
        Q: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {
                    match self.poll().await {
                        Ok(outcome) => on_outcome(&self.state, outcome),
                        Err(e) => warn!("Error loading alliance selections: {}", e),
                    }
                }
            }
        }
    }
}
