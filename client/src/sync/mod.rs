//! Sync Engine: one pull-then-push round at a time.
//!
//! Rounds are never concurrent. A request that arrives while a round runs is
//! dropped. Rounds triggered by connectivity edges are additionally spaced
//! by a minimum interval; an early edge waits for it instead of being lost.
//! Retrying is left to the next edge.

mod pull;
mod push;

use crate::api::RemoteClient;
use crate::connectivity::ConnectivityStatus;
use crate::error::{Error, Result, SyncPhase};
use crate::session::SessionManager;
use crate::store::LocalStore;
use rentx_engine::{BatchSummary, Revision};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

/// Result of the push phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// The server accepted the profile as of `revision`
    Pushed { revision: Revision },
    NothingToPush,
    /// The user signed out while the push was in flight
    Abandoned,
}

/// What a completed round did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub pull: BatchSummary,
    pub push: PushOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Another round is running
    InFlight,
    /// The previous round started less than the minimum interval ago
    Throttled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundOutcome {
    Completed(SyncReport),
    Skipped(SkipReason),
}

pub struct SyncEngine {
    store: Arc<LocalStore>,
    remote: Arc<RemoteClient>,
    session: Arc<SessionManager>,
    min_interval: Duration,
    round: Mutex<()>,
    last_started: std::sync::Mutex<Option<Instant>>,
    /// Set while an edge round waits out the minimum interval
    deferred: AtomicBool,
}

impl SyncEngine {
    pub fn new(
        store: Arc<LocalStore>,
        remote: Arc<RemoteClient>,
        session: Arc<SessionManager>,
        min_interval: Duration,
    ) -> Self {
        Self {
            store,
            remote,
            session,
            min_interval,
            round: Mutex::new(()),
            last_started: std::sync::Mutex::new(None),
            deferred: AtomicBool::new(false),
        }
    }

    /// Run one round now unless another is in flight.
    ///
    /// A pull failure aborts the round with the cursor untouched. A push
    /// failure is reported as well, but the committed pull stays.
    pub async fn sync_once(&self) -> Result<RoundOutcome> {
        let Ok(_round) = self.round.try_lock() else {
            debug!("sync round already in flight");
            return Ok(RoundOutcome::Skipped(SkipReason::InFlight));
        };
        self.mark_started();

        let token = self.session.token();
        let since = self.store.cursor().last_pulled_version();
        info!(since, authenticated = token.is_some(), "sync round started");

        let pull = pull::pull_phase(&self.store, &self.remote, token.as_ref())
            .await
            .map_err(|e| Error::sync_abort(SyncPhase::Pull, e))?;

        let push = push::push_phase(&self.session, &self.remote)
            .await
            .map_err(|e| Error::sync_abort(SyncPhase::Push, e))?;

        Ok(RoundOutcome::Completed(SyncReport { pull, push }))
    }

    /// Run a round for a connectivity edge, honoring the minimum interval.
    pub async fn trigger(&self) -> Result<RoundOutcome> {
        if self.remaining_interval().is_some() {
            debug!("sync round throttled");
            return Ok(RoundOutcome::Skipped(SkipReason::Throttled));
        }
        self.sync_once().await
    }

    /// Drive rounds from connectivity until the monitor goes away.
    ///
    /// Runs one round at start if already online, then one per
    /// offline-to-online edge. An edge inside the minimum interval is
    /// delayed until the interval has passed, and edges arriving while
    /// one is delayed join it.
    pub async fn run(self: Arc<Self>, mut connectivity: watch::Receiver<ConnectivityStatus>) {
        let mut seen = *connectivity.borrow_and_update();
        if seen.online {
            self.spawn_round(false);
        }

        while connectivity.changed().await.is_ok() {
            let status = *connectivity.borrow_and_update();
            if status.reconnects > seen.reconnects {
                info!(reconnects = status.reconnects, "back online");
                self.spawn_round(true);
            }
            seen = status;
        }
        debug!("connectivity monitor closed, sync driver stopping");
    }

    fn spawn_round(self: &Arc<Self>, edge: bool) {
        if edge && self.deferred.swap(true, Ordering::AcqRel) {
            debug!("edge joined a pending sync round");
            return;
        }

        let engine = Arc::clone(self);
        tokio::spawn(async move {
            if edge {
                while let Some(wait) = engine.remaining_interval() {
                    debug!(?wait, "delaying sync round");
                    tokio::time::sleep(wait).await;
                }
                engine.deferred.store(false, Ordering::Release);
            }
            log_outcome(&engine.sync_once().await);
        });
    }

    /// Time left before another edge round may start.
    fn remaining_interval(&self) -> Option<Duration> {
        let last = *self
            .last_started
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        last.and_then(|at| self.min_interval.checked_sub(at.elapsed()))
            .filter(|wait| !wait.is_zero())
    }

    fn mark_started(&self) {
        *self
            .last_started
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(Instant::now());
    }
}

fn log_outcome(outcome: &Result<RoundOutcome>) {
    match outcome {
        Ok(RoundOutcome::Completed(report)) => info!(
            from = report.pull.from_version,
            to = report.pull.to_version,
            created = report.pull.created,
            updated = report.pull.updated,
            deleted = report.pull.deleted,
            push = ?report.push,
            "sync round completed"
        ),
        Ok(RoundOutcome::Skipped(reason)) => debug!(?reason, "sync round skipped"),
        Err(e) => warn!(error = %e, retryable = e.is_retryable(), "sync round failed"),
    }
}
