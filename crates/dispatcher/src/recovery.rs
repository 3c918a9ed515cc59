//! Failure classification and recovery
//!
//! Maps a fault to at most one pool mutation on the credential that produced
//! it:
//!
//! | Fault kind         | Mutation                                              |
//! |--------------------|-------------------------------------------------------|
//! | `RateLimited`      | lock the queue until the reset, or a default duration |
//! | `AccountDisabled`  | disable, reason is the fault message                  |
//! | `AuthInvalid`      | disable, reason `invalid-credentials`                 |
//! | `PermissionDenied` | lock `<queue>_ops`                                    |
//! | `TransportError`   | report a route failure                                |
//! | `Unclassified`     | none                                                  |
//!
//! Mutation failures are logged and never replace the fault; the caller
//! always gets the original fault back.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use account_pool::{CredentialPool, RouteOutcome};
use protocol::{Fault, FaultKind};
use tracing::{debug, error, info, warn};

use crate::config::RecoveryConfig;
use crate::metrics;
use crate::queue::ops_bucket;

/// Disable reason recorded when the remote rejects the auth material.
pub const INVALID_CREDENTIALS_REASON: &str = "invalid-credentials";

/// The pool mutation chosen for a fault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recovery {
    LockQueue { queue: String, minutes: u64 },
    Disable { reason: String },
    ReportRoute,
    LogOnly,
}

impl Recovery {
    /// Label for logging and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Recovery::LockQueue { .. } => "lock_queue",
            Recovery::Disable { .. } => "disable",
            Recovery::ReportRoute => "report_route",
            Recovery::LogOnly => "none",
        }
    }
}

/// Minutes to lock a rate-limited queue.
///
/// With a reset time the lock lasts until the reset, floored to whole minutes
/// but never below one. Without one the default applies.
pub fn rate_limit_minutes(reset: Option<u64>, now_secs: u64, default_minutes: u64) -> u64 {
    match reset {
        Some(reset) => (reset.saturating_sub(now_secs) / 60).max(1),
        None => default_minutes,
    }
}

/// Choose the recovery for `fault` raised on `queue`.
pub fn plan(fault: &Fault, queue: &str, now_secs: u64, config: &RecoveryConfig) -> Recovery {
    match fault.kind {
        FaultKind::RateLimited => Recovery::LockQueue {
            queue: queue.to_string(),
            minutes: rate_limit_minutes(
                fault.rate_limit_reset,
                now_secs,
                config.rate_limit_default_minutes,
            ),
        },
        FaultKind::AccountDisabled => Recovery::Disable {
            reason: fault.message.clone(),
        },
        FaultKind::AuthInvalid => Recovery::Disable {
            reason: INVALID_CREDENTIALS_REASON.to_string(),
        },
        FaultKind::PermissionDenied => Recovery::LockQueue {
            queue: ops_bucket(queue),
            minutes: config.permission_lock_minutes,
        },
        FaultKind::TransportError => Recovery::ReportRoute,
        FaultKind::Unclassified => Recovery::LogOnly,
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Applies recovery mutations to the pool.
pub struct RecoveryController {
    pool: Arc<dyn CredentialPool>,
    config: RecoveryConfig,
}

impl RecoveryController {
    pub fn new(pool: Arc<dyn CredentialPool>, config: RecoveryConfig) -> Self {
        Self { pool, config }
    }

    /// Classify `fault` and apply the matching mutation to `handle`.
    ///
    /// Never fails; returns the recovery that was chosen.
    pub async fn recover(&self, handle: &str, queue: &str, fault: &Fault) -> Recovery {
        self.recover_at(handle, queue, fault, unix_now()).await
    }

    pub(crate) async fn recover_at(
        &self,
        handle: &str,
        queue: &str,
        fault: &Fault,
        now_secs: u64,
    ) -> Recovery {
        metrics::record_fault(fault.kind.label());
        error!(
            credential = handle,
            queue,
            kind = %fault.kind,
            error = %fault.details(),
            "action failed"
        );

        let recovery = plan(fault, queue, now_secs, &self.config);
        let applied = match &recovery {
            Recovery::LockQueue { queue, minutes } => self
                .pool
                .lock_queue(handle, queue, *minutes)
                .await
                .map(|()| {
                    info!(credential = handle, queue = %queue, minutes, "queue lock applied");
                    "applied"
                }),
            Recovery::Disable { reason } => self
                .pool
                .disable_permanently(handle, reason)
                .await
                .map(|()| {
                    warn!(credential = handle, reason = %reason, "credential disabled");
                    "applied"
                }),
            Recovery::ReportRoute => self
                .pool
                .report_route_failure(handle)
                .await
                .map(|outcome| {
                    log_route_outcome(handle, outcome);
                    outcome.label()
                }),
            Recovery::LogOnly => {
                warn!(credential = handle, kind = %fault.kind, "no recovery for fault");
                Ok("skipped")
            }
        };

        match applied {
            Ok(result) => metrics::record_recovery(recovery.label(), result),
            Err(e) => {
                error!(
                    credential = handle,
                    mutation = recovery.label(),
                    error = %e,
                    "recovery mutation failed"
                );
                metrics::record_recovery(recovery.label(), "failed");
            }
        }

        recovery
    }
}

fn log_route_outcome(handle: &str, outcome: RouteOutcome) {
    match outcome {
        RouteOutcome::Rotated => info!(credential = handle, "route rotated after network failure"),
        RouteOutcome::RotationFailed => {
            error!(credential = handle, "route rotation failed, credential keeps its route")
        }
        RouteOutcome::NoAction => debug!(credential = handle, "pool took no route action"),
    }
}
