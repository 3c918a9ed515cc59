//! Credential pool trait
//!
//! The operations the dispatcher consumes from whatever pool it is given.
//! Implementations must be safe under concurrent invocation; the dispatcher
//! holds no locks of its own and calls these from many actions at once.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use crate::credential::Credential;
use crate::error::Result;

/// Outcome of reporting a network failure on a credential's route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// The credential was moved to a different route
    Rotated,
    /// Rotation was attempted but no usable route was found
    RotationFailed,
    /// The pool decided not to act (e.g. the credential is direct)
    NoAction,
}

impl RouteOutcome {
    /// Label for logging and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            RouteOutcome::Rotated => "rotated",
            RouteOutcome::RotationFailed => "rotation_failed",
            RouteOutcome::NoAction => "no_action",
        }
    }
}

impl fmt::Display for RouteOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Pool of reusable credentials with per-queue locking.
///
/// Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility (`Arc<dyn CredentialPool>`).
pub trait CredentialPool: Send + Sync {
    /// Credential by handle, regardless of queue locks. `None` if unknown.
    fn get<'a>(
        &'a self,
        handle: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Credential>>> + Send + 'a>>;

    /// Lease an available credential with the given role whose `queue`
    /// bucket is not locked. `None` if no credential qualifies.
    fn get_for_queue<'a>(
        &'a self,
        queue: &'a str,
        role: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Credential>>> + Send + 'a>>;

    /// Snapshot of every credential in the pool.
    fn get_all(&self) -> Pin<Box<dyn Future<Output = Result<Vec<Credential>>> + Send + '_>>;

    /// Lock `queue` for `handle` for `minutes`.
    fn lock_queue<'a>(
        &'a self,
        handle: &'a str,
        queue: &'a str,
        minutes: u64,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

    /// Disable `handle` permanently, recording `reason`.
    fn disable_permanently<'a>(
        &'a self,
        handle: &'a str,
        reason: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

    /// Report a network failure on `handle`'s route.
    fn report_route_failure<'a>(
        &'a self,
        handle: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<RouteOutcome>> + Send + 'a>>;
}
