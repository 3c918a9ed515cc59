//! In-process credential pool
//!
//! Holds credentials in memory with round-robin leasing. Per-account state is
//! kept beside the credential list:
//!
//! - queue locks: `(handle, queue)` → lock expiry. Expired locks are cleared
//!   on the next lease that looks at them, no background task needed.
//! - disabled accounts: handle → reason. Permanent until the account is
//!   removed and re-added.
//! - spare routes: proxy URLs available for rotation after a route failure.

use std::collections::HashMap;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::credential::{Credential, load_accounts};
use crate::error::{Error, Result};
use crate::pool::{CredentialPool, RouteOutcome};

/// Credential pool backed by in-memory state.
///
/// Uses an `AtomicUsize` for the round-robin index and `RwLock`s for the
/// account list and the per-account state maps.
pub struct MemoryPool {
    accounts: RwLock<Vec<Credential>>,
    queue_locks: RwLock<HashMap<(String, String), Instant>>,
    disabled: RwLock<HashMap<String, String>>,
    spare_routes: RwLock<Vec<String>>,
    next_index: AtomicUsize,
}

impl MemoryPool {
    /// Create a pool holding `credentials`, all unlocked.
    pub fn new(credentials: Vec<Credential>) -> Self {
        info!(accounts = credentials.len(), "pool initialized");
        Self {
            accounts: RwLock::new(credentials),
            queue_locks: RwLock::new(HashMap::new()),
            disabled: RwLock::new(HashMap::new()),
            spare_routes: RwLock::new(Vec::new()),
            next_index: AtomicUsize::new(0),
        }
    }

    /// Create a pool from a JSON accounts file (see `credential` module docs).
    pub async fn from_file(path: &Path) -> Result<Self> {
        Ok(Self::new(load_accounts(path).await?))
    }

    /// Routes that `report_route_failure` may rotate credentials onto.
    pub fn with_spare_routes(self, routes: Vec<String>) -> Self {
        Self {
            spare_routes: RwLock::new(routes),
            ..self
        }
    }

    /// Add a credential, replacing any existing one with the same handle.
    pub async fn add(&self, credential: Credential) {
        let mut accounts = self.accounts.write().await;
        let handle = credential.handle.clone();
        match accounts.iter_mut().find(|c| c.handle == handle) {
            Some(existing) => *existing = credential,
            None => accounts.push(credential),
        }
        info!(credential = %handle, "account added to pool");
    }

    /// Remove a credential and all state attached to it.
    pub async fn remove(&self, handle: &str) {
        self.accounts.write().await.retain(|c| c.handle != handle);
        self.queue_locks
            .write()
            .await
            .retain(|(h, _), _| h != handle);
        self.disabled.write().await.remove(handle);
        info!(credential = handle, "account removed from pool");
    }

    /// Reason recorded when `handle` was disabled.
    pub async fn disabled_reason(&self, handle: &str) -> Option<String> {
        self.disabled.read().await.get(handle).cloned()
    }

    /// Time left on the lock of `queue` for `handle`, if locked.
    pub async fn queue_lock_remaining(&self, handle: &str, queue: &str) -> Option<Duration> {
        let locks = self.queue_locks.read().await;
        let until = locks.get(&(handle.to_string(), queue.to_string()))?;
        let now = Instant::now();
        (*until > now).then(|| *until - now)
    }

    /// Current route of `handle`.
    pub async fn route_of(&self, handle: &str) -> Option<String> {
        self.accounts
            .read()
            .await
            .iter()
            .find(|c| c.handle == handle)
            .and_then(|c| c.route.clone())
    }

    /// Pool health summary.
    ///
    /// Status mapping: all accounts usable → healthy, some → degraded,
    /// none → unhealthy. Queue-locked accounts still count as usable since
    /// the lock only covers one bucket.
    pub async fn health(&self) -> serde_json::Value {
        let accounts = self.accounts.read().await;
        let disabled = self.disabled.read().await;
        let locks = self.queue_locks.read().await;
        let now = Instant::now();

        let mut entries = Vec::new();
        let mut usable = 0usize;
        let mut disabled_count = 0usize;

        for credential in accounts.iter() {
            let mut locked: Vec<serde_json::Value> = locks
                .iter()
                .filter(|((h, _), until)| *h == credential.handle && **until > now)
                .map(|((_, queue), until)| {
                    serde_json::json!({
                        "queue": queue,
                        "remaining_secs": (*until - now).as_secs()
                    })
                })
                .collect();
            locked.sort_by(|a, b| a["queue"].as_str().cmp(&b["queue"].as_str()));

            let (status, reason) = match disabled.get(&credential.handle) {
                Some(reason) => {
                    disabled_count += 1;
                    ("disabled", Some(reason.clone()))
                }
                None if !credential.active => {
                    disabled_count += 1;
                    ("inactive", None)
                }
                None => {
                    usable += 1;
                    ("available", None)
                }
            };

            entries.push(serde_json::json!({
                "handle": credential.handle,
                "role": credential.role,
                "status": status,
                "reason": reason,
                "locked_queues": locked,
            }));
        }

        let total = accounts.len();
        let pool_status = if usable == total && total > 0 {
            "healthy"
        } else if usable > 0 {
            "degraded"
        } else {
            "unhealthy"
        };

        serde_json::json!({
            "status": pool_status,
            "accounts_total": total,
            "accounts_available": usable,
            "accounts_disabled": disabled_count,
            "accounts": entries
        })
    }

    /// Whether `queue` is locked for `handle`, clearing the lock if expired.
    async fn is_queue_locked(&self, handle: &str, queue: &str) -> bool {
        let key = (handle.to_string(), queue.to_string());
        let mut locks = self.queue_locks.write().await;
        let expired = match locks.get(&key) {
            Some(until) => Instant::now() >= *until,
            None => return false,
        };
        if expired {
            debug!(credential = handle, queue, "queue lock expired");
            locks.remove(&key);
        }
        !expired
    }

    /// Credential view with the availability flag reflecting disablement.
    async fn view(&self, credential: &Credential) -> Credential {
        let mut view = credential.clone();
        if self.disabled.read().await.contains_key(&credential.handle) {
            view.active = false;
        }
        view
    }

    async fn ensure_known(&self, handle: &str) -> Result<()> {
        if self.accounts.read().await.iter().any(|c| c.handle == handle) {
            Ok(())
        } else {
            Err(Error::NotFound(handle.to_string()))
        }
    }
}

impl CredentialPool for MemoryPool {
    fn get<'a>(
        &'a self,
        handle: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Credential>>> + Send + 'a>>
    {
        Box::pin(async move {
            let found = self
                .accounts
                .read()
                .await
                .iter()
                .find(|c| c.handle == handle)
                .cloned();
            match found {
                Some(credential) => Ok(Some(self.view(&credential).await)),
                None => Ok(None),
            }
        })
    }

    fn get_for_queue<'a>(
        &'a self,
        queue: &'a str,
        role: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Credential>>> + Send + 'a>>
    {
        Box::pin(async move {
            let accounts = self.accounts.read().await;
            let n = accounts.len();
            if n == 0 {
                return Ok(None);
            }

            let start = self.next_index.fetch_add(1, Ordering::Relaxed) % n;

            for offset in 0..n {
                let credential = &accounts[(start + offset) % n];
                if credential.role != role || !credential.active {
                    continue;
                }
                if self.disabled.read().await.contains_key(&credential.handle) {
                    continue;
                }
                if self.is_queue_locked(&credential.handle, queue).await {
                    continue;
                }
                debug!(credential = %credential.handle, queue, "leased credential");
                return Ok(Some(credential.clone()));
            }

            debug!(queue, role, "no credential available");
            Ok(None)
        })
    }

    fn get_all(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Credential>>> + Send + '_>>
    {
        Box::pin(async move {
            let accounts = self.accounts.read().await.clone();
            let mut views = Vec::with_capacity(accounts.len());
            for credential in &accounts {
                views.push(self.view(credential).await);
            }
            Ok(views)
        })
    }

    fn lock_queue<'a>(
        &'a self,
        handle: &'a str,
        queue: &'a str,
        minutes: u64,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            self.ensure_known(handle).await?;
            let until = Instant::now() + Duration::from_secs(minutes * 60);
            self.queue_locks
                .write()
                .await
                .insert((handle.to_string(), queue.to_string()), until);
            info!(credential = handle, queue, minutes, "queue locked");
            Ok(())
        })
    }

    fn disable_permanently<'a>(
        &'a self,
        handle: &'a str,
        reason: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            self.ensure_known(handle).await?;
            self.disabled
                .write()
                .await
                .insert(handle.to_string(), reason.to_string());
            warn!(credential = handle, reason, "account disabled");
            Ok(())
        })
    }

    fn report_route_failure<'a>(
        &'a self,
        handle: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<RouteOutcome>> + Send + 'a>>
    {
        Box::pin(async move {
            let mut accounts = self.accounts.write().await;
            let credential = accounts
                .iter_mut()
                .find(|c| c.handle == handle)
                .ok_or_else(|| Error::NotFound(handle.to_string()))?;

            let Some(current) = credential.route.clone() else {
                debug!(credential = handle, "direct credential, no route to rotate");
                return Ok(RouteOutcome::NoAction);
            };

            let mut spares = self.spare_routes.write().await;
            match spares.iter().position(|r| *r != current) {
                Some(idx) => {
                    let next = spares.remove(idx);
                    credential.route = Some(next);
                    info!(credential = handle, "route rotated");
                    Ok(RouteOutcome::Rotated)
                }
                None => {
                    warn!(credential = handle, "route failed and no spare route left");
                    Ok(RouteOutcome::RotationFailed)
                }
            }
        })
    }
}
