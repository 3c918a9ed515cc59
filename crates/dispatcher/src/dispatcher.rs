//! Public dispatch API
//!
//! `Dispatcher` wires the pieces together for each action: resolve the
//! queue, bind a credential and session, execute, and on a fault run
//! recovery before handing the same fault back. It keeps no per-action
//! state, so one instance can serve any number of concurrent actions.

use std::collections::BTreeMap;
use std::sync::Arc;

use account_pool::{Credential, CredentialPool};
use protocol::{Fault, Post, ProfileUpdate, RemoteClient, Resource, Session, User};
use tracing::{Instrument, Span, debug, info, info_span, warn};
use uuid::Uuid;

use crate::config::DispatcherConfig;
use crate::error::{Error, Result};
use crate::executor::Executor;
use crate::metrics;
use crate::probe::ReferenceProber;
use crate::queue::{ActionKind, resolve};
use crate::recovery::RecoveryController;
use crate::request::{Action, ActionRequest};
use crate::session::SessionFactory;
use crate::state::{DispatchEvent, Lifecycle};

pub struct Dispatcher {
    pool: Arc<dyn CredentialPool>,
    client: Arc<dyn RemoteClient>,
    config: DispatcherConfig,
    sessions: SessionFactory,
    prober: ReferenceProber,
    recovery: RecoveryController,
}

/// A credential and its session, ready for one remote call.
struct Bound {
    kind: ActionKind,
    queue: &'static str,
    credential: Credential,
    session: Session,
    lifecycle: Lifecycle,
}

/// Resources that can be locally synthesized.
trait Described {
    fn is_degraded(&self) -> bool;
}

impl Described for Post {
    fn is_degraded(&self) -> bool {
        self.degraded
    }
}

impl Described for User {
    fn is_degraded(&self) -> bool {
        false
    }
}

fn dispatch_span(kind: ActionKind) -> Span {
    info_span!(
        "dispatch",
        action_id = %Uuid::new_v4(),
        kind = kind.label(),
        credential = tracing::field::Empty
    )
}

impl Dispatcher {
    /// Build a dispatcher over the given pool and client.
    ///
    /// Fails with `Error::Config` if `config` does not validate.
    pub fn new(
        pool: Arc<dyn CredentialPool>,
        client: Arc<dyn RemoteClient>,
        config: DispatcherConfig,
    ) -> Result<Self> {
        config
            .validate()
            .map_err(|e| Error::Config(e.to_string()))?;

        Ok(Self {
            sessions: SessionFactory::new(config.dispatch.locale.clone()),
            prober: ReferenceProber::new(config.probe.reference_templates.clone()),
            recovery: RecoveryController::new(pool.clone(), config.recovery),
            pool,
            client,
            config,
        })
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Publish a post.
    pub async fn create_post(
        &self,
        text: &str,
        media_ids: &[String],
        credential: Option<&str>,
    ) -> Result<Post> {
        let kind = ActionKind::CreatePost;
        async {
            let bound = self.bind(kind, credential).await?;
            let outcome = self.executor(&bound.session).create_post(text, media_ids).await;
            self.settle(bound, outcome).await
        }
        .instrument(dispatch_span(kind))
        .await
    }

    /// Requote `target_id`, quoted when `commentary` has non-blank text.
    pub async fn requote(
        &self,
        target_id: &str,
        commentary: Option<&str>,
        media_ids: &[String],
        credential: Option<&str>,
    ) -> Result<Post> {
        let kind = ActionKind::requote(commentary);
        async {
            let bound = self.bind(kind, credential).await?;
            let outcome = self
                .executor(&bound.session)
                .requote(target_id, commentary, media_ids)
                .await;
            self.settle(bound, outcome).await
        }
        .instrument(dispatch_span(kind))
        .await
    }

    /// Reply to `target_id`.
    pub async fn reply(
        &self,
        target_id: &str,
        text: &str,
        media_ids: &[String],
        credential: Option<&str>,
    ) -> Result<Post> {
        let kind = ActionKind::Reply;
        async {
            let bound = self.bind(kind, credential).await?;
            let outcome = self
                .executor(&bound.session)
                .reply(target_id, text, media_ids)
                .await;
            self.settle(bound, outcome).await
        }
        .instrument(dispatch_span(kind))
        .await
    }

    /// Follow `user_id`.
    pub async fn follow(&self, user_id: &str, credential: Option<&str>) -> Result<User> {
        let kind = ActionKind::Follow;
        async {
            let bound = self.bind(kind, credential).await?;
            let outcome = self.executor(&bound.session).follow(user_id).await;
            self.settle(bound, outcome).await
        }
        .instrument(dispatch_span(kind))
        .await
    }

    /// Update the supplied profile fields.
    pub async fn update_profile(
        &self,
        update: &ProfileUpdate,
        credential: Option<&str>,
    ) -> Result<User> {
        let kind = ActionKind::UpdateProfile;
        async {
            let bound = self.bind(kind, credential).await?;
            let outcome = self.executor(&bound.session).update_profile(update).await;
            self.settle(bound, outcome).await
        }
        .instrument(dispatch_span(kind))
        .await
    }

    /// Perform any action described as data.
    pub async fn dispatch(&self, request: &ActionRequest) -> Result<Resource> {
        let credential = request.credential.as_deref();
        match &request.action {
            Action::CreatePost { text, media_ids } => self
                .create_post(text, media_ids, credential)
                .await
                .map(Resource::Post),
            Action::Requote {
                target_id,
                commentary,
                media_ids,
            } => self
                .requote(target_id, commentary.as_deref(), media_ids, credential)
                .await
                .map(Resource::Post),
            Action::Reply {
                target_id,
                text,
                media_ids,
            } => self
                .reply(target_id, text, media_ids, credential)
                .await
                .map(Resource::Post),
            Action::Follow { user_id } => self
                .follow(user_id, credential)
                .await
                .map(Resource::User),
            Action::UpdateProfile { fields } => self
                .update_profile(fields, credential)
                .await
                .map(Resource::User),
        }
    }

    /// Credential counts across the pool, as JSON.
    pub async fn pool_summary(&self) -> Result<serde_json::Value> {
        let credentials = self.pool.get_all().await?;
        let total = credentials.len();
        let available = credentials.iter().filter(|c| c.active).count();

        let mut roles: BTreeMap<&str, usize> = BTreeMap::new();
        for credential in &credentials {
            *roles.entry(credential.role.as_str()).or_default() += 1;
        }

        Ok(serde_json::json!({
            "accounts_total": total,
            "accounts_available": available,
            "accounts_unavailable": total - available,
            "roles": roles,
        }))
    }

    fn executor<'a>(&'a self, session: &'a Session) -> Executor<'a> {
        Executor::new(
            self.client.as_ref(),
            session,
            &self.prober,
            self.config.dispatch.requote_policy,
        )
    }

    /// Lease a credential for `kind` and build its session.
    async fn bind(&self, kind: ActionKind, credential: Option<&str>) -> Result<Bound> {
        let mut lifecycle = Lifecycle::new();
        lifecycle.step(DispatchEvent::Accepted);
        let queue = resolve(kind);

        let bound = match self.lease(queue, credential).await {
            Ok(credential) => self
                .sessions
                .create(self.client.as_ref(), &credential)
                .map(|session| (credential, session)),
            Err(e) => Err(e),
        };

        match bound {
            Ok((credential, session)) => {
                Span::current().record("credential", credential.handle.as_str());
                lifecycle.step(DispatchEvent::RemoteIssued);
                debug!(credential = %credential.handle, queue, "credential bound");
                Ok(Bound {
                    kind,
                    queue,
                    credential,
                    session,
                    lifecycle,
                })
            }
            Err(e) => {
                lifecycle.step(DispatchEvent::Rejected);
                metrics::record_action(kind.label(), "rejected");
                warn!(queue, error = %e, "action rejected before remote call");
                Err(e)
            }
        }
    }

    /// Explicit credential by handle, or a lease for `queue`.
    ///
    /// An explicit credential is used even when the pool marks it
    /// unavailable; the caller asked for it by name.
    async fn lease(&self, queue: &str, credential: Option<&str>) -> Result<Credential> {
        match credential {
            Some(handle) => {
                let credential = self
                    .pool
                    .get(handle)
                    .await?
                    .ok_or_else(|| Error::UnknownCredential(handle.to_string()))?;
                if !credential.active {
                    warn!(credential = handle, "explicit credential is unavailable, using it anyway");
                }
                Ok(credential)
            }
            None => {
                let role = &self.config.dispatch.role;
                self.pool
                    .get_for_queue(queue, role)
                    .await?
                    .ok_or_else(|| Error::NoCredential {
                        queue: queue.to_string(),
                        role: role.clone(),
                    })
            }
        }
    }

    /// Finish an action: report success, or recover and return the fault.
    async fn settle<T: Described>(
        &self,
        mut bound: Bound,
        outcome: std::result::Result<T, Fault>,
    ) -> Result<T> {
        match outcome {
            Ok(resource) => {
                bound.lifecycle.step(DispatchEvent::RemoteSucceeded);
                let result = if resource.is_degraded() {
                    "degraded"
                } else {
                    "success"
                };
                metrics::record_action(bound.kind.label(), result);
                info!(
                    credential = %bound.credential.handle,
                    queue = bound.queue,
                    outcome = result,
                    "action completed"
                );
                Ok(resource)
            }
            Err(fault) => {
                bound.lifecycle.step(DispatchEvent::RemoteFaulted);
                bound.lifecycle.step(DispatchEvent::Classified);
                let recovery = self
                    .recovery
                    .recover(&bound.credential.handle, bound.queue, &fault)
                    .await;
                bound.lifecycle.step(DispatchEvent::RecoveryAttempted);
                metrics::record_action(bound.kind.label(), "fault");
                debug!(recovery = recovery.label(), "returning fault to caller");
                Err(Error::Fault(fault))
            }
        }
    }
}
