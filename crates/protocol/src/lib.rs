//! Remote protocol abstraction for account-bound write actions
//!
//! Defines the `RemoteClient` trait that decouples the dispatcher from the
//! wire protocol. The dispatcher owns session construction and failure
//! handling; the client only has to perform each remote operation against a
//! `Session` and report failures as a classified `Fault`.
//!
//! Implementors talking HTTP can use the helpers in [`classify`] to turn
//! status codes, rate-limit headers and transport errors into faults.

pub mod classify;
pub mod fault;
pub mod resource;
pub mod session;

pub use classify::{classify_status, fault_from_response, fault_from_transport};
pub use fault::{Fault, FaultKind};
pub use resource::{Post, PostDraft, ProfileUpdate, RequoteAck, Resource, User};
pub use session::{AuthTokens, Session, SessionError};

use std::future::Future;
use std::pin::Pin;

/// Result alias for remote operations.
pub type Result<T> = std::result::Result<T, Fault>;

/// Abstraction over the remote protocol client.
///
/// `construct` and `install_auth` build the per-action session; they never
/// touch the network. The remaining operations each perform one remote call
/// and either return a resource descriptor or a `Fault`.
///
/// Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility (`Arc<dyn RemoteClient>`).
pub trait RemoteClient: Send + Sync {
    /// Build an unauthenticated session for the given locale and network route.
    /// `None` means a direct connection.
    fn construct(&self, locale: &str, route: Option<&str>) -> Session {
        Session::new(locale, route)
    }

    /// Install every named auth token into the session's credential store.
    fn install_auth(&self, session: &mut Session, tokens: &AuthTokens) {
        session.install_auth(tokens);
    }

    /// Publish a post. `draft` carries the optional media, reference URL and
    /// reply target.
    fn create_post<'a>(
        &'a self,
        session: &'a Session,
        draft: &'a PostDraft,
    ) -> Pin<Box<dyn Future<Output = Result<Post>> + Send + 'a>>;

    /// Bare re-share of an existing post.
    fn requote<'a>(
        &'a self,
        session: &'a Session,
        target_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<RequoteAck>> + Send + 'a>>;

    /// Fetch a post by id. Only used to enrich requote results.
    ///
    /// Clients that cannot fetch posts keep the default, which reports an
    /// unclassified fault without calling the remote service.
    fn fetch_post<'a>(
        &'a self,
        _session: &'a Session,
        post_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Post>> + Send + 'a>> {
        let message = format!("fetching post {post_id} is not supported by this client");
        Box::pin(async move { Err(Fault::new(FaultKind::Unclassified, message)) })
    }

    /// Follow a user by id.
    fn follow<'a>(
        &'a self,
        session: &'a Session,
        user_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<User>> + Send + 'a>>;

    /// Update profile fields. Only fields set on `update` are sent.
    fn update_profile<'a>(
        &'a self,
        session: &'a Session,
        update: &'a ProfileUpdate,
    ) -> Pin<Box<dyn Future<Output = Result<User>> + Send + 'a>>;
}
