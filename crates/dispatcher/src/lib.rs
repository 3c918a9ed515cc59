//! Account-aware action dispatcher
//!
//! Performs write actions (post, requote, reply, follow, profile update)
//! through a short-lived session bound to one credential from a pool, and
//! feeds failures back into the pool before returning them:
//!
//! 1. Resolve the action's rate-limit queue (`queue::resolve`)
//! 2. Lease a credential for that queue, or look up the caller's explicit one
//! 3. Build a session from the credential's tokens and route (`session`)
//! 4. Execute the action (`executor`), probing quote-reference formats for
//!    quoted requotes (`probe`)
//! 5. On a fault: lock the queue, disable the credential or report its route
//!    (`recovery`), then return the same fault to the caller
//!
//! The pool and the remote client are injected into `Dispatcher::new`; this
//! crate holds no state between actions.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod executor;
pub mod metrics;
pub mod probe;
pub mod queue;
pub mod recovery;
pub mod request;
pub mod session;
pub mod state;

#[cfg(test)]
mod testing;

pub use config::{DispatcherConfig, RequotePolicy};
pub use dispatcher::Dispatcher;
pub use error::{Error, Result};
pub use queue::{ActionKind, resolve};
pub use recovery::Recovery;
pub use request::{Action, ActionRequest};
