//! Credential pool interface for account-bound actions
//!
//! The dispatcher never owns credentials. It borrows one per action from a
//! `CredentialPool` and reports failures back as pool mutations:
//!
//! 1. Lease by queue: `get_for_queue` returns an available credential whose
//!    role matches and whose queue bucket is not locked
//! 2. Explicit lease: `get` returns a credential by handle
//! 3. Rate limit or permission fault → `lock_queue` for a number of minutes
//! 4. Suspended account or rejected auth → `disable_permanently`
//! 5. Network failure → `report_route_failure`, which may rotate the route
//!
//! `MemoryPool` is an in-process implementation for embedding and tests.

pub mod credential;
pub mod error;
pub mod memory;
pub mod pool;

pub use credential::{Credential, DEFAULT_ROLE, load_accounts};
pub use error::{Error, Result};
pub use memory::MemoryPool;
pub use pool::{CredentialPool, RouteOutcome};
