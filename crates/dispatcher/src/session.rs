//! Session factory
//!
//! Builds the per-action session from a leased credential. No remote call is
//! made here; a credential without auth material is rejected before the
//! client ever sees it.

use account_pool::Credential;
use protocol::{RemoteClient, Session};
use tracing::debug;

use crate::error::{Error, Result};

pub struct SessionFactory {
    locale: String,
}

impl SessionFactory {
    pub fn new(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
        }
    }

    /// Construct a session on the credential's route and install its tokens.
    pub fn create(&self, client: &dyn RemoteClient, credential: &Credential) -> Result<Session> {
        if !credential.has_auth_material() {
            return Err(Error::Config(format!(
                "credential {} has no auth material",
                credential.handle
            )));
        }

        let mut session = client.construct(&self.locale, credential.route.as_deref());
        client.install_auth(&mut session, &credential.tokens);

        debug!(
            credential = %credential.handle,
            route = credential.route.as_deref().unwrap_or("direct"),
            tokens = credential.tokens.len(),
            "session created"
        );
        Ok(session)
    }
}
