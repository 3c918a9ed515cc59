//! Per-action protocol session
//!
//! A session binds one credential's auth tokens and network route to the
//! protocol client for the duration of a single action. It is never shared
//! between actions, so the auth material always matches the credential that
//! was leased for the call.

use std::collections::BTreeMap;

use common::Secret;
use reqwest::header::{ACCEPT_LANGUAGE, COOKIE, HeaderMap, HeaderValue};
use tracing::debug;

/// Named auth tokens (cookie name to value).
pub type AuthTokens = BTreeMap<String, Secret<String>>;

/// Errors building an HTTP client from a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("invalid route {route}: {reason}")]
    InvalidRoute { route: String, reason: String },

    #[error("invalid header value for {0}")]
    InvalidHeader(&'static str),

    #[error("HTTP client build failed: {0}")]
    Build(#[from] reqwest::Error),
}

/// Short-lived binding of auth material and route to the protocol client.
#[derive(Debug)]
pub struct Session {
    locale: String,
    route: Option<String>,
    auth: AuthTokens,
}

impl Session {
    /// Unauthenticated session. `route` of `None` means a direct connection.
    pub fn new(locale: &str, route: Option<&str>) -> Self {
        Self {
            locale: locale.to_string(),
            route: route.map(str::to_string),
            auth: AuthTokens::new(),
        }
    }

    /// Install every token into the session's credential store, replacing
    /// tokens with the same name.
    pub fn install_auth(&mut self, tokens: &AuthTokens) {
        for (name, value) in tokens {
            self.auth.insert(name.clone(), value.clone());
        }
        debug!(tokens = tokens.len(), "installed auth tokens");
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn route(&self) -> Option<&str> {
        self.route.as_deref()
    }

    /// Names of the installed tokens, in sorted order.
    pub fn token_names(&self) -> Vec<&str> {
        self.auth.keys().map(String::as_str).collect()
    }

    /// Look up one installed token.
    pub fn token(&self, name: &str) -> Option<&str> {
        self.auth.get(name).map(|v| v.expose().as_str())
    }

    pub fn is_authenticated(&self) -> bool {
        !self.auth.is_empty()
    }

    /// Installed tokens rendered as a `Cookie` header value.
    pub fn cookie_header(&self) -> Option<Secret<String>> {
        if self.auth.is_empty() {
            return None;
        }
        let joined = self
            .auth
            .iter()
            .map(|(name, value)| format!("{name}={}", value.expose()))
            .collect::<Vec<_>>()
            .join("; ");
        Some(Secret::new(joined))
    }

    /// Build an HTTP client that sends through this session's route with the
    /// auth cookies and locale preset. No request is made.
    pub fn http_client(&self) -> Result<reqwest::Client, SessionError> {
        let mut headers = HeaderMap::new();

        if let Some(cookie) = self.cookie_header() {
            let mut value = HeaderValue::from_str(cookie.expose())
                .map_err(|_| SessionError::InvalidHeader("cookie"))?;
            value.set_sensitive(true);
            headers.insert(COOKIE, value);
        }

        let language = HeaderValue::from_str(&self.locale)
            .map_err(|_| SessionError::InvalidHeader("accept-language"))?;
        headers.insert(ACCEPT_LANGUAGE, language);

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(route) = &self.route {
            let proxy = reqwest::Proxy::all(route.as_str()).map_err(|e| {
                SessionError::InvalidRoute {
                    route: route.clone(),
                    reason: e.to_string(),
                }
            })?;
            builder = builder.proxy(proxy);
        }
        Ok(builder.build()?)
    }
}
