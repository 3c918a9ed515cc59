//! Classified remote failures
//!
//! A `Fault` is the only failure shape a `RemoteClient` reports. Recovery
//! dispatches on `kind`, so clients must pick the kind at the point where
//! they still see the raw response.

use std::fmt;

/// Stable discriminant of a remote failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    /// Rate limit hit for the action's bucket
    RateLimited,
    /// Remote account suspended or locked
    AccountDisabled,
    /// Auth material rejected
    AuthInvalid,
    /// Account may not perform this kind of action
    PermissionDenied,
    /// Network or connect failure on the credential's route
    TransportError,
    /// Anything else
    Unclassified,
}

impl FaultKind {
    /// Label for logging and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            FaultKind::RateLimited => "rate_limited",
            FaultKind::AccountDisabled => "account_disabled",
            FaultKind::AuthInvalid => "auth_invalid",
            FaultKind::PermissionDenied => "permission_denied",
            FaultKind::TransportError => "transport_error",
            FaultKind::Unclassified => "unclassified",
        }
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A classified remote failure.
///
/// `rate_limit_reset` is the remote-provided reset time as unix seconds, when
/// the response carried one. `cause` links a wrapping fault (for example the
/// one raised after every quote-reference format was rejected) to the
/// underlying fault.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct Fault {
    pub kind: FaultKind,
    pub message: String,
    pub status: Option<u16>,
    pub rate_limit_reset: Option<u64>,
    #[source]
    pub cause: Option<Box<Fault>>,
}

impl Fault {
    pub fn new(kind: FaultKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            rate_limit_reset: None,
            cause: None,
        }
    }

    /// Wrap `cause`, keeping its kind, status and reset hint so recovery
    /// still reacts to what actually went wrong.
    pub fn wrap(message: impl Into<String>, cause: Fault) -> Self {
        Self {
            kind: cause.kind,
            message: message.into(),
            status: cause.status,
            rate_limit_reset: cause.rate_limit_reset,
            cause: Some(Box::new(cause)),
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_rate_limit_reset(mut self, reset_unix_secs: u64) -> Self {
        self.rate_limit_reset = Some(reset_unix_secs);
        self
    }

    /// Message plus status and root cause, for log lines.
    pub fn details(&self) -> String {
        let mut out = if self.message.is_empty() {
            "no details".to_string()
        } else {
            self.message.clone()
        };
        if let Some(status) = self.status {
            out.push_str(&format!(" (HTTP {status})"));
        }
        if let Some(cause) = &self.cause {
            out.push_str(&format!(" caused by: {}", cause.details()));
        }
        out
    }
}
