use protocol::Fault;

/// Dispatcher errors
///
/// Only `Fault` is the remote service's answer; the others are raised before
/// any remote call and never trigger a recovery mutation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown credential: {0}")]
    UnknownCredential(String),

    #[error("No credential available for queue {queue} (role {role})")]
    NoCredential { queue: String, role: String },

    #[error("Credential pool error: {0}")]
    Pool(#[from] account_pool::Error),

    #[error(transparent)]
    Fault(#[from] Fault),
}

impl Error {
    /// The remote fault, if this error is one.
    pub fn fault(&self) -> Option<&Fault> {
        match self {
            Error::Fault(fault) => Some(fault),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::FaultKind;

    #[test]
    fn fault_passes_through_transparently() {
        let fault = Fault::new(FaultKind::RateLimited, "slow down");
        let err: Error = fault.clone().into();
        assert_eq!(err.to_string(), fault.to_string());
        assert_eq!(err.fault(), Some(&fault));
    }

    #[test]
    fn non_fault_errors_have_no_fault() {
        let err = Error::NoCredential {
            queue: "CreateTweet".into(),
            role: "default".into(),
        };
        assert!(err.fault().is_none());
        assert!(err.to_string().contains("CreateTweet"));
    }

    #[test]
    fn pool_errors_convert() {
        let err: Error = account_pool::Error::NotFound("ghost".into()).into();
        assert!(matches!(err, Error::Pool(_)));
    }
}
