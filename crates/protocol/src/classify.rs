//! Fault classification for HTTP-based remote clients
//!
//! Maps status codes, response bodies and transport errors onto `FaultKind`.
//! A 403 is ambiguous on the remote service: it is used both for suspended or
//! locked accounts and for actions the account may not perform, so the body
//! decides between `AccountDisabled` and `PermissionDenied`.

use reqwest::header::HeaderMap;

use crate::fault::{Fault, FaultKind};

/// Header carrying the rate-limit window reset as unix seconds.
pub const RATE_LIMIT_RESET_HEADER: &str = "x-rate-limit-reset";

/// Body phrases that mark a 403 as an account-level block.
const ACCOUNT_BLOCK_PATTERNS: &[&str] = &[
    "account is suspended",
    "account has been suspended",
    "account is temporarily locked",
    "account has been locked",
    "\"code\":64",
    "\"code\":326",
];

/// Classify an error response by status and body.
///
/// 429 is a rate limit, 401 rejects the auth material, 403 is either an
/// account block or a permission denial depending on the body. Everything
/// else is unclassified.
pub fn classify_status(status: u16, body: &str) -> FaultKind {
    match status {
        429 => FaultKind::RateLimited,
        401 => FaultKind::AuthInvalid,
        403 => {
            let lower = body.to_lowercase();
            if ACCOUNT_BLOCK_PATTERNS.iter().any(|p| lower.contains(p)) {
                FaultKind::AccountDisabled
            } else {
                FaultKind::PermissionDenied
            }
        }
        _ => FaultKind::Unclassified,
    }
}

/// Build a fault from an error response, reading the rate-limit reset header.
pub fn fault_from_response(status: u16, headers: &HeaderMap, body: &str) -> Fault {
    let kind = classify_status(status, body);
    let mut fault = Fault::new(kind, body.trim()).with_status(status);
    if let Some(reset) = headers
        .get(RATE_LIMIT_RESET_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
    {
        fault = fault.with_rate_limit_reset(reset);
    }
    fault
}

/// Build a fault from a transport-level error.
///
/// Network failures point at the credential's route and become
/// `TransportError`: connect failures, timeouts, connections dropped
/// mid-request and failed body reads. Errors carrying a status are classified
/// by status. Builder, redirect and decode errors are not the route's fault.
pub fn fault_from_transport(err: &reqwest::Error) -> Fault {
    if let Some(status) = err.status() {
        let code = status.as_u16();
        return Fault::new(classify_status(code, ""), err.to_string()).with_status(code);
    }
    let kind = if err.is_connect() || err.is_timeout() || err.is_request() || err.is_body() {
        FaultKind::TransportError
    } else {
        FaultKind::Unclassified
    };
    Fault::new(kind, err.to_string())
}
