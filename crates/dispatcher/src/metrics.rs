//! Dispatch metrics
//!
//! Recorded through the `metrics` facade; the embedding application installs
//! whatever recorder it exports with. Without one these calls are no-ops.
//!
//! - `dispatch_actions_total` (counter): labels `kind`, `outcome`
//!   (`success`, `degraded`, `fault`, `rejected`)
//! - `dispatch_faults_total` (counter): label `kind`
//! - `dispatch_recoveries_total` (counter): labels `mutation`, `result`
//! - `dispatch_probe_attempts_total` (counter): label `result`

pub const ACTIONS_TOTAL: &str = "dispatch_actions_total";
pub const FAULTS_TOTAL: &str = "dispatch_faults_total";
pub const RECOVERIES_TOTAL: &str = "dispatch_recoveries_total";
pub const PROBE_ATTEMPTS_TOTAL: &str = "dispatch_probe_attempts_total";

/// Record a finished action.
pub fn record_action(kind: &'static str, outcome: &'static str) {
    metrics::counter!(ACTIONS_TOTAL, "kind" => kind, "outcome" => outcome).increment(1);
}

/// Record a classified remote fault.
pub fn record_fault(kind: &'static str) {
    metrics::counter!(FAULTS_TOTAL, "kind" => kind).increment(1);
}

/// Record a recovery mutation and how it went.
pub fn record_recovery(mutation: &'static str, result: &'static str) {
    metrics::counter!(RECOVERIES_TOTAL, "mutation" => mutation, "result" => result).increment(1);
}

/// Record one quote-reference probe attempt.
pub fn record_probe_attempt(accepted: bool) {
    let result = if accepted { "accepted" } else { "rejected" };
    metrics::counter!(PROBE_ATTEMPTS_TOTAL, "result" => result).increment(1);
}
