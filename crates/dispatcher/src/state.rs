//! Per-action lifecycle
//!
//! Every action walks the same path:
//!
//! ```text
//! Idle → Dispatching → AwaitingRemote → Propagating(Success)
//!                    │                → Classifying → Recovering → Propagating(Fault)
//!                    └→ Propagating(Rejected)
//! ```
//!
//! There is no edge back to `Dispatching`: a failed action is never retried.
//! Events that don't apply to the current state leave it unchanged.

use tracing::debug;

/// How an action ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    Success,
    /// The remote returned a fault; recovery ran
    Fault,
    /// Rejected before any remote call (no credential, no auth material)
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Idle,
    Dispatching,
    AwaitingRemote,
    Classifying,
    Recovering,
    Propagating(Settlement),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchEvent {
    /// Caller invoked an operation
    Accepted,
    /// Credential leased and session built; remote call issued
    RemoteIssued,
    /// Leasing or session construction failed
    Rejected,
    RemoteSucceeded,
    RemoteFaulted,
    /// Recovery mutation chosen
    Classified,
    /// Recovery finished, successfully or not
    RecoveryAttempted,
}

impl DispatchState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DispatchState::Propagating(_))
    }
}

/// Pure state transition.
pub fn transition(state: DispatchState, event: DispatchEvent) -> DispatchState {
    use DispatchEvent as E;
    use DispatchState as S;

    match (state, event) {
        (S::Idle, E::Accepted) => S::Dispatching,
        (S::Dispatching, E::RemoteIssued) => S::AwaitingRemote,
        (S::Dispatching, E::Rejected) => S::Propagating(Settlement::Rejected),
        (S::AwaitingRemote, E::RemoteSucceeded) => S::Propagating(Settlement::Success),
        (S::AwaitingRemote, E::RemoteFaulted) => S::Classifying,
        (S::Classifying, E::Classified) => S::Recovering,
        (S::Recovering, E::RecoveryAttempted) => S::Propagating(Settlement::Fault),
        (state, _) => state,
    }
}

/// Tracks one action's state and logs each step.
#[derive(Debug)]
pub struct Lifecycle {
    state: DispatchState,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            state: DispatchState::Idle,
        }
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    pub fn step(&mut self, event: DispatchEvent) -> DispatchState {
        let next = transition(self.state, event);
        if next != self.state {
            debug!(from = ?self.state, to = ?next, event = ?event, "dispatch state");
        }
        self.state = next;
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use DispatchEvent as E;
    use DispatchState as S;

    fn run(events: &[DispatchEvent]) -> DispatchState {
        events
            .iter()
            .fold(S::Idle, |state, event| transition(state, *event))
    }

    #[test]
    fn success_path() {
        assert_eq!(
            run(&[E::Accepted, E::RemoteIssued, E::RemoteSucceeded]),
            S::Propagating(Settlement::Success)
        );
    }

    #[test]
    fn fault_path_goes_through_recovery() {
        let mut lifecycle = Lifecycle::new();
        lifecycle.step(E::Accepted);
        lifecycle.step(E::RemoteIssued);
        assert_eq!(lifecycle.step(E::RemoteFaulted), S::Classifying);
        assert_eq!(lifecycle.step(E::Classified), S::Recovering);
        assert_eq!(
            lifecycle.step(E::RecoveryAttempted),
            S::Propagating(Settlement::Fault)
        );
        assert!(lifecycle.state().is_terminal());
    }

    #[test]
    fn rejection_skips_remote() {
        assert_eq!(
            run(&[E::Accepted, E::Rejected]),
            S::Propagating(Settlement::Rejected)
        );
    }

    #[test]
    fn fault_cannot_reach_success() {
        assert_eq!(
            run(&[E::Accepted, E::RemoteIssued, E::RemoteFaulted, E::RemoteSucceeded]),
            S::Classifying
        );
    }

    #[test]
    fn terminal_states_absorb_every_event() {
        let all = [
            E::Accepted,
            E::RemoteIssued,
            E::Rejected,
            E::RemoteSucceeded,
            E::RemoteFaulted,
            E::Classified,
            E::RecoveryAttempted,
        ];
        for settled in [Settlement::Success, Settlement::Fault, Settlement::Rejected] {
            for event in all {
                assert_eq!(
                    transition(S::Propagating(settled), event),
                    S::Propagating(settled),
                    "{event:?} must not leave {settled:?}"
                );
            }
        }
    }

    #[test]
    fn remote_cannot_be_issued_twice() {
        assert_eq!(
            run(&[E::Accepted, E::RemoteIssued, E::RemoteIssued]),
            S::AwaitingRemote
        );
    }
}
