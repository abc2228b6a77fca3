//! Single-flight coordination for session refresh.
//!
//! At most one refresh network call is in flight process-wide. The first
//! caller becomes the leader and drives the call; everyone who arrives
//! while it runs parks on a oneshot receiver and is woken with the new
//! token (or `None` on failure) when the leader finishes.

use std::sync::Mutex;

use tokio::sync::oneshot;

/// Outcome of asking to join a refresh.
pub(crate) enum RefreshTicket {
    /// No refresh was running; the caller must drive it and call `finish`.
    Leader,
    /// A refresh is already in flight; await the shared outcome.
    Waiter(oneshot::Receiver<Option<String>>),
}

#[derive(Default)]
struct CoordinatorState {
    in_flight: bool,
    waiters: Vec<oneshot::Sender<Option<String>>>,
}

/// Owner of the in-flight flag and the waiter queue.
///
/// The flag flips synchronously under the lock, before the leader's first
/// suspension point, so two callers can never both become leader.
#[derive(Default)]
pub(crate) struct RefreshCoordinator {
    state: Mutex<CoordinatorState>,
}

impl RefreshCoordinator {
    /// Join the current refresh, or become the leader of a new one.
    pub(crate) fn begin(&self) -> RefreshTicket {
        let mut state = self.state.lock().expect("refresh coordinator poisoned");
        if state.in_flight {
            let (tx, rx) = oneshot::channel();
            state.waiters.push(tx);
            RefreshTicket::Waiter(rx)
        } else {
            state.in_flight = true;
            RefreshTicket::Leader
        }
    }

    /// Non-queuing variant: claim leadership, or report that a refresh is
    /// already running. Reentrancy guard for `refresh_session`.
    pub(crate) fn try_begin(&self) -> bool {
        let mut state = self.state.lock().expect("refresh coordinator poisoned");
        if state.in_flight {
            false
        } else {
            state.in_flight = true;
            true
        }
    }

    /// Leader-only: clear the flag and wake every waiter in arrival order.
    pub(crate) fn finish(&self, token: Option<String>) {
        let waiters = {
            let mut state = self.state.lock().expect("refresh coordinator poisoned");
            state.in_flight = false;
            std::mem::take(&mut state.waiters)
        };
        for waiter in waiters {
            // A waiter that gave up (dropped its receiver) is fine to skip
            let _ = waiter.send(token.clone());
        }
    }

    pub(crate) fn is_refreshing(&self) -> bool {
        self.state
            .lock()
            .expect("refresh coordinator poisoned")
            .in_flight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_caller_leads_second_waits() {
        let coordinator = RefreshCoordinator::default();

        assert!(matches!(coordinator.begin(), RefreshTicket::Leader));
        assert!(coordinator.is_refreshing());
        assert!(matches!(coordinator.begin(), RefreshTicket::Waiter(_)));
        assert!(!coordinator.try_begin());
    }

    #[tokio::test]
    async fn test_finish_wakes_waiters_with_token() {
        let coordinator = RefreshCoordinator::default();

        assert!(coordinator.try_begin());
        let RefreshTicket::Waiter(rx_a) = coordinator.begin() else {
            panic!("expected waiter while refresh in flight");
        };
        let RefreshTicket::Waiter(rx_b) = coordinator.begin() else {
            panic!("expected waiter while refresh in flight");
        };

        coordinator.finish(Some("tok2".to_string()));

        assert_eq!(rx_a.await.unwrap().as_deref(), Some("tok2"));
        assert_eq!(rx_b.await.unwrap().as_deref(), Some("tok2"));
        assert!(!coordinator.is_refreshing());
    }

    #[tokio::test]
    async fn test_finish_failure_wakes_waiters_with_none() {
        let coordinator = RefreshCoordinator::default();

        assert!(coordinator.try_begin());
        let RefreshTicket::Waiter(rx) = coordinator.begin() else {
            panic!("expected waiter while refresh in flight");
        };

        coordinator.finish(None);
        assert!(rx.await.unwrap().is_none());

        // The flag clears, so the next caller leads a fresh attempt
        assert!(matches!(coordinator.begin(), RefreshTicket::Leader));
        coordinator.finish(None);
    }
}
