//! Hide operation state with cancellation by generation.
//!
//! Every hide operation holds a [`Ticket`]. Undo moves the current operation
//! to `Cancelled`; starting a new one supersedes the old ticket. A stale or
//! cancelled ticket can no longer advance, so its results are dropped.

use hush_core::HideState;
use parking_lot::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

#[derive(Debug, Default)]
struct Inner {
    state: HideState,
    generation: u64,
}

#[derive(Debug, Default)]
pub struct OperationTracker {
    inner: Mutex<Inner>,
}

impl OperationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> HideState {
        self.inner.lock().state
    }

    /// Start a new operation, cancelling any in flight.
    pub fn begin(&self) -> Ticket {
        let mut inner = self.inner.lock();
        if inner.state.is_active() {
            tracing::info!(state = %inner.state, "superseding running hide operation");
            inner.state = HideState::Cancelled;
        }
        inner.generation += 1;
        inner.state = HideState::Collecting;
        Ticket(inner.generation)
    }

    /// Move `ticket`'s operation to `next`. False when the ticket is stale or
    /// cancelled, or the transition is not allowed.
    pub fn advance(&self, ticket: Ticket, next: HideState) -> bool {
        let mut inner = self.inner.lock();
        if inner.generation != ticket.0 || inner.state == HideState::Cancelled {
            return false;
        }
        if !inner.state.can_transition_to(next) {
            tracing::warn!(from = %inner.state, to = %next, "rejected hide state transition");
            return false;
        }
        inner.state = next;
        true
    }

    pub fn is_cancelled(&self, ticket: Ticket) -> bool {
        let inner = self.inner.lock();
        inner.generation != ticket.0 || inner.state == HideState::Cancelled
    }

    /// Cancel the running operation. False if nothing was running.
    pub fn cancel(&self) -> bool {
        let mut inner = self.inner.lock();
        if !inner.state.is_active() {
            return false;
        }
        inner.state = HideState::Cancelled;
        true
    }

    /// Return to `Idle` if `ticket` is still the current operation.
    pub fn finish(&self, ticket: Ticket) -> bool {
        let mut inner = self.inner.lock();
        if inner.generation != ticket.0 {
            return false;
        }
        inner.state = HideState::Idle;
        true
    }
}
