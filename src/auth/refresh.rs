//! Single-flight token refresh gate.
//!
//! # State machine
//! ```text
//! Idle ──401──▶ Refreshing (leader issues the one refresh call)
//!                 │  further 401s park on the waiter queue (FIFO)
//!                 │
//!                 ├─ success ─▶ waiters resolved in enqueue order ─▶ Idle
//!                 └─ failure ─▶ waiters rejected in enqueue order ─▶ Idle
//! ```
//!
//! The gate only coordinates; issuing the refresh call and tearing down the
//! session on failure belong to the caller holding the leader ticket.

use tokio::sync::{oneshot, Mutex};

use crate::error::{ApiError, ApiResult};

enum GateState {
    Idle,
    Refreshing {
        waiters: Vec<oneshot::Sender<ApiResult<String>>>,
    },
}

/// Outcome of entering the gate.
pub enum Ticket {
    /// This caller drives the refresh and must call `settle`.
    Leader,

    /// A refresh is already in flight; await the shared outcome.
    Follower(oneshot::Receiver<ApiResult<String>>),
}

/// Coordinator guaranteeing at most one refresh call in flight.
pub struct RefreshGate {
    state: Mutex<GateState>,
}

impl RefreshGate {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(GateState::Idle),
        }
    }

    /// Join the refresh window.
    ///
    /// The first caller while idle becomes the leader; everyone else gets a
    /// receiver resolved when the leader settles.
    pub async fn enter(&self) -> Ticket {
        let mut state = self.state.lock().await;
        match &mut *state {
            GateState::Idle => {
                *state = GateState::Refreshing {
                    waiters: Vec::new(),
                };
                Ticket::Leader
            }
            GateState::Refreshing { waiters } => {
                let (tx, rx) = oneshot::channel();
                waiters.push(tx);
                Ticket::Follower(rx)
            }
        }
    }

    /// Publish the refresh outcome to every queued waiter, in enqueue
    /// order, and return to idle. Leader-only.
    pub async fn settle(&self, outcome: ApiResult<String>) {
        let waiters = {
            let mut state = self.state.lock().await;
            match std::mem::replace(&mut *state, GateState::Idle) {
                GateState::Refreshing { waiters } => waiters,
                GateState::Idle => Vec::new(),
            }
        };

        tracing::debug!(
            waiters = waiters.len(),
            ok = outcome.is_ok(),
            "refresh settled"
        );
        for waiter in waiters {
            // A waiter that gave up (dropped its receiver) is skipped.
            let _ = waiter.send(outcome.clone());
        }
    }
}

impl Default for RefreshGate {
    fn default() -> Self {
        Self::new()
    }
}
