//! Graceful-shutdown barrier.
//!
//! Services that accept work register in-flight operations against the
//! barrier. When the orchestrator asks for a graceful stop, the barrier is
//! flipped into suspend mode: new operations are refused, and
//! [`SuspendBarrier::await_suspend`] blocks the shutdown path until the
//! in-flight count drains to zero. If suspension was never requested the
//! await returns immediately - the process is being torn down hard and there
//! is nothing to wait for.

use std::sync::{Arc, Condvar, Mutex};

#[derive(Debug, Default)]
struct BarrierState {
    suspending: bool,
    in_flight: usize,
}

/// Blocking drain point between the control thread and in-flight work.
#[derive(Debug, Default)]
pub struct SuspendBarrier {
    state: Mutex<BarrierState>,
    drained: Condvar,
}

impl SuspendBarrier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter suspend mode: refuse new operations, let existing ones drain.
    pub fn request_suspend(&self) {
        let mut state = self.state.lock().unwrap();
        state.suspending = true;
        if state.in_flight == 0 {
            self.drained.notify_all();
        }
    }

    pub fn is_suspending(&self) -> bool {
        self.state.lock().unwrap().suspending
    }

    /// Current number of in-flight operations.
    pub fn in_flight(&self) -> usize {
        self.state.lock().unwrap().in_flight
    }

    /// Begin an operation, or `None` if the barrier is suspending.
    pub fn begin_operation(self: &Arc<Self>) -> Option<OperationGuard> {
        let mut state = self.state.lock().unwrap();
        if state.suspending {
            return None;
        }
        state.in_flight += 1;
        Some(OperationGuard {
            barrier: Arc::clone(self),
        })
    }

    /// Block until in-flight work has drained.
    ///
    /// Returns immediately when suspension was never requested.
    pub fn await_suspend(&self) {
        let mut state = self.state.lock().unwrap();
        if !state.suspending {
            return;
        }
        while state.in_flight > 0 {
            state = self.drained.wait(state).unwrap();
        }
    }
}

/// Live token for one in-flight operation. Dropping it releases the barrier.
pub struct OperationGuard {
    barrier: Arc<SuspendBarrier>,
}

impl Drop for OperationGuard {
    fn drop(&mut self) {
        let mut state = self.barrier.state.lock().unwrap();
        state.in_flight -= 1;
        if state.in_flight == 0 && state.suspending {
            self.barrier.drained.notify_all();
        }
    }
}
