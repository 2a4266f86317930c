//! Shutdown coordination.
//!
//! Runs after the reconnect loop ends, on either outcome. If the runtime
//! carries a graceful-shutdown barrier, in-flight work gets to drain before
//! the process dies; the loop outcome then decides the exit status.

use tracing::{debug, error, info, warn};

use warden_runtime::{LookupError, StartupHandle, SuspendBarrier};

use crate::reconnect::LoopOutcome;
use crate::{ExitStatus, SUSPEND_BARRIER_SERVICE};

/// Await the barrier (when present) and map the loop outcome to the exit
/// status.
pub fn coordinate(startup: &StartupHandle, outcome: LoopOutcome) -> ExitStatus {
    match startup.join() {
        Ok(container) => {
            match container.lookup::<SuspendBarrier>(SUSPEND_BARRIER_SERVICE) {
                Ok(barrier) => {
                    debug!("waiting on graceful-shutdown barrier");
                    barrier.await_suspend();
                    debug!("graceful-shutdown barrier released");
                }
                Err(LookupError::NotFound(_)) => {
                    // No barrier registered; nothing to drain.
                }
                Err(e @ LookupError::WrongType(_)) => {
                    warn!(error = %e, "graceful-shutdown barrier is unusable; not waiting");
                }
            }
        }
        Err(e) => {
            // The loop can only reach here without a runtime if the channel
            // drained before the first command forced a join.
            error!(error = %e, "service runtime never started");
            return ExitStatus::Failed;
        }
    }

    match outcome {
        LoopOutcome::Drained => {
            info!("shutting down in response to orchestrator signal");
            ExitStatus::Normal
        }
        LoopOutcome::Terminated => {
            warn!("shutting down after control protocol failure");
            ExitStatus::Failed
        }
    }
}
