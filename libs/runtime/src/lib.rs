//! Service runtime for supervised workers.
//!
//! Provides the building blocks the worker boots its internal services with:
//! - `ServiceActivator` for registering services and spawning their tasks
//! - `start` for asynchronous startup behind a one-shot blocking join handle
//! - `ServiceContainer` for typed named-service lookup and the shutdown flag
//! - `SuspendBarrier` for draining in-flight work before the process exits
//!
//! Activation is an ordered list, not a dependency graph: each activator runs
//! once, in sequence, on a dedicated startup thread. Service tasks themselves
//! run on the container's tokio runtime.

mod activator;
mod barrier;
mod container;

pub use activator::{ActivationContext, ActivationError, ServiceActivator};
pub use barrier::{OperationGuard, SuspendBarrier};
pub use container::{start, LookupError, ServiceContainer, StartError, StartupHandle};
