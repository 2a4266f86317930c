//! Worker identity service.
//!
//! Registered by the worker itself (not by the startup program) through the
//! extra-activator extension point, so every runtime carries its own
//! version and boot id regardless of what the orchestrator activates.

use std::sync::Arc;

use tracing::info;

use warden_runtime::{ActivationContext, ActivationError, ServiceActivator};

/// Service name the worker registers its identity under.
pub const WORKER_INFO_SERVICE: &str = "worker-info";

/// Version and boot identity of this worker process.
#[derive(Debug, Clone)]
pub struct WorkerInfo {
    pub version: &'static str,
    pub boot_id: String,
}

/// Activator registering [`WorkerInfo`].
pub struct WorkerInfoActivator {
    boot_id: String,
}

impl WorkerInfoActivator {
    pub fn new(boot_id: String) -> Self {
        Self { boot_id }
    }
}

impl ServiceActivator for WorkerInfoActivator {
    fn name(&self) -> &str {
        WORKER_INFO_SERVICE
    }

    fn activate(&self, ctx: &mut ActivationContext<'_>) -> Result<(), ActivationError> {
        let service = Arc::new(WorkerInfo {
            version: crate::VERSION,
            boot_id: self.boot_id.clone(),
        });
        info!(version = service.version, boot_id = %service.boot_id, "worker identity registered");
        ctx.register(WORKER_INFO_SERVICE, service)
    }
}
