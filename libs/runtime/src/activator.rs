//! Service activation: the extension point through which services enter the
//! container.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Errors raised while an activator runs.
#[derive(Debug, Error)]
pub enum ActivationError {
    /// Two activations tried to claim the same service name.
    #[error("duplicate service name: {0:?}")]
    DuplicateService(String),

    /// The activation's configuration did not make sense.
    #[error("invalid service config: {0}")]
    InvalidConfig(String),

    /// Anything else the activation failed on.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// A single service activation.
///
/// Activators register services into the container and may spawn the tasks
/// that back them. They run in order on the startup thread; the first
/// failure aborts startup.
pub trait ServiceActivator: Send {
    /// Activator name for logging.
    fn name(&self) -> &str;

    /// Apply this activation.
    fn activate(&self, ctx: &mut ActivationContext<'_>) -> Result<(), ActivationError>;
}

/// Context handed to each activator while the container is being built.
pub struct ActivationContext<'a> {
    services: &'a mut HashMap<String, Arc<dyn Any + Send + Sync>>,
    handle: Handle,
    shutdown: watch::Receiver<bool>,
}

impl<'a> ActivationContext<'a> {
    pub(crate) fn new(
        services: &'a mut HashMap<String, Arc<dyn Any + Send + Sync>>,
        handle: Handle,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            services,
            handle,
            shutdown,
        }
    }

    /// Register a service under `name`.
    pub fn register<S: Any + Send + Sync>(
        &mut self,
        name: &str,
        service: Arc<S>,
    ) -> Result<(), ActivationError> {
        if self.services.contains_key(name) {
            return Err(ActivationError::DuplicateService(name.to_string()));
        }
        self.services.insert(name.to_string(), service);
        Ok(())
    }

    /// Spawn a task on the container's runtime.
    pub fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.handle.spawn(future)
    }

    /// Runtime handle, for services that spawn later.
    pub fn runtime(&self) -> &Handle {
        &self.handle
    }

    /// Receiver that flips to `true` once container shutdown begins.
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown.clone()
    }
}
