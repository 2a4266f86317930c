//! The service container and its startup promise.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tokio::sync::{oneshot, watch};
use tracing::{debug, info};

use crate::activator::{ActivationContext, ServiceActivator};

/// Startup failures. Cloneable so every joiner of the one-shot handle sees
/// the same outcome.
#[derive(Debug, Clone, Error)]
pub enum StartError {
    /// The tokio runtime could not be built.
    #[error("failed to build service runtime: {0}")]
    Runtime(String),

    /// An activator failed; startup stops at the first failure.
    #[error("activation {activator:?} failed: {reason}")]
    Activation { activator: String, reason: String },

    /// The startup thread could not be spawned.
    #[error("failed to spawn startup thread: {0}")]
    Spawn(String),

    /// The startup thread died without reporting a result.
    #[error("startup terminated without a result")]
    Aborted,
}

/// Named-service lookup failures. A missing or mistyped service is a
/// configuration error on the caller's side, not a runtime condition.
#[derive(Debug, Clone, Error)]
pub enum LookupError {
    #[error("service not found: {0:?}")]
    NotFound(String),

    #[error("service {0:?} has a different type than requested")]
    WrongType(String),
}

/// The running service container.
///
/// Holds the services registered during activation (immutable after boot),
/// the shutdown flag, and the tokio runtime their tasks live on.
pub struct ServiceContainer {
    services: HashMap<String, Arc<dyn Any + Send + Sync>>,
    shutdown_tx: watch::Sender<bool>,
    runtime: tokio::runtime::Runtime,
}

impl ServiceContainer {
    /// Whether shutdown has begun.
    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    /// Flip the shutdown flag and notify every service task watching it.
    pub fn begin_shutdown(&self) {
        if !self.shutdown_tx.send_replace(true) {
            info!("service container shutting down");
        }
    }

    /// Look up a service by name with its concrete type.
    pub fn lookup<S: Any + Send + Sync>(&self, name: &str) -> Result<Arc<S>, LookupError> {
        let service = self
            .services
            .get(name)
            .ok_or_else(|| LookupError::NotFound(name.to_string()))?;
        Arc::clone(service)
            .downcast::<S>()
            .map_err(|_| LookupError::WrongType(name.to_string()))
    }

    /// Handle to the container's runtime.
    pub fn handle(&self) -> &tokio::runtime::Handle {
        self.runtime.handle()
    }

    /// Receiver that flips to `true` once shutdown begins.
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    /// Number of registered services.
    pub fn service_count(&self) -> usize {
        self.services.len()
    }
}

/// One-shot promise of the running container.
///
/// `join` blocks until startup finishes and is idempotent: the result is
/// cached, so the reconnect loop can join on every command and the shutdown
/// coordinator can join again at the end.
pub struct StartupHandle {
    state: Mutex<JoinState>,
}

enum JoinState {
    Pending(oneshot::Receiver<Result<Arc<ServiceContainer>, StartError>>),
    Done(Result<Arc<ServiceContainer>, StartError>),
}

impl StartupHandle {
    fn pending(rx: oneshot::Receiver<Result<Arc<ServiceContainer>, StartError>>) -> Self {
        Self {
            state: Mutex::new(JoinState::Pending(rx)),
        }
    }

    fn failed(err: StartError) -> Self {
        Self {
            state: Mutex::new(JoinState::Done(Err(err))),
        }
    }

    /// Block until startup completes and return the container or the
    /// failure. Safe to call any number of times.
    pub fn join(&self) -> Result<Arc<ServiceContainer>, StartError> {
        let mut state = self.state.lock().unwrap();
        if matches!(*state, JoinState::Pending(_)) {
            let taken = std::mem::replace(&mut *state, JoinState::Done(Err(StartError::Aborted)));
            let JoinState::Pending(rx) = taken else {
                unreachable!()
            };
            let result = rx.blocking_recv().unwrap_or(Err(StartError::Aborted));
            *state = JoinState::Done(result.clone());
        }
        match &*state {
            JoinState::Done(result) => result.clone(),
            JoinState::Pending(_) => unreachable!(),
        }
    }
}

/// Start the service runtime asynchronously.
///
/// Returns immediately; activation runs on a dedicated startup thread and
/// the returned handle resolves once every activator has been applied (or
/// the first one has failed).
pub fn start(activators: Vec<Box<dyn ServiceActivator>>) -> StartupHandle {
    let (tx, rx) = oneshot::channel();
    let spawned = std::thread::Builder::new()
        .name("runtime-startup".to_string())
        .spawn(move || {
            let _ = tx.send(boot(activators).map(Arc::new));
        });
    match spawned {
        Ok(_) => StartupHandle::pending(rx),
        Err(e) => StartupHandle::failed(StartError::Spawn(e.to_string())),
    }
}

/// Build the runtime and apply every activator in order.
fn boot(activators: Vec<Box<dyn ServiceActivator>>) -> Result<ServiceContainer, StartError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("warden-service")
        .enable_all()
        .build()
        .map_err(|e| StartError::Runtime(e.to_string()))?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut services: HashMap<String, Arc<dyn Any + Send + Sync>> = HashMap::new();

    for activator in &activators {
        let mut ctx =
            ActivationContext::new(&mut services, runtime.handle().clone(), shutdown_rx.clone());
        activator
            .activate(&mut ctx)
            .map_err(|e| StartError::Activation {
                activator: activator.name().to_string(),
                reason: e.to_string(),
            })?;
        debug!(activator = activator.name(), "service activation applied");
    }

    info!(services = services.len(), "service runtime started");
    Ok(ServiceContainer {
        services,
        shutdown_tx,
        runtime,
    })
}
