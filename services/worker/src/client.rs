//! Controller client service.
//!
//! The named service the reconnect loop drives: it owns the worker's
//! binding to its controller. `reconnect` validates and publishes a new
//! target; the session task picks it up and maintains the session from
//! there. Failure semantics past the rebind itself (network errors, auth
//! rejection by the controller) live in the session, not in the control
//! loop.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info};

use warden_networking::Endpoint;
use warden_runtime::{ActivationContext, ActivationError};
use warden_wire::AuthToken;

/// Schemes the controller client can bind.
pub const SUPPORTED_SCHEMES: &[&str] = &["remote", "remote+tls"];

/// Controller client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The endpoint scheme is not one the client speaks.
    #[error("unsupported controller scheme {0:?}")]
    UnsupportedScheme(String),

    /// The session task is gone; the client cannot rebind.
    #[error("controller session is stopped")]
    Stopped,
}

/// A controller binding: where to connect and how to authenticate.
#[derive(Debug, Clone)]
pub struct ControllerTarget {
    pub endpoint: Endpoint,
    pub auth_key: AuthToken,
    pub management_endpoint: bool,
}

/// The controller client service.
pub struct ControllerClient {
    target_tx: watch::Sender<Option<ControllerTarget>>,
    rebinds: AtomicU64,
}

impl ControllerClient {
    /// Create the client, spawn its session task, and register it under
    /// `name`. Returns the service handle.
    pub fn activate(
        ctx: &mut ActivationContext<'_>,
        name: &str,
    ) -> Result<Arc<Self>, ActivationError> {
        let (target_tx, target_rx) = watch::channel(None);
        let client = Arc::new(Self {
            target_tx,
            rebinds: AtomicU64::new(0),
        });
        ctx.spawn(session_task(target_rx, ctx.shutdown_signal()));
        ctx.register(name, Arc::clone(&client))?;
        Ok(client)
    }

    /// Rebind the controller session to a new endpoint.
    ///
    /// The auth key never appears in log output.
    pub fn reconnect(
        &self,
        endpoint: Endpoint,
        auth_key: AuthToken,
        management_endpoint: bool,
    ) -> Result<(), ClientError> {
        if !SUPPORTED_SCHEMES.contains(&endpoint.scheme()) {
            return Err(ClientError::UnsupportedScheme(endpoint.scheme().to_string()));
        }
        info!(
            endpoint = %endpoint,
            management_endpoint,
            "rebinding controller session"
        );
        let target = ControllerTarget {
            endpoint,
            auth_key,
            management_endpoint,
        };
        if self.target_tx.send(Some(target)).is_err() {
            return Err(ClientError::Stopped);
        }
        self.rebinds.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    /// The current controller binding, if any.
    pub fn current_target(&self) -> Option<ControllerTarget> {
        self.target_tx.borrow().clone()
    }

    /// Number of rebinds applied over the client's lifetime.
    pub fn rebind_count(&self) -> u64 {
        self.rebinds.load(Ordering::SeqCst)
    }
}

/// Session task: follows target changes until shutdown.
async fn session_task(
    mut targets: watch::Receiver<Option<ControllerTarget>>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            changed = targets.changed() => {
                if changed.is_err() {
                    break;
                }
                let target = targets.borrow_and_update().clone();
                if let Some(target) = target {
                    debug!(
                        endpoint = %target.endpoint,
                        management_endpoint = target.management_endpoint,
                        "controller session target updated"
                    );
                }
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    debug!("controller session task stopping");
                    break;
                }
            }
        }
    }
}
