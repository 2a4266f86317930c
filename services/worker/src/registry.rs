//! Restricted activator registry.
//!
//! The startup program can only activate service kinds the worker's own
//! execution context has registered here - the resolution policy that keeps
//! an orchestrator (or anything impersonating one) from instantiating
//! arbitrary types through the channel.

use std::collections::HashMap;
use std::sync::Arc;

use warden_runtime::{ActivationContext, ActivationError, ServiceActivator, SuspendBarrier};
use warden_wire::{ServiceSpec, StartupPlan};

use crate::client::ControllerClient;
use crate::error::WorkerError;
use crate::heartbeat::{Heartbeat, HeartbeatConfig};

/// Factory turning one service spec into its activator.
pub type ActivatorFactory = fn(&ServiceSpec) -> Result<Box<dyn ServiceActivator>, WorkerError>;

/// Maps service kinds to their activator factories.
pub struct ActivatorRegistry {
    factories: HashMap<&'static str, ActivatorFactory>,
}

impl ActivatorRegistry {
    /// Empty registry; resolves nothing.
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// The worker's built-in kinds.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register("controller-client", controller_client_factory);
        registry.register("suspend-barrier", suspend_barrier_factory);
        registry.register("heartbeat", heartbeat_factory);
        registry
    }

    /// Add a kind. Host-specific extension point.
    pub fn register(&mut self, kind: &'static str, factory: ActivatorFactory) {
        self.factories.insert(kind, factory);
    }

    /// Resolve every spec in the plan, in order. Unknown kinds fail the
    /// whole plan.
    pub fn resolve(
        &self,
        plan: &StartupPlan,
    ) -> Result<Vec<Box<dyn ServiceActivator>>, WorkerError> {
        plan.services
            .iter()
            .map(|spec| {
                let factory = self
                    .factories
                    .get(spec.kind.as_str())
                    .ok_or_else(|| WorkerError::UnknownServiceKind(spec.kind.clone()))?;
                factory(spec)
            })
            .collect()
    }
}

/// Decode a spec's config value, treating `null` as "all defaults".
fn spec_config<T>(spec: &ServiceSpec) -> Result<T, WorkerError>
where
    T: serde::de::DeserializeOwned + Default,
{
    if spec.config.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(spec.config.clone()).map_err(|e| WorkerError::InvalidServiceConfig {
        name: spec.name.clone(),
        detail: e.to_string(),
    })
}

struct ControllerClientActivator {
    name: String,
}

impl ServiceActivator for ControllerClientActivator {
    fn name(&self) -> &str {
        &self.name
    }

    fn activate(&self, ctx: &mut ActivationContext<'_>) -> Result<(), ActivationError> {
        ControllerClient::activate(ctx, &self.name)?;
        Ok(())
    }
}

fn controller_client_factory(
    spec: &ServiceSpec,
) -> Result<Box<dyn ServiceActivator>, WorkerError> {
    Ok(Box::new(ControllerClientActivator {
        name: spec.name.clone(),
    }))
}

struct SuspendBarrierActivator {
    name: String,
}

impl ServiceActivator for SuspendBarrierActivator {
    fn name(&self) -> &str {
        &self.name
    }

    fn activate(&self, ctx: &mut ActivationContext<'_>) -> Result<(), ActivationError> {
        ctx.register(&self.name, Arc::new(SuspendBarrier::new()))
    }
}

fn suspend_barrier_factory(spec: &ServiceSpec) -> Result<Box<dyn ServiceActivator>, WorkerError> {
    Ok(Box::new(SuspendBarrierActivator {
        name: spec.name.clone(),
    }))
}

struct HeartbeatActivator {
    name: String,
    config: HeartbeatConfig,
}

impl ServiceActivator for HeartbeatActivator {
    fn name(&self) -> &str {
        &self.name
    }

    fn activate(&self, ctx: &mut ActivationContext<'_>) -> Result<(), ActivationError> {
        Heartbeat::activate(
            ctx,
            &self.name,
            HeartbeatConfig {
                interval_secs: self.config.interval_secs,
            },
        )?;
        Ok(())
    }
}

fn heartbeat_factory(spec: &ServiceSpec) -> Result<Box<dyn ServiceActivator>, WorkerError> {
    let config = spec_config::<HeartbeatConfig>(spec)?;
    Ok(Box::new(HeartbeatActivator {
        name: spec.name.clone(),
        config,
    }))
}
