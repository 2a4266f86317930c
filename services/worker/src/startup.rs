//! Startup program loading.
//!
//! Exactly one startup program is decoded per process lifetime, directly
//! after the handshake. `StartupProgram` is consumed by value in
//! [`StartupProgram::run`], so a second activation of the same program is
//! unrepresentable.

use std::io::Read;

use tracing::info;

use warden_runtime::{start, ServiceActivator, StartupHandle};
use warden_wire::{read_startup_plan, FrameReader};

use crate::error::WorkerError;
use crate::registry::ActivatorRegistry;

/// A decoded, ready-to-run startup program.
pub struct StartupProgram {
    activators: Vec<Box<dyn ServiceActivator>>,
}

impl StartupProgram {
    /// Number of activations the program carries.
    pub fn len(&self) -> usize {
        self.activators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activators.is_empty()
    }

    /// Run the program: hand every activation (plus the caller's extras,
    /// appended unchanged) to the service runtime. Returns immediately
    /// with the startup promise; the caller joins when it first needs the
    /// runtime.
    pub fn run(mut self, extra_activators: Vec<Box<dyn ServiceActivator>>) -> StartupHandle {
        self.activators.extend(extra_activators);
        info!(
            activations = self.activators.len(),
            "starting service runtime"
        );
        start(self.activators)
    }
}

/// Decode one startup program from the channel.
///
/// The envelope version is checked before the payload is read, and every
/// service kind must resolve against `registry` - the worker never
/// instantiates types the orchestrator names but its own context does not
/// know.
pub fn load_program<R: Read>(
    reader: &mut FrameReader<R>,
    registry: &ActivatorRegistry,
) -> Result<StartupProgram, WorkerError> {
    let plan = read_startup_plan(reader)?;
    let activators = registry.resolve(&plan)?;
    info!(services = activators.len(), "startup program decoded");
    Ok(StartupProgram { activators })
}
