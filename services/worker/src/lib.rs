//! Warden managed worker - the process side of the supervision protocol.
//!
//! The orchestrator spawns this process and drives it over its standard
//! input. In order, the worker:
//! - reads the channel authentication token (handshake)
//! - decodes and runs exactly one startup program, bringing up its
//!   internal service runtime asynchronously
//! - services reconnect commands, rebinding the controller client service
//!   to each new controller endpoint
//! - on channel close or failure, drains the graceful-shutdown barrier and
//!   exits with a defined status
//!
//! The whole sequence runs on one control thread; the only concurrency is
//! inside the service runtime the startup program brings up.

use std::io::Read;
use std::process;

use tracing::info;

use warden_runtime::ServiceActivator;
use warden_wire::FrameReader;

pub mod client;
pub mod config;
pub mod error;
pub mod handshake;
pub mod heartbeat;
pub mod identity;
pub mod logging;
pub mod reconnect;
pub mod registry;
pub mod shutdown;
pub mod startup;

pub use registry::ActivatorRegistry;

/// Worker version (semver).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the controller client service the reconnect loop targets.
pub const CONTROLLER_CLIENT_SERVICE: &str = "controller-client";

/// Name of the optional graceful-shutdown barrier service.
pub const SUSPEND_BARRIER_SERVICE: &str = "suspend-barrier";

/// Process exit statuses of the supervision protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// Clean shutdown completed.
    Normal,
    /// Handshake, startup, or protocol failure.
    Failed,
}

impl ExitStatus {
    pub fn code(self) -> u8 {
        match self {
            ExitStatus::Normal => 0,
            ExitStatus::Failed => 1,
        }
    }
}

impl From<ExitStatus> for process::ExitCode {
    fn from(status: ExitStatus) -> Self {
        process::ExitCode::from(status.code())
    }
}

/// Run the supervised sequence over the control channel.
///
/// `registry` restricts which service kinds the startup program may
/// activate; `extra_activators` are appended to the program unchanged (the
/// host's own registrations). Returns the exit status for the process.
pub fn run_supervised<R: Read>(
    channel: R,
    registry: &ActivatorRegistry,
    extra_activators: Vec<Box<dyn ServiceActivator>>,
) -> ExitStatus {
    let mut reader = FrameReader::new(channel);

    // Handshake. Failure here is fatal and there is nothing to clean up:
    // no runtime exists yet. Report on the real stderr and leave.
    let _channel_token = match handshake::read_auth_token(&mut reader) {
        Ok(token) => token,
        Err(e) => {
            eprintln!("warden-worker: handshake failed: {e}");
            return ExitStatus::Failed;
        }
    };
    info!("channel handshake complete");

    // One startup program per process lifetime. Decode and activation
    // dispatch failures are fatal; the error goes to stderr directly so it
    // survives any logging misconfiguration.
    let startup = match startup::load_program(&mut reader, registry) {
        Ok(program) => program.run(extra_activators),
        Err(e) => {
            eprintln!("warden-worker: startup failed: {e}");
            return ExitStatus::Failed;
        }
    };

    // Steady state: reconnect commands until the channel ends or fails.
    let outcome = reconnect::run_loop(&mut reader, &startup);

    // Coordinated shutdown, then exit with the outcome's status.
    shutdown::coordinate(&startup, outcome)
}
