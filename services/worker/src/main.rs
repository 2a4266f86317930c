//! Warden managed worker entry point.
//!
//! Spawned by the orchestrator with the control channel on standard input.
//! Command-line arguments are ignored; configuration comes from the
//! environment.

use std::io;
use std::process::ExitCode;

use tracing::info;
use uuid::Uuid;

use warden_runtime::ServiceActivator;
use warden_worker::config::Config;
use warden_worker::identity::WorkerInfoActivator;
use warden_worker::{logging, run_supervised, ActivatorRegistry, VERSION};

fn main() -> ExitCode {
    let config = Config::from_env();

    if let Err(e) = logging::init(&config) {
        eprintln!("warden-worker: failed to initialize logging: {e}");
        return ExitCode::from(1);
    }

    let boot_id = Uuid::new_v4().to_string();
    info!(
        version = VERSION,
        boot_id = %boot_id,
        "worker starting under supervision"
    );

    let registry = ActivatorRegistry::builtin();
    let extra_activators: Vec<Box<dyn ServiceActivator>> =
        vec![Box::new(WorkerInfoActivator::new(boot_id))];

    let stdin = io::stdin().lock();
    let status = if config.stdin_base64 {
        run_supervised(
            warden_wire::base64_decoder(stdin),
            &registry,
            extra_activators,
        )
    } else {
        run_supervised(stdin, &registry, extra_activators)
    };

    info!(exit_code = status.code(), "worker exiting");
    status.into()
}
