//! The reconnect loop: steady-state control protocol.
//!
//! Repeatedly parses one reconnect command from the channel and applies it
//! to the controller client inside the runtime. Three ways out of an
//! iteration:
//! - an interrupted read at the message boundary is retried, invisibly
//! - clean end-of-stream is the orchestrator's shutdown signal (`Drained`)
//! - anything else ends the protocol (`Terminated`); one bad message is
//!   never retried

use std::io::Read;

use tracing::{debug, error, info};

use warden_networking::Endpoint;
use warden_runtime::StartupHandle;
use warden_wire::{AuthToken, FrameReader, MessageStart};

use crate::client::ControllerClient;
use crate::error::WorkerError;
use crate::CONTROLLER_CLIENT_SERVICE;

/// How the loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopOutcome {
    /// Clean end-of-stream at a message boundary.
    Drained,
    /// Protocol failure: malformed message, lookup failure, or a refused
    /// rebind.
    Terminated,
}

/// One parsed reconnect command.
#[derive(Debug)]
pub struct ReconnectCommand {
    pub scheme: String,
    pub host: String,
    pub port: i32,
    pub management_endpoint: bool,
    pub auth_key: AuthToken,
}

impl ReconnectCommand {
    /// Parse the body of one command. The first byte of `scheme` is
    /// already buffered by `begin_message`.
    fn parse<R: Read>(reader: &mut FrameReader<R>) -> Result<Self, WorkerError> {
        let scheme = reader.read_utfz("scheme").map_err(WorkerError::MalformedCommand)?;
        let host = reader.read_utfz("host").map_err(WorkerError::MalformedCommand)?;
        let port = reader.read_i32("port").map_err(WorkerError::MalformedCommand)?;
        let management_endpoint = reader
            .read_bool("management endpoint flag")
            .map_err(WorkerError::MalformedCommand)?;
        let auth_key = reader
            .read_auth_token("command auth key")
            .map_err(WorkerError::MalformedCommand)?;
        // Keys are ASCII on the wire; reject anything else up front.
        auth_key.as_ascii().map_err(WorkerError::MalformedCommand)?;
        Ok(Self {
            scheme,
            host,
            port,
            management_endpoint,
            auth_key,
        })
    }

    /// The controller endpoint this command targets (IPv6 hosts
    /// bracketed).
    fn endpoint(&self) -> Result<Endpoint, WorkerError> {
        Ok(Endpoint::new(&self.scheme, &self.host, self.port)?)
    }
}

/// Drive the loop until the channel drains or the protocol fails.
pub fn run_loop<R: Read>(reader: &mut FrameReader<R>, startup: &StartupHandle) -> LoopOutcome {
    loop {
        match reader.begin_message() {
            Ok(MessageStart::EndOfStream) => {
                info!("control channel closed; draining");
                return LoopOutcome::Drained;
            }
            Ok(MessageStart::Data) => {}
            Err(e) if e.is_interrupted() => {
                // Nothing was consumed; the same message will arrive
                // intact on the next pass.
                continue;
            }
            Err(e) => {
                error!(error = %e, "control channel failed");
                return LoopOutcome::Terminated;
            }
        }

        if let Err(e) = apply_next_command(reader, startup) {
            error!(
                error = %e,
                reason = e.reason_code(),
                "reconnect command failed; ending control protocol"
            );
            return LoopOutcome::Terminated;
        }
    }
}

/// Parse and apply a single command.
fn apply_next_command<R: Read>(
    reader: &mut FrameReader<R>,
    startup: &StartupHandle,
) -> Result<(), WorkerError> {
    let command = ReconnectCommand::parse(reader)?;
    let endpoint = command.endpoint()?;

    // First join point with startup; usually long complete by now.
    let container = startup.join()?;

    if container.is_shutting_down() {
        // The client service is stopped or stopping; applying the command
        // would only race it. Skip - not queued, not retried.
        debug!(endpoint = %endpoint, "runtime is shutting down; skipping reconnect command");
        return Ok(());
    }

    let client = container.lookup::<ControllerClient>(CONTROLLER_CLIENT_SERVICE)?;
    client.reconnect(endpoint, command.auth_key, command.management_endpoint)?;
    Ok(())
}
