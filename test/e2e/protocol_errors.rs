//! End-to-end failure paths for the supervision protocol.
//!
//! Covers the fatal-before-runtime conditions (handshake and startup
//! failures) and the documented choice that mid-loop protocol failures
//! exit `FAILED` rather than sharing the clean-disconnect status.

use std::io;
use std::sync::{Arc, Mutex};

use warden_runtime::{ActivationContext, ActivationError, ServiceActivator};
use warden_worker::client::ControllerClient;
use warden_worker::{run_supervised, ActivatorRegistry, ExitStatus, CONTROLLER_CLIENT_SERVICE};
use warden_wire::{
    write_startup_plan, AuthToken, FrameWriter, ServiceSpec, StartupPlan, STARTUP_FORMAT_VERSION,
};

const CHANNEL_TOKEN: &[u8; 16] = b"chan-token-0123x";
const COMMAND_KEY: &[u8; 16] = b"1234567890123456";

type ClientSlot = Arc<Mutex<Option<Arc<ControllerClient>>>>;

struct CapturingClientActivator {
    slot: ClientSlot,
}

impl ServiceActivator for CapturingClientActivator {
    fn name(&self) -> &str {
        CONTROLLER_CLIENT_SERVICE
    }

    fn activate(&self, ctx: &mut ActivationContext<'_>) -> Result<(), ActivationError> {
        let client = ControllerClient::activate(ctx, CONTROLLER_CLIENT_SERVICE)?;
        *self.slot.lock().unwrap() = Some(client);
        Ok(())
    }
}

fn capturing_client() -> (ClientSlot, Vec<Box<dyn ServiceActivator>>) {
    let slot: ClientSlot = Arc::new(Mutex::new(None));
    let activator = CapturingClientActivator {
        slot: Arc::clone(&slot),
    };
    (slot, vec![Box::new(activator)])
}

fn handshake_and_empty_plan() -> Vec<u8> {
    let mut writer = FrameWriter::new(Vec::new());
    writer
        .write_auth_token(&AuthToken::from_bytes(*CHANNEL_TOKEN))
        .unwrap();
    write_startup_plan(&mut writer, &StartupPlan { services: vec![] }).unwrap();
    writer.into_inner()
}

fn append_command(stream: &mut Vec<u8>, scheme: &str, host: &str, port: i32, management: bool) {
    let mut writer = FrameWriter::new(Vec::new());
    writer.write_utfz(scheme, "scheme").unwrap();
    writer.write_utfz(host, "host").unwrap();
    writer.write_i32(port).unwrap();
    writer.write_bool(management).unwrap();
    writer
        .write_auth_token(&AuthToken::from_bytes(*COMMAND_KEY))
        .unwrap();
    stream.extend(writer.into_inner());
}

#[test]
fn short_handshake_fails_without_decoding_startup() {
    // Fewer than the token's 16 bytes, then end-of-stream.
    let stream = CHANNEL_TOKEN[..10].to_vec();
    let (slot, extras) = capturing_client();

    let status = run_supervised(
        io::Cursor::new(stream),
        &ActivatorRegistry::builtin(),
        extras,
    );
    assert_eq!(status, ExitStatus::Failed);

    // No startup decode happened: the extra activator never ran.
    assert!(slot.lock().unwrap().is_none());
}

#[test]
fn unsupported_program_version_fails_before_activation() {
    let mut stream = CHANNEL_TOKEN.to_vec();
    stream.push(STARTUP_FORMAT_VERSION + 1);
    let (slot, extras) = capturing_client();

    let status = run_supervised(
        io::Cursor::new(stream),
        &ActivatorRegistry::builtin(),
        extras,
    );
    assert_eq!(status, ExitStatus::Failed);
    assert!(slot.lock().unwrap().is_none());
}

#[test]
fn unknown_service_kind_fails_startup() {
    let mut writer = FrameWriter::new(Vec::new());
    writer
        .write_auth_token(&AuthToken::from_bytes(*CHANNEL_TOKEN))
        .unwrap();
    write_startup_plan(
        &mut writer,
        &StartupPlan {
            services: vec![ServiceSpec {
                kind: "command-shell".to_string(),
                name: "sh".to_string(),
                config: serde_json::Value::Null,
            }],
        },
    )
    .unwrap();
    let (slot, extras) = capturing_client();

    let status = run_supervised(
        io::Cursor::new(writer.into_inner()),
        &ActivatorRegistry::builtin(),
        extras,
    );
    assert_eq!(status, ExitStatus::Failed);
    assert!(slot.lock().unwrap().is_none());
}

#[test]
fn truncated_command_exits_failed() {
    let mut stream = handshake_and_empty_plan();
    // A scheme with no terminator, then end-of-stream mid-message.
    stream.extend(b"remote");
    let (_slot, extras) = capturing_client();

    let status = run_supervised(
        io::Cursor::new(stream),
        &ActivatorRegistry::builtin(),
        extras,
    );
    assert_eq!(status, ExitStatus::Failed);
}

#[test]
fn invalid_boolean_byte_exits_failed() {
    let mut stream = handshake_and_empty_plan();
    let mut writer = FrameWriter::new(Vec::new());
    writer.write_utfz("remote", "scheme").unwrap();
    writer.write_utfz("node1", "host").unwrap();
    writer.write_i32(9999).unwrap();
    writer.write_u8(7).unwrap(); // not a boolean
    writer
        .write_auth_token(&AuthToken::from_bytes(*COMMAND_KEY))
        .unwrap();
    stream.extend(writer.into_inner());
    let (slot, extras) = capturing_client();

    let status = run_supervised(
        io::Cursor::new(stream),
        &ActivatorRegistry::builtin(),
        extras,
    );
    assert_eq!(status, ExitStatus::Failed);

    let client = slot.lock().unwrap().take().unwrap();
    assert_eq!(client.rebind_count(), 0);
}

#[test]
fn missing_client_service_exits_failed() {
    // No controller client in the plan and none registered by extras.
    let mut stream = handshake_and_empty_plan();
    append_command(&mut stream, "remote", "node1", 9999, false);

    let status = run_supervised(
        io::Cursor::new(stream),
        &ActivatorRegistry::builtin(),
        Vec::new(),
    );
    assert_eq!(status, ExitStatus::Failed);
}

#[test]
fn failure_after_successful_commands_still_exits_failed() {
    let mut stream = handshake_and_empty_plan();
    append_command(&mut stream, "remote", "node1", 9999, false);
    // Second message truncated mid-host.
    stream.extend(b"remote\0nod");
    let (slot, extras) = capturing_client();

    let status = run_supervised(
        io::Cursor::new(stream),
        &ActivatorRegistry::builtin(),
        extras,
    );
    assert_eq!(status, ExitStatus::Failed);

    // The first command was applied before the protocol died.
    let client = slot.lock().unwrap().take().unwrap();
    assert_eq!(client.rebind_count(), 1);
    assert_eq!(
        client.current_target().unwrap().endpoint.to_string(),
        "remote://node1:9999"
    );
}
