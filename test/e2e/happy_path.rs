//! End-to-end happy paths for the supervision protocol.
//!
//! Each test composes a real byte stream - handshake token, startup
//! program envelope, reconnect messages - and drives the worker's
//! supervised sequence over it, asserting on the controller client's state
//! and the process exit status.

use std::io::{self, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use warden_runtime::{ActivationContext, ActivationError, ServiceActivator, SuspendBarrier};
use warden_worker::client::ControllerClient;
use warden_worker::reconnect::LoopOutcome;
use warden_worker::{
    run_supervised, ActivatorRegistry, ExitStatus, CONTROLLER_CLIENT_SERVICE,
    SUSPEND_BARRIER_SERVICE,
};
use warden_wire::{write_startup_plan, AuthToken, FrameWriter, ServiceSpec, StartupPlan};

const CHANNEL_TOKEN: &[u8; 16] = b"chan-token-0123x";
const COMMAND_KEY: &[u8; 16] = b"1234567890123456";

type ClientSlot = Arc<Mutex<Option<Arc<ControllerClient>>>>;

/// Registers a real controller client and exposes it to the test.
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

fn spec(kind: &str, name: &str) -> ServiceSpec {
    ServiceSpec {
        kind: kind.to_string(),
        name: name.to_string(),
        config: serde_json::Value::Null,
    }
}

/// Compose a full protocol stream: token, program, then messages.
fn protocol_stream(plan: &StartupPlan, messages: &[(&str, &str, i32, bool)]) -> Vec<u8> {
    let mut writer = FrameWriter::new(Vec::new());
    writer
        .write_auth_token(&AuthToken::from_bytes(*CHANNEL_TOKEN))
        .unwrap();
    write_startup_plan(&mut writer, plan).unwrap();
    for (scheme, host, port, management) in messages {
        writer.write_utfz(scheme, "scheme").unwrap();
        writer.write_utfz(host, "host").unwrap();
        writer.write_i32(*port).unwrap();
        writer.write_bool(*management).unwrap();
        writer
            .write_auth_token(&AuthToken::from_bytes(*COMMAND_KEY))
            .unwrap();
    }
    writer.into_inner()
}

#[test]
fn full_scenario_delivers_reconnect_and_exits_normally() {
    let plan = StartupPlan {
        services: vec![
            spec("suspend-barrier", SUSPEND_BARRIER_SERVICE),
            spec("heartbeat", "heartbeat"),
        ],
    };
    let stream = protocol_stream(&plan, &[("remote", "node1", 9999, false)]);
    let (slot, extras) = capturing_client();

    let status = run_supervised(
        io::Cursor::new(stream),
        &ActivatorRegistry::builtin(),
        extras,
    );
    assert_eq!(status, ExitStatus::Normal);

    let client = slot.lock().unwrap().take().expect("client activated");
    assert_eq!(client.rebind_count(), 1);
    let target = client.current_target().expect("target bound");
    assert_eq!(target.endpoint.to_string(), "remote://node1:9999");
    assert_eq!(target.auth_key.as_ascii().unwrap(), "1234567890123456");
    assert!(!target.management_endpoint);
}

#[test]
fn ipv6_host_is_bracketed() {
    let plan = StartupPlan { services: vec![] };
    let stream = protocol_stream(&plan, &[("remote", "::1", 9999, false)]);
    let (slot, extras) = capturing_client();

    let status = run_supervised(
        io::Cursor::new(stream),
        &ActivatorRegistry::builtin(),
        extras,
    );
    assert_eq!(status, ExitStatus::Normal);

    let client = slot.lock().unwrap().take().unwrap();
    let target = client.current_target().unwrap();
    assert_eq!(target.endpoint.host(), "[::1]");
    assert_eq!(target.endpoint.to_string(), "remote://[::1]:9999");
}

#[test]
fn clean_eof_with_no_commands_exits_normally() {
    let plan = StartupPlan { services: vec![] };
    let stream = protocol_stream(&plan, &[]);
    let (slot, extras) = capturing_client();

    let status = run_supervised(
        io::Cursor::new(stream),
        &ActivatorRegistry::builtin(),
        extras,
    );
    assert_eq!(status, ExitStatus::Normal);

    // Startup still completed; the client simply never rebound.
    let client = slot.lock().unwrap().take().unwrap();
    assert_eq!(client.rebind_count(), 0);
    assert!(client.current_target().is_none());
}

#[test]
fn commands_rebind_in_order() {
    let plan = StartupPlan { services: vec![] };
    let stream = protocol_stream(
        &plan,
        &[
            ("remote", "node1", 9999, false),
            ("remote+tls", "node2", 8443, true),
        ],
    );
    let (slot, extras) = capturing_client();

    let status = run_supervised(
        io::Cursor::new(stream),
        &ActivatorRegistry::builtin(),
        extras,
    );
    assert_eq!(status, ExitStatus::Normal);

    let client = slot.lock().unwrap().take().unwrap();
    assert_eq!(client.rebind_count(), 2);
    let target = client.current_target().unwrap();
    assert_eq!(target.endpoint.to_string(), "remote+tls://node2:8443");
    assert!(target.management_endpoint);
}

/// Barrier activator that opens an in-flight operation, requests suspend,
/// and releases the operation from another thread shortly after.
struct DrainingBarrierActivator {
    released: Arc<AtomicBool>,
}

impl ServiceActivator for DrainingBarrierActivator {
    fn name(&self) -> &str {
        SUSPEND_BARRIER_SERVICE
    }

    fn activate(&self, ctx: &mut ActivationContext<'_>) -> Result<(), ActivationError> {
        let barrier = Arc::new(SuspendBarrier::new());
        let guard = barrier
            .begin_operation()
            .expect("barrier not suspending yet");
        barrier.request_suspend();

        let released = Arc::clone(&self.released);
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(100));
            released.store(true, Ordering::SeqCst);
            drop(guard);
        });

        ctx.register(SUSPEND_BARRIER_SERVICE, barrier)
    }
}

#[test]
fn suspending_barrier_drains_before_exit() {
    let plan = StartupPlan { services: vec![] };
    let stream = protocol_stream(&plan, &[]);
    let released = Arc::new(AtomicBool::new(false));
    let extras: Vec<Box<dyn ServiceActivator>> = vec![Box::new(DrainingBarrierActivator {
        released: Arc::clone(&released),
    })];

    let status = run_supervised(
        io::Cursor::new(stream),
        &ActivatorRegistry::builtin(),
        extras,
    );

    // The shutdown coordinator must have waited for the in-flight
    // operation before letting the process exit.
    assert_eq!(status, ExitStatus::Normal);
    assert!(released.load(Ordering::SeqCst));
}

/// Reader that raises `Interrupted` before every other read call.
struct InterruptingReader<R> {
    inner: R,
    interrupt_next: bool,
}

impl<R: Read> Read for InterruptingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.interrupt_next {
            self.interrupt_next = false;
            return Err(io::Error::new(io::ErrorKind::Interrupted, "signal"));
        }
        self.interrupt_next = true;
        self.inner.read(buf)
    }
}

#[test]
fn interrupted_reads_do_not_lose_messages() {
    let plan = StartupPlan { services: vec![] };
    let stream = protocol_stream(&plan, &[("remote", "node1", 9999, false)]);
    let (slot, extras) = capturing_client();

    let channel = InterruptingReader {
        inner: io::Cursor::new(stream),
        interrupt_next: true,
    };
    let status = run_supervised(channel, &ActivatorRegistry::builtin(), extras);
    assert_eq!(status, ExitStatus::Normal);

    // The command arrived exactly once despite the interrupts.
    let client = slot.lock().unwrap().take().unwrap();
    assert_eq!(client.rebind_count(), 1);
    assert_eq!(
        client.current_target().unwrap().endpoint.to_string(),
        "remote://node1:9999"
    );
}

#[test]
fn loop_outcomes_map_to_exit_codes() {
    assert_eq!(ExitStatus::Normal.code(), 0);
    assert_eq!(ExitStatus::Failed.code(), 1);
    // Both loop outcomes are representable; the mapping itself is covered
    // end-to-end above and in protocol_errors.
    assert_ne!(LoopOutcome::Drained, LoopOutcome::Terminated);
}
