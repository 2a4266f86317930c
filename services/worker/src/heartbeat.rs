//! Heartbeat service: periodic liveness logging.
//!
//! Orchestrators that collect worker logs use the heartbeat line to tell a
//! hung worker from a quiet one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tokio::sync::watch;
use tracing::debug;

use warden_runtime::{ActivationContext, ActivationError};

const DEFAULT_INTERVAL_SECS: u64 = 10;

/// Heartbeat configuration from the startup program.
#[derive(Debug, Deserialize)]
pub struct HeartbeatConfig {
    /// Seconds between beats.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

fn default_interval_secs() -> u64 {
    DEFAULT_INTERVAL_SECS
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_INTERVAL_SECS,
        }
    }
}

/// Handle to the running heartbeat.
pub struct Heartbeat {
    beats: Arc<AtomicU64>,
    interval: Duration,
}

impl Heartbeat {
    /// Spawn the beat task and register the service under `name`.
    pub fn activate(
        ctx: &mut ActivationContext<'_>,
        name: &str,
        config: HeartbeatConfig,
    ) -> Result<Arc<Self>, ActivationError> {
        if config.interval_secs == 0 {
            return Err(ActivationError::InvalidConfig(
                "heartbeat interval must be at least one second".to_string(),
            ));
        }
        let beats = Arc::new(AtomicU64::new(0));
        let service = Arc::new(Self {
            beats: Arc::clone(&beats),
            interval: Duration::from_secs(config.interval_secs),
        });
        ctx.spawn(run_beat_loop(
            service.interval,
            beats,
            ctx.shutdown_signal(),
        ));
        ctx.register(name, Arc::clone(&service))?;
        Ok(service)
    }

    /// Beats emitted so far.
    pub fn beats(&self) -> u64 {
        self.beats.load(Ordering::SeqCst)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

/// Beat until shutdown.
async fn run_beat_loop(
    interval: Duration,
    beats: Arc<AtomicU64>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut timer = tokio::time::interval(interval);
    // The first tick fires immediately; skip it so beat 1 lands after one
    // full interval.
    timer.tick().await;
    loop {
        tokio::select! {
            _ = timer.tick() => {
                let count = beats.fetch_add(1, Ordering::SeqCst) + 1;
                debug!(beats = count, "worker alive");
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    debug!("heartbeat stopping");
                    break;
                }
            }
        }
    }
}
