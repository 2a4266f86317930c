//! Logging initialization for the worker.
//!
//! The control channel owns stdin, and stdout belongs to the orchestrator's
//! console plumbing, so log output goes to stderr - plus, when configured, a
//! size-capped boot log file the orchestrator can collect after the worker
//! dies. The cap keeps a crash-looping worker from filling the host disk.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;

/// Maximum boot log size (1 MB).
const MAX_LOG_BYTES: u64 = 1024 * 1024;

/// File writer that silently drops output past the cap.
struct CappedFile {
    file: File,
    remaining: u64,
}

impl CappedFile {
    fn create(path: &Path, cap: u64) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        Ok(Self {
            file,
            remaining: cap,
        })
    }
}

impl Write for CappedFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let allowed = buf.len().min(self.remaining as usize);
        if allowed > 0 {
            let written = self.file.write(&buf[..allowed])?;
            self.remaining -= written as u64;
        }
        // Report the full length so tracing never sees a short write once
        // the cap is reached.
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

/// Cloneable writer handle for the tracing layer.
#[derive(Clone)]
struct BootLog(Arc<Mutex<CappedFile>>);

impl Write for BootLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.lock().unwrap().flush()
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for BootLog {
    type Writer = BootLog;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Initialize logging from the worker config.
pub fn init(config: &Config) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(io::stderr);

    let file_layer = match &config.log_path {
        Some(path) => {
            let capped = CappedFile::create(Path::new(path), MAX_LOG_BYTES)?;
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(BootLog(Arc::new(Mutex::new(capped))));
            Some(layer)
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(())
}
