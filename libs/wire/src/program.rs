//! Startup program envelope and payload schema.
//!
//! The orchestrator sends exactly one startup program per worker lifetime,
//! directly after the handshake:
//!
//! ```text
//! [u8 version][u32 BE payload length][payload]
//! ```
//!
//! The version tag is checked before any payload byte is read. The payload
//! is a JSON-encoded [`StartupPlan`] - the set of service activations the
//! worker resolves against its own restricted registry.

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::WireError;
use crate::frame::{FrameReader, FrameWriter};

/// Expected startup program format version.
pub const STARTUP_FORMAT_VERSION: u8 = 2;

/// Upper bound on the startup program payload.
pub const MAX_PROGRAM_BYTES: usize = 1024 * 1024;

/// The decoded startup program payload: service activations to run, in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartupPlan {
    #[serde(default)]
    pub services: Vec<ServiceSpec>,
}

/// One service activation directive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSpec {
    /// Activator kind, resolved against the worker's registry.
    pub kind: String,

    /// Service name the activation registers under.
    pub name: String,

    /// Kind-specific configuration.
    #[serde(default)]
    pub config: Value,
}

/// Read one startup program envelope and decode its plan.
pub fn read_startup_plan<R: Read>(reader: &mut FrameReader<R>) -> Result<StartupPlan, WireError> {
    let version = reader.read_u8("startup program version")?;
    if version != STARTUP_FORMAT_VERSION {
        return Err(WireError::UnsupportedVersion {
            expected: STARTUP_FORMAT_VERSION,
            found: version,
        });
    }
    let len = reader.read_u32("startup program length")? as usize;
    if len > MAX_PROGRAM_BYTES {
        return Err(WireError::ProgramTooLarge {
            len,
            limit: MAX_PROGRAM_BYTES,
        });
    }
    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload, "startup program payload")?;
    Ok(serde_json::from_slice(&payload)?)
}

/// Write one startup program envelope.
pub fn write_startup_plan<W: Write>(
    writer: &mut FrameWriter<W>,
    plan: &StartupPlan,
) -> Result<(), WireError> {
    let payload = serde_json::to_vec(plan)?;
    if payload.len() > MAX_PROGRAM_BYTES {
        return Err(WireError::ProgramTooLarge {
            len: payload.len(),
            limit: MAX_PROGRAM_BYTES,
        });
    }
    writer.write_u8(STARTUP_FORMAT_VERSION)?;
    writer.write_u32(payload.len() as u32)?;
    writer.write_raw(&payload)?;
    Ok(())
}
