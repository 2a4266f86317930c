//! Control-channel wire format for supervised workers.
//!
//! This library implements the byte-stream protocol spoken between the
//! orchestrator and a managed worker over the worker's standard input:
//! - Framing primitives (zero-terminated strings, big-endian integers,
//!   fixed-length byte blocks) over any `Read`/`Write`
//! - The fixed-length authentication token
//! - The version-tagged startup program envelope and payload schema
//! - A base64 adapter for channels that arrive encoded
//!
//! The read side never tears a message on an interrupted syscall: only
//! [`FrameReader::begin_message`] surfaces [`WireError::Interrupted`], and
//! only when no byte of the message has been consumed yet.

mod auth;
mod encoded;
mod error;
mod frame;
mod program;

pub use auth::{AuthToken, AUTH_TOKEN_LEN};
pub use encoded::{base64_decoder, Base64Decoder};
pub use error::WireError;
pub use frame::{FrameReader, FrameWriter, MessageStart, MAX_STRING_LEN};
pub use program::{
    read_startup_plan, write_startup_plan, ServiceSpec, StartupPlan, MAX_PROGRAM_BYTES,
    STARTUP_FORMAT_VERSION,
};
