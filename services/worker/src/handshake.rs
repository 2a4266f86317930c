//! Channel authentication handshake.
//!
//! The very first bytes on the control channel are the worker's auth token:
//! exactly [`AUTH_TOKEN_LEN`] raw bytes, before any other message. A short
//! read or channel error here is fatal - the caller terminates the process
//! with a failure status without attempting cleanup, since no runtime
//! exists yet.

use std::io::Read;

use warden_wire::{AuthToken, FrameReader, WireError, AUTH_TOKEN_LEN};

/// Read the channel authentication token.
pub fn read_auth_token<R: Read>(reader: &mut FrameReader<R>) -> Result<AuthToken, WireError> {
    reader.read_auth_token("channel auth token")
}
