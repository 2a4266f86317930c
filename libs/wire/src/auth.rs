//! The fixed-length authentication token.
//!
//! The same token shape is used twice in the protocol: once as the channel
//! authentication block read at startup, and once per reconnect command as
//! the command's auth key. Tokens are opaque and must never appear in log
//! output, so `Debug` is redacted and there is no `Display`.

use std::fmt;

use crate::error::WireError;

/// Encoded length of an authentication token on the wire, in bytes.
pub const AUTH_TOKEN_LEN: usize = 16;

/// A fixed-length opaque authentication token.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken([u8; AUTH_TOKEN_LEN]);

impl AuthToken {
    /// Wrap raw token bytes.
    pub fn from_bytes(bytes: [u8; AUTH_TOKEN_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw token bytes.
    pub fn as_bytes(&self) -> &[u8; AUTH_TOKEN_LEN] {
        &self.0
    }

    /// Decode the token as an ASCII key.
    ///
    /// Command auth keys are ASCII on the wire; any other byte is a
    /// protocol violation.
    pub fn as_ascii(&self) -> Result<&str, WireError> {
        if let Some(b) = self.0.iter().copied().find(|b| !b.is_ascii()) {
            return Err(WireError::NonAsciiAuthKey(b));
        }
        // Checked above: pure ASCII is valid UTF-8.
        Ok(std::str::from_utf8(&self.0).expect("ascii"))
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(redacted)")
    }
}
