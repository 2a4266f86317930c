//! Error types for the control-channel wire format.

use std::io;

use thiserror::Error;

/// Wire decoding and encoding errors.
///
/// `Interrupted` and `Io` are channel conditions; everything else is a
/// protocol violation by the peer.
#[derive(Debug, Error)]
pub enum WireError {
    /// A blocking read was interrupted before any byte of the message was
    /// consumed. The caller may retry the same message.
    #[error("read interrupted at message boundary")]
    Interrupted,

    /// The channel ended in the middle of a value.
    #[error("truncated {what}: channel closed mid-value")]
    Truncated { what: &'static str },

    /// A string field exceeded the protocol bound.
    #[error("{what} exceeds {limit} bytes")]
    StringTooLong { what: &'static str, limit: usize },

    /// A string field was not valid UTF-8.
    #[error("{what} is not valid UTF-8")]
    InvalidUtf8 { what: &'static str },

    /// A string being encoded contained the terminator byte.
    #[error("{what} contains a NUL byte")]
    StringContainsNul { what: &'static str },

    /// A boolean field held something other than 0 or 1.
    #[error("invalid boolean byte {value:#04x} in {what}")]
    InvalidBool { what: &'static str, value: u8 },

    /// An auth key contained a non-ASCII byte.
    #[error("auth key contains non-ASCII byte {0:#04x}")]
    NonAsciiAuthKey(u8),

    /// The startup program envelope carried an unsupported version tag.
    #[error("unsupported startup program version {found} (expected {expected})")]
    UnsupportedVersion { expected: u8, found: u8 },

    /// The startup program payload exceeded the protocol bound.
    #[error("startup program payload of {len} bytes exceeds {limit}")]
    ProgramTooLarge { len: usize, limit: usize },

    /// The startup program payload did not decode.
    #[error("malformed startup program payload: {0}")]
    MalformedProgram(#[from] serde_json::Error),

    /// Underlying channel error.
    #[error("channel error: {0}")]
    Io(#[from] io::Error),
}

impl WireError {
    /// True for the clean retry case: an interrupt that consumed nothing.
    pub fn is_interrupted(&self) -> bool {
        matches!(self, WireError::Interrupted)
    }
}
