//! Framing primitives over the control channel.
//!
//! Values on the wire: raw byte blocks of known length, UTF-8 strings
//! terminated by a zero byte, big-endian 32-bit integers, and single-byte
//! booleans (0 or 1 only).
//!
//! Interrupt handling: [`FrameReader::begin_message`] performs the one read
//! that may surface [`WireError::Interrupted`] - before any byte of the
//! message has been consumed. Every other primitive resumes transparently
//! after an interrupted syscall, so a signal cannot tear a message in half.

use std::io::{ErrorKind, Read, Write};

use crate::auth::{AuthToken, AUTH_TOKEN_LEN};
use crate::error::WireError;

/// Upper bound on string fields (scheme, host).
pub const MAX_STRING_LEN: usize = 4096;

/// Outcome of probing the channel for the next message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageStart {
    /// A message is present; its first byte is buffered for the next read.
    Data,
    /// The channel ended cleanly at the message boundary.
    EndOfStream,
}

/// Primitive reader over the control channel.
pub struct FrameReader<R> {
    inner: R,
    pending: Option<u8>,
}

impl<R: Read> FrameReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            pending: None,
        }
    }

    /// Probe for the start of the next message.
    ///
    /// Reads a single byte. Zero bytes at this point is the clean
    /// end-of-stream; an interrupted read surfaces as
    /// [`WireError::Interrupted`] with nothing consumed, so the caller can
    /// retry the same message.
    pub fn begin_message(&mut self) -> Result<MessageStart, WireError> {
        debug_assert!(self.pending.is_none(), "begin_message with a buffered byte");
        let mut byte = [0u8; 1];
        match self.inner.read(&mut byte) {
            Ok(0) => Ok(MessageStart::EndOfStream),
            Ok(_) => {
                self.pending = Some(byte[0]);
                Ok(MessageStart::Data)
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => Err(WireError::Interrupted),
            Err(e) => Err(e.into()),
        }
    }

    /// Read a single byte, resuming across interrupts.
    pub fn read_u8(&mut self, what: &'static str) -> Result<u8, WireError> {
        if let Some(b) = self.pending.take() {
            return Ok(b);
        }
        let mut byte = [0u8; 1];
        loop {
            match self.inner.read(&mut byte) {
                Ok(0) => return Err(WireError::Truncated { what }),
                Ok(_) => return Ok(byte[0]),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Fill `buf` completely or fail with [`WireError::Truncated`].
    pub fn read_exact(&mut self, buf: &mut [u8], what: &'static str) -> Result<(), WireError> {
        let mut filled = 0;
        if !buf.is_empty() {
            if let Some(b) = self.pending.take() {
                buf[0] = b;
                filled = 1;
            }
        }
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => return Err(WireError::Truncated { what }),
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Read a zero-terminated UTF-8 string, terminator excluded.
    pub fn read_utfz(&mut self, what: &'static str) -> Result<String, WireError> {
        let mut bytes = Vec::new();
        loop {
            let b = self.read_u8(what)?;
            if b == 0 {
                break;
            }
            if bytes.len() == MAX_STRING_LEN {
                return Err(WireError::StringTooLong {
                    what,
                    limit: MAX_STRING_LEN,
                });
            }
            bytes.push(b);
        }
        String::from_utf8(bytes).map_err(|_| WireError::InvalidUtf8 { what })
    }

    /// Read a big-endian 32-bit signed integer.
    pub fn read_i32(&mut self, what: &'static str) -> Result<i32, WireError> {
        let mut bytes = [0u8; 4];
        self.read_exact(&mut bytes, what)?;
        Ok(i32::from_be_bytes(bytes))
    }

    /// Read a big-endian 32-bit unsigned integer.
    pub fn read_u32(&mut self, what: &'static str) -> Result<u32, WireError> {
        let mut bytes = [0u8; 4];
        self.read_exact(&mut bytes, what)?;
        Ok(u32::from_be_bytes(bytes))
    }

    /// Read a single-byte boolean. Only 0 and 1 are valid.
    pub fn read_bool(&mut self, what: &'static str) -> Result<bool, WireError> {
        match self.read_u8(what)? {
            0 => Ok(false),
            1 => Ok(true),
            value => Err(WireError::InvalidBool { what, value }),
        }
    }

    /// Read a fixed-length authentication token.
    pub fn read_auth_token(&mut self, what: &'static str) -> Result<AuthToken, WireError> {
        let mut bytes = [0u8; AUTH_TOKEN_LEN];
        self.read_exact(&mut bytes, what)?;
        Ok(AuthToken::from_bytes(bytes))
    }
}

/// Primitive writer for the control channel: the orchestrator-side pair of
/// [`FrameReader`], also used by tests to compose protocol streams.
pub struct FrameWriter<W> {
    inner: W,
}

impl<W: Write> FrameWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    /// Write a string followed by the zero terminator.
    pub fn write_utfz(&mut self, value: &str, what: &'static str) -> Result<(), WireError> {
        if value.as_bytes().contains(&0) {
            return Err(WireError::StringContainsNul { what });
        }
        if value.len() > MAX_STRING_LEN {
            return Err(WireError::StringTooLong {
                what,
                limit: MAX_STRING_LEN,
            });
        }
        self.inner.write_all(value.as_bytes())?;
        self.inner.write_all(&[0])?;
        Ok(())
    }

    pub fn write_u8(&mut self, value: u8) -> Result<(), WireError> {
        self.inner.write_all(&[value])?;
        Ok(())
    }

    pub fn write_i32(&mut self, value: i32) -> Result<(), WireError> {
        self.inner.write_all(&value.to_be_bytes())?;
        Ok(())
    }

    pub fn write_u32(&mut self, value: u32) -> Result<(), WireError> {
        self.inner.write_all(&value.to_be_bytes())?;
        Ok(())
    }

    pub fn write_bool(&mut self, value: bool) -> Result<(), WireError> {
        self.write_u8(value as u8)
    }

    pub fn write_auth_token(&mut self, token: &AuthToken) -> Result<(), WireError> {
        self.inner.write_all(token.as_bytes())?;
        Ok(())
    }

    pub fn write_raw(&mut self, bytes: &[u8]) -> Result<(), WireError> {
        self.inner.write_all(bytes)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), WireError> {
        self.inner.flush()?;
        Ok(())
    }
}
