//! Base64 channel adapter.
//!
//! Some orchestrators share the worker's stdin with console plumbing and
//! deliver the control channel base64-encoded. This adapter decodes the
//! stream before framing; the worker selects it via configuration.

use std::io::Read;

use base64::engine::general_purpose::STANDARD;
use base64::engine::GeneralPurpose;
use base64::read::DecoderReader;

/// A control channel arriving base64-encoded.
pub type Base64Decoder<R> = DecoderReader<'static, GeneralPurpose, R>;

/// Wrap an encoded channel in a decoding reader.
pub fn base64_decoder<R: Read>(inner: R) -> Base64Decoder<R> {
    DecoderReader::new(inner, &STANDARD)
}
