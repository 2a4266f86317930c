//! Error types for the worker with standardized reason codes.

use thiserror::Error;

use warden_networking::NetworkError;
use warden_runtime::{LookupError, StartError};
use warden_wire::WireError;

use crate::client::ClientError;

/// Worker errors across startup and the reconnect loop.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// The startup program envelope or payload did not decode.
    #[error("startup_decode_failed: {0}")]
    StartupDecode(#[from] WireError),

    /// The startup program named a service kind outside the worker's
    /// registry.
    #[error("unknown_service_kind: {0:?}")]
    UnknownServiceKind(String),

    /// A service spec carried configuration its kind cannot use.
    #[error("invalid_service_config: service {name:?}: {detail}")]
    InvalidServiceConfig { name: String, detail: String },

    /// The service runtime failed to start.
    #[error("startup_failed: {0}")]
    Startup(#[from] StartError),

    /// A reconnect message could not be parsed.
    #[error("malformed_command: {0}")]
    MalformedCommand(WireError),

    /// A reconnect message carried an unusable endpoint.
    #[error("invalid_endpoint: {0}")]
    InvalidEndpoint(#[from] NetworkError),

    /// A named service was missing or mistyped.
    #[error("service_lookup_failed: {0}")]
    ServiceLookup(#[from] LookupError),

    /// The controller client refused the rebind.
    #[error("reconnect_failed: {0}")]
    Reconnect(#[from] ClientError),
}

impl WorkerError {
    /// Get the standardized reason code for this error.
    pub fn reason_code(&self) -> &'static str {
        match self {
            WorkerError::StartupDecode(_) => "startup_decode_failed",
            WorkerError::UnknownServiceKind(_) => "unknown_service_kind",
            WorkerError::InvalidServiceConfig { .. } => "invalid_service_config",
            WorkerError::Startup(_) => "startup_failed",
            WorkerError::MalformedCommand(_) => "malformed_command",
            WorkerError::InvalidEndpoint(_) => "invalid_endpoint",
            WorkerError::ServiceLookup(_) => "service_lookup_failed",
            WorkerError::Reconnect(_) => "reconnect_failed",
        }
    }
}
