//! Probe error types

use radius_proto::{PacketError, ValidationError};
use thiserror::Error;

/// Everything that can stop a probe from producing a response code
#[derive(Error, Debug)]
pub enum ProbeError {
    /// Missing or invalid module settings or target; nothing was sent
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The request could not be encoded; nothing was sent
    #[error("Encode error: {0}")]
    Encode(#[from] PacketError),

    /// No valid response before the retry budget or deadline ran out
    #[error("Request timeout after {attempts} transmission(s)")]
    Timeout { attempts: u32 },

    /// More invalid datagrams arrived than the module tolerates
    #[error("Too many malformed responses: {count} (last: {last})")]
    TooManyMalformedResponses { count: u32, last: ValidationError },

    /// A single datagram failed validation
    #[error("Protocol error: {0}")]
    Protocol(#[from] ValidationError),

    /// Local socket failure
    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),
}

impl ProbeError {
    /// Short label used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            ProbeError::Configuration(_) => "configuration",
            ProbeError::Encode(_) => "encode",
            ProbeError::Timeout { .. } => "timeout",
            ProbeError::TooManyMalformedResponses { .. } => "too_many_malformed_responses",
            ProbeError::Protocol(_) => "protocol",
            ProbeError::Transport(_) => "transport",
        }
    }
}

/// Result type for probe operations
pub type ProbeResult<T> = Result<T, ProbeError>;
