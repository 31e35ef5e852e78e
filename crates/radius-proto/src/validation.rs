//! Response validation for an outstanding Access-Request
//!
//! A datagram is accepted as the answer to a request only if every check
//! passes, in this order:
//!
//! 1. it decodes as a RADIUS packet whose length field matches the datagram
//! 2. its Identifier equals the request's
//! 3. its Code is Access-Accept, Access-Reject or Access-Challenge
//! 4. its Response Authenticator is MD5(Code + ID + Length + Request
//!    Authenticator + Attributes + Secret)
//! 5. its Message-Authenticator verifies (RFC 3579 Section 3.2)
//!
//! ## Validation Modes
//!
//! - **Strict Mode** (default): a response without Message-Authenticator is
//!   rejected.
//! - **Lenient Mode**: Message-Authenticator is verified when present and
//!   ignored when absent, for servers that predate RFC 3579.

use crate::attributes::AttributeType;
use crate::auth::{calculate_response_authenticator, verify_response_authenticator};
use crate::message_auth::{sign_packet, verify_packet_message_authenticator, MessageAuthError};
use crate::packet::{Code, Packet, PacketError};
use thiserror::Error;

/// Validation mode for responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
    /// Message-Authenticator checked only if the server sent one.
    Lenient,
    /// Message-Authenticator must be present and valid.
    #[default]
    Strict,
}

/// Reasons a datagram is not an authentic answer to the request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Undecodable response: {0}")]
    Decode(#[from] PacketError),
    #[error("Identifier mismatch: expected {expected}, got {received}")]
    IdentifierMismatch { expected: u8, received: u8 },
    #[error("Unexpected response code {0}")]
    UnexpectedCode(Code),
    #[error("Response Authenticator does not match")]
    BadAuthenticator,
    #[error("Message-Authenticator invalid: {0}")]
    MessageAuthenticatorInvalid(MessageAuthError),
}

/// Decode `data` and check it is an authentic response to `request`.
pub fn validate_response(
    data: &[u8],
    request: &Packet,
    secret: &[u8],
    mode: ValidationMode,
) -> Result<Packet, ValidationError> {
    let response = Packet::decode(data)?;

    if response.identifier != request.identifier {
        return Err(ValidationError::IdentifierMismatch {
            expected: request.identifier,
            received: response.identifier,
        });
    }

    if !response.code.is_access_response() {
        return Err(ValidationError::UnexpectedCode(response.code));
    }

    if !verify_response_authenticator(&response, &request.authenticator, secret) {
        return Err(ValidationError::BadAuthenticator);
    }

    let has_message_auth = response
        .find_attribute(AttributeType::MessageAuthenticator.as_u8())
        .is_some();
    if has_message_auth || mode == ValidationMode::Strict {
        verify_packet_message_authenticator(&response, Some(&request.authenticator), secret)
            .map_err(ValidationError::MessageAuthenticatorInvalid)?;
    }

    Ok(response)
}

/// Finish a response the way a server does: Message-Authenticator over the
/// packet carrying the request authenticator, then the Response Authenticator.
pub fn sign_response(
    response: &mut Packet,
    request_authenticator: &[u8; 16],
    secret: &[u8],
) -> Result<Vec<u8>, PacketError> {
    response.authenticator = *request_authenticator;
    sign_packet(response, secret)?;
    response.authenticator =
        calculate_response_authenticator(response, request_authenticator, secret)?;
    response.encode()
}
