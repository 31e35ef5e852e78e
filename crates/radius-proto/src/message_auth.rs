//! Message-Authenticator Support (RFC 2869 / RFC 3579)
//!
//! Message-Authenticator provides integrity protection using HMAC-MD5.
//!
//! - Computed as HMAC-MD5(shared_secret, packet)
//! - Always 16 bytes (128 bits)
//! - Computed with the attribute's own value set to 16 zero bytes
//!
//! For an Access-Request the packet carries its Request Authenticator. For
//! Access-Accept/Reject/Challenge the HMAC is taken over the response with the
//! *Request* Authenticator in the header (RFC 3579 Section 3.2), because the
//! server computes it before it knows the Response Authenticator.

use crate::attributes::{Attribute, AttributeType};
use crate::packet::{Packet, PacketError};
use hmac::{Hmac, Mac};
use md5_digest::Md5;
use thiserror::Error;

type HmacMd5 = Hmac<Md5>;

/// Length of the Message-Authenticator value
pub const MESSAGE_AUTHENTICATOR_LENGTH: usize = 16;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MessageAuthError {
    #[error("Message-Authenticator attribute missing")]
    Missing,
    #[error("Message-Authenticator has {0} bytes, expected 16")]
    InvalidLength(usize),
    #[error("Message-Authenticator does not match")]
    Mismatch,
    #[error("Packet error: {0}")]
    Packet(#[from] PacketError),
}

/// Calculate Message-Authenticator for a RADIUS packet
///
/// # Arguments
/// * `packet_bytes` - The complete RADIUS packet bytes with Message-Authenticator set to zeros
/// * `secret` - The shared secret
///
/// # Returns
/// 16-byte HMAC-MD5 hash
pub fn calculate_message_authenticator(packet_bytes: &[u8], secret: &[u8]) -> [u8; 16] {
    let bytes = keyed_mac(packet_bytes, secret).finalize().into_bytes();

    let mut output = [0u8; 16];
    output.copy_from_slice(&bytes);
    output
}

/// Insert a Message-Authenticator into `packet` and return the final wire bytes.
///
/// An existing Message-Authenticator attribute is reused in place; otherwise
/// one is appended. The packet is encoded once with the value zeroed, the
/// HMAC is written into the attribute, and the packet is encoded again.
pub fn sign_packet(packet: &mut Packet, secret: &[u8]) -> Result<Vec<u8>, PacketError> {
    let zeroed = vec![0u8; MESSAGE_AUTHENTICATOR_LENGTH];
    match packet.find_attribute_mut(AttributeType::MessageAuthenticator.as_u8()) {
        Some(attr) => attr.value = zeroed,
        None => packet.add_attribute(Attribute::new(
            AttributeType::MessageAuthenticator.as_u8(),
            zeroed,
        )?),
    }

    let unsigned = packet.encode()?;
    let mac = calculate_message_authenticator(&unsigned, secret);

    if let Some(attr) = packet.find_attribute_mut(AttributeType::MessageAuthenticator.as_u8()) {
        attr.value = mac.to_vec();
    }

    packet.encode()
}

/// Verify the Message-Authenticator carried by `packet`.
///
/// Pass the matching request's authenticator when checking a response; pass
/// `None` to check a request against its own header.
///
/// The comparison is constant-time.
pub fn verify_packet_message_authenticator(
    packet: &Packet,
    request_authenticator: Option<&[u8; 16]>,
    secret: &[u8],
) -> Result<(), MessageAuthError> {
    let received = packet
        .find_attribute(AttributeType::MessageAuthenticator.as_u8())
        .ok_or(MessageAuthError::Missing)?;
    if received.value.len() != MESSAGE_AUTHENTICATOR_LENGTH {
        return Err(MessageAuthError::InvalidLength(received.value.len()));
    }

    let mut copy = packet.clone();
    if let Some(request_authenticator) = request_authenticator {
        copy.authenticator = *request_authenticator;
    }
    if let Some(attr) = copy.find_attribute_mut(AttributeType::MessageAuthenticator.as_u8()) {
        attr.value = vec![0u8; MESSAGE_AUTHENTICATOR_LENGTH];
    }

    let bytes = copy.encode()?;
    keyed_mac(&bytes, secret)
        .verify_slice(&received.value)
        .map_err(|_| MessageAuthError::Mismatch)
}

fn keyed_mac(data: &[u8], secret: &[u8]) -> HmacMd5 {
    let mut mac = HmacMd5::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(data);
    mac
}
