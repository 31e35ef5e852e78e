use crate::attributes::AttributeType;
use crate::packet::{Packet, PacketError};
use rand::RngCore;

/// Longest User-Password plaintext RFC 2865 Section 5.2 allows
pub const MAX_PASSWORD_LENGTH: usize = 128;

const BLOCK_SIZE: usize = 16;

/// Generate a random Request Authenticator (16 bytes) per RFC 2865 Section 3
///
/// Draws from the thread-local CSPRNG, which is seeded from the OS.
pub fn generate_request_authenticator() -> [u8; 16] {
    let mut authenticator = [0u8; 16];
    rand::rng().fill_bytes(&mut authenticator);
    authenticator
}

/// Calculate Response Authenticator per RFC 2865 Section 3
///
/// Response Authenticator = MD5(Code + ID + Length + Request Authenticator + Attributes + Secret)
///
/// This is used for Access-Accept, Access-Reject, and Access-Challenge packets.
pub fn calculate_response_authenticator(
    packet: &Packet,
    request_authenticator: &[u8; 16],
    secret: &[u8],
) -> Result<[u8; 16], PacketError> {
    let mut data = Vec::with_capacity(packet.length() + secret.len());

    data.push(packet.code.as_u8());
    data.push(packet.identifier);
    data.extend_from_slice(&(packet.length() as u16).to_be_bytes());
    data.extend_from_slice(request_authenticator);

    for attr in &packet.attributes {
        attr.encode_into(&mut data)?;
    }

    data.extend_from_slice(secret);

    Ok(md5::compute(&data).0)
}

/// Verify Response Authenticator
///
/// Verifies that the Response Authenticator matches the expected value
/// calculated from the request and secret. The comparison is constant-time.
pub fn verify_response_authenticator(
    response: &Packet,
    request_authenticator: &[u8; 16],
    secret: &[u8],
) -> bool {
    match calculate_response_authenticator(response, request_authenticator, secret) {
        Ok(calculated) => constant_time_eq(&response.authenticator, &calculated),
        Err(_) => false,
    }
}

fn constant_time_eq(a: &[u8; 16], b: &[u8; 16]) -> bool {
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Encrypt User-Password attribute per RFC 2865 Section 5.2
///
/// The password is first padded to a multiple of 16 bytes, then XORed with
/// MD5(secret + request_authenticator) for the first 16 bytes, and
/// MD5(secret + previous_block) for subsequent blocks.
pub fn encrypt_user_password(
    password: &[u8],
    secret: &[u8],
    authenticator: &[u8; 16],
) -> Result<Vec<u8>, PacketError> {
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(PacketError::AttributeTooLong {
            attr_type: AttributeType::UserPassword.as_u8(),
            length: password.len(),
            max: MAX_PASSWORD_LENGTH,
        });
    }

    // An empty password still occupies one block
    let padded_len = password.len().div_ceil(BLOCK_SIZE).max(1) * BLOCK_SIZE;
    let mut padded = password.to_vec();
    padded.resize(padded_len, 0);

    let mut result = Vec::with_capacity(padded_len);
    let mut previous_block: [u8; 16] = *authenticator;

    for chunk in padded.chunks(BLOCK_SIZE) {
        let mask = block_mask(secret, &previous_block);
        for (i, byte) in chunk.iter().enumerate() {
            previous_block[i] = byte ^ mask[i];
        }
        result.extend_from_slice(&previous_block);
    }

    Ok(result)
}

/// Decrypt User-Password attribute per RFC 2865 Section 5.2
///
/// Trailing zero padding is stripped from the result. Padding and password
/// bytes are indistinguishable, so a password that itself ends in `0x00`
/// comes back without those bytes.
pub fn decrypt_user_password(
    encrypted: &[u8],
    secret: &[u8],
    authenticator: &[u8; 16],
) -> Result<Vec<u8>, PacketError> {
    if encrypted.is_empty()
        || encrypted.len() % BLOCK_SIZE != 0
        || encrypted.len() > MAX_PASSWORD_LENGTH
    {
        return Err(PacketError::MalformedAttribute(format!(
            "User-Password ciphertext of {} bytes",
            encrypted.len()
        )));
    }

    let mut result = Vec::with_capacity(encrypted.len());
    let mut previous_block: &[u8] = authenticator;

    for chunk in encrypted.chunks(BLOCK_SIZE) {
        let mask = block_mask(secret, previous_block);
        result.extend(chunk.iter().zip(mask.iter()).map(|(c, m)| c ^ m));
        previous_block = chunk;
    }

    while result.last() == Some(&0) {
        result.pop();
    }

    Ok(result)
}

fn block_mask(secret: &[u8], previous_block: &[u8]) -> [u8; 16] {
    let mut context = md5::Context::new();
    context.consume(secret);
    context.consume(previous_block);
    context.compute().0
}
