//! RADIUS Protocol Implementation for authentication probes
//!
//! This crate implements the client half of RFC 2865 authentication, plus
//! the RFC 2869/3579 Message-Authenticator.
//!
//! # Features
//!
//! - Packet encoding and decoding with strict length checks
//! - Type-length-value attribute codec
//! - MD5-based User-Password hiding
//! - Request/Response Authenticator calculation
//! - HMAC-MD5 Message-Authenticator signing and constant-time verification
//! - Response validation against an outstanding request
//!
//! # Example
//!
//! ```rust
//! use radius_proto::{Packet, Code, Attribute, AttributeType};
//! use radius_proto::auth::{generate_request_authenticator, encrypt_user_password};
//! use radius_proto::message_auth::sign_packet;
//!
//! // Create an Access-Request packet
//! let req_auth = generate_request_authenticator();
//! let mut packet = Packet::new(Code::AccessRequest, 1, req_auth);
//!
//! // Add User-Name attribute
//! packet.add_attribute(
//!     Attribute::string(AttributeType::UserName as u8, "alice").unwrap()
//! );
//!
//! // Add encrypted User-Password
//! let encrypted_pwd = encrypt_user_password(b"password", b"secret", &req_auth).unwrap();
//! packet.add_attribute(
//!     Attribute::new(AttributeType::UserPassword as u8, encrypted_pwd).unwrap()
//! );
//!
//! // Sign and encode to bytes
//! let bytes = sign_packet(&mut packet, b"secret").unwrap();
//! assert_eq!(bytes.len(), packet.length());
//! ```

pub mod attributes;
pub mod auth;
pub mod message_auth;
pub mod packet;
pub mod validation;

pub use attributes::{Attribute, AttributeType};
pub use auth::{
    calculate_response_authenticator, decrypt_user_password, encrypt_user_password,
    generate_request_authenticator, verify_response_authenticator,
};
pub use message_auth::{
    calculate_message_authenticator, sign_packet, verify_packet_message_authenticator,
    MessageAuthError,
};
pub use packet::{Code, Packet, PacketError};
pub use validation::{sign_response, validate_response, ValidationError, ValidationMode};
