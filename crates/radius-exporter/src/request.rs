//! Access-Request construction
//!
//! The request is built and signed once per probe; the resulting bytes are
//! what every (re)transmission sends.

use crate::config::Module;
use crate::error::ProbeResult;
use radius_proto::auth::{encrypt_user_password, generate_request_authenticator};
use radius_proto::message_auth::{sign_packet, MESSAGE_AUTHENTICATOR_LENGTH};
use radius_proto::{Attribute, AttributeType, Code, Packet};

/// A finished Access-Request and its wire form
#[derive(Debug, Clone)]
pub struct SignedRequest {
    pub packet: Packet,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Copy)]
enum AuthenticatorSource {
    Random,
    Fixed([u8; 16]),
}

/// Builds the Access-Request for a module
pub struct RequestBuilder<'a> {
    module: &'a Module,
    authenticator: AuthenticatorSource,
    identifier: Option<u8>,
}

impl<'a> RequestBuilder<'a> {
    /// Request Authenticator from the CSPRNG and a random Identifier
    pub fn new(module: &'a Module) -> Self {
        RequestBuilder {
            module,
            authenticator: AuthenticatorSource::Random,
            identifier: None,
        }
    }

    /// Test-mode constructor with a caller-chosen Request Authenticator.
    ///
    /// A predictable authenticator weakens User-Password hiding and lets
    /// responses be replayed; only fixtures should use this.
    pub fn with_fixed_authenticator(module: &'a Module, authenticator: [u8; 16]) -> Self {
        RequestBuilder {
            module,
            authenticator: AuthenticatorSource::Fixed(authenticator),
            identifier: None,
        }
    }

    pub fn identifier(mut self, identifier: u8) -> Self {
        self.identifier = Some(identifier);
        self
    }

    /// Assemble, encrypt the password, and sign the request
    pub fn build(self) -> ProbeResult<SignedRequest> {
        let module = self.module;
        let authenticator = match self.authenticator {
            AuthenticatorSource::Random => generate_request_authenticator(),
            AuthenticatorSource::Fixed(value) => value,
        };
        let identifier = self.identifier.unwrap_or_else(rand::random);

        let mut packet = Packet::new(Code::AccessRequest, identifier, authenticator);

        packet.add_attribute(Attribute::new(
            AttributeType::MessageAuthenticator.as_u8(),
            vec![0u8; MESSAGE_AUTHENTICATOR_LENGTH],
        )?);
        packet.add_attribute(Attribute::string(
            AttributeType::UserName.as_u8(),
            module.username.as_str(),
        )?);

        let hidden = encrypt_user_password(module.password.as_bytes(), &module.secret, &authenticator)?;
        packet.add_attribute(Attribute::new(AttributeType::UserPassword.as_u8(), hidden)?);

        if let Some(nas_id) = &module.nas_identifier {
            packet.add_attribute(Attribute::string(
                AttributeType::NasIdentifier.as_u8(),
                nas_id.as_str(),
            )?);
        }
        if let Some(nas_ip) = module.nas_ip_address {
            packet.add_attribute(Attribute::ipv4(AttributeType::NasIpAddress.as_u8(), nas_ip)?);
        }

        let bytes = sign_packet(&mut packet, &module.secret)?;

        Ok(SignedRequest { packet, bytes })
    }
}

/// Build and sign a fresh Access-Request for `module`
pub fn build_access_request(module: &Module) -> ProbeResult<SignedRequest> {
    RequestBuilder::new(module).build()
}
