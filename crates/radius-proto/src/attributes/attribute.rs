use crate::packet::PacketError;
use std::net::Ipv4Addr;

/// RADIUS Attribute structure as defined in RFC 2865 Section 5
///
/// ```text
///  0                   1                   2
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |     Type      |    Length     |  Value ...
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Attribute type (1 byte)
    pub attr_type: u8,
    /// Attribute value (0-253 bytes)
    pub value: Vec<u8>,
}

impl Attribute {
    /// Minimum attribute length (type + length fields = 2 bytes)
    pub const MIN_LENGTH: usize = 2;
    /// Maximum attribute length (255 bytes including type and length)
    pub const MAX_LENGTH: usize = 255;
    /// Maximum value length (253 bytes)
    pub const MAX_VALUE_LENGTH: usize = 253;

    pub fn new(attr_type: u8, value: Vec<u8>) -> Result<Self, PacketError> {
        if value.len() > Self::MAX_VALUE_LENGTH {
            return Err(PacketError::AttributeTooLong {
                attr_type,
                length: value.len(),
                max: Self::MAX_VALUE_LENGTH,
            });
        }
        Ok(Attribute { attr_type, value })
    }

    /// Create a string attribute
    pub fn string(attr_type: u8, value: impl Into<String>) -> Result<Self, PacketError> {
        Self::new(attr_type, value.into().into_bytes())
    }

    /// Create an IPv4 address attribute
    pub fn ipv4(attr_type: u8, value: Ipv4Addr) -> Result<Self, PacketError> {
        Self::new(attr_type, value.octets().to_vec())
    }

    /// Append the wire form of this attribute to `buffer`
    pub fn encode_into(&self, buffer: &mut Vec<u8>) -> Result<(), PacketError> {
        let length = self.encoded_length();
        if length > Self::MAX_LENGTH {
            return Err(PacketError::AttributeTooLong {
                attr_type: self.attr_type,
                length: self.value.len(),
                max: Self::MAX_VALUE_LENGTH,
            });
        }

        buffer.push(self.attr_type);
        buffer.push(length as u8);
        buffer.extend_from_slice(&self.value);
        Ok(())
    }

    /// Encode attribute to bytes
    pub fn encode(&self) -> Result<Vec<u8>, PacketError> {
        let mut buffer = Vec::with_capacity(self.encoded_length());
        self.encode_into(&mut buffer)?;
        Ok(buffer)
    }

    /// Decode one attribute from the front of `data`.
    ///
    /// Trailing bytes after the attribute are left for the caller; use
    /// [`Attribute::encoded_length`] to advance past it.
    pub fn decode(data: &[u8]) -> Result<Self, PacketError> {
        if data.len() < Self::MIN_LENGTH {
            return Err(PacketError::MalformedAttribute(format!(
                "attribute header truncated: {} bytes left",
                data.len()
            )));
        }

        let attr_type = data[0];
        let length = data[1] as usize;

        if length < Self::MIN_LENGTH {
            return Err(PacketError::MalformedAttribute(format!(
                "attribute {} declares length {}",
                attr_type, length
            )));
        }

        if data.len() < length {
            return Err(PacketError::MalformedAttribute(format!(
                "attribute {} declares length {} but only {} bytes remain",
                attr_type,
                length,
                data.len()
            )));
        }

        Ok(Attribute {
            attr_type,
            value: data[Self::MIN_LENGTH..length].to_vec(),
        })
    }

    /// Get the encoded length of this attribute
    pub fn encoded_length(&self) -> usize {
        Self::MIN_LENGTH + self.value.len()
    }

    /// Try to interpret value as a string
    pub fn as_string(&self) -> Result<String, std::string::FromUtf8Error> {
        String::from_utf8(self.value.clone())
    }

    /// Try to interpret value as an IPv4 address
    pub fn as_ipv4(&self) -> Result<Ipv4Addr, PacketError> {
        let octets: [u8; 4] = self.value.as_slice().try_into().map_err(|_| {
            PacketError::MalformedAttribute(format!(
                "expected 4 bytes for IPv4, got {}",
                self.value.len()
            ))
        })?;
        Ok(Ipv4Addr::from(octets))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_attribute() {
        let attr = Attribute::string(1, "testuser").unwrap();
        assert_eq!(attr.attr_type, 1);
        assert_eq!(attr.as_string().unwrap(), "testuser");
    }

    #[test]
    fn test_ipv4_attribute() {
        let attr = Attribute::ipv4(4, Ipv4Addr::new(192, 0, 2, 1)).unwrap();
        assert_eq!(attr.value, vec![192, 0, 2, 1]);
        assert_eq!(attr.as_ipv4().unwrap(), Ipv4Addr::new(192, 0, 2, 1));
    }

    #[test]
    fn test_round_trip_every_value_length() {
        for len in 0..=Attribute::MAX_VALUE_LENGTH {
            let value: Vec<u8> = (0..len).map(|i| (i * 7 + 3) as u8).collect();
            let attr = Attribute::new(26, value.clone()).unwrap();
            let encoded = attr.encode().unwrap();
            assert_eq!(encoded[1] as usize, len + 2);

            let decoded = Attribute::decode(&encoded).unwrap();
            assert_eq!(decoded.attr_type, 26);
            assert_eq!(decoded.value, value);
        }
    }

    #[test]
    fn test_max_value_length() {
        let value = vec![0u8; 254];
        assert!(matches!(
            Attribute::new(1, value),
            Err(PacketError::AttributeTooLong { length: 254, .. })
        ));
    }

    #[test]
    fn test_decode_rejects_short_length_field() {
        assert!(matches!(
            Attribute::decode(&[1, 1, 0]),
            Err(PacketError::MalformedAttribute(_))
        ));
        assert!(matches!(
            Attribute::decode(&[1, 0]),
            Err(PacketError::MalformedAttribute(_))
        ));
    }

    #[test]
    fn test_decode_rejects_value_past_buffer() {
        // Declares 10 bytes, only 5 present
        let data = [1, 10, b'a', b'b', b'c'];
        assert!(matches!(
            Attribute::decode(&data),
            Err(PacketError::MalformedAttribute(_))
        ));
    }

    #[test]
    fn test_decode_truncated_header() {
        assert!(Attribute::decode(&[1]).is_err());
        assert!(Attribute::decode(&[]).is_err());
    }

    #[test]
    fn test_decode_leaves_trailing_bytes() {
        let data = [18, 4, b'o', b'k', 1, 2, b'x'];
        let attr = Attribute::decode(&data).unwrap();
        assert_eq!(attr.value, b"ok");
        assert_eq!(attr.encoded_length(), 4);
    }

    #[test]
    fn test_as_ipv4_wrong_length() {
        let attr = Attribute::new(4, vec![10, 0, 0]).unwrap();
        assert!(attr.as_ipv4().is_err());
    }
}
