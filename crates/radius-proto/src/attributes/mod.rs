//! RADIUS attributes (RFC 2865 Section 5)

mod attribute;
mod types;

pub use attribute::Attribute;
pub use types::AttributeType;
