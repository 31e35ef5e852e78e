//! RADIUS packet framing (RFC 2865 Section 3)

mod code;
#[allow(clippy::module_inception)]
mod packet;

pub use code::Code;
pub use packet::{Packet, PacketError};
