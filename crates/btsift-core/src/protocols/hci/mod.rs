//! HCI transport framing (H4) and the ACL data header.
//!
//! The classifier looks only at the H4 packet-type byte; commands, events,
//! SCO and ISO frames are named but not decoded further. ACL decoding splits
//! the 12-bit connection handle from the packet-boundary and broadcast flags
//! and exposes the declared data length. Whether that length bounds the
//! L2CAP payload is an explicit `AclLengthPolicy` choice.

pub mod error;
pub mod layout;
pub mod parser;

pub use parser::{AclLengthPolicy, AclPacket, LinkFrame, TransportKind, classify_frame, parse_acl};
