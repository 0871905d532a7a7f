//! L2CAP basic-frame header decoding.

pub mod error;
pub mod layout;
pub mod parser;

pub use parser::{L2capFrame, channel_name, parse_l2cap};
