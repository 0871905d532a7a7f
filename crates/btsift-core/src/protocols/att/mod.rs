//! Attribute protocol (ATT) PDU decoding.
//!
//! Only the four value-carrying operations seen in device traffic are
//! decoded: write-command (0x52), write-request (0x12), notification (0x1B)
//! and read-response (0x0A). The first three carry a little-endian
//! attribute handle before the value; read-response carries the value
//! directly after the opcode. Every other opcode is reported as
//! unrecognized so callers can count and skip it.

pub mod error;
pub mod layout;
pub mod parser;

pub use parser::{AttOpcode, AttPdu, parse_att_pdu};
