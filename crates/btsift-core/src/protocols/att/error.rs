use thiserror::Error;

use crate::protocols::common::TooShort;

/// Errors returned by ATT PDU decoding.
///
/// # Examples
/// ```
/// use btsift_core::protocols::att::error::AttError;
///
/// let err = AttError::UnrecognizedOpcode { opcode: 0x01 };
/// assert!(err.to_string().contains("0x01"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttError {
    #[error(transparent)]
    TooShort(#[from] TooShort),
    #[error("unrecognized ATT opcode 0x{opcode:02x}")]
    UnrecognizedOpcode { opcode: u8 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown ATT opcode '{0}' (expected write-command, write-request, notification, read-response or a hex code)")]
pub struct ParseOpcodeError(pub String);
