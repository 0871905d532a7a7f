use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::{AttError, ParseOpcodeError};
use super::layout;
use crate::protocols::common::ByteReader;

/// The ATT operations this decoder extracts values from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AttOpcode {
    WriteCommand,
    WriteRequest,
    Notification,
    ReadResponse,
}

impl AttOpcode {
    pub const ALL: [AttOpcode; 4] = [
        AttOpcode::WriteCommand,
        AttOpcode::WriteRequest,
        AttOpcode::Notification,
        AttOpcode::ReadResponse,
    ];

    pub fn code(self) -> u8 {
        match self {
            Self::WriteCommand => layout::OP_WRITE_COMMAND,
            Self::WriteRequest => layout::OP_WRITE_REQUEST,
            Self::Notification => layout::OP_NOTIFICATION,
            Self::ReadResponse => layout::OP_READ_RESPONSE,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::WriteCommand => "write-command",
            Self::WriteRequest => "write-request",
            Self::Notification => "notification",
            Self::ReadResponse => "read-response",
        }
    }

    /// Whether bytes 1..3 of the PDU hold an attribute handle.
    pub fn carries_handle(self) -> bool {
        !matches!(self, Self::ReadResponse)
    }

    fn value_offset(self) -> usize {
        if self.carries_handle() {
            layout::HANDLE_VALUE_OFFSET
        } else {
            layout::READ_RESPONSE_VALUE_OFFSET
        }
    }
}

impl TryFrom<u8> for AttOpcode {
    type Error = AttError;

    fn try_from(opcode: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|op| op.code() == opcode)
            .ok_or(AttError::UnrecognizedOpcode { opcode })
    }
}

impl FromStr for AttOpcode {
    type Err = ParseOpcodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(opcode) = Self::ALL
            .iter()
            .copied()
            .find(|op| op.name().eq_ignore_ascii_case(trimmed))
        {
            return Ok(opcode);
        }
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        u8::from_str_radix(digits, 16)
            .ok()
            .and_then(|code| Self::try_from(code).ok())
            .ok_or_else(|| ParseOpcodeError(s.to_string()))
    }
}

impl std::fmt::Display for AttOpcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttPdu<'a> {
    pub opcode: AttOpcode,
    pub handle: Option<u16>,
    pub value: &'a [u8],
}

/// Decode an ATT PDU carried on the attribute channel.
///
/// # Errors
/// `TooShort` for an empty PDU or a handle-bearing PDU under 3 bytes;
/// `UnrecognizedOpcode` for anything outside the four supported operations.
pub fn parse_att_pdu(data: &[u8]) -> Result<AttPdu<'_>, AttError> {
    let reader = ByteReader::new(data);
    let opcode = AttOpcode::try_from(reader.read_u8(layout::OPCODE_OFFSET)?)?;

    let handle = if opcode.carries_handle() {
        reader.require_len(layout::HANDLE_RANGE.end)?;
        Some(reader.read_u16_le(layout::HANDLE_RANGE)?)
    } else {
        None
    };
    let value = reader.rest(opcode.value_offset())?;

    Ok(AttPdu {
        opcode,
        handle,
        value,
    })
}
