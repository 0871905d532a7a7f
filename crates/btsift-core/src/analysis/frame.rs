use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::DecoderConfig;
use crate::protocols::TooShort;
use crate::protocols::att::{AttOpcode, error::AttError, parse_att_pdu};
use crate::protocols::hci::{LinkFrame, classify_frame, error::HciError, parse_acl};
use crate::protocols::l2cap::{channel_name, parse_l2cap};
use crate::source::{Direction, FrameRecord};

/// One decoded ATT operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttEvent {
    pub frame_index: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    pub direction: Direction,
    /// ACL connection handle (12 bits).
    pub connection_handle: u16,
    pub opcode: AttOpcode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle: Option<u16>,
    /// Raw (still obfuscated) attribute value.
    #[serde(with = "hex::serde")]
    pub value: Vec<u8>,
}

/// Why a frame produced no event. None of these stop the capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("empty frame")]
    EmptyFrame,
    #[error("unsupported transport type 0x{tag:02x}")]
    UnsupportedTransport { tag: u8 },
    #[error("ACL header too short: need {needed} bytes, got {actual}")]
    ShortAcl { needed: usize, actual: usize },
    #[error("ACL header declares {declared} bytes but only {available} follow")]
    AclLengthMismatch { declared: u16, available: usize },
    #[error("L2CAP header too short: need {needed} bytes, got {actual}")]
    ShortL2cap { needed: usize, actual: usize },
    #[error(
        "not attribute protocol traffic (channel 0x{channel_id:04x}, {})",
        channel_label(.channel_id)
    )]
    UnsupportedChannel { channel_id: u16 },
    #[error("ATT PDU too short: need {needed} bytes, got {actual}")]
    ShortAtt { needed: usize, actual: usize },
    #[error("unrecognized ATT opcode 0x{opcode:02x}")]
    UnrecognizedOpcode { opcode: u8 },
}

fn channel_label(channel_id: &u16) -> &'static str {
    channel_name(*channel_id).unwrap_or("dynamic")
}

/// Coarse grouping of skip reasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipKind {
    Empty,
    Unsupported,
    Short,
}

impl SkipReason {
    pub fn kind(&self) -> SkipKind {
        match self {
            Self::EmptyFrame => SkipKind::Empty,
            Self::UnsupportedTransport { .. }
            | Self::UnsupportedChannel { .. }
            | Self::UnrecognizedOpcode { .. } => SkipKind::Unsupported,
            Self::ShortAcl { .. }
            | Self::AclLengthMismatch { .. }
            | Self::ShortL2cap { .. }
            | Self::ShortAtt { .. } => SkipKind::Short,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    Decoded(AttEvent),
    Skipped(SkipReason),
}

/// Run one record through H4 → ACL → L2CAP → ATT.
///
/// Never fails: every unmet precondition becomes a `SkipReason`.
pub fn decode_frame(record: &FrameRecord, config: &DecoderConfig) -> FrameOutcome {
    match decode_layers(record, config) {
        Ok(event) => FrameOutcome::Decoded(event),
        Err(reason) => FrameOutcome::Skipped(reason),
    }
}

fn decode_layers(record: &FrameRecord, config: &DecoderConfig) -> Result<AttEvent, SkipReason> {
    let acl_data = match classify_frame(&record.data) {
        LinkFrame::Empty => return Err(SkipReason::EmptyFrame),
        LinkFrame::Other(kind) => return Err(SkipReason::UnsupportedTransport { tag: kind.tag() }),
        LinkFrame::Acl(data) => data,
    };

    let acl = parse_acl(acl_data, config.acl_length).map_err(|err| match err {
        // Sizes include the H4 tag byte so they read as whole-frame counts.
        HciError::TooShort(TooShort { needed, actual }) => SkipReason::ShortAcl {
            needed: needed + 1,
            actual: actual + 1,
        },
        HciError::DeclaredLengthExceeded {
            declared,
            available,
        } => SkipReason::AclLengthMismatch {
            declared,
            available,
        },
    })?;

    let l2cap = parse_l2cap(acl.payload).map_err(|err| match err {
        crate::protocols::l2cap::error::L2capError::TooShort(TooShort { needed, actual }) => {
            SkipReason::ShortL2cap { needed, actual }
        }
    })?;
    if l2cap.channel_id != config.att_channel {
        return Err(SkipReason::UnsupportedChannel {
            channel_id: l2cap.channel_id,
        });
    }

    let pdu = parse_att_pdu(l2cap.payload).map_err(|err| match err {
        AttError::TooShort(TooShort { needed, actual }) => SkipReason::ShortAtt { needed, actual },
        AttError::UnrecognizedOpcode { opcode } => SkipReason::UnrecognizedOpcode { opcode },
    })?;

    Ok(AttEvent {
        frame_index: record.index,
        timestamp: record.header.timestamp_rfc3339(),
        direction: record.header.direction(),
        connection_handle: acl.handle,
        opcode: pdu.opcode,
        handle: pdu.handle,
        value: pdu.value.to_vec(),
    })
}
