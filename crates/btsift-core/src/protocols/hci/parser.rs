use serde::{Deserialize, Serialize};

use super::error::HciError;
use super::layout;
use crate::protocols::common::ByteReader;

/// H4 packet type carried in the first byte of every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Command,
    AclData,
    ScoData,
    Event,
    IsoData,
    Unknown(u8),
}

impl TransportKind {
    pub fn from_tag(tag: u8) -> Self {
        match tag {
            layout::H4_COMMAND => Self::Command,
            layout::H4_ACL_DATA => Self::AclData,
            layout::H4_SCO_DATA => Self::ScoData,
            layout::H4_EVENT => Self::Event,
            layout::H4_ISO_DATA => Self::IsoData,
            other => Self::Unknown(other),
        }
    }

    pub fn tag(self) -> u8 {
        match self {
            Self::Command => layout::H4_COMMAND,
            Self::AclData => layout::H4_ACL_DATA,
            Self::ScoData => layout::H4_SCO_DATA,
            Self::Event => layout::H4_EVENT,
            Self::IsoData => layout::H4_ISO_DATA,
            Self::Unknown(tag) => tag,
        }
    }
}

/// Result of looking at a frame's transport tag.
#[derive(Debug, PartialEq, Eq)]
pub enum LinkFrame<'a> {
    Empty,
    /// ACL data; the slice starts right after the tag byte.
    Acl(&'a [u8]),
    Other(TransportKind),
}

pub fn classify_frame(frame: &[u8]) -> LinkFrame<'_> {
    let Some((&tag, rest)) = frame.split_first() else {
        return LinkFrame::Empty;
    };
    match TransportKind::from_tag(tag) {
        TransportKind::AclData => LinkFrame::Acl(rest),
        other => LinkFrame::Other(other),
    }
}

/// How the ACL `data_length` field bounds the L2CAP payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AclLengthPolicy {
    /// Keep every byte after the header; the declared length is only
    /// reported.
    #[default]
    PassThrough,
    /// Cut the payload to the declared length and reject frames that carry
    /// fewer bytes than declared.
    Clip,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AclPacket<'a> {
    pub handle: u16,
    pub packet_boundary: u8,
    pub broadcast: u8,
    pub declared_length: u16,
    pub payload: &'a [u8],
}

/// Decode the 4-byte ACL header that follows the H4 tag.
pub fn parse_acl(data: &[u8], policy: AclLengthPolicy) -> Result<AclPacket<'_>, HciError> {
    let reader = ByteReader::new(data);
    reader.require_len(layout::ACL_HEADER_LEN)?;

    let handle_flags = reader.read_u16_le(layout::ACL_HANDLE_FLAGS_RANGE)?;
    let declared_length = reader.read_u16_le(layout::ACL_DATA_LENGTH_RANGE)?;
    let rest = reader.rest(layout::ACL_HEADER_LEN)?;

    let payload = match policy {
        AclLengthPolicy::PassThrough => rest,
        AclLengthPolicy::Clip => {
            rest.get(..declared_length as usize)
                .ok_or(HciError::DeclaredLengthExceeded {
                    declared: declared_length,
                    available: rest.len(),
                })?
        }
    };

    Ok(AclPacket {
        handle: handle_flags & layout::ACL_HANDLE_MASK,
        packet_boundary: ((handle_flags >> layout::ACL_PB_FLAG_SHIFT) & layout::ACL_FLAG_MASK)
            as u8,
        broadcast: ((handle_flags >> layout::ACL_BC_FLAG_SHIFT) & layout::ACL_FLAG_MASK) as u8,
        declared_length,
        payload,
    })
}
