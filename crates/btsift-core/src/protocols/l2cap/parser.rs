use super::error::L2capError;
use super::layout;
use crate::protocols::common::ByteReader;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct L2capFrame<'a> {
    pub length: u16,
    pub channel_id: u16,
    pub payload: &'a [u8],
}

/// Split the basic L2CAP header from its payload.
///
/// Channel routing is left to the caller; every channel decodes.
pub fn parse_l2cap(data: &[u8]) -> Result<L2capFrame<'_>, L2capError> {
    let reader = ByteReader::new(data);
    reader.require_len(layout::HEADER_LEN)?;

    let length = reader.read_u16_le(layout::LENGTH_RANGE)?;
    let channel_id = reader.read_u16_le(layout::CHANNEL_ID_RANGE)?;
    let payload = reader.rest(layout::HEADER_LEN)?;

    Ok(L2capFrame {
        length,
        channel_id,
        payload,
    })
}

/// Short name for well-known fixed channels.
pub fn channel_name(channel_id: u16) -> Option<&'static str> {
    match channel_id {
        layout::CID_SIGNALING => Some("signaling"),
        layout::CID_ATT => Some("att"),
        layout::CID_LE_SIGNALING => Some("le-signaling"),
        layout::CID_SMP => Some("smp"),
        _ => None,
    }
}
