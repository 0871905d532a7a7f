pub const LENGTH_RANGE: std::ops::Range<usize> = 0..2;
pub const CHANNEL_ID_RANGE: std::ops::Range<usize> = 2..4;
pub const HEADER_LEN: usize = 4;

pub const CID_SIGNALING: u16 = 0x0001;
pub const CID_ATT: u16 = 0x0004;
pub const CID_LE_SIGNALING: u16 = 0x0005;
pub const CID_SMP: u16 = 0x0006;
