pub const H4_COMMAND: u8 = 0x01;
pub const H4_ACL_DATA: u8 = 0x02;
pub const H4_SCO_DATA: u8 = 0x03;
pub const H4_EVENT: u8 = 0x04;
pub const H4_ISO_DATA: u8 = 0x05;

// Offsets below are relative to the byte after the H4 packet type.
pub const ACL_HANDLE_FLAGS_RANGE: std::ops::Range<usize> = 0..2;
pub const ACL_DATA_LENGTH_RANGE: std::ops::Range<usize> = 2..4;
pub const ACL_HEADER_LEN: usize = 4;

pub const ACL_HANDLE_MASK: u16 = 0x0FFF;
pub const ACL_PB_FLAG_SHIFT: u16 = 12;
pub const ACL_BC_FLAG_SHIFT: u16 = 14;
pub const ACL_FLAG_MASK: u16 = 0x3;
