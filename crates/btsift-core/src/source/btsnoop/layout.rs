pub const BTSNOOP_MAGIC: &[u8; 8] = b"btsnoop\0";

pub const FILE_HEADER_LEN: usize = 16;
pub const MAGIC_RANGE: std::ops::Range<usize> = 0..8;
pub const VERSION_RANGE: std::ops::Range<usize> = 8..12;
pub const DATALINK_RANGE: std::ops::Range<usize> = 12..16;

pub const RECORD_HEADER_LEN: usize = 24;
pub const ORIGINAL_LENGTH_RANGE: std::ops::Range<usize> = 0..4;
pub const INCLUDED_LENGTH_RANGE: std::ops::Range<usize> = 4..8;
pub const FLAGS_RANGE: std::ops::Range<usize> = 8..12;
pub const DROPS_RANGE: std::ops::Range<usize> = 12..16;
pub const TIMESTAMP_RANGE: std::ops::Range<usize> = 16..24;

pub const FLAG_DIRECTION_RECEIVED: u32 = 0x01;
pub const FLAG_COMMAND_OR_EVENT: u32 = 0x02;

/// Microseconds between 0000-01-01T00:00:00Z and the Unix epoch.
pub const EPOCH_DELTA_US: u64 = 0x00DC_DDB3_0F2F_8000;

pub const DATALINK_H4: u32 = 1002;
