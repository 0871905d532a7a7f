pub const OPCODE_OFFSET: usize = 0;
pub const HANDLE_RANGE: std::ops::Range<usize> = 1..3;
pub const HANDLE_VALUE_OFFSET: usize = 3;
pub const READ_RESPONSE_VALUE_OFFSET: usize = 1;

pub const OP_READ_RESPONSE: u8 = 0x0A;
pub const OP_WRITE_REQUEST: u8 = 0x12;
pub const OP_NOTIFICATION: u8 = 0x1B;
pub const OP_WRITE_COMMAND: u8 = 0x52;
