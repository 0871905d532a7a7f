#![allow(dead_code)]

/// Microseconds between year 0 and the Unix epoch in btsnoop timestamps.
pub const EPOCH_DELTA_US: u64 = 0x00DC_DDB3_0F2F_8000;

pub struct Record {
    pub flags: u32,
    pub timestamp: u64,
    pub data: Vec<u8>,
}

/// Writes btsnoop bytes the way Android's snoop logger does.
#[derive(Default)]
pub struct CaptureBuilder {
    records: Vec<Record>,
}

impl CaptureBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(mut self, flags: u32, data: Vec<u8>) -> Self {
        let timestamp = EPOCH_DELTA_US + 1_000_000 * (self.records.len() as u64 + 1);
        self.records.push(Record {
            flags,
            timestamp,
            data,
        });
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut bytes = b"btsnoop\0".to_vec();
        bytes.extend_from_slice(&1u32.to_be_bytes());
        bytes.extend_from_slice(&1002u32.to_be_bytes());
        for record in &self.records {
            let len = record.data.len() as u32;
            bytes.extend_from_slice(&len.to_be_bytes());
            bytes.extend_from_slice(&len.to_be_bytes());
            bytes.extend_from_slice(&record.flags.to_be_bytes());
            bytes.extend_from_slice(&0u32.to_be_bytes());
            bytes.extend_from_slice(&record.timestamp.to_be_bytes());
            bytes.extend_from_slice(&record.data);
        }
        bytes
    }
}

/// H4 ACL frame carrying `att` on L2CAP channel `cid`.
pub fn acl_frame(cid: u16, att: &[u8]) -> Vec<u8> {
    let mut l2cap = (att.len() as u16).to_le_bytes().to_vec();
    l2cap.extend_from_slice(&cid.to_le_bytes());
    l2cap.extend_from_slice(att);

    let mut frame = vec![0x02];
    // Connection handle 0x0040, first automatically-flushable fragment.
    frame.extend_from_slice(&0x2040u16.to_le_bytes());
    frame.extend_from_slice(&(l2cap.len() as u16).to_le_bytes());
    frame.extend_from_slice(&l2cap);
    frame
}

pub fn notification(handle: u16, value: &[u8]) -> Vec<u8> {
    let mut att = vec![0x1B];
    att.extend_from_slice(&handle.to_le_bytes());
    att.extend_from_slice(value);
    acl_frame(0x0004, &att)
}

pub fn write_command(handle: u16, value: &[u8]) -> Vec<u8> {
    let mut att = vec![0x52];
    att.extend_from_slice(&handle.to_le_bytes());
    att.extend_from_slice(value);
    acl_frame(0x0004, &att)
}

pub fn read_response(value: &[u8]) -> Vec<u8> {
    let mut att = vec![0x0A];
    att.extend_from_slice(value);
    acl_frame(0x0004, &att)
}

pub fn xor_ff(bytes: &[u8]) -> Vec<u8> {
    bytes.iter().map(|b| b ^ 0xFF).collect()
}
