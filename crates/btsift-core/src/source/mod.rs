mod btsnoop;

pub use btsnoop::BtsnoopFileSource;
pub(crate) use btsnoop::reader::btsnoop_ts_to_rfc3339;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Container header fields that follow the magic; informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureHeader {
    pub version: u32,
    pub datalink: u32,
}

impl CaptureHeader {
    /// Whether records carry a leading H4 packet-type byte.
    pub fn is_h4(&self) -> bool {
        self.datalink == btsnoop::layout::DATALINK_H4
    }
}

/// Fixed 24-byte header preceding every record payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub original_length: u32,
    pub included_length: u32,
    pub flags: u32,
    pub cumulative_drops: u32,
    /// Microseconds since 0000-01-01T00:00:00Z.
    pub timestamp: u64,
}

impl RecordHeader {
    pub fn direction(&self) -> Direction {
        btsnoop::reader::direction_from_flags(self.flags)
    }

    pub fn is_command_or_event(&self) -> bool {
        btsnoop::reader::is_command_or_event(self.flags)
    }

    /// RFC3339 rendering of the record timestamp, when representable.
    pub fn timestamp_rfc3339(&self) -> Option<String> {
        btsnoop::reader::btsnoop_ts_to_rfc3339(self.timestamp)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Host to controller.
    Sent,
    /// Controller to host.
    Received,
}

/// One record read from the capture: header plus exactly `included_length`
/// payload bytes.
#[derive(Debug, Clone)]
pub struct FrameRecord {
    pub index: u64,
    pub header: RecordHeader,
    pub data: Vec<u8>,
}

/// Where a capture stopped early because bytes ran out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "part", rename_all = "snake_case")]
pub enum Truncation {
    /// Fewer than 24 bytes remained for the record header.
    Header { record_index: u64, available: usize },
    /// Fewer payload bytes remained than `included_length` declared.
    Payload {
        record_index: u64,
        declared: u32,
        available: usize,
    },
}

pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<FrameRecord>, SourceError>;

    /// Set once the source ended on a partial record.
    fn truncation(&self) -> Option<Truncation> {
        None
    }

    fn capture_header(&self) -> Option<CaptureHeader> {
        None
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("capture format error: {0}")]
    Format(String),
}

impl From<btsnoop::error::BtsnoopError> for SourceError {
    fn from(value: btsnoop::error::BtsnoopError) -> Self {
        match value {
            btsnoop::error::BtsnoopError::Io(err) => SourceError::Io(err),
            other => SourceError::Format(other.to_string()),
        }
    }
}
