use std::io::{ErrorKind, Read};

use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use super::error::BtsnoopError;
use super::layout;
use crate::source::{CaptureHeader, Direction, RecordHeader};

/// Fill `buf` from the reader, stopping early only at end of input.
///
/// Unlike `read_exact`, a short read is not an error: the number of bytes
/// actually read is returned so callers can tell a clean end from a cut.
///
/// # Errors
/// Returns any I/O error other than `Interrupted`.
pub fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize, BtsnoopError> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(BtsnoopError::Io(err)),
        }
    }
    Ok(filled)
}

/// Read `len` payload bytes, growing the buffer as data arrives.
///
/// A corrupt `included_length` therefore costs at most the bytes actually
/// left in the stream.
pub fn read_payload<R: Read>(reader: &mut R, len: u32) -> Result<Vec<u8>, BtsnoopError> {
    let mut data = Vec::new();
    reader.take(u64::from(len)).read_to_end(&mut data)?;
    Ok(data)
}

/// Validate the file header and decode its informational fields.
///
/// # Examples
/// This helper is part of an internal module, so the example is marked as
/// text example.
/// ```text
/// let mut header = [0u8; 16];
/// header[..8].copy_from_slice(b"btsnoop\0");
/// header[12..16].copy_from_slice(&1002u32.to_be_bytes());
/// let parsed = parse_file_header(&header).unwrap();
/// assert_eq!(parsed.datalink, 1002);
/// ```
///
/// # Errors
/// `BadMagic` when the first 8 bytes differ from `btsnoop\0`, and
/// `TruncatedHeader` when the magic is intact but the header is cut short.
pub fn parse_file_header(bytes: &[u8]) -> Result<CaptureHeader, BtsnoopError> {
    let magic = bytes.get(layout::MAGIC_RANGE).unwrap_or(bytes);
    if magic != layout::BTSNOOP_MAGIC {
        return Err(BtsnoopError::BadMagic {
            found: hex::encode(magic),
        });
    }
    if bytes.len() < layout::FILE_HEADER_LEN {
        return Err(BtsnoopError::TruncatedHeader {
            needed: layout::FILE_HEADER_LEN,
            actual: bytes.len(),
        });
    }
    Ok(CaptureHeader {
        version: be_u32(&bytes[layout::VERSION_RANGE]),
        datalink: be_u32(&bytes[layout::DATALINK_RANGE]),
    })
}

pub fn parse_record_header(bytes: &[u8; layout::RECORD_HEADER_LEN]) -> RecordHeader {
    let mut ts = [0u8; 8];
    ts.copy_from_slice(&bytes[layout::TIMESTAMP_RANGE]);
    RecordHeader {
        original_length: be_u32(&bytes[layout::ORIGINAL_LENGTH_RANGE]),
        included_length: be_u32(&bytes[layout::INCLUDED_LENGTH_RANGE]),
        flags: be_u32(&bytes[layout::FLAGS_RANGE]),
        cumulative_drops: be_u32(&bytes[layout::DROPS_RANGE]),
        timestamp: u64::from_be_bytes(ts),
    }
}

pub fn direction_from_flags(flags: u32) -> Direction {
    if flags & layout::FLAG_DIRECTION_RECEIVED != 0 {
        Direction::Received
    } else {
        Direction::Sent
    }
}

pub fn is_command_or_event(flags: u32) -> bool {
    flags & layout::FLAG_COMMAND_OR_EVENT != 0
}

/// Convert a btsnoop timestamp to Unix microseconds.
///
/// Returns `None` for timestamps before the Unix epoch.
pub fn btsnoop_ts_to_unix_us(ts: u64) -> Option<u64> {
    ts.checked_sub(layout::EPOCH_DELTA_US)
}

pub fn btsnoop_ts_to_rfc3339(ts: u64) -> Option<String> {
    let micros = btsnoop_ts_to_unix_us(ts)?;
    let nanos = i128::from(micros) * 1_000;
    OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .ok()
        .and_then(|dt| dt.format(&Rfc3339).ok())
}

fn be_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(bytes);
    u32::from_be_bytes(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn header_bytes(magic: &[u8; 8]) -> Vec<u8> {
        let mut bytes = magic.to_vec();
        bytes.extend_from_slice(&1u32.to_be_bytes());
        bytes.extend_from_slice(&layout::DATALINK_H4.to_be_bytes());
        bytes
    }

    #[test]
    fn parses_valid_file_header() {
        let header = parse_file_header(&header_bytes(layout::BTSNOOP_MAGIC)).unwrap();
        assert_eq!(header.version, 1);
        assert_eq!(header.datalink, layout::DATALINK_H4);
    }

    #[test]
    fn rejects_bad_magic() {
        let err = parse_file_header(&header_bytes(b"btsnoopX")).unwrap_err();
        assert!(matches!(err, BtsnoopError::BadMagic { .. }));
    }

    #[test]
    fn rejects_short_input_as_bad_magic() {
        let err = parse_file_header(b"bts").unwrap_err();
        assert!(matches!(err, BtsnoopError::BadMagic { .. }));
    }

    #[test]
    fn rejects_header_cut_after_magic() {
        let err = parse_file_header(b"btsnoop\0\0\0").unwrap_err();
        assert!(matches!(
            err,
            BtsnoopError::TruncatedHeader {
                needed: 16,
                actual: 10
            }
        ));
    }

    #[test]
    fn parses_record_header_fields() {
        let mut bytes = [0u8; layout::RECORD_HEADER_LEN];
        bytes[layout::ORIGINAL_LENGTH_RANGE].copy_from_slice(&12u32.to_be_bytes());
        bytes[layout::INCLUDED_LENGTH_RANGE].copy_from_slice(&10u32.to_be_bytes());
        bytes[layout::FLAGS_RANGE].copy_from_slice(&1u32.to_be_bytes());
        bytes[layout::DROPS_RANGE].copy_from_slice(&3u32.to_be_bytes());
        bytes[layout::TIMESTAMP_RANGE].copy_from_slice(&0x0102_0304_0506_0708u64.to_be_bytes());

        let header = parse_record_header(&bytes);
        assert_eq!(header.original_length, 12);
        assert_eq!(header.included_length, 10);
        assert_eq!(header.cumulative_drops, 3);
        assert_eq!(header.timestamp, 0x0102_0304_0506_0708);
        assert_eq!(header.direction(), Direction::Received);
        assert!(!header.is_command_or_event());
    }

    #[test]
    fn read_up_to_reports_short_reads() {
        let mut cursor = Cursor::new([1u8, 2, 3]);
        let mut buf = [0u8; 8];
        let n = read_up_to(&mut cursor, &mut buf).unwrap();
        assert_eq!(n, 3);
        assert_eq!(&buf[..3], &[1, 2, 3]);
    }

    #[test]
    fn read_payload_stops_at_end_of_input() {
        let mut cursor = Cursor::new([9u8; 4]);
        let data = read_payload(&mut cursor, u32::MAX).unwrap();
        assert_eq!(data.len(), 4);
    }

    #[test]
    fn converts_epoch_timestamp() {
        assert_eq!(
            btsnoop_ts_to_rfc3339(layout::EPOCH_DELTA_US).as_deref(),
            Some("1970-01-01T00:00:00Z")
        );
        assert_eq!(
            btsnoop_ts_to_unix_us(layout::EPOCH_DELTA_US + 1_500_000),
            Some(1_500_000)
        );
    }

    #[test]
    fn pre_epoch_timestamp_has_no_rendering() {
        assert_eq!(btsnoop_ts_to_rfc3339(0), None);
    }
}
