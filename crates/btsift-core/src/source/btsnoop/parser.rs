use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::source::{CaptureHeader, FrameRecord, FrameSource, SourceError, Truncation};

use super::error::BtsnoopError;
use super::layout;
use super::reader::{parse_file_header, parse_record_header, read_payload, read_up_to};

/// Streaming btsnoop reader. The read cursor only ever moves forward.
pub struct BtsnoopFileSource<R = BufReader<File>> {
    reader: R,
    header: CaptureHeader,
    next_index: u64,
    truncation: Option<Truncation>,
    finished: bool,
}

impl BtsnoopFileSource {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let file = File::open(path).map_err(SourceError::from)?;
        Self::from_reader(BufReader::new(file))
    }
}

impl<R: Read> BtsnoopFileSource<R> {
    /// Validate the container header and position the cursor on the first
    /// record.
    ///
    /// # Errors
    /// `SourceError::Format` when the magic is missing or the header is
    /// incomplete; `SourceError::Io` on read failures.
    pub fn from_reader(mut reader: R) -> Result<Self, SourceError> {
        let header = read_file_header(&mut reader).map_err(SourceError::from)?;
        Ok(Self {
            reader,
            header,
            next_index: 0,
            truncation: None,
            finished: false,
        })
    }
}

impl<R: Read> FrameSource for BtsnoopFileSource<R> {
    fn next_frame(&mut self) -> Result<Option<FrameRecord>, SourceError> {
        if self.finished {
            return Ok(None);
        }
        match next_record(&mut self.reader, self.next_index) {
            Ok(RecordRead::Frame(frame)) => {
                self.next_index += 1;
                Ok(Some(frame))
            }
            Ok(RecordRead::End) => {
                self.finished = true;
                Ok(None)
            }
            Ok(RecordRead::Truncated(truncation)) => {
                tracing::warn!(?truncation, "capture ends on a partial record");
                self.finished = true;
                self.truncation = Some(truncation);
                Ok(None)
            }
            Err(err) => {
                self.finished = true;
                Err(SourceError::from(err))
            }
        }
    }

    fn truncation(&self) -> Option<Truncation> {
        self.truncation
    }

    fn capture_header(&self) -> Option<CaptureHeader> {
        Some(self.header)
    }
}

enum RecordRead {
    Frame(FrameRecord),
    End,
    Truncated(Truncation),
}

fn read_file_header<R: Read>(reader: &mut R) -> Result<CaptureHeader, BtsnoopError> {
    let mut bytes = [0u8; layout::FILE_HEADER_LEN];
    let n = read_up_to(reader, &mut bytes)?;
    parse_file_header(&bytes[..n])
}

fn next_record<R: Read>(reader: &mut R, index: u64) -> Result<RecordRead, BtsnoopError> {
    let mut raw = [0u8; layout::RECORD_HEADER_LEN];
    let n = read_up_to(reader, &mut raw)?;
    if n == 0 {
        return Ok(RecordRead::End);
    }
    if n < layout::RECORD_HEADER_LEN {
        return Ok(RecordRead::Truncated(Truncation::Header {
            record_index: index,
            available: n,
        }));
    }

    let header = parse_record_header(&raw);
    let data = read_payload(reader, header.included_length)?;
    if data.len() < header.included_length as usize {
        return Ok(RecordRead::Truncated(Truncation::Payload {
            record_index: index,
            declared: header.included_length,
            available: data.len(),
        }));
    }

    Ok(RecordRead::Frame(FrameRecord {
        index,
        header,
        data,
    }))
}

#[cfg(test)]
mod tests {
    use super::BtsnoopFileSource;
    use crate::source::{FrameSource, SourceError, Truncation};
    use crate::source::btsnoop::layout;
    use std::io::Cursor;

    fn capture(records: &[&[u8]]) -> Vec<u8> {
        let mut bytes = layout::BTSNOOP_MAGIC.to_vec();
        bytes.extend_from_slice(&1u32.to_be_bytes());
        bytes.extend_from_slice(&layout::DATALINK_H4.to_be_bytes());
        for (i, data) in records.iter().enumerate() {
            let len = data.len() as u32;
            bytes.extend_from_slice(&len.to_be_bytes());
            bytes.extend_from_slice(&len.to_be_bytes());
            bytes.extend_from_slice(&(i as u32 & 1).to_be_bytes());
            bytes.extend_from_slice(&0u32.to_be_bytes());
            bytes.extend_from_slice(&(layout::EPOCH_DELTA_US + i as u64).to_be_bytes());
            bytes.extend_from_slice(data);
        }
        bytes
    }

    fn drain<S: FrameSource>(source: &mut S) -> Vec<Vec<u8>> {
        let mut frames = Vec::new();
        while let Some(frame) = source.next_frame().unwrap() {
            frames.push(frame.data);
        }
        frames
    }

    #[test]
    fn reads_all_records_in_order() {
        let bytes = capture(&[&[0x02, 0x01], &[], &[0x04, 0x0e, 0x00]]);
        let mut source = BtsnoopFileSource::from_reader(Cursor::new(bytes)).unwrap();
        let frames = drain(&mut source);
        assert_eq!(frames, vec![vec![0x02, 0x01], vec![], vec![0x04, 0x0e, 0x00]]);
        assert!(source.truncation().is_none());
    }

    #[test]
    fn record_indices_are_sequential() {
        let bytes = capture(&[&[1], &[2]]);
        let mut source = BtsnoopFileSource::from_reader(Cursor::new(bytes)).unwrap();
        let first = source.next_frame().unwrap().unwrap();
        let second = source.next_frame().unwrap().unwrap();
        assert_eq!((first.index, second.index), (0, 1));
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn corrupted_magic_is_fatal() {
        let mut bytes = capture(&[&[0x02]]);
        bytes[0] = b'X';
        let err = match BtsnoopFileSource::from_reader(Cursor::new(bytes)) {
            Ok(_) => panic!("expected corrupted magic to be rejected"),
            Err(err) => err,
        };
        assert!(matches!(err, SourceError::Format(_)));
    }

    #[test]
    fn truncated_record_header_ends_quietly() {
        let mut bytes = capture(&[&[0x02, 0xAA], &[0x02, 0xBB]]);
        let cut = bytes.len() - 2 - 10;
        bytes.truncate(cut);
        let mut source = BtsnoopFileSource::from_reader(Cursor::new(bytes)).unwrap();
        let frames = drain(&mut source);
        assert_eq!(frames, vec![vec![0x02, 0xAA]]);
        assert_eq!(
            source.truncation(),
            Some(Truncation::Header {
                record_index: 1,
                available: 14
            })
        );
    }

    #[test]
    fn truncated_payload_ends_quietly() {
        let mut bytes = capture(&[&[0x02, 0xAA], &[0x02, 0xBB, 0xCC]]);
        bytes.pop();
        let mut source = BtsnoopFileSource::from_reader(Cursor::new(bytes)).unwrap();
        let frames = drain(&mut source);
        assert_eq!(frames.len(), 1);
        assert_eq!(
            source.truncation(),
            Some(Truncation::Payload {
                record_index: 1,
                declared: 3,
                available: 2
            })
        );
        assert!(source.next_frame().unwrap().is_none());
    }
}
