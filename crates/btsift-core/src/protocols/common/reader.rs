use thiserror::Error;

/// A read past the end of a protocol buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("payload too short: need {needed} bytes, got {actual}")]
pub struct TooShort {
    pub needed: usize,
    pub actual: usize,
}

/// Bounds-checked little-endian access shared by the Bluetooth layers.
pub(crate) struct ByteReader<'a> {
    payload: &'a [u8],
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(payload: &'a [u8]) -> Self {
        Self { payload }
    }

    pub(crate) fn require_len(&self, needed: usize) -> Result<(), TooShort> {
        if self.payload.len() < needed {
            return Err(TooShort {
                needed,
                actual: self.payload.len(),
            });
        }
        Ok(())
    }

    pub(crate) fn read_u8(&self, offset: usize) -> Result<u8, TooShort> {
        self.payload.get(offset).copied().ok_or(TooShort {
            needed: offset + 1,
            actual: self.payload.len(),
        })
    }

    pub(crate) fn read_u16_le(&self, range: std::ops::Range<usize>) -> Result<u16, TooShort> {
        let bytes = self.read_slice(range)?;
        if bytes.len() != 2 {
            return Err(TooShort {
                needed: 2,
                actual: bytes.len(),
            });
        }
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub(crate) fn read_slice(&self, range: std::ops::Range<usize>) -> Result<&'a [u8], TooShort> {
        self.payload.get(range.clone()).ok_or(TooShort {
            needed: range.end,
            actual: self.payload.len(),
        })
    }

    /// Everything from `offset` to the end of the buffer.
    pub(crate) fn rest(&self, offset: usize) -> Result<&'a [u8], TooShort> {
        self.payload.get(offset..).ok_or(TooShort {
            needed: offset,
            actual: self.payload.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{ByteReader, TooShort};

    #[test]
    fn reads_little_endian_u16() {
        let reader = ByteReader::new(&[0x34, 0x12, 0xff]);
        assert_eq!(reader.read_u16_le(0..2), Ok(0x1234));
    }

    #[test]
    fn short_read_reports_needed_and_actual() {
        let reader = ByteReader::new(&[0x01]);
        assert_eq!(
            reader.read_u16_le(0..2),
            Err(TooShort {
                needed: 2,
                actual: 1
            })
        );
        assert_eq!(
            reader.require_len(5),
            Err(TooShort {
                needed: 5,
                actual: 1
            })
        );
    }

    #[test]
    fn rest_at_end_is_empty() {
        let reader = ByteReader::new(&[1, 2, 3]);
        assert_eq!(reader.rest(3), Ok(&[][..]));
        assert!(reader.rest(4).is_err());
    }

    #[test]
    fn read_u8_out_of_range() {
        let reader = ByteReader::new(&[]);
        assert!(reader.read_u8(0).is_err());
    }
}
