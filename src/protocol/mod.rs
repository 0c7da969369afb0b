//! Decoder for the framed binary stream produced by the IPTS controller.
//!
//! A [`Reader`] is a little-endian cursor over one raw frame as it came out
//! of the kernel. The header types in the submodules each know how to parse
//! themselves from a reader, consuming their declared reserved bytes so that
//! callers never have to account for them.

pub mod data;
pub mod payload;
pub mod singletouch;
pub mod stylus;
pub mod touch;

/// An error raised while decoding a frame.
///
/// Any of these means the frame cannot be trusted; the caller is expected to
/// abandon it, acknowledge the buffer and continue with the next frame.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// A read or skip ran past the end of the buffer.
    #[error("unexpected end of frame: needed {needed} more bytes, {available} left")]
    Underflow { needed: usize, available: usize },

    /// The running report byte count overran the size declared by the
    /// enclosing payload frame.
    #[error("reports overran their payload frame: consumed {consumed} of {declared} bytes")]
    FrameOverrun { consumed: u32, declared: u32 },

    /// A heatmap data report did not match the previously announced
    /// dimensions.
    #[error("heatmap size mismatch: got {size} bytes for a {width}x{height} map")]
    HeatmapSize { size: usize, width: usize, height: usize },
}

/// Little-endian cursor over a single raw frame.
#[derive(Debug)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Number of bytes that have not been consumed yet.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Rewind to the start of the buffer.
    pub fn reset(&mut self) {
        self.pos = 0;
    }

    /// Advance the cursor without interpreting the bytes.
    pub fn skip(&mut self, count: usize) -> Result<(), ParseError> {
        self.check(count)?;
        self.pos += count;
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8, ParseError> {
        self.check(1)?;
        let value = self.data[self.pos];
        self.pos += 1;
        Ok(value)
    }

    pub fn read_u16_le(&mut self) -> Result<u16, ParseError> {
        self.check(2)?;
        let bytes = [self.data[self.pos], self.data[self.pos + 1]];
        self.pos += 2;
        Ok(u16::from_le_bytes(bytes))
    }

    pub fn read_u32_le(&mut self) -> Result<u32, ParseError> {
        self.check(4)?;
        let mut bytes = [0; 4];
        bytes.copy_from_slice(&self.data[self.pos..self.pos + 4]);
        self.pos += 4;
        Ok(u32::from_le_bytes(bytes))
    }

    /// Fill `dst` from the current position.
    pub fn read_bytes(&mut self, dst: &mut [u8]) -> Result<(), ParseError> {
        self.check(dst.len())?;
        dst.copy_from_slice(&self.data[self.pos..self.pos + dst.len()]);
        self.pos += dst.len();
        Ok(())
    }

    fn check(&self, needed: usize) -> Result<(), ParseError> {
        let available = self.remaining();
        if needed > available {
            return Err(ParseError::Underflow { needed, available });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_reads_little_endian() {
        let mut reader = Reader::new(&[0x01, 0x34, 0x12, 0x78, 0x56, 0x34, 0x12]);

        assert_eq!(reader.read_u8().unwrap(), 0x01);
        assert_eq!(reader.read_u16_le().unwrap(), 0x1234);
        assert_eq!(reader.read_u32_le().unwrap(), 0x12345678);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn reset_rewinds_to_start() {
        let mut reader = Reader::new(&[0xaa, 0xbb]);

        reader.skip(2).unwrap();
        assert_eq!(reader.remaining(), 0);

        reader.reset();
        assert_eq!(reader.read_u8().unwrap(), 0xaa);
    }

    #[test]
    fn underflow_reports_sizes() {
        let mut reader = Reader::new(&[0x00; 3]);

        match reader.read_u32_le() {
            Err(ParseError::Underflow { needed, available }) => {
                assert_eq!(needed, 4);
                assert_eq!(available, 3);
            }
            other => panic!("expected underflow, got {other:?}"),
        }
    }

    #[test]
    fn read_bytes_consumes_exactly() {
        let mut reader = Reader::new(&[1, 2, 3, 4]);
        let mut dst = [0; 3];

        reader.read_bytes(&mut dst).unwrap();
        assert_eq!(dst, [1, 2, 3]);
        assert_eq!(reader.remaining(), 1);
    }
}
