//! Single-touch HID report payload.

use super::{ParseError, Reader};

/// Coordinate range of the single-touch report.
pub const SINGLETOUCH_MAX: u16 = 32767;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SingletouchData {
    pub touch: u8,
    pub x: u16,
    pub y: u16,
}

impl SingletouchData {
    pub fn parse(reader: &mut Reader<'_>) -> Result<Self, ParseError> {
        let touch = reader.read_u8()?;
        let x = reader.read_u16_le()?;
        let y = reader.read_u16_le()?;

        Ok(Self { touch, x, y })
    }
}
