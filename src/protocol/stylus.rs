//! Stylus report group and element formats.

use bitflags::bitflags;

use super::{ParseError, Reader};

bitflags! {
    /// State bits of the stylus mode word.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StylusMode: u16 {
        const PROXIMITY = 1 << 0;
        const TOUCH = 1 << 1;
        const BUTTON = 1 << 2;
        const RUBBER = 1 << 3;
    }
}

/// Group header of a stylus report without a serial number (0x0461).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StylusGroup {
    pub elements: u8,
}

/// Group header of a stylus report carrying the pen serial (0x0410, 0x0460).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StylusGroupSerial {
    pub elements: u8,
    pub serial: u32,
}

/// One stylus sample with tilt information (0x0460, 0x0461).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StylusData {
    pub timestamp: u16,
    pub mode: StylusMode,
    pub x: u16,
    pub y: u16,
    pub pressure: u16,
    pub altitude: u16,
    pub azimuth: u16,
}

/// One stylus sample from the older tilt-less format (0x0410).
///
/// Pressure is reported on a quarter of the usual scale and has to be
/// multiplied by four before emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StylusDataNoTilt {
    pub mode: u8,
    pub x: u16,
    pub y: u16,
    pub pressure: u16,
}

impl StylusGroup {
    pub fn parse(reader: &mut Reader<'_>) -> Result<Self, ParseError> {
        let elements = reader.read_u8()?;

        // Reserved data is not parsed.
        reader.skip(3)?;

        Ok(Self { elements })
    }
}

impl StylusGroupSerial {
    pub fn parse(reader: &mut Reader<'_>) -> Result<Self, ParseError> {
        let elements = reader.read_u8()?;

        // Reserved data is not parsed.
        reader.skip(3)?;

        let serial = reader.read_u32_le()?;

        Ok(Self { elements, serial })
    }
}

impl StylusData {
    pub fn parse(reader: &mut Reader<'_>) -> Result<Self, ParseError> {
        let timestamp = reader.read_u16_le()?;
        let mode = StylusMode::from_bits_truncate(reader.read_u16_le()?);
        let x = reader.read_u16_le()?;
        let y = reader.read_u16_le()?;
        let pressure = reader.read_u16_le()?;
        let altitude = reader.read_u16_le()?;
        let azimuth = reader.read_u16_le()?;

        // Reserved data is not parsed.
        reader.skip(2)?;

        Ok(Self { timestamp, mode, x, y, pressure, altitude, azimuth })
    }
}

impl StylusDataNoTilt {
    pub fn parse(reader: &mut Reader<'_>) -> Result<Self, ParseError> {
        // Reserved data is not parsed.
        reader.skip(4)?;

        let mode = reader.read_u8()?;
        let x = reader.read_u16_le()?;
        let y = reader.read_u16_le()?;
        let pressure = reader.read_u16_le()?;

        // Reserved data is not parsed.
        reader.skip(1)?;

        Ok(Self { mode, x, y, pressure })
    }

    /// Widen into the tilt-capable sample format. Tilt angles and the
    /// timestamp do not exist in this report and stay zero.
    pub fn widen(self) -> StylusData {
        StylusData {
            timestamp: 0,
            mode: StylusMode::from_bits_truncate(u16::from(self.mode)),
            x: self.x,
            y: self.y,
            pressure: self.pressure * 4,
            altitude: 0,
            azimuth: 0,
        }
    }
}
