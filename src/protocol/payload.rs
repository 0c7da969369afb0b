//! Payload, payload frame and report headers.
//!
//! A `PAYLOAD` data frame contains a [`Payload`] header followed by
//! `frames` individually typed [`PayloadFrame`]s, each of which carries a
//! run of [`Report`]s. Reports are length-prefixed, so unknown types can be
//! skipped without understanding them.

use super::{ParseError, Reader};

pub const FRAME_TYPE_STYLUS: u16 = 6;
pub const FRAME_TYPE_TOUCH: u16 = 8;

pub const REPORT_TYPE_TOUCH_HEATMAP_DIM: u16 = 0x0403;
pub const REPORT_TYPE_TOUCH_HEATMAP: u16 = 0x0425;
pub const REPORT_TYPE_STYLUS_NO_TILT: u16 = 0x0410;
pub const REPORT_TYPE_STYLUS_TILT: u16 = 0x0461;
pub const REPORT_TYPE_STYLUS_TILT_SERIAL: u16 = 0x0460;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Payload {
    pub counter: u32,
    pub frames: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadFrame {
    pub index: u16,
    pub ty: u16,
    pub size: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Report {
    pub ty: u16,
    pub size: u16,
}

impl Payload {
    pub fn parse(reader: &mut Reader<'_>) -> Result<Self, ParseError> {
        let counter = reader.read_u32_le()?;
        let frames = reader.read_u32_le()?;

        // Reserved data is not parsed.
        reader.skip(4)?;

        Ok(Self { counter, frames })
    }
}

impl PayloadFrame {
    pub fn parse(reader: &mut Reader<'_>) -> Result<Self, ParseError> {
        let index = reader.read_u16_le()?;
        let ty = reader.read_u16_le()?;
        let size = reader.read_u32_le()?;

        // Reserved data is not parsed.
        reader.skip(8)?;

        Ok(Self { index, ty, size })
    }
}

impl Report {
    /// Size of the report header itself on the wire. The running byte count
    /// against [`PayloadFrame::size`] has to include this for every report.
    pub const WIRE_SIZE: u32 = 4;

    pub fn parse(reader: &mut Reader<'_>) -> Result<Self, ParseError> {
        let ty = reader.read_u16_le()?;
        let size = reader.read_u16_le()?;

        Ok(Self { ty, size })
    }
}

/// Tracks the running byte count of a report run against the size declared
/// by the enclosing payload frame.
///
/// Returns the new count, or an error once the reports claim more bytes
/// than their frame holds.
pub fn advance_report(consumed: u32, report: Report, declared: u32) -> Result<u32, ParseError> {
    let consumed = consumed + u32::from(report.size) + Report::WIRE_SIZE;

    if consumed > declared {
        return Err(ParseError::FrameOverrun { consumed, declared });
    }

    Ok(consumed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_payload(payload: &Payload) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&payload.counter.to_le_bytes());
        out.extend_from_slice(&payload.frames.to_le_bytes());
        out.extend_from_slice(&[0; 4]);
        out
    }

    fn encode_frame(frame: &PayloadFrame) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&frame.index.to_le_bytes());
        out.extend_from_slice(&frame.ty.to_le_bytes());
        out.extend_from_slice(&frame.size.to_le_bytes());
        out.extend_from_slice(&[0; 8]);
        out
    }

    fn encode_report(report: &Report) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&report.ty.to_le_bytes());
        out.extend_from_slice(&report.size.to_le_bytes());
        out
    }

    #[test]
    fn payload_round_trip() {
        let payload = Payload { counter: 42, frames: 3 };
        let bytes = encode_payload(&payload);

        let mut reader = Reader::new(&bytes);
        assert_eq!(Payload::parse(&mut reader).unwrap(), payload);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn payload_frame_round_trip() {
        let frame = PayloadFrame { index: 1, ty: FRAME_TYPE_TOUCH, size: 1536 };
        let bytes = encode_frame(&frame);

        let mut reader = Reader::new(&bytes);
        assert_eq!(PayloadFrame::parse(&mut reader).unwrap(), frame);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn report_round_trip() {
        let report = Report { ty: REPORT_TYPE_TOUCH_HEATMAP, size: 0x1c0 };
        let bytes = encode_report(&report);

        let mut reader = Reader::new(&bytes);
        assert_eq!(Report::parse(&mut reader).unwrap(), report);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn report_run_is_bounded_by_frame_size() {
        let report = Report { ty: 0x9999, size: 12 };

        // One report of 12 bytes plus its header fits a 16 byte frame.
        let consumed = advance_report(0, report, 16).unwrap();
        assert_eq!(consumed, 16);

        // A second one does not.
        assert!(matches!(
            advance_report(consumed, report, 16),
            Err(ParseError::FrameOverrun { consumed: 32, declared: 16 })
        ));
    }
}
