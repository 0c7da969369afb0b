//! The outermost header of every frame read from the controller.

use super::{ParseError, Reader};

pub const DATA_TYPE_PAYLOAD: u32 = 0;
pub const DATA_TYPE_ERROR: u32 = 1;
pub const DATA_TYPE_VENDOR_DATA: u32 = 2;
pub const DATA_TYPE_HID_REPORT: u32 = 3;
pub const DATA_TYPE_GET_FEATURES: u32 = 4;

/// Report ID of the single-touch device in the generic IPTS HID descriptor.
pub const HID_REPORT_SINGLETOUCH: u8 = 0x40;

/// `Data` wire header: type, size and originating buffer, followed by
/// 52 reserved bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Data {
    pub ty: u32,
    pub size: u32,
    pub buffer: u32,
}

impl Data {
    pub fn parse(reader: &mut Reader<'_>) -> Result<Self, ParseError> {
        let ty = reader.read_u32_le()?;
        let size = reader.read_u32_le()?;
        let buffer = reader.read_u32_le()?;

        // Reserved data is not parsed.
        reader.skip(52)?;

        Ok(Self { ty, size, buffer })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(data: &Data) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&data.ty.to_le_bytes());
        out.extend_from_slice(&data.size.to_le_bytes());
        out.extend_from_slice(&data.buffer.to_le_bytes());
        out.extend_from_slice(&[0; 52]);
        out
    }

    #[test]
    fn round_trip() {
        let header = Data { ty: DATA_TYPE_HID_REPORT, size: 0xdead_beef, buffer: 7 };
        let bytes = encode(&header);

        let mut reader = Reader::new(&bytes);
        assert_eq!(Data::parse(&mut reader).unwrap(), header);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn truncated_header_is_rejected() {
        let bytes = encode(&Data { ty: 0, size: 0, buffer: 0 });

        let mut reader = Reader::new(&bytes[..20]);
        assert!(Data::parse(&mut reader).is_err());
    }
}
