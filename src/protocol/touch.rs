//! Touch frame report contents.

use super::{ParseError, Reader};

/// Heatmap dimensions announced ahead of the data report (0x0403).
///
/// Height comes first on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeatmapDim {
    pub height: u8,
    pub width: u8,
}

impl HeatmapDim {
    pub fn parse(reader: &mut Reader<'_>) -> Result<Self, ParseError> {
        let height = reader.read_u8()?;
        let width = reader.read_u8()?;

        // Reserved data is not parsed.
        reader.skip(6)?;

        Ok(Self { height, width })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimensions_round_trip() {
        let bytes = [48, 64, 0, 0, 0, 0, 0, 0];

        let mut reader = Reader::new(&bytes);
        let dim = HeatmapDim::parse(&mut reader).unwrap();

        assert_eq!(dim, HeatmapDim { height: 48, width: 64 });
        assert_eq!(reader.remaining(), 0);
    }
}
