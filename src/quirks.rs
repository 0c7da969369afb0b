//! Built-in per-model quirks.
//!
//! Some panels report their heatmap mirrored along one or both axes. The
//! table below covers the known offenders; an explicit config file can
//! still override the result.

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Quirks: u32 {
        const HEATMAP_INVERT_X = 1 << 0;
        const HEATMAP_INVERT_Y = 1 << 1;
    }
}

struct Model {
    vendor: u16,
    product: u16,
    quirks: Quirks,
}

const MODELS: &[Model] = &[
    // Surface Book 2 (13")
    Model { vendor: 0x045e, product: 0x0021, quirks: Quirks::HEATMAP_INVERT_Y },
    // Surface Pro 5
    Model {
        vendor: 0x1b96,
        product: 0x001f,
        quirks: Quirks::HEATMAP_INVERT_X.union(Quirks::HEATMAP_INVERT_Y),
    },
    // Surface Pro 6
    Model {
        vendor: 0x045e,
        product: 0x001f,
        quirks: Quirks::HEATMAP_INVERT_X.union(Quirks::HEATMAP_INVERT_Y),
    },
];

impl Quirks {
    pub fn for_model(vendor: u16, product: u16) -> Quirks {
        let mut quirks = Quirks::empty();

        for model in MODELS {
            if model.vendor == vendor && model.product == product {
                quirks |= model.quirks;
            }
        }

        quirks
    }
}
