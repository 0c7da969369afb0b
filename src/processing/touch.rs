//! The per-frame touch pipeline.

use std::collections::HashMap;

use super::cluster::ContactDetector;
use super::contact::Contact;
use super::heatmap::Heatmap;
use super::palm;
use super::tracker::{Candidate, TouchPoint, TouchTracker};

/// Logical coordinate space of the virtual touch devices.
pub const LOGICAL_WIDTH: i32 = 9600;
pub const LOGICAL_HEIGHT: i32 = 7200;

/// Owns every piece of state the touch pipeline needs across frames:
/// the size-keyed heatmap buffer cache, the detection scratch space and
/// the finger tracker.
#[derive(Debug)]
pub struct TouchProcessor {
    invert_x: bool,
    invert_y: bool,

    heatmaps: HashMap<usize, Heatmap>,
    detector: ContactDetector,
    contacts: Vec<Contact>,
    candidates: Vec<Candidate>,
    tracker: TouchTracker,
}

impl TouchProcessor {
    pub fn new(max_touch_points: usize, invert_x: bool, invert_y: bool) -> Self {
        Self {
            invert_x,
            invert_y,
            heatmaps: HashMap::new(),
            detector: ContactDetector::new(),
            contacts: vec![Contact::default(); max_touch_points],
            candidates: Vec::with_capacity(max_touch_points),
            tracker: TouchTracker::new(max_touch_points),
        }
    }

    pub fn max_touch_points(&self) -> usize {
        self.tracker.max_touch_points()
    }

    /// Fetch the cached heatmap buffer for the given dimensions, creating
    /// it on first use. The cache is keyed by pixel count, so frames that
    /// merely reinterpret the same buffer size do not allocate.
    pub fn heatmap(&mut self, width: usize, height: usize) -> &mut Heatmap {
        let hm = self
            .heatmaps
            .entry(width * height)
            .or_insert_with(|| Heatmap::new(width, height));

        hm.set_dimensions(width, height);
        hm
    }

    /// Run the full pipeline on the previously filled heatmap for these
    /// dimensions: preprocess, segment, classify palms, scale into logical
    /// space and track identities.
    pub fn process(&mut self, width: usize, height: usize) -> &[TouchPoint] {
        let invert_x = self.invert_x;
        let invert_y = self.invert_y;

        let hm = match self.heatmaps.get_mut(&(width * height)) {
            Some(hm) => hm,
            None => return self.tracker.track(&[]),
        };

        hm.preprocess();

        let count = self.detector.detect(hm, &mut self.contacts);
        palm::classify(&mut self.contacts[..count]);

        self.candidates.clear();
        for contact in &self.contacts[..count] {
            let mut x = contact.x / (width - 1) as f64;
            let mut y = contact.y / (height - 1) as f64;

            if invert_x {
                x = 1.0 - x;
            }

            if invert_y {
                y = 1.0 - y;
            }

            self.candidates.push(Candidate {
                x: (x * f64::from(LOGICAL_WIDTH)) as i32,
                y: (y * f64::from(LOGICAL_HEIGHT)) as i32,
                ev1: contact.ev1,
                ev2: contact.ev2,
                is_palm: contact.is_palm,
            });
        }

        self.tracker.track(&self.candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::tracker::IDLE_INDEX;

    /// Write a raw (not yet preprocessed) frame with touches as
    /// depressions below a resting level.
    fn fill_frame(processor: &mut TouchProcessor, width: usize, height: usize, touches: &[(usize, usize)]) {
        let hm = processor.heatmap(width, height);
        hm.data_mut().fill(200);

        for &(cx, cy) in touches {
            for dy in 0..3 {
                for dx in 0..3 {
                    let x = cx + dx - 1;
                    let y = cy + dy - 1;
                    hm.data_mut()[y * width + x] = 100;
                }
            }
        }
    }

    #[test]
    fn empty_frame_produces_no_touches() {
        let mut processor = TouchProcessor::new(4, false, false);

        fill_frame(&mut processor, 16, 16, &[]);
        let points = processor.process(16, 16);

        assert!(points.iter().all(|point| point.index == IDLE_INDEX));
    }

    #[test]
    fn touch_is_scaled_into_logical_space() {
        let mut processor = TouchProcessor::new(4, false, false);

        fill_frame(&mut processor, 16, 16, &[(8, 8)]);
        let points = processor.process(16, 16);

        let point = points.iter().find(|point| point.index != IDLE_INDEX).expect("one touch");

        // Centroid 8/15 of the way across, in a 9600x7200 space.
        assert!((point.x - 5120).abs() < 200, "x: {}", point.x);
        assert!((point.y - 3840).abs() < 200, "y: {}", point.y);
    }

    #[test]
    fn inversion_mirrors_coordinates() {
        let mut normal = TouchProcessor::new(4, false, false);
        let mut inverted = TouchProcessor::new(4, true, true);

        for processor in [&mut normal, &mut inverted] {
            fill_frame(processor, 16, 16, &[(4, 6)]);
        }

        let a = normal.process(16, 16)[0];
        let b = inverted.process(16, 16)[0];

        assert!((a.x + b.x - LOGICAL_WIDTH).abs() <= 1, "{} + {}", a.x, b.x);
        assert!((a.y + b.y - LOGICAL_HEIGHT).abs() <= 1, "{} + {}", a.y, b.y);
    }

    #[test]
    fn identity_persists_across_frames() {
        let mut processor = TouchProcessor::new(4, false, false);

        fill_frame(&mut processor, 16, 16, &[(5, 5)]);
        let first = processor.process(16, 16)[0].index;

        fill_frame(&mut processor, 16, 16, &[(6, 5)]);
        let second = processor.process(16, 16)[0].index;

        assert_eq!(first, second);
    }
}
