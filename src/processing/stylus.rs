//! Stylus position smoothing and tilt projection.

use std::collections::VecDeque;
use std::f64::consts::PI;

/// Number of samples in the rolling mean.
const WINDOW: usize = 5;

/// Rolling-mean filter over the most recent stylus positions.
///
/// Every physical pen owns one of these; flushing on proximity-out keeps a
/// re-approaching pen from dragging in positions of the previous stroke.
#[derive(Debug)]
pub struct StylusFilter {
    samples: VecDeque<(i32, i32)>,
}

impl StylusFilter {
    pub fn new() -> Self {
        Self { samples: VecDeque::with_capacity(WINDOW) }
    }

    /// Feed one raw position, returning the mean over the filled window.
    pub fn smooth(&mut self, x: i32, y: i32) -> (i32, i32) {
        if self.samples.len() == WINDOW {
            self.samples.pop_front();
        }
        self.samples.push_back((x, y));

        let (mut sx, mut sy) = (0i64, 0i64);
        for &(x, y) in &self.samples {
            sx += i64::from(x);
            sy += i64::from(y);
        }

        let len = self.samples.len() as i64;
        ((sx / len) as i32, (sy / len) as i32)
    }

    /// Drop all buffered samples. Called when the pen leaves proximity.
    pub fn flush(&mut self) {
        self.samples.clear();
    }
}

/// Convert the spherical altitude/azimuth angles into the tilt_x/tilt_y
/// representation of the input subsystem.
///
/// Both inputs are hundredths of a degree in [0, 18000]; the result is in
/// hundredths of a degree in [-9000, 9000]. An altitude of zero means the
/// controller reported no tilt at all.
pub fn tilt(altitude: i32, azimuth: i32) -> (i32, i32) {
    if altitude <= 0 {
        return (0, 0);
    }

    let alt = f64::from(altitude) / 18000.0 * PI;
    let azm = f64::from(azimuth) / 18000.0 * PI;

    let atan_x = f64::atan2(alt.cos(), alt.sin() * azm.cos());
    let atan_y = f64::atan2(alt.cos(), alt.sin() * azm.sin());

    let tx = 9000.0 - atan_x * 4500.0 / (PI / 4.0);
    let ty = atan_y * 4500.0 / (PI / 4.0) - 9000.0;

    (tx as i32, ty as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smoothing_converges_on_constant_input() {
        let mut filter = StylusFilter::new();

        let mut out = (0, 0);
        for _ in 0..WINDOW {
            out = filter.smooth(1200, 3400);
        }

        assert_eq!(out, (1200, 3400));
    }

    #[test]
    fn partial_window_averages_what_is_there() {
        let mut filter = StylusFilter::new();

        filter.smooth(100, 0);
        let out = filter.smooth(300, 0);

        assert_eq!(out, (200, 0));
    }

    #[test]
    fn flush_forgets_the_previous_stroke() {
        let mut filter = StylusFilter::new();

        for _ in 0..WINDOW {
            filter.smooth(9000, 9000);
        }

        filter.flush();
        assert_eq!(filter.smooth(100, 200), (100, 200));
    }

    #[test]
    fn zero_altitude_means_no_tilt() {
        assert_eq!(tilt(0, 4500), (0, 0));
        assert_eq!(tilt(-1, 4500), (0, 0));
    }

    #[test]
    fn forty_five_degrees_towards_azimuth_zero() {
        // Half way between upright and flat, leaning along the x axis.
        let (tx, ty) = tilt(4500, 0);

        assert!((tx - 4500).abs() <= 1, "tilt_x: {tx}");
        assert!(ty.abs() <= 1, "tilt_y: {ty}");
    }

    #[test]
    fn opposite_azimuths_mirror_the_tilt() {
        for azimuth in [0, 3000, 8000, 13500] {
            let (tx1, ty1) = tilt(4500, azimuth);
            let (tx2, ty2) = tilt(4500, (azimuth + 18000) % 36000);

            assert!((tx1 + tx2).abs() <= 1, "tilt_x must flip sign: {tx1} vs {tx2}");
            assert!((ty1 + ty2).abs() <= 1, "tilt_y must flip sign: {ty1} vs {ty2}");
        }
    }
}
