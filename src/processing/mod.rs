//! The touch and stylus processing pipelines.
//!
//! Everything in this module is pure computation over data that already left
//! the wire: heatmap segmentation, contact geometry, palm rejection, finger
//! tracking and stylus filtering. No device I/O happens here, which is what
//! keeps the pipeline testable frame by frame.

pub mod cluster;
pub mod contact;
pub mod heatmap;
pub mod palm;
pub mod stylus;
pub mod touch;
pub mod tracker;

pub use contact::Contact;
pub use heatmap::Heatmap;
pub use touch::TouchProcessor;
pub use tracker::{TouchPoint, TouchTracker};
