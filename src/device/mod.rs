//! Access to the IPTS kernel character devices.
//!
//! Two interfaces exist in the wild: the single-file uAPI device
//! (`/dev/ipts`) with a start/stop lifecycle, and the older multi-buffer
//! interface (`/dev/ipts/{0..15}`) driven by a doorbell counter. Both hand
//! out the same wire frames; only the transport differs.

pub mod ioctl;
pub mod legacy;
pub mod uapi;

use std::io;

pub use legacy::LegacyDevice;
pub use uapi::UapiDevice;

/// An error talking to the kernel device.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// The device node could not be opened. Fatal at startup.
    #[error("cannot open the touch controller: {0}")]
    Unavailable(#[source] io::Error),

    /// The device went away mid-run and could not be recovered.
    #[error("the touch controller hung up")]
    HangUp,

    /// Any other I/O failure on the device.
    #[error("device i/o failed: {0}")]
    Io(#[from] io::Error),
}

/// Device identity and limits, as reported by the info ioctl.
///
/// Little-endian packed; the layout matches `struct ipts_device_info` of
/// the kernel driver.
#[derive(Debug, Default, Clone, Copy)]
#[repr(C)]
pub struct DeviceInfo {
    pub vendor: u16,
    pub product: u16,
    pub version: u32,
    pub buffer_size: u32,
    pub max_touch_points: u8,
    pub reserved: [u8; 19],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_info_layout() {
        // The info ioctl encodes the struct size; a layout change would
        // silently break the request code.
        assert_eq!(std::mem::size_of::<DeviceInfo>(), 32);
    }
}
