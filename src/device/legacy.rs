//! The doorbell-driven multi-buffer interface of older IPTS drivers.
//!
//! The kernel exposes one file per ring buffer slot. A monotonically
//! increasing doorbell counter says how many buffers the device has filled;
//! the daemon reads slot `doorbell % IPTS_BUFFERS` and acknowledges it with
//! a feedback ioctl so the kernel can reuse it.

use std::os::unix::io::{AsFd, OwnedFd};
use std::path::Path;
use std::thread;
use std::time::Duration;

use rustix::fs::{Mode, OFlags};
use rustix::io::Errno;

use super::ioctl;
use super::{DeviceError, DeviceInfo};

/// Number of ring buffer files exposed by the kernel.
pub const IPTS_BUFFERS: usize = 16;

const GET_DEVICE_READY: u64 = ioctl::ior::<u8>(0x86, 0x01);
const GET_DEVICE_INFO: u64 = ioctl::ior::<DeviceInfo>(0x86, 0x02);
const GET_DOORBELL: u64 = ioctl::ior::<u32>(0x86, 0x03);
const SEND_FEEDBACK: u64 = ioctl::io(0x86, 0x04);

const READY_ATTEMPTS: u32 = 5;
const READY_TICK: Duration = Duration::from_secs(1);

fn buffer_path(index: usize) -> String {
    format!("/dev/ipts/{index}")
}

/// Handle on the `/dev/ipts/{0..15}` ring files.
#[derive(Debug)]
pub struct LegacyDevice {
    files: Vec<OwnedFd>,
}

impl LegacyDevice {
    /// Whether the multi-file layout is present on this system.
    pub fn available() -> bool {
        Path::new(&buffer_path(0)).exists()
    }

    pub fn open() -> Result<Self, DeviceError> {
        let mut files = Vec::with_capacity(IPTS_BUFFERS);

        for index in 0..IPTS_BUFFERS {
            let fd = rustix::fs::open(buffer_path(index), OFlags::RDONLY, Mode::empty())
                .map_err(|errno| DeviceError::Unavailable(errno.into()))?;
            files.push(fd);
        }

        Ok(Self { files })
    }

    /// Poll the readiness ioctl until the device answers, with 1 second
    /// ticks. Called before every group of control ioctls; the controller
    /// takes a moment to come up after boot or resume.
    pub fn wait_for_ready(&self) {
        for attempt in 1..=READY_ATTEMPTS {
            match self.ready() {
                Ok(true) => return,
                Ok(false) => {
                    log::debug!(target: "iptsd", "device not ready ({attempt}/{READY_ATTEMPTS})");
                }
                Err(err) => {
                    log::debug!(
                        target: "iptsd",
                        "readiness query failed ({attempt}/{READY_ATTEMPTS}): {err}"
                    );
                }
            }

            thread::sleep(READY_TICK);
        }
    }

    fn ready(&self) -> Result<bool, DeviceError> {
        let mut ready = 0u8;
        // SAFETY: GET_DEVICE_READY reads one byte.
        unsafe { ioctl::ioctl_read(self.files[0].as_fd(), GET_DEVICE_READY, &mut ready)? };
        Ok(ready != 0)
    }

    pub fn info(&self) -> Result<DeviceInfo, DeviceError> {
        let mut info = DeviceInfo::default();
        // SAFETY: GET_DEVICE_INFO reads a DeviceInfo.
        unsafe { ioctl::ioctl_read(self.files[0].as_fd(), GET_DEVICE_INFO, &mut info)? };
        Ok(info)
    }

    /// Current doorbell value, queried on the file the given counter maps
    /// to.
    pub fn doorbell(&self, current: u32) -> Result<u32, DeviceError> {
        let fd = self.files[current as usize % IPTS_BUFFERS].as_fd();

        let mut doorbell = 0u32;
        // SAFETY: GET_DOORBELL reads a u32.
        unsafe { ioctl::ioctl_read(fd, GET_DOORBELL, &mut doorbell)? };
        Ok(doorbell)
    }

    /// Read the buffer the given doorbell value maps to.
    pub fn read(&self, doorbell: u32, buf: &mut [u8]) -> Result<usize, DeviceError> {
        let fd = self.files[doorbell as usize % IPTS_BUFFERS].as_fd();

        loop {
            match rustix::io::read(fd, &mut *buf) {
                Ok(n) => return Ok(n),
                Err(Errno::INTR) => continue,
                Err(Errno::AGAIN) => return Ok(0),
                Err(errno) => return Err(DeviceError::Io(errno.into())),
            }
        }
    }

    /// Acknowledge the buffer the given doorbell value maps to.
    pub fn feedback(&self, doorbell: u32) -> Result<(), DeviceError> {
        let fd = self.files[doorbell as usize % IPTS_BUFFERS].as_fd();
        ioctl::ioctl_none(fd, SEND_FEEDBACK)?;
        Ok(())
    }

    /// Acknowledge every buffer. Used after a device reset, when the
    /// doorbell moved backwards and all slots are in an unknown state.
    pub fn flush(&self) -> Result<(), DeviceError> {
        for fd in &self.files {
            ioctl::ioctl_none(fd.as_fd(), SEND_FEEDBACK)?;
        }

        Ok(())
    }
}
