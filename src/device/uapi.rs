//! The single-file uAPI interface of the IPTS driver.

use std::os::unix::io::{AsFd, OwnedFd};
use std::thread;
use std::time::Duration;

use rustix::fs::{Mode, OFlags};
use rustix::io::Errno;

use super::ioctl::{self, PollEvent};
use super::{DeviceError, DeviceInfo};

pub const DEVICE_PATH: &str = "/dev/ipts";

const INFO: u64 = ioctl::ior::<DeviceInfo>(0x86, 0x01);
const START: u64 = ioctl::io(0x86, 0x02);
const STOP: u64 = ioctl::io(0x86, 0x03);

/// How long one poll waits before giving control back to the caller, so
/// that shutdown requests are noticed in bounded time.
const POLL_TIMEOUT_MS: i32 = 200;

/// How often a vanished device is reopened before giving up.
const RESTART_ATTEMPTS: u32 = 5;
const RESTART_BACKOFF: Duration = Duration::from_millis(200);

/// Handle on `/dev/ipts`.
#[derive(Debug)]
pub struct UapiDevice {
    fd: OwnedFd,
    info: DeviceInfo,
    started: bool,
}

impl UapiDevice {
    /// Open the device and query its identity.
    pub fn open() -> Result<Self, DeviceError> {
        let fd = rustix::fs::open(DEVICE_PATH, OFlags::RDONLY, Mode::empty())
            .map_err(|errno| DeviceError::Unavailable(errno.into()))?;

        let mut info = DeviceInfo::default();
        // SAFETY: INFO is the read request for DeviceInfo on this device.
        unsafe { ioctl::ioctl_read(fd.as_fd(), INFO, &mut info)? };

        Ok(Self { fd, info, started: false })
    }

    pub fn info(&self) -> DeviceInfo {
        self.info
    }

    /// Ask the controller to begin producing frames.
    pub fn start(&mut self) -> Result<(), DeviceError> {
        if self.started {
            return Ok(());
        }

        ioctl::ioctl_none(self.fd.as_fd(), START)?;
        self.started = true;
        Ok(())
    }

    pub fn stop(&mut self) -> Result<(), DeviceError> {
        if !self.started {
            return Ok(());
        }

        ioctl::ioctl_none(self.fd.as_fd(), STOP)?;
        self.started = false;
        Ok(())
    }

    /// Read one raw frame into `buf`.
    ///
    /// Returns 0 when no frame arrived within the poll window. A hang-up
    /// (typically suspend/resume) is recovered by reopening and restarting
    /// the device, retried with backoff before surfacing as
    /// [`DeviceError::HangUp`].
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize, DeviceError> {
        match ioctl::poll_read(self.fd.as_fd(), POLL_TIMEOUT_MS)? {
            PollEvent::Timeout => Ok(0),
            PollEvent::HangUp => {
                self.recover()?;
                Ok(0)
            }
            PollEvent::Ready => loop {
                match rustix::io::read(&self.fd, &mut *buf) {
                    Ok(n) => return Ok(n),
                    Err(Errno::INTR) => continue,
                    Err(Errno::AGAIN) => return Ok(0),
                    Err(errno) => return Err(DeviceError::Io(errno.into())),
                }
            },
        }
    }

    fn recover(&mut self) -> Result<(), DeviceError> {
        for attempt in 1..=RESTART_ATTEMPTS {
            match self.restart() {
                Ok(()) => {
                    log::info!(target: "iptsd", "device recovered after hangup");
                    return Ok(());
                }
                Err(err) => {
                    log::warn!(
                        target: "iptsd",
                        "device restart {attempt}/{RESTART_ATTEMPTS} failed: {err}"
                    );
                }
            }

            thread::sleep(RESTART_BACKOFF);
        }

        Err(DeviceError::HangUp)
    }

    fn restart(&mut self) -> Result<(), DeviceError> {
        let was_started = self.started;
        let _ = self.stop();
        self.started = false;

        let mut fresh = Self::open()?;
        if was_started {
            fresh.start()?;
        }

        *self = fresh;
        Ok(())
    }
}

impl Drop for UapiDevice {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            log::warn!(target: "iptsd", "failed to stop the device: {err}");
        }
    }
}
