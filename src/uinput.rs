//! Virtual input devices backed by `/dev/uinput`.
//!
//! A device is assembled through [`UinputBuilder`]: declare the event
//! types, keys, properties and absolute axes it supports, then create it.
//! Created devices emit raw `input_event` frames and destroy themselves on
//! drop.

use std::io;
use std::mem;
use std::os::unix::io::{AsFd, OwnedFd};
use std::slice;

use rustix::fs::{Mode, OFlags};
use rustix::io::Errno;

use crate::device::ioctl;

pub const EV_SYN: u16 = 0x00;
pub const EV_KEY: u16 = 0x01;
pub const EV_ABS: u16 = 0x03;

pub const SYN_REPORT: u16 = 0x00;

pub const BTN_TOOL_PEN: u16 = 0x140;
pub const BTN_TOOL_RUBBER: u16 = 0x141;
pub const BTN_TOUCH: u16 = 0x14a;
pub const BTN_STYLUS: u16 = 0x14b;

pub const ABS_X: u16 = 0x00;
pub const ABS_Y: u16 = 0x01;
pub const ABS_PRESSURE: u16 = 0x18;
pub const ABS_TILT_X: u16 = 0x1a;
pub const ABS_TILT_Y: u16 = 0x1b;
pub const ABS_MISC: u16 = 0x28;
pub const ABS_MT_SLOT: u16 = 0x2f;
pub const ABS_MT_POSITION_X: u16 = 0x35;
pub const ABS_MT_POSITION_Y: u16 = 0x36;
pub const ABS_MT_TRACKING_ID: u16 = 0x39;

pub const INPUT_PROP_POINTER: u16 = 0x00;
pub const INPUT_PROP_DIRECT: u16 = 0x01;

pub const BUS_VIRTUAL: u16 = 0x06;

const UINPUT_PATH: &str = "/dev/uinput";
const UINPUT_MAX_NAME_SIZE: usize = 80;

const UI_DEV_CREATE: u64 = ioctl::io(b'U' as u64, 1);
const UI_DEV_DESTROY: u64 = ioctl::io(b'U' as u64, 2);
const UI_DEV_SETUP: u64 = ioctl::iow::<UinputSetup>(b'U' as u64, 3);
const UI_ABS_SETUP: u64 = ioctl::iow::<UinputAbsSetup>(b'U' as u64, 4);
const UI_SET_EVBIT: u64 = ioctl::iow::<libc::c_int>(b'U' as u64, 100);
const UI_SET_KEYBIT: u64 = ioctl::iow::<libc::c_int>(b'U' as u64, 101);
const UI_SET_ABSBIT: u64 = ioctl::iow::<libc::c_int>(b'U' as u64, 103);
const UI_SET_PROPBIT: u64 = ioctl::iow::<libc::c_int>(b'U' as u64, 110);

/// `struct uinput_setup` from the kernel headers.
#[repr(C)]
struct UinputSetup {
    id: libc::input_id,
    name: [u8; UINPUT_MAX_NAME_SIZE],
    ff_effects_max: u32,
}

/// `struct uinput_abs_setup` from the kernel headers.
#[repr(C)]
struct UinputAbsSetup {
    code: u16,
    absinfo: libc::input_absinfo,
}

#[derive(Debug, thiserror::Error)]
pub enum UinputError {
    #[error("cannot open /dev/uinput: {0}")]
    Unavailable(#[source] io::Error),

    #[error("virtual device setup failed: {0}")]
    Setup(#[source] io::Error),

    #[error("failed to emit input event: {0}")]
    Emit(#[source] io::Error),
}

/// A virtual device in the making.
#[derive(Debug)]
pub struct UinputBuilder {
    fd: OwnedFd,
}

impl UinputBuilder {
    fn new(name: &str, vendor: u16, product: u16, version: u16) -> Result<Self, UinputError> {
        let fd = rustix::fs::open(UINPUT_PATH, OFlags::WRONLY, Mode::empty())
            .map_err(|errno| UinputError::Unavailable(errno.into()))?;

        let mut setup = UinputSetup {
            id: libc::input_id {
                bustype: BUS_VIRTUAL,
                vendor,
                product,
                version,
            },
            name: [0; UINPUT_MAX_NAME_SIZE],
            ff_effects_max: 0,
        };

        // Truncate to leave room for the terminating NUL.
        let name = name.as_bytes();
        let len = name.len().min(UINPUT_MAX_NAME_SIZE - 1);
        setup.name[..len].copy_from_slice(&name[..len]);

        // SAFETY: UI_DEV_SETUP writes a UinputSetup.
        unsafe { ioctl::ioctl_write(fd.as_fd(), UI_DEV_SETUP, &setup) }
            .map_err(UinputError::Setup)?;

        Ok(Self { fd })
    }

    pub fn enable_event_type(self, ty: u16) -> Result<Self, UinputError> {
        ioctl::ioctl_write_int(self.fd.as_fd(), UI_SET_EVBIT, libc::c_int::from(ty))
            .map_err(UinputError::Setup)?;
        Ok(self)
    }

    pub fn enable_key(self, code: u16) -> Result<Self, UinputError> {
        ioctl::ioctl_write_int(self.fd.as_fd(), UI_SET_KEYBIT, libc::c_int::from(code))
            .map_err(UinputError::Setup)?;
        Ok(self)
    }

    pub fn enable_prop(self, prop: u16) -> Result<Self, UinputError> {
        ioctl::ioctl_write_int(self.fd.as_fd(), UI_SET_PROPBIT, libc::c_int::from(prop))
            .map_err(UinputError::Setup)?;
        Ok(self)
    }

    /// Declare an absolute axis. A resolution of 0 leaves it unspecified.
    pub fn abs_axis(
        self,
        code: u16,
        minimum: i32,
        maximum: i32,
        resolution: i32,
    ) -> Result<Self, UinputError> {
        ioctl::ioctl_write_int(self.fd.as_fd(), UI_SET_ABSBIT, libc::c_int::from(code))
            .map_err(UinputError::Setup)?;

        let setup = UinputAbsSetup {
            code,
            absinfo: libc::input_absinfo {
                value: 0,
                minimum,
                maximum,
                fuzz: 0,
                flat: 0,
                resolution,
            },
        };

        // SAFETY: UI_ABS_SETUP writes a UinputAbsSetup.
        unsafe { ioctl::ioctl_write(self.fd.as_fd(), UI_ABS_SETUP, &setup) }
            .map_err(UinputError::Setup)?;

        Ok(self)
    }

    pub fn create(self) -> Result<UinputDevice, UinputError> {
        ioctl::ioctl_none(self.fd.as_fd(), UI_DEV_CREATE).map_err(UinputError::Setup)?;
        Ok(UinputDevice { fd: self.fd })
    }
}

/// A created virtual input device.
#[derive(Debug)]
pub struct UinputDevice {
    fd: OwnedFd,
}

impl UinputDevice {
    pub fn builder(
        name: &str,
        vendor: u16,
        product: u16,
        version: u16,
    ) -> Result<UinputBuilder, UinputError> {
        UinputBuilder::new(name, vendor, product, version)
    }

    /// Queue one event. The kernel fills in the timestamp.
    pub fn emit(&self, ty: u16, code: u16, value: i32) -> Result<(), UinputError> {
        let event = libc::input_event {
            time: libc::timeval { tv_sec: 0, tv_usec: 0 },
            type_: ty,
            code,
            value,
        };

        // SAFETY: input_event is plain old data with no padding.
        let bytes = unsafe {
            slice::from_raw_parts(
                &event as *const libc::input_event as *const u8,
                mem::size_of::<libc::input_event>(),
            )
        };

        loop {
            match rustix::io::write(&self.fd, bytes) {
                Ok(_) => return Ok(()),
                Err(Errno::INTR) => continue,
                Err(errno) => return Err(UinputError::Emit(errno.into())),
            }
        }
    }

    /// Close the current event frame.
    pub fn syn(&self) -> Result<(), UinputError> {
        self.emit(EV_SYN, SYN_REPORT, 0)
    }
}

impl Drop for UinputDevice {
    fn drop(&mut self) {
        if let Err(err) = ioctl::ioctl_none(self.fd.as_fd(), UI_DEV_DESTROY) {
            log::warn!(target: "iptsd", "failed to destroy virtual device: {err}");
        }
    }
}

/// Axis resolution in units per millimetre, derived from the physical size
/// reported by the config.
pub fn resolution(virtual_range: i32, physical_mm: u32) -> i32 {
    (f64::from(virtual_range) * 10.0 / f64::from(physical_mm)).round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setup_struct_layouts() {
        assert_eq!(mem::size_of::<UinputSetup>(), 92);
        assert_eq!(mem::size_of::<UinputAbsSetup>(), 28);
    }

    #[test]
    fn resolution_rounds_to_nearest() {
        // 9600 units over a 260 mm wide panel.
        assert_eq!(resolution(9600, 260), 369);
        // 7200 units over 173 mm.
        assert_eq!(resolution(7200, 173), 416);
    }
}
