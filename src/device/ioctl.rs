//! Request-code construction and thin wrappers around `ioctl` and `poll`.
//!
//! The request codes mirror the kernel's `_IO`/`_IOR`/`_IOW` macros. All
//! unsafety of the raw calls is contained here; callers pass borrowed file
//! descriptors and plain references.

use std::io;
use std::os::unix::io::{AsRawFd, BorrowedFd};

const IOC_NONE: u64 = 0;
const IOC_WRITE: u64 = 1;
const IOC_READ: u64 = 2;

const IOC_NRBITS: u64 = 8;
const IOC_TYPEBITS: u64 = 8;
const IOC_SIZEBITS: u64 = 14;

const IOC_NRSHIFT: u64 = 0;
const IOC_TYPESHIFT: u64 = IOC_NRSHIFT + IOC_NRBITS;
const IOC_SIZESHIFT: u64 = IOC_TYPESHIFT + IOC_TYPEBITS;
const IOC_DIRSHIFT: u64 = IOC_SIZESHIFT + IOC_SIZEBITS;

const fn ioc(dir: u64, ty: u64, nr: u64, size: u64) -> u64 {
    (dir << IOC_DIRSHIFT) | (ty << IOC_TYPESHIFT) | (nr << IOC_NRSHIFT) | (size << IOC_SIZESHIFT)
}

pub const fn io(ty: u64, nr: u64) -> u64 {
    ioc(IOC_NONE, ty, nr, 0)
}

pub const fn ior<T>(ty: u64, nr: u64) -> u64 {
    ioc(IOC_READ, ty, nr, std::mem::size_of::<T>() as u64)
}

pub const fn iow<T>(ty: u64, nr: u64) -> u64 {
    ioc(IOC_WRITE, ty, nr, std::mem::size_of::<T>() as u64)
}

pub fn ioctl_none(fd: BorrowedFd<'_>, request: u64) -> io::Result<()> {
    // SAFETY: the request takes no argument.
    let rc = unsafe { libc::ioctl(fd.as_raw_fd(), request as libc::c_ulong) };
    check(rc)
}

/// # Safety
///
/// `request` must be a read request for exactly `T` on this device.
pub unsafe fn ioctl_read<T>(fd: BorrowedFd<'_>, request: u64, value: &mut T) -> io::Result<()> {
    let rc = unsafe { libc::ioctl(fd.as_raw_fd(), request as libc::c_ulong, value as *mut T) };
    check(rc)
}

/// # Safety
///
/// `request` must be a write request for exactly `T` on this device.
pub unsafe fn ioctl_write<T>(fd: BorrowedFd<'_>, request: u64, value: &T) -> io::Result<()> {
    let rc = unsafe { libc::ioctl(fd.as_raw_fd(), request as libc::c_ulong, value as *const T) };
    check(rc)
}

/// For requests that take a plain integer by value (the `UI_SET_*` family).
pub fn ioctl_write_int(fd: BorrowedFd<'_>, request: u64, value: libc::c_int) -> io::Result<()> {
    // SAFETY: the argument is passed by value, no memory is shared.
    let rc = unsafe { libc::ioctl(fd.as_raw_fd(), request as libc::c_ulong, value) };
    check(rc)
}

fn check(rc: libc::c_int) -> io::Result<()> {
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }

    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollEvent {
    /// Data is waiting to be read.
    Ready,
    /// The device went away.
    HangUp,
    /// Nothing happened within the timeout.
    Timeout,
}

/// Wait for the descriptor to become readable.
///
/// Interruption by a signal is reported as [`PollEvent::Timeout`] so the
/// caller re-checks its shutdown flag instead of blocking through it.
pub fn poll_read(fd: BorrowedFd<'_>, timeout_ms: i32) -> io::Result<PollEvent> {
    let mut pollfd =
        libc::pollfd { fd: fd.as_raw_fd(), events: libc::POLLIN, revents: 0 };

    // SAFETY: pollfd is a valid, exclusively borrowed array of one.
    let rc = unsafe { libc::poll(&mut pollfd, 1, timeout_ms) };

    if rc < 0 {
        let err = io::Error::last_os_error();
        if err.kind() == io::ErrorKind::Interrupted {
            return Ok(PollEvent::Timeout);
        }

        return Err(err);
    }

    if rc == 0 {
        return Ok(PollEvent::Timeout);
    }

    if pollfd.revents & (libc::POLLHUP | libc::POLLERR) != 0 {
        return Ok(PollEvent::HangUp);
    }

    Ok(PollEvent::Ready)
}
