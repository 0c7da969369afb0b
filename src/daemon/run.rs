//! The main loops.
//!
//! Which loop runs depends on the kernel interface that is present: the
//! doorbell orchestrator for the legacy multi-buffer devices, a plain
//! poll-and-read loop for the uAPI device. Both feed frames into
//! [`Daemon::handle`] and treat its errors as frame scoped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::device::legacy::LegacyDevice;
use crate::device::uapi::UapiDevice;

use super::{Daemon, Error};

/// After activity, poll the doorbell at this cadence for a while before
/// dropping back to the idle cadence.
const ACTIVE_SLEEP: Duration = Duration::from_millis(10);
const IDLE_SLEEP: Duration = Duration::from_millis(200);
const ACTIVE_WINDOW: Duration = Duration::from_secs(5);

/// What a fresh doorbell reading means for the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DoorbellState {
    /// The counter moved backwards: the device was reset (suspend/resume).
    /// All buffers are stale and have to be flushed.
    Reset,
    /// New buffers are waiting.
    Pending,
    Idle,
}

fn classify_doorbell(current: u32, latest: u32) -> DoorbellState {
    if latest < current {
        DoorbellState::Reset
    } else if latest > current {
        DoorbellState::Pending
    } else {
        DoorbellState::Idle
    }
}

/// Run the daemon until the shutdown flag is raised.
pub fn run(shutdown: &AtomicBool) -> Result<(), Error> {
    if LegacyDevice::available() {
        run_legacy(shutdown)
    } else {
        run_uapi(shutdown)
    }
}

fn run_legacy(shutdown: &AtomicBool) -> Result<(), Error> {
    let device = LegacyDevice::open()?;

    device.wait_for_ready();
    let info = device.info()?;

    log::info!(
        target: "iptsd",
        "connected to device {:04x}:{:04x}, {} touch points",
        info.vendor,
        info.product,
        info.max_touch_points
    );

    let config = Config::load(&info)?;
    let mut daemon = Daemon::new(info, config)?;
    let mut buffer = vec![0u8; info.buffer_size as usize];

    device.wait_for_ready();
    let mut current = device.doorbell(0)?;
    let mut active_until = Instant::now();

    while !shutdown.load(Ordering::Relaxed) {
        let latest = device.doorbell(current)?;

        match classify_doorbell(current, latest) {
            DoorbellState::Reset => {
                log::warn!(target: "iptsd", "device reset, flushing all buffers");
                device.flush()?;
                current = latest;
            }
            DoorbellState::Pending => {
                while current != latest && !shutdown.load(Ordering::Relaxed) {
                    let read = device.read(current, &mut buffer)?;

                    if read > 0 {
                        if let Err(err) = daemon.handle(&buffer[..read]) {
                            log::warn!(target: "iptsd", "dropping frame: {err}");
                        }
                    }

                    device.feedback(current)?;
                    current = current.wrapping_add(1);
                    active_until = Instant::now() + ACTIVE_WINDOW;
                }
            }
            DoorbellState::Idle => {}
        }

        let sleep =
            if Instant::now() < active_until { ACTIVE_SLEEP } else { IDLE_SLEEP };
        thread::sleep(sleep);
    }

    Ok(())
}

fn run_uapi(shutdown: &AtomicBool) -> Result<(), Error> {
    let mut device = UapiDevice::open()?;
    let info = device.info();

    log::info!(
        target: "iptsd",
        "connected to device {:04x}:{:04x}, {} touch points",
        info.vendor,
        info.product,
        info.max_touch_points
    );

    let config = Config::load(&info)?;
    let mut daemon = Daemon::new(info, config)?;
    let mut buffer = vec![0u8; info.buffer_size as usize];

    device.start()?;

    while !shutdown.load(Ordering::Relaxed) {
        let read = device.read(&mut buffer)?;

        if read == 0 {
            continue;
        }

        if let Err(err) = daemon.handle(&buffer[..read]) {
            log::warn!(target: "iptsd", "dropping frame: {err}");
        }
    }

    device.stop()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::legacy::IPTS_BUFFERS;

    #[test]
    fn backwards_doorbell_means_reset() {
        // The device rebooted behind our back: flush and adopt its count.
        assert_eq!(classify_doorbell(10, 3), DoorbellState::Reset);

        // After adopting, reading proceeds from the slot the new doorbell
        // selects.
        let current = 3u32;
        assert_eq!(current as usize % IPTS_BUFFERS, 3);
    }

    #[test]
    fn forward_doorbell_means_pending_buffers() {
        assert_eq!(classify_doorbell(3, 7), DoorbellState::Pending);
        assert_eq!(classify_doorbell(7, 7), DoorbellState::Idle);
    }

    #[test]
    fn doorbell_slot_wraps_around_the_ring() {
        assert_eq!(20 % IPTS_BUFFERS as u32, 4);
    }
}
