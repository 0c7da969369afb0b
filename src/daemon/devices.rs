//! The virtual devices owned by the daemon.
//!
//! One single-touch device, one multitouch device and a growable set of
//! stylus devices. Every physical pen gets its own virtual device, keyed
//! by the serial number it reports; the kernel's input stack can then tell
//! pens apart the same way it would with separate physical tablets.

use crate::config::Config;
use crate::device::DeviceInfo;
use crate::processing::stylus::StylusFilter;
use crate::processing::touch::{LOGICAL_HEIGHT, LOGICAL_WIDTH};
use crate::uinput::{self, UinputDevice, UinputError};

/// One physical pen: its virtual device plus its smoothing state.
///
/// The filter lives here rather than globally so that switching pens never
/// leaks one pen's position history into another's stroke.
#[derive(Debug)]
pub struct Stylus {
    pub device: UinputDevice,
    pub filter: StylusFilter,
}

impl Stylus {
    pub fn new(info: &DeviceInfo, config: &Config) -> Result<Self, UinputError> {
        Ok(Self { device: create_stylus(info, config)?, filter: StylusFilter::new() })
    }
}

/// Registry of known styli, keyed by serial, with one active entry.
///
/// Serial 0 is the uninitialized sentinel: pens report it until they first
/// touch the screen, and the first real serial observed is adopted by the
/// entry that was created for it.
#[derive(Debug)]
pub struct StylusRegistry<T> {
    entries: Vec<(u32, T)>,
    active: usize,
}

impl<T> StylusRegistry<T> {
    pub fn new(initial: T) -> Self {
        Self { entries: vec![(0, initial)], active: 0 }
    }

    pub fn active_serial(&self) -> u32 {
        self.entries[self.active].0
    }

    pub fn active_mut(&mut self) -> &mut T {
        &mut self.entries[self.active].1
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Make the pen with this serial the active one.
    ///
    /// An active entry still carrying serial 0 adopts the reported serial;
    /// a known serial switches to its entry; anything else is a new pen,
    /// registered with whatever `create` returns.
    pub fn switch<E>(
        &mut self,
        serial: u32,
        create: impl FnOnce() -> Result<T, E>,
    ) -> Result<(), E> {
        if self.active_serial() == serial {
            return Ok(());
        }

        if self.active_serial() == 0 {
            self.entries[self.active].0 = serial;
            return Ok(());
        }

        if let Some(position) = self.entries.iter().position(|(known, _)| *known == serial) {
            self.active = position;
            return Ok(());
        }

        self.entries.push((serial, create()?));
        self.active = self.entries.len() - 1;
        Ok(())
    }
}

impl<T> Drop for StylusRegistry<T> {
    fn drop(&mut self) {
        // Tear down in reverse registration order.
        while self.entries.pop().is_some() {}
    }
}

/// All virtual devices, declared in reverse creation order so that drop
/// tears them down newest-first.
#[derive(Debug)]
pub struct VirtualDevices {
    pub styli: StylusRegistry<Stylus>,
    pub touch: UinputDevice,
    pub singletouch: UinputDevice,
}

impl VirtualDevices {
    pub fn new(info: &DeviceInfo, config: &Config) -> Result<Self, UinputError> {
        let singletouch = create_singletouch(info)?;
        let touch = create_touch(info)?;
        let stylus = Stylus::new(info, config)?;

        Ok(Self { styli: StylusRegistry::new(stylus), touch, singletouch })
    }
}

fn create_stylus(info: &DeviceInfo, config: &Config) -> Result<UinputDevice, UinputError> {
    let res_x = match config.width {
        Some(width) => uinput::resolution(LOGICAL_WIDTH, width),
        None => 34,
    };

    let res_y = match config.height {
        Some(height) => uinput::resolution(LOGICAL_HEIGHT, height),
        None => 38,
    };

    UinputDevice::builder("IPTS Stylus", info.vendor, info.product, info.version as u16)?
        .enable_event_type(uinput::EV_KEY)?
        .enable_event_type(uinput::EV_ABS)?
        .enable_prop(uinput::INPUT_PROP_DIRECT)?
        .enable_prop(uinput::INPUT_PROP_POINTER)?
        .enable_key(uinput::BTN_TOUCH)?
        .enable_key(uinput::BTN_STYLUS)?
        .enable_key(uinput::BTN_TOOL_PEN)?
        .enable_key(uinput::BTN_TOOL_RUBBER)?
        .abs_axis(uinput::ABS_X, 0, LOGICAL_WIDTH, res_x)?
        .abs_axis(uinput::ABS_Y, 0, LOGICAL_HEIGHT, res_y)?
        .abs_axis(uinput::ABS_PRESSURE, 0, 4096, 0)?
        .abs_axis(uinput::ABS_TILT_X, -9000, 9000, 5730)?
        .abs_axis(uinput::ABS_TILT_Y, -9000, 9000, 5730)?
        .abs_axis(uinput::ABS_MISC, 0, 65535, 0)?
        .create()
}

fn create_touch(info: &DeviceInfo) -> Result<UinputDevice, UinputError> {
    let max_touch = i32::from(info.max_touch_points);

    UinputDevice::builder("IPTS Touch", info.vendor, info.product, info.version as u16)?
        .enable_event_type(uinput::EV_ABS)?
        .enable_prop(uinput::INPUT_PROP_DIRECT)?
        .abs_axis(uinput::ABS_MT_SLOT, 0, max_touch, 0)?
        .abs_axis(uinput::ABS_MT_TRACKING_ID, 0, max_touch, 0)?
        .abs_axis(uinput::ABS_MT_POSITION_X, 0, LOGICAL_WIDTH, 0)?
        .abs_axis(uinput::ABS_MT_POSITION_Y, 0, LOGICAL_HEIGHT, 0)?
        .create()
}

fn create_singletouch(info: &DeviceInfo) -> Result<UinputDevice, UinputError> {
    UinputDevice::builder("IPTS Singletouch", info.vendor, info.product, info.version as u16)?
        .enable_event_type(uinput::EV_KEY)?
        .enable_event_type(uinput::EV_ABS)?
        .enable_prop(uinput::INPUT_PROP_DIRECT)?
        .enable_key(uinput::BTN_TOUCH)?
        .abs_axis(uinput::ABS_X, 0, LOGICAL_WIDTH, 0)?
        .abs_axis(uinput::ABS_Y, 0, LOGICAL_HEIGHT, 0)?
        .create()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    fn switch(registry: &mut StylusRegistry<u32>, serial: u32) {
        let marker = serial.wrapping_add(1000);
        let result: Result<(), Infallible> = registry.switch(serial, || Ok(marker));
        result.unwrap();
    }

    #[test]
    fn first_real_serial_is_adopted() {
        let mut registry = StylusRegistry::new(0u32);

        switch(&mut registry, 0);
        switch(&mut registry, 0);
        assert_eq!(registry.active_serial(), 0);
        assert_eq!(registry.len(), 1);

        switch(&mut registry, 0x1234);
        assert_eq!(registry.active_serial(), 0x1234);
        assert_eq!(registry.len(), 1, "the uninitialized entry adopts, no new device");

        switch(&mut registry, 0x1234);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn second_pen_gets_its_own_entry() {
        let mut registry = StylusRegistry::new(0u32);

        switch(&mut registry, 0x1234);
        switch(&mut registry, 0x5678);

        assert_eq!(registry.active_serial(), 0x5678);
        assert_eq!(registry.len(), 2);
        assert_eq!(*registry.active_mut(), 0x5678 + 1000);
    }

    #[test]
    fn known_pen_switches_back_without_creating() {
        let mut registry = StylusRegistry::new(0u32);

        switch(&mut registry, 0x1234);
        switch(&mut registry, 0x5678);
        switch(&mut registry, 0x1234);

        assert_eq!(registry.active_serial(), 0x1234);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn create_failure_leaves_registry_unchanged() {
        let mut registry = StylusRegistry::new(0u32);
        switch(&mut registry, 0x1234);

        let result: Result<(), &str> = registry.switch(0x9999, || Err("no device"));
        assert!(result.is_err());

        assert_eq!(registry.active_serial(), 0x1234);
        assert_eq!(registry.len(), 1);
    }
}
