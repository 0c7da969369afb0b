//! Single-touch HID report handling.

use crate::processing::touch::{LOGICAL_HEIGHT, LOGICAL_WIDTH};
use crate::protocol::singletouch::{SingletouchData, SINGLETOUCH_MAX};
use crate::protocol::Reader;
use crate::uinput::{ABS_X, ABS_Y, BTN_TOUCH, EV_ABS, EV_KEY};

use super::{Daemon, Error};

fn scale(value: u16, range: i32) -> i32 {
    i32::from(value) * range / i32::from(SINGLETOUCH_MAX)
}

impl Daemon {
    pub(super) fn handle_singletouch(&mut self, reader: &mut Reader<'_>) -> Result<(), Error> {
        let data = SingletouchData::parse(reader)?;
        let device = &self.devices.singletouch;

        device.emit(EV_KEY, BTN_TOUCH, i32::from(data.touch))?;
        device.emit(EV_ABS, ABS_X, scale(data.x, LOGICAL_WIDTH))?;
        device.emit(EV_ABS, ABS_Y, scale(data.y, LOGICAL_HEIGHT))?;

        device.syn()?;
        Ok(())
    }
}
