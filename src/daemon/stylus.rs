//! Stylus frame handling.

use crate::processing::stylus;
use crate::protocol::payload::{self, PayloadFrame, Report};
use crate::protocol::stylus::{
    StylusData, StylusDataNoTilt, StylusGroup, StylusGroupSerial, StylusMode,
};
use crate::protocol::Reader;
use crate::uinput::{
    ABS_MISC, ABS_PRESSURE, ABS_TILT_X, ABS_TILT_Y, ABS_X, ABS_Y, BTN_STYLUS, BTN_TOOL_PEN,
    BTN_TOOL_RUBBER, BTN_TOUCH, EV_ABS, EV_KEY,
};

use super::devices::Stylus;
use super::{Daemon, Error};

impl Daemon {
    pub(super) fn handle_stylus_frame(
        &mut self,
        reader: &mut Reader<'_>,
        frame: &PayloadFrame,
    ) -> Result<(), Error> {
        let mut consumed = 0;

        while consumed < frame.size {
            let report = Report::parse(reader)?;
            consumed = payload::advance_report(consumed, report, frame.size)?;

            match report.ty {
                payload::REPORT_TYPE_STYLUS_NO_TILT => self.stylus_no_tilt(reader)?,
                payload::REPORT_TYPE_STYLUS_TILT => self.stylus_tilt(reader)?,
                payload::REPORT_TYPE_STYLUS_TILT_SERIAL => self.stylus_tilt_serial(reader)?,
                other => {
                    log::debug!(target: "iptsd", "ignoring stylus report type {other:#06x}");
                    reader.skip(report.size as usize)?;
                }
            }
        }

        Ok(())
    }

    /// The old report format: no tilt, but it does carry the serial, and
    /// serial switching applies to it like to the tilt variant.
    fn stylus_no_tilt(&mut self, reader: &mut Reader<'_>) -> Result<(), Error> {
        let group = StylusGroupSerial::parse(reader)?;
        self.switch_stylus(group.serial)?;

        for _ in 0..group.elements {
            let data = StylusDataNoTilt::parse(reader)?;
            self.emit_stylus(data.widen())?;
        }

        Ok(())
    }

    fn stylus_tilt(&mut self, reader: &mut Reader<'_>) -> Result<(), Error> {
        let group = StylusGroup::parse(reader)?;

        for _ in 0..group.elements {
            let data = StylusData::parse(reader)?;
            self.emit_stylus(data)?;
        }

        Ok(())
    }

    fn stylus_tilt_serial(&mut self, reader: &mut Reader<'_>) -> Result<(), Error> {
        let group = StylusGroupSerial::parse(reader)?;
        self.switch_stylus(group.serial)?;

        for _ in 0..group.elements {
            let data = StylusData::parse(reader)?;
            self.emit_stylus(data)?;
        }

        Ok(())
    }

    fn switch_stylus(&mut self, serial: u32) -> Result<(), Error> {
        if self.devices.styli.active_serial() == serial {
            return Ok(());
        }

        let info = self.info;
        let config = self.config;

        self.devices.styli.switch(serial, || {
            log::info!(target: "iptsd", "new stylus {serial:#010x}, creating a device for it");
            Stylus::new(&info, &config)
        })?;

        Ok(())
    }

    fn emit_stylus(&mut self, data: StylusData) -> Result<(), Error> {
        let prox = data.mode.contains(StylusMode::PROXIMITY);
        let touch = data.mode.contains(StylusMode::TOUCH);
        let button = data.mode.contains(StylusMode::BUTTON);
        let rubber = data.mode.contains(StylusMode::RUBBER);

        // The rubber end shows up as proximity plus the rubber bit; the
        // tip never sets it.
        let pen = prox && !rubber;
        let eraser = prox && rubber;

        let stylus = self.devices.styli.active_mut();

        let (sx, sy) = stylus.filter.smooth(i32::from(data.x), i32::from(data.y));
        let (tx, ty) = stylus::tilt(i32::from(data.altitude), i32::from(data.azimuth));

        if !prox {
            stylus.filter.flush();
        }

        let device = &stylus.device;

        device.emit(EV_KEY, BTN_TOUCH, i32::from(touch))?;
        device.emit(EV_KEY, BTN_TOOL_PEN, i32::from(pen))?;
        device.emit(EV_KEY, BTN_TOOL_RUBBER, i32::from(eraser))?;
        device.emit(EV_KEY, BTN_STYLUS, i32::from(button))?;

        device.emit(EV_ABS, ABS_X, sx)?;
        device.emit(EV_ABS, ABS_Y, sy)?;
        device.emit(EV_ABS, ABS_PRESSURE, i32::from(data.pressure))?;
        device.emit(EV_ABS, ABS_MISC, i32::from(data.timestamp))?;

        device.emit(EV_ABS, ABS_TILT_X, tx)?;
        device.emit(EV_ABS, ABS_TILT_Y, ty)?;

        device.syn()?;
        Ok(())
    }
}
