//! The daemon: virtual devices, frame handlers and the main loop.

pub mod devices;
pub mod run;

mod singletouch;
mod stylus;
mod touch;

use crate::config::{Config, ConfigError};
use crate::device::{DeviceError, DeviceInfo};
use crate::processing::TouchProcessor;
use crate::protocol::data::{self, Data};
use crate::protocol::payload::{self, Payload, PayloadFrame};
use crate::protocol::{ParseError, Reader};
use crate::uinput::UinputError;

use self::devices::VirtualDevices;

pub use self::run::run;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Uinput(#[from] UinputError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Everything the daemon needs to turn one raw frame into input events.
#[derive(Debug)]
pub struct Daemon {
    info: DeviceInfo,
    config: Config,
    devices: VirtualDevices,
    touch: TouchProcessor,
}

impl Daemon {
    pub fn new(info: DeviceInfo, config: Config) -> Result<Self, Error> {
        let devices = VirtualDevices::new(&info, &config)?;
        let touch = TouchProcessor::new(
            usize::from(info.max_touch_points),
            config.invert_x,
            config.invert_y,
        );

        Ok(Self { info, config, devices, touch })
    }

    /// Decode and dispatch one raw frame.
    ///
    /// Errors out of here are frame scoped: the caller logs them, the
    /// frame is dropped and the loop continues with the next one.
    pub fn handle(&mut self, frame: &[u8]) -> Result<(), Error> {
        let mut reader = Reader::new(frame);
        let header = Data::parse(&mut reader)?;

        match header.ty {
            data::DATA_TYPE_PAYLOAD => self.handle_payload(&mut reader),
            data::DATA_TYPE_HID_REPORT => self.handle_hid(&mut reader),
            other => {
                log::debug!(target: "iptsd", "ignoring data frame type {other}");
                Ok(())
            }
        }
    }

    fn handle_payload(&mut self, reader: &mut Reader<'_>) -> Result<(), Error> {
        let header = Payload::parse(reader)?;

        for _ in 0..header.frames {
            let frame = PayloadFrame::parse(reader)?;

            match frame.ty {
                payload::FRAME_TYPE_STYLUS => self.handle_stylus_frame(reader, &frame)?,
                payload::FRAME_TYPE_TOUCH => self.handle_touch_frame(reader, &frame)?,
                other => {
                    log::debug!(target: "iptsd", "ignoring payload frame type {other:#x}");
                    reader.skip(frame.size as usize)?;
                }
            }
        }

        Ok(())
    }

    fn handle_hid(&mut self, reader: &mut Reader<'_>) -> Result<(), Error> {
        let id = reader.read_u8()?;

        // Everything other than the single-touch report is ignored for now.
        if id != data::HID_REPORT_SINGLETOUCH {
            return Ok(());
        }

        self.handle_singletouch(reader)
    }
}
