//! Touch frame handling: heatmap assembly and slot event emission.

use crate::processing::tracker::IDLE_INDEX;
use crate::protocol::payload::{self, PayloadFrame, Report};
use crate::protocol::touch::HeatmapDim;
use crate::protocol::{ParseError, Reader};
use crate::uinput::{
    ABS_MT_POSITION_X, ABS_MT_POSITION_Y, ABS_MT_SLOT, ABS_MT_TRACKING_ID, EV_ABS,
};

use super::{Daemon, Error};

impl Daemon {
    pub(super) fn handle_touch_frame(
        &mut self,
        reader: &mut Reader<'_>,
        frame: &PayloadFrame,
    ) -> Result<(), Error> {
        let mut consumed = 0;
        let mut dim: Option<HeatmapDim> = None;
        let mut filled: Option<(usize, usize)> = None;

        while consumed < frame.size {
            let report = Report::parse(reader)?;
            consumed = payload::advance_report(consumed, report, frame.size)?;

            match report.ty {
                payload::REPORT_TYPE_TOUCH_HEATMAP_DIM => {
                    dim = Some(HeatmapDim::parse(reader)?);
                }
                payload::REPORT_TYPE_TOUCH_HEATMAP => {
                    let size = usize::from(report.size);

                    let (width, height) = match dim {
                        Some(dim) => (usize::from(dim.width), usize::from(dim.height)),
                        None => {
                            log::debug!(target: "iptsd", "heatmap data without dimensions");
                            reader.skip(size)?;
                            continue;
                        }
                    };

                    // Single-row maps cannot be scaled into a plane.
                    if width < 2 || height < 2 || width * height != size {
                        return Err(Error::Parse(ParseError::HeatmapSize {
                            size,
                            width,
                            height,
                        }));
                    }

                    let hm = self.touch.heatmap(width, height);
                    reader.read_bytes(hm.data_mut())?;
                    filled = Some((width, height));
                }
                other => {
                    log::debug!(target: "iptsd", "ignoring touch report type {other:#06x}");
                    reader.skip(report.size as usize)?;
                }
            }
        }

        if let Some((width, height)) = filled {
            self.emit_touch_frame(width, height)?;
        }

        Ok(())
    }

    /// Run the pipeline on the filled heatmap and emit one event frame.
    ///
    /// Unstable contacts keep their slot but skip coordinates, holding the
    /// last reported position. Palms are lifted, and with `BlockOnPalm`
    /// set, one palm lifts every contact of the frame.
    fn emit_touch_frame(&mut self, width: usize, height: usize) -> Result<(), Error> {
        let block_on_palm = self.config.block_on_palm;

        let points = self.touch.process(width, height);
        let any_palm = points.iter().any(|point| point.is_palm);

        let device = &self.devices.touch;

        for point in points {
            device.emit(EV_ABS, ABS_MT_SLOT, point.slot)?;

            if point.index != IDLE_INDEX && !point.is_stable {
                continue;
            }

            if point.is_palm || (block_on_palm && any_palm) {
                device.emit(EV_ABS, ABS_MT_TRACKING_ID, -1)?;
                device.emit(EV_ABS, ABS_MT_POSITION_X, 0)?;
                device.emit(EV_ABS, ABS_MT_POSITION_Y, 0)?;
                continue;
            }

            device.emit(EV_ABS, ABS_MT_TRACKING_ID, point.index)?;
            device.emit(EV_ABS, ABS_MT_POSITION_X, point.x)?;
            device.emit(EV_ABS, ABS_MT_POSITION_Y, point.y)?;
        }

        device.syn()?;
        Ok(())
    }
}
