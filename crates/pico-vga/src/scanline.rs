//! Buffer selection and line requests, run from the pixel DMA completion.
//!
//! Every physical display line ends with a pixel completion. The pipeline
//! counts them, maps the count onto a logical line through the vertical
//! replication factor, re-arms the DMA with that line's buffer and, when a
//! new logical line starts, asks the render core for the one after it.
//!
//! Lines 0 and 1 are requested at the start of each frame, during vertical
//! blanking, so the first two buffers are full before the first visible
//! line. From then on logical line `n` starting requests line `n + 1`, into
//! the buffer that is not being scanned.

use crate::{BufferParity, LineRequest, LineSender, VgaParams};

#[derive(Debug, Clone)]
pub struct ScanlinePipeline {
    active_lines: u32,
    v_scale: u32,
    logical_lines: u32,
    display_line: u32,
    armed: BufferParity,
}

impl ScanlinePipeline {
    #[must_use]
    pub fn new(params: &VgaParams) -> Self {
        Self {
            active_lines: params.active_lines(),
            v_scale: params.v_pixel_scale.max(1),
            logical_lines: params.v_virtual_pixels,
            display_line: 0,
            armed: BufferParity::Even,
        }
    }

    /// Frame boundary: request the first two logical lines and rewind.
    ///
    /// Returns a parity to re-arm only if the frame ended early, which
    /// happens when pixel completions were missed.
    pub fn start_frame(&mut self, sender: &mut LineSender) -> Option<BufferParity> {
        let resync = self.display_line != 0 && self.display_line != self.active_lines;
        if resync {
            log::debug!(
                "frame ended after {} of {} display lines, resyncing",
                self.display_line,
                self.active_lines
            );
        }
        self.display_line = 0;

        self.request(sender, 0);
        if self.logical_lines > 1 {
            self.request(sender, 1);
        }

        if resync {
            self.armed = BufferParity::Even;
            Some(self.armed)
        } else {
            None
        }
    }

    /// A physical display line finished. Returns the buffer the pixel DMA
    /// should read for the next one.
    pub fn on_line_complete(&mut self, sender: &mut LineSender) -> BufferParity {
        self.display_line += 1;
        if self.display_line >= self.active_lines {
            // Blanking follows; line 0 lives in the even buffer.
            self.armed = BufferParity::Even;
            return self.armed;
        }

        let logical = self.display_line / self.v_scale;
        let repeat = self.display_line % self.v_scale;
        if logical < self.logical_lines {
            self.armed = BufferParity::of_line(logical);
            if repeat == 0 && logical + 1 < self.logical_lines {
                self.request(sender, logical + 1);
            }
        }
        self.armed
    }

    #[allow(clippy::cast_possible_truncation)]
    fn request(&self, sender: &mut LineSender, line: u32) {
        // Drops are counted by the sender; the old buffer content stays on screen.
        let _ = sender.try_send(LineRequest::new(line as u16));
    }

    /// Physical display lines completed this frame.
    #[must_use]
    pub const fn display_line(&self) -> u32 {
        self.display_line
    }

    #[must_use]
    pub const fn armed(&self) -> BufferParity {
        self.armed
    }

    #[must_use]
    pub const fn logical_lines(&self) -> u32 {
        self.logical_lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{VgaMode, line_channel};

    fn drain(rx: &mut crate::LineReceiver) -> Vec<u16> {
        std::iter::from_fn(|| rx.try_recv()).map(|r| r.line).collect()
    }

    #[test]
    fn frame_start_requests_first_two_lines() {
        let params = VgaParams::new(VgaMode::Vga640x480At60, 2);
        let mut pipeline = ScanlinePipeline::new(&params);
        let (mut tx, mut rx) = line_channel(8);

        assert_eq!(pipeline.start_frame(&mut tx), None);
        assert_eq!(drain(&mut rx), vec![0, 1]);
        assert_eq!(pipeline.armed(), BufferParity::Even);
    }

    #[test]
    fn replication_holds_buffer_for_scale_lines() {
        let params = VgaParams::new(VgaMode::Vga640x480At60, 2);
        let mut pipeline = ScanlinePipeline::new(&params);
        let (mut tx, mut rx) = line_channel(8);
        pipeline.start_frame(&mut tx);
        drain(&mut rx);

        // display line 1: still logical 0
        assert_eq!(pipeline.on_line_complete(&mut tx), BufferParity::Even);
        assert!(drain(&mut rx).is_empty());
        // display line 2: logical 1 starts, line 2 requested
        assert_eq!(pipeline.on_line_complete(&mut tx), BufferParity::Odd);
        assert_eq!(drain(&mut rx), vec![2]);
        assert_eq!(pipeline.on_line_complete(&mut tx), BufferParity::Odd);
        assert_eq!(pipeline.on_line_complete(&mut tx), BufferParity::Even);
        assert_eq!(drain(&mut rx), vec![3]);
    }

    #[test]
    fn each_line_requested_once_per_frame() {
        let params = VgaParams::new(VgaMode::Vga640x480At60, 2);
        let mut pipeline = ScanlinePipeline::new(&params);
        let (mut tx, mut rx) = line_channel(8);

        let mut seen = Vec::new();
        pipeline.start_frame(&mut tx);
        seen.extend(drain(&mut rx));
        for _ in 0..params.active_lines() {
            pipeline.on_line_complete(&mut tx);
            seen.extend(drain(&mut rx));
        }
        assert_eq!(seen, (0..240).collect::<Vec<u16>>());
        assert_eq!(pipeline.armed(), BufferParity::Even);
        assert_eq!(tx.dropped(), 0);

        // a complete frame needs no resync
        assert_eq!(pipeline.start_frame(&mut tx), None);
    }

    #[test]
    fn short_frame_resyncs_to_even() {
        let params = VgaParams::new(VgaMode::Vga640x480At60, 1);
        let mut pipeline = ScanlinePipeline::new(&params);
        let (mut tx, _rx) = line_channel(8);
        pipeline.start_frame(&mut tx);
        pipeline.on_line_complete(&mut tx);
        assert_eq!(pipeline.armed(), BufferParity::Odd);

        assert_eq!(pipeline.start_frame(&mut tx), Some(BufferParity::Even));
        assert_eq!(pipeline.display_line(), 0);
    }

    #[test]
    fn uneven_replication_keeps_last_buffer() {
        // 1024 lines at scale 3: 341 logical lines, one spare physical line
        let params = VgaParams::new(VgaMode::Sxga1280x1024At60, 3);
        let mut pipeline = ScanlinePipeline::new(&params);
        let (mut tx, _rx) = line_channel(8);
        pipeline.start_frame(&mut tx);
        let mut parity = BufferParity::Even;
        for _ in 0..1023 {
            parity = pipeline.on_line_complete(&mut tx);
        }
        // display line 1023 maps past the last logical line (340, even)
        assert_eq!(parity, BufferParity::Even);
        assert_eq!(pipeline.on_line_complete(&mut tx), BufferParity::Even);
    }
}
