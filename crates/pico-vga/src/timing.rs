//! Vertical line-phase state machine and the sync command sequences.
//!
//! A frame is four contiguous bands of lines:
//!
//! ```text
//! 0 ─ vsync ─┬─ back porch ─┬─ active ─────────┬─ front porch ─┐ total
//!            vsync_end      back_porch_end     active_end      └─► 0
//! ```
//!
//! Boundaries are cumulative sums of the vertical timing, so every line
//! falls in exactly one band.

#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]

use crate::command::{AuxInstruction, MAX_PHASE_TICKS, SETUP_OVERHEAD, TimingCommand, sync_level};
use crate::{SyncParams, VgaError, VgaParams};

/// Which vertical band a line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineBand {
    VerticalSync,
    BackPorch,
    Active,
    FrontPorch,
}

impl LineBand {
    /// Command sequence that drives a line of this band.
    #[must_use]
    pub const fn sequence(self) -> SequenceKind {
        match self {
            Self::VerticalSync => SequenceKind::VSync,
            Self::BackPorch | Self::FrontPorch => SequenceKind::Porch,
            Self::Active => SequenceKind::Active,
        }
    }
}

/// One of the three per-line command sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SequenceKind {
    /// Visible line: vsync idle, pixels released on the active phase.
    Active,
    /// Vertical porch line: vsync idle, no pixels.
    Porch,
    /// Vertical sync line: vsync asserted for the whole line.
    VSync,
}

/// Horizontal phases, in the order their words appear in a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HorizontalPhase {
    Active = 0,
    FrontPorch = 1,
    Sync = 2,
    BackPorch = 3,
}

impl HorizontalPhase {
    pub const ALL: [HorizontalPhase; 4] = [
        HorizontalPhase::Active,
        HorizontalPhase::FrontPorch,
        HorizontalPhase::Sync,
        HorizontalPhase::BackPorch,
    ];

    const fn name(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::FrontPorch => "front porch",
            Self::Sync => "hsync",
            Self::BackPorch => "back porch",
        }
    }

    const fn pixels(self, h: &SyncParams) -> u32 {
        match self {
            Self::Active => h.display_pixels,
            Self::FrontPorch => h.front_porch_pixels,
            Self::Sync => h.sync_pixels,
            Self::BackPorch => h.back_porch_pixels,
        }
    }
}

/// Band boundaries of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineBands {
    vsync_end: u32,
    back_porch_end: u32,
    active_end: u32,
    total: u32,
}

impl LineBands {
    #[must_use]
    pub const fn new(v: &SyncParams) -> Self {
        let vsync_end = v.sync_pixels;
        let back_porch_end = vsync_end + v.back_porch_pixels;
        let active_end = back_porch_end + v.display_pixels;
        Self {
            vsync_end,
            back_porch_end,
            active_end,
            total: active_end + v.front_porch_pixels,
        }
    }

    #[must_use]
    pub const fn band_of(&self, line: u32) -> LineBand {
        if line < self.vsync_end {
            LineBand::VerticalSync
        } else if line < self.back_porch_end {
            LineBand::BackPorch
        } else if line < self.active_end {
            LineBand::Active
        } else {
            LineBand::FrontPorch
        }
    }

    /// First line of each band: vsync, back porch, active, front porch.
    #[must_use]
    pub const fn starts(&self) -> [u32; 4] {
        [0, self.vsync_end, self.back_porch_end, self.active_end]
    }

    #[must_use]
    pub const fn total(&self) -> u32 {
        self.total
    }
}

/// The three command sequences, four words each, built once per mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSequences {
    active: [u32; 4],
    porch: [u32; 4],
    vsync: [u32; 4],
}

impl SyncSequences {
    /// Build the sequences for `params`.
    ///
    /// Each phase waits `round(clocks_per_pixel × pixels) − SETUP_OVERHEAD`
    /// PIO clocks. `params` must have its PIO clocking filled in.
    pub fn build(params: &VgaParams) -> Result<Self, VgaError> {
        let h = &params.h_sync;
        let v = &params.v_sync;

        let mut ticks = [0u32; 4];
        for phase in HorizontalPhase::ALL {
            let raw = (params.pio_clocks_per_pixel * phase.pixels(h) as f32).round() as u32;
            if raw < SETUP_OVERHEAD {
                return Err(VgaError::PhaseTooShort {
                    phase: phase.name(),
                    ticks: raw,
                    overhead: SETUP_OVERHEAD,
                });
            }
            let wait = raw - SETUP_OVERHEAD;
            if wait > MAX_PHASE_TICKS {
                return Err(VgaError::PhaseTooLong {
                    phase: phase.name(),
                    ticks: wait,
                    max: MAX_PHASE_TICKS,
                });
            }
            ticks[phase as usize] = wait;
        }

        let sequence = |kind: SequenceKind| -> [u32; 4] {
            HorizontalPhase::ALL.map(|phase| {
                let exec = if kind == SequenceKind::Active && phase == HorizontalPhase::Active {
                    AuxInstruction::StartPixels
                } else {
                    AuxInstruction::Nop
                };
                TimingCommand {
                    ticks: ticks[phase as usize],
                    hsync: sync_level(phase == HorizontalPhase::Sync, h.sync_high),
                    vsync: sync_level(kind == SequenceKind::VSync, v.sync_high),
                    exec,
                }
                .to_word()
            })
        };

        Ok(Self {
            active: sequence(SequenceKind::Active),
            porch: sequence(SequenceKind::Porch),
            vsync: sequence(SequenceKind::VSync),
        })
    }

    #[must_use]
    pub fn get(&self, kind: SequenceKind) -> &[u32; 4] {
        match kind {
            SequenceKind::Active => &self.active,
            SequenceKind::Porch => &self.porch,
            SequenceKind::VSync => &self.vsync,
        }
    }
}

/// Result of one timing completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingStep {
    /// Line whose sequence is fed next.
    pub line: u32,
    pub band: LineBand,
    pub sequence: SequenceKind,
    /// The counter wrapped to line 0.
    pub frame_started: bool,
}

/// Line counter advanced once per timing DMA completion.
///
/// Line 0 (vsync) is armed at start-up; every completion moves to the next
/// line and reports which sequence to feed.
#[derive(Debug, Clone)]
pub struct TimingGenerator {
    bands: LineBands,
    line: u32,
    frame: u64,
}

impl TimingGenerator {
    #[must_use]
    pub const fn new(bands: LineBands) -> Self {
        Self {
            bands,
            line: 0,
            frame: 0,
        }
    }

    /// Sequence armed before the first completion.
    #[must_use]
    pub const fn initial_sequence(&self) -> SequenceKind {
        self.bands.band_of(0).sequence()
    }

    pub fn advance(&mut self) -> TimingStep {
        self.line += 1;
        let frame_started = self.line >= self.bands.total;
        if frame_started {
            self.line = 0;
            self.frame += 1;
        }
        let band = self.bands.band_of(self.line);
        TimingStep {
            line: self.line,
            band,
            sequence: band.sequence(),
            frame_started,
        }
    }

    #[must_use]
    pub const fn line(&self) -> u32 {
        self.line
    }

    /// Frames completed.
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    #[must_use]
    pub const fn bands(&self) -> &LineBands {
        &self.bands
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VgaMode;

    fn params_640() -> VgaParams {
        VgaParams::new(VgaMode::Vga640x480At60, 2)
            .with_system_clock(252_000)
            .unwrap()
    }

    #[test]
    fn band_boundaries_640x480() {
        let bands = LineBands::new(&VgaMode::Vga640x480At60.vertical());
        // vsync 2, back porch 33, active 480, front porch 10
        assert_eq!(bands.starts(), [0, 2, 35, 515]);
        assert_eq!(bands.total(), 525);

        let cases = [
            (0, LineBand::VerticalSync),
            (1, LineBand::VerticalSync),
            (2, LineBand::BackPorch),
            (34, LineBand::BackPorch),
            (35, LineBand::Active),
            (514, LineBand::Active),
            (515, LineBand::FrontPorch),
            (524, LineBand::FrontPorch),
        ];
        for (line, band) in cases {
            assert_eq!(bands.band_of(line), band, "line {line}");
        }
    }

    #[test]
    fn wrap_returns_to_vsync() {
        let bands = LineBands::new(&VgaMode::Vga640x480At60.vertical());
        let mut timing = TimingGenerator::new(bands);
        assert_eq!(timing.initial_sequence(), SequenceKind::VSync);

        for _ in 0..524 {
            assert!(!timing.advance().frame_started);
        }
        assert_eq!(timing.line(), 524);

        let step = timing.advance();
        assert!(step.frame_started);
        assert_eq!(step.line, 0);
        assert_eq!(step.sequence, SequenceKind::VSync);
        assert_eq!(timing.frame(), 1);
    }

    #[test]
    fn sequences_carry_sync_levels() {
        let params = params_640();
        let seqs = SyncSequences::build(&params).unwrap();
        let decode = |w: u32| TimingCommand::from_word(w).unwrap();

        // Negative polarity: idle pins high
        let active: Vec<_> = seqs.get(SequenceKind::Active).iter().map(|&w| decode(w)).collect();
        assert!(active.iter().all(|c| c.vsync));
        assert_eq!(active.iter().map(|c| c.hsync).collect::<Vec<_>>(), [true, true, false, true]);
        assert_eq!(active[0].exec, AuxInstruction::StartPixels);
        assert!(active[1..].iter().all(|c| c.exec == AuxInstruction::Nop));

        let porch: Vec<_> = seqs.get(SequenceKind::Porch).iter().map(|&w| decode(w)).collect();
        assert!(porch.iter().all(|c| c.vsync && c.exec == AuxInstruction::Nop));

        let vsync: Vec<_> = seqs.get(SequenceKind::VSync).iter().map(|&w| decode(w)).collect();
        assert!(vsync.iter().all(|c| !c.vsync));
        assert!(!vsync[2].hsync);
    }

    #[test]
    fn phase_ticks_subtract_overhead() {
        let params = params_640();
        let seqs = SyncSequences::build(&params).unwrap();
        let cpp = params.pio_clocks_per_pixel;
        let pixels = [640.0_f32, 16.0, 96.0, 48.0];
        for (word, px) in seqs.get(SequenceKind::Porch).iter().zip(pixels) {
            let expected = (cpp * px).round() as u32 - SETUP_OVERHEAD;
            assert_eq!(TimingCommand::from_word(*word).unwrap().ticks, expected);
        }
    }

    #[test]
    fn positive_polarity_mode() {
        let params = VgaParams::new(VgaMode::Svga800x600At60, 2)
            .with_system_clock(240_000)
            .unwrap();
        let seqs = SyncSequences::build(&params).unwrap();
        let sync_word = TimingCommand::from_word(seqs.get(SequenceKind::VSync)[2]).unwrap();
        assert!(sync_word.hsync && sync_word.vsync);
        let idle = TimingCommand::from_word(seqs.get(SequenceKind::Porch)[0]).unwrap();
        assert!(!idle.hsync && !idle.vsync);
    }

    #[test]
    fn unclocked_params_are_rejected() {
        let params = VgaParams::new(VgaMode::Vga640x480At60, 1);
        assert!(matches!(
            SyncSequences::build(&params),
            Err(VgaError::PhaseTooShort { phase: "active", .. })
        ));
    }

    #[test]
    fn overlong_phase_is_rejected() {
        // 640 px at 31 clocks each does not fit 14 bits
        let mut params = VgaParams::new(VgaMode::Vga640x480At60, 1);
        params.pio_clocks_per_pixel = 31.0;
        assert!(matches!(
            SyncSequences::build(&params),
            Err(VgaError::PhaseTooLong { phase: "active", .. })
        ));
    }
}
