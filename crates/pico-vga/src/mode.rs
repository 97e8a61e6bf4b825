//! VGA timing modes and the video parameters derived from them.
//!
//! Timings follow the usual VESA/DMT tables. A mode is turned into a
//! [`VgaParams`] once, at start-up, together with the pixel replication
//! factor; the result is never modified afterwards.

#![allow(clippy::cast_precision_loss)]

use std::time::Duration;

use crate::VgaError;

/// PIO clocks the RGB program spends per pixel outside its delay slot.
pub const RGB_LOOP_TICKS: u32 = 2;

/// Largest delay a PIO instruction can encode.
pub const RGB_MAX_DELAY: u32 = 31;

/// Supported timing modes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VgaMode {
    /// 640×480 @ 60 Hz, 25.175 MHz.
    #[default]
    Vga640x480At60,
    /// 640×400 @ 70 Hz, 25.175 MHz.
    Vga640x400At70,
    /// 800×600 @ 60 Hz, 40 MHz.
    Svga800x600At60,
    /// 1024×768 @ 60 Hz, 65 MHz.
    Xga1024x768At60,
    /// 1280×1024 @ 60 Hz, 108 MHz.
    Sxga1280x1024At60,
}

impl VgaMode {
    pub const ALL: [VgaMode; 5] = [
        VgaMode::Vga640x480At60,
        VgaMode::Vga640x400At70,
        VgaMode::Svga800x600At60,
        VgaMode::Xga1024x768At60,
        VgaMode::Sxga1280x1024At60,
    ];

    /// True pixel clock in kHz.
    #[must_use]
    pub const fn pixel_clock_khz(self) -> u32 {
        match self {
            Self::Vga640x480At60 | Self::Vga640x400At70 => 25_175,
            Self::Svga800x600At60 => 40_000,
            Self::Xga1024x768At60 => 65_000,
            Self::Sxga1280x1024At60 => 108_000,
        }
    }

    /// Horizontal timing in pixels.
    #[must_use]
    pub const fn horizontal(self) -> SyncParams {
        match self {
            Self::Vga640x480At60 | Self::Vga640x400At70 => SyncParams::timing(640, 16, 96, 48, false),
            Self::Svga800x600At60 => SyncParams::timing(800, 40, 128, 88, true),
            Self::Xga1024x768At60 => SyncParams::timing(1024, 24, 136, 160, false),
            Self::Sxga1280x1024At60 => SyncParams::timing(1280, 48, 112, 248, true),
        }
    }

    /// Vertical timing in lines.
    #[must_use]
    pub const fn vertical(self) -> SyncParams {
        match self {
            Self::Vga640x480At60 => SyncParams::timing(480, 10, 2, 33, false),
            Self::Vga640x400At70 => SyncParams::timing(400, 12, 2, 35, true),
            Self::Svga800x600At60 => SyncParams::timing(600, 1, 4, 23, true),
            Self::Xga1024x768At60 => SyncParams::timing(768, 3, 6, 29, false),
            Self::Sxga1280x1024At60 => SyncParams::timing(1024, 1, 3, 38, true),
        }
    }
}

/// Timing of one axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncParams {
    pub display_pixels: u32,
    pub front_porch_pixels: u32,
    pub sync_pixels: u32,
    pub back_porch_pixels: u32,
    /// Sum of the four phases.
    pub total_pixels: u32,
    /// Line rate (horizontal) or frame rate (vertical).
    pub freq_hz: f32,
    /// Sync pulse polarity: `true` drives the pin high during sync.
    pub sync_high: bool,
}

impl SyncParams {
    const fn timing(display: u32, front_porch: u32, sync: u32, back_porch: u32, sync_high: bool) -> Self {
        Self {
            display_pixels: display,
            front_porch_pixels: front_porch,
            sync_pixels: sync,
            back_porch_pixels: back_porch,
            total_pixels: display + front_porch + sync + back_porch,
            freq_hz: 0.0,
            sync_high,
        }
    }
}

/// Everything the timing generator, the pixel pipeline and the scanline
/// renderer need to know about the output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VgaParams {
    pub mode: VgaMode,
    pub pixel_clock_khz: u32,
    pub h_sync: SyncParams,
    pub v_sync: SyncParams,
    /// Physical pixels per logical pixel, horizontally.
    pub h_pixel_scale: u32,
    /// Physical lines per logical line.
    pub v_pixel_scale: u32,
    /// Logical pixels per line (width of a scanline buffer).
    pub h_virtual_pixels: u32,
    /// Logical lines per frame.
    pub v_virtual_pixels: u32,
    pub pio_divider: f32,
    pub pio_freq_khz: f32,
    pub pio_clocks_per_pixel: f32,
    pub pio_clocks_per_scaled_pixel: f32,
}

impl VgaParams {
    /// Parameters for `mode` with the same replication factor on both axes.
    ///
    /// The PIO fields stay zero until [`with_system_clock`](Self::with_system_clock).
    #[must_use]
    pub fn new(mode: VgaMode, pixel_scale: u32) -> Self {
        let scale = pixel_scale.max(1);
        let pixel_clock_khz = mode.pixel_clock_khz();

        let mut h_sync = mode.horizontal();
        let mut v_sync = mode.vertical();
        h_sync.freq_hz = pixel_clock_khz as f32 * 1000.0 / h_sync.total_pixels as f32;
        v_sync.freq_hz = h_sync.freq_hz / v_sync.total_pixels as f32;

        Self {
            mode,
            pixel_clock_khz,
            h_sync,
            v_sync,
            h_pixel_scale: scale,
            v_pixel_scale: scale,
            h_virtual_pixels: h_sync.display_pixels / scale,
            v_virtual_pixels: v_sync.display_pixels / scale,
            pio_divider: 1.0,
            pio_freq_khz: 0.0,
            pio_clocks_per_pixel: 0.0,
            pio_clocks_per_scaled_pixel: 0.0,
        }
    }

    /// Lowest PIO clock that can shift out one scaled pixel per RGB loop.
    #[must_use]
    pub fn minimum_pio_clock_khz(&self) -> u32 {
        (self.pixel_clock_khz * RGB_LOOP_TICKS).div_ceil(self.h_pixel_scale)
    }

    /// Fill in the PIO clocking for a system clock of `sys_clock_khz`.
    ///
    /// The clock divider is raised until one scaled pixel fits in the RGB
    /// program's delay slot.
    pub fn with_system_clock(mut self, sys_clock_khz: u32) -> Result<Self, VgaError> {
        let required_khz = self.minimum_pio_clock_khz();
        if sys_clock_khz < required_khz {
            return Err(VgaError::ClockTooSlow {
                required_khz,
                available_khz: sys_clock_khz,
            });
        }

        let sys = sys_clock_khz as f32;
        let per_scaled = |divider: f32| sys / divider * self.h_pixel_scale as f32 / self.pixel_clock_khz as f32;

        let mut divider = 1.0_f32;
        while per_scaled(divider) > (RGB_MAX_DELAY + RGB_LOOP_TICKS) as f32 {
            divider += 1.0;
        }

        self.pio_divider = divider;
        self.pio_freq_khz = sys / divider;
        self.pio_clocks_per_pixel = self.pio_freq_khz / self.pixel_clock_khz as f32;
        self.pio_clocks_per_scaled_pixel = per_scaled(divider);
        Ok(self)
    }

    /// Physical lines that carry pixels.
    #[must_use]
    pub fn active_lines(&self) -> u32 {
        self.v_sync.display_pixels
    }

    /// Total lines per frame, blanking included.
    #[must_use]
    pub fn total_lines(&self) -> u32 {
        self.v_sync.total_pixels
    }

    /// Time the render core has to produce one logical line: the display
    /// time of `v_pixel_scale` physical lines.
    #[must_use]
    pub fn render_deadline(&self) -> Duration {
        let nanos = u64::from(self.v_pixel_scale) * u64::from(self.h_sync.total_pixels) * 1_000_000
            / u64::from(self.pixel_clock_khz);
        Duration::from_nanos(nanos)
    }
}
