//! Headless VGA capture.
//!
//! Drives the simulated scanout with a built-in test pattern and writes the
//! result as PNG.
//!
//! ```text
//! vga-capture --mode 640x480 --scale 2 --frames 2 --screenshot out.png
//! ```

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use pico_vga::capture;
use pico_vga::{
    LINE_FIFO_DEPTH, RenderCore, ScanlineBuffers, SimulatedScanout, Vga, VgaInitParams, VgaMode, VgaParams,
    line_channel,
};

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    #[value(name = "640x480")]
    Vga640x480,
    #[value(name = "640x400")]
    Vga640x400,
    #[value(name = "800x600")]
    Svga800x600,
    #[value(name = "1024x768")]
    Xga1024x768,
    #[value(name = "1280x1024")]
    Sxga1280x1024,
}

impl From<Mode> for VgaMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Vga640x480 => VgaMode::Vga640x480At60,
            Mode::Vga640x400 => VgaMode::Vga640x400At70,
            Mode::Svga800x600 => VgaMode::Svga800x600At60,
            Mode::Xga1024x768 => VgaMode::Xga1024x768At60,
            Mode::Sxga1280x1024 => VgaMode::Sxga1280x1024At60,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Pattern {
    /// Eight vertical colour bars
    Bars,
    /// 8×8 checkerboard
    Checker,
    /// Red across, blue down
    Gradient,
}

#[derive(Parser)]
struct Args {
    /// Timing mode
    #[arg(long, value_enum, default_value = "640x480")]
    mode: Mode,

    /// Pixel replication factor on both axes
    #[arg(long, default_value_t = 2)]
    scale: u32,

    /// System clock in kHz
    #[arg(long, default_value_t = 252_000)]
    sys_clock_khz: u32,

    /// Frames to run before capturing
    #[arg(long, default_value_t = 1)]
    frames: u32,

    /// Save the last frame as PNG
    #[arg(long)]
    screenshot: Option<PathBuf>,

    /// Dump every frame into <DIR>/frames/
    #[arg(long, value_name = "DIR")]
    record: Option<PathBuf>,

    /// Test pattern to render
    #[arg(long, value_enum, default_value = "bars")]
    pattern: Pattern,
}

const BAR_COLOURS: [u16; 8] = [0x0FFF, 0x0FF0, 0x00FF, 0x00F0, 0x0F0F, 0x0F00, 0x000F, 0x0000];

fn render_pattern(pattern: Pattern) -> impl FnMut(u16, &VgaParams, &mut [u16]) + Send {
    move |line, params, out| {
        let width = params.h_virtual_pixels.max(1) as usize;
        for (x, px) in out.iter_mut().enumerate() {
            *px = match pattern {
                Pattern::Bars => BAR_COLOURS[x * BAR_COLOURS.len() / width],
                Pattern::Checker => {
                    if ((x / 8) + usize::from(line / 8)) % 2 == 0 {
                        0x0FFF
                    } else {
                        0x0000
                    }
                }
                Pattern::Gradient => {
                    let red = (x * 16 / width) as u16;
                    let blue = u32::from(line) * 16 / params.v_virtual_pixels.max(1);
                    (red << 8) | (blue as u16 & 0xF)
                }
            };
        }
    }
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if let Err(e) = run(&args) {
        log::error!("{e}");
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let init = VgaInitParams {
        sys_clock_khz: args.sys_clock_khz,
        ..VgaInitParams::new(args.mode.into(), args.scale)
    };
    let params = init.video_params()?;
    let buffers = Arc::new(ScanlineBuffers::new(params.h_virtual_pixels as usize));
    let (sender, receiver) = line_channel(LINE_FIFO_DEPTH);

    let mut vga = Vga::new(SimulatedScanout::new(), init, sender, Arc::clone(&buffers))?;
    let mut core = RenderCore::new(receiver, buffers, params, render_pattern(args.pattern));

    if let Some(dir) = &args.record {
        capture::record(&mut vga, &mut core, dir, args.frames)?;
    } else {
        let frame = capture::run_frames(&mut vga, &mut core, args.frames).ok_or("no frame captured")?;
        if let Some(path) = &args.screenshot {
            capture::save_png(&frame, path)?;
            log::info!("saved {}x{} frame to {}", frame.width, frame.height, path.display());
        }
    }

    log::info!(
        "{} lines requested, {} dropped, {} rendered",
        vga.sender().sent(),
        vga.sender().dropped(),
        core.rendered()
    );
    Ok(())
}
