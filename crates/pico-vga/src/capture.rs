//! Headless capture: run the simulated scanout and save frames as PNG.

use std::error::Error;
use std::fs;
use std::path::Path;

use crate::{Frame, RenderCore, ScanlineRenderer, SimulatedScanout, Vga};

/// Run `frames` complete frames with the render core in lockstep: after
/// every line's interrupts, all pending requests are rendered before the
/// next line is scanned. Returns the last completed frame.
pub fn run_frames<R: ScanlineRenderer>(
    vga: &mut Vga<SimulatedScanout>,
    core: &mut RenderCore<R>,
    frames: u32,
) -> Option<Frame> {
    while core.try_render_next() {}

    let target = vga.hardware().frames() + u64::from(frames);
    while vga.hardware().frames() < target {
        vga.hardware_mut().scan_line()?;
        vga.handle_irq();
        while core.try_render_next() {}
    }
    vga.hardware().last_frame().cloned()
}

/// Expand an RGB444 pixel to RGBA8.
#[must_use]
pub fn rgb444_to_rgba(pixel: u16) -> [u8; 4] {
    let expand = |nibble: u16| (nibble & 0xF) as u8 * 0x11;
    [expand(pixel >> 8), expand(pixel >> 4), expand(pixel), 0xFF]
}

/// Save a frame as a PNG file.
pub fn save_png(frame: &Frame, path: &Path) -> Result<(), Box<dyn Error>> {
    let file = fs::File::create(path)?;
    let w = std::io::BufWriter::new(file);
    let mut encoder = png::Encoder::new(w, frame.width, frame.height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;

    let rgba: Vec<u8> = frame.pixels.iter().flat_map(|&px| rgb444_to_rgba(px)).collect();
    writer.write_image_data(&rgba)?;
    Ok(())
}

/// Dump `frames` consecutive frames into `dir/frames/NNNNNN.png`.
pub fn record<R: ScanlineRenderer>(
    vga: &mut Vga<SimulatedScanout>,
    core: &mut RenderCore<R>,
    dir: &Path,
    frames: u32,
) -> Result<(), Box<dyn Error>> {
    let frames_dir = dir.join("frames");
    fs::create_dir_all(&frames_dir)?;

    for i in 1..=frames {
        let frame = run_frames(vga, core, 1).ok_or("scanout is not running")?;
        save_png(&frame, &frames_dir.join(format!("{i:06}.png")))?;
    }

    log::info!("captured {frames} frames to {}", frames_dir.display());
    Ok(())
}
