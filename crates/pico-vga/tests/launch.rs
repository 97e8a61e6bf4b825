//! The render core on its own thread.

use std::time::{Duration, Instant};

use emu_core::{Observable, Value};
use pico_vga::{SimulatedScanout, Vga, VgaError, VgaInitParams, VgaMode, VgaParams, launch};

const TIMEOUT: Duration = Duration::from_secs(5);

fn wait_for_rendered(vga: &Vga<SimulatedScanout>, lines: u64) -> bool {
    let start = Instant::now();
    while start.elapsed() < TIMEOUT {
        if vga.query("render.lines").and_then(|v| v.as_u64()) >= Some(lines) {
            return true;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    false
}

#[test]
fn render_thread_serves_primed_lines() {
    let init = VgaInitParams::new(VgaMode::Vga640x480At60, 2);
    let (vga, handle) = launch(SimulatedScanout::new(), init, |line: u16, _: &VgaParams, out: &mut [u16]| {
        out.fill(0x0F00 | line);
    })
    .unwrap();

    assert!(wait_for_rendered(&vga, 2), "render core never served the primed lines");
    assert_eq!(vga.query("requests.sent"), Some(Value::U64(2)));

    // dropping the driver closes the channel and ends the render loop
    drop(vga);
    handle.join().unwrap();
}

#[test]
fn render_thread_keeps_up_over_a_frame() {
    let init = VgaInitParams::new(VgaMode::Vga640x480At60, 4);
    let (mut vga, handle) = launch(SimulatedScanout::new(), init, |_: u16, _: &VgaParams, out: &mut [u16]| {
        out.fill(0x0FFF);
    })
    .unwrap();
    assert!(wait_for_rendered(&vga, 2));

    let total = vga.params().total_lines();
    for _ in 0..total {
        vga.hardware_mut().scan_line().unwrap();
        vga.handle_irq();
        // give the render core a line time, as the real scanout would
        let sent = vga.sender().sent();
        assert!(wait_for_rendered(&vga, sent));
    }

    assert_eq!(vga.query("requests.dropped"), Some(Value::U64(0)));
    assert_eq!(vga.query("timing.frame"), Some(Value::U64(1)));
    drop(vga);
    handle.join().unwrap();
}

#[test]
fn launch_reports_slow_clock() {
    let init = VgaInitParams {
        sys_clock_khz: 48_000,
        ..VgaInitParams::new(VgaMode::Sxga1280x1024At60, 1)
    };
    let result = launch(SimulatedScanout::new(), init, |_: u16, _: &VgaParams, _: &mut [u16]| {});
    assert!(matches!(result, Err(VgaError::ClockTooSlow { .. })));
}
