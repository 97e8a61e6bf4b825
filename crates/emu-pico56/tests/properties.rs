use emu_core::Bus;
use emu_pico56::{
    BusContext, Devices, InterruptRegister, IrqLine, MachineConfig, ScancodeQueue, deinterleave, decode_frame,
    encode_frame,
};
use proptest::prelude::*;

fn any_line() -> impl Strategy<Value = IrqLine> {
    prop::sample::select(vec![IrqLine::Vdp, IrqLine::Keyboard, IrqLine::Uart, IrqLine::Via])
}

fn bus_with_rom(rom: Vec<u8>) -> BusContext {
    BusContext::new(&MachineConfig::with_rom(rom), Devices::default()).unwrap()
}

proptest! {
    #[test]
    fn ram_holds_what_was_written(address in 0u16..0x7F00, value: u8) {
        let mut bus = bus_with_rom(vec![0; 0x1000]);
        bus.write(address, value);
        prop_assert_eq!(bus.read(address), value);
        prop_assert_eq!(bus.peek(address), value);
    }

    #[test]
    fn rom_reads_mask_by_image_size(shift in 0u32..=15, address in 0x8000u16..=0xFFFF, value: u8) {
        let size = 1usize << shift;
        let rom: Vec<u8> = (0..size).map(|i| i as u8).collect();
        let mut bus = bus_with_rom(rom);
        let expected = (usize::from(address) & (size - 1)) as u8;
        bus.write(address, value);
        prop_assert_eq!(bus.read(address), expected);
    }

    #[test]
    fn io_writes_never_land_in_ram(port: u8, value: u8) {
        let mut bus = bus_with_rom(vec![0; 0x8000]);
        let before: Vec<u8> = (0..0x7F00).step_by(0x100).map(|a| bus.peek(a)).collect();
        bus.write(0x7F00 | u16::from(port), value);
        let after: Vec<u8> = (0..0x7F00).step_by(0x100).map(|a| bus.peek(a)).collect();
        prop_assert_eq!(before, after);
    }

    #[test]
    fn irq_asserted_iff_any_bit(ops in prop::collection::vec((any_line(), any::<bool>()), 0..32)) {
        let mut irq = InterruptRegister::new();
        let mut model = 0u8;
        for (line, pending) in ops {
            irq.set_or_clear(line, pending);
            if pending { model |= line.mask(); } else { model &= !line.mask(); }
        }
        prop_assert_eq!(irq.current(), model);
        prop_assert_eq!(irq.asserted(), model != 0);
    }

    #[test]
    fn scancode_queue_is_fifo_and_releases_when_drained(codes in prop::collection::vec(1u8.., 1..16)) {
        let mut queue = ScancodeQueue::new();
        let mut irq = InterruptRegister::new();
        for &code in &codes {
            prop_assert!(queue.push(code, &mut irq));
        }
        let drained: Vec<u8> = codes.iter().map(|_| queue.pop(&mut irq)).collect();
        prop_assert_eq!(drained, codes);
        prop_assert!(!irq.is_pending(IrqLine::Keyboard));
        prop_assert_eq!(queue.status(), 0);
    }

    #[test]
    fn host_frames_have_odd_parity(value: u8) {
        let frame = !encode_frame(value);
        prop_assert_eq!(frame as u8, value);
        prop_assert_eq!((frame & 0x1FF).count_ones() % 2, 1);
        prop_assert_eq!(frame & 0x600, 0x600);
    }

    #[test]
    fn device_frames_decode_data_bits(value: u8, low in 0u32..(1 << 22)) {
        prop_assert_eq!(decode_frame((u32::from(value) << 22) | low), value);
    }

    #[test]
    fn deinterleave_splits_even_and_odd_bits(word: u16) {
        let (first, second) = deinterleave(word);
        for bit in 0..8 {
            prop_assert_eq!((first >> bit) & 1, ((word >> (2 * bit)) & 1) as u8);
            prop_assert_eq!((second >> bit) & 1, ((word >> (2 * bit + 1)) & 1) as u8);
        }
    }
}
