//! PS/2 keyboard: the scancode queue read by the CPU and the adapter that
//! polls the device.
//!
//! The adapter passes scancodes through untranslated. It also tracks the
//! three lock keys and answers each toggle by sending the device the
//! set-LEDs command (`0xED`) followed by the LED mask, one byte per poll.
//!
//! Device frames arrive right-aligned in the top 11 bits of a 32-bit word
//! (start, 8 data, parity, stop); host frames are sent inverted, with the
//! odd-parity and stop bits above the data.

use std::collections::VecDeque;

use crate::{InterruptRegister, IrqLine};

pub const QUEUE_SIZE: usize = 16;

/// Break prefix: the next code is a key release.
pub const BREAK_PREFIX: u8 = 0xF0;

pub const CAPS_LOCK: u8 = 0x58;
pub const SCROLL_LOCK: u8 = 0x7E;
pub const NUM_LOCK: u8 = 0x77;

/// Host command: set keyboard LEDs.
pub const SET_LEDS: u8 = 0xED;

const SELF_TEST_PASSED: u8 = 0xAA;
const RESEND: u8 = 0xFE;
const ACK: u8 = 0xFA;

/// Keyboard status port bits.
pub const STATUS_INT: u8 = 0x02;
pub const STATUS_READY: u8 = 0x04;

/// Fixed-size scancode FIFO between the keyboard poll and the CPU.
#[derive(Debug, Clone)]
pub struct ScancodeQueue {
    slots: [u8; QUEUE_SIZE],
    head: usize,
    len: usize,
}

impl Default for ScancodeQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl ScancodeQueue {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: [0; QUEUE_SIZE],
            head: 0,
            len: 0,
        }
    }

    /// Queue a scancode and raise the keyboard IRQ. A full queue drops the
    /// new code and returns `false`.
    pub fn push(&mut self, code: u8, irq: &mut InterruptRegister) -> bool {
        if self.len == QUEUE_SIZE {
            log::debug!("scancode queue full, dropped {code:#04X}");
            return false;
        }
        self.slots[(self.head + self.len) % QUEUE_SIZE] = code;
        self.len += 1;
        irq.raise(IrqLine::Keyboard);
        true
    }

    /// Pop the oldest scancode, or 0 if empty. Releases the keyboard IRQ
    /// once the queue drains.
    pub fn pop(&mut self, irq: &mut InterruptRegister) -> u8 {
        if self.len == 0 {
            return 0;
        }
        let code = self.slots[self.head];
        self.head = (self.head + 1) % QUEUE_SIZE;
        self.len -= 1;
        if self.len == 0 {
            irq.release(IrqLine::Keyboard);
        }
        code
    }

    #[must_use]
    pub const fn peek(&self) -> Option<u8> {
        if self.len == 0 { None } else { Some(self.slots[self.head]) }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Value of the keyboard status port.
    #[must_use]
    pub const fn status(&self) -> u8 {
        if self.len == 0 { 0 } else { STATUS_INT | STATUS_READY }
    }
}

/// Raw frame access to a PS/2 keyboard.
pub trait Ps2Device {
    /// Next received frame, if any.
    fn read_frame(&mut self) -> Option<u32>;

    /// Transmit a host frame.
    fn write_frame(&mut self, frame: u32);
}

impl<T: Ps2Device + ?Sized> Ps2Device for Box<T> {
    fn read_frame(&mut self) -> Option<u32> {
        (**self).read_frame()
    }

    fn write_frame(&mut self, frame: u32) {
        (**self).write_frame(frame);
    }
}

/// Data byte of a device frame.
#[must_use]
pub const fn decode_frame(frame: u32) -> u8 {
    ((frame >> 21) >> 1) as u8
}

/// Host frame for `value`: data, odd parity and stop bits, inverted.
#[must_use]
pub const fn encode_frame(value: u8) -> u32 {
    let mut frame = value as u32 | 0x600;
    if value.count_ones() % 2 == 0 {
        frame |= 0x100;
    }
    !frame
}

/// Lock-key state, as the LED mask the keyboard expects.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LockKeys {
    pub caps: bool,
    pub num: bool,
    pub scroll: bool,
}

impl LockKeys {
    #[must_use]
    pub const fn leds(self) -> u8 {
        (if self.caps { 0x04 } else { 0 }) | (if self.num { 0x02 } else { 0 }) | (if self.scroll { 0x01 } else { 0 })
    }

    /// Toggle the lock matching `code`. Returns `false` for other keys.
    fn toggle(&mut self, code: u8) -> bool {
        match code {
            CAPS_LOCK => self.caps = !self.caps,
            NUM_LOCK => self.num = !self.num,
            SCROLL_LOCK => self.scroll = !self.scroll,
            _ => return false,
        }
        true
    }
}

/// Adapter between a [`Ps2Device`] and the scancode queue.
pub struct Ps2Keyboard<D: Ps2Device> {
    device: D,
    last_code: u8,
    locks: LockKeys,
    outgoing: VecDeque<u8>,
}

impl<D: Ps2Device> Ps2Keyboard<D> {
    pub fn new(device: D) -> Self {
        Self {
            device,
            last_code: 0,
            locks: LockKeys::default(),
            outgoing: VecDeque::new(),
        }
    }

    /// One scheduler poll: send at most one pending host byte, then take
    /// at most one frame from the device.
    pub fn poll(&mut self, queue: &mut ScancodeQueue, irq: &mut InterruptRegister) {
        if let Some(byte) = self.outgoing.pop_front() {
            self.device.write_frame(encode_frame(byte));
        }

        let Some(frame) = self.device.read_frame() else {
            return;
        };
        let code = decode_frame(frame);
        match code {
            0 => {}
            SELF_TEST_PASSED => {
                log::debug!("keyboard self-test passed");
                self.outgoing.push_back(ACK);
            }
            RESEND | ACK => {}
            _ => self.accept(code, queue, irq),
        }
    }

    fn accept(&mut self, code: u8, queue: &mut ScancodeQueue, irq: &mut InterruptRegister) {
        queue.push(code, irq);
        if self.last_code != BREAK_PREFIX && self.locks.toggle(code) {
            self.outgoing.push_back(SET_LEDS);
            self.outgoing.push_back(self.locks.leds());
        }
        self.last_code = code;
    }

    #[must_use]
    pub const fn locks(&self) -> LockKeys {
        self.locks
    }

    /// Host bytes not yet sent.
    #[must_use]
    pub fn pending_output(&self) -> usize {
        self.outgoing.len()
    }

    #[must_use]
    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Device frame carrying `value`.
    fn frame(value: u8) -> u32 {
        u32::from(value) << 22
    }

    #[derive(Default)]
    struct FakeKeyboard {
        incoming: VecDeque<u32>,
        written: Vec<u32>,
    }

    impl Ps2Device for FakeKeyboard {
        fn read_frame(&mut self) -> Option<u32> {
            self.incoming.pop_front()
        }

        fn write_frame(&mut self, frame: u32) {
            self.written.push(frame);
        }
    }

    fn keyboard(codes: &[u8]) -> Ps2Keyboard<FakeKeyboard> {
        let mut device = FakeKeyboard::default();
        device.incoming.extend(codes.iter().map(|&c| frame(c)));
        Ps2Keyboard::new(device)
    }

    #[test]
    fn queue_raises_and_releases_irq() {
        let mut queue = ScancodeQueue::new();
        let mut irq = InterruptRegister::new();
        queue.push(0x1C, &mut irq);
        queue.push(0xF0, &mut irq);
        assert!(irq.is_pending(IrqLine::Keyboard));
        assert_eq!(queue.status(), 0x06);

        assert_eq!(queue.pop(&mut irq), 0x1C);
        assert!(irq.is_pending(IrqLine::Keyboard));
        assert_eq!(queue.pop(&mut irq), 0xF0);
        assert!(!irq.is_pending(IrqLine::Keyboard));
        assert_eq!(queue.status(), 0);
        assert_eq!(queue.pop(&mut irq), 0);
    }

    #[test]
    fn full_queue_drops_newest() {
        let mut queue = ScancodeQueue::new();
        let mut irq = InterruptRegister::new();
        for code in 1..=16 {
            assert!(queue.push(code, &mut irq));
        }
        assert!(!queue.push(17, &mut irq));
        assert_eq!(queue.len(), 16);
        let drained: Vec<u8> = (0..16).map(|_| queue.pop(&mut irq)).collect();
        assert_eq!(drained, (1..=16).collect::<Vec<u8>>());
    }

    #[test]
    fn frame_codec() {
        assert_eq!(decode_frame(frame(0x1C)), 0x1C);
        // 0xED has six bits set: parity bit added
        assert_eq!(!encode_frame(0xED), 0x7ED);
        // 0x04 has one bit set: no parity bit
        assert_eq!(!encode_frame(0x04), 0x604);
    }

    #[test]
    fn caps_lock_sends_led_sequence_one_byte_per_poll() {
        let mut kbd = keyboard(&[CAPS_LOCK]);
        let mut queue = ScancodeQueue::new();
        let mut irq = InterruptRegister::new();

        kbd.poll(&mut queue, &mut irq);
        assert_eq!(queue.peek(), Some(CAPS_LOCK));
        assert!(kbd.locks().caps);
        assert!(kbd.device().written.is_empty());

        kbd.poll(&mut queue, &mut irq);
        kbd.poll(&mut queue, &mut irq);
        let sent: Vec<u8> = kbd.device().written.iter().map(|&f| !f as u8).collect();
        assert_eq!(sent, vec![SET_LEDS, 0x04]);
        assert_eq!(kbd.pending_output(), 0);
    }

    #[test]
    fn lock_release_does_not_toggle() {
        let mut kbd = keyboard(&[NUM_LOCK, BREAK_PREFIX, NUM_LOCK, SCROLL_LOCK]);
        let mut queue = ScancodeQueue::new();
        let mut irq = InterruptRegister::new();
        for _ in 0..4 {
            kbd.poll(&mut queue, &mut irq);
        }
        assert_eq!(
            kbd.locks(),
            LockKeys {
                caps: false,
                num: true,
                scroll: true
            }
        );
        assert_eq!(kbd.locks().leds(), 0x03);
        assert_eq!(queue.len(), 4);
    }

    #[test]
    fn protocol_bytes_are_absorbed() {
        let mut kbd = keyboard(&[0xAA, 0xFA, 0xFE]);
        let mut queue = ScancodeQueue::new();
        let mut irq = InterruptRegister::new();
        for _ in 0..4 {
            kbd.poll(&mut queue, &mut irq);
        }
        assert!(queue.is_empty());
        assert!(!irq.asserted());
        // self-test answered with an ack
        assert_eq!(kbd.device().written, vec![encode_frame(0xFA)]);
    }
}
