//! Two NES-style controllers read by one shift program.
//!
//! Both data lines are sampled on the same clock, so a completed read is a
//! 16-bit word with the two pads' bits interleaved: even bits belong to
//! controller 1, odd bits to controller 2. Buttons are active low; an idle
//! or absent pad reads `0xFF`.

/// Source of interleaved controller reads.
pub trait ControllerDevice {
    /// The word from the most recent completed read, if a new one is ready.
    fn read(&mut self) -> Option<u16>;
}

impl<T: ControllerDevice + ?Sized> ControllerDevice for Box<T> {
    fn read(&mut self) -> Option<u16> {
        (**self).read()
    }
}

/// Split an interleaved word into (controller 1, controller 2).
#[must_use]
pub fn deinterleave(word: u16) -> (u8, u8) {
    let mut first = 0u8;
    let mut second = 0u8;
    for bit in 0..8 {
        first |= (((word >> (2 * bit)) & 1) as u8) << bit;
        second |= (((word >> (2 * bit + 1)) & 1) as u8) << bit;
    }
    (first, second)
}

/// Latched state of both controllers.
pub struct DualController<D: ControllerDevice> {
    device: D,
    latches: [u8; 2],
}

impl<D: ControllerDevice> DualController<D> {
    pub fn new(device: D) -> Self {
        Self {
            device,
            latches: [0xFF; 2],
        }
    }

    /// Latch a new reading if the device has one.
    pub fn poll(&mut self) {
        if let Some(word) = self.device.read() {
            let (first, second) = deinterleave(word);
            self.latches = [first, second];
        }
    }

    /// Latched state of controller `index` (0 or 1). Other indices read as
    /// an idle pad.
    #[must_use]
    pub fn state(&self, index: usize) -> u8 {
        self.latches.get(index).copied().unwrap_or(0xFF)
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }
}
