//! 6850-style serial port.
//!
//! Two registers: control/status at the even port, data at the odd one.
//! Received bytes are held in a one-byte data register until the CPU reads
//! them; nothing new is taken from the device while it is full.

/// Status: receive data register full.
pub const STATUS_RDRF: u8 = 0x01;
/// Status: transmit data register empty. Transmission is immediate, so
/// this is always set.
pub const STATUS_TDRE: u8 = 0x02;
/// Status: interrupt request.
pub const STATUS_IRQ: u8 = 0x80;

/// Control: counter divide select `0b11` is a master reset.
const CONTROL_RESET: u8 = 0b11;
/// Control: receive interrupt enable.
const CONTROL_RX_IRQ: u8 = 0x80;

/// Host side of the serial line.
pub trait SerialDevice {
    fn read_byte(&mut self) -> Option<u8>;
    fn write_byte(&mut self, byte: u8);
}

impl<T: SerialDevice + ?Sized> SerialDevice for Box<T> {
    fn read_byte(&mut self) -> Option<u8> {
        (**self).read_byte()
    }

    fn write_byte(&mut self, byte: u8) {
        (**self).write_byte(byte);
    }
}

pub struct Uart<S: SerialDevice> {
    device: S,
    rx: Option<u8>,
    rx_irq_enabled: bool,
}

impl<S: SerialDevice> Uart<S> {
    pub fn new(device: S) -> Self {
        Self {
            device,
            rx: None,
            rx_irq_enabled: false,
        }
    }

    /// Move one byte from the device into the data register if it is free.
    pub fn poll(&mut self) {
        if self.rx.is_none() {
            self.rx = self.device.read_byte();
        }
    }

    #[must_use]
    pub fn status(&self) -> u8 {
        let mut status = STATUS_TDRE;
        if self.rx.is_some() {
            status |= STATUS_RDRF;
        }
        if self.irq_active() {
            status |= STATUS_IRQ;
        }
        status
    }

    pub fn write_control(&mut self, value: u8) {
        if value & CONTROL_RESET == CONTROL_RESET {
            self.rx = None;
            self.rx_irq_enabled = false;
        } else {
            self.rx_irq_enabled = value & CONTROL_RX_IRQ != 0;
        }
    }

    /// Read and empty the data register. Reads 0 when empty.
    pub fn read_data(&mut self) -> u8 {
        self.rx.take().unwrap_or(0)
    }

    #[must_use]
    pub fn peek_data(&self) -> u8 {
        self.rx.unwrap_or(0)
    }

    pub fn write_data(&mut self, value: u8) {
        self.device.write_byte(value);
    }

    #[must_use]
    pub fn irq_active(&self) -> bool {
        self.rx_irq_enabled && self.rx.is_some()
    }

    pub fn device_mut(&mut self) -> &mut S {
        &mut self.device
    }
}
