//! pico56 bus: CPU address routing.
//!
//! Implements `emu_core::Bus`. Decoding goes ROM window (bit 15), then RAM,
//! then the 256-port I/O window at `0x7F00`, dispatched on the low byte.
//! Port accesses that change a device's interrupt condition update the
//! interrupt register before returning.

use emu_core::{Bus, Observable, Value, parse_address};

use crate::chips::{Detached, PsgPort, SoundChip, TimerChip, VideoChip};
use crate::config::{RAM_END, port};
use crate::{
    ControllerDevice, DualController, FilePorts, FileSource, InterruptRegister, IrqLine, MachineConfig, MachineError,
    ScancodeQueue, SerialDevice, Uart,
};

/// The chips and host devices attached to the bus. Anything not supplied
/// is [`Detached`].
pub struct Devices {
    pub via: Box<dyn TimerChip>,
    pub vdp: Box<dyn VideoChip>,
    pub psg_a: Box<dyn SoundChip>,
    pub psg_b: Box<dyn SoundChip>,
    pub controllers: Box<dyn ControllerDevice>,
    pub serial: Box<dyn SerialDevice>,
    pub files: Box<dyn FileSource>,
}

impl Default for Devices {
    fn default() -> Self {
        Self {
            via: Box::new(Detached),
            vdp: Box::new(Detached),
            psg_a: Box::new(Detached),
            psg_b: Box::new(Detached),
            controllers: Box::new(Detached),
            serial: Box::new(Detached),
            files: Box::new(Detached),
        }
    }
}

/// Everything the CPU can address.
pub struct BusContext {
    ram: Vec<u8>,
    rom: Vec<u8>,
    rom_mask: u16,
    pub irq: InterruptRegister,
    pub keyboard: ScancodeQueue,
    pub controllers: DualController<Box<dyn ControllerDevice>>,
    pub uart: Uart<Box<dyn SerialDevice>>,
    pub files: FilePorts<Box<dyn FileSource>>,
    pub via: Box<dyn TimerChip>,
    pub vdp: Box<dyn VideoChip>,
    pub psg: [PsgPort; 2],
}

impl BusContext {
    pub fn new(config: &MachineConfig, devices: Devices) -> Result<Self, MachineError> {
        config.validate()?;
        Ok(Self {
            ram: vec![0; usize::from(RAM_END)],
            rom: config.rom.clone(),
            rom_mask: (config.rom.len() - 1) as u16,
            irq: InterruptRegister::new(),
            keyboard: ScancodeQueue::new(),
            controllers: DualController::new(devices.controllers),
            uart: Uart::new(devices.serial),
            files: FilePorts::new(devices.files),
            via: devices.via,
            vdp: devices.vdp,
            psg: [PsgPort::new(devices.psg_a), PsgPort::new(devices.psg_b)],
        })
    }

    fn psg_index(port: u8) -> Option<(usize, u8)> {
        match port & 0xFC {
            port::PSG_A => Some((0, port & 0x03)),
            port::PSG_B => Some((1, port & 0x03)),
            _ => None,
        }
    }

    fn is_via(port: u8) -> bool {
        port & port::VIA_MASK == port::VIA
    }

    fn io_read(&mut self, port: u8) -> u8 {
        if Self::is_via(port) {
            let value = self.via.read(port & 0x0F);
            self.irq.set_or_clear(IrqLine::Via, self.via.irq_active());
            return value;
        }
        if let Some((chip, offset)) = Self::psg_index(port) {
            return self.psg[chip].read(offset);
        }
        match port {
            port::VDP_DATA => self.vdp.read_data(),
            port::VDP_CONTROL => {
                let status = self.vdp.read_status();
                self.irq.release(IrqLine::Vdp);
                status
            }
            port::UART_CONTROL => self.uart.status(),
            port::UART_DATA => {
                let value = self.uart.read_data();
                self.irq.set_or_clear(IrqLine::Uart, self.uart.irq_active());
                value
            }
            port::FILE_DATA => self.files.read_data(),
            port::FILE_CONTROL => self.files.status(),
            port::KEYBOARD_DATA => self.keyboard.pop(&mut self.irq),
            port::KEYBOARD_STATUS => self.keyboard.status(),
            port::CONTROLLER_1 => self.controllers.state(0),
            port::CONTROLLER_2 => self.controllers.state(1),
            port::IRQ_STATUS => self.irq.current(),
            _ => 0,
        }
    }

    fn io_write(&mut self, port: u8, value: u8) {
        if Self::is_via(port) {
            self.via.write(port & 0x0F, value);
            self.irq.set_or_clear(IrqLine::Via, self.via.irq_active());
            return;
        }
        if let Some((chip, offset)) = Self::psg_index(port) {
            self.psg[chip].write(offset, value);
            return;
        }
        match port {
            port::VDP_DATA => self.vdp.write_data(value),
            port::VDP_CONTROL => self.vdp.write_address(value),
            port::UART_CONTROL => {
                self.uart.write_control(value);
                self.irq.set_or_clear(IrqLine::Uart, self.uart.irq_active());
            }
            port::UART_DATA => self.uart.write_data(value),
            port::FILE_DATA => self.files.write_data(value),
            port::FILE_CONTROL => self.files.close(),
            _ => {}
        }
    }

    /// Side-effect-free view of a port. Chip registers read as 0.
    fn io_peek(&self, port: u8) -> u8 {
        match port {
            port::UART_CONTROL => self.uart.status(),
            port::UART_DATA => self.uart.peek_data(),
            port::FILE_CONTROL => self.files.status(),
            port::KEYBOARD_DATA => self.keyboard.peek().unwrap_or(0),
            port::KEYBOARD_STATUS => self.keyboard.status(),
            port::CONTROLLER_1 => self.controllers.state(0),
            port::CONTROLLER_2 => self.controllers.state(1),
            port::IRQ_STATUS => self.irq.current(),
            _ => 0,
        }
    }
}

impl Bus for BusContext {
    fn read(&mut self, address: u16) -> u8 {
        if address & 0x8000 != 0 {
            self.rom[usize::from(address & self.rom_mask)]
        } else if address < RAM_END {
            self.ram[usize::from(address)]
        } else {
            self.io_read(address as u8)
        }
    }

    fn write(&mut self, address: u16, value: u8) {
        if address & 0x8000 != 0 {
            // ROM
        } else if address < RAM_END {
            self.ram[usize::from(address)] = value;
        } else {
            self.io_write(address as u8, value);
        }
    }

    fn peek(&self, address: u16) -> u8 {
        if address & 0x8000 != 0 {
            self.rom[usize::from(address & self.rom_mask)]
        } else if address < RAM_END {
            self.ram[usize::from(address)]
        } else {
            self.io_peek(address as u8)
        }
    }
}

const QUERY_PATHS: &[&str] = &[
    "irq",
    "irq.asserted",
    "mem.<addr>",
    "keyboard.pending",
    "keyboard.status",
    "controllers",
    "uart.status",
    "file.status",
];

impl Observable for BusContext {
    fn query(&self, path: &str) -> Option<Value> {
        if let Some(addr) = path.strip_prefix("mem.") {
            return parse_address(addr).map(|a| Value::U8(self.peek(a)));
        }
        match path {
            "irq" => Some(self.irq.current().into()),
            "irq.asserted" => Some(self.irq.asserted().into()),
            "keyboard.pending" => Some(Value::U8(self.keyboard.len() as u8)),
            "keyboard.status" => Some(self.keyboard.status().into()),
            "controllers" => Some(Value::List(vec![
                self.controllers.state(0).into(),
                self.controllers.state(1).into(),
            ])),
            "uart.status" => Some(self.uart.status().into()),
            "file.status" => Some(self.files.status().into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        QUERY_PATHS
    }
}
