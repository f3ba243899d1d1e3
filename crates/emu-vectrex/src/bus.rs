//! Vectrex bus: memory decoding and VIA port side effects.
//!
//! Implements `emu_core::Bus` for the Vectrex. Besides address decoding
//! the bus carries out what the VIA ports are wired to:
//!
//! - Port B bits 3-4 run the sound chip's bus protocol (BC1/BDIR), with
//!   port A as its data bus.
//! - Port A feeds the DAC; port B bits 0-2 steer the analog multiplexer.
//! - Port B bit 5 reads the joystick comparator.

use emu_core::Bus;
use gi_ay_3_8910::Ay3_8910;
use mos_via_6522::Via6522;

use crate::analog::{Analog, BeamLines};
use crate::memory::VectrexMemory;
use crate::vectors::SegmentLists;

/// Sound chip I/O port register (controller buttons).
pub const PSG_PORT_A: u8 = 14;

/// The Vectrex bus, implementing `emu_core::Bus`.
///
/// Owns every subsystem the CPU can reach.
pub struct VectrexBus {
    pub memory: VectrexMemory,
    pub via: Via6522,
    pub psg: Ay3_8910,
    pub analog: Analog,
    pub segments: SegmentLists,
}

impl VectrexBus {
    #[must_use]
    pub fn new(memory: VectrexMemory) -> Self {
        Self {
            memory,
            via: Via6522::new(),
            psg: Ay3_8910::new(),
            analog: Analog::new(),
            segments: SegmentLists::new(),
        }
    }

    /// Return every subsystem to its power-on state.
    pub fn reset(&mut self) {
        self.memory.reset_ram();

        for reg in 0..16 {
            self.psg.write(reg, 0);
        }
        // Buttons released
        self.psg.write(PSG_PORT_A, 0xFF);
        self.psg.select_register(0);

        self.via.reset();
        self.analog.reset();
        self.segments.clear();
    }

    /// Run the VIA and the analog hardware for one CPU cycle.
    pub fn tick(&mut self) {
        self.via.phase1();
        self.analog
            .step(BeamLines::from_via(&self.via), &mut self.segments);
        self.via.phase2();
    }

    /// Drive the sound chip from the current port values.
    fn sound_update(&mut self) {
        let ora = self.via.port_a();
        match self.via.port_b() & 0x18 {
            // Write data
            0x10 => {
                if self.psg.selected_register() != PSG_PORT_A {
                    self.psg.write_data(ora);
                }
            }
            // Latch address
            0x18 => {
                if ora & 0xF0 == 0 {
                    self.psg.select_register(ora);
                }
            }
            // Inactive, or read (handled on port A reads)
            _ => {}
        }
    }

    fn read_via(&mut self, reg: u8) -> u8 {
        match reg {
            0x0 => self.via.read(reg) | self.analog.compare(),
            0x1 | 0xF => {
                let ora = self.via.read(reg);
                if self.via.port_b() & 0x18 == 0x08 {
                    // The sound chip is driving port A.
                    self.psg.read_data()
                } else {
                    ora
                }
            }
            _ => self.via.read(reg),
        }
    }

    fn write_via(&mut self, reg: u8, value: u8) {
        self.via.write(reg, value);
        match reg {
            0x0 => {
                self.sound_update();
                self.analog.update(self.via.port_b());
            }
            0x1 | 0xF => {
                self.sound_update();
                self.analog.set_dac(self.via.port_a());
                self.analog.update(self.via.port_b());
            }
            _ => {}
        }
    }
}

impl Bus for VectrexBus {
    fn read(&mut self, addr: u16) -> u8 {
        match addr & 0xE000 {
            0xE000 => self.memory.rom_read(addr),
            0xC000 => {
                if addr & 0x0800 != 0 {
                    self.memory.ram_read(addr)
                } else if addr & 0x1000 != 0 {
                    self.read_via((addr & 0x0F) as u8)
                } else {
                    0
                }
            }
            _ if addr < 0x8000 => self.memory.cartridge_read(addr),
            _ => 0xFF,
        }
    }

    fn write(&mut self, addr: u16, value: u8) {
        // ROM and cartridge ignore writes. RAM and VIA can both be selected.
        if addr & 0xE000 == 0xC000 {
            if addr & 0x0800 != 0 {
                self.memory.ram_write(addr, value);
            }
            if addr & 0x1000 != 0 {
                self.write_via((addr & 0x0F) as u8, value);
            }
        }
    }
}
