//! Vectrex memory: system ROM, cartridge and 1 KiB of RAM.
//!
//! # Memory map
//!
//! | Range         | Contents                                       |
//! |---------------|------------------------------------------------|
//! | $0000-$7FFF   | Cartridge (read-only)                          |
//! | $8000-$BFFF   | Unmapped, reads $FF                            |
//! | $C000-$DFFF   | RAM when A11 set, VIA when A12 set             |
//! | $E000-$FFFF   | System ROM (read-only)                         |
//!
//! In $C000-$DFFF the RAM decodes only A0-A9, so its 1 KiB appears at
//! $C800, $CC00, $D800 and $DC00. A write with both A11 and A12 set
//! reaches RAM and the VIA together.

use crate::config::{CARTRIDGE_SIZE, ROM_SIZE};

const RAM_SIZE: usize = 0x400;

/// ROM, cartridge and RAM storage.
#[derive(Clone, PartialEq, Eq)]
pub struct VectrexMemory {
    rom: Box<[u8; ROM_SIZE]>,
    cartridge: Box<[u8; CARTRIDGE_SIZE]>,
    ram: [u8; RAM_SIZE],
}

impl VectrexMemory {
    /// Create memory with the given images. Short images are zero-filled.
    #[must_use]
    pub fn new(rom: &[u8], cartridge: Option<&[u8]>) -> Self {
        let mut memory = Self {
            rom: Box::new([0; ROM_SIZE]),
            cartridge: Box::new([0; CARTRIDGE_SIZE]),
            ram: [0; RAM_SIZE],
        };
        let len = rom.len().min(ROM_SIZE);
        memory.rom[..len].copy_from_slice(&rom[..len]);
        if let Some(cart) = cartridge {
            memory.insert_cartridge(cart);
        }
        memory.reset_ram();
        memory
    }

    /// Replace the cartridge contents. Missing bytes read as zero.
    pub fn insert_cartridge(&mut self, cart: &[u8]) {
        self.cartridge.fill(0);
        let len = cart.len().min(CARTRIDGE_SIZE);
        self.cartridge[..len].copy_from_slice(&cart[..len]);
    }

    /// Power-on RAM pattern: each byte holds the low byte of its index.
    pub fn reset_ram(&mut self) {
        for (i, byte) in self.ram.iter_mut().enumerate() {
            *byte = i as u8;
        }
    }

    #[must_use]
    pub fn rom_read(&self, addr: u16) -> u8 {
        self.rom[usize::from(addr) & (ROM_SIZE - 1)]
    }

    #[must_use]
    pub fn cartridge_read(&self, addr: u16) -> u8 {
        self.cartridge[usize::from(addr) & (CARTRIDGE_SIZE - 1)]
    }

    #[must_use]
    pub fn ram_read(&self, addr: u16) -> u8 {
        self.ram[usize::from(addr) & (RAM_SIZE - 1)]
    }

    pub fn ram_write(&mut self, addr: u16, value: u8) {
        self.ram[usize::from(addr) & (RAM_SIZE - 1)] = value;
    }

    /// Side-effect-free view of the CPU address space. VIA registers are
    /// not visible here and read as zero.
    #[must_use]
    pub fn peek(&self, addr: u16) -> u8 {
        match addr & 0xE000 {
            0xE000 => self.rom_read(addr),
            0xC000 if addr & 0x0800 != 0 => self.ram_read(addr),
            0xC000 => 0,
            _ if addr < 0x8000 => self.cartridge_read(addr),
            _ => 0xFF,
        }
    }
}
