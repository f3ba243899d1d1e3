//! 6809 CPU core: state, interrupts, addressing and stack helpers.

mod execute;

use emu_core::{Bus, Cpu, Observable, Value};

use crate::flags::{self, C, E, F, H, I, N, V, Z};
use crate::registers::{RegisterId, Registers};

/// Interrupt vectors.
const VEC_SWI3: u16 = 0xFFF2;
const VEC_SWI2: u16 = 0xFFF4;
const VEC_FIRQ: u16 = 0xFFF6;
const VEC_IRQ: u16 = 0xFFF8;
const VEC_SWI: u16 = 0xFFFA;
const VEC_RESET: u16 = 0xFFFE;

/// What the CPU is doing between instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitState {
    /// Executing instructions.
    Normal,
    /// Halted by SYNC until any interrupt line is asserted.
    Sync,
    /// Halted by CWAI with the full register set already stacked.
    Cwai,
}

impl WaitState {
    const fn name(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Sync => "sync",
            Self::Cwai => "cwai",
        }
    }
}

/// Which stack a push or pull works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stack {
    /// Hardware stack; "other" register in a postbyte is U.
    S,
    /// User stack; "other" register in a postbyte is S.
    U,
}

/// Motorola 6809.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct M6809 {
    pub regs: Registers,
    wait: WaitState,
    /// Cycles charged so far to the step in progress.
    cycles: u32,
    total_cycles: u64,
}

impl Default for M6809 {
    fn default() -> Self {
        Self::new()
    }
}

impl M6809 {
    #[must_use]
    pub fn new() -> Self {
        Self {
            regs: Registers::new(),
            wait: WaitState::Normal,
            cycles: 0,
            total_cycles: 0,
        }
    }

    #[must_use]
    pub fn wait_state(&self) -> WaitState {
        self.wait
    }

    /// Cycles executed since the last reset.
    #[must_use]
    pub fn total_cycles(&self) -> u64 {
        self.total_cycles
    }

    #[must_use]
    pub fn register(&self, id: RegisterId) -> u16 {
        self.regs.get(id)
    }

    /// Take pending interrupts, then run one instruction unless halted.
    fn step_inner<B: Bus>(&mut self, bus: &mut B, irq: bool, firq: bool) -> u32 {
        self.cycles = 0;

        if firq {
            if flags::is_set(self.regs.cc, F) {
                if self.wait == WaitState::Sync {
                    self.wait = WaitState::Normal;
                }
            } else {
                if self.wait != WaitState::Cwai {
                    self.regs.cc &= !E;
                    self.push_regs(bus, Stack::S, 0x81);
                }
                self.regs.cc |= I | F;
                self.regs.pc = read16(bus, VEC_FIRQ);
                self.wait = WaitState::Normal;
                self.cycles += 7;
            }
        }

        if irq {
            if flags::is_set(self.regs.cc, I) {
                if self.wait == WaitState::Sync {
                    self.wait = WaitState::Normal;
                }
            } else {
                if self.wait != WaitState::Cwai {
                    self.regs.cc |= E;
                    self.push_regs(bus, Stack::S, 0xFF);
                }
                self.regs.cc |= I;
                self.regs.pc = read16(bus, VEC_IRQ);
                self.wait = WaitState::Normal;
                self.cycles += 7;
            }
        }

        if self.wait != WaitState::Normal {
            return self.cycles + 1;
        }

        let op = self.fetch8(bus);
        self.execute(bus, op);
        self.cycles
    }

    // =========================================================================
    // Memory access
    // =========================================================================

    fn fetch8<B: Bus>(&mut self, bus: &mut B) -> u8 {
        let value = bus.read(self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        value
    }

    fn fetch16<B: Bus>(&mut self, bus: &mut B) -> u16 {
        let hi = self.fetch8(bus);
        let lo = self.fetch8(bus);
        u16::from_be_bytes([hi, lo])
    }

    // =========================================================================
    // Stacks
    // =========================================================================

    fn stack_pointer(&mut self, stack: Stack) -> &mut u16 {
        match stack {
            Stack::S => &mut self.regs.s,
            Stack::U => &mut self.regs.u,
        }
    }

    fn push8<B: Bus>(&mut self, bus: &mut B, stack: Stack, value: u8) {
        let sp = self.stack_pointer(stack);
        *sp = sp.wrapping_sub(1);
        let addr = *sp;
        bus.write(addr, value);
    }

    fn push16<B: Bus>(&mut self, bus: &mut B, stack: Stack, value: u16) {
        self.push8(bus, stack, value as u8);
        self.push8(bus, stack, (value >> 8) as u8);
    }

    fn pull8<B: Bus>(&mut self, bus: &mut B, stack: Stack) -> u8 {
        let sp = self.stack_pointer(stack);
        let addr = *sp;
        *sp = sp.wrapping_add(1);
        bus.read(addr)
    }

    fn pull16<B: Bus>(&mut self, bus: &mut B, stack: Stack) -> u16 {
        let hi = self.pull8(bus, stack);
        let lo = self.pull8(bus, stack);
        u16::from_be_bytes([hi, lo])
    }

    /// Push the registers selected by a PSH postbyte.
    ///
    /// Charges one cycle per byte stacked.
    fn push_regs<B: Bus>(&mut self, bus: &mut B, stack: Stack, mask: u8) {
        if mask & 0x80 != 0 {
            self.push16(bus, stack, self.regs.pc);
            self.cycles += 2;
        }
        if mask & 0x40 != 0 {
            let other = match stack {
                Stack::S => self.regs.u,
                Stack::U => self.regs.s,
            };
            self.push16(bus, stack, other);
            self.cycles += 2;
        }
        if mask & 0x20 != 0 {
            self.push16(bus, stack, self.regs.y);
            self.cycles += 2;
        }
        if mask & 0x10 != 0 {
            self.push16(bus, stack, self.regs.x);
            self.cycles += 2;
        }
        if mask & 0x08 != 0 {
            self.push8(bus, stack, self.regs.dp);
            self.cycles += 1;
        }
        if mask & 0x04 != 0 {
            self.push8(bus, stack, self.regs.b);
            self.cycles += 1;
        }
        if mask & 0x02 != 0 {
            self.push8(bus, stack, self.regs.a);
            self.cycles += 1;
        }
        if mask & 0x01 != 0 {
            self.push8(bus, stack, self.regs.cc);
            self.cycles += 1;
        }
    }

    /// Pull the registers selected by a PUL postbyte, in reverse push order.
    fn pull_regs<B: Bus>(&mut self, bus: &mut B, stack: Stack, mask: u8) {
        if mask & 0x01 != 0 {
            self.regs.cc = self.pull8(bus, stack);
            self.cycles += 1;
        }
        if mask & 0x02 != 0 {
            self.regs.a = self.pull8(bus, stack);
            self.cycles += 1;
        }
        if mask & 0x04 != 0 {
            self.regs.b = self.pull8(bus, stack);
            self.cycles += 1;
        }
        if mask & 0x08 != 0 {
            self.regs.dp = self.pull8(bus, stack);
            self.cycles += 1;
        }
        if mask & 0x10 != 0 {
            self.regs.x = self.pull16(bus, stack);
            self.cycles += 2;
        }
        if mask & 0x20 != 0 {
            self.regs.y = self.pull16(bus, stack);
            self.cycles += 2;
        }
        if mask & 0x40 != 0 {
            let value = self.pull16(bus, stack);
            match stack {
                Stack::S => self.regs.u = value,
                Stack::U => self.regs.s = value,
            }
            self.cycles += 2;
        }
        if mask & 0x80 != 0 {
            self.regs.pc = self.pull16(bus, stack);
            self.cycles += 2;
        }
    }

    // =========================================================================
    // Addressing
    // =========================================================================

    fn ea_direct<B: Bus>(&mut self, bus: &mut B) -> u16 {
        let lo = self.fetch8(bus);
        u16::from_be_bytes([self.regs.dp, lo])
    }

    fn ea_extended<B: Bus>(&mut self, bus: &mut B) -> u16 {
        self.fetch16(bus)
    }

    fn index_register(&mut self, postbyte: u8) -> &mut u16 {
        match (postbyte >> 5) & 0x03 {
            0 => &mut self.regs.x,
            1 => &mut self.regs.y,
            2 => &mut self.regs.u,
            _ => &mut self.regs.s,
        }
    }

    /// Decode an indexed-mode postbyte and return the effective address.
    ///
    /// Charges the extra cycles each form costs beyond the base instruction.
    fn ea_indexed<B: Bus>(&mut self, bus: &mut B) -> u16 {
        let post = self.fetch8(bus);
        let r = *self.index_register(post);

        if post & 0x80 == 0 {
            // 5-bit signed offset
            let offset = ((post << 3) as i8 >> 3) as u16;
            self.cycles += 1;
            return r.wrapping_add(offset);
        }

        let (ea, extra) = match post & 0x1F {
            // ,R+
            0x00 => {
                *self.index_register(post) = r.wrapping_add(1);
                (r, 2)
            }
            // ,R++
            0x01 => {
                *self.index_register(post) = r.wrapping_add(2);
                (r, 3)
            }
            // ,-R
            0x02 => {
                let ea = r.wrapping_sub(1);
                *self.index_register(post) = ea;
                (ea, 2)
            }
            // ,--R
            0x03 => {
                let ea = r.wrapping_sub(2);
                *self.index_register(post) = ea;
                (ea, 3)
            }
            // ,R
            0x04 => (r, 0),
            // B,R
            0x05 => (r.wrapping_add(sext8(self.regs.b)), 1),
            // A,R
            0x06 => (r.wrapping_add(sext8(self.regs.a)), 1),
            // n8,R
            0x08 => {
                let offset = sext8(self.fetch8(bus));
                (r.wrapping_add(offset), 1)
            }
            // n16,R
            0x09 => {
                let offset = self.fetch16(bus);
                (r.wrapping_add(offset), 4)
            }
            // D,R
            0x0B => (r.wrapping_add(self.regs.d()), 4),
            // n8,PC
            0x0C => {
                let offset = sext8(self.fetch8(bus));
                (self.regs.pc.wrapping_add(offset), 1)
            }
            // n16,PC
            0x0D => {
                let offset = self.fetch16(bus);
                (self.regs.pc.wrapping_add(offset), 5)
            }
            // [,R++]
            0x11 => {
                *self.index_register(post) = r.wrapping_add(2);
                (read16(bus, r), 6)
            }
            // [,--R]
            0x13 => {
                let ptr = r.wrapping_sub(2);
                *self.index_register(post) = ptr;
                (read16(bus, ptr), 6)
            }
            // [,R]
            0x14 => (read16(bus, r), 3),
            // [B,R]
            0x15 => (read16(bus, r.wrapping_add(sext8(self.regs.b))), 4),
            // [A,R]
            0x16 => (read16(bus, r.wrapping_add(sext8(self.regs.a))), 4),
            // [n8,R]
            0x18 => {
                let offset = sext8(self.fetch8(bus));
                (read16(bus, r.wrapping_add(offset)), 4)
            }
            // [n16,R]
            0x19 => {
                let offset = self.fetch16(bus);
                (read16(bus, r.wrapping_add(offset)), 7)
            }
            // [D,R]
            0x1B => (read16(bus, r.wrapping_add(self.regs.d())), 7),
            // [n8,PC]
            0x1C => {
                let offset = sext8(self.fetch8(bus));
                (read16(bus, self.regs.pc.wrapping_add(offset)), 4)
            }
            // [n16,PC]
            0x1D => {
                let offset = self.fetch16(bus);
                (read16(bus, self.regs.pc.wrapping_add(offset)), 8)
            }
            // [n16]
            0x1F => {
                let ptr = self.fetch16(bus);
                (read16(bus, ptr), 5)
            }
            _ => {
                log::warn!(
                    "6809: undefined indexed postbyte {post:#04X} at PC {:#06X}",
                    self.regs.pc.wrapping_sub(2)
                );
                (0, 0)
            }
        };

        self.cycles += extra;
        ea
    }

    // =========================================================================
    // EXG / TFR
    // =========================================================================

    /// Read a register by its EXG/TFR nibble. Undefined codes read $FFFF.
    fn transfer_read(&self, code: u8) -> u16 {
        match code {
            0x0 => self.regs.d(),
            0x1 => self.regs.x,
            0x2 => self.regs.y,
            0x3 => self.regs.u,
            0x4 => self.regs.s,
            0x5 => self.regs.pc,
            0x8 => u16::from(self.regs.a),
            0x9 => u16::from(self.regs.b),
            0xA => u16::from(self.regs.cc),
            0xB => u16::from(self.regs.dp),
            _ => 0xFFFF,
        }
    }

    /// Write a register by its EXG/TFR nibble. Undefined codes are ignored.
    fn transfer_write(&mut self, code: u8, value: u16) {
        match code {
            0x0 => self.regs.set_d(value),
            0x1 => self.regs.x = value,
            0x2 => self.regs.y = value,
            0x3 => self.regs.u = value,
            0x4 => self.regs.s = value,
            0x5 => self.regs.pc = value,
            0x8 => self.regs.a = value as u8,
            0x9 => self.regs.b = value as u8,
            0xA => self.regs.cc = value as u8,
            0xB => self.regs.dp = value as u8,
            _ => {}
        }
    }

    fn exg(&mut self, post: u8) {
        let (src, dst) = (post >> 4, post & 0x0F);
        let a = self.transfer_read(src);
        let b = self.transfer_read(dst);
        self.transfer_write(src, b);
        self.transfer_write(dst, a);
    }

    fn tfr(&mut self, post: u8) {
        let value = self.transfer_read(post >> 4);
        self.transfer_write(post & 0x0F, value);
    }
}

/// Sign-extend a byte to a 16-bit offset.
#[inline]
fn sext8(value: u8) -> u16 {
    value as i8 as u16
}

/// Big-endian 16-bit read.
fn read16<B: Bus>(bus: &mut B, addr: u16) -> u16 {
    let hi = bus.read(addr);
    let lo = bus.read(addr.wrapping_add(1));
    u16::from_be_bytes([hi, lo])
}

/// Big-endian 16-bit write.
fn write16<B: Bus>(bus: &mut B, addr: u16, value: u16) {
    let [hi, lo] = value.to_be_bytes();
    bus.write(addr, hi);
    bus.write(addr.wrapping_add(1), lo);
}

impl Cpu for M6809 {
    type Registers = Registers;

    fn step<B: Bus>(&mut self, bus: &mut B, irq: bool, firq: bool) -> u32 {
        let cycles = self.step_inner(bus, irq, firq);
        self.total_cycles += u64::from(cycles);
        cycles
    }

    fn pc(&self) -> u32 {
        u32::from(self.regs.pc)
    }

    fn registers(&self) -> Registers {
        self.regs
    }

    fn is_waiting(&self) -> bool {
        self.wait != WaitState::Normal
    }

    fn reset<B: Bus>(&mut self, bus: &mut B) {
        self.regs = Registers::new();
        self.regs.pc = read16(bus, VEC_RESET);
        self.wait = WaitState::Normal;
        self.cycles = 0;
        self.total_cycles = 0;
    }
}

const QUERY_PATHS: &[&str] = &[
    "pc",
    "a",
    "b",
    "d",
    "x",
    "y",
    "u",
    "s",
    "dp",
    "cc",
    "flags.e",
    "flags.f",
    "flags.h",
    "flags.i",
    "flags.n",
    "flags.z",
    "flags.v",
    "flags.c",
    "wait",
    "cycles",
];

impl Observable for M6809 {
    fn query(&self, path: &str) -> Option<Value> {
        let cc = self.regs.cc;
        Some(match path {
            "pc" => self.regs.pc.into(),
            "a" => self.regs.a.into(),
            "b" => self.regs.b.into(),
            "d" => self.regs.d().into(),
            "x" => self.regs.x.into(),
            "y" => self.regs.y.into(),
            "u" => self.regs.u.into(),
            "s" => self.regs.s.into(),
            "dp" => self.regs.dp.into(),
            "cc" => cc.into(),
            "flags.e" => flags::is_set(cc, E).into(),
            "flags.f" => flags::is_set(cc, F).into(),
            "flags.h" => flags::is_set(cc, H).into(),
            "flags.i" => flags::is_set(cc, I).into(),
            "flags.n" => flags::is_set(cc, N).into(),
            "flags.z" => flags::is_set(cc, Z).into(),
            "flags.v" => flags::is_set(cc, V).into(),
            "flags.c" => flags::is_set(cc, C).into(),
            "wait" => self.wait.name().into(),
            "cycles" => self.total_cycles.into(),
            _ => return None,
        })
    }

    fn query_paths(&self) -> &'static [&'static str] {
        QUERY_PATHS
    }
}
